//! Serves the publish root as static content. `GET /` resolves to
//! `index.html` and every other path maps directly onto files under the
//! publish root; nothing here knows about articles.

use axum::{
    handler::HandlerWithoutStateExt,
    http::StatusCode,
    response::IntoResponse,
    Router,
};
use log::info;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tower_http::services::ServeDir;

/// Binds the address and serves `publish_dir` until the process is killed.
/// With `host` set the server binds 0.0.0.0 instead of localhost.
pub async fn serve(publish_dir: PathBuf, port: u16, host: bool) -> std::io::Result<()> {
    async fn handle_404() -> impl IntoResponse {
        (StatusCode::NOT_FOUND, "Not Found")
    }

    let addr = if host {
        IpAddr::from([0, 0, 0, 0])
    } else {
        IpAddr::from([127, 0, 0, 1])
    };

    let serve_dir = ServeDir::new(publish_dir).not_found_service(handle_404.into_service());
    let router = Router::new().fallback_service(serve_dir);

    let listener = tokio::net::TcpListener::bind(SocketAddr::new(addr, port)).await?;
    info!(target: "serve", "Serving at http://{}", listener.local_addr()?);
    axum::serve(listener, router.into_make_service()).await
}
