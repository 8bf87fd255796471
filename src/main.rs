use anyhow::Result;
use clap::{Parser, Subcommand};
use lectern::article;
use lectern::build::Orchestrator;
use lectern::config::Config;
use lectern::index::Generator;
use lectern::logging::init_logging;
use lectern::serve;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lectern", version, about = "Builds and serves a directory of slide-deck articles")]
struct Cli {
    /// Suppress log output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build unpublished articles and regenerate the index
    Build {
        /// Any directory inside the project; defaults to the working
        /// directory
        #[arg(long)]
        project: Option<PathBuf>,
    },
    /// Serve the publish root as static content
    Serve {
        /// Any directory inside the project; defaults to the working
        /// directory
        #[arg(long)]
        project: Option<PathBuf>,

        /// Port to bind; falls back to $PORT, then the project file
        #[arg(long)]
        port: Option<u16>,

        /// Bind 0.0.0.0 instead of 127.0.0.1
        #[arg(long)]
        host: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    match cli.command {
        Command::Build { project } => build(&load_config(project)?),
        Command::Serve {
            project,
            port,
            host,
        } => {
            let config = load_config(project)?;
            let port = port.or_else(port_from_env).unwrap_or(config.port);
            tokio::runtime::Runtime::new()?
                .block_on(serve::serve(config.publish_dir, port, host))?;
            Ok(())
        }
    }
}

fn build(config: &Config) -> Result<()> {
    fs::create_dir_all(&config.articles_output_dir)?;
    let candidates = article::discover(&config.articles_dir)?;

    // Build first, render second: the index generator checks for published
    // thumbnails, so it has to see the output of this pass.
    Orchestrator::new(config).build_all(&candidates);

    let mut articles: Vec<article::Article> = candidates
        .into_iter()
        .filter_map(|candidate| candidate.article)
        .collect();
    article::sort_for_index(&mut articles);
    Generator::new(config)?.write_index(&articles)?;
    Ok(())
}

fn load_config(project: Option<PathBuf>) -> Result<Config> {
    let start = match project {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    Config::from_directory(&start)
}

fn port_from_env() -> Option<u16> {
    std::env::var("PORT").ok()?.parse().ok()
}
