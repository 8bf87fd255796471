use colored::Colorize;
use env_logger::{Builder, Env};
use std::io::Write;

/// Initializes the global logger. The filter defaults to `info` and can be
/// overridden through `RUST_LOG`; `quiet` drops all output regardless.
pub fn init_logging(quiet: bool) {
    let logging_env = Env::default().filter_or("RUST_LOG", "info");
    let mut builder = Builder::from_env(logging_env);
    if quiet {
        builder.filter_level(log::LevelFilter::Off);
    }
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {} {}",
                chrono::Local::now().format("%H:%M:%S").to_string().dimmed(),
                record.target().to_ascii_lowercase().bold().bright_yellow(),
                record.args()
            )
        })
        .init();
}
