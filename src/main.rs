// src/main.rs
mod app;
mod cli;
mod commands;
mod logging;

use clap::Parser;
use cli::Args;
use statline::config::Config;
use statline::error::AppError;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();

    // A missing config is only fatal for commands that talk to upstream
    let config = Config::load().await;
    let config_log_path = config
        .as_ref()
        .ok()
        .and_then(|config| config.log_file_path.clone());

    let (log_file_path, _guard) = logging::setup_logging(&args, config_log_path).await?;
    tracing::info!("Logs are being written to: {log_file_path}");

    if args.command.is_config_only() {
        return commands::handle_config_command(&args.command).await;
    }

    app::run(&args, config?).await
}
