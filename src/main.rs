use std::path::PathBuf;

use clap::Parser;
use eyre::Result;
use log::info;

mod cli;

use cli::Cli;
use ytex::server::{self, AppState};
use ytex::youtube;

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytex.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytex")
        .join("logs")
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;
    let cli = Cli::parse();

    // Load config file (non-fatal if the default location is missing/invalid;
    // an explicit --config path must exist)
    let config = match cli.config.as_deref() {
        Some(path) => ytex::config::Config::load(Some(path))?,
        None => ytex::config::Config::load(None).unwrap_or_default(),
    };

    // CLI flags take priority over config values
    let bind = cli
        .bind
        .or(config.bind)
        .unwrap_or_else(|| "127.0.0.1:8787".to_string());
    let langs = if cli.langs.is_empty() {
        config
            .languages
            .unwrap_or_else(|| vec!["id".to_string(), "en".to_string()])
    } else {
        cli.langs
    };
    let user_agent = cli
        .user_agent
        .or(config.user_agent)
        .unwrap_or_else(|| youtube::DEFAULT_USER_AGENT.to_string());
    let max_keywords = config.max_keywords.unwrap_or(15);

    if cli.verbose {
        let config_path = cli.config.unwrap_or_else(ytex::config::config_path);
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
        eprintln!("Languages: {}", langs.join(", "));
        eprintln!("Listening on http://{bind}");
    }

    let state = AppState {
        client: reqwest::Client::new(),
        langs,
        user_agent,
        max_keywords,
    };

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("Listening on {bind}");
    axum::serve(listener, server::router(state)).await?;

    Ok(())
}
