use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ytex",
    about = "YouTube metadata and transcript extraction endpoint",
    version,
)]
pub struct Cli {
    /// Address to listen on
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Preferred caption languages, in priority order
    #[arg(short, long = "lang")]
    pub langs: Vec<String>,

    /// User-Agent sent on watch-page requests
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Config file path (default: ~/.config/ytex/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the resolved configuration to stderr on startup
    #[arg(short, long)]
    pub verbose: bool,
}
