// CLI module for oag

use clap::Parser;
use std::path::PathBuf;

/// oag - Open API Gateway with promotion caching
#[derive(Parser, Debug)]
#[command(name = "oag", version, about, long_about = None)]
pub struct Args {
    /// Configuration file (defaults to ~/.oag/config.toml when present)
    #[arg(short, long, env = "OAG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the bind address
    #[arg(long)]
    pub host: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    pub port: Option<u16>,
}
