pub mod blocklist;
pub mod serve;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Recursive DNS resolver with a blocklist and an in-memory authoritative zone store
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "/etc/corvid/corvid.toml", env = "CONFIG_PATH")]
    config_path: PathBuf,
    #[command(subcommand)]
    inner: Commands,
}

impl Args {
    pub async fn run(self) {
        let config = corvid::config::Config::load(&self.config_path)
            .expect("configuration file invalid");
        match self.inner {
            Commands::Serve(inner) => inner.run(config).await,
            Commands::Blocklist(inner) => inner.run(config).await,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    Serve(serve::Command),
    Blocklist(blocklist::Command),
}
