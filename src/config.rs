use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:4221";

/// Command-line arguments.
#[derive(Debug, Default, Parser)]
#[command(name = "parcel")]
#[command(about = "Minimal HTTP/1.1 echo and file server", long_about = None)]
pub struct Args {
    /// Directory served by the /files/ routes
    #[arg(long)]
    pub directory: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:4221
    #[arg(long)]
    pub listen: Option<String>,

    /// Optional YAML config file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Settings read from the optional YAML file. Every key may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub listen_addr: Option<String>,
    pub directory: Option<PathBuf>,
}

impl FileConfig {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    /// `None` when no directory was configured; file routes then answer 404.
    pub directory: Option<PathBuf>,
}

impl Config {
    /// Builds the config from CLI args, the `LISTEN` environment variable and
    /// the YAML file named by `--config`.
    pub fn load(args: &Args) -> anyhow::Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::from_path(path)?,
            None => FileConfig::default(),
        };
        Ok(Self::merge(args, std::env::var("LISTEN").ok(), file))
    }

    /// Applies precedence: CLI flag, then environment, then file, then default.
    pub fn merge(args: &Args, env_listen: Option<String>, file: FileConfig) -> Self {
        let listen_addr = args
            .listen
            .clone()
            .or(env_listen)
            .or(file.listen_addr)
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());

        let directory = args.directory.clone().or(file.directory);

        Self {
            listen_addr,
            directory,
        }
    }
}
