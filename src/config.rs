use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::table::DEFAULT_ROWS;

#[derive(Parser, Debug, Clone)]
#[command(name = "server", version, about = "Video review pipeline API")]
pub struct Config {
    #[arg(long, env = "VIDEO_REVIEW_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "VIDEO_REVIEW_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Root of the per-session CSV tree
    #[arg(long, env = "VIDEO_REVIEW_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Served for every path that is not an API route
    #[arg(long, env = "VIDEO_REVIEW_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Rows written per generated table
    #[arg(long, env = "VIDEO_REVIEW_ROWS", default_value_t = DEFAULT_ROWS)]
    pub rows: usize,

    /// Seed for judgement labels; entropy when unset
    #[arg(long, env = "VIDEO_REVIEW_SEED")]
    pub seed: Option<u64>,
}

impl Config {
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        let ip: IpAddr = self.host.trim_matches(['[', ']']).parse()?;
        Ok(SocketAddr::from((ip, self.port)))
    }
}
