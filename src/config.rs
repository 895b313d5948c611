//! Command-line configuration.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use clap::Parser;

use crate::error::ConfigError;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The root directory to serve files from
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// The port to listen on
    #[arg(short, long, value_name = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// The address to bind to
    #[arg(short, long, value_name = "ADDR", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,
}

/// Validated startup configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absolute, canonical directory; fixed for the process lifetime.
    pub root: PathBuf,
    pub addr: SocketAddr,
}

impl Config {
    pub async fn from_args(args: Args) -> Result<Self, ConfigError> {
        let root = tokio::fs::canonicalize(&args.root)
            .await
            .map_err(|source| ConfigError::UnresolvableRoot {
                path: args.root.clone(),
                source,
            })?;
        if !root.is_dir() {
            return Err(ConfigError::NotADirectory(root));
        }

        Ok(Self {
            root,
            addr: SocketAddr::new(args.bind, args.port),
        })
    }
}
