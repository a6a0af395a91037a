use std::{
    env,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use anyhow::{bail, Context};

pub const DEFAULT_BUILD_DIR: &str = "client/dist";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Clone, Debug)]
pub struct Config {
    pub build_dir: PathBuf,
    pub host: IpAddr,
    pub port: u16,
}

impl Config {
    /// Reads `BUILD_DIR`, `HOST` and `PORT`, loading a `.env` file first if
    /// one exists.
    pub fn from_env() -> anyhow::Result<Self> {
        // A missing .env is normal in production.
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let build_dir = match lookup("BUILD_DIR") {
            Some(dir) if dir.trim().is_empty() => bail!("BUILD_DIR is set but empty"),
            Some(dir) => PathBuf::from(dir),
            None => PathBuf::from(DEFAULT_BUILD_DIR),
        };
        Ok(Self {
            build_dir,
            host: match lookup("HOST") {
                Some(host) => host
                    .parse()
                    .with_context(|| format!("invalid HOST: {host}"))?,
                None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            },
            port: match lookup("PORT") {
                Some(port) => port
                    .parse()
                    .with_context(|| format!("invalid PORT: {port}"))?,
                None => DEFAULT_PORT,
            },
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
