use anyhow::Context;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DEFAULT_AUTHORS_FILE: &str = "data/authors.json";

#[derive(Debug)]
pub struct Config {
    authors_file: PathBuf,
    server_port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let authors_file = load_env_or("AUTHORS_FILE", PathBuf::from(DEFAULT_AUTHORS_FILE))?;
        let server_port = load_env("SERVER_PORT")?;
        Ok(Self {
            authors_file,
            server_port,
        })
    }

    #[must_use]
    pub fn authors_file(&self) -> &Path {
        &self.authors_file
    }

    #[must_use]
    pub const fn server_port(&self) -> u16 {
        self.server_port
    }
}

fn load_env<T>(key: &str) -> anyhow::Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    let val =
        std::env::var(key).with_context(|| format!("Failed to load environment variable {key}"))?;
    parse_env(key, &val)
}

fn load_env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(val) => parse_env(key, &val),
        Err(std::env::VarError::NotPresent) => Ok(default),
        Err(err) => {
            Err(err).with_context(|| format!("Failed to load environment variable {key}"))
        }
    }
}

fn parse_env<T>(key: &str, val: &str) -> anyhow::Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    val.parse::<T>()
        .with_context(|| format!("Failed to parse environment variable {key}"))
}
