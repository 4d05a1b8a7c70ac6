use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_PAGE_SIZE: i64 = 6;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Default page size for paginated lists when the client sends no `limit`.
    pub page_size: i64,
}

/// On-disk configuration. Every key is optional; missing keys keep defaults.
///
/// ```toml
/// host = "0.0.0.0"
/// port = 8000
/// data_dir = "/var/lib/foodgram"
/// page_size = 10
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub data_dir: Option<PathBuf>,
    pub page_size: Option<i64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("foodgram.db")
    }

    /// Layers file values over the defaults.
    pub fn from_file(file: FileConfig) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            host: file.host.unwrap_or(defaults.host),
            port: file.port.unwrap_or(defaults.port),
            data_dir: file.data_dir.unwrap_or(defaults.data_dir),
            page_size: file.page_size.unwrap_or(defaults.page_size),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size < 1 {
            return Err(Error::Config(format!(
                "page_size must be at least 1, got {}",
                self.page_size
            )));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
