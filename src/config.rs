use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

pub const DEFAULT_CONFIG_FILE: &str = "micat.json";
pub const DEFAULT_DATABASE: &str = "micrograph.db";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub listen_addr: Option<SocketAddr>,
    #[serde(default)]
    pub database: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub database: Utf8PathBuf,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Resolve the effective configuration: CLI overrides win over the
    /// config file, which wins over built-in defaults. An explicitly passed
    /// file must exist; the default `micat.json` is optional.
    pub fn resolve(
        path: Option<&str>,
        listen_override: Option<SocketAddr>,
        database_override: Option<Utf8PathBuf>,
    ) -> Result<ServerConfig, CatalogError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let file = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| CatalogError::ConfigRead(config_path.clone()))?;
            serde_json::from_str::<ConfigFile>(&content)
                .map_err(|err| CatalogError::ConfigParse(err.to_string()))?
        } else if path.is_some() {
            return Err(CatalogError::ConfigRead(config_path));
        } else {
            ConfigFile::default()
        };

        Ok(Self::merge(file, listen_override, database_override))
    }

    pub fn merge(
        file: ConfigFile,
        listen_override: Option<SocketAddr>,
        database_override: Option<Utf8PathBuf>,
    ) -> ServerConfig {
        ServerConfig {
            listen_addr: listen_override
                .or(file.listen_addr)
                .unwrap_or_else(default_listen_addr),
            database: database_override
                .or(file.database)
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}
