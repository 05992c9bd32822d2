// server/src/config.rs
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_yaml2 as serde_yaml;

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5002
}

fn default_graph_path() -> PathBuf {
    PathBuf::from("knowledge_graph.json")
}

fn default_request_timeout_secs() -> u64 {
    10
}

/// Server settings, loadable from a YAML file with per-field defaults so a
/// partial file works. CLI flags override whatever the file says.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_graph_path")]
    pub graph_path: PathBuf,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
            graph_path: default_graph_path(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            None => Ok(ServerConfig::default()),
            Some(path) => {
                let data = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                serde_yaml::from_str(&data)
                    .with_context(|| format!("invalid config file {}", path.display()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_a_file() {
        let config = ServerConfig::load(None).unwrap();
        assert_eq!(config.port, 5002);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn partial_yaml_keeps_defaults_for_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.yaml");
        std::fs::write(&path, "port: 8080\n").unwrap();

        let config = ServerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.graph_path, PathBuf::from("knowledge_graph.json"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(ServerConfig::load(Some(Path::new("/nonexistent/server.yaml"))).is_err());
    }
}
