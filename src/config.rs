use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{ExporterError, Result};

/// Service configuration: an optional `config.toml`, overridden by
/// environment variables, overridden in turn by CLI flags in `main`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Port the ingest HTTP server binds to.
    pub listen_port: u16,
    pub pushgateway: PushgatewayConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PushgatewayConfig {
    /// Base URL of the Pushgateway; pushing is disabled when unset.
    pub url: Option<String>,
    /// Job grouping the snapshot is pushed under.
    pub job: String,
    /// Optional instance grouping.
    pub instance: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_port: 9100,
            pushgateway: PushgatewayConfig::default(),
        }
    }
}

impl Default for PushgatewayConfig {
    fn default() -> Self {
        Self {
            url: None,
            job: "tenzir".to_string(),
            instance: None,
        }
    }
}

impl Config {
    /// Load `config.toml` from the working directory if present, then
    /// apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = if Path::new("config.toml").exists() {
            Self::from_file("config.toml")?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ExporterError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(port) = std::env::var("TENZIR_EXPORTER_PORT") {
            match port.parse() {
                Ok(port) => self.listen_port = port,
                Err(_) => tracing::warn!("Ignoring unparseable TENZIR_EXPORTER_PORT '{}'", port),
            }
        }
        if let Ok(url) = std::env::var("TENZIR_PUSHGATEWAY_URL") {
            if !url.trim().is_empty() {
                self.pushgateway.url = Some(url);
            }
        }
        if let Ok(job) = std::env::var("TENZIR_PUSH_JOB") {
            self.pushgateway.job = job;
        }
        if let Ok(instance) = std::env::var("TENZIR_PUSH_INSTANCE") {
            self.pushgateway.instance = Some(instance);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_without_a_config_file() {
        let config = Config::default();
        assert_eq!(config.listen_port, 9100);
        assert_eq!(config.pushgateway.job, "tenzir");
        assert!(config.pushgateway.url.is_none());
    }

    #[test]
    fn loads_from_a_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "listen_port = 8080\n\n[pushgateway]\nurl = \"http://gw:9091\"\njob = \"tenzir-prod\""
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.listen_port, 8080);
        assert_eq!(config.pushgateway.url.as_deref(), Some("http://gw:9091"));
        assert_eq!(config.pushgateway.job, "tenzir-prod");
        assert!(config.pushgateway.instance.is_none());
    }

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "listen_port = 7000").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.listen_port, 7000);
        assert_eq!(config.pushgateway.job, "tenzir");
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = Config::from_file("/nonexistent/config.toml").unwrap_err();
        assert!(matches!(err, ExporterError::Config(_)));
    }
}
