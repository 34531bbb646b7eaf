//! Server configuration loading and validation.
//!
//! Resolution order (highest to lowest priority), per file:
//! 1. Explicit `--config` path
//! 2. `PROBCALC_CONFIG` environment variable
//! 3. XDG config home (`~/.config/probcalc/config.toml`)
//! 4. Built-in defaults
//!
//! After the file is loaded, `PROBCALC_BIND` / `PROBCALC_PORT` override the
//! listen address, and CLI flags override everything.

use crate::api::{RequestLimits, DEFAULT_MAX_SUPPORT_POINTS};
use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable names.
pub const ENV_CONFIG_PATH: &str = "PROBCALC_CONFIG";
pub const ENV_BIND: &str = "PROBCALC_BIND";
pub const ENV_PORT: &str = "PROBCALC_PORT";

/// Standard config file name.
const CONFIG_FILENAME: &str = "config.toml";

/// Application name for XDG directories.
const APP_NAME: &str = "probcalc";

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid TOML in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

impl From<ConfigError> for pc_common::Error {
    fn from(err: ConfigError) -> Self {
        pc_common::Error::Config(err.to_string())
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address (default: 127.0.0.1).
    pub bind: String,
    /// Port (default: 8000). 0 picks an ephemeral port.
    pub port: u16,
    /// Worker threads pulling requests off the listener.
    pub workers: usize,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
    /// Largest support a single request may produce.
    pub max_support_points: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8000,
            workers: 4,
            max_body_bytes: 64 * 1024,
            max_support_points: DEFAULT_MAX_SUPPORT_POINTS,
        }
    }
}

impl ServerConfig {
    /// Resolve `bind:port` to a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let text = format!("{}:{}", self.bind, self.port);
        text.to_socket_addrs()
            .map_err(|e| ConfigError::Invalid {
                field: "bind",
                message: format!("{}: {}", text, e),
            })?
            .next()
            .ok_or_else(|| ConfigError::Invalid {
                field: "bind",
                message: format!("{} resolves to no address", text),
            })
    }

    pub fn limits(&self) -> RequestLimits {
        RequestLimits {
            max_support_points: self.max_support_points,
        }
    }

    /// Semantic validation after all layers are merged.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid {
                field: "workers",
                message: "must be at least 1".to_string(),
            });
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_body_bytes",
                message: "must be at least 1".to_string(),
            });
        }
        if self.max_support_points == 0 {
            return Err(ConfigError::Invalid {
                field: "max_support_points",
                message: "must be at least 1".to_string(),
            });
        }
        self.socket_addr().map(|_| ())
    }
}

/// Where the configuration came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,
    /// Set via environment variable.
    Environment,
    /// Found in XDG config directory.
    XdgConfig,
    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Resolved configuration with provenance information.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    pub server: ServerConfig,
    /// Path of the loaded file (None if using defaults).
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Configuration resolution options (CLI layer).
#[derive(Debug, Default, Clone)]
pub struct ConfigOptions {
    /// Explicit config file path (highest priority).
    pub config_path: Option<PathBuf>,
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub workers: Option<usize>,
}

/// Load configuration with the standard resolution order.
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig, ConfigError> {
    let (path, source) = resolve_config_path(options.config_path.as_deref())?;

    let mut server = match &path {
        Some(p) => read_config_file(p)?,
        None => ServerConfig::default(),
    };

    apply_env_overrides(&mut server)?;

    if let Some(bind) = &options.bind {
        server.bind = bind.clone();
    }
    if let Some(port) = options.port {
        server.port = port;
    }
    if let Some(workers) = options.workers {
        server.workers = workers;
    }

    server.validate()?;

    Ok(ResolvedConfig {
        server,
        path,
        source,
    })
}

/// Parse a config file from disk.
pub fn read_config_file(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn resolve_config_path(
    cli_path: Option<&Path>,
) -> Result<(Option<PathBuf>, ConfigSource), ConfigError> {
    // 1. CLI argument: must exist when given explicitly
    if let Some(path) = cli_path {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        return Ok((Some(path.to_path_buf()), ConfigSource::CliArgument));
    }

    // 2. Environment variable
    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if !path.exists() {
            return Err(ConfigError::NotFound { path });
        }
        return Ok((Some(path), ConfigSource::Environment));
    }

    // 3. XDG config directory
    if let Some(xdg_config) = dirs::config_dir() {
        let path = xdg_config.join(APP_NAME).join(CONFIG_FILENAME);
        if path.exists() {
            return Ok((Some(path), ConfigSource::XdgConfig));
        }
    }

    // 4. Built-in default
    Ok((None, ConfigSource::BuiltinDefault))
}

fn apply_env_overrides(server: &mut ServerConfig) -> Result<(), ConfigError> {
    if let Ok(bind) = std::env::var(ENV_BIND) {
        server.bind = bind;
    }
    if let Ok(port) = std::env::var(ENV_PORT) {
        server.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
            field: "port",
            message: format!("{}={} is not a port number", ENV_PORT, port),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.socket_addr().unwrap().port(), 8000);
        assert_eq!(config.limits().max_support_points, DEFAULT_MAX_SUPPORT_POINTS);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 9100\nworkers = 2").unwrap();

        let config = read_config_file(file.path()).unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.workers, 2);
        assert_eq!(config.bind, "127.0.0.1");
        assert_eq!(config.max_body_bytes, 64 * 1024);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "prot = 9100").unwrap();
        let err = read_config_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_explicit_path_and_cli_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 9100\nmax_support_points = 500").unwrap();

        let options = ConfigOptions {
            config_path: Some(file.path().to_path_buf()),
            port: Some(9200),
            workers: Some(8),
            ..Default::default()
        };
        let resolved = load_config(&options).unwrap();
        assert_eq!(resolved.source, ConfigSource::CliArgument);
        assert_eq!(resolved.server.max_support_points, 500);
        assert_eq!(resolved.server.workers, 8);
        // CLI flags win over the file; PROBCALC_PORT (if set) is also beaten here.
        assert_eq!(resolved.server.port, 9200);
    }

    #[test]
    fn test_missing_explicit_path() {
        let options = ConfigOptions {
            config_path: Some(PathBuf::from("/nonexistent/probcalc/config.toml")),
            ..Default::default()
        };
        assert!(matches!(
            load_config(&options).unwrap_err(),
            ConfigError::NotFound { .. }
        ));
    }

    #[test]
    fn test_semantic_validation() {
        let config = ServerConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::Invalid { field: "workers", .. }
        ));

        let config = ServerConfig {
            max_support_points: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            bind: "not an address".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::Invalid { field: "bind", .. }
        ));
    }

    #[test]
    fn test_config_error_maps_to_common_error() {
        let err: pc_common::Error = ConfigError::Invalid {
            field: "workers",
            message: "must be at least 1".to_string(),
        }
        .into();
        assert_eq!(err.code(), 40);
        assert!(err.to_string().contains("workers"));
    }
}
