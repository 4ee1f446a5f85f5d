use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (default: 0.0.0.0)
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port (default: 5000)
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Explicit artifact path. Relative paths are resolved against the executable's directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Artifact file name next to the executable when `path` is unset
    #[serde(default = "default_model_file")]
    pub file_name: String,
}

fn default_model_file() -> String {
    "best_model.json".to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: None,
            file_name: default_model_file(),
        }
    }
}

impl ModelConfig {
    pub fn resolve_path(&self, exe_dir: &Path) -> PathBuf {
        match &self.path {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => exe_dir.join(p),
            None => exe_dir.join(&self.file_name),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level / filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info,cardiosense=debug".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .set_default("model.file_name", default_model_file())?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("CARDIO_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (CARDIO__SERVER__PORT, etc.)
            .add_source(
                Environment::with_prefix("CARDIO")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            server: ServerConfig::default(),
            model: ModelConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.host.trim().is_empty() {
            errors.push("server.host must not be empty".to_string());
        }

        if self.server.port == 0 {
            errors.push("server.port must be > 0".to_string());
        }

        if self.model.path.is_none() && self.model.file_name.trim().is_empty() {
            errors.push("model.file_name must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_port_5000() {
        let cfg = AppConfig::default_config();
        assert_eq!(cfg.server.bind_addr(), "0.0.0.0:5000");
        assert_eq!(cfg.model.file_name, "best_model.json");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn model_path_resolves_against_executable_dir() {
        let exe_dir = Path::new("/opt/cardiosense/bin");
        let mut model = ModelConfig::default();
        assert_eq!(
            model.resolve_path(exe_dir),
            PathBuf::from("/opt/cardiosense/bin/best_model.json")
        );

        model.path = Some(PathBuf::from("models/rf.json"));
        assert_eq!(
            model.resolve_path(exe_dir),
            PathBuf::from("/opt/cardiosense/bin/models/rf.json")
        );

        model.path = Some(PathBuf::from("/srv/models/rf.json"));
        assert_eq!(model.resolve_path(exe_dir), PathBuf::from("/srv/models/rf.json"));
    }

    #[test]
    fn load_from_reads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            "[server]\nport = 8081\n\n[logging]\njson = true\n",
        )
        .unwrap();

        let cfg = AppConfig::load_from(dir.path()).unwrap();
        assert_eq!(cfg.server.port, 8081);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert!(cfg.logging.json);
        assert_eq!(cfg.model.file_name, "best_model.json");
    }

    #[test]
    fn validate_collects_errors() {
        let mut cfg = AppConfig::default_config();
        cfg.server.host = " ".to_string();
        cfg.server.port = 0;
        let errors = cfg.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
