use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Model artifact configuration
    pub models: ModelsConfig,

    /// Chart output configuration
    pub charts: ChartsConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: FEASIBILITY_)
            .add_source(
                config::Environment::with_prefix("FEASIBILITY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                http_port: default_http_port(),
            },
            models: ModelsConfig::default(),
            charts: ChartsConfig::default(),
            observability: ObservabilityConfig {
                log_level: default_log_level(),
                json_logs: false,
                prometheus_enabled: true,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Directory holding the model artifacts
    #[serde(default = "default_models_dir")]
    pub dir: PathBuf,

    /// Feasibility classifier artifact file name
    #[serde(default = "default_feasibility_file")]
    pub feasibility_file: String,

    /// Cost regressor artifact file name
    #[serde(default = "default_cost_file")]
    pub cost_file: String,

    /// Time regressor artifact file name
    #[serde(default = "default_time_file")]
    pub time_file: String,

    /// Reject project types outside the known set instead of encoding
    /// them as the reference category
    #[serde(default)]
    pub strict_project_type: bool,
}

impl ModelsConfig {
    pub fn feasibility_path(&self) -> PathBuf {
        self.dir.join(&self.feasibility_file)
    }

    pub fn cost_path(&self) -> PathBuf {
        self.dir.join(&self.cost_file)
    }

    pub fn time_path(&self) -> PathBuf {
        self.dir.join(&self.time_file)
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            dir: default_models_dir(),
            feasibility_file: default_feasibility_file(),
            cost_file: default_cost_file(),
            time_file: default_time_file(),
            strict_project_type: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartsConfig {
    /// Directory the four chart files are written to and served from
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            static_dir: default_static_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8000
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("./models")
}

fn default_feasibility_file() -> String {
    "feasibility_model.json".to_string()
}

fn default_cost_file() -> String {
    "cost_model.json".to_string()
}

fn default_time_file() -> String {
    "time_model.json".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./static")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
