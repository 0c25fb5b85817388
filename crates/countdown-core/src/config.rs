use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_ENVIRONMENT: &str = "development";
pub const DEFAULT_CONFLICT_RETRIES: u32 = 3;
pub const ENV_PREFIX: &str = "COUNTDOWN_";

/// Top-level config (countdown.toml + COUNTDOWN_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    /// Free-form deployment label ("development", "production", ...).
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub timers: TimersConfig,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            cors: CorsConfig::default(),
            environment: default_environment(),
            timers: TimersConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Browser origins allowed to call the API (the web UI dev server by default).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_cors_origins")]
    pub origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: default_cors_origins(),
        }
    }
}

/// Timer lifecycle tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimersConfig {
    /// How many times a transition is re-planned after losing an
    /// optimistic-concurrency race before the caller gets a conflict.
    #[serde(default = "default_conflict_retries")]
    pub max_conflict_retries: u32,
}

impl Default for TimersConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: default_conflict_retries(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_environment() -> String {
    DEFAULT_ENVIRONMENT.to_string()
}
fn default_conflict_retries() -> u32 {
    DEFAULT_CONFLICT_RETRIES
}
fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:8000".to_string(),
    ]
}
fn default_db_path() -> String {
    format!("{}/.countdown/countdown.db", home_dir())
}

impl CountdownConfig {
    /// Load config from a TOML file with COUNTDOWN_* env var overrides.
    ///
    /// Nested keys are separated by a double underscore, so
    /// `COUNTDOWN_SERVER__PORT=9000` overrides `server.port`.
    /// A missing file is not an error: defaults fill every field.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: CountdownConfig =
            Figment::from(Serialized::defaults(CountdownConfig::default()))
                .merge(Toml::file(&path))
                .merge(Env::prefixed(ENV_PREFIX).split("__"))
                .extract()
                .map_err(|e| crate::error::CountdownError::Config(e.to_string()))?;

        Ok(config)
    }

    /// `bind:port` string suitable for `SocketAddr` parsing.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }
}

fn home_dir() -> String {
    std::env::var("HOME").unwrap_or_else(|_| ".".to_string())
}

fn default_config_path() -> String {
    format!("{}/.countdown/countdown.toml", home_dir())
}
