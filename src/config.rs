use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Upper bound for one batched write or tier update run
    pub write_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Calendar days between glosa date and the defaulted due date
    pub grace_period_days: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/glosas".to_string(),
                max_connections: 20,
                acquire_timeout_secs: 10,
                write_timeout_secs: 30,
            },
            import: ImportConfig {
                grace_period_days: 30,
            },
        }
    }
}

impl AppConfig {
    /// Defaults, then `config/glosas.toml` if present, then `GLOSAS__*`
    /// variables. `DATABASE_URL`, `SERVER_HOST` and `SERVER_PORT` are
    /// honoured last.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("database.url", defaults.database.url)?
            .set_default("database.max_connections", i64::from(defaults.database.max_connections))?
            .set_default("database.acquire_timeout_secs", defaults.database.acquire_timeout_secs as i64)?
            .set_default("database.write_timeout_secs", defaults.database.write_timeout_secs as i64)?
            .set_default("import.grace_period_days", i64::from(defaults.import.grace_period_days))?
            .add_source(File::with_name("config/glosas").required(false))
            .add_source(Environment::with_prefix("GLOSAS").separator("__").try_parsing(true))
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option(
                "server.port",
                std::env::var("SERVER_PORT")
                    .ok()
                    .and_then(|p| p.parse::<u16>().ok())
                    .map(i64::from),
            )?
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.database.max_connections, 20);
        assert_eq!(cfg.import.grace_period_days, 30);
    }
}
