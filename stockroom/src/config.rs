//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable
//! overrides. The file path defaults to `config.yaml` and can be set via the
//! `-f` flag or the `STOCKROOM_CONFIG` environment variable.
//!
//! Sources are merged in order (later overrides earlier):
//!
//! 1. **YAML config file** - base configuration
//! 2. **Environment variables** - `STOCKROOM_`-prefixed, double underscore
//!    for nesting (`STOCKROOM_DATABASE__TYPE=memory`)
//! 3. **DATABASE_URL** - overrides `database.url` if set

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::auth::Role;
use crate::errors::Error;

/// Simple CLI args - just for specifying the config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "STOCKROOM_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Deprecated spelling: use `database.url`. Kept as a `DATABASE_URL` landing slot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// Record persistence - external PostgreSQL or in-process memory
    pub database: DatabaseConfig,
    /// Attachment content storage backend (ignored in memory mode)
    pub storage: StorageConfig,
    /// Login accounts for the access gate
    pub accounts: Vec<AccountConfig>,
    /// Resource limits
    pub limits: LimitsConfig,
    /// CORS configuration
    pub cors: CorsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3030,
            database_url: None,
            database: DatabaseConfig::default(),
            storage: StorageConfig::default(),
            accounts: AccountConfig::fixed_accounts(),
            limits: LimitsConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

/// Record persistence backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DatabaseConfig {
    /// External PostgreSQL database
    External { url: String },
    /// In-process memory store; records are lost on shutdown. Useful for
    /// development and tests.
    Memory,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig::External {
            url: "postgresql://localhost/stockroom".to_string(),
        }
    }
}

/// Attachment content storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Files on the local filesystem under `path`
    Local { path: PathBuf },
    /// Postgres large objects in the main database
    Postgres,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Local {
            path: PathBuf::from("./media"),
        }
    }
}

/// One login account for the access gate.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AccountConfig {
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl AccountConfig {
    /// The three fixed accounts of the source system.
    pub fn fixed_accounts() -> Vec<AccountConfig> {
        vec![
            AccountConfig {
                username: "admin".to_string(),
                password: "admin".to_string(),
                role: Role::Admin,
            },
            AccountConfig {
                username: "editor".to_string(),
                password: "editor".to_string(),
                role: Role::Editor,
            },
            AccountConfig {
                username: "viewer".to_string(),
                password: "viewer".to_string(),
                role: Role::Viewer,
            },
        ]
    }
}

/// Resource limits for protecting system capacity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum accepted multipart body size in bytes
    pub max_upload_size: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins; "*" for any
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        // DATABASE_URL wins over whatever the file configured
        if let Some(url) = config.database_url.take() {
            config.database = DatabaseConfig::External { url };
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("STOCKROOM_").split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.accounts.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: at least one account must be configured".to_string(),
            });
        }

        let mut usernames = std::collections::HashSet::new();
        for account in &self.accounts {
            if account.username.is_empty() {
                return Err(Error::Internal {
                    operation: "Config validation: account username cannot be empty".to_string(),
                });
            }
            if !usernames.insert(&account.username) {
                return Err(Error::Internal {
                    operation: format!("Config validation: duplicate account username '{}'", account.username),
                });
            }
        }

        if self.limits.max_upload_size == 0 {
            return Err(Error::Internal {
                operation: "Config validation: limits.max_upload_size must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_carry_the_three_fixed_accounts() {
        let config = Config::default();
        assert_eq!(config.accounts.len(), 3);
        assert!(config.validate().is_ok());

        let admin = config.accounts.iter().find(|a| a.username == "admin").unwrap();
        assert_eq!(admin.role, Role::Admin);
    }

    #[test]
    fn test_database_url_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r#"
                database:
                  type: memory
                "#,
            )?;
            jail.set_env("DATABASE_URL", "postgresql://db.internal/assets");

            let args = Args {
                config: "config.yaml".to_string(),
                validate: false,
            };
            let config = Config::load(&args).expect("config should load");

            match config.database {
                DatabaseConfig::External { url } => assert_eq!(url, "postgresql://db.internal/assets"),
                DatabaseConfig::Memory => panic!("DATABASE_URL should override memory mode"),
            }
            Ok(())
        });
    }

    #[test]
    fn test_duplicate_usernames_rejected() {
        let mut config = Config::default();
        config.accounts.push(AccountConfig {
            username: "admin".to_string(),
            password: "other".to_string(),
            role: Role::Viewer,
        });
        assert!(config.validate().is_err());
    }
}
