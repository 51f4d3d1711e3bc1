//! Configuration manager for Callboard.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_SESSION_LIFETIME_DAYS: i64 = 14;
pub const DEFAULT_HISTORY_LIMIT: usize = 15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Instance name, shown in logs only.
    pub name: String,
    /// Bind address.
    pub address: String,
    /// Bind port.
    pub port: u16,
    /// Directory holding `users.json` and `state.json` snapshots.
    /// When absent, everything lives in memory.
    pub data_dir: Option<PathBuf>,
    /// Session token lifetime.
    pub session: Session,
    /// Call history bound.
    pub queue: Queue,
    /// Accounts created at first start.
    #[serde(skip_serializing)]
    pub seed: Seed,
    /// Optional pepper mixed into password digests.
    #[serde(skip_serializing)]
    pub pepper: Option<String>,
    version: String,
    #[serde(skip)]
    path: PathBuf,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: env!("CARGO_CRATE_NAME").to_owned(),
            address: "0.0.0.0".to_owned(),
            port: 8080,
            data_dir: None,
            session: Session::default(),
            queue: Queue::default(),
            seed: Seed::default(),
            pepper: None,
            version: VERSION.to_owned(),
            path: PathBuf::default(),
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    /// Days before an issued token expires.
    pub lifetime_days: i64,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            lifetime_days: DEFAULT_SESSION_LIFETIME_DAYS,
        }
    }
}

/// Queue configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Queue {
    /// Maximum number of kept previous calls.
    pub history_limit: usize,
}

impl Default for Queue {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// Accounts guaranteed to exist after first start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Seed {
    /// The protected admin account. Cannot be deleted, ever.
    pub admin: Account,
    /// Optional staff account for single-desk deployments.
    pub staff: Option<Account>,
}

impl Default for Seed {
    fn default() -> Self {
        Self {
            admin: Account {
                username: "admin".to_owned(),
                password: "admin".to_owned(),
            },
            staff: None,
        }
    }
}

/// Seeded account credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    /// Plaintext here; digested before storage.
    pub password: String,
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    pub fn read(self) -> Arc<Self> {
        let file_path = if self.path.as_os_str().is_empty() {
            Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        } else {
            self.path.clone()
        };

        match File::open(&file_path) {
            Ok(file) => {
                let mut config: Configuration =
                    match serde_yaml::from_reader(file) {
                        Ok(config) => config,
                        Err(err) => {
                            return Arc::new(self.error(err));
                        },
                    };

                // set app version.
                config.version = VERSION.to_owned();

                Arc::new(config)
            },
            Err(err) => Arc::new(self.error(err)),
        }
    }

    /// Return a default configuration as fallback.
    fn error(&self, err: impl std::error::Error) -> Self {
        tracing::error!(error = %err, "`config.yaml` file not found");
        Self {
            version: VERSION.to_owned(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Configuration::default();
        assert_eq!(config.session.lifetime_days, DEFAULT_SESSION_LIFETIME_DAYS);
        assert_eq!(config.queue.history_limit, DEFAULT_HISTORY_LIMIT);
        assert_eq!(config.seed.admin.username, "admin");
        assert!(config.seed.staff.is_none());
    }

    #[test]
    fn test_read_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "name: reception\nport: 9000\nqueue:\n  history_limit: 30\n",
        )
        .unwrap();

        let config = Configuration::default().path(path).read();
        assert_eq!(config.name, "reception");
        assert_eq!(config.port, 9000);
        assert_eq!(config.queue.history_limit, 30);
        // untouched keys keep their defaults.
        assert_eq!(config.session.lifetime_days, DEFAULT_SESSION_LIFETIME_DAYS);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = Configuration::default()
            .path(PathBuf::from("/nonexistent/config.yaml"))
            .read();
        assert_eq!(*config, Configuration::default());
    }
}
