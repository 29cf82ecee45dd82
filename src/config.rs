//! Runtime configuration resolved from flags and the environment

use advice_client::{AdviceClientConfig, DEFAULT_ENDPOINT};
use std::path::{Path, PathBuf};
use std::time::Duration;
use storage::KvConfig;

use crate::cli::Cli;

/// Directory name under the platform data dir
pub const APP_DIR_NAME: &str = "social-confidence";

/// Store file name inside the data dir
pub const DB_FILE_NAME: &str = "store.db";

/// Default advice request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Resolved settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// Fill unset flags with defaults
    pub fn from_cli(cli: &Cli) -> Self {
        let defaults = Self::default();
        Self {
            data_dir: cli.data_dir.clone().unwrap_or(defaults.data_dir),
            endpoint: cli.endpoint.clone().unwrap_or(defaults.endpoint),
            timeout: cli
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn kv_config(&self) -> KvConfig {
        KvConfig::new(path_string(&self.db_path()))
    }

    pub fn advice_config(&self) -> AdviceClientConfig {
        AdviceClientConfig::new(self.endpoint.clone()).with_timeout(self.timeout)
    }
}

/// Platform data dir, or a dot directory in the working dir
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(format!(".{APP_DIR_NAME}")))
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
