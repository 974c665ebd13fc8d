//! Agent configuration loaded from the working directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::warn;

use dva_core::PayloadMode;

/// Errors raised while loading configuration at startup. All of these are
/// fatal: the process exits non-zero instead of retrying.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("token file not found at {0}")]
    TokenMissing(PathBuf),

    #[error("token file {0} is empty")]
    TokenEmpty(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: io::Error,
    },
}

/// API endpoint table.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub task: String,
    pub task_rewards: String,
    pub my_intelligence: String,
    pub conversation: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            task: "https://agent.gata.xyz/api/task".to_string(),
            task_rewards: "https://agent.gata.xyz/api/task_rewards".to_string(),
            my_intelligence: "https://agent.gata.xyz/api/my_intelligence".to_string(),
            conversation: "https://agent.gata.xyz/api/conversation".to_string(),
        }
    }
}

const CHROME_VERSIONS: &[&str] = &["133.0.0.0", "132.0.0.0", "131.0.0.0"];

/// Agent configuration. Loaded once at startup and shared by reference
/// with every component.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer token from `token.txt`.
    pub bearer_token: String,

    /// Proxy URLs from `proxies.txt`; may be empty.
    pub proxies: Vec<String>,

    pub endpoints: Endpoints,

    /// Maximum submission attempts per task.
    pub max_retries: u32,

    /// Per-request timeout. Every HTTP call carries this.
    pub request_timeout: Duration,

    /// Probe the task endpoint at the start of each cycle.
    pub health_check: bool,

    /// Exchange a chat message every N cycles; 0 disables chat.
    pub chat_every_cycles: u64,

    /// Which protocol variant the encrypted envelope carries.
    pub payload_mode: PayloadMode,

    /// Directory holding the credential files; results and request
    /// history are written here too.
    pub data_dir: PathBuf,
}

impl Config {
    /// Load configuration from `dir`.
    ///
    /// `token.txt` is required and must be non-empty. `proxies.txt` is
    /// optional; its absence only produces a warning.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let token_path = dir.join("token.txt");
        let bearer_token = match fs::read_to_string(&token_path) {
            Ok(raw) => raw.trim().to_string(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::TokenMissing(token_path));
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: token_path,
                    source,
                });
            }
        };
        if bearer_token.is_empty() {
            return Err(ConfigError::TokenEmpty(token_path));
        }

        let proxies_path = dir.join("proxies.txt");
        let proxies: Vec<String> = match fs::read_to_string(&proxies_path) {
            Ok(raw) => raw
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %proxies_path.display(), "proxies.txt not found, running without proxies");
                Vec::new()
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: proxies_path,
                    source,
                });
            }
        };
        if proxies.is_empty() && proxies_path.exists() {
            warn!("No proxies found in proxies.txt");
        }

        Ok(Self {
            bearer_token,
            proxies,
            endpoints: Endpoints::default(),
            max_retries: 3,
            request_timeout: Duration::from_secs(30),
            health_check: true,
            chat_every_cycles: 10,
            payload_mode: PayloadMode::default(),
            data_dir: dir.to_path_buf(),
        })
    }

    /// Random proxy from the configured list, if any.
    pub fn random_proxy(&self) -> Option<&str> {
        self.proxies
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
    }

    /// Browser-like user agent with a rotated Chrome version.
    pub fn user_agent(&self) -> String {
        let version = CHROME_VERSIONS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(CHROME_VERSIONS[0]);
        format!(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/{version} Safari/537.36"
        )
    }
}
