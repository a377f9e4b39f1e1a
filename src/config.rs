use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::game::DEFAULT_MAX_TARGETS;

/// Environment variable consulted when `--config` is not given.
pub const CONFIG_ENV: &str = "PODSNAKE_CONFIG";

/// Smallest board that still fits the starting snake: its tail sits two
/// cells behind a head placed a quarter of the way in.
const MIN_WIDTH: i32 = 8;
const MIN_HEIGHT: i32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cluster name shown in the header.
    pub cluster: String,
    /// Milliseconds between game ticks.
    pub tick_ms: u64,
    /// Deadline for a single pod fetch or delete.
    pub request_timeout_secs: u64,
    /// Deadline for listing namespaces.
    pub namespace_timeout_secs: u64,
    /// Seed for pod placement and pod picking. Random when absent.
    pub seed: Option<u64>,
    /// Where log output goes. Logging is off without it, the terminal is busy.
    pub log_file: Option<PathBuf>,
    pub board: BoardConfig,
    pub roster: RosterConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub width: i32,
    pub height: i32,
    /// Pods visible on the board at once.
    pub max_targets: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Artificial delay added to every provider call.
    pub latency_ms: u64,
    /// Pod names keyed by namespace.
    pub namespaces: BTreeMap<String, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cluster: "local".to_owned(),
            tick_ms: 150,
            request_timeout_secs: 5,
            namespace_timeout_secs: 10,
            seed: None,
            log_file: None,
            board: BoardConfig::default(),
            roster: RosterConfig::default(),
        }
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig { width: 40, height: 20, max_targets: DEFAULT_MAX_TARGETS }
    }
}

impl Default for RosterConfig {
    fn default() -> Self {
        let mut namespaces = BTreeMap::new();
        namespaces.insert(
            "default".to_owned(),
            (1..=6).map(|i| format!("snakefood-{}", i)).collect(),
        );
        namespaces.insert(
            "kube-system".to_owned(),
            vec!["coredns-0".to_owned(), "coredns-1".to_owned(), "kube-proxy-0".to_owned()],
        );
        RosterConfig { latency_ms: 0, namespaces }
    }
}

impl Config {
    /// Loads the file at `path`, or the defaults when there is no path.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .map_err(|source| ConfigError::Io { path: path.to_owned(), source })?;
                Self::from_yaml(&contents)?
            }
            None => Config::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Config::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board.width < MIN_WIDTH || self.board.height < MIN_HEIGHT {
            return Err(ConfigError::Invalid(format!(
                "board must be at least {}x{}, got {}x{}",
                MIN_WIDTH, MIN_HEIGHT, self.board.width, self.board.height
            )));
        }
        if self.board.max_targets == 0 {
            return Err(ConfigError::Invalid("board.max_targets must be positive".to_owned()));
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::Invalid("tick_ms must be positive".to_owned()));
        }
        if self.request_timeout_secs == 0 || self.namespace_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be positive".to_owned()));
        }
        Ok(())
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn namespace_timeout(&self) -> Duration {
        Duration::from_secs(self.namespace_timeout_secs)
    }
}

/// Picks the config path: explicit flag first, then `PODSNAKE_CONFIG`.
pub fn resolve_path(flag: Option<PathBuf>) -> Option<PathBuf> {
    flag.or_else(|| {
        std::env::var_os(CONFIG_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    })
}
