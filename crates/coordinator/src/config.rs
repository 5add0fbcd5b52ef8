use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use registry::storage::DEFAULT_GATEWAY;
use registry::{ConfigError, RegistryConfig};

const SNAPSHOT_FILE: &str = "microjob_jobs.json";

pub struct CoordinatorConfig {
    pub http_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub snapshot_interval: Duration,
    pub ipfs_gateway: String,
    /// Load the demo jobs when starting from an empty registry.
    pub seed_demo: bool,
    pub registry: RegistryConfig,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            data_dir: PathBuf::from("."),
            snapshot_interval: Duration::from_secs(30),
            ipfs_gateway: DEFAULT_GATEWAY.to_string(),
            seed_demo: false,
            registry: RegistryConfig::default(),
        }
    }
}

impl CoordinatorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("HTTP_ADDR") {
            config.http_addr = parse("HTTP_ADDR", &raw)?;
        }
        if let Some(raw) = lookup("DATA_DIR") {
            config.data_dir = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("SNAPSHOT_INTERVAL_SECS") {
            let secs: u64 = parse("SNAPSHOT_INTERVAL_SECS", &raw)?;
            if secs == 0 {
                return Err(invalid("SNAPSHOT_INTERVAL_SECS", &raw));
            }
            config.snapshot_interval = Duration::from_secs(secs);
        }
        if let Some(raw) = lookup("IPFS_GATEWAY") {
            config.ipfs_gateway = raw;
        }
        if let Some(raw) = lookup("SEED_DEMO") {
            config.seed_demo = parse_bool("SEED_DEMO", &raw)?;
        }
        if let Some(raw) = lookup("VOTE_THRESHOLD") {
            config.registry.vote_threshold = parse("VOTE_THRESHOLD", &raw)?;
        }
        if let Some(raw) = lookup("ALLOW_SELF_CLAIM") {
            config.registry.allow_self_claim = parse_bool("ALLOW_SELF_CLAIM", &raw)?;
        }
        if let Some(raw) = lookup("ALLOW_PARTY_VOTES") {
            config.registry.allow_party_votes = parse_bool("ALLOW_PARTY_VOTES", &raw)?;
        }

        config.registry.validate()?;
        Ok(config)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }
}

fn invalid(key: &str, raw: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    }
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| invalid(key, raw))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, raw)),
    }
}
