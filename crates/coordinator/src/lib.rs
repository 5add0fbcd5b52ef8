pub mod api;
pub mod config;
pub mod events;
pub mod persistence;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use registry::storage::{ContentStore, MockIpfsStore};
use registry::JobRegistry;

use crate::config::CoordinatorConfig;

pub struct AppState {
    pub registry: Arc<JobRegistry>,
    pub store: Arc<dyn ContentStore>,
    pub config: CoordinatorConfig,
}

impl AppState {
    pub fn new(registry: Arc<JobRegistry>, config: CoordinatorConfig) -> Self {
        let store = Arc::new(MockIpfsStore::new(config.ipfs_gateway.clone()));
        Self {
            registry,
            store,
            config,
        }
    }
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

pub fn setup_test_coordinator() -> Arc<AppState> {
    let config = CoordinatorConfig {
        http_addr: "127.0.0.1:0".parse().unwrap(),
        ..Default::default()
    };
    let registry = Arc::new(JobRegistry::new(config.registry.clone()).unwrap());
    Arc::new(AppState::new(registry, config))
}
