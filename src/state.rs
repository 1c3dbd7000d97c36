use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    store: Arc<Store>,
    config: Arc<Config>,
    started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<Store>, config: &Config) -> Self {
        Self {
            store,
            config: Arc::new(config.clone()),
            started_at: Instant::now(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
