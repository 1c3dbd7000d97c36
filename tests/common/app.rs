use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;

use assessment_analytics::config::{AnalyticsConfig, Config};
use assessment_analytics::routes::build_router;
use assessment_analytics::state::AppState;
use assessment_analytics::store::Store;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    _temp_dir: TempDir,
}

impl TestApp {
    pub fn store(&self) -> &Store {
        self.state.store()
    }
}

fn test_config(sled_path: String, analytics: AnalyticsConfig) -> Config {
    // Built directly: set_var would race across parallel tests.
    Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        sled_path,
        cors_origin: "http://localhost:5173".to_string(),
        analytics,
    }
}

pub async fn spawn_with_analytics(analytics: AnalyticsConfig) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let sled_path = temp_dir.path().join("assessment-test.sled");
    let config = test_config(sled_path.to_string_lossy().to_string(), analytics);

    let store = Arc::new(Store::open(&config.sled_path).expect("open store"));
    store.run_migrations().expect("run migrations");

    let state = AppState::new(store, &config);
    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        config,
        _temp_dir: temp_dir,
    }
}

pub async fn spawn_test_server() -> TestApp {
    spawn_with_analytics(AnalyticsConfig::default()).await
}
