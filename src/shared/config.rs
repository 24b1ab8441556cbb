use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub sync: SyncConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    pub sync_interval: u64,
    pub max_retries: u32,
    pub dispatch_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                database_url: format!("sqlite:{}", default_database_path().display()),
                max_connections: 5,
            },
            sync: SyncConfig {
                auto_sync: true,
                sync_interval: 60,
                max_retries: 3,
                dispatch_timeout_secs: 10,
            },
            api: ApiConfig {
                base_url: "http://localhost:3000".to_string(),
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("REFERRA_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.storage.database_url = v;
            }
        }
        if let Ok(v) = std::env::var("REFERRA_API_BASE_URL") {
            if !v.trim().is_empty() {
                cfg.api.base_url = v;
            }
        }
        if let Ok(v) = std::env::var("REFERRA_AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Ok(v) = std::env::var("REFERRA_SYNC_INTERVAL") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.sync_interval = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("REFERRA_MAX_RETRIES") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.max_retries = value.min(u32::MAX as u64) as u32;
            }
        }
        if let Ok(v) = std::env::var("REFERRA_DISPATCH_TIMEOUT_SECS") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.dispatch_timeout_secs = value.max(1);
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.storage.database_url.trim().is_empty() {
            return Err("Storage database_url cannot be empty".to_string());
        }
        if self.storage.max_connections == 0 {
            return Err("Storage max_connections must be greater than 0".to_string());
        }
        if self.sync.max_retries == 0 {
            return Err("Sync max_retries must be greater than 0".to_string());
        }
        if self.sync.dispatch_timeout_secs == 0 {
            return Err("Sync dispatch_timeout_secs must be greater than 0".to_string());
        }
        if self.api.base_url.trim().is_empty() {
            return Err("Api base_url cannot be empty".to_string());
        }
        Ok(())
    }
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("./data"))
        .join("referra")
        .join("referra.db")
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}
