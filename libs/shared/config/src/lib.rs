use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Supabase,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "in_memory" => Ok(StorageBackend::Memory),
            "supabase" | "postgrest" => Ok(StorageBackend::Supabase),
            other => Err(format!("Unknown storage backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub storage_backend: StorageBackend,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub max_slot_range_days: i64,
    pub seed_demo_data: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            storage_backend: StorageBackend::Memory,
            supabase_url: String::new(),
            supabase_service_key: String::new(),
            max_slot_range_days: 31,
            seed_demo_data: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| {
                    warn!("SERVER_HOST not set, using default");
                    defaults.server_host.clone()
                }),
            server_port: parse_var("SERVER_PORT", defaults.server_port),
            storage_backend: parse_var("STORAGE_BACKEND", defaults.storage_backend),
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_KEY not set, using empty value");
                    String::new()
                }),
            max_slot_range_days: parse_var("MAX_SLOT_RANGE_DAYS", defaults.max_slot_range_days),
            seed_demo_data: parse_var("SEED_DEMO_DATA", defaults.seed_demo_data),
        };

        if config.storage_backend == StorageBackend::Supabase && !config.is_supabase_configured() {
            warn!("Supabase backend selected but SUPABASE_URL/SUPABASE_SERVICE_KEY are missing");
        }

        config
    }

    pub fn is_supabase_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_service_key.is_empty()
    }

    /// Backend actually used at startup; Supabase without credentials falls back to memory.
    pub fn effective_backend(&self) -> StorageBackend {
        match self.storage_backend {
            StorageBackend::Supabase if self.is_supabase_configured() => StorageBackend::Supabase,
            StorageBackend::Supabase => {
                warn!("Falling back to in-memory storage");
                StorageBackend::Memory
            }
            StorageBackend::Memory => StorageBackend::Memory,
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value ({}), using default {:?}", name, raw, default);
            default
        }),
        Err(_) => {
            warn!("{} not set, using default {:?}", name, default);
            default
        }
    }
}
