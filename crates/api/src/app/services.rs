//! Storage selection and service wiring.
//!
//! `USE_PERSISTENT_STORES=true` selects Postgres (migrated on startup);
//! otherwise everything lives in process memory and is lost on exit.

use std::ops::Deref;
use std::sync::Arc;

use stocksmart_infra::{InMemoryStore, PostgresStore, Services, SharedStorage, StoreError};

use crate::config::ApiConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    InMemory,
    Postgres,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::InMemory => "in_memory",
            StorageBackend::Postgres => "postgres",
        }
    }
}

/// Services shared by every handler.
pub struct AppServices {
    backend: StorageBackend,
    services: Services,
}

impl AppServices {
    pub fn new(backend: StorageBackend, storage: SharedStorage) -> Self {
        Self {
            backend,
            services: Services::new(storage),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(StorageBackend::InMemory, Arc::new(InMemoryStore::new()))
    }

    pub fn backend(&self) -> StorageBackend {
        self.backend
    }
}

impl Deref for AppServices {
    type Target = Services;

    fn deref(&self) -> &Services {
        &self.services
    }
}

pub async fn build_services(config: &ApiConfig) -> Result<AppServices, StoreError> {
    if !config.use_persistent_stores {
        tracing::info!("using in-memory stores");
        return Ok(AppServices::in_memory());
    }

    let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| StoreError::Unavailable("DATABASE_URL is not set".to_string()))?;
    let store = PostgresStore::connect(url, config.database_max_connections).await?;
    store.migrate().await?;
    tracing::info!(
        max_connections = config.database_max_connections,
        "using postgres stores"
    );
    Ok(AppServices::new(StorageBackend::Postgres, Arc::new(store)))
}
