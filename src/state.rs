use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::errors::AppError;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(conn: Connection, config: AppConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            config,
        }
    }

    pub fn db(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.db
            .lock()
            .map_err(|_| AppError::Storage(anyhow::anyhow!("database lock poisoned")))
    }

    /// Releases the storage handle for an explicit close at shutdown.
    pub fn into_connection(self) -> anyhow::Result<Connection> {
        Arc::try_unwrap(self.db)
            .map_err(|_| anyhow::anyhow!("storage handle still shared"))?
            .into_inner()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))
    }
}
