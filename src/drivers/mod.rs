//! Database drivers benchmarked by the probe endpoints.
//!
//! Every driver performs the same read: ten rows from an `employees`
//! table. Connections are opened fresh for each probe request and never
//! pooled, so connection setup is part of what gets measured.

pub mod neon;
pub mod sqlite;
pub mod supabase;
pub mod turso;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::DriverError;
use crate::models::BackendId;

pub use neon::NeonDriver;
pub use sqlite::SqliteDriver;
pub use supabase::SupabaseDriver;
pub use turso::TursoDriver;

/// The read every backend runs
pub const EMPLOYEES_QUERY: &str = "SELECT emp_no, first_name, last_name FROM employees LIMIT 10";

/// Rows returned per read
pub const EMPLOYEES_LIMIT: usize = 10;

/// A data service that can be connected to and read from
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Registry key of this driver
    fn backend(&self) -> BackendId;

    /// Open a fresh client/connection
    async fn connect(&self) -> Result<Box<dyn DriverConnection>, DriverError>;
}

/// A live connection produced by [`DatabaseDriver::connect`]
#[async_trait]
pub trait DriverConnection: Send {
    /// Run one read and return its rows as JSON
    async fn read_batch(&mut self) -> Result<Value, DriverError>;
}

/// Build a non-pooling HTTP client for one probe request
pub(crate) fn fresh_http_client(timeout: Duration) -> Result<reqwest::Client, DriverError> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .timeout(timeout)
        .build()
        .map_err(|e| DriverError::Connect(e.to_string()))
}

/// Fail with a query error on non-2xx, keeping a snippet of the body
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, DriverError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let snippet: String = body.chars().take(200).collect();
    Err(DriverError::Query(format!("upstream returned {}: {}", status, snippet)))
}

/// Drivers available to the probe server, keyed by backend id
#[derive(Clone, Default)]
pub struct DriverRegistry {
    drivers: BTreeMap<BackendId, Arc<dyn DatabaseDriver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a driver under its own backend id, replacing any previous one
    pub fn register(&mut self, driver: Arc<dyn DatabaseDriver>) {
        let backend = driver.backend();
        tracing::info!(backend = %backend, "Registered database driver");
        self.drivers.insert(backend, driver);
    }

    pub fn get(&self, backend: &BackendId) -> Option<Arc<dyn DatabaseDriver>> {
        self.drivers.get(backend).cloned()
    }

    /// Registered backend ids in sorted order
    pub fn backends(&self) -> Vec<BackendId> {
        self.drivers.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BackendId, &Arc<dyn DatabaseDriver>)> {
        self.drivers.iter()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Driver returning a fixed payload, optionally failing every read
    pub struct StaticDriver {
        pub backend: &'static str,
        pub fail: bool,
        pub connects: Arc<AtomicUsize>,
        pub reads: Arc<AtomicUsize>,
    }

    impl StaticDriver {
        pub fn new(backend: &'static str) -> Self {
            Self {
                backend,
                fail: false,
                connects: Arc::new(AtomicUsize::new(0)),
                reads: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn failing(backend: &'static str) -> Self {
            Self {
                fail: true,
                ..Self::new(backend)
            }
        }
    }

    struct StaticConnection {
        fail: bool,
        reads: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DatabaseDriver for StaticDriver {
        fn backend(&self) -> BackendId {
            BackendId::new(self.backend)
        }

        async fn connect(&self) -> Result<Box<dyn DriverConnection>, DriverError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(StaticConnection {
                fail: self.fail,
                reads: Arc::clone(&self.reads),
            }))
        }
    }

    #[async_trait]
    impl DriverConnection for StaticConnection {
        async fn read_batch(&mut self) -> Result<Value, DriverError> {
            let n = self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DriverError::Query("simulated failure".to_string()));
            }
            Ok(serde_json::json!([{ "emp_no": 10001, "read": n }]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::StaticDriver;
    use super::*;

    #[test]
    fn test_registry_register_and_lookup() {
        let mut registry = DriverRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(StaticDriver::new("turso")));
        registry.register(Arc::new(StaticDriver::new("neon")));

        assert_eq!(registry.len(), 2);
        assert!(registry.get(&BackendId::new("turso")).is_some());
        assert!(registry.get(&BackendId::new("planetscale")).is_none());
        assert_eq!(
            registry.backends(),
            vec![BackendId::new("neon"), BackendId::new("turso")]
        );
    }

    #[test]
    fn test_registry_replaces_same_backend() {
        let mut registry = DriverRegistry::new();
        registry.register(Arc::new(StaticDriver::new("sqlite")));
        registry.register(Arc::new(StaticDriver::failing("sqlite")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_fresh_http_client_builds() {
        assert!(fresh_http_client(Duration::from_secs(1)).is_ok());
    }
}
