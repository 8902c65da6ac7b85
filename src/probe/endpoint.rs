//! A single probe endpoint bound to one driver and one deployment scope.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use super::cold_start::{ColdStartTracker, ProcessStart};
use crate::drivers::{DatabaseDriver, DriverRegistry};
use crate::error::DriverError;
use crate::models::{DeploymentScope, ProbeKey};

/// What one probe invocation measured
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    /// Result of the final read, or null when no read ran
    pub data: Value,
    /// Milliseconds spent connecting and running the reads
    pub query_duration_ms: u64,
    pub is_cold: bool,
    pub reads: u32,
}

/// Runs sequential reads against its driver and reports timing
pub struct ProbeEndpoint {
    key: ProbeKey,
    driver: Arc<dyn DatabaseDriver>,
    cold_start: ColdStartTracker,
}

impl ProbeEndpoint {
    pub fn new(key: ProbeKey, driver: Arc<dyn DatabaseDriver>, process_start: ProcessStart) -> Self {
        Self {
            key,
            driver,
            cold_start: ColdStartTracker::new(process_start),
        }
    }

    pub fn key(&self) -> &ProbeKey {
        &self.key
    }

    /// Perform `repeat` reads, each awaited before the next begins.
    ///
    /// The connection is opened fresh for this call. Only the last read's
    /// result is kept. A driver failure aborts the loop; the cold-start
    /// flag is consumed either way.
    pub async fn invoke(&self, repeat: u32) -> Result<ProbeOutcome, DriverError> {
        let is_cold = self.cold_start.observe();
        let started = Instant::now();

        let mut data = Value::Null;
        if repeat > 0 {
            let mut conn = self.driver.connect().await?;
            for i in 0..repeat {
                data = conn.read_batch().await?;
                tracing::trace!(probe = %self.key, read = i + 1, "Read complete");
            }
        }

        let query_duration_ms = started.elapsed().as_millis() as u64;
        tracing::debug!(
            probe = %self.key,
            reads = repeat,
            duration_ms = query_duration_ms,
            cold = is_cold,
            "Probe invocation finished"
        );

        Ok(ProbeOutcome {
            data,
            query_duration_ms,
            is_cold,
            reads: repeat,
        })
    }
}

/// All probe endpoints, one per registered backend and scope
pub struct ProbeRegistry {
    endpoints: HashMap<ProbeKey, ProbeEndpoint>,
    drivers: DriverRegistry,
}

impl ProbeRegistry {
    /// Create an endpoint for every driver under every deployment scope
    pub fn from_drivers(drivers: DriverRegistry, process_start: ProcessStart) -> Self {
        let mut endpoints = HashMap::new();
        for (backend, driver) in drivers.iter() {
            for scope in DeploymentScope::ALL {
                let key = ProbeKey::new(backend.clone(), scope);
                endpoints.insert(
                    key.clone(),
                    ProbeEndpoint::new(key, Arc::clone(driver), process_start),
                );
            }
        }

        Self { endpoints, drivers }
    }

    pub fn get(&self, key: &ProbeKey) -> Option<&ProbeEndpoint> {
        self.endpoints.get(key)
    }

    pub fn drivers(&self) -> &DriverRegistry {
        &self.drivers
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
