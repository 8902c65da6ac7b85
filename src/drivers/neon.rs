// Neon serverless Postgres driver over SQL-over-HTTP

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::{ensure_success, fresh_http_client, DatabaseDriver, DriverConnection, EMPLOYEES_QUERY};
use crate::error::DriverError;
use crate::models::BackendId;

/// Driver posting queries to Neon's `/sql` endpoint
pub struct NeonDriver {
    connection_string: String,
    endpoint: String,
    timeout: Duration,
}

impl NeonDriver {
    /// Build a driver from a `postgres://` connection string.
    ///
    /// When `endpoint` is not given it is derived from the connection
    /// string's host by replacing the first label with `api`.
    pub fn new(
        connection_string: &str,
        endpoint: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let endpoint = match endpoint {
            Some(endpoint) => endpoint,
            None => sql_endpoint_for(connection_string)?,
        };

        Ok(Self {
            connection_string: connection_string.to_string(),
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Derive `https://api.<rest-of-host>/sql` from a connection string
pub fn sql_endpoint_for(connection_string: &str) -> anyhow::Result<String> {
    let url = reqwest::Url::parse(connection_string)
        .map_err(|e| anyhow::anyhow!("Invalid NEON_DATABASE_URL: {}", e))?;
    let host = url
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("NEON_DATABASE_URL has no host"))?;

    let api_host = match host.split_once('.') {
        Some((_, rest)) => format!("api.{}", rest),
        None => host.to_string(),
    };
    Ok(format!("https://{}/sql", api_host))
}

#[async_trait]
impl DatabaseDriver for NeonDriver {
    fn backend(&self) -> BackendId {
        BackendId::new("neon")
    }

    async fn connect(&self) -> Result<Box<dyn DriverConnection>, DriverError> {
        Ok(Box::new(NeonConnection {
            client: fresh_http_client(self.timeout)?,
            endpoint: self.endpoint.clone(),
            connection_string: self.connection_string.clone(),
        }))
    }
}

struct NeonConnection {
    client: reqwest::Client,
    endpoint: String,
    connection_string: String,
}

#[derive(Debug, Deserialize)]
struct SqlResponse {
    rows: Vec<Value>,
}

#[async_trait]
impl DriverConnection for NeonConnection {
    async fn read_batch(&mut self) -> Result<Value, DriverError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Neon-Connection-String", &self.connection_string)
            .header("Neon-Raw-Text-Output", "false")
            .header("Neon-Array-Mode", "false")
            .json(&json!({ "query": EMPLOYEES_QUERY, "params": [] }))
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let body: SqlResponse = response.json().await?;
        Ok(Value::Array(body.rows))
    }
}
