// Supabase driver over the PostgREST API

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::{ensure_success, fresh_http_client, DatabaseDriver, DriverConnection, EMPLOYEES_LIMIT};
use crate::error::DriverError;
use crate::models::BackendId;

/// Driver reading `employees` through `GET {url}/rest/v1/employees`
pub struct SupabaseDriver {
    rest_url: String,
    api_key: String,
    timeout: Duration,
}

impl SupabaseDriver {
    pub fn new(project_url: &str, api_key: String, timeout: Duration) -> Self {
        Self {
            rest_url: format!("{}/rest/v1/employees", project_url.trim_end_matches('/')),
            api_key,
            timeout,
        }
    }
}

#[async_trait]
impl DatabaseDriver for SupabaseDriver {
    fn backend(&self) -> BackendId {
        BackendId::new("supabase")
    }

    async fn connect(&self) -> Result<Box<dyn DriverConnection>, DriverError> {
        Ok(Box::new(SupabaseConnection {
            client: fresh_http_client(self.timeout)?,
            rest_url: self.rest_url.clone(),
            api_key: self.api_key.clone(),
        }))
    }
}

struct SupabaseConnection {
    client: reqwest::Client,
    rest_url: String,
    api_key: String,
}

#[async_trait]
impl DriverConnection for SupabaseConnection {
    async fn read_batch(&mut self) -> Result<Value, DriverError> {
        let limit = EMPLOYEES_LIMIT.to_string();
        let response = self
            .client
            .get(&self.rest_url)
            .query(&[
                ("select", "emp_no,first_name,last_name"),
                ("limit", limit.as_str()),
            ])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let rows: Value = ensure_success(response).await?.json().await?;
        if !rows.is_array() {
            return Err(DriverError::Decode("expected a JSON array of rows".to_string()));
        }
        Ok(rows)
    }
}
