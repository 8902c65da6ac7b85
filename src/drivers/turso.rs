// Turso (libSQL) driver over the Hrana HTTP pipeline API

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

use super::{ensure_success, fresh_http_client, DatabaseDriver, DriverConnection, EMPLOYEES_QUERY};
use crate::error::DriverError;
use crate::models::BackendId;

/// Driver issuing statements through `POST {url}/v2/pipeline`
pub struct TursoDriver {
    base_url: String,
    auth_token: Option<String>,
    timeout: Duration,
}

impl TursoDriver {
    /// `url` may use the `libsql://` scheme; it is rewritten to `https://`
    pub fn new(url: &str, auth_token: Option<String>, timeout: Duration) -> Self {
        Self {
            base_url: normalize_url(url),
            auth_token,
            timeout,
        }
    }

    pub fn pipeline_url(&self) -> String {
        format!("{}/v2/pipeline", self.base_url)
    }
}

fn normalize_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    match url.strip_prefix("libsql://") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}

#[async_trait]
impl DatabaseDriver for TursoDriver {
    fn backend(&self) -> BackendId {
        BackendId::new("turso")
    }

    async fn connect(&self) -> Result<Box<dyn DriverConnection>, DriverError> {
        Ok(Box::new(TursoConnection {
            client: fresh_http_client(self.timeout)?,
            pipeline_url: self.pipeline_url(),
            auth_token: self.auth_token.clone(),
        }))
    }
}

struct TursoConnection {
    client: reqwest::Client,
    pipeline_url: String,
    auth_token: Option<String>,
}

#[async_trait]
impl DriverConnection for TursoConnection {
    async fn read_batch(&mut self) -> Result<Value, DriverError> {
        let body = json!({
            "requests": [
                { "type": "execute", "stmt": { "sql": EMPLOYEES_QUERY } },
                { "type": "close" }
            ]
        });

        let mut request = self.client.post(&self.pipeline_url).json(&body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = ensure_success(request.send().await?).await?;
        let pipeline: PipelineResponse = response.json().await?;
        rows_from_pipeline(pipeline)
    }
}

#[derive(Debug, Deserialize)]
struct PipelineResponse {
    results: Vec<PipelineResult>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum PipelineResult {
    Ok { response: StreamResponse },
    Error { error: HranaError },
}

#[derive(Debug, Deserialize)]
struct HranaError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct StreamResponse {
    result: Option<StatementResult>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    cols: Vec<Column>,
    rows: Vec<Vec<HranaValue>>,
}

#[derive(Debug, Deserialize)]
struct Column {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum HranaValue {
    Null,
    // Integers travel as strings to survive 64-bit precision
    Integer { value: String },
    Float { value: f64 },
    Text { value: String },
    Blob { base64: String },
}

impl HranaValue {
    fn into_json(self) -> Value {
        match self {
            HranaValue::Null => Value::Null,
            HranaValue::Integer { value } => value
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or(Value::String(value)),
            HranaValue::Float { value } => json!(value),
            HranaValue::Text { value } => Value::String(value),
            HranaValue::Blob { base64 } => Value::String(base64),
        }
    }
}

/// Turn the first execute result of a pipeline into row objects
fn rows_from_pipeline(pipeline: PipelineResponse) -> Result<Value, DriverError> {
    let first = pipeline
        .results
        .into_iter()
        .next()
        .ok_or_else(|| DriverError::Decode("empty pipeline results".to_string()))?;

    let result = match first {
        PipelineResult::Ok { response } => response
            .result
            .ok_or_else(|| DriverError::Decode("execute result missing".to_string()))?,
        PipelineResult::Error { error } => return Err(DriverError::Query(error.message)),
    };

    let names: Vec<String> = result
        .cols
        .iter()
        .enumerate()
        .map(|(i, col)| col.name.clone().unwrap_or_else(|| format!("col{}", i)))
        .collect();

    let rows = result
        .rows
        .into_iter()
        .map(|row| {
            let object: Map<String, Value> = names
                .iter()
                .cloned()
                .zip(row.into_iter().map(HranaValue::into_json))
                .collect();
            Value::Object(object)
        })
        .collect();

    Ok(Value::Array(rows))
}
