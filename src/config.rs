use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::drivers::{
    sqlite::{SqliteSource, IN_MEMORY},
    DriverRegistry, NeonDriver, SqliteDriver, SupabaseDriver, TursoDriver,
};
use crate::models::{BackendId, DeploymentScope};
use crate::probe::{CountFallback, RepeatPolicy, DEFAULT_REGION_HEADER};

/// Edge Data Latency - probe endpoints and trial harness
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the probe endpoints
    Serve(ServeArgs),
    /// Run a trial session and print the results
    Run(HarnessArgs),
    /// Run trial sessions from an interactive terminal dashboard
    Dashboard(HarnessArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Server host address
    #[arg(short = 'H', long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Server port
    #[arg(short, long, env = "SERVER_PORT", default_value = "3000")]
    pub port: u16,

    /// Routing header the deployment region is read from
    #[arg(long, env = "REGION_HEADER", default_value = DEFAULT_REGION_HEADER)]
    pub region_header: String,

    /// Smallest accepted repeat count
    #[arg(long, env = "COUNT_MIN", default_value = "1")]
    pub count_min: u32,

    /// Largest accepted repeat count
    #[arg(long, env = "COUNT_MAX", default_value = "5")]
    pub count_max: u32,

    /// Handling of a missing or non-numeric count ("default" or "skip")
    #[arg(long, env = "COUNT_FALLBACK", default_value = "default")]
    pub count_fallback: String,

    /// Reads performed under the "default" fallback
    #[arg(long, env = "COUNT_DEFAULT", default_value = "1")]
    pub count_default: u32,

    /// Per-request driver timeout in seconds
    #[arg(long, env = "DRIVER_TIMEOUT", default_value = "10")]
    pub driver_timeout: u64,

    /// SQLite database file (":memory:" for a seeded demo table)
    #[arg(long, env = "SQLITE_DB_FILE", default_value = IN_MEMORY)]
    pub sqlite_db_file: String,

    /// Turso database URL (libsql:// or https://)
    #[arg(long, env = "TURSO_DB_URL")]
    pub turso_db_url: Option<String>,

    /// Turso auth token
    #[arg(long, env = "TURSO_DB_AUTH_TOKEN", hide_env_values = true)]
    pub turso_auth_token: Option<String>,

    /// Neon Postgres connection string
    #[arg(long, env = "NEON_DATABASE_URL", hide_env_values = true)]
    pub neon_database_url: Option<String>,

    /// Override for Neon's SQL-over-HTTP endpoint
    #[arg(long, env = "NEON_SQL_ENDPOINT")]
    pub neon_sql_endpoint: Option<String>,

    /// Supabase project URL
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Supabase anon key
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    pub supabase_anon_key: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct HarnessArgs {
    /// Base URL of the probe server
    #[arg(short = 'u', long, env = "HARNESS_BASE_URL", default_value = "http://127.0.0.1:3000")]
    pub base_url: String,

    /// Backend to benchmark
    #[arg(short, long, env = "HARNESS_BACKEND", default_value = "sqlite")]
    pub backend: String,

    /// Scopes to sample each trial, in order (comma-separated)
    #[arg(
        short,
        long,
        env = "HARNESS_SCOPES",
        default_value = "global,regional",
        value_delimiter = ','
    )]
    pub scopes: Vec<String>,

    /// Sequential queries per probe call
    #[arg(short, long, env = "HARNESS_COUNT", default_value = "1")]
    pub count: u32,

    /// Trials per run
    #[arg(short, long, env = "HARNESS_TRIALS", default_value = "10")]
    pub trials: usize,

    /// Request timeout in seconds
    #[arg(long, env = "HARNESS_TIMEOUT", default_value = "30")]
    pub timeout: u64,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Start an in-process probe server backed by in-memory SQLite
    #[arg(long)]
    pub standalone: bool,
}

impl Cli {
    /// Load `.env` if present, then parse CLI arguments (CLI > ENV > defaults)
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Cli::parse()
    }
}

/// Validated probe server settings
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub server_host: String,
    pub server_port: u16,
    pub region_header: String,
    pub repeat_policy: RepeatPolicy,
    pub driver_timeout: Duration,
    pub sqlite_source: SqliteSource,
    pub turso: Option<TursoSettings>,
    pub neon: Option<NeonSettings>,
    pub supabase: Option<SupabaseSettings>,
}

#[derive(Clone, Debug)]
pub struct TursoSettings {
    pub url: String,
    pub auth_token: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NeonSettings {
    pub database_url: String,
    pub sql_endpoint: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SupabaseSettings {
    pub url: String,
    pub anon_key: String,
}

impl ServerConfig {
    pub fn from_args(args: ServeArgs) -> Result<Self> {
        let fallback = parse_count_fallback(&args.count_fallback, args.count_default)?;

        let config = ServerConfig {
            server_host: args.host,
            server_port: args.port,
            region_header: args.region_header.to_lowercase(),
            repeat_policy: RepeatPolicy {
                min: args.count_min,
                max: args.count_max,
                fallback,
            },
            driver_timeout: Duration::from_secs(args.driver_timeout),
            sqlite_source: parse_sqlite_source(&args.sqlite_db_file),
            turso: args.turso_db_url.map(|url| TursoSettings {
                url,
                auth_token: args.turso_auth_token,
            }),
            neon: args.neon_database_url.map(|database_url| NeonSettings {
                database_url,
                sql_endpoint: args.neon_sql_endpoint,
            }),
            supabase: match (args.supabase_url, args.supabase_anon_key) {
                (Some(url), Some(anon_key)) => Some(SupabaseSettings { url, anon_key }),
                (Some(_), None) => {
                    tracing::warn!("SUPABASE_URL is set without SUPABASE_ANON_KEY; skipping supabase");
                    None
                }
                _ => None,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Settings for an in-process server on an ephemeral port
    pub fn standalone() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            region_header: DEFAULT_REGION_HEADER.to_string(),
            repeat_policy: RepeatPolicy::default(),
            driver_timeout: Duration::from_secs(10),
            sqlite_source: SqliteSource::InMemory,
            turso: None,
            neon: None,
            supabase: None,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let policy = &self.repeat_policy;
        if policy.min == 0 {
            anyhow::bail!("COUNT_MIN must be at least 1");
        }
        if policy.min > policy.max {
            anyhow::bail!(
                "COUNT_MIN ({}) must not exceed COUNT_MAX ({})",
                policy.min,
                policy.max
            );
        }
        if axum::http::HeaderName::from_bytes(self.region_header.as_bytes()).is_err() {
            anyhow::bail!("REGION_HEADER is not a valid header name: {}", self.region_header);
        }
        Ok(())
    }

    /// Build drivers for every backend whose settings are present
    pub fn build_drivers(&self) -> Result<DriverRegistry> {
        let mut registry = DriverRegistry::new();

        registry.register(Arc::new(SqliteDriver::new(self.sqlite_source.clone())));

        match &self.turso {
            Some(turso) => registry.register(Arc::new(TursoDriver::new(
                &turso.url,
                turso.auth_token.clone(),
                self.driver_timeout,
            ))),
            None => tracing::warn!("TURSO_DB_URL not set; turso probes disabled"),
        }

        match &self.neon {
            Some(neon) => {
                let driver = NeonDriver::new(
                    &neon.database_url,
                    neon.sql_endpoint.clone(),
                    self.driver_timeout,
                )
                .context("Failed to configure neon driver")?;
                registry.register(Arc::new(driver));
            }
            None => tracing::warn!("NEON_DATABASE_URL not set; neon probes disabled"),
        }

        match &self.supabase {
            Some(supabase) => registry.register(Arc::new(SupabaseDriver::new(
                &supabase.url,
                supabase.anon_key.clone(),
                self.driver_timeout,
            ))),
            None => tracing::warn!("SUPABASE_URL not set; supabase probes disabled"),
        }

        Ok(registry)
    }
}

/// Validated harness settings
#[derive(Clone, Debug)]
pub struct HarnessConfig {
    pub base_url: String,
    pub backend: BackendId,
    pub scopes: Vec<DeploymentScope>,
    pub query_count: u32,
    pub trials: usize,
    pub timeout: Duration,
    pub json: bool,
    pub standalone: bool,
}

impl HarnessConfig {
    pub fn from_args(args: HarnessArgs) -> Result<Self> {
        let config = HarnessConfig {
            base_url: args.base_url.trim_end_matches('/').to_string(),
            backend: BackendId::new(args.backend.trim()),
            scopes: parse_scopes(&args.scopes)?,
            query_count: args.count,
            trials: args.trials,
            timeout: Duration::from_secs(args.timeout),
            json: args.json,
            standalone: args.standalone,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            anyhow::bail!("--trials must be at least 1");
        }
        if self.backend.as_str().is_empty() {
            anyhow::bail!("--backend must not be empty");
        }
        if self.scopes.is_empty() {
            anyhow::bail!("--scopes must name at least one of: global, regional");
        }
        Ok(())
    }
}

/// Parse the count fallback policy from string
fn parse_count_fallback(s: &str, default: u32) -> Result<CountFallback> {
    match s.trim().to_lowercase().as_str() {
        "default" | "clamp" => Ok(CountFallback::Default(default)),
        "skip" | "null" => Ok(CountFallback::Skip),
        other => anyhow::bail!("Unknown COUNT_FALLBACK '{}' (expected default or skip)", other),
    }
}

/// Parse and de-duplicate scopes, keeping first-seen order
fn parse_scopes(raw: &[String]) -> Result<Vec<DeploymentScope>> {
    let mut scopes = Vec::new();
    for value in raw.iter().filter(|v| !v.trim().is_empty()) {
        let scope: DeploymentScope = value.parse().map_err(anyhow::Error::msg)?;
        if !scopes.contains(&scope) {
            scopes.push(scope);
        }
    }
    Ok(scopes)
}

fn parse_sqlite_source(value: &str) -> SqliteSource {
    if value == IN_MEMORY {
        SqliteSource::InMemory
    } else {
        SqliteSource::File(expand_tilde(value))
    }
}

/// Expand tilde (~) in file paths to user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
