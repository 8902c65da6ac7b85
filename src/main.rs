use anyhow::Result;
use tracing_subscriber::prelude::*;

use edge_data_latency::config::{Cli, Command, HarnessConfig, ServerConfig};
use edge_data_latency::drivers::sqlite::SqliteSource;
use edge_data_latency::{dashboard, harness, server};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::load();
    let log_level = cli.log_level.to_lowercase();

    match cli.command {
        Command::Serve(args) => {
            init_logging(&log_level);
            let config = ServerConfig::from_args(args)?;
            print_startup_banner(&config, &log_level);
            server::serve(&config).await
        }
        Command::Run(args) => {
            init_logging(&log_level);
            let config = HarnessConfig::from_args(args)?;
            let report = harness::run_session(&config).await?;
            if config.json {
                println!("{}", report.to_json());
            } else {
                report.print_table();
            }
            Ok(())
        }
        Command::Dashboard(args) => {
            let config = HarnessConfig::from_args(args)?;

            // The terminal belongs to the dashboard; logs go to its panel
            let log_buffer = dashboard::new_log_buffer();
            tracing_subscriber::registry()
                .with(env_filter(&log_level))
                .with(
                    dashboard::DashboardLayer::new(log_buffer.clone())
                        .with_min_level(tracing::Level::TRACE),
                )
                .init();

            dashboard::run(&config, log_buffer).await
        }
    }
}

/// `RUST_LOG` wins over `--log-level`
fn env_filter(log_level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level))
}

/// Logs go to stderr so `run --json` output stays parseable
fn init_logging(log_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(log_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();
}

/// Print startup banner
fn print_startup_banner(config: &ServerConfig, log_level: &str) {
    let banner = r#"
╔═══════════════════════════════════════════════════════════╗
║                                                           ║
║              ⏱  Edge Data Latency Probes                  ║
║                                                           ║
║  Timed employee reads against edge-friendly databases     ║
║                                                           ║
╚═══════════════════════════════════════════════════════════╝
"#;

    let enabled = |present: bool| if present { "enabled" } else { "disabled" };
    let sqlite = match &config.sqlite_source {
        SqliteSource::InMemory => "in-memory demo".to_string(),
        SqliteSource::File(path) => path.display().to_string(),
    };

    println!("{}", banner);
    println!("  Version:       {}", env!("CARGO_PKG_VERSION"));
    println!(
        "  Server:        http://{}:{}",
        config.server_host, config.server_port
    );
    println!("  Region header: {}", config.region_header);
    println!(
        "  Count:         [{}, {}] fallback {}",
        config.repeat_policy.min, config.repeat_policy.max, config.repeat_policy.fallback
    );
    println!("  SQLite:        {}", sqlite);
    println!("  Turso:         {}", enabled(config.turso.is_some()));
    println!("  Neon:          {}", enabled(config.neon.is_some()));
    println!("  Supabase:      {}", enabled(config.supabase.is_some()));
    println!("  Log Level:     {}", log_level);
    println!();
}
