//! Client-side trial harness.
//!
//! A [`TrialOrchestrator`] drives sequential trials through a
//! [`SampleSource`], and the resulting [`SeriesSet`] is turned into chart
//! series and reports.

pub mod orchestrator;
pub mod plan;
pub mod report;
pub mod sample;
pub mod sampler;
pub mod series;

pub use orchestrator::TrialOrchestrator;
pub use plan::RunPlan;
pub use report::RunReport;
pub use sample::{ProbeTarget, Sample, SeriesSet};
pub use sampler::{HttpSampler, SampleSource};
pub use series::{end_to_end_series, processing_series, ChartPoint, ChartSeries};

use anyhow::Result;

use crate::config::{HarnessConfig, ServerConfig};
use crate::server::RunningServer;

/// Probe server the harness talks to.
///
/// In standalone mode this owns an in-process server, which stops when the
/// host is dropped.
pub struct ProbeHost {
    base_url: String,
    _server: Option<RunningServer>,
}

impl ProbeHost {
    pub async fn connect(config: &HarnessConfig) -> Result<Self> {
        if !config.standalone {
            return Ok(Self {
                base_url: config.base_url.clone(),
                _server: None,
            });
        }

        let server = RunningServer::start(&ServerConfig::standalone()).await?;
        tracing::info!("Standalone probe server at {}", server.url());
        Ok(Self {
            base_url: server.url(),
            _server: Some(server),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sampler targeting this host
    pub fn sampler(&self, config: &HarnessConfig) -> Result<HttpSampler> {
        HttpSampler::new(self.base_url.clone(), config.timeout)
    }
}

/// Run one full session from the command line and build its report
pub async fn run_session(config: &HarnessConfig) -> Result<RunReport> {
    let host = ProbeHost::connect(config).await?;
    let plan = RunPlan::from_config(config);
    let orchestrator = TrialOrchestrator::new(host.sampler(config)?);

    let mut updates = orchestrator.subscribe();
    let trials = plan.trials;
    let progress = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let done = updates.borrow_and_update().len();
            if done > 0 {
                tracing::info!("Trial {}/{} complete", done, trials);
            }
        }
    });

    let series = orchestrator.run(&plan).await?;
    drop(orchestrator);
    let _ = progress.await;

    Ok(RunReport::new(plan, series))
}
