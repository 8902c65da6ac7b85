//! Terminal dashboard: run form, live latency charts and a log panel.

pub mod app;
pub mod event_handler;
pub mod log_layer;
pub mod ui;
pub mod widgets;

pub use app::DashboardApp;
pub use event_handler::{handle_events, Action};
pub use log_layer::{new_log_buffer, DashboardLayer, LogBuffer};

use anyhow::Result;
use ratatui::DefaultTerminal;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::harness::{
    HttpSampler, ProbeHost, RunPlan, SampleSource, SeriesSet, TrialOrchestrator,
};

type RunHandle = JoinHandle<Result<SeriesSet, HarnessError>>;

/// Run the dashboard until the operator quits
pub async fn run(config: &HarnessConfig, log_buffer: LogBuffer) -> Result<()> {
    let host = ProbeHost::connect(config).await?;
    let sampler = host.sampler(config)?;

    let backends = match sampler.list_backends().await {
        Ok(backends) => backends,
        Err(e) => {
            tracing::warn!("Could not list backends, using {}: {:#}", config.backend, e);
            vec![config.backend.clone()]
        }
    };

    let orchestrator = Arc::new(TrialOrchestrator::new(sampler));
    let mut app = DashboardApp::new(backends, &RunPlan::from_config(config), log_buffer);
    tracing::info!("Dashboard ready, probing {}", host.base_url());

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &mut app, &orchestrator).await;
    ratatui::restore();
    result
}

async fn event_loop(
    terminal: &mut DefaultTerminal,
    app: &mut DashboardApp,
    orchestrator: &Arc<TrialOrchestrator<HttpSampler>>,
) -> Result<()> {
    let mut updates = orchestrator.subscribe();
    let mut current: Option<RunHandle> = None;

    loop {
        if updates.has_changed().unwrap_or(false) {
            app.apply_snapshot(updates.borrow_and_update().clone());
        }
        if current.as_ref().is_some_and(|h| h.is_finished()) {
            if let Some(handle) = current.take() {
                finish(app, handle, &mut updates).await;
            }
        }

        terminal.draw(|frame| ui::render(frame, app))?;

        // Polling blocks for up to 250ms
        let action = tokio::task::block_in_place(|| handle_events(app))?;
        if let Some(Action::StartRun) = action {
            if let Some(handle) = start(app, orchestrator) {
                current = Some(handle);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn start<S: SampleSource + 'static>(
    app: &mut DashboardApp,
    orchestrator: &Arc<TrialOrchestrator<S>>,
) -> Option<RunHandle> {
    // The task sets the orchestrator flag only once polled
    if app.running || orchestrator.is_running() {
        tracing::warn!("{}; ignoring start", HarnessError::AlreadyRunning);
        return None;
    }
    let Some(plan) = app.plan() else {
        tracing::warn!("Enable at least one scope to start a run");
        return None;
    };

    app.start_run(&plan);
    let orchestrator = Arc::clone(orchestrator);
    Some(tokio::spawn(async move { orchestrator.run(&plan).await }))
}

async fn finish(
    app: &mut DashboardApp,
    handle: RunHandle,
    updates: &mut watch::Receiver<SeriesSet>,
) {
    match handle.await {
        Ok(outcome) => {
            // The final snapshot is the returned series
            let _ = updates.borrow_and_update();
            app.finish_run(outcome);
        }
        Err(e) => {
            tracing::error!("Run task failed: {}", e);
            app.running = false;
            app.status = "Failed".to_string();
        }
    }
}
