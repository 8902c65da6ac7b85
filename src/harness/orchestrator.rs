//! Trial orchestrator: runs sequential trials and publishes progress.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

use super::plan::RunPlan;
use super::sample::{ProbeTarget, SeriesSet};
use super::sampler::SampleSource;
use crate::error::HarnessError;
use crate::models::DeploymentScope;

/// Runs trials against a sample source, one run at a time
pub struct TrialOrchestrator<S> {
    sampler: S,
    running: AtomicBool,
    updates: watch::Sender<SeriesSet>,
}

/// Marks the orchestrator as running until dropped
struct RunGuard<'a> {
    running: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(running: &'a AtomicBool) -> Result<Self, HarnessError> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| HarnessError::AlreadyRunning)?;
        Ok(Self { running })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

impl<S: SampleSource> TrialOrchestrator<S> {
    pub fn new(sampler: S) -> Self {
        let (updates, _) = watch::channel(SeriesSet::new());
        Self {
            sampler,
            running: AtomicBool::new(false),
            updates,
        }
    }

    /// Receive a snapshot of the series after every completed trial
    pub fn subscribe(&self) -> watch::Receiver<SeriesSet> {
        self.updates.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Most recently published snapshot
    pub fn latest(&self) -> SeriesSet {
        self.updates.borrow().clone()
    }

    /// Execute a full run.
    ///
    /// Rejected with [`HarnessError::AlreadyRunning`] if a run is in
    /// progress. Trials never overlap; within a trial the enabled scopes
    /// are sampled in plan order and disabled scopes record `None`, so both
    /// sequences always have equal length. A scope listed twice is sampled
    /// once per trial.
    pub async fn run(&self, plan: &RunPlan) -> Result<SeriesSet, HarnessError> {
        let _guard = RunGuard::acquire(&self.running)?;

        tracing::info!(
            backend = %plan.backend,
            scopes = ?plan.scopes,
            query_count = plan.query_count,
            trials = plan.trials,
            "Starting run"
        );

        let mut scopes: Vec<DeploymentScope> = Vec::with_capacity(plan.scopes.len());
        for &scope in &plan.scopes {
            if !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }

        let mut series = SeriesSet::new();
        self.updates.send_replace(series.clone());

        for trial in 0..plan.trials {
            let mut global = None;
            let mut regional = None;

            for &scope in &scopes {
                let target = ProbeTarget::new(plan.backend.clone(), scope, plan.query_count);
                let sample = self.sampler.sample(&target).await;
                match scope {
                    DeploymentScope::Global => global = sample,
                    DeploymentScope::Regional => regional = sample,
                }
            }

            tracing::debug!(
                trial = trial + 1,
                global = global.is_some(),
                regional = regional.is_some(),
                "Trial complete"
            );

            series.push_trial(global, regional);
            self.updates.send_replace(series.clone());
        }

        tracing::info!(trials = series.len(), "Run finished");
        Ok(series)
    }
}
