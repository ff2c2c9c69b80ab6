//! Incremental monitoring loop
//!
//! The monitor polls a log source at a fixed interval. When the snapshot has
//! grown since the last analysis it trains a fresh outlier model, runs the
//! rule engine and the outlier scorer over the whole snapshot, and emits the
//! combined findings. Otherwise it only emits a heartbeat.
//!
//! Nothing that goes wrong inside a cycle stops the loop. Errors and panics
//! are logged and counted, and polling resumes after the normal sleep. The
//! loop ends only when the shared `running` flag is cleared.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::config::Config;
use crate::detection::{DeviceClassifier, OutlierScorer, OutlierTrainer, RuleEngine, TrainingOutcome};
use crate::input::LogSource;
use crate::models::{AnomalyRecord, EventTable};
use crate::output::OutputHandler;

/// Granularity of the interruptible sleep between polls
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Errors that can end a single cycle
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Output error: {0}")]
    Output(String),

    #[error("Cycle panicked: {0}")]
    Panicked(String),
}

/// Where the monitor is in its poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// No data seen yet, or the source is currently empty
    Waiting,
    /// Data present, nothing new since the last analysis
    Idle,
    /// New rows are being analyzed
    Analyzing,
}

/// How the statistical detector fared in a cycle
#[derive(Debug, Clone, PartialEq)]
pub enum ModelStatus {
    Ready { trained_rows: usize },
    InsufficientData { rows: usize, required: usize },
    Failed(String),
}

impl From<&TrainingOutcome> for ModelStatus {
    fn from(outcome: &TrainingOutcome) -> Self {
        match outcome {
            TrainingOutcome::Ready(model) => ModelStatus::Ready {
                trained_rows: model.trained_rows(),
            },
            TrainingOutcome::InsufficientData { rows, required } => ModelStatus::InsufficientData {
                rows: *rows,
                required: *required,
            },
            TrainingOutcome::Failed(e) => ModelStatus::Failed(e.to_string()),
        }
    }
}

/// Findings from one analysis cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub checked_at: DateTime<Local>,
    pub total_events: usize,
    pub new_events: usize,
    pub model_status: ModelStatus,
    /// Rule findings first, then statistical findings
    pub anomalies: Vec<AnomalyRecord>,
}

/// What a single poll did
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    Waiting,
    Idle { total_events: usize },
    Analyzed(CycleReport),
}

/// Counters kept across the lifetime of the loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub polls: u64,
    pub waits: u64,
    pub heartbeats: u64,
    pub analyses: u64,
    pub trainings: u64,
    pub errors: u64,
}

/// Polling monitor over a log source
pub struct Monitor<S: LogSource> {
    source: S,
    rule_engine: RuleEngine,
    trainer: OutlierTrainer,
    output: OutputHandler,
    interval: Duration,
    /// Row count at the end of the last analysis
    previous_row_count: usize,
    state: MonitorState,
    stats: MonitorStats,
}

impl<S: LogSource> Monitor<S> {
    /// Build a monitor from configuration
    pub fn new(source: S, config: &Config, output: OutputHandler) -> Self {
        let classifier = DeviceClassifier::new(&config.classification);
        Self::with_components(
            source,
            RuleEngine::with_config(classifier, &config.detection),
            OutlierTrainer::new(config.model.clone()),
            output,
            Duration::from_secs(config.monitor.check_interval_secs),
        )
    }

    pub fn with_components(
        source: S,
        rule_engine: RuleEngine,
        trainer: OutlierTrainer,
        output: OutputHandler,
        interval: Duration,
    ) -> Self {
        Monitor {
            source,
            rule_engine,
            trainer,
            output,
            interval,
            previous_row_count: 0,
            state: MonitorState::Waiting,
            stats: MonitorStats::default(),
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn stats(&self) -> &MonitorStats {
        &self.stats
    }

    pub fn previous_row_count(&self) -> usize {
        self.previous_row_count
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run one poll: load, compare row counts, analyze or heartbeat
    pub fn poll_once(&mut self) -> Result<CycleOutcome, MonitorError> {
        self.stats.polls += 1;
        let table = self.source.load_or_empty();

        if table.is_empty() {
            self.state = MonitorState::Waiting;
            self.stats.waits += 1;
            log::debug!("No data in {}, waiting", self.source.describe());
            self.output.write_waiting(Local::now()).map_err(|e| MonitorError::Output(e.to_string()))?;
            return Ok(CycleOutcome::Waiting);
        }

        let current_row_count = table.len();
        if current_row_count > self.previous_row_count {
            self.state = MonitorState::Analyzing;
            let report = self.analyze(&table);
            self.output
                .write_cycle(&report)
                .map_err(|e| MonitorError::Output(e.to_string()))?;

            self.previous_row_count = current_row_count;
            self.state = MonitorState::Idle;
            self.stats.analyses += 1;
            Ok(CycleOutcome::Analyzed(report))
        } else {
            self.state = MonitorState::Idle;
            self.stats.heartbeats += 1;
            log::debug!("No new events ({} total)", current_row_count);
            self.output
                .write_heartbeat(Local::now())
                .map_err(|e| MonitorError::Output(e.to_string()))?;
            Ok(CycleOutcome::Idle {
                total_events: current_row_count,
            })
        }
    }

    /// Train, run both detectors and merge their findings
    fn analyze(&mut self, table: &EventTable) -> CycleReport {
        let new_events = table.len() - self.previous_row_count;
        log::info!("Analyzing {} events (new: {})", table.len(), new_events);

        self.stats.trainings += 1;
        let training = self.trainer.train(table);
        let model_status = ModelStatus::from(&training);

        let mut anomalies = self.rule_engine.detect(table);
        let scoring = OutlierScorer::score(table, training.model());
        if scoring.is_failed() {
            log::warn!("Statistical detector failed; reporting rule findings only");
        }
        anomalies.extend(scoring.into_anomalies());

        log::info!("Cycle found {} anomalies", anomalies.len());

        // The model and its encoders are dropped here with `training`
        CycleReport {
            checked_at: Local::now(),
            total_events: table.len(),
            new_events,
            model_status,
            anomalies,
        }
    }

    /// Poll until `running` is cleared
    pub fn run(&mut self, running: &AtomicBool) {
        log::info!(
            "Monitoring {} every {:?}",
            self.source.describe(),
            self.interval
        );

        while running.load(Ordering::SeqCst) {
            let result = panic::catch_unwind(AssertUnwindSafe(|| self.poll_once()))
                .unwrap_or_else(|payload| Err(MonitorError::Panicked(panic_message(payload.as_ref()))));

            if let Err(e) = result {
                self.stats.errors += 1;
                log::error!("Monitoring cycle failed: {}", e);
            }

            self.sleep(running);
        }

        if let Err(e) = self.output.flush() {
            log::warn!("Failed to flush output: {}", e);
        }
        log::info!("Monitoring stopped after {} polls", self.stats.polls);
    }

    fn sleep(&self, running: &AtomicBool) {
        let mut remaining = self.interval;
        while !remaining.is_zero() && running.load(Ordering::SeqCst) {
            let slice = remaining.min(SLEEP_SLICE);
            std::thread::sleep(slice);
            remaining -= slice;
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
