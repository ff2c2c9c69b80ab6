//! Statistical outlier detection
//!
//! The trainer encodes each snapshot into `[source, destination, action,
//! packets]` feature vectors and fits an isolation forest. Encoders and
//! forest travel together in a `TrainedModel` so that codes from one cycle
//! are never applied to another.
//!
//! Neither the trainer nor the scorer returns an error to its caller.
//! Failures are reported through `TrainingOutcome::Failed` and
//! `ScoringOutcome::Failed`, so "nothing found" and "detector broke" stay
//! distinguishable while the pipeline keeps running.

use thiserror::Error;

use super::encoder::LabelEncoder;
use super::isolation_forest::{IsolationForest, ModelError};
use crate::config::ModelConfig;
use crate::models::{AnomalyRecord, AnomalyType, EventTable, NetworkEvent};

/// Errors from the statistical detector
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectorError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Model returned {found} predictions for {expected} rows")]
    PredictionCount { expected: usize, found: usize },
}

/// Forest plus the encoders fitted on the same snapshot
#[derive(Debug, Clone)]
pub struct TrainedModel {
    forest: IsolationForest,
    source_encoder: LabelEncoder,
    destination_encoder: LabelEncoder,
    action_encoder: LabelEncoder,
    trained_rows: usize,
}

impl TrainedModel {
    /// Number of rows the model was fitted on
    pub fn trained_rows(&self) -> usize {
        self.trained_rows
    }

    /// Feature vector for an event, with unseen categories coded as -1
    pub fn features(&self, event: &NetworkEvent) -> Vec<f64> {
        vec![
            self.source_encoder.transform_or_unseen(event.source()),
            self.destination_encoder.transform_or_unseen(event.destination()),
            self.action_encoder.transform_or_unseen(event.action()),
            event.packet_count() as f64,
        ]
    }
}

/// Result of a training attempt
#[derive(Debug, Clone)]
pub enum TrainingOutcome {
    Ready(TrainedModel),
    /// Not enough rows to learn what normal looks like
    InsufficientData { rows: usize, required: usize },
    Failed(DetectorError),
}

impl TrainingOutcome {
    pub fn model(&self) -> Option<&TrainedModel> {
        match self {
            TrainingOutcome::Ready(model) => Some(model),
            _ => None,
        }
    }

    pub fn into_model(self) -> Option<TrainedModel> {
        match self {
            TrainingOutcome::Ready(model) => Some(model),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, TrainingOutcome::Ready(_))
    }
}

/// Result of a scoring pass
#[derive(Debug, Clone, PartialEq)]
pub enum ScoringOutcome {
    Scored(Vec<AnomalyRecord>),
    /// No model was available or the snapshot was empty
    Skipped,
    Failed(DetectorError),
}

impl ScoringOutcome {
    /// Anomalies found, treating skipped and failed passes as empty
    pub fn into_anomalies(self) -> Vec<AnomalyRecord> {
        match self {
            ScoringOutcome::Scored(anomalies) => anomalies,
            ScoringOutcome::Skipped | ScoringOutcome::Failed(_) => Vec::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ScoringOutcome::Failed(_))
    }
}

/// Fits a fresh model for each snapshot
pub struct OutlierTrainer {
    config: ModelConfig,
}

impl OutlierTrainer {
    pub fn new(config: ModelConfig) -> Self {
        OutlierTrainer { config }
    }

    pub fn min_training_rows(&self) -> usize {
        self.config.min_training_rows
    }

    /// Train a model on the snapshot
    pub fn train(&self, table: &EventTable) -> TrainingOutcome {
        if table.len() < self.config.min_training_rows {
            log::debug!(
                "Skipping model training: {} rows (need {})",
                table.len(),
                self.config.min_training_rows
            );
            return TrainingOutcome::InsufficientData {
                rows: table.len(),
                required: self.config.min_training_rows,
            };
        }

        match self.fit(table) {
            Ok(model) => TrainingOutcome::Ready(model),
            Err(e) => {
                log::warn!("Model training failed: {}", e);
                TrainingOutcome::Failed(e)
            }
        }
    }

    fn fit(&self, table: &EventTable) -> Result<TrainedModel, DetectorError> {
        let source_encoder = LabelEncoder::fit(table.iter().map(|e| e.source()));
        let destination_encoder = LabelEncoder::fit(table.iter().map(|e| e.destination()));
        let action_encoder = LabelEncoder::fit(table.iter().map(|e| e.action()));

        let mut model = TrainedModel {
            forest: IsolationForest::new(
                self.config.num_trees,
                self.config.max_samples,
                self.config.contamination,
                self.config.seed,
            ),
            source_encoder,
            destination_encoder,
            action_encoder,
            trained_rows: table.len(),
        };

        let features = encode_training(&model, table)?;
        model.forest.fit(&features)?;
        Ok(model)
    }
}

impl Default for OutlierTrainer {
    fn default() -> Self {
        Self::new(ModelConfig::default())
    }
}

/// Every training row must be known to the encoders fitted on it
fn encode_training(model: &TrainedModel, table: &EventTable) -> Result<Vec<Vec<f64>>, DetectorError> {
    table
        .iter()
        .enumerate()
        .map(|(row, event)| {
            let lookup = |encoder: &LabelEncoder, value: &str, field: &str| {
                encoder.transform(value).map(|code| code as f64).ok_or_else(|| {
                    DetectorError::Encoding(format!("row {}: unknown {} {:?}", row, field, value))
                })
            };
            Ok(vec![
                lookup(&model.source_encoder, event.source(), "source")?,
                lookup(&model.destination_encoder, event.destination(), "destination")?,
                lookup(&model.action_encoder, event.action(), "action")?,
                event.packet_count() as f64,
            ])
        })
        .collect()
}

/// Turns model outlier flags into anomaly records
pub struct OutlierScorer;

impl OutlierScorer {
    /// Score every row of the snapshot in one batch
    pub fn score(table: &EventTable, model: Option<&TrainedModel>) -> ScoringOutcome {
        let model = match model {
            Some(model) if !table.is_empty() => model,
            _ => return ScoringOutcome::Skipped,
        };

        match Self::flag_outliers(table, model) {
            Ok(anomalies) => ScoringOutcome::Scored(anomalies),
            Err(e) => {
                log::warn!("Outlier scoring failed: {}", e);
                ScoringOutcome::Failed(e)
            }
        }
    }

    fn flag_outliers(table: &EventTable, model: &TrainedModel) -> Result<Vec<AnomalyRecord>, DetectorError> {
        let features: Vec<Vec<f64>> = table.iter().map(|event| model.features(event)).collect();
        let flags = model.forest.predict(&features)?;
        if flags.len() != table.len() {
            return Err(DetectorError::PredictionCount {
                expected: table.len(),
                found: flags.len(),
            });
        }

        Ok(table
            .iter()
            .zip(flags)
            .filter(|(_, outlier)| *outlier)
            .map(|(event, _)| {
                AnomalyRecord::for_event(
                    AnomalyType::StatisticalAnomaly,
                    event,
                    format!(
                        "AI detected unusual pattern: {} → {}",
                        event.source(),
                        event.destination()
                    ),
                )
            })
            .collect())
    }
}
