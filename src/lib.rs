pub mod config;
pub mod detection;
pub mod input;
pub mod models;
pub mod monitor;
pub mod output;
pub mod prediction;

// Re-export commonly used types
pub use models::{AnomalyRecord, EventTable, NetworkEvent, PredictionRecord, Severity};
pub use detection::{DeviceClassifier, OutlierScorer, OutlierTrainer, RuleEngine, ScoringOutcome, TrainingOutcome};
pub use input::{CsvLogSource, LogSource};
pub use monitor::{CycleOutcome, CycleReport, Monitor, MonitorState};
pub use output::{OutputFormat, OutputHandler};
pub use prediction::TrendPredictor;
