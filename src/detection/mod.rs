pub mod classifier;
pub mod encoder;
pub mod isolation_forest;
pub mod outlier;
pub mod rules;

pub use classifier::DeviceClassifier;
pub use encoder::LabelEncoder;
pub use isolation_forest::{IsolationForest, ModelError};
pub use outlier::{DetectorError, OutlierScorer, OutlierTrainer, ScoringOutcome, TrainedModel, TrainingOutcome};
pub use rules::RuleEngine;
