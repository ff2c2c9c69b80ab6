pub mod event;
pub mod record;

pub use event::{EventTable, NetworkEvent, UNKNOWN};
pub use record::{AnomalyRecord, AnomalyType, PredictionRecord, PredictionType, Severity};
