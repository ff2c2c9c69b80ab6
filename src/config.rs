use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for netguard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log source configuration
    pub input: InputConfig,
    /// Device classification keywords
    pub classification: ClassificationConfig,
    /// Rule and trend thresholds
    pub detection: DetectionConfig,
    /// Outlier model parameters
    pub model: ModelConfig,
    /// Monitor loop configuration
    pub monitor: MonitorConfig,
    /// Output configuration
    pub output: OutputConfig,
}

/// Log source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Path to the CSV traffic log
    pub file_path: PathBuf,
}

/// Keyword lists used to classify device names
///
/// A device matches a list when any keyword is a substring of its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationConfig {
    /// Keywords identifying IT-owned devices
    pub it_devices: Vec<String>,
    /// Keywords identifying servers
    pub servers: Vec<String>,
}

/// Thresholds for the rule engine and the trend predictor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Packet count above which a single row is high volume
    pub high_traffic_packets: u64,
    /// Denied attempts from one source that count as brute force
    pub brute_force_denies: usize,
    /// Minimum DENY rows before escalation is considered
    pub escalation_min_denies: usize,
    /// Ratio of later to earlier denies that counts as escalation
    pub escalation_ratio: f64,
    /// Packet count above which a row counts towards overload risk
    pub overload_packets: u64,
    /// High-traffic rows needed to report overload risk
    pub overload_min_events: usize,
    /// Server accesses from one non-IT source that count as persistent
    pub persistent_access_min: usize,
    /// NETWORK_CHANGE rows that count as instability
    pub instability_min_changes: usize,
    /// Denied attempts from one source that count as acceleration
    pub acceleration_denies: usize,
}

/// Isolation forest parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Minimum rows before a model is trained
    pub min_training_rows: usize,
    /// Number of isolation trees
    pub num_trees: usize,
    /// Maximum sub-sample size per tree
    pub max_samples: usize,
    /// Expected share of outliers in the training data
    pub contamination: f64,
    /// Seed for reproducible training
    pub seed: u64,
}

/// Monitor loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds to sleep between polls
    pub check_interval_secs: u64,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format: "json", "jsonl", or "console"
    pub format: String,
    /// Output file path (if format is not "console")
    pub file_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input: InputConfig {
                file_path: PathBuf::from("data/logs.csv"),
            },
            classification: ClassificationConfig::default(),
            detection: DetectionConfig::default(),
            model: ModelConfig::default(),
            monitor: MonitorConfig {
                check_interval_secs: 5,
            },
            output: OutputConfig {
                format: "console".to_string(),
                file_path: None,
            },
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        ClassificationConfig {
            it_devices: ["PC_IT", "IT_PC", "VLAN_IT", "Switch_IT", "192.168.10", "IT_Department"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            servers: ["Server", "DMZ", "10.10.100", "Server_PT", "Gig0"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        DetectionConfig {
            high_traffic_packets: 500,
            brute_force_denies: 5,
            escalation_min_denies: 6,
            escalation_ratio: 1.5,
            overload_packets: 100,
            overload_min_events: 5,
            persistent_access_min: 3,
            instability_min_changes: 10,
            acceleration_denies: 10,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            min_training_rows: 10,
            num_trees: 100,
            max_samples: 256,
            contamination: 0.1,
            seed: 42,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file(&self, path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
