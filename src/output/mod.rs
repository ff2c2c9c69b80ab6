use crate::models::{AnomalyRecord, PredictionRecord, Severity};
use crate::monitor::{CycleReport, ModelStatus};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

const RULE: &str = "----------------------------------------------------------------------";
const BANNER: &str = "======================================================================";

/// Output handler for analysis reports
pub struct OutputHandler {
    format: OutputFormat,
    writer: Option<Box<dyn Write + Send>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Jsonl,
    Console,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "jsonl" => OutputFormat::Jsonl,
            "console" => OutputFormat::Console,
            _ => OutputFormat::Console, // Default
        }
    }
}

/// Record wrapper used for JSON output so each line says where it came from
#[derive(Serialize)]
struct Tagged<'a, T: Serialize> {
    kind: &'static str,
    #[serde(flatten)]
    record: &'a T,
}

/// Body of heartbeat and waiting lines
#[derive(Serialize)]
struct StatusLine {
    checked_at: String,
}

impl OutputHandler {
    /// Create a new output handler
    ///
    /// Console output always goes to stdout. JSON formats append to the
    /// given file, or stdout when no file is configured.
    pub fn new(format: OutputFormat, file_path: Option<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        let writer: Option<Box<dyn Write + Send>> = match (&format, file_path) {
            (OutputFormat::Console, _) => None,
            (_, Some(path)) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Some(Box::new(BufWriter::new(file)))
            }
            (_, None) => None,
        };

        Ok(OutputHandler { format, writer })
    }

    /// Create a handler writing to an arbitrary sink
    pub fn with_writer(format: OutputFormat, writer: Box<dyn Write + Send>) -> Self {
        OutputHandler {
            format,
            writer: Some(writer),
        }
    }

    /// Write the outcome of one monitor cycle
    pub fn write_cycle(&mut self, report: &CycleReport) -> Result<(), Box<dyn std::error::Error>> {
        match self.format {
            OutputFormat::Console => {
                let mut out = format!(
                    "Analyzing {} events (new: {})\nCheck time: {}\n\n",
                    report.total_events,
                    report.new_events,
                    report.checked_at.format("%H:%M:%S")
                );
                out.push_str(&format!("{}\n\n", model_status_line(&report.model_status)));
                out.push_str(&render_anomalies(&report.anomalies));
                out.push_str(&format!("\n{}\n\n", BANNER));
                self.write_output(&out)?;
            }
            OutputFormat::Json | OutputFormat::Jsonl => {
                for anomaly in &report.anomalies {
                    self.write_json(&Tagged {
                        kind: "anomaly",
                        record: anomaly,
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Write the result of a trend analysis run
    pub fn write_predictions(&mut self, predictions: &[PredictionRecord]) -> Result<(), Box<dyn std::error::Error>> {
        match self.format {
            OutputFormat::Console => {
                let out = render_predictions(predictions);
                self.write_output(&out)?;
            }
            OutputFormat::Json | OutputFormat::Jsonl => {
                for prediction in predictions {
                    self.write_json(&Tagged {
                        kind: "prediction",
                        record: prediction,
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Note that a poll found nothing new
    pub fn write_heartbeat(&mut self, checked_at: DateTime<Local>) -> Result<(), Box<dyn std::error::Error>> {
        match self.format {
            OutputFormat::Console => {
                let line = format!("No new events... (checked at {})\n", checked_at.format("%H:%M:%S"));
                self.write_output(&line)
            }
            OutputFormat::Json | OutputFormat::Jsonl => self.write_json(&Tagged {
                kind: "heartbeat",
                record: &StatusLine {
                    checked_at: checked_at.to_rfc3339(),
                },
            }),
        }
    }

    /// Note that the log source had no data
    pub fn write_waiting(&mut self, checked_at: DateTime<Local>) -> Result<(), Box<dyn std::error::Error>> {
        match self.format {
            OutputFormat::Console => self.write_output("No data in log source. Waiting...\n"),
            OutputFormat::Json | OutputFormat::Jsonl => self.write_json(&Tagged {
                kind: "waiting",
                record: &StatusLine {
                    checked_at: checked_at.to_rfc3339(),
                },
            }),
        }
    }

    fn write_json<T: Serialize>(&mut self, record: &T) -> Result<(), Box<dyn std::error::Error>> {
        let json = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(record)?,
            _ => serde_json::to_string(record)?,
        };
        self.write_output(&format!("{}\n", json))
    }

    fn write_output(&mut self, data: &str) -> Result<(), Box<dyn std::error::Error>> {
        match &mut self.writer {
            Some(writer) => {
                writer.write_all(data.as_bytes())?;
                writer.flush()?;
            }
            None => {
                print!("{}", data);
                std::io::stdout().flush()?;
            }
        }
        Ok(())
    }

    /// Flush any buffered output
    pub fn flush(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(writer) = &mut self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

fn severity_marker(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "[!!]",
        Severity::Medium => "[! ]",
    }
}

fn model_status_line(status: &ModelStatus) -> String {
    match status {
        ModelStatus::Ready { trained_rows } => format!("Statistical model ready ({} rows)", trained_rows),
        ModelStatus::InsufficientData { required, .. } => {
            format!("Need more data for statistical model (minimum {} events)", required)
        }
        ModelStatus::Failed(reason) => format!("Statistical model unavailable: {}", reason),
    }
}

/// Human-readable listing of anomalies
pub fn render_anomalies(anomalies: &[AnomalyRecord]) -> String {
    if anomalies.is_empty() {
        return "Everything OK - No anomalies detected\n".to_string();
    }

    let mut out = format!("{} ANOMALIES DETECTED:\n{}\n", anomalies.len(), RULE);
    for (i, anomaly) in anomalies.iter().enumerate() {
        out.push_str(&format!(
            "\n{} ANOMALY #{}: {}\n   Time: {}\n   Source: {}\n   Destination: {}\n   Severity: {}\n   Description: {}\n",
            severity_marker(anomaly.severity),
            i + 1,
            anomaly.kind,
            anomaly.timestamp,
            anomaly.source,
            anomaly.destination,
            anomaly.severity,
            anomaly.description
        ));
    }
    out
}

/// Human-readable listing of predictions
pub fn render_predictions(predictions: &[PredictionRecord]) -> String {
    if predictions.is_empty() {
        return "No concerning trends detected\nAll systems appear stable\n".to_string();
    }

    let mut out = format!("{} PREDICTIONS:\n{}\n", predictions.len(), RULE);
    for (i, prediction) in predictions.iter().enumerate() {
        out.push_str(&format!(
            "\n{} PREDICTION #{}: {}\n   Severity: {}\n   Analysis: {}\n   Recommendation: {}\n",
            severity_marker(prediction.severity),
            i + 1,
            prediction.kind,
            prediction.severity,
            prediction.description,
            prediction.recommendation
        ));
    }
    out
}
