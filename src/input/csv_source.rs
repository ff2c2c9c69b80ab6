use crate::models::{EventTable, NetworkEvent};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use super::{LogSource, SourceError};

/// Columns every traffic log must carry
pub const REQUIRED_COLUMNS: [&str; 5] = ["timestamp", "source", "destination", "action", "packets"];

/// Reads the whole traffic log from a CSV file on every call
pub struct CsvLogSource {
    file_path: PathBuf,
}

/// Position of each required column in the header row
struct ColumnIndex {
    timestamp: usize,
    source: usize,
    destination: usize,
    action: usize,
    packets: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, SourceError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| SourceError::MissingColumn(name.to_string()))
        };

        Ok(ColumnIndex {
            timestamp: find("timestamp")?,
            source: find("source")?,
            destination: find("destination")?,
            action: find("action")?,
            packets: find("packets")?,
        })
    }
}

impl CsvLogSource {
    /// Create a new CSV log source
    pub fn new(file_path: PathBuf) -> Self {
        CsvLogSource { file_path }
    }

    /// Check if the file exists
    pub fn is_valid(&self) -> bool {
        self.file_path.exists()
    }

    fn read_table(&self) -> Result<EventTable, SourceError> {
        if !self.file_path.exists() {
            return Err(SourceError::NotFound(self.file_path.display().to_string()));
        }

        let file = File::open(&self.file_path)?;
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(BufReader::new(file));

        let columns = ColumnIndex::from_headers(reader.headers()?)?;

        let mut events = Vec::new();
        for result in reader.records() {
            let record = result?;
            events.push(Self::parse_record(&record, &columns));
        }

        Ok(EventTable::new(events))
    }

    fn parse_record(record: &csv::StringRecord, columns: &ColumnIndex) -> NetworkEvent {
        let cell = |idx: usize| {
            record
                .get(idx)
                .filter(|value| !value.is_empty())
                .map(|value| value.to_string())
        };

        NetworkEvent {
            timestamp: cell(columns.timestamp).unwrap_or_default(),
            source: cell(columns.source),
            destination: cell(columns.destination),
            action: cell(columns.action),
            packets: record.get(columns.packets).and_then(parse_packets),
        }
    }
}

/// Parse a packet cell, accepting integers and non-negative floats
fn parse_packets(value: &str) -> Option<u64> {
    if value.is_empty() {
        return None;
    }
    if let Ok(count) = value.parse::<u64>() {
        return Some(count);
    }
    match value.parse::<f64>() {
        Ok(count) if count.is_finite() && count >= 0.0 => Some(count as u64),
        _ => {
            log::debug!("Ignoring unparseable packet count: {:?}", value);
            None
        }
    }
}

impl LogSource for CsvLogSource {
    fn load(&self) -> Result<EventTable, SourceError> {
        self.read_table()
    }

    fn describe(&self) -> String {
        self.file_path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_trims_headers_and_cells() {
        let file = write_csv(
            " timestamp , source ,destination, action ,packets\n\
             10:00:01,  PC_01 , Server_DB ,ALLOW , 50\n\
             10:00:02,IT_PC_01,Server_DB,DENY,10\n",
        );

        let table = CsvLogSource::new(file.path().to_path_buf()).load().unwrap();
        assert_eq!(table.len(), 2);

        let first = &table.events()[0];
        assert_eq!(first.source(), "PC_01");
        assert_eq!(first.destination(), "Server_DB");
        assert_eq!(first.action(), "ALLOW");
        assert_eq!(first.packet_count(), 50);
        assert!(table.events()[1].is_denied());
    }

    #[test]
    fn test_missing_cells_become_absent() {
        let file = write_csv(
            "timestamp,source,destination,action,packets\n\
             10:00:01,,Server_DB,ALLOW,\n\
             10:00:02,PC_02,PC_03,ALLOW,12.0\n",
        );

        let table = CsvLogSource::new(file.path().to_path_buf()).load().unwrap();
        let first = &table.events()[0];
        assert_eq!(first.source, None);
        assert_eq!(first.packets, None);
        assert_eq!(table.events()[1].packets, Some(12));
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let file = write_csv(
            "id,timestamp,protocol,source,destination,action,packets\n\
             1,10:00:01,TCP,PC_01,PC_02,ALLOW,3\n",
        );

        let table = CsvLogSource::new(file.path().to_path_buf()).load().unwrap();
        assert_eq!(table.events()[0].source(), "PC_01");
        assert_eq!(table.events()[0].packet_count(), 3);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let source = CsvLogSource::new(PathBuf::from("/nonexistent/logs.csv"));
        assert!(!source.is_valid());
        assert!(matches!(source.load(), Err(SourceError::NotFound(_))));
    }

    #[test]
    fn test_missing_column_is_reported() {
        let file = write_csv("timestamp,source,destination,packets\n10:00:01,PC_01,PC_02,3\n");

        let result = CsvLogSource::new(file.path().to_path_buf()).load();
        match result {
            Err(SourceError::MissingColumn(name)) => assert_eq!(name, "action"),
            other => panic!("expected missing column, got {:?}", other),
        }
    }

    #[test]
    fn test_load_or_empty_degrades() {
        let source = CsvLogSource::new(PathBuf::from("/nonexistent/logs.csv"));
        assert!(source.load_or_empty().is_empty());
    }

    #[test]
    fn test_parse_packets() {
        assert_eq!(parse_packets("42"), Some(42));
        assert_eq!(parse_packets("7.9"), Some(7));
        assert_eq!(parse_packets("-3"), None);
        assert_eq!(parse_packets("lots"), None);
        assert_eq!(parse_packets(""), None);
    }
}
