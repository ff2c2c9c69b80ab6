use serde::{Deserialize, Serialize};

/// Placeholder used wherever a missing text cell has to be read as a value
pub const UNKNOWN: &str = "Unknown";

/// One row of the network traffic log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkEvent {
    pub timestamp: String,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub action: Option<String>,
    pub packets: Option<u64>,
}

impl NetworkEvent {
    /// Create a fully populated event
    pub fn new(timestamp: &str, source: &str, destination: &str, action: &str, packets: u64) -> Self {
        NetworkEvent {
            timestamp: timestamp.to_string(),
            source: Some(source.to_string()),
            destination: Some(destination.to_string()),
            action: Some(action.to_string()),
            packets: Some(packets),
        }
    }

    pub fn source(&self) -> &str {
        self.source.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn destination(&self) -> &str {
        self.destination.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn action(&self) -> &str {
        self.action.as_deref().unwrap_or(UNKNOWN)
    }

    /// Packet count, with a missing cell counted as zero
    pub fn packet_count(&self) -> u64 {
        self.packets.unwrap_or(0)
    }

    pub fn is_denied(&self) -> bool {
        self.action.as_deref() == Some("DENY")
    }
}

/// A snapshot of the event log, in append order
///
/// Snapshots are never edited in place; a later poll produces a new table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventTable {
    events: Vec<NetworkEvent>,
}

impl EventTable {
    pub fn new(events: Vec<NetworkEvent>) -> Self {
        EventTable { events }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NetworkEvent> {
        self.events.iter()
    }

    pub fn events(&self) -> &[NetworkEvent] {
        &self.events
    }
}

impl From<Vec<NetworkEvent>> for EventTable {
    fn from(events: Vec<NetworkEvent>) -> Self {
        EventTable::new(events)
    }
}

impl<'a> IntoIterator for &'a EventTable {
    type Item = &'a NetworkEvent;
    type IntoIter = std::slice::Iter<'a, NetworkEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_cells_read_as_defaults() {
        let event = NetworkEvent {
            timestamp: "t1".to_string(),
            source: None,
            destination: None,
            action: None,
            packets: None,
        };

        assert_eq!(event.source(), "Unknown");
        assert_eq!(event.destination(), "Unknown");
        assert_eq!(event.action(), "Unknown");
        assert_eq!(event.packet_count(), 0);
        assert!(!event.is_denied());
    }

    #[test]
    fn test_table_preserves_order() {
        let table = EventTable::from(vec![
            NetworkEvent::new("t1", "PC_01", "PC_02", "ALLOW", 1),
            NetworkEvent::new("t2", "PC_03", "PC_04", "DENY", 2),
        ]);

        assert_eq!(table.len(), 2);
        let stamps: Vec<&str> = table.iter().map(|e| e.timestamp.as_str()).collect();
        assert_eq!(stamps, vec!["t1", "t2"]);
        assert!(table.events()[1].is_denied());
    }
}
