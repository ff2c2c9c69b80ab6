//! Deterministic rule engine
//!
//! Each row is checked against a fixed chain of rules where only the first
//! match fires. A single aggregate rule then looks for repeated denials
//! from the same source across the whole snapshot.

use std::collections::HashMap;

use super::DeviceClassifier;
use crate::config::DetectionConfig;
use crate::models::{AnomalyRecord, AnomalyType, EventTable, NetworkEvent};

/// Rule-based anomaly detector
pub struct RuleEngine {
    classifier: DeviceClassifier,
    /// Packet count above which a row is high volume
    high_traffic_packets: u64,
    /// Denied attempts per source that count as brute force
    brute_force_denies: usize,
}

impl RuleEngine {
    /// Create a rule engine with default thresholds
    pub fn new(classifier: DeviceClassifier) -> Self {
        Self::with_config(classifier, &DetectionConfig::default())
    }

    /// Create with custom thresholds
    pub fn with_config(classifier: DeviceClassifier, config: &DetectionConfig) -> Self {
        RuleEngine {
            classifier,
            high_traffic_packets: config.high_traffic_packets,
            brute_force_denies: config.brute_force_denies,
        }
    }

    /// Run every rule over the snapshot
    ///
    /// Per-row findings come first in row order, followed by brute force
    /// findings in the order their source first appears.
    pub fn detect(&self, table: &EventTable) -> Vec<AnomalyRecord> {
        if table.is_empty() {
            return Vec::new();
        }

        let mut anomalies: Vec<AnomalyRecord> =
            table.iter().filter_map(|event| self.check_row(event)).collect();
        anomalies.extend(self.check_brute_force(table));
        anomalies
    }

    /// Check a single row; at most one rule fires
    pub fn check_row(&self, event: &NetworkEvent) -> Option<AnomalyRecord> {
        let source = event.source();
        let destination = event.destination();
        let packets = event.packet_count();

        if self.classifier.is_unauthorized_server_access(source, destination) {
            Some(AnomalyRecord::for_event(
                AnomalyType::UnauthorizedServerAccess,
                event,
                format!("{} (non-IT) attempted to access {}", source, destination),
            ))
        } else if source == destination {
            Some(AnomalyRecord::for_event(
                AnomalyType::TrafficLoop,
                event,
                format!("Traffic loop detected on {}", source),
            ))
        } else if packets > self.high_traffic_packets {
            Some(AnomalyRecord::for_event(
                AnomalyType::HighTrafficVolume,
                event,
                format!("Unusually high traffic: {} packets from {}", packets, source),
            ))
        } else {
            None
        }
    }

    fn check_brute_force(&self, table: &EventTable) -> Vec<AnomalyRecord> {
        denies_by_source(table)
            .into_iter()
            .filter(|(_, count)| *count >= self.brute_force_denies)
            .map(|(source, count)| AnomalyRecord {
                timestamp: "Multiple events".to_string(),
                kind: AnomalyType::BruteForceAttack,
                description: format!("{} had {} denied access attempts", source, count),
                destination: "Multiple targets".to_string(),
                action: "DENY".to_string(),
                severity: AnomalyType::BruteForceAttack.severity(),
                source,
            })
            .collect()
    }
}

/// Count DENY rows per source, in first-appearance order
pub(crate) fn denies_by_source(table: &EventTable) -> Vec<(String, usize)> {
    count_by_source(table.iter().filter(|event| event.is_denied()))
}

/// Count rows per source, in first-appearance order
pub(crate) fn count_by_source<'a, I>(events: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a NetworkEvent>,
{
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    // Rows without a source have no key to group on
    for source in events.into_iter().filter_map(|event| event.source.as_deref()) {
        match positions.get(source) {
            Some(&idx) => counts[idx].1 += 1,
            None => {
                positions.insert(source, counts.len());
                counts.push((source.to_string(), 1));
            }
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_event(source: &str, destination: &str, action: &str, packets: u64) -> NetworkEvent {
        NetworkEvent::new("10:00:00", source, destination, action, packets)
    }

    fn engine() -> RuleEngine {
        RuleEngine::new(DeviceClassifier::default())
    }

    #[test]
    fn test_empty_table_no_anomalies() {
        assert!(engine().detect(&EventTable::empty()).is_empty());
    }

    #[test]
    fn test_unauthorized_server_access() {
        let table = EventTable::from(vec![
            create_event("PC_01", "Server_DB", "ALLOW", 50),
            create_event("IT_PC_01", "Server_DB", "ALLOW", 50),
        ]);

        let anomalies = engine().detect(&table);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].kind, AnomalyType::UnauthorizedServerAccess);
        assert_eq!(anomalies[0].source, "PC_01");
        assert_eq!(anomalies[0].description, "PC_01 (non-IT) attempted to access Server_DB");
    }

    #[test]
    fn test_server_access_takes_priority() {
        // Matches all three per-row rules; only the first may fire
        let table = EventTable::from(vec![create_event("Server_A", "Server_A", "ALLOW", 900)]);

        let anomalies = engine().detect(&table);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].kind, AnomalyType::UnauthorizedServerAccess);
    }

    #[test]
    fn test_traffic_loop_before_high_volume() {
        let table = EventTable::from(vec![create_event("PC_05", "PC_05", "ALLOW", 900)]);

        let anomalies = engine().detect(&table);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].kind, AnomalyType::TrafficLoop);
        assert_eq!(anomalies[0].description, "Traffic loop detected on PC_05");
    }

    #[test]
    fn test_high_traffic_volume_threshold() {
        let table = EventTable::from(vec![
            create_event("PC_01", "PC_02", "ALLOW", 500),
            create_event("PC_01", "PC_02", "ALLOW", 501),
        ]);

        let anomalies = engine().detect(&table);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].kind, AnomalyType::HighTrafficVolume);
        assert_eq!(anomalies[0].description, "Unusually high traffic: 501 packets from PC_01");
    }

    #[test]
    fn test_brute_force_one_record_per_source() {
        let mut events = Vec::new();
        for i in 0..6 {
            events.push(create_event("PC_09", &format!("PC_{}", i), "DENY", 1));
        }
        for _ in 0..4 {
            events.push(create_event("PC_10", "PC_11", "DENY", 1));
        }
        let anomalies = engine().detect(&EventTable::from(events));

        assert_eq!(anomalies.len(), 1);
        let record = &anomalies[0];
        assert_eq!(record.kind, AnomalyType::BruteForceAttack);
        assert_eq!(record.source, "PC_09");
        assert_eq!(record.timestamp, "Multiple events");
        assert_eq!(record.destination, "Multiple targets");
        assert_eq!(record.description, "PC_09 had 6 denied access attempts");
    }

    #[test]
    fn test_brute_force_independent_of_row_order() {
        let mut events = Vec::new();
        for _ in 0..5 {
            events.push(create_event("PC_07", "PC_08", "DENY", 1));
            events.push(create_event("PC_03", "PC_04", "ALLOW", 1));
        }
        let forward = engine().detect(&EventTable::from(events.clone()));
        events.reverse();
        let reversed = engine().detect(&EventTable::from(events));

        assert_eq!(forward.len(), 1);
        assert_eq!(reversed.len(), 1);
        assert_eq!(forward[0].source, reversed[0].source);
    }

    #[test]
    fn test_aggregate_follows_per_row_in_first_seen_order() {
        let mut events = vec![create_event("PC_01", "Server_DB", "ALLOW", 1)];
        for _ in 0..5 {
            events.push(create_event("PC_B", "PC_X", "DENY", 1));
        }
        for _ in 0..5 {
            events.push(create_event("PC_A", "PC_X", "DENY", 1));
        }

        let anomalies = engine().detect(&EventTable::from(events));
        let kinds: Vec<AnomalyType> = anomalies.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                AnomalyType::UnauthorizedServerAccess,
                AnomalyType::BruteForceAttack,
                AnomalyType::BruteForceAttack,
            ]
        );
        assert_eq!(anomalies[1].source, "PC_B");
        assert_eq!(anomalies[2].source, "PC_A");
    }

    #[test]
    fn test_detect_is_idempotent() {
        let table = EventTable::from(vec![
            create_event("PC_01", "Server_DB", "ALLOW", 50),
            create_event("PC_02", "PC_02", "ALLOW", 10),
            create_event("PC_03", "PC_04", "ALLOW", 800),
        ]);

        let engine = engine();
        assert_eq!(engine.detect(&table), engine.detect(&table));
    }

    #[test]
    fn test_mixed_snapshot_rule_semantics() {
        let table = EventTable::from(vec![
            create_event("PC_01", "Server_DB", "ALLOW", 50),
            create_event("IT_PC_01", "Server_DB", "ALLOW", 50),
            create_event("PC_02", "Server_DB", "DENY", 10),
        ]);

        let anomalies = engine().detect(&table);
        // IT_PC_01 is exempt, PC_02 is non-IT too, and one DENY is far below brute force
        assert!(anomalies.iter().all(|a| a.kind == AnomalyType::UnauthorizedServerAccess));
        let sources: Vec<&str> = anomalies.iter().map(|a| a.source.as_str()).collect();
        assert_eq!(sources, vec!["PC_01", "PC_02"]);
    }

    #[test]
    fn test_denies_without_source_are_not_grouped() {
        let mut events: Vec<NetworkEvent> = (0..6)
            .map(|i| NetworkEvent {
                timestamp: format!("10:00:0{}", i),
                source: None,
                destination: Some("PC_05".to_string()),
                action: Some("DENY".to_string()),
                packets: Some(1),
            })
            .collect();
        events.push(create_event("PC_03", "PC_05", "DENY", 1));
        let table = EventTable::from(events);

        assert_eq!(denies_by_source(&table), vec![("PC_03".to_string(), 1)]);
        assert!(!engine()
            .detect(&table)
            .iter()
            .any(|a| a.kind == AnomalyType::BruteForceAttack));
    }

    #[test]
    fn test_custom_thresholds() {
        let config = DetectionConfig {
            high_traffic_packets: 10,
            brute_force_denies: 2,
            ..DetectionConfig::default()
        };
        let engine = RuleEngine::with_config(DeviceClassifier::default(), &config);
        let table = EventTable::from(vec![
            create_event("PC_01", "PC_02", "DENY", 11),
            create_event("PC_01", "PC_02", "DENY", 1),
        ]);

        let kinds: Vec<AnomalyType> = engine.detect(&table).iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AnomalyType::HighTrafficVolume, AnomalyType::BruteForceAttack]);
    }

    #[test]
    fn test_count_by_source_keeps_first_seen_order() {
        let events = vec![
            create_event("B", "X", "ALLOW", 1),
            create_event("A", "X", "ALLOW", 1),
            create_event("B", "X", "ALLOW", 1),
        ];
        let counts = count_by_source(&events);
        assert_eq!(counts, vec![("B".to_string(), 2), ("A".to_string(), 1)]);
    }
}
