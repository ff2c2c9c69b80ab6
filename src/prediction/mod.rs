//! Trend analysis over a full traffic snapshot
//!
//! Unlike the live detectors, the predictor looks at aggregate behaviour
//! and raises forward-looking warnings. Every check runs independently, so
//! one snapshot can produce any combination of predictions.

use crate::config::DetectionConfig;
use crate::detection::rules::{count_by_source, denies_by_source};
use crate::detection::DeviceClassifier;
use crate::models::{EventTable, PredictionRecord, PredictionType};

/// Forward-looking trend analysis
pub struct TrendPredictor {
    classifier: DeviceClassifier,
    config: DetectionConfig,
}

impl TrendPredictor {
    /// Create a predictor with default thresholds
    pub fn new(classifier: DeviceClassifier) -> Self {
        Self::with_config(classifier, DetectionConfig::default())
    }

    pub fn with_config(classifier: DeviceClassifier, config: DetectionConfig) -> Self {
        TrendPredictor { classifier, config }
    }

    /// Run every trend check over the snapshot
    pub fn predict(&self, table: &EventTable) -> Vec<PredictionRecord> {
        let mut predictions = Vec::new();
        if table.is_empty() {
            return predictions;
        }

        predictions.extend(self.check_attack_escalation(table));
        predictions.extend(self.check_traffic_overload(table));
        predictions.extend(self.check_persistent_access(table));
        predictions.extend(self.check_network_instability(table));
        predictions.extend(self.check_brute_force_acceleration(table));

        log::debug!("Trend analysis produced {} prediction(s)", predictions.len());
        predictions
    }

    /// Compare denials in the earlier and later halves of the snapshot
    fn check_attack_escalation(&self, table: &EventTable) -> Option<PredictionRecord> {
        let events = table.events();
        let total = events.iter().filter(|e| e.is_denied()).count();
        if total < self.config.escalation_min_denies {
            return None;
        }

        let mid = events.len() / 2;
        let first_half = events[..mid].iter().filter(|e| e.is_denied()).count();
        let second_half = total - first_half;

        if second_half as f64 > first_half as f64 * self.config.escalation_ratio {
            Some(PredictionRecord::new(
                PredictionType::AttackEscalation,
                format!("Denied access attempts increasing: {} → {}", first_half, second_half),
                "Monitor for coordinated attack, consider blocking suspicious sources".to_string(),
            ))
        } else {
            None
        }
    }

    fn check_traffic_overload(&self, table: &EventTable) -> Option<PredictionRecord> {
        let heavy: Vec<u64> = table
            .iter()
            .map(|e| e.packet_count())
            .filter(|packets| *packets > self.config.overload_packets)
            .collect();

        if heavy.len() < self.config.overload_min_events {
            return None;
        }

        let mean = heavy.iter().map(|packets| *packets as f64).sum::<f64>() / heavy.len() as f64;
        Some(PredictionRecord::new(
            PredictionType::TrafficOverloadRisk,
            format!("{} high-traffic events (avg: {:.0} packets)", heavy.len(), mean),
            "Monitor bandwidth usage, prepare for potential DoS attack".to_string(),
        ))
    }

    /// One prediction per non-IT source repeatedly reaching for servers
    fn check_persistent_access(&self, table: &EventTable) -> Vec<PredictionRecord> {
        let offending = table.iter().filter(|e| {
            self.classifier
                .is_unauthorized_server_access(e.source(), e.destination())
        });

        let mut counts = count_by_source(offending);
        // Most frequent first; the sort is stable so ties keep first-seen order
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        counts
            .into_iter()
            .filter(|(_, count)| *count >= self.config.persistent_access_min)
            .map(|(source, count)| {
                PredictionRecord::new(
                    PredictionType::PersistentUnauthorizedAccess,
                    format!("{} attempted server access {} times", source, count),
                    format!("Investigate {} - possible compromise or misconfiguration", source),
                )
            })
            .collect()
    }

    fn check_network_instability(&self, table: &EventTable) -> Option<PredictionRecord> {
        let changes = table
            .iter()
            .filter(|e| e.action.as_deref() == Some("NETWORK_CHANGE"))
            .count();

        (changes >= self.config.instability_min_changes).then(|| {
            PredictionRecord::new(
                PredictionType::NetworkInstability,
                format!("{} network topology changes detected", changes),
                "Check switch configurations, verify cable connections".to_string(),
            )
        })
    }

    /// Sources with a sustained run of denials
    ///
    /// Only the number of denials is checked. The spacing between attempts is
    /// not compared, so a slow but long-running attack is reported the same
    /// way as a speeding-up one.
    fn check_brute_force_acceleration(&self, table: &EventTable) -> Vec<PredictionRecord> {
        denies_by_source(table)
            .into_iter()
            .filter(|(_, count)| {
                *count >= self.config.brute_force_denies && *count >= self.config.acceleration_denies
            })
            .map(|(source, count)| {
                PredictionRecord::new(
                    PredictionType::BruteForceAcceleration,
                    format!("{} showing persistent attack pattern ({} attempts)", source, count),
                    format!("Consider blocking {}, investigate source network", source),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NetworkEvent, Severity};

    fn create_event(source: &str, destination: &str, action: &str, packets: u64) -> NetworkEvent {
        NetworkEvent::new("10:00:00", source, destination, action, packets)
    }

    fn allow() -> NetworkEvent {
        create_event("PC_01", "PC_02", "ALLOW", 10)
    }

    fn deny(source: &str) -> NetworkEvent {
        create_event(source, "PC_02", "DENY", 10)
    }

    fn predictor() -> TrendPredictor {
        TrendPredictor::new(DeviceClassifier::default())
    }

    fn kinds(predictions: &[PredictionRecord]) -> Vec<PredictionType> {
        predictions.iter().map(|p| p.kind).collect()
    }

    #[test]
    fn test_empty_snapshot_no_predictions() {
        assert!(predictor().predict(&EventTable::empty()).is_empty());
    }

    #[test]
    fn test_attack_escalation_fires_once() {
        // Six rows of normal traffic then six denials: 0 → 6
        let mut events: Vec<NetworkEvent> = (0..6).map(|_| allow()).collect();
        events.extend((0..6).map(|i| deny(&format!("PC_1{}", i))));

        let predictions = predictor().predict(&EventTable::from(events));
        assert_eq!(kinds(&predictions), vec![PredictionType::AttackEscalation]);
        assert_eq!(predictions[0].severity, Severity::High);
        assert_eq!(predictions[0].description, "Denied access attempts increasing: 0 → 6");
    }

    #[test]
    fn test_attack_escalation_needs_clear_growth() {
        // 2 denials early, 4 late: 4 > 3
        let mut events = vec![deny("PC_20"), deny("PC_21"), allow(), allow(), allow(), allow()];
        events.extend(vec![deny("PC_22"), deny("PC_23"), deny("PC_24"), deny("PC_25"), allow(), allow()]);
        assert_eq!(
            kinds(&predictor().predict(&EventTable::from(events))),
            vec![PredictionType::AttackEscalation]
        );

        // 3 early, 3 late is flat
        let mut flat = vec![deny("PC_20"), deny("PC_21"), deny("PC_22"), allow(), allow(), allow()];
        flat.extend(vec![deny("PC_23"), deny("PC_24"), deny("PC_25"), allow(), allow(), allow()]);
        assert!(predictor().predict(&EventTable::from(flat)).is_empty());
    }

    #[test]
    fn test_five_denials_never_escalate() {
        let mut events: Vec<NetworkEvent> = (0..10).map(|_| allow()).collect();
        events.extend((0..5).map(|i| deny(&format!("PC_3{}", i))));

        assert!(predictor().predict(&EventTable::from(events)).is_empty());
    }

    #[test]
    fn test_traffic_overload_reports_mean() {
        let mut events: Vec<NetworkEvent> = (0..4)
            .map(|_| create_event("PC_01", "PC_02", "ALLOW", 200))
            .collect();
        events.push(create_event("PC_01", "PC_02", "ALLOW", 300));
        events.push(create_event("PC_01", "PC_02", "ALLOW", 100));

        let predictions = predictor().predict(&EventTable::from(events));
        assert_eq!(kinds(&predictions), vec![PredictionType::TrafficOverloadRisk]);
        assert_eq!(predictions[0].description, "5 high-traffic events (avg: 220 packets)");
        assert_eq!(predictions[0].severity, Severity::Medium);
    }

    #[test]
    fn test_traffic_overload_handles_huge_packet_counts() {
        let events: Vec<NetworkEvent> = (0..5)
            .map(|_| create_event("PC_01", "PC_02", "ALLOW", u64::MAX))
            .collect();

        let predictions = predictor().predict(&EventTable::from(events));
        assert_eq!(kinds(&predictions), vec![PredictionType::TrafficOverloadRisk]);
        assert!(predictions[0].description.starts_with("5 high-traffic events (avg: 18446744073709551"));
    }

    #[test]
    fn test_persistent_access_per_source() {
        let mut events = Vec::new();
        for _ in 0..3 {
            events.push(create_event("PC_01", "Server_DB", "ALLOW", 10));
        }
        for _ in 0..4 {
            events.push(create_event("PC_02", "DMZ_Web", "ALLOW", 10));
        }
        for _ in 0..2 {
            events.push(create_event("PC_03", "Server_DB", "ALLOW", 10));
        }
        for _ in 0..5 {
            events.push(create_event("IT_PC_01", "Server_DB", "ALLOW", 10));
        }

        let predictions = predictor().predict(&EventTable::from(events));
        assert_eq!(predictions.len(), 2);
        assert!(predictions
            .iter()
            .all(|p| p.kind == PredictionType::PersistentUnauthorizedAccess));
        // Ordered by count, most frequent first
        assert_eq!(predictions[0].description, "PC_02 attempted server access 4 times");
        assert_eq!(predictions[1].description, "PC_01 attempted server access 3 times");
        assert!(predictions[1].recommendation.starts_with("Investigate PC_01"));
    }

    #[test]
    fn test_network_instability_threshold() {
        let nine: Vec<NetworkEvent> = (0..9)
            .map(|_| create_event("Switch_1", "Switch_2", "NETWORK_CHANGE", 1))
            .collect();
        assert!(predictor().predict(&EventTable::from(nine.clone())).is_empty());

        let mut ten = nine;
        ten.push(create_event("Switch_1", "Switch_2", "NETWORK_CHANGE", 1));
        let predictions = predictor().predict(&EventTable::from(ten));
        assert_eq!(kinds(&predictions), vec![PredictionType::NetworkInstability]);
        assert_eq!(predictions[0].description, "10 network topology changes detected");
    }

    #[test]
    fn test_brute_force_acceleration_is_count_based() {
        // Ten evenly spread denials still count: no timing comparison is made
        let mut events = Vec::new();
        for _ in 0..10 {
            events.push(deny("PC_66"));
            events.push(allow());
        }
        for _ in 0..9 {
            events.push(deny("PC_77"));
        }

        let predictions = predictor().predict(&EventTable::from(events));
        let acceleration: Vec<&PredictionRecord> = predictions
            .iter()
            .filter(|p| p.kind == PredictionType::BruteForceAcceleration)
            .collect();

        assert_eq!(acceleration.len(), 1);
        assert_eq!(
            acceleration[0].description,
            "PC_66 showing persistent attack pattern (10 attempts)"
        );
    }

    #[test]
    fn test_acceleration_ignores_rows_without_source() {
        let events: Vec<NetworkEvent> = (0..12)
            .map(|i| NetworkEvent {
                timestamp: format!("10:00:{:02}", i),
                source: None,
                destination: Some("PC_02".to_string()),
                action: Some("DENY".to_string()),
                packets: Some(10),
            })
            .collect();

        let predictions = predictor().predict(&EventTable::from(events));
        assert!(!predictions
            .iter()
            .any(|p| p.kind == PredictionType::BruteForceAcceleration));
    }

    #[test]
    fn test_checks_are_independent() {
        let mut events = Vec::new();
        for _ in 0..10 {
            events.push(create_event("Switch_1", "Switch_2", "NETWORK_CHANGE", 1));
        }
        for _ in 0..3 {
            events.push(create_event("PC_01", "Server_DB", "ALLOW", 150));
        }
        for _ in 0..12 {
            events.push(create_event("PC_09", "Server_DB", "DENY", 150));
        }

        let found = kinds(&predictor().predict(&EventTable::from(events)));
        assert_eq!(
            found,
            vec![
                PredictionType::AttackEscalation,
                PredictionType::TrafficOverloadRisk,
                PredictionType::PersistentUnauthorizedAccess,
                PredictionType::PersistentUnauthorizedAccess,
                PredictionType::NetworkInstability,
                PredictionType::BruteForceAcceleration,
            ]
        );
    }
}
