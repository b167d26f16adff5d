//! Probability event ledger
//!
//! Append-only record of every roll outcome in a session. Unbounded by
//! default; with a capacity it behaves as a ring buffer and evicts the oldest
//! entries first.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::prob::{EventAnalysis, analyze_probability_events};

/// Number of entries used for the "recent events" HUD stats
pub const RECENT_WINDOW: usize = 10;

/// One recorded probability outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Event kind, e.g. `treasure_treasure-2` or `weather_rain`
    #[serde(rename = "type")]
    pub kind: String,
    pub probability: f64,
    pub success: bool,
    /// Epoch milliseconds
    #[serde(rename = "timestamp")]
    pub timestamp_ms: u64,
}

/// Summary of the most recent entries
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RecentStats {
    pub success_rate: f64,
    pub total_events: usize,
    pub successful_events: usize,
}

/// Session event log
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLedger {
    entries: VecDeque<LedgerEntry>,
    /// Maximum retained entries (None = keep everything)
    capacity: Option<usize>,
    /// Entries ever recorded, including evicted ones
    total_recorded: u64,
}

impl EventLedger {
    /// Unbounded ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger that keeps at most `capacity` entries
    pub fn bounded(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity: Some(capacity.max(1)),
            total_recorded: 0,
        }
    }

    /// Build from an optional capacity
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        match capacity {
            Some(cap) => Self::bounded(cap),
            None => Self::new(),
        }
    }

    /// Append an outcome
    pub fn record(
        &mut self,
        kind: impl Into<String>,
        probability: f64,
        success: bool,
        timestamp_ms: u64,
    ) {
        if let Some(cap) = self.capacity {
            while self.entries.len() >= cap {
                self.entries.pop_front();
            }
        }
        self.entries.push_back(LedgerEntry {
            kind: kind.into(),
            probability,
            success,
            timestamp_ms,
        });
        self.total_recorded += 1;
    }

    /// Drop every entry (session reset)
    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_recorded = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_recorded(&self) -> u64 {
        self.total_recorded
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&LedgerEntry> {
        self.entries.back()
    }

    /// Entries whose kind starts with `prefix`
    pub fn of_kind<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a LedgerEntry> + 'a {
        self.entries.iter().filter(move |e| e.kind.starts_with(prefix))
    }

    /// Long-run analysis over all retained entries
    pub fn analyze(&self) -> EventAnalysis {
        analyze_probability_events(self.entries.iter())
    }

    /// Success stats over the last [`RECENT_WINDOW`] entries
    pub fn recent_stats(&self) -> RecentStats {
        let skip = self.entries.len().saturating_sub(RECENT_WINDOW);
        let recent = self.entries.iter().skip(skip);
        let (total, successful) = recent.fold((0, 0), |(t, s), e| (t + 1, s + e.success as usize));
        RecentStats {
            success_rate: if total > 0 {
                successful as f64 / total as f64
            } else {
                0.0
            },
            total_events: total,
            successful_events: successful,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prob::roll_probability;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_record_appends_in_order() {
        let mut ledger = EventLedger::new();
        ledger.record("weather_rain", 0.3, true, 10);
        ledger.record("powerup_speed", 0.4, true, 20);
        let kinds: Vec<_> = ledger.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, ["weather_rain", "powerup_speed"]);
        assert_eq!(ledger.last().map(|e| e.timestamp_ms), Some(20));
    }

    #[test]
    fn test_bounded_evicts_oldest() {
        let mut ledger = EventLedger::bounded(3);
        for i in 0..5u64 {
            ledger.record(format!("e{}", i), 0.5, true, i);
        }
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.total_recorded(), 5);
        assert_eq!(ledger.iter().next().map(|e| e.kind.as_str()), Some("e2"));
    }

    #[test]
    fn test_recent_stats_window() {
        let mut ledger = EventLedger::new();
        for _ in 0..5 {
            ledger.record("old", 0.5, false, 0);
        }
        for i in 0..10 {
            ledger.record("new", 0.5, i % 2 == 0, 0);
        }
        let stats = ledger.recent_stats();
        assert_eq!(stats.total_events, 10);
        assert_eq!(stats.successful_events, 5);
        assert!((stats.success_rate - 0.5).abs() < 1e-9);
        assert_eq!(EventLedger::new().recent_stats(), RecentStats::default());
    }

    #[test]
    fn test_of_kind_filters_prefix() {
        let mut ledger = EventLedger::new();
        ledger.record("treasure_treasure-0", 0.5, true, 0);
        ledger.record("weather_sunny", 0.5, true, 0);
        ledger.record("treasure_treasure-1", 0.25, false, 0);
        assert_eq!(ledger.of_kind("treasure_").count(), 2);
    }

    #[test]
    fn test_long_run_converges() {
        let mut rng = Pcg32::seed_from_u64(2024);
        let mut ledger = EventLedger::new();
        for i in 0..10_000u64 {
            let p = [0.25, 0.5, 0.75][(i % 3) as usize];
            let hit = roll_probability(&mut rng, p);
            ledger.record("trial", p, hit, i);
        }
        let analysis = ledger.analyze();
        assert_eq!(analysis.total_events, 10_000);
        assert!(analysis.deviation < 0.02, "deviation {}", analysis.deviation);
    }

    #[test]
    fn test_serializes_with_reference_field_names() {
        let mut ledger = EventLedger::new();
        ledger.record("powerup_speed", 0.4, true, 1234);
        let json = serde_json::to_value(ledger.last()).unwrap();
        assert_eq!(json["type"], "powerup_speed");
        assert_eq!(json["timestamp"], 1234);
    }
}
