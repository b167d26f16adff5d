//! Data-driven game balance
//!
//! Level tables, spawn odds and timer lengths. Defaults reproduce the shipped
//! Easy / Medium / Hard tables; a JSON override can replace any subset.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::TuningError;
use crate::sim::WeatherKind;
use crate::sim::course::TREASURE_SPOTS;

/// Fallback probability when a level has no table entry
pub const DEFAULT_PROBABILITY: f64 = 0.25;

/// Per-level balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelTuning {
    pub name: String,
    pub description: String,
    /// One entry per treasure chest, in layout order
    pub treasure_probabilities: Vec<f64>,
    pub power_up_probability: f64,
    pub parkour_probability: f64,
}

impl LevelTuning {
    fn new(
        name: &str,
        description: &str,
        treasure_probabilities: [f64; 5],
        power_up_probability: f64,
        parkour_probability: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            treasure_probabilities: treasure_probabilities.to_vec(),
            power_up_probability,
            parkour_probability,
        }
    }
}

/// Complete tuning set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Index 0 is level 1
    pub levels: Vec<LevelTuning>,
    pub default_probability: f64,
    /// Weather buckets walked in order by the categorical roll
    pub weather_weights: Vec<(WeatherKind, f64)>,
    pub weather_check_secs: f32,
    pub power_up_check_secs: f32,
    pub parkour_check_secs: f32,
    pub weather_duration_ms: u32,
    pub power_up_duration_ms: u32,
    /// None keeps every ledger entry for the session
    pub ledger_capacity: Option<usize>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            levels: vec![
                LevelTuning::new(
                    "Easy",
                    "Higher probabilities, more frequent power-ups",
                    [0.5, 0.75, 0.25, 0.6, 0.8],
                    0.40,
                    0.25,
                ),
                LevelTuning::new(
                    "Medium",
                    "Moderate probabilities, balanced gameplay",
                    [0.33, 0.5, 0.66, 0.2, 0.75],
                    0.25,
                    0.17,
                ),
                LevelTuning::new(
                    "Hard",
                    "Lower probabilities, rare power-ups, frequent weather changes",
                    [0.25, 0.4, 0.6, 0.15, 0.8],
                    0.15,
                    0.10,
                ),
            ],
            default_probability: DEFAULT_PROBABILITY,
            weather_weights: vec![
                (WeatherKind::Rain, 0.30),
                (WeatherKind::Sunny, 0.50),
                (WeatherKind::Cloudy, 0.20),
            ],
            weather_check_secs: WEATHER_CHECK_SECS,
            power_up_check_secs: POWER_UP_CHECK_SECS,
            parkour_check_secs: PARKOUR_CHECK_SECS,
            weather_duration_ms: WEATHER_DURATION_MS,
            power_up_duration_ms: POWER_UP_DURATION_MS,
            ledger_capacity: None,
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check probability ranges, weight sums and timer lengths
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.levels.is_empty() {
            return Err(TuningError::NoLevels);
        }

        check_probability("default_probability", self.default_probability)?;
        for (i, level) in self.levels.iter().enumerate() {
            let n = i + 1;
            // One probability per chest spot; an empty level could never be completed
            let count = level.treasure_probabilities.len();
            if count == 0 || count > TREASURE_SPOTS.len() {
                return Err(TuningError::TreasureCount {
                    level: n,
                    count,
                    max: TREASURE_SPOTS.len(),
                });
            }
            for (j, &p) in level.treasure_probabilities.iter().enumerate() {
                // Zero would make the chest uncollectable and its score infinite
                if p <= 0.0 || p > 1.0 {
                    return Err(TuningError::ProbabilityRange {
                        field: format!("levels[{}].treasure_probabilities[{}]", n, j),
                        value: p,
                    });
                }
            }
            check_probability(
                &format!("levels[{}].power_up_probability", n),
                level.power_up_probability,
            )?;
            check_probability(
                &format!("levels[{}].parkour_probability", n),
                level.parkour_probability,
            )?;
        }

        let mut sum = 0.0;
        for (kind, weight) in &self.weather_weights {
            check_probability(&format!("weather_weights.{}", kind.as_str()), *weight)?;
            sum += weight;
        }
        if (sum - 1.0).abs() > 1e-6 {
            return Err(TuningError::WeatherWeights { sum });
        }

        for (field, value) in [
            ("weather_check_secs", self.weather_check_secs as f64),
            ("power_up_check_secs", self.power_up_check_secs as f64),
            ("parkour_check_secs", self.parkour_check_secs as f64),
            ("weather_duration_ms", self.weather_duration_ms as f64),
            ("power_up_duration_ms", self.power_up_duration_ms as f64),
        ] {
            if value <= 0.0 {
                return Err(TuningError::NonPositive { field, value });
            }
        }
        Ok(())
    }

    /// Balance for a 1-based level, if it exists
    pub fn level(&self, level: u32) -> Option<&LevelTuning> {
        (level as usize)
            .checked_sub(1)
            .and_then(|i| self.levels.get(i))
    }

    /// Power-up spawn odds for a level, falling back to the default
    pub fn power_up_probability(&self, level: u32) -> f64 {
        self.level(level)
            .map(|l| l.power_up_probability)
            .unwrap_or(self.default_probability)
    }

    /// Parkour spawn odds for a level, falling back to the default
    pub fn parkour_probability(&self, level: u32) -> f64 {
        self.level(level)
            .map(|l| l.parkour_probability)
            .unwrap_or(self.default_probability)
    }

    /// Chest probabilities for a level (empty when unmapped)
    pub fn treasure_probabilities(&self, level: u32) -> &[f64] {
        self.level(level)
            .map(|l| l.treasure_probabilities.as_slice())
            .unwrap_or(&[])
    }
}

fn check_probability(field: &str, value: f64) -> Result<(), TuningError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::ProbabilityRange {
            field: field.to_string(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_level_tables() {
        let t = Tuning::default();
        assert_eq!(t.power_up_probability(1), 0.40);
        assert_eq!(t.power_up_probability(2), 0.25);
        assert_eq!(t.power_up_probability(3), 0.15);
        assert_eq!(t.parkour_probability(2), 0.17);
        assert_eq!(t.parkour_probability(3), 0.10);
    }

    #[test]
    fn test_unmapped_level_uses_default() {
        let t = Tuning::default();
        assert_eq!(t.power_up_probability(0), DEFAULT_PROBABILITY);
        assert_eq!(t.power_up_probability(7), DEFAULT_PROBABILITY);
        assert_eq!(t.parkour_probability(4), DEFAULT_PROBABILITY);
        assert!(t.treasure_probabilities(9).is_empty());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let t = Tuning::from_json(r#"{ "ledger_capacity": 50, "power_up_duration_ms": 6000 }"#)
            .unwrap();
        assert_eq!(t.ledger_capacity, Some(50));
        assert_eq!(t.power_up_duration_ms, 6000);
        assert_eq!(t.levels.len(), 3);
    }

    #[test]
    fn test_rejects_bad_weather_sum() {
        let json = r#"{ "weather_weights": [["rain", 0.3], ["sunny", 0.3]] }"#;
        assert!(matches!(
            Tuning::from_json(json),
            Err(TuningError::WeatherWeights { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_treasure_probability() {
        let mut t = Tuning::default();
        t.levels[0].treasure_probabilities[2] = 0.0;
        assert!(matches!(
            t.validate(),
            Err(TuningError::ProbabilityRange { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_treasure_counts() {
        let mut t = Tuning::default();
        t.levels[1].treasure_probabilities.clear();
        assert!(matches!(
            t.validate(),
            Err(TuningError::TreasureCount { level: 2, count: 0, max: 5 })
        ));

        t.levels[1].treasure_probabilities = vec![0.5; 6];
        assert!(matches!(
            t.validate(),
            Err(TuningError::TreasureCount { level: 2, count: 6, .. })
        ));

        t.levels[1].treasure_probabilities = vec![0.5; 3];
        assert!(t.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_treasure_table_in_json() {
        let json = r#"{ "levels": [{
            "name": "Empty",
            "description": "",
            "treasure_probabilities": [],
            "power_up_probability": 0.4,
            "parkour_probability": 0.25
        }] }"#;
        assert!(matches!(
            Tuning::from_json(json),
            Err(TuningError::TreasureCount { count: 0, .. })
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(Tuning::from_json("{"), Err(TuningError::Json(_))));
    }

    #[test]
    fn test_exported_json_reloads() {
        let t = Tuning::default();
        let back = Tuning::from_json(&t.to_json().unwrap()).unwrap();
        let names: Vec<_> = back.levels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Easy", "Medium", "Hard"]);
        assert_eq!(back.weather_weights.len(), 3);
        assert_eq!(back.ledger_capacity, None);
    }
}
