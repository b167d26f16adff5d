//! Probability helpers
//!
//! Pure functions used by the game and the HUD: formatting a probability as
//! fraction / percentage / decimal, single rolls, combined events and
//! long-run analysis of recorded outcomes.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerEntry;

/// Tolerance for matching a probability against a known fraction
pub const FRACTION_TOLERANCE: f64 = 0.01;

/// Known simple fractions shown instead of "N/100"
const KNOWN_FRACTIONS: [(f64, &str); 21] = [
    (1.0 / 2.0, "1/2"),
    (1.0 / 3.0, "1/3"),
    (2.0 / 3.0, "2/3"),
    (1.0 / 4.0, "1/4"),
    (3.0 / 4.0, "3/4"),
    (1.0 / 5.0, "1/5"),
    (2.0 / 5.0, "2/5"),
    (3.0 / 5.0, "3/5"),
    (4.0 / 5.0, "4/5"),
    (1.0 / 10.0, "1/10"),
    (3.0 / 10.0, "3/10"),
    (7.0 / 10.0, "7/10"),
    (9.0 / 10.0, "9/10"),
    (1.0 / 20.0, "1/20"),
    (3.0 / 20.0, "3/20"),
    (7.0 / 20.0, "7/20"),
    (9.0 / 20.0, "9/20"),
    (11.0 / 20.0, "11/20"),
    (13.0 / 20.0, "13/20"),
    (17.0 / 20.0, "17/20"),
    (19.0 / 20.0, "19/20"),
];

/// A probability rendered three ways
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbabilityFormat {
    pub fraction: String,
    pub percentage: String,
    pub decimal: String,
}

/// Format a probability as fraction, percentage and two-place decimal
///
/// The fraction is the closest known simple fraction within
/// [`FRACTION_TOLERANCE`], otherwise `round(p*100)/100`.
pub fn format_probability(p: f64) -> ProbabilityFormat {
    let percent = (p * 100.0).round() as i64;

    let fraction = KNOWN_FRACTIONS
        .iter()
        .map(|&(value, label)| ((p - value).abs(), label))
        .filter(|&(diff, _)| diff < FRACTION_TOLERANCE)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| format!("{}/100", percent));

    ProbabilityFormat {
        fraction,
        percentage: format!("{}%", percent),
        // Round half up like the percentage, not to even
        decimal: format!("{:.2}", percent as f64 / 100.0),
    }
}

/// Draw `r` uniformly from [0, 1) and succeed when `r <= p`
pub fn roll_probability<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    let roll: f64 = rng.random();
    let success = roll <= p;
    log::debug!(
        "Probability roll: {:.3} vs {:.3} = {}",
        roll,
        p,
        if success { "SUCCESS" } else { "FAIL" }
    );
    success
}

/// One outcome of a random experiment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub value: f64,
    pub probability: f64,
}

/// Sum of value × probability. Probabilities are not required to sum to 1.
pub fn calculate_expected_value(outcomes: &[Outcome]) -> f64 {
    outcomes.iter().map(|o| o.value * o.probability).sum()
}

/// How independent events are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombineMode {
    /// All events happen
    And,
    /// At least one event happens
    Or,
}

/// Probability of combined independent events
///
/// Empty input yields the identity: 1 for AND, 0 for OR.
pub fn calculate_combined_probability(probs: &[f64], mode: CombineMode) -> f64 {
    match mode {
        CombineMode::And => probs.iter().product(),
        CombineMode::Or => 1.0 - probs.iter().map(|p| 1.0 - p).product::<f64>(),
    }
}

/// Observed vs expected success rate over recorded events
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EventAnalysis {
    pub success_rate: f64,
    pub expected_success_rate: f64,
    pub deviation: f64,
    pub total_events: usize,
}

/// Compare how often events succeeded with how often they should have
pub fn analyze_probability_events<'a, I>(events: I) -> EventAnalysis
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    let mut total = 0usize;
    let mut successes = 0usize;
    let mut probability_sum = 0.0;

    for event in events {
        total += 1;
        if event.success {
            successes += 1;
        }
        probability_sum += event.probability;
    }

    if total == 0 {
        return EventAnalysis::default();
    }

    let success_rate = successes as f64 / total as f64;
    let expected_success_rate = probability_sum / total as f64;

    EventAnalysis {
        success_rate,
        expected_success_rate,
        deviation: (success_rate - expected_success_rate).abs(),
        total_events: total,
    }
}

/// Pick a bucket by walking cumulative weights
///
/// The first bucket whose cumulative weight reaches `roll` wins. Weights that
/// sum to less than 1 leave a residual range that returns `None`.
pub fn sample_categorical<T>(buckets: &[(T, f64)], roll: f64) -> Option<&T> {
    let mut cumulative = 0.0;
    for (label, weight) in buckets {
        cumulative += weight;
        if roll <= cumulative {
            return Some(label);
        }
    }
    None
}
