//! Cosmetic answer analysis.
//!
//! Nothing here measures the answer. Live scores and the overall
//! performance metrics follow a seeded random walk so that a given
//! `(seed, turn, tick)` always produces the same numbers.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::config::schema::ScriptConfig;

/// Scores shown while the candidate is answering.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LiveScores {
    /// Speaking confidence
    pub confidence: f64,
    /// How much of the expected answer has been covered
    pub completeness: f64,
    /// Technical accuracy of the answer so far
    pub technical_accuracy: f64,
}

/// Session-wide performance metrics.
///
/// Values are percentages in `[0, 100]`. Only confidence, clarity,
/// technical accuracy and completeness move during a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    /// Confidence
    pub confidence: f64,
    /// Clarity of delivery
    pub clarity: f64,
    /// Technical accuracy
    pub technical_accuracy: f64,
    /// Relevance to the question
    pub relevance: f64,
    /// Never drops below 50
    pub completeness: f64,
    /// Speaking pace
    pub pace: f64,
    /// Body language
    pub body_language: f64,
    /// Eye contact
    pub eye_contact: f64,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            confidence: 72.0,
            clarity: 85.0,
            technical_accuracy: 78.0,
            relevance: 90.0,
            completeness: 82.0,
            pace: 75.0,
            body_language: 80.0,
            eye_contact: 72.0,
        }
    }
}

impl PerformanceMetrics {
    /// Labelled values in display order.
    #[must_use]
    pub const fn entries(&self) -> [(&'static str, f64); 8] {
        [
            ("Confidence", self.confidence),
            ("Clarity", self.clarity),
            ("Technical accuracy", self.technical_accuracy),
            ("Relevance", self.relevance),
            ("Completeness", self.completeness),
            ("Pace", self.pace),
            ("Body language", self.body_language),
            ("Eye contact", self.eye_contact),
        ]
    }

    /// Rounded mean of all eight metrics.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn overall(&self) -> u8 {
        let entries = self.entries();
        let sum: f64 = entries.iter().map(|(_, v)| v).sum();
        (sum / entries.len() as f64).round().clamp(0.0, 100.0) as u8
    }
}

/// Seeded random walk for the analysis panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsWalk {
    seed: u64,
}

impl MetricsWalk {
    /// Creates a walk for `seed`.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn rng(self, turn: u64, tick: u32) -> StdRng {
        // splitmix-style mixing keeps neighbouring ticks uncorrelated
        let mut z = self
            .seed
            .wrapping_add(turn.wrapping_mul(0x9E37_79B9_7F4A_7C15))
            .wrapping_add(u64::from(tick).wrapping_mul(0xBF58_476D_1CE4_E5B9));
        z = (z ^ (z >> 30)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        StdRng::seed_from_u64(z)
    }

    /// Applies analysis tick `tick` of turn `turn`.
    pub fn step(
        self,
        turn: u64,
        tick: u32,
        live: &mut LiveScores,
        performance: &mut PerformanceMetrics,
    ) {
        let mut rng = self.rng(turn, tick);

        live.confidence = clamp_score(live.confidence + rng.random_range(-2.0..3.0));
        live.completeness = clamp_score(live.completeness + rng.random_range(0.0..3.0));
        live.technical_accuracy =
            clamp_score(live.technical_accuracy + rng.random_range(-1.0..1.0));

        performance.confidence =
            clamp_score(performance.confidence + rng.random_range(-0.2..0.3));
        performance.clarity = clamp_score(performance.clarity + rng.random_range(-0.1..0.3));
        performance.technical_accuracy =
            clamp_score(performance.technical_accuracy + rng.random_range(-0.3..0.3));
        performance.completeness =
            (performance.completeness + rng.random_range(-0.1..0.4)).clamp(50.0, 100.0);
    }

    /// Live scores after `ticks` ticks of `turn`, starting from zero.
    #[must_use]
    pub fn live_scores_at(self, turn: u64, ticks: u32) -> LiveScores {
        let mut live = LiveScores::default();
        let mut scratch = PerformanceMetrics::default();
        for tick in 1..=ticks {
            self.step(turn, tick, &mut live, &mut scratch);
        }
        live
    }
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Feedback lines for `turn`.
///
/// A turn's own feedback wins; otherwise the script-level lists are used
/// cyclically. Returns `None` when neither exists.
#[must_use]
pub fn feedback_for(script: &ScriptConfig, turn: usize) -> Option<Vec<String>> {
    if let Some(own) = script.turn(turn).map(|t| &t.feedback)
        && !own.is_empty()
    {
        return Some(own.clone());
    }
    if script.feedback.is_empty() {
        return None;
    }
    Some(script.feedback[turn % script.feedback.len()].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ScriptedTurn;
    use proptest::prelude::*;

    #[test]
    fn default_overall_is_rounded_mean() {
        // (72 + 85 + 78 + 90 + 82 + 75 + 80 + 72) / 8 = 79.25
        assert_eq!(PerformanceMetrics::default().overall(), 79);
    }

    #[test]
    fn walk_is_deterministic() {
        let walk = MetricsWalk::new(42);
        assert_eq!(walk.live_scores_at(3, 5), walk.live_scores_at(3, 5));
        assert_ne!(walk.live_scores_at(3, 5), MetricsWalk::new(43).live_scores_at(3, 5));
    }

    #[test]
    fn zero_ticks_is_zero() {
        assert_eq!(MetricsWalk::new(7).live_scores_at(0, 0), LiveScores::default());
    }

    #[test]
    fn completeness_only_grows() {
        let walk = MetricsWalk::new(1);
        let mut previous = 0.0;
        for ticks in 1..20 {
            let live = walk.live_scores_at(0, ticks);
            assert!(live.completeness >= previous);
            previous = live.completeness;
        }
    }

    #[test]
    fn turn_feedback_overrides_script_feedback() {
        let script = ScriptConfig {
            feedback: vec![vec!["global 0".into()], vec!["global 1".into()]],
            turns: vec![
                ScriptedTurn {
                    feedback: vec!["own".into()],
                    ..ScriptedTurn::default()
                },
                ScriptedTurn::default(),
            ],
            ..ScriptConfig::default()
        };
        assert_eq!(feedback_for(&script, 0), Some(vec!["own".to_string()]));
        assert_eq!(feedback_for(&script, 1), Some(vec!["global 1".to_string()]));
        assert_eq!(feedback_for(&script, 3), Some(vec!["global 1".to_string()]));
    }

    #[test]
    fn no_feedback_anywhere() {
        let script = ScriptConfig {
            turns: vec![ScriptedTurn::default()],
            ..ScriptConfig::default()
        };
        assert_eq!(feedback_for(&script, 0), None);
    }

    proptest! {
        #[test]
        fn walk_stays_within_clamps(seed in any::<u64>(), turns in 1u64..5, ticks in 1u32..60) {
            let walk = MetricsWalk::new(seed);
            let mut perf = PerformanceMetrics::default();
            for turn in 0..turns {
                let mut live = LiveScores::default();
                for tick in 1..=ticks {
                    walk.step(turn, tick, &mut live, &mut perf);
                    for v in [live.confidence, live.completeness, live.technical_accuracy] {
                        prop_assert!((0.0..=100.0).contains(&v));
                    }
                    for (_, v) in perf.entries() {
                        prop_assert!((0.0..=100.0).contains(&v));
                    }
                    prop_assert!(perf.completeness >= 50.0);
                }
            }
        }
    }
}
