//! Performance score formulas — five sub-scores, a weighted overall, and
//! qualitative tiers.
//!
//! Every formula is a pure function of the raw counters so the tracker can
//! recompute the full breakdown after each recorded event instead of
//! accumulating increments that drift. All scores are rounded to one
//! decimal place.

use serde::{Deserialize, Serialize};

use crate::constants::{completion_bonus, response_window, tier_thresholds, weights};

/// Round to one decimal place.
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Command accuracy in percent. Redundant commands charge a penalty of
/// 0.05 each, capped at 0.2. Scores 100 before any command is issued.
pub fn command_accuracy_score(total: u32, correct: u32, redundant: u32) -> f64 {
    if total == 0 {
        return 100.0;
    }
    let ratio = f64::from(correct) / f64::from(total);
    let penalty = (f64::from(redundant) * 0.05).min(0.2);
    round1(((ratio - penalty) * 100.0).max(0.0))
}

/// Response-time score. The ideal window rewards deliberate operation:
/// answering faster than 5s is treated as haste, slower than 15s decays
/// 2 points per second. Scores 100 while no samples exist.
pub fn response_time_score(average_s: Option<f64>) -> f64 {
    let Some(avg) = average_s else {
        return 100.0;
    };
    let score = if avg < response_window::IDEAL_MIN_S {
        response_window::HASTE_SCORE
    } else if avg <= response_window::IDEAL_MAX_S {
        100.0
    } else {
        (100.0 - (avg - response_window::IDEAL_MAX_S) * response_window::DECAY_PER_S).max(0.0)
    };
    round1(score)
}

/// Mean of power and fuel efficiency, each clamped to [0, 100] so a
/// battery charged above its initial level cannot inflate the score.
pub fn resource_management_score(power_efficiency: f64, fuel_efficiency: f64) -> f64 {
    let p = power_efficiency.clamp(0.0, 100.0);
    let f = fuel_efficiency.clamp(0.0, 100.0);
    round1((p + f) / 2.0)
}

/// Completion ratio in percent, with a bonus for fast, near-complete runs.
pub fn completion_time_score(completed: u32, total_steps: u32, session_elapsed_s: f64) -> f64 {
    if total_steps == 0 {
        return 0.0;
    }
    let ratio = f64::from(completed) / f64::from(total_steps);
    let mut score = ratio * 100.0;
    if session_elapsed_s < completion_bonus::FAST_SESSION_S && ratio > completion_bonus::MIN_RATIO {
        score = (score + completion_bonus::BONUS_POINTS).min(100.0);
    }
    round1(score)
}

/// Errors charge 20/10/5 points by severity, floored at 0.
pub fn error_avoidance_score(critical: u32, warning: u32, minor: u32) -> f64 {
    let penalty =
        20.0 * f64::from(critical) + 10.0 * f64::from(warning) + 5.0 * f64::from(minor);
    round1((100.0 - penalty).max(0.0))
}

/// The five sub-scores, each already rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub command_accuracy: f64,
    pub response_time: f64,
    pub resource_management: f64,
    pub completion_time: f64,
    pub error_avoidance: f64,
}

/// Weighted overall score from the sub-scores.
pub fn overall_score(breakdown: &ScoreBreakdown) -> f64 {
    round1(
        breakdown.command_accuracy * weights::COMMAND_ACCURACY
            + breakdown.response_time * weights::RESPONSE_TIME
            + breakdown.resource_management * weights::RESOURCE_MANAGEMENT
            + breakdown.completion_time * weights::COMPLETION_TIME
            + breakdown.error_avoidance * weights::ERROR_AVOIDANCE,
    )
}

/// Qualitative performance bracket derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTier {
    Excellent,
    Good,
    Satisfactory,
    NeedsImprovement,
}

impl PerformanceTier {
    /// Highest tier whose minimum threshold the score meets.
    pub fn from_score(overall: f64) -> Self {
        if overall >= tier_thresholds::EXCELLENT {
            Self::Excellent
        } else if overall >= tier_thresholds::GOOD {
            Self::Good
        } else if overall >= tier_thresholds::SATISFACTORY {
            Self::Satisfactory
        } else {
            Self::NeedsImprovement
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Satisfactory => "Satisfactory",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_perfect() {
        assert_eq!(command_accuracy_score(10, 10, 0), 100.0);
    }

    #[test]
    fn accuracy_no_commands_yet() {
        assert_eq!(command_accuracy_score(0, 0, 0), 100.0);
    }

    #[test]
    fn accuracy_redundancy_penalty() {
        // 10/10 correct but 2 redundant: (1.0 − 0.1) × 100 = 90
        assert_eq!(command_accuracy_score(10, 10, 2), 90.0);
    }

    #[test]
    fn accuracy_redundancy_penalty_capped() {
        // 10 redundant would be 0.5 penalty, capped at 0.2.
        assert_eq!(command_accuracy_score(10, 10, 10), 80.0);
    }

    #[test]
    fn accuracy_floored_at_zero() {
        assert_eq!(command_accuracy_score(10, 0, 10), 0.0);
    }

    #[test]
    fn response_ideal_window() {
        assert_eq!(response_time_score(Some(5.0)), 100.0);
        assert_eq!(response_time_score(Some(10.0)), 100.0);
        assert_eq!(response_time_score(Some(15.0)), 100.0);
    }

    #[test]
    fn response_haste_penalized() {
        assert_eq!(response_time_score(Some(2.0)), 80.0);
    }

    #[test]
    fn response_slow_decay() {
        // 100 − (20 − 15) × 2 = 90
        assert_eq!(response_time_score(Some(20.0)), 90.0);
        assert_eq!(response_time_score(Some(65.0)), 0.0);
        assert_eq!(response_time_score(Some(200.0)), 0.0);
    }

    #[test]
    fn response_no_samples() {
        assert_eq!(response_time_score(None), 100.0);
    }

    #[test]
    fn resource_mean_of_efficiencies() {
        assert_eq!(resource_management_score(80.0, 60.0), 70.0);
    }

    #[test]
    fn resource_overcharge_clamped() {
        // Battery charged above its initial level: 120% clamps to 100.
        assert_eq!(resource_management_score(120.0, 100.0), 100.0);
    }

    #[test]
    fn completion_plain_ratio() {
        assert_eq!(completion_time_score(3, 6, 3600.0), 50.0);
    }

    #[test]
    fn completion_fast_bonus() {
        // 10/10 in under 30 minutes: 100 + 10 capped at 100.
        assert_eq!(completion_time_score(10, 10, 1200.0), 100.0);
        // 19/20 = 95% in under 30 minutes: 95 + 10 capped at 100.
        assert_eq!(completion_time_score(19, 20, 1200.0), 100.0);
    }

    #[test]
    fn completion_bonus_needs_high_ratio() {
        // 50% in under 30 minutes gets no bonus.
        assert_eq!(completion_time_score(5, 10, 1200.0), 50.0);
    }

    #[test]
    fn completion_no_steps() {
        assert_eq!(completion_time_score(0, 0, 100.0), 0.0);
    }

    #[test]
    fn error_avoidance_severity_weights() {
        assert_eq!(error_avoidance_score(0, 0, 0), 100.0);
        assert_eq!(error_avoidance_score(1, 1, 1), 65.0);
        assert_eq!(error_avoidance_score(5, 0, 0), 0.0);
        assert_eq!(error_avoidance_score(3, 3, 3), 0.0);
    }

    #[test]
    fn overall_weighted_sum() {
        let breakdown = ScoreBreakdown {
            command_accuracy: 100.0,
            response_time: 100.0,
            resource_management: 100.0,
            completion_time: 100.0,
            error_avoidance: 100.0,
        };
        assert_eq!(overall_score(&breakdown), 100.0);

        let mixed = ScoreBreakdown {
            command_accuracy: 90.0,
            response_time: 80.0,
            resource_management: 100.0,
            completion_time: 60.0,
            error_avoidance: 100.0,
        };
        // 27 + 16 + 25 + 9 + 10 = 87
        assert_eq!(overall_score(&mixed), 87.0);
    }

    #[test]
    fn overall_deterministic() {
        let breakdown = ScoreBreakdown {
            command_accuracy: 87.3,
            response_time: 92.1,
            resource_management: 77.7,
            completion_time: 66.6,
            error_avoidance: 95.0,
        };
        let a = overall_score(&breakdown);
        let b = overall_score(&breakdown);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(PerformanceTier::from_score(95.0), PerformanceTier::Excellent);
        assert_eq!(PerformanceTier::from_score(90.0), PerformanceTier::Excellent);
        assert_eq!(PerformanceTier::from_score(89.9), PerformanceTier::Good);
        assert_eq!(PerformanceTier::from_score(75.0), PerformanceTier::Good);
        assert_eq!(PerformanceTier::from_score(60.0), PerformanceTier::Satisfactory);
        assert_eq!(
            PerformanceTier::from_score(59.9),
            PerformanceTier::NeedsImprovement
        );
    }
}
