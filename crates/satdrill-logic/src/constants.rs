//! Engine constants — planetary radius, critical commands, score weights.
//!
//! Plain constants with no database dependency. Both the training server
//! and the native simtest use these.

/// Mean planetary radius in km, used to convert orbital elements to
/// apoapsis/periapsis altitudes.
pub const PLANET_RADIUS_KM: f64 = 6371.0;

/// Commands whose issuance is tracked separately in the performance
/// metrics. These are the irreversible or safety-relevant operations a
/// trainee can send.
pub const CRITICAL_COMMANDS: [&str; 5] = [
    "FIRE_THRUSTER",
    "ABORT_MANEUVER",
    "SAFE_MODE_ENTER",
    "DEPLOY_SOLAR_PANELS",
    "DEPLOY_ANTENNA",
];

/// Fixed weights for the overall performance score. Must sum to 1.0.
pub mod weights {
    pub const COMMAND_ACCURACY: f64 = 0.30;
    pub const RESPONSE_TIME: f64 = 0.20;
    pub const RESOURCE_MANAGEMENT: f64 = 0.25;
    pub const COMPLETION_TIME: f64 = 0.15;
    pub const ERROR_AVOIDANCE: f64 = 0.10;
}

/// Response-time scoring window (seconds).
pub mod response_window {
    /// Faster than this is penalized as haste.
    pub const IDEAL_MIN_S: f64 = 5.0;
    /// Slower than this decays linearly.
    pub const IDEAL_MAX_S: f64 = 15.0;
    /// Score assigned to hasty responses.
    pub const HASTE_SCORE: f64 = 80.0;
    /// Points lost per second beyond the ideal window.
    pub const DECAY_PER_S: f64 = 2.0;
}

/// Completion-time bonus: sessions finishing under this limit with a high
/// completion ratio earn extra points.
pub mod completion_bonus {
    pub const FAST_SESSION_S: f64 = 1800.0;
    pub const MIN_RATIO: f64 = 0.9;
    pub const BONUS_POINTS: f64 = 10.0;
}

/// Minimum overall score per performance tier, scanned highest first.
pub mod tier_thresholds {
    pub const EXCELLENT: f64 = 90.0;
    pub const GOOD: f64 = 75.0;
    pub const SATISFACTORY: f64 = 60.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        let sum = weights::COMMAND_ACCURACY
            + weights::RESPONSE_TIME
            + weights::RESOURCE_MANAGEMENT
            + weights::COMPLETION_TIME
            + weights::ERROR_AVOIDANCE;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn tier_thresholds_descend() {
        assert!(tier_thresholds::EXCELLENT > tier_thresholds::GOOD);
        assert!(tier_thresholds::GOOD > tier_thresholds::SATISFACTORY);
    }

    #[test]
    fn critical_commands_uppercase() {
        for name in CRITICAL_COMMANDS {
            assert_eq!(name, name.to_uppercase());
        }
    }
}
