//! Per-check outcome type and deterministic number formatting.
//!
//! Every evaluator produces one [`CheckResult`] per declared criterion.
//! A step passes only if every check passes. The optional `progress`
//! percentage carries partial-completion information for conditions that
//! have a natural notion of "how far along" (sequences, counters, timers).

use serde::{Deserialize, Serialize};

/// Outcome of a single condition criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Short identifier for the criterion (path, command name, bound name).
    pub name: String,
    pub passed: bool,
    /// Observed value, formatted.
    pub actual: String,
    /// Required value or range, formatted.
    pub target: String,
    /// Human-readable explanation of the outcome.
    pub message: String,
    /// Partial completion in percent (0–100), where meaningful.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

impl CheckResult {
    pub fn pass(
        name: impl Into<String>,
        actual: impl Into<String>,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            passed: true,
            actual: actual.into(),
            target: target.into(),
            message: message.into(),
            progress: None,
        }
    }

    pub fn fail(
        name: impl Into<String>,
        actual: impl Into<String>,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            passed: false,
            actual: actual.into(),
            target: target.into(),
            message: message.into(),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress.clamp(0.0, 100.0));
        self
    }
}

/// Physical quantities (km, kg, seconds) are shown with one decimal.
pub fn fmt_quantity(v: f64) -> String {
    format!("{v:.1}")
}

/// Percentages are shown with two decimals.
pub fn fmt_percent(v: f64) -> String {
    format!("{v:.2}")
}

/// Format a telemetry value according to its path: `_percent` fields get
/// percent formatting, everything else quantity formatting.
pub fn fmt_for_path(path: &str, v: f64) -> String {
    if path.ends_with("_percent") || path.ends_with("percent") {
        fmt_percent(v)
    } else {
        fmt_quantity(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_one_decimal() {
        assert_eq!(fmt_quantity(421.337), "421.3");
        assert_eq!(fmt_quantity(0.0), "0.0");
    }

    #[test]
    fn percent_two_decimals() {
        assert_eq!(fmt_percent(72.5), "72.50");
        assert_eq!(fmt_percent(100.0), "100.00");
    }

    #[test]
    fn path_sensitive_formatting() {
        assert_eq!(fmt_for_path("power.currentCharge_percent", 72.5), "72.50");
        assert_eq!(fmt_for_path("orbit.altitude_km", 550.04), "550.0");
    }

    #[test]
    fn progress_clamped() {
        let check = CheckResult::pass("seq", "3/2", "2", "done").with_progress(150.0);
        assert_eq!(check.progress, Some(100.0));
    }
}
