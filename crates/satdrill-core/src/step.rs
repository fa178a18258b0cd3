//! Authored training steps and authoring-time validation.
//!
//! Steps are written by content authors as JSON and read-only to the
//! engine. [`validate_step`] is the authoring-side guard: it catches bad
//! telemetry paths, inverted ranges, and empty command lists when content
//! is saved, so trainees never hit them. The engine still fails closed at
//! evaluation time for anything that slips through.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use satdrill_logic::condition::{Comparator, ConditionKind};
use satdrill_logic::telemetry::is_known_path;

/// One objective within a training scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Sequence position within the scenario.
    pub order: u32,
    pub title: String,
    pub instructions: String,
    /// Completion condition with its kind-specific config.
    pub condition: ConditionKind,
    /// Checkpoint steps gate save/restore of progress.
    #[serde(default)]
    pub is_checkpoint: bool,
    pub expected_duration_s: f64,
    #[serde(default)]
    pub hint: Option<String>,
    /// Step to route to on success. `None` means advance sequentially.
    #[serde(default)]
    pub nominal_branch: Option<u32>,
    /// Step to route to on failure. `None` means the failure is terminal.
    #[serde(default)]
    pub recovery_branch: Option<u32>,
}

/// Problems found in an authored step.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepConfigError {
    #[error("telemetry path '{0}' is not in the subsystem schema")]
    UnknownTelemetryPath(String),
    #[error("command sequence declares no commands")]
    EmptyCommandList,
    #[error("{0} range has min greater than max")]
    InvertedRange(&'static str),
    #[error("threshold comparator is missing its bound(s)")]
    MissingThresholdBound,
    #[error("{0} must not be negative")]
    NegativeDuration(&'static str),
    #[error("{0} condition declares no criteria")]
    NoCriteria(&'static str),
    #[error("step {0} branches to itself")]
    BranchSelfReference(u32),
    #[error("condition kind is not recognized by this engine version")]
    UnknownConditionKind,
}

/// Validate an authored step, returning every problem found.
pub fn validate_step(step: &StepDefinition) -> Vec<StepConfigError> {
    let mut errors = Vec::new();

    if step.expected_duration_s < 0.0 {
        errors.push(StepConfigError::NegativeDuration("expected_duration_s"));
    }
    if step.nominal_branch == Some(step.order) || step.recovery_branch == Some(step.order) {
        errors.push(StepConfigError::BranchSelfReference(step.order));
    }

    match &step.condition {
        ConditionKind::TelemetryThreshold(cfg) => {
            if !is_known_path(&cfg.path) {
                errors.push(StepConfigError::UnknownTelemetryPath(cfg.path.clone()));
            }
            match cfg.comparator {
                Comparator::Between => {
                    match (cfg.min, cfg.max) {
                        (Some(min), Some(max)) if min > max => {
                            errors.push(StepConfigError::InvertedRange("between"));
                        }
                        (Some(_), Some(_)) => {}
                        _ => errors.push(StepConfigError::MissingThresholdBound),
                    }
                }
                _ => {
                    if cfg.value.is_none() {
                        errors.push(StepConfigError::MissingThresholdBound);
                    }
                }
            }
            if cfg.sustain_s.is_some_and(|s| s < 0.0) {
                errors.push(StepConfigError::NegativeDuration("sustain_s"));
            }
        }
        ConditionKind::CommandSequence(cfg) => {
            if cfg.commands.is_empty() {
                errors.push(StepConfigError::EmptyCommandList);
            }
        }
        ConditionKind::SubsystemStatus(cfg) => {
            let path = format!("{}.{}", cfg.subsystem, cfg.field);
            if !is_known_path(&path) {
                errors.push(StepConfigError::UnknownTelemetryPath(path));
            }
        }
        ConditionKind::TimeElapsed(cfg) => {
            if cfg.required_s < 0.0 {
                errors.push(StepConfigError::NegativeDuration("required_s"));
            }
        }
        ConditionKind::ManualConfirmation(cfg) => {
            if cfg.min_duration_s.is_some_and(|s| s < 0.0) {
                errors.push(StepConfigError::NegativeDuration("min_duration_s"));
            }
        }
        ConditionKind::OrbitalManeuver(cfg) => {
            if !cfg.declares_anything() {
                errors.push(StepConfigError::NoCriteria("orbital_maneuver"));
            }
            for (name, range) in [
                ("apoapsis_km", cfg.apoapsis_km),
                ("periapsis_km", cfg.periapsis_km),
                ("altitude_km", cfg.altitude_km),
            ] {
                if range.is_some_and(|r| r.min > r.max) {
                    errors.push(StepConfigError::InvertedRange(name));
                }
            }
        }
        ConditionKind::MissionCompletion(cfg) => {
            if !cfg.declares_anything() {
                errors.push(StepConfigError::NoCriteria("mission_completion"));
            }
        }
        ConditionKind::Unknown => errors.push(StepConfigError::UnknownConditionKind),
        ConditionKind::CommandExecuted(_) | ConditionKind::BeaconReceived(_) => {}
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use satdrill_logic::condition::{
        CommandSequenceConfig, OrbitalManeuverConfig, Range, ThresholdConfig,
    };

    fn step_with(condition: ConditionKind) -> StepDefinition {
        StepDefinition {
            order: 1,
            title: "Check battery".to_string(),
            instructions: "Verify charge level".to_string(),
            condition,
            is_checkpoint: false,
            expected_duration_s: 60.0,
            hint: None,
            nominal_branch: None,
            recovery_branch: None,
        }
    }

    fn threshold(path: &str) -> ConditionKind {
        ConditionKind::TelemetryThreshold(ThresholdConfig {
            path: path.to_string(),
            comparator: Comparator::Gte,
            value: Some(50.0),
            min: None,
            max: None,
            sustain_s: None,
        })
    }

    #[test]
    fn valid_step_has_no_errors() {
        let step = step_with(threshold("power.currentCharge_percent"));
        assert!(validate_step(&step).is_empty());
    }

    #[test]
    fn unknown_path_flagged() {
        let step = step_with(threshold("power.flux_capacitor"));
        assert_eq!(
            validate_step(&step),
            vec![StepConfigError::UnknownTelemetryPath(
                "power.flux_capacitor".to_string()
            )]
        );
    }

    #[test]
    fn between_missing_bound_flagged() {
        let step = step_with(ConditionKind::TelemetryThreshold(ThresholdConfig {
            path: "orbit.altitude_km".to_string(),
            comparator: Comparator::Between,
            value: None,
            min: Some(500.0),
            max: None,
            sustain_s: None,
        }));
        assert!(validate_step(&step).contains(&StepConfigError::MissingThresholdBound));
    }

    #[test]
    fn inverted_range_flagged() {
        let step = step_with(ConditionKind::OrbitalManeuver(OrbitalManeuverConfig {
            apoapsis_km: Some(Range { min: 600.0, max: 500.0 }),
            ..Default::default()
        }));
        assert!(validate_step(&step).contains(&StepConfigError::InvertedRange("apoapsis_km")));
    }

    #[test]
    fn empty_sequence_flagged() {
        let step = step_with(ConditionKind::CommandSequence(CommandSequenceConfig {
            commands: vec![],
            strict_order: true,
            all_must_succeed: false,
        }));
        assert!(validate_step(&step).contains(&StepConfigError::EmptyCommandList));
    }

    #[test]
    fn branch_self_reference_flagged() {
        let mut step = step_with(threshold("power.currentCharge_percent"));
        step.recovery_branch = Some(step.order);
        assert!(validate_step(&step).contains(&StepConfigError::BranchSelfReference(1)));
    }

    #[test]
    fn unknown_kind_flagged() {
        let step = step_with(ConditionKind::Unknown);
        assert!(validate_step(&step).contains(&StepConfigError::UnknownConditionKind));
    }

    #[test]
    fn step_json_roundtrip() {
        let step = step_with(threshold("power.currentCharge_percent"));
        let text = serde_json::to_string(&step).unwrap();
        let back: StepDefinition = serde_json::from_str(&text).unwrap();
        assert_eq!(back.order, step.order);
        assert_eq!(back.condition, step.condition);
    }
}
