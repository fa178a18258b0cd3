//! Step validation — dispatch, aggregate, transition.
//!
//! One evaluation call runs the active step's condition against the
//! current session state and produces a [`ValidationResult`]: did the
//! step pass, which checks drove the verdict, and where the step graph
//! goes next. The engine has no state of its own; identical inputs yield
//! identical results.
//!
//! Faults never cross this boundary. Malformed configs and unknown
//! condition kinds fail closed, and a panicking evaluator is caught and
//! converted into a failed verdict — a broken step definition must never
//! take down the trainee's session.

use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use satdrill_logic::check::CheckResult;
use satdrill_logic::evaluate::evaluate_condition;

use crate::session::SessionState;
use crate::step::StepDefinition;

/// Step-graph transition outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPath {
    Nominal,
    Recovery,
    Failed,
}

/// Structured verdict for one evaluation of one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub checks: Vec<CheckResult>,
    pub path: StepPath,
    /// Step to route to. `None` on the nominal path means "advance
    /// sequentially" (the caller's decision); `None` on the failed path
    /// means the failure is terminal.
    pub next_step: Option<u32>,
    pub message: String,
}

/// Stateless evaluation pipeline over (step, session) pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationEngine;

impl ValidationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate the step's condition against current session state and
    /// apply the transition rules.
    pub fn evaluate_step(
        &self,
        step: &StepDefinition,
        session: &SessionState,
    ) -> ValidationResult {
        let ctx = session.eval_context();
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| evaluate_condition(&step.condition, &ctx)));

        let checks = match outcome {
            Ok(Ok(checks)) => checks,
            Ok(Err(config_err)) => {
                log::warn!(
                    "step {} ({}): {config_err}",
                    step.order,
                    step.condition.label()
                );
                return self.fail_result(step, Vec::new(), config_err.to_string());
            }
            Err(payload) => {
                let text = panic_text(payload.as_ref());
                log::warn!(
                    "step {} ({}): evaluator fault: {text}",
                    step.order,
                    step.condition.label()
                );
                return self.fail_result(step, Vec::new(), format!("evaluator fault: {text}"));
            }
        };

        let passed = !checks.is_empty() && checks.iter().all(|c| c.passed);
        if passed {
            log::debug!("step {} passed ({} checks)", step.order, checks.len());
            return ValidationResult {
                passed: true,
                checks,
                path: StepPath::Nominal,
                next_step: step.nominal_branch,
                message: format!("step {} objective met", step.order),
            };
        }

        let reason = checks
            .iter()
            .find(|c| !c.passed)
            .map(|c| c.message.clone())
            .unwrap_or_else(|| "condition produced no checks".to_string());
        self.fail_result(step, checks, reason)
    }

    fn fail_result(
        &self,
        step: &StepDefinition,
        checks: Vec<CheckResult>,
        reason: String,
    ) -> ValidationResult {
        match step.recovery_branch {
            Some(branch) => {
                log::info!("step {} failed, routing to recovery step {branch}", step.order);
                ValidationResult {
                    passed: false,
                    checks,
                    path: StepPath::Recovery,
                    next_step: Some(branch),
                    message: format!("{reason}; routing to recovery step {branch}"),
                }
            }
            None => ValidationResult {
                passed: false,
                checks,
                path: StepPath::Failed,
                next_step: None,
                message: reason,
            },
        }
    }
}

fn panic_text(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satdrill_logic::command::{CommandRecord, CommandStatus};
    use satdrill_logic::condition::{
        BeaconReceivedConfig, CommandExecutedConfig, CommandSequenceConfig, Comparator,
        ConditionKind, ThresholdConfig,
    };
    use satdrill_logic::telemetry::TelemetrySnapshot;
    use serde_json::json;

    fn step(order: u32, condition: ConditionKind) -> StepDefinition {
        StepDefinition {
            order,
            title: format!("Step {order}"),
            instructions: String::new(),
            condition,
            is_checkpoint: false,
            expected_duration_s: 60.0,
            hint: None,
            nominal_branch: None,
            recovery_branch: None,
        }
    }

    fn charged_session() -> SessionState {
        let mut session = SessionState::new();
        session.telemetry = TelemetrySnapshot::new(json!({
            "power": { "currentCharge_percent": 85.0 },
            "communications": { "beaconCount": 2 },
        }));
        session
    }

    fn threshold_gte(path: &str, value: f64) -> ConditionKind {
        ConditionKind::TelemetryThreshold(ThresholdConfig {
            path: path.to_string(),
            comparator: Comparator::Gte,
            value: Some(value),
            min: None,
            max: None,
            sustain_s: None,
        })
    }

    #[test]
    fn pass_routes_nominal() {
        let engine = ValidationEngine::new();
        let step = step(1, threshold_gte("power.currentCharge_percent", 80.0));
        let result = engine.evaluate_step(&step, &charged_session());
        assert!(result.passed);
        assert_eq!(result.path, StepPath::Nominal);
        assert_eq!(result.next_step, None); // sequential advance
    }

    #[test]
    fn pass_follows_nominal_branch() {
        let engine = ValidationEngine::new();
        let mut step = step(1, threshold_gte("power.currentCharge_percent", 80.0));
        step.nominal_branch = Some(7);
        let result = engine.evaluate_step(&step, &charged_session());
        assert_eq!(result.path, StepPath::Nominal);
        assert_eq!(result.next_step, Some(7));
    }

    #[test]
    fn fail_without_recovery_is_terminal() {
        let engine = ValidationEngine::new();
        let step = step(1, threshold_gte("power.currentCharge_percent", 99.0));
        let result = engine.evaluate_step(&step, &charged_session());
        assert!(!result.passed);
        assert_eq!(result.path, StepPath::Failed);
        assert_eq!(result.next_step, None);
        assert!(!result.message.is_empty());
    }

    #[test]
    fn fail_with_recovery_routes_to_branch() {
        let engine = ValidationEngine::new();
        let mut step = step(1, threshold_gte("power.currentCharge_percent", 99.0));
        step.recovery_branch = Some(5);
        let result = engine.evaluate_step(&step, &charged_session());
        assert!(!result.passed);
        assert_eq!(result.path, StepPath::Recovery);
        assert_eq!(result.next_step, Some(5));
        assert!(result.message.contains("recovery step 5"));
    }

    #[test]
    fn unknown_kind_fails_closed_with_explanation() {
        let engine = ValidationEngine::new();
        let step = step(1, ConditionKind::Unknown);
        let result = engine.evaluate_step(&step, &charged_session());
        assert!(!result.passed);
        assert_eq!(result.path, StepPath::Failed);
        assert!(!result.checks.is_empty());
        assert!(result.checks[0].message.contains("not recognize"));
    }

    #[test]
    fn malformed_config_becomes_failed_verdict() {
        let engine = ValidationEngine::new();
        let step = step(
            1,
            ConditionKind::CommandSequence(CommandSequenceConfig {
                commands: vec![],
                strict_order: true,
                all_must_succeed: false,
            }),
        );
        let result = engine.evaluate_step(&step, &charged_session());
        assert!(!result.passed);
        assert_eq!(result.path, StepPath::Failed);
        assert!(result.message.contains("no commands"));
    }

    #[test]
    fn ping_with_error_status_fails_must_succeed() {
        let engine = ValidationEngine::new();
        let mut session = charged_session();
        session.record_command(CommandRecord::new("PING", CommandStatus::Error, 3.0));
        let step = step(
            1,
            ConditionKind::CommandExecuted(CommandExecutedConfig {
                command: "PING".to_string(),
                parameters: None,
                must_succeed: true,
            }),
        );
        let result = engine.evaluate_step(&step, &session);
        assert!(!result.passed);
    }

    #[test]
    fn beacon_count_met_passes_nominal() {
        let engine = ValidationEngine::new();
        let step = step(
            2,
            ConditionKind::BeaconReceived(BeaconReceivedConfig {
                required: 2,
                after_command: None,
            }),
        );
        let result = engine.evaluate_step(&step, &charged_session());
        assert!(result.passed);
        assert_eq!(result.path, StepPath::Nominal);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let engine = ValidationEngine::new();
        let step = step(1, threshold_gte("power.currentCharge_percent", 80.0));
        let session = charged_session();
        let a = engine.evaluate_step(&step, &session);
        let b = engine.evaluate_step(&step, &session);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
