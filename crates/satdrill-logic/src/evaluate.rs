//! Condition evaluators — one pure function per condition kind.
//!
//! Every evaluator takes its config and a read-only [`EvalContext`] view of
//! the session and returns the checks for its declared criteria. A step
//! passes only if every check passes; aggregation and step-graph routing
//! live in the engine crate.
//!
//! Missing or non-numeric telemetry is a *failing check*, not an error:
//! the trainee sees what was expected and what the snapshot held. Errors
//! are reserved for malformed configs (missing bounds, empty command
//! lists), which the engine normalizes into failed verdicts.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::check::{fmt_for_path, fmt_quantity, CheckResult};
use crate::command::{
    find_execution, flexible_matches, strict_sequence_cursor, CommandRecord,
};
use crate::condition::{
    BeaconReceivedConfig, CommandExecutedConfig, CommandSequenceConfig, Comparator,
    ConditionKind, ManualConfirmationConfig, MissionCompletionConfig, OrbitalManeuverConfig,
    SubsystemStatusConfig, ThresholdConfig, TimeElapsedConfig,
};
use crate::orbital;
use crate::telemetry::{paths, LookupError, TelemetrySnapshot};

/// Read-only view of session state handed to every evaluator.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub telemetry: &'a TelemetrySnapshot,
    pub history: &'a [CommandRecord],
    pub step_elapsed_s: f64,
    pub step_confirmed: bool,
    /// Latest overall score the host wrote back, if any.
    pub current_score: Option<f64>,
    pub completed_steps: &'a HashSet<u32>,
    /// Beacon count captured when each gated command executed.
    pub beacon_baselines: &'a HashMap<String, f64>,
}

/// A condition config that cannot be evaluated as declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// `between` without both bounds, or a single-sided comparator
    /// without a value.
    MissingBound(&'static str),
    /// A sequence condition with no commands listed.
    EmptyCommandList,
    /// A mission-completion or maneuver condition declaring no criteria.
    NoCriteria(&'static str),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingBound(what) => write!(f, "malformed threshold config: {what}"),
            Self::EmptyCommandList => write!(f, "command sequence declares no commands"),
            Self::NoCriteria(kind) => write!(f, "{kind} condition declares no criteria"),
        }
    }
}

/// Dispatch a condition to its evaluator. The single `match` here is the
/// only place kinds are enumerated; adding a kind means adding a variant,
/// an evaluator, and one arm.
pub fn evaluate_condition(
    condition: &ConditionKind,
    ctx: &EvalContext<'_>,
) -> Result<Vec<CheckResult>, EvalError> {
    match condition {
        ConditionKind::TelemetryThreshold(cfg) => evaluate_threshold(cfg, ctx),
        ConditionKind::CommandExecuted(cfg) => Ok(evaluate_command_executed(cfg, ctx)),
        ConditionKind::CommandSequence(cfg) => evaluate_command_sequence(cfg, ctx),
        ConditionKind::SubsystemStatus(cfg) => Ok(evaluate_subsystem_status(cfg, ctx)),
        ConditionKind::TimeElapsed(cfg) => Ok(evaluate_time_elapsed(cfg, ctx)),
        ConditionKind::BeaconReceived(cfg) => Ok(evaluate_beacon_received(cfg, ctx)),
        ConditionKind::ManualConfirmation(cfg) => Ok(evaluate_manual_confirmation(cfg, ctx)),
        ConditionKind::OrbitalManeuver(cfg) => evaluate_orbital_maneuver(cfg, ctx),
        ConditionKind::MissionCompletion(cfg) => evaluate_mission_completion(cfg, ctx),
        ConditionKind::Unknown => Ok(vec![CheckResult::fail(
            "condition",
            "unrecognized kind",
            "a condition kind supported by this engine",
            "step declares a condition kind this engine version does not recognize",
        )]),
    }
}

/// Failing check for telemetry that could not be read.
fn lookup_failure(path: &str, err: LookupError) -> CheckResult {
    match err {
        LookupError::Missing => CheckResult::fail(
            path,
            "absent",
            "a value in the telemetry snapshot",
            format!("telemetry path '{path}' is not present in the current snapshot"),
        ),
        LookupError::NotNumeric => CheckResult::fail(
            path,
            "non-numeric",
            "a numeric value",
            format!("telemetry path '{path}' holds a non-numeric value"),
        ),
    }
}

fn evaluate_threshold(
    cfg: &ThresholdConfig,
    ctx: &EvalContext<'_>,
) -> Result<Vec<CheckResult>, EvalError> {
    let mut checks = Vec::new();

    match ctx.telemetry.number(&cfg.path) {
        Err(err) => checks.push(lookup_failure(&cfg.path, err)),
        Ok(value) => {
            let actual = fmt_for_path(&cfg.path, value);
            let check = match cfg.comparator {
                Comparator::Between => {
                    let (Some(min), Some(max)) = (cfg.min, cfg.max) else {
                        return Err(EvalError::MissingBound("between requires min and max"));
                    };
                    let passed = value >= min && value <= max;
                    let target = format!(
                        "between {} and {}",
                        fmt_for_path(&cfg.path, min),
                        fmt_for_path(&cfg.path, max)
                    );
                    let message = format!(
                        "{} = {actual}, required {target} (inclusive)",
                        cfg.path
                    );
                    CheckResult {
                        name: cfg.path.clone(),
                        passed,
                        actual,
                        target,
                        message,
                        progress: None,
                    }
                }
                cmp => {
                    let Some(bound) = cfg.value else {
                        return Err(EvalError::MissingBound("comparator requires a value"));
                    };
                    let passed = match cmp {
                        Comparator::Gt => value > bound,
                        Comparator::Lt => value < bound,
                        Comparator::Gte => value >= bound,
                        Comparator::Lte => value <= bound,
                        Comparator::Eq => value == bound,
                        Comparator::Neq => value != bound,
                        Comparator::Between => unreachable!("handled above"),
                    };
                    let target = format!("{} {}", cmp.symbol(), fmt_for_path(&cfg.path, bound));
                    let message = format!("{} = {actual}, required {target}", cfg.path);
                    CheckResult {
                        name: cfg.path.clone(),
                        passed,
                        actual,
                        target,
                        message,
                        progress: None,
                    }
                }
            };
            checks.push(check);
        }
    }

    // Sustain durations are declared in content but not yet evaluated;
    // surface the gap in every verdict instead of silently ignoring it.
    if let Some(sustain) = cfg.sustain_s {
        checks.push(CheckResult::pass(
            "sustain",
            "not evaluated",
            format!("hold for {}s", fmt_quantity(sustain)),
            format!(
                "sustain check not implemented (declared {}s)",
                fmt_quantity(sustain)
            ),
        ));
    }

    Ok(checks)
}

fn evaluate_command_executed(
    cfg: &CommandExecutedConfig,
    ctx: &EvalContext<'_>,
) -> Vec<CheckResult> {
    let target = if cfg.must_succeed {
        format!("'{}' executed successfully", cfg.command)
    } else {
        format!("'{}' executed", cfg.command)
    };

    let check = match find_execution(ctx.history, &cfg.command, cfg.parameters.as_ref()) {
        None => CheckResult::fail(
            cfg.command.clone(),
            "not executed",
            target.clone(),
            format!("command '{}' has not been issued", cfg.command),
        ),
        Some(record) if cfg.must_succeed && !record.succeeded() => CheckResult::fail(
            cfg.command.clone(),
            format!("executed with status {:?}", record.status),
            target.clone(),
            format!(
                "command '{}' was issued but did not succeed (status {:?})",
                cfg.command, record.status
            ),
        ),
        Some(record) => CheckResult::pass(
            cfg.command.clone(),
            format!("executed at t={}s", fmt_quantity(record.issued_at_s)),
            target.clone(),
            format!(
                "command '{}' executed at t={}s",
                cfg.command,
                fmt_quantity(record.issued_at_s)
            ),
        ),
    };
    vec![check]
}

fn evaluate_command_sequence(
    cfg: &CommandSequenceConfig,
    ctx: &EvalContext<'_>,
) -> Result<Vec<CheckResult>, EvalError> {
    if cfg.commands.is_empty() {
        return Err(EvalError::EmptyCommandList);
    }
    let total = cfg.commands.len();

    let check = if cfg.strict_order {
        let cursor = strict_sequence_cursor(ctx.history, &cfg.commands, cfg.all_must_succeed);
        let passed = cursor == total;
        let message = if passed {
            format!("all {total} commands observed in order")
        } else {
            format!(
                "sequence stalled waiting for '{}' ({cursor}/{total} matched)",
                cfg.commands[cursor]
            )
        };
        CheckResult {
            name: "sequence".to_string(),
            passed,
            actual: format!("{cursor}/{total} in order"),
            target: format!("{total} commands in declared order"),
            message,
            progress: None,
        }
        .with_progress(cursor as f64 / total as f64 * 100.0)
    } else {
        let (missing, latest) =
            flexible_matches(ctx.history, &cfg.commands, cfg.all_must_succeed);
        let matched = total - missing.len();
        let passed = missing.is_empty();
        let message = match (passed, latest) {
            (true, Some(t)) => format!(
                "all {total} commands observed, completed at t={}s",
                fmt_quantity(t)
            ),
            (true, None) => format!("all {total} commands observed"),
            (false, _) => format!("still missing: {}", missing.join(", ")),
        };
        CheckResult {
            name: "sequence".to_string(),
            passed,
            actual: format!("{matched}/{total} observed"),
            target: format!("{total} commands in any order"),
            message,
            progress: None,
        }
        .with_progress(matched as f64 / total as f64 * 100.0)
    };

    Ok(vec![check])
}

fn evaluate_subsystem_status(
    cfg: &SubsystemStatusConfig,
    ctx: &EvalContext<'_>,
) -> Vec<CheckResult> {
    let path = format!("{}.{}", cfg.subsystem, cfg.field);
    let expected = cfg.expected.to_string();

    let check = match ctx.telemetry.lookup(&path) {
        None => CheckResult::fail(
            path.clone(),
            "absent",
            expected.clone(),
            format!("telemetry path '{path}' is not present in the current snapshot"),
        ),
        Some(value) => {
            let passed = *value == cfg.expected;
            let actual = value.to_string();
            let message = format!("{path} = {actual}, required {expected}");
            CheckResult {
                name: path.clone(),
                passed,
                actual,
                target: expected,
                message,
                progress: None,
            }
        }
    };
    vec![check]
}

fn evaluate_time_elapsed(cfg: &TimeElapsedConfig, ctx: &EvalContext<'_>) -> Vec<CheckResult> {
    let passed = ctx.step_elapsed_s >= cfg.required_s;
    let progress = if cfg.required_s > 0.0 {
        ctx.step_elapsed_s / cfg.required_s * 100.0
    } else {
        100.0
    };
    vec![CheckResult {
        name: "elapsed".to_string(),
        passed,
        actual: format!("{}s", fmt_quantity(ctx.step_elapsed_s)),
        target: format!(">= {}s", fmt_quantity(cfg.required_s)),
        message: format!(
            "{}s elapsed on step, {}s required",
            fmt_quantity(ctx.step_elapsed_s),
            fmt_quantity(cfg.required_s)
        ),
        progress: None,
    }
    .with_progress(progress)]
}

fn evaluate_beacon_received(
    cfg: &BeaconReceivedConfig,
    ctx: &EvalContext<'_>,
) -> Vec<CheckResult> {
    let required = f64::from(cfg.required);

    let count = match ctx.telemetry.number(paths::BEACON_COUNT) {
        Ok(v) => v,
        Err(err) => return vec![lookup_failure(paths::BEACON_COUNT, err)],
    };

    let Some(gate) = &cfg.after_command else {
        let passed = count >= required;
        return vec![CheckResult {
            name: "beacons".to_string(),
            passed,
            actual: format!("{count:.0}"),
            target: format!(">= {}", cfg.required),
            message: format!("{count:.0} beacons received, {} required", cfg.required),
            progress: None,
        }
        .with_progress(if required > 0.0 {
            count / required * 100.0
        } else {
            100.0
        })];
    };

    // Gated: only beacons received after the named command count toward
    // the requirement.
    let mut checks = Vec::new();
    let executed = find_execution(ctx.history, gate, None)
        .map(|r| r.succeeded())
        .unwrap_or(false);
    if !executed {
        checks.push(CheckResult::fail(
            gate.clone(),
            "not executed",
            format!("'{gate}' executed successfully"),
            format!("beacon gate command '{gate}' has not executed successfully"),
        ));
        return checks;
    }
    checks.push(CheckResult::pass(
        gate.clone(),
        "executed",
        format!("'{gate}' executed successfully"),
        format!("beacon gate command '{gate}' executed"),
    ));

    match ctx.beacon_baselines.get(gate) {
        None => checks.push(CheckResult::fail(
            "beacons".to_string(),
            "no baseline",
            format!(">= {} after '{gate}'", cfg.required),
            format!("no beacon baseline recorded for command '{gate}'"),
        )),
        Some(baseline) => {
            let accrued = (count - baseline).max(0.0);
            let passed = accrued >= required;
            checks.push(
                CheckResult {
                    name: "beacons".to_string(),
                    passed,
                    actual: format!("{accrued:.0} since '{gate}'"),
                    target: format!(">= {} after '{gate}'", cfg.required),
                    message: format!(
                        "{accrued:.0} beacons received since '{gate}', {} required",
                        cfg.required
                    ),
                    progress: None,
                }
                .with_progress(if required > 0.0 {
                    accrued / required * 100.0
                } else {
                    100.0
                }),
            );
        }
    }
    checks
}

fn evaluate_manual_confirmation(
    cfg: &ManualConfirmationConfig,
    ctx: &EvalContext<'_>,
) -> Vec<CheckResult> {
    let mut checks = Vec::new();

    if let Some(min) = cfg.min_duration_s {
        let passed = ctx.step_elapsed_s >= min;
        checks.push(CheckResult {
            name: "min_duration".to_string(),
            passed,
            actual: format!("{}s", fmt_quantity(ctx.step_elapsed_s)),
            target: format!(">= {}s", fmt_quantity(min)),
            message: format!(
                "confirmation requires {}s on step, {}s elapsed",
                fmt_quantity(min),
                fmt_quantity(ctx.step_elapsed_s)
            ),
            progress: None,
        });
    }

    checks.push(if ctx.step_confirmed {
        CheckResult::pass(
            "confirmed",
            "acknowledged",
            "operator acknowledgement",
            "operator acknowledged the step",
        )
    } else {
        CheckResult::fail(
            "confirmed",
            "not acknowledged",
            "operator acknowledgement",
            "waiting for operator acknowledgement",
        )
    });

    if let Some(min_score) = cfg.min_score {
        match ctx.current_score {
            None => checks.push(CheckResult::fail(
                "score",
                "unavailable",
                format!(">= {}", fmt_quantity(min_score)),
                "session score unavailable",
            )),
            Some(score) => {
                let passed = score >= min_score;
                checks.push(CheckResult {
                    name: "score".to_string(),
                    passed,
                    actual: fmt_quantity(score),
                    target: format!(">= {}", fmt_quantity(min_score)),
                    message: format!(
                        "current score {}, {} required",
                        fmt_quantity(score),
                        fmt_quantity(min_score)
                    ),
                    progress: None,
                });
            }
        }
    }

    checks
}

fn evaluate_orbital_maneuver(
    cfg: &OrbitalManeuverConfig,
    ctx: &EvalContext<'_>,
) -> Result<Vec<CheckResult>, EvalError> {
    if !cfg.declares_anything() {
        return Err(EvalError::NoCriteria("orbital_maneuver"));
    }
    let mut checks = Vec::new();

    // Apsis and eccentricity bounds derive from the Keplerian elements.
    if cfg.apoapsis_km.is_some() || cfg.periapsis_km.is_some() || cfg.max_eccentricity.is_some()
    {
        let elements = (
            ctx.telemetry.number(paths::SEMI_MAJOR_AXIS_KM),
            ctx.telemetry.number(paths::ECCENTRICITY),
        );
        match elements {
            (Ok(a), Ok(e)) => {
                if let Some(range) = cfg.apoapsis_km {
                    let apo = orbital::apoapsis_km(a, e);
                    checks.push(range_check("apoapsis_km", apo, range, "km"));
                }
                if let Some(range) = cfg.periapsis_km {
                    let peri = orbital::periapsis_km(a, e);
                    checks.push(range_check("periapsis_km", peri, range, "km"));
                }
                if let Some(max_e) = cfg.max_eccentricity {
                    let passed = e <= max_e;
                    checks.push(CheckResult {
                        name: "eccentricity".to_string(),
                        passed,
                        actual: format!("{e:.4}"),
                        target: format!("<= {max_e:.4}"),
                        message: format!("eccentricity {e:.4}, at most {max_e:.4} allowed"),
                        progress: None,
                    });
                }
            }
            (a_res, e_res) => {
                if let Err(err) = a_res {
                    checks.push(lookup_failure(paths::SEMI_MAJOR_AXIS_KM, err));
                }
                if let Err(err) = e_res {
                    checks.push(lookup_failure(paths::ECCENTRICITY, err));
                }
            }
        }
    }

    if let Some(range) = cfg.altitude_km {
        match ctx.telemetry.number(paths::ALTITUDE_KM) {
            Ok(alt) => checks.push(range_check("altitude_km", alt, range, "km")),
            Err(err) => checks.push(lookup_failure(paths::ALTITUDE_KM, err)),
        }
    }

    if let Some(min_fuel) = cfg.min_fuel_kg {
        match ctx.telemetry.number(paths::FUEL_REMAINING_KG) {
            Ok(fuel) => {
                let passed = fuel >= min_fuel;
                checks.push(CheckResult {
                    name: "fuel".to_string(),
                    passed,
                    actual: format!("{} kg", fmt_quantity(fuel)),
                    target: format!(">= {} kg", fmt_quantity(min_fuel)),
                    message: format!(
                        "{} kg fuel remaining, {} kg required",
                        fmt_quantity(fuel),
                        fmt_quantity(min_fuel)
                    ),
                    progress: None,
                });
            }
            Err(err) => checks.push(lookup_failure(paths::FUEL_REMAINING_KG, err)),
        }
    }

    Ok(checks)
}

fn range_check(name: &str, value: f64, range: crate::condition::Range, unit: &str) -> CheckResult {
    let passed = range.contains(value);
    CheckResult {
        name: name.to_string(),
        passed,
        actual: format!("{} {unit}", fmt_quantity(value)),
        target: format!(
            "between {} and {} {unit}",
            fmt_quantity(range.min),
            fmt_quantity(range.max)
        ),
        message: format!(
            "{name} is {} {unit}, required between {} and {} {unit}",
            fmt_quantity(value),
            fmt_quantity(range.min),
            fmt_quantity(range.max)
        ),
        progress: None,
    }
}

fn evaluate_mission_completion(
    cfg: &MissionCompletionConfig,
    ctx: &EvalContext<'_>,
) -> Result<Vec<CheckResult>, EvalError> {
    if !cfg.declares_anything() {
        return Err(EvalError::NoCriteria("mission_completion"));
    }
    let mut checks = Vec::new();

    if let Some(min_score) = cfg.min_score {
        match ctx.current_score {
            None => checks.push(CheckResult::fail(
                "score",
                "unavailable",
                format!(">= {}", fmt_quantity(min_score)),
                "session score unavailable",
            )),
            Some(score) => {
                let passed = score >= min_score;
                checks.push(CheckResult {
                    name: "score".to_string(),
                    passed,
                    actual: fmt_quantity(score),
                    target: format!(">= {}", fmt_quantity(min_score)),
                    message: format!(
                        "overall score {}, {} required",
                        fmt_quantity(score),
                        fmt_quantity(min_score)
                    ),
                    progress: None,
                });
            }
        }
    }

    if !cfg.required_steps.is_empty() {
        let done: Vec<u32> = cfg
            .required_steps
            .iter()
            .copied()
            .filter(|s| ctx.completed_steps.contains(s))
            .collect();
        let missing: Vec<String> = cfg
            .required_steps
            .iter()
            .filter(|s| !ctx.completed_steps.contains(s))
            .map(u32::to_string)
            .collect();
        let need = cfg.required_steps.len();
        let passed = missing.is_empty();
        let message = if passed {
            format!("all {need} required steps completed")
        } else {
            format!("required steps not yet completed: {}", missing.join(", "))
        };
        checks.push(
            CheckResult {
                name: "required_steps".to_string(),
                passed,
                actual: format!("{}/{need} completed", done.len()),
                target: format!("{need} required steps"),
                message,
                progress: None,
            }
            .with_progress(done.len() as f64 / need as f64 * 100.0),
        );
    }

    if let Some(min_mb) = cfg.min_downlink_mb {
        match ctx.telemetry.number(paths::DATA_DOWNLINKED_MB) {
            Ok(mb) => {
                let passed = mb >= min_mb;
                checks.push(CheckResult {
                    name: "downlink".to_string(),
                    passed,
                    actual: format!("{} MB", fmt_quantity(mb)),
                    target: format!(">= {} MB", fmt_quantity(min_mb)),
                    message: format!(
                        "{} MB downlinked, {} MB required",
                        fmt_quantity(mb),
                        fmt_quantity(min_mb)
                    ),
                    progress: None,
                });
            }
            Err(err) => checks.push(lookup_failure(paths::DATA_DOWNLINKED_MB, err)),
        }
    }

    Ok(checks)
}
