//! Per-session performance tracking.
//!
//! The tracker consumes the same event stream the validation engine sees
//! (commands, response latencies, step completions, errors, resource
//! levels) and maintains one [`PerformanceMetrics`] record per session.
//! The full score breakdown is recomputed from the raw counters after
//! every event, never accumulated incrementally, so replaying the same
//! events always lands on the same numbers.
//!
//! Recording against an unknown session id is a silent no-op: the host
//! may have cleaned the session up mid-flight. Summary queries on an
//! unknown session return `None`.
//!
//! All timestamps are session-relative seconds supplied by the caller;
//! the tracker never reads a clock.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use satdrill_logic::achievements::{self, AchievementId, AchievementInputs};
use satdrill_logic::constants::CRITICAL_COMMANDS;
use satdrill_logic::scoring::{
    self, PerformanceTier, ScoreBreakdown,
};

use crate::store::{SessionId, SessionMetricsStore};

/// Severity of a recorded operator error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    Critical,
    Warning,
    Minor,
}

/// One command as judged by the caller. Correctness and redundancy are
/// the host's judgment (against the active step), not inferred here.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub name: String,
    pub correct: bool,
    pub redundant: bool,
    /// Session-relative issue time in seconds.
    pub at_s: f64,
}

/// Running metric aggregates for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    // Commands
    pub total_commands: u32,
    pub correct_commands: u32,
    pub incorrect_commands: u32,
    pub redundant_commands: u32,
    /// Commands from the safety-relevant set.
    pub critical_commands: u32,
    /// Seconds from session start to the first command, captured once.
    pub first_command_latency_s: Option<f64>,

    // Timing
    pub response_samples: Vec<f64>,
    pub average_response_s: Option<f64>,

    // Steps
    pub total_steps: u32,
    pub completed_steps: u32,
    pub failed_steps: u32,
    /// Completion duration per successful step, by order.
    pub step_durations: HashMap<u32, f64>,

    // Errors
    pub error_count: u32,
    pub errors_by_type: HashMap<String, u32>,
    pub critical_errors: u32,
    pub warning_errors: u32,
    pub minor_errors: u32,

    // Resources
    pub initial_power_pct: f64,
    pub initial_fuel_pct: f64,
    pub final_power_pct: Option<f64>,
    pub final_fuel_pct: Option<f64>,
    pub power_efficiency: f64,
    pub fuel_efficiency: f64,

    // Session clock (latest timestamp seen)
    pub session_elapsed_s: f64,
    pub completed: bool,

    // Derived
    pub breakdown: ScoreBreakdown,
    pub overall_score: f64,
    /// Assigned at session completion.
    pub tier: Option<PerformanceTier>,
    /// Unlocked achievements in unlock order; each appears once.
    pub achievements: Vec<AchievementId>,
}

impl PerformanceMetrics {
    pub fn new(total_steps: u32, initial_power_pct: f64, initial_fuel_pct: f64) -> Self {
        let mut metrics = Self {
            total_commands: 0,
            correct_commands: 0,
            incorrect_commands: 0,
            redundant_commands: 0,
            critical_commands: 0,
            first_command_latency_s: None,
            response_samples: Vec::new(),
            average_response_s: None,
            total_steps,
            completed_steps: 0,
            failed_steps: 0,
            step_durations: HashMap::new(),
            error_count: 0,
            errors_by_type: HashMap::new(),
            critical_errors: 0,
            warning_errors: 0,
            minor_errors: 0,
            initial_power_pct,
            initial_fuel_pct,
            final_power_pct: None,
            final_fuel_pct: None,
            power_efficiency: 100.0,
            fuel_efficiency: 100.0,
            session_elapsed_s: 0.0,
            completed: false,
            breakdown: ScoreBreakdown::default(),
            overall_score: 0.0,
            tier: None,
            achievements: Vec::new(),
        };
        metrics.recompute();
        metrics
    }

    /// Recompute the full breakdown from the raw counters and re-check
    /// achievements. Called after every recorded event.
    pub fn recompute(&mut self) {
        self.breakdown = ScoreBreakdown {
            command_accuracy: scoring::command_accuracy_score(
                self.total_commands,
                self.correct_commands,
                self.redundant_commands,
            ),
            response_time: scoring::response_time_score(self.average_response_s),
            resource_management: scoring::resource_management_score(
                self.power_efficiency,
                self.fuel_efficiency,
            ),
            completion_time: scoring::completion_time_score(
                self.completed_steps,
                self.total_steps,
                self.session_elapsed_s,
            ),
            error_avoidance: scoring::error_avoidance_score(
                self.critical_errors,
                self.warning_errors,
                self.minor_errors,
            ),
        };
        self.overall_score = scoring::overall_score(&self.breakdown);

        for id in achievements::detect(&self.achievement_inputs()) {
            if !self.achievements.contains(&id) {
                log::info!("achievement unlocked: {}", id.title());
                self.achievements.push(id);
            }
        }
    }

    fn achievement_inputs(&self) -> AchievementInputs {
        AchievementInputs {
            error_count: self.error_count,
            total_commands: self.total_commands,
            correct_commands: self.correct_commands,
            completed_steps: self.completed_steps,
            total_steps: self.total_steps,
            session_elapsed_s: self.session_elapsed_s,
            power_efficiency: self.power_efficiency,
            fuel_efficiency: self.fuel_efficiency,
            average_response_s: self.average_response_s,
            response_samples: self.response_samples.len(),
        }
    }
}

/// Read-only snapshot for callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub overall_score: f64,
    pub tier: PerformanceTier,
    pub duration_s: f64,
    pub commands_issued: u32,
    /// Command accuracy, formatted to one decimal.
    pub accuracy: String,
    pub steps_completed: u32,
    pub total_steps: u32,
    pub completion_ratio: f64,
    pub error_count: u32,
    pub achievement_count: usize,
    pub breakdown: ScoreBreakdown,
}

/// Maintains metrics for every live session in its store.
#[derive(Debug, Default)]
pub struct PerformanceTracker {
    store: SessionMetricsStore,
}

impl PerformanceTracker {
    /// Takes ownership of the host-provided store.
    pub fn new(store: SessionMetricsStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SessionMetricsStore {
        &self.store
    }

    pub fn into_store(self) -> SessionMetricsStore {
        self.store
    }

    pub fn initialize_session(
        &mut self,
        id: impl Into<SessionId>,
        total_steps: u32,
        initial_power_pct: f64,
        initial_fuel_pct: f64,
    ) {
        let id = id.into();
        log::info!("session {id}: metrics initialized ({total_steps} steps)");
        self.store.insert(
            id,
            PerformanceMetrics::new(total_steps, initial_power_pct, initial_fuel_pct),
        );
    }

    pub fn record_command(&mut self, id: &str, outcome: &CommandOutcome) {
        let Some(metrics) = self.store.get_mut(id) else {
            log::debug!("session {id}: command recorded after cleanup, ignoring");
            return;
        };
        metrics.total_commands += 1;
        if outcome.correct {
            metrics.correct_commands += 1;
        } else {
            metrics.incorrect_commands += 1;
        }
        if outcome.redundant {
            metrics.redundant_commands += 1;
        }
        if CRITICAL_COMMANDS.contains(&outcome.name.as_str()) {
            metrics.critical_commands += 1;
        }
        if metrics.first_command_latency_s.is_none() {
            metrics.first_command_latency_s = Some(outcome.at_s);
        }
        metrics.session_elapsed_s = metrics.session_elapsed_s.max(outcome.at_s);
        metrics.recompute();
    }

    pub fn record_response_time(&mut self, id: &str, seconds: f64) {
        let Some(metrics) = self.store.get_mut(id) else {
            return;
        };
        metrics.response_samples.push(seconds);
        // Recomputed over the full sample set, not streamed.
        let sum: f64 = metrics.response_samples.iter().sum();
        metrics.average_response_s = Some(sum / metrics.response_samples.len() as f64);
        metrics.recompute();
    }

    pub fn record_step_completion(
        &mut self,
        id: &str,
        step_order: u32,
        success: bool,
        duration_s: f64,
        at_s: f64,
    ) {
        let Some(metrics) = self.store.get_mut(id) else {
            return;
        };
        if success {
            metrics.completed_steps += 1;
            metrics.step_durations.insert(step_order, duration_s);
        } else {
            metrics.failed_steps += 1;
        }
        metrics.session_elapsed_s = metrics.session_elapsed_s.max(at_s);
        metrics.recompute();
    }

    pub fn record_error(&mut self, id: &str, error_type: &str, severity: ErrorSeverity) {
        let Some(metrics) = self.store.get_mut(id) else {
            return;
        };
        metrics.error_count += 1;
        *metrics
            .errors_by_type
            .entry(error_type.to_string())
            .or_insert(0) += 1;
        match severity {
            ErrorSeverity::Critical => metrics.critical_errors += 1,
            ErrorSeverity::Warning => metrics.warning_errors += 1,
            ErrorSeverity::Minor => metrics.minor_errors += 1,
        }
        metrics.recompute();
    }

    pub fn record_resource_snapshot(&mut self, id: &str, power_pct: f64, fuel_pct: f64) {
        let Some(metrics) = self.store.get_mut(id) else {
            return;
        };
        metrics.final_power_pct = Some(power_pct);
        metrics.final_fuel_pct = Some(fuel_pct);
        metrics.power_efficiency = efficiency(power_pct, metrics.initial_power_pct);
        metrics.fuel_efficiency = efficiency(fuel_pct, metrics.initial_fuel_pct);
        metrics.recompute();
    }

    /// Final recompute and tier assignment.
    pub fn complete_session(&mut self, id: &str, at_s: f64) {
        let Some(metrics) = self.store.get_mut(id) else {
            return;
        };
        metrics.session_elapsed_s = metrics.session_elapsed_s.max(at_s);
        metrics.completed = true;
        metrics.recompute();
        let tier = PerformanceTier::from_score(metrics.overall_score);
        metrics.tier = Some(tier);
        log::info!(
            "session {id}: completed with score {} ({})",
            metrics.overall_score,
            tier.label()
        );
    }

    pub fn cleanup_session(&mut self, id: &str) {
        if self.store.remove(id).is_some() {
            log::info!("session {id}: metrics discarded");
        }
    }

    /// Read-only metrics record, if the session is live.
    pub fn metrics(&self, id: &str) -> Option<&PerformanceMetrics> {
        self.store.get(id)
    }

    /// Caller-facing summary, `None` for unknown sessions.
    pub fn summary(&self, id: &str) -> Option<SessionSummary> {
        let metrics = self.store.get(id)?;
        let completion_ratio = if metrics.total_steps == 0 {
            0.0
        } else {
            f64::from(metrics.completed_steps) / f64::from(metrics.total_steps)
        };
        Some(SessionSummary {
            overall_score: metrics.overall_score,
            tier: metrics
                .tier
                .unwrap_or_else(|| PerformanceTier::from_score(metrics.overall_score)),
            duration_s: metrics.session_elapsed_s,
            commands_issued: metrics.total_commands,
            accuracy: format!("{:.1}", metrics.breakdown.command_accuracy),
            steps_completed: metrics.completed_steps,
            total_steps: metrics.total_steps,
            completion_ratio,
            error_count: metrics.error_count,
            achievement_count: metrics.achievements.len(),
            breakdown: metrics.breakdown,
        })
    }
}

fn efficiency(current_pct: f64, initial_pct: f64) -> f64 {
    if initial_pct <= 0.0 {
        // Nothing to conserve.
        return 100.0;
    }
    current_pct / initial_pct * 100.0
}
