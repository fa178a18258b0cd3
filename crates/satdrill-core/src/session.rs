//! Mutable per-run session state.
//!
//! One [`SessionState`] exists per active training run. External
//! collaborators write into it — the simulator replaces the telemetry
//! snapshot each tick, command execution appends history records, the UI
//! sets the confirmation flag — and the validation engine reads it
//! through an [`EvalContext`] view. The host serializes events per
//! session, so no locking happens here.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use satdrill_logic::command::CommandRecord;
use satdrill_logic::evaluate::EvalContext;
use satdrill_logic::telemetry::{paths, TelemetrySnapshot};

/// Live state of one training run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    /// Current telemetry snapshot, replaced by the simulator each tick.
    pub telemetry: TelemetrySnapshot,
    /// Append-only command history; insertion order is significant.
    pub command_history: Vec<CommandRecord>,
    /// Seconds spent on the current step.
    pub step_elapsed_s: f64,
    /// Seconds since the session started.
    pub session_elapsed_s: f64,
    /// Operator acknowledgement flag for the current step.
    pub step_confirmed: bool,
    /// Steps the operator has manually confirmed.
    pub manual_confirmations: HashSet<u32>,
    /// Steps completed so far, by order.
    pub completed_steps: HashSet<u32>,
    /// Latest overall score written back by the host after each tracker
    /// update; `None` until the first write-back.
    pub current_score: Option<f64>,
    /// Beacon count captured when each command executed, keyed by command
    /// name. Supports the after-command gate on beacon conditions.
    pub beacon_baselines: HashMap<String, f64>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command to the history, capturing the current beacon
    /// count as that command's baseline. Repeat executions move the
    /// baseline to the latest one.
    pub fn record_command(&mut self, record: CommandRecord) {
        if record.succeeded() {
            let count = self.telemetry.number(paths::BEACON_COUNT).unwrap_or(0.0);
            self.beacon_baselines.insert(record.name.clone(), count);
        }
        self.command_history.push(record);
    }

    /// Operator acknowledgement of the current step.
    pub fn confirm_step(&mut self, order: u32) {
        self.step_confirmed = true;
        self.manual_confirmations.insert(order);
    }

    /// Mark a step completed.
    pub fn complete_step(&mut self, order: u32) {
        self.completed_steps.insert(order);
    }

    /// Reset per-step state when the session moves to a new step.
    pub fn begin_step(&mut self) {
        self.step_elapsed_s = 0.0;
        self.step_confirmed = false;
    }

    /// Advance both clocks by one tick.
    pub fn advance_time(&mut self, delta_s: f64) {
        self.step_elapsed_s += delta_s;
        self.session_elapsed_s += delta_s;
    }

    /// Read-only view for the evaluators.
    pub fn eval_context(&self) -> EvalContext<'_> {
        EvalContext {
            telemetry: &self.telemetry,
            history: &self.command_history,
            step_elapsed_s: self.step_elapsed_s,
            step_confirmed: self.step_confirmed,
            current_score: self.current_score,
            completed_steps: &self.completed_steps,
            beacon_baselines: &self.beacon_baselines,
        }
    }
}
