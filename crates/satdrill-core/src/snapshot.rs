//! Checkpoint snapshots for session save/restore.
//!
//! Checkpoint steps gate when progress may be saved. The engine only
//! serializes — the host decides where snapshot bytes live and when a
//! restore happens. Uses bincode for compact binary encoding with a
//! version field checked on load.

use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use satdrill_logic::command::CommandRecord;
use satdrill_logic::telemetry::TelemetrySnapshot;

use crate::session::SessionState;
use crate::step::StepDefinition;
use crate::tracker::PerformanceMetrics;

/// Snapshot format version; increment when the layout changes.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Snapshot failure modes.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("step {0} is not a checkpoint")]
    NotCheckpoint(u32),
    #[error("snapshot version {found} does not match supported version {expected}")]
    VersionMismatch { found: u32, expected: u32 },
    #[error("snapshot encoding failed: {0}")]
    Encoding(#[from] bincode::Error),
    #[error("telemetry serialization failed: {0}")]
    Telemetry(#[from] serde_json::Error),
}

/// Whether progress may be saved at this step.
pub fn can_checkpoint(step: &StepDefinition) -> bool {
    step.is_checkpoint
}

/// Serializable capture of one session at a checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u32,
    /// The checkpoint step the session was on.
    pub step_order: u32,
    /// Telemetry as JSON text: bincode is not self-describing, so the
    /// nested snapshot cannot round-trip through it directly.
    telemetry_json: String,
    command_history: Vec<CommandRecord>,
    step_elapsed_s: f64,
    session_elapsed_s: f64,
    step_confirmed: bool,
    manual_confirmations: HashSet<u32>,
    completed_steps: HashSet<u32>,
    current_score: Option<f64>,
    beacon_baselines: HashMap<String, f64>,
    metrics: PerformanceMetrics,
}

impl SessionSnapshot {
    /// Capture session state and metrics at a checkpoint step.
    pub fn capture(
        step: &StepDefinition,
        state: &SessionState,
        metrics: &PerformanceMetrics,
    ) -> Result<Self, SnapshotError> {
        if !can_checkpoint(step) {
            return Err(SnapshotError::NotCheckpoint(step.order));
        }
        Ok(Self {
            version: SNAPSHOT_VERSION,
            step_order: step.order,
            telemetry_json: serde_json::to_string(&state.telemetry)?,
            command_history: state.command_history.clone(),
            step_elapsed_s: state.step_elapsed_s,
            session_elapsed_s: state.session_elapsed_s,
            step_confirmed: state.step_confirmed,
            manual_confirmations: state.manual_confirmations.clone(),
            completed_steps: state.completed_steps.clone(),
            current_score: state.current_score,
            beacon_baselines: state.beacon_baselines.clone(),
            metrics: metrics.clone(),
        })
    }

    /// Rebuild session state and metrics from this snapshot.
    pub fn restore(&self) -> Result<(SessionState, PerformanceMetrics), SnapshotError> {
        let telemetry: TelemetrySnapshot = serde_json::from_str(&self.telemetry_json)?;
        let state = SessionState {
            telemetry,
            command_history: self.command_history.clone(),
            step_elapsed_s: self.step_elapsed_s,
            session_elapsed_s: self.session_elapsed_s,
            step_confirmed: self.step_confirmed,
            manual_confirmations: self.manual_confirmations.clone(),
            completed_steps: self.completed_steps.clone(),
            current_score: self.current_score,
            beacon_baselines: self.beacon_baselines.clone(),
        };
        Ok((state, self.metrics.clone()))
    }

    /// Write the snapshot in binary form.
    pub fn save<W: Write>(&self, writer: W) -> Result<(), SnapshotError> {
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    /// Read a snapshot, rejecting unsupported versions.
    pub fn load<R: Read>(reader: R) -> Result<Self, SnapshotError> {
        let snapshot: Self = bincode::deserialize_from(reader)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(snapshot)
    }
}
