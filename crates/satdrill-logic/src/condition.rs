//! Step completion conditions — a closed tagged union.
//!
//! Each training step declares exactly one condition kind with a
//! kind-specific config payload. Conditions are authored as JSON with a
//! `kind` tag; tags not recognized by this engine version deserialize to
//! [`ConditionKind::Unknown`], which always fails closed at evaluation
//! instead of crashing the session.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Numeric comparison operators for telemetry thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Gt,
    Lt,
    Gte,
    Lte,
    Eq,
    Neq,
    Between,
}

impl Comparator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::Eq => "==",
            Self::Neq => "!=",
            Self::Between => "between",
        }
    }
}

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }
}

/// Compare a telemetry value against a bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Dotted telemetry path, e.g. `power.currentCharge_percent`.
    pub path: String,
    pub comparator: Comparator,
    /// Bound for single-sided comparators.
    #[serde(default)]
    pub value: Option<f64>,
    /// Lower bound for `between`.
    #[serde(default)]
    pub min: Option<f64>,
    /// Upper bound for `between`.
    #[serde(default)]
    pub max: Option<f64>,
    /// Declared sustain duration. Not evaluated; surfaces as an explicit
    /// placeholder check so the gap is visible in every verdict.
    #[serde(default)]
    pub sustain_s: Option<f64>,
}

/// A named command must appear in the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandExecutedConfig {
    pub command: String,
    /// When given, every pair must be present and equal on the record.
    #[serde(default)]
    pub parameters: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub must_succeed: bool,
}

/// A set of commands must appear, in order or anywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSequenceConfig {
    pub commands: Vec<String>,
    /// Strict mode requires the names as an in-order subsequence.
    #[serde(default)]
    pub strict_order: bool,
    /// Restrict matchable records to successful ones.
    #[serde(default)]
    pub all_must_succeed: bool,
}

/// Exact equality on one subsystem field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsystemStatusConfig {
    pub subsystem: String,
    pub field: String,
    pub expected: Value,
}

/// Minimum time spent on the current step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeElapsedConfig {
    pub required_s: f64,
}

/// Minimum beacon count, optionally gated on a prior command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeaconReceivedConfig {
    pub required: u32,
    /// When set, only beacons received after this command executed count.
    #[serde(default)]
    pub after_command: Option<String>,
}

/// Operator acknowledgement, optionally gated on duration and score.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ManualConfirmationConfig {
    #[serde(default)]
    pub min_duration_s: Option<f64>,
    /// Minimum current overall performance score.
    #[serde(default)]
    pub min_score: Option<f64>,
}

/// Target orbit bounds after a maneuver. Each declared bound becomes one
/// independent check.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrbitalManeuverConfig {
    #[serde(default)]
    pub apoapsis_km: Option<Range>,
    #[serde(default)]
    pub periapsis_km: Option<Range>,
    #[serde(default)]
    pub altitude_km: Option<Range>,
    #[serde(default)]
    pub max_eccentricity: Option<f64>,
    #[serde(default)]
    pub min_fuel_kg: Option<f64>,
}

impl OrbitalManeuverConfig {
    pub fn declares_anything(&self) -> bool {
        self.apoapsis_km.is_some()
            || self.periapsis_km.is_some()
            || self.altitude_km.is_some()
            || self.max_eccentricity.is_some()
            || self.min_fuel_kg.is_some()
    }
}

/// End-of-mission aggregate criteria.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MissionCompletionConfig {
    #[serde(default)]
    pub min_score: Option<f64>,
    #[serde(default)]
    pub required_steps: Vec<u32>,
    #[serde(default)]
    pub min_downlink_mb: Option<f64>,
}

impl MissionCompletionConfig {
    pub fn declares_anything(&self) -> bool {
        self.min_score.is_some() || !self.required_steps.is_empty() || self.min_downlink_mb.is_some()
    }
}

/// The closed set of step completion conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConditionKind {
    TelemetryThreshold(ThresholdConfig),
    CommandExecuted(CommandExecutedConfig),
    CommandSequence(CommandSequenceConfig),
    SubsystemStatus(SubsystemStatusConfig),
    TimeElapsed(TimeElapsedConfig),
    BeaconReceived(BeaconReceivedConfig),
    ManualConfirmation(ManualConfirmationConfig),
    OrbitalManeuver(OrbitalManeuverConfig),
    MissionCompletion(MissionCompletionConfig),
    /// Any unrecognized `kind` tag — fails closed at evaluation.
    #[serde(other)]
    Unknown,
}

impl ConditionKind {
    /// Stable label for logging and check names.
    pub fn label(&self) -> &'static str {
        match self {
            Self::TelemetryThreshold(_) => "telemetry_threshold",
            Self::CommandExecuted(_) => "command_executed",
            Self::CommandSequence(_) => "command_sequence",
            Self::SubsystemStatus(_) => "subsystem_status",
            Self::TimeElapsed(_) => "time_elapsed",
            Self::BeaconReceived(_) => "beacon_received",
            Self::ManualConfirmation(_) => "manual_confirmation",
            Self::OrbitalManeuver(_) => "orbital_maneuver",
            Self::MissionCompletion(_) => "mission_completion",
            Self::Unknown => "unknown",
        }
    }
}
