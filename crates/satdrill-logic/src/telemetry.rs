//! Telemetry snapshot — nested key/value state with dotted-path lookup.
//!
//! The simulator (out of scope here) writes satellite state into a nested
//! JSON object; step conditions address values by dotted path strings such
//! as `power.currentCharge_percent`. Lookup stays dynamic at evaluation
//! time, but the set of paths a step may legally reference is an explicit
//! per-subsystem table so that bad paths are caught when content is
//! authored, not when a trainee hits the step.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Well-known paths referenced directly by evaluators.
pub mod paths {
    pub const BEACON_COUNT: &str = "communications.beaconCount";
    pub const DATA_DOWNLINKED_MB: &str = "communications.dataDownlinked_mb";
    pub const SEMI_MAJOR_AXIS_KM: &str = "orbit.semiMajorAxis_km";
    pub const ECCENTRICITY: &str = "orbit.eccentricity";
    pub const ALTITUDE_KM: &str = "orbit.altitude_km";
    pub const FUEL_REMAINING_KG: &str = "propulsion.fuelRemaining_kg";
}

/// Telemetry fields each subsystem exposes. Step authoring validates
/// condition paths against this table.
pub const SUBSYSTEM_FIELDS: [(&str, &[&str]); 7] = [
    (
        "power",
        &[
            "currentCharge_percent",
            "batteryTemp_c",
            "solarOutput_w",
            "busVoltage_v",
        ],
    ),
    (
        "orbit",
        &[
            "altitude_km",
            "semiMajorAxis_km",
            "eccentricity",
            "inclination_deg",
            "period_min",
        ],
    ),
    (
        "communications",
        &[
            "beaconCount",
            "dataDownlinked_mb",
            "signalStrength_db",
            "linkActive",
        ],
    ),
    (
        "propulsion",
        &["fuelRemaining_kg", "fuelRemaining_percent", "thrusterTemp_c"],
    ),
    (
        "attitude",
        &["pitch_deg", "roll_deg", "yaw_deg", "pointingError_deg"],
    ),
    ("thermal", &["busTemp_c", "payloadTemp_c", "radiatorState"]),
    ("payload", &["cameraActive", "imagesStored", "mode"]),
];

/// Whether a dotted path names a field in the authoring schema.
pub fn is_known_path(path: &str) -> bool {
    let mut parts = path.splitn(2, '.');
    let (Some(subsystem), Some(field)) = (parts.next(), parts.next()) else {
        return false;
    };
    SUBSYSTEM_FIELDS
        .iter()
        .any(|(sub, fields)| *sub == subsystem && fields.contains(&field))
}

/// Why a telemetry lookup failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// No value at the given path in the current snapshot.
    Missing,
    /// A value exists but is not a number.
    NotNumeric,
}

/// Current satellite state as a nested key/value mapping.
///
/// The snapshot is read-only during evaluation; the simulator replaces or
/// mutates it between ticks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetrySnapshot(pub Value);

impl TelemetrySnapshot {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Resolve a dotted path to the raw value, if present.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut current = &self.0;
        for part in path.split('.') {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Resolve a dotted path to a number, distinguishing absence from
    /// non-numeric values.
    pub fn number(&self, path: &str) -> Result<f64, LookupError> {
        match self.lookup(path) {
            None => Err(LookupError::Missing),
            Some(v) => v.as_f64().ok_or(LookupError::NotNumeric),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> TelemetrySnapshot {
        TelemetrySnapshot::new(json!({
            "power": { "currentCharge_percent": 72.5, "solarOutput_w": 430.0 },
            "orbit": { "altitude_km": 550.0, "eccentricity": 0.001 },
            "communications": { "beaconCount": 3, "linkActive": true },
        }))
    }

    #[test]
    fn lookup_nested_value() {
        let snap = snapshot();
        assert_eq!(
            snap.number("power.currentCharge_percent").unwrap(),
            72.5
        );
        assert_eq!(snap.number("communications.beaconCount").unwrap(), 3.0);
    }

    #[test]
    fn lookup_missing_path() {
        let snap = snapshot();
        assert_eq!(
            snap.number("power.nonexistent"),
            Err(LookupError::Missing)
        );
        assert_eq!(snap.number("nosuch.path"), Err(LookupError::Missing));
    }

    #[test]
    fn lookup_non_numeric() {
        let snap = snapshot();
        assert_eq!(
            snap.number("communications.linkActive"),
            Err(LookupError::NotNumeric)
        );
    }

    #[test]
    fn raw_lookup_for_status_fields() {
        let snap = snapshot();
        assert_eq!(
            snap.lookup("communications.linkActive"),
            Some(&Value::Bool(true))
        );
        assert!(snap.lookup("communications.absent").is_none());
    }

    #[test]
    fn known_path_table() {
        assert!(is_known_path("power.currentCharge_percent"));
        assert!(is_known_path("orbit.semiMajorAxis_km"));
        assert!(is_known_path("communications.beaconCount"));
        assert!(!is_known_path("power.flux_capacitor"));
        assert!(!is_known_path("warp.coreTemp_c"));
        assert!(!is_known_path("power")); // missing field part
    }

    #[test]
    fn well_known_paths_are_in_schema() {
        for path in [
            paths::BEACON_COUNT,
            paths::DATA_DOWNLINKED_MB,
            paths::SEMI_MAJOR_AXIS_KM,
            paths::ECCENTRICITY,
            paths::ALTITUDE_KM,
            paths::FUEL_REMAINING_KG,
        ] {
            assert!(is_known_path(path), "{path} missing from schema");
        }
    }
}
