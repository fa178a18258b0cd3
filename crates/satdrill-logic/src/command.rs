//! Command records and history scans.
//!
//! The host appends one [`CommandRecord`] per command a trainee issues;
//! records are never reordered or mutated afterwards, so evaluators can
//! rely on insertion order for sequence checks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Result status of an executed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandStatus {
    Ok,
    Error,
    NoEffect,
}

/// One issued command, immutable once appended to the history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRecord {
    pub name: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    pub status: CommandStatus,
    /// Session-relative issue time in seconds.
    pub issued_at_s: f64,
}

impl CommandRecord {
    pub fn new(name: impl Into<String>, status: CommandStatus, issued_at_s: f64) -> Self {
        Self {
            name: name.into(),
            parameters: BTreeMap::new(),
            status,
            issued_at_s,
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn succeeded(&self) -> bool {
        self.status == CommandStatus::Ok
    }
}

/// Whether a record carries every required parameter with an equal value.
/// Extra parameters on the record are allowed.
pub fn parameters_match(record: &CommandRecord, required: &BTreeMap<String, String>) -> bool {
    required
        .iter()
        .all(|(k, v)| record.parameters.get(k) == Some(v))
}

/// Find a record matching `name` (and `parameters`, if given), preferring
/// a successful match over a failed one.
pub fn find_execution<'a>(
    history: &'a [CommandRecord],
    name: &str,
    parameters: Option<&BTreeMap<String, String>>,
) -> Option<&'a CommandRecord> {
    let matches = |r: &&CommandRecord| {
        r.name == name && parameters.map_or(true, |p| parameters_match(r, p))
    };
    history
        .iter()
        .filter(matches)
        .find(|r| r.succeeded())
        .or_else(|| history.iter().find(matches))
}

/// Scan the history once, advancing a cursor on each in-order match of
/// `names`. Returns how far the cursor got (== `names.len()` when the full
/// sequence was observed). When `only_ok` is set, only successful records
/// can match.
pub fn strict_sequence_cursor(history: &[CommandRecord], names: &[String], only_ok: bool) -> usize {
    let mut cursor = 0;
    for record in history {
        if cursor >= names.len() {
            break;
        }
        if only_ok && !record.succeeded() {
            continue;
        }
        if record.name == names[cursor] {
            cursor += 1;
        }
    }
    cursor
}

/// Order-free match: which of `names` appear anywhere in the history, and
/// the latest issue time among the matches (the flexible-mode completion
/// timestamp).
pub fn flexible_matches(
    history: &[CommandRecord],
    names: &[String],
    only_ok: bool,
) -> (Vec<String>, Option<f64>) {
    let mut missing = Vec::new();
    let mut latest: Option<f64> = None;
    for name in names {
        let found = history
            .iter()
            .filter(|r| r.name == *name && (!only_ok || r.succeeded()))
            .map(|r| r.issued_at_s)
            .fold(None, |acc: Option<f64>, t| {
                Some(acc.map_or(t, |a| a.max(t)))
            });
        match found {
            Some(t) => latest = Some(latest.map_or(t, |l| l.max(t))),
            None => missing.push(name.clone()),
        }
    }
    (missing, latest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> Vec<CommandRecord> {
        vec![
            CommandRecord::new("PING", CommandStatus::Error, 10.0),
            CommandRecord::new("DEPLOY_ANTENNA", CommandStatus::Ok, 25.0)
                .with_parameter("side", "port"),
            CommandRecord::new("PING", CommandStatus::Ok, 40.0),
            CommandRecord::new("FIRE_THRUSTER", CommandStatus::Ok, 90.0),
        ]
    }

    #[test]
    fn find_prefers_successful_record() {
        let h = history();
        let found = find_execution(&h, "PING", None).unwrap();
        assert!(found.succeeded());
        assert_eq!(found.issued_at_s, 40.0);
    }

    #[test]
    fn find_falls_back_to_failed_record() {
        let h = vec![CommandRecord::new("PING", CommandStatus::Error, 5.0)];
        let found = find_execution(&h, "PING", None).unwrap();
        assert!(!found.succeeded());
    }

    #[test]
    fn find_with_parameters() {
        let h = history();
        let mut params = BTreeMap::new();
        params.insert("side".to_string(), "port".to_string());
        assert!(find_execution(&h, "DEPLOY_ANTENNA", Some(&params)).is_some());

        params.insert("side".to_string(), "starboard".to_string());
        assert!(find_execution(&h, "DEPLOY_ANTENNA", Some(&params)).is_none());
    }

    #[test]
    fn parameters_subset_match() {
        let record = CommandRecord::new("SET_MODE", CommandStatus::Ok, 1.0)
            .with_parameter("mode", "imaging")
            .with_parameter("duration", "30");
        let mut required = BTreeMap::new();
        required.insert("mode".to_string(), "imaging".to_string());
        assert!(parameters_match(&record, &required));
    }

    #[test]
    fn strict_cursor_in_order() {
        let h = history();
        let names = vec!["PING".to_string(), "FIRE_THRUSTER".to_string()];
        assert_eq!(strict_sequence_cursor(&h, &names, true), 2);
    }

    #[test]
    fn strict_cursor_out_of_order_stalls() {
        let h = history();
        let names = vec!["FIRE_THRUSTER".to_string(), "PING".to_string()];
        // FIRE_THRUSTER is last in history, so PING can never follow it.
        assert_eq!(strict_sequence_cursor(&h, &names, true), 1);
    }

    #[test]
    fn strict_cursor_skips_failures_when_only_ok() {
        let h = history();
        let names = vec!["PING".to_string(), "DEPLOY_ANTENNA".to_string()];
        // The first PING failed; with only_ok the successful PING at t=40
        // comes after DEPLOY_ANTENNA, so the sequence stalls at 1.
        assert_eq!(strict_sequence_cursor(&h, &names, true), 1);
        // Without the success requirement the failed PING counts.
        assert_eq!(strict_sequence_cursor(&h, &names, false), 2);
    }

    #[test]
    fn flexible_reports_missing_and_latest() {
        let h = history();
        let names = vec![
            "PING".to_string(),
            "DEPLOY_ANTENNA".to_string(),
            "RETRACT_BOOM".to_string(),
        ];
        let (missing, latest) = flexible_matches(&h, &names, true);
        assert_eq!(missing, vec!["RETRACT_BOOM".to_string()]);
        assert_eq!(latest, Some(40.0));
    }

    #[test]
    fn flexible_complete_set() {
        let h = history();
        let names = vec!["PING".to_string(), "FIRE_THRUSTER".to_string()];
        let (missing, latest) = flexible_matches(&h, &names, true);
        assert!(missing.is_empty());
        assert_eq!(latest, Some(90.0));
    }
}
