//! Achievement ids and detection predicates.
//!
//! Predicates are pure; the tracker re-runs [`detect`] after every recorded
//! event and merges the result into the session's unlocked set, so each
//! achievement fires at most once no matter how often its condition is
//! re-satisfied.

use serde::{Deserialize, Serialize};

/// Unlockable operator achievements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    PerfectCommander,
    SpeedRunner,
    ResourceMaster,
    QuickResponder,
    CommandEfficiency,
}

impl AchievementId {
    pub const ALL: [AchievementId; 5] = [
        AchievementId::PerfectCommander,
        AchievementId::SpeedRunner,
        AchievementId::ResourceMaster,
        AchievementId::QuickResponder,
        AchievementId::CommandEfficiency,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::PerfectCommander => "Perfect Commander",
            Self::SpeedRunner => "Speed Runner",
            Self::ResourceMaster => "Resource Master",
            Self::QuickResponder => "Quick Responder",
            Self::CommandEfficiency => "Command Efficiency",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::PerfectCommander => "Issue at least 10 commands with zero errors",
            Self::SpeedRunner => "Complete every step in under 15 minutes",
            Self::ResourceMaster => "Keep both power and fuel efficiency above 90%",
            Self::QuickResponder => "Average under 10s response over 5+ prompts",
            Self::CommandEfficiency => "Over 95% of issued commands correct",
        }
    }
}

/// Metrics view the predicates need.
#[derive(Debug, Clone, Copy)]
pub struct AchievementInputs {
    pub error_count: u32,
    pub total_commands: u32,
    pub correct_commands: u32,
    pub completed_steps: u32,
    pub total_steps: u32,
    pub session_elapsed_s: f64,
    pub power_efficiency: f64,
    pub fuel_efficiency: f64,
    pub average_response_s: Option<f64>,
    pub response_samples: usize,
}

/// All achievements whose condition currently holds.
pub fn detect(inputs: &AchievementInputs) -> Vec<AchievementId> {
    let mut unlocked = Vec::new();

    if inputs.error_count == 0 && inputs.total_commands >= 10 {
        unlocked.push(AchievementId::PerfectCommander);
    }

    let fully_complete =
        inputs.total_steps > 0 && inputs.completed_steps == inputs.total_steps;
    if fully_complete && inputs.session_elapsed_s < 900.0 {
        unlocked.push(AchievementId::SpeedRunner);
    }

    if inputs.power_efficiency > 90.0 && inputs.fuel_efficiency > 90.0 {
        unlocked.push(AchievementId::ResourceMaster);
    }

    if inputs.response_samples >= 5 {
        if let Some(avg) = inputs.average_response_s {
            if avg < 10.0 {
                unlocked.push(AchievementId::QuickResponder);
            }
        }
    }

    if inputs.total_commands > 0
        && f64::from(inputs.correct_commands) / f64::from(inputs.total_commands) > 0.95
    {
        unlocked.push(AchievementId::CommandEfficiency);
    }

    unlocked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_session() -> AchievementInputs {
        AchievementInputs {
            error_count: 0,
            total_commands: 0,
            correct_commands: 0,
            completed_steps: 0,
            total_steps: 6,
            session_elapsed_s: 0.0,
            power_efficiency: 100.0,
            fuel_efficiency: 100.0,
            average_response_s: None,
            response_samples: 0,
        }
    }

    #[test]
    fn fresh_session_unlocks_resource_master_only() {
        // Efficiencies start at 100 before any snapshot is recorded.
        let unlocked = detect(&quiet_session());
        assert_eq!(unlocked, vec![AchievementId::ResourceMaster]);
    }

    #[test]
    fn perfect_commander_needs_ten_commands() {
        let mut inputs = quiet_session();
        inputs.total_commands = 9;
        inputs.correct_commands = 9;
        assert!(!detect(&inputs).contains(&AchievementId::PerfectCommander));
        inputs.total_commands = 10;
        inputs.correct_commands = 10;
        assert!(detect(&inputs).contains(&AchievementId::PerfectCommander));
    }

    #[test]
    fn perfect_commander_blocked_by_errors() {
        let mut inputs = quiet_session();
        inputs.total_commands = 20;
        inputs.correct_commands = 20;
        inputs.error_count = 1;
        assert!(!detect(&inputs).contains(&AchievementId::PerfectCommander));
    }

    #[test]
    fn speed_runner_requires_full_completion() {
        let mut inputs = quiet_session();
        inputs.completed_steps = 5;
        inputs.session_elapsed_s = 600.0;
        assert!(!detect(&inputs).contains(&AchievementId::SpeedRunner));
        inputs.completed_steps = 6;
        assert!(detect(&inputs).contains(&AchievementId::SpeedRunner));
        inputs.session_elapsed_s = 900.0;
        assert!(!detect(&inputs).contains(&AchievementId::SpeedRunner));
    }

    #[test]
    fn quick_responder_needs_sample_floor() {
        let mut inputs = quiet_session();
        inputs.average_response_s = Some(7.0);
        inputs.response_samples = 4;
        assert!(!detect(&inputs).contains(&AchievementId::QuickResponder));
        inputs.response_samples = 5;
        assert!(detect(&inputs).contains(&AchievementId::QuickResponder));
    }

    #[test]
    fn command_efficiency_strictly_above_95() {
        let mut inputs = quiet_session();
        inputs.total_commands = 20;
        inputs.correct_commands = 19; // exactly 95%
        assert!(!detect(&inputs).contains(&AchievementId::CommandEfficiency));
        inputs.total_commands = 21;
        inputs.correct_commands = 21;
        assert!(detect(&inputs).contains(&AchievementId::CommandEfficiency));
    }

    #[test]
    fn resource_master_needs_both() {
        let mut inputs = quiet_session();
        inputs.power_efficiency = 95.0;
        inputs.fuel_efficiency = 90.0; // not strictly above
        assert!(!detect(&inputs).contains(&AchievementId::ResourceMaster));
        inputs.fuel_efficiency = 90.1;
        assert!(detect(&inputs).contains(&AchievementId::ResourceMaster));
    }

    #[test]
    fn titles_and_descriptions_nonempty() {
        for id in AchievementId::ALL {
            assert!(!id.title().is_empty());
            assert!(!id.description().is_empty());
        }
    }
}
