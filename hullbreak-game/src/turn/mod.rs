//! Turn and phase state machine.
//!
//! The run cycles EVENT → PLAYER_ACTION → ECO_ATTACK → MAINTENANCE and back;
//! the turn counter increments once per full cycle, during maintenance. Once
//! the game-over flag is set the machine absorbs: no further transitions.

mod scheduler;

pub use scheduler::{Continuation, Scheduler};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CommandError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Event,
    PlayerAction,
    EcoAttack,
    Maintenance,
}

impl Phase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::PlayerAction => "player_action",
            Self::EcoAttack => "eco_attack",
            Self::Maintenance => "maintenance",
        }
    }

    /// Successor in the fixed cycle.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Event => Self::PlayerAction,
            Self::PlayerAction => Self::EcoAttack,
            Self::EcoAttack => Self::Maintenance,
            Self::Maintenance => Self::Event,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a player command. Rejections carry their reason and are logged;
/// they never escape as panics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Accepted,
    Rejected(CommandError),
}

impl CommandOutcome {
    #[must_use]
    pub const fn accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Pure legality gate shared by every player command: the run must be live
/// and the phase must match.
pub(crate) const fn gate_phase(
    game_over: bool,
    current: Phase,
    required: Phase,
) -> Result<(), CommandError> {
    if game_over {
        return Err(CommandError::GameOver);
    }
    if current as u8 != required as u8 {
        return Err(CommandError::WrongPhase {
            expected: required,
            actual: current,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_is_closed_and_ordered() {
        assert_eq!(Phase::Event.next(), Phase::PlayerAction);
        assert_eq!(Phase::PlayerAction.next(), Phase::EcoAttack);
        assert_eq!(Phase::EcoAttack.next(), Phase::Maintenance);
        assert_eq!(Phase::Maintenance.next(), Phase::Event);
    }

    #[test]
    fn gate_rejects_wrong_phase_and_ended_runs() {
        assert!(gate_phase(false, Phase::PlayerAction, Phase::PlayerAction).is_ok());
        assert_eq!(
            gate_phase(false, Phase::Event, Phase::PlayerAction),
            Err(CommandError::WrongPhase {
                expected: Phase::PlayerAction,
                actual: Phase::Event,
            })
        );
        assert_eq!(
            gate_phase(true, Phase::PlayerAction, Phase::PlayerAction),
            Err(CommandError::GameOver)
        );
    }
}
