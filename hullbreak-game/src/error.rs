//! Error taxonomy for the command and configuration surfaces.
//!
//! Commands never panic past the API boundary; rejections are surfaced as
//! values and mirrored into the log feed.

use thiserror::Error;

use crate::card::CardId;
use crate::turn::Phase;

/// Why a player command was rejected. Non-fatal by construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("command requires phase {expected}, current phase is {actual}")]
    WrongPhase { expected: Phase, actual: Phase },
    #[error("not enough action points: need {needed}, have {available}")]
    InsufficientAp { needed: i32, available: i32 },
    #[error("card {0:?} is not in hand")]
    CardNotInHand(CardId),
    #[error("suit is blocked this turn")]
    SuitBlocked,
    #[error("command requires a different suit")]
    WrongSuit,
    #[error("hand is already at its limit")]
    HandFull,
    #[error("unknown node {0}")]
    UnknownNode(String),
    #[error("run already ended")]
    GameOver,
}

/// Configuration lookup and validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown scenario {0}")]
    UnknownScenario(String),
    #[error("unknown chapter {0}")]
    UnknownChapter(String),
    #[error("chapter {0} is locked")]
    ChapterLocked(String),
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
}
