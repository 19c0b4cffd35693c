use std::fmt;

use serde::{Deserialize, Serialize};

/// Client-side phase of a draw. Phases only move forward, one step at a time,
/// and only after the matching remote call is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DrawPhase {
    /// Nothing confirmed yet.
    Setup,
    /// Prize and participant target confirmed locally.
    Idle,
    /// Commitment published; registrations accepted.
    Open,
    /// Participant list frozen.
    Closed,
    /// Secret revealed and winner known. Terminal.
    Revealed,
}

impl DrawPhase {
    pub fn next(self) -> Option<DrawPhase> {
        match self {
            DrawPhase::Setup => Some(DrawPhase::Idle),
            DrawPhase::Idle => Some(DrawPhase::Open),
            DrawPhase::Open => Some(DrawPhase::Closed),
            DrawPhase::Closed => Some(DrawPhase::Revealed),
            DrawPhase::Revealed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for DrawPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DrawPhase::Setup => "SETUP",
            DrawPhase::Idle => "IDLE",
            DrawPhase::Open => "OPEN",
            DrawPhase::Closed => "CLOSED",
            DrawPhase::Revealed => "REVEALED",
        };
        f.write_str(label)
    }
}
