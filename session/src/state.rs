//! Session lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one monitored call.
///
/// ```text
/// Idle --first chunk--> Active --close--> Closing --drained--> Closed
///   \________________close________________/
/// ```
///
/// There is no way back from `Closed`; a reconnect opens a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Active,
    Closing,
    Closed,
}

impl SessionState {
    /// Returns true if the transition `self -> to` is allowed.
    pub fn can_transition(&self, to: SessionState) -> bool {
        matches!(
            (self, to),
            (SessionState::Idle, SessionState::Active)
                | (SessionState::Idle, SessionState::Closing)
                | (SessionState::Active, SessionState::Closing)
                | (SessionState::Closing, SessionState::Closed)
        )
    }

    /// Returns true while the session accepts audio.
    pub fn is_open(&self) -> bool {
        matches!(self, SessionState::Idle | SessionState::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Active => "active",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
        }
    }

    /// Parses a state. Unknown strings map to `Idle`.
    pub fn from_str(s: &str) -> Self {
        match s {
            "active" => SessionState::Active,
            "closing" => SessionState::Closing,
            "closed" => SessionState::Closed,
            _ => SessionState::Idle,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for SessionState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SessionState {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(SessionState::from_str(&s))
    }
}
