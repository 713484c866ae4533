//! Enumeration types shared across the simulation.

use serde::{Deserialize, Serialize};

/// Visibility classification of an [`Event`](crate::Event).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventScope {
    /// Perceived by every registered observer regardless of location.
    Global,
    /// Perceived by observers positioned at the event's location.
    Local,
    /// The narrated result of an entity's action; visible like [`Self::Local`].
    ActionOutcome,
    /// An engine-side failure while resolving an action. Logged, never dispatched.
    SystemError,
}

impl EventScope {
    /// Whether events of this scope are delivered by location.
    pub const fn is_located(self) -> bool {
        matches!(self, Self::Local | Self::ActionOutcome)
    }

    /// The wire name of this scope.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Local => "local",
            Self::ActionOutcome => "action_outcome",
            Self::SystemError => "system_error",
        }
    }
}

impl core::fmt::Display for EventScope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The category of a resolved action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    /// Travel to an adjacent location or approach an item.
    Move,
    /// Address another entity.
    Speak,
    /// Change the state of an item.
    Interact,
    /// Look around.
    Observe,
    /// Let time pass.
    Wait,
    /// The intent could not be carried out.
    Fail,
    /// The intent could not be classified.
    Unknown,
}

impl ActionType {
    /// Parse the upper-case keyword used in interpreter responses.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.trim().to_ascii_uppercase().as_str() {
            "MOVE" => Some(Self::Move),
            "SPEAK" => Some(Self::Speak),
            "INTERACT" => Some(Self::Interact),
            "OBSERVE" => Some(Self::Observe),
            "WAIT" => Some(Self::Wait),
            "FAIL" => Some(Self::Fail),
            "UNKNOWN" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// The upper-case keyword for this action type.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Move => "MOVE",
            Self::Speak => "SPEAK",
            Self::Interact => "INTERACT",
            Self::Observe => "OBSERVE",
            Self::Wait => "WAIT",
            Self::Fail => "FAIL",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl core::fmt::Display for ActionType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.keyword())
    }
}
