//! Mutation instructions and resolved action outcomes.
//!
//! A [`StateUpdate`] is a single explicit mutation the World Model knows how
//! to apply. An [`Outcome`] is what the resolution coordinator produces for
//! one entity turn: a verdict, the parsed parameters, a narration, and the
//! updates to apply.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::ActionType;
use crate::ids::{EntityId, LocationId};
use crate::structs::Item;

/// A single mutation instruction applied to the World Model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateUpdate {
    /// Move an entity to a location.
    MoveAgent {
        /// The entity to move.
        entity: EntityId,
        /// Destination location.
        to: LocationId,
    },
    /// Set a free-form location property.
    SetLocationProperty {
        /// Target location.
        location: LocationId,
        /// Property key.
        key: String,
        /// New value.
        value: serde_json::Value,
    },
    /// Set an item's state, mirroring it to any linked item.
    SetItemState {
        /// Location holding the item.
        location: LocationId,
        /// Item name.
        item: String,
        /// New state.
        state: String,
    },
    /// Change the global weather.
    SetWeather {
        /// New weather condition.
        condition: String,
    },
    /// Add an item to a location unless one with the same name exists.
    AddItem {
        /// Target location.
        location: LocationId,
        /// The item to add.
        item: Item,
    },
}

impl StateUpdate {
    /// Short tag naming the variant, used in log fields.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MoveAgent { .. } => "move_agent",
            Self::SetLocationProperty { .. } => "set_location_property",
            Self::SetItemState { .. } => "set_item_state",
            Self::SetWeather { .. } => "set_weather",
            Self::AddItem { .. } => "add_item",
        }
    }
}

/// The structured result of resolving a free-form intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Whether the action was carried out.
    pub success: bool,
    /// Category of the action.
    pub action_type: ActionType,
    /// Parsed action parameters, e.g. `destination` for a move.
    pub parameters: BTreeMap<String, String>,
    /// Narration used as the event description.
    pub outcome_description: String,
    /// Mutations to apply to the World Model.
    pub updates: Vec<StateUpdate>,
}

impl Outcome {
    /// A failed outcome with no parameters and no updates.
    pub fn failure(action_type: ActionType, description: impl Into<String>) -> Self {
        Self {
            success: false,
            action_type,
            parameters: BTreeMap::new(),
            outcome_description: description.into(),
            updates: Vec::new(),
        }
    }

    /// Downgrade this outcome to a failure with a new narration.
    ///
    /// Parameters are kept for inspection; updates are dropped.
    pub fn downgrade(&mut self, description: impl Into<String>) {
        self.success = false;
        self.outcome_description = description.into();
        self.updates.clear();
    }
}
