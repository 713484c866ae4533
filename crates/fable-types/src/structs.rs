//! Core record types: items and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::EventScope;
use crate::ids::{EntityId, EventId, LocationId};

/// Reference from an item to its mirror in another location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemLink {
    /// Location holding the mirror item.
    pub location: LocationId,
    /// Name of the mirror item within that location.
    #[serde(alias = "objectKey")]
    pub object_key: String,
}

/// An item or feature contained in a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Item name, unique within its location.
    pub object: String,
    /// Free-form state, e.g. `"locked"`.
    pub state: String,
    /// Optional human description used in context summaries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional_description: Option<String>,
    /// Mirror item that must carry the same state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_to: Option<ItemLink>,
}

impl Item {
    /// Create an unlinked item.
    pub fn new(object: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            state: state.into(),
            optional_description: None,
            linked_to: None,
        }
    }

    /// Attach a human description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.optional_description = Some(description.into());
        self
    }

    /// Link this item to a mirror item elsewhere.
    #[must_use]
    pub fn linked_to(mut self, location: LocationId, object_key: impl Into<String>) -> Self {
        self.linked_to = Some(ItemLink {
            location,
            object_key: object_key.into(),
        });
        self
    }
}

/// An immutable entry in the event log.
///
/// Events are created every step and never mutated after construction,
/// only pruned from the log once the retention bound is exceeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: EventId,
    /// Narrated description of what happened.
    pub description: String,
    /// Where it happened; `None` for global events.
    pub location: Option<LocationId>,
    /// Visibility classification.
    pub scope: EventScope,
    /// Simulation step at which the event was recorded.
    pub step: u64,
    /// Entity credited with the event.
    pub triggered_by: EntityId,
    /// Wall-clock time the event was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl Event {
    /// Create an event stamped with a fresh id and the current time.
    pub fn new(
        description: impl Into<String>,
        location: Option<LocationId>,
        scope: EventScope,
        step: u64,
        triggered_by: EntityId,
    ) -> Self {
        Self {
            id: EventId::new(),
            description: description.into(),
            location,
            scope,
            step,
            triggered_by,
            recorded_at: Utc::now(),
        }
    }
}
