//! Location node with exits, properties, and contained items.
//!
//! A [`LocationState`] is built once from its [`LocationDef`] and then only
//! mutated through World Model operations. Item names are unique within a
//! location; lookups are by exact name.

use std::collections::{BTreeMap, BTreeSet};

use fable_types::{Item, LocationId};
use tracing::warn;

use crate::config::{LocationDef, PLACEHOLDER_DESCRIPTION};

/// Runtime state of one node in the world graph.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationState {
    /// The location's id.
    pub id: LocationId,
    /// Human description.
    pub description: String,
    /// Locations reachable from here.
    pub exits: BTreeSet<LocationId>,
    /// Free-form properties other than items.
    pub properties: BTreeMap<String, serde_json::Value>,
    /// Contained items, in display order.
    pub contains: Vec<Item>,
    /// Whether this node was synthesized for a dangling reference.
    pub placeholder: bool,
}

impl LocationState {
    /// Build a location from its configured definition.
    ///
    /// Duplicate item names keep the first occurrence.
    pub fn from_def(id: LocationId, def: &LocationDef) -> Self {
        let mut contains: Vec<Item> = Vec::with_capacity(def.properties.contains.len());
        for item in &def.properties.contains {
            if contains.iter().any(|existing| existing.object == item.object) {
                warn!(
                    location = %id,
                    item = %item.object,
                    "duplicate item name, keeping the first definition"
                );
                continue;
            }
            contains.push(item.clone());
        }

        Self {
            id,
            description: def.description.clone(),
            exits: def.exits.iter().cloned().collect(),
            properties: def.properties.other.clone(),
            contains,
            placeholder: false,
        }
    }

    /// Create an empty placeholder for a location referenced but never defined.
    pub fn placeholder(id: LocationId) -> Self {
        Self {
            id,
            description: PLACEHOLDER_DESCRIPTION.to_owned(),
            exits: BTreeSet::new(),
            properties: BTreeMap::new(),
            contains: Vec::new(),
            placeholder: true,
        }
    }

    /// Find an item by name.
    pub fn item(&self, name: &str) -> Option<&Item> {
        self.contains.iter().find(|item| item.object == name)
    }

    /// Find an item by name, mutably.
    pub fn item_mut(&mut self, name: &str) -> Option<&mut Item> {
        self.contains.iter_mut().find(|item| item.object == name)
    }

    /// Whether an item with this name is present.
    pub fn has_item(&self, name: &str) -> bool {
        self.item(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PropertiesDef;

    #[test]
    fn from_def_drops_duplicate_items() {
        let def = LocationDef {
            description: "A hall.".to_owned(),
            exits: vec![LocationId::new("Garden")],
            properties: PropertiesDef {
                contains: vec![Item::new("Door", "locked"), Item::new("Door", "open")],
                other: BTreeMap::new(),
            },
        };
        let location = LocationState::from_def(LocationId::new("Hall"), &def);
        assert_eq!(location.contains.len(), 1);
        assert_eq!(location.item("Door").map(|i| i.state.as_str()), Some("locked"));
        assert!(location.exits.contains("Garden"));
    }

    #[test]
    fn placeholder_is_empty_and_flagged() {
        let location = LocationState::placeholder(LocationId::new("Nowhere"));
        assert!(location.placeholder);
        assert!(location.exits.is_empty());
        assert!(!location.has_item("anything"));
    }
}
