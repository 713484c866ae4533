//! Static location definitions as they appear in configuration.
//!
//! The configuration surface is a map `locationId -> LocationDef`. Every
//! field is optional: a missing description becomes
//! [`DEFAULT_DESCRIPTION`], and missing exits or items become empty lists.

use std::collections::BTreeMap;

use fable_types::{Item, LocationId};
use serde::Deserialize;

/// Description given to locations defined without one.
pub const DEFAULT_DESCRIPTION: &str = "An undescribed location.";

/// Description given to placeholder locations created for dangling references.
pub const PLACEHOLDER_DESCRIPTION: &str = "An uncharted place.";

/// One location as written in configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocationDef {
    /// Human description.
    #[serde(default = "default_description")]
    pub description: String,

    /// Destination location ids reachable from here.
    #[serde(default, alias = "exits_to")]
    pub exits: Vec<LocationId>,

    /// Items plus free-form properties.
    #[serde(default)]
    pub properties: PropertiesDef,
}

impl Default for LocationDef {
    fn default() -> Self {
        Self {
            description: default_description(),
            exits: Vec::new(),
            properties: PropertiesDef::default(),
        }
    }
}

/// The `properties` block of a location definition.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PropertiesDef {
    /// Items contained in the location, in display order.
    #[serde(default)]
    pub contains: Vec<Item>,

    /// Every other property, kept verbatim.
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

fn default_description() -> String {
    DEFAULT_DESCRIPTION.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_definition_uses_defaults() {
        let def: Result<LocationDef, _> = serde_yml::from_str("{}");
        assert!(def.is_ok());
        let def = def.unwrap_or_default();
        assert_eq!(def.description, DEFAULT_DESCRIPTION);
        assert!(def.exits.is_empty());
        assert!(def.properties.contains.is_empty());
    }

    #[test]
    fn accepts_exits_to_alias_and_free_properties() {
        let yaml = r"
description: A quiet reading room.
exits_to: [Hall, Garden]
properties:
  lit: true
  contains:
    - object: Lamp
      state: off
      optional_description: a brass lamp
";
        let def: Result<LocationDef, _> = serde_yml::from_str(yaml);
        assert!(def.is_ok(), "parse failed: {def:?}");
        let def = def.unwrap_or_default();
        assert_eq!(def.exits.len(), 2);
        assert_eq!(def.properties.contains.len(), 1);
        assert_eq!(
            def.properties.other.get("lit"),
            Some(&serde_json::Value::Bool(true))
        );
    }
}
