//! Type-safe identifier wrappers.
//!
//! Entities and locations are named by the configuration author, so their
//! identifiers wrap the configured name. Events are generated at runtime and
//! carry a UUID v7 (time-ordered), which keeps the event log sortable even
//! when two events share a step number.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around a configured name with standard derives.
macro_rules! define_name_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identifier from a configured name.
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            /// Borrow the underlying name.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the identifier and return the underlying name.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self(name.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self(name)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl core::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_name_id! {
    /// Identifier of anything that can trigger or receive events: an agent,
    /// the director, or the `system` pseudo-entity.
    EntityId
}

define_name_id! {
    /// Identifier of a location (node in the world graph).
    LocationId
}

impl EntityId {
    /// The pseudo-entity credited with engine-originated events.
    pub fn system() -> Self {
        Self::new(SYSTEM_ENTITY)
    }

    /// The pseudo-entity credited with linked-item mirror updates.
    pub fn system_link() -> Self {
        Self::new(SYSTEM_LINK_ENTITY)
    }
}

/// Name of the engine pseudo-entity.
pub const SYSTEM_ENTITY: &str = "system";

/// Name of the pseudo-entity that triggers linked-item propagation.
pub const SYSTEM_LINK_ENTITY: &str = "system-link";

/// Unique identifier for an entry in the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for EventId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}
