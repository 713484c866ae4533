//! Error types for World Model operations.

use fable_types::{EntityId, LocationId};

/// Errors that can occur during world-graph operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A location id does not name any known location.
    #[error("unknown location: {0}")]
    UnknownLocation(LocationId),

    /// An entity has no recorded position.
    #[error("entity {0} has no position")]
    UnknownEntity(EntityId),
}
