//! Error types for event delivery.

use fable_types::EntityId;

/// Errors an observer may report when handed an event.
#[derive(Debug, thiserror::Error)]
pub enum PerceiveError {
    /// The observer refused the event.
    #[error("observer {observer} rejected event: {reason}")]
    Rejected {
        /// The refusing observer.
        observer: EntityId,
        /// Why the event was refused.
        reason: String,
    },
}
