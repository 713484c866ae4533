//! Shared type definitions for the Fable world simulation.
//!
//! This crate is the single source of truth for the records that flow
//! between the World Model, the event dispatcher, and the resolution
//! pipeline.
//!
//! # Modules
//!
//! - [`ids`] -- Name-backed entity and location identifiers, UUID event ids
//! - [`enums`] -- Event scopes and action types
//! - [`structs`] -- Items and events
//! - [`outcome`] -- State updates and resolved outcomes

pub mod enums;
pub mod ids;
pub mod outcome;
pub mod structs;

pub use enums::{ActionType, EventScope};
pub use ids::{EntityId, EventId, LocationId, SYSTEM_ENTITY, SYSTEM_LINK_ENTITY};
pub use outcome::{Outcome, StateUpdate};
pub use structs::{Event, Item, ItemLink};
