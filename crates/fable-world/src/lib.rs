//! The World Model for the Fable simulation.
//!
//! This crate owns everything physical: locations as nodes of a directed
//! graph, the items each location contains (including linked mirror items),
//! the entity position map, the global weather, and the event log those
//! mutations feed.
//!
//! # Modules
//!
//! - [`config`] -- Location definitions as written in configuration.
//! - [`context`] -- Static context summary for the intent interpreter.
//! - [`error`] -- Error types for world operations.
//! - [`location`] -- [`LocationState`] node with exits, properties, items.
//! - [`world_state`] -- [`WorldState`], the single owner of world data.

pub mod config;
pub mod context;
pub mod error;
pub mod location;
pub mod world_state;

pub use config::{DEFAULT_DESCRIPTION, LocationDef, PropertiesDef};
pub use error::WorldError;
pub use location::LocationState;
pub use world_state::{ApplyReport, DEFAULT_WEATHER, ItemStateChange, WorldState};
