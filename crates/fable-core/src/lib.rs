//! Action resolution, turn scheduling, and the step loop for the Fable
//! simulation.
//!
//! This crate turns free-form intents into validated world mutations and
//! drives the simulation one step at a time: order the entities, let the
//! director intervene, resolve each turn, apply the updates, and dispatch
//! the resulting events.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `fable-config.yaml` into
//!   strongly-typed structs.
//! - [`director`] -- Director directives, their parser, and the
//!   [`Director`] observer.
//! - [`entity`] -- [`Entity`] observers and the [`IntentSource`] trait.
//! - [`interpreter`] -- [`IntentInterpreter`] trait and the rule-based
//!   [`KeywordInterpreter`].
//! - [`parse`] -- Parser for the four-field interpreter response.
//! - [`resolution`] -- The [`Coordinator`] that re-validates proposals.
//! - [`retry`] -- Bounded exponential backoff for collaborator calls.
//! - [`runner`] -- Bounded multi-step loop with a cooperative stop flag.
//! - [`scheduler`] -- Per-step turn order.
//! - [`step`] -- The single-step driver, [`Simulation`].
//!
//! [`Director`]: director::Director
//! [`Entity`]: entity::Entity
//! [`IntentSource`]: entity::IntentSource
//! [`IntentInterpreter`]: interpreter::IntentInterpreter
//! [`KeywordInterpreter`]: interpreter::KeywordInterpreter
//! [`Coordinator`]: resolution::Coordinator
//! [`Simulation`]: step::Simulation

pub mod config;
pub mod director;
pub mod entity;
pub mod interpreter;
pub mod parse;
pub mod resolution;
pub mod retry;
pub mod runner;
pub mod scheduler;
pub mod step;
