//! Event log and scoped dispatcher for the Fable world simulation.
//!
//! Every world mutation and every resolved action produces an immutable
//! [`Event`](fable_types::Event). The [`EventLog`] keeps a bounded,
//! chronologically ordered history of them for narrative consumers, and
//! [`dispatch`] delivers each one to the observers allowed to perceive it.
//!
//! # Modules
//!
//! - [`log`] -- Append-only log pruned beyond twice its retention bound
//! - [`dispatch`] -- The [`Observer`] trait and scope-based delivery
//! - [`error`] -- Observer-side delivery errors

pub mod dispatch;
pub mod error;
pub mod log;

pub use dispatch::{Observer, Positions, dispatch, should_perceive};
pub use error::PerceiveError;
pub use log::{DEFAULT_RETENTION, EventLog};
