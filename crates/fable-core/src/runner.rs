//! Bounded simulation loop.
//!
//! [`run_simulation`] drives [`Simulation::run_step`] until one of:
//!
//! - **Step limit**: `max_steps` steps have completed
//! - **Stop request**: a [`StopFlag`] was raised; checked only between
//!   steps, never mid-step
//!
//! After each step a [`StepCallback`] sees the summary and the simulation,
//! which is where a narrative consumer or progress display hooks in.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::step::{Collaborators, Simulation, StepSummary};

/// Why the simulation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationEndReason {
    /// The configured number of steps completed.
    MaxStepsReached,
    /// A stop was requested between steps.
    Stopped,
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last step summary, if any step completed.
    pub final_summary: Option<StepSummary>,
    /// Total number of steps executed.
    pub total_steps: u64,
}

/// Callback invoked after each step completes.
pub trait StepCallback {
    /// Called after a step completes.
    fn on_step(&mut self, summary: &StepSummary, simulation: &Simulation);
}

/// A callback that does nothing.
pub struct NoOpCallback;

impl StepCallback for NoOpCallback {
    fn on_step(&mut self, _summary: &StepSummary, _simulation: &Simulation) {}
}

/// Cooperative stop signal, shareable with another thread such as a
/// Ctrl-C handler.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    /// A flag that has not been raised.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the runner to stop before the next step.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Run the simulation until a termination condition is met.
pub fn run_simulation(
    simulation: &mut Simulation,
    collaborators: &mut Collaborators<'_>,
    max_steps: u64,
    stop: &StopFlag,
    callback: &mut dyn StepCallback,
) -> SimulationResult {
    let mut final_summary: Option<StepSummary> = None;
    let mut total_steps: u64 = 0;

    info!(
        max_steps,
        entities = simulation.entities().len(),
        "Simulation starting"
    );

    let end_reason = loop {
        if stop.is_stop_requested() {
            info!(total_steps, "Stop requested");
            break SimulationEndReason::Stopped;
        }
        if total_steps >= max_steps {
            info!(total_steps, max_steps, "Step limit reached");
            break SimulationEndReason::MaxStepsReached;
        }

        let summary = simulation.run_step(collaborators);
        total_steps = total_steps.saturating_add(1);
        callback.on_step(&summary, simulation);
        final_summary = Some(summary);
    };

    SimulationResult {
        end_reason,
        final_summary,
        total_steps,
    }
}

/// Log the simulation end.
pub fn log_simulation_end(result: &SimulationResult, simulation: &Simulation) {
    info!(
        reason = ?result.end_reason,
        total_steps = result.total_steps,
        final_step = result.final_summary.as_ref().map(|s| s.step),
        events_retained = simulation.world().events().len(),
        weather = %simulation.world().weather(),
        "Simulation ended"
    );
}
