//! Step callback that narrates each step to the log.
//!
//! After each step this callback logs the events recorded during it, in
//! order, which makes the run readable as a story from the log alone.

use fable_core::runner::StepCallback;
use fable_core::step::{Simulation, StepSummary};
use tracing::{debug, info};

/// Callback that logs each step's events as narration.
#[derive(Debug, Default)]
pub struct NarrationCallback {
    narrated: u64,
}

impl NarrationCallback {
    /// Create a new narration callback.
    pub const fn new() -> Self {
        Self { narrated: 0 }
    }

    /// Number of events narrated so far.
    pub const fn narrated(&self) -> u64 {
        self.narrated
    }
}

impl StepCallback for NarrationCallback {
    fn on_step(&mut self, summary: &StepSummary, simulation: &Simulation) {
        for event in simulation.world().events().events_at_step(summary.step) {
            info!(
                step = event.step,
                scope = %event.scope,
                by = %event.triggered_by,
                "{}",
                event.description
            );
            self.narrated = self.narrated.saturating_add(1);
        }

        let failed = summary.outcomes.values().filter(|o| !o.success).count();
        debug!(
            step = summary.step,
            turns = summary.outcomes.len(),
            failed,
            director_actions = summary.director_actions,
            deliveries = summary.deliveries,
            "Step narrated"
        );
    }
}
