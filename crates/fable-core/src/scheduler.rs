//! Turn ordering.
//!
//! Each step the entities act in a fresh uniformly random order, with one
//! correction: the entity that acted last in the previous step never acts
//! first in the next, so no entity gets two turns back to back across the
//! step boundary.

use fable_types::EntityId;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Order `entities` for one step.
///
/// Fewer than two entities are returned as given.
pub fn turn_order<R: Rng + ?Sized>(
    entities: &[EntityId],
    last_actor: Option<&EntityId>,
    rng: &mut R,
) -> Vec<EntityId> {
    let mut order = entities.to_vec();
    if order.len() < 2 {
        return order;
    }
    order.shuffle(rng);
    if order.first() == last_actor {
        order.swap(0, 1);
    }
    order
}

/// Seeded turn scheduler remembering who acted last.
#[derive(Debug, Clone)]
pub struct TurnScheduler {
    rng: StdRng,
    last_actor: Option<EntityId>,
}

impl TurnScheduler {
    /// Create a scheduler whose shuffles are reproducible from `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            last_actor: None,
        }
    }

    /// Produce this step's order.
    pub fn order(&mut self, entities: &[EntityId]) -> Vec<EntityId> {
        turn_order(entities, self.last_actor.as_ref(), &mut self.rng)
    }

    /// Remember who acted last in the step that just finished.
    ///
    /// `None` means nobody took a turn; the previous last actor is kept.
    pub fn record_last_actor(&mut self, actor: Option<&EntityId>) {
        if let Some(actor) = actor {
            self.last_actor = Some(actor.clone());
        }
    }

    /// The entity that acted last in the previous step.
    pub const fn last_actor(&self) -> Option<&EntityId> {
        self.last_actor.as_ref()
    }
}
