//! The single-step driver.
//!
//! Each step runs through these phases:
//!
//! 1. **Order** -- advance the step counter and ask the [`TurnScheduler`]
//!    for this step's turn order.
//! 2. **Direct** -- the director proposes one directive and applies it, once
//!    per step or before every turn when configured per turn.
//! 3. **Turns** -- for each entity in order: fetch an intent, resolve it
//!    through the [`Coordinator`], apply the outcome's updates, and record
//!    the outcome event.
//! 4. **Dispatch** -- after every director action and every turn, drain the
//!    World Model's outbox and deliver each event through the scoped
//!    dispatcher, so the next actor already perceives what just happened.
//!
//! Per-turn failures never abort a step. They become failed outcomes or
//! `system_error` events.

use std::collections::BTreeMap;

use fable_events::{Observer, dispatch};
use fable_types::{EntityId, EventScope, LocationId, Outcome};
use fable_world::{WorldError, WorldState};
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;
use crate::director::{Director, DirectorSource, Directive, parse_directive};
use crate::entity::{Entity, IntentContext, IntentSource};
use crate::interpreter::{IntentInterpreter, InterpreterError};
use crate::resolution::{Coordinator, ResolutionStatus, TurnRequest};
use crate::retry::Sleeper;
use crate::scheduler::TurnScheduler;

/// Errors that can occur while building a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// An entity could not be placed at its starting location.
    #[error("cannot place {entity}: {source}")]
    Placement {
        /// The entity being placed.
        entity: EntityId,
        /// The underlying world error.
        source: WorldError,
    },
}

/// The external collaborators a step calls out to.
pub struct Collaborators<'a> {
    /// Decides what each entity tries.
    pub intents: &'a mut dyn IntentSource,
    /// Proposes outcomes for intents.
    pub interpreter: &'a mut dyn IntentInterpreter,
    /// Proposes director directives.
    pub director: &'a mut dyn DirectorSource,
    /// Waits between retries.
    pub sleeper: &'a dyn Sleeper,
}

/// Summary of a single step's execution.
#[derive(Debug, Clone, Default)]
pub struct StepSummary {
    /// The step number that was executed.
    pub step: u64,
    /// The turn order used.
    pub order: Vec<EntityId>,
    /// The last entity in the order that actually took its turn.
    pub last_actor: Option<EntityId>,
    /// Final outcome for every entity that took its turn.
    pub outcomes: BTreeMap<EntityId, Outcome>,
    /// How many director directives changed the world.
    pub director_actions: u32,
    /// Events recorded during the step.
    pub events_recorded: u32,
    /// Event deliveries made during the step.
    pub deliveries: u32,
}

/// The mutable simulation: world, observers, and the step machinery.
#[derive(Debug)]
pub struct Simulation {
    world: WorldState,
    entities: Vec<Entity>,
    director: Option<Director>,
    scheduler: TurnScheduler,
    coordinator: Coordinator,
    director_per_turn: bool,
}

impl Simulation {
    /// Build the world from configuration and place every entity.
    ///
    /// The placement events are dispatched immediately, so entities start
    /// out knowing who else is around.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::Placement`] if an entity's starting location
    /// does not exist.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, SetupError> {
        let mut world = WorldState::initialize(&config.locations, config.events.retention)
            .with_weather(config.world.initial_weather.clone());

        let mut entities = Vec::with_capacity(config.entities.len());
        for entity in &config.entities {
            world
                .move_agent(&entity.id, &entity.start_location)
                .map_err(|source| SetupError::Placement {
                    entity: entity.id.clone(),
                    source,
                })?;
            entities.push(Entity::new(entity.id.clone(), config.events.memory_limit));
        }

        let director = config
            .director
            .enabled
            .then(|| Director::new(config.world.narrative_goal.clone(), config.events.memory_limit));

        let mut simulation = Self {
            world,
            entities,
            director,
            scheduler: TurnScheduler::new(config.world.seed),
            coordinator: Coordinator::new(config.retry),
            director_per_turn: config.director.per_turn,
        };
        simulation.dispatch_pending();

        info!(
            name = %config.world.name,
            locations = simulation.world.locations().count(),
            entities = simulation.entities.len(),
            director = simulation.director.is_some(),
            "simulation initialized"
        );
        Ok(simulation)
    }

    /// The World Model.
    pub const fn world(&self) -> &WorldState {
        &self.world
    }

    /// The entities, in configuration order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Look up one entity.
    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.entity_id() == id)
    }

    /// The director, if enabled.
    pub const fn director(&self) -> Option<&Director> {
        self.director.as_ref()
    }

    /// Entity ids in configuration order.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(|e| e.entity_id().clone()).collect()
    }

    /// Run one step.
    pub fn run_step(&mut self, collaborators: &mut Collaborators<'_>) -> StepSummary {
        let step = self.world.advance_step();
        let order = self.scheduler.order(&self.entity_ids());
        info!(step, order = ?order, weather = %self.world.weather(), "step started");

        let mut summary = StepSummary {
            step,
            order: order.clone(),
            ..StepSummary::default()
        };

        if !self.director_per_turn || order.is_empty() {
            self.director_turn(step, collaborators, &mut summary);
        }

        for entity in &order {
            if self.director_per_turn {
                self.director_turn(step, collaborators, &mut summary);
            }
            if let Some(outcome) = self.entity_turn(step, entity, collaborators) {
                summary.outcomes.insert(entity.clone(), outcome);
                summary.last_actor = Some(entity.clone());
            }
            self.flush(&mut summary);
        }

        self.scheduler.record_last_actor(summary.last_actor.as_ref());

        debug!(
            step,
            turns = summary.outcomes.len(),
            director_actions = summary.director_actions,
            events = summary.events_recorded,
            deliveries = summary.deliveries,
            "step finished"
        );
        summary
    }

    fn director_turn(&mut self, step: u64, collaborators: &mut Collaborators<'_>, summary: &mut StepSummary) {
        let Some(briefing) = self.director.as_ref().map(|d| d.briefing(&self.world)) else {
            return;
        };

        let proposal = self.coordinator.retry_policy().run(
            collaborators.sleeper,
            |_| collaborators.director.propose(step, &briefing),
            InterpreterError::is_transient,
        );
        let directive = match proposal {
            Ok(raw) => parse_directive(&raw),
            Err(e) => {
                warn!(step, error = %e, "director source unavailable, doing nothing");
                Directive::DoNothing
            }
        };

        let acted = self
            .director
            .as_mut()
            .is_some_and(|director| director.act(&mut self.world, &directive));
        if acted {
            summary.director_actions = summary.director_actions.saturating_add(1);
        }
        self.flush(summary);
    }

    fn entity_turn(
        &mut self,
        step: u64,
        id: &EntityId,
        collaborators: &mut Collaborators<'_>,
    ) -> Option<Outcome> {
        let location = match self.world.require_position(id) {
            Ok(location) => location.clone(),
            Err(e) => {
                warn!(step, entity = %id, error = %e, "entity has no position, skipping turn");
                return None;
            }
        };
        let entity = self.entities.iter().find(|e| e.entity_id() == id)?;

        let surroundings = self.world.static_context(id);
        let memory = entity.memory_summary();
        let context = IntentContext {
            surroundings: &surroundings,
            memory: &memory,
        };
        let intent = match collaborators.intents.next_intent(step, entity, &context) {
            Ok(intent) => intent,
            Err(e) => {
                warn!(step, entity = %id, error = %e, "no intent, skipping turn");
                return None;
            }
        };

        let resolution = self.coordinator.resolve(
            &self.world,
            collaborators.interpreter,
            collaborators.sleeper,
            TurnRequest {
                entity: id,
                location: &location,
                intent: &intent,
            },
        );
        let outcome = resolution.outcome;

        if resolution.status == ResolutionStatus::Unavailable {
            self.world.record_event(
                format!("System error resolving {id}'s action for intent: {intent}."),
                Some(location),
                EventScope::SystemError,
                EntityId::system(),
            );
            return Some(outcome);
        }

        let report = self.world.apply_updates(&outcome.updates, id);
        if report.failed > 0 {
            warn!(step, entity = %id, failed = report.failed, "some updates could not be applied");
        }

        let description = if outcome.success {
            outcome.outcome_description.clone()
        } else {
            format!(
                "{id}'s attempt to {} failed: {}",
                intent.trim(),
                outcome.outcome_description
            )
        };
        self.world
            .record_event(description, Some(location), EventScope::ActionOutcome, id.clone());

        info!(
            step,
            entity = %id,
            action = outcome.action_type.keyword(),
            success = outcome.success,
            status = ?resolution.status,
            changed = report.changed,
            "turn resolved"
        );
        Some(outcome)
    }

    fn flush(&mut self, summary: &mut StepSummary) {
        let (events, deliveries) = self.dispatch_pending();
        summary.events_recorded = summary.events_recorded.saturating_add(events);
        summary.deliveries = summary.deliveries.saturating_add(deliveries);
    }

    /// Deliver every recorded but undispatched event.
    ///
    /// Returns the number of events dispatched and the number of deliveries
    /// made.
    pub fn dispatch_pending(&mut self) -> (u32, u32) {
        let events = self.world.drain_undispatched();
        if events.is_empty() {
            return (0, 0);
        }

        let mut observers: Vec<&mut dyn Observer> = Vec::with_capacity(self.entities.len().saturating_add(1));
        for entity in &mut self.entities {
            observers.push(entity);
        }
        if let Some(director) = self.director.as_mut() {
            observers.push(director);
        }

        let mut deliveries: u32 = 0;
        for event in &events {
            let notified = dispatch(event, &mut observers, self.world.positions());
            deliveries = deliveries.saturating_add(u32::try_from(notified.len()).unwrap_or(u32::MAX));
        }

        (u32::try_from(events.len()).unwrap_or(u32::MAX), deliveries)
    }
}
