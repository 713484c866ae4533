//! Entities: the agents that take turns, and where their intents come from.
//!
//! An [`Entity`] is an [`Observer`] with a bounded memory of the events it
//! perceived. The [`IntentSource`] trait abstracts how an entity decides
//! what to try next. It could be a language model, a human at a prompt, or
//! a script. [`ScriptedIntents`] replays configured intents and is what the
//! engine binary and the tests use.

use std::collections::{BTreeMap, VecDeque};

use fable_events::{Observer, PerceiveError};
use fable_types::{EntityId, Event};

use crate::config::EntityConfig;

/// Intent used when a script runs dry.
pub const FALLBACK_INTENT: &str = "wait";

/// Errors an intent source may report.
#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    /// No intent could be produced for this entity this step.
    #[error("no intent available for {entity}: {message}")]
    Unavailable {
        /// The entity whose turn it is.
        entity: EntityId,
        /// What went wrong.
        message: String,
    },
}

/// An agent taking turns in the world.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    memory: VecDeque<String>,
    memory_limit: usize,
}

impl Entity {
    /// Create an entity that remembers up to `memory_limit` perceived events.
    /// Zero remembers nothing.
    pub const fn new(id: EntityId, memory_limit: usize) -> Self {
        Self {
            id,
            memory: VecDeque::new(),
            memory_limit,
        }
    }

    /// The entity's id.
    pub const fn entity_id(&self) -> &EntityId {
        &self.id
    }

    /// Perceived event descriptions, oldest first.
    pub fn memory(&self) -> impl Iterator<Item = &str> {
        self.memory.iter().map(String::as_str)
    }

    /// Number of remembered events.
    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    /// Remembered events as a newline-separated summary.
    pub fn memory_summary(&self) -> String {
        self.memory().collect::<Vec<_>>().join("\n")
    }
}

impl Observer for Entity {
    fn id(&self) -> &EntityId {
        &self.id
    }

    fn perceive(&mut self, event: &Event) -> Result<(), PerceiveError> {
        if self.memory_limit == 0 {
            return Ok(());
        }
        while self.memory.len() >= self.memory_limit {
            self.memory.pop_front();
        }
        self.memory
            .push_back(format!("[step {}] {}", event.step, event.description));
        Ok(())
    }
}

/// What an entity knows when it decides on an intent.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentContext<'a> {
    /// The World Model's static summary of the entity's surroundings.
    pub surroundings: &'a str,
    /// The entity's remembered events, oldest first, one per line.
    pub memory: &'a str,
}

/// A source of free-form intents.
pub trait IntentSource {
    /// Decide what `entity` tries to do at `step`.
    ///
    /// # Errors
    ///
    /// Returns [`IntentError`] if no intent can be produced. The step
    /// driver skips the entity's turn.
    fn next_intent(
        &mut self,
        step: u64,
        entity: &Entity,
        context: &IntentContext<'_>,
    ) -> Result<String, IntentError>;
}

/// Replays a fixed list of intents per entity.
///
/// Once an entity's list is exhausted it falls back to [`FALLBACK_INTENT`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedIntents {
    scripts: BTreeMap<EntityId, VecDeque<String>>,
}

impl ScriptedIntents {
    /// Create an empty script; every entity waits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build scripts from the configured entity list.
    pub fn from_config(entities: &[EntityConfig]) -> Self {
        let scripts = entities
            .iter()
            .map(|e| (e.id.clone(), e.intents.iter().cloned().collect()))
            .collect();
        Self { scripts }
    }

    /// Append an intent to `entity`'s script.
    pub fn push(&mut self, entity: &EntityId, intent: impl Into<String>) {
        self.scripts
            .entry(entity.clone())
            .or_default()
            .push_back(intent.into());
    }
}

impl IntentSource for ScriptedIntents {
    fn next_intent(
        &mut self,
        _step: u64,
        entity: &Entity,
        _context: &IntentContext<'_>,
    ) -> Result<String, IntentError> {
        Ok(self
            .scripts
            .get_mut(entity.entity_id())
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| FALLBACK_INTENT.to_owned()))
    }
}
