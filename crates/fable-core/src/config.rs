//! Configuration loading and typed config structures for the simulation.
//!
//! The whole simulation is described by one YAML document: world-level
//! settings, event retention, the collaborator retry schedule, the entities
//! and their starting positions, the director script, and the location map.
//! Every section has defaults except `locations`, which must name at least
//! one location.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use fable_types::{EntityId, LocationId};
use fable_world::LocationDef;
use serde::Deserialize;

use crate::retry::RetryPolicy;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but is structurally unusable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings.
    #[serde(default)]
    pub world: WorldConfig,

    /// Event log settings.
    #[serde(default)]
    pub events: EventsConfig,

    /// Retry schedule for collaborator calls.
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Director settings and script.
    #[serde(default)]
    pub director: DirectorConfig,

    /// Entities taking turns, with their starting positions.
    #[serde(default)]
    pub entities: Vec<EntityConfig>,

    /// The location map.
    #[serde(default)]
    pub locations: BTreeMap<LocationId, LocationDef>,
}

impl SimulationConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the structural invariants the engine cannot run without.
    ///
    /// Dangling exits and links are tolerated here; the World Model
    /// replaces them with placeholders.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if there are no locations, a location
    /// id is blank, an entity id is blank or duplicated, or an entity starts
    /// at an undefined location.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.locations.is_empty() {
            return Err(invalid("no locations defined"));
        }
        if self.locations.keys().any(|id| id.as_str().trim().is_empty()) {
            return Err(invalid("location ids must not be blank"));
        }

        let mut seen: BTreeSet<&EntityId> = BTreeSet::new();
        for entity in &self.entities {
            if entity.id.as_str().trim().is_empty() {
                return Err(invalid("entity ids must not be blank"));
            }
            if !seen.insert(&entity.id) {
                return Err(invalid(format!("duplicate entity id {}", entity.id)));
            }
            if !self.locations.contains_key(&entity.start_location) {
                return Err(invalid(format!(
                    "entity {} starts at undefined location {}",
                    entity.id, entity.start_location
                )));
            }
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.into(),
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable simulation name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Seed for the turn-order RNG.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of steps to run.
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,

    /// Weather at step zero.
    #[serde(default = "default_weather")]
    pub initial_weather: String,

    /// Story direction handed to the director.
    #[serde(default = "default_narrative_goal")]
    pub narrative_goal: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            max_steps: default_max_steps(),
            initial_weather: default_weather(),
            narrative_goal: default_narrative_goal(),
        }
    }
}

/// Event log configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EventsConfig {
    /// Retention bound; the log holds at most twice this many events.
    /// Zero keeps everything.
    #[serde(default = "default_retention")]
    pub retention: usize,

    /// How many perceived events each entity remembers.
    #[serde(default = "default_memory_limit")]
    pub memory_limit: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            retention: default_retention(),
            memory_limit: default_memory_limit(),
        }
    }
}

/// Director configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectorConfig {
    /// Whether the director takes part at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Intervene before every entity turn instead of once per step.
    #[serde(default)]
    pub per_turn: bool,

    /// Scripted directives, consumed one per director turn.
    #[serde(default)]
    pub directives: Vec<String>,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            per_turn: false,
            directives: Vec::new(),
        }
    }
}

/// One entity taking turns.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntityConfig {
    /// Entity id, unique across the simulation.
    pub id: EntityId,

    /// Where the entity is placed at setup.
    pub start_location: LocationId,

    /// Scripted intents, consumed one per turn.
    #[serde(default)]
    pub intents: Vec<String>,
}

fn default_world_name() -> String {
    "Fable".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_max_steps() -> u64 {
    10
}

fn default_weather() -> String {
    fable_world::DEFAULT_WEATHER.to_owned()
}

fn default_narrative_goal() -> String {
    "An emergent story.".to_owned()
}

const fn default_retention() -> usize {
    fable_events::DEFAULT_RETENTION
}

const fn default_memory_limit() -> usize {
    20
}

const fn default_true() -> bool {
    true
}
