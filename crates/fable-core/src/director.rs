//! The director's intervention channel.
//!
//! The director is an exogenous storyteller. Once per step (or once per
//! turn) it may nudge the world through a closed vocabulary of directives
//! written in a small `ACTION_TYPE: key: value, key2: value2` language:
//!
//! | Directive              | Parameters                                  |
//! |------------------------|---------------------------------------------|
//! | `CHANGE_WEATHER`       | free text, the new condition                |
//! | `ADD_OBJECT`           | `object`, `state`, `description`, `location`|
//! | `CREATE_AMBIENT_EVENT` | `description`, `location` (or `global`)     |
//! | `DO_NOTHING`           | none                                        |
//!
//! Anything malformed or unrecognised degrades to [`Directive::DoNothing`].
//! Accepted directives become ordinary [`StateUpdate`]s and events, so they
//! reach observers through the same dispatcher as entity actions.

use std::collections::{BTreeMap, VecDeque};
use std::fmt::{self, Write as _};

use fable_events::{Observer, PerceiveError, Positions};
use fable_types::{EntityId, Event, EventScope, Item, LocationId, StateUpdate};
use fable_world::WorldState;
use tracing::{debug, info, warn};

use crate::interpreter::InterpreterError;

/// Entity id the director acts under.
pub const DIRECTOR_ENTITY: &str = "Director";

/// The directive every unusable proposal degrades to.
pub const DO_NOTHING: &str = "DO_NOTHING";

/// Location value that makes an ambient event global.
const GLOBAL_LOCATION: &str = "global";

/// One parsed director action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Change the global weather.
    ChangeWeather {
        /// The new condition, title-cased.
        condition: String,
    },
    /// Place a new item somewhere.
    AddObject {
        /// Item name.
        object: String,
        /// Initial state.
        state: String,
        /// Human description.
        description: String,
        /// Where the item appears.
        location: LocationId,
    },
    /// Narrate something happening, without changing state.
    CreateAmbientEvent {
        /// What happens.
        description: String,
        /// Where it happens; `None` means everywhere.
        location: Option<LocationId>,
    },
    /// Leave the world alone.
    DoNothing,
}

impl Directive {
    /// The directive's keyword.
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::ChangeWeather { .. } => "CHANGE_WEATHER",
            Self::AddObject { .. } => "ADD_OBJECT",
            Self::CreateAmbientEvent { .. } => "CREATE_AMBIENT_EVENT",
            Self::DoNothing => DO_NOTHING,
        }
    }
}

impl fmt::Display for Directive {
    /// Renders the directive back in its line syntax.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChangeWeather { condition } => write!(f, "{}: {condition}", self.keyword()),
            Self::AddObject {
                object,
                state,
                description,
                location,
            } => write!(
                f,
                "{}: object: {object}, state: {state}, description: {description}, location: {location}",
                self.keyword()
            ),
            Self::CreateAmbientEvent {
                description,
                location,
            } => write!(
                f,
                "{}: description: {description}, location: {}",
                self.keyword(),
                location.as_ref().map_or(GLOBAL_LOCATION, LocationId::as_str)
            ),
            Self::DoNothing => f.write_str(DO_NOTHING),
        }
    }
}

/// Parse one directive line.
///
/// Never fails: anything unusable becomes [`Directive::DoNothing`].
pub fn parse_directive(raw: &str) -> Directive {
    let line = raw.trim();
    let (keyword, params) = line.split_once(':').unwrap_or((line, ""));
    let keyword = keyword.trim().to_ascii_uppercase();
    let params = params.trim();

    let directive = match keyword.as_str() {
        "CHANGE_WEATHER" => {
            let condition = params
                .split_once(':')
                .filter(|(key, _)| key.trim().eq_ignore_ascii_case("condition"))
                .map_or(params, |(_, value)| value.trim());
            let condition = title_case(unquote(condition));
            if condition.is_empty() {
                None
            } else {
                Some(Directive::ChangeWeather { condition })
            }
        }
        "ADD_OBJECT" => {
            let mut p = parse_params(params);
            match (
                p.remove("object"),
                p.remove("state"),
                p.remove("description"),
                p.remove("location"),
            ) {
                (Some(object), Some(state), Some(description), Some(location)) => {
                    Some(Directive::AddObject {
                        object,
                        state,
                        description,
                        location: LocationId::new(location),
                    })
                }
                _ => None,
            }
        }
        "CREATE_AMBIENT_EVENT" => {
            let mut p = parse_params(params);
            match (p.remove("description"), p.remove("location")) {
                (Some(description), Some(location)) => Some(Directive::CreateAmbientEvent {
                    description,
                    location: (!location.eq_ignore_ascii_case(GLOBAL_LOCATION))
                        .then(|| LocationId::new(location)),
                }),
                _ => None,
            }
        }
        DO_NOTHING => Some(Directive::DoNothing),
        _ => None,
    };

    directive.unwrap_or_else(|| {
        if !line.is_empty() {
            warn!(directive = line, "unusable director directive, doing nothing");
        }
        Directive::DoNothing
    })
}

/// Split `key: value` pairs separated by commas.
///
/// A comma only separates pairs when the next segment starts with
/// `word:`, so values may contain commas. Keys are lower-cased and
/// surrounding double quotes are removed from values. Segments without a
/// key are dropped.
fn parse_params(params: &str) -> BTreeMap<String, String> {
    let mut pairs: Vec<String> = Vec::new();
    for segment in params.split(',') {
        match pairs.last_mut() {
            Some(current) if !starts_with_key(segment) => {
                current.push(',');
                current.push_str(segment);
            }
            _ => pairs.push(segment.to_owned()),
        }
    }

    pairs
        .iter()
        .filter_map(|pair| pair.split_once(':'))
        .map(|(key, value)| (key.trim().to_ascii_lowercase(), unquote(value.trim()).to_owned()))
        .filter(|(key, value)| !key.is_empty() && !value.is_empty())
        .collect()
}

fn starts_with_key(segment: &str) -> bool {
    segment.split_once(':').is_some_and(|(key, _)| {
        let key = key.trim();
        !key.is_empty() && key.chars().all(|c| c.is_alphanumeric() || c == '_')
    })
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Upper-case the first letter of every word and lower-case the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Director source
// ---------------------------------------------------------------------------

/// A source of director directives.
pub trait DirectorSource {
    /// Propose one directive line for `step`, given a briefing on the world.
    ///
    /// # Errors
    ///
    /// Returns [`InterpreterError`] if no proposal can be produced; the
    /// director then does nothing.
    fn propose(&mut self, step: u64, briefing: &str) -> Result<String, InterpreterError>;
}

/// Replays scripted directives, then does nothing.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDirector {
    directives: VecDeque<String>,
}

impl ScriptedDirector {
    /// Replay `directives` in order.
    pub fn new(directives: impl IntoIterator<Item = String>) -> Self {
        Self {
            directives: directives.into_iter().collect(),
        }
    }

    /// A director that never intervenes.
    pub fn idle() -> Self {
        Self::default()
    }
}

impl DirectorSource for ScriptedDirector {
    fn propose(&mut self, _step: u64, _briefing: &str) -> Result<String, InterpreterError> {
        Ok(self
            .directives
            .pop_front()
            .unwrap_or_else(|| DO_NOTHING.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Director observer
// ---------------------------------------------------------------------------

/// The director: a bodiless observer that applies directives.
#[derive(Debug, Clone)]
pub struct Director {
    id: EntityId,
    narrative_goal: String,
    memory: VecDeque<String>,
    memory_limit: usize,
}

impl Director {
    /// Create a director steering toward `narrative_goal`, remembering up to
    /// `memory_limit` perceived events.
    pub fn new(narrative_goal: impl Into<String>, memory_limit: usize) -> Self {
        Self {
            id: EntityId::new(DIRECTOR_ENTITY),
            narrative_goal: narrative_goal.into(),
            memory: VecDeque::new(),
            memory_limit,
        }
    }

    /// The goal handed to the director source.
    pub fn narrative_goal(&self) -> &str {
        &self.narrative_goal
    }

    /// Perceived event descriptions, oldest first.
    pub fn memory(&self) -> impl Iterator<Item = &str> {
        self.memory.iter().map(String::as_str)
    }

    /// Summary of the world as the director sees it.
    pub fn world_summary(world: &WorldState) -> String {
        let mut summary = String::new();
        let _ = writeln!(summary, "Weather: {}", world.weather());

        summary.push_str("Agent Locations:\n");
        for (entity, location) in world.positions() {
            let _ = writeln!(summary, "  - {entity} is in {location}");
        }

        summary.push_str("Locations:\n");
        for location in world.locations() {
            let _ = writeln!(summary, "  - {}: {}", location.id, location.description);
            let exits: Vec<&str> = location.exits.iter().map(LocationId::as_str).collect();
            let _ = writeln!(summary, "    Exits: {}", exits.join(", "));
            if location.contains.is_empty() {
                summary.push_str("    Items: none\n");
            } else {
                let items: Vec<String> = location
                    .contains
                    .iter()
                    .map(|item| format!("{} ({})", item.object, item.state))
                    .collect();
                let _ = writeln!(summary, "    Items: {}", items.join(", "));
            }
            let agents: Vec<String> = world
                .agents_at(&location.id)
                .into_iter()
                .map(EntityId::into_inner)
                .collect();
            let _ = writeln!(summary, "    Agents Here: {}", agents.join(", "));
        }

        summary.trim_end().to_owned()
    }

    /// Everything the director source is told before proposing.
    pub fn briefing(&self, world: &WorldState) -> String {
        let mut briefing = format!(
            "Narrative goal: {}\n{}\n",
            self.narrative_goal,
            Self::world_summary(world)
        );
        if !self.memory.is_empty() {
            briefing.push_str("Recent events:\n");
            for line in &self.memory {
                let _ = writeln!(briefing, "  - {line}");
            }
        }
        briefing
    }

    /// Apply a directive to the world.
    ///
    /// Returns `true` if the directive changed the world or produced an
    /// event. Directives naming unknown locations, and directives whose
    /// effect would be a no-op, change nothing. Every directive other than
    /// `DO_NOTHING` leaves a line in the director's memory saying whether
    /// it took effect.
    pub fn act(&mut self, world: &mut WorldState, directive: &Directive) -> bool {
        let acted = self.apply(world, directive);

        if acted {
            info!(step = world.step(), directive = directive.keyword(), "director intervened");
            self.remember(format!(
                "[step {}] Action Succeeded: Enacted '{directive}'.",
                world.step()
            ));
        } else if *directive != Directive::DoNothing {
            debug!(step = world.step(), directive = directive.keyword(), "director left the world unchanged");
            self.remember(format!(
                "[step {}] Action Failed: Attempted '{directive}', but it could not be applied.",
                world.step()
            ));
        }
        acted
    }

    fn apply(&self, world: &mut WorldState, directive: &Directive) -> bool {
        match directive {
            Directive::DoNothing => false,
            Directive::ChangeWeather { condition } => {
                let update = StateUpdate::SetWeather {
                    condition: condition.clone(),
                };
                world.apply_updates(&[update], &self.id).changed > 0
            }
            Directive::AddObject {
                object,
                state,
                description,
                location,
            } => {
                if !world.has_location(location) {
                    warn!(location = %location, object = %object, "director named unknown location");
                    return false;
                }
                let update = StateUpdate::AddItem {
                    location: location.clone(),
                    item: Item::new(object.clone(), state.clone()).with_description(description.clone()),
                };
                world.apply_updates(&[update], &self.id).changed > 0
            }
            Directive::CreateAmbientEvent {
                description,
                location,
            } => match location {
                Some(location) if !world.has_location(location) => {
                    warn!(location = %location, "director named unknown location");
                    false
                }
                Some(location) => {
                    world.record_event(
                        description.clone(),
                        Some(location.clone()),
                        EventScope::Local,
                        self.id.clone(),
                    );
                    true
                }
                None => {
                    world.record_event(description.clone(), None, EventScope::Global, self.id.clone());
                    true
                }
            },
        }
    }

    fn remember(&mut self, line: String) {
        if self.memory_limit == 0 {
            return;
        }
        while self.memory.len() >= self.memory_limit {
            self.memory.pop_front();
        }
        self.memory.push_back(line);
    }
}

impl Observer for Director {
    fn id(&self) -> &EntityId {
        &self.id
    }

    fn current_location<'a>(&self, _positions: &'a Positions) -> Option<&'a LocationId> {
        None
    }

    fn perceive(&mut self, event: &Event) -> Result<(), PerceiveError> {
        self.remember(format!(
            "[step {}] {} (by {})",
            event.step, event.description, event.triggered_by
        ));
        Ok(())
    }
}
