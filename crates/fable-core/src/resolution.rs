//! Action resolution: free-form intent in, validated [`Outcome`] out.
//!
//! The coordinator asks an [`IntentInterpreter`] for a proposal, parses it,
//! and then re-checks the proposal against the World Model regardless of
//! what the interpreter claimed. Nothing here mutates the world; the
//! returned outcome carries the [`StateUpdate`]s for the caller to apply.
//!
//! Resolution never fails. Malformed proposals, validation failures, and an
//! unreachable interpreter all become failed outcomes, tagged with a
//! [`ResolutionStatus`] so the step driver can tell them apart.

use fable_types::{ActionType, EntityId, LocationId, Outcome, StateUpdate};
use fable_world::WorldState;
use tracing::{debug, warn};

use crate::interpreter::{IntentInterpreter, InterpretRequest, InterpreterError};
use crate::parse::{self, ProposedOutcome};
use crate::retry::{RetryPolicy, Sleeper};

/// How an outcome came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStatus {
    /// The proposal survived validation unchanged (it may still be a
    /// failure the interpreter reported itself).
    Resolved,
    /// The proposal claimed success but failed validation.
    Downgraded,
    /// The interpreter's response could not be parsed.
    Malformed,
    /// The interpreter could not be reached after retries.
    Unavailable,
}

/// A resolved turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The validated outcome.
    pub outcome: Outcome,
    /// How the outcome came about.
    pub status: ResolutionStatus,
}

impl Resolution {
    const fn new(outcome: Outcome, status: ResolutionStatus) -> Self {
        Self { outcome, status }
    }
}

/// One turn to resolve.
#[derive(Debug, Clone, Copy)]
pub struct TurnRequest<'a> {
    /// The acting entity.
    pub entity: &'a EntityId,
    /// Where the entity stands when it acts.
    pub location: &'a LocationId,
    /// The entity's free-form intent.
    pub intent: &'a str,
}

/// Turns intents into validated outcomes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Coordinator {
    retry: RetryPolicy,
}

impl Coordinator {
    /// Create a coordinator that retries transient interpreter failures
    /// according to `retry`.
    pub const fn new(retry: RetryPolicy) -> Self {
        Self { retry }
    }

    /// The retry policy in use.
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Resolve one turn.
    pub fn resolve(
        &self,
        world: &WorldState,
        interpreter: &mut dyn IntentInterpreter,
        sleeper: &dyn Sleeper,
        turn: TurnRequest<'_>,
    ) -> Resolution {
        let context = world.static_context(turn.entity);
        let request = InterpretRequest {
            entity: turn.entity,
            location: turn.location,
            intent: turn.intent,
            context: &context,
        };

        let response = self.retry.run(
            sleeper,
            |_| interpreter.interpret(&request),
            InterpreterError::is_transient,
        );
        let raw = match response {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    entity = %turn.entity,
                    intent = turn.intent,
                    error = %e,
                    "interpreter unavailable, turn fails"
                );
                let outcome = Outcome::failure(
                    ActionType::Fail,
                    format!("{} is lost in thought and does nothing.", turn.entity),
                );
                return Resolution::new(outcome, ResolutionStatus::Unavailable);
            }
        };

        match parse::parse_response(&raw) {
            Ok(proposal) => validate(world, turn, proposal),
            Err(failure) => {
                warn!(
                    entity = %turn.entity,
                    response = %raw,
                    error = %failure,
                    "malformed interpreter response"
                );
                let outcome = Outcome::failure(
                    failure.fallback_action(),
                    format!(
                        "{} tries to {}, but nothing comes of it.",
                        turn.entity,
                        turn.intent.trim()
                    ),
                );
                Resolution::new(outcome, ResolutionStatus::Malformed)
            }
        }
    }
}

/// Re-check a parsed proposal against the world and attach its updates.
pub fn validate(world: &WorldState, turn: TurnRequest<'_>, proposal: ProposedOutcome) -> Resolution {
    let mut outcome = Outcome {
        success: proposal.success,
        action_type: proposal.action_type,
        parameters: proposal.parameters,
        outcome_description: proposal.description,
        updates: Vec::new(),
    };

    if !outcome.success {
        return Resolution::new(outcome, ResolutionStatus::Resolved);
    }

    let entity = turn.entity;
    let location = turn.location;

    let rejection = match outcome.action_type {
        ActionType::Move => validate_move(world, entity, location, &mut outcome),
        ActionType::Interact => validate_interact(world, entity, location, &mut outcome),
        ActionType::Speak => validate_speak(world, entity, location, &outcome),
        ActionType::Observe | ActionType::Wait => None,
        ActionType::Fail | ActionType::Unknown => Some(outcome.outcome_description.clone()),
    };

    match rejection {
        None => Resolution::new(outcome, ResolutionStatus::Resolved),
        Some(narration) => {
            debug!(
                entity = %entity,
                action = outcome.action_type.keyword(),
                narration = %narration,
                "proposal downgraded"
            );
            outcome.downgrade(narration);
            Resolution::new(outcome, ResolutionStatus::Downgraded)
        }
    }
}

// ---------------------------------------------------------------------------
// Per-action checks. Each returns the failure narration on rejection.
// ---------------------------------------------------------------------------

fn validate_move(
    world: &WorldState,
    entity: &EntityId,
    location: &LocationId,
    outcome: &mut Outcome,
) -> Option<String> {
    let Some(destination) = outcome.parameters.get("destination").cloned() else {
        return Some(format!("{entity} wants to go somewhere, but cannot decide where."));
    };

    if let Some(exit) = world
        .reachable(location)
        .into_iter()
        .find(|exit| exit.as_str().eq_ignore_ascii_case(&destination))
    {
        outcome
            .parameters
            .insert("destination".to_owned(), exit.as_str().to_owned());
        outcome.updates.push(StateUpdate::MoveAgent {
            entity: entity.clone(),
            to: exit,
        });
        return None;
    }

    // Moving to an item here is approaching it, not leaving the location.
    if find_item(world, location, &destination).is_some() {
        return None;
    }

    warn!(
        entity = %entity,
        from = %location,
        destination = %destination,
        "move to unreachable destination rejected"
    );
    Some(format!(
        "{entity} tries to go to {destination}, but there is no way there from the {location}."
    ))
}

fn validate_interact(
    world: &WorldState,
    entity: &EntityId,
    location: &LocationId,
    outcome: &mut Outcome,
) -> Option<String> {
    let Some(object) = outcome.parameters.get("object").cloned() else {
        return Some(format!("{entity} reaches for something that is not there."));
    };
    let Some(item) = find_item(world, location, &object) else {
        return Some(format!("{entity} looks for the {object}, but there is none here."));
    };
    let Some(state) = outcome.parameters.get("state").cloned() else {
        return Some(format!("{entity} fiddles with the {item}, but nothing changes."));
    };

    outcome.parameters.insert("object".to_owned(), item.clone());
    outcome.updates.push(StateUpdate::SetItemState {
        location: location.clone(),
        item,
        state,
    });
    None
}

fn validate_speak(
    world: &WorldState,
    entity: &EntityId,
    location: &LocationId,
    outcome: &Outcome,
) -> Option<String> {
    let target = outcome.parameters.get("target")?;
    let present = world
        .agents_at(location)
        .iter()
        .any(|agent| agent.as_str().eq_ignore_ascii_case(target));
    if present {
        None
    } else {
        Some(format!("{entity} speaks to {target}, but {target} is not here to hear it."))
    }
}

/// Case-insensitive item lookup returning the canonical item name.
fn find_item(world: &WorldState, location: &LocationId, name: &str) -> Option<String> {
    world
        .items_at(location)
        .iter()
        .find(|item| item.object.eq_ignore_ascii_case(name))
        .map(|item| item.object.clone())
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, VecDeque};
    use std::time::Duration;

    use fable_types::Item;
    use fable_world::LocationDef;

    use super::*;

    struct NoSleep;

    impl Sleeper for NoSleep {
        fn sleep(&self, _duration: Duration) {}
    }

    /// Replays canned interpreter results.
    struct Canned(VecDeque<Result<String, InterpreterError>>);

    impl IntentInterpreter for Canned {
        fn interpret(&mut self, _request: &InterpretRequest<'_>) -> Result<String, InterpreterError> {
            self.0.pop_front().unwrap_or_else(|| {
                Err(InterpreterError::Failed {
                    message: "script exhausted".to_owned(),
                })
            })
        }
    }

    fn canned(lines: &[&str]) -> Canned {
        Canned(lines.iter().map(|l| Ok((*l).to_owned())).collect())
    }

    fn world() -> WorldState {
        let mut defs = BTreeMap::new();
        defs.insert(
            LocationId::new("Park"),
            LocationDef {
                exits: vec![LocationId::new("Library")],
                ..LocationDef::default()
            },
        );
        let mut library = LocationDef::default();
        library.properties.contains.push(Item::new("Bookshelf", "dusty"));
        library.exits.push(LocationId::new("Park"));
        defs.insert(LocationId::new("Library"), library);
        defs.insert(LocationId::new("Market"), LocationDef::default());

        let mut world = WorldState::initialize(&defs, 15);
        let _ = world.move_agent(&EntityId::new("Alice"), &LocationId::new("Park"));
        let _ = world.move_agent(&EntityId::new("Bob"), &LocationId::new("Park"));
        world
    }

    fn resolve(world: &WorldState, at: &str, interpreter: &mut dyn IntentInterpreter) -> Resolution {
        let entity = EntityId::new("Alice");
        let location = LocationId::new(at);
        Coordinator::new(RetryPolicy::no_retry()).resolve(
            world,
            interpreter,
            &NoSleep,
            TurnRequest {
                entity: &entity,
                location: &location,
                intent: "do something",
            },
        )
    }

    #[test]
    fn reachable_move_yields_update_with_canonical_name() {
        let world = world();
        let resolution = resolve(
            &world,
            "Park",
            &mut canned(&["SUCCESS | MOVE | destination: library | Alice strolls over"]),
        );
        assert_eq!(resolution.status, ResolutionStatus::Resolved);
        assert!(resolution.outcome.success);
        assert_eq!(
            resolution.outcome.updates,
            vec![StateUpdate::MoveAgent {
                entity: EntityId::new("Alice"),
                to: LocationId::new("Library"),
            }]
        );
    }

    #[test]
    fn unreachable_move_is_downgraded() {
        let world = world();
        let resolution = resolve(
            &world,
            "Park",
            &mut canned(&["SUCCESS | MOVE | destination: Market | Alice walks to Market"]),
        );
        assert_eq!(resolution.status, ResolutionStatus::Downgraded);
        assert!(!resolution.outcome.success);
        assert!(resolution.outcome.updates.is_empty());
    }

    #[test]
    fn move_to_item_succeeds_without_update() {
        let world = world();
        let resolution = resolve(
            &world,
            "Library",
            &mut canned(&["SUCCESS | MOVE | destination: bookshelf | Alice steps up to the shelf"]),
        );
        assert!(resolution.outcome.success);
        assert!(resolution.outcome.updates.is_empty());
    }

    #[test]
    fn interact_with_missing_object_fails() {
        let world = world();
        let resolution = resolve(
            &world,
            "Park",
            &mut canned(&["SUCCESS | INTERACT | object: Bookshelf, state: tidy | Alice tidies up"]),
        );
        assert!(!resolution.outcome.success);
        assert!(resolution.outcome.updates.is_empty());
    }

    #[test]
    fn interact_yields_item_state_update() {
        let world = world();
        let resolution = resolve(
            &world,
            "Library",
            &mut canned(&["SUCCESS | INTERACT | object: bookshelf, state: tidy | Alice tidies up"]),
        );
        assert!(resolution.outcome.success);
        assert_eq!(
            resolution.outcome.updates,
            vec![StateUpdate::SetItemState {
                location: LocationId::new("Library"),
                item: "Bookshelf".to_owned(),
                state: "tidy".to_owned(),
            }]
        );
    }

    #[test]
    fn speaking_to_an_absent_agent_fails() {
        let world = world();
        let mut interpreter = canned(&[
            "SUCCESS | SPEAK | target: Bob, message: hi, there | Alice greets Bob",
            "SUCCESS | SPEAK | target: Carol, message: hello | Alice greets Carol",
        ]);
        let present = resolve(&world, "Park", &mut interpreter);
        assert!(present.outcome.success);
        let absent = resolve(&world, "Park", &mut interpreter);
        assert!(!absent.outcome.success);
        assert!(absent.outcome.outcome_description.contains("not here to hear it"));
    }

    #[test]
    fn malformed_response_becomes_fail() {
        let world = world();
        let resolution = resolve(&world, "Park", &mut canned(&["I think Alice goes for a walk"]));
        assert_eq!(resolution.status, ResolutionStatus::Malformed);
        assert!(!resolution.outcome.success);
        assert_eq!(resolution.outcome.action_type, ActionType::Fail);
    }

    #[test]
    fn claimed_failure_is_kept() {
        let world = world();
        let resolution = resolve(
            &world,
            "Park",
            &mut canned(&["FAILURE | MOVE | destination: Library | Alice trips over a root"]),
        );
        assert_eq!(resolution.status, ResolutionStatus::Resolved);
        assert!(!resolution.outcome.success);
        assert_eq!(resolution.outcome.outcome_description, "Alice trips over a root");
    }

    #[test]
    fn unknown_action_cannot_succeed() {
        let world = world();
        let resolution = resolve(
            &world,
            "Park",
            &mut canned(&["SUCCESS | UNKNOWN | reason: ? | Alice does a thing"]),
        );
        assert!(!resolution.outcome.success);
    }

    #[test]
    fn exhausted_interpreter_is_retried_then_unavailable() {
        let world = world();
        let mut interpreter = Canned(
            (0..3)
                .map(|_| {
                    Err(InterpreterError::Exhausted {
                        message: "quota".to_owned(),
                    })
                })
                .collect(),
        );
        let entity = EntityId::new("Alice");
        let location = LocationId::new("Park");
        let coordinator = Coordinator::new(RetryPolicy {
            max_attempts: 3,
            initial_backoff_ms: 1,
            max_backoff_ms: 1,
            multiplier: 1,
        });
        let resolution = coordinator.resolve(
            &world,
            &mut interpreter,
            &NoSleep,
            TurnRequest {
                entity: &entity,
                location: &location,
                intent: "wait",
            },
        );
        assert_eq!(resolution.status, ResolutionStatus::Unavailable);
        assert!(interpreter.0.is_empty());
    }
}
