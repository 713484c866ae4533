//! Whole-step scenarios: configuration in, events and positions out.

// Integration tests use unwrap extensively for clarity -- panicking on
// failure is the correct behavior in test code.
#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::collections::VecDeque;

use fable_core::config::SimulationConfig;
use fable_core::director::ScriptedDirector;
use fable_core::entity::ScriptedIntents;
use fable_core::interpreter::{IntentInterpreter, InterpretRequest, InterpreterError, KeywordInterpreter};
use fable_core::retry::ThreadSleeper;
use fable_core::runner::{NoOpCallback, SimulationEndReason, StopFlag, run_simulation};
use fable_core::step::{Collaborators, Simulation, StepSummary};
use fable_types::{ActionType, EntityId, EventScope, LocationId, StateUpdate};

const COTTAGE: &str = r"
world:
  seed: 11
  initial_weather: Overcast
retry:
  max_attempts: 2
  initial_backoff_ms: 0
  max_backoff_ms: 0
entities:
  - id: Alice
    start_location: Cottage
    intents: [unlock the Door]
  - id: Bob
    start_location: Garden
locations:
  Cottage:
    description: A small cottage.
    exits: [Garden]
    properties:
      contains:
        - object: Door
          state: locked
          linked_to: { location: Garden, object_key: Door }
  Garden:
    exits: [Cottage]
    properties:
      contains:
        - object: Door
          state: locked
          linked_to: { location: Cottage, object_key: Door }
  Market: {}
";

/// Replays fixed interpreter responses, then reports permanent failure.
struct Canned(VecDeque<String>);

impl Canned {
    fn new(lines: &[&str]) -> Self {
        Self(lines.iter().map(|l| (*l).to_owned()).collect())
    }
}

impl IntentInterpreter for Canned {
    fn interpret(&mut self, _request: &InterpretRequest<'_>) -> Result<String, InterpreterError> {
        self.0.pop_front().ok_or_else(|| InterpreterError::Failed {
            message: "no more responses".to_owned(),
        })
    }
}

fn config(yaml: &str) -> SimulationConfig {
    SimulationConfig::parse(yaml).unwrap()
}

fn step_with(
    simulation: &mut Simulation,
    intents: &mut ScriptedIntents,
    interpreter: &mut dyn IntentInterpreter,
    director: &mut ScriptedDirector,
) -> StepSummary {
    let mut collaborators = Collaborators {
        intents,
        interpreter,
        director,
        sleeper: &ThreadSleeper,
    };
    simulation.run_step(&mut collaborators)
}

fn memory_of(simulation: &Simulation, name: &str) -> Vec<String> {
    simulation
        .entity(&EntityId::new(name))
        .unwrap()
        .memory()
        .map(str::to_owned)
        .collect()
}

#[test]
fn unlocking_a_linked_door_reaches_the_other_side() {
    let config = config(COTTAGE);
    let mut simulation = Simulation::from_config(&config).unwrap();
    let mut intents = ScriptedIntents::from_config(&config.entities);
    let mut interpreter = KeywordInterpreter::new().unwrap();
    let mut director = ScriptedDirector::idle();

    let summary = step_with(&mut simulation, &mut intents, &mut interpreter, &mut director);

    let alice = &summary.outcomes[&EntityId::new("Alice")];
    assert!(alice.success);
    assert_eq!(alice.action_type, ActionType::Interact);

    let world = simulation.world();
    assert_eq!(world.item(&LocationId::new("Cottage"), "Door").unwrap().state, "unlocked");
    assert_eq!(world.item(&LocationId::new("Garden"), "Door").unwrap().state, "unlocked");

    let bob = memory_of(&simulation, "Bob");
    assert!(bob.iter().any(|m| m.ends_with(
        "The Door in Garden is now 'unlocked', linked to a change made by Alice."
    )));
    assert!(!bob.iter().any(|m| m.contains("Alice unlocks the Door.")));

    let alice_memory = memory_of(&simulation, "Alice");
    assert!(alice_memory.iter().any(|m| m.ends_with("Alice unlocks the Door.")));
}

#[test]
fn unreachable_market_is_downgraded() {
    let config = config(COTTAGE);
    let mut simulation = Simulation::from_config(&config).unwrap();
    let mut intents = ScriptedIntents::new();
    let mut interpreter = Canned::new(&[
        "SUCCESS | MOVE | destination: Market | X walks to Market",
        "SUCCESS | MOVE | destination: Market | X walks to Market",
    ]);
    let mut director = ScriptedDirector::idle();

    let summary = step_with(&mut simulation, &mut intents, &mut interpreter, &mut director);

    for outcome in summary.outcomes.values() {
        assert!(!outcome.success);
        assert!(
            !outcome
                .updates
                .iter()
                .any(|u| matches!(u, StateUpdate::MoveAgent { .. }))
        );
    }
    let world = simulation.world();
    assert_eq!(world.position_of(&EntityId::new("Alice")), Some(&LocationId::new("Cottage")));
    assert_eq!(world.position_of(&EntityId::new("Bob")), Some(&LocationId::new("Garden")));
    assert!(world.agents_at(&LocationId::new("Market")).is_empty());
}

#[test]
fn malformed_response_is_a_fail_not_an_error() {
    let config = config(COTTAGE);
    let mut simulation = Simulation::from_config(&config).unwrap();
    let mut intents = ScriptedIntents::new();
    let mut interpreter = Canned::new(&["SUCCESS | MOVE", "a | b | c | d | e"]);
    let mut director = ScriptedDirector::idle();

    let summary = step_with(&mut simulation, &mut intents, &mut interpreter, &mut director);

    assert_eq!(summary.outcomes.len(), 2);
    for outcome in summary.outcomes.values() {
        assert!(!outcome.success);
        assert_eq!(outcome.action_type, ActionType::Fail);
    }
}

#[test]
fn move_records_depart_and_arrive_for_both_sides() {
    let config = config(COTTAGE);
    let mut simulation = Simulation::from_config(&config).unwrap();
    let mut intents = ScriptedIntents::new();
    intents.push(&EntityId::new("Alice"), "walk to the Garden");
    let mut interpreter = KeywordInterpreter::new().unwrap();
    let mut director = ScriptedDirector::idle();

    step_with(&mut simulation, &mut intents, &mut interpreter, &mut director);

    let world = simulation.world();
    assert_eq!(world.position_of(&EntityId::new("Alice")), Some(&LocationId::new("Garden")));
    let moves: Vec<&str> = world
        .events()
        .events_by(&EntityId::new("Alice"))
        .into_iter()
        .filter(|e| e.scope == EventScope::Local && e.step == 1)
        .map(|e| e.description.as_str())
        .collect();
    assert_eq!(
        moves,
        vec!["Alice departs from the Cottage.", "Alice arrives at the Garden."]
    );
    assert!(memory_of(&simulation, "Bob").iter().any(|m| m.ends_with("Alice arrives at the Garden.")));
}

#[test]
fn unavailable_interpreter_logs_a_system_error_nobody_perceives() {
    let config = config(COTTAGE);
    let mut simulation = Simulation::from_config(&config).unwrap();
    let mut intents = ScriptedIntents::new();
    let mut interpreter = Canned::new(&[]);
    let mut director = ScriptedDirector::idle();

    step_with(&mut simulation, &mut intents, &mut interpreter, &mut director);

    let errors: Vec<_> = simulation
        .world()
        .events()
        .iter()
        .filter(|e| e.scope == EventScope::SystemError)
        .collect();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| e.triggered_by == EntityId::system()));
    assert!(
        errors
            .iter()
            .any(|e| e.description == "System error resolving Alice's action for intent: wait.")
    );
    for name in ["Alice", "Bob"] {
        assert!(!memory_of(&simulation, name).iter().any(|m| m.contains("System error")));
    }
}

#[test]
fn last_actor_never_opens_the_next_step() {
    let yaml = r"
world:
  seed: 5
entities:
  - { id: Alice, start_location: Square }
  - { id: Bob, start_location: Square }
  - { id: Carol, start_location: Square }
locations:
  Square: {}
";
    let config = config(yaml);
    let mut simulation = Simulation::from_config(&config).unwrap();
    let mut intents = ScriptedIntents::new();
    let mut interpreter = KeywordInterpreter::new().unwrap();
    let mut director = ScriptedDirector::idle();

    let mut previous_last: Option<EntityId> = None;
    for _ in 0..40 {
        let summary = step_with(&mut simulation, &mut intents, &mut interpreter, &mut director);
        assert_eq!(summary.order.len(), 3);
        if let Some(last) = &previous_last {
            assert_ne!(summary.order.first(), Some(last));
        }
        assert_eq!(summary.last_actor.as_ref(), summary.order.last());
        previous_last = summary.last_actor;
    }
}

#[test]
fn director_interventions_flow_through_the_same_pipeline() {
    let yaml = format!(
        "{COTTAGE}director:\n  per_turn: true\n  directives:\n    - \"CHANGE_WEATHER: light rain\"\n    - \"ADD_OBJECT: object: Lantern, state: unlit, description: a brass lantern, location: Cottage\"\n    - \"ADD_OBJECT: object: Lantern, state: lit, description: a second lantern, location: Cottage\"\n    - \"CREATE_AMBIENT_EVENT: description: An owl hoots, location: Garden\"\n"
    );
    let config = config(&yaml);
    let mut simulation = Simulation::from_config(&config).unwrap();
    let mut intents = ScriptedIntents::new();
    let mut interpreter = KeywordInterpreter::new().unwrap();
    let mut director = ScriptedDirector::new(config.director.directives.clone());

    let first = step_with(&mut simulation, &mut intents, &mut interpreter, &mut director);
    assert_eq!(first.director_actions, 2);
    let second = step_with(&mut simulation, &mut intents, &mut interpreter, &mut director);
    assert_eq!(second.director_actions, 1);

    let world = simulation.world();
    assert_eq!(world.weather(), "Light Rain");
    let cottage = world.items_at(&LocationId::new("Cottage"));
    assert_eq!(cottage.iter().filter(|i| i.object == "Lantern").count(), 1);

    for name in ["Alice", "Bob"] {
        assert!(
            memory_of(&simulation, name)
                .iter()
                .any(|m| m.ends_with("The weather changes from Overcast to Light Rain."))
        );
    }
    assert!(memory_of(&simulation, "Bob").iter().any(|m| m.ends_with("An owl hoots")));
    assert!(!memory_of(&simulation, "Alice").iter().any(|m| m.ends_with("An owl hoots")));
    assert!(
        memory_of(&simulation, "Alice")
            .iter()
            .any(|m| m.contains("'Lantern' (described as: a brass lantern, state: unlit) appears in Cottage."))
    );

    let director_memory: Vec<&str> = simulation.director().unwrap().memory().collect();
    assert_eq!(
        director_memory.iter().filter(|m| m.contains("The weather changes")).count(),
        1
    );
    assert!(director_memory.contains(&"[step 1] Action Succeeded: Enacted 'CHANGE_WEATHER: Light Rain'."));
    assert!(director_memory.iter().any(|m| m.ends_with(
        "Action Failed: Attempted 'ADD_OBJECT: object: Lantern, state: lit, description: a second lantern, location: Cottage', but it could not be applied."
    )));
    assert!(!director_memory.iter().any(|m| m.ends_with("An owl hoots (by Director)")));
}

#[test]
fn runner_stops_at_configured_steps_and_log_stays_bounded() {
    let config = config(COTTAGE);
    let mut simulation = Simulation::from_config(&config).unwrap();
    let mut intents = ScriptedIntents::new();
    let mut interpreter = KeywordInterpreter::new().unwrap();
    let mut director = ScriptedDirector::idle();
    let mut collaborators = Collaborators {
        intents: &mut intents,
        interpreter: &mut interpreter,
        director: &mut director,
        sleeper: &ThreadSleeper,
    };

    let result = run_simulation(
        &mut simulation,
        &mut collaborators,
        25,
        &StopFlag::new(),
        &mut NoOpCallback,
    );
    assert_eq!(result.end_reason, SimulationEndReason::MaxStepsReached);
    assert_eq!(result.total_steps, 25);
    assert_eq!(simulation.world().step(), 25);
    assert!(simulation.world().events().len() <= 30);

    let steps: Vec<u64> = simulation.world().events().iter().map(|e| e.step).collect();
    assert!(steps.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn events_export_as_json_lines() {
    let config = config(COTTAGE);
    let mut simulation = Simulation::from_config(&config).unwrap();
    let mut intents = ScriptedIntents::from_config(&config.entities);
    let mut interpreter = KeywordInterpreter::new().unwrap();
    let mut director = ScriptedDirector::idle();
    step_with(&mut simulation, &mut intents, &mut interpreter, &mut director);

    let lines: Vec<String> = simulation
        .world()
        .events()
        .iter()
        .map(|e| serde_json::to_string(e).unwrap())
        .collect();
    assert!(lines.iter().any(|l| l.contains("\"scope\":\"action_outcome\"")));
    let value: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(value["triggered_by"], "Alice");
}
