//! End-to-end World Model scenarios built from a YAML location map.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use fable_types::{EntityId, EventScope, LocationId, StateUpdate};
use fable_world::{LocationDef, WorldState};

const MAP: &str = r"
Cottage:
  description: A small cottage with a creaking floor.
  exits: [Garden]
  properties:
    contains:
      - object: Door
        state: locked
        optional_description: a heavy oak door
        linked_to: { location: Garden, object_key: Door }
Garden:
  exits: [Cottage, Orchard]
  properties:
    contains:
      - object: Door
        state: locked
        linked_to: { location: Cottage, object_key: Door }
";

fn world() -> WorldState {
    let defs: BTreeMap<LocationId, LocationDef> = serde_yml::from_str(MAP).unwrap();
    WorldState::initialize(&defs, 15)
}

#[test]
fn undefined_exit_becomes_placeholder_and_missing_description_defaults() {
    let world = world();
    let orchard = world.location(&LocationId::new("Orchard")).unwrap();
    assert!(orchard.placeholder);
    let garden = world.location(&LocationId::new("Garden")).unwrap();
    assert_eq!(garden.description, "An undescribed location.");
}

#[test]
fn doors_stay_mirrored_both_ways() {
    let mut world = world();
    let alice = EntityId::new("Alice");
    world
        .set_item_state(&LocationId::new("Garden"), "Door", "unlocked", &alice)
        .unwrap();
    assert_eq!(
        world.item(&LocationId::new("Cottage"), "Door").unwrap().state,
        "unlocked"
    );

    world
        .set_item_state(&LocationId::new("Cottage"), "Door", "open", &alice)
        .unwrap();
    assert_eq!(world.item(&LocationId::new("Garden"), "Door").unwrap().state, "open");
}

#[test]
fn batch_move_records_depart_then_arrive() {
    let mut world = world();
    let alice = EntityId::new("Alice");
    world.move_agent(&alice, &LocationId::new("Cottage")).unwrap();
    world.drain_undispatched();
    world.advance_step();

    let report = world.apply_updates(
        &[StateUpdate::MoveAgent {
            entity: alice.clone(),
            to: LocationId::new("Garden"),
        }],
        &alice,
    );
    assert_eq!(report.changed, 1);

    let events = world.drain_undispatched();
    let described: Vec<(&str, Option<&str>)> = events
        .iter()
        .map(|e| (e.description.as_str(), e.location.as_ref().map(LocationId::as_str)))
        .collect();
    assert_eq!(
        described,
        vec![
            ("Alice departs from the Cottage.", Some("Cottage")),
            ("Alice arrives at the Garden.", Some("Garden")),
        ]
    );
    assert!(events.iter().all(|e| e.scope == EventScope::Local && e.step == 1));
    assert_eq!(world.agents_at(&LocationId::new("Garden")), vec![alice]);
}

#[test]
fn event_log_stays_bounded() {
    let mut world = world();
    for n in 0..100 {
        world.set_weather(&format!("Weather {n}"), &EntityId::system());
    }
    assert_eq!(world.events().len(), 30);
    assert_eq!(
        world.events().iter().last().unwrap().description,
        "The weather changes from Weather 98 to Weather 99."
    );
}
