//! Scoped event delivery.
//!
//! [`dispatch`] decides who perceives an event from its scope and the
//! position map:
//!
//! - `global` events reach every registered observer.
//! - `local` and `action_outcome` events reach observers positioned at the
//!   event's location, including the entity that triggered it.
//! - `system_error` events are recorded only and reach nobody.
//!
//! Each observer's `perceive` call is independent: a failure is logged and
//! skipped without blocking delivery to the rest.

use std::collections::BTreeMap;

use fable_types::{EntityId, Event, EventScope, LocationId};
use tracing::{debug, warn};

use crate::error::PerceiveError;

/// Entity id to current location id.
pub type Positions = BTreeMap<EntityId, LocationId>;

/// Anything that can receive events: agents and the director.
pub trait Observer {
    /// The observer's entity id.
    fn id(&self) -> &EntityId;

    /// Where the observer currently is.
    ///
    /// The default looks the observer up in the position map. Observers
    /// without a body (the director) override this to return `None`.
    fn current_location<'a>(&self, positions: &'a Positions) -> Option<&'a LocationId> {
        positions.get(self.id())
    }

    /// Receive an event.
    ///
    /// # Errors
    ///
    /// Returns [`PerceiveError`] if the observer cannot take the event.
    /// The dispatcher logs and skips such observers.
    fn perceive(&mut self, event: &Event) -> Result<(), PerceiveError>;
}

/// Whether an observer at `location` should perceive `event`.
pub fn should_perceive(event: &Event, location: Option<&LocationId>) -> bool {
    match event.scope {
        EventScope::Global => true,
        EventScope::Local | EventScope::ActionOutcome => {
            location.is_some() && event.location.as_ref() == location
        }
        EventScope::SystemError => false,
    }
}

/// Deliver `event` to every observer whose visibility rules admit it.
///
/// Returns the ids of observers that actually perceived the event, in the
/// order they were offered it.
pub fn dispatch(
    event: &Event,
    observers: &mut [&mut dyn Observer],
    positions: &Positions,
) -> Vec<EntityId> {
    let mut notified = Vec::new();

    for observer in observers.iter_mut() {
        let location = observer.current_location(positions);
        if !should_perceive(event, location) {
            continue;
        }

        match observer.perceive(event) {
            Ok(()) => notified.push(observer.id().clone()),
            Err(e) => {
                warn!(
                    observer = %observer.id(),
                    event_id = %event.id,
                    error = %e,
                    "observer failed to perceive event, skipping"
                );
            }
        }
    }

    debug!(
        event_id = %event.id,
        scope = %event.scope,
        location = event.location.as_ref().map_or("-", LocationId::as_str),
        recipients = notified.len(),
        "event dispatched"
    );

    notified
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        id: EntityId,
        seen: Vec<String>,
        fail: bool,
    }

    impl Recorder {
        fn new(name: &str) -> Self {
            Self {
                id: EntityId::new(name),
                seen: Vec::new(),
                fail: false,
            }
        }
    }

    impl Observer for Recorder {
        fn id(&self) -> &EntityId {
            &self.id
        }

        fn perceive(&mut self, event: &Event) -> Result<(), PerceiveError> {
            if self.fail {
                return Err(PerceiveError::Rejected {
                    observer: self.id.clone(),
                    reason: "inbox closed".to_owned(),
                });
            }
            self.seen.push(event.description.clone());
            Ok(())
        }
    }

    struct Disembodied {
        id: EntityId,
        count: usize,
    }

    impl Observer for Disembodied {
        fn id(&self) -> &EntityId {
            &self.id
        }

        fn current_location<'a>(&self, _positions: &'a Positions) -> Option<&'a LocationId> {
            None
        }

        fn perceive(&mut self, _event: &Event) -> Result<(), PerceiveError> {
            self.count = self.count.saturating_add(1);
            Ok(())
        }
    }

    fn positions() -> Positions {
        BTreeMap::from([
            (EntityId::new("Alice"), LocationId::new("Park")),
            (EntityId::new("Bob"), LocationId::new("Park")),
            (EntityId::new("Carol"), LocationId::new("Library")),
        ])
    }

    fn event(scope: EventScope, location: Option<&str>) -> Event {
        Event::new(
            "something happens",
            location.map(LocationId::new),
            scope,
            1,
            EntityId::new("Alice"),
        )
    }

    #[test]
    fn global_reaches_everyone_once() {
        let mut alice = Recorder::new("Alice");
        let mut bob = Recorder::new("Bob");
        let mut carol = Recorder::new("Carol");
        let mut director = Disembodied {
            id: EntityId::new("Director"),
            count: 0,
        };
        let notified = dispatch(
            &event(EventScope::Global, None),
            &mut [&mut alice, &mut bob, &mut carol, &mut director],
            &positions(),
        );
        assert_eq!(notified.len(), 4);
        assert_eq!(alice.seen.len(), 1);
        assert_eq!(bob.seen.len(), 1);
        assert_eq!(carol.seen.len(), 1);
        assert_eq!(director.count, 1);
    }

    #[test]
    fn local_reaches_only_colocated_observers() {
        let mut alice = Recorder::new("Alice");
        let mut bob = Recorder::new("Bob");
        let mut carol = Recorder::new("Carol");
        let mut director = Disembodied {
            id: EntityId::new("Director"),
            count: 0,
        };
        let notified = dispatch(
            &event(EventScope::Local, Some("Park")),
            &mut [&mut alice, &mut bob, &mut carol, &mut director],
            &positions(),
        );
        assert_eq!(notified, vec![EntityId::new("Alice"), EntityId::new("Bob")]);
        assert!(carol.seen.is_empty());
        assert_eq!(director.count, 0);
    }

    #[test]
    fn action_outcome_is_delivered_to_its_trigger() {
        let mut alice = Recorder::new("Alice");
        let notified = dispatch(
            &event(EventScope::ActionOutcome, Some("Park")),
            &mut [&mut alice],
            &positions(),
        );
        assert_eq!(notified, vec![EntityId::new("Alice")]);
    }

    #[test]
    fn failing_observer_is_skipped() {
        let mut alice = Recorder::new("Alice");
        alice.fail = true;
        let mut bob = Recorder::new("Bob");
        let notified = dispatch(
            &event(EventScope::Local, Some("Park")),
            &mut [&mut alice, &mut bob],
            &positions(),
        );
        assert_eq!(notified, vec![EntityId::new("Bob")]);
        assert_eq!(bob.seen.len(), 1);
    }

    #[test]
    fn system_errors_reach_nobody() {
        let mut alice = Recorder::new("Alice");
        let notified = dispatch(
            &event(EventScope::SystemError, Some("Park")),
            &mut [&mut alice],
            &positions(),
        );
        assert!(notified.is_empty());
    }

    #[test]
    fn unpositioned_observer_misses_local_events() {
        let mut dave = Recorder::new("Dave");
        let notified = dispatch(
            &event(EventScope::Local, Some("Park")),
            &mut [&mut dave],
            &positions(),
        );
        assert!(notified.is_empty());
    }
}
