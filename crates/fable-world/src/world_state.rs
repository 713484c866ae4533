//! The World Model: location topology, item states, positions, and the event log.
//!
//! [`WorldState`] is the single owner of mutable world data. Every mutation
//! that observers should hear about records an [`Event`] into the log and
//! into an undispatched outbox; the step driver drains the outbox after
//! applying a batch of updates and hands each event to the dispatcher.
//!
//! Linked items are kept in sync on the write path: setting an item's state
//! walks its `linked_to` chain and mirrors the new state onto each link.

use std::collections::{BTreeMap, BTreeSet};

use fable_events::{EventLog, Positions};
use fable_types::{EntityId, Event, EventScope, Item, ItemLink, LocationId, StateUpdate};
use tracing::{debug, info, warn};

use crate::config::LocationDef;
use crate::error::WorldError;
use crate::location::LocationState;

/// Weather before anyone changes it.
pub const DEFAULT_WEATHER: &str = "Clear";

/// Result of a [`WorldState::set_item_state`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStateChange {
    /// The item changed; `mirrored` lists every linked item that followed.
    Changed {
        /// Linked items updated in the same pass, in propagation order.
        mirrored: Vec<ItemLink>,
    },
    /// The item already had the requested state.
    Unchanged,
    /// No item with that name exists at the location.
    NotFound,
}

/// Counts from applying a batch of [`StateUpdate`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Updates that changed the world.
    pub changed: u32,
    /// Updates that were valid but changed nothing.
    pub unchanged: u32,
    /// Updates that failed and were skipped.
    pub failed: u32,
}

/// The authoritative world: locations, items, positions, weather, and events.
#[derive(Debug, Clone)]
pub struct WorldState {
    locations: BTreeMap<LocationId, LocationState>,
    positions: Positions,
    weather: String,
    step: u64,
    log: EventLog,
    outbox: Vec<Event>,
}

impl WorldState {
    /// Build the world graph from location definitions.
    ///
    /// Construction never fails on dangling references: an exit or a
    /// `linked_to` reference naming an undefined location gets an empty
    /// placeholder location and a warning, so the simulation keeps running.
    /// Structural validation (e.g. no locations at all) belongs to the
    /// configuration loader.
    pub fn initialize(defs: &BTreeMap<LocationId, LocationDef>, retention: usize) -> Self {
        let mut locations: BTreeMap<LocationId, LocationState> = defs
            .iter()
            .map(|(id, def)| (id.clone(), LocationState::from_def(id.clone(), def)))
            .collect();

        let mut dangling: BTreeSet<LocationId> = BTreeSet::new();
        for location in locations.values() {
            for exit in &location.exits {
                if !locations.contains_key(exit) {
                    warn!(
                        location = %location.id,
                        exit = %exit,
                        "exit references an undefined location, creating placeholder"
                    );
                    dangling.insert(exit.clone());
                }
            }
            for item in &location.contains {
                let Some(link) = &item.linked_to else {
                    continue;
                };
                match locations.get(&link.location) {
                    None => {
                        warn!(
                            location = %location.id,
                            item = %item.object,
                            linked_location = %link.location,
                            "linked item references an undefined location, creating placeholder"
                        );
                        dangling.insert(link.location.clone());
                    }
                    Some(target) if !target.has_item(&link.object_key) => {
                        warn!(
                            location = %location.id,
                            item = %item.object,
                            linked_location = %link.location,
                            linked_item = %link.object_key,
                            "linked item does not exist, mirror updates will be skipped"
                        );
                    }
                    Some(_) => {}
                }
            }
        }

        for id in dangling {
            locations.insert(id.clone(), LocationState::placeholder(id));
        }

        info!(
            location_count = locations.len(),
            retention = retention,
            "world initialized"
        );

        Self {
            locations,
            positions: Positions::new(),
            weather: DEFAULT_WEATHER.to_owned(),
            step: 0,
            log: EventLog::new(retention),
            outbox: Vec::new(),
        }
    }

    /// Replace the starting weather without emitting an event.
    #[must_use]
    pub fn with_weather(mut self, weather: impl Into<String>) -> Self {
        self.weather = weather.into();
        self
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// Whether `id` names a known location.
    pub fn has_location(&self, id: &LocationId) -> bool {
        self.locations.contains_key(id)
    }

    /// Look up a location.
    pub fn location(&self, id: &LocationId) -> Option<&LocationState> {
        self.locations.get(id)
    }

    /// Iterate over all locations in id order.
    pub fn locations(&self) -> impl Iterator<Item = &LocationState> {
        self.locations.values()
    }

    /// The exits of `location`; empty for unknown locations.
    pub fn reachable(&self, location: &LocationId) -> BTreeSet<LocationId> {
        self.locations
            .get(location)
            .map(|l| l.exits.clone())
            .unwrap_or_default()
    }

    /// Whether `to` is an exit of `from`.
    pub fn is_reachable(&self, from: &LocationId, to: &LocationId) -> bool {
        self.locations
            .get(from)
            .is_some_and(|l| l.exits.contains(to))
    }

    /// Entities currently at `location`, in id order.
    pub fn agents_at(&self, location: &LocationId) -> Vec<EntityId> {
        self.positions
            .iter()
            .filter(|(_, at)| *at == location)
            .map(|(entity, _)| entity.clone())
            .collect()
    }

    /// Where `entity` is.
    pub fn position_of(&self, entity: &EntityId) -> Option<&LocationId> {
        self.positions.get(entity)
    }

    /// Where `entity` is, or an error if it was never placed.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownEntity`] if `entity` has no position.
    pub fn require_position(&self, entity: &EntityId) -> Result<&LocationId, WorldError> {
        self.positions
            .get(entity)
            .ok_or_else(|| WorldError::UnknownEntity(entity.clone()))
    }

    /// The full position map.
    pub const fn positions(&self) -> &Positions {
        &self.positions
    }

    /// Look up an item by location and name.
    pub fn item(&self, location: &LocationId, name: &str) -> Option<&Item> {
        self.locations.get(location).and_then(|l| l.item(name))
    }

    /// Items at `location`; empty for unknown locations.
    pub fn items_at(&self, location: &LocationId) -> &[Item] {
        self.locations
            .get(location)
            .map(|l| l.contains.as_slice())
            .unwrap_or_default()
    }

    /// Read a free-form location property.
    pub fn location_property(&self, location: &LocationId, key: &str) -> Option<&serde_json::Value> {
        self.locations.get(location).and_then(|l| l.properties.get(key))
    }

    /// Current weather.
    pub fn weather(&self) -> &str {
        &self.weather
    }

    /// Current step number.
    pub const fn step(&self) -> u64 {
        self.step
    }

    /// The event log.
    pub const fn events(&self) -> &EventLog {
        &self.log
    }

    // -------------------------------------------------------------------
    // Steps and events
    // -------------------------------------------------------------------

    /// Advance to the next step and return its number.
    pub const fn advance_step(&mut self) -> u64 {
        self.step = self.step.saturating_add(1);
        self.step
    }

    /// Record an event at the current step.
    ///
    /// The event is appended to the log and queued for dispatch.
    pub fn record_event(
        &mut self,
        description: impl Into<String>,
        location: Option<LocationId>,
        scope: EventScope,
        triggered_by: EntityId,
    ) -> Event {
        let event = Event::new(description, location, scope, self.step, triggered_by);
        debug!(
            step = event.step,
            scope = %event.scope,
            location = event.location.as_ref().map_or("-", LocationId::as_str),
            triggered_by = %event.triggered_by,
            description = %event.description,
            "event logged"
        );
        self.log.log(event.clone());
        self.outbox.push(event.clone());
        event
    }

    /// Take every recorded event that has not been dispatched yet, oldest first.
    pub fn drain_undispatched(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.outbox)
    }

    // -------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------

    /// Place or move an entity.
    ///
    /// A first placement records one "appears" event. A move records a
    /// "departs" event at the old location and an "arrives" event at the new
    /// one. Moving to the current location changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownLocation`] if `to` is undefined; the
    /// position map is left untouched.
    pub fn move_agent(&mut self, entity: &EntityId, to: &LocationId) -> Result<(), WorldError> {
        if !self.locations.contains_key(to) {
            return Err(WorldError::UnknownLocation(to.clone()));
        }

        let previous = self.positions.insert(entity.clone(), to.clone());
        match previous {
            None => {
                self.record_event(
                    format!("{entity} appears in the {to}."),
                    Some(to.clone()),
                    EventScope::Local,
                    entity.clone(),
                );
            }
            Some(old) if &old == to => {}
            Some(old) => {
                self.record_event(
                    format!("{entity} departs from the {old}."),
                    Some(old),
                    EventScope::Local,
                    entity.clone(),
                );
                self.record_event(
                    format!("{entity} arrives at the {to}."),
                    Some(to.clone()),
                    EventScope::Local,
                    entity.clone(),
                );
            }
        }
        Ok(())
    }

    /// Set a free-form location property.
    ///
    /// Returns `true` if the stored value changed. An unknown location gets
    /// an empty placeholder and a warning, like dangling configuration
    /// references do.
    pub fn set_location_property(&mut self, location: &LocationId, key: &str, value: serde_json::Value) -> bool {
        let state = self.locations.entry(location.clone()).or_insert_with(|| {
            warn!(location = %location, key = key, "property set on undefined location, creating placeholder");
            LocationState::placeholder(location.clone())
        });

        if state.properties.get(key) == Some(&value) {
            return false;
        }
        debug!(location = %location, key = key, value = %value, "location property set");
        state.properties.insert(key.to_owned(), value);
        true
    }

    /// Set an item's state and mirror it onto every linked item.
    ///
    /// Records a local event for the item itself and one per mirrored item,
    /// credited to the `system-link` pseudo-entity. A missing item is
    /// reported as [`ItemStateChange::NotFound`] rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownLocation`] if `location` is undefined.
    pub fn set_item_state(
        &mut self,
        location: &LocationId,
        item: &str,
        new_state: &str,
        triggered_by: &EntityId,
    ) -> Result<ItemStateChange, WorldError> {
        let state = self
            .locations
            .get_mut(location)
            .ok_or_else(|| WorldError::UnknownLocation(location.clone()))?;

        let Some(target) = state.item_mut(item) else {
            warn!(location = %location, item = item, "item not found, state unchanged");
            return Ok(ItemStateChange::NotFound);
        };
        if target.state == new_state {
            return Ok(ItemStateChange::Unchanged);
        }
        new_state.clone_into(&mut target.state);
        let mut next = target.linked_to.clone();

        self.record_event(
            format!("The state of {item} in {location} is now '{new_state}'."),
            Some(location.clone()),
            EventScope::Local,
            triggered_by.clone(),
        );

        let mut visited: BTreeSet<(LocationId, String)> =
            BTreeSet::from([(location.clone(), item.to_owned())]);
        let mut mirrored = Vec::new();

        while let Some(link) = next.take() {
            if !visited.insert((link.location.clone(), link.object_key.clone())) {
                break;
            }
            let Some(mirror) = self
                .locations
                .get_mut(&link.location)
                .and_then(|l| l.item_mut(&link.object_key))
            else {
                warn!(
                    location = %link.location,
                    item = %link.object_key,
                    "linked item missing, mirror skipped"
                );
                break;
            };
            if mirror.state == new_state {
                break;
            }
            new_state.clone_into(&mut mirror.state);
            next = mirror.linked_to.clone();

            self.record_event(
                format!(
                    "The {} in {} is now '{new_state}', linked to a change made by {triggered_by}.",
                    link.object_key, link.location
                ),
                Some(link.location.clone()),
                EventScope::Local,
                EntityId::system_link(),
            );
            mirrored.push(link);
        }

        Ok(ItemStateChange::Changed { mirrored })
    }

    /// Add an item to a location.
    ///
    /// Idempotent by name: returns `false` and changes nothing if an item
    /// with the same name is already there, or if the location is unknown.
    /// A successful add records a local "appears" event.
    pub fn add_item(&mut self, location: &LocationId, item: Item, triggered_by: &EntityId) -> bool {
        let Some(state) = self.locations.get_mut(location) else {
            warn!(location = %location, item = %item.object, "cannot add item to unknown location");
            return false;
        };
        if state.has_item(&item.object) {
            debug!(location = %location, item = %item.object, "item already present, not added");
            return false;
        }

        let description = format!(
            "'{}' (described as: {}, state: {}) appears in {location}.",
            item.object,
            item.optional_description.as_deref().unwrap_or("no description"),
            item.state
        );
        state.contains.push(item);
        self.record_event(
            description,
            Some(location.clone()),
            EventScope::Local,
            triggered_by.clone(),
        );
        true
    }

    /// Change the weather, recording a global event if it differs.
    ///
    /// Returns `true` if the weather changed.
    pub fn set_weather(&mut self, condition: &str, triggered_by: &EntityId) -> bool {
        if self.weather == condition {
            return false;
        }
        let old = std::mem::replace(&mut self.weather, condition.to_owned());
        self.record_event(
            format!("The weather changes from {old} to {condition}."),
            None,
            EventScope::Global,
            triggered_by.clone(),
        );
        true
    }

    /// Apply a batch of updates one by one.
    ///
    /// Application is not transactional: a failing update is logged and
    /// skipped, and the rest still apply.
    pub fn apply_updates(&mut self, updates: &[StateUpdate], triggered_by: &EntityId) -> ApplyReport {
        let mut report = ApplyReport::default();

        for update in updates {
            let result = match update {
                StateUpdate::MoveAgent { entity, to } => self.move_agent(entity, to).map(|()| true),
                StateUpdate::SetLocationProperty {
                    location,
                    key,
                    value,
                } => Ok(self.set_location_property(location, key, value.clone())),
                StateUpdate::SetItemState {
                    location,
                    item,
                    state,
                } => match self.set_item_state(location, item, state, triggered_by) {
                    Ok(ItemStateChange::Changed { .. }) => Ok(true),
                    Ok(ItemStateChange::Unchanged) => Ok(false),
                    Ok(ItemStateChange::NotFound) => {
                        report.failed = report.failed.saturating_add(1);
                        continue;
                    }
                    Err(e) => Err(e),
                },
                StateUpdate::SetWeather { condition } => Ok(self.set_weather(condition, triggered_by)),
                StateUpdate::AddItem { location, item } => {
                    Ok(self.add_item(location, item.clone(), triggered_by))
                }
            };

            match result {
                Ok(true) => report.changed = report.changed.saturating_add(1),
                Ok(false) => report.unchanged = report.unchanged.saturating_add(1),
                Err(e) => {
                    warn!(
                        update = update.kind(),
                        triggered_by = %triggered_by,
                        error = %e,
                        "state update failed, continuing with the rest"
                    );
                    report.failed = report.failed.saturating_add(1);
                }
            }
        }

        report
    }
}
