//! Read-only context summary handed to the intent interpreter.
//!
//! The summary is plain text, one fact per line, describing what an entity
//! can see from where it stands: its location, the weather, the exits, who
//! else is there, and the items present with their states.

use std::fmt::Write as _;

use fable_types::EntityId;

use crate::world_state::WorldState;

impl WorldState {
    /// Build the static context summary for `entity`.
    pub fn static_context(&self, entity: &EntityId) -> String {
        let Some(location_id) = self.position_of(entity) else {
            return format!("{entity} is lost and disoriented.");
        };
        let description = self
            .location(location_id)
            .map_or("An unknown place", |l| l.description.as_str());

        let mut context = String::new();
        let _ = writeln!(context, "Current Location: {location_id} ({description}).");
        let _ = writeln!(context, "Current Weather: {}.", self.weather());

        let exits: Vec<String> = self
            .reachable(location_id)
            .iter()
            .map(ToString::to_string)
            .collect();
        if exits.is_empty() {
            context.push_str("Visible Exits: None apparent.\n");
        } else {
            let _ = writeln!(context, "Visible Exits: {}.", exits.join(", "));
        }

        let others: Vec<String> = self
            .agents_at(location_id)
            .into_iter()
            .filter(|other| other != entity)
            .map(EntityId::into_inner)
            .collect();
        if others.is_empty() {
            let _ = writeln!(context, "{entity} is alone here.");
        } else {
            let _ = writeln!(context, "Others present: {}.", others.join(", "));
        }

        let items = self.items_at(location_id);
        if items.is_empty() {
            context.push_str("There are no specific items demanding attention right now.");
        } else {
            context.push_str("Items and features you observe:");
            for item in items {
                match &item.optional_description {
                    Some(desc) => {
                        let _ = write!(context, "\n- {desc} ({}) - currently {}", item.object, item.state);
                    }
                    None => {
                        let _ = write!(context, "\n- {} - currently {}", item.object, item.state);
                    }
                }
            }
        }

        context
    }
}
