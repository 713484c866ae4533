//! The intent-interpretation collaborator and a rule-based implementation.
//!
//! An [`IntentInterpreter`] turns free-form intent text into a single line of
//! four `" | "`-separated fields:
//!
//! ```text
//! SUCCESS_STATUS | ACTION_TYPE | PARAMETERS | OUTCOME_DESCRIPTION
//! ```
//!
//! Whatever it proposes is only a proposal; the resolution coordinator
//! re-validates it against the World Model.
//!
//! [`KeywordInterpreter`] is a deterministic interpreter driven by verb
//! patterns. It needs no model backend, which makes it suitable for scripted
//! runs and tests.

use fable_types::{EntityId, LocationId};
use regex::Regex;
use tracing::debug;

/// Errors an interpreter may report instead of a response line.
#[derive(Debug, thiserror::Error)]
pub enum InterpreterError {
    /// Quota exhaustion or timeout; worth retrying.
    #[error("interpreter temporarily unavailable: {message}")]
    Exhausted {
        /// Description of the transient failure.
        message: String,
    },

    /// Any other failure; retrying will not help.
    #[error("interpreter failed: {message}")]
    Failed {
        /// Description of the failure.
        message: String,
    },
}

impl InterpreterError {
    /// Whether the failure is transient and the call may be retried.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

/// Everything the interpreter is told about one turn.
#[derive(Debug, Clone, Copy)]
pub struct InterpretRequest<'a> {
    /// The acting entity.
    pub entity: &'a EntityId,
    /// Where the entity stands.
    pub location: &'a LocationId,
    /// The free-form intent.
    pub intent: &'a str,
    /// Static context summary of the entity's surroundings.
    pub context: &'a str,
}

/// A source of proposed outcomes for free-form intents.
pub trait IntentInterpreter {
    /// Propose an outcome line for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`InterpreterError::Exhausted`] for transient failures and
    /// [`InterpreterError::Failed`] for everything else.
    fn interpret(&mut self, request: &InterpretRequest<'_>) -> Result<String, InterpreterError>;
}

// ---------------------------------------------------------------------------
// Keyword interpreter
// ---------------------------------------------------------------------------

/// Verbs that change an item's state, with the state they produce.
const INTERACTION_VERBS: [(&str, &str); 6] = [
    ("open", "open"),
    ("close", "closed"),
    ("lock", "locked"),
    ("unlock", "unlocked"),
    ("light", "lit"),
    ("extinguish", "unlit"),
];

/// Rule-based interpreter matching common verb patterns.
#[derive(Debug, Clone)]
pub struct KeywordInterpreter {
    movement: Regex,
    speech: Regex,
    interaction: Regex,
    observation: Regex,
    waiting: Regex,
}

impl KeywordInterpreter {
    /// Compile the verb patterns.
    ///
    /// # Errors
    ///
    /// Returns the regex error if a pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            movement: Regex::new(
                r"(?i)\b(?:go|move|walk|run|head)\s+(?:to|towards|into)\s+(?:the\s+)?(.+?)[.!?]*$",
            )?,
            speech: Regex::new(r"(?i)\b(?:say|tell|ask)\s+(?:to\s+)?([A-Za-z][\w-]*)\b\s*[:,]?\s*(.*)$")?,
            interaction: Regex::new(
                r"(?i)\b(open|close|lock|unlock|light|extinguish)\s+(?:the\s+)?(.+?)[.!?]*$",
            )?,
            observation: Regex::new(r"(?i)\b(?:look|examine|observe|watch|inspect)\b(?:\s+(?:at\s+)?(?:the\s+)?(.+?))?[.!?]*$")?,
            waiting: Regex::new(r"(?i)\b(?:wait|rest|pause|stay|remain|sleep)\b")?,
        })
    }

    /// Build the response line for one intent.
    pub fn respond(&self, request: &InterpretRequest<'_>) -> String {
        let entity = request.entity;
        let intent = request.intent.trim();

        if let Some(caps) = self.speech.captures(intent)
            && let Some(target) = caps.get(1)
        {
            let target = target.as_str();
            let message = caps
                .get(2)
                .map_or("", |m| m.as_str())
                .trim()
                .trim_matches(|c| matches!(c, '"' | '\'' | '`'));
            return format!(
                "SUCCESS | SPEAK | target: {target}, message: {message} | {entity} says to {target}, \"{message}\""
            );
        }

        if let Some(caps) = self.movement.captures(intent)
            && let Some(destination) = caps.get(1)
        {
            let destination = destination.as_str().trim();
            return format!(
                "SUCCESS | MOVE | destination: {destination} | {entity} heads to the {destination}."
            );
        }

        if let Some(caps) = self.interaction.captures(intent)
            && let (Some(verb), Some(object)) = (caps.get(1), caps.get(2))
        {
            let verb = verb.as_str().to_ascii_lowercase();
            let state = INTERACTION_VERBS
                .iter()
                .find(|(v, _)| *v == verb)
                .map_or("used", |(_, s)| *s);
            let object = object.as_str().trim();
            return format!(
                "SUCCESS | INTERACT | object: {object}, state: {state} | {entity} {verb}s the {object}."
            );
        }

        if let Some(caps) = self.observation.captures(intent) {
            let focus = caps.get(1).map_or("surroundings", |m| m.as_str().trim());
            return format!(
                "SUCCESS | OBSERVE | target: {focus} | {entity} takes a careful look at the {focus}."
            );
        }

        if self.waiting.is_match(intent) {
            return format!("SUCCESS | WAIT | reason: {intent} | {entity} waits quietly.");
        }

        format!("FAILURE | UNKNOWN | reason: unrecognised intent | {entity} hesitates, unsure how to {intent}.")
    }
}

impl IntentInterpreter for KeywordInterpreter {
    fn interpret(&mut self, request: &InterpretRequest<'_>) -> Result<String, InterpreterError> {
        let line = self.respond(request);
        debug!(
            entity = %request.entity,
            location = %request.location,
            intent = request.intent,
            response = %line,
            "keyword interpreter response"
        );
        Ok(line)
    }
}
