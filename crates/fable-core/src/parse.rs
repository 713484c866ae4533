//! Parser for the interpreter's four-field response line.
//!
//! The line has the shape
//! `SUCCESS_STATUS | ACTION_TYPE | PARAMETERS | OUTCOME_DESCRIPTION`.
//! Parsing never panics and never propagates past the resolution
//! boundary: every problem is a [`ParseFailure`] the coordinator turns into
//! a failed outcome.
//!
//! Parameters follow a small per-action grammar:
//!
//! - `MOVE`: `destination: X`
//! - `SPEAK`: `target: X, message: Y`, where `message` runs to the end of
//!   the field verbatim and may contain commas
//! - `INTERACT`: `object: X, state: Y`
//! - everything else: one free-text value, its conventional key prefix
//!   stripped if present

use std::collections::BTreeMap;

use fable_types::ActionType;

/// Field separator in interpreter responses.
pub const FIELD_SEPARATOR: &str = " | ";

/// Why a response line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFailure {
    /// The line did not split into exactly four fields.
    #[error("expected 4 fields separated by \" | \", found {found}")]
    FieldCount {
        /// Number of fields actually found.
        found: usize,
    },

    /// The status field was neither a success nor a failure marker.
    #[error("unrecognised success status {status:?}")]
    Status {
        /// The offending status field.
        status: String,
    },

    /// The action field named no known action type.
    #[error("unrecognised action type {keyword:?}")]
    ActionType {
        /// The offending action field.
        keyword: String,
    },
}

impl ParseFailure {
    /// The action type a failed outcome should carry for this failure.
    pub const fn fallback_action(&self) -> ActionType {
        match self {
            Self::FieldCount { .. } | Self::Status { .. } => ActionType::Fail,
            Self::ActionType { .. } => ActionType::Unknown,
        }
    }
}

/// A parsed, not yet validated, interpreter proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedOutcome {
    /// What the interpreter claims.
    pub success: bool,
    /// Proposed action type.
    pub action_type: ActionType,
    /// Parameters parsed per the action's grammar.
    pub parameters: BTreeMap<String, String>,
    /// Proposed narration.
    pub description: String,
}

/// Parse one interpreter response.
///
/// Leading and trailing whitespace is ignored. If the response spans
/// several lines, only the first non-empty line is considered.
pub fn parse_response(raw: &str) -> Result<ProposedOutcome, ParseFailure> {
    let line = raw
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default();

    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).map(str::trim).collect();
    let [status, action, parameters, description] = fields.as_slice() else {
        return Err(ParseFailure::FieldCount { found: fields.len() });
    };

    let success = parse_status(status).ok_or_else(|| ParseFailure::Status {
        status: (*status).to_owned(),
    })?;
    let action_type = ActionType::from_keyword(action).ok_or_else(|| ParseFailure::ActionType {
        keyword: (*action).to_owned(),
    })?;

    Ok(ProposedOutcome {
        success,
        action_type,
        parameters: parse_parameters(action_type, parameters),
        description: (*description).to_owned(),
    })
}

fn parse_status(status: &str) -> Option<bool> {
    match status.to_ascii_uppercase().as_str() {
        "SUCCESS" | "SUCCEEDED" | "TRUE" | "YES" => Some(true),
        "FAILURE" | "FAILED" | "FAIL" | "FALSE" | "NO" => Some(false),
        _ => None,
    }
}

/// The key a free-text action's single parameter is stored under.
pub const fn free_text_key(action: ActionType) -> &'static str {
    match action {
        ActionType::Observe => "target",
        ActionType::Move => "destination",
        ActionType::Speak => "message",
        ActionType::Interact => "object",
        ActionType::Wait | ActionType::Fail | ActionType::Unknown => "reason",
    }
}

/// Parse the parameter field according to `action`'s grammar.
///
/// Missing keys are simply absent from the map; the coordinator decides
/// whether that is acceptable.
pub fn parse_parameters(action: ActionType, text: &str) -> BTreeMap<String, String> {
    let text = text.trim();
    let mut parameters = BTreeMap::new();

    match action {
        ActionType::Move => {
            insert_non_empty(&mut parameters, "destination", strip_key(text, "destination"));
        }
        ActionType::Speak => {
            let (head, message) = split_at_key(text, "message");
            let target = strip_key(head.trim_end().trim_end_matches(','), "target");
            insert_non_empty(&mut parameters, "target", target);
            if let Some(message) = message {
                parameters.insert("message".to_owned(), message.trim().to_owned());
            }
        }
        ActionType::Interact => {
            let (head, state) = split_at_key(text, "state");
            let object = strip_key(head.trim_end().trim_end_matches(','), "object");
            insert_non_empty(&mut parameters, "object", object);
            if let Some(state) = state {
                insert_non_empty(&mut parameters, "state", state.trim());
            }
        }
        ActionType::Observe | ActionType::Wait | ActionType::Fail | ActionType::Unknown => {
            let key = free_text_key(action);
            insert_non_empty(&mut parameters, key, strip_key(text, key));
        }
    }

    parameters
}

fn insert_non_empty(parameters: &mut BTreeMap<String, String>, key: &str, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        parameters.insert(key.to_owned(), value.to_owned());
    }
}

/// Strip a leading `key:` (case-insensitive, optional spaces before the
/// colon) from `text`, returning the rest trimmed. Without the prefix the
/// whole text is returned.
fn strip_key<'a>(text: &'a str, key: &str) -> &'a str {
    let text = text.trim();
    let Some(head) = text.get(..key.len()) else {
        return text;
    };
    if !head.eq_ignore_ascii_case(key) {
        return text;
    }
    let rest = text.get(key.len()..).unwrap_or_default().trim_start();
    rest.strip_prefix(':').map_or(text, str::trim)
}

/// Split `text` at the first `key:` marker.
///
/// Returns the text before the marker and everything after the colon, or
/// the whole text and `None` if the marker is absent.
fn split_at_key<'a>(text: &'a str, key: &str) -> (&'a str, Option<&'a str>) {
    let marker = format!("{}:", key.to_ascii_lowercase());
    let lowered = text.to_ascii_lowercase();
    let Some(index) = lowered.find(&marker) else {
        return (text, None);
    };
    let head = text.get(..index).unwrap_or_default();
    let tail = text.get(index.saturating_add(marker.len())..);
    (head, tail)
}
