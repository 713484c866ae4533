//! JSON-lines export of the event log for narrative consumers.
//!
//! One serialized [`Event`] per line, oldest first. The export is a side
//! effect for later reconstruction; the in-memory log stays authoritative.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use fable_types::Event;
use tracing::info;

use crate::error::EngineError;

/// Write `events` to `writer` as JSON lines. Returns the number written.
pub fn write_events<'a, W: Write>(
    writer: &mut W,
    events: impl IntoIterator<Item = &'a Event>,
) -> std::io::Result<usize> {
    let mut written: usize = 0;
    for event in events {
        serde_json::to_writer(&mut *writer, event)?;
        writer.write_all(b"\n")?;
        written = written.saturating_add(1);
    }
    writer.flush()?;
    Ok(written)
}

/// Write `events` to the file at `path`, replacing it.
pub fn export_to_file<'a>(
    path: &Path,
    events: impl IntoIterator<Item = &'a Event>,
) -> Result<usize, EngineError> {
    let to_error = |source| EngineError::Export {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(to_error)?;
    let mut writer = BufWriter::new(file);
    let written = write_events(&mut writer, events).map_err(to_error)?;
    info!(path = %path.display(), events = written, "Event log exported");
    Ok(written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fable_types::{EntityId, EventScope, LocationId};

    use super::*;

    #[test]
    fn one_line_per_event() {
        let events = vec![
            Event::new(
                "Alice appears in the Park.",
                Some(LocationId::new("Park")),
                EventScope::Local,
                0,
                EntityId::new("Alice"),
            ),
            Event::new(
                "The weather changes from Clear to Rain.",
                None,
                EventScope::Global,
                1,
                EntityId::new("Director"),
            ),
        ];
        let mut buffer = Vec::new();
        let written = write_events(&mut buffer, &events).unwrap();
        assert_eq!(written, 2);

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: serde_json::Value = serde_json::from_str(lines.get(1).unwrap()).unwrap();
        assert_eq!(second.get("scope").and_then(|s| s.as_str()), Some("global"));
        assert!(second.get("location").is_some_and(serde_json::Value::is_null));
    }
}
