#![allow(dead_code)] // Shared across the integration tests; each binary uses a subset.

use core_config::{EditorStyle, defaults::mention_topic_configuration};
use core_engine::{EditOutcome, EditorSession};
use core_flat::CharRange;

pub fn session() -> EditorSession {
    EditorSession::new(mention_topic_configuration(), EditorStyle::default())
}

/// Type text one keystroke at a time through the edit pipeline, the way a
/// host surface reports it.
pub fn type_str(session: &mut EditorSession, text: &str) {
    for c in text.chars() {
        let at = session.selection();
        session.propose_edit(at, &c.to_string());
    }
}

/// One backspace keystroke: deletes the selection, or the char before the
/// caret.
pub fn backspace(session: &mut EditorSession) -> EditOutcome {
    let sel = session.selection();
    let range = if sel.is_empty() {
        if sel.start == 0 {
            return session.propose_edit(CharRange::caret(0), "");
        }
        CharRange::new(sel.start - 1, 1)
    } else {
        sel
    };
    session.propose_edit(range, "")
}
