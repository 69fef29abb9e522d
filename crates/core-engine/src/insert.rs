//! Token insertion helpers: run construction and the separator policy.

use core_config::{EditorConfiguration, EditorStyle, Trigger};
use core_content::{Run, SuggestionItem};
use core_flat::FlatDocument;

/// Build the run a chosen suggestion becomes: the registered type config
/// wins, the trigger's format template is the default.
pub(crate) fn build_token_run(
    config: &EditorConfiguration,
    suggestion: &dyn SuggestionItem,
    trigger: &Trigger,
) -> Run {
    if let Some(token_config) = config.token_config(&trigger.token_type) {
        return token_config.build(suggestion);
    }
    let mut text = trigger.format_token_text(suggestion);
    if text.is_empty() {
        text = suggestion.display_name().to_string();
    }
    Run::token(trigger.token_type.clone(), text, suggestion.id())
}

/// Whether a separator space follows an inserted token. Inspects the
/// character immediately after the replaced range in the *pre-edit* text:
/// nothing there, or anything that does not already separate visually
/// (whitespace, ASCII punctuation, or a configured full-width closer),
/// gets a single space appended.
pub(crate) fn needs_separator(doc: &FlatDocument, next_index: usize, style: &EditorStyle) -> bool {
    let Some(next) = doc.char_at(next_index) else {
        return true;
    };
    if next == ' ' || next == '\n' || next == '\t' {
        return false;
    }
    if next.is_ascii_punctuation() {
        return false;
    }
    if style.separator_closers.contains(next) {
        return false;
    }
    true
}

/// Backward scan for a trigger character, used when the stored anchor sits
/// at end-of-text (the composing span grew past it). Stops at whitespace.
pub(crate) fn scan_back_for_trigger(
    doc: &FlatDocument,
    from: usize,
    trigger_char: char,
) -> Option<usize> {
    let mut i = from.min(doc.len_chars());
    while i > 0 {
        i -= 1;
        match doc.char_at(i) {
            Some(c) if c == trigger_char => return Some(i),
            Some(' ') | Some('\n') | Some('\t') => return None,
            _ => {}
        }
    }
    None
}
