mod common;

use common::{backspace, session};
use core_content::{Content, Run};
use core_engine::{EditOutcome, RejectReason};
use core_flat::CharRange;

fn with_mention() -> core_engine::EditorSession {
    let mut s = session();
    s.replace_content(Content::new(vec![
        Run::text("hi "),
        Run::mention("u1", "alice"),
    ]));
    s
}

#[test]
fn deleting_a_token_takes_two_steps() {
    let mut s = with_mention();
    assert_eq!(s.plain_text(), "hi @alice");
    assert_eq!(s.selection(), CharRange::caret(9));

    // First backspace: selects the 6-char token, deletes nothing.
    let first = backspace(&mut s);
    assert_eq!(
        first,
        EditOutcome::Rejected(RejectReason::DeleteConfirmPending {
            selection: CharRange::new(3, 6)
        })
    );
    assert_eq!(s.plain_text(), "hi @alice");
    assert_eq!(s.selection(), CharRange::new(3, 6));
    assert_eq!(s.pending_delete_confirm(), Some(CharRange::new(3, 6)));

    // Second backspace deletes the selected range whole.
    let second = backspace(&mut s);
    assert!(second.is_applied());
    assert_eq!(s.plain_text(), "hi ");
    assert_eq!(s.pending_delete_confirm(), None);
    assert!(s.content().mentions().is_empty());
}

#[test]
fn batch_delete_bypasses_confirmation() {
    let mut s = session();
    s.replace_content(Content::new(vec![
        Run::text("ab "),
        Run::mention("u1", "alice"),
        Run::text(" cd"),
    ]));
    // Span the token plus 3 surrounding chars.
    let range = CharRange::new(2, 8);
    assert!(s.propose_edit(range, "").is_applied());
    assert_eq!(s.plain_text(), "abcd");
    assert_eq!(s.pending_delete_confirm(), None);
}

#[test]
fn trailing_separator_is_absorbed_into_the_confirm_cycle() {
    let mut s = session();
    s.replace_content(Content::new(vec![
        Run::text("a "),
        Run::mention("u1", "bo"),
        Run::text(" tail"),
    ]));
    // Caret right after the auto separator at index 5.
    s.set_selection(CharRange::caret(6));
    let first = backspace(&mut s);
    assert_eq!(
        first,
        EditOutcome::Rejected(RejectReason::DeleteConfirmPending {
            selection: CharRange::new(2, 4)
        })
    );
    let second = backspace(&mut s);
    assert!(second.is_applied());
    assert_eq!(s.plain_text(), "a tail");
}

#[test]
fn only_one_separator_char_is_absorbed() {
    let mut s = session();
    s.replace_content(Content::new(vec![
        Run::mention("u1", "bo"),
        Run::text("  x"),
    ]));
    // "@bo  x": caret after the second space.
    s.set_selection(CharRange::caret(5));
    // The second space is ordinary text: plain deletion.
    assert!(backspace(&mut s).is_applied());
    assert_eq!(s.plain_text(), "@bo x");
    // The next backspace hits the space adjacent to the token: confirm.
    assert!(matches!(
        backspace(&mut s),
        EditOutcome::Rejected(RejectReason::DeleteConfirmPending { .. })
    ));
}

#[test]
fn stale_pending_range_is_deleted_programmatically() {
    let mut s = with_mention();
    backspace(&mut s); // arms pending on the token
    assert_eq!(s.pending_delete_confirm(), Some(CharRange::new(3, 6)));

    // A different single-char deletion that still hits the token (the host
    // selection drifted without reporting).
    let outcome = s.propose_edit(CharRange::new(4, 1), "");
    assert_eq!(
        outcome,
        EditOutcome::Rejected(RejectReason::StalePendingDeleted)
    );
    assert_eq!(s.plain_text(), "hi ");
    assert_eq!(s.pending_delete_confirm(), None);
}

#[test]
fn unrelated_selection_change_disarms_silently() {
    let mut s = with_mention();
    backspace(&mut s);
    assert!(s.pending_delete_confirm().is_some());
    s.set_selection(CharRange::caret(0));
    assert_eq!(s.pending_delete_confirm(), None);
    // Nothing was deleted.
    assert_eq!(s.plain_text(), "hi @alice");
}

#[test]
fn typing_over_the_confirm_selection_replaces_the_token() {
    let mut s = with_mention();
    backspace(&mut s); // selection now spans the token
    let outcome = s.propose_edit(s.selection(), "x");
    assert!(outcome.is_applied());
    assert_eq!(s.plain_text(), "hi x");
    assert!(s.content().mentions().is_empty());
    assert_eq!(s.pending_delete_confirm(), None);
}

#[test]
fn plain_text_backspace_needs_no_confirmation() {
    let mut s = with_mention();
    s.set_selection(CharRange::caret(2));
    assert!(backspace(&mut s).is_applied());
    assert_eq!(s.plain_text(), "h @alice");
    // The token tag shifted left with the edit.
    assert_eq!(s.flat().tags()[0].start, 2);
}
