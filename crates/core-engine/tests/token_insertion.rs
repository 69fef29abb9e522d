mod common;

use common::{session, type_str};
use core_config::{TokenStyle, Trigger};
use core_content::{Content, MentionSuggestion, Run, TopicSuggestion};
use core_engine::TriggerState;
use core_flat::CharRange;

#[test]
fn insertion_replaces_the_composing_span() {
    let mut s = session();
    type_str(&mut s, "hello @al");
    let trigger = s.active_trigger().unwrap().clone();
    s.insert_token(MentionSuggestion::new("u1", "alice"), trigger);

    assert_eq!(s.plain_text(), "hello @alice ");
    assert_eq!(s.selection(), CharRange::caret(13));
    assert_eq!(*s.trigger_state(), TriggerState::Idle);

    let tokens: Vec<&Run> = s.content().runs.iter().filter(|r| r.is_token()).collect();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].display_text(), "@alice");
    assert_eq!(tokens[0].data(), "u1");
    assert!(!s.plain_text().contains("@al "), "no leftover keyword");
}

#[test]
fn inserted_token_carries_an_atomic_tag() {
    let mut s = session();
    type_str(&mut s, "#r");
    let trigger = s.active_trigger().unwrap().clone();
    s.insert_token(TopicSuggestion::new("t1", "rust"), trigger);
    let tags = s.flat().tags();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].start, 0);
    assert_eq!(tags[0].len, "#rust#".chars().count());
    assert!(tags[0].atomic);
    assert!(tags[0].payload.is_some());
}

#[test]
fn at_cursor_insertion_replaces_the_selection() {
    let mut s = session();
    type_str(&mut s, "abcd");
    s.set_selection(CharRange::new(1, 2));
    s.insert_token_at_cursor(
        MentionSuggestion::new("u2", "bob"),
        Trigger::mention(TokenStyle::default()),
    );
    assert_eq!(s.plain_text(), "a@bob d");
}

#[test]
fn missing_trigger_char_falls_back_to_cursor() {
    let mut s = session();
    type_str(&mut s, "@al");
    let trigger = s.active_trigger().unwrap().clone();
    // Batch-delete the trigger char: the anchor now points at plain text.
    s.propose_edit(CharRange::new(0, 1), "");
    s.insert_token(MentionSuggestion::new("u1", "alice"), trigger);
    assert_eq!(s.plain_text(), "@alice al");
}

#[test]
fn anchor_at_end_recovers_via_backward_scan() {
    let mut s = session();
    type_str(&mut s, "x@");
    let trigger = s.active_trigger().unwrap().clone();
    // Deleting "x" leaves the stored anchor (1) == text length (1).
    s.propose_edit(CharRange::new(0, 1), "");
    s.set_selection(CharRange::caret(1));
    s.insert_token(MentionSuggestion::new("u1", "alice"), trigger);
    assert_eq!(s.plain_text(), "@alice ");
    assert_eq!(s.content().mentions().len(), 1);
}

#[test]
fn separator_suppressed_before_existing_punctuation() {
    let mut s = session();
    type_str(&mut s, "hi !");
    s.set_selection(CharRange::caret(3));
    type_str(&mut s, "@x");
    let trigger = s.active_trigger().unwrap().clone();
    s.insert_token(MentionSuggestion::new("u9", "xavier"), trigger);
    assert_eq!(s.plain_text(), "hi @xavier!");
}

#[test]
fn separator_suppressed_before_cjk_closer() {
    let mut s = session();
    type_str(&mut s, "你好，");
    s.set_selection(CharRange::caret(2));
    type_str(&mut s, "@a");
    let trigger = s.active_trigger().unwrap().clone();
    s.insert_token(MentionSuggestion::new("u1", "安"), trigger);
    assert_eq!(s.plain_text(), "你好@安，");
}

#[test]
fn separator_added_before_adjacent_letters() {
    let mut s = session();
    s.replace_content(Content::new(vec![Run::text("tail")]));
    s.set_selection(CharRange::caret(0));
    s.insert_token_at_cursor(
        MentionSuggestion::new("u1", "a"),
        Trigger::mention(TokenStyle::default()),
    );
    assert_eq!(s.plain_text(), "@a tail");
}

#[test]
fn queued_command_is_single_slot_latest_wins() {
    let mut s = session();
    type_str(&mut s, "@a");
    let trigger = s.active_trigger().unwrap().clone();
    s.queue_insert_token(MentionSuggestion::new("u1", "first"), trigger.clone());
    s.queue_insert_token(MentionSuggestion::new("u2", "second"), trigger);
    s.process_pending();
    assert_eq!(s.plain_text(), "@second ");
    // The slot was consumed; processing again is a no-op.
    s.process_pending();
    assert_eq!(s.plain_text(), "@second ");
}

#[test]
fn insertion_extends_to_cover_a_wider_selection() {
    let mut s = session();
    type_str(&mut s, "@ab tail");
    // Keyword composing ended at the space; select from inside the
    // composing span past it.
    let trigger = Trigger::mention(TokenStyle::default());
    s.set_selection(CharRange::new(1, 6)); // "ab tai"
    s.insert_token(MentionSuggestion::new("u1", "ann"), trigger);
    // Replacement spans from the trigger through the selection end.
    assert_eq!(s.plain_text(), "@ann l");
}
