//! Editor session: the synchronous engine instance behind one text field.
//!
//! The session owns every piece of shared state — the flat document
//! mirror, the parsed content, the selection, trigger and confirmation
//! state machines, and the single-slot pending commands. The host surface
//! reports prospective edits and selection changes and honors the
//! accept/reject verdicts; the business layer registers configuration and
//! queues content/insertion commands. Everything runs synchronously on the
//! caller's thread in arrival order; there is no background work and no
//! locking.
//!
//! Per prospective edit the pipeline is: clamp the range, enforce the
//! character budget (insertions only), run trigger detection (which never
//! vetoes), run deletion confirmation (deletions only), then apply the
//! splice and re-derive the content model from the flat document. The
//! budget's and the confirmer's verdicts compose by logical AND.

use core_config::{CharacterLimit, EditorConfiguration, EditorStyle, Trigger};
use core_content::{Content, Run, SuggestionItem};
use core_flat::{CharRange, FlatDocument, parse, render};

pub mod confirm;
mod insert;
pub mod trigger;

pub use confirm::{ConfirmDecision, DeleteConfirmer};
pub use trigger::{TriggerDetector, TriggerState};

/// How a queued token insertion resolves its target range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    /// Replace the composing span (trigger char + keyword).
    ReplaceTrigger,
    /// Replace the current selection, ignoring any trigger anchor.
    AtCursor,
}

/// One-shot insertion intent queued by the business layer and consumed
/// exactly once. A newly queued command supersedes an unconsumed one.
pub struct InsertTokenCommand {
    pub mode: InsertMode,
    pub suggestion: Box<dyn SuggestionItem>,
    pub trigger: Trigger,
}

/// Why a prospective edit was vetoed. The host must not apply the edit; it
/// should re-read the selection (and, after `StalePendingDeleted`, the
/// flat text) from the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The character budget would be exceeded.
    BudgetExceeded { would_be: usize },
    /// First backspace on a token: the confirm selection was armed.
    DeleteConfirmPending { selection: CharRange },
    /// A stale pending range was deleted programmatically instead.
    StalePendingDeleted,
    /// Duplicate programmatic plain-text insertion was suppressed.
    DuplicateInsert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied {
        selection: CharRange,
        /// The caret landed at a token boundary: the host should reset its
        /// typing style so new text does not inherit token styling.
        reset_typing_style: bool,
    },
    Rejected(RejectReason),
}

impl EditOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, EditOutcome::Applied { .. })
    }
}

pub struct EditorSession {
    configuration: EditorConfiguration,
    style: EditorStyle,
    limit: Option<CharacterLimit>,
    doc: FlatDocument,
    content: Content,
    selection: CharRange,
    detector: TriggerDetector,
    confirmer: DeleteConfirmer,
    pending_content: Option<Content>,
    pending_insert: Option<InsertTokenCommand>,
    last_inserted_plain: Option<String>,
    global_on_tap: Option<Box<dyn Fn(&Run)>>,
    on_non_token_tap: Option<Box<dyn Fn()>>,
}

impl EditorSession {
    pub fn new(configuration: EditorConfiguration, style: EditorStyle) -> Self {
        Self {
            configuration,
            style,
            limit: None,
            doc: FlatDocument::new(),
            content: Content::default(),
            selection: CharRange::caret(0),
            detector: TriggerDetector::default(),
            confirmer: DeleteConfirmer::default(),
            pending_content: None,
            pending_insert: None,
            last_inserted_plain: None,
            global_on_tap: None,
            on_non_token_tap: None,
        }
    }

    pub fn with_character_limit(mut self, limit: CharacterLimit) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn set_character_limit(&mut self, limit: Option<CharacterLimit>) {
        self.limit = limit;
    }

    /// Global tap fallback, consulted when the token's type has no
    /// registered tap handler.
    pub fn on_token_tap(&mut self, handler: impl Fn(&Run) + 'static) {
        self.global_on_tap = Some(Box::new(handler));
    }

    /// Handler for taps outside any token; without one the tap dismisses
    /// the suggestion panel.
    pub fn on_non_token_tap(&mut self, handler: impl Fn() + 'static) {
        self.on_non_token_tap = Some(Box::new(handler));
    }

    pub fn configuration(&self) -> &EditorConfiguration {
        &self.configuration
    }

    pub fn configuration_mut(&mut self) -> &mut EditorConfiguration {
        &mut self.configuration
    }

    pub fn style(&self) -> &EditorStyle {
        &self.style
    }

    /// The externally observable content model.
    pub fn content(&self) -> &Content {
        &self.content
    }

    /// The flat representation the host should be displaying.
    pub fn flat(&self) -> &FlatDocument {
        &self.doc
    }

    pub fn plain_text(&self) -> String {
        self.doc.plain_text()
    }

    pub fn selection(&self) -> CharRange {
        self.selection
    }

    pub fn trigger_state(&self) -> &TriggerState {
        self.detector.state()
    }

    /// The trigger whose composing session is live, if any. Drives the
    /// externally rendered suggestion panel together with
    /// [`Self::search_keyword`].
    pub fn active_trigger(&self) -> Option<&Trigger> {
        self.detector
            .active_char()
            .and_then(|c| self.configuration.trigger_for(c))
    }

    pub fn search_keyword(&self) -> &str {
        self.detector.keyword()
    }

    pub fn pending_delete_confirm(&self) -> Option<CharRange> {
        self.confirmer.pending()
    }

    // ---- Surface -> engine ------------------------------------------------

    /// Evaluate and (when accepted) apply one prospective edit.
    pub fn propose_edit(&mut self, range: CharRange, replacement: &str) -> EditOutcome {
        let range = self.doc.clamp(range);

        if !replacement.is_empty()
            && let Some(limit) = &self.limit
        {
            let removed = self.doc.logical_len_of(range);
            let would_be =
                self.content.logical_len() - removed + replacement.chars().count();
            if would_be > limit.max_count {
                tracing::debug!(
                    target: "engine.budget",
                    would_be,
                    max_count = limit.max_count,
                    "edit rejected by character budget"
                );
                limit.notify_exceeded(would_be);
                return EditOutcome::Rejected(RejectReason::BudgetExceeded { would_be });
            }
        }

        self.detector
            .evaluate(&self.configuration, &self.doc, range, replacement);

        if replacement.is_empty() && range.len > 0 {
            match self.confirmer.evaluate(&self.doc, range) {
                ConfirmDecision::Allow | ConfirmDecision::AllowConfirmed => {}
                ConfirmDecision::Reject { select } => {
                    self.selection = select;
                    tracing::debug!(
                        target: "engine.confirm",
                        start = select.start,
                        len = select.len,
                        "delete confirmation armed"
                    );
                    return EditOutcome::Rejected(RejectReason::DeleteConfirmPending {
                        selection: select,
                    });
                }
                ConfirmDecision::RejectStale { delete } => {
                    self.delete_range(delete);
                    tracing::debug!(
                        target: "engine.confirm",
                        start = delete.start,
                        len = delete.len,
                        "stale pending range deleted"
                    );
                    return EditOutcome::Rejected(RejectReason::StalePendingDeleted);
                }
            }
        }

        let reset_typing_style = self.commit_edit(range, replacement);
        EditOutcome::Applied {
            selection: self.selection,
            reset_typing_style,
        }
    }

    /// Reconcile a flat text the host committed without a proposal
    /// (autocorrect, IME replacements). The divergence against the mirror
    /// is folded into a single splice so tag bookkeeping stays consistent,
    /// then the content re-derives as after any other committed edit.
    pub fn notify_committed(&mut self, new_text: &str) {
        let current = self.doc.plain_text();
        if current == new_text {
            self.confirmer.clear();
            return;
        }
        let (range, replacement) = diff_splice(&current, new_text);
        tracing::debug!(
            target: "engine.sync",
            start = range.start,
            removed = range.len,
            inserted = replacement.chars().count(),
            "reconciling externally committed text"
        );
        self.commit_edit(range, &replacement);
    }

    /// Report an externally driven selection change. Returns whether the
    /// host should reset its typing style (caret adjacent to a token).
    pub fn set_selection(&mut self, range: CharRange) -> bool {
        let range = self.doc.clamp(range);
        self.confirmer.on_selection_changed(range);
        self.selection = range;
        range.is_empty() && self.doc.touches_tag(range.start)
    }

    /// Dispatch a tap at a char index. Token taps route through the type's
    /// tap handler, then the global fallback; a non-token tap dismisses the
    /// suggestion panel. Returns the tapped token, if any.
    pub fn handle_tap(&mut self, index: usize) -> Option<Run> {
        match self.token_at(index) {
            Some(run) => {
                self.dispatch_tap(&run);
                Some(run)
            }
            None => {
                if let Some(handler) = &self.on_non_token_tap {
                    handler();
                } else {
                    self.dismiss_composing();
                }
                None
            }
        }
    }

    /// Reconstruct the token run covering `index`, if the position is
    /// tagged.
    pub fn token_at(&self, index: usize) -> Option<Run> {
        let tag = self
            .doc
            .tags()
            .iter()
            .find(|tag| tag.range().contains(index))?;
        let display = if tag.display_text.is_empty() {
            self.doc.slice(tag.range())
        } else {
            tag.display_text.clone()
        };
        Some(
            Run::token(tag.token_type.clone(), display, tag.data.clone())
                .with_payload(tag.payload.clone()),
        )
    }

    pub fn dispatch_tap(&self, run: &Run) {
        if let Some(config) = self.configuration.token_config(run.token_type())
            && config.tap(run)
        {
            return;
        }
        if let Some(global) = &self.global_on_tap {
            global(run);
        }
    }

    // ---- Business layer -> engine -----------------------------------------

    /// Queue a full content replacement; applied by [`Self::process_pending`].
    pub fn set_content(&mut self, content: Content) {
        self.pending_content = Some(content);
    }

    /// Queue a replace-trigger token insertion.
    pub fn queue_insert_token(
        &mut self,
        suggestion: impl SuggestionItem + 'static,
        trigger: Trigger,
    ) {
        self.pending_insert = Some(InsertTokenCommand {
            mode: InsertMode::ReplaceTrigger,
            suggestion: Box::new(suggestion),
            trigger,
        });
    }

    /// Queue an at-cursor token insertion (programmatic injection with no
    /// preceding trigger keystroke).
    pub fn queue_insert_token_at_cursor(
        &mut self,
        suggestion: impl SuggestionItem + 'static,
        trigger: Trigger,
    ) {
        self.pending_insert = Some(InsertTokenCommand {
            mode: InsertMode::AtCursor,
            suggestion: Box::new(suggestion),
            trigger,
        });
    }

    /// Consume the pending single-slot commands, content replacement first.
    pub fn process_pending(&mut self) {
        if let Some(content) = self.pending_content.take() {
            self.apply_content(content);
        }
        if let Some(command) = self.pending_insert.take() {
            match command.mode {
                InsertMode::ReplaceTrigger => {
                    self.insert_replacing_trigger(command.suggestion.as_ref(), &command.trigger)
                }
                InsertMode::AtCursor => {
                    self.insert_at_cursor(command.suggestion.as_ref(), &command.trigger)
                }
            }
        }
    }

    /// Queue-and-process convenience for replace-trigger insertion.
    pub fn insert_token(
        &mut self,
        suggestion: impl SuggestionItem + 'static,
        trigger: Trigger,
    ) {
        self.queue_insert_token(suggestion, trigger);
        self.process_pending();
    }

    /// Queue-and-process convenience for at-cursor insertion.
    pub fn insert_token_at_cursor(
        &mut self,
        suggestion: impl SuggestionItem + 'static,
        trigger: Trigger,
    ) {
        self.queue_insert_token_at_cursor(suggestion, trigger);
        self.process_pending();
    }

    /// Queue-and-process convenience for content replacement.
    pub fn replace_content(&mut self, content: Content) {
        self.set_content(content);
        self.process_pending();
    }

    pub fn clear_content(&mut self) {
        self.replace_content(Content::default());
    }

    pub fn dismiss_composing(&mut self) {
        self.detector.dismiss();
    }

    /// Programmatic plain-text insertion at the selection (e.g. a toolbar
    /// button typing "@"). Runs through the normal edit pipeline.
    /// Consecutive identical insertions are suppressed until
    /// [`Self::clear_insert_dedup`] or a different string arrives.
    pub fn insert_plain_text(&mut self, text: &str) -> EditOutcome {
        if self.last_inserted_plain.as_deref() == Some(text) {
            return EditOutcome::Rejected(RejectReason::DuplicateInsert);
        }
        let outcome = self.propose_edit(self.selection, text);
        if outcome.is_applied() {
            self.last_inserted_plain = Some(text.to_string());
        }
        outcome
    }

    pub fn clear_insert_dedup(&mut self) {
        self.last_inserted_plain = None;
    }

    // ---- Internals --------------------------------------------------------

    fn commit_edit(&mut self, range: CharRange, replacement: &str) -> bool {
        self.doc.apply_edit(range, replacement);
        // Any committed change invalidates an armed confirmation.
        self.confirmer.clear();
        let caret = range.start + replacement.chars().count();
        self.selection = CharRange::caret(caret);
        if self.doc.is_empty() {
            self.detector.dismiss();
        }
        self.resync();
        self.doc.touches_tag(caret)
    }

    fn apply_content(&mut self, content: Content) {
        self.doc = render(&content, &self.configuration);
        self.selection = CharRange::caret(self.doc.len_chars());
        self.confirmer.clear();
        if self.doc.is_empty() {
            self.detector.dismiss();
        }
        self.resync();
    }

    fn insert_replacing_trigger(&mut self, suggestion: &dyn SuggestionItem, trigger: &Trigger) {
        let text_len = self.doc.len_chars();
        let sel_end = self.selection.end().min(text_len);
        let mut start = self.detector.anchor().min(text_len);

        if self.doc.char_at(start) != Some(trigger.character) {
            if start < text_len {
                // The text shifted under the anchor; the composing span is
                // gone.
                return self.insert_at_cursor(suggestion, trigger);
            }
            // Anchor sits at end-of-text: recover by scanning back from the
            // selection for the trigger character.
            match insert::scan_back_for_trigger(&self.doc, sel_end, trigger.character) {
                Some(found) => start = found,
                None => return self.insert_at_cursor(suggestion, trigger),
            }
        }
        if start >= text_len {
            return self.insert_at_cursor(suggestion, trigger);
        }

        let keyword_len = self.detector.keyword().chars().count();
        let composing_end = (start + 1 + keyword_len).min(text_len);
        let end = sel_end.max(composing_end);
        let range = CharRange::new(start, end - start);
        self.splice_token(range, suggestion, trigger);
    }

    fn insert_at_cursor(&mut self, suggestion: &dyn SuggestionItem, trigger: &Trigger) {
        let range = self.doc.clamp(self.selection);
        self.splice_token(range, suggestion, trigger);
    }

    fn splice_token(&mut self, range: CharRange, suggestion: &dyn SuggestionItem, trigger: &Trigger) {
        let run = insert::build_token_run(&self.configuration, suggestion, trigger);
        // Separator decision looks at the pre-edit character following the
        // replaced span.
        let append_separator = insert::needs_separator(&self.doc, range.end(), &self.style);
        let spliced = self.doc.splice_run(range, &run, trigger.style);
        let mut caret = range.start + spliced;
        if append_separator {
            self.doc.apply_edit(CharRange::caret(caret), " ");
            caret += 1;
        }
        self.selection = CharRange::caret(caret);
        self.detector.dismiss();
        self.confirmer.clear();
        self.resync();
        tracing::debug!(
            target: "engine.insert",
            token_type = run.token_type(),
            data = run.data(),
            at = range.start,
            separator = append_separator,
            "token inserted"
        );
    }

    fn delete_range(&mut self, range: CharRange) {
        let range = self.doc.clamp(range);
        if range.is_empty() {
            return;
        }
        self.doc.apply_edit(range, "");
        self.selection = CharRange::caret(range.start);
        if self.doc.is_empty() {
            self.detector.dismiss();
        }
        self.resync();
    }

    fn resync(&mut self) {
        self.content = parse(&self.doc);
        tracing::trace!(
            target: "engine.sync",
            chars = self.doc.len_chars(),
            runs = self.content.runs.len(),
            "content re-derived"
        );
    }
}

/// Minimal splice turning `old` into `new`: the char range outside the
/// common prefix/suffix and its replacement.
fn diff_splice(old: &str, new: &str) -> (CharRange, String) {
    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();

    let mut prefix = 0;
    while prefix < old_chars.len()
        && prefix < new_chars.len()
        && old_chars[prefix] == new_chars[prefix]
    {
        prefix += 1;
    }
    let mut suffix = 0;
    while suffix < old_chars.len() - prefix
        && suffix < new_chars.len() - prefix
        && old_chars[old_chars.len() - 1 - suffix] == new_chars[new_chars.len() - 1 - suffix]
    {
        suffix += 1;
    }
    let range = CharRange::new(prefix, old_chars.len() - prefix - suffix);
    let replacement: String = new_chars[prefix..new_chars.len() - suffix].iter().collect();
    (range, replacement)
}
