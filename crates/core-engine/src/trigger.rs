//! Trigger detection state machine.
//!
//! Runs ahead of every prospective edit and tracks the live composing
//! session between a trigger keystroke (`@`, `#`, …) and its resolution.
//! Evaluation never vetoes an edit; rejection is the deletion confirmer's
//! job. Rules apply in order:
//!
//! 1. The replacement is a registered trigger character: enter composing
//!    with the edit start as the anchor (restarts any session in flight).
//! 2. Not composing: no-op.
//! 3. Composing and the replacement is a single space/newline/tab: dismiss.
//! 4. Composing and the edit deletes back to (or past) the anchor: dismiss.
//! 5. Otherwise recompute the keyword from the simulated post-edit text.

use core_config::EditorConfiguration;
use core_flat::{CharRange, FlatDocument};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TriggerState {
    #[default]
    Idle,
    Composing {
        trigger_char: char,
        anchor: usize,
        keyword: String,
    },
}

#[derive(Debug, Default)]
pub struct TriggerDetector {
    state: TriggerState,
    /// Survives dismissal so token insertion can still locate the trigger
    /// character the session started from.
    last_anchor: usize,
}

impl TriggerDetector {
    pub fn state(&self) -> &TriggerState {
        &self.state
    }

    pub fn is_composing(&self) -> bool {
        matches!(self.state, TriggerState::Composing { .. })
    }

    pub fn active_char(&self) -> Option<char> {
        match self.state {
            TriggerState::Composing { trigger_char, .. } => Some(trigger_char),
            TriggerState::Idle => None,
        }
    }

    /// Live search keyword; empty while idle.
    pub fn keyword(&self) -> &str {
        match &self.state {
            TriggerState::Composing { keyword, .. } => keyword,
            TriggerState::Idle => "",
        }
    }

    /// Offset of the most recent trigger character.
    pub fn anchor(&self) -> usize {
        self.last_anchor
    }

    pub fn dismiss(&mut self) {
        if self.is_composing() {
            tracing::debug!(target: "engine.trigger", "composing dismissed");
        }
        self.state = TriggerState::Idle;
    }

    /// Evaluate a prospective edit (`range` already clamped by the caller)
    /// and update the state machine. Never rejects.
    pub fn evaluate(
        &mut self,
        config: &EditorConfiguration,
        doc: &FlatDocument,
        range: CharRange,
        replacement: &str,
    ) {
        let mut chars = replacement.chars();
        if let (Some(c), None) = (chars.next(), chars.next())
            && config.is_trigger_char(c)
        {
            self.state = TriggerState::Composing {
                trigger_char: c,
                anchor: range.start,
                keyword: String::new(),
            };
            self.last_anchor = range.start;
            tracing::debug!(
                target: "engine.trigger",
                trigger = %c,
                anchor = range.start,
                "composing started"
            );
            return;
        }

        let anchor = match &self.state {
            TriggerState::Composing { anchor, .. } => *anchor,
            TriggerState::Idle => return,
        };

        if matches!(replacement, " " | "\n" | "\t") {
            self.dismiss();
            return;
        }
        if replacement.is_empty() && range.start <= anchor {
            self.dismiss();
            return;
        }
        self.recompute_keyword(doc, range, replacement, anchor);
    }

    fn recompute_keyword(
        &mut self,
        doc: &FlatDocument,
        range: CharRange,
        replacement: &str,
        anchor: usize,
    ) {
        // Simulate the edit; the composing window is short so the copy is
        // cheap relative to a keystroke.
        let pre: Vec<char> = doc.plain_text().chars().collect();
        let mut post: Vec<char> = pre[..range.start].to_vec();
        post.extend(replacement.chars());
        post.extend(&pre[range.end()..]);

        let start = (anchor + 1).min(post.len());
        let cursor = (range.start + replacement.chars().count()).min(post.len());
        let keyword: String = if cursor <= start {
            String::new()
        } else {
            post[start..cursor]
                .iter()
                .take_while(|&&c| c != ' ' && c != '\n' && c != '\t')
                .collect()
        };
        tracing::trace!(target: "engine.trigger", keyword = %keyword, "keyword updated");
        if let TriggerState::Composing { keyword: slot, .. } = &mut self.state {
            *slot = keyword;
        }
    }
}
