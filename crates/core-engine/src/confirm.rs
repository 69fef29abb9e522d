//! Two-phase deletion confirmation for atomic tokens.
//!
//! A single backspace that first touches a token does not delete anything:
//! the engine selects the token's whole range (the visual confirmation)
//! and rejects the edit. The follow-up deletion of exactly that range goes
//! through. Multi-character selection deletes bypass confirmation
//! entirely. The pending range is owned here exclusively; the host only
//! observes it through the selection the engine hands back.

use core_flat::{CharRange, FlatDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmDecision {
    /// No token involved; the deletion proceeds.
    Allow,
    /// The confirming second deletion of the pending range; proceeds.
    AllowConfirmed,
    /// First touch: the host selection must move to `select` and the edit
    /// is rejected.
    Reject { select: CharRange },
    /// A stale pending range (the selection drifted since it was armed):
    /// the engine deletes `delete` programmatically and rejects the
    /// incoming edit so the user never deletes something they cannot see
    /// selected.
    RejectStale { delete: CharRange },
}

#[derive(Debug, Default)]
pub struct DeleteConfirmer {
    pending: Option<CharRange>,
}

impl DeleteConfirmer {
    pub fn pending(&self) -> Option<CharRange> {
        self.pending
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }

    /// Evaluate a prospective deletion of `range` (non-empty, clamped).
    pub fn evaluate(&mut self, doc: &FlatDocument, range: CharRange) -> ConfirmDecision {
        if range.len > 1 {
            // Batch deletes bypass confirmation; deleting a selection the
            // user made is already explicit.
            self.pending = None;
            return ConfirmDecision::Allow;
        }

        let is_whitespace = doc
            .char_at(range.start)
            .is_some_and(char::is_whitespace);

        let token_range = atomic_hit(doc, range).or_else(|| {
            // Deleting the separator right after a token consumes the
            // token in the same confirm cycle.
            if is_whitespace && range.start > 0 {
                atomic_hit(doc, CharRange::new(range.start - 1, 1))
            } else {
                None
            }
        });

        let Some(token_range) = token_range else {
            self.pending = None;
            return ConfirmDecision::Allow;
        };

        // Only the single whitespace char immediately after the token is
        // absorbed; longer separator runs delete as ordinary text first.
        let confirm = if is_whitespace && range.start == token_range.end() {
            CharRange::new(token_range.start, token_range.len + 1)
        } else {
            token_range
        };

        if let Some(pending) = self.pending
            && pending.intersects(token_range)
        {
            self.pending = None;
            if range == pending {
                return ConfirmDecision::AllowConfirmed;
            }
            return ConfirmDecision::RejectStale { delete: pending };
        }

        self.pending = Some(confirm);
        ConfirmDecision::Reject { select: confirm }
    }

    /// Any externally observed selection that no longer intersects the
    /// pending range disarms it silently.
    pub fn on_selection_changed(&mut self, selection: CharRange) {
        if let Some(pending) = self.pending
            && !selection.intersects(pending)
        {
            self.pending = None;
        }
    }
}

fn atomic_hit(doc: &FlatDocument, range: CharRange) -> Option<CharRange> {
    doc.tags()
        .iter()
        .find(|tag| tag.atomic && tag.range().intersects(range))
        .map(|tag| tag.range())
}
