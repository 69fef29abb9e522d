//! Collapse/expand truncation for read-only display.
//!
//! [`Expandable`] holds the base content plus the collapse state and
//! recomputes the visible content only when the width, the content, or the
//! expand flag changes — never per scroll or per repaint. Collapsed output
//! ends in a synthetic expand-affordance token; expanded output appends a
//! collapse token. Both route through the normal per-type tap dispatch and
//! toggle the flag via [`Expandable::handle_tap`].

use bitflags::bitflags;

use core_config::{EditorConfiguration, EditorStyle, TokenStyle, Trigger};
use core_content::{Content, Run};

use crate::{Line, Measure, layout_lines};

/// Token type of the synthetic "expand" affordance.
pub const EXPAND_TYPE: &str = "_expand";
/// Token type of the synthetic "collapse" affordance.
pub const COLLAPSE_TYPE: &str = "_collapse";

bitflags! {
    /// What changed since the last computation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Reflow: u8 {
        const WIDTH = 1;
        const CONTENT = 2;
        const TOGGLE = 4;
    }
}

/// Style-only triggers for the affordance types so the renderer can color
/// them. The characters are private-use codepoints no keyboard produces;
/// the registrations exist purely for style lookup by token type.
pub fn register_affordance_styles(config: &mut EditorConfiguration, style: TokenStyle) {
    config.register_trigger(Trigger::new('\u{F8FE}', EXPAND_TYPE, "", style));
    config.register_trigger(Trigger::new('\u{F8FF}', COLLAPSE_TYPE, "", style));
}

#[derive(Debug, Clone)]
struct Computed {
    visible: Content,
    truncated: bool,
    full_height: u32,
}

pub struct Expandable<M: Measure> {
    base: Content,
    measure: M,
    style: EditorStyle,
    width: u32,
    max_collapsed_height: u32,
    /// Slack added to the height check; zero for unit-tall lines, small
    /// for pixel-based measurers where rounding jitter is expected.
    height_epsilon: u32,
    expanded: bool,
    dirty: Reflow,
    cache: Option<Computed>,
}

impl<M: Measure> Expandable<M> {
    pub fn new(base: Content, max_collapsed_height: u32, style: EditorStyle, measure: M) -> Self {
        Self {
            base,
            measure,
            style,
            width: 0,
            max_collapsed_height,
            height_epsilon: 0,
            expanded: false,
            dirty: Reflow::CONTENT,
            cache: None,
        }
    }

    pub fn with_height_epsilon(mut self, epsilon: u32) -> Self {
        self.height_epsilon = epsilon;
        self
    }

    pub fn set_width(&mut self, width: u32) {
        if self.width != width {
            self.width = width;
            self.dirty |= Reflow::WIDTH;
        }
    }

    pub fn set_content(&mut self, content: Content) {
        self.base = content;
        self.dirty |= Reflow::CONTENT;
    }

    pub fn set_expanded(&mut self, expanded: bool) {
        if self.expanded != expanded {
            self.expanded = expanded;
            self.dirty |= Reflow::TOGGLE;
        }
    }

    pub fn toggle(&mut self) {
        self.expanded = !self.expanded;
        self.dirty |= Reflow::TOGGLE;
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn base(&self) -> &Content {
        &self.base
    }

    /// Route a tapped run; toggles on the affordance types and reports
    /// whether the tap was consumed.
    pub fn handle_tap(&mut self, run: &Run) -> bool {
        match run.token_type() {
            EXPAND_TYPE => {
                self.set_expanded(true);
                true
            }
            COLLAPSE_TYPE => {
                self.set_expanded(false);
                true
            }
            _ => false,
        }
    }

    /// The content to display right now. Recomputes only when a width,
    /// content, or toggle change is pending.
    pub fn visible(&mut self) -> &Content {
        &self.computed().visible
    }

    /// Whether the base content overflows the collapsed height at the
    /// current width.
    pub fn is_truncated(&mut self) -> bool {
        self.computed().truncated
    }

    /// Laid-out height of the full (untruncated) content.
    pub fn full_height(&mut self) -> u32 {
        self.computed().full_height
    }

    fn computed(&mut self) -> &Computed {
        if self.cache.is_none() || !self.dirty.is_empty() {
            let computed = self.recompute();
            tracing::debug!(
                target: "layout.truncate",
                width = self.width,
                full_height = computed.full_height,
                truncated = computed.truncated,
                expanded = self.expanded,
                reflow = ?self.dirty,
                "recomputed visible content"
            );
            self.cache = Some(computed);
            self.dirty = Reflow::empty();
        }
        match &self.cache {
            Some(computed) => computed,
            None => unreachable!("cache filled above"),
        }
    }

    fn recompute(&self) -> Computed {
        if self.width == 0 {
            // Width unknown yet: show the base content rather than a blank.
            return Computed {
                visible: self.base.clone(),
                truncated: false,
                full_height: 0,
            };
        }
        let plain = self.base.plain_text();
        let lines = layout_lines(&plain, self.width, &self.measure);
        let full_height: u32 = lines.iter().map(|l| l.height).sum();

        if full_height <= self.max_collapsed_height + self.height_epsilon {
            return Computed {
                visible: self.base.clone(),
                truncated: false,
                full_height,
            };
        }
        if self.expanded {
            let mut runs = self.base.runs.clone();
            runs.push(Run::token(
                COLLAPSE_TYPE,
                self.style.collapse_text.clone(),
                COLLAPSE_TYPE,
            ));
            return Computed {
                visible: Content::new(runs),
                truncated: true,
                full_height,
            };
        }
        Computed {
            visible: self.truncate(&plain, &lines),
            truncated: true,
            full_height,
        }
    }

    fn truncate(&self, plain: &str, lines: &[Line]) -> Content {
        // Last fully fitting line, or line 0 if even the first overflows.
        let mut acc = 0u32;
        let mut truncate_idx = 0usize;
        for (i, line) in lines.iter().enumerate() {
            if acc + line.height > self.max_collapsed_height {
                truncate_idx = i.saturating_sub(1);
                break;
            }
            acc += line.height;
            truncate_idx = i;
        }
        let line = &lines[truncate_idx];

        let suffix_width = self.measure.width_of(&self.style.ellipsis)
            + self.measure.width_of(&self.style.expand_text);
        let line_chars: Vec<char> = plain
            .chars()
            .skip(line.start)
            .take(line.len)
            .collect();

        // Widest char-count prefix whose width plus the suffix still fits.
        let mut lo = 0usize;
        let mut hi = line.len;
        while lo < hi {
            let mid = (lo + hi + 1) / 2;
            let prefix: String = line_chars[..mid].iter().collect();
            if self.measure.width_of(&prefix) + suffix_width <= self.width {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        let cut = line.start + lo;

        let mut runs = Vec::new();
        let mut pos = 0usize;
        for run in &self.base.runs {
            let len = run.logical_len();
            if pos + len <= cut {
                runs.push(run.clone());
                pos += len;
                continue;
            }
            if run.is_text() {
                let keep = cut - pos;
                if keep > 0 {
                    let prefix: String = run.display_text().chars().take(keep).collect();
                    runs.push(Run::text(prefix));
                }
            }
            // A token straddling the boundary is dropped whole; tokens are
            // never partially rendered.
            break;
        }
        runs.push(Run::token(
            EXPAND_TYPE,
            self.style.expand_text.clone(),
            EXPAND_TYPE,
        ));
        Content::new(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MonospaceMeasure;
    use std::cell::Cell;
    use std::rc::Rc;

    fn style() -> EditorStyle {
        EditorStyle {
            ellipsis: "...".into(),
            expand_text: "~more".into(),
            collapse_text: "~less".into(),
            ..EditorStyle::default()
        }
    }

    fn expandable(content: Content, max_height: u32) -> Expandable<MonospaceMeasure> {
        Expandable::new(content, max_height, style(), MonospaceMeasure)
    }

    #[test]
    fn fitting_content_is_returned_unchanged() {
        let content = Content::new(vec![Run::text("short")]);
        let mut exp = expandable(content.clone(), 2);
        exp.set_width(10);
        assert_eq!(*exp.visible(), content);
        assert!(!exp.is_truncated());
        assert_eq!(exp.full_height(), 1);
    }

    #[test]
    fn overflow_truncates_with_an_expand_affordance() {
        // Three 20-cell lines at width 20; two fit.
        let content = Content::new(vec![Run::text("a".repeat(60))]);
        let mut exp = expandable(content, 2);
        exp.set_width(20);
        let visible = exp.visible().clone();
        assert!(exp.is_truncated());
        assert_eq!(exp.full_height(), 3);

        let last = visible.runs.last().unwrap();
        assert_eq!(last.token_type(), EXPAND_TYPE);
        // Suffix reserves 3 + 5 = 8 cells: the cut line keeps 12 chars.
        assert_eq!(visible.plain_text(), format!("{}~more", "a".repeat(32)));
    }

    #[test]
    fn first_line_overflow_truncates_line_zero() {
        let content = Content::new(vec![Run::text("b".repeat(40))]);
        let mut exp = expandable(content, 0);
        exp.set_width(20);
        let visible = exp.visible().clone();
        assert_eq!(visible.plain_text(), format!("{}~more", "b".repeat(12)));
    }

    #[test]
    fn expanded_state_appends_a_collapse_affordance() {
        let content = Content::new(vec![Run::text("a".repeat(60))]);
        let mut exp = expandable(content.clone(), 2);
        exp.set_width(20);
        exp.set_expanded(true);
        let visible = exp.visible().clone();
        assert_eq!(visible.runs.len(), 2);
        assert_eq!(visible.runs.last().unwrap().token_type(), COLLAPSE_TYPE);
        assert_eq!(
            visible.plain_text(),
            format!("{}~less", content.plain_text())
        );
    }

    #[test]
    fn collapse_then_expand_preserves_the_plain_text() {
        let content = Content::new(vec![
            Run::text("hello ".repeat(10)),
            Run::mention("u1", "alice"),
        ]);
        let mut exp = expandable(content.clone(), 1);
        exp.set_width(12);
        let _ = exp.visible();
        exp.handle_tap(&Run::token(EXPAND_TYPE, "~more", EXPAND_TYPE));
        let expanded = exp.visible().clone();
        let stripped: Vec<&Run> = expanded
            .runs
            .iter()
            .filter(|r| r.token_type() != COLLAPSE_TYPE && r.token_type() != EXPAND_TYPE)
            .collect();
        let stripped_plain: String = stripped.iter().map(|r| r.display_text()).collect();
        assert_eq!(stripped_plain, content.plain_text());
    }

    #[test]
    fn token_straddling_the_cut_is_dropped_whole() {
        // Width 10, height 1. Line 0 is "aaaaaaaa@b" — the mention starts
        // at char 8 and the suffix needs 8 cells, so the cut lands at 2,
        // inside no token; tighten so it lands inside the mention.
        let content = Content::new(vec![
            Run::text("abc"),
            Run::mention("u1", "verylongname"),
            Run::text(" tail tail tail"),
        ]);
        let mut exp = expandable(content, 1);
        exp.set_width(12);
        let visible = exp.visible().clone();
        // Cut = 4: inside the token, which is dropped whole.
        assert_eq!(visible.runs.len(), 2);
        assert_eq!(visible.runs[0].display_text(), "abc");
        assert_eq!(visible.runs[1].token_type(), EXPAND_TYPE);
    }

    #[test]
    fn tap_routing_toggles_both_ways() {
        let content = Content::new(vec![Run::text("x".repeat(100))]);
        let mut exp = expandable(content, 1);
        exp.set_width(10);
        assert!(!exp.is_expanded());
        assert!(exp.handle_tap(&Run::token(EXPAND_TYPE, "~more", EXPAND_TYPE)));
        assert!(exp.is_expanded());
        assert!(exp.handle_tap(&Run::token(COLLAPSE_TYPE, "~less", COLLAPSE_TYPE)));
        assert!(!exp.is_expanded());
        assert!(!exp.handle_tap(&Run::mention("u1", "a")), "foreign taps pass through");
    }

    #[test]
    fn unknown_width_shows_the_base_content() {
        let content = Content::new(vec![Run::text("y".repeat(100))]);
        let mut exp = expandable(content.clone(), 1);
        assert_eq!(*exp.visible(), content);
        assert!(!exp.is_truncated());
    }

    struct CountingMeasure {
        calls: Rc<Cell<usize>>,
    }

    impl Measure for CountingMeasure {
        fn width_of(&self, s: &str) -> u32 {
            self.calls.set(self.calls.get() + 1);
            crate::str_width(s)
        }
    }

    #[test]
    fn recompute_happens_only_on_width_content_or_toggle() {
        let calls = Rc::new(Cell::new(0usize));
        let content = Content::new(vec![Run::text("z".repeat(50))]);
        let mut exp = Expandable::new(
            content,
            1,
            style(),
            CountingMeasure { calls: calls.clone() },
        );
        exp.set_width(10);
        let _ = exp.visible();
        let after_first = calls.get();
        assert!(after_first > 0);

        // Repaint-style queries do not re-measure.
        let _ = exp.visible();
        let _ = exp.is_truncated();
        assert_eq!(calls.get(), after_first);

        // Same width again is not a change.
        exp.set_width(10);
        let _ = exp.visible();
        assert_eq!(calls.get(), after_first);

        // A real width change re-measures.
        exp.set_width(11);
        let _ = exp.visible();
        assert!(calls.get() > after_first);
    }

    #[test]
    fn affordance_style_registration_targets_both_types() {
        let mut config = EditorConfiguration::new();
        register_affordance_styles(&mut config, TokenStyle::default());
        assert!(config.trigger_for_type(EXPAND_TYPE).is_some());
        assert!(config.trigger_for_type(COLLAPSE_TYPE).is_some());
    }
}
