//! Read-only layout: measurement, line breaking, and the collapse/expand
//! truncation engine.
//!
//! Measurement is abstracted behind [`Measure`] so hosts with a real text
//! stack can plug their own metrics in; the default
//! [`MonospaceMeasure`] counts terminal-style cells via the grapheme width
//! engine. Layout is a greedy grapheme-boundary wrap — deliberately the
//! simplest model that makes truncation well-defined; it is never used for
//! editing, only to decide where collapsed content stops.

use unicode_segmentation::UnicodeSegmentation;

mod expand;
pub mod width;

pub use expand::{COLLAPSE_TYPE, EXPAND_TYPE, Expandable, Reflow, register_affordance_styles};
pub use width::{egc_width, str_width};

/// Text metrics provider. Widths and heights are in the host's units; the
/// default implementation uses cells with every line one unit tall.
pub trait Measure {
    fn width_of(&self, s: &str) -> u32;
    fn line_height(&self) -> u32 {
        1
    }
}

/// Cell-based metrics from the grapheme width engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonospaceMeasure;

impl Measure for MonospaceMeasure {
    fn width_of(&self, s: &str) -> u32 {
        str_width(s)
    }
}

/// One laid-out line: a char range into the source text (hard line breaks
/// excluded) and its height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub start: usize,
    pub len: usize,
    pub height: u32,
}

/// Greedy wrap of `text` at `width`, breaking at grapheme boundaries and
/// honoring hard newlines. A cluster wider than the whole line still gets
/// placed (overflowing) rather than looping.
pub fn layout_lines(text: &str, width: u32, measure: &dyn Measure) -> Vec<Line> {
    let mut lines = Vec::new();
    let height = measure.line_height();
    let mut line_start = 0usize;
    let mut line_width = 0u32;
    let mut offset = 0usize;

    for cluster in text.graphemes(true) {
        let cluster_chars = cluster.chars().count();
        if cluster == "\n" || cluster == "\r\n" {
            lines.push(Line {
                start: line_start,
                len: offset - line_start,
                height,
            });
            offset += cluster_chars;
            line_start = offset;
            line_width = 0;
            continue;
        }
        let w = measure.width_of(cluster);
        if line_width + w > width && offset > line_start {
            lines.push(Line {
                start: line_start,
                len: offset - line_start,
                height,
            });
            line_start = offset;
            line_width = 0;
        }
        line_width += w;
        offset += cluster_chars;
    }
    if offset > line_start {
        lines.push(Line {
            start: line_start,
            len: offset - line_start,
            height,
        });
    }
    lines
}
