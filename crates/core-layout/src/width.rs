//! Grapheme cluster display width.
//!
//! One authoritative function, [`egc_width`], maps a single grapheme
//! cluster to its display width in cells; no caller measures width any
//! other way. The baseline comes from `unicode-width`, corrected for the
//! composite emoji forms it underestimates (ZWJ sequences, flags,
//! keycaps). The bias is deliberate: over-estimating costs a blank cell,
//! under-estimating drifts every column after it.

const ZWJ: char = '\u{200D}';

fn is_regional_indicator(c: char) -> bool {
    ('\u{1F1E6}'..='\u{1F1FF}').contains(&c)
}

// Rough Extended Pictographic check covering the primary emoji blocks plus
// the legacy symbol ranges commonly rendered as emoji.
fn is_pictographic(c: char) -> bool {
    ('\u{1F300}'..='\u{1FAFF}').contains(&c) || ('\u{2600}'..='\u{27BF}').contains(&c)
}

/// Display width in cells of a single grapheme cluster.
///
/// Precondition: `egc` is one grapheme boundary slice; segmentation happens
/// at the caller, this function does not re-validate.
pub fn egc_width(egc: &str) -> u32 {
    if egc.is_empty() {
        return 0;
    }
    let base = unicode_width::UnicodeWidthStr::width(egc) as u32;

    let mut has_zwj = false;
    let mut has_signal = false;
    for c in egc.chars() {
        if c == ZWJ {
            has_zwj = true;
        }
        if is_pictographic(c) || is_regional_indicator(c) {
            has_signal = true;
        }
    }
    // A ZWJ-joined pictographic sequence renders as one glyph; the
    // per-scalar sum wildly overshoots it.
    if has_zwj && has_signal {
        return 2;
    }
    // Keycaps, lone regional indicators, and VS16 forms the baseline
    // reports narrow.
    if base < 2 && has_signal {
        return 2;
    }
    base
}

/// Display width of a whole string: grapheme-segmented sum of cluster
/// widths.
pub fn str_width(s: &str) -> u32 {
    use unicode_segmentation::UnicodeSegmentation;
    s.graphemes(true).map(egc_width).sum()
}
