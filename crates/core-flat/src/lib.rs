//! Flat representation and content synchronizer.
//!
//! The host text surface renders and edits a linear string; token identity
//! lives out-of-band as [`TokenTag`] ranges attached to that string. This
//! crate owns both directions of the synchronization:
//!
//! * [`render`]: content model -> flat document. Deterministic; the same
//!   content and configuration always yield byte-identical text and tag
//!   placement.
//! * [`parse`]: flat document -> content model. The only path that updates
//!   the externally observable content; invoked after every committed edit
//!   and after every programmatic replacement.
//!
//! Edits splice the rope at char indices and adjust tags: tags after the
//! edit shift by the length delta, tags the edit cuts into are dropped
//! whole so their surviving glyphs degrade to plain text on the next
//! parse. A tag is never left covering a half-token.

use ropey::Rope;

use core_config::{EditorConfiguration, TokenStyle};
use core_content::{Content, Run};

/// Half-open char range `[start, start+len)` into a flat document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharRange {
    pub start: usize,
    pub len: usize,
}

impl CharRange {
    pub const fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Zero-length range (a caret position).
    pub const fn caret(at: usize) -> Self {
        Self { start: at, len: 0 }
    }

    pub const fn end(&self) -> usize {
        self.start + self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end()
    }

    /// True when both ranges are non-empty and genuinely overlap. Carets
    /// never intersect anything.
    pub fn intersects(&self, other: CharRange) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.start.max(other.start) < self.end().min(other.end())
    }
}

/// Out-of-band metadata for one token's occupied range: the tag bundle the
/// host reads for styling/taps plus the atomic marker the deletion
/// protocol keys on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTag {
    pub start: usize,
    pub len: usize,
    pub token_type: String,
    pub data: String,
    pub display_text: String,
    pub payload: Option<String>,
    pub style: TokenStyle,
    /// Tokens are indivisible under single-character deletion when set.
    pub atomic: bool,
}

impl TokenTag {
    pub fn range(&self) -> CharRange {
        CharRange::new(self.start, self.len)
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Linear text plus ordered, non-overlapping token tags.
#[derive(Debug, Clone, Default)]
pub struct FlatDocument {
    text: Rope,
    tags: Vec<TokenTag>,
}

impl FlatDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            text: Rope::from_str(text),
            tags: Vec::new(),
        }
    }

    pub fn len_chars(&self) -> usize {
        self.text.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.text.len_chars() == 0
    }

    /// The full flat text. What the host surface displays and edits.
    pub fn plain_text(&self) -> String {
        self.text.to_string()
    }

    pub fn char_at(&self, idx: usize) -> Option<char> {
        self.text.get_char(idx)
    }

    /// Slice by char range, clamped to the document.
    pub fn slice(&self, range: CharRange) -> String {
        let range = self.clamp(range);
        self.text.slice(range.start..range.end()).to_string()
    }

    pub fn tags(&self) -> &[TokenTag] {
        &self.tags
    }

    /// Clamp an incoming edit range to the document bounds. Host-supplied
    /// ranges are untrusted (the surface may race its own reflows).
    pub fn clamp(&self, range: CharRange) -> CharRange {
        let max = self.len_chars();
        let start = range.start.min(max);
        let len = range.len.min(max - start);
        CharRange::new(start, len)
    }

    /// First tag genuinely overlapping `range`.
    pub fn tag_intersecting(&self, range: CharRange) -> Option<&TokenTag> {
        self.tags.iter().find(|tag| tag.range().intersects(range))
    }

    /// Tag whose occupied range ends exactly at `pos`.
    pub fn tag_ending_at(&self, pos: usize) -> Option<&TokenTag> {
        self.tags.iter().find(|tag| tag.end() == pos)
    }

    /// True when `pos` is adjacent to (or inside) any tagged range. Used to
    /// signal the host to reset its typing style at token boundaries.
    pub fn touches_tag(&self, pos: usize) -> bool {
        self.tags
            .iter()
            .any(|tag| tag.start <= pos && pos <= tag.end())
    }

    /// Logical length of a range: tokens it touches count as the length of
    /// their stored display text (however much of them the range covers),
    /// untagged chars count one each.
    pub fn logical_len_of(&self, range: CharRange) -> usize {
        let range = self.clamp(range);
        if range.is_empty() {
            return 0;
        }
        let mut token_chars = 0;
        let mut covered = 0;
        for tag in &self.tags {
            if tag.range().intersects(range) {
                token_chars += tag.display_text.chars().count();
                let overlap =
                    tag.end().min(range.end()) - tag.start.max(range.start);
                covered += overlap;
            }
        }
        token_chars + (range.len - covered)
    }

    /// Replace `range` with `replacement`, shifting or dropping tags as
    /// described in the module docs.
    pub fn apply_edit(&mut self, range: CharRange, replacement: &str) {
        let range = self.clamp(range);
        let rep_chars = replacement.chars().count();
        self.text.remove(range.start..range.end());
        self.text.insert(range.start, replacement);

        let removed = range.len;
        self.tags.retain_mut(|tag| {
            if tag.end() <= range.start {
                return true;
            }
            let shiftable = if range.is_empty() {
                tag.start >= range.start
            } else {
                tag.start >= range.end()
            };
            if shiftable {
                tag.start = tag.start - removed + rep_chars;
                return true;
            }
            // The edit cuts into this token: drop the tag whole.
            tracing::trace!(
                target: "flat.edit",
                token_type = tag.token_type.as_str(),
                data = tag.data.as_str(),
                "edit severed token tag"
            );
            false
        });
    }

    /// Replace `range` with a run: display text is spliced in and, for
    /// token runs, a covering tag is inserted. Returns the char length of
    /// the spliced display text.
    pub fn splice_run(&mut self, range: CharRange, run: &Run, style: TokenStyle) -> usize {
        let range = self.clamp(range);
        let display = run.display_text().to_string();
        self.apply_edit(range, &display);
        let len = display.chars().count();
        if run.is_token() && len > 0 {
            self.push_tag(TokenTag {
                start: range.start,
                len,
                token_type: run.token_type().to_string(),
                data: run.data().to_string(),
                display_text: display,
                payload: run.payload().map(str::to_string),
                style,
                atomic: true,
            });
        }
        len
    }

    /// Attach a tag directly. Intended for hosts rebuilding a document
    /// from out-of-band metadata; `splice_run` is the editing-path way to
    /// create tags. Tags must not overlap.
    pub fn push_tag(&mut self, tag: TokenTag) {
        debug_assert!(tag.len > 0, "tags never cover an empty range");
        debug_assert!(
            self.tags.iter().all(|t| !t.range().intersects(tag.range())),
            "tags must not overlap"
        );
        let idx = self.tags.partition_point(|t| t.start < tag.start);
        self.tags.insert(idx, tag);
    }
}

/// Render content into a fresh flat document.
pub fn render(content: &Content, config: &EditorConfiguration) -> FlatDocument {
    let mut doc = FlatDocument::new();
    for run in &content.runs {
        let at = CharRange::caret(doc.len_chars());
        match run {
            Run::Text { .. } => {
                doc.apply_edit(at, run.display_text());
            }
            Run::Token { token_type, .. } => {
                let style = config
                    .trigger_for_type(token_type)
                    .map(|t| t.style)
                    .unwrap_or_default();
                doc.splice_run(at, run, style);
            }
        }
    }
    doc
}

/// Parse a flat document back into content. Tagged ranges become token
/// runs (stored display text preferred; the literal substring is the
/// fallback for hosts that substituted a placeholder glyph), untagged gaps
/// collapse into single text runs. Unknown token types still reconstruct
/// from the tag bundle alone.
pub fn parse(doc: &FlatDocument) -> Content {
    let mut runs = Vec::new();
    let mut cursor = 0;
    for tag in doc.tags() {
        if tag.start > cursor {
            runs.push(Run::text(doc.slice(CharRange::new(
                cursor,
                tag.start - cursor,
            ))));
        }
        let literal = doc.slice(tag.range());
        let display = if tag.display_text.is_empty() {
            literal
        } else {
            tag.display_text.clone()
        };
        runs.push(
            Run::token(tag.token_type.clone(), display, tag.data.clone())
                .with_payload(tag.payload.clone()),
        );
        cursor = tag.end();
    }
    let total = doc.len_chars();
    if cursor < total {
        runs.push(Run::text(doc.slice(CharRange::new(cursor, total - cursor))));
    }
    Content::new(runs)
}
