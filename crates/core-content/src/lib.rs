//! Run-based content model.
//!
//! A document is an ordered sequence of [`Run`]s: plain text spans
//! interleaved with atomic, typed tokens. Tokens reference a business
//! entity through `data` (the primary key) and may carry an opaque
//! `payload` string (conventionally JSON) with extra rendering/business
//! fields the engine itself never interprets.
//!
//! Invariants:
//! * A token run's `display_text` is never empty.
//! * Adjacent text runs are permitted; no canonicalization pass merges
//!   them, and `plain_text` is insensitive to such splits.
//! * `logical_len() == plain_text().chars().count()` for every content
//!   value; tokens count as the length of their display text, never the
//!   length of their id or payload.
//!
//! All offsets and lengths in this workspace are Unicode scalar (char)
//! indices unless a type says otherwise; grapheme clusters only matter
//! for display width, which lives in the layout crate.

use std::any::Any;

use serde::{Deserialize, Serialize};

pub mod payload;
pub mod placeholder;

pub use payload::PayloadError;

/// Run type reserved for plain text in the serialized record form.
pub const TEXT_TYPE: &str = "text";
/// Built-in token type for `@` mentions.
pub const MENTION_TYPE: &str = "mention";
/// Built-in token type for `#topic#` tags.
pub const TOPIC_TYPE: &str = "topic";

/// One element of a [`Content`] sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Run {
    /// A plain text span.
    Text { display_text: String },
    /// An atomic, typed token. Indivisible under editing.
    Token {
        id: String,
        token_type: String,
        display_text: String,
        data: String,
        payload: Option<String>,
    },
}

impl Run {
    /// Plain text run.
    pub fn text(content: impl Into<String>) -> Self {
        Run::Text {
            display_text: content.into(),
        }
    }

    /// Token run with a derived stable id (`"{type}:{data}"`).
    pub fn token(
        token_type: impl Into<String>,
        display_text: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        let token_type = token_type.into();
        let display_text = display_text.into();
        let data = data.into();
        debug_assert!(!display_text.is_empty(), "token display text must be non-empty");
        Run::Token {
            id: format!("{token_type}:{data}"),
            token_type,
            display_text,
            data,
            payload: None,
        }
    }

    /// Mention token: `@name` referencing a user id.
    pub fn mention(id: impl Into<String>, name: &str) -> Self {
        let id = id.into();
        Run::token(MENTION_TYPE, format!("@{name}"), id)
    }

    /// Topic token: `#name#` referencing a topic id.
    pub fn topic(id: impl Into<String>, name: &str) -> Self {
        let id = id.into();
        Run::token(TOPIC_TYPE, format!("#{name}#"), id)
    }

    pub fn with_payload(mut self, value: Option<String>) -> Self {
        self.set_payload(value);
        self
    }

    /// Attach (or clear) the opaque payload. No-op for text runs.
    pub fn set_payload(&mut self, value: Option<String>) {
        if let Run::Token { payload, .. } = self {
            *payload = value;
        }
    }

    pub fn display_text(&self) -> &str {
        match self {
            Run::Text { display_text } | Run::Token { display_text, .. } => display_text,
        }
    }

    /// Logical length in chars (see module docs).
    pub fn logical_len(&self) -> usize {
        self.display_text().chars().count()
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Run::Text { .. })
    }

    pub fn is_token(&self) -> bool {
        matches!(self, Run::Token { .. })
    }

    /// Token type, or [`TEXT_TYPE`] for text runs.
    pub fn token_type(&self) -> &str {
        match self {
            Run::Text { .. } => TEXT_TYPE,
            Run::Token { token_type, .. } => token_type,
        }
    }

    pub fn data(&self) -> &str {
        match self {
            Run::Text { .. } => "",
            Run::Token { data, .. } => data,
        }
    }

    pub fn payload(&self) -> Option<&str> {
        match self {
            Run::Text { .. } => None,
            Run::Token { payload, .. } => payload.as_deref(),
        }
    }

    pub fn is_mention(&self) -> bool {
        self.is_token() && self.token_type() == MENTION_TYPE
    }

    pub fn is_topic(&self) -> bool {
        self.is_token() && self.token_type() == TOPIC_TYPE
    }
}

/// Serialized shape of a run: one flat record per run, text runs included
/// with `type == "text"`. This is the persisted/exchange form; `plain_text`
/// is always recomputable from it.
#[derive(Debug, Serialize, Deserialize)]
struct RunRecord {
    #[serde(default)]
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "displayText")]
    display_text: String,
    #[serde(default)]
    data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<String>,
}

impl Serialize for Run {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let record = match self {
            Run::Text { display_text } => RunRecord {
                id: String::new(),
                kind: TEXT_TYPE.to_string(),
                display_text: display_text.clone(),
                data: display_text.clone(),
                payload: None,
            },
            Run::Token {
                id,
                token_type,
                display_text,
                data,
                payload,
            } => RunRecord {
                id: id.clone(),
                kind: token_type.clone(),
                display_text: display_text.clone(),
                data: data.clone(),
                payload: payload.clone(),
            },
        };
        record.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Run {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = RunRecord::deserialize(deserializer)?;
        if record.kind == TEXT_TYPE {
            return Ok(Run::Text {
                display_text: record.display_text,
            });
        }
        let id = if record.id.is_empty() {
            format!("{}:{}", record.kind, record.data)
        } else {
            record.id
        };
        Ok(Run::Token {
            id,
            token_type: record.kind,
            display_text: record.display_text,
            data: record.data,
            payload: record.payload,
        })
    }
}

/// Ordered sequence of runs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Content {
    pub runs: Vec<Run>,
}

impl Content {
    pub fn new(runs: Vec<Run>) -> Self {
        Self { runs }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn push(&mut self, run: Run) {
        self.runs.push(run);
    }

    /// Concatenation of every run's display text, in order. The canonical
    /// human-readable projection of the content.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(Run::display_text).collect()
    }

    /// Char count of [`Self::plain_text`], computed without materializing it.
    pub fn logical_len(&self) -> usize {
        self.runs.iter().map(Run::logical_len).sum()
    }

    /// All token runs of the given type, in document order.
    pub fn runs_of_type<'a>(&'a self, token_type: &'a str) -> impl Iterator<Item = &'a Run> {
        self.runs
            .iter()
            .filter(move |run| run.is_token() && run.token_type() == token_type)
    }

    pub fn mentions(&self) -> Vec<&Run> {
        self.runs_of_type(MENTION_TYPE).collect()
    }

    pub fn topics(&self) -> Vec<&Run> {
        self.runs_of_type(TOPIC_TYPE).collect()
    }
}

impl FromIterator<Run> for Content {
    fn from_iter<I: IntoIterator<Item = Run>>(iter: I) -> Self {
        Self {
            runs: iter.into_iter().collect(),
        }
    }
}

/// Capability interface for candidate items a trigger search produces.
///
/// Business layers define richer suggestion types (avatar, lock state, …)
/// and recover them behind this interface via [`SuggestionItem::as_any`];
/// the engine itself only ever needs the id and the display name.
pub trait SuggestionItem: Any {
    fn id(&self) -> &str;
    fn display_name(&self) -> &str;
    /// Escape hatch for typed data builders; implement as `self`.
    fn as_any(&self) -> &dyn Any;
}

/// Built-in mention candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionSuggestion {
    pub id: String,
    pub name: String,
}

impl MentionSuggestion {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl SuggestionItem for MentionSuggestion {
    fn id(&self) -> &str {
        &self.id
    }
    fn display_name(&self) -> &str {
        &self.name
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Built-in topic candidate; `count` is a popularity hint for panels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSuggestion {
    pub id: String,
    pub name: String,
    pub count: u64,
}

impl TopicSuggestion {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            count: 0,
        }
    }
}

impl SuggestionItem for TopicSuggestion {
    fn id(&self) -> &str {
        &self.id
    }
    fn display_name(&self) -> &str {
        &self.name
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}
