//! Editor configuration: trigger and token-type registries, style knobs,
//! the character budget, and `runtext.toml` loading.
//!
//! Registries are plain values injected into each editor session at
//! construction time, never process-wide singletons: two editors on screen
//! must not share trigger state, and tests get isolation for free. At most
//! one trigger may be registered per character and one token config per
//! token type.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use core_content::{Run, SuggestionItem, payload};

pub mod defaults;
mod file;

pub use file::{
    Config, ConfigFile, LimitSection, SeparatorSection, TruncationSection, discover, load_from,
};

/// 24-bit color carried by token styles. The engine never interprets it;
/// the host surface maps it to whatever its rendering stack wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Display hints attached to a token's tagged range at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenStyle {
    pub color: Option<Rgb>,
    pub bold: bool,
}

impl TokenStyle {
    pub const fn colored(color: Rgb) -> Self {
        Self {
            color: Some(color),
            bold: false,
        }
    }
}

/// A registered trigger: the character that opens a composing session, the
/// token type it produces, and the default display-text template applied
/// when no [`TokenConfig`] is registered for the type. `{name}` in the
/// template is replaced with the suggestion's display name.
#[derive(Debug, Clone)]
pub struct Trigger {
    pub character: char,
    pub token_type: String,
    pub format: String,
    pub style: TokenStyle,
}

impl Trigger {
    pub fn new(
        character: char,
        token_type: impl Into<String>,
        format: impl Into<String>,
        style: TokenStyle,
    ) -> Self {
        Self {
            character,
            token_type: token_type.into(),
            format: format.into(),
            style,
        }
    }

    /// `@` mention trigger with the conventional `@{name}` template.
    pub fn mention(style: TokenStyle) -> Self {
        Self::new('@', core_content::MENTION_TYPE, "@{name}", style)
    }

    /// `#` topic trigger with the conventional `#{name}#` template.
    pub fn topic(style: TokenStyle) -> Self {
        Self::new('#', core_content::TOPIC_TYPE, "#{name}#", style)
    }

    pub fn format_token_text(&self, item: &dyn SuggestionItem) -> String {
        self.format.replace("{name}", item.display_name())
    }
}

type DataBuilder = Box<dyn Fn(&dyn SuggestionItem) -> Run>;
type TapHandler = Box<dyn Fn(&Run)>;

/// Business-owned recipe for one token type: how a chosen suggestion
/// becomes a token run, and optionally what a tap on such a token does.
pub struct TokenConfig {
    data_builder: DataBuilder,
    on_tap: Option<TapHandler>,
}

impl TokenConfig {
    pub fn new(build: impl Fn(&dyn SuggestionItem) -> Run + 'static) -> Self {
        Self {
            data_builder: Box::new(build),
            on_tap: None,
        }
    }

    pub fn with_tap(mut self, on_tap: impl Fn(&Run) + 'static) -> Self {
        self.on_tap = Some(Box::new(on_tap));
        self
    }

    /// Strongly-typed builder: the closure sees the concrete suggestion
    /// type and returns the token run plus a typed payload, which is
    /// encoded into the run's opaque payload field.
    ///
    /// When the suggestion at runtime is not an `S` — registration drift
    /// between the business layer and the panel's data source — this logs
    /// an error, asserts in debug builds, and degrades to a plain text run
    /// of the display name in release builds rather than failing the
    /// insertion.
    pub fn typed<S, P>(build: impl Fn(&S) -> (Run, P) + 'static) -> Self
    where
        S: SuggestionItem,
        P: Serialize + 'static,
    {
        Self::new(move |suggestion| match suggestion.as_any().downcast_ref::<S>() {
            Some(typed) => {
                let (run, payload) = build(typed);
                run.with_payload(payload::encode(&payload).ok())
            }
            None => {
                tracing::error!(
                    target: "config.token",
                    expected = std::any::type_name::<S>(),
                    id = suggestion.id(),
                    "suggestion type mismatch; degrading to plain text"
                );
                debug_assert!(false, "typed TokenConfig received a foreign suggestion type");
                Run::text(suggestion.display_name())
            }
        })
    }

    /// [`Self::typed`] plus a tap handler that sees the decoded payload.
    /// Taps on tokens whose payload is missing or malformed are ignored.
    pub fn typed_with_tap<S, P>(
        build: impl Fn(&S) -> (Run, P) + 'static,
        on_tap: impl Fn(&Run, P) + 'static,
    ) -> Self
    where
        S: SuggestionItem,
        P: Serialize + DeserializeOwned + 'static,
    {
        Self::typed(build).with_tap(move |run: &Run| {
            if let Some(payload) = run.decode_payload::<P>() {
                on_tap(run, payload);
            }
        })
    }

    pub fn build(&self, suggestion: &dyn SuggestionItem) -> Run {
        (self.data_builder)(suggestion)
    }

    /// Dispatch a tap; returns whether a handler was registered.
    pub fn tap(&self, run: &Run) -> bool {
        match &self.on_tap {
            Some(handler) => {
                handler(run);
                true
            }
            None => false,
        }
    }

    pub fn has_tap(&self) -> bool {
        self.on_tap.is_some()
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("on_tap", &self.on_tap.is_some())
            .finish_non_exhaustive()
    }
}

/// Per-session registry of triggers (keyed by character) and token configs
/// (keyed by token type).
#[derive(Debug, Default)]
pub struct EditorConfiguration {
    triggers: HashMap<char, Trigger>,
    token_configs: HashMap<String, TokenConfig>,
}

impl EditorConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a trigger, replacing any prior registration for the same
    /// character.
    pub fn register_trigger(&mut self, trigger: Trigger) {
        self.triggers.insert(trigger.character, trigger);
    }

    pub fn unregister_trigger(&mut self, character: char) {
        self.triggers.remove(&character);
    }

    pub fn trigger_for(&self, character: char) -> Option<&Trigger> {
        self.triggers.get(&character)
    }

    pub fn trigger_for_type(&self, token_type: &str) -> Option<&Trigger> {
        self.triggers.values().find(|t| t.token_type == token_type)
    }

    pub fn is_trigger_char(&self, character: char) -> bool {
        self.triggers.contains_key(&character)
    }

    pub fn trigger_chars(&self) -> impl Iterator<Item = char> + '_ {
        self.triggers.keys().copied()
    }

    pub fn register_token(&mut self, token_type: impl Into<String>, config: TokenConfig) {
        self.token_configs.insert(token_type.into(), config);
    }

    pub fn unregister_token(&mut self, token_type: &str) {
        self.token_configs.remove(token_type);
    }

    pub fn token_config(&self, token_type: &str) -> Option<&TokenConfig> {
        self.token_configs.get(token_type)
    }
}

/// Character budget: a hard cap on the logical length of the content. The
/// engine rejects edits that would exceed it and reports the would-be
/// length through `on_exceeded`; it never truncates on its own.
pub struct CharacterLimit {
    pub max_count: usize,
    on_exceeded: Option<Box<dyn Fn(usize)>>,
}

impl CharacterLimit {
    pub fn new(max_count: usize) -> Self {
        Self {
            max_count,
            on_exceeded: None,
        }
    }

    pub fn with_callback(mut self, on_exceeded: impl Fn(usize) + 'static) -> Self {
        self.on_exceeded = Some(Box::new(on_exceeded));
        self
    }

    pub fn notify_exceeded(&self, would_be: usize) {
        if let Some(callback) = &self.on_exceeded {
            callback(would_be);
        }
    }
}

impl fmt::Debug for CharacterLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CharacterLimit")
            .field("max_count", &self.max_count)
            .finish_non_exhaustive()
    }
}

/// Presentation knobs the engine consults directly. Host-visual styling
/// (fonts, insets, colors of plain text) stays host-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorStyle {
    pub placeholder: String,
    /// Full-width closers that suppress the auto separator after a token,
    /// on top of ASCII punctuation and whitespace.
    pub separator_closers: String,
    /// Display text of the synthetic expand affordance token.
    pub expand_text: String,
    /// Display text of the synthetic collapse affordance token.
    pub collapse_text: String,
    /// Ellipsis measured ahead of the expand affordance when truncating.
    pub ellipsis: String,
}

impl Default for EditorStyle {
    fn default() -> Self {
        Self {
            placeholder: "Write something…".to_string(),
            separator_closers: "，。！？、；：）】》」".to_string(),
            expand_text: "... more".to_string(),
            collapse_text: " less".to_string(),
            ellipsis: "...".to_string(),
        }
    }
}
