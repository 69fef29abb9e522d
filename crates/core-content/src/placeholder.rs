//! Server placeholder codec for mentions.
//!
//! Wire form used by the legacy description protocol: `@{user_<id>}` and
//! `@{concept_<id>}`. Decoding is tolerant by contract: an unknown kind, an
//! unresolvable id, or an unterminated `}` keeps the affected span as
//! literal text instead of failing the whole description.

use crate::{Content, MENTION_TYPE, Run};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    User,
    Concept,
}

impl PlaceholderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceholderKind::User => "user",
            PlaceholderKind::Concept => "concept",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(PlaceholderKind::User),
            "concept" => Some(PlaceholderKind::Concept),
            _ => None,
        }
    }
}

/// Wire placeholder for one mention: `@{user_123}`.
pub fn make_placeholder(kind: PlaceholderKind, id: &str) -> String {
    format!("@{{{}_{}}}", kind.as_str(), id)
}

/// Decode a description string into content, resolving each placeholder id
/// to a display name through `resolve_name`. Returns `None` from the
/// resolver to keep that placeholder as literal text.
pub fn decode_placeholders(
    description: &str,
    mut resolve_name: impl FnMut(PlaceholderKind, &str) -> Option<String>,
) -> Content {
    let mut runs: Vec<Run> = Vec::new();
    let mut rest = description;

    while !rest.is_empty() {
        let Some(open) = rest.find("@{") else {
            runs.push(Run::text(rest));
            break;
        };
        if open > 0 {
            runs.push(Run::text(&rest[..open]));
        }
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find('}') else {
            // Unterminated brace: the remainder stays literal.
            runs.push(Run::text(&rest[open..]));
            break;
        };
        let raw = &after_open[..close];
        let resolved = raw.split_once('_').and_then(|(kind_raw, id)| {
            let kind = PlaceholderKind::parse(kind_raw)?;
            let name = resolve_name(kind, id)?;
            Some(Run::token(MENTION_TYPE, format!("@{name}"), id))
        });
        match resolved {
            Some(run) => runs.push(run),
            None => runs.push(Run::text(format!("@{{{raw}}}"))),
        }
        rest = &after_open[close + 1..];
    }

    Content::new(runs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_resolvable_user() {
        let text = format!("hi {}!", make_placeholder(PlaceholderKind::User, "7"));
        let content = decode_placeholders(&text, |kind, id| {
            assert_eq!(kind, PlaceholderKind::User);
            assert_eq!(id, "7");
            Some("alice".to_string())
        });
        assert_eq!(content.plain_text(), "hi @alice!");
        assert_eq!(content.mentions().len(), 1);
        assert_eq!(content.mentions()[0].data(), "7");
    }

    #[test]
    fn unknown_kind_stays_literal() {
        let content = decode_placeholders("see @{group_9} now", |_, _| Some("x".into()));
        assert_eq!(content.plain_text(), "see @{group_9} now");
        assert!(content.mentions().is_empty());
    }

    #[test]
    fn unresolvable_id_stays_literal() {
        let content = decode_placeholders("@{user_404}", |_, _| None);
        assert_eq!(content.plain_text(), "@{user_404}");
    }

    #[test]
    fn missing_separator_stays_literal() {
        let content = decode_placeholders("@{user404}", |_, _| Some("x".into()));
        assert_eq!(content.plain_text(), "@{user404}");
    }

    #[test]
    fn unterminated_brace_keeps_rest_as_text() {
        let content = decode_placeholders("a @{user_1 b", |_, _| Some("x".into()));
        assert_eq!(content.plain_text(), "a @{user_1 b");
        assert!(content.mentions().is_empty());
    }

    #[test]
    fn mixed_text_and_placeholders() {
        let content = decode_placeholders("@{user_1}+@{concept_2}", |kind, id| {
            Some(format!("{}{}", kind.as_str(), id))
        });
        assert_eq!(content.plain_text(), "@user1+@concept2");
        assert_eq!(content.mentions().len(), 2);
    }
}
