//! Built-in mention/topic package: a ready-made configuration for the two
//! conventional triggers, with typed payload builders so token views can
//! round-trip the fields they need.

use serde::{Deserialize, Serialize};

use core_content::{MentionSuggestion, Run, TopicSuggestion};

use crate::{EditorConfiguration, Rgb, TokenConfig, TokenStyle, Trigger};

pub const MENTION_COLOR: Rgb = Rgb::new(0x3b, 0x82, 0xf6);
pub const TOPIC_COLOR: Rgb = Rgb::new(0xf5, 0x9e, 0x0b);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MentionPayload {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicPayload {
    pub id: String,
    pub name: String,
}

/// Configuration with `@` mentions and `#topic#` tags registered, using the
/// default colors.
pub fn mention_topic_configuration() -> EditorConfiguration {
    mention_topic_configuration_with(MENTION_COLOR, TOPIC_COLOR)
}

pub fn mention_topic_configuration_with(
    mention_color: Rgb,
    topic_color: Rgb,
) -> EditorConfiguration {
    let mut config = EditorConfiguration::new();
    config.register_trigger(Trigger::mention(TokenStyle::colored(mention_color)));
    config.register_trigger(Trigger::topic(TokenStyle::colored(topic_color)));

    config.register_token(
        core_content::MENTION_TYPE,
        TokenConfig::typed(|s: &MentionSuggestion| {
            (
                Run::mention(&s.id, &s.name),
                MentionPayload {
                    id: s.id.clone(),
                    name: s.name.clone(),
                    avatar: None,
                },
            )
        }),
    );
    config.register_token(
        core_content::TOPIC_TYPE,
        TokenConfig::typed(|s: &TopicSuggestion| {
            (
                Run::topic(&s.id, &s.name),
                TopicPayload {
                    id: s.id.clone(),
                    name: s.name.clone(),
                },
            )
        }),
    );
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_content::SuggestionItem;

    #[test]
    fn package_registers_both_triggers() {
        let config = mention_topic_configuration();
        assert!(config.is_trigger_char('@'));
        assert!(config.is_trigger_char('#'));
        assert!(config.token_config("mention").is_some());
        assert!(config.token_config("topic").is_some());
    }

    #[test]
    fn mention_builder_produces_token_with_payload() {
        let config = mention_topic_configuration();
        let suggestion = MentionSuggestion::new("u9", "carol");
        let run = config
            .token_config("mention")
            .unwrap()
            .build(&suggestion);
        assert_eq!(run.display_text(), "@carol");
        assert_eq!(run.data(), "u9");
        let payload: MentionPayload = run.decode_payload().unwrap();
        assert_eq!(payload.name, "carol");
        assert_eq!(suggestion.display_name(), "carol");
    }

    #[test]
    fn topic_builder_wraps_name_in_hashes() {
        let config = mention_topic_configuration();
        let run = config
            .token_config("topic")
            .unwrap()
            .build(&TopicSuggestion::new("t3", "rustlang"));
        assert_eq!(run.display_text(), "#rustlang#");
        let payload: TopicPayload = run.decode_payload().unwrap();
        assert_eq!(payload.id, "t3");
    }
}
