//! Round-trip property: parsing a rendered content value preserves token
//! identity and the plain-text projection byte for byte.

use proptest::prelude::*;

use core_config::defaults::mention_topic_configuration;
use core_content::{Content, Run};
use core_flat::{parse, render};

fn text_run() -> impl Strategy<Value = Run> {
    // Non-empty, trigger-free text so generated runs stay inert.
    "[a-z 0-9]{1,12}".prop_map(Run::text)
}

fn token_run() -> impl Strategy<Value = Run> {
    ("[a-z]{1,8}", "[0-9]{1,4}", prop::bool::ANY).prop_map(|(name, id, topic)| {
        if topic {
            Run::topic(id, &name)
        } else {
            Run::mention(id, &name)
        }
    })
}

fn content() -> impl Strategy<Value = Content> {
    prop::collection::vec(
        prop_oneof![3 => text_run(), 2 => token_run()],
        0..12,
    )
    .prop_map(Content::new)
}

proptest! {
    #[test]
    fn parse_render_preserves_plain_text_and_tokens(content in content()) {
        let config = mention_topic_configuration();
        let doc = render(&content, &config);
        let back = parse(&doc);

        prop_assert_eq!(back.plain_text(), content.plain_text());

        let original_tokens: Vec<&Run> =
            content.runs.iter().filter(|r| r.is_token()).collect();
        let parsed_tokens: Vec<&Run> =
            back.runs.iter().filter(|r| r.is_token()).collect();
        prop_assert_eq!(parsed_tokens.len(), original_tokens.len());
        for (parsed, original) in parsed_tokens.iter().zip(&original_tokens) {
            prop_assert_eq!(parsed.token_type(), original.token_type());
            prop_assert_eq!(parsed.data(), original.data());
            prop_assert_eq!(parsed.display_text(), original.display_text());
            prop_assert_eq!(parsed.payload(), original.payload());
        }
    }

    #[test]
    fn logical_length_matches_plain_text(content in content()) {
        prop_assert_eq!(content.logical_len(), content.plain_text().chars().count());
        let doc = render(&content, &mention_topic_configuration());
        let all = core_flat::CharRange::new(0, doc.len_chars());
        prop_assert_eq!(doc.logical_len_of(all), content.logical_len());
    }
}
