//! Parser tests.
//!
//! Tests for partitioning content into phrases, flags and option flags.

use herald_content::{ContentParser, ContentParserConfig, ParseResult, StringData};

fn parse(content: &str, config: ContentParserConfig) -> ParseResult {
    ContentParser::new(config).parse(content).unwrap()
}

fn values(data: &[StringData]) -> Vec<&str> {
    data.iter().filter_map(StringData::value).collect()
}

#[test]
fn quoted_phrases_group_words() {
    let result = parse("say \"hello there\" friend", ContentParserConfig::default());

    assert_eq!(values(&result.phrases), vec!["say", "hello there", "friend"]);
    assert!(result.flags.is_empty());
}

#[test]
fn smart_quotes_group_words() {
    let result = parse("say “hello \"there\"”", ContentParserConfig::default());

    assert_eq!(values(&result.phrases), vec!["say", "hello \"there\""]);
}

#[test]
fn partitions_keep_input_order() {
    let config = ContentParserConfig::default()
        .with_flag_words(["--silent"])
        .with_option_flag_words(["--reason"]);
    let result = parse("kick bob --silent --reason \"too loud\" now", config);

    assert_eq!(result.all.len(), 5);
    assert_eq!(values(&result.phrases), vec!["kick", "bob", "now"]);
    assert_eq!(result.flags[0].key(), Some("--silent"));
    assert_eq!(result.option_flags[0].key(), Some("--reason"));
    assert_eq!(result.option_flags[0].value(), Some("too loud"));
}

#[test]
fn option_flag_without_value() {
    let config = ContentParserConfig::default().with_option_flag_words(["--reason"]);
    let result = parse("--reason", config);

    assert_eq!(result.option_flags[0].value(), Some(""));
}

#[test]
fn raw_content_is_lossless() {
    let config = ContentParserConfig::default()
        .with_flag_words(["-f"])
        .with_option_flag_words(["to:"]);
    let inputs = [
        "",
        "   ",
        "  lead and trail  ",
        "\"unterminated quote",
        "” stray close",
        "-f to: \"x y\" z",
        "“nested \"mixed” quotes\"",
    ];

    for input in inputs {
        let result = parse(input, config.clone());
        assert_eq!(result.raw_content(), input, "input {input:?}");
    }
}

#[test]
fn rest_from_keeps_spacing() {
    let result = parse("echo  one   two", ContentParserConfig::default());

    assert_eq!(result.rest_from(1), "one   two");
    assert_eq!(result.rest_from(10), "");
}

#[test]
fn separated_content_keeps_inner_spaces() {
    let config = ContentParserConfig::default().with_separator(",");
    let result = parse("red apple, green pear,,\"plum\"", config);

    assert_eq!(values(&result.phrases), vec!["red apple", "green pear", "", "\"plum\""]);
}

#[test]
fn whitespace_only_is_one_empty_phrase() {
    let result = parse("   ", ContentParserConfig::default());

    assert_eq!(result.phrases.len(), 1);
    assert_eq!(result.phrases[0].value(), Some(""));
}
