//! Content parser tests.
//!
//! Tests for deriving parser configuration from argument specs.

use herald_content::{ArgumentSpec, ContentParser, ContentParserConfig, MatchKind, StringData};

fn specs() -> Vec<ArgumentSpec> {
    vec![
        ArgumentSpec::new("member").with_type("member"),
        ArgumentSpec::flag("silent", ["-s", "--silent"]),
        ArgumentSpec::option("reason", ["--reason", "reason:"]),
        ArgumentSpec::new("note").with_kind(MatchKind::Rest),
    ]
}

#[test]
fn specs_drive_flag_recognition() {
    let parser = ContentParser::new(ContentParserConfig::default().with_flags_from(&specs()));
    let result = parser.parse("@bob --SILENT reason:spam the rest").unwrap();

    assert_eq!(result.flags.len(), 1);
    assert_eq!(result.flags[0].key(), Some("--SILENT"));
    assert_eq!(result.option_flags[0].value(), Some("spam"));
    assert_eq!(result.phrases.len(), 3);
}

#[test]
fn extracted_flags_are_longest_first() {
    let extracted = ContentParser::extract_flags(&specs());

    assert_eq!(extracted.flag_words, vec!["--silent", "-s"]);
    assert_eq!(extracted.option_flag_words, vec!["--reason", "reason:"]);
}

#[test]
fn unknown_flags_are_phrases() {
    let parser = ContentParser::new(ContentParserConfig::default().with_flags_from(&specs()));
    let result = parser.parse("--loud").unwrap();

    assert!(matches!(&result.all[0], StringData::Phrase { value, .. } if value == "--loud"));
}

#[test]
fn separator_turns_flags_into_text() {
    let config = ContentParserConfig::default()
        .with_flags_from(&specs())
        .with_separator("|");
    let parser = ContentParser::new(config);
    let result = parser.parse("a -s | b").unwrap();

    assert!(result.flags.is_empty());
    let values: Vec<_> = result.phrases.iter().filter_map(StringData::value).collect();
    assert_eq!(values, vec!["a -s", "b"]);
}

#[test]
fn unquoted_parser_splits_on_whitespace_only() {
    let parser = ContentParser::new(ContentParserConfig::default().with_quoted(false));
    let result = parser.parse("\"a b\"").unwrap();

    let values: Vec<_> = result.phrases.iter().filter_map(StringData::value).collect();
    assert_eq!(values, vec!["\"a", "b\""]);
}
