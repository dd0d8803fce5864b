//! Tokenizer tests.
//!
//! Tests for converting raw content to token streams.

use herald_content::{ContentParserConfig, TokenKind, tokenize};

fn kinds(content: &str, config: &ContentParserConfig) -> Vec<TokenKind> {
    tokenize(content, config).iter().map(|t| t.kind).collect()
}

#[test]
fn token_texts_rebuild_the_input() {
    let config = ContentParserConfig::default()
        .with_flag_words(["--force", "-f"])
        .with_option_flag_words(["--reason"]);
    let input = "ban  @someone --force --reason \"spam  bot\" “smart” tail ";

    let tokens = tokenize(input, &config);
    let rebuilt: String = tokens.iter().map(|t| t.text).collect();

    assert_eq!(rebuilt, input);
    assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
}

#[test]
fn offsets_point_into_the_input() {
    let config = ContentParserConfig::default();
    let input = "héllo wörld";

    for token in tokenize(input, &config) {
        assert_eq!(&input[token.offset..token.offset + token.text.len()], token.text);
    }
}

#[test]
fn longest_flag_word_wins() {
    let config = ContentParserConfig::default().with_flag_words(["-f", "-force"]);
    let tokens = tokenize("-force", &config);

    assert_eq!(tokens[0].kind, TokenKind::FlagWord);
    assert_eq!(tokens[0].text, "-force");
}

#[test]
fn flag_word_glued_to_text() {
    let config = ContentParserConfig::default().with_option_flag_words(["name:"]);

    assert_eq!(
        kinds("name:\"bob smith\"", &config),
        vec![
            TokenKind::OptionFlagWord,
            TokenKind::Quote,
            TokenKind::Word,
            TokenKind::Whitespace,
            TokenKind::Word,
            TokenKind::Quote,
            TokenKind::Eof
        ]
    );
}

#[test]
fn unterminated_quote_runs_to_end() {
    let config = ContentParserConfig::default();

    assert_eq!(
        kinds("\"open ended", &config),
        vec![
            TokenKind::Quote,
            TokenKind::Word,
            TokenKind::Whitespace,
            TokenKind::Word,
            TokenKind::Eof
        ]
    );
}

#[test]
fn separator_is_case_insensitive() {
    let config = ContentParserConfig::default().with_separator("or");
    let tokens = tokenize("a OR b", &config);

    assert_eq!(tokens[2].kind, TokenKind::Separator);
    assert_eq!(tokens[2].text, "OR");
}
