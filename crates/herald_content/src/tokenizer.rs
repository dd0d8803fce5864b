//! Content tokenization.
//!
//! Splits raw message content into a flat stream of [`Token`]s. Each step
//! tries a fixed list of rules and the first match wins:
//!
//! 1. whitespace run
//! 2. flag word (default state, no separator)
//! 3. option flag word (default state, no separator)
//! 4. `"` toggling the quoted state
//! 5. `“` entering the smart-quoted state
//! 6. `”` leaving the smart-quoted state
//! 7. the separator string
//! 8. bare word
//!
//! The bare word rule always consumes at least one character, so
//! tokenization is total over every input.

use crate::content::ContentParserConfig;
use crate::token::{Token, TokenKind};

/// Lexical state of the tokenizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QuoteState {
    /// Outside any quotes.
    Default,
    /// Inside a `"` region.
    Quoted,
    /// Inside a `“` region.
    SmartQuoted,
}

/// Tokenizer for message content.
pub struct Tokenizer<'src, 'cfg> {
    /// Content being tokenized.
    content: &'src str,
    /// Flag words, longest first.
    flag_words: &'cfg [String],
    /// Option flag words, longest first.
    option_flag_words: &'cfg [String],
    /// Whether quote characters group words.
    quoted: bool,
    /// Literal separator, if any.
    separator: Option<&'cfg str>,
    /// Current byte offset.
    position: usize,
    state: QuoteState,
    tokens: Vec<Token<'src>>,
}

impl<'src, 'cfg> Tokenizer<'src, 'cfg> {
    /// Creates a tokenizer over `content` using the given configuration.
    ///
    /// The configuration's flag word lists are used in the order given, so
    /// they must already be sorted longest-first.
    #[must_use]
    pub fn new(content: &'src str, config: &'cfg ContentParserConfig) -> Self {
        Self {
            content,
            flag_words: &config.flag_words,
            option_flag_words: &config.option_flag_words,
            quoted: config.quoted,
            separator: config.separator.as_deref().filter(|s| !s.is_empty()),
            position: 0,
            state: QuoteState::Default,
            tokens: Vec::new(),
        }
    }

    /// Tokenizes the whole content, ending with an EOF token.
    #[must_use]
    pub fn tokenize(mut self) -> Vec<Token<'src>> {
        while self.position < self.content.len() {
            self.step();
        }
        self.tokens
            .push(Token::new(TokenKind::Eof, "", self.content.len()));
        self.tokens
    }

    fn step(&mut self) {
        let matched = self.run_whitespace()
            || self.run_flag_word()
            || self.run_option_flag_word()
            || self.run_quote()
            || self.run_open_quote()
            || self.run_end_quote()
            || self.run_separator();

        if !matched {
            self.run_word();
        }
    }

    fn rest(&self) -> &'src str {
        &self.content[self.position..]
    }

    /// Case-insensitive prefix test at the cursor.
    fn starts_with(&self, word: &str) -> bool {
        matches_at(self.content, self.position, word)
    }

    fn push(&mut self, kind: TokenKind, len: usize) {
        let start = self.position;
        self.position += len;
        self.tokens
            .push(Token::new(kind, &self.content[start..self.position], start));
    }

    fn run_whitespace(&mut self) -> bool {
        let len: usize = self
            .rest()
            .chars()
            .take_while(|c| c.is_whitespace())
            .map(char::len_utf8)
            .sum();

        if len == 0 {
            return false;
        }
        self.push(TokenKind::Whitespace, len);
        true
    }

    fn run_flag_word(&mut self) -> bool {
        if self.state != QuoteState::Default || self.separator.is_some() {
            return false;
        }
        let found = self
            .flag_words
            .iter()
            .find(|word| !word.is_empty() && self.starts_with(word));
        match found {
            Some(word) => {
                self.push(TokenKind::FlagWord, word.len());
                true
            }
            None => false,
        }
    }

    fn run_option_flag_word(&mut self) -> bool {
        if self.state != QuoteState::Default || self.separator.is_some() {
            return false;
        }
        let found = self
            .option_flag_words
            .iter()
            .find(|word| !word.is_empty() && self.starts_with(word));
        match found {
            Some(word) => {
                self.push(TokenKind::OptionFlagWord, word.len());
                true
            }
            None => false,
        }
    }

    fn quoting(&self) -> bool {
        self.quoted && self.separator.is_none()
    }

    fn run_quote(&mut self) -> bool {
        if !self.quoting() || !self.rest().starts_with('"') {
            return false;
        }
        self.state = match self.state {
            QuoteState::Default => QuoteState::Quoted,
            QuoteState::Quoted => QuoteState::Default,
            QuoteState::SmartQuoted => QuoteState::SmartQuoted,
        };
        self.push(TokenKind::Quote, '"'.len_utf8());
        true
    }

    fn run_open_quote(&mut self) -> bool {
        if !self.quoting() || !self.rest().starts_with('“') {
            return false;
        }
        if self.state == QuoteState::Default {
            self.state = QuoteState::SmartQuoted;
        }
        self.push(TokenKind::OpenQuote, '“'.len_utf8());
        true
    }

    fn run_end_quote(&mut self) -> bool {
        if !self.quoting() || !self.rest().starts_with('”') {
            return false;
        }
        if self.state == QuoteState::SmartQuoted {
            self.state = QuoteState::Default;
        }
        self.push(TokenKind::EndQuote, '”'.len_utf8());
        true
    }

    fn run_separator(&mut self) -> bool {
        match self.separator {
            Some(separator) if self.starts_with(separator) => {
                self.push(TokenKind::Separator, separator.len());
                true
            }
            _ => false,
        }
    }

    fn run_word(&mut self) {
        let state = self.state;
        let rest = self.rest();
        let len: usize = rest
            .chars()
            .take_while(|&c| match state {
                QuoteState::Default => !c.is_whitespace(),
                QuoteState::Quoted => !c.is_whitespace() && c != '"',
                QuoteState::SmartQuoted => !c.is_whitespace() && c != '”',
            })
            .map(char::len_utf8)
            .sum();

        // Unreachable through the rule order above, but a zero-length word
        // would stall the loop.
        let len = if len == 0 {
            rest.chars().next().map_or(0, char::len_utf8)
        } else {
            len
        };

        let Some(separator) = self.separator else {
            self.push(TokenKind::Word, len);
            return;
        };

        match find_ignore_case(&rest[..len], separator) {
            None => self.push(TokenKind::Word, len),
            Some(0) => self.push(TokenKind::Separator, separator.len()),
            Some(index) => self.push(TokenKind::Word, index),
        }
    }
}

/// Case-insensitive test for `word` at byte offset `at` of `haystack`.
fn matches_at(haystack: &str, at: usize, word: &str) -> bool {
    haystack
        .get(at..at + word.len())
        .is_some_and(|s| s == word || s.to_lowercase() == word.to_lowercase())
}

/// Byte offset of the first case-insensitive occurrence of `needle`.
fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .char_indices()
        .map(|(index, _)| index)
        .find(|&index| matches_at(haystack, index, needle))
}

/// Tokenizes content with the given configuration.
#[must_use]
pub fn tokenize<'src>(content: &'src str, config: &ContentParserConfig) -> Vec<Token<'src>> {
    Tokenizer::new(content, config).tokenize()
}
