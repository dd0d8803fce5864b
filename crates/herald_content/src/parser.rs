//! Recursive-descent parser over content tokens.
//!
//! Grammar (quoted mode):
//!
//! ```text
//! Arguments = (Argument (WS? Argument)*)? EOF
//! Argument  = Flag | Phrase
//! Flag      = FlagWord | OptionFlagWord WS? Phrase?
//! Phrase    = Quote (Word | WS)* Quote?
//!           | OpenQuote (Word | OpenQuote | Quote | WS)* EndQuote?
//!           | EndQuote
//!           | Word
//! ```
//!
//! With a separator configured, quoting is off and `Phrase = Word (WS Word)*`.
//!
//! Every argument folds its surrounding whitespace and trailing separator
//! into `raw`, so concatenating the raws of [`ParseResult::all`] rebuilds the
//! input exactly.

use herald_foundation::{Error, Result};

use crate::token::{Token, TokenKind};

/// One parsed argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StringData {
    /// An unlabelled chunk of text.
    Phrase {
        /// Text with quotes stripped.
        value: String,
        /// Exact consumed text.
        raw: String,
    },
    /// A presence flag such as `--force`.
    Flag {
        /// The flag word as written.
        key: String,
        /// Exact consumed text.
        raw: String,
    },
    /// A flag carrying a value, such as `--name bob`.
    OptionFlag {
        /// The option flag word as written.
        key: String,
        /// Value text, empty if none followed.
        value: String,
        /// Exact consumed text.
        raw: String,
    },
}

impl StringData {
    /// Exact consumed text, including surrounding whitespace.
    #[must_use]
    pub fn raw(&self) -> &str {
        match self {
            Self::Phrase { raw, .. } | Self::Flag { raw, .. } | Self::OptionFlag { raw, .. } => {
                raw
            }
        }
    }

    /// The phrase or option value, if this element carries one.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Phrase { value, .. } | Self::OptionFlag { value, .. } => Some(value),
            Self::Flag { .. } => None,
        }
    }

    /// The flag key, if this element is a flag or option flag.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Flag { key, .. } | Self::OptionFlag { key, .. } => Some(key),
            Self::Phrase { .. } => None,
        }
    }

    /// Returns true if this is a phrase.
    #[must_use]
    pub const fn is_phrase(&self) -> bool {
        matches!(self, Self::Phrase { .. })
    }

    fn raw_mut(&mut self) -> &mut String {
        match self {
            Self::Phrase { raw, .. } | Self::Flag { raw, .. } | Self::OptionFlag { raw, .. } => {
                raw
            }
        }
    }
}

/// The partitioned output of a parse.
///
/// `all` keeps the input order. `phrases`, `flags` and `option_flags` are
/// stable-order partitions of it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseResult {
    /// Every argument, in input order.
    pub all: Vec<StringData>,
    /// Phrases only.
    pub phrases: Vec<StringData>,
    /// Presence flags only.
    pub flags: Vec<StringData>,
    /// Option flags only.
    pub option_flags: Vec<StringData>,
}

impl ParseResult {
    /// Concatenates every raw, reproducing the parsed content.
    #[must_use]
    pub fn raw_content(&self) -> String {
        self.all.iter().map(StringData::raw).collect()
    }

    /// Concatenates the raws of `all[from..]`.
    #[must_use]
    pub fn rest_from(&self, from: usize) -> String {
        self.all
            .get(from..)
            .unwrap_or_default()
            .iter()
            .map(StringData::raw)
            .collect()
    }

    fn push(&mut self, data: StringData) {
        match &data {
            StringData::Phrase { .. } => self.phrases.push(data.clone()),
            StringData::Flag { .. } => self.flags.push(data.clone()),
            StringData::OptionFlag { .. } => self.option_flags.push(data.clone()),
        }
        self.all.push(data);
    }

    /// Appends dangling text to the last argument in every partition.
    fn extend_last_raw(&mut self, text: &str) -> bool {
        let Some(last) = self.all.last_mut() else {
            return false;
        };
        last.raw_mut().push_str(text);
        let partition = match last {
            StringData::Phrase { .. } => &mut self.phrases,
            StringData::Flag { .. } => &mut self.flags,
            StringData::OptionFlag { .. } => &mut self.option_flags,
        };
        if let Some(mirror) = partition.last_mut() {
            mirror.raw_mut().push_str(text);
        }
        true
    }
}

/// Parser over a token stream.
pub struct Parser<'src, 'tok> {
    tokens: &'tok [Token<'src>],
    position: usize,
    separated: bool,
    result: ParseResult,
}

impl<'src, 'tok> Parser<'src, 'tok> {
    /// Creates a parser. `separated` must be true when the tokens were
    /// produced with a separator configured.
    #[must_use]
    pub fn new(tokens: &'tok [Token<'src>], separated: bool) -> Self {
        Self {
            tokens,
            position: 0,
            separated,
            result: ParseResult::default(),
        }
    }

    /// Parses the whole stream.
    ///
    /// # Errors
    ///
    /// Returns a parse defect if the stream is not terminated by EOF or
    /// contains a token the grammar cannot place. Streams produced by the
    /// tokenizer never do.
    pub fn parse(mut self) -> Result<ParseResult> {
        while self.position + 1 < self.tokens.len() {
            self.run_argument()?;
        }
        self.expect(&[TokenKind::Eof])?;
        Ok(self.result)
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    fn peek_kind(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.position + offset).map(|t| t.kind)
    }

    fn check(&self, kinds: &[TokenKind]) -> bool {
        self.peek_kind(0).is_some_and(|k| kinds.contains(&k))
    }

    fn check_at(&self, offset: usize, kind: TokenKind) -> bool {
        self.peek_kind(offset) == Some(kind)
    }

    fn expect(&mut self, kinds: &[TokenKind]) -> Result<&'src str> {
        let tokens = self.tokens;
        match tokens.get(self.position) {
            Some(token) if kinds.contains(&token.kind) => {
                self.position += 1;
                Ok(token.text)
            }
            found => {
                let expected = kinds
                    .iter()
                    .map(|k| k.name())
                    .collect::<Vec<_>>()
                    .join(" | ");
                let found = found.map_or("end of stream", |t| t.kind.name());
                Err(Error::parse_defect(expected, found))
            }
        }
    }

    fn eat(&mut self, kind: TokenKind) -> &'src str {
        let tokens = self.tokens;
        match tokens.get(self.position) {
            Some(token) if token.kind == kind => {
                self.position += 1;
                token.text
            }
            _ => "",
        }
    }

    // =========================================================================
    // Grammar
    // =========================================================================

    fn run_argument(&mut self) -> Result<()> {
        let leading = self.eat(TokenKind::Whitespace);

        if self.check(&[TokenKind::Eof]) {
            // Whitespace dangling before EOF belongs to the previous argument.
            if !self.result.extend_last_raw(leading) {
                self.result.push(StringData::Phrase {
                    value: String::new(),
                    raw: leading.to_string(),
                });
            }
            return Ok(());
        }

        let mut parsed = if self.check(&[TokenKind::FlagWord, TokenKind::OptionFlagWord]) {
            self.parse_flag()?
        } else {
            self.parse_phrase()?
        };

        let trailing = self.eat(TokenKind::Whitespace);
        let separator = self.eat(TokenKind::Separator);

        let raw = parsed.raw_mut();
        raw.insert_str(0, leading);
        raw.push_str(trailing);
        raw.push_str(separator);

        self.result.push(parsed);
        Ok(())
    }

    fn parse_flag(&mut self) -> Result<StringData> {
        if self.check(&[TokenKind::FlagWord]) {
            let key = self.expect(&[TokenKind::FlagWord])?;
            return Ok(StringData::Flag {
                key: key.to_string(),
                raw: key.to_string(),
            });
        }

        let key = self.expect(&[TokenKind::OptionFlagWord])?;
        let mut raw = key.to_string();
        raw.push_str(self.eat(TokenKind::Whitespace));

        let mut value = String::new();
        let has_phrase = if self.separated {
            self.check(&[TokenKind::Word])
        } else {
            self.peek_kind(0).is_some_and(TokenKind::starts_phrase)
        };
        if has_phrase {
            if let StringData::Phrase {
                value: phrase_value,
                raw: phrase_raw,
            } = self.parse_phrase()?
            {
                value = phrase_value;
                raw.push_str(&phrase_raw);
            }
        }

        Ok(StringData::OptionFlag {
            key: key.to_string(),
            value,
            raw,
        })
    }

    fn parse_phrase(&mut self) -> Result<StringData> {
        if self.separated {
            return self.parse_separated_phrase();
        }

        if self.check(&[TokenKind::Quote]) {
            let open = self.expect(&[TokenKind::Quote])?;
            let (value, inner) = self.collect(&[TokenKind::Word, TokenKind::Whitespace]);
            let close = self.eat(TokenKind::Quote);
            return Ok(StringData::Phrase {
                value,
                raw: format!("{open}{inner}{close}"),
            });
        }

        if self.check(&[TokenKind::OpenQuote]) {
            let open = self.expect(&[TokenKind::OpenQuote])?;
            let (value, inner) = self.collect(&[
                TokenKind::Word,
                TokenKind::OpenQuote,
                TokenKind::Quote,
                TokenKind::Whitespace,
            ]);
            let close = self.eat(TokenKind::EndQuote);
            return Ok(StringData::Phrase {
                value,
                raw: format!("{open}{inner}{close}"),
            });
        }

        if self.check(&[TokenKind::EndQuote]) {
            // A stray closing quote becomes a phrase of just that character.
            let quote = self.expect(&[TokenKind::EndQuote])?;
            return Ok(StringData::Phrase {
                value: quote.to_string(),
                raw: quote.to_string(),
            });
        }

        let word = self.expect(&[TokenKind::Word])?;
        Ok(StringData::Phrase {
            value: word.to_string(),
            raw: word.to_string(),
        })
    }

    fn parse_separated_phrase(&mut self) -> Result<StringData> {
        if self.check(&[TokenKind::Separator]) {
            // Empty slot, e.g. the start of ",a" or the middle of "a,,b".
            return Ok(StringData::Phrase {
                value: String::new(),
                raw: String::new(),
            });
        }

        let mut value = self.expect(&[TokenKind::Word])?.to_string();
        while self.check(&[TokenKind::Whitespace]) && self.check_at(1, TokenKind::Word) {
            value.push_str(self.eat(TokenKind::Whitespace));
            value.push_str(self.eat(TokenKind::Word));
        }
        Ok(StringData::Phrase {
            raw: value.clone(),
            value,
        })
    }

    /// Consumes a run of the given kinds. In these runs value and raw agree.
    fn collect(&mut self, kinds: &[TokenKind]) -> (String, String) {
        let mut text = String::new();
        while self.check(kinds) {
            text.push_str(self.tokens[self.position].text);
            self.position += 1;
        }
        (text.clone(), text)
    }
}

/// Parses a token stream.
///
/// # Errors
///
/// Returns a parse defect if the stream is malformed.
pub fn parse(tokens: &[Token<'_>], separated: bool) -> Result<ParseResult> {
    Parser::new(tokens, separated).parse()
}
