//! Token types for message content.
//!
//! Tokens are the output of the tokenizer and input to the parser. They
//! borrow from the content being parsed.

use std::fmt;

/// A token from content tokenization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token<'src> {
    /// The type of this token.
    pub kind: TokenKind,
    /// The exact text this token covers.
    pub text: &'src str,
    /// Byte offset where this token starts.
    pub offset: usize,
}

impl<'src> Token<'src> {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, text: &'src str, offset: usize) -> Self {
        Self { kind, text, offset }
    }

    /// Byte offset where this token ends (exclusive).
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

/// Token types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A run of non-whitespace text.
    Word,
    /// A run of whitespace.
    Whitespace,
    /// `"`
    Quote,
    /// `“`
    OpenQuote,
    /// `”`
    EndQuote,
    /// A configured flag word such as `--force`.
    FlagWord,
    /// A configured option flag word such as `--name=`.
    OptionFlagWord,
    /// The configured separator string.
    Separator,
    /// End of input
    Eof,
}

impl TokenKind {
    /// Returns a human-readable name for this token kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Word => "Word",
            Self::Whitespace => "WS",
            Self::Quote => "Quote",
            Self::OpenQuote => "OpenQuote",
            Self::EndQuote => "EndQuote",
            Self::FlagWord => "FlagWord",
            Self::OptionFlagWord => "OptionFlagWord",
            Self::Separator => "Separator",
            Self::Eof => "EOF",
        }
    }

    /// Returns true if this token can start a phrase in quoted mode.
    #[must_use]
    pub const fn starts_phrase(self) -> bool {
        matches!(
            self,
            Self::Quote | Self::OpenQuote | Self::EndQuote | Self::Word
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
