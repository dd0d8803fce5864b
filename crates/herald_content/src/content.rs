//! The content parser facade.
//!
//! [`ContentParser`] owns tokenizer and parser configuration and turns
//! content into a [`ParseResult`] in one call.

use herald_foundation::Result;
use tracing::trace;

use crate::argument::{ArgumentSpec, MatchKind};
use crate::parser::{ParseResult, parse};
use crate::tokenizer::tokenize;

/// Configuration for content parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentParserConfig {
    /// Words parsed as presence flags, longest first.
    pub flag_words: Vec<String>,
    /// Words parsed as option flags, longest first.
    pub option_flag_words: Vec<String>,
    /// Whether `"` and `“ ”` group words into one phrase.
    pub quoted: bool,
    /// Literal separator between phrases. Disables quoting and flags.
    pub separator: Option<String>,
}

impl Default for ContentParserConfig {
    fn default() -> Self {
        Self {
            flag_words: Vec::new(),
            option_flag_words: Vec::new(),
            quoted: true,
            separator: None,
        }
    }
}

impl ContentParserConfig {
    /// Builder method to set flag words.
    #[must_use]
    pub fn with_flag_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flag_words = sort_flag_words(words.into_iter().map(Into::into).collect());
        self
    }

    /// Builder method to set option flag words.
    #[must_use]
    pub fn with_option_flag_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.option_flag_words = sort_flag_words(words.into_iter().map(Into::into).collect());
        self
    }

    /// Builder method to set quoting.
    #[must_use]
    pub fn with_quoted(mut self, quoted: bool) -> Self {
        self.quoted = quoted;
        self
    }

    /// Builder method to set the separator.
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        self.separator = (!separator.is_empty()).then_some(separator);
        self
    }

    /// Builder method to take flag words from argument specs.
    #[must_use]
    pub fn with_flags_from(self, specs: &[ArgumentSpec]) -> Self {
        let extracted = ContentParser::extract_flags(specs);
        self.with_flag_words(extracted.flag_words)
            .with_option_flag_words(extracted.option_flag_words)
    }

    /// Returns true if a non-empty separator is configured.
    #[must_use]
    pub fn is_separated(&self) -> bool {
        self.separator.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Flag words collected from a list of argument specs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractedFlags {
    /// Words of every flag-kind spec, longest first.
    pub flag_words: Vec<String>,
    /// Words of every option-kind spec, longest first.
    pub option_flag_words: Vec<String>,
}

/// Parses message content into phrases and flags.
#[derive(Clone, Debug, Default)]
pub struct ContentParser {
    config: ContentParserConfig,
}

impl ContentParser {
    /// Creates a parser, normalizing the configuration.
    #[must_use]
    pub fn new(config: ContentParserConfig) -> Self {
        let ContentParserConfig {
            flag_words,
            option_flag_words,
            quoted,
            separator,
        } = config;

        Self {
            config: ContentParserConfig {
                flag_words: sort_flag_words(flag_words),
                option_flag_words: sort_flag_words(option_flag_words),
                quoted,
                separator: separator.filter(|s| !s.is_empty()),
            },
        }
    }

    /// The normalized configuration.
    #[must_use]
    pub const fn config(&self) -> &ContentParserConfig {
        &self.config
    }

    /// Parses content.
    ///
    /// # Errors
    ///
    /// Only returns an error on a tokenizer/parser defect.
    pub fn parse(&self, content: &str) -> Result<ParseResult> {
        let tokens = tokenize(content, &self.config);
        trace!(tokens = tokens.len(), "tokenized content");
        parse(&tokens, self.config.is_separated())
    }

    /// Collects the flag words used by flag and option specs.
    ///
    /// The result is deduplicated and sorted longest-first, so it does not
    /// depend on the order of `specs`.
    #[must_use]
    pub fn extract_flags(specs: &[ArgumentSpec]) -> ExtractedFlags {
        let mut flag_words = Vec::new();
        let mut option_flag_words = Vec::new();

        for spec in specs.iter().filter(|s| s.kind.uses_flags()) {
            let target = if spec.kind == MatchKind::Flag {
                &mut flag_words
            } else {
                &mut option_flag_words
            };
            target.extend(spec.flags.iter().cloned());
        }

        ExtractedFlags {
            flag_words: sort_flag_words(flag_words),
            option_flag_words: sort_flag_words(option_flag_words),
        }
    }
}

/// Sorts flag words longest-first so a short word never shadows a longer
/// word it prefixes. Ties sort lexicographically; empty words and
/// duplicates are dropped.
#[must_use]
pub fn sort_flag_words(mut words: Vec<String>) -> Vec<String> {
    words.retain(|w| !w.is_empty());
    words.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    words.dedup();
    words
}
