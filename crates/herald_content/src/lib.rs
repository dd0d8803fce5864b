//! Content tokenizer and parser for chat commands.
//!
//! This crate turns the text after a command's alias into phrases, flags,
//! and option flags, ready for argument resolution.
//!
//! # Architecture
//!
//! ```text
//! "ban @bob --days 7 \"being rude\""
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   TOKENIZER     │  → [Word, WS, Word, WS, OptionFlagWord, WS, Word, WS, Quote, ...]
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   PARSER        │  → Phrase(ban) Phrase(@bob) OptionFlag(--days = 7) Phrase(being rude)
//! └─────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`token`] - Token types
//! - [`tokenizer`] - Raw content to token stream
//! - [`parser`] - Token stream to [`ParseResult`]
//! - [`content`] - The [`ContentParser`] facade and its configuration
//! - [`argument`] - Declared argument specs and match kinds

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod argument;
pub mod content;
pub mod parser;
pub mod token;
pub mod tokenizer;


pub use argument::{ArgumentSpec, MatchKind};
pub use content::{ContentParser, ContentParserConfig, ExtractedFlags, sort_flag_words};
pub use parser::{ParseResult, Parser, StringData};
pub use token::{Token, TokenKind};
pub use tokenizer::{Tokenizer, tokenize};
