//! Integration tests for the herald_content crate.
//!
//! Tests for the content pipeline:
//! - Tokenization
//! - Parsing into phrases and flags
//! - Content parser configuration from argument specs

mod content_parser_tests;
mod parser_tests;
mod tokenizer_tests;
