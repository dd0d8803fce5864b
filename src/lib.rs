//! Herald - Command parsing and dispatch for chat bots
//!
//! This crate re-exports all layers of the Herald framework for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: herald_dispatch   - Commands, inhibitors, prefixes, handler pipeline
//! Layer 1: herald_content    - Tokenizer, content parser, argument specs
//! Layer 0: herald_foundation - Core types (ids, ArgValue, Message, Permissions, Error)
//! ```

pub use herald_content as content;
pub use herald_dispatch as dispatch;
pub use herald_foundation as foundation;
