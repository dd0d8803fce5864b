//! Integration tests for the herald_dispatch crate.
//!
//! Tests that drive a full [`CommandHandler`](herald_dispatch::CommandHandler)
//! against a recording client:
//! - Prefix resolution and argument flow
//! - Policy checks (restrictions, permissions, cooldowns, locks, inhibitors)
//! - Control flags and error routing
//! - Slash commands

mod pipeline_tests;
mod policy_tests;
mod slash_tests;
