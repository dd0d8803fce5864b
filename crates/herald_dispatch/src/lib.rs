//! Command registry, inhibitors and the dispatch pipeline.
//!
//! A [`CommandHandler`] owns registered [`Command`]s and turns inbound
//! messages and interactions into command executions, enforcing the
//! inhibitor, permission, cooldown and lock policies on the way.
//!
//! # Architecture
//!
//! ```text
//! Message / Interaction
//!          │
//!          ▼
//! ┌──────────────────┐   all / pre inhibitors, bot and prompt checks
//! │  CommandHandler  │ ─ prefix resolution (default pass, override pass)
//! └──────────────────┘   regex and conditional fallbacks
//!          │
//!          ▼
//! ┌──────────────────┐   owner, channel and nsfw restrictions,
//! │   post checks    │ ─ permissions, post inhibitors, cooldowns
//! └──────────────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │  ArgumentRunner  │ ─ Args, or a Flag (cancel, retry, continue, fail)
//! └──────────────────┘
//!          │
//!          ▼
//!   lock ─► exec ─► events
//! ```
//!
//! # Modules
//!
//! - [`handler`] - The dispatch pipeline
//! - [`command`] - Command definitions and executors
//! - [`registry`] - Commands by id, alias and prefix
//! - [`prefix`] - Prefix sources, ordering and matching
//! - [`inhibitor`] - Pluggable blocking checks
//! - [`runner`] / [`generator`] - Argument resolution
//! - [`flag`] - Control flags returned by argument resolution
//! - [`permission`] / [`cooldown`] / [`lock`] - Policy primitives
//! - [`events`] - Lifecycle events and the event bus
//! - [`module`] - Generic module registry
//! - [`util`] - Per-message response bookkeeping
//! - [`client`] - The platform client seam

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod command;
pub mod config;
pub mod cooldown;
pub mod events;
pub mod flag;
pub mod generator;
pub mod handler;
pub mod inhibitor;
pub mod lock;
pub mod module;
pub mod permission;
pub mod prefix;
pub mod prompt;
pub mod registry;
pub mod runner;
pub mod util;


pub use client::Client;
pub use command::{
    ChannelRestriction, Command, CommandContext, CommandExecutor, FnExecutor, SlashContext,
};
pub use config::HandlerConfig;
pub use cooldown::{CooldownManager, CooldownVerdict};
pub use events::{BlockReason, BuiltInReason, EventBus, HandlerEvent};
pub use flag::{Flag, FlagKind};
pub use generator::{ArgumentGenerator, ArgumentSource, GeneratorFactory, SpecListGenerator, Step};
pub use handler::{CommandHandler, Dispatch};
pub use inhibitor::{Inhibitor, InhibitorHandler, InhibitorKind};
pub use lock::{LockGuard, LockScope, Locker};
pub use module::{Category, DEFAULT_CATEGORY, Module, ModuleRegistry, Reloader};
pub use permission::{IgnoreList, PermissionCheck, PermissionSide};
pub use prefix::{ParsedCommand, PrefixRegistry, PrefixSource, compare_prefixes};
pub use prompt::PromptTracker;
pub use registry::CommandRegistry;
pub use runner::{ArgumentRunner, Flow, PhraseResolver, Resolution, SequentialRunner, TypeResolver};
pub use util::{CommandUtil, CommandUtilStore, ParsedSummary};
