//! Core identifiers, values, and the message model for Herald.
//!
//! This crate provides:
//! - Snowflake id newtypes ([`UserId`], [`ChannelId`], [`GuildId`], ...)
//! - [`ArgValue`] and [`Args`] - resolved argument values handed to commands
//! - [`Message`] and [`Interaction`] - the inbound shapes the dispatcher consumes
//! - [`Permissions`] - permission bit-sets
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod id;
pub mod interaction;
pub mod message;
pub mod permissions;
pub mod value;

pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use id::{ChannelId, GuildId, InteractionId, MessageId, RoleId, UserId};
pub use interaction::{Interaction, InteractionOption, OptionValue};
pub use message::{Author, Channel, ChannelKind, Message};
pub use permissions::Permissions;
pub use value::{ArgValue, Args};
