//! Structured interaction (slash command) payloads.

use crate::id::{ChannelId, GuildId, InteractionId, MessageId, RoleId, UserId};
use crate::message::{Author, Channel, Message};
use crate::value::{ArgValue, Args};

/// A typed option value inside an interaction payload.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OptionValue {
    /// A subcommand with its own nested options.
    SubCommand(Vec<InteractionOption>),
    /// A subcommand group wrapping subcommands.
    SubCommandGroup(Vec<InteractionOption>),
    /// String option.
    String(String),
    /// Integer option.
    Integer(i64),
    /// Floating point option.
    Number(f64),
    /// Boolean option.
    Boolean(bool),
    /// User option.
    User(UserId),
    /// Channel option.
    Channel(ChannelId),
    /// Role option.
    Role(RoleId),
    /// User-or-role option.
    Mentionable(u64),
}

/// A named option inside an interaction payload.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InteractionOption {
    /// Option name as declared at registration.
    pub name: String,
    /// Option value.
    pub value: OptionValue,
}

impl InteractionOption {
    /// Creates an option.
    #[must_use]
    pub fn new(name: impl Into<String>, value: OptionValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// An inbound slash-command interaction.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interaction {
    /// Interaction id.
    pub id: InteractionId,
    /// Name of the invoked command.
    pub command_name: String,
    /// Top-level options.
    pub options: Vec<InteractionOption>,
    /// Invoking user.
    pub author: Author,
    /// Channel the interaction happened in.
    pub channel: Channel,
    /// Guild, if any.
    pub guild_id: Option<GuildId>,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: u64,
}

impl Interaction {
    /// Creates an interaction in a direct-message channel.
    #[must_use]
    pub fn new(id: InteractionId, command_name: impl Into<String>, author: UserId) -> Self {
        Self {
            id,
            command_name: command_name.into(),
            options: Vec::new(),
            author: Author::user(author),
            channel: Channel::dm(ChannelId::new(author.get())),
            guild_id: None,
            created_at: 0,
        }
    }

    /// Adds a top-level option.
    #[must_use]
    pub fn with_option(mut self, option: InteractionOption) -> Self {
        self.options.push(option);
        self
    }

    /// Moves the interaction into a guild channel.
    #[must_use]
    pub fn in_guild(mut self, guild: GuildId, channel: ChannelId) -> Self {
        self.guild_id = Some(guild);
        self.channel = Channel::guild(channel);
        self
    }

    /// Sets the creation timestamp.
    #[must_use]
    pub fn with_created_at(mut self, millis: u64) -> Self {
        self.created_at = millis;
        self
    }

    /// Views this interaction as a message so message-level policy checks
    /// (inhibitors, permissions, cooldowns, locks) apply unchanged.
    ///
    /// The content is the slash invocation text, e.g. `/ban`.
    #[must_use]
    pub fn to_message(&self) -> Message {
        Message {
            id: MessageId::new(self.id.get()),
            content: format!("/{}", self.command_name),
            author: self.author,
            channel: self.channel,
            guild_id: self.guild_id,
            created_at: self.created_at,
            edited_at: None,
            member_cached: true,
            webhook_id: None,
        }
    }

    /// Converts the typed options into the argument shape consumed by
    /// command bodies.
    ///
    /// Subcommand names are bound under `subcommand`, group names under
    /// `subcommandGroup`; nested options are flattened into the same map.
    #[must_use]
    pub fn convert_options(&self) -> Args {
        let mut args = Args::new();
        convert_into(&self.options, &mut args);
        args
    }
}

fn convert_into(options: &[InteractionOption], args: &mut Args) {
    for option in options {
        match &option.value {
            OptionValue::SubCommand(nested) => {
                args.insert("subcommand", option.name.as_str());
                convert_into(nested, args);
            }
            OptionValue::SubCommandGroup(nested) => {
                args.insert("subcommandGroup", option.name.as_str());
                convert_into(nested, args);
            }
            OptionValue::String(s) => args.insert(option.name.as_str(), s.as_str()),
            OptionValue::Integer(n) => args.insert(option.name.as_str(), *n),
            OptionValue::Number(n) => args.insert(option.name.as_str(), *n),
            OptionValue::Boolean(b) => args.insert(option.name.as_str(), *b),
            OptionValue::User(id) => args.insert(option.name.as_str(), ArgValue::User(*id)),
            OptionValue::Channel(id) => {
                args.insert(option.name.as_str(), ArgValue::Channel(*id));
            }
            OptionValue::Role(id) => args.insert(option.name.as_str(), ArgValue::Role(*id)),
            OptionValue::Mentionable(id) => {
                args.insert(option.name.as_str(), ArgValue::Mentionable(*id));
            }
        }
    }
}
