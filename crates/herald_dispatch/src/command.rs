//! Command definitions.
//!
//! A [`Command`] is plain configuration plus a [`CommandExecutor`] holding
//! the behaviour. Policy fields (restrictions, permissions, cooldown, lock)
//! are read by the handler pipeline; the executor only sees invocations that
//! passed them.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use herald_content::{ContentParser, ContentParserConfig};
use herald_foundation::{ArgValue, Args, Interaction, Message, MessageId, Result};
use regex::Regex;

use crate::client::Client;
use crate::generator::ArgumentSource;
use crate::lock::{LockScope, Locker};
use crate::module::{DEFAULT_CATEGORY, Module};
use crate::permission::{IgnoreList, PermissionCheck};
use crate::prefix::PrefixSource;
use crate::util::CommandUtil;

/// Where a command may run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelRestriction {
    /// Guild channels only.
    Guild,
    /// Direct messages only.
    Dm,
}

/// A text invocation handed to [`CommandExecutor::exec`].
#[derive(Clone)]
pub struct CommandContext {
    /// The invoking message.
    pub message: Message,
    /// Resolved arguments.
    pub args: Args,
    /// Response bookkeeping, when the handler keeps it.
    pub util: Option<Arc<CommandUtil>>,
    /// The platform client.
    pub client: Arc<dyn Client>,
}

impl CommandContext {
    /// Replies in the invoking channel, editing the previous response when
    /// the util says so.
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub async fn reply(&self, content: &str) -> Result<MessageId> {
        match &self.util {
            Some(util) => util.send(content).await,
            None => self.client.send(self.message.channel.id, content).await,
        }
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("message", &self.message.id)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// A slash invocation handed to [`CommandExecutor::exec_slash`].
#[derive(Clone)]
pub struct SlashContext {
    /// The interaction.
    pub interaction: Interaction,
    /// The interaction viewed as a message.
    pub message: Message,
    /// Converted options.
    pub args: Args,
    /// The platform client.
    pub client: Arc<dyn Client>,
}

impl SlashContext {
    /// Views this invocation as a text invocation without a util.
    #[must_use]
    pub fn into_command_context(self) -> CommandContext {
        CommandContext {
            message: self.message,
            args: self.args,
            util: None,
            client: self.client,
        }
    }
}

impl fmt::Debug for SlashContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlashContext")
            .field("interaction", &self.interaction.id)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// Behaviour of a command.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Runs the command. The returned value is reported on the finished
    /// event.
    ///
    /// # Errors
    ///
    /// Errors are routed to the handler's error event.
    async fn exec(&self, ctx: CommandContext) -> Result<ArgValue>;

    /// Runs the command for an interaction. Defaults to [`exec`](Self::exec).
    ///
    /// # Errors
    ///
    /// Errors are routed to the handler's slash error event.
    async fn exec_slash(&self, ctx: SlashContext) -> Result<ArgValue> {
        self.exec(ctx.into_command_context()).await
    }

    /// Runs after post checks pass and before arguments are parsed.
    ///
    /// # Errors
    ///
    /// Errors abort the invocation and are routed like command errors.
    async fn before(&self, _message: &Message) -> Result<()> {
        Ok(())
    }

    /// Returning true runs the command on messages no prefix matched.
    fn condition(&self, _message: &Message) -> bool {
        false
    }

    /// A pattern that runs the command on messages no prefix matched.
    fn regex(&self, _message: &Message) -> Option<Regex> {
        None
    }
}

/// Adapts an async closure into a [`CommandExecutor`].
pub struct FnExecutor<F>(pub F);

#[async_trait]
impl<F, Fut> CommandExecutor for FnExecutor<F>
where
    F: Fn(CommandContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ArgValue>> + Send + 'static,
{
    async fn exec(&self, ctx: CommandContext) -> Result<ArgValue> {
        (self.0)(ctx).await
    }
}

/// A registered command.
#[derive(Clone)]
pub struct Command {
    /// Unique id.
    pub id: String,
    /// Category id.
    pub category: String,
    /// Names the command answers to, matched ignoring case.
    pub aliases: Vec<String>,
    /// Own prefixes. A command with its own prefix is unreachable through
    /// the handler's default prefix.
    pub prefix: Option<PrefixSource>,
    /// Argument specs or generator.
    pub args: ArgumentSource,
    /// Extra presence flag words, beyond those found in `args`.
    pub flag_words: Vec<String>,
    /// Extra option flag words, beyond those found in `args`.
    pub option_flag_words: Vec<String>,
    /// Whether quotes group phrases.
    pub quoted: bool,
    /// Phrase separator.
    pub separator: Option<String>,
    /// Channel restriction.
    pub channel: Option<ChannelRestriction>,
    /// Only bot owners may run it.
    pub owner_only: bool,
    /// Only super users may run it.
    pub super_user_only: bool,
    /// Only runs in age-restricted channels.
    pub only_nsfw: bool,
    /// Runs again when the invoking message is edited.
    pub editable: bool,
    /// Shows the typing indicator while running.
    pub typing: bool,
    /// Cooldown in milliseconds. `None` uses the handler default.
    pub cooldown: Option<u64>,
    /// Uses allowed per cooldown window.
    pub ratelimit: u32,
    /// Permissions the bot needs.
    pub client_permissions: Option<PermissionCheck>,
    /// Permissions the author needs.
    pub user_permissions: Option<PermissionCheck>,
    /// Users exempt from the cooldown. `None` uses the handler default.
    pub ignore_cooldown: Option<IgnoreList>,
    /// Users exempt from user permissions. `None` uses the handler default.
    pub ignore_permissions: Option<IgnoreList>,
    /// Lock scope.
    pub lock: Option<LockScope>,
    /// Held lock keys.
    pub locker: Arc<Locker>,
    /// Also runs as a slash command.
    pub slash: bool,
    /// Defers slash responses as ephemeral.
    pub slash_ephemeral: bool,
    /// Human-readable description.
    pub description: String,
    /// Behaviour.
    pub executor: Arc<dyn CommandExecutor>,
}

impl Command {
    /// Creates a command with default settings.
    pub fn new(id: impl Into<String>, executor: impl CommandExecutor + 'static) -> Self {
        Self {
            id: id.into(),
            category: DEFAULT_CATEGORY.to_string(),
            aliases: Vec::new(),
            prefix: None,
            args: ArgumentSource::None,
            flag_words: Vec::new(),
            option_flag_words: Vec::new(),
            quoted: true,
            separator: None,
            channel: None,
            owner_only: false,
            super_user_only: false,
            only_nsfw: false,
            editable: true,
            typing: false,
            cooldown: None,
            ratelimit: 1,
            client_permissions: None,
            user_permissions: None,
            ignore_cooldown: None,
            ignore_permissions: None,
            lock: None,
            locker: Arc::new(Locker::new()),
            slash: false,
            slash_ephemeral: false,
            description: String::new(),
            executor: Arc::new(executor),
        }
    }

    /// Creates a command from an async closure.
    pub fn from_fn<F, Fut>(id: impl Into<String>, f: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ArgValue>> + Send + 'static,
    {
        Self::new(id, FnExecutor(f))
    }

    /// Builder method to set the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Builder method to set aliases.
    #[must_use]
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set own prefixes.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<PrefixSource>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Builder method to set arguments.
    #[must_use]
    pub fn with_args(mut self, args: impl Into<ArgumentSource>) -> Self {
        self.args = args.into();
        self
    }

    /// Builder method to add flag words not declared by specs.
    #[must_use]
    pub fn with_flag_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flag_words = words.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to add option flag words not declared by specs.
    #[must_use]
    pub fn with_option_flag_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.option_flag_words = words.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set quoting.
    #[must_use]
    pub const fn with_quoted(mut self, quoted: bool) -> Self {
        self.quoted = quoted;
        self
    }

    /// Builder method to set the separator.
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    /// Builder method to restrict channels.
    #[must_use]
    pub const fn with_channel(mut self, channel: ChannelRestriction) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Builder method to restrict to owners.
    #[must_use]
    pub const fn with_owner_only(mut self, owner_only: bool) -> Self {
        self.owner_only = owner_only;
        self
    }

    /// Builder method to restrict to super users.
    #[must_use]
    pub const fn with_super_user_only(mut self, super_user_only: bool) -> Self {
        self.super_user_only = super_user_only;
        self
    }

    /// Builder method to restrict to age-restricted channels.
    #[must_use]
    pub const fn with_only_nsfw(mut self, only_nsfw: bool) -> Self {
        self.only_nsfw = only_nsfw;
        self
    }

    /// Builder method to set editability.
    #[must_use]
    pub const fn with_editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    /// Builder method to show typing.
    #[must_use]
    pub const fn with_typing(mut self, typing: bool) -> Self {
        self.typing = typing;
        self
    }

    /// Builder method to set the cooldown in milliseconds.
    #[must_use]
    pub const fn with_cooldown(mut self, millis: u64) -> Self {
        self.cooldown = Some(millis);
        self
    }

    /// Builder method to set uses per cooldown window.
    #[must_use]
    pub const fn with_ratelimit(mut self, ratelimit: u32) -> Self {
        self.ratelimit = ratelimit;
        self
    }

    /// Builder method to require bot permissions.
    #[must_use]
    pub fn with_client_permissions(mut self, check: impl Into<PermissionCheck>) -> Self {
        self.client_permissions = Some(check.into());
        self
    }

    /// Builder method to require author permissions.
    #[must_use]
    pub fn with_user_permissions(mut self, check: impl Into<PermissionCheck>) -> Self {
        self.user_permissions = Some(check.into());
        self
    }

    /// Builder method to exempt users from the cooldown.
    #[must_use]
    pub fn with_ignore_cooldown(mut self, ignore: impl Into<IgnoreList>) -> Self {
        self.ignore_cooldown = Some(ignore.into());
        self
    }

    /// Builder method to exempt users from user permissions.
    #[must_use]
    pub fn with_ignore_permissions(mut self, ignore: impl Into<IgnoreList>) -> Self {
        self.ignore_permissions = Some(ignore.into());
        self
    }

    /// Builder method to set the lock scope.
    #[must_use]
    pub fn with_lock(mut self, lock: LockScope) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Builder method to expose the command as a slash command.
    #[must_use]
    pub const fn with_slash(mut self, slash: bool) -> Self {
        self.slash = slash;
        self
    }

    /// Builder method to defer slash responses ephemerally.
    #[must_use]
    pub const fn with_slash_ephemeral(mut self, ephemeral: bool) -> Self {
        self.slash_ephemeral = ephemeral;
        self
    }

    /// Builder method to set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The content parser for this command's arguments. Flag words come
    /// from the explicit lists and from the declared specs.
    #[must_use]
    pub fn content_parser(&self) -> ContentParser {
        let extracted = ContentParser::extract_flags(self.args.specs());
        let mut config = ContentParserConfig::default()
            .with_flag_words(self.flag_words.iter().cloned().chain(extracted.flag_words))
            .with_option_flag_words(
                self.option_flag_words
                    .iter()
                    .cloned()
                    .chain(extracted.option_flag_words),
            )
            .with_quoted(self.quoted);
        if let Some(separator) = &self.separator {
            config = config.with_separator(separator.clone());
        }
        ContentParser::new(config)
    }
}

impl Module for Command {
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> &str {
        &self.category
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("aliases", &self.aliases)
            .field("prefix", &self.prefix)
            .field("args", &self.args)
            .field("channel", &self.channel)
            .field("cooldown", &self.cooldown)
            .field("ratelimit", &self.ratelimit)
            .field("lock", &self.lock)
            .field("slash", &self.slash)
            .finish_non_exhaustive()
    }
}
