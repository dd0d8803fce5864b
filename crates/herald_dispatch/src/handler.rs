//! The command handler: prefix resolution and the dispatch pipeline.
//!
//! # Pipeline
//!
//! ```text
//! message ─► all inhibitors ─► pre inhibitors ─► prefix + alias ─┬─► direct command
//!                                                                └─► regex / conditional
//! direct command:
//!   post checks ─► before hook ─► parse + run arguments ─┬─► flag (cancel, retry, continue, fail)
//!                                                        └─► lock ─► exec
//! ```
//!
//! Policy rejections are published as events and return
//! [`Dispatch::NotRan`]. Errors are published on the error event when anyone
//! is subscribed and returned to the caller otherwise.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, join_all};
use herald_content::ParseResult;
use herald_foundation::{ArgValue, Args, Error, ErrorContext, Interaction, Message, Result};
use parking_lot::RwLock;
use regex::Regex;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, debug_span, instrument, trace, warn};

use crate::client::Client;
use crate::command::{ChannelRestriction, Command, CommandContext, SlashContext};
use crate::config::HandlerConfig;
use crate::cooldown::{CooldownManager, CooldownVerdict};
use crate::events::{BlockReason, BuiltInReason, EventBus, HandlerEvent};
use crate::flag::Flag;
use crate::inhibitor::{InhibitorHandler, InhibitorKind};
use crate::lock::LockGuard;
use crate::module::Reloader;
use crate::permission::PermissionSide;
use crate::prefix::{ParsedCommand, compare_prefixes, parse_multiple_prefixes};
use crate::prompt::PromptTracker;
use crate::registry::CommandRegistry;
use crate::runner::{ArgumentRunner, Flow, PhraseResolver, SequentialRunner};
use crate::util::{CommandUtilStore, ParsedSummary};

/// Outcome of dispatching one message or interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dispatch {
    /// A command ran to completion.
    Ran,
    /// Nothing ran: no command matched, a check rejected it, or argument
    /// resolution cancelled it.
    NotRan,
    /// An error was raised and published on the error event.
    Errored,
}

impl Dispatch {
    /// Returns true if a command ran.
    #[must_use]
    pub const fn ran(self) -> bool {
        matches!(self, Self::Ran)
    }
}

enum LockAttempt {
    Unlocked,
    Acquired(LockGuard),
    Held,
}

/// Registers commands and dispatches messages and interactions to them.
pub struct CommandHandler {
    client: Arc<dyn Client>,
    config: HandlerConfig,
    commands: RwLock<CommandRegistry>,
    inhibitors: InhibitorHandler,
    runner: Arc<dyn ArgumentRunner>,
    cooldowns: CooldownManager,
    prompts: Arc<PromptTracker>,
    utils: Arc<CommandUtilStore>,
    events: EventBus,
    sweeper: Option<JoinHandle<()>>,
}

impl CommandHandler {
    /// Creates a handler. Inside a tokio runtime this also starts the
    /// command util sweeper when utils are kept.
    #[must_use]
    pub fn new(client: Arc<dyn Client>, config: HandlerConfig) -> Self {
        let events = EventBus::new(config.event_capacity);
        let commands = CommandRegistry::new()
            .with_alias_replacement(config.alias_replacement.clone())
            .with_automate_categories(config.automate_categories);
        let utils = Arc::new(CommandUtilStore::new());
        let sweeper = if config.command_util && config.command_util_sweep_interval > 0 {
            utils.spawn_sweeper(
                Duration::from_millis(config.command_util_sweep_interval),
                config.command_util_lifetime,
            )
        } else {
            None
        };

        Self {
            client,
            inhibitors: InhibitorHandler::new(events.clone()),
            commands: RwLock::new(commands),
            runner: Arc::new(SequentialRunner::new(PhraseResolver)),
            cooldowns: CooldownManager::new(),
            prompts: Arc::new(PromptTracker::new()),
            utils,
            events,
            sweeper,
            config,
        }
    }

    /// Builder method to replace the argument runner.
    #[must_use]
    pub fn with_runner(mut self, runner: impl ArgumentRunner + 'static) -> Self {
        self.runner = Arc::new(runner);
        self
    }

    /// The platform client.
    #[must_use]
    pub fn client(&self) -> &Arc<dyn Client> {
        &self.client
    }

    /// The handler configuration.
    #[must_use]
    pub const fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// The event bus.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribes to handler events.
    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<HandlerEvent> {
        self.events.subscribe()
    }

    /// The inhibitor handler.
    #[must_use]
    pub const fn inhibitors(&self) -> &InhibitorHandler {
        &self.inhibitors
    }

    /// Cooldown bookkeeping.
    #[must_use]
    pub const fn cooldowns(&self) -> &CooldownManager {
        &self.cooldowns
    }

    /// Open prompts, shared so argument runners can mark prompts.
    #[must_use]
    pub fn prompt_tracker(&self) -> Arc<PromptTracker> {
        Arc::clone(&self.prompts)
    }

    /// Command utils by message.
    #[must_use]
    pub const fn command_utils(&self) -> &Arc<CommandUtilStore> {
        &self.utils
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers a command.
    ///
    /// # Errors
    ///
    /// Fails on a duplicate id or an alias owned by another command.
    pub fn register(&self, command: Command) -> Result<Arc<Command>> {
        self.register_from(command, None)
    }

    /// Registers a command loaded from `filepath`.
    ///
    /// # Errors
    ///
    /// Fails on a duplicate id or an alias owned by another command.
    pub fn register_from(&self, command: Command, filepath: Option<PathBuf>) -> Result<Arc<Command>> {
        let command = Arc::new(command);
        self.commands
            .write()
            .register(Arc::clone(&command), filepath)?;
        self.events.publish(HandlerEvent::Load {
            id: command.id.clone(),
            reload: false,
        });
        Ok(command)
    }

    /// Removes a command.
    ///
    /// # Errors
    ///
    /// Fails if the id is unknown.
    pub fn remove(&self, id: &str) -> Result<Arc<Command>> {
        let removed = self.commands.write().remove(id)?;
        self.events.publish(HandlerEvent::Remove { id: id.to_string() });
        Ok(removed)
    }

    /// Removes every command.
    pub fn remove_all(&self) -> Vec<Arc<Command>> {
        let removed = self.commands.write().remove_all();
        for command in &removed {
            self.events.publish(HandlerEvent::Remove {
                id: command.id.clone(),
            });
        }
        removed
    }

    /// Replaces a command with a fresh instance.
    ///
    /// # Errors
    ///
    /// Fails if the id is unknown or the fresh command cannot be registered.
    pub fn reload(&self, id: &str, reloader: &Reloader<'_, Command>) -> Result<Arc<Command>> {
        let fresh = self.commands.write().reload(id, reloader)?;
        self.events.publish(HandlerEvent::Load {
            id: fresh.id.clone(),
            reload: true,
        });
        Ok(fresh)
    }

    /// Reloads every command.
    ///
    /// # Errors
    ///
    /// Stops at the first failing reload.
    pub fn reload_all(&self, reloader: &Reloader<'_, Command>) -> Result<Vec<Arc<Command>>> {
        let reloaded = self.commands.write().reload_all(reloader)?;
        for command in &reloaded {
            self.events.publish(HandlerEvent::Load {
                id: command.id.clone(),
                reload: true,
            });
        }
        Ok(reloaded)
    }

    /// Finds a command by alias.
    #[must_use]
    pub fn find_command(&self, alias: &str) -> Option<Arc<Command>> {
        self.commands.read().find_command(alias)
    }

    /// Gets a command by id.
    #[must_use]
    pub fn command(&self, id: &str) -> Option<Arc<Command>> {
        self.commands.read().get(id)
    }

    /// The commands of a category, found ignoring case.
    #[must_use]
    pub fn find_category(&self, name: &str) -> Option<Vec<Arc<Command>>> {
        self.commands
            .read()
            .find_category(name)
            .map(|category| category.iter().cloned().collect())
    }

    /// Every registered command.
    #[must_use]
    pub fn commands(&self) -> Vec<Arc<Command>> {
        self.commands.read().iter().cloned().collect()
    }

    // =========================================================================
    // Prompts
    // =========================================================================

    /// Marks a prompt open for the message's author in its channel.
    pub fn add_prompt(&self, message: &Message) -> bool {
        self.prompts.add(message.channel.id, message.author.id)
    }

    /// Marks a prompt closed.
    pub fn remove_prompt(&self, message: &Message) {
        self.prompts.remove(message.channel.id, message.author.id);
    }

    /// Returns true if the author has an open prompt in the channel.
    #[must_use]
    pub fn has_prompt(&self, message: &Message) -> bool {
        self.prompts.has(message.channel.id, message.author.id)
    }

    // =========================================================================
    // Prefix resolution
    // =========================================================================

    /// Matches the message against the default prefixes, plus mentions of
    /// the bot when allowed.
    #[must_use]
    pub fn parse_command(&self, message: &Message) -> ParsedCommand {
        let mut prefixes = self.config.prefix.resolve(message);
        if self.config.allow_mention {
            let me = self.client.user_id();
            prefixes.push(format!("<@{me}>"));
            prefixes.push(format!("<@!{me}>"));
        }
        prefixes.sort_by(|a, b| compare_prefixes(a, b));

        let pairs: Vec<(String, Option<BTreeSet<String>>)> =
            prefixes.into_iter().map(|p| (p, None)).collect();
        let registry = self.commands.read();
        parse_multiple_prefixes(&message.content, &pairs, |alias| registry.find_command(alias))
    }

    /// Matches the message against prefixes declared by commands.
    #[must_use]
    pub fn parse_command_overwritten_prefixes(&self, message: &Message) -> ParsedCommand {
        let registry = self.commands.read();
        if registry.prefixes().is_empty() {
            return ParsedCommand::default();
        }
        let pairs: Vec<(String, Option<BTreeSet<String>>)> = registry
            .prefixes()
            .resolve(message)
            .into_iter()
            .map(|(p, ids)| (p, Some(ids)))
            .collect();
        parse_multiple_prefixes(&message.content, &pairs, |alias| registry.find_command(alias))
    }

    // =========================================================================
    // Message dispatch
    // =========================================================================

    /// Dispatches a message.
    ///
    /// # Errors
    ///
    /// Returns errors nobody is subscribed to receive.
    pub fn handle(&self, message: Message) -> BoxFuture<'_, Result<Dispatch>> {
        let span = debug_span!("handle", message = %message.id, author = %message.author.id);
        async move {
            match self.dispatch(&message).await {
                Ok(outcome) => Ok(outcome),
                Err(error) => self.route_error(error, &message, None),
            }
        }
        .instrument(span)
        .boxed()
    }

    /// Dispatches an edited message when edits are handled and the content
    /// changed.
    ///
    /// # Errors
    ///
    /// Returns errors nobody is subscribed to receive.
    pub async fn handle_edit(&self, old: &Message, new: Message) -> Result<Dispatch> {
        if !self.config.handle_edits || old.content == new.content {
            return Ok(Dispatch::NotRan);
        }
        self.handle(new).await
    }

    async fn dispatch(&self, message: &Message) -> Result<Dispatch> {
        if self.config.fetch_members && !message.member_cached && message.webhook_id.is_none() {
            if let Some(guild) = message.guild_id {
                self.client.fetch_member(guild, message.author.id).await?;
            }
        }

        if self.run_all_type_inhibitors(message, false).await? {
            return Ok(Dispatch::NotRan);
        }

        let util = self
            .config
            .command_util
            .then(|| self.utils.get_or_create(&self.client, message, self.config.store_messages));

        if self.run_pre_type_inhibitors(message).await? {
            return Ok(Dispatch::NotRan);
        }

        let mut parsed = self.parse_command(message);
        if !parsed.has_command() {
            let overridden = self.parse_command_overwritten_prefixes(message);
            if overridden.has_command() || (!parsed.has_prefix() && overridden.has_prefix()) {
                parsed = overridden;
            }
        }
        debug!(
            prefix = ?parsed.prefix,
            alias = ?parsed.alias,
            command = ?parsed.command.as_ref().map(|c| c.id.as_str()),
            "parsed message"
        );

        if let Some(util) = &util {
            util.set_parsed(ParsedSummary {
                prefix: parsed.prefix.clone(),
                alias: parsed.alias.clone(),
                content: parsed.content.clone(),
                after_prefix: parsed.after_prefix.clone(),
            });
        }

        match parsed.command {
            Some(command) => {
                self.handle_direct_command(message, parsed.content, command, false)
                    .await
            }
            None => {
                if self.handle_regex_and_conditional_commands(message).await? {
                    Ok(Dispatch::Ran)
                } else {
                    self.events.publish(HandlerEvent::MessageInvalid {
                        message: message.clone(),
                    });
                    Ok(Dispatch::NotRan)
                }
            }
        }
    }

    /// Runs an identified command with `content` as its argument text.
    ///
    /// With `ignore`, the edit check, post checks and lock are skipped.
    ///
    /// # Errors
    ///
    /// Returns errors nobody is subscribed to receive.
    pub fn handle_direct_command<'a>(
        &'a self,
        message: &'a Message,
        content: String,
        command: Arc<Command>,
        ignore: bool,
    ) -> BoxFuture<'a, Result<Dispatch>> {
        async move {
            match self
                .run_direct_command(message, &content, &command, ignore)
                .await
            {
                Ok(outcome) => Ok(outcome),
                Err(error) => self.route_error(error, message, Some(&command.id)),
            }
        }
        .boxed()
    }

    async fn run_direct_command(
        &self,
        message: &Message,
        content: &str,
        command: &Arc<Command>,
        ignore: bool,
    ) -> Result<Dispatch> {
        if !ignore {
            if message.is_edited() && !command.editable {
                return Ok(Dispatch::NotRan);
            }
            if self.run_post_type_inhibitors(message, command).await? {
                return Ok(Dispatch::NotRan);
            }
        }

        command.executor.before(message).await?;

        let parsed = command.content_parser().parse(content)?;
        let generator = command.args.start(message, &parsed);
        let args = match self.runner.run(message, &parsed, generator).await? {
            Flow::Args(args) => args,
            Flow::Flag(flag) => return self.interpret_flag(message, command, &parsed, flag).await,
        };

        let _guard = if ignore {
            None
        } else {
            match self.try_lock(message, command, &args) {
                LockAttempt::Unlocked => None,
                LockAttempt::Acquired(guard) => Some(guard),
                LockAttempt::Held => return Ok(Dispatch::NotRan),
            }
        };

        self.run_command(message, command, args).await?;
        Ok(Dispatch::Ran)
    }

    async fn interpret_flag(
        &self,
        message: &Message,
        command: &Command,
        parsed: &ParseResult,
        flag: Flag,
    ) -> Result<Dispatch> {
        debug!(command = %command.id, kind = ?flag.kind(), "argument flag");
        match flag {
            Flag::Cancel => {
                self.events.publish(HandlerEvent::CommandCancelled {
                    message: message.clone(),
                    command: command.id.clone(),
                    failure: None,
                });
                Ok(Dispatch::NotRan)
            }
            Flag::Fail { value } => {
                self.events.publish(HandlerEvent::CommandCancelled {
                    message: message.clone(),
                    command: command.id.clone(),
                    failure: Some(value),
                });
                Ok(Dispatch::NotRan)
            }
            Flag::Retry { message: next } => {
                self.events.publish(HandlerEvent::CommandBreakout {
                    message: message.clone(),
                    command: command.id.clone(),
                    next: (*next).clone(),
                });
                self.handle(*next).await
            }
            Flag::Continue {
                command: next,
                ignore,
                rest,
            } => {
                let next = self
                    .command(&next)
                    .ok_or_else(|| Error::unknown_command(next))?;
                // Runners that leave rest unset hand over the whole remainder.
                let rest = rest.unwrap_or_else(|| parsed.raw_content());
                self.handle_direct_command(message, rest, next, ignore).await
            }
        }
    }

    /// Runs regex commands, then conditional commands, on a message no
    /// prefix matched. Returns true if any matched.
    ///
    /// # Errors
    ///
    /// Returns the first error nobody is subscribed to receive.
    pub async fn handle_regex_and_conditional_commands(&self, message: &Message) -> Result<bool> {
        let candidates: Vec<Arc<Command>> = self
            .commands
            .read()
            .iter()
            .filter(|c| !message.is_edited() || c.editable)
            .cloned()
            .collect();

        let regex_matches: Vec<(Arc<Command>, Args)> = candidates
            .iter()
            .filter_map(|command| {
                let regex = command.executor.regex(message)?;
                let args = regex_args(&regex, &message.content)?;
                Some((Arc::clone(command), args))
            })
            .collect();
        let ran_regex = self.run_matched(message, regex_matches).await?;

        let conditional: Vec<(Arc<Command>, Args)> = candidates
            .iter()
            .filter(|command| command.executor.condition(message))
            .map(|command| (Arc::clone(command), Args::new()))
            .collect();
        let ran_conditional = self.run_matched(message, conditional).await?;

        Ok(ran_regex || ran_conditional)
    }

    async fn run_matched(&self, message: &Message, matched: Vec<(Arc<Command>, Args)>) -> Result<bool> {
        if matched.is_empty() {
            return Ok(false);
        }
        trace!(count = matched.len(), "running matched commands");

        let outcomes = join_all(matched.into_iter().map(|(command, args)| async move {
            let outcome = self.run_matched_command(message, &command, args).await;
            outcome.map_err(|error| (error, command))
        }))
        .await;

        for outcome in outcomes {
            if let Err((error, command)) = outcome {
                self.route_error(error, message, Some(&command.id))?;
            }
        }
        Ok(true)
    }

    async fn run_matched_command(&self, message: &Message, command: &Command, args: Args) -> Result<()> {
        if self.run_post_type_inhibitors(message, command).await? {
            return Ok(());
        }
        command.executor.before(message).await?;
        let _guard = match self.try_lock(message, command, &args) {
            LockAttempt::Unlocked => None,
            LockAttempt::Acquired(guard) => Some(guard),
            LockAttempt::Held => return Ok(()),
        };
        self.run_command(message, command, args).await?;
        Ok(())
    }

    /// Executes a command with resolved arguments, publishing started and
    /// finished events.
    ///
    /// # Errors
    ///
    /// Returns the command's error.
    pub async fn run_command(&self, message: &Message, command: &Command, args: Args) -> Result<ArgValue> {
        if command.typing {
            if let Err(error) = self.client.start_typing(message.channel.id).await {
                warn!(command = %command.id, %error, "failed to start typing");
            }
        }

        self.events.publish(HandlerEvent::CommandStarted {
            message: message.clone(),
            command: command.id.clone(),
            args: args.clone(),
        });

        let ctx = CommandContext {
            message: message.clone(),
            args: args.clone(),
            util: self
                .config
                .command_util
                .then(|| self.utils.get(message.id))
                .flatten(),
            client: Arc::clone(&self.client),
        };
        let result = command.executor.exec(ctx).await;

        if command.typing {
            if let Err(error) = self.client.stop_typing(message.channel.id).await {
                warn!(command = %command.id, %error, "failed to stop typing");
            }
        }

        let output = result?;
        self.events.publish(HandlerEvent::CommandFinished {
            message: message.clone(),
            command: command.id.clone(),
            args,
            output: output.clone(),
        });
        Ok(output)
    }

    // =========================================================================
    // Slash dispatch
    // =========================================================================

    /// Dispatches an interaction to the slash command it names.
    ///
    /// # Errors
    ///
    /// Returns pipeline errors nobody is subscribed to receive. Errors from
    /// the command itself are published as slash errors.
    #[instrument(skip_all, fields(interaction = %interaction.id, command = %interaction.command_name))]
    pub async fn handle_slash(&self, interaction: Interaction) -> Result<Dispatch> {
        let Some(command) = self
            .find_command(&interaction.command_name)
            .filter(|c| c.slash)
        else {
            self.events
                .publish(HandlerEvent::SlashNotFound { interaction });
            return Ok(Dispatch::NotRan);
        };

        let message = interaction.to_message();
        match self.dispatch_slash(&interaction, &message, &command).await {
            Ok(outcome) => Ok(outcome),
            Err(error) => self.route_error(error, &message, Some(&command.id)),
        }
    }

    async fn dispatch_slash(
        &self,
        interaction: &Interaction,
        message: &Message,
        command: &Command,
    ) -> Result<Dispatch> {
        if self.run_all_type_inhibitors(message, true).await? {
            return Ok(Dispatch::NotRan);
        }
        if self.run_pre_type_inhibitors(message).await? {
            return Ok(Dispatch::NotRan);
        }
        if self.run_post_type_inhibitors(message, command).await? {
            return Ok(Dispatch::NotRan);
        }

        let args = interaction.convert_options();
        let _guard = match self.try_lock(message, command, &args) {
            LockAttempt::Unlocked => None,
            LockAttempt::Acquired(guard) => Some(guard),
            LockAttempt::Held => return Ok(Dispatch::NotRan),
        };

        if self.config.auto_defer || command.slash_ephemeral {
            self.client
                .defer(interaction.id, command.slash_ephemeral)
                .await?;
        }

        self.events.publish(HandlerEvent::SlashStarted {
            interaction: interaction.clone(),
            command: command.id.clone(),
            args: args.clone(),
        });

        let ctx = SlashContext {
            interaction: interaction.clone(),
            message: message.clone(),
            args,
            client: Arc::clone(&self.client),
        };
        match command.executor.exec_slash(ctx).await {
            Ok(output) => {
                self.events.publish(HandlerEvent::SlashFinished {
                    interaction: interaction.clone(),
                    command: command.id.clone(),
                    output,
                });
                Ok(Dispatch::Ran)
            }
            Err(error) => {
                warn!(command = %command.id, %error, "slash command failed");
                self.events.publish(HandlerEvent::SlashError {
                    error: Arc::new(error),
                    interaction: interaction.clone(),
                    command: command.id.clone(),
                });
                Ok(Dispatch::Errored)
            }
        }
    }

    // =========================================================================
    // Checks
    // =========================================================================

    async fn run_all_type_inhibitors(&self, message: &Message, slash: bool) -> Result<bool> {
        let reason = if let Some(reason) = self
            .inhibitors
            .test(InhibitorKind::All, message, None)
            .await?
        {
            Some(BlockReason::Inhibitor(reason))
        } else if self.config.block_client && message.author.id == self.client.user_id() {
            Some(BuiltInReason::Client.into())
        } else if self.config.block_bots && message.author.bot {
            Some(BuiltInReason::Bot.into())
        } else {
            None
        };

        if let Some(reason) = reason {
            trace!(%reason, "message blocked");
            self.events.publish(HandlerEvent::MessageBlocked {
                message: message.clone(),
                reason,
            });
            return Ok(true);
        }

        if !slash && self.prompts.has(message.channel.id, message.author.id) {
            self.events.publish(HandlerEvent::InPrompt {
                message: message.clone(),
            });
            return Ok(true);
        }
        Ok(false)
    }

    async fn run_pre_type_inhibitors(&self, message: &Message) -> Result<bool> {
        match self
            .inhibitors
            .test(InhibitorKind::Pre, message, None)
            .await?
        {
            Some(reason) => {
                self.events.publish(HandlerEvent::MessageBlocked {
                    message: message.clone(),
                    reason: BlockReason::Inhibitor(reason),
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn run_post_type_inhibitors(&self, message: &Message, command: &Command) -> Result<bool> {
        if self.config.skip_built_in_post_inhibitors {
            // Pluggable inhibitors see the command before the built-ins do.
            if let Some(reason) = self
                .inhibitors
                .test(InhibitorKind::Post, message, Some(command))
                .await?
            {
                self.publish_blocked(message, command, BlockReason::Inhibitor(reason));
                return Ok(true);
            }
            if self.built_in_blocked(message, command) {
                return Ok(true);
            }
            if self.permissions_blocked(message, command).await? {
                return Ok(true);
            }
        } else {
            if self.built_in_blocked(message, command) {
                return Ok(true);
            }
            if self.permissions_blocked(message, command).await? {
                return Ok(true);
            }
            if let Some(reason) = self
                .inhibitors
                .test(InhibitorKind::Post, message, Some(command))
                .await?
            {
                self.publish_blocked(message, command, BlockReason::Inhibitor(reason));
                return Ok(true);
            }
        }

        Ok(self.cooldown_blocked(message, command))
    }

    fn built_in_blocked(&self, message: &Message, command: &Command) -> bool {
        let author = message.author.id;
        let reason = if command.owner_only && !self.client.is_owner(author) {
            Some(BuiltInReason::Owner)
        } else if command.super_user_only && !self.client.is_super_user(author) {
            Some(BuiltInReason::SuperUser)
        } else if command.channel == Some(ChannelRestriction::Guild) && !message.in_guild_channel() {
            Some(BuiltInReason::Guild)
        } else if command.channel == Some(ChannelRestriction::Dm) && message.in_guild_channel() {
            Some(BuiltInReason::Dm)
        } else if command.only_nsfw && !message.channel.nsfw {
            Some(BuiltInReason::NotNsfw)
        } else {
            None
        };

        match reason {
            Some(reason) => {
                self.publish_blocked(message, command, reason.into());
                true
            }
            None => false,
        }
    }

    fn publish_blocked(&self, message: &Message, command: &Command, reason: BlockReason) {
        debug!(command = %command.id, %reason, "command blocked");
        self.events.publish(HandlerEvent::CommandBlocked {
            message: message.clone(),
            command: command.id.clone(),
            reason,
        });
    }

    async fn permissions_blocked(&self, message: &Message, command: &Command) -> Result<bool> {
        if let Some(check) = &command.client_permissions {
            let missing = check
                .missing(self.client.as_ref(), message, self.client.user_id())
                .await?;
            if let Some(missing) = missing {
                self.publish_missing(message, command, PermissionSide::Client, missing);
                return Ok(true);
            }
        }

        if let Some(check) = &command.user_permissions {
            let ignore = command
                .ignore_permissions
                .as_ref()
                .unwrap_or(&self.config.ignore_permissions);
            if !ignore.contains(self.client.as_ref(), message, &command.id) {
                let missing = check
                    .missing(self.client.as_ref(), message, message.author.id)
                    .await?;
                if let Some(missing) = missing {
                    self.publish_missing(message, command, PermissionSide::User, missing);
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn publish_missing(&self, message: &Message, command: &Command, side: PermissionSide, missing: ArgValue) {
        debug!(command = %command.id, ?side, %missing, "missing permissions");
        self.events.publish(HandlerEvent::MissingPermissions {
            message: message.clone(),
            command: command.id.clone(),
            side,
            missing,
        });
    }

    fn cooldown_blocked(&self, message: &Message, command: &Command) -> bool {
        let ignore = command
            .ignore_cooldown
            .as_ref()
            .unwrap_or(&self.config.ignore_cooldown);
        if ignore.contains(self.client.as_ref(), message, &command.id) {
            return false;
        }

        let cooldown = command.cooldown.unwrap_or(self.config.default_cooldown);
        match self.cooldowns.check(
            message.author.id,
            &command.id,
            message.created_at,
            cooldown,
            command.ratelimit,
        ) {
            CooldownVerdict::Ready => false,
            CooldownVerdict::Limited { remaining } => {
                self.events.publish(HandlerEvent::Cooldown {
                    message: message.clone(),
                    command: command.id.clone(),
                    remaining,
                });
                true
            }
        }
    }

    fn try_lock(&self, message: &Message, command: &Command, args: &Args) -> LockAttempt {
        let Some(key) = command.lock.as_ref().and_then(|scope| scope.key(message, args)) else {
            return LockAttempt::Unlocked;
        };
        match command.locker.try_acquire(key.clone()) {
            Some(guard) => LockAttempt::Acquired(guard),
            None => {
                debug!(command = %command.id, %key, "command locked");
                self.events.publish(HandlerEvent::CommandLocked {
                    message: message.clone(),
                    command: command.id.clone(),
                    key,
                });
                LockAttempt::Held
            }
        }
    }

    /// Publishes an error when anyone listens, otherwise hands it back.
    fn route_error(&self, error: Error, message: &Message, command: Option<&str>) -> Result<Dispatch> {
        let error = if error.context.is_some() {
            error
        } else {
            let mut context = ErrorContext::new().with_message(message.id);
            if let Some(command) = command {
                context = context.with_command(command);
            }
            error.with_context(context)
        };

        if !self.events.has_listeners() {
            return Err(error);
        }
        warn!(%error, command = ?command, "dispatch error");
        self.events.publish(HandlerEvent::Error {
            error: Arc::new(error),
            message: message.clone(),
            command: command.map(str::to_string),
        });
        Ok(Dispatch::Errored)
    }
}

impl Drop for CommandHandler {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}

impl std::fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHandler")
            .field("config", &self.config)
            .field("commands", &*self.commands.read())
            .field("inhibitors", &self.inhibitors)
            .finish_non_exhaustive()
    }
}

/// Arguments for a regex match: `match` is the whole match, `groups` the
/// capture groups of the first match and `matches` every match.
fn regex_args(regex: &Regex, content: &str) -> Option<Args> {
    let captures = regex.captures(content)?;
    let whole = captures.get(0).map_or("", |m| m.as_str());
    let groups: Vec<ArgValue> = captures
        .iter()
        .skip(1)
        .map(|group| group.map_or(ArgValue::Null, |m| ArgValue::from(m.as_str())))
        .collect();
    let matches: Vec<ArgValue> = regex
        .find_iter(content)
        .map(|m| ArgValue::from(m.as_str()))
        .collect();
    Some(
        Args::new()
            .with("match", whole)
            .with("groups", groups)
            .with("matches", matches),
    )
}
