//! Configuration for the command handler.

use regex::Regex;

use crate::permission::IgnoreList;
use crate::prefix::PrefixSource;

/// Configuration for a [`CommandHandler`](crate::handler::CommandHandler).
///
/// Controls prefixes, message filtering, response bookkeeping and the
/// defaults commands fall back on.
#[derive(Clone, Debug)]
pub struct HandlerConfig {
    /// Default prefixes.
    pub prefix: PrefixSource,

    /// Also accept a mention of the bot as a prefix.
    pub allow_mention: bool,

    /// Pattern stripped from aliases to register an extra alias.
    pub alias_replacement: Option<Regex>,

    /// Ignore messages from the bot itself.
    pub block_client: bool,

    /// Ignore messages from other bots.
    pub block_bots: bool,

    /// Fetch the author's member record when it is not cached.
    pub fetch_members: bool,

    /// Dispatch edited messages again.
    pub handle_edits: bool,

    /// Keep prompt and reply ids on each command util.
    pub store_messages: bool,

    /// Keep a command util per invoking message.
    pub command_util: bool,

    /// Milliseconds of inactivity after which a command util is dropped.
    pub command_util_lifetime: u64,

    /// Milliseconds between command util sweeps. Zero disables sweeping.
    pub command_util_sweep_interval: u64,

    /// Cooldown for commands that do not set one, in milliseconds.
    pub default_cooldown: u64,

    /// Users exempt from cooldowns unless the command overrides it.
    pub ignore_cooldown: IgnoreList,

    /// Users exempt from user permissions unless the command overrides it.
    pub ignore_permissions: IgnoreList,

    /// Run the pluggable post inhibitors before the built-in post checks.
    pub skip_built_in_post_inhibitors: bool,

    /// Defer interactions before running slash commands.
    pub auto_defer: bool,

    /// Events buffered per subscriber.
    pub event_capacity: usize,

    /// Take command categories from their file's parent directory.
    pub automate_categories: bool,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            prefix: PrefixSource::default(),
            allow_mention: true,
            alias_replacement: None,
            block_client: true,
            block_bots: true,
            fetch_members: false,
            handle_edits: false,
            store_messages: false,
            command_util: false,
            command_util_lifetime: 300_000,
            command_util_sweep_interval: 300_000,
            default_cooldown: 0,
            ignore_cooldown: IgnoreList::Owners,
            ignore_permissions: IgnoreList::None,
            skip_built_in_post_inhibitors: false,
            auto_defer: false,
            event_capacity: 256,
            automate_categories: false,
        }
    }
}

impl HandlerConfig {
    /// Creates a configuration with the given default prefix.
    #[must_use]
    pub fn prefixed(prefix: impl Into<PrefixSource>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Creates a configuration for bots that edit their replies when the
    /// invoking message is edited.
    #[must_use]
    pub fn interactive() -> Self {
        Self {
            handle_edits: true,
            command_util: true,
            store_messages: true,
            ..Self::default()
        }
    }

    /// Creates a configuration with no mention prefix, no bookkeeping and
    /// no owner exemptions.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            allow_mention: false,
            command_util_sweep_interval: 0,
            ignore_cooldown: IgnoreList::None,
            ..Self::default()
        }
    }

    /// Builder method to set the default prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<PrefixSource>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Builder method to allow mention prefixes.
    #[must_use]
    pub fn with_allow_mention(mut self, allow: bool) -> Self {
        self.allow_mention = allow;
        self
    }

    /// Builder method to set the alias replacement pattern.
    #[must_use]
    pub fn with_alias_replacement(mut self, pattern: Regex) -> Self {
        self.alias_replacement = Some(pattern);
        self
    }

    /// Builder method to block the bot's own messages.
    #[must_use]
    pub fn with_block_client(mut self, block: bool) -> Self {
        self.block_client = block;
        self
    }

    /// Builder method to block other bots.
    #[must_use]
    pub fn with_block_bots(mut self, block: bool) -> Self {
        self.block_bots = block;
        self
    }

    /// Builder method to fetch uncached members.
    #[must_use]
    pub fn with_fetch_members(mut self, fetch: bool) -> Self {
        self.fetch_members = fetch;
        self
    }

    /// Builder method to handle edits. Edits need command utils.
    #[must_use]
    pub fn with_handle_edits(mut self, handle: bool) -> Self {
        self.handle_edits = handle;
        if handle {
            self.command_util = true;
        }
        self
    }

    /// Builder method to store messages on command utils.
    #[must_use]
    pub fn with_store_messages(mut self, store: bool) -> Self {
        self.store_messages = store;
        if store {
            self.command_util = true;
        }
        self
    }

    /// Builder method to keep command utils.
    #[must_use]
    pub fn with_command_util(mut self, enabled: bool) -> Self {
        self.command_util = enabled;
        self
    }

    /// Builder method to set the command util lifetime.
    #[must_use]
    pub fn with_command_util_lifetime(mut self, millis: u64) -> Self {
        self.command_util_lifetime = millis;
        self
    }

    /// Builder method to set the sweep interval.
    #[must_use]
    pub fn with_command_util_sweep_interval(mut self, millis: u64) -> Self {
        self.command_util_sweep_interval = millis;
        self
    }

    /// Builder method to set the default cooldown.
    #[must_use]
    pub fn with_default_cooldown(mut self, millis: u64) -> Self {
        self.default_cooldown = millis;
        self
    }

    /// Builder method to set the default cooldown exemptions.
    #[must_use]
    pub fn with_ignore_cooldown(mut self, ignore: impl Into<IgnoreList>) -> Self {
        self.ignore_cooldown = ignore.into();
        self
    }

    /// Builder method to set the default permission exemptions.
    #[must_use]
    pub fn with_ignore_permissions(mut self, ignore: impl Into<IgnoreList>) -> Self {
        self.ignore_permissions = ignore.into();
        self
    }

    /// Builder method to order pluggable post inhibitors first.
    #[must_use]
    pub fn with_skip_built_in_post_inhibitors(mut self, skip: bool) -> Self {
        self.skip_built_in_post_inhibitors = skip;
        self
    }

    /// Builder method to defer interactions automatically.
    #[must_use]
    pub fn with_auto_defer(mut self, defer: bool) -> Self {
        self.auto_defer = defer;
        self
    }

    /// Builder method to set the event buffer.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Builder method to derive categories from file paths.
    #[must_use]
    pub fn with_automate_categories(mut self, automate: bool) -> Self {
        self.automate_categories = automate;
        self
    }
}
