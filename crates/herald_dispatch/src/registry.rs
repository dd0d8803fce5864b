//! Command registry: modules, aliases and prefix overrides.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use herald_foundation::{Error, Result};
use regex::Regex;
use tracing::debug;

use crate::command::Command;
use crate::module::{Category, ModuleRegistry, Reloader};
use crate::prefix::PrefixRegistry;

/// Commands by id, by alias and by declared prefix.
///
/// Aliases are lowercased and unique across the registry. A command's own
/// aliases may repeat each other; another command's may not.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    modules: ModuleRegistry<Command>,
    aliases: HashMap<String, String>,
    prefixes: PrefixRegistry,
    alias_replacement: Option<Regex>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the alias replacement pattern.
    #[must_use]
    pub fn with_alias_replacement(mut self, pattern: Option<Regex>) -> Self {
        self.alias_replacement = pattern;
        self
    }

    /// Builder method to derive categories from file paths.
    #[must_use]
    pub fn with_automate_categories(mut self, automate: bool) -> Self {
        self.modules = self.modules.with_automate_categories(automate);
        self
    }

    /// Every alias `command` claims: its own, lowercased, plus the
    /// replacement form where the pattern changes one.
    fn claimed_aliases(&self, command: &Command) -> Vec<String> {
        let mut claimed = Vec::new();
        for alias in &command.aliases {
            let alias = alias.to_lowercase();
            if let Some(pattern) = &self.alias_replacement {
                let replaced = pattern.replace_all(&alias, "").into_owned();
                if replaced != alias && !replaced.is_empty() && !claimed.contains(&replaced) {
                    claimed.push(replaced);
                }
            }
            if !claimed.contains(&alias) {
                claimed.push(alias);
            }
        }
        claimed
    }

    /// Registers a command with its aliases and prefix.
    ///
    /// Nothing is registered when any step would fail.
    ///
    /// # Errors
    ///
    /// Returns [`AliasConflict`](herald_foundation::ErrorKind::AliasConflict)
    /// if another command owns one of the aliases, or
    /// [`DuplicateModule`](herald_foundation::ErrorKind::DuplicateModule) if
    /// the id is taken.
    pub fn register(&mut self, command: Arc<Command>, filepath: Option<PathBuf>) -> Result<()> {
        let claimed = self.claimed_aliases(&command);
        for alias in &claimed {
            if let Some(owner) = self.aliases.get(alias) {
                if *owner != command.id {
                    return Err(Error::alias_conflict(alias, &command.id, owner));
                }
            }
        }

        self.modules.register(Arc::clone(&command), filepath)?;
        for alias in claimed {
            self.aliases.insert(alias, command.id.clone());
        }
        if let Some(prefix) = &command.prefix {
            self.prefixes.add(&command.id, prefix);
        }
        debug!(command = %command.id, aliases = ?command.aliases, "registered command");
        Ok(())
    }

    /// Removes a command, its aliases and its prefix. Returns `None` if the
    /// id is unknown.
    pub fn deregister(&mut self, id: &str) -> Option<Arc<Command>> {
        let command = self.modules.deregister(id)?;
        self.aliases.retain(|_, owner| owner != id);
        if let Some(prefix) = &command.prefix {
            self.prefixes.remove(id, prefix);
        }
        Some(command)
    }

    /// Removes a command.
    ///
    /// # Errors
    ///
    /// Fails if the id is unknown.
    pub fn remove(&mut self, id: &str) -> Result<Arc<Command>> {
        self.deregister(id).ok_or_else(|| Error::module_not_found(id))
    }

    /// Removes every command.
    pub fn remove_all(&mut self) -> Vec<Arc<Command>> {
        let ids: Vec<String> = self.modules.iter().map(|c| c.id.clone()).collect();
        ids.iter().filter_map(|id| self.deregister(id)).collect()
    }

    /// Replaces a command with a fresh instance. The old command stays
    /// registered when the fresh one cannot be.
    ///
    /// # Errors
    ///
    /// Fails if the id is unknown, the reloader fails, or the fresh command
    /// conflicts with another.
    pub fn reload(&mut self, id: &str, reloader: &Reloader<'_, Command>) -> Result<Arc<Command>> {
        let current = self
            .modules
            .get(id)
            .cloned()
            .ok_or_else(|| Error::module_not_found(id))?;
        let filepath = self.modules.filepath_of(id).map(PathBuf::from);

        let fresh = reloader(&current, filepath.as_deref())?;
        self.deregister(id);
        if let Err(err) = self.register(Arc::clone(&fresh), filepath.clone()) {
            self.register(current, filepath)?;
            return Err(err);
        }
        Ok(fresh)
    }

    /// Reloads every command, in id order.
    ///
    /// # Errors
    ///
    /// Stops at the first failing reload.
    pub fn reload_all(&mut self, reloader: &Reloader<'_, Command>) -> Result<Vec<Arc<Command>>> {
        let mut ids: Vec<String> = self.modules.iter().map(|c| c.id.clone()).collect();
        ids.sort();
        ids.iter().map(|id| self.reload(id, reloader)).collect()
    }

    /// Finds a command by alias, ignoring case.
    #[must_use]
    pub fn find_command(&self, alias: &str) -> Option<Arc<Command>> {
        let id = self.aliases.get(&alias.to_lowercase())?;
        self.modules.get(id).cloned()
    }

    /// Gets a command by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<Command>> {
        self.modules.get(id).cloned()
    }

    /// Finds a category by id, ignoring case.
    #[must_use]
    pub fn find_category(&self, name: &str) -> Option<&Category<Command>> {
        self.modules.find_category(name)
    }

    /// All commands, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Command>> {
        self.modules.iter()
    }

    /// Declared prefixes.
    #[must_use]
    pub const fn prefixes(&self) -> &PrefixRegistry {
        &self.prefixes
    }

    /// Number of registered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns true if no commands are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
