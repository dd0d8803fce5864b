//! Prefix sources, the prefix override registry and prefix matching.
//!
//! A prefix is either literal text, a list of alternatives, or a supplier
//! evaluated per message. The handler has one default source; commands may
//! declare their own, which are then the only prefixes that reach them.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use herald_foundation::Message;

use crate::command::Command;

/// Computes prefixes for one message.
pub type PrefixFn = dyn Fn(&Message) -> Vec<String> + Send + Sync;

/// Where prefixes come from.
#[derive(Clone)]
pub enum PrefixSource {
    /// A single prefix.
    Literal(String),
    /// Several alternative prefixes.
    List(Vec<String>),
    /// Prefixes computed per message.
    Supplier(Arc<PrefixFn>),
}

impl PrefixSource {
    /// Creates a supplier source.
    pub fn supplier<F>(f: F) -> Self
    where
        F: Fn(&Message) -> Vec<String> + Send + Sync + 'static,
    {
        Self::Supplier(Arc::new(f))
    }

    /// Evaluates the source for `message`.
    #[must_use]
    pub fn resolve(&self, message: &Message) -> Vec<String> {
        match self {
            Self::Literal(prefix) => vec![prefix.clone()],
            Self::List(prefixes) => prefixes.clone(),
            Self::Supplier(f) => f(message),
        }
    }
}

impl fmt::Debug for PrefixSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(p) => f.debug_tuple("Literal").field(p).finish(),
            Self::List(ps) => f.debug_tuple("List").field(ps).finish(),
            Self::Supplier(_) => f.write_str("Supplier(..)"),
        }
    }
}

impl Default for PrefixSource {
    fn default() -> Self {
        Self::Literal("!".to_string())
    }
}

impl From<&str> for PrefixSource {
    fn from(prefix: &str) -> Self {
        Self::Literal(prefix.to_string())
    }
}

impl From<String> for PrefixSource {
    fn from(prefix: String) -> Self {
        Self::Literal(prefix)
    }
}

impl From<Vec<String>> for PrefixSource {
    fn from(prefixes: Vec<String>) -> Self {
        Self::List(prefixes)
    }
}

impl From<Vec<&str>> for PrefixSource {
    fn from(prefixes: Vec<&str>) -> Self {
        Self::List(prefixes.into_iter().map(String::from).collect())
    }
}

/// Orders prefixes so the most specific is tried first: longer before
/// shorter, then lexicographic, with the empty prefix last.
#[must_use]
pub fn compare_prefixes(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.len().cmp(&a.len()).then_with(|| a.cmp(b)),
    }
}

// =============================================================================
// Override registry
// =============================================================================

#[derive(Clone)]
enum PrefixKey {
    Literal(String),
    Supplier(Arc<PrefixFn>),
}

impl PrefixKey {
    fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Supplier(a), Self::Supplier(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Literals by specificity; suppliers cannot be compared and go last.
    fn order(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => compare_prefixes(a, b),
            (Self::Supplier(_), Self::Supplier(_)) => Ordering::Equal,
            (Self::Literal(a), Self::Supplier(_)) if a.is_empty() => Ordering::Greater,
            (Self::Literal(_), Self::Supplier(_)) => Ordering::Less,
            (Self::Supplier(_), Self::Literal(b)) if b.is_empty() => Ordering::Less,
            (Self::Supplier(_), Self::Literal(_)) => Ordering::Greater,
        }
    }
}

struct PrefixEntry {
    key: PrefixKey,
    commands: BTreeSet<String>,
}

/// Command-declared prefixes and the commands that declared each one.
#[derive(Default)]
pub struct PrefixRegistry {
    entries: Vec<PrefixEntry>,
}

impl PrefixRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn keys(source: &PrefixSource) -> Vec<PrefixKey> {
        match source {
            PrefixSource::Literal(p) => vec![PrefixKey::Literal(p.clone())],
            PrefixSource::List(ps) => ps.iter().cloned().map(PrefixKey::Literal).collect(),
            PrefixSource::Supplier(f) => vec![PrefixKey::Supplier(Arc::clone(f))],
        }
    }

    /// Records that `command` answers to `source`.
    pub fn add(&mut self, command: &str, source: &PrefixSource) {
        for key in Self::keys(source) {
            match self.entries.iter_mut().find(|e| e.key.same(&key)) {
                Some(entry) => {
                    entry.commands.insert(command.to_string());
                }
                None => self.entries.push(PrefixEntry {
                    key,
                    commands: BTreeSet::from([command.to_string()]),
                }),
            }
        }
        self.entries.sort_by(|a, b| a.key.order(&b.key));
    }

    /// Forgets `command` under `source`, dropping prefixes nobody declares.
    pub fn remove(&mut self, command: &str, source: &PrefixSource) {
        for key in Self::keys(source) {
            if let Some(entry) = self.entries.iter_mut().find(|e| e.key.same(&key)) {
                entry.commands.remove(command);
            }
        }
        self.entries.retain(|e| !e.commands.is_empty());
    }

    /// Returns true if no command declares a prefix.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct prefix keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Evaluates every key for `message`, giving each concrete prefix with
    /// the commands that declared it, most specific first.
    #[must_use]
    pub fn resolve(&self, message: &Message) -> Vec<(String, BTreeSet<String>)> {
        let mut pairs: Vec<(String, BTreeSet<String>)> = self
            .entries
            .iter()
            .flat_map(|entry| {
                let prefixes = match &entry.key {
                    PrefixKey::Literal(p) => vec![p.clone()],
                    PrefixKey::Supplier(f) => f(message),
                };
                prefixes
                    .into_iter()
                    .map(move |p| (p, entry.commands.clone()))
            })
            .collect();
        pairs.sort_by(|(a, _), (b, _)| compare_prefixes(a, b));
        pairs
    }
}

impl fmt::Debug for PrefixRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for entry in &self.entries {
            match &entry.key {
                PrefixKey::Literal(p) => list.entry(&(p, &entry.commands)),
                PrefixKey::Supplier(_) => list.entry(&("<supplier>", &entry.commands)),
            };
        }
        list.finish()
    }
}

// =============================================================================
// Matching
// =============================================================================

/// The result of matching a message against prefixes.
#[derive(Clone, Default)]
pub struct ParsedCommand {
    /// The command, if one was identified.
    pub command: Option<Arc<Command>>,
    /// The prefix that matched.
    pub prefix: Option<String>,
    /// The alias as written.
    pub alias: Option<String>,
    /// Content after the alias, trimmed.
    pub content: String,
    /// Content after the prefix, trimmed.
    pub after_prefix: String,
}

impl ParsedCommand {
    /// Returns true if a command was identified.
    #[must_use]
    pub const fn has_command(&self) -> bool {
        self.command.is_some()
    }

    /// Returns true if at least a prefix matched.
    #[must_use]
    pub const fn has_prefix(&self) -> bool {
        self.prefix.is_some()
    }
}

impl fmt::Debug for ParsedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedCommand")
            .field("command", &self.command.as_ref().map(|c| c.id.as_str()))
            .field("prefix", &self.prefix)
            .field("alias", &self.alias)
            .field("content", &self.content)
            .field("after_prefix", &self.after_prefix)
            .finish()
    }
}

/// Strips `prefix` from the start of `content`, comparing case-insensitively.
#[must_use]
pub fn strip_prefix_ignore_case<'a>(content: &'a str, prefix: &str) -> Option<&'a str> {
    let mut chars = content.char_indices();
    for expected in prefix.chars() {
        let (_, actual) = chars.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }
    let end = chars.next().map_or(content.len(), |(i, _)| i);
    Some(&content[end..])
}

/// Matches one prefix.
///
/// `associated` is `None` on the default pass, where commands with their own
/// prefix are unreachable. On the override pass only the listed commands
/// are reachable.
pub fn parse_with_prefix<F>(
    content: &str,
    prefix: &str,
    associated: Option<&BTreeSet<String>>,
    find_command: F,
) -> ParsedCommand
where
    F: Fn(&str) -> Option<Arc<Command>>,
{
    let Some(after) = strip_prefix_ignore_case(content, prefix) else {
        return ParsedCommand::default();
    };

    let body = after.trim_start();
    let alias = body.split_whitespace().next().unwrap_or_default();
    let rest = body[alias.len()..].trim();

    let mut parsed = ParsedCommand {
        command: None,
        prefix: Some(prefix.to_string()),
        alias: Some(alias.to_string()),
        content: rest.to_string(),
        after_prefix: after.trim().to_string(),
    };

    let Some(command) = find_command(alias) else {
        return parsed;
    };

    let reachable = match associated {
        None => command.prefix.is_none(),
        Some(ids) => ids.contains(&command.id),
    };
    if reachable {
        parsed.command = Some(command);
    }
    parsed
}

/// Matches every `(prefix, associated)` pair in order and keeps the first
/// that identified a command, else the first that matched a prefix.
pub fn parse_multiple_prefixes<F>(
    content: &str,
    pairs: &[(String, Option<BTreeSet<String>>)],
    find_command: F,
) -> ParsedCommand
where
    F: Fn(&str) -> Option<Arc<Command>>,
{
    let mut guess: Option<ParsedCommand> = None;
    for (prefix, associated) in pairs {
        let parsed = parse_with_prefix(content, prefix, associated.as_ref(), &find_command);
        if parsed.has_command() {
            return parsed;
        }
        if guess.is_none() && parsed.has_prefix() {
            guess = Some(parsed);
        }
    }
    guess.unwrap_or_default()
}
