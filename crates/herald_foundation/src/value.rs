//! Argument values produced by argument resolution.

use std::collections::BTreeMap;
use std::fmt;

use crate::id::{ChannelId, RoleId, UserId};

/// A resolved argument value.
///
/// Text commands and interaction commands both resolve into this shape, so a
/// command body never needs to know which surface invoked it.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArgValue {
    /// Absence of a value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// String value.
    String(String),
    /// A user reference.
    User(UserId),
    /// A channel reference.
    Channel(ChannelId),
    /// A role reference.
    Role(RoleId),
    /// An unresolved mentionable snowflake (user or role).
    Mentionable(u64),
    /// Ordered list of values.
    List(Vec<ArgValue>),
    /// String-keyed map of values.
    Map(BTreeMap<String, ArgValue>),
}

impl ArgValue {
    /// Returns true if this value is null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Attempts to extract a boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to extract an integer value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a float value.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Attempts to extract a string slice.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[ArgValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns a human-readable name for this value's variant.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::User(_) => "user",
            Self::Channel(_) => "channel",
            Self::Role(_) => "role",
            Self::Mentionable(_) => "mentionable",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::User(id) => write!(f, "<@{id}>"),
            Self::Channel(id) => write!(f, "<#{id}>"),
            Self::Role(id) => write!(f, "<@&{id}>"),
            Self::Mentionable(id) => write!(f, "{id}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for ArgValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ArgValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for ArgValue {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<f64> for ArgValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<T: Into<ArgValue>> From<Vec<T>> for ArgValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// The resolved arguments handed to a command body, keyed by argument id.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Args {
    values: BTreeMap<String, ArgValue>,
}

impl Args {
    /// Creates an empty argument set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a value to an argument id, replacing any previous binding.
    pub fn insert(&mut self, id: impl Into<String>, value: impl Into<ArgValue>) {
        self.values.insert(id.into(), value.into());
    }

    /// Builder form of [`Args::insert`].
    #[must_use]
    pub fn with(mut self, id: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.insert(id, value);
        self
    }

    /// Gets the value bound to an argument id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ArgValue> {
        self.values.get(id)
    }

    /// Gets a string argument.
    #[must_use]
    pub fn get_str(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(ArgValue::as_str)
    }

    /// Gets a boolean argument.
    #[must_use]
    pub fn get_bool(&self, id: &str) -> Option<bool> {
        self.get(id).and_then(ArgValue::as_bool)
    }

    /// Gets an integer argument.
    #[must_use]
    pub fn get_int(&self, id: &str) -> Option<i64> {
        self.get(id).and_then(ArgValue::as_int)
    }

    /// Returns true if the argument id is bound.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    /// Number of bound arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no arguments are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over bindings in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<Args> for ArgValue {
    fn from(args: Args) -> Self {
        Self::Map(args.values)
    }
}

impl FromIterator<(String, ArgValue)> for Args {
    fn from_iter<I: IntoIterator<Item = (String, ArgValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
