//! Declared argument specifications.
//!
//! A command declares its arguments as a list of [`ArgumentSpec`]s. Each spec
//! names how it picks text out of a [`ParseResult`](crate::ParseResult) via
//! its [`MatchKind`], and which resolver type turns that text into a value.

use herald_foundation::ArgValue;

/// How an argument selects its text from the parsed content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MatchKind {
    /// The next phrase (or the phrase at `index`).
    #[default]
    Phrase,
    /// Presence of one of the spec's flag words.
    Flag,
    /// The value of one of the spec's option flag words.
    Option,
    /// Raw text of the remaining phrases.
    Rest,
    /// Each remaining phrase resolved separately.
    Separate,
    /// All phrases joined, flags excluded.
    Text,
    /// The whole content, flags included.
    Content,
    /// Raw text of everything remaining, flags included.
    RestContent,
    /// Matches nothing; the resolver receives empty text.
    None,
}

impl MatchKind {
    /// Returns true if this kind reads flag words from the spec.
    #[must_use]
    pub const fn uses_flags(self) -> bool {
        matches!(self, Self::Flag | Self::Option)
    }
}

/// A single declared argument.
#[derive(Clone, Debug, PartialEq)]
pub struct ArgumentSpec {
    /// Key the resolved value is bound under.
    pub id: String,
    /// How text is selected.
    pub kind: MatchKind,
    /// Name of the type the resolver should coerce to.
    pub type_name: String,
    /// Flag words (alternate spellings) for flag and option kinds.
    pub flags: Vec<String>,
    /// Fixed phrase index, instead of the running cursor.
    pub index: Option<usize>,
    /// Maximum phrases consumed by rest-like kinds.
    pub limit: usize,
    /// Value used when resolution fails or nothing was supplied.
    pub default: Option<ArgValue>,
    /// For option kinds, collect every occurrence instead of the first.
    pub multiple_flags: bool,
}

impl ArgumentSpec {
    /// Creates a phrase argument with the `string` type.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: MatchKind::Phrase,
            type_name: "string".to_string(),
            flags: Vec::new(),
            index: None,
            limit: usize::MAX,
            default: None,
            multiple_flags: false,
        }
    }

    /// Creates a flag argument.
    #[must_use]
    pub fn flag<I, S>(id: impl Into<String>, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(id).with_kind(MatchKind::Flag).with_flags(flags)
    }

    /// Creates an option argument.
    #[must_use]
    pub fn option<I, S>(id: impl Into<String>, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(id).with_kind(MatchKind::Option).with_flags(flags)
    }

    /// Sets the match kind.
    #[must_use]
    pub fn with_kind(mut self, kind: MatchKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the resolver type name.
    #[must_use]
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    /// Sets the flag words.
    #[must_use]
    pub fn with_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags = flags.into_iter().map(Into::into).collect();
        self
    }

    /// Pins the argument to a phrase index.
    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Limits how many phrases rest-like kinds consume.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<ArgValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Collects every occurrence of an option flag.
    #[must_use]
    pub fn with_multiple_flags(mut self, multiple: bool) -> Self {
        self.multiple_flags = multiple;
        self
    }
}
