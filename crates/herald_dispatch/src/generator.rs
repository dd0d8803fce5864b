//! The argument generator protocol.
//!
//! A command describes its arguments either as a fixed list of specs or as
//! a generator that asks for one spec at a time and sees each resolved
//! value before deciding what to ask next. Either way the runner drives a
//! [`ArgumentGenerator`] until it yields [`Step::Done`] or a control flag.

use std::fmt;
use std::sync::Arc;

use herald_content::{ArgumentSpec, ParseResult};
use herald_foundation::{ArgValue, Args, Message};

use crate::flag::Flag;

/// One step of argument generation.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    /// Resolve this spec and feed the value back.
    Ask(ArgumentSpec),
    /// Generation is complete.
    Done(Args),
    /// Stop with a control flag.
    Control(Flag),
}

/// A resumable producer of argument specs.
pub trait ArgumentGenerator: Send {
    /// Advances the generator. `previous` is the value resolved for the
    /// last [`Step::Ask`], and `None` on the first call.
    fn next(&mut self, previous: Option<ArgValue>) -> Step;
}

/// Drives a fixed spec list, binding each value under its spec id.
#[derive(Clone, Debug, Default)]
pub struct SpecListGenerator {
    specs: Vec<ArgumentSpec>,
    position: usize,
    args: Args,
}

impl SpecListGenerator {
    /// Creates a generator over `specs`.
    #[must_use]
    pub fn new(specs: Vec<ArgumentSpec>) -> Self {
        Self {
            specs,
            position: 0,
            args: Args::new(),
        }
    }
}

impl ArgumentGenerator for SpecListGenerator {
    fn next(&mut self, previous: Option<ArgValue>) -> Step {
        if let (Some(value), Some(asked)) = (previous, self.position.checked_sub(1)) {
            if let Some(spec) = self.specs.get(asked) {
                self.args.insert(spec.id.clone(), value);
            }
        }

        match self.specs.get(self.position) {
            Some(spec) => {
                self.position += 1;
                Step::Ask(spec.clone())
            }
            None => Step::Done(std::mem::take(&mut self.args)),
        }
    }
}

/// Builds a generator for one invocation.
pub type GeneratorFactory =
    dyn Fn(&Message, &ParseResult) -> Box<dyn ArgumentGenerator> + Send + Sync;

/// Where a command's arguments come from.
#[derive(Clone, Default)]
pub enum ArgumentSource {
    /// The command takes no arguments.
    #[default]
    None,
    /// A fixed list of specs.
    Specs(Vec<ArgumentSpec>),
    /// A custom generator per invocation.
    Generator(Arc<GeneratorFactory>),
}

impl ArgumentSource {
    /// Creates a generator source.
    pub fn generator<F>(factory: F) -> Self
    where
        F: Fn(&Message, &ParseResult) -> Box<dyn ArgumentGenerator> + Send + Sync + 'static,
    {
        Self::Generator(Arc::new(factory))
    }

    /// Statically known specs. Generators declare none up front.
    #[must_use]
    pub fn specs(&self) -> &[ArgumentSpec] {
        match self {
            Self::Specs(specs) => specs,
            Self::None | Self::Generator(_) => &[],
        }
    }

    /// Builds the generator for one invocation.
    #[must_use]
    pub fn start(&self, message: &Message, parsed: &ParseResult) -> Box<dyn ArgumentGenerator> {
        match self {
            Self::None => Box::new(SpecListGenerator::default()),
            Self::Specs(specs) => Box::new(SpecListGenerator::new(specs.clone())),
            Self::Generator(factory) => factory(message, parsed),
        }
    }
}

impl fmt::Debug for ArgumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Specs(specs) => f.debug_tuple("Specs").field(specs).finish(),
            Self::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

impl From<Vec<ArgumentSpec>> for ArgumentSource {
    fn from(specs: Vec<ArgumentSpec>) -> Self {
        Self::Specs(specs)
    }
}
