//! Argument runners.
//!
//! The dispatcher hands a runner the parsed content and a generator; the
//! runner answers each [`Step::Ask`] by selecting text according to the
//! spec's [`MatchKind`] and resolving it through a [`TypeResolver`].

use async_trait::async_trait;
use herald_content::{ArgumentSpec, MatchKind, ParseResult, StringData};
use herald_foundation::{ArgValue, Args, Message, Result};
use tracing::trace;

use crate::flag::Flag;
use crate::generator::{ArgumentGenerator, Step};

/// Outcome of running a generator.
#[derive(Clone, Debug, PartialEq)]
pub enum Flow {
    /// All arguments resolved.
    Args(Args),
    /// A control flag stopped resolution.
    Flag(Flag),
}

/// Drives an argument generator to completion.
#[async_trait]
pub trait ArgumentRunner: Send + Sync {
    /// Runs `generator` against the parsed content of `message`.
    ///
    /// # Errors
    ///
    /// Propagates resolver errors.
    async fn run(
        &self,
        message: &Message,
        parsed: &ParseResult,
        generator: Box<dyn ArgumentGenerator>,
    ) -> Result<Flow>;
}

/// Result of resolving one piece of text.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    /// A value. [`ArgValue::Null`] counts as a failed resolution.
    Value(ArgValue),
    /// A control flag.
    Flag(Flag),
}

/// Turns selected text into a typed value.
#[async_trait]
pub trait TypeResolver: Send + Sync {
    /// Resolves `phrase` for `spec`.
    ///
    /// # Errors
    ///
    /// Errors abort dispatch and are routed like command errors.
    async fn resolve(
        &self,
        message: &Message,
        spec: &ArgumentSpec,
        phrase: &str,
    ) -> Result<Resolution>;
}

/// Resolves every phrase to a string; empty text fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct PhraseResolver;

#[async_trait]
impl TypeResolver for PhraseResolver {
    async fn resolve(&self, _: &Message, _: &ArgumentSpec, phrase: &str) -> Result<Resolution> {
        Ok(Resolution::Value(if phrase.is_empty() {
            ArgValue::Null
        } else {
            ArgValue::from(phrase)
        }))
    }
}

/// Cursor state while running one generator.
#[derive(Debug, Default)]
struct RunState {
    /// Next phrase in `phrases`.
    phrase_index: usize,
    /// Next phrase position in `all`.
    index: usize,
}

impl RunState {
    fn advance(&mut self, parsed: &ParseResult) {
        self.phrase_index += 1;
        self.index += 1;
        while parsed.all.get(self.index).is_some_and(|d| !d.is_phrase()) {
            self.index += 1;
        }
    }
}

/// Answers specs in the order the generator asks for them.
#[derive(Clone, Debug, Default)]
pub struct SequentialRunner<R> {
    resolver: R,
}

impl<R: TypeResolver> SequentialRunner<R> {
    /// Creates a runner over `resolver`.
    #[must_use]
    pub const fn new(resolver: R) -> Self {
        Self { resolver }
    }

    /// Resolves text and applies the spec default on failure.
    async fn process(
        &self,
        message: &Message,
        spec: &ArgumentSpec,
        phrase: &str,
    ) -> Result<Resolution> {
        let resolution = self.resolver.resolve(message, spec, phrase).await?;
        let failed = matches!(
            resolution,
            Resolution::Value(ArgValue::Null) | Resolution::Flag(Flag::Fail { .. })
        );
        match (&spec.default, failed) {
            (Some(default), true) => Ok(Resolution::Value(default.clone())),
            _ => Ok(resolution),
        }
    }

    async fn run_one(
        &self,
        message: &Message,
        parsed: &ParseResult,
        state: &mut RunState,
        spec: &ArgumentSpec,
    ) -> Result<Resolution> {
        match spec.kind {
            MatchKind::Phrase => {
                let index = spec.index.unwrap_or(state.phrase_index);
                let text = parsed
                    .phrases
                    .get(index)
                    .and_then(StringData::value)
                    .unwrap_or_default();
                let resolution = self.process(message, spec, text).await?;
                if spec.index.is_none() {
                    state.advance(parsed);
                }
                Ok(resolution)
            }
            MatchKind::Rest => {
                let index = spec.index.unwrap_or(state.phrase_index);
                let text = join_raw(window(&parsed.phrases, index, spec.limit));
                let resolution = self.process(message, spec, &text).await?;
                if spec.index.is_none() {
                    state.advance(parsed);
                }
                Ok(resolution)
            }
            MatchKind::Separate => self.run_separate(message, parsed, state, spec).await,
            MatchKind::Flag => Ok(Resolution::Value(run_flag(parsed, spec))),
            MatchKind::Option => self.run_option(message, parsed, spec).await,
            MatchKind::Text => {
                let text = join_raw(window(&parsed.phrases, spec.index.unwrap_or(0), spec.limit));
                self.process(message, spec, &text).await
            }
            MatchKind::Content => {
                let text = join_raw(window(&parsed.all, spec.index.unwrap_or(0), spec.limit));
                self.process(message, spec, &text).await
            }
            MatchKind::RestContent => {
                let index = spec.index.unwrap_or(state.index);
                let text = join_raw(window(&parsed.all, index, spec.limit));
                let resolution = self.process(message, spec, &text).await?;
                if spec.index.is_none() {
                    state.advance(parsed);
                }
                Ok(resolution)
            }
            MatchKind::None => self.process(message, spec, "").await,
        }
    }

    async fn run_separate(
        &self,
        message: &Message,
        parsed: &ParseResult,
        state: &mut RunState,
        spec: &ArgumentSpec,
    ) -> Result<Resolution> {
        let index = spec.index.unwrap_or(state.phrase_index);
        let phrases = window(&parsed.phrases, index, spec.limit);

        if phrases.is_empty() {
            let resolution = self.process(message, spec, "").await?;
            if spec.index.is_none() {
                state.advance(parsed);
            }
            return Ok(resolution);
        }

        let mut values = Vec::with_capacity(phrases.len());
        for phrase in phrases {
            match self
                .process(message, spec, phrase.value().unwrap_or_default())
                .await?
            {
                Resolution::Flag(flag) if short_circuits(&flag) => {
                    return Ok(Resolution::Flag(flag));
                }
                Resolution::Flag(_) => values.push(ArgValue::Null),
                Resolution::Value(value) => values.push(value),
            }
            if spec.index.is_none() {
                state.advance(parsed);
            }
        }
        Ok(Resolution::Value(ArgValue::List(values)))
    }

    async fn run_option(
        &self,
        message: &Message,
        parsed: &ParseResult,
        spec: &ArgumentSpec,
    ) -> Result<Resolution> {
        let mut matching = parsed
            .option_flags
            .iter()
            .filter(|data| data.key().is_some_and(|key| matches_flag(spec, key)));

        if !spec.multiple_flags {
            let text = matching
                .next()
                .and_then(StringData::value)
                .unwrap_or_default();
            return self.process(message, spec, text).await;
        }

        let mut values = Vec::new();
        for data in matching.take(spec.limit) {
            match self
                .process(message, spec, data.value().unwrap_or_default())
                .await?
            {
                Resolution::Flag(flag) if short_circuits(&flag) => {
                    return Ok(Resolution::Flag(flag));
                }
                Resolution::Flag(_) => values.push(ArgValue::Null),
                Resolution::Value(value) => values.push(value),
            }
        }
        Ok(Resolution::Value(ArgValue::List(values)))
    }
}

#[async_trait]
impl<R: TypeResolver> ArgumentRunner for SequentialRunner<R> {
    async fn run(
        &self,
        message: &Message,
        parsed: &ParseResult,
        mut generator: Box<dyn ArgumentGenerator>,
    ) -> Result<Flow> {
        let mut state = RunState::default();
        let mut previous = None;

        loop {
            match generator.next(previous.take()) {
                Step::Done(args) => return Ok(Flow::Args(args)),
                Step::Control(flag) => return Ok(Flow::Flag(augment_rest(flag, parsed, &state))),
                Step::Ask(spec) => {
                    trace!(argument = %spec.id, kind = ?spec.kind, "resolving argument");
                    match self.run_one(message, parsed, &mut state, &spec).await? {
                        Resolution::Value(value) => previous = Some(value),
                        Resolution::Flag(flag) => {
                            return Ok(Flow::Flag(augment_rest(flag, parsed, &state)));
                        }
                    }
                }
            }
        }
    }
}

/// Fills in an unset continue rest with the content not yet consumed.
fn augment_rest(flag: Flag, parsed: &ParseResult, state: &RunState) -> Flag {
    match flag {
        Flag::Continue {
            command,
            ignore,
            rest: None,
        } => Flag::Continue {
            command,
            ignore,
            rest: Some(parsed.rest_from(state.index)),
        },
        other => other,
    }
}

/// Flags that stop a multi-value match early. Fail only marks one value.
fn short_circuits(flag: &Flag) -> bool {
    !matches!(flag, Flag::Fail { .. })
}

fn matches_flag(spec: &ArgumentSpec, key: &str) -> bool {
    spec.flags.iter().any(|name| name.to_lowercase() == key.to_lowercase())
}

fn run_flag(parsed: &ParseResult, spec: &ArgumentSpec) -> ArgValue {
    let mut matching = parsed
        .flags
        .iter()
        .filter(|data| data.key().is_some_and(|key| matches_flag(spec, key)));

    if spec.multiple_flags {
        let count = i64::try_from(matching.count()).unwrap_or(i64::MAX);
        return ArgValue::Int(count);
    }

    let found = matching.next().is_some();
    ArgValue::Bool(if spec.default.is_some() { !found } else { found })
}

fn window(items: &[StringData], start: usize, limit: usize) -> &[StringData] {
    let start = start.min(items.len());
    let end = start.saturating_add(limit).min(items.len());
    &items[start..end]
}

fn join_raw(items: &[StringData]) -> String {
    let joined: String = items.iter().map(StringData::raw).collect();
    joined.trim().to_string()
}
