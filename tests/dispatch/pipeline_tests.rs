//! Prefix resolution, argument flow, fallbacks and edits.

use async_trait::async_trait;
use herald_content::{ArgumentSpec, MatchKind};
use herald_dispatch::{
    Command, CommandContext, CommandExecutor, Dispatch, HandlerConfig, HandlerEvent, PrefixSource,
};
use herald_foundation::{ArgValue, ErrorKind, Message, Result};
use regex::Regex;

use crate::support::{drain, handler, message, names, started};

fn ping() -> Command {
    Command::from_fn("ping", |_| async { Ok(ArgValue::from("pong")) }).with_aliases(["ping"])
}

fn echo() -> Command {
    Command::from_fn("echo", |ctx: CommandContext| async move {
        Ok(ctx.args.get("text").cloned().unwrap_or(ArgValue::Null))
    })
    .with_aliases(["echo", "say"])
    .with_args(vec![
        ArgumentSpec::new("text").with_kind(MatchKind::Rest),
        ArgumentSpec::flag("loud", ["--loud"]),
    ])
}

fn finished_output(events: &[HandlerEvent]) -> Option<ArgValue> {
    events.iter().find_map(|event| match event {
        HandlerEvent::CommandFinished { output, .. } => Some(output.clone()),
        _ => None,
    })
}

// =============================================================================
// Prefixes
// =============================================================================

#[tokio::test]
async fn ping_runs_and_reports() {
    let (_, handler) = handler(HandlerConfig::default());
    handler.register(ping()).unwrap();
    let mut rx = handler.subscribe();

    let outcome = handler.handle(message(1, "!ping")).await.unwrap();

    assert_eq!(outcome, Dispatch::Ran);
    let events = drain(&mut rx);
    assert_eq!(names(&events), vec!["commandStarted", "commandFinished"]);
    assert_eq!(finished_output(&events), Some(ArgValue::from("pong")));
}

#[tokio::test]
async fn aliases_ignore_case() {
    let (_, handler) = handler(HandlerConfig::default());
    handler.register(ping()).unwrap();

    assert!(handler.handle(message(1, "!PING")).await.unwrap().ran());
    assert!(handler.handle(message(2, "!  ping")).await.unwrap().ran());
}

#[tokio::test]
async fn most_specific_prefix_wins() {
    let (_, handler) = handler(HandlerConfig::prefixed(vec!["!", "!!"]));
    handler.register(ping()).unwrap();
    handler
        .register(Command::from_fn("bang", |_| async { Ok(ArgValue::Null) }).with_aliases(["!ping"]))
        .unwrap();
    let mut rx = handler.subscribe();

    handler.handle(message(1, "!!ping")).await.unwrap();
    handler.handle(message(2, "!ping")).await.unwrap();

    assert_eq!(started(&drain(&mut rx)), vec!["ping", "ping"]);
}

#[tokio::test]
async fn supplier_prefix_follows_the_message() {
    let config = HandlerConfig::default().with_prefix(PrefixSource::supplier(|message: &Message| {
        if message.in_guild_channel() {
            vec!["?".to_string()]
        } else {
            vec!["!".to_string()]
        }
    }));
    let (_, handler) = handler(config);
    handler.register(ping()).unwrap();

    assert!(handler.handle(message(1, "?ping")).await.unwrap().ran());
    assert!(!handler.handle(message(2, "!ping")).await.unwrap().ran());
}

#[tokio::test]
async fn mention_is_a_prefix() {
    let (_, handler) = handler(HandlerConfig::default());
    handler.register(ping()).unwrap();

    assert!(handler.handle(message(1, "<@1> ping")).await.unwrap().ran());
    assert!(handler.handle(message(2, "<@!1>ping")).await.unwrap().ran());
}

#[tokio::test]
async fn mention_prefix_can_be_disabled() {
    let (_, handler) = handler(HandlerConfig::minimal());
    handler.register(ping()).unwrap();

    assert!(!handler.handle(message(1, "<@1> ping")).await.unwrap().ran());
}

#[tokio::test]
async fn unknown_alias_is_invalid() {
    let (_, handler) = handler(HandlerConfig::default());
    handler.register(ping()).unwrap();
    let mut rx = handler.subscribe();

    assert_eq!(handler.handle(message(1, "!pong")).await.unwrap(), Dispatch::NotRan);
    assert_eq!(handler.handle(message(2, "ping")).await.unwrap(), Dispatch::NotRan);

    assert_eq!(names(&drain(&mut rx)), vec!["messageInvalid", "messageInvalid"]);
}

#[tokio::test]
async fn own_prefix_replaces_default_prefix() {
    let (_, handler) = handler(HandlerConfig::default());
    handler
        .register(
            Command::from_fn("tag", |_| async { Ok(ArgValue::Null) })
                .with_aliases(["tag"])
                .with_prefix("?"),
        )
        .unwrap();
    handler.register(ping()).unwrap();

    assert!(!handler.handle(message(1, "!tag")).await.unwrap().ran());
    assert!(handler.handle(message(2, "?tag")).await.unwrap().ran());
    assert!(handler.handle(message(3, "?TAG")).await.unwrap().ran());
    assert!(!handler.handle(message(4, "?ping")).await.unwrap().ran());
}

#[tokio::test]
async fn parse_command_reports_prefix_and_alias() {
    let (_, handler) = handler(HandlerConfig::default());
    handler.register(echo()).unwrap();

    let parsed = handler.parse_command(&message(1, "!say  hello   there "));

    assert!(parsed.has_command());
    assert_eq!(parsed.prefix.as_deref(), Some("!"));
    assert_eq!(parsed.alias.as_deref(), Some("say"));
    assert_eq!(parsed.content, "hello   there");
    assert_eq!(parsed.after_prefix, "say  hello   there");
}

// =============================================================================
// Arguments
// =============================================================================

#[tokio::test]
async fn arguments_reach_the_command() {
    let (_, handler) = handler(HandlerConfig::default());
    handler.register(echo()).unwrap();
    let mut rx = handler.subscribe();

    handler.handle(message(1, "!echo hello  world --loud")).await.unwrap();

    let events = drain(&mut rx);
    assert_eq!(finished_output(&events), Some(ArgValue::from("hello  world")));
    let args = events
        .iter()
        .find_map(|event| match event {
            HandlerEvent::CommandStarted { args, .. } => Some(args.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(args.get_bool("loud"), Some(true));
}

#[tokio::test]
async fn missing_arguments_use_defaults() {
    let (_, handler) = handler(HandlerConfig::default());
    handler
        .register(
            Command::from_fn("greet", |ctx: CommandContext| async move {
                Ok(ctx.args.get("name").cloned().unwrap_or(ArgValue::Null))
            })
            .with_aliases(["greet"])
            .with_args(vec![ArgumentSpec::new("name").with_default("stranger")]),
        )
        .unwrap();
    let mut rx = handler.subscribe();

    handler.handle(message(1, "!greet")).await.unwrap();
    handler.handle(message(2, "!greet \"Ada Lovelace\"")).await.unwrap();

    let outputs: Vec<ArgValue> = drain(&mut rx)
        .into_iter()
        .filter_map(|event| match event {
            HandlerEvent::CommandFinished { output, .. } => Some(output),
            _ => None,
        })
        .collect();
    assert_eq!(outputs, vec![ArgValue::from("stranger"), ArgValue::from("Ada Lovelace")]);
}

// =============================================================================
// Regex and conditional commands
// =============================================================================

struct Dice;

#[async_trait]
impl CommandExecutor for Dice {
    async fn exec(&self, ctx: CommandContext) -> Result<ArgValue> {
        Ok(ctx.args.get("match").cloned().unwrap_or(ArgValue::Null))
    }

    fn regex(&self, _message: &Message) -> Option<Regex> {
        Regex::new(r"(\d+)d(\d+)").ok()
    }
}

struct Greeter;

#[async_trait]
impl CommandExecutor for Greeter {
    async fn exec(&self, _ctx: CommandContext) -> Result<ArgValue> {
        Ok(ArgValue::from("hi"))
    }

    fn condition(&self, message: &Message) -> bool {
        message.content.eq_ignore_ascii_case("hello bot")
    }
}

#[tokio::test]
async fn regex_command_runs_without_prefix() {
    let (_, handler) = handler(HandlerConfig::default());
    handler.register(Command::new("dice", Dice)).unwrap();
    let mut rx = handler.subscribe();

    let outcome = handler.handle(message(1, "roll 2d6 please")).await.unwrap();

    assert_eq!(outcome, Dispatch::Ran);
    let events = drain(&mut rx);
    let args = events
        .iter()
        .find_map(|event| match event {
            HandlerEvent::CommandStarted { args, .. } => Some(args.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(args.get_str("match"), Some("2d6"));
    assert_eq!(
        args.get("groups"),
        Some(&ArgValue::List(vec!["2".into(), "6".into()]))
    );
    assert!(!names(&events).contains(&"messageInvalid"));
}

#[tokio::test]
async fn conditional_command_runs_without_prefix() {
    let (_, handler) = handler(HandlerConfig::default());
    handler.register(Command::new("greeter", Greeter)).unwrap();
    let mut rx = handler.subscribe();

    assert!(handler.handle(message(1, "Hello Bot")).await.unwrap().ran());
    assert!(!handler.handle(message(2, "goodbye bot")).await.unwrap().ran());

    let events = drain(&mut rx);
    assert_eq!(started(&events), vec!["greeter"]);
    assert_eq!(names(&events).last(), Some(&"messageInvalid"));
}

// =============================================================================
// Edits
// =============================================================================

fn replying() -> Command {
    Command::from_fn("reply", |ctx: CommandContext| async move {
        let text = ctx.args.get_str("text").unwrap_or_default().to_string();
        ctx.reply(&text).await?;
        Ok(ArgValue::Null)
    })
    .with_aliases(["reply"])
    .with_args(vec![ArgumentSpec::new("text").with_kind(MatchKind::Rest)])
}

#[tokio::test]
async fn edited_message_edits_the_response() {
    let (client, handler) = handler(HandlerConfig::interactive());
    handler.register(replying()).unwrap();

    let original = message(1, "!reply first").with_created_at(1_000);
    handler.handle(original.clone()).await.unwrap();
    let edited = original.clone().with_content("!reply second").with_edited_at(2_000);
    let outcome = handler.handle_edit(&original, edited).await.unwrap();

    assert_eq!(outcome, Dispatch::Ran);
    assert_eq!(client.sent.lock().len(), 1);
    let edits = client.edits.lock();
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].1, "second");

    let util = handler.command_utils().get(original.id).unwrap();
    assert_eq!(util.parsed().unwrap().content, "second");
}

#[tokio::test]
async fn edits_are_ignored_unless_enabled() {
    let (client, handler) = handler(HandlerConfig::default());
    handler.register(replying()).unwrap();

    let original = message(1, "!reply first");
    handler.handle(original.clone()).await.unwrap();
    let edited = original.clone().with_content("!reply second").with_edited_at(5);

    assert_eq!(handler.handle_edit(&original, edited).await.unwrap(), Dispatch::NotRan);
    assert_eq!(client.sent.lock().len(), 1);
}

#[tokio::test]
async fn unchanged_edit_does_nothing() {
    let (_, handler) = handler(HandlerConfig::interactive());
    handler.register(replying()).unwrap();

    let original = message(1, "!reply same");
    let edited = original.clone().with_edited_at(5);

    assert_eq!(handler.handle_edit(&original, edited).await.unwrap(), Dispatch::NotRan);
}

#[tokio::test]
async fn non_editable_command_ignores_edits() {
    let (_, handler) = handler(HandlerConfig::interactive());
    handler.register(ping().with_editable(false)).unwrap();

    let original = message(1, "!pin");
    let edited = original.clone().with_content("!ping").with_edited_at(5);

    assert_eq!(handler.handle_edit(&original, edited).await.unwrap(), Dispatch::NotRan);
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn alias_conflict_is_rejected() {
    let (_, handler) = handler(HandlerConfig::default());
    handler.register(ping()).unwrap();
    let mut rx = handler.subscribe();

    let err = handler
        .register(Command::from_fn("pong", |_| async { Ok(ArgValue::Null) }).with_aliases(["pong", "Ping"]))
        .unwrap_err();

    assert!(matches!(err.kind, ErrorKind::AliasConflict { .. }));
    assert!(handler.command("pong").is_none());
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn registration_publishes_load_and_remove() {
    let (_, handler) = handler(HandlerConfig::default());
    let mut rx = handler.subscribe();

    handler.register(ping().with_category("Utility")).unwrap();
    handler.remove("ping").unwrap();

    assert_eq!(names(&drain(&mut rx)), vec!["load", "remove"]);
    assert!(handler.find_command("ping").is_none());
    assert!(handler.remove("ping").is_err());
}

#[tokio::test]
async fn categories_group_commands() {
    let (_, handler) = handler(HandlerConfig::default());
    handler.register(ping().with_category("Utility")).unwrap();
    handler.register(echo().with_category("Utility")).unwrap();

    let utility = handler.find_category("UTILITY").unwrap();
    assert_eq!(utility.len(), 2);
    assert!(handler.find_category("music").is_none());
}

#[tokio::test]
async fn reload_swaps_the_command() {
    let (_, handler) = handler(HandlerConfig::default());
    handler.register(ping()).unwrap();

    handler
        .reload("ping", &|_, _| Ok(std::sync::Arc::new(ping().with_aliases(["ping", "p"]))))
        .unwrap();

    assert!(handler.handle(message(1, "!p")).await.unwrap().ran());
}
