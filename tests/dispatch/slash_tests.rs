//! Slash command dispatch.

use async_trait::async_trait;
use herald_dispatch::{
    BuiltInReason, Command, CommandContext, CommandExecutor, Dispatch, HandlerConfig, HandlerEvent,
    SlashContext,
};
use herald_foundation::{
    ArgValue, Author, Error, Interaction, InteractionId, InteractionOption, OptionValue, Result,
    UserId,
};

use crate::support::{CHANNEL, GUILD, OWNER, USER, drain, handler, message, names};

fn interaction(id: u64, name: &str) -> Interaction {
    Interaction::new(InteractionId::new(id), name, USER).in_guild(GUILD, CHANNEL)
}

fn ban() -> Command {
    Command::from_fn("ban", |ctx: CommandContext| async move {
        Ok(ctx.args.get("target").cloned().unwrap_or(ArgValue::Null))
    })
    .with_aliases(["ban"])
    .with_slash(true)
}

#[tokio::test]
async fn slash_command_receives_options() {
    let (_, handler) = handler(HandlerConfig::default());
    handler.register(ban()).unwrap();
    let mut rx = handler.subscribe();

    let invocation = interaction(1, "ban")
        .with_option(InteractionOption::new("target", OptionValue::User(UserId::new(42))))
        .with_option(InteractionOption::new("days", OptionValue::Integer(7)));

    assert_eq!(handler.handle_slash(invocation).await.unwrap(), Dispatch::Ran);

    let events = drain(&mut rx);
    assert_eq!(names(&events), vec!["slashStarted", "slashFinished"]);
    assert!(matches!(
        &events[0],
        HandlerEvent::SlashStarted { args, .. } if args.get_int("days") == Some(7)
    ));
    assert!(matches!(
        &events[1],
        HandlerEvent::SlashFinished { output: ArgValue::User(user), .. } if *user == UserId::new(42)
    ));
}

#[tokio::test]
async fn subcommands_are_flattened() {
    let (_, handler) = handler(HandlerConfig::default());
    handler
        .register(
            Command::from_fn("config", |ctx: CommandContext| async move {
                Ok(ctx.args.get("subcommand").cloned().unwrap_or(ArgValue::Null))
            })
            .with_aliases(["config"])
            .with_slash(true),
        )
        .unwrap();
    let mut rx = handler.subscribe();

    let invocation = interaction(1, "config").with_option(InteractionOption::new(
        "set",
        OptionValue::SubCommand(vec![InteractionOption::new(
            "value",
            OptionValue::String("on".into()),
        )]),
    ));
    handler.handle_slash(invocation).await.unwrap();

    let events = drain(&mut rx);
    assert!(matches!(
        &events[0],
        HandlerEvent::SlashStarted { args, .. } if args.get_str("value") == Some("on")
    ));
    assert!(matches!(
        &events[1],
        HandlerEvent::SlashFinished { output, .. } if *output == ArgValue::from("set")
    ));
}

#[tokio::test]
async fn only_slash_commands_are_reachable() {
    let (_, handler) = handler(HandlerConfig::default());
    handler.register(ban().with_slash(false)).unwrap();
    let mut rx = handler.subscribe();

    assert_eq!(handler.handle_slash(interaction(1, "ban")).await.unwrap(), Dispatch::NotRan);
    assert_eq!(handler.handle_slash(interaction(2, "kick")).await.unwrap(), Dispatch::NotRan);

    assert_eq!(names(&drain(&mut rx)), vec!["slashNotFound", "slashNotFound"]);
}

#[tokio::test]
async fn slash_commands_respect_post_checks() {
    let (_, handler) = handler(HandlerConfig::default());
    handler.register(ban().with_owner_only(true)).unwrap();
    let mut rx = handler.subscribe();

    assert_eq!(handler.handle_slash(interaction(1, "ban")).await.unwrap(), Dispatch::NotRan);
    assert!(matches!(
        &drain(&mut rx)[0],
        HandlerEvent::CommandBlocked { reason, .. } if *reason == BuiltInReason::Owner.into()
    ));

    let mut from_owner = interaction(2, "ban");
    from_owner.author = Author::user(OWNER);
    assert!(handler.handle_slash(from_owner).await.unwrap().ran());
}

#[tokio::test]
async fn open_prompts_do_not_block_slash_commands() {
    let (_, handler) = handler(HandlerConfig::default());
    handler.register(ban()).unwrap();

    handler.add_prompt(&message(1, "anything"));

    assert!(handler.handle_slash(interaction(2, "ban")).await.unwrap().ran());
}

#[tokio::test]
async fn deferral() {
    let (client, handler) = handler(HandlerConfig::default());
    handler.register(ban()).unwrap();
    handler
        .register(
            Command::from_fn("whisper", |_| async { Ok(ArgValue::Null) })
                .with_aliases(["whisper"])
                .with_slash(true)
                .with_slash_ephemeral(true),
        )
        .unwrap();

    handler.handle_slash(interaction(1, "ban")).await.unwrap();
    handler.handle_slash(interaction(2, "whisper")).await.unwrap();

    assert_eq!(*client.deferred.lock(), vec![(InteractionId::new(2), true)]);

    let (client, handler) = crate::support::handler(HandlerConfig::default().with_auto_defer(true));
    handler.register(ban()).unwrap();
    handler.handle_slash(interaction(3, "ban")).await.unwrap();

    assert_eq!(*client.deferred.lock(), vec![(InteractionId::new(3), false)]);
}

struct Split;

#[async_trait]
impl CommandExecutor for Split {
    async fn exec(&self, _ctx: CommandContext) -> Result<ArgValue> {
        Ok(ArgValue::from("text"))
    }

    async fn exec_slash(&self, ctx: SlashContext) -> Result<ArgValue> {
        if ctx.args.contains("explode") {
            return Err(Error::command("slash failure"));
        }
        Ok(ArgValue::from("slash"))
    }
}

#[tokio::test]
async fn slash_uses_its_own_body() {
    let (_, handler) = handler(HandlerConfig::default());
    handler
        .register(Command::new("split", Split).with_aliases(["split"]).with_slash(true))
        .unwrap();
    let mut rx = handler.subscribe();

    handler.handle_slash(interaction(1, "split")).await.unwrap();
    handler.handle(message(2, "!split")).await.unwrap();

    let outputs: Vec<ArgValue> = drain(&mut rx)
        .into_iter()
        .filter_map(|event| match event {
            HandlerEvent::SlashFinished { output, .. }
            | HandlerEvent::CommandFinished { output, .. } => Some(output),
            _ => None,
        })
        .collect();
    assert_eq!(outputs, vec![ArgValue::from("slash"), ArgValue::from("text")]);
}

#[tokio::test]
async fn slash_errors_are_reported_as_slash_errors() {
    let (_, handler) = handler(HandlerConfig::default());
    handler
        .register(Command::new("split", Split).with_aliases(["split"]).with_slash(true))
        .unwrap();

    let invocation = interaction(1, "split")
        .with_option(InteractionOption::new("explode", OptionValue::Boolean(true)));
    let mut rx = handler.subscribe();

    assert_eq!(handler.handle_slash(invocation).await.unwrap(), Dispatch::Errored);
    assert_eq!(names(&drain(&mut rx)), vec!["slashStarted", "slashError"]);
}
