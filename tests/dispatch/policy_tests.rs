//! Built-in checks, permissions, cooldowns, locks, inhibitors and prompts.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use herald_dispatch::{
    BlockReason, BuiltInReason, ChannelRestriction, Command, Dispatch, HandlerConfig, HandlerEvent,
    IgnoreList, Inhibitor, InhibitorKind, LockScope, Module, PermissionCheck, PermissionSide,
};
use herald_foundation::{ArgValue, Author, Channel, Message, Permissions, Result, UserId};
use tokio::sync::Notify;

use crate::support::{BOT, CHANNEL, OWNER, USER, direct, drain, handler, message, names};

fn noop(id: &str) -> Command {
    Command::from_fn(id, |_| async { Ok(ArgValue::Null) }).with_aliases([id])
}

fn blocked_reason(events: &[HandlerEvent]) -> Option<BlockReason> {
    events.iter().find_map(|event| match event {
        HandlerEvent::MessageBlocked { reason, .. } | HandlerEvent::CommandBlocked { reason, .. } => {
            Some(reason.clone())
        }
        _ => None,
    })
}

// =============================================================================
// Built-in checks
// =============================================================================

#[tokio::test]
async fn bots_and_self_are_blocked() {
    let (_, handler) = handler(HandlerConfig::default());
    handler.register(noop("ping")).unwrap();
    let mut rx = handler.subscribe();

    let from_bot = message(1, "!ping").with_author(Author::bot(UserId::new(55)));
    assert_eq!(handler.handle(from_bot).await.unwrap(), Dispatch::NotRan);
    assert_eq!(blocked_reason(&drain(&mut rx)), Some(BuiltInReason::Bot.into()));

    let from_self = message(2, "!ping").with_author(Author::bot(BOT));
    assert_eq!(handler.handle(from_self).await.unwrap(), Dispatch::NotRan);
    assert_eq!(blocked_reason(&drain(&mut rx)), Some(BuiltInReason::Client.into()));
}

#[tokio::test]
async fn bots_pass_when_allowed() {
    let (_, handler) = handler(HandlerConfig::default().with_block_bots(false));
    handler.register(noop("ping")).unwrap();

    let from_bot = message(1, "!ping").with_author(Author::bot(UserId::new(55)));
    assert!(handler.handle(from_bot).await.unwrap().ran());
}

#[tokio::test]
async fn owner_only_commands() {
    let (_, handler) = handler(HandlerConfig::default());
    handler.register(noop("eval").with_owner_only(true)).unwrap();
    let mut rx = handler.subscribe();

    assert!(!handler.handle(message(1, "!eval")).await.unwrap().ran());
    assert_eq!(blocked_reason(&drain(&mut rx)), Some(BuiltInReason::Owner.into()));

    let from_owner = message(2, "!eval").with_author(Author::user(OWNER));
    assert!(handler.handle(from_owner).await.unwrap().ran());
}

#[tokio::test]
async fn channel_restrictions() {
    let (_, handler) = handler(HandlerConfig::default());
    handler
        .register(noop("ban").with_channel(ChannelRestriction::Guild))
        .unwrap();
    handler
        .register(noop("secret").with_channel(ChannelRestriction::Dm))
        .unwrap();
    handler.register(noop("spicy").with_only_nsfw(true)).unwrap();
    let mut rx = handler.subscribe();

    assert!(!handler.handle(direct(1, "!ban")).await.unwrap().ran());
    assert_eq!(blocked_reason(&drain(&mut rx)), Some(BuiltInReason::Guild.into()));
    assert!(handler.handle(message(2, "!ban")).await.unwrap().ran());

    assert!(!handler.handle(message(3, "!secret")).await.unwrap().ran());
    assert_eq!(blocked_reason(&drain(&mut rx)), Some(BuiltInReason::Dm.into()));
    assert!(handler.handle(direct(4, "!secret")).await.unwrap().ran());

    assert!(!handler.handle(message(5, "!spicy")).await.unwrap().ran());
    assert_eq!(blocked_reason(&drain(&mut rx)), Some(BuiltInReason::NotNsfw.into()));
    let nsfw = message(6, "!spicy").with_channel(Channel::guild(CHANNEL).with_nsfw(true));
    assert!(handler.handle(nsfw).await.unwrap().ran());
}

// =============================================================================
// Permissions
// =============================================================================

fn missing(events: &[HandlerEvent]) -> Option<(PermissionSide, ArgValue)> {
    events.iter().find_map(|event| match event {
        HandlerEvent::MissingPermissions { side, missing, .. } => Some((*side, missing.clone())),
        _ => None,
    })
}

#[tokio::test]
async fn user_permissions_are_checked() {
    let (client, handler) = handler(HandlerConfig::default());
    handler
        .register(noop("ban").with_user_permissions(Permissions::BAN_MEMBERS))
        .unwrap();
    client.grant(BOT, Permissions::all());
    client.grant(USER, Permissions::SEND_MESSAGES);
    let mut rx = handler.subscribe();

    assert!(!handler.handle(message(1, "!ban")).await.unwrap().ran());
    assert_eq!(
        missing(&drain(&mut rx)),
        Some((PermissionSide::User, ArgValue::from(vec!["BAN_MEMBERS"])))
    );

    client.grant(USER, Permissions::ADMINISTRATOR);
    assert!(handler.handle(message(2, "!ban")).await.unwrap().ran());
}

#[tokio::test]
async fn client_permissions_are_checked_first() {
    let (client, handler) = handler(HandlerConfig::default());
    handler
        .register(
            noop("purge")
                .with_client_permissions(Permissions::MANAGE_MESSAGES)
                .with_user_permissions(Permissions::MANAGE_MESSAGES),
        )
        .unwrap();
    client.grant(BOT, Permissions::SEND_MESSAGES);
    let mut rx = handler.subscribe();

    assert!(!handler.handle(message(1, "!purge")).await.unwrap().ran());
    let (side, _) = missing(&drain(&mut rx)).unwrap();
    assert_eq!(side, PermissionSide::Client);
}

#[tokio::test]
async fn unresolvable_permissions_fail_closed() {
    let (client, handler) = handler(HandlerConfig::default());
    handler
        .register(noop("kick").with_user_permissions(Permissions::KICK_MEMBERS))
        .unwrap();
    client.grant(BOT, Permissions::all());
    let mut rx = handler.subscribe();

    assert!(!handler.handle(message(1, "!kick")).await.unwrap().ran());
    assert_eq!(
        missing(&drain(&mut rx)),
        Some((PermissionSide::User, ArgValue::from(vec!["KICK_MEMBERS"])))
    );
}

#[tokio::test]
async fn static_permissions_are_skipped_in_direct_messages() {
    let (_, handler) = handler(HandlerConfig::default());
    handler
        .register(noop("kick").with_user_permissions(Permissions::KICK_MEMBERS))
        .unwrap();

    assert!(handler.handle(direct(1, "!kick")).await.unwrap().ran());
}

#[tokio::test]
async fn dynamic_permissions_and_ignore_lists() {
    let (_, handler) = handler(HandlerConfig::default());
    let check = PermissionCheck::dynamic(|message: Message| {
        async move {
            let verdict: Result<Option<ArgValue>> = if message.content.contains("please") {
                Ok(None)
            } else {
                Ok(Some(ArgValue::from("manners")))
            };
            verdict
        }
        .boxed()
    });
    handler
        .register(
            noop("ask")
                .with_user_permissions(check)
                .with_ignore_permissions(IgnoreList::Ids(vec![OWNER])),
        )
        .unwrap();
    let mut rx = handler.subscribe();

    assert!(!handler.handle(message(1, "!ask now")).await.unwrap().ran());
    assert_eq!(
        missing(&drain(&mut rx)),
        Some((PermissionSide::User, ArgValue::from("manners")))
    );
    assert!(handler.handle(message(2, "!ask please")).await.unwrap().ran());

    let from_owner = message(3, "!ask now").with_author(Author::user(OWNER));
    assert!(handler.handle(from_owner).await.unwrap().ran());
}

// =============================================================================
// Cooldowns
// =============================================================================

#[tokio::test]
async fn cooldown_window_boundary() {
    let (_, handler) = handler(HandlerConfig::default());
    handler.register(noop("daily").with_cooldown(1_000)).unwrap();
    let mut rx = handler.subscribe();

    let at = |id: u64, time: u64| message(id, "!daily").with_created_at(time);

    assert!(handler.handle(at(1, 10_000)).await.unwrap().ran());
    assert!(!handler.handle(at(2, 10_999)).await.unwrap().ran());
    let remaining = drain(&mut rx).iter().find_map(|event| match event {
        HandlerEvent::Cooldown { remaining, .. } => Some(*remaining),
        _ => None,
    });
    assert_eq!(remaining, Some(1));

    assert!(handler.handle(at(3, 11_000)).await.unwrap().ran());
}

#[tokio::test]
async fn ratelimit_allows_several_uses_per_window() {
    let (_, handler) = handler(HandlerConfig::default());
    handler
        .register(noop("roll").with_cooldown(5_000).with_ratelimit(2))
        .unwrap();

    let at = |id: u64| message(id, "!roll").with_created_at(1_000 + id);

    assert!(handler.handle(at(1)).await.unwrap().ran());
    assert!(handler.handle(at(2)).await.unwrap().ran());
    assert!(!handler.handle(at(3)).await.unwrap().ran());
    assert_eq!(handler.cooldowns().uses(USER, "roll"), Some(2));
}

#[tokio::test]
async fn owners_skip_cooldowns_by_default() {
    let (_, handler) = handler(HandlerConfig::default().with_default_cooldown(60_000));
    handler.register(noop("ping")).unwrap();

    let from_owner = |id: u64| message(id, "!ping").with_author(Author::user(OWNER));

    assert!(handler.handle(from_owner(1)).await.unwrap().ran());
    assert!(handler.handle(from_owner(2)).await.unwrap().ran());
    assert!(handler.handle(message(3, "!ping")).await.unwrap().ran());
    assert!(!handler.handle(message(4, "!ping")).await.unwrap().ran());
}

// =============================================================================
// Locks
// =============================================================================

#[tokio::test]
async fn lock_rejects_concurrent_invocations() {
    let (_, handler) = handler(HandlerConfig::default());
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let command = {
        let started = Arc::clone(&started);
        let release = Arc::clone(&release);
        Command::from_fn("slow", move |_| {
            let started = Arc::clone(&started);
            let release = Arc::clone(&release);
            async move {
                started.notify_one();
                release.notified().await;
                Ok(ArgValue::Null)
            }
        })
        .with_aliases(["slow"])
        .with_lock(LockScope::User)
    };
    let slow = handler.register(command).unwrap();
    let mut rx = handler.subscribe();

    let first = handler.handle(message(1, "!slow"));
    let second = async {
        started.notified().await;
        let outcome = handler.handle(message(2, "!slow")).await;
        release.notify_one();
        outcome
    };
    let (first, second) = tokio::join!(first, second);

    assert_eq!(first.unwrap(), Dispatch::Ran);
    assert_eq!(second.unwrap(), Dispatch::NotRan);
    let events = drain(&mut rx);
    assert!(events.iter().any(|event| matches!(
        event,
        HandlerEvent::CommandLocked { key, .. } if *key == USER.to_string()
    )));
    assert!(slow.locker.is_empty());
}

#[tokio::test]
async fn lock_is_released_after_errors() {
    let (_, handler) = handler(HandlerConfig::default());
    let failing = Command::from_fn("flaky", |_| async {
        Err(herald_foundation::Error::command("boom"))
    })
    .with_aliases(["flaky"])
    .with_lock(LockScope::Channel);
    let flaky = handler.register(failing).unwrap();

    assert!(handler.handle(message(1, "!flaky")).await.is_err());
    assert!(flaky.locker.is_empty());
}

// =============================================================================
// Inhibitors
// =============================================================================

struct Blocklist {
    id: &'static str,
    kind: InhibitorKind,
    priority: i32,
    blocked: UserId,
}

impl Module for Blocklist {
    fn id(&self) -> &str {
        self.id
    }
}

#[async_trait]
impl Inhibitor for Blocklist {
    fn reason(&self) -> &str {
        self.id
    }

    fn kind(&self) -> InhibitorKind {
        self.kind
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    async fn exec(&self, message: &Message, _command: Option<&Command>) -> Result<bool> {
        Ok(message.author.id == self.blocked)
    }
}

fn blocklist(id: &'static str, kind: InhibitorKind, priority: i32) -> Arc<Blocklist> {
    Arc::new(Blocklist {
        id,
        kind,
        priority,
        blocked: USER,
    })
}

#[tokio::test]
async fn pre_inhibitor_blocks_before_parsing() {
    let (_, handler) = handler(HandlerConfig::default());
    handler.register(noop("ping")).unwrap();
    handler
        .inhibitors()
        .register(blocklist("blacklist", InhibitorKind::Pre, 0), None)
        .unwrap();
    let mut rx = handler.subscribe();

    assert!(!handler.handle(message(1, "!ping")).await.unwrap().ran());
    let events = drain(&mut rx);
    assert_eq!(names(&events), vec!["messageBlocked"]);
    assert_eq!(blocked_reason(&events), Some(BlockReason::Inhibitor("blacklist".into())));

    let from_owner = message(2, "!ping").with_author(Author::user(OWNER));
    assert!(handler.handle(from_owner).await.unwrap().ran());
}

#[tokio::test]
async fn post_inhibitor_priority_decides_the_reason() {
    let (_, handler) = handler(HandlerConfig::default());
    handler.register(noop("ping")).unwrap();
    let inhibitors = handler.inhibitors();
    inhibitors
        .register(blocklist("low", InhibitorKind::Post, 1), None)
        .unwrap();
    inhibitors
        .register(blocklist("high", InhibitorKind::Post, 5), None)
        .unwrap();
    let mut rx = handler.subscribe();

    assert!(!handler.handle(message(1, "!ping")).await.unwrap().ran());
    let events = drain(&mut rx);
    assert_eq!(names(&events), vec!["commandBlocked"]);
    assert_eq!(blocked_reason(&events), Some(BlockReason::Inhibitor("high".into())));
}

#[tokio::test]
async fn built_in_checks_run_before_post_inhibitors() {
    let (_, handler) = handler(HandlerConfig::default());
    handler.register(noop("eval").with_owner_only(true)).unwrap();
    handler
        .inhibitors()
        .register(blocklist("blacklist", InhibitorKind::Post, 0), None)
        .unwrap();
    let mut rx = handler.subscribe();

    handler.handle(message(1, "!eval")).await.unwrap();

    assert_eq!(blocked_reason(&drain(&mut rx)), Some(BuiltInReason::Owner.into()));
}

#[tokio::test]
async fn skipping_built_ins_lets_post_inhibitors_decide_first() {
    let config = HandlerConfig::default().with_skip_built_in_post_inhibitors(true);
    let (_, handler) = handler(config);
    handler.register(noop("eval").with_owner_only(true)).unwrap();
    handler
        .inhibitors()
        .register(blocklist("blacklist", InhibitorKind::Post, 0), None)
        .unwrap();
    let mut rx = handler.subscribe();

    assert!(!handler.handle(message(1, "!eval")).await.unwrap().ran());
    let events = drain(&mut rx);
    assert_eq!(names(&events), vec!["commandBlocked"]);
    assert_eq!(blocked_reason(&events), Some(BlockReason::Inhibitor("blacklist".into())));

    // Authors the inhibitor lets through still meet the built-ins.
    let other = message(2, "!eval").with_author(Author::user(UserId::new(11)));
    assert!(!handler.handle(other).await.unwrap().ran());
    assert_eq!(blocked_reason(&drain(&mut rx)), Some(BuiltInReason::Owner.into()));
}

#[tokio::test]
async fn removed_inhibitor_stops_blocking() {
    let (_, handler) = handler(HandlerConfig::default());
    handler.register(noop("ping")).unwrap();
    handler
        .inhibitors()
        .register(blocklist("blacklist", InhibitorKind::All, 0), None)
        .unwrap();

    assert!(!handler.handle(message(1, "!ping")).await.unwrap().ran());
    handler.inhibitors().remove("blacklist").unwrap();
    assert!(handler.handle(message(2, "!ping")).await.unwrap().ran());
}

// =============================================================================
// Prompts
// =============================================================================

#[tokio::test]
async fn open_prompt_swallows_messages() {
    let (_, handler) = handler(HandlerConfig::default());
    handler.register(noop("ping")).unwrap();
    let mut rx = handler.subscribe();

    let first = message(1, "!ping");
    assert!(handler.add_prompt(&first));
    assert!(!handler.handle(first.clone()).await.unwrap().ran());
    assert_eq!(names(&drain(&mut rx)), vec!["inPrompt"]);

    handler.remove_prompt(&first);
    assert!(handler.handle(message(2, "!ping")).await.unwrap().ran());
}
