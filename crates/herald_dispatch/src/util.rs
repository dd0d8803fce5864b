//! Per-message response bookkeeping.
//!
//! A [`CommandUtil`] remembers the last response sent for a message so an
//! edited invocation can edit that response instead of sending a new one.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use herald_foundation::{Message, MessageId, Result};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::client::Client;

/// What prefix matching found for the message, kept for the util's owner.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedSummary {
    /// Matched prefix.
    pub prefix: Option<String>,
    /// Matched alias.
    pub alias: Option<String>,
    /// Content after the alias.
    pub content: String,
    /// Content after the prefix.
    pub after_prefix: String,
}

#[derive(Debug)]
struct UtilState {
    message: Message,
    parsed: Option<ParsedSummary>,
    should_edit: bool,
    last_response: Option<MessageId>,
    messages: Vec<MessageId>,
}

/// Response bookkeeping for one invoking message.
pub struct CommandUtil {
    client: Arc<dyn Client>,
    store_messages: bool,
    state: Mutex<UtilState>,
}

impl CommandUtil {
    /// Creates a util for `message`.
    #[must_use]
    pub fn new(client: Arc<dyn Client>, message: Message, store_messages: bool) -> Self {
        Self {
            client,
            store_messages,
            state: Mutex::new(UtilState {
                message,
                parsed: None,
                should_edit: false,
                last_response: None,
                messages: Vec::new(),
            }),
        }
    }

    /// The current version of the invoking message.
    #[must_use]
    pub fn message(&self) -> Message {
        self.state.lock().message.clone()
    }

    pub(crate) fn set_message(&self, message: Message) {
        self.state.lock().message = message;
    }

    /// What prefix matching found.
    #[must_use]
    pub fn parsed(&self) -> Option<ParsedSummary> {
        self.state.lock().parsed.clone()
    }

    /// Records what prefix matching found.
    pub fn set_parsed(&self, parsed: ParsedSummary) {
        self.state.lock().parsed = Some(parsed);
    }

    /// Whether the next [`send`](Self::send) edits the last response.
    #[must_use]
    pub fn should_edit(&self) -> bool {
        self.state.lock().should_edit
    }

    /// Sets whether the next send edits the last response.
    pub fn set_editable(&self, editable: bool) {
        self.state.lock().should_edit = editable;
    }

    /// The last response sent through this util.
    #[must_use]
    pub fn last_response(&self) -> Option<MessageId> {
        self.state.lock().last_response
    }

    /// Records a prompt or reply message when message storage is on.
    pub fn add_message(&self, message: MessageId) {
        if self.store_messages {
            self.state.lock().messages.push(message);
        }
    }

    /// Stored messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<MessageId> {
        self.state.lock().messages.clone()
    }

    /// Sends a response, or edits the last one when editing is due.
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub async fn send(&self, content: &str) -> Result<MessageId> {
        let (channel, target) = {
            let state = self.state.lock();
            let target = state.last_response.filter(|_| state.should_edit);
            (state.message.channel.id, target)
        };

        if let Some(target) = target {
            self.client.edit(channel, target, content).await?;
            return Ok(target);
        }

        let sent = self.client.send(channel, content).await?;
        let mut state = self.state.lock();
        state.last_response = Some(sent);
        state.should_edit = true;
        Ok(sent)
    }

    /// Sends a new response without editing.
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub async fn send_new(&self, content: &str) -> Result<MessageId> {
        self.set_editable(false);
        self.send(content).await
    }

    /// Time of the message's last activity, in milliseconds.
    fn last_activity(&self) -> u64 {
        self.state.lock().message.last_activity()
    }
}

impl std::fmt::Debug for CommandUtil {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandUtil")
            .field("state", &*self.state.lock())
            .field("store_messages", &self.store_messages)
            .finish_non_exhaustive()
    }
}

/// Utils by invoking message id.
#[derive(Debug, Default)]
pub struct CommandUtilStore {
    utils: Mutex<HashMap<MessageId, Arc<CommandUtil>>>,
}

impl CommandUtilStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the util for `message`, creating it if needed. An existing util
    /// sees the new version of the message.
    pub fn get_or_create(
        &self,
        client: &Arc<dyn Client>,
        message: &Message,
        store_messages: bool,
    ) -> Arc<CommandUtil> {
        let mut utils = self.utils.lock();
        if let Some(util) = utils.get(&message.id) {
            util.set_message(message.clone());
            return Arc::clone(util);
        }
        let util = Arc::new(CommandUtil::new(
            Arc::clone(client),
            message.clone(),
            store_messages,
        ));
        utils.insert(message.id, Arc::clone(&util));
        util
    }

    /// Gets the util for a message id.
    #[must_use]
    pub fn get(&self, id: MessageId) -> Option<Arc<CommandUtil>> {
        self.utils.lock().get(&id).cloned()
    }

    /// Removes the util for a message id.
    pub fn remove(&self, id: MessageId) -> Option<Arc<CommandUtil>> {
        self.utils.lock().remove(&id)
    }

    /// Number of stored utils.
    #[must_use]
    pub fn len(&self) -> usize {
        self.utils.lock().len()
    }

    /// Returns true if no utils are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.utils.lock().is_empty()
    }

    /// Drops utils whose message has been inactive for more than `lifetime`
    /// milliseconds at time `now`. Returns how many were dropped.
    pub fn sweep(&self, now: u64, lifetime: u64) -> usize {
        let mut utils = self.utils.lock();
        let before = utils.len();
        utils.retain(|_, util| now.saturating_sub(util.last_activity()) <= lifetime);
        let swept = before - utils.len();
        if swept > 0 {
            debug!(swept, "swept command utils");
        }
        swept
    }

    /// Sweeps every `interval` on the current tokio runtime. Returns `None`
    /// outside a runtime. The task ends once the store is dropped.
    #[must_use]
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration, lifetime: u64) -> Option<JoinHandle<()>> {
        let handle = Handle::try_current().ok()?;
        let store: Weak<Self> = Arc::downgrade(self);
        Some(handle.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    break;
                };
                store.sweep(now_millis(), lifetime);
            }
        }))
    }
}

/// Wall-clock milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}
