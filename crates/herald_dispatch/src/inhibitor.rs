//! Inhibitors: pluggable checks that block messages or commands.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::try_join_all;
use herald_foundation::{Message, Result};
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::command::Command;
use crate::events::{EventBus, HandlerEvent};
use crate::module::{Module, ModuleRegistry, Reloader};

/// When an inhibitor runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InhibitorKind {
    /// On every message, before anything else.
    All,
    /// On every message that survived the built-in message checks, before
    /// a command is identified.
    Pre,
    /// After a command is identified.
    #[default]
    Post,
}

/// A check that can block dispatch.
#[async_trait]
pub trait Inhibitor: Module {
    /// Reason reported when this inhibitor blocks.
    fn reason(&self) -> &str;

    /// When the inhibitor runs.
    fn kind(&self) -> InhibitorKind {
        InhibitorKind::Post
    }

    /// Higher priorities win when several inhibitors block.
    fn priority(&self) -> i32 {
        0
    }

    /// Returns true to block. `command` is `None` for all and pre phases.
    ///
    /// # Errors
    ///
    /// Errors abort dispatch and are routed to the error event.
    async fn exec(&self, message: &Message, command: Option<&Command>) -> Result<bool>;
}

/// Holds inhibitors and runs them by phase.
#[derive(Debug)]
pub struct InhibitorHandler {
    modules: RwLock<ModuleRegistry<dyn Inhibitor>>,
    events: EventBus,
}

impl InhibitorHandler {
    /// Creates a handler publishing registration events on `events`.
    #[must_use]
    pub fn new(events: EventBus) -> Self {
        Self {
            modules: RwLock::new(ModuleRegistry::new()),
            events,
        }
    }

    /// Registers an inhibitor.
    ///
    /// # Errors
    ///
    /// Fails if the id is taken.
    pub fn register(&self, inhibitor: Arc<dyn Inhibitor>, filepath: Option<PathBuf>) -> Result<()> {
        let id = inhibitor.id().to_string();
        self.modules.write().register(inhibitor, filepath)?;
        self.events.publish(HandlerEvent::Load { id, reload: false });
        Ok(())
    }

    /// Removes an inhibitor.
    ///
    /// # Errors
    ///
    /// Fails if the id is unknown.
    pub fn remove(&self, id: &str) -> Result<Arc<dyn Inhibitor>> {
        let removed = self.modules.write().remove(id)?;
        self.events.publish(HandlerEvent::Remove { id: id.to_string() });
        Ok(removed)
    }

    /// Replaces an inhibitor with a fresh instance.
    ///
    /// # Errors
    ///
    /// Fails if the id is unknown or the reloader fails.
    pub fn reload(&self, id: &str, reloader: &Reloader<'_, dyn Inhibitor>) -> Result<Arc<dyn Inhibitor>> {
        let fresh = self.modules.write().reload(id, reloader)?;
        self.events.publish(HandlerEvent::Load {
            id: fresh.id().to_string(),
            reload: true,
        });
        Ok(fresh)
    }

    /// Gets an inhibitor by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn Inhibitor>> {
        self.modules.read().get(id).cloned()
    }

    /// Number of registered inhibitors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.read().len()
    }

    /// Returns true if none are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.read().is_empty()
    }

    /// Runs every inhibitor of `kind` concurrently and returns the reason of
    /// the highest-priority one that blocked, ties broken by id.
    ///
    /// # Errors
    ///
    /// Returns the first inhibitor error.
    pub async fn test(
        &self,
        kind: InhibitorKind,
        message: &Message,
        command: Option<&Command>,
    ) -> Result<Option<String>> {
        let inhibitors: Vec<Arc<dyn Inhibitor>> = self
            .modules
            .read()
            .iter()
            .filter(|i| i.kind() == kind)
            .cloned()
            .collect();
        if inhibitors.is_empty() {
            return Ok(None);
        }

        let verdicts = try_join_all(inhibitors.iter().map(|inhibitor| async move {
            let blocked = inhibitor.exec(message, command).await?;
            trace!(inhibitor = inhibitor.id(), blocked, "inhibitor verdict");
            Ok::<_, herald_foundation::Error>(blocked.then_some(inhibitor))
        }))
        .await?;

        let winner = verdicts
            .into_iter()
            .flatten()
            .max_by(|a, b| {
                a.priority()
                    .cmp(&b.priority())
                    .then_with(|| b.id().cmp(a.id()))
            });
        if let Some(inhibitor) = winner {
            debug!(inhibitor = inhibitor.id(), ?kind, "inhibited");
        }
        Ok(winner.map(|i| i.reason().to_string()))
    }
}
