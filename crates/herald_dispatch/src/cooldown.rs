//! Per-user, per-command cooldown buckets.
//!
//! Bucket time follows the message clock (`created_at` milliseconds), so a
//! bucket whose window has passed is reset on the next check even if its
//! cleanup timer has not fired yet. The timer only reclaims memory.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use herald_foundation::UserId;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::trace;

/// Outcome of a cooldown check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CooldownVerdict {
    /// The use was counted and may proceed.
    Ready,
    /// The bucket is exhausted.
    Limited {
        /// Milliseconds until the window ends.
        remaining: u64,
    },
}

impl CooldownVerdict {
    /// Returns true if the use may proceed.
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

#[derive(Debug)]
struct Bucket {
    /// Window end, in message-clock milliseconds.
    end: u64,
    uses: u32,
    timer: Option<AbortHandle>,
}

impl Drop for Bucket {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

type Buckets = HashMap<UserId, HashMap<String, Bucket>>;

/// Cooldown bookkeeping for a command handler.
#[derive(Debug, Default)]
pub struct CooldownManager {
    buckets: Arc<Mutex<Buckets>>,
}

impl CooldownManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one use of `command` by `user` at time `now`.
    ///
    /// A zero `cooldown` disables the check. A `ratelimit` of zero behaves
    /// like one.
    pub fn check(
        &self,
        user: UserId,
        command: &str,
        now: u64,
        cooldown: u64,
        ratelimit: u32,
    ) -> CooldownVerdict {
        if cooldown == 0 {
            return CooldownVerdict::Ready;
        }
        let ratelimit = ratelimit.max(1);

        let mut buckets = self.buckets.lock();
        let per_user = buckets.entry(user).or_default();

        if per_user.get(command).is_some_and(|b| now >= b.end) {
            trace!(user = %user, command, "cooldown window elapsed");
            per_user.remove(command);
        }

        let bucket = per_user.entry(command.to_string()).or_insert_with(|| {
            let end = now.saturating_add(cooldown);
            Bucket {
                end,
                uses: 0,
                timer: self.spawn_cleanup(user, command.to_string(), end, cooldown),
            }
        });

        if bucket.uses >= ratelimit {
            let remaining = bucket.end.saturating_sub(now);
            trace!(user = %user, command, remaining, "on cooldown");
            return CooldownVerdict::Limited { remaining };
        }

        bucket.uses += 1;
        CooldownVerdict::Ready
    }

    /// Removes the bucket once its window passes. Skipped outside a tokio
    /// runtime; stale buckets are then reset lazily by [`check`](Self::check).
    fn spawn_cleanup(
        &self,
        user: UserId,
        command: String,
        end: u64,
        cooldown: u64,
    ) -> Option<AbortHandle> {
        let handle = Handle::try_current().ok()?;
        let buckets: Weak<Mutex<Buckets>> = Arc::downgrade(&self.buckets);

        let task = handle.spawn(async move {
            tokio::time::sleep(Duration::from_millis(cooldown)).await;
            let Some(buckets) = buckets.upgrade() else {
                return;
            };
            let mut buckets = buckets.lock();
            if let Some(per_user) = buckets.get_mut(&user) {
                if per_user.get(&command).is_some_and(|b| b.end == end) {
                    if let Some(mut bucket) = per_user.remove(&command) {
                        // Do not abort the task that is running this code.
                        bucket.timer = None;
                    }
                }
                if per_user.is_empty() {
                    buckets.remove(&user);
                }
            }
        });
        Some(task.abort_handle())
    }

    /// Uses counted in the live bucket, if any.
    #[must_use]
    pub fn uses(&self, user: UserId, command: &str) -> Option<u32> {
        self.buckets
            .lock()
            .get(&user)
            .and_then(|m| m.get(command))
            .map(|b| b.uses)
    }

    /// Drops every bucket belonging to `user`.
    pub fn reset_user(&self, user: UserId) {
        self.buckets.lock().remove(&user);
    }

    /// Number of users with live buckets.
    #[must_use]
    pub fn tracked_users(&self) -> usize {
        self.buckets.lock().len()
    }
}
