//! Debounced journal writes.
//!
//! Every edit schedules a save for its `(user, program, unit)` key. A newer
//! edit for the same key aborts the pending timer, so only the latest draft
//! reaches storage once the learner pauses typing. A direct save cancels the
//! pending draft for its key so an older draft never lands on top of it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use learn_core::model::{ProgramSlug, UnitId, UserId};
use tokio::task::{AbortHandle, JoinSet};
use tracing::{debug, warn};

use super::journal::{JournalService, SaveDayRequest};

/// Quiet period before a scheduled draft is written.
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(1200);

/// A draft waiting for its debounce window to expire.
#[derive(Debug, Clone, PartialEq)]
pub struct AutosaveRequest {
    pub user_id: UserId,
    pub save: SaveDayRequest,
}

type AutosaveKey = (UserId, ProgramSlug, UnitId);

impl AutosaveRequest {
    fn key(&self) -> AutosaveKey {
        key_of(self.user_id, &self.save)
    }
}

fn key_of(user_id: UserId, save: &SaveDayRequest) -> AutosaveKey {
    (user_id, save.program_slug.clone(), save.unit_id)
}

struct Pending {
    generation: u64,
    request: AutosaveRequest,
    timer: AbortHandle,
}

/// Per-key debounce in front of `JournalService::save_day`.
///
/// Failed writes are logged and dropped; the next edit retries.
#[derive(Clone)]
pub struct Autosaver {
    journal: Arc<JournalService>,
    delay: Duration,
    pending: Arc<Mutex<HashMap<AutosaveKey, Pending>>>,
    // Timers, including those already writing their draft.
    tasks: Arc<Mutex<JoinSet<()>>>,
    generation: Arc<AtomicU64>,
}

impl Autosaver {
    #[must_use]
    pub fn new(journal: Arc<JournalService>, delay: Duration) -> Self {
        Self {
            journal,
            delay,
            pending: Arc::new(Mutex::new(HashMap::new())),
            tasks: Arc::new(Mutex::new(JoinSet::new())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<AutosaveKey, Pending>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_tasks(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-arm the timer for the request's key with the latest draft.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, request: AutosaveRequest) {
        let key = request.key();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);

        let mut pending = self.lock();
        if let Some(previous) = pending.remove(&key) {
            previous.timer.abort();
        }
        let mut tasks = self.lock_tasks();
        while tasks.try_join_next().is_some() {}
        let timer = tasks.spawn({
            let this = self.clone();
            let key = key.clone();
            async move {
                tokio::time::sleep(this.delay).await;
                this.fire(&key, generation).await;
            }
        });
        pending.insert(
            key,
            Pending {
                generation,
                request,
                timer,
            },
        );
    }

    /// Drop the pending draft for the key `save` targets.
    ///
    /// Returns whether a draft was waiting.
    pub fn cancel(&self, user_id: UserId, save: &SaveDayRequest) -> bool {
        match self.lock().remove(&key_of(user_id, save)) {
            Some(previous) => {
                previous.timer.abort();
                debug!(user = %user_id, program = %save.program_slug, "queued draft superseded");
                true
            }
            None => false,
        }
    }

    async fn fire(&self, key: &AutosaveKey, generation: u64) {
        let request = {
            let mut pending = self.lock();
            let current = pending.get(key).is_some_and(|p| p.generation == generation);
            if current {
                pending.remove(key).map(|p| p.request)
            } else {
                None
            }
        };
        if let Some(request) = request {
            self.write(request).await;
        }
    }

    async fn write(&self, request: AutosaveRequest) -> bool {
        let user_id = request.user_id;
        let slug = request.save.program_slug.clone();
        match self.journal.save_day(user_id, request.save).await {
            Ok(outcome) => {
                debug!(user = %user_id, program = %slug, day = outcome.day, "autosaved");
                true
            }
            Err(e) => {
                warn!(user = %user_id, program = %slug, error = %e, "autosave failed");
                false
            }
        }
    }

    /// Wait for writes already under way, then write every pending draft.
    /// Returns how many pending drafts were written.
    pub async fn flush(&self) -> usize {
        let drained: Vec<Pending> = self
            .lock()
            .drain()
            .map(|(_, pending)| {
                pending.timer.abort();
                pending
            })
            .collect();
        let mut running = std::mem::take(&mut *self.lock_tasks());
        while running.join_next().await.is_some() {}

        let mut written = 0;
        for pending in drained {
            if self.write(pending.request).await {
                written += 1;
            }
        }
        written
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }
}
