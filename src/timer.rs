//! Single-slot cancellable timer.
//!
//! One [`Timer`] belongs to one skill instance and drives time-boxed
//! conversational follow-ups ("ask a question, resume after N seconds if no
//! answer arrives"). At most one delayed callback may be armed at a time;
//! arming a second one either fails noisily or — in reschedule mode —
//! atomically cancels and replaces the first.
//!
//! Misuse (double-schedule, strict cancel with nothing armed) is logged and
//! never surfaces as an error to skill business logic.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::skill::BoxFuture;
use crate::SkillError;

/// Callback invoked when the timer expires, with the optional user argument.
pub type TimerCallback =
    Box<dyn FnOnce(Option<serde_json::Value>) -> BoxFuture<'static, ()> + Send>;

struct TimerTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct TimerInner {
    armed: AtomicBool,
    slot: Mutex<Option<TimerTask>>,
}

/// Cancellable single-shot timer with one slot per skill instance.
///
/// Cheap to clone; clones share the same slot, so a callback may hold a
/// clone and re-arm the timer from inside its own expiry.
#[derive(Clone)]
pub struct Timer {
    inner: Arc<TimerInner>,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create an idle timer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TimerInner {
                armed: AtomicBool::new(false),
                slot: Mutex::new(None),
            }),
        }
    }

    /// Whether a delayed callback is currently armed.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.inner.armed.load(Ordering::SeqCst)
    }

    /// Arm a delayed callback.
    ///
    /// When a timer is already armed: with `reschedule` false this is a
    /// misuse — logged at error level, no state change, returns `false`;
    /// with `reschedule` true the armed timer is cancelled (non-strict,
    /// awaiting its unwind) and the new one armed.
    ///
    /// The armed state clears *before* the callback runs, so the callback
    /// may re-arm through a [`Timer`] clone.
    pub async fn schedule(
        &self,
        delay: Duration,
        callback: TimerCallback,
        arg: Option<serde_json::Value>,
        reschedule: bool,
    ) -> bool {
        if self.is_armed() {
            if !reschedule {
                let misuse = SkillError::Timer(
                    "already armed, refusing to schedule without reschedule".into(),
                );
                error!(delay_secs = delay.as_secs_f64(), error = %misuse, "timer misuse");
                return false;
            }
            self.cancel(false).await;
        }

        let cancel = CancellationToken::new();
        let inner = Arc::clone(&self.inner);
        inner.armed.store(true, Ordering::SeqCst);

        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;

                () = task_cancel.cancelled() => {
                    inner.armed.store(false, Ordering::SeqCst);
                }
                () = tokio::time::sleep(delay) => {
                    // Idle before the callback so it may re-arm.
                    inner.armed.store(false, Ordering::SeqCst);
                    callback(arg).await;
                }
            }
        });

        let mut slot = lock_slot(&self.inner.slot);
        // A previous task that already fired leaves a finished handle here.
        *slot = Some(TimerTask { cancel, handle });
        true
    }

    /// Cancel the armed timer, waiting for the delayed task to unwind.
    ///
    /// With nothing armed this is a misuse when `strict` (logged at error
    /// level) and a silent no-op otherwise. A callback already in flight
    /// runs to completion rather than being interrupted.
    pub async fn cancel(&self, strict: bool) {
        let task = {
            let mut slot = lock_slot(&self.inner.slot);
            if !self.is_armed() {
                if strict {
                    let misuse =
                        SkillError::Timer("cancel requested but nothing is armed".into());
                    error!(error = %misuse, "timer misuse");
                } else {
                    debug!("timer cancel with nothing armed, ignoring");
                }
                // Drop any finished handle left from a fired timer.
                slot.take();
                return;
            }
            slot.take()
        };

        if let Some(task) = task {
            task.cancel.cancel();
            let _ = task.handle.await;
        }
        self.inner.armed.store(false, Ordering::SeqCst);
    }
}

/// Lock the slot, recovering from a poisoned mutex.
fn lock_slot(slot: &Mutex<Option<TimerTask>>) -> std::sync::MutexGuard<'_, Option<TimerTask>> {
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
