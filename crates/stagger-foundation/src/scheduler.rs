//! One-shot scheduled callbacks with cancel handles.
//!
//! Placement sometimes has to wait for a rendered height that may never
//! arrive (zero-height content, a layout pass that never fires). The engine
//! bounds that wait with a delayed callback scheduled through the
//! [`Scheduler`] trait, and cancels it through the returned handle when the
//! height report wins the race.
//!
//! A deterministic [`ManualScheduler`] is provided for tests and for
//! embedders that drive their own event loop.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use web_time::{Duration, Instant};

/// One-shot callback scheduling.
///
/// Implementations invoke the callback at most once, no earlier than `delay`
/// after the call. Canceling (or dropping) the returned handle prevents the
/// callback from running.
pub trait Scheduler {
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> ScheduleHandle;
}

/// Cancel handle for a scheduled callback.
///
/// The callback is canceled when the handle is dropped, so the owner keeps
/// the handle alive for as long as the callback should stay armed.
pub struct ScheduleHandle {
    cancelled: Rc<Cell<bool>>,
}

impl ScheduleHandle {
    /// Creates a handle plus the shared flag a scheduler implementation
    /// checks before invoking the callback.
    pub fn new() -> (Self, Rc<Cell<bool>>) {
        let cancelled = Rc::new(Cell::new(false));
        let handle = Self {
            cancelled: Rc::clone(&cancelled),
        };
        (handle, cancelled)
    }

    pub fn cancel(self) {
        drop(self);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

impl Drop for ScheduleHandle {
    fn drop(&mut self) {
        self.cancelled.set(true);
    }
}

impl std::fmt::Debug for ScheduleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleHandle")
            .field("cancelled", &self.cancelled.get())
            .finish()
    }
}

struct ScheduledEntry {
    due: Instant,
    seq: u64,
    cancelled: Rc<Cell<bool>>,
    callback: Box<dyn FnOnce()>,
}

struct ManualSchedulerInner {
    now: Instant,
    next_seq: u64,
    entries: Vec<ScheduledEntry>,
}

/// Scheduler driven by a virtual clock.
///
/// Nothing runs until the clock is advanced, which makes timer-dependent
/// behavior fully deterministic. Callbacks run outside the internal borrow,
/// so a callback may schedule further callbacks.
#[derive(Clone)]
pub struct ManualScheduler {
    inner: Rc<RefCell<ManualSchedulerInner>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ManualSchedulerInner {
                now: Instant::now(),
                next_seq: 0,
                entries: Vec::new(),
            })),
        }
    }

    pub fn now(&self) -> Instant {
        self.inner.borrow().now
    }

    /// Number of armed (not yet cancelled) callbacks.
    pub fn pending(&self) -> usize {
        let mut inner = self.inner.borrow_mut();
        inner.entries.retain(|entry| !entry.cancelled.get());
        inner.entries.len()
    }

    /// Advances the virtual clock, running every armed callback that comes
    /// due, in (due time, schedule order) order.
    pub fn advance(&self, delta: Duration) {
        let target = self.inner.borrow().now + delta;
        while let Some(entry) = self.pop_due(target) {
            (entry.callback)();
        }
        let mut inner = self.inner.borrow_mut();
        if inner.now < target {
            inner.now = target;
        }
    }

    /// Jumps the clock to the next armed callback and runs it.
    ///
    /// Returns `false` when nothing is armed.
    pub fn run_next(&self) -> bool {
        let due = {
            let mut inner = self.inner.borrow_mut();
            inner.entries.retain(|entry| !entry.cancelled.get());
            match inner.entries.iter().map(|entry| entry.due).min() {
                Some(due) => due,
                None => return false,
            }
        };
        match self.pop_due(due) {
            Some(entry) => {
                (entry.callback)();
                true
            }
            None => false,
        }
    }

    /// Runs armed callbacks, advancing the clock as needed, until none
    /// remain. Returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }

    /// Removes and returns the earliest armed entry due at or before `limit`,
    /// moving the clock to its due time. Cancelled entries are discarded.
    fn pop_due(&self, limit: Instant) -> Option<ScheduledEntry> {
        let mut inner = self.inner.borrow_mut();
        inner.entries.retain(|entry| !entry.cancelled.get());
        let next = inner
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.due <= limit)
            .min_by_key(|(_, entry)| (entry.due, entry.seq))
            .map(|(index, _)| index)?;
        let entry = inner.entries.swap_remove(next);
        if entry.due > inner.now {
            inner.now = entry.due;
        }
        Some(entry)
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> ScheduleHandle {
        let (handle, cancelled) = ScheduleHandle::new();
        let mut inner = self.inner.borrow_mut();
        let due = inner.now + delay;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.push(ScheduledEntry {
            due,
            seq,
            cancelled,
            callback,
        });
        handle
    }
}
