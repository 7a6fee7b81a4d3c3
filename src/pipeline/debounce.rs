//! Trailing-edge debounce for reload storms.
//!
//! A burst of reload notifications must coalesce into one restart. The
//! debouncer keeps a single pending-action slot: every trigger replaces
//! the slot, only the first trigger in a window arms the timer, and the
//! timer callback reads the slot at fire time. The action that runs is
//! always the most recently triggered one.
//!
//! Timers are a host concern, so scheduling goes through the
//! [`Scheduler`] trait: [`ImmediateScheduler`] degenerates to a
//! synchronous call (hosts without timers), [`ManualScheduler`] queues
//! callbacks and fires them on demand (virtual time for tests).

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

/// Delay for coalescing restart bursts.
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_millis(30);

// =============================================================================
// Scheduler
// =============================================================================

/// Host timer collaborator: run `callback` once, after `delay`.
pub trait Scheduler {
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>);
}

/// Runs callbacks synchronously, ignoring the delay. The debounce
/// degenerates to a direct call.
#[derive(Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
    fn schedule(&self, _delay: Duration, callback: Box<dyn FnOnce()>) {
        callback();
    }
}

/// Queues callbacks; the owner fires them explicitly.
#[derive(Default)]
pub struct ManualScheduler {
    queue: RefCell<VecDeque<Box<dyn FnOnce()>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of scheduled, unfired callbacks.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Fire the oldest scheduled callback. Returns false when idle.
    pub fn fire_next(&self) -> bool {
        let callback = self.queue.borrow_mut().pop_front();
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    /// Fire everything scheduled so far, including callbacks scheduled
    /// while firing. Returns how many ran.
    pub fn fire_all(&self) -> usize {
        let mut fired = 0;
        while self.fire_next() {
            fired += 1;
        }
        fired
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, _delay: Duration, callback: Box<dyn FnOnce()>) {
        self.queue.borrow_mut().push_back(callback);
    }
}

// =============================================================================
// Debouncer
// =============================================================================

/// Trailing-edge debouncer with a single-slot pending cell.
pub struct Debouncer {
    scheduler: Rc<dyn Scheduler>,
    delay: Duration,
    pending: Rc<RefCell<Option<Box<dyn FnOnce()>>>>,
    armed: Rc<Cell<bool>>,
}

impl Debouncer {
    pub fn new(scheduler: Rc<dyn Scheduler>, delay: Duration) -> Self {
        Self {
            scheduler,
            delay,
            pending: Rc::new(RefCell::new(None)),
            armed: Rc::new(Cell::new(false)),
        }
    }

    /// Replace the pending action; arm the timer if idle. The slot is
    /// read at fire time, so the latest trigger in a window wins.
    pub fn trigger(&self, action: Box<dyn FnOnce()>) {
        *self.pending.borrow_mut() = Some(action);
        if self.armed.replace(true) {
            return;
        }
        let pending = Rc::clone(&self.pending);
        let armed = Rc::clone(&self.armed);
        self.scheduler.schedule(
            self.delay,
            Box::new(move || {
                armed.set(false);
                let action = pending.borrow_mut().take();
                if let Some(action) = action {
                    action();
                }
            }),
        );
    }
}
