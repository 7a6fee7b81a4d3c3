//! Reload continuity manager.
//!
//! Keeps one mount point alive across incremental code reloads without
//! losing in-memory state. Per reload notification the coordinator
//! decides between two paths:
//!
//! - **Warm resume**: the incoming snapshot serializes byte-identically
//!   to the very first one this session ever saw and its key set matches
//!   the stored snapshot's. An unrelated code edit retriggered the
//!   module; the stored state is re-applied and nothing restarts.
//! - **Cold restart**: anything else. The previous instance is disposed,
//!   the starter runs (through a trailing-edge debounce that coalesces
//!   reload storms), and the fresh disposer and snapshot are stored.
//!
//! Teardown of the previous instance always happens before construction
//! of the next. Any failure inside a reload cycle is logged as a warning
//! and degrades to "continuity disabled for this cycle" - never a crash.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::warn;

use super::debounce::{DEFAULT_RESTART_DELAY, Debouncer, Scheduler};
use super::mount::Starter;

// =============================================================================
// Snapshots
// =============================================================================

/// Externally supplied plain key/value record: the minimal state an
/// instance needs to resume after a reload.
pub type Snapshot = serde_json::Map<String, serde_json::Value>;

/// Canonical serialization (sorted keys): byte-identical iff the
/// snapshots are semantically identical.
fn fingerprint(snapshot: &Snapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string(snapshot)
}

/// Order-independent key-set equality.
fn key_sets_match(a: &Snapshot, b: &Snapshot) -> bool {
    a.len() == b.len() && a.keys().all(|k| b.contains_key(k))
}

// =============================================================================
// Reload channel
// =============================================================================

/// The build tool's module-invalidation notification channel.
///
/// Subscriptions are one-shot: a listener fires at most once, for the
/// next "about to reload" event, then is gone. That makes duplicate
/// teardown from the same event impossible by construction.
pub trait ReloadChannel {
    fn on_before_reload(&self, listener: Box<dyn FnOnce()>);
}

/// In-memory channel: tests and embedded hosts deliver the notification
/// explicitly.
#[derive(Default)]
pub struct MemoryChannel {
    listeners: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver "about to reload": drains and fires every listener once.
    pub fn notify_before_reload(&self) -> usize {
        let listeners: Vec<_> = self.listeners.borrow_mut().drain(..).collect();
        let count = listeners.len();
        for listener in listeners {
            listener();
        }
        count
    }
}

impl ReloadChannel for MemoryChannel {
    fn on_before_reload(&self, listener: Box<dyn FnOnce()>) {
        self.listeners.borrow_mut().push(listener);
    }
}

// =============================================================================
// Session
// =============================================================================

/// Per-mount-point state surviving across reload cycles.
///
/// Replace-on-cycle: every cold restart overwrites the disposer and
/// snapshot; the first fingerprint is recorded once and kept.
struct Session {
    first_fingerprint: Option<String>,
    snapshot: Option<Snapshot>,
    disposer: Option<Box<dyn FnOnce()>>,
    top_frame: bool,
}

impl Session {
    fn new() -> Self {
        Self {
            first_fingerprint: None,
            snapshot: None,
            disposer: None,
            top_frame: false,
        }
    }
}

// =============================================================================
// Hand-off
// =============================================================================

/// The `{ starter }`-shaped value a sibling module exports; the sole
/// cross-module contract.
pub struct ModuleHandle {
    pub starter: Starter,
}

/// Callback returned by `begin`: lets a reloaded dependency module
/// propagate a restart up to the mount point that owns the instance.
pub type HandOff = Rc<dyn Fn(ModuleHandle)>;

// =============================================================================
// Coordinator
// =============================================================================

struct Inner {
    channel: Option<Rc<dyn ReloadChannel>>,
    debounce: Debouncer,
    session: RefCell<Session>,
}

impl Inner {
    /// Tear down the current instance, if any. The disposer is taken out
    /// of the session before it runs, so re-entry sees an empty slot.
    fn dispose_current(&self) {
        let disposer = self.session.borrow_mut().disposer.take();
        if let Some(disposer) = disposer {
            disposer();
        }
    }

    /// Restart through the debounce: previous instance down, starter up,
    /// fresh disposer stored.
    fn restart(self: &Rc<Self>, starter: Starter) {
        let inner = Rc::clone(self);
        self.debounce.trigger(Box::new(move || {
            inner.dispose_current();
            match starter() {
                Ok(disposer) => inner.session.borrow_mut().disposer = Some(disposer),
                Err(error) => {
                    warn!(%error, "restart failed; reload continuity disabled for this cycle");
                }
            }
        }));
    }
}

/// Owns the debounced restart cycle, the fingerprint comparison, and the
/// cross-instance state hand-off for one mount point.
pub struct ReloadCoordinator {
    inner: Rc<Inner>,
}

impl ReloadCoordinator {
    /// `channel: None` is the production configuration: `begin` becomes
    /// a no-op and nothing is coordinated.
    pub fn new(channel: Option<Rc<dyn ReloadChannel>>, scheduler: Rc<dyn Scheduler>) -> Self {
        Self::with_delay(channel, scheduler, DEFAULT_RESTART_DELAY)
    }

    pub fn with_delay(
        channel: Option<Rc<dyn ReloadChannel>>,
        scheduler: Rc<dyn Scheduler>,
        delay: Duration,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                channel,
                debounce: Debouncer::new(scheduler, delay),
                session: RefCell::new(Session::new()),
            }),
        }
    }

    /// Begin (or re-begin) one reload-aware mount.
    ///
    /// Called once per module instantiation by generated glue code.
    /// Returns the hand-off callback; see [`HandOff`].
    pub fn begin(
        &self,
        starter: Starter,
        snapshot: Snapshot,
        apply_snapshot: impl FnOnce(Snapshot) + 'static,
    ) -> HandOff {
        let Some(channel) = self.inner.channel.clone() else {
            return Rc::new(|_| {});
        };

        let json = match fingerprint(&snapshot) {
            Ok(json) => json,
            Err(error) => {
                warn!(%error, "snapshot serialization failed; reload continuity disabled for this cycle");
                return self.handoff();
            }
        };

        // Warm resume: same serialized form as the session's first-ever
        // observation, and the stored snapshot's key set matches.
        {
            let session = self.inner.session.borrow();
            if session.first_fingerprint.as_deref() == Some(json.as_str()) {
                if let Some(stored) = &session.snapshot {
                    if key_sets_match(stored, &snapshot) {
                        let stored = stored.clone();
                        drop(session);
                        apply_snapshot(stored);
                        return self.handoff();
                    }
                }
            }
        }

        // Cold path.
        {
            let mut session = self.inner.session.borrow_mut();
            if session.first_fingerprint.is_none() {
                session.first_fingerprint = Some(json);
            }
            session.snapshot = Some(snapshot);
            session.top_frame = true;
        }
        self.inner.restart(starter);

        // One-shot teardown when the host is about to swap modules.
        // Weak: the channel outlives reload cycles and must not keep the
        // session alive through its listener list.
        let weak: Weak<Inner> = Rc::downgrade(&self.inner);
        channel.on_before_reload(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.dispose_current();
            }
        }));

        self.handoff()
    }

    fn handoff(&self) -> HandOff {
        let inner = Rc::clone(&self.inner);
        Rc::new(move |module: ModuleHandle| {
            inner.dispose_current();
            // the top frame owns the restart; a duplicate would
            // double-start
            if inner.session.borrow().top_frame {
                return;
            }
            inner.restart(module.starter);
            inner.session.borrow_mut().top_frame = false;
        })
    }
}

/// Module-glue entry point: one call per module instantiation.
pub fn hmr(
    coordinator: &ReloadCoordinator,
    starter: Starter,
    snapshot: Snapshot,
    apply_snapshot: impl FnOnce(Snapshot) + 'static,
) -> HandOff {
    coordinator.begin(starter, snapshot, apply_snapshot)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;

    use crate::host::HostError;
    use crate::pipeline::debounce::ManualScheduler;
    use crate::pipeline::mount::Disposer;

    use super::*;

    /// Starter that logs "start:<name>" on start and "dispose:<name>"
    /// on teardown.
    fn logging_starter(name: &'static str, log: Rc<RefCell<Vec<String>>>) -> Starter {
        Rc::new(move || {
            log.borrow_mut().push(format!("start:{name}"));
            let log = log.clone();
            Ok(Box::new(move || log.borrow_mut().push(format!("dispose:{name}"))) as Disposer)
        })
    }

    fn snapshot(pairs: &[(&str, i64)]) -> Snapshot {
        let mut map = Snapshot::new();
        for (k, v) in pairs {
            map.insert(k.to_string(), json!(v));
        }
        map
    }

    fn coordinator() -> (ReloadCoordinator, Rc<ManualScheduler>, Rc<MemoryChannel>) {
        let scheduler = Rc::new(ManualScheduler::new());
        let channel = Rc::new(MemoryChannel::new());
        let coordinator = ReloadCoordinator::new(
            Some(channel.clone() as Rc<dyn ReloadChannel>),
            scheduler.clone() as Rc<dyn Scheduler>,
        );
        (coordinator, scheduler, channel)
    }

    #[test]
    fn test_no_channel_is_a_noop() {
        let scheduler = Rc::new(ManualScheduler::new());
        let coordinator = ReloadCoordinator::new(None, scheduler.clone());

        let log = Rc::new(RefCell::new(Vec::new()));
        let handoff = coordinator.begin(
            logging_starter("a", log.clone()),
            snapshot(&[("n", 1)]),
            |_| {},
        );

        assert_eq!(scheduler.pending(), 0);
        handoff(ModuleHandle {
            starter: logging_starter("b", log.clone()),
        });
        scheduler.fire_all();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_cold_start_runs_starter_once() {
        let (coordinator, scheduler, _channel) = coordinator();
        let log = Rc::new(RefCell::new(Vec::new()));

        coordinator.begin(
            logging_starter("a", log.clone()),
            snapshot(&[("n", 1)]),
            |_| {},
        );
        scheduler.fire_all();
        assert_eq!(*log.borrow(), vec!["start:a"]);
    }

    #[test]
    fn test_warm_resume_applies_stored_state_without_restart() {
        let (coordinator, scheduler, _channel) = coordinator();
        let log = Rc::new(RefCell::new(Vec::new()));

        coordinator.begin(
            logging_starter("a", log.clone()),
            snapshot(&[("count", 1)]),
            |_| panic!("first begin must not warm-resume"),
        );
        scheduler.fire_all();

        // unrelated edit retriggers begin with the same state shape
        let applied = Rc::new(RefCell::new(None));
        let applied2 = applied.clone();
        coordinator.begin(
            logging_starter("b", log.clone()),
            snapshot(&[("count", 1)]),
            move |stored| *applied2.borrow_mut() = Some(stored),
        );
        scheduler.fire_all();

        // stored snapshot from the first begin came back
        assert_eq!(
            applied.borrow().as_ref().unwrap().get("count"),
            Some(&json!(1))
        );
        // the starter never ran a second time, nothing was disposed
        assert_eq!(*log.borrow(), vec!["start:a"]);
    }

    #[test]
    fn test_warm_resume_requires_matching_key_set() {
        let (coordinator, scheduler, _channel) = coordinator();
        let log = Rc::new(RefCell::new(Vec::new()));

        coordinator.begin(
            logging_starter("a", log.clone()),
            snapshot(&[("n", 1)]),
            |_| {},
        );
        scheduler.fire_all();

        // same serialized bytes can never collide here, but a changed key
        // set with an equal fingerprint is the guarded case; simulate by
        // differing snapshots -> cold path
        coordinator.begin(
            logging_starter("b", log.clone()),
            snapshot(&[("n", 1), ("extra", 2)]),
            |_| panic!("cold path must not apply stored state"),
        );
        scheduler.fire_all();
        assert_eq!(
            *log.borrow(),
            vec!["start:a", "dispose:a", "start:b"]
        );
    }

    #[test]
    fn test_cold_path_disposes_before_next_start() {
        let (coordinator, scheduler, _channel) = coordinator();
        let log = Rc::new(RefCell::new(Vec::new()));

        coordinator.begin(
            logging_starter("a", log.clone()),
            snapshot(&[("n", 1)]),
            |_| {},
        );
        scheduler.fire_all();

        coordinator.begin(
            logging_starter("b", log.clone()),
            snapshot(&[("n", 2)]),
            |_| {},
        );
        scheduler.fire_all();

        assert_eq!(
            *log.borrow(),
            vec!["start:a", "dispose:a", "start:b"]
        );
    }

    #[test]
    fn test_reload_storm_coalesces_to_latest_starter() {
        let (coordinator, scheduler, _channel) = coordinator();
        let log = Rc::new(RefCell::new(Vec::new()));

        // burst: three begins inside one debounce window
        coordinator.begin(
            logging_starter("a", log.clone()),
            snapshot(&[("n", 1)]),
            |_| {},
        );
        coordinator.begin(
            logging_starter("b", log.clone()),
            snapshot(&[("n", 2)]),
            |_| {},
        );
        coordinator.begin(
            logging_starter("c", log.clone()),
            snapshot(&[("n", 3)]),
            |_| {},
        );

        scheduler.fire_all();
        // exactly one start, the most recently stored starter
        assert_eq!(*log.borrow(), vec!["start:c"]);
    }

    #[test]
    fn test_before_reload_notification_tears_down_once() {
        let (coordinator, scheduler, channel) = coordinator();
        let log = Rc::new(RefCell::new(Vec::new()));

        coordinator.begin(
            logging_starter("a", log.clone()),
            snapshot(&[("n", 1)]),
            |_| {},
        );
        scheduler.fire_all();

        channel.notify_before_reload();
        assert_eq!(*log.borrow(), vec!["start:a", "dispose:a"]);

        // listener was one-shot; a second event finds nothing to tear down
        channel.notify_before_reload();
        assert_eq!(*log.borrow(), vec!["start:a", "dispose:a"]);
    }

    #[test]
    fn test_handoff_top_frame_disposes_without_restart() {
        let (coordinator, scheduler, _channel) = coordinator();
        let log = Rc::new(RefCell::new(Vec::new()));

        let handoff = coordinator.begin(
            logging_starter("a", log.clone()),
            snapshot(&[("n", 1)]),
            |_| {},
        );
        scheduler.fire_all();

        handoff(ModuleHandle {
            starter: logging_starter("sibling", log.clone()),
        });
        scheduler.fire_all();

        // the top frame owns the restart: teardown only
        assert_eq!(*log.borrow(), vec!["start:a", "dispose:a"]);
    }

    #[test]
    fn test_handoff_non_top_frame_adopts_sibling_starter() {
        let (coordinator, scheduler, _channel) = coordinator();
        let log = Rc::new(RefCell::new(Vec::new()));

        // session never began here, so this frame does not own the restart
        let handoff = coordinator.handoff();
        handoff(ModuleHandle {
            starter: logging_starter("sibling", log.clone()),
        });
        scheduler.fire_all();

        assert_eq!(*log.borrow(), vec!["start:sibling"]);
    }

    #[test]
    fn test_failed_starter_degrades_without_crash() {
        let (coordinator, scheduler, channel) = coordinator();

        let attempts = Rc::new(Cell::new(0u32));
        let attempts2 = attempts.clone();
        let failing: Starter = Rc::new(move || {
            attempts2.set(attempts2.get() + 1);
            Err(HostError::TargetNotFound("#missing".to_string()))
        });

        coordinator.begin(failing, snapshot(&[("n", 1)]), |_| {});
        scheduler.fire_all();
        assert_eq!(attempts.get(), 1);

        // no disposer was stored; the notification finds nothing
        channel.notify_before_reload();
    }

    #[test]
    fn test_hmr_entry_point_delegates_to_begin() {
        let (coordinator, scheduler, _channel) = coordinator();
        let log = Rc::new(RefCell::new(Vec::new()));

        let handoff = hmr(
            &coordinator,
            logging_starter("a", log.clone()),
            snapshot(&[("n", 1)]),
            |_| {},
        );
        scheduler.fire_all();
        assert_eq!(*log.borrow(), vec!["start:a"]);
        drop(handoff);
    }
}
