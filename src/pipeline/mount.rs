//! Mount launcher - starter/disposer contract.
//!
//! `mount` wraps a mount point and a factory into a [`Starter`]: a
//! zero-argument callable that performs one full mount and yields a
//! [`Disposer`]. The target is resolved when the starter runs, not when
//! `mount` is called, so a selector re-resolves against a possibly
//! regenerated host tree across restarts.

use std::rc::Rc;

use crate::host::{Host, HostError};

// =============================================================================
// Contract types
// =============================================================================

/// Zero-argument teardown for one mounted instance.
///
/// Idempotent by convention: callers invoke it at most once, and the
/// continuity manager guarantees that by storing it in a take-once slot.
pub type Disposer = Box<dyn FnOnce()>;

/// Performs one full mount and yields the instance's disposer.
///
/// A failed mount-target lookup surfaces as `Err`: production callers
/// propagate it immediately (a missing mount point is a programming
/// error), the reload path catches and logs it.
pub type Starter = Rc<dyn Fn() -> Result<Disposer, HostError>>;

// =============================================================================
// Targets
// =============================================================================

/// Where to mount: a live node handle, or a selector resolved against
/// the host document with a single lookup.
#[derive(Clone, Debug)]
pub enum MountTarget<N> {
    Node(N),
    Selector(String),
}

impl<N> From<&str> for MountTarget<N> {
    fn from(selector: &str) -> Self {
        MountTarget::Selector(selector.to_string())
    }
}

impl<N> From<String> for MountTarget<N> {
    fn from(selector: String) -> Self {
        MountTarget::Selector(selector)
    }
}

// =============================================================================
// Mount
// =============================================================================

/// Wrap a mount target and factory into a starter.
///
/// The factory receives the resolved target and returns the disposer
/// for the instance it mounted.
pub fn mount<H, F>(host: Rc<H>, target: MountTarget<H::Node>, factory: F) -> Starter
where
    H: Host + 'static,
    F: Fn(H::Node) -> Disposer + 'static,
{
    Rc::new(move || {
        // resolved per invocation, never captured at mount time
        let resolved = match &target {
            MountTarget::Node(node) => node.clone(),
            MountTarget::Selector(selector) => host
                .query(selector)
                .ok_or_else(|| HostError::TargetNotFound(selector.clone()))?,
        };
        Ok(factory(resolved))
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use crate::host::MemoryHost;

    use super::*;

    #[test]
    fn test_target_resolved_at_start_time() {
        let host = Rc::new(MemoryHost::new());
        let starter = mount(Rc::clone(&host), "#app".into(), |_target| {
            Box::new(|| {}) as Disposer
        });

        // not registered yet: lookup fails at invocation, not at mount
        assert!(matches!(
            starter(),
            Err(HostError::TargetNotFound(_))
        ));

        let app = host.detached("div");
        host.register("#app", app);
        assert!(starter().is_ok());
    }

    #[test]
    fn test_selector_re_resolves_across_restarts() {
        let host = Rc::new(MemoryHost::new());
        let first = host.detached("div");
        host.register("#app", first.clone());

        let mounted = Rc::new(Cell::new(0u32));
        let mounted2 = mounted.clone();
        let host2 = Rc::clone(&host);
        let starter = mount(Rc::clone(&host), "#app".into(), move |target| {
            mounted2.set(mounted2.get() + 1);
            let regenerated = host2.query("#app").unwrap();
            assert!(target.ptr_eq(&regenerated));
            Box::new(|| {}) as Disposer
        });

        starter().unwrap();

        // host tree regenerated between restarts
        let second = host.detached("div");
        host.register("#app", second.clone());
        starter().unwrap();

        assert_eq!(mounted.get(), 2);
    }

    #[test]
    fn test_node_handle_used_directly() {
        let host = Rc::new(MemoryHost::new());
        let target = host.detached("main");
        let expected = target.clone();

        let starter = mount(
            Rc::clone(&host),
            MountTarget::Node(target),
            move |resolved| {
                assert!(resolved.ptr_eq(&expected));
                Box::new(|| {}) as Disposer
            },
        );
        starter().unwrap();
    }

    #[test]
    fn test_disposer_runs_factory_teardown() {
        let host = Rc::new(MemoryHost::new());
        let target = host.detached("main");
        let disposed = Rc::new(Cell::new(false));
        let disposed2 = disposed.clone();

        let starter = mount(
            Rc::clone(&host),
            MountTarget::Node(target),
            move |_resolved| {
                let flag = disposed2.clone();
                Box::new(move || flag.set(true)) as Disposer
            },
        );

        let disposer = starter().unwrap();
        assert!(!disposed.get());
        disposer();
        assert!(disposed.get());
    }
}
