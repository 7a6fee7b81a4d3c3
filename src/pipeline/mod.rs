//! Mount and reload pipeline.
//!
//! The lifecycle half of the crate:
//!
//! ```text
//! mount(target, factory) → Starter → Disposer
//!                            │
//!            ReloadCoordinator::begin(starter, snapshot, apply)
//!                            │
//!         warm resume ◄──────┴──────► debounced cold restart
//! ```
//!
//! - [`mount`] - wraps a mount point and factory into a restartable
//!   starter; target resolution happens at start time
//! - [`debounce`] - trailing-edge coalescing for reload storms
//! - [`reload`] - the continuity manager: fingerprint comparison, state
//!   hand-off, teardown-before-restart ordering

pub mod debounce;
pub mod mount;
pub mod reload;

pub use debounce::{
    DEFAULT_RESTART_DELAY, Debouncer, ImmediateScheduler, ManualScheduler, Scheduler,
};
pub use mount::{Disposer, MountTarget, Starter, mount};
pub use reload::{
    HandOff, MemoryChannel, ModuleHandle, ReloadChannel, ReloadCoordinator, Snapshot, hmr,
};
