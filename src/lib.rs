//! # sprig-ui
//!
//! Minimal declarative-UI renderer: tree-shaped element descriptors
//! become live UI-tree nodes, and a reload continuity manager keeps a
//! running instance alive across incremental code reloads without
//! losing in-memory state.
//!
//! ## Architecture
//!
//! ```text
//! descriptor tree → Engine::build → host nodes → mount → Starter/Disposer
//!                        │                                     │
//!                   RefRegistry                        ReloadCoordinator
//! ```
//!
//! The engine walks a descriptor tree bottom-up per subtree, resolving
//! tag polymorphism (kind name, passthrough node, component function),
//! classifying each attribute once (listener, style merge, computed,
//! plain), flattening arbitrarily nested children with a worklist, and
//! harvesting declared `ref` names into a shared registry. The host
//! tree itself stays behind the [`host::Host`] trait; an in-memory host
//! backs the tests.
//!
//! ## Modules
//!
//! - [`types`] - descriptor vocabulary (Tag, AttrValue, Child, Props)
//! - [`host`] - host collaborator boundary and in-memory reference host
//! - [`engine`] - element construction, attribute binding, ref registry
//! - [`pipeline`] - mount launcher, debounce, reload continuity

pub mod engine;
pub mod host;
pub mod pipeline;
pub mod types;

// Re-export commonly used items
pub use types::{AttrValue, Built, Child, ChildAtom, Component, EventHandler, Props, StyleMap, Tag};

pub use host::{Host, HostError, ListenerFlags, MemoryHost, MemoryNode, Namespace};

pub use engine::{
    Binding, Engine, EngineConfig, REF_ATTR, RefEntry, RefRegistry, STYLE_ATTR, classify, collect,
    collect_all, flatten, fragment,
};

pub use pipeline::{
    DEFAULT_RESTART_DELAY, Debouncer, Disposer, HandOff, ImmediateScheduler, ManualScheduler,
    MemoryChannel, ModuleHandle, MountTarget, ReloadChannel, ReloadCoordinator, Scheduler,
    Snapshot, Starter, hmr, mount,
};
