//! Host collaborator boundary.
//!
//! The engine never touches a concrete UI tree directly; everything it
//! needs from the surrounding toolkit goes through the [`Host`] trait:
//!
//! - node construction, parameterized by namespace
//! - attribute, style, and listener writes
//! - attribute reads and child iteration (ref collection)
//! - a single selector lookup (mount-target resolution)
//!
//! The in-memory reference host lives in [`memory`] and backs the test
//! suite; a real port binds this trait to its own document tree.

use bitflags::bitflags;
use thiserror::Error;

use crate::types::EventHandler;

pub mod memory;

pub use memory::{MemoryHost, MemoryNode};

// =============================================================================
// Namespace
// =============================================================================

/// Namespace a node is constructed in.
///
/// Graphics covers vector-drawing kinds ("svg", "path", ...); everything
/// else is generic. The engine decides which one applies, the host maps
/// it to whatever its toolkit needs (a namespace URI, a widget class).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Namespace {
    #[default]
    Generic,
    Graphics,
}

// =============================================================================
// Listener flags
// =============================================================================

bitflags! {
    /// Options for listener registration.
    ///
    /// The engine always registers with `empty()` (non-capturing,
    /// persistent); the flags exist so hosts with richer listener
    /// models keep their options at the boundary.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ListenerFlags: u8 {
        /// Capture-phase listener.
        const CAPTURE = 1 << 0;
        /// Listener removes itself after the first dispatch.
        const ONCE = 1 << 1;
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Errors surfaced at the host boundary.
#[derive(Debug, Error)]
pub enum HostError {
    /// A mount-target selector matched nothing. A missing mount point is
    /// a programming error; production callers propagate this
    /// immediately, the reload path catches and logs it.
    #[error("mount target {0:?} matched nothing")]
    TargetNotFound(String),
}

// =============================================================================
// Host trait
// =============================================================================

/// The document-like collaborator the engine builds against.
///
/// `Node` is a cheap handle (clone = share). Ownership of the underlying
/// element belongs to the host tree; the engine retains handles only in
/// the ref registry, which is a non-owning lookup index.
pub trait Host {
    type Node: Clone + 'static;

    /// Construct an empty node of the given kind in the given namespace.
    fn create_node(&self, kind: &str, ns: Namespace) -> Self::Node;

    /// Construct a text node.
    fn create_text(&self, text: &str) -> Self::Node;

    /// Append `child` as the last child of `parent`.
    fn append_child(&self, parent: &Self::Node, child: &Self::Node);

    /// Write a plain attribute.
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

    /// Read an attribute. Returns None when absent or when the node kind
    /// exposes no attributes (text nodes).
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// Merge one key/value pair onto the node's style surface.
    fn merge_style(&self, node: &Self::Node, prop: &str, value: &str);

    /// Register an event listener.
    fn add_listener(
        &self,
        node: &Self::Node,
        event: &str,
        handler: EventHandler,
        flags: ListenerFlags,
    );

    /// Children of a node, in document order.
    fn child_nodes(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Single selector lookup against the host document.
    fn query(&self, selector: &str) -> Option<Self::Node>;
}
