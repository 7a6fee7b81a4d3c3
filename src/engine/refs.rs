//! Ref registry - named handles onto constructed nodes.
//!
//! Application code names nodes with the reserved `ref` attribute; after
//! a build pass it re-acquires them here instead of holding raw handles.
//! The registry is append-only for its whole lifetime: entries are never
//! removed, even when the nodes they point at are later discarded by a
//! reload cycle. It is a non-owning lookup index, not an ownership root.

use indexmap::IndexMap;

use crate::host::Host;

/// The reserved attribute read during collection.
pub const REF_ATTR: &str = "ref";

// =============================================================================
// Entries
// =============================================================================

/// One registry entry: a single node, or every node that declared the
/// same name, in discovery order (depth-first document order).
#[derive(Clone, Debug)]
pub enum RefEntry<N> {
    One(N),
    Many(Vec<N>),
}

impl<N: Clone> RefEntry<N> {
    /// All nodes under this entry, cloned handles.
    pub fn nodes(&self) -> Vec<N> {
        match self {
            RefEntry::One(n) => vec![n.clone()],
            RefEntry::Many(ns) => ns.clone(),
        }
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Name → node(s) mapping, append-only.
#[derive(Clone, Debug)]
pub struct RefRegistry<N> {
    entries: IndexMap<String, RefEntry<N>>,
}

impl<N> Default for RefRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> RefRegistry<N> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Entry under a name.
    pub fn get(&self, name: &str) -> Option<&RefEntry<N>> {
        self.entries.get(name)
    }

    /// Declared names in discovery order.
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Clone> RefRegistry<N> {
    /// Append a node under a name. A second node under the same name
    /// promotes the entry to a list, preserving discovery order.
    pub fn record(&mut self, name: &str, node: N) {
        match self.entries.get_mut(name) {
            None => {
                self.entries.insert(name.to_string(), RefEntry::One(node));
            }
            Some(entry) => {
                let mut nodes = entry.nodes();
                nodes.push(node);
                *entry = RefEntry::Many(nodes);
            }
        }
    }

    /// Fold a freshly collected subset into this registry.
    pub fn merge(&mut self, other: RefRegistry<N>) {
        for (name, entry) in other.entries {
            for node in entry.nodes() {
                self.record(&name, node);
            }
        }
    }

    /// All nodes under a name (empty when unknown).
    pub fn nodes(&self, name: &str) -> Vec<N> {
        self.get(name).map(RefEntry::nodes).unwrap_or_default()
    }
}

// =============================================================================
// Collection
// =============================================================================

/// Walk a constructed subtree depth-first and collect every declared
/// `ref` into a fresh registry (the caller merges it into the shared
/// table). Text nodes expose no attributes and are skipped.
pub fn collect<H: Host>(host: &H, node: &H::Node) -> RefRegistry<H::Node> {
    let mut found = RefRegistry::new();
    collect_into(host, node, &mut found);
    found
}

/// Collect over a list of roots, in order.
pub fn collect_all<H: Host>(host: &H, nodes: &[H::Node]) -> RefRegistry<H::Node> {
    let mut found = RefRegistry::new();
    for node in nodes {
        collect_into(host, node, &mut found);
    }
    found
}

fn collect_into<H: Host>(host: &H, node: &H::Node, found: &mut RefRegistry<H::Node>) {
    if let Some(name) = host.attribute(node, REF_ATTR) {
        found.record(&name, node.clone());
    }
    for child in host.child_nodes(node) {
        collect_into(host, &child, found);
    }
}
