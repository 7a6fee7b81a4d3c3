//! In-memory reference host.
//!
//! A concrete document tree with no layout or paint, used by the test
//! suite and by callers who want to inspect construction output without
//! a real toolkit. Nodes are shared handles with pointer identity;
//! cloning a `MemoryNode` clones the handle, not the element.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::types::EventHandler;

use super::{Host, HostError, ListenerFlags, Namespace};

/// Node kind used for text nodes.
pub const TEXT_KIND: &str = "#text";

// =============================================================================
// Node
// =============================================================================

struct Listener {
    event: String,
    handler: EventHandler,
    flags: ListenerFlags,
}

struct NodeData {
    kind: String,
    ns: Namespace,
    text: Option<String>,
    attrs: IndexMap<String, String>,
    style: IndexMap<String, String>,
    listeners: Vec<Listener>,
    children: Vec<MemoryNode>,
}

/// Shared handle to one in-memory element.
#[derive(Clone)]
pub struct MemoryNode {
    data: Rc<RefCell<NodeData>>,
}

impl MemoryNode {
    fn element(kind: &str, ns: Namespace) -> Self {
        Self {
            data: Rc::new(RefCell::new(NodeData {
                kind: kind.to_string(),
                ns,
                text: None,
                attrs: IndexMap::new(),
                style: IndexMap::new(),
                listeners: Vec::new(),
                children: Vec::new(),
            })),
        }
    }

    fn text_node(text: &str) -> Self {
        let node = Self::element(TEXT_KIND, Namespace::Generic);
        node.data.borrow_mut().text = Some(text.to_string());
        node
    }

    /// Node kind name (`"#text"` for text nodes).
    pub fn kind(&self) -> String {
        self.data.borrow().kind.clone()
    }

    /// Namespace the node was constructed in.
    pub fn namespace(&self) -> Namespace {
        self.data.borrow().ns
    }

    /// Whether this is a text node.
    pub fn is_text(&self) -> bool {
        self.data.borrow().text.is_some()
    }

    /// Attribute value, if set. Text nodes expose no attributes.
    pub fn attr(&self, name: &str) -> Option<String> {
        let data = self.data.borrow();
        if data.text.is_some() {
            return None;
        }
        data.attrs.get(name).cloned()
    }

    /// Snapshot of the attribute map in write order.
    pub fn attrs(&self) -> IndexMap<String, String> {
        self.data.borrow().attrs.clone()
    }

    /// One style property, if set.
    pub fn style_value(&self, prop: &str) -> Option<String> {
        self.data.borrow().style.get(prop).cloned()
    }

    /// Snapshot of the style surface in merge order.
    pub fn style(&self) -> IndexMap<String, String> {
        self.data.borrow().style.clone()
    }

    /// Children in document order (handle clones).
    pub fn children(&self) -> Vec<MemoryNode> {
        self.data.borrow().children.clone()
    }

    /// Number of listeners registered for an event name.
    pub fn listener_count(&self, event: &str) -> usize {
        self.data
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.event == event)
            .count()
    }

    /// Fire all listeners for an event name. Returns how many ran.
    /// `ONCE` listeners are removed after running.
    pub fn dispatch(&self, event: &str) -> usize {
        let handlers: Vec<EventHandler> = self
            .data
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.event == event)
            .map(|l| Rc::clone(&l.handler))
            .collect();
        for handler in &handlers {
            handler();
        }
        self.data
            .borrow_mut()
            .listeners
            .retain(|l| l.event != event || !l.flags.contains(ListenerFlags::ONCE));
        handlers.len()
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let data = self.data.borrow();
        if let Some(text) = &data.text {
            return text.clone();
        }
        data.children
            .iter()
            .map(|c| c.text_content())
            .collect::<Vec<_>>()
            .join("")
    }

    /// Handle identity (same underlying element).
    pub fn ptr_eq(&self, other: &MemoryNode) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for MemoryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data.borrow();
        if let Some(text) = &data.text {
            return write!(f, "Text({text:?})");
        }
        f.debug_struct("MemoryNode")
            .field("kind", &data.kind)
            .field("ns", &data.ns)
            .field("attrs", &data.attrs)
            .field("children", &data.children.len())
            .finish()
    }
}

// =============================================================================
// Host
// =============================================================================

/// In-memory host document.
///
/// `query` resolves against an explicit selector registry: tests (and
/// demo code) register the nodes a selector should find. Real hosts
/// bring their own lookup.
#[derive(Default)]
pub struct MemoryHost {
    targets: RefCell<HashMap<String, MemoryNode>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node under a selector so `query` can find it.
    pub fn register(&self, selector: impl Into<String>, node: MemoryNode) {
        self.targets.borrow_mut().insert(selector.into(), node);
    }

    /// Remove a selector registration (a regenerated host tree drops its
    /// old mount points).
    pub fn unregister(&self, selector: &str) {
        self.targets.borrow_mut().remove(selector);
    }

    /// Construct a detached element directly (mount-point setup).
    pub fn detached(&self, kind: &str) -> MemoryNode {
        MemoryNode::element(kind, Namespace::Generic)
    }

    /// Resolve a selector or fail with the fatal lookup error.
    pub fn require(&self, selector: &str) -> Result<MemoryNode, HostError> {
        self.query(selector)
            .ok_or_else(|| HostError::TargetNotFound(selector.to_string()))
    }
}

impl Host for MemoryHost {
    type Node = MemoryNode;

    fn create_node(&self, kind: &str, ns: Namespace) -> MemoryNode {
        MemoryNode::element(kind, ns)
    }

    fn create_text(&self, text: &str) -> MemoryNode {
        MemoryNode::text_node(text)
    }

    fn append_child(&self, parent: &MemoryNode, child: &MemoryNode) {
        parent.data.borrow_mut().children.push(child.clone());
    }

    fn set_attribute(&self, node: &MemoryNode, name: &str, value: &str) {
        node.data
            .borrow_mut()
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    fn attribute(&self, node: &MemoryNode, name: &str) -> Option<String> {
        node.attr(name)
    }

    fn merge_style(&self, node: &MemoryNode, prop: &str, value: &str) {
        node.data
            .borrow_mut()
            .style
            .insert(prop.to_string(), value.to_string());
    }

    fn add_listener(
        &self,
        node: &MemoryNode,
        event: &str,
        handler: EventHandler,
        flags: ListenerFlags,
    ) {
        node.data.borrow_mut().listeners.push(Listener {
            event: event.to_string(),
            handler,
            flags,
        });
    }

    fn child_nodes(&self, node: &MemoryNode) -> Vec<MemoryNode> {
        node.children()
    }

    fn query(&self, selector: &str) -> Option<MemoryNode> {
        self.targets.borrow().get(selector).cloned()
    }
}
