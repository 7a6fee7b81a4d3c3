//! Element construction engine.
//!
//! Turns one descriptor (tag, props, key) into live host nodes:
//!
//! - resolves tag polymorphism (kind name / passthrough node / component)
//! - decides namespace (graphics vs. generic)
//! - classifies every attribute once and applies its binding
//! - flattens and appends children
//! - harvests declared refs into the shared registry
//!
//! Component tags are the one polymorphism point: the function receives
//! the props (children already normalized) and its return value is the
//! build result, untouched - no namespace handling, no attribute
//! dispatch, no ref collection at the wrapper level. Whatever it returns
//! re-enters this same algorithm if passed through `build` again.

mod binding;
mod children;
mod refs;

pub use binding::{Binding, STYLE_ATTR, classify};
pub use children::flatten;
pub use refs::{REF_ATTR, RefEntry, RefRegistry, collect, collect_all};

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use crate::host::{Host, ListenerFlags, Namespace};
use crate::types::{AttrValue, Built, ChildAtom, Props, Tag, format_float};

/// Reserved key in the attribute map; children live on `Props::children`.
const CHILDREN_KEY: &str = "children";

// =============================================================================
// Configuration
// =============================================================================

/// Engine constants, configurable for portability across UI toolkits.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Attribute-name prefix marking event listeners ("on" → `onClick`).
    pub event_prefix: Cow<'static, str>,
    /// Kind names that always construct in the graphics namespace, even
    /// outside a graphics scope.
    pub graphics_kinds: HashSet<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_prefix: Cow::Borrowed("on"),
            graphics_kinds: ["svg", "path", "circle", "rect"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// The construction engine for one host.
///
/// Holds the shared ref registry (process-scoped, append-only) and the
/// "currently rendering graphics" flag. Single-threaded by design; state
/// is `Rc`/`RefCell`, never shared across threads.
pub struct Engine<H: Host> {
    host: Rc<H>,
    refs: Rc<RefCell<RefRegistry<H::Node>>>,
    graphics_mode: Cell<bool>,
    config: EngineConfig,
}

impl<H: Host> Engine<H> {
    pub fn new(host: Rc<H>) -> Self {
        Self::with_config(host, EngineConfig::default())
    }

    pub fn with_config(host: Rc<H>, config: EngineConfig) -> Self {
        Self {
            host,
            refs: Rc::new(RefCell::new(RefRegistry::new())),
            graphics_mode: Cell::new(false),
            config,
        }
    }

    pub fn host(&self) -> &Rc<H> {
        &self.host
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The shared ref registry (query surface for application code).
    pub fn refs(&self) -> Rc<RefCell<RefRegistry<H::Node>>> {
        Rc::clone(&self.refs)
    }

    /// All nodes registered under a name.
    pub fn ref_nodes(&self, name: &str) -> Vec<H::Node> {
        self.refs.borrow().nodes(name)
    }

    /// Run `f` with the graphics flag set: every kind name constructed
    /// inside resolves to the graphics namespace.
    pub fn with_graphics<R>(&self, f: impl FnOnce() -> R) -> R {
        let prev = self.graphics_mode.replace(true);
        let result = f();
        self.graphics_mode.set(prev);
        result
    }

    // =========================================================================
    // Build
    // =========================================================================

    /// Construct nodes from one descriptor.
    ///
    /// `_key` is the descriptor's implicit key, accepted for
    /// descriptor-generator compatibility; construction ignores it.
    pub fn build(
        &self,
        tag: Tag<H::Node>,
        props: Props<H::Node>,
        _key: Option<&str>,
    ) -> Built<H::Node> {
        match tag {
            // Sole polymorphism point for components; the engine imposes
            // no lifecycle and performs no processing on the result.
            Tag::Component(f) => f(props),

            // Descriptor-as-passthrough.
            Tag::Node(node) => Built::Node(node),

            Tag::Name(name) => self.construct(&name, props),
        }
    }

    fn construct(&self, kind: &str, props: Props<H::Node>) -> Built<H::Node> {
        let ns = if self.graphics_mode.get() || self.config.graphics_kinds.contains(kind) {
            Namespace::Graphics
        } else {
            Namespace::Generic
        };
        let node = self.host.create_node(kind, ns);

        for (name, value) in props.attrs {
            if name == CHILDREN_KEY {
                continue;
            }
            if matches!(value, AttrValue::Null) {
                continue;
            }
            match classify(&self.config, &name, value) {
                Binding::Listener { event, handler } => {
                    self.host
                        .add_listener(&node, &event, handler, ListenerFlags::empty());
                }
                Binding::StyleMerge(map) => {
                    for (prop, val) in &map {
                        self.host.merge_style(&node, prop, val);
                    }
                }
                Binding::Plain(text) => self.host.set_attribute(&node, &name, &text),
                Binding::Omitted => {}
            }
        }

        for atom in flatten(props.children) {
            match atom {
                ChildAtom::Node(child) => self.host.append_child(&node, &child),
                ChildAtom::Text(text) => {
                    let text = self.host.create_text(&text);
                    self.host.append_child(&node, &text);
                }
                ChildAtom::Int(i) => {
                    let text = self.host.create_text(&i.to_string());
                    self.host.append_child(&node, &text);
                }
                ChildAtom::Float(x) => {
                    let text = self.host.create_text(&format_float(x));
                    self.host.append_child(&node, &text);
                }
            }
        }

        let found = collect(self.host.as_ref(), &node);
        self.refs.borrow_mut().merge(found);

        Built::Node(node)
    }

    // =========================================================================
    // Descriptor-generator aliases
    // =========================================================================

    // Four entry points for different descriptor-generation conventions,
    // one implementation.

    pub fn jsx(
        &self,
        tag: Tag<H::Node>,
        props: Props<H::Node>,
        key: Option<&str>,
    ) -> Built<H::Node> {
        self.build(tag, props, key)
    }

    pub fn jsxs(
        &self,
        tag: Tag<H::Node>,
        props: Props<H::Node>,
        key: Option<&str>,
    ) -> Built<H::Node> {
        self.build(tag, props, key)
    }

    pub fn jsx_dev(
        &self,
        tag: Tag<H::Node>,
        props: Props<H::Node>,
        key: Option<&str>,
    ) -> Built<H::Node> {
        self.build(tag, props, key)
    }

    pub fn jsx_graphics(
        &self,
        tag: Tag<H::Node>,
        props: Props<H::Node>,
        key: Option<&str>,
    ) -> Built<H::Node> {
        self.build(tag, props, key)
    }
}

// =============================================================================
// Fragment
// =============================================================================

/// Fragment component: no node of its own, children flattened in place.
///
/// Use as `Tag::component(fragment)`.
pub fn fragment<N>(props: Props<N>) -> Built<N> {
    Built::List(flatten(props.children))
}
