//! Core types for sprig-ui.
//!
//! These types define the descriptor vocabulary that everything builds on.
//! A descriptor is a (tag, props, key) triple; the tag and every attribute
//! value are tagged unions so the construction engine can dispatch on shape
//! with an explicit decision table instead of nested runtime type tests.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

// =============================================================================
// Callbacks
// =============================================================================

/// Event handler registered on a constructed node.
///
/// Using Rc<dyn Fn> instead of Box<dyn Fn> allows cloning handlers
/// into closures without ownership issues.
pub type EventHandler = Rc<dyn Fn()>;

/// Zero-argument function producing an attribute value (a "computed
/// attribute"). Evaluated eagerly, exactly once, at construction time.
pub type ComputedFn = Rc<dyn Fn() -> AttrValue>;

// =============================================================================
// Style
// =============================================================================

/// Style surface written onto a node key by key.
///
/// Insertion-ordered so merges happen in declaration order.
pub type StyleMap = IndexMap<String, String>;

// =============================================================================
// Attribute values
// =============================================================================

/// One attribute value, tagged by shape.
///
/// The construction engine classifies each value exactly once per
/// attribute (see [`crate::engine`]); the variants here are the inputs
/// to that classification.
#[derive(Clone)]
pub enum AttrValue {
    /// Absent value. Skipped entirely, never written.
    Null,
    /// `false` suppresses the attribute; `true` writes the literal "true".
    Bool(bool),
    /// Integer value, written in decimal.
    Int(i64),
    /// Float value, written without a fractional part when integral.
    Float(f64),
    /// Plain text value.
    Text(String),
    /// Style map. Merged key by key when the attribute is `style`,
    /// serialized to CSS text under any other name.
    Style(StyleMap),
    /// Event handler. Registered when the attribute name carries the
    /// event prefix.
    Handler(EventHandler),
    /// Computed attribute: invoked once at construction time.
    Computed(ComputedFn),
    /// Nested list. Flattened fully, `Null` entries dropped, remainder
    /// joined with a single space (conditional class lists).
    List(Vec<AttrValue>),
}

impl AttrValue {
    /// Wrap an event handler.
    pub fn handler(f: impl Fn() + 'static) -> Self {
        AttrValue::Handler(Rc::new(f))
    }

    /// Wrap a computed attribute function.
    pub fn computed(f: impl Fn() -> AttrValue + 'static) -> Self {
        AttrValue::Computed(Rc::new(f))
    }
}

impl fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Null => write!(f, "Null"),
            AttrValue::Bool(b) => write!(f, "Bool({b})"),
            AttrValue::Int(i) => write!(f, "Int({i})"),
            AttrValue::Float(x) => write!(f, "Float({x})"),
            AttrValue::Text(s) => write!(f, "Text({s:?})"),
            AttrValue::Style(m) => f.debug_tuple("Style").field(m).finish(),
            AttrValue::Handler(_) => write!(f, "Handler(..)"),
            AttrValue::Computed(_) => write!(f, "Computed(..)"),
            AttrValue::List(items) => f.debug_tuple("List").field(items).finish(),
        }
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Text(v)
    }
}

impl From<StyleMap> for AttrValue {
    fn from(v: StyleMap) -> Self {
        AttrValue::Style(v)
    }
}

impl From<Vec<AttrValue>> for AttrValue {
    fn from(v: Vec<AttrValue>) -> Self {
        AttrValue::List(v)
    }
}

// =============================================================================
// Children
// =============================================================================

/// One child entry before flattening.
///
/// Arbitrarily nested lists are allowed; `Built` wraps the result of a
/// nested build call and is unwrapped to its atoms during flattening.
#[derive(Clone, Debug, PartialEq)]
pub enum Child<N> {
    /// Dropped during flattening.
    Null,
    /// Dropped during flattening (conditional-rendering placeholder).
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// A live node handle.
    Node(N),
    /// Nested list, any depth.
    List(Vec<Child<N>>),
    /// Result of a nested build call (node-like wrapper).
    Built(Built<N>),
}

impl<N> Child<N> {
    /// Wrap a live node handle.
    pub fn node(node: N) -> Self {
        Child::Node(node)
    }
}

impl<N> From<&str> for Child<N> {
    fn from(v: &str) -> Self {
        Child::Text(v.to_string())
    }
}

impl<N> From<String> for Child<N> {
    fn from(v: String) -> Self {
        Child::Text(v)
    }
}

impl<N> From<i64> for Child<N> {
    fn from(v: i64) -> Self {
        Child::Int(v)
    }
}

impl<N> From<f64> for Child<N> {
    fn from(v: f64) -> Self {
        Child::Float(v)
    }
}

impl<N> From<Vec<Child<N>>> for Child<N> {
    fn from(v: Vec<Child<N>>) -> Self {
        Child::List(v)
    }
}

impl<N> From<Built<N>> for Child<N> {
    fn from(v: Built<N>) -> Self {
        Child::Built(v)
    }
}

/// A child that survived flatten-unwrap-filter: a real node, a string,
/// or a number. Everything else is silently dropped.
#[derive(Clone, Debug, PartialEq)]
pub enum ChildAtom<N> {
    Node(N),
    Text(String),
    Int(i64),
    Float(f64),
}

// =============================================================================
// Build results
// =============================================================================

/// Result of a build pass: one constructed node, or a list of child
/// atoms (what a fragment or a list-returning component produces).
#[derive(Clone, Debug, PartialEq)]
pub enum Built<N> {
    Node(N),
    List(Vec<ChildAtom<N>>),
}

impl<N> Built<N> {
    /// The constructed node, if this result is a single node.
    pub fn as_node(&self) -> Option<&N> {
        match self {
            Built::Node(n) => Some(n),
            Built::List(_) => None,
        }
    }

    /// Consume into the constructed node, if single.
    pub fn into_node(self) -> Option<N> {
        match self {
            Built::Node(n) => Some(n),
            Built::List(_) => None,
        }
    }

    /// Consume into a flat atom list (a single node becomes one atom).
    pub fn into_atoms(self) -> Vec<ChildAtom<N>> {
        match self {
            Built::Node(n) => vec![ChildAtom::Node(n)],
            Built::List(atoms) => atoms,
        }
    }
}

// =============================================================================
// Tags
// =============================================================================

/// Component function: receives the props (children already normalized
/// inside) and returns a node or a list of nodes.
pub type Component<N> = Rc<dyn Fn(Props<N>) -> Built<N>>;

/// The tag of a descriptor: a node-kind name, an already-constructed
/// node passed through verbatim, or a component function.
#[derive(Clone)]
pub enum Tag<N> {
    /// Node-kind name ("div", "svg", ...). Namespace is decided by the
    /// engine at construction time.
    Name(Cow<'static, str>),
    /// Already-constructed node; returned unchanged.
    Node(N),
    /// Component function; the sole polymorphism point for components.
    Component(Component<N>),
}

impl<N> Tag<N> {
    /// Tag by node-kind name.
    pub fn name(name: impl Into<Cow<'static, str>>) -> Self {
        Tag::Name(name.into())
    }

    /// Tag by component function.
    pub fn component(f: impl Fn(Props<N>) -> Built<N> + 'static) -> Self {
        Tag::Component(Rc::new(f))
    }
}

impl<N> From<&'static str> for Tag<N> {
    fn from(name: &'static str) -> Self {
        Tag::Name(Cow::Borrowed(name))
    }
}

impl<N> fmt::Debug for Tag<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Name(n) => write!(f, "Name({n:?})"),
            Tag::Node(_) => write!(f, "Node(..)"),
            Tag::Component(_) => write!(f, "Component(..)"),
        }
    }
}

// =============================================================================
// Props
// =============================================================================

/// Attribute map plus normalized children.
///
/// The children invariant is structural: `children` is always a flat
/// top-level list. Setting children from a single value wraps it in a
/// one-element list; absence is the empty list. A literal `"children"`
/// key in the attribute map is reserved and ignored by the engine.
#[derive(Clone, Debug)]
pub struct Props<N> {
    /// Attributes in insertion order.
    pub attrs: IndexMap<String, AttrValue>,
    /// Normalized child list (top level only; nesting below is flattened
    /// by the engine).
    pub children: Vec<Child<N>>,
}

impl<N> Default for Props<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> Props<N> {
    pub fn new() -> Self {
        Self {
            attrs: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Set one attribute (builder style).
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Append one child (builder style).
    pub fn child(mut self, child: impl Into<Child<N>>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Replace the child list from a single value, normalizing it:
    /// a list stays a list, `Null` becomes empty, anything else becomes
    /// a one-element list.
    pub fn children(mut self, value: impl Into<Child<N>>) -> Self {
        self.children = match value.into() {
            Child::List(items) => items,
            Child::Null => Vec::new(),
            other => vec![other],
        };
        self
    }
}

// =============================================================================
// Number formatting
// =============================================================================

/// Format a float the way attribute text expects: integral values print
/// without a fractional part ("2", not "2.0").
pub(crate) fn format_float(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        x.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_normalization() {
        let single: Props<()> = Props::new().children("hello");
        assert_eq!(single.children.len(), 1);

        let absent: Props<()> = Props::new().children(Child::Null);
        assert!(absent.children.is_empty());

        let list: Props<()> =
            Props::new().children(Child::List(vec![Child::from("a"), Child::from("b")]));
        assert_eq!(list.children.len(), 2);
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(2.0), "2");
        assert_eq!(format_float(1.5), "1.5");
        assert_eq!(format_float(-3.0), "-3");
    }

    #[test]
    fn test_attr_value_from() {
        assert!(matches!(AttrValue::from(true), AttrValue::Bool(true)));
        assert!(matches!(AttrValue::from("x"), AttrValue::Text(_)));
        assert!(matches!(AttrValue::from(3i64), AttrValue::Int(3)));
    }
}
