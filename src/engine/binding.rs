//! Attribute binding - shape classification decision table.
//!
//! Each attribute is classified exactly once into one binding:
//!
//! - `Listener` - name carries the event prefix, value is a handler
//! - `StyleMerge` - key/value pairs merged onto the node's style surface
//! - `Omitted` - `false` flags and values with no host representation
//! - `Plain` - everything else, written as attribute text
//!
//! Computed attributes are resolved here: invoked eagerly, exactly once,
//! and their result classified as a style merge (for the `style`
//! attribute) or a plain write. There is no re-invocation trigger, so a
//! lazy-per-access variant is deliberately not offered.

use tracing::debug;

use crate::types::{AttrValue, StyleMap, format_float};

use super::EngineConfig;

/// The reserved style attribute name.
pub const STYLE_ATTR: &str = "style";

// =============================================================================
// Binding
// =============================================================================

/// What the engine does with one classified attribute.
#[derive(Clone)]
pub enum Binding {
    /// Register an event listener (non-capturing).
    Listener {
        event: String,
        handler: crate::types::EventHandler,
    },
    /// Merge pairs onto the node's style surface.
    StyleMerge(StyleMap),
    /// Write nothing.
    Omitted,
    /// Write attribute text.
    Plain(String),
}

// =============================================================================
// Classification
// =============================================================================

/// Classify one attribute. `Null` values are skipped by the caller
/// before classification.
pub fn classify(config: &EngineConfig, name: &str, value: AttrValue) -> Binding {
    let prefix = config.event_prefix.as_ref();

    // Event listener: prefixed name with a handler value.
    let value = if name.len() > prefix.len() && name.starts_with(prefix) {
        match value {
            AttrValue::Handler(handler) => {
                return Binding::Listener {
                    event: name[prefix.len()..].to_lowercase(),
                    handler,
                };
            }
            other => other,
        }
    } else {
        value
    };

    match value {
        // Style map on the style attribute merges; under any other name
        // it falls through to a plain CSS-text write.
        AttrValue::Style(map) if name == STYLE_ATTR => Binding::StyleMerge(map),

        // Computed: eager, single evaluation, result applied now.
        AttrValue::Computed(f) => match f() {
            AttrValue::Style(map) if name == STYLE_ATTR => Binding::StyleMerge(map),
            result => match stringify(name, result) {
                Some(text) => Binding::Plain(text),
                None => Binding::Omitted,
            },
        },

        // Falsy flags are omitted, not written as "false".
        AttrValue::Bool(false) => Binding::Omitted,

        // A handler under a non-event name has no host representation.
        AttrValue::Handler(_) => {
            debug!(attribute = name, "dropping handler bound to a non-event attribute");
            Binding::Omitted
        }

        other => match stringify(name, other) {
            Some(text) => Binding::Plain(text),
            None => Binding::Omitted,
        },
    }
}

// =============================================================================
// Stringification
// =============================================================================

/// Attribute-text form of a value. None means the value cannot be
/// written (and the attribute is omitted).
fn stringify(name: &str, value: AttrValue) -> Option<String> {
    match value {
        AttrValue::Null => None,
        AttrValue::Bool(b) => Some(b.to_string()),
        AttrValue::Int(i) => Some(i.to_string()),
        AttrValue::Float(x) => Some(format_float(x)),
        AttrValue::Text(s) => Some(s),
        AttrValue::Style(map) => Some(css_text(&map)),
        AttrValue::List(items) => Some(flatten_attr_list(name, items).join(" ")),
        AttrValue::Handler(_) | AttrValue::Computed(_) => {
            debug!(attribute = name, "dropping function-valued attribute text");
            None
        }
    }
}

/// Flatten a nested attribute list fully, dropping `Null` entries.
/// Worklist form, same shape as child flattening.
fn flatten_attr_list(name: &str, items: Vec<AttrValue>) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack: Vec<AttrValue> = items.into_iter().rev().collect();
    while let Some(value) = stack.pop() {
        match value {
            AttrValue::List(inner) => stack.extend(inner.into_iter().rev()),
            AttrValue::Null => {}
            other => {
                if let Some(text) = stringify(name, other) {
                    out.push(text);
                }
            }
        }
    }
    out
}

/// CSS-text form of a style map ("color: red; width: 10px").
fn css_text(map: &StyleMap) -> String {
    map.iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join("; ")
}
