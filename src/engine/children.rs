//! Child flattening - worklist flatten over unbounded nesting.
//!
//! Descriptors nest children arbitrarily deep (`[[a, [b]], c]`); the
//! engine appends them as one flat, ordered sequence. The flatten here
//! is an explicit stack, not recursion, so descriptor depth never
//! threatens the call stack. Per item: unwrap a build-result wrapper to
//! its atoms, keep real nodes, strings, and numbers, drop everything
//! else (null and boolean placeholders from conditional rendering).

use crate::types::{Built, Child, ChildAtom};

/// Flatten a child list fully, in document order.
pub fn flatten<N>(children: Vec<Child<N>>) -> Vec<ChildAtom<N>> {
    let mut out = Vec::new();
    let mut stack: Vec<Child<N>> = Vec::new();
    // pushed in reverse so pops preserve document order
    stack.extend(children.into_iter().rev());

    while let Some(item) = stack.pop() {
        match item {
            Child::List(items) => stack.extend(items.into_iter().rev()),
            Child::Built(Built::Node(node)) => out.push(ChildAtom::Node(node)),
            Child::Built(Built::List(atoms)) => out.extend(atoms),
            Child::Node(node) => out.push(ChildAtom::Node(node)),
            Child::Text(text) => out.push(ChildAtom::Text(text)),
            Child::Int(i) => out.push(ChildAtom::Int(i)),
            Child::Float(x) => out.push(ChildAtom::Float(x)),
            Child::Null | Child::Bool(_) => {}
        }
    }
    out
}
