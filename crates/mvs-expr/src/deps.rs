//! Static extraction of the data paths an expression reads.
//!
//! A [`Node::Path`] contributes the dotted join of its step names. Its
//! predicates are evaluated relative to each item, not to the context root, so
//! they are not walked. Every other node is walked recursively.

use crate::ast::Node;

/// Collect the distinct data paths referenced by `node`, in first-seen order.
pub fn dependency_paths(node: &Node) -> Vec<String> {
    let mut names = Vec::new();
    collect(node, &mut names);
    names
}

fn collect(node: &Node, names: &mut Vec<String>) {
    match node {
        Node::Path(steps) => {
            let path = steps
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join(".");
            if !names.contains(&path) {
                names.push(path);
            }
        }
        Node::Literal(_) | Node::Context => {}
        Node::Unary { operand, .. } => collect(operand, names),
        Node::Binary { lhs, rhs, .. } => {
            collect(lhs, names);
            collect(rhs, names);
        }
        Node::Condition {
            test,
            then,
            otherwise,
        } => {
            collect(test, names);
            collect(then, names);
            if let Some(o) = otherwise {
                collect(o, names);
            }
        }
        Node::Call { arguments, .. } => arguments.iter().for_each(|a| collect(a, names)),
        Node::Array(items) => items.iter().for_each(|i| collect(i, names)),
        Node::Filter { base, predicate } => {
            collect(base, names);
            collect(predicate, names);
        }
    }
}
