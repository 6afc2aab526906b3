//! Turns in-document cross-references into servable paths

use crate::types::Node;
use crate::utils::encode_component;

/// Rewrite cross-references under `prefix`.
///
/// Anchors whose href starts with `#` point at `/<prefix>/<rest>`, and
/// `Node::Link` cross-references become anchors to `/<prefix>/<title>`. Every
/// other node is left untouched.
pub fn rewrite_internal_links(nodes: &mut [Node], prefix: &str) {
    let base = match prefix.trim_matches('/') {
        "" => String::new(),
        trimmed => format!("/{trimmed}"),
    };
    for node in nodes.iter_mut() {
        rewrite_node(node, &base);
    }
}

fn rewrite_node(node: &mut Node, base: &str) {
    match node {
        Node::Element {
            tag,
            attributes,
            children,
        } => {
            if tag == "a" {
                if let Some(href) = attributes.get_mut("href") {
                    if let Some(rest) = href.strip_prefix('#') {
                        *href = format!("{base}/{rest}");
                    }
                }
            }
            for child in children.iter_mut() {
                rewrite_node(child, base);
            }
        }
        Node::Link { target, children } => {
            let href = format!("{base}/{}", encode_component(target));
            let mut children = std::mem::take(children);
            for child in children.iter_mut() {
                rewrite_node(child, base);
            }
            *node = Node::element("a", children).with_attr("href", href);
        }
        Node::Text(_) | Node::Codeblock { .. } => {}
    }
}
