use std::collections::BTreeMap;
use std::fmt;

use crate::ser::key::KeyPath;

use super::parse::IntermediateNode;

/// The canonical form of a parsed querystring subtree.
///
/// - `Leaf`: the values given for a key with no further selectors,
///   e.g. `a=1` or `a=1&a=2`
/// - `Array`: children keyed only by `[]` or only by numeric indices
/// - `Map`: children keyed by anything else, sorted by key
#[derive(Clone, PartialEq)]
pub(crate) enum CompactNode {
    Leaf(Vec<String>),
    Array(Vec<CompactNode>),
    Map(BTreeMap<String, CompactNode>),
}

impl CompactNode {
    /// The single value of a leaf, if that is what this node is.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            CompactNode::Leaf(values) if values.len() == 1 => Some(&values[0]),
            _ => None,
        }
    }

    /// A leaf holding only the empty string, as written for empty lists,
    /// empty maps and absent values.
    pub fn is_empty_sentinel(&self) -> bool {
        self.as_single() == Some("")
    }

    /// Short description of the node used in error messages.
    pub fn describe(&self) -> String {
        match self {
            CompactNode::Leaf(values) if values.len() == 1 => values[0].clone(),
            CompactNode::Leaf(values) => values.join(","),
            CompactNode::Array(items) => format!("array of {} elements", items.len()),
            CompactNode::Map(_) => "map".to_string(),
        }
    }
}

impl fmt::Debug for CompactNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompactNode::Leaf(values) => f.debug_tuple("Leaf").field(values).finish(),
            CompactNode::Array(items) => f.debug_list().entries(items.iter()).finish(),
            CompactNode::Map(map) => f.debug_map().entries(map.iter()).finish(),
        }
    }
}

/// Compacts the children of the root node.
///
/// Root keys always form a map, even when they all look like indices.
pub(crate) fn compact_root(root: IntermediateNode) -> BTreeMap<String, CompactNode> {
    let mut path = KeyPath::new();
    let compacted = root
        .children
        .into_iter()
        .map(|(key, node)| {
            path.push(&key);
            let node = compact(node, &mut path);
            path.pop();
            (key, node)
        })
        .collect();

    #[cfg(feature = "debug_parsed")]
    tracing::trace!(tree = ?compacted, "compacted querystring");

    compacted
}

fn compact(node: IntermediateNode, path: &mut KeyPath) -> CompactNode {
    if node.is_leaf() {
        return CompactNode::Leaf(node.values);
    }
    if !node.values.is_empty() {
        tracing::debug!(
            key = path.as_str(),
            discarded = ?node.values,
            "key holds both a value and nested keys; keeping the nested keys"
        );
    }

    let children = node.children;
    if children.keys().all(|k| k.is_empty()) {
        // only `[]` selectors: a single child holding every appended value
        return CompactNode::Array(
            children
                .into_iter()
                .flat_map(|(key, child)| {
                    path.push(&key);
                    let items = if child.is_leaf() {
                        child
                            .values
                            .into_iter()
                            .map(|v| CompactNode::Leaf(vec![v]))
                            .collect()
                    } else {
                        vec![compact(child, path)]
                    };
                    path.pop();
                    items
                })
                .collect(),
        );
    }

    if children.keys().all(|k| parse_index(k).is_some()) {
        let mut indexed = BTreeMap::new();
        for (key, child) in children {
            path.push(&key);
            let index = parse_index(&key).unwrap_or_default();
            if indexed.insert(index, compact(child, path)).is_some() {
                tracing::debug!(key = path.as_str(), index, "duplicate index overwrites earlier element");
            }
            path.pop();
        }
        return CompactNode::Array(indexed.into_values().collect());
    }

    CompactNode::Map(
        children
            .into_iter()
            .map(|(key, child)| {
                path.push(&key);
                let node = compact(child, path);
                path.pop();
                (key, node)
            })
            .collect(),
    )
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Non-negative base-10 integer selectors, e.g. `0` or `007`.
fn parse_index(selector: &str) -> Option<usize> {
    if !is_digits(selector) {
        return None;
    }
    selector.parse().ok()
}

/// Base-10 integer selectors that may be negative, e.g. `-1` or `7`.
/// A leading `+` is not accepted, the same as for [`parse_index`].
pub(crate) fn parse_integer_key(selector: &str) -> Option<i64> {
    let digits = selector.strip_prefix('-').unwrap_or(selector);
    if !is_digits(digits) {
        return None;
    }
    selector.parse().ok()
}
