use std::fmt;

use indexmap::IndexMap;

use crate::error::{Error, Result};

mod decode;

pub(crate) use decode::decode_str;

/// A node of the tree built from the flat keys of a querystring, before
/// any decision is made about whether its children form a list or a map.
///
/// `children` keeps selectors in first-seen order. A node normally ends up
/// either holding values (a leaf) or holding children (a branch); when both
/// are present the keys collided, e.g. `a=1&a[b]=2`, and compaction decides
/// which side survives.
#[derive(Default, PartialEq)]
pub(crate) struct IntermediateNode {
    pub values: Vec<String>,
    pub children: IndexMap<String, IntermediateNode>,
}

impl IntermediateNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl fmt::Debug for IntermediateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.children.is_empty() {
            f.debug_list().entries(self.values.iter()).finish()
        } else if self.values.is_empty() {
            f.debug_map().entries(self.children.iter()).finish()
        } else {
            f.debug_struct("Conflict")
                .field("values", &self.values)
                .field("children", &self.children)
                .finish()
        }
    }
}

/// Splits a flat key into its path segments.
///
/// `a[b][0]` becomes `["a", "b", "0"]`. Every segment after the root has a
/// single trailing `]` removed if present. Brackets are not checked for
/// balance: `a[b` yields `["a", "b"]` and `a]b` is a plain root key.
pub(crate) fn split_key(flat_key: &str) -> Vec<&str> {
    let mut segments = flat_key.split('[');
    let root = segments.next().unwrap_or_default();
    std::iter::once(root)
        .chain(segments.map(|s| s.strip_suffix(']').unwrap_or(s)))
        .collect()
}

/// Accumulates `(path, value)` insertions into an `IntermediateNode` tree.
///
/// The root node itself never holds values; its children are the root keys.
pub(crate) struct TreeBuilder {
    root: IntermediateNode,
    max_depth: usize,
}

impl TreeBuilder {
    pub fn new(config: crate::Config) -> Self {
        TreeBuilder {
            root: IntermediateNode::default(),
            max_depth: config.max_depth,
        }
    }

    /// Inserts a decoded `flat_key=value` pair.
    pub fn insert_pair(&mut self, flat_key: &str, value: String) -> Result<()> {
        let path = split_key(flat_key);
        let depth = path.len() - 1;
        if depth > self.max_depth {
            tracing::debug!(key = flat_key, depth, max_depth = self.max_depth, "rejecting nested key");
            return Err(Error::DepthLimitExceeded {
                key: flat_key.to_string(),
                max_depth: self.max_depth,
            });
        }
        self.insert(&path, std::iter::once(value));
        Ok(())
    }

    /// Descends `path`, creating missing nodes, and appends `values` to the
    /// node at its end.
    pub fn insert<I>(&mut self, path: &[&str], values: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut node = &mut self.root;
        for segment in path {
            node = node.children.entry((*segment).to_string()).or_default();
        }
        node.values.extend(values);
    }

    pub fn finish(self) -> IntermediateNode {
        self.root
    }
}

/// Parses an encoded querystring into its intermediate tree.
///
/// Pairs are separated by `&`, empty segments are skipped and a segment
/// without `=` carries the empty value. Keys and values are unescaped
/// before the key is split into selectors, so `a%5Bb%5D=1` and `a[b]=1`
/// describe the same path.
pub(crate) fn parse(input: &[u8], config: crate::Config) -> Result<IntermediateNode> {
    let mut builder = TreeBuilder::new(config);
    for segment in input.split(|&b| b == b'&') {
        if segment.is_empty() {
            continue;
        }
        let (key, value) = match segment.iter().position(|&b| b == b'=') {
            Some(idx) => (&segment[..idx], &segment[idx + 1..]),
            None => (segment, &b""[..]),
        };
        let key = decode_str(key)?;
        let value = decode_str(value)?;
        builder.insert_pair(&key, value.into_owned())?;
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{parse, split_key, IntermediateNode, TreeBuilder};
    use crate::{Config, Error};

    fn leaf(values: &[&str]) -> IntermediateNode {
        IntermediateNode {
            values: values.iter().map(|v| v.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn split_plain_key() {
        assert_eq!(split_key("abc"), vec!["abc"]);
        assert_eq!(split_key(""), vec![""]);
    }

    #[test]
    fn split_nested_key() {
        assert_eq!(split_key("a[b][0]"), vec!["a", "b", "0"]);
        assert_eq!(split_key("a[]"), vec!["a", ""]);
        assert_eq!(split_key("a[][x]"), vec!["a", "", "x"]);
    }

    #[test]
    fn split_malformed_key_is_lenient() {
        assert_eq!(split_key("a[b"), vec!["a", "b"]);
        assert_eq!(split_key("a]"), vec!["a]"]);
        assert_eq!(split_key("a[b]]"), vec!["a", "b]"]);
        assert_eq!(split_key("a[[b]"), vec!["a", "", "b"]);
    }

    #[test]
    fn builder_appends_repeated_values() {
        let mut builder = TreeBuilder::new(Config::default());
        builder.insert(&["a", "b"], ["1".to_string()]);
        builder.insert(&["a", "b"], ["2".to_string()]);
        builder.insert(&["a", "c"], ["3".to_string()]);
        let root = builder.finish();

        let a = &root.children["a"];
        assert!(a.values.is_empty());
        assert_eq!(a.children["b"], leaf(&["1", "2"]));
        assert_eq!(a.children["c"], leaf(&["3"]));
    }

    #[test]
    fn builder_keeps_first_seen_order() {
        let root = parse(b"z=1&a=2&m=3", Config::default()).unwrap();
        let keys: Vec<_> = root.children.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn parse_empty() {
        let root = parse(b"", Config::default()).unwrap();
        assert!(root.children.is_empty());
    }

    #[test]
    fn parse_skips_empty_segments() {
        let root = parse(b"&&a=1&", Config::default()).unwrap();
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children["a"], leaf(&["1"]));
    }

    #[test]
    fn parse_key_without_value() {
        let root = parse(b"flag&x=", Config::default()).unwrap();
        assert_eq!(root.children["flag"], leaf(&[""]));
        assert_eq!(root.children["x"], leaf(&[""]));
    }

    #[test]
    fn parse_value_keeps_later_equals() {
        let root = parse(b"a=b=c", Config::default()).unwrap();
        assert_eq!(root.children["a"], leaf(&["b=c"]));
    }

    #[test]
    fn parse_encoded_brackets() {
        let root = parse(b"abc%5Bdef%5D=ghi+jkl", Config::default()).unwrap();
        assert_eq!(root.children["abc"].children["def"], leaf(&["ghi jkl"]));
    }

    #[test]
    fn parse_conflict_keeps_both_sides() {
        let root = parse(b"a=1&a[b]=2", Config::default()).unwrap();
        let a = &root.children["a"];
        assert_eq!(a.values, vec!["1"]);
        assert_eq!(a.children["b"], leaf(&["2"]));
    }

    #[test]
    fn parse_max_depth() {
        let config = Config::new().max_depth(2);
        assert!(parse(b"a[b][c]=1", config).is_ok());

        let err = parse(b"a[b][c][d]=1", config).unwrap_err();
        assert!(
            matches!(err, Error::DepthLimitExceeded { ref key, max_depth: 2 } if key == "a[b][c][d]"),
            "got: {err:?}"
        );
    }

    #[test]
    fn parse_invalid_utf8() {
        let err = parse(b"a=%FF", Config::default()).unwrap_err();
        assert!(matches!(err, Error::Utf8(_)), "got: {err:?}");
    }
}
