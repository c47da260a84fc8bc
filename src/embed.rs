//! Partial substitution helpers.
//!
//! Two concerns of embedding that don't need the compiler's state:
//!
//! - `data-ham-replace` directives. The value `key:value,key2:value2` turns
//!   into pairs, and every literal `__key__` in the embedded content is
//!   replaced with its value before splicing.
//! - Cycle detection over the embed graph, so `a.html -> b.html -> a.html`
//!   is reported as an error instead of spinning until the pass limit.

use log::warn;
use std::collections::HashSet;
use std::hash::Hash;

/// Parse a `data-ham-replace` value into `(key, value)` pairs.
///
/// Keys and values are trimmed. Entries without a `:` are skipped with a
/// warning; only the first `:` splits, so values may contain colons.
pub fn parse_replace(directive: &str) -> Vec<(String, String)> {
    directive
        .split(',')
        .filter(|entry| !entry.trim().is_empty())
        .filter_map(|entry| match entry.split_once(':') {
            Some((key, value)) => Some((key.trim().to_string(), value.trim().to_string())),
            None => {
                warn!("ignoring replace entry without ':': {:?}", entry.trim());
                None
            }
        })
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

/// Replace every `__key__` in `content` with its value, in pair order.
pub fn apply_replacements(content: &str, pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .fold(content.to_string(), |acc, (key, value)| {
            acc.replace(&format!("__{}__", key), value)
        })
}

/// Depth-first search for a cycle reachable from `roots`.
///
/// `children` yields the direct successors of a node. Returns the first cycle
/// found as a path that starts and ends with the repeated node, e.g.
/// `[a, b, a]`. Nodes already fully explored are not revisited, so shared
/// partials (a diamond) are not cycles.
pub fn find_cycle<N, F>(roots: &[N], mut children: F) -> Option<Vec<N>>
where
    N: Clone + Eq + Hash,
    F: FnMut(&N) -> Vec<N>,
{
    let mut done = HashSet::new();
    let mut path = Vec::new();
    for root in roots {
        if let Some(cycle) = visit(root, &mut children, &mut path, &mut done) {
            return Some(cycle);
        }
    }
    None
}

fn visit<N, F>(node: &N, children: &mut F, path: &mut Vec<N>, done: &mut HashSet<N>) -> Option<Vec<N>>
where
    N: Clone + Eq + Hash,
    F: FnMut(&N) -> Vec<N>,
{
    if done.contains(node) {
        return None;
    }
    if let Some(start) = path.iter().position(|n| n == node) {
        let mut cycle = path[start..].to_vec();
        cycle.push(node.clone());
        return Some(cycle);
    }

    path.push(node.clone());
    for child in children(node) {
        if let Some(cycle) = visit(&child, children, path, done) {
            return Some(cycle);
        }
    }
    path.pop();
    done.insert(node.clone());
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // =========================================================================
    // Replace directives
    // =========================================================================

    #[test]
    fn parse_replace_trims_entries() {
        assert_eq!(
            parse_replace(" title : Welcome , color:red"),
            pairs(&[("title", "Welcome"), ("color", "red")])
        );
    }

    #[test]
    fn parse_replace_splits_on_first_colon() {
        assert_eq!(
            parse_replace("href:https://example.com"),
            pairs(&[("href", "https://example.com")])
        );
    }

    #[test]
    fn parse_replace_skips_malformed_entries() {
        assert_eq!(
            parse_replace("oops,k:v,,:orphan"),
            pairs(&[("k", "v")])
        );
        assert!(parse_replace("").is_empty());
    }

    #[test]
    fn apply_replacements_replaces_every_occurrence() {
        let out = apply_replacements(
            "<h1>__title__</h1><title>__title__</title><p>__missing__</p>",
            &pairs(&[("title", "Hi")]),
        );
        assert_eq!(out, "<h1>Hi</h1><title>Hi</title><p>__missing__</p>");
    }

    #[test]
    fn apply_replacements_without_pairs_is_identity() {
        assert_eq!(apply_replacements("__a__", &[]), "__a__");
    }

    // =========================================================================
    // Cycle detection
    // =========================================================================

    fn graph(edges: &[(&'static str, &'static str)]) -> HashMap<&'static str, Vec<&'static str>> {
        let mut g: HashMap<&str, Vec<&str>> = HashMap::new();
        for &(from, to) in edges {
            g.entry(from).or_default().push(to);
        }
        g
    }

    #[test]
    fn two_node_cycle_is_reported_as_chain() {
        let g = graph(&[("page", "a"), ("a", "b"), ("b", "a")]);
        let cycle = find_cycle(&["page"], |n| g.get(n).cloned().unwrap_or_default());
        assert_eq!(cycle, Some(vec!["a", "b", "a"]));
    }

    #[test]
    fn self_embed_is_a_cycle() {
        let g = graph(&[("a", "a")]);
        let cycle = find_cycle(&["a"], |n| g.get(n).cloned().unwrap_or_default());
        assert_eq!(cycle, Some(vec!["a", "a"]));
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let g = graph(&[("p", "a"), ("p", "b"), ("a", "shared"), ("b", "shared")]);
        let mut expanded = Vec::new();
        let cycle = find_cycle(&["p"], |n| {
            expanded.push(*n);
            g.get(n).cloned().unwrap_or_default()
        });
        assert_eq!(cycle, None);
        assert_eq!(expanded.iter().filter(|n| **n == "shared").count(), 1);
    }

    #[test]
    fn deep_chain_without_cycle() {
        let g = graph(&[("a", "b"), ("b", "c"), ("c", "d")]);
        assert_eq!(
            find_cycle(&["a"], |n| g.get(n).cloned().unwrap_or_default()),
            None
        );
    }

    #[test]
    fn cycle_reachable_from_second_root() {
        let g = graph(&[("x", "y"), ("y", "x")]);
        let cycle = find_cycle(&["leaf", "x"], |n| g.get(n).cloned().unwrap_or_default());
        assert_eq!(cycle, Some(vec!["x", "y", "x"]));
    }
}
