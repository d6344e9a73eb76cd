//! Name-to-node lookup over node labels and their morphological variants.

use er_core::{Node, normalize_token, pluralize_word, singularize_word, slugify};
use rustc_hash::FxHashMap;

/// Lookup keys for a label or a table name: the bare token, its singular,
/// the plural of that singular, and the slug without hyphens.
#[must_use]
pub fn lookup_keys(name: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::with_capacity(4);
    let normalized = normalize_token(name);
    if !normalized.is_empty() {
        let singular = singularize_word(&normalized);
        let plural = pluralize_word(&singular);
        keys.extend([normalized, singular, plural]);
    }
    keys.push(slugify(name, "").replace('-', ""));
    let mut unique: Vec<String> = Vec::with_capacity(keys.len());
    for key in keys {
        if !key.is_empty() && !unique.contains(&key) {
            unique.push(key);
        }
    }
    unique
}

/// Maps lookup keys to indexes into a node list.
#[derive(Debug, Clone, Default)]
pub struct LabelLookup {
    index: FxHashMap<String, usize>,
}

impl LabelLookup {
    /// Index existing nodes; when two labels share a key the earlier node wins.
    #[must_use]
    pub fn build(nodes: &[Node]) -> Self {
        let mut lookup = Self::default();
        for (position, node) in nodes.iter().enumerate() {
            for key in lookup_keys(node.label()) {
                lookup.index.entry(key).or_insert(position);
            }
        }
        lookup
    }

    /// Index a freshly created node, taking over any keys it shares.
    pub fn register(&mut self, label: &str, position: usize) {
        for key in lookup_keys(label) {
            self.index.insert(key, position);
        }
    }

    /// First node whose keys intersect the keys of `name`.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<usize> {
        lookup_keys(name)
            .iter()
            .find_map(|key| self.index.get(key).copied())
    }
}
