//! Caller-supplied canned diagrams selected by keyword.

use er_core::{Graph, fold_text};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub name: String,
    /// Matched as accent- and case-insensitive substrings of the prompt.
    pub keywords: Vec<String>,
    pub graph: Graph,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiagramCatalog {
    #[serde(default)]
    pub entries: Vec<CatalogEntry>,
}

impl DiagramCatalog {
    #[must_use]
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry, in catalog order, with a keyword contained in `prompt`.
    #[must_use]
    pub fn select(&self, prompt: &str) -> Option<&CatalogEntry> {
        let text = fold_text(prompt);
        self.entries.iter().find(|entry| {
            entry
                .keywords
                .iter()
                .map(|keyword| fold_text(keyword))
                .any(|keyword| !keyword.is_empty() && text.contains(&keyword))
        })
    }
}
