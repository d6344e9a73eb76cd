//! Engine configuration: fallback policy order, synthesis caps and grid layouts.

use serde::{Deserialize, Serialize};

use crate::{EngineError, Position};

/// One step of the prompt-to-graph fallback chain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Explicit add-table / add-column / relation edits applied to the input graph.
    Incremental,
    /// Caller-supplied diagrams selected by keyword.
    Catalog,
    /// A fresh graph built from relation phrases alone.
    RelationFirst,
    /// A fresh graph built from candidate nouns in free text.
    Dynamic,
    /// Usuario/Post starter diagram.
    Minimal,
}

impl StrategyKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Incremental => "incremental",
            Self::Catalog => "catalog",
            Self::RelationFirst => "relation-first",
            Self::Dynamic => "dynamic",
            Self::Minimal => "minimal",
        }
    }
}

/// Row-major grid used to place nodes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GridLayout {
    pub columns: usize,
    pub origin_x: f64,
    pub origin_y: f64,
    pub step_x: f64,
    pub step_y: f64,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            columns: 4,
            origin_x: 160.0,
            origin_y: 140.0,
            step_x: 280.0,
            step_y: 220.0,
        }
    }
}

impl GridLayout {
    #[must_use]
    pub fn position(&self, index: usize) -> Position {
        let columns = self.columns.max(1);
        Position::new(
            self.origin_x + (index % columns) as f64 * self.step_x,
            self.origin_y + (index / columns) as f64 * self.step_y,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on nouns the dynamic synthesizer turns into nodes.
    pub max_dynamic_entities: usize,
    /// Strategies tried in order until one produces a graph.
    pub strategies: Vec<StrategyKind>,
    /// Placement of nodes created while editing an existing graph.
    pub incremental_grid: GridLayout,
    /// Placement of nodes in a synthesized graph.
    pub dynamic_grid: GridLayout,
    /// Keep a supplied non-empty graph: keyword diagrams and relation-first
    /// synthesis then only run when no graph is given.
    pub preserve_graph: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_dynamic_entities: 8,
            strategies: vec![
                StrategyKind::Incremental,
                StrategyKind::Catalog,
                StrategyKind::RelationFirst,
                StrategyKind::Dynamic,
                StrategyKind::Minimal,
            ],
            incremental_grid: GridLayout::default(),
            dynamic_grid: GridLayout {
                columns: 3,
                step_x: 260.0,
                ..GridLayout::default()
            },
            preserve_graph: false,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.strategies.is_empty() {
            return Err(config_error("at least one strategy is required"));
        }
        for (index, strategy) in self.strategies.iter().enumerate() {
            if self.strategies[..index].contains(strategy) {
                return Err(config_error(format!(
                    "strategy '{}' is listed more than once",
                    strategy.as_str()
                )));
            }
        }
        if self.max_dynamic_entities < 2 {
            return Err(config_error("max_dynamic_entities must be at least 2"));
        }
        if self.incremental_grid.columns == 0 || self.dynamic_grid.columns == 0 {
            return Err(config_error("grid layouts need at least one column"));
        }
        Ok(())
    }
}

fn config_error(message: impl Into<String>) -> EngineError {
    EngineError::Config {
        message: message.into(),
    }
}
