//! The prompt-to-graph fallback chain, driven by [`EngineConfig::strategies`].

use er_core::{EngineConfig, EngineError, Feedback, Graph, StrategyKind};
use er_intent::{IntentSet, extract_intents};
use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::DiagramCatalog;
use crate::mutator::apply_incremental_updates;
use crate::synth::{default_diagram, synthesize_dynamic, synthesize_relation_first};

/// A graph plus the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generation {
    pub strategy: StrategyKind,
    pub graph: Graph,
    pub feedback: Vec<Feedback>,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: EngineConfig,
    catalog: DiagramCatalog,
}

impl Pipeline {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            catalog: DiagramCatalog::default(),
        })
    }

    #[must_use]
    pub fn with_catalog(mut self, catalog: DiagramCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Walk the configured strategies until one yields a graph.
    ///
    /// Edits go to `graph` when it has content. Keyword diagrams and
    /// relation-first synthesis may replace it unless
    /// [`EngineConfig::preserve_graph`] is set; noun synthesis only runs
    /// without one, and `minimal` then hands the input back unchanged.
    /// `Ok(None)` means every strategy passed.
    ///
    /// Edges pointing at unknown nodes are dropped from the working copy;
    /// any other inconsistency in `graph` is an [`EngineError::InvalidGraph`].
    pub fn generate(&self, prompt: &str, graph: Option<&Graph>) -> Result<Option<Generation>, EngineError> {
        let graph = graph.map(prune_dangling_edges);
        if let Some(graph) = &graph {
            graph.validate()?;
        }
        let base = graph.as_ref().filter(|graph| !graph.is_empty());
        let intents = extract_intents(prompt);
        debug!(
            tables = intents.tables.len(),
            columns = intents.columns.len(),
            relations = intents.relations.len(),
            relation_intent = intents.relation_intent,
            "extracted intents"
        );

        for &strategy in &self.config.strategies {
            let Some((graph, feedback)) = self.run(strategy, prompt, &intents, base)? else {
                debug!(strategy = strategy.as_str(), "strategy passed");
                continue;
            };
            info!(
                strategy = strategy.as_str(),
                nodes = graph.nodes.len(),
                edges = graph.edges.len(),
                "generated graph"
            );
            return Ok(Some(Generation {
                strategy,
                graph,
                feedback,
            }));
        }
        Ok(None)
    }

    fn run(
        &self,
        strategy: StrategyKind,
        prompt: &str,
        intents: &IntentSet,
        base: Option<&Graph>,
    ) -> Result<Option<(Graph, Vec<Feedback>)>, EngineError> {
        let fresh = base.is_none();
        let replaceable = fresh || !self.config.preserve_graph;
        let outcome = match strategy {
            StrategyKind::Incremental => return self.run_incremental(intents, base),
            StrategyKind::Catalog if replaceable => self
                .catalog
                .select(prompt)
                .map(|entry| entry.graph.clone()),
            StrategyKind::RelationFirst if replaceable => {
                synthesize_relation_first(&intents.relations, &self.config.incremental_grid)
            }
            StrategyKind::Dynamic if fresh && !intents.is_actionable() => synthesize_dynamic(
                prompt,
                self.config.max_dynamic_entities,
                &self.config.dynamic_grid,
            ),
            StrategyKind::Minimal => {
                Some(base.cloned().unwrap_or_else(|| default_diagram(prompt)))
            }
            StrategyKind::Catalog | StrategyKind::RelationFirst | StrategyKind::Dynamic => None,
        };
        Ok(outcome.map(|graph| (graph, Vec::new())))
    }

    fn run_incremental(
        &self,
        intents: &IntentSet,
        base: Option<&Graph>,
    ) -> Result<Option<(Graph, Vec<Feedback>)>, EngineError> {
        let grid = &self.config.incremental_grid;
        let Some(base) = base else {
            // Without a graph only real edits count; cardinality edits fall
            // through to relation-first, which creates what they name.
            return match apply_incremental_updates(intents, &Graph::default(), grid) {
                Ok(Some(report)) if report.changed => Ok(Some((report.graph, report.feedback))),
                Ok(_) | Err(EngineError::MissingRelation { .. }) => Ok(None),
                Err(error) => Err(error),
            };
        };
        Ok(apply_incremental_updates(intents, base, grid)?
            .map(|report| (report.graph, report.feedback)))
    }
}

/// A copy of `graph` without edges whose source or target is not a node.
fn prune_dangling_edges(graph: &Graph) -> Graph {
    let mut pruned = graph.clone();
    let ids: FxHashSet<&str> = graph.nodes.iter().map(|node| node.id.as_str()).collect();
    pruned.edges.retain(|edge| {
        let known = ids.contains(edge.source.as_str()) && ids.contains(edge.target.as_str());
        if !known {
            warn!(
                edge = %edge.id,
                source = %edge.source,
                target = %edge.target,
                "dropping edge with an unknown endpoint"
            );
        }
        known
    });
    pruned
}
