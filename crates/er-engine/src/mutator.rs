//! Applies extracted intents to a working copy of a graph.
//!
//! The caller's graph is never touched: [`apply_incremental_updates`] clones
//! it, mutates the clone, and hands the clone back only when the whole batch
//! succeeded. A missing relation aborts the batch with no partial result.

use er_core::{
    Column, DEFAULT_COLUMN_TYPE, Edge, EngineError, Feedback, Graph, GridLayout, Multiplicity,
    Node, RelationKind, TablePair, build_base_columns, categorize_entity, normalize_token, slugify,
    titleize, to_snake_case,
};
use er_intent::{IntentSet, RelationAction};
use serde::Serialize;
use tracing::{debug, warn};

use crate::resolver::LabelLookup;

/// Outcome of [`add_column_to_node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnStatus {
    Added,
    /// The node already has a column with the same key or snake_case name.
    Duplicate,
    /// The requested name has no alphanumeric content.
    Invalid,
}

/// `base`, or `base-2`, `base-3`, ... whichever is not taken.
pub(crate) fn unique_id(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|suffix| format!("{base}-{suffix}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Append a `VARCHAR(120)` nullable column named after `column_name`.
pub fn add_column_to_node(node: &mut Node, column_name: &str) -> ColumnStatus {
    let key = normalize_token(column_name);
    if key.is_empty() {
        return ColumnStatus::Invalid;
    }
    let snake = to_snake_case(column_name);
    let columns = &node.data.columns;
    if columns
        .iter()
        .any(|column| normalize_token(&column.name) == key || to_snake_case(&column.name) == snake)
    {
        return ColumnStatus::Duplicate;
    }

    let base = format!("{}-{}", node.id, slugify(column_name, &key));
    let id = unique_id(&base, |candidate| columns.iter().any(|column| column.id == candidate));
    node.data
        .columns
        .push(Column::new(id, snake, DEFAULT_COLUMN_TYPE, true));
    ColumnStatus::Added
}

/// Append a node for `table_name` with its category's starter columns and
/// return its index.
pub fn create_node_with_defaults(table_name: &str, nodes: &mut Vec<Node>, grid: &GridLayout) -> usize {
    let slug = slugify(table_name, &format!("tabla-{}", nodes.len() + 1));
    let category = categorize_entity(&normalize_token(table_name));

    let id = unique_id(&format!("node-{slug}"), |candidate| {
        nodes.iter().any(|node| node.id == candidate)
    });
    debug!(table = table_name, node = %id, category = category.as_str(), "creating node");
    let node = Node::new(
        id,
        titleize(table_name),
        build_base_columns(&slug, category),
        grid.position(nodes.len()),
    );
    nodes.push(node);
    nodes.len() - 1
}

/// Resolve `name` against `lookup`, creating (and registering) a node when
/// nothing matches. Returns the node index and whether it was created.
pub(crate) fn resolve_or_create(
    graph: &mut Graph,
    lookup: &mut LabelLookup,
    name: &str,
    grid: &GridLayout,
) -> (usize, bool) {
    if let Some(index) = lookup.resolve(name) {
        debug!(table = name, node = %graph.nodes[index].id, "resolved table");
        return (index, false);
    }
    let index = create_node_with_defaults(name, &mut graph.nodes, grid);
    lookup.register(&graph.nodes[index].data.label, index);
    (index, true)
}

/// Create or update the single edge between `source_id` and `target_id`.
///
/// An existing edge in either direction is re-pointed to
/// `source_id -> target_id`; fields the action leaves unset keep their
/// current values (cardinalities follow their node when the edge flips).
/// Returns whether anything changed.
pub fn upsert_relation_edge(
    graph: &mut Graph,
    source_id: &str,
    target_id: &str,
    action: &RelationAction,
    allow_create: bool,
) -> bool {
    if let Some((index, reversed)) = graph.find_edge_between(source_id, target_id) {
        let edge = &mut graph.edges[index];
        let (current_source, current_target) = if reversed {
            (edge.data.target_mult, edge.data.source_mult)
        } else {
            (edge.data.source_mult, edge.data.target_mult)
        };
        let kind = action.kind.or(edge.data.kind).unwrap_or_default();
        let source_mult = action
            .source_mult
            .or(current_source)
            .unwrap_or(Multiplicity::One);
        let target_mult = action
            .target_mult
            .or(current_target)
            .unwrap_or(Multiplicity::Many);

        let mut changed = false;
        changed |= set_if_changed(&mut edge.source, source_id.to_string());
        changed |= set_if_changed(&mut edge.target, target_id.to_string());
        changed |= set_if_changed(&mut edge.data.id, edge.id.clone());
        changed |= set_if_changed(&mut edge.data.source, source_id.to_string());
        changed |= set_if_changed(&mut edge.data.target, target_id.to_string());
        changed |= set_if_changed(&mut edge.data.kind, Some(kind));
        changed |= set_if_changed(&mut edge.data.source_mult, Some(source_mult));
        changed |= set_if_changed(&mut edge.data.target_mult, Some(target_mult));
        if let Some(label) = &action.label {
            changed |= set_if_changed(&mut edge.label, Some(label.clone()));
            changed |= set_if_changed(&mut edge.data.label, Some(label.clone()));
        }
        return changed;
    }

    if !allow_create {
        return false;
    }
    let id = unique_id(&format!("edge-{source_id}-{target_id}"), |candidate| {
        graph.edges.iter().any(|edge| edge.id == candidate)
    });
    debug!(edge = %id, source = source_id, target = target_id, "creating edge");
    graph.edges.push(Edge::new(
        id,
        source_id,
        target_id,
        action.kind.unwrap_or(RelationKind::Simple),
        action.source_mult.unwrap_or(Multiplicity::One),
        action.target_mult.unwrap_or(Multiplicity::Many),
        action.label.clone().unwrap_or_default(),
    ));
    true
}

fn set_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

/// Result of a successful incremental batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateReport {
    pub graph: Graph,
    pub feedback: Vec<Feedback>,
    /// `false` when the graph is returned unchanged only to carry feedback.
    pub changed: bool,
}

/// Apply every intent to a copy of `graph`.
///
/// Returns `Ok(None)` when nothing changed and there is nothing to report,
/// and [`EngineError::MissingRelation`] when a cardinality-only edit names
/// tables that are missing or not yet related.
pub fn apply_incremental_updates(
    intents: &IntentSet,
    graph: &Graph,
    grid: &GridLayout,
) -> Result<Option<UpdateReport>, EngineError> {
    if !intents.is_actionable() {
        if intents.relation_intent {
            return Ok(Some(UpdateReport {
                graph: graph.clone(),
                feedback: vec![Feedback::RelationIntent],
                changed: false,
            }));
        }
        return Ok(None);
    }

    let mut working = graph.clone();
    let mut lookup = LabelLookup::build(&working.nodes);
    let mut feedback = Vec::new();
    let mut missing = Vec::new();
    let mut mutated = false;

    for action in &intents.tables {
        let (index, created) = resolve_or_create(&mut working, &mut lookup, &action.table, grid);
        mutated |= created;
        for attribute in &action.attributes {
            mutated |= record_column(&mut working.nodes[index], &action.table, attribute, &mut feedback);
        }
    }

    for action in &intents.columns {
        let (index, created) = resolve_or_create(&mut working, &mut lookup, &action.table, grid);
        mutated |= created;
        mutated |= record_column(&mut working.nodes[index], &action.table, &action.column, &mut feedback);
    }

    for action in &intents.relations {
        let allow_create = action.allows_create();
        let mut endpoints = [None, None];
        for (slot, name) in endpoints.iter_mut().zip([&action.source, &action.target]) {
            *slot = if allow_create {
                let (index, created) = resolve_or_create(&mut working, &mut lookup, name, grid);
                mutated |= created;
                Some(index)
            } else {
                lookup.resolve(name)
            };
        }
        let [Some(source), Some(target)] = endpoints else {
            missing.push(TablePair::new(action.source.clone(), action.target.clone()));
            continue;
        };

        let source_id = working.nodes[source].id.clone();
        let target_id = working.nodes[target].id.clone();
        if !allow_create && working.find_edge_between(&source_id, &target_id).is_none() {
            missing.push(TablePair::new(action.source.clone(), action.target.clone()));
            continue;
        }
        if upsert_relation_edge(&mut working, &source_id, &target_id, action, allow_create) {
            mutated = true;
        } else {
            feedback.push(Feedback::UnchangedRelation {
                source: action.source.clone(),
                target: action.target.clone(),
            });
        }
    }

    if !missing.is_empty() {
        let error = EngineError::MissingRelation { pairs: missing };
        warn!(code = error.code().as_str(), "{error}");
        return Err(error);
    }

    if !mutated {
        if intents.relation_intent && intents.relations.is_empty() {
            feedback.push(Feedback::RelationIntent);
        }
        if feedback.iter().any(Feedback::is_echo) {
            return Ok(Some(UpdateReport {
                graph: working,
                feedback,
                changed: false,
            }));
        }
        return Ok(None);
    }

    Ok(Some(UpdateReport {
        graph: working,
        feedback,
        changed: true,
    }))
}

fn record_column(node: &mut Node, table: &str, column: &str, feedback: &mut Vec<Feedback>) -> bool {
    match add_column_to_node(node, column) {
        ColumnStatus::Added => true,
        ColumnStatus::Duplicate => {
            feedback.push(Feedback::DuplicateColumn {
                table: table.to_string(),
                column: column.to_string(),
            });
            false
        }
        ColumnStatus::Invalid => {
            feedback.push(Feedback::InvalidColumn {
                table: table.to_string(),
                column: column.to_string(),
            });
            false
        }
    }
}
