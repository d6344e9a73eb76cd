#![forbid(unsafe_code)]

mod config;
mod lexicon;
mod text;

pub use config::{EngineConfig, GridLayout, StrategyKind};
pub use lexicon::{
    Category, ColumnTemplate, build_base_columns, categorize_entity, is_stopword,
    is_type_keyword,
};
pub use text::{
    NormalizeMode, collapse_whitespace, fold_text, normalize, normalize_text,
    normalize_text_keep_commas, normalize_text_keep_relation_symbols, normalize_token,
    pluralize_word, singularize_word, slugify, strip_accents, titleize, to_snake_case,
    word_forms,
};

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Node type tag expected by the diagram editor front end.
pub const DATABASE_NODE_TYPE: &str = "databaseNode";

/// Column type assigned to columns added from a prompt.
pub const DEFAULT_COLUMN_TYPE: &str = "VARCHAR(120)";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Column {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(default)]
    pub pk: bool,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

const fn default_nullable() -> bool {
    true
}

impl Column {
    /// The `id INT` primary key every synthesized node starts with.
    #[must_use]
    pub fn primary_key(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: "id".to_string(),
            column_type: "INT".to_string(),
            pk: true,
            nullable: false,
        }
    }

    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        column_type: impl Into<String>,
        nullable: bool,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            column_type: column_type.into(),
            pk: false,
            nullable,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_join: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_of: Option<[String; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type", default = "default_node_type")]
    pub node_type: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub data: NodeData,
}

fn default_node_type() -> String {
    DATABASE_NODE_TYPE.to_string()
}

impl Node {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        columns: Vec<Column>,
        position: Position,
    ) -> Self {
        Self {
            id: id.into(),
            node_type: default_node_type(),
            position,
            data: NodeData {
                label: label.into(),
                columns,
                is_join: None,
                join_of: None,
            },
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.data.label
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.data.columns
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.data.columns.iter().any(|column| column.name == name)
    }
}

/// Visual style of a relation line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum RelationKind {
    #[default]
    #[serde(rename = "simple")]
    Simple,
    #[serde(rename = "segmentada")]
    Segmentada,
    #[serde(rename = "flechaBlanca")]
    FlechaBlanca,
    #[serde(rename = "flechaNegra")]
    FlechaNegra,
}

impl RelationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Segmentada => "segmentada",
            Self::FlechaBlanca => "flechaBlanca",
            Self::FlechaNegra => "flechaNegra",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cardinality token at one end of a relation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Multiplicity {
    One,
    ZeroOrOne,
    ZeroOrMany,
    OneOrMany,
    Many,
}

impl Multiplicity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::One => "1",
            Self::ZeroOrOne => "0..1",
            Self::ZeroOrMany => "0..*",
            Self::OneOrMany => "1..*",
            Self::Many => "*",
        }
    }

    /// Map a prompt token (`uno`, `1..n`, `muchos`, ...) to its canonical
    /// cardinality. A bare `0`/`cero` has no canonical form on its own.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "uno" | "una" | "1" | "1..1" => Some(Self::One),
            "0..1" => Some(Self::ZeroOrOne),
            "0..*" | "0..n" | "0..m" => Some(Self::ZeroOrMany),
            "1..*" | "1..n" | "1..m" => Some(Self::OneOrMany),
            "*" | "n" | "m" | "muchos" | "muchas" | "varios" | "varias" => Some(Self::Many),
            _ => None,
        }
    }
}

impl TryFrom<String> for Multiplicity {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_token(&value).ok_or_else(|| format!("unknown multiplicity '{value}'"))
    }
}

impl From<Multiplicity> for &'static str {
    fn from(value: Multiplicity) -> Self {
        value.as_str()
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EdgeData {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<RelationKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_mult: Option<Multiplicity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_mult: Option<Multiplicity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub data: EdgeData,
}

impl Edge {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        kind: RelationKind,
        source_mult: Multiplicity,
        target_mult: Multiplicity,
        label: impl Into<String>,
    ) -> Self {
        let id = id.into();
        let source = source.into();
        let target = target.into();
        let label = label.into();
        Self {
            data: EdgeData {
                id: id.clone(),
                source: source.clone(),
                target: target.clone(),
                kind: Some(kind),
                source_mult: Some(source_mult),
                target_mult: Some(target_mult),
                label: Some(label.clone()),
            },
            id,
            source,
            target,
            label: Some(label),
        }
    }

    /// Whether this edge joins `a` and `b`; `Some(true)` when stored as `b -> a`.
    #[must_use]
    pub fn connects(&self, a: &str, b: &str) -> Option<bool> {
        if self.source == a && self.target == b {
            Some(false)
        } else if self.source == b && self.target == a {
            Some(true)
        } else {
            None
        }
    }
}

/// An entity-relationship graph as exchanged with the editor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Graph {
    #[must_use]
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Index of the edge joining `a` and `b` in either direction, plus
    /// whether it is stored reversed.
    #[must_use]
    pub fn find_edge_between(&self, a: &str, b: &str) -> Option<(usize, bool)> {
        self.edges
            .iter()
            .enumerate()
            .find_map(|(index, edge)| edge.connects(a, b).map(|reversed| (index, reversed)))
    }

    /// Check the identifier invariants the engine relies on.
    pub fn validate(&self) -> Result<(), EngineError> {
        let mut node_ids = rustc_hash::FxHashSet::default();
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) {
                return Err(EngineError::InvalidGraph {
                    message: format!("duplicate node id '{}'", node.id),
                });
            }
            let mut column_ids = rustc_hash::FxHashSet::default();
            for column in &node.data.columns {
                if !column_ids.insert(column.id.as_str()) {
                    return Err(EngineError::InvalidGraph {
                        message: format!(
                            "duplicate column id '{}' in node '{}'",
                            column.id, node.id
                        ),
                    });
                }
            }
        }

        let mut edge_ids = rustc_hash::FxHashSet::default();
        for edge in &self.edges {
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(EngineError::InvalidGraph {
                    message: format!("duplicate edge id '{}'", edge.id),
                });
            }
            for endpoint in [&edge.source, &edge.target] {
                if !node_ids.contains(endpoint.as_str()) {
                    return Err(EngineError::InvalidGraph {
                        message: format!(
                            "edge '{}' references unknown node '{endpoint}'",
                            edge.id
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Two table names as written in the prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TablePair {
    pub source: String,
    pub target: String,
}

impl TablePair {
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for TablePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} y {}", self.source, self.target)
    }
}

fn join_pairs(pairs: &[TablePair]) -> String {
    pairs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EngineErrorCode {
    MissingRelation,
    InvalidGraph,
    Config,
}

impl EngineErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingRelation => "er/error/missing-relation",
            Self::InvalidGraph => "er/error/invalid-graph",
            Self::Config => "er/error/config",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Cardinality edits aimed at tables that are not related yet.
    #[error(
        "No hay relacion entre las tablas {}. Primero crea la relacion y luego ajusta la multiplicidad.",
        join_pairs(.pairs)
    )]
    MissingRelation { pairs: Vec<TablePair> },
    #[error("invalid graph: {message}")]
    InvalidGraph { message: String },
    #[error("invalid configuration: {message}")]
    Config { message: String },
}

impl EngineError {
    #[must_use]
    pub const fn code(&self) -> EngineErrorCode {
        match self {
            Self::MissingRelation { .. } => EngineErrorCode::MissingRelation,
            Self::InvalidGraph { .. } => EngineErrorCode::InvalidGraph,
            Self::Config { .. } => EngineErrorCode::Config,
        }
    }
}

/// Non-fatal observations surfaced to the caller next to the result graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "code", rename_all = "kebab-case")]
pub enum Feedback {
    DuplicateColumn { table: String, column: String },
    InvalidColumn { table: String, column: String },
    UnchangedRelation { source: String, target: String },
    RelationIntent,
}

impl Feedback {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DuplicateColumn { .. } => "er/feedback/duplicate-column",
            Self::InvalidColumn { .. } => "er/feedback/invalid-column",
            Self::UnchangedRelation { .. } => "er/feedback/unchanged-relation",
            Self::RelationIntent => "er/feedback/relation-intent",
        }
    }

    /// Whether this item should keep an otherwise empty update visible.
    #[must_use]
    pub const fn is_echo(&self) -> bool {
        !matches!(self, Self::InvalidColumn { .. })
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::DuplicateColumn { table, column } => {
                format!("La tabla {table} ya tiene la columna {column}")
            }
            Self::InvalidColumn { table, column } => {
                format!("'{column}' no es un nombre de columna valido para {table}")
            }
            Self::UnchangedRelation { source, target } => {
                format!("La relacion entre {source} y {target} ya estaba configurada")
            }
            Self::RelationIntent => {
                "Se detecto una relacion pero no una accion concreta".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Column, Edge, EdgeData, EngineError, EngineErrorCode, Feedback, Graph, Multiplicity,
        Node, Position, RelationKind, TablePair,
    };

    fn node(id: &str, label: &str) -> Node {
        Node::new(id, label, vec![Column::primary_key(format!("{id}-id"))], Position::default())
    }

    #[test]
    fn multiplicity_tokens_map_to_canonical_forms() {
        let cases = [
            ("uno", Some(Multiplicity::One)),
            ("1..1", Some(Multiplicity::One)),
            ("0..1", Some(Multiplicity::ZeroOrOne)),
            ("0..n", Some(Multiplicity::ZeroOrMany)),
            ("1..m", Some(Multiplicity::OneOrMany)),
            ("muchas", Some(Multiplicity::Many)),
            ("*", Some(Multiplicity::Many)),
            ("0", None),
            ("cero", None),
            ("dos", None),
        ];
        for (token, expected) in cases {
            assert_eq!(Multiplicity::from_token(token), expected, "token {token}");
        }
    }

    #[test]
    fn edge_serializes_to_editor_wire_shape() {
        let edge = Edge::new(
            "edge-a-b",
            "node-a",
            "node-b",
            RelationKind::FlechaBlanca,
            Multiplicity::One,
            Multiplicity::ZeroOrMany,
            "",
        );
        let value = serde_json::to_value(&edge).expect("serialize edge");
        assert_eq!(value["data"]["kind"], "flechaBlanca");
        assert_eq!(value["data"]["sourceMult"], "1");
        assert_eq!(value["data"]["targetMult"], "0..*");
        assert_eq!(value["data"]["id"], "edge-a-b");
        assert_eq!(value["label"], "");
    }

    #[test]
    fn partial_graph_payload_deserializes_with_defaults() {
        let payload = r#"{
            "nodes": [{"id": "node-a", "data": {"label": "A", "columns": [
                {"id": "a-id", "name": "id", "type": "INT", "pk": true, "nullable": false},
                {"id": "a-nombre", "name": "nombre", "type": "TEXT"}
            ]}}],
            "edges": [{"id": "e", "source": "node-a", "target": "node-a"}]
        }"#;
        let graph: Graph = serde_json::from_str(payload).expect("deserialize graph");
        assert_eq!(graph.nodes[0].node_type, "databaseNode");
        assert!(graph.nodes[0].columns()[1].nullable);
        assert!(!graph.nodes[0].columns()[1].pk);
        assert_eq!(graph.edges[0].data, EdgeData::default());
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn unknown_multiplicity_is_rejected() {
        let payload = r#"{"id": "e", "source": "a", "target": "b", "data": {"sourceMult": "7"}}"#;
        assert!(serde_json::from_str::<Edge>(payload).is_err());
    }

    #[test]
    fn find_edge_between_is_symmetric() {
        let mut graph = Graph::new(vec![node("node-a", "A"), node("node-b", "B")], Vec::new());
        graph.edges.push(Edge::new(
            "edge-a-b",
            "node-a",
            "node-b",
            RelationKind::Simple,
            Multiplicity::One,
            Multiplicity::Many,
            "",
        ));
        assert_eq!(graph.find_edge_between("node-a", "node-b"), Some((0, false)));
        assert_eq!(graph.find_edge_between("node-b", "node-a"), Some((0, true)));
        assert_eq!(graph.find_edge_between("node-a", "node-c"), None);
    }

    #[test]
    fn validate_reports_duplicate_ids_and_dangling_edges() {
        let graph = Graph::new(vec![node("node-a", "A"), node("node-a", "B")], Vec::new());
        assert!(matches!(
            graph.validate(),
            Err(EngineError::InvalidGraph { .. })
        ));

        let mut graph = Graph::new(vec![node("node-a", "A")], Vec::new());
        graph.edges.push(Edge::new(
            "edge-x",
            "node-a",
            "node-missing",
            RelationKind::Simple,
            Multiplicity::One,
            Multiplicity::Many,
            "",
        ));
        let error = graph.validate().expect_err("dangling edge");
        assert_eq!(error.code(), EngineErrorCode::InvalidGraph);
        assert!(error.to_string().contains("node-missing"));
    }

    #[test]
    fn missing_relation_message_names_every_pair() {
        let error = EngineError::MissingRelation {
            pairs: vec![
                TablePair::new("pacientes", "tratamientos"),
                TablePair::new("medicos", "salas"),
            ],
        };
        let message = error.to_string();
        assert!(message.starts_with("No hay relacion entre las tablas pacientes y tratamientos, medicos y salas."));
        assert_eq!(error.code().as_str(), "er/error/missing-relation");
    }

    #[test]
    fn join_node_metadata_round_trips_through_json() {
        let join: Node = serde_json::from_str(
            r#"{"id": "node-matricula",
                "data": {"label": "Matricula", "isJoin": true, "joinOf": ["alumno", "curso"]}}"#,
        )
        .expect("join node");
        assert_eq!(join.data.is_join, Some(true));
        let value = serde_json::to_value(&join).expect("serialize node");
        assert_eq!(value["data"]["isJoin"], true);
        assert_eq!(value["data"]["joinOf"][1], "curso");

        let plain = serde_json::to_value(node("node-a", "A")).expect("serialize node");
        assert!(plain["data"].get("isJoin").is_none());
    }

    #[test]
    fn feedback_codes_are_stable() {
        let duplicate = Feedback::DuplicateColumn {
            table: "Clientes".into(),
            column: "email".into(),
        };
        assert_eq!(duplicate.code(), "er/feedback/duplicate-column");
        assert!(duplicate.is_echo());
        assert!(duplicate.message().contains("email"));

        let value = serde_json::to_value(&Feedback::RelationIntent).expect("serialize feedback");
        assert_eq!(value["code"], "relation-intent");
        assert!(
            !Feedback::InvalidColumn {
                table: "t".into(),
                column: "!".into()
            }
            .is_echo()
        );
    }
}
