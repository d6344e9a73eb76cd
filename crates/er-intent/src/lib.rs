#![forbid(unsafe_code)]

//! Pattern-driven recognizers that turn a Spanish prompt into structured
//! edit actions. Every extractor is a total function `&str -> actions`.

mod column;
mod relation;
mod scan;
mod table;

pub use column::extract_add_column_actions;
pub use relation::{extract_relation_actions, parse_multiplicity_pair, parse_relationship_kind};
pub use table::extract_add_table_actions;

use er_core::{Multiplicity, RelationKind};
use serde::{Deserialize, Serialize};

/// Create `table` (if missing) and give it `attributes`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddTable {
    pub table: String,
    pub attributes: Vec<String>,
}

impl AddTable {
    #[must_use]
    pub fn new(table: impl Into<String>, attributes: Vec<String>) -> Self {
        Self {
            table: table.into(),
            attributes,
        }
    }
}

/// Add `column` to `table`, creating the table when it does not exist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddColumn {
    pub table: String,
    pub column: String,
}

impl AddColumn {
    #[must_use]
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

/// Create or adjust the edge between two tables. `None` fields leave the
/// current edge value untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelationAction {
    pub source: String,
    pub target: String,
    pub kind: Option<RelationKind>,
    pub source_mult: Option<Multiplicity>,
    pub target_mult: Option<Multiplicity>,
    pub label: Option<String>,
}

impl RelationAction {
    /// Only an explicit relation kind may create nodes and edges; a bare
    /// cardinality change needs an existing edge.
    #[must_use]
    pub const fn allows_create(&self) -> bool {
        self.kind.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelationScan {
    pub actions: Vec<RelationAction>,
    /// A relation phrase was recognized, whether or not it was actionable.
    pub intent: bool,
}

/// Everything the extractors found in one prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntentSet {
    pub tables: Vec<AddTable>,
    pub columns: Vec<AddColumn>,
    pub relations: Vec<RelationAction>,
    pub relation_intent: bool,
}

impl IntentSet {
    /// Whether at least one explicit edit was recognized.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        !(self.tables.is_empty() && self.columns.is_empty() && self.relations.is_empty())
    }
}

/// Run every extractor over `prompt`.
#[must_use]
pub fn extract_intents(prompt: &str) -> IntentSet {
    let relations = extract_relation_actions(prompt);
    IntentSet {
        tables: extract_add_table_actions(prompt),
        columns: extract_add_column_actions(prompt),
        relations: relations.actions,
        relation_intent: relations.intent,
    }
}

#[cfg(test)]
mod tests {
    use super::{AddColumn, AddTable, extract_intents};
    use er_core::{Multiplicity, RelationKind};
    use proptest::prelude::*;

    #[test]
    fn mixed_prompt_yields_every_action_kind() {
        let intents = extract_intents(
            "Crea una tabla alumno con atributos nombre, email; agrega columna telefono a tabla clientes; \
             relacion de composicion entre alumno y clientes",
        );
        assert_eq!(
            intents.tables,
            [AddTable::new("alumno", vec!["nombre".into(), "email".into()])]
        );
        assert_eq!(intents.columns, [AddColumn::new("clientes", "telefono")]);
        assert_eq!(intents.relations.len(), 1);
        assert_eq!(intents.relations[0].kind, Some(RelationKind::FlechaNegra));
        assert!(intents.relation_intent);
        assert!(intents.is_actionable());
    }

    #[test]
    fn free_text_is_not_actionable() {
        let intents =
            extract_intents("necesito un sistema para una veterinaria con mascotas y duenos");
        assert!(!intents.is_actionable());
        assert!(!intents.relation_intent);
    }

    #[test]
    fn intent_set_serializes_with_wire_multiplicities() {
        let intents = extract_intents("multiplicidad entre pacientes y tratamientos 1 a muchos");
        let value = serde_json::to_value(&intents).expect("serialize intents");
        assert_eq!(value["relations"][0]["target"], "tratamientos");
        assert_eq!(value["relations"][0]["source_mult"], "1");
        assert_eq!(value["relations"][0]["target_mult"], "*");
        assert_eq!(intents.relations[0].target_mult, Some(Multiplicity::Many));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_extraction_is_total(prompt in ".{0,200}") {
            let intents = extract_intents(&prompt);
            for table in &intents.tables {
                prop_assert!(!table.table.trim().is_empty());
            }
            for column in &intents.columns {
                prop_assert!(!column.column.trim().is_empty());
            }
            for relation in &intents.relations {
                prop_assert!(!relation.source.is_empty() && !relation.target.is_empty());
                prop_assert!(relation.kind.is_some() || relation.source_mult.is_some());
            }
        }

        #[test]
        fn prop_relation_endpoints_are_trimmed(
            words in proptest::collection::vec(
                prop_oneof![
                    Just("crea"), Just("agrega"), Just("tabla"), Just("columna"), Just("entre"),
                    Just("y"), Just("con"), Just("a"), Just("multiplicidad"), Just("relacion"),
                    Just("composicion"), Just("1"), Just("*"), Just("0..1"), Just("muchos"),
                    Just("clientes"), Just("pedidos"), Just(","), Just("."), Just("la"),
                ],
                0..24,
            )
        ) {
            let intents = extract_intents(&words.join(" "));
            for relation in &intents.relations {
                for name in [&relation.source, &relation.target] {
                    let first = name.split_whitespace().next().unwrap_or_default();
                    let last = name.split_whitespace().last().unwrap_or_default();
                    for edge in [first, last] {
                        prop_assert!(!matches!(edge, "la" | "entre" | "tabla" | "con" | "relacion"));
                    }
                }
            }
        }
    }
}
