//! `crea una tabla NAME [con atributos LIST]` recognizer.

use std::sync::LazyLock;

use er_core::{fold_text, normalize_token};
use regex::Regex;
use tracing::trace;

use crate::AddTable;
use crate::scan::{
    BoundedMatches, CLAUSE_STOP, clean_attribute_name, clean_table_phrase, split_column_phrase,
    truncate_at_clause_stop,
};

const VERBS: &str = "agrega|agregue|agregar|anade|anadir|crea|crear|inserta|insertar|incluye|incluir|define|definir";

static ADD_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        concat!(
            r"\b(?:{verbs})\s+(?:(?:una?|la|el|los|las)\s+)?tabla\s+",
            r"(?:(?:llamada|denominada)\s+)?(?P<table>[a-z0-9_\s-]+?)",
            r"(?:\s+(?:con|que\s+tiene)\s+(?:(?:los|las)\s+)?(?:atributos|campos|columnas)\s+(?P<columns>[^.;\n]+))?",
            r"(?P<end>\s+y\s+(?:crea|crear|agrega|anade|define|establece|configura|haz)\b|\s+(?:ademas|tambien)\b|[.;,\n]|$)",
        ),
        verbs = VERBS
    ))
    .expect("add-table pattern is valid")
});

static LEADING_NAMING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:llamada|denominada)\s+").expect("naming pattern is valid")
});

/// Tables the prompt asks to create, in first-mention order. Repeated
/// mentions of one table merge their attribute lists.
#[must_use]
pub fn extract_add_table_actions(prompt: &str) -> Vec<AddTable> {
    let text = fold_text(prompt);
    let mut actions: Vec<AddTable> = Vec::new();
    let mut matches = BoundedMatches::new(&ADD_TABLE, &text);

    while let Some(captures) = matches.next() {
        let Some(table_match) = captures.name("table") else {
            continue;
        };
        let table_raw = LEADING_NAMING.replace(table_match.as_str().trim(), "");
        let table = clean_table_phrase(&table_raw);
        if table.is_empty() || normalize_token(&table).is_empty() {
            continue;
        }

        let mut attributes = Vec::new();
        if let Some(columns) = captures.name("columns") {
            if let Some(stop) = CLAUSE_STOP.find(columns.as_str()) {
                matches.resume_at(columns.start() + stop.start());
            }
            for candidate in split_column_phrase(truncate_at_clause_stop(columns.as_str())) {
                if let Some(attribute) = clean_attribute_name(&candidate) {
                    attributes.push(attribute);
                }
            }
        }

        trace!(table = %table, attributes = ?attributes, "add-table action");
        let entry = match actions.iter().position(|action| action.table == table) {
            Some(index) => &mut actions[index],
            None => {
                actions.push(AddTable::new(table, Vec::new()));
                let last = actions.len() - 1;
                &mut actions[last]
            }
        };
        for attribute in attributes {
            if !entry.attributes.contains(&attribute) {
                entry.attributes.push(attribute);
            }
        }
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::extract_add_table_actions;
    use crate::AddTable;

    #[test]
    fn table_with_inline_attributes() {
        assert_eq!(
            extract_add_table_actions("crea una tabla alumno con atributos nombre, email"),
            [AddTable::new("alumno", vec!["nombre".into(), "email".into()])]
        );
    }

    #[test]
    fn accents_and_case_are_folded() {
        let actions = extract_add_table_actions("Añade la tabla Categorías con campos Código varchar pk y Descripción");
        assert_eq!(
            actions,
            [AddTable::new(
                "categorias",
                vec!["codigo".into(), "descripcion".into()]
            )]
        );
    }

    #[test]
    fn naming_words_and_filler_are_dropped() {
        let actions = extract_add_table_actions("define una tabla llamada detalle de pedido.");
        assert_eq!(actions, [AddTable::new("detalle de pedido", Vec::new())]);
    }

    #[test]
    fn chained_instructions_yield_every_table() {
        let actions = extract_add_table_actions(
            "crea la tabla cursos y agrega la tabla profesores con atributos nombre y titulo y crea tabla aulas",
        );
        let names: Vec<&str> = actions.iter().map(|action| action.table.as_str()).collect();
        assert_eq!(names, ["cursos", "profesores", "aulas"]);
        assert_eq!(actions[1].attributes, ["nombre", "titulo"]);
        assert!(actions[2].attributes.is_empty());
    }

    #[test]
    fn repeated_tables_merge_attributes_in_first_seen_order() {
        let actions = extract_add_table_actions(
            "crea tabla clientes con atributos nombre, email. agrega tabla clientes con campos email, telefono",
        );
        assert_eq!(
            actions,
            [AddTable::new(
                "clientes",
                vec!["nombre".into(), "email".into(), "telefono".into()]
            )]
        );
    }

    #[test]
    fn prompts_without_a_table_verb_yield_nothing() {
        assert!(extract_add_table_actions("quiero un sistema de ventas").is_empty());
        assert!(extract_add_table_actions("").is_empty());
        assert!(extract_add_table_actions("agrega a la tabla clientes la columna email").is_empty());
    }
}
