//! `agrega columna COL a tabla TABLE` and `agrega a tabla TABLE columna COL`.

use std::sync::LazyLock;

use er_core::{collapse_whitespace, fold_text, normalize_text_keep_commas};
use regex::Regex;
use tracing::trace;

use crate::AddColumn;
use crate::scan::{
    ARTICLE, ATTRIBUTE_NOUN, BoundedMatches, CLAUSE_STOP, COLUMN_TOKENS, NEW, TABLE_TOKENS,
    clean_attribute_name, clean_table_tail, split_clauses, split_column_phrase,
    truncate_at_clause_stop,
};

const VERBS: &str = "agrega|agregue|agregar|anade|anadir|aumenta|aumentar|incluye|incluir|actualiza|actualizar|modifica|modificar|suma|sumar";

static COLUMN_BEFORE_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        concat!(
            r"\b(?:{verbs})\s+(?:{article}\s+)?(?:{new}\s+)?{noun}\s+",
            r"(?P<column>{column})\s+(?:a|en|para|al)\s+(?:(?:la|el)\s+)?tabla\s+",
            r"(?P<table>{table})",
        ),
        verbs = VERBS,
        article = ARTICLE,
        new = NEW,
        noun = ATTRIBUTE_NOUN,
        column = COLUMN_TOKENS,
        table = TABLE_TOKENS,
    ))
    .expect("column-before-table pattern is valid")
});

static TABLE_BEFORE_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        concat!(
            r"\b(?:{verbs})\s+(?:a|en|para|al)\s+(?:(?:la|el)\s+)?tabla\s+",
            r"(?P<table>{table})\s+(?:con\s+)?(?:{article}\s+)?(?:{new}\s+)?{noun}\s+",
            r"(?P<column>{column})",
        ),
        verbs = VERBS,
        article = ARTICLE,
        new = NEW,
        noun = ATTRIBUTE_NOUN,
        column = COLUMN_TOKENS,
        table = TABLE_TOKENS,
    ))
    .expect("table-before-column pattern is valid")
});

/// `(table, column)` pairs in pattern order, without repeats.
#[must_use]
pub fn extract_add_column_actions(prompt: &str) -> Vec<AddColumn> {
    let folded = fold_text(prompt);
    let clauses: Vec<String> = split_clauses(&folded)
        .into_iter()
        .map(|clause| collapse_whitespace(&normalize_text_keep_commas(clause)))
        .filter(|clause| !clause.is_empty())
        .collect();

    let mut actions: Vec<AddColumn> = Vec::new();
    for pattern in [&*COLUMN_BEFORE_TABLE, &*TABLE_BEFORE_COLUMN] {
        for clause in &clauses {
            collect_column_actions(pattern, clause, &mut actions);
        }
    }
    actions
}

fn collect_column_actions(pattern: &Regex, clause: &str, actions: &mut Vec<AddColumn>) {
    let mut matches = BoundedMatches::new(pattern, clause);
    while let Some(captures) = matches.next() {
        let (Some(table_match), Some(column_match)) = (captures.name("table"), captures.name("column"))
        else {
            continue;
        };

        // The greedy token runs can swallow a chained instruction; cut there
        // and search again from the connector.
        let stops = [table_match, column_match]
            .into_iter()
            .filter_map(|group| CLAUSE_STOP.find(group.as_str()).map(|stop| group.start() + stop.start()));
        if let Some(at) = stops.min() {
            matches.resume_at(at);
        }
        let table_raw = truncate_at_clause_stop(table_match.as_str());
        let column_raw = truncate_at_clause_stop(column_match.as_str());

        let table = clean_table_tail(table_raw);
        if table.is_empty() {
            continue;
        }
        for candidate in split_column_phrase(column_raw) {
            let Some(column) = clean_attribute_name(&candidate) else {
                continue;
            };
            let action = AddColumn::new(table.clone(), column);
            if !actions.contains(&action) {
                trace!(table = %action.table, column = %action.column, "add-column action");
                actions.push(action);
            }
        }
    }
}
