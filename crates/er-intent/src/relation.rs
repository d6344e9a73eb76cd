//! Relation phrases: `relacion de composicion entre A y B`,
//! `haz la multiplicidad entre A y B con 1 a *`.

use std::sync::LazyLock;

use er_core::{
    Multiplicity, RelationKind, collapse_whitespace, fold_text,
    normalize_text_keep_relation_symbols,
};
use regex::{Captures, Regex};
use tracing::trace;

use crate::scan::{
    BoundedMatches, CLAUSE_STOP, TABLE_TOKENS, TABLE_TOKENS_LAZY, split_clauses, trim_tokens,
};
use crate::{RelationAction, RelationScan};

const KIND: &str = r"(?:asociacion|agregacion|composicion|segmentada|discontinua|flecha\s+blanca|flecha\s+negra)";
const MULTIPLICITY_TOKEN: &str = r"(?:0\.\.1|0\.\.(?:\*|n|m)|1\.\.(?:\*|n|m)|1|0|\*|uno|una|cero|muchos|muchas|varios|varias|n|m)";
const TABLE_PREFIX: &str = r"(?:(?:la|el|las|los)\s+)?(?:tablas?\s+)?";

/// Words that frame a relation phrase but never name a table.
const RELATION_NOISE: &[&str] = &[
    "el", "la", "los", "las", "un", "una", "unos", "unas", "de", "del", "al", "con", "en", "entre",
    "relacion", "relaciones", "asociacion", "asociaciones", "multiplicidad", "multiplidad",
    "agregacion", "composicion", "segmentada", "discontinua", "flecha", "blanca", "negra",
    "tabla", "tablas",
];

static MULTIPLICITY_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bmultipli(?:ci)?dad\b").expect("multiplicity anchor pattern is valid")
});

static MULTIPLICITY_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?:^|[^a-z0-9.*])(?P<left>{token})\s*(?:a\b|->|:)\s*(?P<right>{token})(?:$|[^a-z0-9.*])",
        token = MULTIPLICITY_TOKEN
    ))
    .expect("multiplicity pair pattern is valid")
});

/// `entre A y B`, the most reliable phrasing.
static BETWEEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\bentre\s+{prefix}(?P<left>{lazy})\s+(?:y|con|entre)\s+{prefix}(?P<right>{tokens})",
        prefix = TABLE_PREFIX,
        lazy = TABLE_TOKENS_LAZY,
        tokens = TABLE_TOKENS
    ))
    .expect("between pattern is valid")
});

/// `relacion de A con B`, `composicion de A y B`, `multiplicidad de A con B`.
static ANCHORED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        concat!(
            r"\b(?:relacion(?:es)?|multipli(?:ci)?dad|{kind})\s+(?:(?:de|del)\s+)?(?:{kind}\s+)?",
            r"{prefix}(?P<left>{lazy})\s+(?:y|con)\s+{prefix}(?P<right>{tokens})",
        ),
        kind = KIND,
        prefix = TABLE_PREFIX,
        lazy = TABLE_TOKENS_LAZY,
        tokens = TABLE_TOKENS
    ))
    .expect("anchored relation pattern is valid")
});

/// Any `A y B` / `A con B`; only consulted when the clause itself names a
/// kind or an anchored multiplicity.
static GENERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?:^|\s){prefix}(?P<left>{lazy})\s+(?:y|con)\s+{prefix}(?P<right>{tokens})",
        prefix = TABLE_PREFIX,
        lazy = TABLE_TOKENS_LAZY,
        tokens = TABLE_TOKENS
    ))
    .expect("generic relation pattern is valid")
});

/// Connector words after which the right-hand table phrase no longer names
/// the table.
static RIGHT_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s(?:y|con|entre|de\s+multipli\w*)\b").expect("tail pattern is valid"));

/// Visual kind named anywhere in `text`.
#[must_use]
pub fn parse_relationship_kind(text: &str) -> Option<RelationKind> {
    let text = collapse_whitespace(&fold_text(text));
    if text.contains("segmentada") || text.contains("discontinua") {
        Some(RelationKind::Segmentada)
    } else if text.contains("flecha blanca") || text.contains("agregacion") {
        Some(RelationKind::FlechaBlanca)
    } else if text.contains("flecha negra") || text.contains("composicion") {
        Some(RelationKind::FlechaNegra)
    } else if text.contains("asociacion") {
        Some(RelationKind::Simple)
    } else {
        None
    }
}

/// First `LEFT a RIGHT` cardinality pair, searched after the word
/// `multiplicidad` when present. `0 a 1` and `0 a muchos` read as
/// `(1, 0..1)` and `(1, 0..*)`.
#[must_use]
pub fn parse_multiplicity_pair(text: &str) -> Option<(Multiplicity, Multiplicity)> {
    let text = collapse_whitespace(&normalize_text_keep_relation_symbols(text));
    let search = MULTIPLICITY_ANCHOR
        .find(&text)
        .map_or(text.as_str(), |anchor| &text[anchor.end()..]);
    let captures = MULTIPLICITY_PAIR.captures(search)?;
    let raw_left = captures.name("left")?.as_str();
    let raw_right = captures.name("right")?.as_str();

    match (Multiplicity::from_token(raw_left), Multiplicity::from_token(raw_right)) {
        (Some(left), Some(right)) => Some((left, right)),
        _ if is_zero(raw_left) => match Multiplicity::from_token(raw_right)? {
            Multiplicity::One => Some((Multiplicity::One, Multiplicity::ZeroOrOne)),
            Multiplicity::Many => Some((Multiplicity::One, Multiplicity::ZeroOrMany)),
            _ => None,
        },
        _ => None,
    }
}

fn is_zero(token: &str) -> bool {
    matches!(token, "0" | "cero")
}

/// Cardinality tokens and the separators between them (`1`, `muchos`,
/// `1:n`, `->`), which trail table names in `... pacientes 1 a *`.
fn is_multiplicity_noise(token: &str) -> bool {
    if token == "a" || is_zero(token) || Multiplicity::from_token(token).is_some() {
        return true;
    }
    token
        .split([':', '-', '>'])
        .filter(|part| !part.is_empty())
        .all(|part| is_zero(part) || Multiplicity::from_token(part).is_some())
}

fn clean_relation_table(raw: &str, strip_multiplicity: bool) -> String {
    trim_tokens(raw, |token| {
        RELATION_NOISE.contains(&token) || (strip_multiplicity && is_multiplicity_noise(token))
    })
}

struct ClauseContext {
    kind: Option<RelationKind>,
    multiplicities: Option<(Multiplicity, Multiplicity)>,
    multiplicity_intent: bool,
    /// The clause itself names a kind or an anchored cardinality.
    explicit: bool,
}

impl ClauseContext {
    fn new(clause: &str, fallback: &ClauseContext) -> Self {
        let kind = parse_relationship_kind(clause);
        let multiplicities = parse_multiplicity_pair(clause);
        let multiplicity_intent = MULTIPLICITY_ANCHOR.is_match(clause);
        Self {
            explicit: kind.is_some() || (multiplicity_intent && multiplicities.is_some()),
            kind: kind.or(fallback.kind),
            multiplicities: multiplicities.or(fallback.multiplicities),
            multiplicity_intent: multiplicity_intent || fallback.multiplicity_intent,
        }
    }

    fn actionable(&self) -> bool {
        self.kind.is_some() || (self.multiplicity_intent && self.multiplicities.is_some())
    }
}

/// Relation edits found in `prompt`, plus whether any relation phrase was
/// recognized at all (even one too vague to act on).
///
/// Kind and cardinality are read per clause, falling back to the ones named
/// anywhere in the prompt.
#[must_use]
pub fn extract_relation_actions(prompt: &str) -> RelationScan {
    let folded = fold_text(prompt);
    let prompt_context = ClauseContext {
        kind: parse_relationship_kind(&folded),
        multiplicities: parse_multiplicity_pair(&folded),
        multiplicity_intent: MULTIPLICITY_ANCHOR.is_match(&folded),
        explicit: false,
    };

    let mut scan = RelationScan::default();
    for clause in split_clauses(&folded) {
        let context = ClauseContext::new(clause, &prompt_context);
        let text = collapse_whitespace(&normalize_text_keep_relation_symbols(clause));
        if text.is_empty() {
            continue;
        }

        let mut found = scan_pattern(&BETWEEN, &text, &context, &mut scan);
        if !found {
            found = scan_pattern(&ANCHORED, &text, &context, &mut scan);
        }
        if !found && context.explicit {
            scan_pattern(&GENERIC, &text, &context, &mut scan);
        }
    }
    scan
}

/// Run one pattern over a clause, returning whether it matched anywhere.
fn scan_pattern(
    pattern: &Regex,
    text: &str,
    context: &ClauseContext,
    scan: &mut RelationScan,
) -> bool {
    let mut matched = false;
    let mut matches = BoundedMatches::new(pattern, text);
    while let Some(captures) = matches.next() {
        matched = true;
        scan.intent = true;
        let Some((left, right, resume)) = relation_sides(&captures, context) else {
            continue;
        };
        matches.resume_at(resume);
        if !context.actionable() {
            continue;
        }
        let action = RelationAction {
            source: left,
            target: right,
            kind: context.kind,
            source_mult: context.multiplicities.map(|(source, _)| source),
            target_mult: context.multiplicities.map(|(_, target)| target),
            label: None,
        };
        if scan
            .actions
            .iter()
            .any(|existing| existing.source == action.source && existing.target == action.target)
        {
            continue;
        }
        trace!(
            source = %action.source,
            target = %action.target,
            kind = ?action.kind,
            source_mult = ?action.source_mult,
            target_mult = ?action.target_mult,
            "relation action"
        );
        scan.actions.push(action);
    }
    matched
}

/// Cleaned table names and the offset where the next search should start.
fn relation_sides(captures: &Captures<'_>, context: &ClauseContext) -> Option<(String, String, usize)> {
    let left = captures.name("left")?;
    let right = captures.name("right")?;

    let mut right_end = right.end();
    for stop in [RIGHT_TAIL.find(right.as_str()), CLAUSE_STOP.find(right.as_str())]
        .into_iter()
        .flatten()
    {
        right_end = right_end.min(right.start() + stop.start());
    }
    let right_raw = &right.as_str()[..right_end - right.start()];

    let strip = context.multiplicities.is_some();
    let source = clean_relation_table(left.as_str(), strip);
    let target = clean_relation_table(right_raw, strip);
    if source.is_empty() || target.is_empty() {
        return None;
    }
    Some((source, target, right_end))
}
