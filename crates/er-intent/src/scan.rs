//! Shared pattern fragments and phrase cleanup used by every extractor.

use std::sync::LazyLock;

use er_core::{is_stopword, is_type_keyword, normalize_token};
use regex::{Captures, Regex};

/// Up to six words, separated by whitespace or commas.
pub(crate) const COLUMN_TOKENS: &str = r"(?:[a-z0-9]+(?:\s+|,\s*)){0,5}[a-z0-9]+";
/// Up to four words, longest first.
pub(crate) const TABLE_TOKENS: &str = r"(?:[a-z0-9]+\s+){0,3}[a-z0-9]+";
/// Up to four words, shortest first.
pub(crate) const TABLE_TOKENS_LAZY: &str = r"(?:[a-z0-9]+\s+){0,3}?[a-z0-9]+";

pub(crate) const ARTICLE: &str = r"(?:el|la|los|las|un|una|unos|unas)";
pub(crate) const NEW: &str = r"(?:nuevo|nueva|nuevos|nuevas)";
pub(crate) const ATTRIBUTE_NOUN: &str = r"(?:atributo|atributos|columna|columnas|campo|campos)";

/// Articles and prepositions trimmed from both ends of a table phrase.
const FILLER: &[&str] = &[
    "el", "la", "los", "las", "un", "una", "unos", "unas", "de", "del", "al", "con",
];

/// A connector that starts a new instruction inside the same sentence.
pub(crate) static CLAUSE_STOP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:y\s+(?:crea|crear|agrega|anade|define|establece|configura|haz)|ademas|tambien)\b",
    )
    .expect("clause stop pattern is valid")
});

static COLUMN_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*,\s*|\b(?:y|e)\b").expect("column separator pattern is valid")
});

static LEADING_ARTICLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^{ARTICLE}\s+")).expect("article pattern is valid")
});

static LEADING_NEW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^{NEW}\s+")).expect("adjective pattern is valid"));

static LEADING_ATTRIBUTE_NOUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^{ATTRIBUTE_NOUN}\s+")).expect("attribute noun pattern is valid")
});

/// Captures of `regex` over `haystack` where the optional `end` group is a
/// boundary: it must match but is left unconsumed for the next search.
pub(crate) struct BoundedMatches<'r, 'h> {
    regex: &'r Regex,
    haystack: &'h str,
    at: usize,
}

impl<'r, 'h> BoundedMatches<'r, 'h> {
    pub(crate) fn new(regex: &'r Regex, haystack: &'h str) -> Self {
        Self {
            regex,
            haystack,
            at: 0,
        }
    }

    /// Continue the next search at `at` instead of the default resume point.
    pub(crate) fn resume_at(&mut self, at: usize) {
        self.at = at.min(self.haystack.len());
    }
}

impl<'h> Iterator for BoundedMatches<'_, 'h> {
    type Item = Captures<'h>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.at > self.haystack.len() {
            return None;
        }
        let captures = self.regex.captures_at(self.haystack, self.at)?;
        let whole = captures.get(0)?;
        let resume = captures
            .name("end")
            .map_or(whole.end(), |boundary| boundary.start());
        self.at = if resume > whole.start() {
            resume
        } else {
            let step = self.haystack[whole.start()..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);
            whole.start() + step
        };
        Some(captures)
    }
}

/// Text before the first [`CLAUSE_STOP`] connector.
pub(crate) fn truncate_at_clause_stop(phrase: &str) -> &str {
    CLAUSE_STOP
        .find(phrase)
        .map_or(phrase, |stop| &phrase[..stop.start()])
}

/// Split free text into clauses at `;`, line breaks and sentence-ending dots.
/// Dots inside cardinalities such as `1..*` do not split.
pub(crate) fn split_clauses(text: &str) -> Vec<&str> {
    let mut clauses = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((index, ch)) = chars.next() {
        let boundary = match ch {
            ';' | '\n' => true,
            '.' => chars.peek().is_none_or(|(_, next)| next.is_whitespace()),
            _ => false,
        };
        if boundary {
            clauses.push(&text[start..index]);
            start = index + ch.len_utf8();
        }
    }
    clauses.push(&text[start..]);
    clauses.retain(|clause| !clause.trim().is_empty());
    clauses
}

fn is_filler(token: &str) -> bool {
    FILLER.contains(&token)
}

/// Drop leading and trailing tokens for which `should_drop` holds.
pub(crate) fn trim_tokens(phrase: &str, should_drop: impl Fn(&str) -> bool) -> String {
    let tokens: Vec<&str> = phrase.split_whitespace().collect();
    let start = tokens
        .iter()
        .position(|token| !should_drop(token))
        .unwrap_or(tokens.len());
    let end = tokens
        .iter()
        .rposition(|token| !should_drop(token))
        .map_or(start, |last| last + 1);
    tokens[start..end].join(" ")
}

/// Remove articles and prepositions from both ends of a table phrase.
pub(crate) fn clean_table_phrase(raw: &str) -> String {
    trim_tokens(raw, is_filler)
}

/// Like [`clean_table_phrase`], also dropping trailing stop words
/// (`por favor`) as long as one word remains.
pub(crate) fn clean_table_tail(raw: &str) -> String {
    let cleaned = clean_table_phrase(raw);
    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    while tokens.len() > 1 && tokens.last().is_some_and(|token| is_stopword(token) || is_filler(token)) {
        tokens.pop();
    }
    tokens.join(" ")
}

/// Split `nombre, email y telefono` into individual attribute phrases.
pub(crate) fn split_column_phrase(raw: &str) -> Vec<String> {
    COLUMN_SEPARATOR
        .split(raw)
        .map(strip_attribute_prefixes)
        .filter(|part| !part.is_empty())
        .collect()
}

fn strip_attribute_prefixes(part: &str) -> String {
    let part = part.trim();
    let part = LEADING_ARTICLE.replace(part, "");
    let part = LEADING_NEW.replace(&part, "");
    let part = LEADING_ATTRIBUTE_NOUN.replace(&part, "");
    part.trim().to_string()
}

/// Final attribute name, or `None` when nothing usable remains.
///
/// Trailing type or key markers (`edad int`, `codigo varchar pk`) are
/// removed, but the first word is always kept so `fecha` survives as a name.
pub(crate) fn clean_attribute_name(raw: &str) -> Option<String> {
    let cleaned = strip_attribute_prefixes(raw.trim_matches(|ch: char| " .;,".contains(ch)));
    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    while tokens.len() > 1 && tokens.last().is_some_and(|token| is_type_keyword(&normalize_token(token))) {
        tokens.pop();
    }
    let name = tokens.join(" ");
    if name.is_empty() { None } else { Some(name) }
}
