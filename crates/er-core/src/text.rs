//! Text normalization and token-level heuristics shared by the extractors
//! and the graph mutator.
//!
//! Everything here is a total function over `&str`: any input produces a
//! (possibly empty) output, never a panic.

/// Which punctuation survives [`normalize`] besides `[a-z0-9]` and whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizeMode {
    #[default]
    Plain,
    /// Keeps `,` so attribute lists can still be split.
    KeepCommas,
    /// Keeps `.,*:>-` for cardinality and arrow phrases (`1..*`, `a->b`).
    KeepRelationSymbols,
}

impl NormalizeMode {
    const fn keeps(self, ch: char) -> bool {
        match self {
            Self::Plain => false,
            Self::KeepCommas => ch == ',',
            Self::KeepRelationSymbols => matches!(ch, ',' | '.' | '*' | ':' | '>' | '-'),
        }
    }
}

/// Combining diacritical marks (U+0300..=U+036F) left over from decomposed input.
const fn is_combining_mark(ch: char) -> bool {
    matches!(ch, '\u{0300}'..='\u{036f}')
}

fn fold_char(ch: char) -> char {
    match ch {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ç' => 'c',
        'Ç' => 'C',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        other => other,
    }
}

/// Remove diacritics while preserving case and every other character.
#[must_use]
pub fn strip_accents(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !is_combining_mark(*ch))
        .map(fold_char)
        .collect()
}

/// Accent-free, lower-cased text with punctuation untouched.
#[must_use]
pub fn fold_text(value: &str) -> String {
    strip_accents(&value.to_lowercase())
}

/// Fold `text` and replace every character outside `[a-z0-9\s]` (plus the
/// punctuation kept by `mode`) with a single space.
#[must_use]
pub fn normalize(text: &str, mode: NormalizeMode) -> String {
    fold_text(text)
        .chars()
        .map(|ch| {
            if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch.is_whitespace() || mode.keeps(ch)
            {
                ch
            } else {
                ' '
            }
        })
        .collect()
}

#[must_use]
pub fn normalize_text(text: &str) -> String {
    normalize(text, NormalizeMode::Plain)
}

#[must_use]
pub fn normalize_text_keep_commas(text: &str) -> String {
    normalize(text, NormalizeMode::KeepCommas)
}

#[must_use]
pub fn normalize_text_keep_relation_symbols(text: &str) -> String {
    normalize(text, NormalizeMode::KeepRelationSymbols)
}

/// Collapse whitespace runs into single spaces and trim both ends.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Bare alphanumeric identity key: `"Clientes "` and `"clientes"` agree.
#[must_use]
pub fn normalize_token(token: &str) -> String {
    fold_text(token)
        .chars()
        .filter(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())
        .collect()
}

/// Hyphen-joined identifier; `fallback` when nothing alphanumeric remains.
#[must_use]
pub fn slugify(value: &str, fallback: &str) -> String {
    let slug = join_alphanumeric_runs(&fold_text(value), '-');
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

/// Display form: words split on whitespace, `_` and `-`, each capitalized.
#[must_use]
pub fn titleize(value: &str) -> String {
    value
        .split(|ch: char| ch.is_whitespace() || ch == '_' || ch == '-')
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Storage form of a column name. Never empty.
#[must_use]
pub fn to_snake_case(value: &str) -> String {
    let snake = join_alphanumeric_runs(&fold_text(value), '_');
    if snake.is_empty() {
        "campo".to_string()
    } else {
        snake
    }
}

fn join_alphanumeric_runs(folded: &str, separator: char) -> String {
    folded
        .split(|ch: char| !(ch.is_ascii_lowercase() || ch.is_ascii_digit()))
        .filter(|run| !run.is_empty())
        .collect::<Vec<_>>()
        .join(&separator.to_string())
}

/// Final consonants of stems whose plural is `-es` (`profesores`, `ciudades`).
const ES_PLURAL_STEMS: [char; 6] = ['l', 'n', 'r', 'd', 'j', 'y'];

/// Suffix-rule singular, tried in order:
/// `-ces` -> `-z`, `-iones` -> `-ion`, `-es` after an `-es` plural stem
/// (never `-ses`), then a trailing `-s` on words longer than three bytes.
#[must_use]
pub fn singularize_word(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ces") {
        return format!("{stem}z");
    }
    if let Some(stem) = word.strip_suffix("iones") {
        return format!("{stem}ion");
    }
    if let Some(stem) = word.strip_suffix("es") {
        if !word.ends_with("ses") && stem.ends_with(ES_PLURAL_STEMS) {
            return stem.to_string();
        }
    }
    if word.len() > 3 {
        if let Some(stem) = word.strip_suffix('s') {
            return stem.to_string();
        }
    }
    word.to_string()
}

/// Suffix-rule plural, tried in order: `-z` -> `-ces`, `-ion` -> `-iones`,
/// words already ending in `-s` unchanged, otherwise `+s`.
#[must_use]
pub fn pluralize_word(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('z') {
        return format!("{stem}ces");
    }
    if word.ends_with("ion") {
        return format!("{word}es");
    }
    if word.ends_with('s') {
        return word.to_string();
    }
    format!("{word}s")
}

/// `token`, its singular and the plural of that singular, deduplicated in
/// that order.
#[must_use]
pub fn word_forms(token: &str) -> Vec<String> {
    let singular = singularize_word(token);
    let plural = pluralize_word(&singular);
    let mut forms: Vec<String> = Vec::with_capacity(3);
    for form in [token.to_string(), singular, plural] {
        if !form.is_empty() && !forms.contains(&form) {
            forms.push(form);
        }
    }
    forms
}
