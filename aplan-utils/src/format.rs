//! Text helpers used by the renderers.
//!
//! Only the renderer-facing slice of text manipulation lives here; the
//! heavyweight source normalization (operator spacing, literal rewriting,
//! ternary translation) is a front-end concern outside this workspace.
use lazy_static::lazy_static;
use regex::{NoExpand, Regex};

lazy_static! {
    static ref BGET_CALL: Regex = Regex::new(r"(BGET\(.+\))").unwrap();
    static ref CALL_NAME: Regex = Regex::new(r"\b([\w$]+)\s*\(").unwrap();
}

/// Strip any trailing commas from `s`.
pub fn remove_trailing_comma(s: &str) -> &str {
    s.trim_end_matches(',')
}

/// Rewrite every `BGET(...)` call in `expression` to `BGET(...) == 1`.
/// Preconditions are boolean formulas, so a bare bit access is compared
/// against one.
pub fn equate_bget(expression: &str) -> String {
    BGET_CALL.replace_all(expression, "$1 == 1").into_owned()
}

/// Replace every whole-word occurrence of `word` in `text` with
/// `replacement`. Substring hits inside longer identifiers are left alone.
pub fn replace_whole_word(text: &str, word: &str, replacement: &str) -> String {
    if word.is_empty() {
        return text.to_string();
    }
    let pattern = format!(r"\b{}\b", regex::escape(word));
    match Regex::new(&pattern) {
        Ok(re) => re.replace_all(text, NoExpand(replacement)).into_owned(),
        Err(_) => text.to_string(),
    }
}

/// Replace the first whole-word occurrence of `word` in `text`, reporting
/// whether a replacement happened.
pub fn replace_whole_word_first(
    text: &str,
    word: &str,
    replacement: &str,
) -> (String, bool) {
    if word.is_empty() {
        return (text.to_string(), false);
    }
    let pattern = format!(r"\b{}\b", regex::escape(word));
    match Regex::new(&pattern) {
        Ok(re) if re.is_match(text) => {
            (re.replace(text, NoExpand(replacement)).into_owned(), true)
        }
        _ => (text.to_string(), false),
    }
}

/// True when `word` occurs as a whole word inside `text`.
pub fn contains_whole_word(text: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let pattern = format!(r"\b{}\b", regex::escape(word));
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(text),
        Err(_) => false,
    }
}

/// Extract the callee name from a call-style expression, e.g.
/// `"read_data(x, y)"` yields `Some("read_data")`.
pub fn extract_call_name(expression: &str) -> Option<String> {
    CALL_NAME
        .captures(expression)
        .map(|caps| caps[1].to_string())
}

/// True when `s` is a non-empty decimal literal.
pub fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// True when `s` is exactly the unary-or operator.
pub fn is_lone_pipe(s: &str) -> bool {
    s == "|"
}
