//! UTF-8 safe offset helpers.
//!
//! Speech offsets are byte offsets into node and group text. Engines and hosts
//! can hand us offsets that land inside a multi-byte character, so every slice
//! goes through these helpers instead of indexing directly.

/// Largest char boundary that is `<= idx`, clamped to `s.len()`.
pub fn floor_char_boundary(s: &str, idx: usize) -> usize {
    if idx >= s.len() {
        return s.len();
    }
    let mut idx = idx;
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Suffix of `s` starting at byte offset `from` (floored to a char boundary).
pub fn safe_tail(s: &str, from: usize) -> &str {
    &s[floor_char_boundary(s, from)..]
}

/// Byte offset of the first non-whitespace character, or `s.len()`.
pub fn first_non_whitespace(s: &str) -> usize {
    s.char_indices()
        .find(|(_, ch)| !ch.is_whitespace())
        .map(|(idx, _)| idx)
        .unwrap_or(s.len())
}

/// True when `s` is empty or only whitespace.
pub fn is_blank(s: &str) -> bool {
    s.chars().all(char::is_whitespace)
}

/// Replaces the first `count` bytes of `s` with ASCII spaces.
///
/// The result has the same byte length as `s` whenever `count` falls on a char
/// boundary, which keeps every later offset valid.
pub fn blank_prefix(s: &str, count: usize) -> String {
    let cut = floor_char_boundary(s, count);
    let mut out = String::with_capacity(s.len());
    out.extend(std::iter::repeat(' ').take(cut));
    out.push_str(&s[cut..]);
    out
}

/// Returns a prefix of the string up to `max_chars` characters.
/// Used to keep content snippets in logs short.
pub fn safe_prefix(s: &str, max_chars: usize) -> &str {
    if s.is_empty() || max_chars == 0 {
        return "";
    }
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
