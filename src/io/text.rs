//! Word lists from the command line or from text files.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

use crate::{Error, ErrorContext, Result};

static INVISIBLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new("[\t\r\n\x0B\x0C\x08\x00\u{200B}\u{00A0}\u{2028}\u{2029}]").expect("valid regex")
});
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));

/// Split a comma-separated list, trimming items and dropping empty ones. Case is kept.
pub fn parse_word_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Remove line breaks and invisible characters, split on commas, then strip punctuation and
/// lowercase each item.
pub fn clean_and_split_text(text: &str) -> Vec<String> {
    let flattened = INVISIBLE.replace_all(text, "");
    flattened
        .split(',')
        .map(|segment| PUNCTUATION.replace_all(segment.trim(), "").to_lowercase())
        .filter(|w| !w.trim().is_empty())
        .collect()
}

/// Words of a comma-separated text file, cleaned with [`clean_and_split_text`].
pub fn read_words_file(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::not_found_with_context(
            format!("Word file does not exist: {}", path.display()),
            ErrorContext::new()
                .with_field_path(path.display().to_string())
                .with_source("text"),
        ));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(clean_and_split_text(&content))
}

pub fn is_text_file_path(input: &str) -> bool {
    Path::new(input)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("txt"))
        .unwrap_or(false)
}

/// Interpret a word argument: a `.txt` name is read from `words_dir` (or as given, if it is
/// already a path that exists), anything else is a comma-separated list.
pub fn resolve_word_input(input: &str, words_dir: &Path) -> Result<Vec<String>> {
    if !is_text_file_path(input) {
        return Ok(parse_word_list(input));
    }
    let direct = PathBuf::from(input);
    let path = if direct.is_file() {
        direct
    } else {
        words_dir.join(input)
    };
    read_words_file(path)
}
