//! ROUGE-N overlap scoring.

use std::collections::HashSet;

const SEPARATORS: &[char] = &[' ', '\n', '\r', '.', ',', ';', ':', '!', '?', '-'];

/// Split on spaces, line breaks and sentence punctuation, dropping empty tokens. Case is
/// preserved.
///
/// Tabs and other Unicode spaces are not separators, so `"a\tb"` is a single token.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split(SEPARATORS).filter(|t| !t.is_empty()).collect()
}

/// Distinct contiguous `n`-grams of `text`, each joined with a single space.
pub fn ngrams(text: &str, n: usize) -> HashSet<String> {
    if n == 0 {
        return HashSet::new();
    }
    tokenize(text).windows(n).map(|w| w.join(" ")).collect()
}

/// ROUGE-N F1 between a reference and a generated text.
///
/// Overlap is counted over distinct n-grams. Returns 0 when `n` is 0, when either text has no
/// n-grams, or when nothing overlaps.
pub fn rouge_n(reference: &str, generated: &str, n: usize) -> f64 {
    let reference = ngrams(reference, n);
    let generated = ngrams(generated, n);
    if reference.is_empty() || generated.is_empty() {
        return 0.0;
    }

    let overlap = reference.intersection(&generated).count();
    if overlap == 0 {
        return 0.0;
    }

    let recall = overlap as f64 / reference.len() as f64;
    let precision = overlap as f64 / generated.len() as f64;
    2.0 * precision * recall / (precision + recall)
}

/// ROUGE-1 and ROUGE-2 for the pair.
pub fn rouge_scores(reference: &str, generated: &str) -> (f64, f64) {
    (rouge_n(reference, generated, 1), rouge_n(reference, generated, 2))
}
