use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One row of a similarity table: a labelled item and its score against each compared key.
///
/// Keys keep insertion order so that tabular export columns are stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityPlotPoint {
    pub label: String,
    pub similarities: IndexMap<String, f64>,
}

impl SimilarityPlotPoint {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            similarities: IndexMap::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, similarity: f64) {
        self.similarities.insert(key.into(), similarity);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.similarities.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.similarities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.similarities.is_empty()
    }

    /// The highest-scoring key, if any. Ties resolve to the earliest key.
    pub fn best_match(&self) -> Option<(&str, f64)> {
        self.similarities
            .iter()
            .fold(None, |best: Option<(&str, f64)>, (k, v)| match best {
                Some((_, b)) if b >= *v => best,
                _ => Some((k.as_str(), *v)),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_kept() {
        let mut point = SimilarityPlotPoint::new("king");
        point.insert("woman", 0.4);
        point.insert("man", 0.6);
        point.insert("apple", 0.1);
        let keys: Vec<&String> = point.similarities.keys().collect();
        assert_eq!(keys, vec!["woman", "man", "apple"]);
        assert_eq!(point.get("man"), Some(0.6));
        assert_eq!(point.len(), 3);
    }

    #[test]
    fn test_best_match_prefers_first_on_tie() {
        let mut point = SimilarityPlotPoint::new("x");
        assert!(point.best_match().is_none());
        point.insert("a", 0.5);
        point.insert("b", 0.5);
        point.insert("c", 0.2);
        assert_eq!(point.best_match(), Some(("a", 0.5)));
    }
}
