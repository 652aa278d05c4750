//! TF-IDF feature pipeline over normalized notices.
//!
//! The vocabulary and IDF weights are frozen by [`FittedVocabulary::fit`];
//! [`FittedVocabulary::transform`] never grows them.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::NormalizedNotice;

/// Knobs for vocabulary construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Longest n-gram (in tokens) added to the vocabulary.
    pub max_ngram: usize,
    /// Terms seen in fewer documents than this are not kept.
    pub min_df: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            max_ngram: 2,
            min_df: 1,
        }
    }
}

/// Sparse feature vector of a fixed, fitted dimensionality.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    dim: usize,
    /// `(index, weight)` pairs sorted by index, no zero weights.
    entries: Vec<(usize, f64)>,
}

impl FeatureVector {
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn dot(&self, weights: &[f64]) -> f64 {
        self.entries
            .iter()
            .map(|&(i, w)| weights.get(i).copied().unwrap_or(0.0) * w)
            .sum()
    }

    /// Dense view, mostly useful for tests and debugging.
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dim];
        for &(i, w) in &self.entries {
            dense[i] = w;
        }
        dense
    }
}

/// Fitted term → column mapping plus smoothed IDF weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedVocabulary {
    config: FeatureConfig,
    terms: BTreeMap<String, usize>,
    idf: Vec<f64>,
    documents: usize,
}

impl FittedVocabulary {
    /// Build the vocabulary from a training corpus.
    ///
    /// Column indices follow the lexical order of terms, so the same corpus
    /// always yields the same feature space.
    pub fn fit(corpus: &[NormalizedNotice], config: &FeatureConfig) -> Self {
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();

        for notice in corpus {
            let unique: BTreeSet<String> = ngrams(notice.tokens(), config.max_ngram).collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let n = corpus.len() as f64;
        let mut terms = BTreeMap::new();
        let mut idf = Vec::new();
        for (term, df) in document_frequency {
            if df < config.min_df.max(1) {
                continue;
            }
            terms.insert(term, idf.len());
            // IDF = ln((N + 1) / (df + 1)) + 1
            idf.push(((n + 1.0) / (df as f64 + 1.0)).ln() + 1.0);
        }

        debug!(
            documents = corpus.len(),
            terms = terms.len(),
            max_ngram = config.max_ngram,
            "fitted vocabulary"
        );

        Self {
            config: config.clone(),
            terms,
            idf,
            documents: corpus.len(),
        }
    }

    /// Dimensionality of every vector this vocabulary produces.
    pub fn dim(&self) -> usize {
        self.idf.len()
    }

    pub fn documents(&self) -> usize {
        self.documents
    }

    /// Whether a deserialized vocabulary can be used by [`transform`](Self::transform):
    /// one IDF weight per term, and term indices forming exactly `0..dim`.
    pub fn is_consistent(&self) -> bool {
        if self.terms.len() != self.idf.len() || self.idf.iter().any(|w| !w.is_finite()) {
            return false;
        }
        let mut seen = vec![false; self.idf.len()];
        for &idx in self.terms.values() {
            match seen.get_mut(idx) {
                Some(slot) if !*slot => *slot = true,
                _ => return false,
            }
        }
        true
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }

    /// L2-normalized TF-IDF vector. Unknown terms contribute nothing.
    pub fn transform(&self, notice: &NormalizedNotice) -> FeatureVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in ngrams(notice.tokens(), self.config.max_ngram) {
            if let Some(&idx) = self.terms.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx]))
            .collect();

        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut entries {
                *w /= norm;
            }
        }

        FeatureVector {
            dim: self.dim(),
            entries,
        }
    }

    pub fn transform_batch(&self, notices: &[NormalizedNotice]) -> Vec<FeatureVector> {
        notices.iter().map(|n| self.transform(n)).collect()
    }
}

/// All n-grams of length 1..=max_n, joined with a single space.
fn ngrams(tokens: &[String], max_n: usize) -> impl Iterator<Item = String> + '_ {
    (1..=max_n.max(1)).flat_map(move |n| tokens.windows(n).map(|w| w.join(" ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice(text: &str) -> NormalizedNotice {
        NormalizedNotice::new(text.split_whitespace().map(str::to_string).collect())
    }

    fn corpus() -> Vec<NormalizedNotice> {
        vec![
            notice("copyright © __year__ acme corp"),
            notice("copyright __year__ jane doe"),
            notice("function copyright return"),
        ]
    }

    #[test]
    fn test_fit_builds_unigrams_and_bigrams() {
        let vocab = FittedVocabulary::fit(&corpus(), &FeatureConfig::default());
        assert!(vocab.contains("copyright"));
        assert!(vocab.contains("acme corp"));
        assert!(vocab.contains("copyright return"));
        assert!(!vocab.contains("acme doe"));
        assert_eq!(vocab.documents(), 3);
    }

    #[test]
    fn test_unigram_only() {
        let config = FeatureConfig {
            max_ngram: 1,
            min_df: 1,
        };
        let vocab = FittedVocabulary::fit(&corpus(), &config);
        assert!(vocab.contains("acme"));
        assert!(!vocab.contains("acme corp"));
        // copyright, ©, __year__, acme, corp, jane, doe, function, return
        assert_eq!(vocab.dim(), 9);
    }

    #[test]
    fn test_min_df_prunes_rare_terms() {
        let config = FeatureConfig {
            max_ngram: 1,
            min_df: 2,
        };
        let vocab = FittedVocabulary::fit(&corpus(), &config);
        assert!(vocab.contains("copyright"));
        assert!(vocab.contains("__year__"));
        assert!(!vocab.contains("acme"));
        assert_eq!(vocab.dim(), 2);
    }

    #[test]
    fn test_transform_dimension_and_oov() {
        let vocab = FittedVocabulary::fit(&corpus(), &FeatureConfig::default());
        let v = vocab.transform(&notice("entirely unseen words"));
        assert_eq!(v.dim(), vocab.dim());
        assert!(v.entries().is_empty());

        let v = vocab.transform(&notice("copyright unseen"));
        assert_eq!(v.dim(), vocab.dim());
        assert_eq!(v.entries().len(), 1);
    }

    #[test]
    fn test_transform_is_l2_normalized() {
        let vocab = FittedVocabulary::fit(&corpus(), &FeatureConfig::default());
        let v = vocab.transform(&notice("copyright © __year__ acme corp"));
        let norm: f64 = v.to_dense().iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rarer_terms_weigh_more() {
        let config = FeatureConfig {
            max_ngram: 1,
            min_df: 1,
        };
        let vocab = FittedVocabulary::fit(&corpus(), &config);
        let v = vocab.transform(&notice("copyright acme"));
        let dense = v.to_dense();
        let copyright = dense.iter().copied().filter(|w| *w > 0.0).fold(f64::MAX, f64::min);
        let acme = dense.iter().copied().fold(0.0, f64::max);
        assert!(acme > copyright);
    }

    #[test]
    fn test_consistency_check() {
        let vocab = FittedVocabulary::fit(&corpus(), &FeatureConfig::default());
        assert!(vocab.is_consistent());

        let mut bad_index = vocab.clone();
        if let Some(idx) = bad_index.terms.values_mut().next() {
            *idx = 9999;
        }
        assert!(!bad_index.is_consistent());

        let mut duplicate = vocab.clone();
        let first = *duplicate.terms.values().next().unwrap();
        if let Some(idx) = duplicate.terms.values_mut().nth(1) {
            *idx = first;
        }
        assert!(!duplicate.is_consistent());

        let mut short_idf = vocab.clone();
        short_idf.idf.pop();
        assert!(!short_idf.is_consistent());

        let mut nan = vocab;
        nan.idf[0] = f64::NAN;
        assert!(!nan.is_consistent());
    }

    #[test]
    fn test_empty_corpus_and_notice() {
        let vocab = FittedVocabulary::fit(&[], &FeatureConfig::default());
        assert_eq!(vocab.dim(), 0);
        let v = vocab.transform(&NormalizedNotice::default());
        assert_eq!(v.dim(), 0);
        assert!(v.entries().is_empty());
    }
}
