use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::config::{Number, DEFAULT_MAX_FEATURES};
use crate::error::{Error, Result};
use crate::text::analyze;
use crate::vector_ops::normalize_vector;

/// Dense TF-IDF matrix, one row per document in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub rows: Vec<Vec<Number>>,
    pub feature_names: Vec<String>,
}

impl FeatureMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }
}

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    max_features: usize,
    ngram_range: (usize, usize),
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FEATURES)
    }
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            ngram_range: (1, 2),
        }
    }

    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Self {
        self.ngram_range = (min_n, max_n);
        self
    }

    /// Learn the vocabulary and idf weights from `documents` and return their
    /// L2-normalized TF-IDF rows.
    pub fn fit_transform<S: AsRef<str> + Sync>(&self, documents: &[S]) -> Result<FeatureMatrix> {
        if documents.is_empty() {
            return Err(Error::EmptyInput);
        }
        if self.max_features == 0 {
            return Err(Error::InvalidParameter {
                name: "max_features",
                message: "must be at least 1".to_string(),
            });
        }

        let ngram_range = self.ngram_range;
        let counts: Vec<HashMap<String, u64>> = documents
            .par_iter()
            .map(|doc| {
                let mut tf = HashMap::new();
                for gram in analyze(doc.as_ref(), ngram_range) {
                    *tf.entry(gram).or_insert(0u64) += 1;
                }
                tf
            })
            .collect();

        // Alphabetical vocabulary with corpus-wide counts.
        let mut corpus_counts: BTreeMap<&str, u64> = BTreeMap::new();
        for tf in &counts {
            for (term, &count) in tf {
                *corpus_counts.entry(term.as_str()).or_insert(0) += count;
            }
        }

        if corpus_counts.is_empty() {
            return Err(Error::EmptyVocabulary);
        }

        let feature_names = self.limit_features(&corpus_counts);
        let index: HashMap<&str, usize> = feature_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        let n_docs = documents.len();
        let mut document_frequency = vec![0u64; feature_names.len()];
        for tf in &counts {
            for term in tf.keys() {
                if let Some(&col) = index.get(term.as_str()) {
                    document_frequency[col] += 1;
                }
            }
        }

        let idf: Vec<Number> = document_frequency
            .iter()
            .map(|&df| ((1.0 + n_docs as f64) / (1.0 + df as f64)).ln() as Number + 1.0)
            .collect();

        let rows = counts
            .par_iter()
            .map(|tf| {
                let mut row = vec![0.0; feature_names.len()];
                for (term, &count) in tf {
                    if let Some(&col) = index.get(term.as_str()) {
                        row[col] = count as Number * idf[col];
                    }
                }
                normalize_vector(&mut row);
                row
            })
            .collect();

        debug!(
            documents = n_docs,
            vocabulary = corpus_counts.len(),
            features = feature_names.len(),
            "Vectorized documents"
        );

        Ok(FeatureMatrix {
            rows,
            feature_names,
        })
    }

    /// Keep the `max_features` most frequent terms, returned alphabetically.
    fn limit_features(&self, corpus_counts: &BTreeMap<&str, u64>) -> Vec<String> {
        let mut terms: Vec<(&str, u64)> = corpus_counts.iter().map(|(t, &c)| (*t, c)).collect();
        if terms.len() > self.max_features {
            // Stable sort: equal counts keep alphabetical order.
            terms.sort_by(|a, b| b.1.cmp(&a.1));
            terms.truncate(self.max_features);
            terms.sort_by(|a, b| a.0.cmp(b.0));
        }
        terms.into_iter().map(|(t, _)| t.to_string()).collect()
    }
}
