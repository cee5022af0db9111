//! Smoothed TF-IDF over a fixed vocabulary.
//!
//! `idf(t) = ln((1 + n) / (1 + df(t))) + 1`, raw term counts as term
//! frequency, every row L2-normalized. The vocabulary is sorted so lookups
//! are a binary search and fitting is deterministic.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::analyzer::analyze;

/// Row-major `rows x cols` matrix of f32.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DenseMatrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f32>,
}

impl DenseMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self { rows, cols, data: vec![0.0; rows * cols] }
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [f32] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn is_consistent(&self) -> bool {
        self.data.len() == self.rows * self.cols
    }
}

/// A projected, L2-normalized query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryVector {
    pub values: Vec<f32>,
    /// Distinct analyzed query terms absent from the vocabulary, in query order.
    pub unmatched_terms: Vec<String>,
}

impl QueryVector {
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TfIdfModel {
    vocabulary: Vec<String>,
    idf: Vec<f32>,
    document_count: usize,
}

impl TfIdfModel {
    /// Learn vocabulary and idf from `texts` and return the weighted,
    /// normalized document matrix alongside the model.
    pub fn fit<S: AsRef<str>>(texts: &[S]) -> (Self, DenseMatrix) {
        let analyzed: Vec<Vec<String>> = texts.iter().map(|t| analyze(t.as_ref())).collect();

        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        for terms in &analyzed {
            let unique: BTreeSet<&str> = terms.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let n = texts.len() as f32;
        let vocabulary: Vec<String> = doc_freq.keys().map(|t| t.to_string()).collect();
        let idf: Vec<f32> = doc_freq.values().map(|&df| ((1.0 + n) / (1.0 + df as f32)).ln() + 1.0).collect();
        let model = Self { vocabulary, idf, document_count: texts.len() };

        let mut matrix = DenseMatrix::zeros(texts.len(), model.vocabulary.len());
        for (i, terms) in analyzed.iter().enumerate() {
            let row = matrix.row_mut(i);
            model.accumulate(terms, row);
            l2_normalize(row);
        }
        debug!(documents = model.document_count, terms = model.vocabulary.len(), "fitted tf-idf model");
        (model, matrix)
    }

    /// Project a query onto the fitted vocabulary.
    pub fn transform(&self, query: &str) -> QueryVector {
        let terms = analyze(query);
        let mut values = vec![0.0; self.vocabulary.len()];
        self.accumulate(&terms, &mut values);
        l2_normalize(&mut values);

        let mut unmatched_terms: Vec<String> = Vec::new();
        for term in terms {
            if self.term_index(&term).is_none() && !unmatched_terms.contains(&term) {
                unmatched_terms.push(term);
            }
        }
        QueryVector { values, unmatched_terms }
    }

    fn accumulate(&self, terms: &[String], row: &mut [f32]) {
        for term in terms {
            if let Some(j) = self.term_index(term) {
                row[j] += self.idf[j];
            }
        }
    }

    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.binary_search_by(|t| t.as_str().cmp(term)).ok()
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn idf(&self, term: &str) -> Option<f32> {
        self.term_index(term).map(|j| self.idf[j])
    }

    pub fn document_count(&self) -> usize {
        self.document_count
    }
}

/// Scale to unit length in place; an all-zero vector is left as is.
pub fn l2_normalize(values: &mut [f32]) {
    let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        values.iter_mut().for_each(|v| *v /= norm);
    }
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idf_is_smoothed() {
        let (model, _) = TfIdfModel::fit(&["refund window", "refund desk"]);
        let common = model.idf("refund").unwrap();
        let rare = model.idf("window").unwrap();
        assert!((common - 1.0).abs() < 1e-6);
        assert!((rare - ((3.0f32 / 2.0).ln() + 1.0)).abs() < 1e-6);
    }

    #[test]
    fn rows_are_unit_length_or_zero() {
        let (_, m) = TfIdfModel::fit(&["refund policy refund", "the and of", "discharge summary"]);
        assert!(m.is_consistent());
        let norm = |r: &[f32]| r.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm(m.row(0)) - 1.0).abs() < 1e-5);
        assert_eq!(norm(m.row(1)), 0.0);
        assert!((norm(m.row(2)) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn transform_reports_unmatched_terms_once() {
        let (model, _) = TfIdfModel::fit(&["refund policy"]);
        let q = model.transform("Refund the unicorn unicorn");
        assert_eq!(q.unmatched_terms, vec!["unicorn"]);
        assert!((dot(&q.values, &q.values) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn fully_unknown_query_projects_to_zero() {
        let (model, _) = TfIdfModel::fit(&["refund policy"]);
        assert!(model.transform("zebra").is_zero());
    }
}
