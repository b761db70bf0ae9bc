//! Similarity engine: tf-idf weighted sparse vectors over the run's documents
//! and the full pairwise cosine matrix.
//!
//! The vocabulary is rebuilt from scratch every run; nothing is persisted
//! across runs. Weighting uses the smoothed formula
//! `idf = ln((1 + n) / (1 + df)) + 1`, so no in-vocabulary term ever gets a
//! zero weight and all cosines stay in `[0, 1]`.

use std::collections::{BTreeMap, HashMap};

/// Symmetric pairwise cosine matrix with unit diagonal, stored row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.values[row * self.size + column]
    }
}

/// Computes the document-by-document cosine similarity matrix.
///
/// Degenerate inputs are well defined: zero documents produce an empty
/// matrix, a single document a 1×1 unit matrix, and a document with no
/// tokens compares as 0.0 against everything but itself.
pub fn similarity_matrix(documents: &[String]) -> SimilarityMatrix {
    let vectors = vectorize(documents);
    let size = vectors.len();
    let mut values = vec![0.0; size * size];

    for row in 0..size {
        values[row * size + row] = 1.0;
        for column in (row + 1)..size {
            let score = sparse_dot(&vectors[row], &vectors[column]);
            values[row * size + column] = score;
            values[column * size + row] = score;
        }
    }

    SimilarityMatrix { size, values }
}

/// One l2-normalized sparse tf-idf vector, term indices ascending.
type SparseVector = Vec<(usize, f64)>;

fn vectorize(documents: &[String]) -> Vec<SparseVector> {
    let tokenized: Vec<Vec<String>> = documents.iter().map(|doc| tokenize(doc)).collect();

    // Deterministic vocabulary: lexicographic term order.
    let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
    for tokens in &tokenized {
        let mut seen: Vec<&str> = tokens.iter().map(String::as_str).collect();
        seen.sort_unstable();
        seen.dedup();
        for term in seen {
            *document_frequency.entry(term).or_insert(0) += 1;
        }
    }

    let vocabulary: HashMap<&str, usize> = document_frequency
        .keys()
        .enumerate()
        .map(|(index, term)| (*term, index))
        .collect();

    let total = documents.len() as f64;
    let idf: Vec<f64> = document_frequency
        .values()
        .map(|df| ((1.0 + total) / (1.0 + *df as f64)).ln() + 1.0)
        .collect();

    tokenized
        .iter()
        .map(|tokens| {
            let mut counts: HashMap<usize, f64> = HashMap::new();
            for token in tokens {
                if let Some(&term_index) = vocabulary.get(token.as_str()) {
                    *counts.entry(term_index).or_insert(0.0) += 1.0;
                }
            }

            let mut vector: SparseVector = counts
                .into_iter()
                .map(|(term_index, count)| (term_index, count * idf[term_index]))
                .collect();
            vector.sort_unstable_by_key(|(term_index, _)| *term_index);
            l2_normalize(&mut vector);
            vector
        })
        .collect()
}

fn tokenize(document: &str) -> Vec<String> {
    document.split_whitespace().map(str::to_lowercase).collect()
}

fn l2_normalize(vector: &mut SparseVector) {
    let norm = vector.iter().map(|(_, weight)| weight * weight).sum::<f64>().sqrt();
    if norm > 0.0 {
        for (_, weight) in vector.iter_mut() {
            *weight /= norm;
        }
    }
}

/// Dot product of two normalized sparse vectors; a zero-norm operand yields
/// 0.0 rather than a division failure.
fn sparse_dot(left: &SparseVector, right: &SparseVector) -> f64 {
    let mut left_iter = left.iter().peekable();
    let mut right_iter = right.iter().peekable();
    let mut dot = 0.0;

    while let (Some((left_term, left_weight)), Some((right_term, right_weight))) =
        (left_iter.peek(), right_iter.peek())
    {
        match left_term.cmp(right_term) {
            std::cmp::Ordering::Less => {
                left_iter.next();
            }
            std::cmp::Ordering::Greater => {
                right_iter.next();
            }
            std::cmp::Ordering::Equal => {
                dot += left_weight * right_weight;
                left_iter.next();
                right_iter.next();
            }
        }
    }

    dot
}
