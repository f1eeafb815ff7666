//! One-hot encoding of word-index samples for the word-embedding model.
//!
//! A sample is a list of word indices (0-based). Encoded, each word occupies
//! its own `vocab_size`-long segment of the column, so a sample of `n` words
//! becomes a column of `n × vocab_size` units with exactly `n` ones.

use crate::error::{NetError, Result};
use crate::math::matrix::Matrix;

/// Encodes `samples` as a `[(words × vocab_size) × samples]` matrix.
pub fn encode(samples: &[Vec<usize>], vocab_size: usize) -> Result<Matrix> {
    let words = samples.first().map_or(0, Vec::len);
    let mut encoded = Matrix::zeros(words * vocab_size, samples.len());
    for (j, sample) in samples.iter().enumerate() {
        if sample.len() != words {
            return Err(NetError::ShapeMismatch {
                layer: "one_hot".to_string(),
                expected: (words, 1),
                actual: (sample.len(), 1),
            });
        }
        for (i, &word) in sample.iter().enumerate() {
            if word >= vocab_size {
                return Err(NetError::InvalidTraining(format!(
                    "word index {word} outside a vocabulary of {vocab_size}"
                )));
            }
            encoded.data[i * vocab_size + word][j] = 1.0;
        }
    }
    Ok(encoded)
}

/// Recovers the word indices of each column: the argmax of every segment.
pub fn decode(encoded: &Matrix, vocab_size: usize) -> Vec<Vec<usize>> {
    if vocab_size == 0 {
        return vec![Vec::new(); encoded.cols];
    }
    let words = encoded.rows / vocab_size;
    (0..encoded.cols)
        .map(|j| {
            let column = encoded.column(j);
            (0..words)
                .map(|i| argmax(&column[i * vocab_size..(i + 1) * vocab_size]))
                .collect()
        })
        .collect()
}

/// Splits each sample into its context (all but the last word) and the
/// target word (the last one). Empty samples are skipped.
pub fn split_context(samples: &[Vec<usize>]) -> (Vec<Vec<usize>>, Vec<Vec<usize>>) {
    samples
        .iter()
        .filter_map(|s| s.split_last())
        .map(|(target, context)| (context.to_vec(), vec![*target]))
        .unzip()
}

/// Most probable word of every column of an output activation.
pub fn predicted_words(output: &Matrix) -> Vec<usize> {
    (0..output.cols).map(|j| argmax(&output.column(j))).collect()
}

fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
