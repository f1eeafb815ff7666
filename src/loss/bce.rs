use crate::math::matrix::Matrix;
use crate::loss::cross_entropy::EPS;

/// Binary cross-entropy for a logistic output layer.
pub struct BceLoss;

impl BceLoss {
    /// Mean over the batch of `-Σ (t·ln(y+ε) + (1-t)·ln(1-y+ε))`.
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        let total: f64 = predicted.data.iter().zip(expected.data.iter())
            .flat_map(|(p_row, e_row)| p_row.iter().zip(e_row.iter()))
            .map(|(p, y)| -(y * (p + EPS).ln() + (1.0 - y) * (1.0 - p + EPS).ln()))
            .sum();
        total / predicted.cols as f64
    }
}
