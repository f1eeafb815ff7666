use crate::math::matrix::Matrix;

/// Categorical cross-entropy for a softmax output layer.
pub struct CrossEntropyLoss;

/// Added inside ln() so that a zero probability costs 20 instead of infinity.
pub const EPS: f64 = 2.061_153_622_438_558e-9; // e^-20

impl CrossEntropyLoss {
    /// Mean over the batch of `-Σ_class target · ln(y + ε)`.
    ///
    /// `predicted` and `expected` are `[classes × batch]`; each column is one
    /// sample.
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        let total: f64 = predicted.data.iter().zip(expected.data.iter())
            .flat_map(|(p_row, e_row)| p_row.iter().zip(e_row.iter()))
            .map(|(p, e)| -e * (p + EPS).ln())
            .sum();
        total / predicted.cols as f64
    }
}
