use crate::math::matrix::Matrix;

/// Half squared error for a linear output layer.
pub struct MseLoss;

impl MseLoss {
    /// Mean over the batch of `½ Σ (y - t)²`, whose gradient w.r.t. `y` is
    /// `y - t`.
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        let total: f64 = predicted.data.iter().zip(expected.data.iter())
            .flat_map(|(p_row, e_row)| p_row.iter().zip(e_row.iter()))
            .map(|(a, b)| 0.5 * (a - b).powi(2))
            .sum();
        total / predicted.cols as f64
    }
}
