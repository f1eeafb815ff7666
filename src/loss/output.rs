use crate::activation::neuron::NeuronType;
use crate::loss::{bce::BceLoss, cross_entropy::CrossEntropyLoss, mse::MseLoss};
use crate::math::matrix::Matrix;

/// Cost paired with an output layer's neuron type.
///
/// Each pairing is the canonical one for its nonlinearity, so the gradient of
/// the cost w.r.t. the output net input is always `y - target`:
/// - `Softmax`  → categorical cross-entropy
/// - `Logistic` → binary cross-entropy
/// - `Linear`   → half squared error
pub fn output_cost(neuron: NeuronType, predicted: &Matrix, expected: &Matrix) -> f64 {
    match neuron {
        NeuronType::Softmax => CrossEntropyLoss::loss(predicted, expected),
        NeuronType::Logistic => BceLoss::loss(predicted, expected),
        NeuronType::Linear => MseLoss::loss(predicted, expected),
    }
}

/// `dE/dz` at the output layer: `y - target`.
pub fn output_gradient(predicted: &Matrix, expected: &Matrix) -> Matrix {
    predicted.clone() - expected.clone()
}
