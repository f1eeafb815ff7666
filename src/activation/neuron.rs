use serde::{Serialize, Deserialize};
use std::f64::consts::E;
use std::fmt;
use std::str::FromStr;

use crate::error::NetError;
use crate::math::matrix::Matrix;

/// Nonlinearity shared by every unit of a layer.
///
/// Activations are applied column-wise: each column of the net-input matrix
/// is one sample of the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeuronType {
    Linear,
    #[default]
    Logistic,
    /// Vector-valued; normalises each column into a categorical distribution.
    Softmax,
}

impl NeuronType {
    /// `y = f(z)` for a whole batch.
    pub fn activate(&self, z: &Matrix) -> Matrix {
        match self {
            NeuronType::Logistic => z.map(|x| 1.0 / (1.0 + E.powf(-x))),
            NeuronType::Linear => z.clone(),
            NeuronType::Softmax => softmax(z),
        }
    }

    /// `dy/dz` expressed through the activation `y`, element-wise.
    ///
    /// `None` for softmax: its Jacobian is not diagonal, and the engine only
    /// ever uses softmax as the output layer where the cost gradient already
    /// folds it in.
    pub fn derivative_from_output(&self, y: &Matrix) -> Option<Matrix> {
        match self {
            NeuronType::Logistic => Some(y.map(|v| v * (1.0 - v))),
            NeuronType::Linear => Some(y.map(|_| 1.0)),
            NeuronType::Softmax => None,
        }
    }
}

/// Softmax over each column after subtracting that column's maximum.
fn softmax(z: &Matrix) -> Matrix {
    let mut exp = z.clone();
    for j in 0..exp.cols {
        let max = z.column_max(j);
        for i in 0..exp.rows {
            exp.data[i][j] = (exp.data[i][j] - max).exp();
        }
        let total: f64 = (0..exp.rows).map(|i| exp.data[i][j]).sum();
        for i in 0..exp.rows {
            exp.data[i][j] /= total;
        }
    }
    exp
}

impl fmt::Display for NeuronType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NeuronType::Linear => "linear",
            NeuronType::Logistic => "logistic",
            NeuronType::Softmax => "softmax",
        };
        f.write_str(name)
    }
}

impl FromStr for NeuronType {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(NeuronType::Linear),
            "logistic" => Ok(NeuronType::Logistic),
            "softmax" => Ok(NeuronType::Softmax),
            other => Err(NetError::UnknownNeuronType(other.to_string())),
        }
    }
}
