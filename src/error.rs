//! Error type shared by every engine operation.
//!
//! All variants describe either a configuration mistake (bad shape, illegal
//! kind pair, out-of-range subset) or a usage-sequencing mistake (backward
//! without a forward pass). None of them is transient.

use crate::layers::kind::LayerKind;
use crate::math::matrix::Matrix;

pub type Result<T> = std::result::Result<T, NetError>;

#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("Invalid layer '{layer}': {reason}")]
    InvalidLayer { layer: String, reason: String },

    #[error("Duplicate layer name '{0}'")]
    DuplicateLayer(String),

    #[error("Unknown layer: {0}")]
    UnknownLayer(String),

    #[error("Cannot connect {from_kind} layer '{from}' to {to_kind} layer '{to}'")]
    InvalidConnection {
        from: String,
        to: String,
        from_kind: LayerKind,
        to_kind: LayerKind,
    },

    #[error("Layer '{layer}' is already linked to '{existing}'")]
    AlreadyLinked { layer: String, existing: String },

    #[error("Connecting '{from}' to '{to}' would close a cycle")]
    Cycle { from: String, to: String },

    #[error("Subset {start}..{end} is out of range for layer '{layer}' with {units} units")]
    SubsetOutOfRange {
        layer: String,
        start: usize,
        end: usize,
        units: usize,
    },

    #[error("Subsets are not allowed on {kind} layer '{layer}'")]
    SubsetNotAllowed { layer: String, kind: LayerKind },

    #[error("Layer '{0}' needs a 2-D stride and feature side length")]
    MissingGeometry(String),

    #[error("Feature window at ({row}, {col}) does not fit inside layer '{layer}'")]
    WindowOutOfRange { layer: String, row: usize, col: usize },

    #[error("Layer '{0}' has no outgoing connection")]
    NotConnected(String),

    #[error("Invalid tied blocks on layer '{layer}': {reason}")]
    InvalidTie { layer: String, reason: String },

    #[error("Shape mismatch on layer '{layer}': expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        layer: String,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Unknown neuron type: {0}")]
    UnknownNeuronType(String),

    #[error("Unknown layer kind: {0}")]
    UnknownLayerKind(String),

    #[error("Layer '{0}' is not an input layer")]
    NotInput(String),

    #[error("Layer '{0}' is not the output layer")]
    NotTerminal(String),

    #[error("Layer '{0}' has no activation; run a forward pass first")]
    NoForwardPass(String),

    #[error("Cannot backpropagate through softmax layer '{0}'; softmax must be the output layer")]
    SoftmaxNotTerminal(String),

    #[error("Invalid training configuration: {0}")]
    InvalidTraining(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NetError {
    pub(crate) fn shape(layer: &str, expected: &Matrix, actual: &Matrix) -> NetError {
        NetError::ShapeMismatch {
            layer: layer.to_string(),
            expected: expected.shape(),
            actual: actual.shape(),
        }
    }
}
