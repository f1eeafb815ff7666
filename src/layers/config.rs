use serde::{Serialize, Deserialize};

use crate::activation::neuron::NeuronType;
use crate::layers::kind::LayerKind;

/// Construction parameters of a [`Layer`](crate::layers::layer::Layer).
///
/// Fields:
/// - `name`              — unique within a network
/// - `columns`, `rows`   — grid shape; `rows > 1` only for non-normal kinds
/// - `maps`              — parallel feature maps (2-D layers)
/// - `kind`, `neuron`    — layer role and nonlinearity
/// - `momentum`, `learning_rate` — update rule of the outgoing weights
/// - `init_weight`       — scale of the uniform initial weights
/// - `bias`              — when set, layers feeding this one carry a bias unit
/// - `stride`, `feature_side` — 2-D window geometry relative to the layer below
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub name: String,
    pub columns: usize,
    #[serde(default = "one")]
    pub rows: usize,
    #[serde(default = "one")]
    pub maps: usize,
    #[serde(default)]
    pub kind: LayerKind,
    #[serde(default)]
    pub neuron: NeuronType,
    #[serde(default = "default_momentum")]
    pub momentum: f64,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_init_weight")]
    pub init_weight: f64,
    #[serde(default)]
    pub bias: Option<f64>,
    #[serde(default)]
    pub stride: Option<usize>,
    #[serde(default)]
    pub feature_side: Option<usize>,
}

fn one() -> usize {
    1
}

fn default_momentum() -> f64 {
    0.9
}

fn default_learning_rate() -> f64 {
    0.00003
}

fn default_init_weight() -> f64 {
    0.01
}

impl LayerConfig {
    /// A normal logistic layer of `columns` units with default hyperparameters.
    pub fn new(name: impl Into<String>, columns: usize) -> LayerConfig {
        LayerConfig {
            name: name.into(),
            columns,
            rows: 1,
            maps: 1,
            kind: LayerKind::Normal,
            neuron: NeuronType::Logistic,
            momentum: default_momentum(),
            learning_rate: default_learning_rate(),
            init_weight: default_init_weight(),
            bias: None,
            stride: None,
            feature_side: None,
        }
    }

    pub fn kind(mut self, kind: LayerKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn neuron(mut self, neuron: NeuronType) -> Self {
        self.neuron = neuron;
        self
    }

    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }

    pub fn init_weight(mut self, init_weight: f64) -> Self {
        self.init_weight = init_weight;
        self
    }

    pub fn bias(mut self, bias: f64) -> Self {
        self.bias = Some(bias);
        self
    }

    /// 2-D grid of `rows × columns × maps` units, with the window geometry
    /// used when this layer is the target of a 2-D connection.
    pub fn grid(mut self, rows: usize, maps: usize, stride: Option<usize>, feature_side: Option<usize>) -> Self {
        self.rows = rows;
        self.maps = maps;
        self.stride = stride;
        self.feature_side = feature_side;
        self
    }
}
