use serde::{Serialize, Deserialize};
use tracing::trace;

use crate::activation::neuron::NeuronType;
use crate::error::{NetError, Result};
use crate::layers::config::LayerConfig;
use crate::layers::kind::LayerKind;
use crate::math::matrix::Matrix;
use crate::tying::{self, SharedGroup, TiedBlock};

/// Index of a layer inside its [`Network`](crate::network::Network).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub usize);

/// A stage of units sharing one nonlinearity and one outgoing weight matrix.
///
/// The weights `W` connect this layer to the layer above; they have one row
/// per unit (plus the bias row when the layer above has a bias) and one
/// column per unit above. `W` is zero wherever the connection mask is zero.
#[derive(Debug)]
pub struct Layer {
    config: LayerConfig,
    weights: Option<Matrix>,
    mask: Option<Matrix>,
    last_delta: Option<Matrix>,
    tied: Vec<TiedBlock>,
    shared: Vec<SharedGroup>,
    frozen: bool,
    net_input: Option<Matrix>,
    activation: Option<Matrix>,
    pub(crate) above: Option<LayerId>,
    pub(crate) below: Option<LayerId>,
}

impl Layer {
    pub fn new(config: LayerConfig) -> Result<Layer> {
        let invalid = |reason: &str| NetError::InvalidLayer {
            layer: config.name.clone(),
            reason: reason.to_string(),
        };

        if config.columns == 0 || config.rows == 0 || config.maps == 0 {
            return Err(invalid("columns, rows and maps must be at least 1"));
        }
        if config.kind == LayerKind::Normal {
            if config.rows != 1 {
                return Err(invalid("normal layers have exactly one row"));
            }
            if config.stride.is_some() || config.feature_side.is_some() {
                return Err(invalid("normal layers take no 2-D stride or feature side"));
            }
        }
        if !(config.learning_rate.is_finite() && config.momentum.is_finite() && config.init_weight.is_finite()) {
            return Err(invalid("hyperparameters must be finite"));
        }
        if config.bias.is_some_and(|b| !b.is_finite()) {
            return Err(invalid("bias must be finite"));
        }

        Ok(Layer {
            config,
            weights: None,
            mask: None,
            last_delta: None,
            tied: Vec::new(),
            shared: Vec::new(),
            frozen: false,
            net_input: None,
            activation: None,
            above: None,
            below: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    pub fn kind(&self) -> LayerKind {
        self.config.kind
    }

    pub fn neuron(&self) -> NeuronType {
        self.config.neuron
    }

    pub fn columns(&self) -> usize {
        self.config.columns
    }

    pub fn rows(&self) -> usize {
        self.config.rows
    }

    pub fn maps(&self) -> usize {
        self.config.maps
    }

    pub fn stride(&self) -> Option<usize> {
        self.config.stride
    }

    pub fn feature_side(&self) -> Option<usize> {
        self.config.feature_side
    }

    pub fn bias(&self) -> Option<f64> {
        self.config.bias
    }

    /// Total unit count, `columns × rows × maps`, excluding any bias unit.
    pub fn units(&self) -> usize {
        self.config.columns * self.config.rows * self.config.maps
    }

    pub fn weights(&self) -> Option<&Matrix> {
        self.weights.as_ref()
    }

    pub fn mask(&self) -> Option<&Matrix> {
        self.mask.as_ref()
    }

    /// Most recent forward-pass output, bias unit included when present.
    pub fn activation(&self) -> Option<&Matrix> {
        self.activation.as_ref()
    }

    pub fn net_input(&self) -> Option<&Matrix> {
        self.net_input.as_ref()
    }

    pub fn tied_blocks(&self) -> &[TiedBlock] {
        &self.tied
    }

    pub fn shared_groups(&self) -> &[SharedGroup] {
        &self.shared
    }

    /// Whether the outgoing weights are excluded from updates.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn above(&self) -> Option<LayerId> {
        self.above
    }

    pub fn below(&self) -> Option<LayerId> {
        self.below
    }

    /// Whether the outgoing weights carry the bias row.
    pub fn has_bias_row(&self) -> bool {
        self.mask.as_ref().is_some_and(|m| m.rows == self.units() + 1)
    }

    /// Overwrites the outgoing weights; the mask is applied to `weights`.
    ///
    /// Every write to `W` multiplies by the stored mask, bias row included, so
    /// a bias value other than 1 scales the bias weights on each write.
    pub fn set_weights(&mut self, weights: Matrix) -> Result<()> {
        let mask = self.mask.as_ref().ok_or_else(|| NetError::NotConnected(self.name().to_string()))?;
        if mask.shape() != weights.shape() {
            return Err(NetError::shape(self.name(), mask, &weights));
        }
        self.weights = Some(weights.hadamard(mask));
        Ok(())
    }

    /// Installs the mask and freshly initialised weights after (re)connection.
    /// Non-empty `shared` groups replace the previous ones; shared positions
    /// and tied blocks are equalized immediately.
    pub(crate) fn install(&mut self, mask: Matrix, mut weights: Matrix, shared: Vec<SharedGroup>, frozen: bool) {
        if !shared.is_empty() {
            self.shared = shared;
        }
        tying::equalize_shared(&mut weights, &self.shared);
        if self.tied.iter().all(|b| b.rows.end <= mask.rows && b.cols.end <= mask.cols) {
            tying::replicate_first(&mut weights, &self.tied);
        } else {
            self.tied.clear();
        }
        self.weights = Some(weights.hadamard(&mask));
        self.mask = Some(mask);
        self.frozen = frozen;
        self.last_delta = None;
    }

    pub(crate) fn set_tied(&mut self, blocks: Vec<TiedBlock>) -> Result<()> {
        let shape = self
            .mask
            .as_ref()
            .map(Matrix::shape)
            .ok_or_else(|| NetError::NotConnected(self.name().to_string()))?;
        tying::validate_blocks(&blocks, shape).map_err(|reason| NetError::InvalidTie {
            layer: self.name().to_string(),
            reason,
        })?;

        if let (Some(w), Some(mask)) = (self.weights.as_mut(), self.mask.as_ref()) {
            tying::replicate_first(w, &blocks);
            *w = w.hadamard(mask);
        }
        self.tied = blocks;
        Ok(())
    }

    /// Stores external data as this input layer's activation.
    pub(crate) fn accept_input(&mut self, batch: &Matrix, bias_above: bool) -> Result<()> {
        if batch.rows != self.units() || batch.cols == 0 {
            return Err(NetError::ShapeMismatch {
                layer: self.name().to_string(),
                expected: (self.units(), batch.cols.max(1)),
                actual: batch.shape(),
            });
        }
        self.net_input = None;
        self.activation = Some(if bias_above { batch.with_ones_row() } else { batch.clone() });
        Ok(())
    }

    /// `y = f(z)`, with the bias unit appended when the layer above has one.
    pub(crate) fn activate(&mut self, z: Matrix, bias_above: bool) {
        let y = self.config.neuron.activate(&z);
        self.activation = Some(if bias_above { y.with_ones_row() } else { y });
        self.net_input = Some(z);
    }

    /// Net input to the layer above, `Wᵗ · y`.
    pub(crate) fn net_input_above(&self) -> Result<Matrix> {
        let w = self.weights.as_ref().ok_or_else(|| NetError::NotConnected(self.name().to_string()))?;
        let y = self.activation.as_ref().ok_or_else(|| NetError::NoForwardPass(self.name().to_string()))?;
        Ok(&w.transpose() * y)
    }

    /// Batch-averaged gradient of the outgoing weights, `y · seedᵗ / batch`.
    pub(crate) fn weight_gradient(&self, seed: &Matrix) -> Result<Matrix> {
        let y = self.activation.as_ref().ok_or_else(|| NetError::NoForwardPass(self.name().to_string()))?;
        let w = self.weights.as_ref().ok_or_else(|| NetError::NotConnected(self.name().to_string()))?;
        if seed.cols != y.cols || seed.rows != w.cols {
            return Err(NetError::ShapeMismatch {
                layer: self.name().to_string(),
                expected: (w.cols, y.cols),
                actual: seed.shape(),
            });
        }
        Ok((y * &seed.transpose()).scale(1.0 / y.cols as f64))
    }

    /// Momentum step on the outgoing weights:
    /// `delta = dW + momentum × previous`, tied and shared positions averaged,
    /// then `W ← (W − lr × delta) ⊙ M`.
    pub(crate) fn apply_update(&mut self, gradient: Matrix) -> Result<()> {
        let bias_row = self.has_bias_row().then(|| self.units());
        let (Some(w), Some(mask)) = (self.weights.take(), self.mask.as_ref()) else {
            return Err(NetError::NotConnected(self.name().to_string()));
        };

        let mut delta = match self.last_delta.take() {
            Some(previous) => gradient + previous.scale(self.config.momentum),
            None => gradient,
        };
        if !self.tied.is_empty() {
            tying::average_tied(&mut delta, &self.tied, bias_row);
        }
        if !self.shared.is_empty() {
            tying::average_shared(&mut delta, &self.shared);
        }

        self.weights = Some((w - delta.scale(self.config.learning_rate)).hadamard(mask));
        self.last_delta = Some(delta);
        trace!(layer = %self.config.name, "applied weight update");
        Ok(())
    }

    /// `dE/dz` at this layer given `dE/dz` of the layer above, with the bias
    /// row of `W` and `y` dropped.
    pub(crate) fn gradient_below(&self, seed: &Matrix) -> Result<Matrix> {
        let name = || self.name().to_string();
        let w = self.weights.as_ref().ok_or_else(|| NetError::NotConnected(name()))?;
        let y = self.activation.as_ref().ok_or_else(|| NetError::NoForwardPass(name()))?;
        let units = self.units();
        let back = &w.top_rows(units) * seed;
        let derivative = self
            .config
            .neuron
            .derivative_from_output(&y.top_rows(units))
            .ok_or_else(|| NetError::SoftmaxNotTerminal(name()))?;
        Ok(back.hadamard(&derivative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_layers_are_one_dimensional() {
        let err = Layer::new(LayerConfig::new("hidden", 3).grid(2, 1, None, None));
        assert!(matches!(err, Err(NetError::InvalidLayer { .. })));

        let err = Layer::new(LayerConfig::new("hidden", 3).grid(1, 1, Some(1), Some(2)));
        assert!(matches!(err, Err(NetError::InvalidLayer { .. })));

        let conv = Layer::new(
            LayerConfig::new("conv", 3).kind(LayerKind::Convolution).grid(3, 2, Some(1), Some(2)),
        )
        .unwrap();
        assert_eq!(conv.units(), 18);
    }

    #[test]
    fn rejects_empty_layers() {
        assert!(Layer::new(LayerConfig::new("empty", 0)).is_err());
    }

    #[test]
    fn activation_appends_bias_unit() {
        let mut layer = Layer::new(LayerConfig::new("hidden", 2)).unwrap();
        layer.activate(Matrix::zeros(2, 3), true);
        let y = layer.activation().unwrap();
        assert_eq!(y.shape(), (3, 3));
        assert_eq!(y.data[2], vec![1.0; 3]);
        assert_eq!(y.get(0, 0), 0.5);
    }

    #[test]
    fn every_weight_write_applies_the_same_mask() {
        let mut layer = Layer::new(LayerConfig::new("input", 2).learning_rate(1.0).momentum(0.0)).unwrap();
        let mut mask = Matrix::filled(2, 2, 1.0);
        mask.data.push(vec![0.5; 2]);
        mask.rows += 1;
        layer.install(mask, Matrix::filled(3, 2, 1.0), Vec::new(), false);
        assert_eq!(layer.weights().unwrap().data[2], vec![0.5; 2]);

        layer.set_weights(Matrix::filled(3, 2, 1.0)).unwrap();
        assert_eq!(layer.weights().unwrap().data[2], vec![0.5; 2]);

        layer.set_tied(vec![TiedBlock::new(0..1, 0..2), TiedBlock::new(1..2, 0..2)]).unwrap();
        assert_eq!(layer.weights().unwrap().data[2], vec![0.25; 2]);

        layer.apply_update(Matrix::zeros(3, 2)).unwrap();
        assert_eq!(layer.weights().unwrap().data[2], vec![0.125; 2]);
        assert_eq!(layer.weights().unwrap().data[0], vec![1.0; 2]);
    }

    #[test]
    fn weights_need_a_connection() {
        let mut layer = Layer::new(LayerConfig::new("hidden", 2)).unwrap();
        assert!(matches!(layer.set_weights(Matrix::zeros(2, 2)), Err(NetError::NotConnected(_))));
        assert!(matches!(layer.set_tied(vec![]), Err(NetError::NotConnected(_))));
    }
}
