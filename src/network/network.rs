use std::ops::Range;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, trace};

use crate::activation::neuron::NeuronType;
use crate::connectivity::{self, Grid};
use crate::error::{NetError, Result};
use crate::layers::config::LayerConfig;
use crate::layers::kind::LayerKind;
use crate::layers::layer::{Layer, LayerId};
use crate::loss::output::{output_cost, output_gradient};
use crate::math::matrix::Matrix;
use crate::tying::TiedBlock;

/// Owns every layer of a linear chain, input at the bottom and the output
/// layer at the top. Layers refer to their neighbours by [`LayerId`].
pub struct Network {
    pub(crate) layers: Vec<Layer>,
    rng: StdRng,
}

impl Default for Network {
    fn default() -> Self {
        Network::new()
    }
}

impl Network {
    /// Empty network whose weights are initialised from OS entropy.
    pub fn new() -> Network {
        Network { layers: Vec::new(), rng: StdRng::from_entropy() }
    }

    /// Empty network with reproducible weight initialisation.
    pub fn with_seed(seed: u64) -> Network {
        Network { layers: Vec::new(), rng: StdRng::seed_from_u64(seed) }
    }

    /// Adds an unconnected layer. Names must be unique.
    pub fn add_layer(&mut self, config: LayerConfig) -> Result<LayerId> {
        if self.layers.iter().any(|l| l.name() == config.name) {
            return Err(NetError::DuplicateLayer(config.name));
        }
        let layer = Layer::new(config)?;
        self.layers.push(layer);
        Ok(LayerId(self.layers.len() - 1))
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Result<&Layer> {
        self.layers.get(id.0).ok_or_else(|| NetError::UnknownLayer(format!("#{}", id.0)))
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Result<&mut Layer> {
        self.layers.get_mut(id.0).ok_or_else(|| NetError::UnknownLayer(format!("#{}", id.0)))
    }

    pub fn id_of(&self, name: &str) -> Result<LayerId> {
        self.layers
            .iter()
            .position(|l| l.name() == name)
            .map(LayerId)
            .ok_or_else(|| NetError::UnknownLayer(name.to_string()))
    }

    /// The input layer at the bottom of the chain, if one has been added.
    pub fn input_layer(&self) -> Option<LayerId> {
        self.layers
            .iter()
            .position(|l| l.kind() == LayerKind::Input && l.below.is_none())
            .map(LayerId)
    }

    /// The terminal layer reached by walking up from the input layer.
    pub fn output_layer(&self) -> Option<LayerId> {
        let mut current = self.input_layer()?;
        while let Some(above) = self.layers[current.0].above {
            current = above;
        }
        Some(current)
    }

    /// Adds connections from `from` to the layer above it, `to`.
    ///
    /// Between normal endpoints (`normal → normal`, `input → normal`) every
    /// pair in `from_subset × to_subset` is connected, the subsets defaulting
    /// to all units. Between 2-D endpoints (input, convolution, pooling) the
    /// connections follow `to`'s stride and feature windows. Repeated calls
    /// accumulate into the same mask; the weights are re-initialised each time.
    pub fn connect(
        &mut self,
        from: LayerId,
        to: LayerId,
        from_subset: Option<Range<usize>>,
        to_subset: Option<Range<usize>>,
    ) -> Result<()> {
        self.layer(from)?;
        self.layer(to)?;
        let source = &self.layers[from.0];
        let target = &self.layers[to.0];

        if from == to {
            return Err(NetError::Cycle { from: source.name().to_string(), to: target.name().to_string() });
        }
        if let Some(existing) = source.above.filter(|&id| id != to) {
            return Err(NetError::AlreadyLinked {
                layer: source.name().to_string(),
                existing: self.layers[existing.0].name().to_string(),
            });
        }
        if let Some(existing) = target.below.filter(|&id| id != from) {
            return Err(NetError::AlreadyLinked {
                layer: target.name().to_string(),
                existing: self.layers[existing.0].name().to_string(),
            });
        }
        let mut cursor = target.above;
        while let Some(id) = cursor {
            if id == from {
                return Err(NetError::Cycle { from: source.name().to_string(), to: target.name().to_string() });
            }
            cursor = self.layers[id.0].above;
        }

        let invalid_pair = || NetError::InvalidConnection {
            from: source.name().to_string(),
            to: target.name().to_string(),
            from_kind: source.kind(),
            to_kind: target.kind(),
        };
        let two_dimensional = match (source.kind(), target.kind()) {
            (_, LayerKind::Input) => return Err(invalid_pair()),
            (LayerKind::Normal | LayerKind::Input, LayerKind::Normal) => false,
            (LayerKind::Normal, _) | (_, LayerKind::Normal) => return Err(invalid_pair()),
            _ => true,
        };

        if from_subset.is_some() && !source.kind().accepts_subsets() {
            return Err(NetError::SubsetNotAllowed { layer: source.name().to_string(), kind: source.kind() });
        }
        if to_subset.is_some() && target.kind() != LayerKind::Normal {
            return Err(NetError::SubsetNotAllowed { layer: target.name().to_string(), kind: target.kind() });
        }
        let from_range = connectivity::resolve_subset(source, from_subset)?;
        let to_range = connectivity::resolve_subset(target, to_subset)?;

        let mut mask = source
            .mask()
            .cloned()
            .unwrap_or_else(|| connectivity::empty_mask(source.units(), target.units(), target.bias()));

        let shared = if two_dimensional {
            if source.kind() == LayerKind::Input && source.rows() <= 1 {
                return Err(NetError::InvalidLayer {
                    layer: source.name().to_string(),
                    reason: "a 2-D connection needs an input layer with more than one row".to_string(),
                });
            }
            connectivity::connect_windows(&mut mask, Grid::of(source), Grid::of(target), target)?
        } else {
            connectivity::activate_block(&mut mask, from_range.clone(), to_range.clone());
            Vec::new()
        };

        let pooling = target.kind() == LayerKind::AveragePool;
        let frozen = pooling || source.kind() == LayerKind::AveragePool;
        // Unmasked; `install` applies the mask.
        let weights = if pooling {
            let side = target.feature_side().unwrap_or(1) as f64;
            Matrix::filled(mask.rows, mask.cols, 1.0 / (side * side))
        } else {
            Matrix::uniform(mask.rows, mask.cols, &mut self.rng).scale(source.config().init_weight)
        };

        debug!(
            from = %source.name(),
            to = %target.name(),
            from_units = ?from_range,
            to_units = ?to_range,
            connections = mask.count_nonzero(),
            shared_groups = shared.len(),
            "connected layers"
        );

        self.layers[from.0].install(mask, weights, shared, frozen);
        self.layers[from.0].above = Some(to);
        self.layers[to.0].below = Some(from);
        Ok(())
    }

    /// Declares equal-shaped blocks of `layer`'s weights that must stay equal.
    pub fn tie(&mut self, layer: LayerId, blocks: Vec<TiedBlock>) -> Result<()> {
        let count = blocks.len();
        let target = self.layer_mut(layer)?;
        target.set_tied(blocks)?;
        debug!(layer = %target.name(), blocks = count, "tied weight blocks");
        Ok(())
    }

    /// Runs `batch` (`[units × samples]`) from `input` up to the output layer,
    /// caching every layer's activation.
    pub fn forward(&mut self, input: LayerId, batch: &Matrix) -> Result<()> {
        let layer = self.layer(input)?;
        if layer.kind() != LayerKind::Input {
            return Err(NetError::NotInput(layer.name().to_string()));
        }

        let bias = self.bias_above(input);
        self.layers[input.0].accept_input(batch, bias)?;

        let mut current = input;
        while let Some(above) = self.layers[current.0].above {
            let z = self.layers[current.0].net_input_above()?;
            let bias = self.bias_above(above);
            self.layers[above.0].activate(z, bias);
            trace!(layer = %self.layers[above.0].name(), "forward");
            current = above;
        }
        Ok(())
    }

    /// Mean cost of the output layer's cached activation against `targets`;
    /// `None` before the first forward pass.
    pub fn cost(&self, output: LayerId, targets: &Matrix) -> Result<Option<f64>> {
        let layer = self.terminal(output)?;
        let Some(y) = layer.activation() else {
            return Ok(None);
        };
        if y.shape() != targets.shape() {
            return Err(NetError::shape(layer.name(), y, targets));
        }
        Ok(Some(output_cost(layer.neuron(), y, targets)))
    }

    /// Backpropagates `y - targets` from `output` down to the input layer,
    /// updating every trainable weight matrix on the way.
    pub fn backward(&mut self, output: LayerId, targets: &Matrix) -> Result<()> {
        let layer = self.terminal(output)?;
        let y = layer.activation().ok_or_else(|| NetError::NoForwardPass(layer.name().to_string()))?;
        if y.shape() != targets.shape() {
            return Err(NetError::shape(layer.name(), y, targets));
        }
        let mut seed = output_gradient(y, targets);

        // Reject a softmax in the middle of the chain before touching weights.
        let mut cursor = layer.below;
        while let Some(id) = cursor {
            let l = &self.layers[id.0];
            if l.neuron() == NeuronType::Softmax && l.below.is_some() {
                return Err(NetError::SoftmaxNotTerminal(l.name().to_string()));
            }
            cursor = l.below;
        }

        let mut current = layer.below;
        while let Some(id) = current {
            let gradient = self.layers[id.0].weight_gradient(&seed)?;
            if self.is_trainable(id) {
                self.layers[id.0].apply_update(gradient)?;
            }
            let below = self.layers[id.0].below;
            if below.is_some() {
                seed = self.layers[id.0].gradient_below(&seed)?;
            }
            trace!(layer = %self.layers[id.0].name(), "backward");
            current = below;
        }
        Ok(())
    }

    fn terminal(&self, id: LayerId) -> Result<&Layer> {
        let layer = self.layer(id)?;
        if layer.above.is_some() {
            return Err(NetError::NotTerminal(layer.name().to_string()));
        }
        Ok(layer)
    }

    fn bias_above(&self, id: LayerId) -> bool {
        self.layers[id.0]
            .above
            .is_some_and(|above| self.layers[above.0].bias().is_some())
    }

    /// Pooling layers, softmax layers and averaging windows keep their weights.
    fn is_trainable(&self, id: LayerId) -> bool {
        let layer = &self.layers[id.0];
        layer.kind() != LayerKind::AveragePool && layer.neuron() != NeuronType::Softmax && !layer.is_frozen()
    }
}
