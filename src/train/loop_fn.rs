use std::time::Instant;

use tracing::{debug, info};

use crate::error::{NetError, Result};
use crate::layers::layer::LayerId;
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` with mini-batch forward/backward steps and returns the
/// statistics of every completed epoch.
///
/// # Arguments
/// - `network`    — wired network; modified in place
/// - `input`      — its input layer
/// - `output`     — its output layer
/// - `inputs`     — `[input units × samples]`
/// - `targets`    — `[output units × samples]`
/// - `validation` — optional `(inputs, targets)` evaluated after each epoch
/// - `config`     — epochs, batch size and log interval
///
/// Batches are taken in column order; the last one may be short.
pub fn train_loop(
    network: &mut Network,
    input: LayerId,
    output: LayerId,
    inputs: &Matrix,
    targets: &Matrix,
    validation: Option<(&Matrix, &Matrix)>,
    config: &TrainConfig,
) -> Result<Vec<EpochStats>> {
    if inputs.cols == 0 {
        return Err(NetError::InvalidTraining("no training samples".to_string()));
    }
    if inputs.cols != targets.cols {
        return Err(NetError::InvalidTraining(format!(
            "{} input samples but {} targets",
            inputs.cols, targets.cols
        )));
    }
    if config.batch_size == 0 {
        return Err(NetError::InvalidTraining("batch_size must be at least 1".to_string()));
    }

    let mut history = Vec::with_capacity(config.epochs);

    for epoch in 1..=config.epochs {
        let t_start = Instant::now();
        let n = inputs.cols;
        let mut total_cost = 0.0;

        // ── One full pass over the training data ───────────────────────────
        for (batch, batch_start) in (0..n).step_by(config.batch_size).enumerate() {
            let range = batch_start..(batch_start + config.batch_size).min(n);
            let batch_targets = targets.columns(range.clone());

            network.forward(input, &inputs.columns(range.clone()))?;
            let cost = network.cost(output, &batch_targets)?.unwrap_or(0.0);
            network.backward(output, &batch_targets)?;

            total_cost += cost * range.len() as f64;
            if config.log_every > 0 && batch % config.log_every == 0 {
                debug!(epoch, batch, cost, "batch");
            }
        }

        // ── Validation ────────────────────────────────────────────────────
        let val_cost = match validation {
            Some((val_inputs, val_targets)) => evaluate(network, input, output, val_inputs, val_targets)?,
            None => None,
        };

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            train_cost: total_cost / n as f64,
            val_cost,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };
        info!(epoch, train_cost = stats.train_cost, val_cost = ?stats.val_cost, "epoch finished");
        history.push(stats);
    }

    Ok(history)
}

/// Cost of a full dataset in one forward pass, without updating weights.
pub fn evaluate(
    network: &mut Network,
    input: LayerId,
    output: LayerId,
    inputs: &Matrix,
    targets: &Matrix,
) -> Result<Option<f64>> {
    network.forward(input, inputs)?;
    network.cost(output, targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::neuron::NeuronType;
    use crate::layers::config::LayerConfig;
    use crate::layers::kind::LayerKind;

    fn classifier() -> (Network, LayerId, LayerId) {
        let mut net = Network::with_seed(21);
        let input = net
            .add_layer(LayerConfig::new("input", 2).kind(LayerKind::Input).learning_rate(0.5).momentum(0.5))
            .unwrap();
        let output = net
            .add_layer(LayerConfig::new("output", 2).neuron(NeuronType::Softmax).bias(1.0))
            .unwrap();
        net.connect(input, output, None, None).unwrap();
        (net, input, output)
    }

    fn data() -> (Matrix, Matrix) {
        let inputs = Matrix::from_columns(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![0.9, 0.1], vec![0.1, 0.9], vec![1.0, 0.2]]);
        let targets = Matrix::from_columns(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]]);
        (inputs, targets)
    }

    #[test]
    fn cost_falls_across_epochs() {
        let (mut net, input, output) = classifier();
        let (inputs, targets) = data();
        let history = train_loop(
            &mut net,
            input,
            output,
            &inputs,
            &targets,
            Some((&inputs, &targets)),
            &TrainConfig::new(30, 2),
        )
        .unwrap();
        assert_eq!(history.len(), 30);
        assert!(history[29].train_cost < history[0].train_cost);
        assert!(history[29].val_cost.unwrap() < std::f64::consts::LN_2);
    }

    #[test]
    fn rejects_bad_configuration() {
        let (mut net, input, output) = classifier();
        let (inputs, targets) = data();
        let zero_batch = TrainConfig::new(1, 0);
        assert!(train_loop(&mut net, input, output, &inputs, &targets, None, &zero_batch).is_err());
        let short = targets.columns(0..3);
        assert!(train_loop(&mut net, input, output, &inputs, &short, None, &TrainConfig::new(1, 2)).is_err());
    }

    #[test]
    fn short_last_batch_counts_by_size() {
        let mut net = Network::with_seed(21);
        let input = net
            .add_layer(LayerConfig::new("input", 2).kind(LayerKind::Input).learning_rate(0.0).momentum(0.0))
            .unwrap();
        let output = net
            .add_layer(LayerConfig::new("output", 2).neuron(NeuronType::Softmax).bias(1.0))
            .unwrap();
        net.connect(input, output, None, None).unwrap();
        let (inputs, targets) = data();

        // Learning rate 0: the epoch cost must equal one full-batch evaluation.
        let full = evaluate(&mut net, input, output, &inputs, &targets).unwrap().unwrap();
        let config = TrainConfig::new(1, 2).log_every(1);
        let history = train_loop(&mut net, input, output, &inputs, &targets, None, &config).unwrap();
        assert_eq!(history.len(), 1);
        assert!((history[0].train_cost - full).abs() < 1e-12);
    }
}
