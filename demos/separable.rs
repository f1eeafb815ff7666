use embednet::{LayerConfig, LayerKind, Matrix, Network, NeuronType};
use tracing_subscriber::EnvFilter;

fn main() -> embednet::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut network = Network::with_seed(42);
    let input = network.add_layer(
        LayerConfig::new("input", 2)
            .kind(LayerKind::Input)
            .neuron(NeuronType::Linear)
            .learning_rate(0.1)
            .momentum(0.0),
    )?;
    let output = network.add_layer(LayerConfig::new("output", 1).neuron(NeuronType::Linear))?;
    network.connect(input, output, None, None)?;
    network.layer_mut(input)?.set_weights(Matrix::from_data(vec![vec![1.0], vec![1.0]]))?;

    // Only the first dimension separates the targets.
    let inputs = Matrix::from_columns(&[
        vec![0.5, 1.0],
        vec![0.5, -1.0],
        vec![-0.5, 1.0],
        vec![-0.5, -1.0],
    ]);
    let targets = Matrix::from_data(vec![vec![1.0, 1.0, -1.0, -1.0]]);

    for step in 0..300 {
        network.forward(input, &inputs)?;
        let cost = network.cost(output, &targets)?.unwrap_or(f64::NAN);
        if step % 50 == 0 {
            println!("Step {step}: cost = {cost:.6}");
        }
        network.backward(output, &targets)?;
    }

    let w = network.layer(input)?.weights().cloned().unwrap_or_default();
    println!("Weights: separating = {:.4}, other = {:.4}", w.get(0, 0), w.get(1, 0));
    Ok(())
}
