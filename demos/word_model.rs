use embednet::data::one_hot;
use embednet::{
    train_loop, LayerConfig, LayerKind, Matrix, Network, NeuronType, TiedBlock, TrainConfig,
};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

const VOCAB: usize = 8;
const CONTEXT: usize = 3;
const EMBEDDING: usize = 4;
const HIDDEN: usize = 16;

/// Synthetic corpus: the next word is the sum of the context words mod VOCAB.
fn corpus(samples: usize, rng: &mut StdRng) -> Vec<Vec<usize>> {
    (0..samples)
        .map(|_| {
            let mut words: Vec<usize> = (0..CONTEXT).map(|_| rng.gen_range(0..VOCAB)).collect();
            words.push(words.iter().sum::<usize>() % VOCAB);
            words
        })
        .collect()
}

fn encode(samples: &[Vec<usize>]) -> embednet::Result<(Matrix, Matrix)> {
    let (context, target) = one_hot::split_context(samples);
    Ok((one_hot::encode(&context, VOCAB)?, one_hot::encode(&target, VOCAB)?))
}

fn main() -> embednet::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let learning_rate = 0.5;
    let mut network = Network::with_seed(7);
    let input = network.add_layer(
        LayerConfig::new("input", VOCAB * CONTEXT)
            .kind(LayerKind::Input)
            .neuron(NeuronType::Linear)
            .learning_rate(learning_rate)
            .init_weight(0.1),
    )?;
    let embedding = network.add_layer(
        LayerConfig::new("embedding", EMBEDDING * CONTEXT)
            .neuron(NeuronType::Linear)
            .learning_rate(learning_rate)
            .init_weight(0.1),
    )?;
    let hidden = network.add_layer(
        LayerConfig::new("hidden", HIDDEN)
            .bias(1.0)
            .learning_rate(learning_rate)
            .init_weight(0.1),
    )?;
    let output = network.add_layer(
        LayerConfig::new("output", VOCAB)
            .neuron(NeuronType::Softmax)
            .bias(1.0),
    )?;

    // One embedding block per context position, all sharing the same table.
    let mut blocks = Vec::new();
    for k in 0..CONTEXT {
        let rows = k * VOCAB..(k + 1) * VOCAB;
        let cols = k * EMBEDDING..(k + 1) * EMBEDDING;
        network.connect(input, embedding, Some(rows.clone()), Some(cols.clone()))?;
        blocks.push(TiedBlock::new(rows, cols));
    }
    network.tie(input, blocks)?;
    network.connect(embedding, hidden, None, None)?;
    network.connect(hidden, output, None, None)?;

    let mut rng = StdRng::seed_from_u64(3);
    let (train_inputs, train_targets) = encode(&corpus(2000, &mut rng))?;
    let (valid_inputs, valid_targets) = encode(&corpus(200, &mut rng))?;

    let history = train_loop(
        &mut network,
        input,
        output,
        &train_inputs,
        &train_targets,
        Some((&valid_inputs, &valid_targets)),
        &TrainConfig::new(10, 50),
    )?;
    for stats in &history {
        println!(
            "Epoch {}: train cost = {:.4}, validation cost = {:.4}",
            stats.epoch,
            stats.train_cost,
            stats.val_cost.unwrap_or(f64::NAN)
        );
    }

    network.forward(input, &valid_inputs)?;
    let predicted = network
        .layer(output)?
        .activation()
        .map(one_hot::predicted_words)
        .unwrap_or_default();
    let expected: Vec<usize> = one_hot::decode(&valid_targets, VOCAB).into_iter().flatten().collect();
    let correct = predicted.iter().zip(&expected).filter(|(p, e)| p == e).count();
    println!("Validation accuracy: {correct}/{}", expected.len());

    let dir = std::env::temp_dir().join("embednet_word_model");
    std::fs::create_dir_all(&dir)?;
    let files = network.dump_weights(&dir)?;
    println!("Wrote {} weight tables to {}", files.len(), dir.display());
    Ok(())
}
