use std::process::ExitCode;

use embednet::NetworkSpec;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// Builds the network described by a JSON spec and logs its shape.
// Training demos:
//   cargo run --example separable
//   cargo run --example word_model
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: embednet <network-spec.json>");
        return ExitCode::FAILURE;
    };

    let network = match NetworkSpec::load_json(&path).and_then(|spec| spec.build()) {
        Ok(network) => network,
        Err(e) => {
            error!(%path, "{e}");
            return ExitCode::FAILURE;
        }
    };

    for layer in network.layers() {
        info!(
            name = %layer.name(),
            kind = %layer.kind(),
            neuron = %layer.neuron(),
            units = layer.units(),
            weights = ?layer.weights().map(|w| w.shape()),
            connections = layer.mask().map_or(0, |m| m.count_nonzero()),
            tied_blocks = layer.tied_blocks().len(),
            "layer"
        );
    }
    ExitCode::SUCCESS
}
