pub mod math;
pub mod error;
pub mod activation;
pub mod layers;
pub mod connectivity;
pub mod tying;
pub mod network;
pub mod loss;
pub mod data;
pub mod train;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use error::{NetError, Result};
pub use activation::neuron::NeuronType;
pub use layers::{Layer, LayerConfig, LayerId, LayerKind};
pub use network::network::Network;
pub use network::spec::NetworkSpec;
pub use tying::TiedBlock;
pub use train::{train_loop, TrainConfig};
