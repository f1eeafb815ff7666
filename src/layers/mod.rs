pub mod config;
pub mod kind;
pub mod layer;

pub use config::LayerConfig;
pub use kind::LayerKind;
pub use layer::{Layer, LayerId};
