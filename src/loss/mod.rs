pub mod mse;
pub mod bce;
pub mod cross_entropy;
pub mod output;

pub use mse::MseLoss;
pub use bce::BceLoss;
pub use cross_entropy::CrossEntropyLoss;
pub use output::{output_cost, output_gradient};
