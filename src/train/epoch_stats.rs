use serde::{Serialize, Deserialize};

/// Per-epoch training statistics returned by
/// `train_loop`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Mean cost over all training samples, measured on each batch's forward
    /// pass before its update.
    pub train_cost: f64,
    /// Cost on the validation set after the epoch, if one was provided.
    pub val_cost: Option<f64>,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}
