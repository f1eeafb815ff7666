/// Mini-batch schedule for [`train_loop`](crate::train::train_loop).
///
/// `log_every` is the batch interval of the debug-level cost log; `0` turns
/// it off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub log_every: usize,
}

impl TrainConfig {
    pub fn new(epochs: usize, batch_size: usize) -> Self {
        TrainConfig { epochs, batch_size, log_every: 100 }
    }

    pub fn log_every(mut self, batches: usize) -> Self {
        self.log_every = batches;
        self
    }
}
