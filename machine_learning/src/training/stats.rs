/// Loss and accuracy of a model over one pass of some labelled data.
///
/// This type keeps fields private to allow evolving the internal counters
/// without breaking the public API.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EpochStats {
    loss: f32,
    accuracy: f32,
}

impl EpochStats {
    /// Creates a new `EpochStats`.
    ///
    /// # Args
    /// * `loss` - The mean loss over the pass.
    /// * `accuracy` - The fraction of correctly classified samples.
    pub fn new(loss: f32, accuracy: f32) -> Self {
        Self { loss, accuracy }
    }

    pub fn loss(&self) -> f32 {
        self.loss
    }

    pub fn accuracy(&self) -> f32 {
        self.accuracy
    }
}
