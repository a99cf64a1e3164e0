use ndarray::ArrayView2;

use crate::{Result, arch::loss::LossFn, optimization::Optimizer, training::EpochStats};

/// A trainable model whose parameters live outside of it, in a flat slice.
pub trait Model {
    /// Returns the amount of parameters the model reads from its slice.
    fn size(&self) -> usize;

    /// Runs one pass over `batches`, stepping `optimizer` after every batch.
    ///
    /// # Arguments
    /// * `params` - The model's parameters, **updated in place** after every batch.
    /// * `grad` - Scratch space for each batch's gradient, as long as `params`.
    /// * `loss_fn` - The loss to minimize.
    /// * `optimizer` - Turns each gradient into a parameter update.
    /// * `batches` - `(x, y)` pairs, one sample per row.
    ///
    /// # Returns
    /// The pass' loss and accuracy, or the first error found.
    fn backprop<'a, L, O, I>(
        &mut self,
        params: &mut [f32],
        grad: &mut [f32],
        loss_fn: &L,
        optimizer: &mut O,
        batches: I,
    ) -> Result<EpochStats>
    where
        L: LossFn,
        O: Optimizer,
        I: Iterator<Item = (ArrayView2<'a, f32>, ArrayView2<'a, f32>)>;
}
