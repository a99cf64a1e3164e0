use ndarray::{Array2, ArrayView2};

use crate::Result;

pub trait LossFn {
    /// Computes the mean loss of a batch.
    ///
    /// # Arguments
    /// * `y_pred` - The model's output, one sample per row.
    /// * `y` - The expected output, one sample per row.
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<f32>;

    /// Computes the derivative of the mean loss with respect to `y_pred`.
    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<Array2<f32>>;
}
