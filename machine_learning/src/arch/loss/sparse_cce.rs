use ndarray::{Array2, ArrayView2};

use super::LossFn;
use crate::{MlErr, Result, metrics::class_index};

/// Smallest probability fed to the logarithm.
pub const EPSILON: f32 = 1e-7;

/// Cross-entropy between a predicted probability distribution and an integer class label.
///
/// `y_pred` holds one probability distribution per row (the output of a softmax) and `y` a
/// single column with the class index of each row.
#[derive(Default, Clone, Copy, Debug)]
pub struct SparseCategoricalCrossEntropy;

impl SparseCategoricalCrossEntropy {
    /// Returns a new `SparseCategoricalCrossEntropy`.
    pub fn new() -> Self {
        Self
    }

    fn check_rows(y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<()> {
        if y_pred.nrows() != y.nrows() || y.ncols() != 1 {
            return Err(MlErr::SizeMismatch {
                what: "labels",
                got: y.len(),
                expected: y_pred.nrows(),
            });
        }

        Ok(())
    }
}

impl LossFn for SparseCategoricalCrossEntropy {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<f32> {
        Self::check_rows(y_pred, y)?;

        let classes = y_pred.ncols();
        let mut total = 0.;

        for (probs, label) in y_pred.rows().into_iter().zip(y.column(0)) {
            let class = class_index(*label, classes)?;
            total -= probs[class].clamp(EPSILON, 1. - EPSILON).ln();
        }

        Ok(total / y_pred.nrows().max(1) as f32)
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<Array2<f32>> {
        Self::check_rows(y_pred, y)?;

        let classes = y_pred.ncols();
        let n = y_pred.nrows().max(1) as f32;
        let mut d = Array2::zeros(y_pred.raw_dim());

        let rows = d.rows_mut().into_iter().zip(y_pred.rows());
        for ((mut row, probs), label) in rows.zip(y.column(0)) {
            let class = class_index(*label, classes)?;
            let p = probs[class];

            // The clipped region has no gradient.
            if p > EPSILON && p < 1. - EPSILON {
                row[class] = -1. / (p * n);
            }
        }

        Ok(d)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn loss_is_mean_negative_log_likelihood() {
        let y_pred = array![[0.7, 0.2, 0.1], [0.1, 0.1, 0.8]];
        let y = array![[0.], [2.]];

        let loss = SparseCategoricalCrossEntropy.loss(y_pred.view(), y.view()).unwrap();
        let expected = -(0.7f32.ln() + 0.8f32.ln()) / 2.;
        assert!((loss - expected).abs() < 1e-6);
    }

    #[test]
    fn certain_predictions_are_clipped() {
        let y_pred = array![[0., 1., 0.]];
        let y = array![[0.]];

        let loss = SparseCategoricalCrossEntropy.loss(y_pred.view(), y.view()).unwrap();
        assert!((loss - -(EPSILON.ln())).abs() < 1e-3);
    }

    #[test]
    fn gradient_only_touches_the_labelled_class() {
        let y_pred = array![[0.5, 0.25, 0.25], [0.2, 0.4, 0.4]];
        let y = array![[0.], [1.]];

        let d = SparseCategoricalCrossEntropy
            .loss_prime(y_pred.view(), y.view())
            .unwrap();
        let expected = array![[-1., 0., 0.], [0., -1.25, 0.]];
        assert!(d.iter().zip(&expected).all(|(a, b)| (a - b).abs() < 1e-6));
    }

    #[test]
    fn out_of_range_label_fails() {
        let y_pred = array![[0.5, 0.25, 0.25]];
        let y = array![[3.]];

        let err = SparseCategoricalCrossEntropy
            .loss(y_pred.view(), y.view())
            .unwrap_err();
        assert_eq!(err, MlErr::InvalidLabel { label: 3., classes: 3 });
    }

    #[test]
    fn fractional_label_fails() {
        let y_pred = array![[0.5, 0.5]];
        let y = array![[0.5]];

        assert!(SparseCategoricalCrossEntropy.loss(y_pred.view(), y.view()).is_err());
    }
}
