use ndarray::{ArrayView1, ArrayView2};

use crate::{MlErr, Result};

/// Interprets a label as a class index.
///
/// # Returns
/// The index, or `MlErr::InvalidLabel` if the label is not an integer in `[0, classes)`.
pub fn class_index(label: f32, classes: usize) -> Result<usize> {
    if label < 0. || label.fract() != 0. || label as usize >= classes {
        return Err(MlErr::InvalidLabel { label, classes });
    }

    Ok(label as usize)
}

/// Returns the index of the largest value, the first one on ties.
pub fn argmax(row: ArrayView1<f32>) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best, max), (i, &v)| {
            if v > max { (i, v) } else { (best, max) }
        })
        .0
}

/// Counts the rows of `y_pred` whose most likely class is the label in `y`.
pub fn correct(y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<usize> {
    let classes = y_pred.ncols();
    let mut hits = 0;

    for (probs, &label) in y_pred.rows().into_iter().zip(y.column(0)) {
        if argmax(probs) == class_index(label, classes)? {
            hits += 1;
        }
    }

    Ok(hits)
}

/// Fraction of correctly classified rows, `0` for an empty batch.
pub fn accuracy(y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<f32> {
    if y_pred.nrows() == 0 {
        return Ok(0.);
    }

    Ok(correct(y_pred, y)? as f32 / y_pred.nrows() as f32)
}
