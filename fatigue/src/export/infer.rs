use machine_learning::metrics::{argmax, class_index};
use ndarray::{ArrayView1, ArrayView2};
use rayon::prelude::*;

use super::{Activation, QuantizedLayer, QuantizedModel};
use crate::{FatigueError, Result};

/// A layer with its tensors expanded back to `f32`.
struct Expanded<'a> {
    layer: &'a QuantizedLayer,
    kernel: Vec<f32>,
    bias: Vec<f32>,
}

impl QuantizedModel {
    /// The class probabilities of one scaled sample.
    pub fn predict(&self, sample: &[f32]) -> Result<Vec<f32>> {
        forward(&self.expand(), sample)
    }

    /// The most likely class of one scaled sample.
    pub fn classify(&self, sample: &[f32]) -> Result<usize> {
        let probs = self.predict(sample)?;
        Ok(argmax(ArrayView1::from(&probs)))
    }

    /// The fraction of samples whose class is predicted right.
    ///
    /// # Arguments
    /// * `inputs` - The scaled samples, one per row.
    /// * `labels` - The class of each sample, a single column.
    pub fn accuracy(&self, inputs: ArrayView2<f32>, labels: ArrayView2<f32>) -> Result<f32> {
        if inputs.nrows() != labels.nrows() || labels.ncols() != 1 {
            return Err(FatigueError::ColumnLength {
                column: "labels".to_string(),
                got: labels.len(),
                expected: inputs.nrows(),
            });
        }

        if inputs.nrows() == 0 {
            return Ok(0.0);
        }

        let layers = self.expand();
        let hits = (0..inputs.nrows())
            .into_par_iter()
            .map(|i| -> Result<bool> {
                let sample = inputs.row(i).to_vec();
                let probs = forward(&layers, &sample)?;
                let label = class_index(labels[(i, 0)], self.classes())?;

                Ok(argmax(ArrayView1::from(&probs)) == label)
            })
            .collect::<Result<Vec<_>>>()?;

        let correct = hits.into_iter().filter(|&hit| hit).count();
        Ok(correct as f32 / inputs.nrows() as f32)
    }

    fn expand(&self) -> Vec<Expanded<'_>> {
        self.layers()
            .iter()
            .map(|layer| Expanded {
                layer,
                kernel: layer.kernel.to_f32(),
                bias: layer.bias.to_f32(),
            })
            .collect()
    }
}

fn forward(layers: &[Expanded<'_>], sample: &[f32]) -> Result<Vec<f32>> {
    let expected = layers.first().map_or(0, |l| l.layer.dim.0);
    if sample.len() != expected {
        return Err(FatigueError::ColumnLength {
            column: "sample".to_string(),
            got: sample.len(),
            expected,
        });
    }

    let mut x = sample.to_vec();

    for Expanded {
        layer,
        kernel,
        bias,
    } in layers
    {
        let (n, m) = layer.dim;
        let mut z = bias.clone();

        for (i, xi) in x.iter().enumerate() {
            for (zj, wij) in z.iter_mut().zip(&kernel[i * m..(i + 1) * m]) {
                *zj += xi * wij;
            }
        }

        debug_assert_eq!(x.len(), n);
        activate(layer.activation, &mut z);
        x = z;
    }

    Ok(x)
}

fn activate(activation: Activation, z: &mut [f32]) {
    match activation {
        Activation::Linear => {}
        Activation::Relu => z.iter_mut().for_each(|v| *v = v.max(0.0)),
        Activation::Softmax => {
            let max = z.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            z.iter_mut().for_each(|v| *v = (*v - max).exp());

            let sum: f32 = z.iter().sum();
            z.iter_mut().for_each(|v| *v /= sum);
        }
    }
}
