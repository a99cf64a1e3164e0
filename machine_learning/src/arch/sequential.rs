use ndarray::{Array2, ArrayView2};

use super::{ActFnSpec, LayerSpec, Model, ModelSpec, layers::Layer, loss::LossFn};
use crate::{MlErr, Result, metrics, optimization::Optimizer, training::EpochStats};

/// A sequential model: information flows forward when computing an output and backward when
/// computing the *deltas* of its layers.
#[derive(Clone, Debug)]
pub struct Sequential {
    layers: Vec<Layer>,
}

impl Sequential {
    /// Creates a new `Sequential`.
    ///
    /// # Arguments
    /// * `layers` - The layers the sequential is composed of.
    ///
    /// # Returns
    /// A new `Sequential` instance.
    pub fn new<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = Layer>,
    {
        Self {
            layers: layers.into_iter().collect(),
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Describes the architecture of this model.
    pub fn spec(&self) -> ModelSpec {
        let layers = self
            .layers
            .iter()
            .map(|layer| match layer {
                Layer::Dense(l) => LayerSpec::Dense {
                    dim: l.dim(),
                    act_fn: l.act_fn().map(|_| ActFnSpec::Relu),
                },
                Layer::Softmax(l) => LayerSpec::Softmax { dim: l.dim() },
            })
            .collect();

        ModelSpec::Sequential { layers }
    }

    /// Makes a forward pass through the network without touching the layers' metadata.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `x` - The input data, one sample per row.
    ///
    /// # Returns
    /// The prediction for the given input or an error if occurred.
    pub fn infer(&self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_params(params)?;

        let mut offset = 0;
        let mut out = x.to_owned();

        for layer in &self.layers {
            let size = layer.size();
            out = layer.infer(&params[offset..offset + size], out.view())?;
            offset += size;
        }

        Ok(out)
    }

    /// Makes a forward pass through the network, keeping what the backward pass needs.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `x` - The input data, one sample per row.
    ///
    /// # Returns
    /// The prediction for the given input or an error if occurred.
    pub fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_params(params)?;

        let mut offset = 0;
        let mut out = x.to_owned();

        for layer in self.layers.iter_mut() {
            let size = layer.size();
            out = layer.forward(&params[offset..offset + size], out.view())?;
            offset += size;
        }

        Ok(out)
    }

    /// Computes the loss and accuracy of the model over a labelled set.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `x` - The inputs, one sample per row.
    /// * `y` - The labels, one sample per row.
    /// * `loss_fn` - The loss function.
    pub fn evaluate<L: LossFn>(
        &self,
        params: &[f32],
        x: ArrayView2<f32>,
        y: ArrayView2<f32>,
        loss_fn: &L,
    ) -> Result<EpochStats> {
        let y_pred = self.infer(params, x)?;
        let loss = loss_fn.loss(y_pred.view(), y)?;
        let accuracy = metrics::accuracy(y_pred.view(), y)?;

        Ok(EpochStats::new(loss, accuracy))
    }

    fn check_params(&self, params: &[f32]) -> Result<()> {
        let size = self.size();

        if params.len() != size {
            return Err(MlErr::SizeMismatch {
                what: "model parameters",
                got: params.len(),
                expected: size,
            });
        }

        Ok(())
    }
}

impl Model for Sequential {
    fn size(&self) -> usize {
        self.layers.iter().map(|layer| layer.size()).sum()
    }

    // NOTE: the reported loss is the sample-weighted mean of the batch losses, each computed
    // with the parameters as they were before that batch's update.
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
        I: Iterator<Item = (ArrayView2<'a, f32>, ArrayView2<'a, f32>)>,
    {
        if grad.len() != params.len() {
            return Err(MlErr::SizeMismatch {
                what: "gradient",
                got: grad.len(),
                expected: params.len(),
            });
        }

        let mut total_loss = 0.0;
        let mut hits = 0;
        let mut samples = 0;

        for (x, y) in batches {
            grad.fill(0.0);

            let y_pred = self.forward(params, x)?;
            total_loss += loss_fn.loss(y_pred.view(), y)? * x.nrows() as f32;
            hits += metrics::correct(y_pred.view(), y)?;
            samples += x.nrows();

            let mut d = loss_fn.loss_prime(y_pred.view(), y)?;
            let mut end = params.len();

            for layer in self.layers.iter_mut().rev() {
                let start = end - layer.size();
                d = layer.backward(&params[start..end], &mut grad[start..end], d)?;
                end = start;
            }

            optimizer.update_params(grad, params)?;
        }

        if samples == 0 {
            return Err(MlErr::EmptyDataset);
        }

        Ok(EpochStats::new(
            total_loss / samples as f32,
            hits as f32 / samples as f32,
        ))
    }
}
