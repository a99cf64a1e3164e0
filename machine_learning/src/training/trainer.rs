use std::num::NonZeroUsize;

use log::{debug, info};
use rand::Rng;

use super::EpochStats;
use crate::{
    MlErr, Result,
    arch::{Model, loss::LossFn},
    dataset::Dataset,
    optimization::Optimizer,
};

/// A model `Trainer`. Contains the relevant components needed for training a model,
/// including the model itself.
pub struct Trainer<M, O, L, R>
where
    M: Model,
    O: Optimizer,
    L: LossFn,
    R: Rng,
{
    grad: Vec<f32>,
    dataset: Dataset,
    optimizer: O,
    model: M,
    loss_fn: L,

    epochs: NonZeroUsize,
    batch_size: NonZeroUsize,
    rng: R,
}

impl<M, O, L, R> Trainer<M, O, L, R>
where
    M: Model,
    O: Optimizer,
    L: LossFn,
    R: Rng,
{
    /// Returns a new `Trainer`.
    ///
    /// # Arguments
    /// * `model` - The model that will be trained.
    /// * `optimizer` - The optimizer that updates the parameters after each batch.
    /// * `dataset` - The dataset the model will be trained with.
    /// * `epochs` - The amount of passes over the dataset per `train` call.
    /// * `batch_size` - The maximum amount of samples per gradient step.
    /// * `loss_fn` - The loss function used to measure the difference between a model's output and the expected one.
    /// * `rng` - A random number generator, used to shuffle the dataset on each epoch.
    pub fn new(
        model: M,
        optimizer: O,
        dataset: Dataset,
        epochs: NonZeroUsize,
        batch_size: NonZeroUsize,
        loss_fn: L,
        rng: R,
    ) -> Self {
        Self {
            grad: vec![0.0; model.size()],
            model,
            optimizer,
            dataset,
            epochs,
            batch_size,
            loss_fn,
            rng,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn loss_fn(&self) -> &L {
        &self.loss_fn
    }

    /// Consumes the trainer, returning the trained model.
    pub fn into_model(self) -> M {
        self.model
    }

    /// Performs `epochs` epochs of training its model, using its optimizer, dataset, loss
    /// function and batch size.
    ///
    /// # Arguments
    /// * `params` - The model's parameters, updated in place.
    ///
    /// # Returns
    /// The loss and accuracy of every epoch, or the first error found.
    pub fn train(&mut self, params: &mut [f32]) -> Result<Vec<EpochStats>> {
        if self.dataset.is_empty() {
            return Err(MlErr::EmptyDataset);
        }

        let epochs = self.epochs.get();
        let mut history = Vec::with_capacity(epochs);

        debug!(
            samples = self.dataset.len(),
            batch_size = self.batch_size.get();
            "starting training"
        );

        for epoch in 1..=epochs {
            self.dataset.shuffle(&mut self.rng);
            let batches = self.dataset.batches(self.batch_size);

            let stats = self.model.backprop(
                params,
                &mut self.grad,
                &self.loss_fn,
                &mut self.optimizer,
                batches,
            )?;

            info!(
                "epoch {epoch}/{epochs} - loss: {:.4} - accuracy: {:.4}",
                stats.loss(),
                stats.accuracy()
            );
            history.push(stats);
        }

        Ok(history)
    }
}
