use std::{cell::RefCell, num::NonZeroUsize, rc::Rc};

use log::debug;
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use super::Trainer;
use crate::{
    MlErr, Result,
    arch::{Model, ModelSpec, Sequential, layers::Layer, loss::SparseCategoricalCrossEntropy},
    dataset::Dataset,
    initialization::{ChainedParamGen, ConstParamGen, ParamGen, RandParamGen},
    optimization::{Optimizer, OptimizerSpec},
};

/// A trainer of sequential classifiers with a dynamically chosen optimizer.
pub type SequentialTrainer =
    Trainer<Sequential, Box<dyn Optimizer + Send>, SparseCategoricalCrossEntropy, StdRng>;

/// The specification for a `Trainer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerSpec {
    pub model: ModelSpec,
    pub optimizer: OptimizerSpec,
    pub epochs: NonZeroUsize,
    pub batch_size: NonZeroUsize,
    pub seed: Option<u64>,
}

/// Builds `Trainer`s given a specification.
#[derive(Default)]
pub struct TrainerBuilder;

impl TrainerBuilder {
    /// Creates a new `TrainerBuilder`.
    pub fn new() -> Self {
        Self
    }

    /// Builds a new `Trainer` following a spec, alongside the model's initial parameters.
    ///
    /// # Arguments
    /// * `spec` - The specification for the trainer.
    /// * `dataset` - The training data.
    ///
    /// # Returns
    /// The trainer and its initialized parameters, or an error if the spec doesn't fit the data.
    pub fn build(
        &self,
        spec: &TrainerSpec,
        dataset: Dataset,
    ) -> Result<(SequentialTrainer, Vec<f32>)> {
        let model = spec.model.build()?;

        if dataset.x_size() != spec.model.input_size() {
            return Err(MlErr::SizeMismatch {
                what: "dataset features",
                got: dataset.x_size(),
                expected: spec.model.input_size(),
            });
        }

        let mut rng = generate_rng(spec.seed);
        let init_rng = Rc::new(RefCell::new(StdRng::from_rng(&mut rng)));
        let params = self.resolve_params(&model, init_rng)?;

        debug!(params = params.len(), seed:? = spec.seed; "initialized model parameters");

        let optimizer = spec.optimizer.build(model.size());
        let trainer = Trainer::new(
            model,
            optimizer,
            dataset,
            spec.epochs,
            spec.batch_size,
            SparseCategoricalCrossEntropy::new(),
            rng,
        );

        Ok((trainer, params))
    }

    /// Glorot uniform kernels and zeroed biases, layer after layer.
    fn resolve_params(&self, model: &Sequential, rng: Rc<RefCell<StdRng>>) -> Result<Vec<f32>> {
        let mut param_gens: Vec<Box<dyn ParamGen>> = Vec::new();

        for layer in model.layers() {
            if let Layer::Dense(dense) = layer {
                let (fan_in, fan_out) = dense.dim();
                let kernel =
                    RandParamGen::xavier_uniform(rng.clone(), fan_in * fan_out, fan_in, fan_out)?;

                param_gens.push(Box::new(kernel));
                param_gens.push(Box::new(ConstParamGen::zeros(fan_out)));
            }
        }

        let size = model.size();
        let params = ChainedParamGen::new(param_gens)
            .sample(size)
            .unwrap_or_default();

        if params.len() != size {
            return Err(MlErr::SizeMismatch {
                what: "initial parameters",
                got: params.len(),
                expected: size,
            });
        }

        Ok(params)
    }
}

fn generate_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
