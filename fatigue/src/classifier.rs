use machine_learning::{
    arch::{Model, ModelSpec, Sequential, layers::Layer, loss::SparseCategoricalCrossEntropy},
    metrics,
    training::EpochStats,
};
use ndarray::{Array2, ArrayView2};

use crate::{FatigueError, Result};

/// A trained dense layer's parameters, borrowed from its classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DenseParams<'a> {
    pub dim: (usize, usize),
    pub relu: bool,
    /// Row-major `(dim.0, dim.1)` weights.
    pub kernel: &'a [f32],
    pub bias: &'a [f32],
}

/// A trained sequential classifier: dense layers topped by a softmax.
#[derive(Debug, Clone)]
pub struct FatigueClassifier {
    model: Sequential,
    params: Vec<f32>,
    input_scale: f32,
}

impl FatigueClassifier {
    /// Creates a new `FatigueClassifier`.
    ///
    /// # Arguments
    /// * `model` - The model's architecture.
    /// * `params` - The model's trained parameters.
    /// * `input_scale` - The constant raw inputs are divided by before being fed to the model.
    ///
    /// # Returns
    /// The classifier, or an error if the parameters don't fit the model or the model isn't a
    /// stack of dense layers ending in a softmax.
    pub fn new(model: Sequential, params: Vec<f32>, input_scale: f32) -> Result<Self> {
        if params.len() != model.size() {
            return Err(FatigueError::InvalidModel(format!(
                "expected {} parameters, got {}",
                model.size(),
                params.len()
            )));
        }

        let layers = model.layers();
        let Some((Layer::Softmax(_), dense)) = layers.split_last() else {
            return Err(FatigueError::InvalidModel(
                "the last layer must be a softmax".into(),
            ));
        };

        if dense.is_empty() || !dense.iter().all(|l| matches!(l, Layer::Dense(_))) {
            return Err(FatigueError::InvalidModel(
                "every layer but the last must be dense".into(),
            ));
        }

        Ok(Self {
            model,
            params,
            input_scale,
        })
    }

    pub fn spec(&self) -> ModelSpec {
        self.model.spec()
    }

    pub fn params(&self) -> &[f32] {
        &self.params
    }

    pub fn input_scale(&self) -> f32 {
        self.input_scale
    }

    pub fn input_size(&self) -> usize {
        self.spec().input_size()
    }

    pub fn classes(&self) -> usize {
        self.spec().output_size()
    }

    /// The dense layers in order, each with its slice of the parameters.
    pub fn dense_layers(&self) -> Vec<DenseParams<'_>> {
        let mut offset = 0;
        let mut dense = Vec::new();

        for layer in self.model.layers() {
            let size = layer.size();
            let params = &self.params[offset..offset + size];
            offset += size;

            if let Layer::Dense(l) = layer {
                let (kernel, bias) = params.split_at(size - l.dim().1);
                dense.push(DenseParams {
                    dim: l.dim(),
                    relu: l.act_fn().is_some(),
                    kernel,
                    bias,
                });
            }
        }

        dense
    }

    /// The class probabilities of each scaled sample.
    pub fn predict(&self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        Ok(self.model.infer(&self.params, x)?)
    }

    /// The most likely class of each scaled sample.
    pub fn classify(&self, x: ArrayView2<f32>) -> Result<Vec<usize>> {
        let probs = self.predict(x)?;
        Ok(probs.rows().into_iter().map(metrics::argmax).collect())
    }

    /// The loss and accuracy over labelled scaled samples.
    pub fn evaluate(&self, x: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<EpochStats> {
        let loss_fn = SparseCategoricalCrossEntropy::new();
        Ok(self.model.evaluate(&self.params, x, y, &loss_fn)?)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn classifier() -> FatigueClassifier {
        let model = ModelSpec::dense_classifier(1, &[2], 2).build().unwrap();
        // hidden: w = [1, -1], b = [0, 0]; output: w = [[1, 0], [0, 1]], b = [0, 0]
        let params = vec![1.0, -1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        FatigueClassifier::new(model, params, 1000.0).unwrap()
    }

    #[test]
    fn dense_layers_slice_the_parameters() {
        let classifier = classifier();
        let layers = classifier.dense_layers();

        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].dim, (1, 2));
        assert!(layers[0].relu);
        assert_eq!(layers[0].kernel, [1.0, -1.0]);
        assert_eq!(layers[1].kernel, [1.0, 0.0, 0.0, 1.0]);
        assert!(!layers[1].relu);
    }

    #[test]
    fn classifies_by_sign() {
        let classifier = classifier();
        let x = array![[2.0], [-3.0]];

        assert_eq!(classifier.classify(x.view()).unwrap(), vec![0, 1]);

        let stats = classifier.evaluate(x.view(), array![[0.0], [1.0]].view()).unwrap();
        assert_eq!(stats.accuracy(), 1.0);
    }

    #[test]
    fn wrong_parameter_count_is_rejected() {
        let model = ModelSpec::dense_classifier(1, &[2], 2).build().unwrap();
        assert!(FatigueClassifier::new(model, vec![0.0; 3], 1.0).is_err());
    }

    #[test]
    fn model_must_end_in_softmax() {
        let model = Sequential::new([Layer::dense((1, 2), None)]);
        assert!(FatigueClassifier::new(model, vec![0.0; 4], 1.0).is_err());
    }
}
