use serde::{Deserialize, Serialize};

use super::{Sequential, activations::ActFn, layers::Layer};
use crate::{MlErr, Result};

/// The specification for the `ActFn` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActFnSpec {
    Relu,
}

/// The specification for the `Layer` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerSpec {
    Dense {
        dim: (usize, usize),
        act_fn: Option<ActFnSpec>,
    },
    Softmax {
        dim: usize,
    },
}

impl LayerSpec {
    fn dim(&self) -> (usize, usize) {
        match *self {
            LayerSpec::Dense { dim, .. } => dim,
            LayerSpec::Softmax { dim } => (dim, dim),
        }
    }
}

/// The specification for the `Model` trait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSpec {
    Sequential { layers: Vec<LayerSpec> },
}

impl ModelSpec {
    /// A dense classifier: `hidden` ReLU layers followed by a `classes`-wide softmax output.
    ///
    /// # Arguments
    /// * `input_size` - The amount of input features.
    /// * `hidden` - The width of each hidden layer.
    /// * `classes` - The amount of output classes.
    pub fn dense_classifier(input_size: usize, hidden: &[usize], classes: usize) -> Self {
        let mut layers = Vec::with_capacity(hidden.len() + 2);
        let mut fan_in = input_size;

        for &width in hidden {
            layers.push(LayerSpec::Dense {
                dim: (fan_in, width),
                act_fn: Some(ActFnSpec::Relu),
            });
            fan_in = width;
        }

        layers.push(LayerSpec::Dense {
            dim: (fan_in, classes),
            act_fn: None,
        });
        layers.push(LayerSpec::Softmax { dim: classes });

        ModelSpec::Sequential { layers }
    }

    pub fn layers(&self) -> &[LayerSpec] {
        match self {
            ModelSpec::Sequential { layers } => layers,
        }
    }

    /// Returns the width of the model's input, `0` for an empty model.
    pub fn input_size(&self) -> usize {
        self.layers().first().map_or(0, |l| l.dim().0)
    }

    /// Returns the width of the model's output, `0` for an empty model.
    pub fn output_size(&self) -> usize {
        self.layers().last().map_or(0, |l| l.dim().1)
    }

    /// Checks that the model has layers and that adjacent layers have compatible dimensions.
    pub fn validate(&self) -> Result<()> {
        let layers = self.layers();

        if layers.is_empty() {
            return Err(MlErr::InvalidSpec(
                "model must have at least one layer".into(),
            ));
        }

        for (i, layer) in layers.iter().enumerate() {
            let (n, m) = layer.dim();
            if n == 0 || m == 0 {
                return Err(MlErr::InvalidSpec(format!("layer {i}: dimensions must be non zero")));
            }
        }

        // Adjacent layers must have compatible dimensions: prev.m == next.n
        for i in 1..layers.len() {
            let (_, prev_m) = layers[i - 1].dim();
            let (curr_n, _) = layers[i].dim();

            if prev_m != curr_n {
                return Err(MlErr::InvalidSpec(format!(
                    "layer {i}: input size ({curr_n}) does not match \
                     previous layer output size ({prev_m})"
                )));
            }
        }

        Ok(())
    }

    /// Builds the model this specification describes.
    pub fn build(&self) -> Result<Sequential> {
        self.validate()?;

        let layers = self.layers().iter().map(|spec| match *spec {
            LayerSpec::Dense { dim, act_fn } => {
                Layer::dense(dim, act_fn.map(|ActFnSpec::Relu| ActFn::relu()))
            }
            LayerSpec::Softmax { dim } => Layer::softmax(dim),
        });

        Ok(Sequential::new(layers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::Model;

    #[test]
    fn dense_classifier_chains_dimensions() {
        let spec = ModelSpec::dense_classifier(1, &[64, 32, 8], 3);

        spec.validate().unwrap();
        assert_eq!(spec.input_size(), 1);
        assert_eq!(spec.output_size(), 3);
        assert_eq!(spec.layers().len(), 5);
        assert_eq!(
            spec.layers()[3],
            LayerSpec::Dense {
                dim: (8, 3),
                act_fn: None
            }
        );
    }

    #[test]
    fn built_model_round_trips_its_spec() {
        let spec = ModelSpec::dense_classifier(2, &[4], 3);
        let model = spec.build().unwrap();

        assert_eq!(model.spec(), spec);
        assert_eq!(model.size(), 3 * 4 + 5 * 3);
    }

    #[test]
    fn mismatched_layers_are_rejected() {
        let spec = ModelSpec::Sequential {
            layers: vec![
                LayerSpec::Dense {
                    dim: (1, 4),
                    act_fn: None,
                },
                LayerSpec::Dense {
                    dim: (5, 2),
                    act_fn: None,
                },
            ],
        };

        assert!(matches!(spec.validate(), Err(MlErr::InvalidSpec(_))));
    }

    #[test]
    fn empty_model_is_rejected() {
        let spec = ModelSpec::Sequential { layers: vec![] };
        assert!(spec.build().is_err());
    }

    #[test]
    fn spec_serializes_as_snake_case_json() {
        let spec = ModelSpec::dense_classifier(1, &[], 2);
        let json = serde_json::to_string(&spec).unwrap();

        assert!(json.starts_with(r#"{"sequential":{"layers":[{"dense":"#));
        assert_eq!(serde_json::from_str::<ModelSpec>(&json).unwrap(), spec);
    }
}
