use serde::{Deserialize, Serialize};

use super::{Adam, GradientDescent, GradientDescentWithMomentum, Optimizer};
use crate::{MlErr, Result};

/// The specification for the `Optimizer` trait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerSpec {
    Adam {
        learning_rate: f32,
        beta1: f32,
        beta2: f32,
        epsilon: f32,
    },
    GradientDescent {
        learning_rate: f32,
    },
    GradientDescentWithMomentum {
        learning_rate: f32,
        momentum: f32,
    },
}

impl OptimizerSpec {
    /// Resolves a registered optimizer name into its specification with default hyperparameters.
    ///
    /// Registered names (case insensitive): `sgd`, `momentum` and `adam`.
    ///
    /// # Arguments
    /// * `name` - The optimizer identifier.
    /// * `learning_rate` - Overrides the optimizer's default learning rate.
    ///
    /// # Returns
    /// The specification or `MlErr::UnknownOptimizer` if the name is not registered.
    pub fn from_name(name: &str, learning_rate: Option<f32>) -> Result<Self> {
        let spec = match name.trim().to_ascii_lowercase().as_str() {
            "sgd" | "gradient_descent" => OptimizerSpec::GradientDescent {
                learning_rate: learning_rate.unwrap_or(0.01),
            },
            "momentum" | "gradient_descent_with_momentum" => {
                OptimizerSpec::GradientDescentWithMomentum {
                    learning_rate: learning_rate.unwrap_or(0.01),
                    momentum: 0.9,
                }
            }
            "adam" => OptimizerSpec::Adam {
                learning_rate: learning_rate.unwrap_or(0.001),
                beta1: 0.9,
                beta2: 0.999,
                epsilon: 1e-7,
            },
            _ => return Err(MlErr::UnknownOptimizer(name.to_string())),
        };

        Ok(spec)
    }

    /// Builds the optimizer for a model of `len` parameters.
    pub fn build(&self, len: usize) -> Box<dyn Optimizer + Send> {
        match *self {
            OptimizerSpec::Adam {
                learning_rate,
                beta1,
                beta2,
                epsilon,
            } => Box::new(Adam::new(len, learning_rate, beta1, beta2, epsilon)),
            OptimizerSpec::GradientDescent { learning_rate } => {
                Box::new(GradientDescent::new(learning_rate))
            }
            OptimizerSpec::GradientDescentWithMomentum {
                learning_rate,
                momentum,
            } => Box::new(GradientDescentWithMomentum::new(len, learning_rate, momentum)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_names_resolve() {
        assert!(matches!(
            OptimizerSpec::from_name("Adam", None).unwrap(),
            OptimizerSpec::Adam { learning_rate, .. } if learning_rate == 0.001
        ));
        assert_eq!(
            OptimizerSpec::from_name("sgd", Some(0.3)).unwrap(),
            OptimizerSpec::GradientDescent { learning_rate: 0.3 }
        );
        assert!(OptimizerSpec::from_name(" momentum ", None).is_ok());
    }

    #[test]
    fn unknown_name_is_a_configuration_error() {
        let err = OptimizerSpec::from_name("TEAM10", None).unwrap_err();
        assert_eq!(err, MlErr::UnknownOptimizer("TEAM10".into()));
    }

    #[test]
    fn built_optimizer_updates_params() {
        let mut optimizer = OptimizerSpec::from_name("sgd", Some(1.)).unwrap().build(1);
        let mut params = [1.];

        optimizer.update_params(&[0.25], &mut params).unwrap();
        assert_eq!(params, [0.75]);
    }
}
