use ndarray::{Array2, ArrayView2};

use super::{Dense, Softmax};
use crate::{Result, arch::activations::ActFn};

#[derive(Clone, Debug)]
pub enum Layer {
    Dense(Dense),
    Softmax(Softmax),
}
use Layer::*;

impl Layer {
    pub fn dense(dim: (usize, usize), act_fn: Option<ActFn>) -> Self {
        Self::Dense(Dense::new(dim, act_fn))
    }

    pub fn softmax(dim: usize) -> Self {
        Self::Softmax(Softmax::new(dim))
    }

    /// Returns the amount of parameters this layer takes from the model's parameters.
    pub fn size(&self) -> usize {
        match self {
            Dense(l) => l.size(),
            Softmax(_) => 0,
        }
    }

    /// Returns the (input, output) size of this layer.
    pub fn dim(&self) -> (usize, usize) {
        match self {
            Dense(l) => l.dim(),
            Softmax(l) => (l.dim(), l.dim()),
        }
    }

    pub fn infer(&self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        match self {
            Dense(l) => l.infer(params, x),
            Softmax(l) => l.infer(x),
        }
    }

    pub fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        match self {
            Dense(l) => l.forward(params, x),
            Softmax(l) => l.forward(x),
        }
    }

    pub fn backward(
        &mut self,
        params: &[f32],
        grad: &mut [f32],
        d: Array2<f32>,
    ) -> Result<Array2<f32>> {
        match self {
            Dense(l) => l.backward(params, grad, d),
            Softmax(l) => l.backward(d),
        }
    }
}
