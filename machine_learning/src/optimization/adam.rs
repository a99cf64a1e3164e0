use super::{Optimizer, optimizer::check_sizes};
use crate::Result;

/// Adaptive moment estimation.
///
/// Keeps running means of the gradient (`m`) and of its square (`v`), and folds the bias
/// correction of both into the step size.
#[derive(Debug)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    beta1_power: f32,
    beta2_power: f32,
    m: Vec<f32>,
    v: Vec<f32>,
}

impl Adam {
    /// Creates a new `Adam` optimizer.
    ///
    /// # Arguments
    /// * `len` - The amount of parameters it will update.
    /// * `learning_rate` - The scale of each step.
    /// * `beta1` - The decay of the gradient's running mean.
    /// * `beta2` - The decay of the squared gradient's running mean.
    /// * `epsilon` - Keeps the step finite when the squared gradient's mean is near zero.
    pub fn new(len: usize, learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            beta1_power: 1.,
            beta2_power: 1.,
            m: vec![0.; len],
            v: vec![0.; len],
        }
    }
}

impl Optimizer for Adam {
    fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()> {
        check_sizes(grad, params)?;
        check_sizes(&self.m, params)?;

        self.beta1_power *= self.beta1;
        self.beta2_power *= self.beta2;

        let (b1, b2, eps) = (self.beta1, self.beta2, self.epsilon);
        let alpha = self.learning_rate * (1. - self.beta2_power).sqrt() / (1. - self.beta1_power);
        let moments = self.m.iter_mut().zip(self.v.iter_mut());

        for ((p, g), (m, v)) in params.iter_mut().zip(grad).zip(moments) {
            *m += (1. - b1) * (g - *m);
            *v += (1. - b2) * (g * g - *v);
            *p -= alpha * *m / (v.sqrt() + eps);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_step_has_learning_rate_length() {
        let mut optimizer = Adam::new(2, 0.001, 0.9, 0.999, 1e-7);
        let mut params = [1., 1.];

        optimizer.update_params(&[10., -0.5], &mut params).unwrap();

        assert!((params[0] - 0.999).abs() < 1e-5);
        assert!((params[1] - 1.001).abs() < 1e-5);
    }

    #[test]
    fn minimizes_a_parabola() {
        let mut optimizer = Adam::new(1, 0.1, 0.9, 0.999, 1e-7);
        let mut params = [3.];

        for _ in 0..500 {
            let grad = [2. * params[0]];
            optimizer.update_params(&grad, &mut params).unwrap();
        }

        assert!(params[0].abs() < 0.05, "got {}", params[0]);
    }
}
