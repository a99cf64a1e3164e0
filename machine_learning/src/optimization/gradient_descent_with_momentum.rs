use super::{Optimizer, optimizer::check_sizes};
use crate::Result;

/// Gradient descent where each step keeps a fraction of the previous one:
/// `v = momentum * v - learning_rate * g` and then `p += v`.
#[derive(Debug)]
pub struct GradientDescentWithMomentum {
    learning_rate: f32,
    momentum: f32,
    velocity: Vec<f32>,
}

impl GradientDescentWithMomentum {
    /// Creates a new `GradientDescentWithMomentum` optimizer.
    ///
    /// # Arguments
    /// * `len` - The amount of parameters it will update.
    /// * `learning_rate` - The scale of each gradient step.
    /// * `momentum` - The fraction of the last step carried into the next one.
    pub fn new(len: usize, learning_rate: f32, momentum: f32) -> Self {
        Self {
            learning_rate,
            momentum,
            velocity: vec![0.; len],
        }
    }
}

impl Optimizer for GradientDescentWithMomentum {
    fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()> {
        check_sizes(grad, params)?;
        check_sizes(&self.velocity, params)?;

        for ((p, g), v) in params.iter_mut().zip(grad).zip(&mut self.velocity) {
            *v = self.momentum * *v - self.learning_rate * g;
            *p += *v;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocity_accumulates() {
        let mut optimizer = GradientDescentWithMomentum::new(1, 0.1, 0.5);
        let mut params = [0.];

        optimizer.update_params(&[1.], &mut params).unwrap();
        assert!((params[0] - -0.1).abs() < 1e-6);

        optimizer.update_params(&[1.], &mut params).unwrap();
        assert!((params[0] - -0.25).abs() < 1e-6);
    }

    #[test]
    fn zero_momentum_is_plain_descent() {
        let mut optimizer = GradientDescentWithMomentum::new(2, 0.5, 0.);
        let mut params = [1., 1.];

        for _ in 0..3 {
            optimizer.update_params(&[1., -1.], &mut params).unwrap();
        }

        assert_eq!(params, [-0.5, 2.5]);
    }

    #[test]
    fn optimizer_sized_for_another_model() {
        let mut optimizer = GradientDescentWithMomentum::new(3, 0.1, 0.9);
        assert!(optimizer.update_params(&[1.], &mut [0.]).is_err());
    }
}
