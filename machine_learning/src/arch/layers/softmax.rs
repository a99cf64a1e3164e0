use ndarray::prelude::*;

use crate::{MlErr, Result};

/// Normalizes each row into a probability distribution.
///
/// Parameterless: its size is always 0.
#[derive(Clone, Debug)]
pub struct Softmax {
    dim: usize,
    a: Array2<f32>,
}

impl Softmax {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            a: Array2::zeros((0, dim)),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn infer(&self, z: ArrayView2<f32>) -> Result<Array2<f32>> {
        if z.ncols() != self.dim {
            return Err(MlErr::SizeMismatch {
                what: "softmax input",
                got: z.ncols(),
                expected: self.dim,
            });
        }

        let mut a = z.to_owned();
        for mut row in a.rows_mut() {
            let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
            row.mapv_inplace(|v| (v - max).exp());
            let sum = row.sum();
            row /= sum;
        }

        Ok(a)
    }

    pub fn forward(&mut self, z: ArrayView2<f32>) -> Result<Array2<f32>> {
        let a = self.infer(z)?;
        self.a = a.clone();
        Ok(a)
    }

    /// Jacobian-vector product of the softmax: `dz_i = a_i * (d_i - sum_j d_j a_j)`.
    pub fn backward(&mut self, mut d: Array2<f32>) -> Result<Array2<f32>> {
        if d.dim() != self.a.dim() {
            return Err(MlErr::SizeMismatch {
                what: "softmax delta",
                got: d.len(),
                expected: self.a.len(),
            });
        }

        let dot = (&d * &self.a).sum_axis(Axis(1)).insert_axis(Axis(1));
        d -= &dot;
        d *= &self.a;
        Ok(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_sum_to_one() {
        let softmax = Softmax::new(3);
        let z = array![[1., 2., 3.], [1000., 1000., 1000.]];

        let a = softmax.infer(z.view()).unwrap();
        for row in a.rows() {
            assert!((row.sum() - 1.).abs() < 1e-6);
        }
        assert!((a[[1, 0]] - 1. / 3.).abs() < 1e-6);
        assert!(a[[0, 2]] > a[[0, 1]] && a[[0, 1]] > a[[0, 0]]);
    }

    #[test]
    fn backward_matches_finite_differences() {
        let mut softmax = Softmax::new(3);
        let z = array![[0.2, -0.4, 1.1]];
        let d = array![[0.3, -1.2, 0.5]];

        softmax.forward(z.view()).unwrap();
        let dz = softmax.backward(d.clone()).unwrap();

        let eps = 1e-3;
        for j in 0..3 {
            let mut zp = z.clone();
            let mut zm = z.clone();
            zp[[0, j]] += eps;
            zm[[0, j]] -= eps;

            let fp = (&softmax.infer(zp.view()).unwrap() * &d).sum();
            let fm = (&softmax.infer(zm.view()).unwrap() * &d).sum();
            let numeric = (fp - fm) / (2. * eps);

            assert!((numeric - dz[[0, j]]).abs() < 1e-2, "{numeric} vs {}", dz[[0, j]]);
        }
    }
}
