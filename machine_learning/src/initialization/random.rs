use std::{cell::RefCell, rc::Rc};

use rand::Rng;
use rand_distr::{Distribution, Uniform};

use super::ParamGen;
use crate::{MlErr, Result};

/// Draws parameters from a distribution.
///
/// The random number generator is shared so that every layer of a model draws from the same
/// seeded stream, in layer order.
pub struct RandParamGen<R: Rng, D: Distribution<f32>> {
    rng: Rc<RefCell<R>>,
    distribution: D,
    remaining: usize,
}

impl<R: Rng, D: Distribution<f32>> RandParamGen<R, D> {
    /// Creates a new `RandParamGen`.
    ///
    /// # Arguments
    /// * `rng` - The shared random number generator.
    /// * `distribution` - The distribution values are drawn from.
    /// * `limit` - How many values it yields in total.
    pub fn new(rng: Rc<RefCell<R>>, distribution: D, limit: usize) -> Self {
        Self {
            rng,
            distribution,
            remaining: limit,
        }
    }
}

impl<R: Rng> RandParamGen<R, Uniform<f32>> {
    /// Draws uniformly from `[low, high)`.
    ///
    /// # Returns
    /// An error if the range is empty.
    pub fn uniform(rng: Rc<RefCell<R>>, limit: usize, low: f32, high: f32) -> Result<Self> {
        let distribution = Uniform::new(low, high)
            .map_err(|e| MlErr::InvalidSpec(format!("invalid uniform range: {e}")))?;

        Ok(Self::new(rng, distribution, limit))
    }

    /// Glorot uniform initialization of a `fan_in` by `fan_out` kernel: uniform in `[-l, l)`
    /// where `l = sqrt(6 / (fan_in + fan_out))`.
    pub fn xavier_uniform(
        rng: Rc<RefCell<R>>,
        limit: usize,
        fan_in: usize,
        fan_out: usize,
    ) -> Result<Self> {
        let bound = (6. / (fan_in + fan_out) as f32).sqrt();
        Self::uniform(rng, limit, -bound, bound)
    }
}

impl<R: Rng, D: Distribution<f32>> ParamGen for RandParamGen<R, D> {
    fn sample(&mut self, n: usize) -> Option<Vec<f32>> {
        let take = n.min(self.remaining);
        if take == 0 {
            return None;
        }

        self.remaining -= take;
        let mut rng = self.rng.borrow_mut();
        Some((0..take).map(|_| self.distribution.sample(&mut *rng)).collect())
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn shared_rng(seed: u64) -> Rc<RefCell<StdRng>> {
        Rc::new(RefCell::new(StdRng::seed_from_u64(seed)))
    }

    #[test]
    fn glorot_bound() {
        // fan_in + fan_out = 6 puts the bound at 1
        let mut kernel = RandParamGen::xavier_uniform(shared_rng(42), 100, 1, 5).unwrap();
        let sample = kernel.sample(200).unwrap();

        assert_eq!(sample.len(), 100);
        assert!(sample.iter().all(|w| (-1.0..1.0).contains(w)));
        assert!(kernel.sample(1).is_none());
    }

    #[test]
    fn seeded_samples_repeat() {
        let draw = || {
            RandParamGen::uniform(shared_rng(7), 10, -1., 1.)
                .unwrap()
                .sample(10)
        };

        assert_eq!(draw(), draw());
    }

    #[test]
    fn generators_share_the_stream() {
        let rng = shared_rng(7);
        let mut first = RandParamGen::uniform(rng.clone(), 5, -1., 1.).unwrap();
        let mut second = RandParamGen::uniform(rng, 5, -1., 1.).unwrap();

        let mut alone = RandParamGen::uniform(shared_rng(7), 10, -1., 1.).unwrap();
        let mut chained = first.sample(5).unwrap();
        chained.extend(second.sample(5).unwrap());

        assert_eq!(chained, alone.sample(10).unwrap());
    }

    #[test]
    fn empty_range_fails() {
        assert!(RandParamGen::uniform(shared_rng(0), 10, 1., -1.).is_err());
    }
}
