use super::ParamGen;

/// Yields the same value `limit` times, e.g. zeroed biases.
pub struct ConstParamGen {
    value: f32,
    remaining: usize,
}

impl ConstParamGen {
    /// Creates a new `ConstParamGen`.
    ///
    /// # Arguments
    /// * `value` - The value every sample is filled with.
    /// * `limit` - How many values it yields in total.
    pub fn new(value: f32, limit: usize) -> Self {
        Self {
            value,
            remaining: limit,
        }
    }

    pub fn zeros(limit: usize) -> Self {
        Self::new(0., limit)
    }
}

impl ParamGen for ConstParamGen {
    fn sample(&mut self, n: usize) -> Option<Vec<f32>> {
        let take = n.min(self.remaining);
        if take == 0 {
            return None;
        }

        self.remaining -= take;
        Some(vec![self.value; take])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_generator_yields_nothing() {
        assert!(ConstParamGen::new(1., 0).sample(4).is_none());
    }

    #[test]
    fn last_sample_is_truncated() {
        let mut biases = ConstParamGen::zeros(10);

        assert_eq!(biases.sample(6), Some(vec![0.; 6]));
        assert_eq!(biases.sample(6), Some(vec![0.; 4]));
        assert_eq!(biases.sample(6), None);
    }

    #[test]
    fn fills_with_its_value() {
        assert_eq!(ConstParamGen::new(0.5, 3).sample(3), Some(vec![0.5; 3]));
    }
}
