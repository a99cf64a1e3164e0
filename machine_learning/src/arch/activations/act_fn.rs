use super::Relu;

/// An element-wise activation function applied by a `Dense` layer.
#[derive(Clone, Copy, Debug)]
pub enum ActFn {
    Relu(Relu),
}

impl ActFn {
    pub fn relu() -> Self {
        ActFn::Relu(Relu::new())
    }

    pub fn f(&self, x: f32) -> f32 {
        match self {
            ActFn::Relu(a) => a.f(x),
        }
    }

    pub fn df(&self, x: f32) -> f32 {
        match self {
            ActFn::Relu(a) => a.df(x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relu_passes_positives_only() {
        let act = ActFn::relu();

        assert_eq!(act.f(2.5), 2.5);
        assert_eq!(act.f(-1.0), 0.0);
        assert_eq!(act.df(2.5), 1.0);
        assert_eq!(act.df(-1.0), 0.0);
    }
}
