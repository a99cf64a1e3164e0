use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug, Clone, PartialEq)]
pub enum MlErr {
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    InvalidLabel {
        label: f32,
        classes: usize,
    },
    InvalidSpec(String),
    UnknownOptimizer(String),
    EmptyDataset,
    Shape(String),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch in {what}, got {got} and expected {expected}"
            ),
            MlErr::InvalidLabel { label, classes } => write!(
                f,
                "Received label {label}, but labels must be integers in the range [0, {classes})"
            ),
            MlErr::InvalidSpec(msg) => write!(f, "Invalid model specification: {msg}"),
            MlErr::UnknownOptimizer(name) => write!(
                f,
                "Could not interpret optimizer identifier '{name}', expected one of: sgd, momentum, adam"
            ),
            MlErr::EmptyDataset => write!(f, "The dataset has no samples"),
            MlErr::Shape(msg) => write!(f, "Invalid array shape: {msg}"),
        }
    }
}

impl Error for MlErr {}

impl From<ndarray::ShapeError> for MlErr {
    fn from(value: ndarray::ShapeError) -> Self {
        Self::Shape(value.to_string())
    }
}
