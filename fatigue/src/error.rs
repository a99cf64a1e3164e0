use std::{error::Error, fmt, io};

use machine_learning::MlErr;
use safetensors::SafeTensorError;

/// The fatigue pipeline's result type.
pub type Result<T> = std::result::Result<T, FatigueError>;

/// Failures of the fatigue pipeline, from reading the data set to exporting the model.
#[derive(Debug)]
pub enum FatigueError {
    Io(io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    SafeTensors(SafeTensorError),
    Ml(MlErr),
    MissingColumn(String),
    NotNumeric {
        column: String,
        row: usize,
        value: String,
    },
    ColumnLength {
        column: String,
        got: usize,
        expected: usize,
    },
    InvalidConfig(String),
    InvalidModel(String),
    StageNotReady(&'static str),
}

impl fmt::Display for FatigueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatigueError::Io(e) => write!(f, "io error: {e}"),
            FatigueError::Csv(e) => write!(f, "csv error: {e}"),
            FatigueError::Json(e) => write!(f, "json error: {e}"),
            FatigueError::SafeTensors(e) => write!(f, "safetensors error: {e}"),
            FatigueError::Ml(e) => write!(f, "{e}"),
            FatigueError::MissingColumn(column) => write!(f, "missing column '{column}'"),
            FatigueError::NotNumeric { column, row, value } => write!(
                f,
                "column '{column}' has a non numeric value '{value}' at row {row}"
            ),
            FatigueError::ColumnLength { column, got, expected } => {
                write!(f, "column '{column}' has {got} values, expected {expected}")
            }
            FatigueError::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            FatigueError::InvalidModel(msg) => write!(f, "invalid model: {msg}"),
            FatigueError::StageNotReady(stage) => {
                write!(f, "pipeline stage '{stage}' has not been run yet")
            }
        }
    }
}

impl Error for FatigueError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FatigueError::Io(e) => Some(e),
            FatigueError::Csv(e) => Some(e),
            FatigueError::Json(e) => Some(e),
            FatigueError::SafeTensors(e) => Some(e),
            FatigueError::Ml(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FatigueError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for FatigueError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<serde_json::Error> for FatigueError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<SafeTensorError> for FatigueError {
    fn from(value: SafeTensorError) -> Self {
        Self::SafeTensors(value)
    }
}

impl From<MlErr> for FatigueError {
    fn from(value: MlErr) -> Self {
        Self::Ml(value)
    }
}

impl From<ndarray::ShapeError> for FatigueError {
    fn from(value: ndarray::ShapeError) -> Self {
        Self::Ml(value.into())
    }
}
