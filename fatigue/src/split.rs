use log::warn;
use machine_learning::dataset::Dataset;
use ndarray::{Array2, ArrayView2};

use crate::{
    FatigueError, Result,
    preprocess::scale_column,
    test_data::{TEST_INPUTS, TEST_LABELS},
};

/// Training and test samples of a single feature classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSplit {
    train_inputs: Array2<f32>,
    train_labels: Array2<f32>,
    test_inputs: Array2<f32>,
    test_labels: Array2<f32>,
}

impl DataSplit {
    /// Creates a new `DataSplit`.
    ///
    /// # Arguments
    /// * `train_inputs` - The scaled training inputs.
    /// * `train_labels` - The class of each training input.
    /// * `test_inputs` - The scaled test inputs.
    /// * `test_labels` - The class of each test input.
    pub fn new(
        train_inputs: Vec<f32>,
        train_labels: Vec<f32>,
        test_inputs: Vec<f32>,
        test_labels: Vec<f32>,
    ) -> Result<Self> {
        if test_inputs.is_empty() {
            warn!("the test split is empty, the model won't be evaluated");
        }

        let (train_len, test_len) = (train_inputs.len(), test_inputs.len());

        Ok(Self {
            train_inputs: column("train inputs", train_inputs, None)?,
            train_labels: column("train labels", train_labels, Some(train_len))?,
            test_inputs: column("test inputs", test_inputs, None)?,
            test_labels: column("test labels", test_labels, Some(test_len))?,
        })
    }

    /// Trains on every sample and tests on the fixed held out measurements, scaled by `scale_val`.
    pub fn with_fixed_test_set(
        train_inputs: Vec<f32>,
        train_labels: Vec<f32>,
        scale_val: f32,
    ) -> Result<Self> {
        Self::new(
            train_inputs,
            train_labels,
            scale_column(&TEST_INPUTS, scale_val),
            TEST_LABELS.to_vec(),
        )
    }

    pub fn train_inputs(&self) -> ArrayView2<'_, f32> {
        self.train_inputs.view()
    }

    pub fn train_labels(&self) -> ArrayView2<'_, f32> {
        self.train_labels.view()
    }

    pub fn test_inputs(&self) -> ArrayView2<'_, f32> {
        self.test_inputs.view()
    }

    pub fn test_labels(&self) -> ArrayView2<'_, f32> {
        self.test_labels.view()
    }

    pub fn has_test_set(&self) -> bool {
        self.test_inputs.nrows() > 0
    }

    /// Pairs the training inputs with their labels.
    pub fn train_dataset(&self) -> Result<Dataset> {
        Ok(Dataset::from_parts(
            self.train_inputs.view(),
            self.train_labels.view(),
        )?)
    }
}

fn column(what: &str, values: Vec<f32>, expected: Option<usize>) -> Result<Array2<f32>> {
    match expected {
        Some(expected) if values.len() != expected => {
            return Err(FatigueError::ColumnLength {
                column: what.to_string(),
                got: values.len(),
                expected,
            });
        }
        _ => {}
    }

    Ok(Array2::from_shape_vec((values.len(), 1), values)?)
}
