use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{info, warn};
use machine_learning::training::{EpochStats, TrainerBuilder};

use crate::{
    FatigueError, Result,
    checkpoint::Checkpoint,
    classifier::FatigueClassifier,
    config::FatigueConfig,
    export::{QuantizedModel, hex_to_c_array},
    loader::CsvTable,
    preprocess::scale_column,
    split::DataSplit,
    visualizer::{Histogram2d, Labels},
};

/// Proof that a trained model was written to disk. Only `MouseFatigue::save_model` creates one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedModel {
    path: PathBuf,
}

impl SavedModel {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// What training produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub history: Vec<EpochStats>,
    /// Loss and accuracy over the test split, if there is one.
    pub evaluation: Option<EpochStats>,
}

/// The files written by a conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedModel {
    pub model_path: PathBuf,
    pub header_path: PathBuf,
    pub model_len: usize,
    pub test_accuracy: Option<f32>,
}

/// Trains a soreness classifier on HRS measurements and exports it for firmware.
///
/// Stages run in order: visualization, scaling, labelling, splitting, training, saving and
/// conversion. A stage that needs an earlier one fails with `FatigueError::StageNotReady` when
/// called too soon.
pub struct MouseFatigue {
    config: FatigueConfig,
    table: CsvTable,
    inputs: Option<Vec<f32>>,
    labels: Option<Vec<f32>>,
    split: Option<DataSplit>,
    classifier: Option<FatigueClassifier>,
    report: Option<TrainingReport>,
}

impl MouseFatigue {
    /// Validates the configuration and reads the data set it points to.
    pub fn new(config: FatigueConfig) -> Result<Self> {
        config.validate()?;
        let table = CsvTable::from_path(&config.csv_path)?;

        info!(
            "read {} samples from {}",
            table.len(),
            config.csv_path.display()
        );
        Self::from_table(config, table)
    }

    /// Creates a pipeline over an already loaded data set.
    pub fn from_table(config: FatigueConfig, table: CsvTable) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            table,
            inputs: None,
            labels: None,
            split: None,
            classifier: None,
            report: None,
        })
    }

    pub fn config(&self) -> &FatigueConfig {
        &self.config
    }

    pub fn table(&self) -> &CsvTable {
        &self.table
    }

    pub fn inputs(&self) -> Option<&[f32]> {
        self.inputs.as_deref()
    }

    pub fn labels(&self) -> Option<&[f32]> {
        self.labels.as_deref()
    }

    pub fn split(&self) -> Option<&DataSplit> {
        self.split.as_ref()
    }

    pub fn classifier(&self) -> Option<&FatigueClassifier> {
        self.classifier.as_ref()
    }

    pub fn report(&self) -> Option<&TrainingReport> {
        self.report.as_ref()
    }

    /// Renders the 2D histogram of two numeric columns.
    pub fn plot(
        &self,
        column_1: &str,
        column_2: &str,
        x_label: &str,
        y_label: &str,
    ) -> Result<String> {
        let xs = self.table.numeric_column(column_1)?;
        let ys = self.table.numeric_column(column_2)?;
        let (bins_x, bins_y) = self.config.histogram_bins;

        let hist = Histogram2d::compute(&xs, &ys, bins_x, bins_y)?;
        Ok(hist.render(&Labels::new(x_label, y_label)))
    }

    /// Shows the 2D histogram of two numeric columns on stdout.
    pub fn graphics(
        &self,
        column_1: &str,
        column_2: &str,
        x_label: &str,
        y_label: &str,
    ) -> Result<()> {
        print!("{}", self.plot(column_1, column_2, x_label, y_label)?);
        Ok(())
    }

    /// Shows how the soreness classes spread over the HRS measurements.
    pub fn data_visualization(&self) -> Result<()> {
        let FatigueConfig {
            input_column,
            label_column,
            ..
        } = &self.config;

        self.graphics(input_column, label_column, input_column, label_column)
    }

    /// Adds the scaled input column to the table and takes it as the model's inputs.
    pub fn scale_data_and_define_inputs(&mut self) -> Result<()> {
        let raw = self.table.numeric_column(&self.config.input_column)?;
        let scaled = scale_column(&raw, self.config.scale_val);

        self.table
            .set_numeric_column(&self.config.scaled_column, &scaled)?;
        self.inputs = Some(scaled);
        Ok(())
    }

    /// Takes the label column, as is, as the class of each input.
    pub fn define_and_assign_labels(&mut self) -> Result<()> {
        self.labels = Some(self.table.numeric_column(&self.config.label_column)?);
        Ok(())
    }

    /// Trains on every row and tests on the held out measurements.
    pub fn split_data(&mut self) -> Result<()> {
        let inputs = self
            .inputs
            .clone()
            .ok_or(FatigueError::StageNotReady("scale_data_and_define_inputs"))?;
        let labels = self
            .labels
            .clone()
            .ok_or(FatigueError::StageNotReady("define_and_assign_labels"))?;

        let split = match &self.config.test_csv {
            Some(path) => {
                let test = CsvTable::from_path(path)?;
                let raw = test.numeric_column(&self.config.input_column)?;

                DataSplit::new(
                    inputs,
                    labels,
                    scale_column(&raw, self.config.scale_val),
                    test.numeric_column(&self.config.label_column)?,
                )?
            }
            None => DataSplit::with_fixed_test_set(inputs, labels, self.config.scale_val)?,
        };

        self.split = Some(split);
        Ok(())
    }

    /// Builds the classifier, trains it and evaluates it on the test split.
    ///
    /// # Returns
    /// The per epoch history and the evaluation, or an error. An unknown optimizer name fails
    /// before any training.
    pub fn build_and_train_model(&mut self) -> Result<&TrainingReport> {
        let split = self
            .split
            .as_ref()
            .ok_or(FatigueError::StageNotReady("split_data"))?;

        let input_size = split.train_inputs().ncols();
        let spec = self.config.trainer_spec(input_size)?;
        let (mut trainer, mut params) =
            TrainerBuilder::new().build(&spec, split.train_dataset()?)?;

        info!(
            "training on {} samples for {} epochs with {}",
            split.train_inputs().nrows(),
            spec.epochs,
            self.config.optimizer
        );
        let history = trainer.train(&mut params)?;

        let classifier =
            FatigueClassifier::new(trainer.into_model(), params, self.config.scale_val)?;

        let evaluation = if split.has_test_set() {
            let stats = classifier.evaluate(split.test_inputs(), split.test_labels())?;

            println!("\n\nModel Evaluation:");
            println!("Evaluated Accuracy: {}", stats.accuracy());
            info!(
                "test loss: {:.4} - test accuracy: {:.4}",
                stats.loss(),
                stats.accuracy()
            );
            Some(stats)
        } else {
            warn!("no test samples, skipping evaluation");
            None
        };

        self.classifier = Some(classifier);
        Ok(self.report.insert(TrainingReport {
            history,
            evaluation,
        }))
    }

    /// Writes the trained classifier to `<model_dir>/<model_name>.safetensors`.
    pub fn save_model(&self) -> Result<SavedModel> {
        let classifier = self
            .classifier
            .as_ref()
            .ok_or(FatigueError::StageNotReady("build_and_train_model"))?;

        fs::create_dir_all(&self.config.model_dir)?;
        let path = self.config.artifact_path("safetensors");
        Checkpoint::save(classifier, &path)?;

        Ok(SavedModel { path })
    }

    /// Scales, labels, splits and trains, then saves the model when `save` is set.
    ///
    /// # Returns
    /// The saved model, if `save` was set.
    pub fn neural_network(&mut self, save: bool) -> Result<Option<SavedModel>> {
        self.scale_data_and_define_inputs()?;
        self.define_and_assign_labels()?;
        self.split_data()?;
        self.build_and_train_model()?;

        if save {
            return self.save_model().map(Some);
        }

        Ok(None)
    }

    /// Converts a saved model into the quantized format and the C header embedding it.
    ///
    /// Writes `<model_dir>/<model_name>.qmodel` and `<model_dir>/<model_name>.h`.
    pub fn convert_model(&self, saved: &SavedModel) -> Result<ExportedModel> {
        let classifier = Checkpoint::load(saved.path())?;
        let quantized = QuantizedModel::from_classifier(&classifier, self.config.precision);
        let bytes = quantized.to_bytes();

        let model_path = self.config.artifact_path("qmodel");
        fs::write(&model_path, &bytes)?;
        println!("\r\nModel quantized to {}!\r\n", quantized.precision());

        let header_path = self.config.artifact_path("h");
        fs::write(&header_path, hex_to_c_array(&bytes, &self.config.model_name))?;
        println!("\r\nQuantized model converted to a C header (.h) file!\r\n");

        let test_accuracy = match &self.split {
            Some(split) if split.has_test_set() => {
                let accuracy = quantized.accuracy(split.test_inputs(), split.test_labels())?;
                info!("quantized model test accuracy: {accuracy:.4}");
                Some(accuracy)
            }
            _ => None,
        };

        info!(
            "exported {} bytes to {} and {}",
            bytes.len(),
            model_path.display(),
            header_path.display()
        );

        Ok(ExportedModel {
            model_path,
            header_path,
            model_len: bytes.len(),
            test_accuracy,
        })
    }

    /// Runs every stage: visualization (when enabled), training, saving and conversion.
    pub fn run(&mut self) -> Result<ExportedModel> {
        if self.config.visualize {
            self.data_visualization()?;
        }

        let saved = self
            .neural_network(true)?
            .ok_or(FatigueError::StageNotReady("save_model"))?;

        self.convert_model(&saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "HRS,Soreness\n420,0\n510,0\n760,1\n830,1\n1050,2\n1180,2\n";

    fn pipeline(config: FatigueConfig) -> MouseFatigue {
        let table = CsvTable::from_reader(CSV.as_bytes()).unwrap();
        MouseFatigue::from_table(config, table).unwrap()
    }

    #[test]
    fn scaling_adds_the_scaled_column() {
        let mut mf = pipeline(FatigueConfig::default());
        mf.scale_data_and_define_inputs().unwrap();

        let expected = vec![0.42, 0.51, 0.76, 0.83, 1.05, 1.18];
        assert_eq!(mf.inputs().unwrap(), expected.as_slice());
        assert_eq!(mf.table().numeric_column("scaled_HRS").unwrap(), expected);
    }

    #[test]
    fn labels_are_copied() {
        let mut mf = pipeline(FatigueConfig::default());
        mf.define_and_assign_labels().unwrap();

        assert_eq!(mf.labels().unwrap(), [0.0, 0.0, 1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn stages_run_in_order() {
        let mut mf = pipeline(FatigueConfig::default());

        assert!(matches!(
            mf.split_data(),
            Err(FatigueError::StageNotReady(_))
        ));
        assert!(matches!(
            mf.build_and_train_model(),
            Err(FatigueError::StageNotReady(_))
        ));
        assert!(matches!(
            mf.save_model(),
            Err(FatigueError::StageNotReady(_))
        ));
    }

    #[test]
    fn unknown_optimizer_fails_before_training() {
        let config = FatigueConfig {
            optimizer: "TEAM10".into(),
            ..Default::default()
        };
        let mut mf = pipeline(config);

        mf.scale_data_and_define_inputs().unwrap();
        mf.define_and_assign_labels().unwrap();
        mf.split_data().unwrap();

        assert!(mf.build_and_train_model().is_err());
        assert!(mf.classifier().is_none());
        assert!(mf.report().is_none());
    }

    #[test]
    fn out_of_range_label_fails_at_training() {
        let table = CsvTable::from_reader("HRS,Soreness\n400,0\n900,7\n".as_bytes()).unwrap();
        let config = FatigueConfig {
            epochs: 1,
            seed: Some(1),
            ..Default::default()
        };
        let mut mf = MouseFatigue::from_table(config, table).unwrap();

        assert!(mf.neural_network(false).is_err());
    }

    #[test]
    fn plot_of_hrs_against_soreness() {
        let mf = pipeline(FatigueConfig::default());
        let plot = mf.plot("HRS", "Soreness", "HRS", "Soreness").unwrap();

        assert!(plot.contains("Mouse Fatigue Estimation by HRS"));
        assert!(mf.plot("HRS", "Fatigue", "HRS", "Fatigue").is_err());
    }

    #[test]
    fn training_without_saving() {
        let config = FatigueConfig {
            epochs: 5,
            seed: Some(3),
            ..Default::default()
        };
        let mut mf = pipeline(config);

        assert_eq!(mf.neural_network(false).unwrap(), None);

        let report = mf.report().unwrap();
        assert_eq!(report.history.len(), 5);
        assert!(report.evaluation.is_some());
        assert_eq!(mf.classifier().unwrap().input_size(), 1);
    }
}
