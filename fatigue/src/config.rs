use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use log::info;
use machine_learning::{arch::ModelSpec, optimization::OptimizerSpec, training::TrainerSpec};
use serde::{Deserialize, Serialize};

use crate::{FatigueError, Result, export::Precision};

/// The file the binary reads its configuration from, when present.
pub const CONFIG_PATH: &str = "fatigue.json";

/// Every knob of a mouse fatigue run. Missing keys take their default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FatigueConfig {
    pub csv_path: PathBuf,
    pub input_column: String,
    pub label_column: String,
    pub scaled_column: String,
    pub model_dir: PathBuf,
    pub model_name: String,
    pub scale_val: f32,
    pub hidden_layers: Vec<usize>,
    pub classes: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub optimizer: String,
    pub learning_rate: Option<f32>,
    pub seed: Option<u64>,
    pub precision: Precision,
    pub test_csv: Option<PathBuf>,
    pub histogram_bins: (usize, usize),
    pub visualize: bool,
}

impl Default for FatigueConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("fatigue_data_set.csv"),
            input_column: "HRS".into(),
            label_column: "Soreness".into(),
            scaled_column: "scaled_HRS".into(),
            model_dir: PathBuf::from("model"),
            model_name: "mouse_fatigue_level".into(),
            scale_val: 1000.0,
            hidden_layers: vec![64, 32, 8],
            classes: 3,
            epochs: 150,
            batch_size: 32,
            optimizer: "adam".into(),
            learning_rate: None,
            seed: None,
            precision: Precision::Int8,
            test_csv: None,
            histogram_bins: (10, 10),
            visualize: true,
        }
    }
}

impl FatigueConfig {
    /// Reads a configuration from a json file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the configuration at `path` if it exists, otherwise uses the defaults.
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            info!("reading configuration from {}", path.display());
            return Self::from_file(path);
        }

        info!("no {} found, using the default configuration", path.display());
        Ok(Self::default())
    }

    /// Checks the values a run can't start without.
    pub fn validate(&self) -> Result<()> {
        if !self.scale_val.is_finite() || self.scale_val == 0.0 {
            return Err(invalid("scale_val must be a finite non zero number"));
        }

        if self.classes < 2 {
            return Err(invalid("classes must be at least 2"));
        }

        if self.hidden_layers.contains(&0) {
            return Err(invalid("hidden layers must have at least one unit"));
        }

        if self.epochs == 0 || self.batch_size == 0 {
            return Err(invalid("epochs and batch_size must be greater than 0"));
        }

        if self.histogram_bins.0 == 0 || self.histogram_bins.1 == 0 {
            return Err(invalid("histogram_bins must be greater than 0"));
        }

        if !is_c_identifier(&self.model_name) {
            return Err(FatigueError::InvalidConfig(format!(
                "model_name '{}' must be a valid C identifier",
                self.model_name
            )));
        }

        Ok(())
    }

    /// The architecture of the classifier: `input_size` features in, `classes` probabilities out.
    pub fn model_spec(&self, input_size: usize) -> ModelSpec {
        ModelSpec::dense_classifier(input_size, &self.hidden_layers, self.classes)
    }

    /// Resolves the training specification, failing on an unregistered optimizer name.
    pub fn trainer_spec(&self, input_size: usize) -> Result<TrainerSpec> {
        let optimizer = OptimizerSpec::from_name(&self.optimizer, self.learning_rate)?;
        let non_zero = |n: usize, what: &str| {
            NonZeroUsize::new(n).ok_or_else(|| invalid(&format!("{what} must be greater than 0")))
        };

        Ok(TrainerSpec {
            model: self.model_spec(input_size),
            optimizer,
            epochs: non_zero(self.epochs, "epochs")?,
            batch_size: non_zero(self.batch_size, "batch_size")?,
            seed: self.seed,
        })
    }

    /// Path of an artifact named after the model, e.g. `model/mouse_fatigue_level.h`.
    pub fn artifact_path(&self, extension: &str) -> PathBuf {
        self.model_dir.join(format!("{}.{extension}", self.model_name))
    }
}

fn invalid(msg: &str) -> FatigueError {
    FatigueError::InvalidConfig(msg.to_string())
}

fn is_c_identifier(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use machine_learning::MlErr;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn defaults_describe_the_fatigue_classifier() {
        let config = FatigueConfig::default();
        config.validate().unwrap();

        let spec = config.trainer_spec(1).unwrap();
        assert_eq!(spec.epochs.get(), 150);
        assert_eq!(spec.model.input_size(), 1);
        assert_eq!(spec.model.output_size(), 3);
        assert_eq!(
            config.artifact_path("h"),
            PathBuf::from("model/mouse_fatigue_level.h")
        );
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: FatigueConfig =
            serde_json::from_str(r#"{"epochs": 5, "optimizer": "SGD", "precision": "float16"}"#)
                .unwrap();

        assert_eq!(config.epochs, 5);
        assert_eq!(config.precision, Precision::Float16);
        assert_eq!(config.input_column, "HRS");
        assert!(config.trainer_spec(1).is_ok());
    }

    #[test]
    fn unknown_optimizer_is_a_config_error() {
        let config = FatigueConfig {
            optimizer: "TEAM10".into(),
            ..Default::default()
        };

        let err = config.trainer_spec(1).unwrap_err();
        assert!(matches!(err, FatigueError::Ml(MlErr::UnknownOptimizer(_))));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad = [
            FatigueConfig {
                scale_val: 0.0,
                ..Default::default()
            },
            FatigueConfig {
                classes: 1,
                ..Default::default()
            },
            FatigueConfig {
                hidden_layers: vec![64, 0],
                ..Default::default()
            },
            FatigueConfig {
                model_name: "3d-model".into(),
                ..Default::default()
            },
        ];

        for config in bad {
            assert!(matches!(
                config.validate(),
                Err(FatigueError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config = FatigueConfig::from_file_or_default("does/not/exist.json").unwrap();
        assert_eq!(config, FatigueConfig::default());
    }

    #[test]
    fn reads_a_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_PATH);
        fs::write(&path, r#"{"epochs": 20, "seed": 7, "test_csv": "held_out.csv"}"#).unwrap();

        let config = FatigueConfig::from_file_or_default(&path).unwrap();
        assert_eq!(config.epochs, 20);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.test_csv, Some(PathBuf::from("held_out.csv")));
        assert_eq!(config.optimizer, "adam");
    }

    #[test]
    fn config_file_is_validated_on_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_PATH);
        fs::write(&path, r#"{"model_name": "3d"}"#).unwrap();

        let err = FatigueConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, FatigueError::InvalidConfig(_)));
    }

    #[test]
    fn malformed_config_file_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_PATH);
        fs::write(&path, "{ epochs: 20").unwrap();

        assert!(matches!(
            FatigueConfig::from_file(&path),
            Err(FatigueError::Json(_))
        ));
    }
}
