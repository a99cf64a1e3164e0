use std::{collections::HashMap, fs, path::Path};

use log::info;
use machine_learning::arch::{Model, ModelSpec};
use safetensors::{Dtype, SafeTensors, serialize, tensor::TensorView};

use crate::{FatigueError, Result, classifier::FatigueClassifier};

const ARCHITECTURE_KEY: &str = "architecture";
const INPUT_SCALE_KEY: &str = "input_scale";

/// Saves and restores classifiers as safetensors files.
///
/// Each dense layer `i` is stored as a `dense_<i>.kernel` tensor of shape `[in, out]` and a
/// `dense_<i>.bias` tensor of shape `[out]`. The architecture is kept as json in the metadata.
pub struct Checkpoint;

impl Checkpoint {
    pub fn to_bytes(classifier: &FatigueClassifier) -> Result<Vec<u8>> {
        let layers = classifier.dense_layers();
        let mut tensors = Vec::with_capacity(layers.len() * 2);

        for (i, layer) in layers.iter().enumerate() {
            let (n, m) = layer.dim;
            let kernel =
                TensorView::new(Dtype::F32, vec![n, m], bytemuck::cast_slice(layer.kernel))?;
            let bias = TensorView::new(Dtype::F32, vec![m], bytemuck::cast_slice(layer.bias))?;

            tensors.push((format!("dense_{i}.kernel"), kernel));
            tensors.push((format!("dense_{i}.bias"), bias));
        }

        let metadata = HashMap::from([
            (
                ARCHITECTURE_KEY.to_string(),
                serde_json::to_string(&classifier.spec())?,
            ),
            (
                INPUT_SCALE_KEY.to_string(),
                classifier.input_scale().to_string(),
            ),
        ]);

        Ok(serialize(tensors, &Some(metadata))?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<FatigueClassifier> {
        let (_, header) = SafeTensors::read_metadata(bytes)?;
        let metadata = header
            .metadata()
            .as_ref()
            .ok_or_else(|| invalid("the checkpoint has no metadata"))?;

        let architecture = metadata
            .get(ARCHITECTURE_KEY)
            .ok_or_else(|| invalid("the checkpoint has no architecture"))?;
        let spec: ModelSpec = serde_json::from_str(architecture)?;

        let input_scale = metadata
            .get(INPUT_SCALE_KEY)
            .and_then(|s| s.parse::<f32>().ok())
            .ok_or_else(|| invalid("the checkpoint has no valid input scale"))?;

        let tensors = SafeTensors::deserialize(bytes)?;
        let model = spec.build()?;
        let mut params = Vec::with_capacity(model.size());

        let dense = spec.layers().len().saturating_sub(1);
        for i in 0..dense {
            params.extend(read_f32(&tensors, &format!("dense_{i}.kernel"))?);
            params.extend(read_f32(&tensors, &format!("dense_{i}.bias"))?);
        }

        FatigueClassifier::new(model, params, input_scale)
    }

    /// Writes the classifier to `path`.
    pub fn save<P: AsRef<Path>>(classifier: &FatigueClassifier, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, Self::to_bytes(classifier)?)?;

        info!("model saved to {}", path.display());
        Ok(())
    }

    /// Restores the classifier saved at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<FatigueClassifier> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

fn read_f32(tensors: &SafeTensors<'_>, name: &str) -> Result<Vec<f32>> {
    let tensor = tensors.tensor(name)?;

    if tensor.dtype() != Dtype::F32 {
        return Err(invalid(&format!("tensor {name} is not f32")));
    }

    Ok(bytemuck::pod_collect_to_vec(tensor.data()))
}

fn invalid(msg: &str) -> FatigueError {
    FatigueError::InvalidModel(msg.to_string())
}
