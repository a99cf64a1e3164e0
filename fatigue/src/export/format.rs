use std::fmt;

use half::f16;
use machine_learning::quantization::AffineQuantization;
use serde::{Deserialize, Serialize};

use crate::{FatigueError, Result, classifier::FatigueClassifier};

const MAGIC: &[u8; 4] = b"MFQM";
const VERSION: u16 = 1;

/// How the exported tensors are stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    /// Per tensor min-max affine int8.
    #[default]
    Int8,
    /// IEEE half precision floats.
    Float16,
}

impl Precision {
    fn code(self) -> u8 {
        match self {
            Precision::Int8 => 0,
            Precision::Float16 => 1,
        }
    }

    fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Precision::Int8),
            1 => Ok(Precision::Float16),
            code => Err(malformed(format!("unknown precision code {code}"))),
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::Int8 => write!(f, "int8"),
            Precision::Float16 => write!(f, "float16"),
        }
    }
}

/// The function applied to a layer's weighted sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Linear,
    Relu,
    Softmax,
}

impl Activation {
    fn code(self) -> u8 {
        match self {
            Activation::Linear => 0,
            Activation::Relu => 1,
            Activation::Softmax => 2,
        }
    }

    fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Activation::Linear),
            1 => Ok(Activation::Relu),
            2 => Ok(Activation::Softmax),
            code => Err(malformed(format!("unknown activation code {code}"))),
        }
    }
}

/// The stored values of a tensor.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    Int8 {
        quant: AffineQuantization,
        values: Vec<i8>,
    },
    Float16(Vec<f16>),
}

impl TensorData {
    pub fn new(values: &[f32], precision: Precision) -> Self {
        match precision {
            Precision::Int8 => {
                let quant = AffineQuantization::from_values(values);
                TensorData::Int8 {
                    values: quant.quantize(values),
                    quant,
                }
            }
            Precision::Float16 => {
                TensorData::Float16(values.iter().copied().map(f16::from_f32).collect())
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TensorData::Int8 { values, .. } => values.len(),
            TensorData::Float16(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The values this tensor approximates.
    pub fn to_f32(&self) -> Vec<f32> {
        match self {
            TensorData::Int8 { quant, values } => quant.dequantize(values),
            TensorData::Float16(values) => values.iter().map(|v| v.to_f32()).collect(),
        }
    }

    fn precision(&self) -> Precision {
        match self {
            TensorData::Int8 { .. } => Precision::Int8,
            TensorData::Float16(_) => Precision::Float16,
        }
    }

    fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&(self.len() as u32).to_le_bytes());

        match self {
            TensorData::Int8 { quant, values } => {
                buf.extend_from_slice(&quant.scale.to_le_bytes());
                buf.extend_from_slice(&quant.offset.to_le_bytes());
                buf.extend_from_slice(bytemuck::cast_slice::<i8, u8>(values));
            }
            TensorData::Float16(values) => {
                for value in values {
                    buf.extend_from_slice(&value.to_le_bytes());
                }
            }
        }
    }

    fn read(reader: &mut Reader<'_>, precision: Precision) -> Result<Self> {
        let len = reader.u32()? as usize;

        let data = match precision {
            Precision::Int8 => {
                let scale = reader.f32()?;
                let offset = reader.u8()? as i8;
                let values = bytemuck::cast_slice::<u8, i8>(reader.take(len)?).to_vec();

                TensorData::Int8 {
                    quant: AffineQuantization { scale, offset },
                    values,
                }
            }
            Precision::Float16 => {
                let bytes = reader.take(len * 2)?;
                let values = bytes
                    .chunks_exact(2)
                    .map(|b| f16::from_le_bytes([b[0], b[1]]))
                    .collect();

                TensorData::Float16(values)
            }
        };

        Ok(data)
    }
}

/// A dense layer of a quantized model.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedLayer {
    pub dim: (usize, usize),
    pub activation: Activation,
    /// Row-major `(dim.0, dim.1)` weights.
    pub kernel: TensorData,
    pub bias: TensorData,
}

/// A classifier with its tensors stored in reduced precision.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedModel {
    precision: Precision,
    input_scale: f32,
    layers: Vec<QuantizedLayer>,
}

impl QuantizedModel {
    /// Converts a trained classifier, quantizing every kernel and bias on its own.
    ///
    /// The classifier's softmax is folded into its last dense layer.
    ///
    /// # Arguments
    /// * `classifier` - The trained classifier.
    /// * `precision` - How the tensors are stored.
    pub fn from_classifier(classifier: &FatigueClassifier, precision: Precision) -> Self {
        let dense = classifier.dense_layers();
        let last = dense.len().saturating_sub(1);

        let layers = dense
            .iter()
            .enumerate()
            .map(|(i, layer)| QuantizedLayer {
                dim: layer.dim,
                activation: match (i == last, layer.relu) {
                    (true, _) => Activation::Softmax,
                    (false, true) => Activation::Relu,
                    (false, false) => Activation::Linear,
                },
                kernel: TensorData::new(layer.kernel, precision),
                bias: TensorData::new(layer.bias, precision),
            })
            .collect();

        Self {
            precision,
            input_scale: classifier.input_scale(),
            layers,
        }
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn input_scale(&self) -> f32 {
        self.input_scale
    }

    pub fn layers(&self) -> &[QuantizedLayer] {
        &self.layers
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |l| l.dim.0)
    }

    pub fn classes(&self) -> usize {
        self.layers.last().map_or(0, |l| l.dim.1)
    }

    /// Serializes the model into its binary layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&VERSION.to_le_bytes());
        buf.push(self.precision.code());
        buf.push(0);
        buf.extend_from_slice(&self.input_scale.to_le_bytes());
        buf.extend_from_slice(&(self.input_size() as u32).to_le_bytes());
        buf.extend_from_slice(&(self.classes() as u32).to_le_bytes());
        buf.extend_from_slice(&(self.layers.len() as u32).to_le_bytes());

        for layer in &self.layers {
            buf.extend_from_slice(&(layer.dim.0 as u32).to_le_bytes());
            buf.extend_from_slice(&(layer.dim.1 as u32).to_le_bytes());
            buf.push(layer.activation.code());
            layer.kernel.write(&mut buf);
            layer.bias.write(&mut buf);
        }

        buf
    }

    /// Parses a model from its binary layout.
    ///
    /// # Returns
    /// The model or an error if the bytes aren't a well formed model.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);

        if reader.take(MAGIC.len())? != MAGIC {
            return Err(malformed("bad magic number".to_string()));
        }

        let version = reader.u16()?;
        if version != VERSION {
            return Err(malformed(format!("unsupported version {version}")));
        }

        let precision = Precision::from_code(reader.u8()?)?;
        reader.u8()?;
        let input_scale = reader.f32()?;
        let input_size = reader.u32()? as usize;
        let classes = reader.u32()? as usize;
        let layer_count = reader.u32()? as usize;

        let mut layers = Vec::new();
        for _ in 0..layer_count {
            let dim = (reader.u32()? as usize, reader.u32()? as usize);
            let activation = Activation::from_code(reader.u8()?)?;
            let kernel = TensorData::read(&mut reader, precision)?;
            let bias = TensorData::read(&mut reader, precision)?;

            if kernel.len() != dim.0 * dim.1 || bias.len() != dim.1 {
                return Err(malformed(format!(
                    "layer of dim {dim:?} has {} weights and {} biases",
                    kernel.len(),
                    bias.len()
                )));
            }

            layers.push(QuantizedLayer {
                dim,
                activation,
                kernel,
                bias,
            });
        }

        if !reader.is_empty() {
            return Err(malformed("trailing bytes".to_string()));
        }

        let model = Self {
            precision,
            input_scale,
            layers,
        };
        model.check(input_size, classes)?;
        Ok(model)
    }

    fn check(&self, input_size: usize, classes: usize) -> Result<()> {
        if self.layers.is_empty() {
            return Err(malformed("the model has no layers".to_string()));
        }

        if self.input_size() != input_size || self.classes() != classes {
            return Err(malformed(format!(
                "header declares {input_size} inputs and {classes} classes, layers have {} and {}",
                self.input_size(),
                self.classes()
            )));
        }

        for pair in self.layers.windows(2) {
            if pair[0].dim.1 != pair[1].dim.0 {
                return Err(malformed(format!(
                    "a layer of {} outputs feeds a layer of {} inputs",
                    pair[0].dim.1, pair[1].dim.0
                )));
            }
        }

        let mixed = self
            .layers
            .iter()
            .flat_map(|l| [&l.kernel, &l.bias])
            .any(|t| t.precision() != self.precision);
        if mixed {
            return Err(malformed("tensors of mixed precision".to_string()));
        }

        Ok(())
    }
}

/// Reads little-endian values off a byte slice.
struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.bytes.len() < n {
            return Err(malformed(format!(
                "expected {n} more bytes, only {} left",
                self.bytes.len()
            )));
        }

        let (head, rest) = self.bytes.split_at(n);
        self.bytes = rest;
        Ok(head)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut array = [0; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.array::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.array()?))
    }
}

fn malformed(msg: String) -> FatigueError {
    FatigueError::InvalidModel(format!("malformed quantized model: {msg}"))
}
