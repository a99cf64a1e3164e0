use serde::{Deserialize, Serialize};

/// Per-tensor affine int8 quantization, `q = clamp(round(x / scale) + offset, -128, 127)`.
///
/// The quantized range always contains zero so that zero is represented exactly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineQuantization {
    pub scale: f32,
    pub offset: i8,
}

impl AffineQuantization {
    /// Computes the quantization parameters mapping `[min, max]` onto the int8 range.
    ///
    /// # Arguments
    /// * `min` - The smallest value to represent.
    /// * `max` - The greatest value to represent.
    pub fn new(min: f32, max: f32) -> Self {
        let min = min.min(0.0);
        let max = max.max(0.0);

        let range = max - min;
        let scale = if range > 0.0 { range / 255.0 } else { 1.0 };
        let offset = (-128.0 - min / scale).round().clamp(-128.0, 127.0) as i8;

        Self { scale, offset }
    }

    /// Calibrates the quantization with the running min and max of `values`.
    pub fn from_values(values: &[f32]) -> Self {
        let (min, max) = values
            .iter()
            .fold((0.0f32, 0.0f32), |(lo, hi), &v| (lo.min(v), hi.max(v)));

        Self::new(min, max)
    }

    pub fn quantize(&self, values: &[f32]) -> Vec<i8> {
        values
            .iter()
            .map(|&x| {
                let q = (x / self.scale).round() + self.offset as f32;
                q.clamp(-128.0, 127.0) as i8
            })
            .collect()
    }

    pub fn dequantize(&self, values: &[i8]) -> Vec<f32> {
        values
            .iter()
            .map(|&q| (q as f32 - self.offset as f32) * self.scale)
            .collect()
    }
}
