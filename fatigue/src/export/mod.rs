//! Conversion of a trained classifier into a compact quantized binary, and of that binary into a
//! C header for firmware builds.
//!
//! The binary is little-endian:
//!
//! | field          | type                      |
//! |----------------|---------------------------|
//! | magic          | `b"MFQM"`                 |
//! | version        | `u16`                     |
//! | precision      | `u8` (0 int8, 1 float16)  |
//! | reserved       | `u8`                      |
//! | input scale    | `f32`                     |
//! | input size     | `u32`                     |
//! | classes        | `u32`                     |
//! | layer count    | `u32`                     |
//! | layers         | `layer count` times below |
//!
//! Each layer holds its input and output sizes (`u32` each), an activation code (`u8`, 0 linear,
//! 1 relu, 2 softmax) and then its kernel and bias tensors. A tensor is its length (`u32`)
//! followed, for int8, by its scale (`f32`), its zero point (`i8`) and its values (`i8` each), or,
//! for float16, by its values (`u16` bits each).

mod format;
mod header;
mod infer;

pub use format::{Activation, Precision, QuantizedLayer, QuantizedModel, TensorData};
pub use header::hex_to_c_array;
