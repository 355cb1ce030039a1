//! Image preprocessing: raw upload bytes → fixed-shape model input.
//!
//! The classifier expects a 224×224 RGB image as an NHWC float tensor with
//! values in [0, 1]. Any decodable raster input (RGB, grayscale, RGBA,
//! palette) is accepted; alpha and palette information is dropped during the
//! RGB conversion. Resizing is a direct stretch with bilinear resampling —
//! aspect ratio is not preserved.

use crate::error::InferError;
use image::imageops::FilterType;

pub const INPUT_WIDTH: u32 = 224;
pub const INPUT_HEIGHT: u32 = 224;
pub const INPUT_CHANNELS: usize = 3;

/// Model input tensor: shape `(1, 224, 224, 3)`, values in [0, 1].
///
/// The data is stored flat in NHWC order. Construction goes through
/// [`preprocess`], which guarantees the shape and value range.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    data: Vec<f32>,
}

impl InputTensor {
    /// Tensor shape as `[batch, height, width, channels]`.
    pub fn shape(&self) -> [usize; 4] {
        [
            1,
            INPUT_HEIGHT as usize,
            INPUT_WIDTH as usize,
            INPUT_CHANNELS,
        ]
    }

    /// Flat NHWC data.
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// Decode raw image bytes into the tensor the classifier expects.
///
/// Deterministic and side-effect free: the same bytes always produce the
/// same tensor. Fails with [`InferError::Decode`] when the bytes are not a
/// parseable image.
pub fn preprocess(bytes: &[u8]) -> Result<InputTensor, InferError> {
    let img = image::load_from_memory(bytes).map_err(|e| InferError::Decode(e.to_string()))?;

    // Force 3-channel RGB before resampling so alpha/palette data never
    // enters the interpolation. Triangle = bilinear, pinned explicitly so
    // preprocessing stays stable across image crate upgrades.
    let rgb = image::imageops::resize(
        &img.to_rgb8(),
        INPUT_WIDTH,
        INPUT_HEIGHT,
        FilterType::Triangle,
    );

    let data = rgb
        .pixels()
        .flat_map(|p| p.0.iter().map(|&c| c as f32 / 255.0))
        .collect();

    Ok(InputTensor { data })
}
