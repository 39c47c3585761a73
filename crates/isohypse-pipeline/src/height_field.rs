//! Height field input: the read-only scalar sampler the pipeline sweeps.
//!
//! Any image-like source can feed the pipeline by implementing
//! [`HeightField`]. Implementations are provided for 8-bit and 16-bit
//! luma images from the `image` crate and for an owned [`Grid`] of
//! `f64` samples, which is convenient for synthetic fields.

use image::{GrayImage, ImageBuffer, Luma};

use crate::types::{Dimensions, PipelineError};

/// A read-only 2D scalar field.
///
/// The pipeline only calls [`sample`](Self::sample) with
/// `x < width()` and `y < height()`.
pub trait HeightField {
    /// Width in samples.
    fn width(&self) -> u32;

    /// Height in samples.
    fn height(&self) -> u32;

    /// The scalar value at `(x, y)`.
    fn sample(&self, x: u32, y: u32) -> f64;

    /// Width and height as [`Dimensions`].
    fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }
}

impl<T: HeightField + ?Sized> HeightField for &T {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn sample(&self, x: u32, y: u32) -> f64 {
        (**self).sample(x, y)
    }
}

impl HeightField for GrayImage {
    fn width(&self) -> u32 {
        self.width()
    }

    fn height(&self) -> u32 {
        self.height()
    }

    fn sample(&self, x: u32, y: u32) -> f64 {
        f64::from(self.get_pixel(x, y).0[0])
    }
}

impl HeightField for ImageBuffer<Luma<u16>, Vec<u16>> {
    fn width(&self) -> u32 {
        self.width()
    }

    fn height(&self) -> u32 {
        self.height()
    }

    fn sample(&self, x: u32, y: u32) -> f64 {
        f64::from(self.get_pixel(x, y).0[0])
    }
}

/// An owned, row-major grid of `f64` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    width: u32,
    height: u32,
    values: Vec<f64>,
}

impl Grid {
    /// Wrap a row-major sample buffer.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::FieldSizeMismatch`] if `values.len()`
    /// is not `width * height`.
    pub fn new(width: u32, height: u32, values: Vec<f64>) -> Result<Self, PipelineError> {
        let expected = width as usize * height as usize;
        if values.len() != expected {
            return Err(PipelineError::FieldSizeMismatch {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    /// Build a grid by evaluating `f(x, y)` at every sample.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> f64) -> Self {
        let mut values = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                values.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            values,
        }
    }

    /// The row-major sample buffer.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl HeightField for Grid {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn sample(&self, x: u32, y: u32) -> f64 {
        self.values[y as usize * self.width as usize + x as usize]
    }
}

/// Decode raw image bytes into an 8-bit height map.
///
/// Supports PNG, JPEG, BMP, and WebP (whatever the `image` crate can
/// decode with the enabled features). Colour images are reduced to luma;
/// for the usual greyscale height maps this is the identity.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode_height_field(bytes: &[u8]) -> Result<GrayImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_luma8())
}
