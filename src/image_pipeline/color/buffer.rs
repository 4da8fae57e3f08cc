//! Planar pixel storage shared by every color stage.

use crate::image_pipeline::common::error::{ConversionError, Result};

/// Number of color channels carried through the pipeline (R, G, B).
pub const CHANNELS: usize = 3;

/// Largest 16-bit sample value, as a float.
pub const MAX_LEVEL: f32 = u16::MAX as f32;

/// A sample type the color stages can read.
pub trait Sample: Copy + Default {
    fn to_f32(self) -> f32;

    /// The sample clamped into the 16-bit domain and truncated.
    fn to_level(self) -> u16;
}

impl Sample for u16 {
    #[inline]
    fn to_f32(self) -> f32 {
        self as f32
    }

    #[inline]
    fn to_level(self) -> u16 {
        self
    }
}

impl Sample for f32 {
    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn to_level(self) -> u16 {
        // NaN casts to 0
        self.clamp(0.0, MAX_LEVEL) as u16
    }
}

/// How a 4-component (R, G1, B, G2) sensor sample is reduced to RGB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelReduction {
    /// Keep R, G1 and B; the fourth component is ignored.
    #[default]
    DropFourth,
    /// Green becomes the mean of G1 and G2.
    AverageGreens,
}

/// Image samples laid out as three rows (R, G, B) of `pixel_count` values.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarBuffer<T> {
    data: Vec<T>,
    pixel_count: usize,
}

/// 16-bit buffer produced by the decoder and handed to the writer.
pub type PixelBuffer = PlanarBuffer<u16>;

/// Intermediate buffer between the color stages.
pub type FloatBuffer = PlanarBuffer<f32>;

impl<T: Sample> PlanarBuffer<T> {
    /// Wraps planar data of length `3 * pixel_count`.
    pub fn new(data: Vec<T>, pixel_count: usize) -> Result<Self> {
        if data.len() != CHANNELS * pixel_count {
            return Err(ConversionError::ShapeMismatch {
                expected: format!("{} samples (3 x {})", CHANNELS * pixel_count, pixel_count),
                actual: format!("{} samples", data.len()),
            });
        }
        Ok(Self { data, pixel_count })
    }

    pub fn zeros(pixel_count: usize) -> Self {
        Self {
            data: vec![T::default(); CHANNELS * pixel_count],
            pixel_count,
        }
    }

    /// Builds a buffer from three equally long channel rows.
    pub fn from_channels(channels: [Vec<T>; CHANNELS]) -> Result<Self> {
        let pixel_count = channels[0].len();
        if let Some(row) = channels.iter().find(|row| row.len() != pixel_count) {
            return Err(ConversionError::ShapeMismatch {
                expected: format!("channel rows of {} samples", pixel_count),
                actual: format!("channel row of {} samples", row.len()),
            });
        }
        Ok(Self {
            data: channels.concat(),
            pixel_count,
        })
    }

    pub fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    pub fn is_empty(&self) -> bool {
        self.pixel_count == 0
    }

    pub fn channel(&self, ch: usize) -> &[T] {
        &self.data[ch * self.pixel_count..(ch + 1) * self.pixel_count]
    }

    pub fn channel_mut(&mut self, ch: usize) -> &mut [T] {
        &mut self.data[ch * self.pixel_count..(ch + 1) * self.pixel_count]
    }

    /// All samples, channel-major.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// The three samples of pixel `i`.
    pub fn pixel(&self, i: usize) -> [T; CHANNELS] {
        let n = self.pixel_count;
        [self.data[i], self.data[n + i], self.data[2 * n + i]]
    }

    /// The pixel at index `pixel_count / 2`, used for trace output.
    pub fn center_pixel(&self) -> Option<[T; CHANNELS]> {
        (!self.is_empty()).then(|| self.pixel(self.pixel_count / 2))
    }

    /// Applies `f` to every sample, keeping the shape.
    pub fn map<U: Sample>(&self, f: impl Fn(T) -> U) -> PlanarBuffer<U> {
        PlanarBuffer {
            data: self.data.iter().map(|&v| f(v)).collect(),
            pixel_count: self.pixel_count,
        }
    }

    /// Interleaved RGBRGB... samples, the layout image encoders expect.
    pub fn to_interleaved(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.data.len());
        for i in 0..self.pixel_count {
            out.extend_from_slice(&self.pixel(i));
        }
        out
    }
}

impl PixelBuffer {
    /// Splits interleaved decoder output into planar rows.
    ///
    /// `cpp` is the number of components per pixel and must be 3 or 4.
    pub fn from_interleaved(
        samples: &[u16],
        cpp: usize,
        reduction: ChannelReduction,
    ) -> Result<Self> {
        if cpp != 3 && cpp != 4 {
            return Err(ConversionError::ShapeMismatch {
                expected: "3 or 4 components per pixel".to_string(),
                actual: format!("{} components per pixel", cpp),
            });
        }
        if samples.len() % cpp != 0 {
            return Err(ConversionError::ShapeMismatch {
                expected: format!("a multiple of {} samples", cpp),
                actual: format!("{} samples", samples.len()),
            });
        }

        let pixel_count = samples.len() / cpp;
        let mut buffer = Self::zeros(pixel_count);
        for (i, px) in samples.chunks_exact(cpp).enumerate() {
            let green = match (cpp, reduction) {
                (4, ChannelReduction::AverageGreens) => {
                    ((px[1] as u32 + px[3] as u32) / 2) as u16
                }
                _ => px[1],
            };
            buffer.data[i] = px[0];
            buffer.data[pixel_count + i] = green;
            buffer.data[2 * pixel_count + i] = px[2];
        }
        Ok(buffer)
    }
}
