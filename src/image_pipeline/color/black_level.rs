//! Black level subtraction and bit-depth normalization of sensor samples.

use tracing::debug;

use crate::image_pipeline::color::buffer::{CHANNELS, PixelBuffer};
use crate::image_pipeline::common::error::{ConversionError, Result};

/// Sensor zero-light offset.
///
/// A non-zero `scalar` wins: it is subtracted from every channel and
/// `per_channel` is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlackLevel {
    pub scalar: u16,
    pub per_channel: [u16; 4],
}

impl BlackLevel {
    pub fn uniform(level: u16) -> Self {
        Self {
            scalar: level,
            per_channel: [0; 4],
        }
    }

    /// Accepts up to 4 per-channel levels; missing ones are 0.
    pub fn per_channel(levels: &[u16]) -> Result<Self> {
        if levels.len() > 4 {
            return Err(ConversionError::ShapeMismatch {
                expected: "at most 4 black levels".to_string(),
                actual: format!("{} values", levels.len()),
            });
        }
        let mut per_channel = [0; 4];
        per_channel[..levels.len()].copy_from_slice(levels);
        Ok(Self {
            scalar: 0,
            per_channel,
        })
    }

    /// The offset actually subtracted from channel `ch`.
    pub fn effective(&self, ch: usize) -> u16 {
        if self.scalar != 0 {
            self.scalar
        } else {
            self.per_channel[ch]
        }
    }
}

/// Subtracts `black` from `buffer`, saturating at 0.
pub fn subtract_black(mut buffer: PixelBuffer, black: &BlackLevel) -> PixelBuffer {
    for ch in 0..CHANNELS {
        let level = black.effective(ch);
        if level == 0 {
            continue;
        }
        debug!(channel = ch, level, "Subtracting black level");
        buffer
            .channel_mut(ch)
            .iter_mut()
            .for_each(|v| *v = v.saturating_sub(level));
    }
    buffer
}

/// Shifts samples of a `bits_per_sample`-bit sensor up into the full 16-bit
/// domain, clamping at `u16::MAX`.
pub fn normalize_bit_depth(mut buffer: PixelBuffer, bits_per_sample: u32) -> PixelBuffer {
    if bits_per_sample == 0 || bits_per_sample >= 16 {
        return buffer;
    }
    let shift = 16 - bits_per_sample;
    debug!(bits_per_sample, shift, "Normalizing bit depth");
    buffer.as_mut_slice().iter_mut().for_each(|v| {
        *v = ((*v as u32) << shift).min(u16::MAX as u32) as u16;
    });
    buffer
}
