//! sRGB transfer curve, memoized per 16-bit input level.

use tracing::debug;

use crate::image_pipeline::color::buffer::{MAX_LEVEL, PixelBuffer, PlanarBuffer, Sample};
use crate::image_pipeline::common::error::{ConversionError, Result};

pub const GAMMA: f32 = 2.4;
pub const LINEAR_COEFF: f32 = 12.92;
pub const LINEAR_THRESH_COEFF: f32 = 0.0031308;
pub const BLACK_OFFSET: f32 = 0.055;

const LEVELS: usize = 1 << 16;
const NOT_COMPUTED: i32 = -1;

/// Lookup table from input level to gamma-encoded output.
///
/// Slots start at -1 and are filled the first time their level is seen.
/// The table encodes one `max_value`; changing it clears every slot.
#[derive(Debug, Clone)]
pub struct GammaCurve {
    table: Vec<i32>,
    max_value: u16,
    threshold: u16,
}

impl GammaCurve {
    pub fn new(max_value: u16) -> Result<Self> {
        if max_value == 0 {
            return Err(ConversionError::InvalidMaxValue(max_value));
        }
        Ok(Self::with_max(max_value))
    }

    fn with_max(max_value: u16) -> Self {
        Self {
            table: vec![NOT_COMPUTED; LEVELS],
            max_value,
            threshold: Self::linear_threshold(max_value),
        }
    }

    fn linear_threshold(max_value: u16) -> u16 {
        (LINEAR_THRESH_COEFF * max_value as f32)
            .clamp(0.0, MAX_LEVEL)
            .floor() as u16
    }

    pub fn max_value(&self) -> u16 {
        self.max_value
    }

    /// Inputs below this level use the linear segment.
    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    /// Cached output for `level`, if it has been computed.
    pub fn cached(&self, level: u16) -> Option<u16> {
        let v = self.table[level as usize];
        (v >= 0).then_some(v as u16)
    }

    pub fn cached_levels(&self) -> usize {
        self.table.iter().filter(|&&v| v >= 0).count()
    }

    /// Forgets every computed level.
    pub fn invalidate(&mut self) {
        self.table.fill(NOT_COMPUTED);
    }

    /// Switches the curve to a new normalization constant. Every cached
    /// level is dropped when the value changes; the table is kept otherwise.
    pub fn set_max_value(&mut self, max_value: u16) -> Result<()> {
        if max_value == 0 {
            return Err(ConversionError::InvalidMaxValue(max_value));
        }
        if max_value != self.max_value {
            self.max_value = max_value;
            self.threshold = Self::linear_threshold(max_value);
            self.invalidate();
        }
        Ok(())
    }

    /// Encoded value of `level`, computing and caching it on first use.
    pub fn encode(&mut self, level: u16) -> u16 {
        let slot = &mut self.table[level as usize];
        if *slot >= 0 {
            return *slot as u16;
        }
        let value = Self::evaluate(level, self.max_value, self.threshold);
        *slot = value as i32;
        value
    }

    fn evaluate(level: u16, max_value: u16, threshold: u16) -> u16 {
        let v = level as f32;
        let encoded = if level < threshold {
            v * LINEAR_COEFF
        } else {
            let max = max_value as f32;
            // power segment in double precision, rounded back before scaling
            let normalized = ((v / max) as f64).powf(1.0 / GAMMA as f64) * 1.055
                - BLACK_OFFSET as f64;
            normalized as f32 * max
        };
        encoded.clamp(0.0, MAX_LEVEL) as u16
    }

    /// Gamma-encodes every sample of `buffer`.
    pub fn apply<T: Sample>(&mut self, buffer: &PlanarBuffer<T>) -> PixelBuffer {
        let before = self.cached_levels();
        let mut out = PixelBuffer::zeros(buffer.pixel_count());
        for (dst, &src) in out.as_mut_slice().iter_mut().zip(buffer.as_slice()) {
            *dst = self.encode(src.to_level());
        }
        debug!(
            max_value = self.max_value,
            threshold = self.threshold,
            new_levels = self.cached_levels() - before,
            "Gamma correction applied"
        );
        out
    }
}

impl Default for GammaCurve {
    fn default() -> Self {
        Self::with_max(u16::MAX)
    }
}
