//! The long-lived converter tying the color stages together.
//!
//! Holds the only state of the color pipeline: the gamma lookup table and
//! the stretch debug log.

use tracing::{debug, info};

use crate::image_pipeline::color::{
    black_level::{self, BlackLevel},
    buffer::{FloatBuffer, PixelBuffer, PlanarBuffer, Sample},
    debug_log::DebugLog,
    gamma::GammaCurve,
    matrix::{AnalogBalance, ColorMatrix},
    stretch, transform,
};
use crate::image_pipeline::common::error::Result;

/// Converts camera-native ProRaw samples to display-ready sRGB.
///
/// One converter is meant to live for a whole session: it owns the gamma
/// lookup table, which fills up as new input levels are encountered and is
/// reused by every later call. Methods touching the table take `&mut self`;
/// concurrent batches should give each worker thread its own instance.
#[derive(Debug, Clone, Default)]
pub struct RawConverter {
    gamma_curve: GammaCurve,
    debug_log: DebugLog,
}

impl RawConverter {
    /// Converter normalizing the gamma curve to 65535.
    pub fn new() -> Self {
        Self::default()
    }

    /// Converter normalizing the gamma curve to `max_value`.
    pub fn with_max_value(max_value: u16) -> Result<Self> {
        Ok(Self {
            gamma_curve: GammaCurve::new(max_value)?,
            debug_log: DebugLog::new(),
        })
    }

    pub fn max_value(&self) -> u16 {
        self.gamma_curve.max_value()
    }

    /// Changes the gamma normalization constant. The cached curve is dropped
    /// when the value differs, since its entries encode the old policy.
    /// A zero value is rejected and leaves the curve untouched.
    pub fn set_max_value(&mut self, max_value: u16) -> Result<()> {
        let old = self.gamma_curve.max_value();
        self.gamma_curve.set_max_value(max_value)?;
        if old != max_value {
            info!(old, new = max_value, "Gamma policy changed, cached curve cleared");
        }
        Ok(())
    }

    pub fn gamma_curve(&self) -> &GammaCurve {
        &self.gamma_curve
    }

    /// Subtracts the sensor black level. See [`BlackLevel`] for precedence.
    pub fn subtract_black(&self, buffer: PixelBuffer, black: &BlackLevel) -> PixelBuffer {
        black_level::subtract_black(buffer, black)
    }

    /// Scales `bits_per_sample`-bit sensor samples up to 16 bits.
    pub fn normalize_bit_depth(&self, buffer: PixelBuffer, bits_per_sample: u32) -> PixelBuffer {
        black_level::normalize_bit_depth(buffer, bits_per_sample)
    }

    pub fn camera_to_xyz<T: Sample>(
        &self,
        buffer: &PlanarBuffer<T>,
        color_matrix: &ColorMatrix,
        analog_balance: &AnalogBalance,
    ) -> Result<FloatBuffer> {
        transform::camera_to_xyz(buffer, color_matrix, analog_balance)
    }

    pub fn camera_to_srgb<T: Sample>(
        &self,
        buffer: &PlanarBuffer<T>,
        color_matrix: &ColorMatrix,
    ) -> FloatBuffer {
        transform::camera_to_srgb(buffer, color_matrix)
    }

    pub fn xyz_to_srgb<T: Sample>(&self, buffer: &PlanarBuffer<T>) -> FloatBuffer {
        transform::xyz_to_srgb(buffer)
    }

    /// Histogram stretch. With `debug` set the intermediate values are
    /// appended to [`RawConverter::debug_log`].
    pub fn adjust_brightness<T: Sample>(
        &mut self,
        buffer: &PlanarBuffer<T>,
        stretch_rate: f32,
        debug: bool,
    ) -> Result<FloatBuffer> {
        let log = debug.then_some(&mut self.debug_log);
        stretch::adjust_brightness(buffer, stretch_rate, log)
    }

    /// Applies the sRGB transfer curve through the cached lookup table.
    pub fn gamma_correction<T: Sample>(&mut self, buffer: &PlanarBuffer<T>) -> PixelBuffer {
        self.gamma_curve.apply(buffer)
    }

    pub fn debug_log(&self) -> &DebugLog {
        &self.debug_log
    }

    /// Returns the collected traces and starts a fresh log.
    pub fn take_debug_log(&mut self) -> DebugLog {
        let log = std::mem::take(&mut self.debug_log);
        debug!(entries = log.entries().len(), "Debug log drained");
        log
    }
}
