//! Histogram stretching of brightness and contrast.
//!
//! The input is clipped to [0, 65535] and a histogram of the green channel
//! with a bucket width of 8 is built. The window `[min_value, max_value]`
//! cutting off `stretch_rate / 2` of the pixels on each side is then mapped
//! onto the full 16-bit range.

use tracing::{debug, instrument};

use crate::image_pipeline::color::buffer::{FloatBuffer, MAX_LEVEL, PlanarBuffer, Sample};
use crate::image_pipeline::color::debug_log::DebugLog;
use crate::image_pipeline::common::error::{ConversionError, Result};

/// Rates below this leave the image untouched.
pub const MIN_STRETCH_RATE: f32 = 0.000001;
/// Rates at or above this collapse the window to a single value.
pub const FULL_STRETCH_RATE: f32 = 0.999999;
/// Windows narrower than this map every sample to 0.
pub const MIN_SPREAD: f32 = 0.00001;

const BIN_SHIFT: u32 = 3;
pub const HISTOGRAM_BINS: usize = 1 << (16 - BIN_SHIFT);

const GREEN: usize = 1;

/// The affine map `v * alpha + beta` chosen for an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StretchWindow {
    pub min_value: f32,
    pub max_value: f32,
    pub alpha: f32,
    pub beta: f32,
}

impl StretchWindow {
    fn from_bounds(min_value: f32, max_value: f32) -> Self {
        let alpha = if (max_value - min_value) < MIN_SPREAD {
            0.0
        } else {
            MAX_LEVEL / (max_value - min_value)
        };
        Self {
            min_value,
            max_value,
            alpha,
            beta: -min_value * alpha,
        }
    }

    #[inline]
    pub fn apply(&self, v: f32) -> f32 {
        clip(v.mul_add(self.alpha, self.beta))
    }
}

pub fn validate_stretch_rate(stretch_rate: f32) -> Result<()> {
    if (0.0..=1.0).contains(&stretch_rate) {
        Ok(())
    } else {
        Err(ConversionError::InvalidStretchRate(stretch_rate))
    }
}

#[inline]
fn clip(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, MAX_LEVEL) }
}

/// Counts of green samples per bucket of 8 levels.
pub fn green_histogram(image: &FloatBuffer) -> Vec<u64> {
    let mut histogram = vec![0u64; HISTOGRAM_BINS];
    for &v in image.channel(GREEN) {
        histogram[(v.to_level() >> BIN_SHIFT) as usize] += 1;
    }
    histogram
}

/// Picks the stretch window for an already clipped image.
pub fn stretch_window(
    image: &FloatBuffer,
    stretch_rate: f32,
    mut log: Option<&mut DebugLog>,
) -> StretchWindow {
    let (min_value, max_value) = if FULL_STRETCH_RATE <= stretch_rate {
        let min = image
            .as_slice()
            .iter()
            .copied()
            .reduce(f32::min)
            .unwrap_or(0.0);
        (min, min)
    } else {
        let acc_thresh = (image.pixel_count() as f32 * stretch_rate * 0.5) as u64;
        if let Some(log) = log.as_deref_mut() {
            log.record("acc_thresh", acc_thresh as f64);
        }
        let histogram = green_histogram(image);

        let mut bin = 0;
        let mut acc = 0;
        while acc < acc_thresh && bin < HISTOGRAM_BINS {
            acc += histogram[bin];
            bin += 1;
        }
        if let Some(log) = log.as_deref_mut() {
            log.record("min_bin", bin as f64);
        }
        let min_value = (bin << BIN_SHIFT) as f32;

        let mut bin = HISTOGRAM_BINS - 1;
        let mut acc = 0;
        while acc < acc_thresh && 0 < bin {
            acc += histogram[bin];
            bin -= 1;
        }
        if let Some(log) = log.as_deref_mut() {
            log.record("max_bin", bin as f64);
        }
        (min_value, (bin << BIN_SHIFT) as f32)
    };

    let window = StretchWindow::from_bounds(min_value, max_value);
    if let Some(log) = log {
        log.record("max_value", window.max_value);
        log.record("min_value", window.min_value);
        log.record("alpha", window.alpha);
        log.record("beta", window.beta);
    }
    window
}

/// Stretches `buffer` so the window estimated from its green channel spans
/// [0, 65535]. Returns the clipped input when `stretch_rate` is below
/// [`MIN_STRETCH_RATE`].
#[instrument(skip(buffer, log), fields(pixels = buffer.pixel_count()))]
pub fn adjust_brightness<T: Sample>(
    buffer: &PlanarBuffer<T>,
    stretch_rate: f32,
    log: Option<&mut DebugLog>,
) -> Result<FloatBuffer> {
    validate_stretch_rate(stretch_rate)?;

    let image = buffer.map(|v| clip(v.to_f32()));
    if stretch_rate < MIN_STRETCH_RATE {
        debug!("Stretch rate is zero, image left unchanged");
        return Ok(image);
    }

    let window = stretch_window(&image, stretch_rate, log);
    debug!(
        min_value = window.min_value,
        max_value = window.max_value,
        alpha = window.alpha,
        beta = window.beta,
        "Stretch window selected"
    );
    Ok(image.map(|v| window.apply(v)))
}
