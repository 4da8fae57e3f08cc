//! Conversion configuration types

use crate::image_pipeline::color::ChannelReduction;
use crate::image_pipeline::tiff::TiffCompression;

/// How camera-native samples reach sRGB'.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorPath {
    /// Invert the XYZ to camera calibration matrix, then XYZ to sRGB'.
    #[default]
    ViaXyz,
    /// Apply the decoder-supplied camera to sRGB' matrix directly.
    CameraToSrgb,
}

/// Configuration for RAW to sRGB conversion
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Compression method to use
    pub compression: TiffCompression,
    /// Predictor value for compression (typically 2 for horizontal differencing)
    pub predictor: Option<u16>,
    /// Whether to validate image dimensions before conversion
    pub validate_dimensions: bool,
    /// Color transform used before tone mapping
    pub color_path: ColorPath,
    /// Share of pixels clipped by the histogram stretch, in [0, 1].
    /// 0 disables the stretch.
    pub stretch_rate: f32,
    /// Whether to apply the sRGB gamma curve
    pub apply_gamma: bool,
    /// Normalization constant of the gamma curve
    pub max_value: u16,
    /// Whether to shift sensor samples up to the full 16-bit range
    pub normalize_bit_depth: bool,
    /// How 4-component sensor samples are reduced to RGB
    pub channel_reduction: ChannelReduction,
    /// Collect stretch traces in the converter debug log
    pub debug: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            compression: TiffCompression::None,
            predictor: None,
            validate_dimensions: true,
            color_path: ColorPath::ViaXyz,
            stretch_rate: 0.0,
            apply_gamma: true,
            max_value: u16::MAX,
            normalize_bit_depth: true,
            channel_reduction: ChannelReduction::DropFourth,
            debug: false,
        }
    }
}

impl ConversionConfig {
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder::default()
    }
}

/// Builder for ConversionConfig
#[derive(Default)]
pub struct ConversionConfigBuilder {
    compression: Option<TiffCompression>,
    predictor: Option<Option<u16>>,
    validate_dimensions: Option<bool>,
    color_path: Option<ColorPath>,
    stretch_rate: Option<f32>,
    apply_gamma: Option<bool>,
    max_value: Option<u16>,
    normalize_bit_depth: Option<bool>,
    channel_reduction: Option<ChannelReduction>,
    debug: Option<bool>,
}

impl ConversionConfigBuilder {
    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn predictor(mut self, predictor: Option<u16>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn color_path(mut self, path: ColorPath) -> Self {
        self.color_path = Some(path);
        self
    }

    pub fn stretch_rate(mut self, rate: f32) -> Self {
        self.stretch_rate = Some(rate);
        self
    }

    pub fn apply_gamma(mut self, enable: bool) -> Self {
        self.apply_gamma = Some(enable);
        self
    }

    pub fn max_value(mut self, max_value: u16) -> Self {
        self.max_value = Some(max_value);
        self
    }

    pub fn normalize_bit_depth(mut self, enable: bool) -> Self {
        self.normalize_bit_depth = Some(enable);
        self
    }

    pub fn channel_reduction(mut self, reduction: ChannelReduction) -> Self {
        self.channel_reduction = Some(reduction);
        self
    }

    pub fn debug(mut self, enable: bool) -> Self {
        self.debug = Some(enable);
        self
    }

    pub fn build(self) -> ConversionConfig {
        let default = ConversionConfig::default();
        ConversionConfig {
            compression: self.compression.unwrap_or(default.compression),
            predictor: self.predictor.unwrap_or(default.predictor),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
            color_path: self.color_path.unwrap_or(default.color_path),
            stretch_rate: self.stretch_rate.unwrap_or(default.stretch_rate),
            apply_gamma: self.apply_gamma.unwrap_or(default.apply_gamma),
            max_value: self.max_value.unwrap_or(default.max_value),
            normalize_bit_depth: self.normalize_bit_depth.unwrap_or(default.normalize_bit_depth),
            channel_reduction: self.channel_reduction.unwrap_or(default.channel_reduction),
            debug: self.debug.unwrap_or(default.debug),
        }
    }
}
