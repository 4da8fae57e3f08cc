use tracing::{debug, info, instrument, trace};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::image_pipeline::{
    color::{DebugLog, PixelBuffer, RawConverter, Sample, stretch::validate_stretch_rate},
    common::{
        config::{ColorPath, ConversionConfig},
        error::{ConversionError, Result},
    },
    conversions::timing::{PipelineTimings, Timer},
    raw::{RawImageData, RawImageReader, RawLoaderReader},
    tiff::{RgbImageData, StandardTiffWriter, TiffWriter},
};

/// Decodes a RAW file, develops it to sRGB and writes a 16-bit RGB TIFF.
///
/// The pipeline owns one [`RawConverter`], so the gamma lookup table built up
/// while converting one file is reused for the next.
pub struct RawToSrgbPipeline<R: RawImageReader, W: TiffWriter> {
    reader: R,
    writer: W,
    config: ConversionConfig,
    converter: RawConverter,
    last_debug_log: DebugLog,
}

impl RawToSrgbPipeline<RawLoaderReader, StandardTiffWriter> {
    pub fn new(config: ConversionConfig) -> Result<Self> {
        Self::with_custom(RawLoaderReader, StandardTiffWriter, config)
    }
}

impl<R: RawImageReader, W: TiffWriter> RawToSrgbPipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, config: ConversionConfig) -> Result<Self> {
        validate_stretch_rate(config.stretch_rate)?;
        let converter = RawConverter::with_max_value(config.max_value)?;
        Ok(Self {
            reader,
            writer,
            config,
            converter,
            last_debug_log: DebugLog::new(),
        })
    }

    fn validate_dimensions(&self, raw_image: &RawImageData) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        let (width, height) = (raw_image.width, raw_image.height);
        if width == 0 || height == 0 {
            return Err(ConversionError::InvalidDimensions(width, height));
        }

        let expected = width * height * raw_image.cpp;
        if raw_image.data.len() != expected {
            return Err(ConversionError::ShapeMismatch {
                expected: format!("{}x{}x{} samples", width, height, raw_image.cpp),
                actual: format!("{} samples", raw_image.data.len()),
            });
        }

        Ok(())
    }

    /// Runs the color and tone stages on decoded data.
    ///
    /// Order: black level, bit-depth normalization, color transform,
    /// histogram stretch, gamma.
    pub fn develop(&mut self, raw_image: &RawImageData) -> Result<RgbImageData> {
        let mut timings = PipelineTimings::new();
        self.develop_with_timings(raw_image, &mut timings)
    }

    fn develop_with_timings(
        &mut self,
        raw_image: &RawImageData,
        timings: &mut PipelineTimings,
    ) -> Result<RgbImageData> {
        let metadata = &raw_image.metadata;

        let timer = Timer::start("to_planar");
        let buffer = PixelBuffer::from_interleaved(
            &raw_image.data,
            raw_image.cpp,
            self.config.channel_reduction,
        )?;
        timings.record(timer);

        let timer = Timer::start("subtract_black");
        let buffer = {
            let _span = tracing::info_span!("subtract_black").entered();
            self.converter.subtract_black(buffer, &metadata.black_level)
        };
        timings.record(timer);

        let buffer = if self.config.normalize_bit_depth {
            let timer = Timer::start("normalize_bit_depth");
            let _span = tracing::info_span!("normalize_bit_depth",
                bits_per_sample = raw_image.bits_per_sample
            ).entered();
            let buffer = self.converter.normalize_bit_depth(buffer, raw_image.bits_per_sample);
            timings.record(timer);
            buffer
        } else {
            buffer
        };
        trace!(pixel = ?buffer.center_pixel(), "Center pixel before color transform");

        let timer = Timer::start("color_transform");
        let linear = {
            let _span = tracing::info_span!("color_transform", path = ?self.config.color_path).entered();
            match self.config.color_path {
                ColorPath::ViaXyz => {
                    let xyz = self.converter.camera_to_xyz(
                        &buffer,
                        &metadata.xyz_to_cam,
                        &metadata.analog_balance,
                    )?;
                    self.converter.xyz_to_srgb(&xyz)
                }
                ColorPath::CameraToSrgb => {
                    let matrix = metadata
                        .cam_to_srgb
                        .as_ref()
                        .ok_or(ConversionError::MissingColorMatrix)?;
                    self.converter.camera_to_srgb(&buffer, matrix)
                }
            }
        };
        timings.record(timer);
        trace!(pixel = ?linear.center_pixel(), "Center pixel after color transform");

        let timer = Timer::start("adjust_brightness");
        let stretched = {
            let _span = tracing::info_span!("adjust_brightness",
                stretch_rate = self.config.stretch_rate
            ).entered();
            self.converter
                .adjust_brightness(&linear, self.config.stretch_rate, self.config.debug)?
        };
        timings.record(timer);
        self.last_debug_log = self.converter.take_debug_log();
        if !self.last_debug_log.is_empty() {
            debug!("Stretch trace:\n{}", self.last_debug_log);
        }

        let output = if self.config.apply_gamma {
            let timer = Timer::start("gamma_correction");
            let _span = tracing::info_span!("gamma_correction").entered();
            let output = self.converter.gamma_correction(&stretched);
            timings.record(timer);
            output
        } else {
            stretched.map(|v| v.to_level())
        };
        trace!(pixel = ?output.center_pixel(), "Center pixel after tone mapping");

        let timer = Timer::start("interleave");
        let data = output.to_interleaved();
        timings.record(timer);

        Ok(RgbImageData {
            width: raw_image.width,
            height: raw_image.height,
            data,
        })
    }

    #[instrument(skip(self, input_data, output), fields(input_size = input_data.len()))]
    pub fn convert(&mut self, input_data: &[u8], output: &mut dyn Write) -> Result<()> {
        self.convert_with_timings(input_data, output).map(|_| ())
    }

    pub fn convert_with_timings(
        &mut self,
        input_data: &[u8],
        output: &mut dyn Write,
    ) -> Result<PipelineTimings> {
        self.run(input_data, output, None)
    }

    /// Sensor samples as decoded, reduced to RGB and interleaved, with no
    /// color or tone processing.
    pub fn undeveloped(&self, raw_image: &RawImageData) -> Result<RgbImageData> {
        let buffer = PixelBuffer::from_interleaved(
            &raw_image.data,
            raw_image.cpp,
            self.config.channel_reduction,
        )?;
        Ok(RgbImageData {
            width: raw_image.width,
            height: raw_image.height,
            data: buffer.to_interleaved(),
        })
    }

    fn run(
        &mut self,
        input_data: &[u8],
        output: &mut dyn Write,
        raw_output: Option<&mut dyn Write>,
    ) -> Result<PipelineTimings> {
        let mut timings = PipelineTimings::new();
        info!("Starting RAW to sRGB conversion");

        let timer = Timer::start("decode_raw");
        let raw_image = {
            let _span = tracing::info_span!("decode_raw").entered();
            self.reader.read_raw(input_data)?
        };
        timings.record(timer);

        {
            let _span = tracing::info_span!("validate_dimensions",
                width = raw_image.width,
                height = raw_image.height
            ).entered();
            self.validate_dimensions(&raw_image)?;
        }

        if let Some(raw_output) = raw_output {
            let timer = Timer::start("write_undeveloped");
            let _span = tracing::info_span!("write_undeveloped").entered();
            let undeveloped = self.undeveloped(&raw_image)?;
            self.writer.write_tiff(&undeveloped, raw_output, &self.config)?;
            timings.record(timer);
        }

        let rgb_image = self.develop_with_timings(&raw_image, &mut timings)?;

        let timer = Timer::start("encode_tiff");
        {
            let _span = tracing::info_span!("encode_tiff").entered();
            self.writer.write_tiff(&rgb_image, output, &self.config)?;
        }
        timings.record(timer);

        info!(
            width = raw_image.width,
            height = raw_image.height,
            ms = timings.total_duration().as_secs_f64() * 1000.0,
            "Conversion complete"
        );
        Ok(timings)
    }

    #[instrument(skip(self, input_path, output_path))]
    pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        input_path: P,
        output_path: Q,
    ) -> Result<PipelineTimings> {
        self.convert_file_inner(input_path.as_ref(), output_path.as_ref(), None)
    }

    /// Like [`Self::convert_file`], also writing the undeveloped samples to
    /// `raw_output_path`.
    #[instrument(skip(self, input_path, output_path, raw_output_path))]
    pub fn convert_file_saving_raw<P: AsRef<Path>, Q: AsRef<Path>, S: AsRef<Path>>(
        &mut self,
        input_path: P,
        output_path: Q,
        raw_output_path: S,
    ) -> Result<PipelineTimings> {
        self.convert_file_inner(
            input_path.as_ref(),
            output_path.as_ref(),
            Some(raw_output_path.as_ref()),
        )
    }

    fn convert_file_inner(
        &mut self,
        input_path: &Path,
        output_path: &Path,
        raw_output_path: Option<&Path>,
    ) -> Result<PipelineTimings> {
        let mut timings = PipelineTimings::new();

        info!(
            input = %input_path.display(),
            output = %output_path.display(),
            "Converting file"
        );

        let timer = Timer::start("read_input_file");
        let input_data = {
            let _span = tracing::info_span!("read_input_file").entered();
            std::fs::read(input_path).map_err(|e| {
                ConversionError::InputReadError(format!("{}: {}", input_path.display(), e))
            })?
        };
        timings.record(timer);

        let timer = Timer::start("create_output_file");
        let (mut output_file, mut raw_file) = {
            let _span = tracing::info_span!("create_output_file").entered();
            let output_file = create_output(output_path)?;
            let raw_file = raw_output_path.map(create_output).transpose()?;
            (output_file, raw_file)
        };
        timings.record(timer);

        let conversion_timings = self.run(
            &input_data,
            &mut output_file,
            raw_file.as_mut().map(|f| f as &mut dyn Write),
        )?;
        timings.extend(&conversion_timings);

        Ok(timings)
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Replaces the configuration. A different `max_value` discards the
    /// converter's cached gamma curve.
    pub fn set_config(&mut self, config: ConversionConfig) -> Result<()> {
        validate_stretch_rate(config.stretch_rate)?;
        self.converter.set_max_value(config.max_value)?;
        self.config = config;
        Ok(())
    }

    pub fn converter(&self) -> &RawConverter {
        &self.converter
    }

    /// Stretch trace of the last conversion, filled when `debug` is set.
    pub fn debug_log(&self) -> &DebugLog {
        &self.last_debug_log
    }
}

fn create_output(path: &Path) -> Result<File> {
    File::create(path).map_err(|e| {
        ConversionError::OutputWriteError(format!("{}: {}", path.display(), e))
    })
}
