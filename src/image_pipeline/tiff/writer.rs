use std::io::Write;
use crate::image_pipeline::common::config::ConversionConfig;
use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::tiff::types::RgbImageData;

pub trait TiffWriter {
    fn write_tiff(&self, image: &RgbImageData, output: &mut dyn Write, config: &ConversionConfig) -> Result<()>;
}
