use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use proraw_rs::image_pipeline::{ColorPath, ConversionConfig, RawToSrgbPipeline, TiffCompression};
use proraw_rs::logger;

use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "proraw")]
#[command(author, version, about = "Develop ProRaw DNG files into 16-bit sRGB TIFFs")]
struct Cli {
    /// Input DNG file
    input: PathBuf,

    /// Output TIFF file (defaults to the input name with a .tiff extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Share of pixels clipped by the histogram stretch (0 disables it)
    #[arg(short = 'a', long, default_value = "0.0")]
    stretch_rate: f32,

    /// Debug logging and stretch traces
    #[arg(short, long)]
    debug: bool,

    /// Log per-stage timings
    #[arg(short, long)]
    measure: bool,

    /// Also save the undeveloped sensor samples next to the input (<input>.raw.tiff)
    #[arg(short, long)]
    raw: bool,

    /// Use the decoder's camera to sRGB matrix instead of inverting the XYZ calibration
    #[arg(long)]
    direct: bool,

    /// Write linear samples without the sRGB transfer curve
    #[arg(long)]
    no_gamma: bool,

    /// Normalization constant of the gamma curve
    #[arg(long, default_value = "65535")]
    max_value: u16,

    /// TIFF compression
    #[arg(short, long, value_enum, default_value = "none")]
    compression: Compression,

    /// Also write logs to a file in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Compression {
    None,
    Lzw,
    DeflateFast,
    Deflate,
    DeflateBest,
}

impl From<Compression> for TiffCompression {
    fn from(c: Compression) -> Self {
        match c {
            Compression::None => TiffCompression::None,
            Compression::Lzw => TiffCompression::Lzw,
            Compression::DeflateFast => TiffCompression::DeflateFast,
            Compression::Deflate => TiffCompression::DeflateBalanced,
            Compression::DeflateBest => TiffCompression::DeflateBest,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = logger::init(cli.debug, cli.log_dir.as_deref())
        .context("failed to set up logging")?;
    if let Some(path) = log_path {
        debug!(path = %path.display(), "Writing log file");
    }

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension("tiff"));

    let config = ConversionConfig::builder()
        .compression(cli.compression.into())
        .color_path(if cli.direct { ColorPath::CameraToSrgb } else { ColorPath::ViaXyz })
        .stretch_rate(cli.stretch_rate)
        .apply_gamma(!cli.no_gamma)
        .max_value(cli.max_value)
        .debug(cli.debug)
        .build();
    let mut pipeline = RawToSrgbPipeline::new(config)?;

    info!(
        compression = ?pipeline.config().compression,
        color_path = ?pipeline.config().color_path,
        stretch_rate = pipeline.config().stretch_rate,
        gamma = pipeline.config().apply_gamma,
        "RAW to sRGB pipeline initialized"
    );

    let result = if cli.raw {
        let raw_output = cli.input.with_extension("raw.tiff");
        info!(raw_output = %raw_output.display(), "Saving undeveloped samples");
        pipeline.convert_file_saving_raw(&cli.input, &output, &raw_output)
    } else {
        pipeline.convert_file(&cli.input, &output)
    };
    let timings = result.with_context(|| format!("failed to convert {}", cli.input.display()))?;

    if cli.measure {
        timings.log_summary();
    }
    info!(output = %output.display(), "Conversion successful");

    Ok(())
}
