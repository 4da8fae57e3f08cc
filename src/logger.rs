pub use tracing::{debug, error, info, warn, trace, instrument};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt::{self, format::FmtSpan}};

/// Installs the global subscriber.
///
/// RUST_LOG wins when set; otherwise the level is `info`, or `debug` when
/// `debug` is true. With `log_dir` the same events are also written,
/// without colors, to a new file in that directory.
pub fn init(debug: bool, log_dir: Option<&Path>) -> std::io::Result<Option<PathBuf>> {
    let default_level = if debug { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let is_debug = debug ||
                   env_filter.to_string().contains("debug") ||
                   std::env::var("RUST_LOG").unwrap_or_default().contains("debug");
    let span_events = || if is_debug { FmtSpan::CLOSE } else { FmtSpan::NONE };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_timer(fmt::time::uptime())
        .with_span_events(span_events());

    let (file_layer, log_path) = match log_dir {
        Some(dir) => {
            let (file, path) = create_log_file(dir)?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_timer(fmt::time::uptime())
                .with_span_events(span_events())
                .with_writer(Mutex::new(file));
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(file_layer)
        .init();

    Ok(log_path)
}

fn create_log_file(dir: &Path) -> std::io::Result<(File, PathBuf)> {
    fs::create_dir_all(dir)?;
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let path = dir.join(format!("proraw_{}_{}.log", stamp, std::process::id()));
    let file = File::create(&path)?;
    Ok((file, path))
}
