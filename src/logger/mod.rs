//! Logging built on `tracing-subscriber`
//!
//! Console output with optional colors, file output in full, compact or
//! JSON format, size or daily rotation with gzip compression of rotated
//! files.

pub mod compression;
pub mod config;
pub mod error;
pub mod rotation;
pub(crate) mod writer;

pub use config::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig, RotationConfig, RotationStrategy};
pub use error::LoggerError;

use std::io::IsTerminal;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};
use writer::RotatingFileWriter;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_logger(config: LoggerConfig) -> Result<(), LoggerError> {
    config.validate()?;

    let filter = build_filter(&config.level);
    let mut layers: Vec<BoxedLayer> = Vec::new();

    // The file layer goes first so console ANSI settings do not leak into
    // formatted span fields written to the file.
    if config.file.enabled {
        layers.push(file_layer(&config.file)?);
    }
    if config.console.enabled {
        layers.push(console_layer(&config.console));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| LoggerError::subscriber(e.to_string()))
}

/// `RUST_LOG` wins over the configured level when set.
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn console_layer(config: &ConsoleConfig) -> BoxedLayer {
    let use_ansi = config.colored && std::io::stdout().is_terminal();
    fmt::layer()
        .with_ansi(use_ansi)
        .with_target(true)
        .with_level(true)
        .boxed()
}

fn file_layer(config: &FileConfig) -> Result<BoxedLayer, LoggerError> {
    let writer = RotatingFileWriter::new(config)?;
    let base = fmt::layer().with_ansi(false).with_target(true).with_writer(writer);

    Ok(match config.format {
        LogFormat::Full => base.boxed(),
        LogFormat::Compact => base.compact().boxed(),
        LogFormat::Json => base.json().boxed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_build_filter_falls_back_to_info() {
        let filter = build_filter("not a [valid filter");
        assert!(filter.to_string().contains("info") || !filter.to_string().is_empty());
    }

    #[test]
    fn test_file_layer_for_each_format() {
        let dir = tempdir().unwrap();
        for format in [LogFormat::Full, LogFormat::Compact, LogFormat::Json] {
            let config = FileConfig {
                enabled: true,
                path: dir.path().join(format!("{}.log", format.as_str())),
                format,
                ..FileConfig::default()
            };
            assert!(file_layer(&config).is_ok());
        }
    }

    #[test]
    fn test_init_rejects_invalid_config() {
        let config = LoggerConfig {
            level: "verbose".to_string(),
            ..LoggerConfig::default()
        };
        assert!(init_logger(config).is_err());
    }
}
