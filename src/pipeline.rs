use crate::bounds::{Bounds, SourceImage};
use crate::config::SearchConfig;
use crate::constants::{INFO_PREFIX, SUMMARY_PREFIX};
use crate::error::{BreakpointError, Result};
use crate::formats::OutputFormat;
use crate::logger::Logger;
use crate::magick::MagickOracle;
use crate::oracle::{EncodeOptions, ImageOracle, ResizeOracle};
use crate::search::{Breakpoint, BreakpointSearch, Outcome};
use crate::types::Dimensions;
use crate::utils::format_file_size;
use crate::writer::BreakpointWriter;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Which resize oracle renders the probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// In-process resize and encode with the `image` crate.
    #[default]
    Image,
    /// ImageMagick's `convert` in a subprocess.
    Magick,
}

impl FromStr for Backend {
    type Err = BreakpointError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "image" => Ok(Backend::Image),
            "magick" | "imagemagick" | "convert" => Ok(Backend::Magick),
            _ => Err(BreakpointError::UnsupportedFormat(format!(
                "unknown backend {:?}, expected image or magick",
                s
            ))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Image => f.write_str("image"),
            Backend::Magick => f.write_str("magick"),
        }
    }
}

/// Everything a `generate` run needs.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub source: PathBuf,
    pub lower: Dimensions,
    pub upper: Option<Dimensions>,
    pub output_dir: PathBuf,
    pub search: SearchConfig,
    pub quality: Option<u8>,
    pub backend: Backend,
    pub timeout: Option<Duration>,
}

/// One breakpoint as written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenBreakpoint {
    pub path: PathBuf,
    pub dimensions: Dimensions,
    pub file_size: u64,
    pub target_size: u64,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub breakpoints: Vec<WrittenBreakpoint>,
}

impl RunSummary {
    fn record(&mut self, breakpoint: &Breakpoint, path: PathBuf) {
        self.breakpoints.push(WrittenBreakpoint {
            path,
            dimensions: breakpoint.dimensions(),
            file_size: breakpoint.file_size(),
            target_size: breakpoint.target_size(),
            outcome: breakpoint.outcome(),
        });
    }

    pub fn punted(&self) -> usize {
        self.breakpoints
            .iter()
            .filter(|bp| matches!(bp.outcome, Outcome::Punted(_)))
            .count()
    }

    /// One-line report printed after a run.
    pub fn report(&self, output_dir: &Path) -> String {
        format!(
            "{} {} breakpoints written to {:?} ({} punted)",
            SUMMARY_PREFIX,
            self.breakpoints.len(),
            output_dir,
            self.punted()
        )
    }
}

/// Builds the resize oracle for `source` and validates the encoder settings.
///
/// # Arguments
/// * `source` - Inspected source image; its extension picks the output format
/// * `backend` - In-process encoder or ImageMagick subprocess
/// * `quality` - Encoder quality, 1-100 (default 80)
/// * `timeout` - Per-probe limit, `None` to wait indefinitely
///
/// # Returns
/// * A boxed oracle, or `InvalidQuality` / `UnsupportedFormat`
pub fn build_oracle(
    source: &SourceImage,
    backend: Backend,
    quality: Option<u8>,
    timeout: Option<Duration>,
) -> Result<Box<dyn ResizeOracle>> {
    let format = OutputFormat::from_path(&source.path)?;
    let encode = EncodeOptions::new(format, quality)?;

    let oracle: Box<dyn ResizeOracle> = match backend {
        Backend::Image => {
            Box::new(ImageOracle::new(source.decode()?, encode).with_timeout(timeout))
        }
        Backend::Magick => Box::new(
            MagickOracle::new(&source.path, &source_extension(&source.path, format))
                .with_quality(quality)
                .with_timeout(timeout),
        ),
    };
    Ok(oracle)
}

/// Keeps the source's own spelling of the extension (`jpeg` stays `jpeg`).
fn source_extension(path: &Path, format: OutputFormat) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| format.extension().to_string())
}

/// Resolves bounds, runs the search and writes every breakpoint.
///
/// Breakpoints are written as they are produced, so a failure part-way keeps
/// everything accepted before it on disk.
///
/// # Arguments
/// * `options` - Source, bounds, search tuning and encoder settings
/// * `logger` - Receives warnings, created files and search events
///
/// # Returns
/// * One `WrittenBreakpoint` per breakpoint, in target-size order
pub fn generate_breakpoints(options: &GenerateOptions, logger: &Logger) -> Result<RunSummary> {
    let source = SourceImage::inspect(&options.source)?;
    logger.info(format!(
        "{} Source: {} ({}, {})",
        INFO_PREFIX,
        source.path.display(),
        source.dimensions,
        format_file_size(source.file_size)
    ));

    let (bounds, adjustments) = Bounds::resolve(source.dimensions, options.lower, options.upper);
    for adjustment in adjustments {
        logger.warn(adjustment);
    }

    let format = OutputFormat::from_path(&source.path)?;
    let mut oracle = build_oracle(&source, options.backend, options.quality, options.timeout)?;
    let writer = BreakpointWriter::new(
        &options.output_dir,
        &source.stem(),
        &source_extension(&source.path, format),
    )?;

    let (lower, upper) = bounds.sample(&mut oracle)?;
    logger.verbose(format!(
        "seed samples: {} = {} bytes, {} = {} bytes",
        lower.dimensions(),
        lower.file_size(),
        upper.dimensions(),
        upper.file_size()
    ));

    let search =
        BreakpointSearch::new(oracle, lower, &upper, options.search)?.with_observer(logger);

    let mut summary = RunSummary::default();
    for breakpoint in search {
        let breakpoint = breakpoint?;
        let path = writer.write(&breakpoint)?;
        logger.created(path.display(), breakpoint.file_size());
        summary.record(&breakpoint, path);
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("image".parse::<Backend>().unwrap(), Backend::Image);
        assert_eq!("Magick".parse::<Backend>().unwrap(), Backend::Magick);
        assert_eq!("convert".parse::<Backend>().unwrap(), Backend::Magick);
        assert!("vips".parse::<Backend>().is_err());
    }

    #[test]
    fn test_source_extension_keeps_spelling() {
        assert_eq!(
            source_extension(Path::new("a/photo.jpeg"), OutputFormat::Jpeg),
            "jpeg"
        );
        assert_eq!(source_extension(Path::new("photo"), OutputFormat::Png), "png");
    }

    #[test]
    fn test_generate_breakpoints_writes_every_breakpoint() {
        use crate::logger::Verbosity;
        use image::{DynamicImage, Rgb, RgbImage};
        use tempfile::TempDir;

        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("hero.jpg");
        let img = RgbImage::from_fn(96, 64, |x, y| {
            Rgb([(x * 31 % 256) as u8, (y * 17 % 256) as u8, ((x * y) % 256) as u8])
        });
        DynamicImage::ImageRgb8(img).save(&source).unwrap();

        let options = GenerateOptions {
            source,
            lower: Dimensions::new(12, 8),
            upper: None,
            output_dir: temp_dir.path().join("out"),
            search: SearchConfig::new(1500).unwrap(),
            quality: Some(85),
            backend: Backend::Image,
            timeout: None,
        };
        let logger = Logger::new(Verbosity::Quiet);

        let summary = generate_breakpoints(&options, &logger).unwrap();

        let first = &summary.breakpoints[0];
        assert_eq!(first.outcome, Outcome::Seed);
        assert_eq!(first.dimensions, Dimensions::new(12, 8));
        assert_eq!(
            summary.breakpoints.last().unwrap().dimensions,
            Dimensions::new(96, 64)
        );
        for written in &summary.breakpoints {
            assert!(written.path.exists());
            assert_eq!(
                std::fs::metadata(&written.path).unwrap().len(),
                written.file_size
            );
        }
        assert!(summary.punted() < summary.breakpoints.len());
        assert!(summary
            .report(&options.output_dir)
            .starts_with(&format!("🎯 {} breakpoints", summary.breakpoints.len())));
    }
}
