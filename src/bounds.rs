use crate::constants::{MAX_FILE_SIZE, MAX_IMAGE_DIMENSION};
use crate::error::{BreakpointError, Result};
use crate::oracle::ResizeOracle;
use crate::types::{Dimensions, Sample};
use image::{DynamicImage, ImageReader};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Metrics of the image every breakpoint is derived from.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub path: PathBuf,
    pub dimensions: Dimensions,
    pub file_size: u64,
}

impl SourceImage {
    /// Reads dimensions and file size without decoding pixel data.
    ///
    /// # Errors
    /// * `FileNotFound` if `path` does not exist
    /// * `FileTooLarge` / `DimensionsTooLarge` past the safety limits
    pub fn inspect(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BreakpointError::FileNotFound(path.to_path_buf()));
        }

        let canonical_path = path
            .canonicalize()
            .map_err(|_| BreakpointError::FileNotFound(path.to_path_buf()))?;

        let file_size = fs::metadata(&canonical_path)?.len();
        if file_size > MAX_FILE_SIZE {
            return Err(BreakpointError::FileTooLarge(file_size, MAX_FILE_SIZE));
        }

        let (width, height) = ImageReader::open(&canonical_path)?
            .with_guessed_format()?
            .into_dimensions()?;
        if width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION {
            return Err(BreakpointError::DimensionsTooLarge(
                width,
                height,
                MAX_IMAGE_DIMENSION,
            ));
        }

        Ok(Self {
            path: canonical_path,
            dimensions: Dimensions::new(width, height),
            file_size,
        })
    }

    /// Decodes the full image.
    pub fn decode(&self) -> Result<DynamicImage> {
        Ok(ImageReader::open(&self.path)?
            .with_guessed_format()?
            .decode()?)
    }

    /// File name without extension, used to name breakpoints.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string())
    }
}

/// A clamp applied while resolving bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    /// Upper bound restricted to the source image size.
    UpperToSource(Dimensions),
    /// Lower bound restricted to the upper bound.
    LowerToUpper(Dimensions),
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Adjustment::UpperToSource(dims) => write!(
                f,
                "upper size limit restricted to the source image size of {}",
                dims
            ),
            Adjustment::LowerToUpper(dims) => write!(
                f,
                "lower size limit restricted to the upper image size of {}",
                dims
            ),
        }
    }
}

/// Lower and upper requested dimensions after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub lower: Dimensions,
    pub upper: Dimensions,
}

impl Bounds {
    /// Clamps the requested bounds: a missing upper bound means the source size,
    /// an upper bound past the source collapses to the source, and a lower bound
    /// past the upper bound collapses to the upper bound.
    pub fn resolve(
        source: Dimensions,
        lower: Dimensions,
        upper: Option<Dimensions>,
    ) -> (Self, Vec<Adjustment>) {
        let mut adjustments = Vec::new();

        let mut upper = upper.unwrap_or(source);
        if upper.width > source.width || upper.height > source.height {
            upper = source;
            adjustments.push(Adjustment::UpperToSource(upper));
        }

        let mut lower = lower;
        if lower.width > upper.width || lower.height > upper.height {
            lower = upper;
            adjustments.push(Adjustment::LowerToUpper(lower));
        }

        (Self { lower, upper }, adjustments)
    }

    /// Renders both bounds through the oracle; the pair seeds the search.
    pub fn sample<O: ResizeOracle + ?Sized>(&self, oracle: &mut O) -> Result<(Sample, Sample)> {
        let lower = oracle.resize(self.lower)?;
        let upper = if self.upper == self.lower {
            lower.clone()
        } else {
            oracle.resize(self.upper)?
        };
        Ok((lower, upper))
    }
}
