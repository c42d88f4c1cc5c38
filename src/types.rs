//! Geometry and sample types shared by the resolver, the oracles and the search.

use crate::error::{BreakpointError, Result};
use std::fmt;
use std::str::FromStr;

/// Width and height in source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when both axes are at least as large as `other`.
    pub fn covers(&self, other: Dimensions) -> bool {
        self.width >= other.width && self.height >= other.height
    }

    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Dimensions {
    type Err = BreakpointError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || BreakpointError::InvalidDimensions(s.to_string());
        let (width, height) = s
            .trim()
            .split_once(&['x', 'X'][..])
            .ok_or_else(invalid)?;
        let width: u32 = width.trim().parse().map_err(|_| invalid())?;
        let height: u32 = height.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Dimensions::new(width, height))
    }
}

/// One oracle observation: what was actually produced for a requested size.
#[derive(Clone, PartialEq, Eq)]
pub struct Sample {
    dimensions: Dimensions,
    file_size: u64,
    data: Vec<u8>,
}

impl Sample {
    /// A sample whose size is the length of its encoded bytes.
    pub fn from_encoded(dimensions: Dimensions, data: Vec<u8>) -> Self {
        let file_size = data.len() as u64;
        Self {
            dimensions,
            file_size,
            data,
        }
    }

    /// A sample without image bytes, for oracles that only report metrics.
    pub fn from_metrics(dimensions: Dimensions, file_size: u64) -> Self {
        Self {
            dimensions,
            file_size,
            data: Vec::new(),
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sample")
            .field("dimensions", &self.dimensions)
            .field("file_size", &self.file_size)
            .field("data_len", &self.data.len())
            .finish()
    }
}

/// Estimated pixels per axis that buy one step of file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GrowthFactor {
    pub width: u32,
    pub height: u32,
}

impl GrowthFactor {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Estimates the factor from a smaller `reference` and a larger `target`
    /// sample: `floor(step * Δdim / Δsize)` per axis.
    ///
    /// Fails with [`BreakpointError::DivergentSamples`] unless the target is
    /// strictly larger in bytes than the reference.
    pub fn estimate(reference: &Sample, target: &Sample, step: u64) -> Result<Self> {
        if target.file_size() <= reference.file_size() {
            return Err(BreakpointError::DivergentSamples {
                lower: reference.file_size(),
                upper: target.file_size(),
            });
        }

        let size_delta = (target.file_size() - reference.file_size()) as f64;
        let per_axis = |from: u32, to: u32| -> u32 {
            let pixels = to.saturating_sub(from) as f64;
            (step as f64 * pixels / size_delta).floor() as u32
        };

        let (r, t) = (reference.dimensions(), target.dimensions());
        Ok(Self {
            width: per_axis(r.width, t.width),
            height: per_axis(r.height, t.height),
        })
    }

    /// Divides both axes by `adjustment` and floors the result.
    ///
    /// Returns `None` when the adjustment is not a positive finite number.
    pub fn rescale(&self, adjustment: f64) -> Option<Self> {
        if !adjustment.is_finite() || adjustment <= 0.0 {
            return None;
        }
        let scale = |axis: u32| (axis as f64 / adjustment).floor().min(u32::MAX as f64) as u32;
        Some(Self {
            width: scale(self.width),
            height: scale(self.height),
        })
    }

    /// True when an axis that was moving has been floored to zero.
    pub fn collapsed_from(&self, previous: GrowthFactor) -> bool {
        (previous.width > 0 && self.width == 0) || (previous.height > 0 && self.height == 0)
    }
}

impl fmt::Display for GrowthFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{}x+{}", self.width, self.height)
    }
}
