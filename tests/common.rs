#![allow(dead_code)]

use bp_squeeze::{Dimensions, OracleError, ResizeOracle, Sample};
use image::{DynamicImage, Rgb, RgbImage};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Oracle driven by a closure from requested to actual sample.
pub struct ModelOracle<F> {
    model: F,
    pub calls: Vec<Dimensions>,
}

impl<F: FnMut(Dimensions) -> Sample> ModelOracle<F> {
    pub fn new(model: F) -> Self {
        Self {
            model,
            calls: Vec::new(),
        }
    }
}

impl<F: FnMut(Dimensions) -> Sample> ResizeOracle for ModelOracle<F> {
    fn resize(&mut self, target: Dimensions) -> Result<Sample, OracleError> {
        self.calls.push(target);
        Ok((self.model)(target))
    }
}

/// Square source whose encoded size grows linearly with area between two
/// calibration points. Fits inside the requested box like a real resizer.
pub fn square_area_model(
    lower: (u32, u64),
    upper: (u32, u64),
) -> impl FnMut(Dimensions) -> Sample {
    move |target: Dimensions| {
        let side = target.width.min(target.height).min(upper.0);
        let (l, u) = (lower.0 as f64, upper.0 as f64);
        let per_pixel = (upper.1 - lower.1) as f64 / (u * u - l * l);
        let size = lower.1 as f64 + (side as f64 * side as f64 - l * l) * per_pixel;
        Sample::from_metrics(Dimensions::new(side, side), size.round().max(1.0) as u64)
    }
}

/// Records every response of the wrapped oracle.
pub struct RecordingOracle<O> {
    inner: O,
    pub responses: Vec<Sample>,
}

impl<O: ResizeOracle> RecordingOracle<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            responses: Vec::new(),
        }
    }
}

impl<O: ResizeOracle> ResizeOracle for RecordingOracle<O> {
    fn resize(&mut self, target: Dimensions) -> Result<Sample, OracleError> {
        let sample = self.inner.resize(target)?;
        self.responses.push(sample.clone());
        Ok(sample)
    }
}

/// Replays a fixed sequence of responses regardless of what is requested.
pub struct ScriptedOracle {
    responses: VecDeque<Sample>,
}

impl ScriptedOracle {
    pub fn new(responses: impl IntoIterator<Item = Sample>) -> Self {
        Self {
            responses: responses.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.responses.len()
    }
}

impl ResizeOracle for ScriptedOracle {
    fn resize(&mut self, _target: Dimensions) -> Result<Sample, OracleError> {
        self.responses.pop_front().ok_or(OracleError::WorkerLost)
    }
}

pub fn metrics(width: u32, height: u32, size: u64) -> Sample {
    Sample::from_metrics(Dimensions::new(width, height), size)
}

/// Writes a deterministic noise image; noise keeps encoded size growing with area.
pub fn create_noise_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let mut state: u32 = 0x2545_f491;
    let img = RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        };
        Rgb([next(), next(), next()])
    });

    let path = dir.join(name);
    DynamicImage::ImageRgb8(img).save(&path).unwrap();
    path
}
