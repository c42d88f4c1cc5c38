use crate::constants::{
    DEFAULT_QUALITY, LIBDEFLATER_HIGH_LEVEL, LIBDEFLATER_LOW_LEVEL, MAX_QUALITY, MIN_QUALITY,
    OXIPNG_PRESET, ZOPFLI_ITERATIONS,
};
use crate::error::{BreakpointError, OracleError, Result};
use crate::formats::OutputFormat;
use crate::types::{Dimensions, Sample};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use oxipng::{Deflaters, Options};
use std::io::Cursor;
use std::num::NonZeroU8;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

/// Produces a resized rendition of the source and reports what came out.
///
/// Implementations fit the image inside the requested box, keeping the aspect
/// ratio, so the returned dimensions may be smaller than `target` on one axis.
pub trait ResizeOracle {
    fn resize(&mut self, target: Dimensions) -> std::result::Result<Sample, OracleError>;
}

impl<T: ResizeOracle + ?Sized> ResizeOracle for &mut T {
    fn resize(&mut self, target: Dimensions) -> std::result::Result<Sample, OracleError> {
        (**self).resize(target)
    }
}

impl<T: ResizeOracle + ?Sized> ResizeOracle for Box<T> {
    fn resize(&mut self, target: Dimensions) -> std::result::Result<Sample, OracleError> {
        (**self).resize(target)
    }
}

/// Encoder settings applied to every rendition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    pub format: OutputFormat,
    pub quality: u8,
}

impl EncodeOptions {
    pub fn new(format: OutputFormat, quality: Option<u8>) -> Result<Self> {
        let quality = quality.unwrap_or(DEFAULT_QUALITY);
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
            return Err(BreakpointError::InvalidQuality(quality));
        }

        Ok(Self { format, quality })
    }

    fn png_deflater(&self) -> Deflaters {
        if self.quality >= 90 {
            match NonZeroU8::new(ZOPFLI_ITERATIONS) {
                Some(iterations) => Deflaters::Zopfli { iterations },
                None => Deflaters::Libdeflater {
                    compression: LIBDEFLATER_HIGH_LEVEL,
                },
            }
        } else if self.quality >= 70 {
            Deflaters::Libdeflater {
                compression: LIBDEFLATER_HIGH_LEVEL,
            }
        } else {
            Deflaters::Libdeflater {
                compression: LIBDEFLATER_LOW_LEVEL,
            }
        }
    }
}

/// In-process oracle backed by the `image` crate.
///
/// The source is decoded once; each probe resizes with Lanczos3 and encodes
/// into memory on a worker thread so a probe can be abandoned on timeout.
///
/// At most one worker runs at a time. A timed-out render stays pending: a
/// retry of the same target waits on it again, and a different target first
/// waits for it to finish.
pub struct ImageOracle {
    source: Arc<DynamicImage>,
    options: EncodeOptions,
    timeout: Option<Duration>,
    pending: Option<PendingRender>,
    live_workers: Arc<AtomicUsize>,
}

type RenderResult = std::result::Result<Sample, OracleError>;

struct PendingRender {
    target: Dimensions,
    receiver: mpsc::Receiver<RenderResult>,
}

/// Decrements the live worker count once the render is done.
struct WorkerGuard(Arc<AtomicUsize>);

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ImageOracle {
    pub fn new(source: DynamicImage, options: EncodeOptions) -> Self {
        Self {
            source: Arc::new(source),
            options,
            timeout: None,
            pending: None,
            live_workers: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn source_dimensions(&self) -> Dimensions {
        Dimensions::new(self.source.width(), self.source.height())
    }

    /// Render threads that have not exited yet.
    pub fn live_workers(&self) -> usize {
        self.live_workers.load(Ordering::SeqCst)
    }

    fn spawn_render(&self, target: Dimensions) -> mpsc::Receiver<RenderResult> {
        let (tx, rx) = mpsc::channel();
        let source = Arc::clone(&self.source);
        let options = self.options;

        self.live_workers.fetch_add(1, Ordering::SeqCst);
        let guard = WorkerGuard(Arc::clone(&self.live_workers));
        thread::spawn(move || {
            let result = render(&source, target, &options);
            drop(guard);
            // The receiver is gone once the oracle was dropped
            let _ = tx.send(result);
        });
        rx
    }
}

impl ResizeOracle for ImageOracle {
    fn resize(&mut self, target: Dimensions) -> RenderResult {
        let Some(timeout) = self.timeout else {
            if let Some(stale) = self.pending.take() {
                let _ = stale.receiver.recv();
            }
            return render(&self.source, target, &self.options);
        };

        let receiver = match self.pending.take() {
            Some(pending) if pending.target == target => pending.receiver,
            Some(stale) => {
                // Blocks until the abandoned render finishes
                let _ = stale.receiver.recv();
                self.spawn_render(target)
            }
            None => self.spawn_render(target),
        };

        match receiver.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                self.pending = Some(PendingRender { target, receiver });
                Err(OracleError::Timeout(timeout))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(OracleError::WorkerLost),
        }
    }
}

/// Resizes `source` to fit inside `target` and encodes it.
pub fn render(
    source: &DynamicImage,
    target: Dimensions,
    options: &EncodeOptions,
) -> std::result::Result<Sample, OracleError> {
    let resized = source.resize(target.width, target.height, FilterType::Lanczos3);
    let dimensions = Dimensions::new(resized.width(), resized.height());
    let data = encode(&resized, options)?;
    Ok(Sample::from_encoded(dimensions, data))
}

/// Encodes an image in memory using the configured format.
pub fn encode(
    img: &DynamicImage,
    options: &EncodeOptions,
) -> std::result::Result<Vec<u8>, OracleError> {
    let mut buffer = Vec::new();

    match options.format {
        OutputFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut buffer, options.quality);
            rgb.write_with_encoder(encoder)?;
        }
        OutputFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)?;

            let mut oxipng_options = Options::from_preset(OXIPNG_PRESET);
            oxipng_options.force = true;
            oxipng_options.deflate = options.png_deflater();

            buffer = oxipng::optimize_from_memory(&buffer, &oxipng_options)
                .map_err(|e| OracleError::PngOptimization(e.to_string()))?;
        }
        OutputFormat::WebP => {
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            rgba.write_with_encoder(WebPEncoder::new_lossless(&mut buffer))?;
        }
    }

    Ok(buffer)
}
