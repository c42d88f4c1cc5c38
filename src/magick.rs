use crate::constants::{MAGICK_POLL_INTERVAL, MAGICK_PROGRAM};
use crate::error::OracleError;
use crate::oracle::ResizeOracle;
use crate::types::{Dimensions, Sample};
use image::ImageReader;
use std::ffi::OsString;
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Oracle that shells out to ImageMagick: `convert -resize WxH <source> <out>`.
///
/// `-resize` fits inside the box and keeps the aspect ratio. The output is
/// written to a temp file and read back, so each probe costs one process.
pub struct MagickOracle {
    program: OsString,
    source: PathBuf,
    extension: String,
    quality: Option<u8>,
    timeout: Option<Duration>,
}

impl MagickOracle {
    pub fn new(source: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            program: OsString::from(MAGICK_PROGRAM),
            source: source.into(),
            extension: extension.to_string(),
            quality: None,
            timeout: None,
        }
    }

    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    /// Passes `-quality` through to the encoder.
    pub fn with_quality(mut self, quality: Option<u8>) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl ResizeOracle for MagickOracle {
    fn resize(&mut self, target: Dimensions) -> Result<Sample, OracleError> {
        let output = tempfile::Builder::new()
            .prefix("bp-squeeze-")
            .suffix(&format!(".{}", self.extension))
            .tempfile()?;

        let mut command = Command::new(&self.program);
        if let Some(quality) = self.quality {
            command.arg("-quality").arg(quality.to_string());
        }
        let mut child = command
            .arg("-resize")
            .arg(target.to_string())
            .arg(&self.source)
            .arg(output.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let status = wait_with_timeout(&mut child, self.timeout)?;
        if !status.success() {
            return Err(OracleError::CommandFailed {
                program: self.program.to_string_lossy().into_owned(),
                status: status.to_string(),
            });
        }

        let data = fs::read(output.path())?;
        let (width, height) = ImageReader::new(Cursor::new(&data))
            .with_guessed_format()?
            .into_dimensions()?;

        Ok(Sample::from_encoded(Dimensions::new(width, height), data))
    }
}

fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
) -> Result<ExitStatus, OracleError> {
    let Some(timeout) = timeout else {
        return Ok(child.wait()?);
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(OracleError::Timeout(timeout));
        }
        thread::sleep(MAGICK_POLL_INTERVAL);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tempfile::TempDir;

    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_reads_back_command_output() {
        let temp_dir = TempDir::new().unwrap();
        let fixture = temp_dir.path().join("fixture.png");
        DynamicImage::ImageRgb8(RgbImage::new(24, 12))
            .save(&fixture)
            .unwrap();
        // argv: -resize WxH source out
        let fake = script(
            temp_dir.path(),
            "fake-convert",
            &format!("cp '{}' \"$4\"", fixture.display()),
        );

        let mut oracle = MagickOracle::new(&fixture, "png").with_program(&fake);
        let sample = oracle.resize(Dimensions::new(10, 10)).unwrap();

        assert_eq!(sample.dimensions(), Dimensions::new(24, 12));
        assert_eq!(sample.file_size(), fs::metadata(&fixture).unwrap().len());
    }

    #[test]
    fn test_failed_command() {
        let temp_dir = TempDir::new().unwrap();
        let fake = script(temp_dir.path(), "broken-convert", "exit 3");

        let mut oracle = MagickOracle::new("missing.png", "png").with_program(&fake);
        let result = oracle.resize(Dimensions::new(10, 10));

        assert!(matches!(result, Err(OracleError::CommandFailed { .. })));
    }

    #[test]
    fn test_slow_command_times_out() {
        let temp_dir = TempDir::new().unwrap();
        let fake = script(temp_dir.path(), "slow-convert", "sleep 5");

        let mut oracle = MagickOracle::new("missing.png", "png")
            .with_program(&fake)
            .with_timeout(Some(Duration::from_millis(50)));
        let result = oracle.resize(Dimensions::new(10, 10));

        assert!(matches!(result, Err(OracleError::Timeout(_))));
    }

    #[test]
    fn test_missing_program() {
        let mut oracle =
            MagickOracle::new("missing.png", "png").with_program("/nonexistent/convert");
        let result = oracle.resize(Dimensions::new(10, 10));

        assert!(matches!(result, Err(OracleError::Io(_))));
    }
}
