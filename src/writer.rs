use crate::error::{BreakpointError, Result};
use crate::search::Breakpoint;
use crate::types::Dimensions;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// Persists breakpoints as `<stem>-<W>x<H>.<ext>` inside one directory.
#[derive(Debug, Clone)]
pub struct BreakpointWriter {
    dir: PathBuf,
    stem: String,
    extension: String,
}

impl BreakpointWriter {
    /// Creates the output directory if needed.
    pub fn new(dir: impl Into<PathBuf>, stem: &str, extension: &str) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|_| BreakpointError::DirectoryCreationFailed(dir.clone()))?;

        Ok(Self {
            dir,
            stem: stem.to_string(),
            extension: extension.to_string(),
        })
    }

    pub fn path_for(&self, dimensions: Dimensions) -> PathBuf {
        self.dir
            .join(format!("{}-{}.{}", self.stem, dimensions, self.extension))
    }

    /// Writes the breakpoint's image bytes and returns the final path.
    ///
    /// The bytes go to a temp file in the same directory first and are renamed
    /// into place, so a failed run never leaves a truncated breakpoint behind.
    pub fn write(&self, breakpoint: &Breakpoint) -> Result<PathBuf> {
        let destination = self.path_for(breakpoint.dimensions());

        let mut temp = NamedTempFile::new_in(&self.dir)?;
        temp.write_all(breakpoint.sample().data())?;
        temp.flush()?;
        temp.persist(&destination).map_err(|e| e.error)?;

        Ok(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::error::OracleError;
    use crate::oracle::ResizeOracle;
    use crate::search::BreakpointSearch;
    use crate::types::{GrowthFactor, Sample};
    use tempfile::TempDir;

    struct Unused;

    impl ResizeOracle for Unused {
        fn resize(&mut self, _target: Dimensions) -> std::result::Result<Sample, OracleError> {
            unreachable!("seed breakpoints never probe")
        }
    }

    fn seed(sample: Sample) -> Breakpoint {
        let dims = sample.dimensions();
        let mut search = BreakpointSearch::with_growth_factor(
            Unused,
            sample,
            dims,
            GrowthFactor::default(),
            SearchConfig::new(1).unwrap(),
        );
        search.next().unwrap().unwrap()
    }

    #[test]
    fn test_path_for() {
        let temp_dir = TempDir::new().unwrap();
        let writer = BreakpointWriter::new(temp_dir.path(), "hero", "jpg").unwrap();

        assert_eq!(
            writer.path_for(Dimensions::new(320, 240)),
            temp_dir.path().join("hero-320x240.jpg")
        );
    }

    #[test]
    fn test_write_creates_directory_and_file() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("nested").join("out");
        let writer = BreakpointWriter::new(&out, "hero", "png").unwrap();

        let breakpoint = seed(Sample::from_encoded(
            Dimensions::new(8, 4),
            b"not really a png".to_vec(),
        ));
        let path = writer.write(&breakpoint).unwrap();

        assert_eq!(path, out.join("hero-8x4.png"));
        assert_eq!(fs::read(&path).unwrap(), b"not really a png");
        assert_eq!(fs::read_dir(&out).unwrap().count(), 1);
    }

    #[test]
    fn test_write_replaces_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let writer = BreakpointWriter::new(temp_dir.path(), "hero", "png").unwrap();
        fs::write(writer.path_for(Dimensions::new(2, 2)), b"old").unwrap();

        let breakpoint = seed(Sample::from_encoded(Dimensions::new(2, 2), b"new".to_vec()));
        let path = writer.write(&breakpoint).unwrap();

        assert_eq!(fs::read(path).unwrap(), b"new");
    }
}
