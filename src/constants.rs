use std::time::Duration;

pub const DEFAULT_QUALITY: u8 = 80;
pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 100;

/// Absolute byte distance under which a probe is accepted outright.
pub const DEFAULT_TOLERANCE_FLOOR: u64 = 1024;

/// Recalibrations allowed for one checkpoint before the search punts.
pub const DEFAULT_MAX_ATTEMPTS: usize = 16;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(60);

pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;
pub const MAX_IMAGE_DIMENSION: u32 = 16_384;

pub const ZOPFLI_ITERATIONS: u8 = 15;
pub const LIBDEFLATER_HIGH_LEVEL: u8 = 12;
pub const LIBDEFLATER_LOW_LEVEL: u8 = 8;
pub const OXIPNG_PRESET: u8 = 4;

pub const MAGICK_PROGRAM: &str = "convert";
pub const MAGICK_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub const PROGRESS_SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";

// Common output message prefixes
pub const CREATED_PREFIX: &str = "✅";
pub const SEARCH_PREFIX: &str = "🔍";
pub const WARNING_PREFIX: &str = "⚠️ ";
pub const ERROR_PREFIX: &str = "❌";
pub const INFO_PREFIX: &str = "📋";
pub const SUMMARY_PREFIX: &str = "🎯";
