//! Small formatting and terminal helpers shared by the logger and the CLI.

use crate::constants::PROGRESS_SPINNER_TEMPLATE;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a ticking spinner with the crate's styling
///
/// # Arguments
/// * `message` - Initial message to display
///
/// # Returns
/// * Configured `ProgressBar` instance
pub fn create_progress_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template(PROGRESS_SPINNER_TEMPLATE) {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Format a byte count for display
///
/// # Arguments
/// * `bytes` - Size in bytes
///
/// # Returns
/// * Human-readable size, e.g. `512 B`, `1.5 KB`, `2.0 MB`
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

/// Format how far an actual size landed from its target
///
/// # Arguments
/// * `actual` - Size the encoder produced
/// * `target` - Size the checkpoint aimed for
///
/// # Returns
/// * Signed human-readable difference, e.g. `+1.2 KB` or `-300 B`
pub fn format_size_delta(actual: u64, target: u64) -> String {
    if actual >= target {
        format!("+{}", format_file_size(actual - target))
    } else {
        format!("-{}", format_file_size(target - actual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn test_format_size_delta() {
        assert_eq!(format_size_delta(1100, 100), "+1000 B");
        assert_eq!(format_size_delta(100, 2148), "-2.0 KB");
        assert_eq!(format_size_delta(5, 5), "+0 B");
    }
}
