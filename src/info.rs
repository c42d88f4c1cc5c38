use crate::bounds::{Bounds, SourceImage};
use crate::constants::WARNING_PREFIX;
use crate::error::Result;
use crate::pipeline::{build_oracle, Backend};
use crate::search::seed_growth_factor;
use crate::types::{Dimensions, GrowthFactor};
use crate::utils::format_file_size;
use image::ImageReader;
use std::path::Path;

/// Prints the metrics a breakpoint run starts from.
pub fn print_source_info(input_path: &Path) -> Result<SourceImage> {
    let source = SourceImage::inspect(input_path)?;
    let format = ImageReader::open(&source.path)?
        .with_guessed_format()?
        .format();

    println!("📊 Analyzing image: {:?}", source.path);
    println!("📋 Basic Information:");
    println!("  📏 Dimensions: {} pixels", source.dimensions);
    println!(
        "  📦 File size: {} bytes ({})",
        source.file_size,
        format_file_size(source.file_size)
    );
    println!("  🎭 Image format: {:?}", format);
    println!("  🔢 Total pixels: {}", source.dimensions.pixels());
    println!("  📐 Aspect ratio: {:.2}:1", source.dimensions.aspect_ratio());
    println!(
        "  💾 Bytes per pixel: {:.3}",
        source.file_size as f64 / source.dimensions.pixels() as f64
    );

    Ok(source)
}

/// Renders both bounds and prints the growth factor a run would start with.
///
/// # Arguments
/// * `source` - Metrics of the inspected source image
/// * `lower` / `upper` - Requested bounds, clamped like `generate` clamps them
/// * `step` - File-size increase between breakpoints, in bytes
/// * `backend` - Resize oracle used to render the bounds
///
/// # Returns
/// * The seed growth factor; the default factor when the bounds collapse
pub fn print_seed_estimate(
    source: &SourceImage,
    lower: Dimensions,
    upper: Option<Dimensions>,
    step: u64,
    backend: Backend,
) -> Result<GrowthFactor> {
    let (bounds, adjustments) = Bounds::resolve(source.dimensions, lower, upper);
    let mut oracle = build_oracle(source, backend, None, None)?;
    let (lower, upper) = bounds.sample(&mut oracle)?;
    let factor = seed_growth_factor(&lower, &upper, step)?;

    println!("\n💡 Breakpoint Seed:");
    for adjustment in adjustments {
        println!("  {} {}", WARNING_PREFIX, adjustment);
    }
    println!(
        "  🔽 Lower: {} = {}",
        lower.dimensions(),
        format_file_size(lower.file_size())
    );
    println!(
        "  🔼 Upper: {} = {}",
        upper.dimensions(),
        format_file_size(upper.file_size())
    );
    println!("  📈 Growth factor per {} bytes: {}", step, factor);

    if lower.dimensions().covers(upper.dimensions()) {
        println!("  🎯 Expected breakpoints: 1 (bounds collapse to one size)");
    } else {
        let span = upper.file_size() - lower.file_size();
        println!("  🎯 Expected breakpoints: ~{}", span / step + 1);
    }

    Ok(factor)
}
