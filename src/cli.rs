use crate::logger::Verbosity;
use crate::types::Dimensions;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "bp-squeeze",
    about = "Create responsive image breakpoints based on file size, not dimensions",
    long_about = "bp-squeeze takes a large source image, a lower and an upper size in context, and a \
                  file-size step. It creates one image per step between the bounds, searching for \
                  the dimensions whose encoded size grows by roughly the step each time.",
    version = "0.1.0",
    after_help = "EXAMPLES:\n  \
    bp-squeeze generate --source hero.jpg --step 20000 --lower 320x180\n  \
    bp-squeeze generate --source hero.png --step 50000 --lower 320x180 --upper 1920x1080 -o out -v\n  \
    bp-squeeze info hero.jpg --lower 320x180 --step 20000"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Generate breakpoint images from a source image",
        long_about = "Create images between the lower and upper bounds, one per file-size step. \
                      Files are named <source>-<W>x<H>.<ext>."
    )]
    Generate {
        #[arg(short = 's', long, help = "Source image file path")]
        source: PathBuf,

        #[arg(
            long,
            help = "File-size increase between breakpoints, in bytes",
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        step: u64,

        #[arg(
            short = 'l',
            long,
            help = "Smallest size in context (WxH)",
            value_parser = parse_dimensions
        )]
        lower: Dimensions,

        #[arg(
            short = 'u',
            long,
            help = "Largest size in context (WxH, default: source size)",
            long_help = "Largest size in context. Restricted to the source image size.",
            value_parser = parse_dimensions
        )]
        upper: Option<Dimensions>,

        #[arg(
            short = 'o',
            long,
            default_value = ".",
            help = "Directory the breakpoint images are written to"
        )]
        output_dir: PathBuf,

        #[arg(
            short = 't',
            long,
            help = "Accept a breakpoint within this many bytes (default: 1024)"
        )]
        tolerance: Option<u64>,

        #[arg(
            short = 'm',
            long,
            help = "Recalibrations per breakpoint before accepting the closest guess (default: 16)"
        )]
        max_attempts: Option<usize>,

        #[arg(
            long,
            help = "Seconds allowed for one resize (default: 60, 0 disables)"
        )]
        timeout: Option<u64>,

        #[arg(
            short = 'q',
            long,
            help = "Encoding quality (1-100, default: 80)",
            long_help = "Encoding quality from 1 (lowest) to 100 (highest). \
                         For PNG: >=90 uses Zopfli, >=70 uses high compression, <70 uses standard compression."
        )]
        quality: Option<u8>,

        #[arg(
            short = 'b',
            long,
            default_value = "image",
            help = "Resize backend (image, magick)"
        )]
        backend: String,

        #[arg(short = 'v', long, help = "Print every calibration step")]
        verbose: bool,

        #[arg(long, help = "Print errors only")]
        quiet: bool,
    },

    #[command(
        about = "Display source image metrics",
        long_about = "Display the dimensions and size of a source image. With --lower and --step, \
                      also render both bounds and print the growth factor a run would start with."
    )]
    Info {
        #[arg(help = "Image file path to analyze")]
        input: PathBuf,

        #[arg(short = 'l', long, value_parser = parse_dimensions, requires = "step")]
        lower: Option<Dimensions>,

        #[arg(short = 'u', long, value_parser = parse_dimensions)]
        upper: Option<Dimensions>,

        #[arg(long, requires = "lower")]
        step: Option<u64>,

        #[arg(short = 'b', long, default_value = "image")]
        backend: String,
    },
}

impl Commands {
    /// `info` prints its report directly; the logger only carries errors.
    pub fn verbosity(&self) -> Verbosity {
        match self {
            Commands::Generate { verbose, quiet, .. } => Verbosity::from_flags(*verbose, *quiet),
            Commands::Info { .. } => Verbosity::Quiet,
        }
    }
}

fn parse_dimensions(value: &str) -> Result<Dimensions, String> {
    value.parse().map_err(|e: crate::error::BreakpointError| e.to_string())
}
