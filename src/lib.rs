pub mod bounds;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod formats;
pub mod info;
pub mod logger;
pub mod magick;
pub mod oracle;
pub mod pipeline;
pub mod search;
pub mod types;
pub mod utils;
pub mod writer;

pub use bounds::{Bounds, SourceImage};
pub use config::SearchConfig;
pub use error::{BreakpointError, OracleError, Result};
pub use formats::OutputFormat;
pub use magick::MagickOracle;
pub use oracle::{EncodeOptions, ImageOracle, ResizeOracle};
pub use pipeline::{generate_breakpoints, Backend, GenerateOptions, RunSummary};
pub use search::{
    Breakpoint, BreakpointSearch, Outcome, PuntReason, SearchEvent, SearchObserver, Silent,
    seed_growth_factor,
};
pub use types::{Dimensions, GrowthFactor, Sample};
pub use writer::BreakpointWriter;
