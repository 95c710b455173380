//! Result types produced by a conversion run.

use crate::config::OutputFormat;
use serde::Serialize;
use std::path::PathBuf;

/// One rasterized page.
///
/// `ordinal` is the 1-based page number encoded in the zero-padded file
/// stem (`001.jpg` → 1). Slides are always handed around in ascending
/// ordinal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideImage {
    pub ordinal: u32,
    pub path: PathBuf,
}

/// A document the converter is (or was) asked to produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputDocument {
    pub format: OutputFormat,
    pub path: PathBuf,
}

/// Timings for the subprocess-heavy stages.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    /// Number of slide images placed in the document.
    pub slide_count: usize,
    /// Rasterize (+ optional resize) wall-clock time.
    pub rasterize_duration_ms: u64,
    /// Time spent in the converter, summed over all outputs.
    pub build_duration_ms: u64,
    /// Whole run, from working-set creation to cleanup.
    pub total_duration_ms: u64,
}

/// Everything a successful run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub source: PathBuf,
    /// The per-run working directory (may already be removed, see `working_dir_retained`).
    pub working_dir: PathBuf,
    pub working_dir_retained: bool,
    pub markup_path: PathBuf,
    pub slides: Vec<SlideImage>,
    pub outputs: Vec<OutputDocument>,
    pub stats: ConversionStats,
}
