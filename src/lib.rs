//! # pdf2notes
//!
//! Turn a slide-deck PDF into an editable notes document: one table row per
//! slide, the slide image on the left and an empty cell for notes on the right.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Check    required tools on PATH (convert, mogrify, pandoc)
//!  ├─ 2. Select   numbered menu of *.pdf in the input directory
//!  ├─ 3. Guard    ask before replacing an existing output
//!  ├─ 4. Raster   one numbered JPEG/PNG per page, optional resize
//!  ├─ 5. Markup   Markdown or HTML slide/notes table
//!  └─ 6. Build    pandoc → .odt / .docx / .rtf
//! ```
//!
//! The heavy lifting is done by ImageMagick and pandoc; this crate drives
//! them with timeouts and cancellation, and keeps slide order, cleanup and
//! error reporting deterministic.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2notes::{convert, CancelToken, ConversionConfig, OutputFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .formats(vec![OutputFormat::Odt, OutputFormat::Docx])
//!         .resize_width(800)
//!         .build()?;
//!     let report = convert("deck.pdf", &config, &CancelToken::new()).await?;
//!     for doc in &report.outputs {
//!         println!("{} ({} slides)", doc.path.display(), report.stats.slide_count);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2notes` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ```toml
//! pdf2notes = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod console;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod template;
pub mod workspace;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    CleanupPolicy, ConversionConfig, ConversionConfigBuilder, DisplayWidth, MarkupFormat,
    OutputFormat, SlideFormat, ToolCommand,
};
pub use console::Console;
pub use convert::{
    convert, convert_sync, execute, plan_outputs, prepare, run_interactive, ConversionPlan,
    Preparation, RunOutcome,
};
pub use error::{ErrorKind, Pdf2NotesError};
pub use output::{ConversionReport, ConversionStats, OutputDocument, SlideImage};
pub use pipeline::process::CancelToken;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
