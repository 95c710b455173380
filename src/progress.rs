//! Stage machine and progress-callback trait for conversion runs.
//!
//! A run moves strictly forward through [`Stage`]s:
//!
//! ```text
//! Init → BinariesChecked → FileSelected → OutputsGuarded
//!      → Rasterized → MarkupBuilt → DocumentBuilt (×N) → Done
//! ```
//!
//! Any stage may fail instead; there are no backward edges and nothing is
//! rolled back. Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to observe
//! the transitions, e.g. to drive a terminal spinner.
//!
//! # Example
//!
//! ```rust
//! use pdf2notes::{ConversionConfig, ConversionProgressCallback, Stage};
//! use std::sync::{Arc, Mutex};
//!
//! struct Recorder(Mutex<Vec<Stage>>);
//!
//! impl ConversionProgressCallback for Recorder {
//!     fn on_stage(&self, stage: Stage) {
//!         self.0.lock().unwrap().push(stage);
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(Recorder(Mutex::new(Vec::new()))))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::OutputDocument;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// A point the pipeline has reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Stage {
    Init,
    BinariesChecked,
    FileSelected,
    OutputsGuarded,
    Rasterized,
    MarkupBuilt,
    DocumentBuilt,
    Done,
}

impl Stage {
    /// Whether moving from `self` to `next` is a legal forward transition.
    ///
    /// `DocumentBuilt → DocumentBuilt` is the only self-loop (one per output).
    pub fn can_advance_to(self, next: Stage) -> bool {
        use Stage::*;
        matches!(
            (self, next),
            (Init, BinariesChecked)
                | (BinariesChecked, FileSelected)
                | (FileSelected, OutputsGuarded)
                | (OutputsGuarded, Rasterized)
                | (Rasterized, MarkupBuilt)
                | (MarkupBuilt, DocumentBuilt)
                | (DocumentBuilt, DocumentBuilt)
                | (DocumentBuilt, Done)
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Init => "starting",
            Stage::BinariesChecked => "required tools found",
            Stage::FileSelected => "source selected",
            Stage::OutputsGuarded => "outputs cleared",
            Stage::Rasterized => "slides rasterized",
            Stage::MarkupBuilt => "markup written",
            Stage::DocumentBuilt => "document built",
            Stage::Done => "done",
        };
        f.write_str(label)
    }
}

/// Called by the pipeline as it advances.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The pipeline is sequential, so calls never overlap.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called each time the run reaches a new stage.
    fn on_stage(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called just before an external tool is launched.
    ///
    /// # Arguments
    /// * `tool` — program name, e.g. `convert`
    fn on_tool_start(&self, tool: &str) {
        let _ = tool;
    }

    /// Called once the slide images have been collected.
    fn on_slides_ready(&self, count: usize) {
        let _ = count;
    }

    /// Called after each output document has been written.
    fn on_document_built(&self, output: &OutputDocument) {
        let _ = output;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

/// Tracks the current stage, logs each transition and forwards it to the
/// configured callback.
pub(crate) struct StageTracker<'a> {
    current: Stage,
    callback: Option<&'a ProgressCallback>,
}

impl<'a> StageTracker<'a> {
    pub(crate) fn new(callback: Option<&'a ProgressCallback>) -> Self {
        Self {
            current: Stage::Init,
            callback,
        }
    }

    /// Start from a stage reached by an earlier phase of the same run.
    pub(crate) fn resume(at: Stage, callback: Option<&'a ProgressCallback>) -> Self {
        Self {
            current: at,
            callback,
        }
    }

    pub(crate) fn current(&self) -> Stage {
        self.current
    }

    pub(crate) fn advance(&mut self, next: Stage) {
        debug_assert!(
            self.current.can_advance_to(next),
            "illegal stage transition {:?} → {:?}",
            self.current,
            next
        );
        tracing::info!(from = ?self.current, to = ?next, "stage: {}", next);
        self.current = next;
        if let Some(cb) = self.callback {
            cb.on_stage(next);
        }
    }

    pub(crate) fn tool_start(&self, tool: &str) {
        if let Some(cb) = self.callback {
            cb.on_tool_start(tool);
        }
    }

    pub(crate) fn slides_ready(&self, count: usize) {
        if let Some(cb) = self.callback {
            cb.on_slides_ready(count);
        }
    }

    pub(crate) fn document_built(&self, output: &OutputDocument) {
        if let Some(cb) = self.callback {
            cb.on_document_built(output);
        }
    }
}
