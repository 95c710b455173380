//! Document building: hand the markup to the external converter, once per
//! requested output format.
//!
//! Each invocation is independent. When a later format fails, documents
//! already written by earlier invocations stay on disk.

use crate::config::ConversionConfig;
use crate::error::Pdf2NotesError;
use crate::output::OutputDocument;
use crate::pipeline::process::{run_tool, CancelToken};
use std::ffi::OsString;
use std::path::Path;
use tracing::info;

/// Converter arguments: explicit source and target formats, standalone
/// output, then the output and input paths.
pub fn build_args(markup_path: &Path, output: &OutputDocument, config: &ConversionConfig) -> Vec<OsString> {
    vec![
        "-f".into(),
        config.markup.converter_id().into(),
        "-t".into(),
        output.format.converter_id().into(),
        "-s".into(),
        "-o".into(),
        output.path.as_os_str().to_os_string(),
        markup_path.as_os_str().to_os_string(),
    ]
}

/// Convert `markup_path` into `output`.
pub async fn build_document(
    markup_path: &Path,
    output: &OutputDocument,
    config: &ConversionConfig,
    cancel: &CancelToken,
) -> Result<(), Pdf2NotesError> {
    let args = build_args(markup_path, output, config);
    run_tool(&config.converter, &args, config.tool_timeout, cancel).await?;
    info!("Built {} document {}", output.format, output.path.display());
    Ok(())
}
