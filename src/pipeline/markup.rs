//! Markup generation: write the intermediate notes table for the converter.

use crate::config::ConversionConfig;
use crate::error::Pdf2NotesError;
use crate::output::SlideImage;
use crate::template;
use std::path::Path;
use tracing::info;

/// Render the notes table for `slides` (already in ordinal order) and write
/// it to `markup_path`.
pub fn write_markup(
    markup_path: &Path,
    slides: &[SlideImage],
    config: &ConversionConfig,
) -> Result<(), Pdf2NotesError> {
    let images: Vec<&Path> = slides.iter().map(|s| s.path.as_path()).collect();
    let text = template::render(config.markup, config.display_width, &images);

    std::fs::write(markup_path, text).map_err(|source| Pdf2NotesError::WriteFailed {
        path: markup_path.to_path_buf(),
        source,
    })?;

    info!(
        "Wrote {} markup with {} rows to {}",
        config.markup.converter_id(),
        slides.len(),
        markup_path.display()
    );
    Ok(())
}
