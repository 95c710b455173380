//! Rasterization: turn every PDF page into a numbered image via an external tool.
//!
//! The rasterizer writes `<images>/%0Nd.<ext>` starting at 1, so a three-page
//! deck yields `001`, `002`, `003`. Slide order in the final document comes
//! from these ordinals, never from directory-listing order: files are parsed
//! and sorted numerically, which also keeps decks longer than the padding
//! width (page 1000 with width 3) in page order.
//!
//! With `resize_width` set, a second pass resizes every image to that width
//! (height follows the aspect ratio) and each result is probed to confirm it.

use crate::config::ConversionConfig;
use crate::error::Pdf2NotesError;
use crate::output::SlideImage;
use crate::pipeline::process::{run_tool, CancelToken};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ffi::OsString;
use std::path::Path;
use tracing::{debug, info};

static RE_SLIDE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\.([A-Za-z0-9]+)$").unwrap());

/// Output pattern handed to the rasterizer, e.g. `<dir>/%003d.jpg`.
///
/// A `%` in the directory is doubled so the ordinal is the only directive.
pub fn output_pattern(images_dir: &Path, ordinal_width: usize, extension: &str) -> OsString {
    let mut pattern = match images_dir.to_str() {
        Some(dir) => OsString::from(dir.replace('%', "%%")),
        None => images_dir.as_os_str().to_os_string(),
    };
    pattern.push(std::path::MAIN_SEPARATOR_STR);
    pattern.push(format!("%0{ordinal_width}d.{extension}"));
    pattern
}

/// Arguments for the rasterizer pass.
pub fn rasterize_args(source: &Path, images_dir: &Path, config: &ConversionConfig) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();
    // -density applies to reading the PDF, so it must precede the input.
    if let Some(dpi) = config.density {
        args.push("-density".into());
        args.push(dpi.to_string().into());
    }
    args.push(source.as_os_str().to_os_string());
    args.push("-scene".into());
    args.push("1".into());
    args.push(output_pattern(
        images_dir,
        config.ordinal_width,
        config.slide_format.extension(),
    ));
    args
}

/// Arguments for the resize pass. The glob is expanded by the resizer itself.
pub fn resize_args(images_dir: &Path, width: u32, extension: &str) -> Vec<OsString> {
    let mut glob = images_dir.as_os_str().to_os_string();
    glob.push(std::path::MAIN_SEPARATOR_STR);
    glob.push(format!("*.{extension}"));
    vec!["-resize".into(), width.to_string().into(), glob]
}

/// Rasterize `source` into `images_dir` and return the slides in page order.
pub async fn rasterize(
    source: &Path,
    images_dir: &Path,
    config: &ConversionConfig,
    cancel: &CancelToken,
) -> Result<Vec<SlideImage>, Pdf2NotesError> {
    std::fs::create_dir_all(images_dir).map_err(|source| Pdf2NotesError::CreateDirFailed {
        path: images_dir.to_path_buf(),
        source,
    })?;

    let ext = config.slide_format.extension();
    let args = rasterize_args(source, images_dir, config);
    run_tool(&config.rasterizer, &args, config.tool_timeout, cancel).await?;

    if let Some(width) = config.resize_width {
        let args = resize_args(images_dir, width, ext);
        run_tool(&config.resizer, &args, config.tool_timeout, cancel).await?;
    }

    let slides = collect_slides(images_dir, ext)?;
    if slides.is_empty() {
        return Err(Pdf2NotesError::NoSlidesProduced {
            dir: images_dir.to_path_buf(),
        });
    }

    if let Some(width) = config.resize_width {
        verify_widths(&slides, width)?;
    }

    info!("Rasterized {} slides into {}", slides.len(), images_dir.display());
    Ok(slides)
}

/// Collect `<ordinal>.<extension>` files from `images_dir` in ascending ordinal order.
///
/// Files that don't follow the naming scheme are ignored.
pub fn collect_slides(images_dir: &Path, extension: &str) -> Result<Vec<SlideImage>, Pdf2NotesError> {
    let read_err = |source| Pdf2NotesError::ReadDirFailed {
        path: images_dir.to_path_buf(),
        source,
    };

    let mut slides = Vec::new();
    for entry in std::fs::read_dir(images_dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(caps) = RE_SLIDE_NAME.captures(name) else {
            debug!("Ignoring unexpected file {name} in {}", images_dir.display());
            continue;
        };
        if &caps[2] != extension {
            continue;
        }
        let Ok(ordinal) = caps[1].parse::<u32>() else { continue };
        slides.push(SlideImage {
            ordinal,
            path: entry.path(),
        });
    }

    slides.sort_by(|a, b| a.ordinal.cmp(&b.ordinal).then_with(|| a.path.cmp(&b.path)));
    Ok(slides)
}

/// Check that every slide is exactly `width` pixels wide.
pub fn verify_widths(slides: &[SlideImage], width: u32) -> Result<(), Pdf2NotesError> {
    for slide in slides {
        let (actual, height) = image::image_dimensions(&slide.path).map_err(|e| {
            Pdf2NotesError::ImageProbeFailed {
                path: slide.path.clone(),
                detail: e.to_string(),
            }
        })?;
        if actual != width {
            return Err(Pdf2NotesError::ResizeMismatch {
                path: slide.path.clone(),
                expected: width,
                actual,
            });
        }
        debug!("Slide {} → {}x{} px", slide.ordinal, actual, height);
    }
    Ok(())
}
