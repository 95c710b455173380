//! Configuration types for slide-deck to notes-document conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Every knob lives in one struct so a
//! run can be logged and reproduced from its config alone.

use crate::error::Pdf2NotesError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a conversion run.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2notes::{ConversionConfig, OutputFormat};
///
/// let config = ConversionConfig::builder()
///     .formats(vec![OutputFormat::Odt, OutputFormat::Docx])
///     .resize_width(1024)
///     .build()
///     .unwrap();
/// assert_eq!(config.formats.len(), 2);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Directory scanned for candidate source files. Default: `.`.
    pub input_dir: PathBuf,

    /// Directory the output documents are written to.
    /// `None` (default) writes next to the source file.
    pub output_dir: Option<PathBuf>,

    /// Extension (without the dot) that marks a candidate source file. Default: `pdf`.
    ///
    /// Matched case-sensitively, the way a `*.pdf` shell glob would.
    pub source_extension: String,

    /// Target formats, one output document each. Default: `[Odt]`.
    pub formats: Vec<OutputFormat>,

    /// Intermediate markup handed to the converter. Default: Markdown.
    pub markup: MarkupFormat,

    /// Display width of each slide inside its table cell. Default: 100%.
    ///
    /// Expressed relative to the cell (or in pixels) so the document layout
    /// does not depend on the rasterized image's resolution.
    pub display_width: DisplayWidth,

    /// Resize every slide to this pixel width after rasterizing (height
    /// follows the aspect ratio). Default: `None` (keep rasterizer output).
    pub resize_width: Option<u32>,

    /// Rasterization density in DPI passed to the rasterizer. Range: 72–600.
    /// Default: `None` (the rasterizer's own default).
    pub density: Option<u32>,

    /// Image format the rasterizer writes. Default: JPEG.
    pub slide_format: SlideFormat,

    /// Zero-padding width of slide ordinals in file names. Range: 3–9. Default: 3.
    pub ordinal_width: usize,

    /// External PDF rasterizer. Default: `convert` (ImageMagick).
    pub rasterizer: ToolCommand,

    /// External in-place resizer used when `resize_width` is set. Default: `mogrify`.
    pub resizer: ToolCommand,

    /// External document converter. Default: `pandoc`.
    pub converter: ToolCommand,

    /// Per-subprocess timeout. Default: 600 s. `None` waits indefinitely.
    pub tool_timeout: Option<Duration>,

    /// Root under which the per-run working directory is created.
    /// Default: the system temp directory.
    pub temp_root: PathBuf,

    /// What happens to the working directory after the run. Default: [`CleanupPolicy::RetainOnFailure`].
    pub cleanup: CleanupPolicy,

    /// Optional observer for stage transitions.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: None,
            source_extension: "pdf".to_string(),
            formats: vec![OutputFormat::Odt],
            markup: MarkupFormat::default(),
            display_width: DisplayWidth::default(),
            resize_width: None,
            density: None,
            slide_format: SlideFormat::default(),
            ordinal_width: 3,
            rasterizer: ToolCommand::new("convert"),
            resizer: ToolCommand::new("mogrify"),
            converter: ToolCommand::new("pandoc"),
            tool_timeout: Some(Duration::from_secs(600)),
            temp_root: std::env::temp_dir(),
            cleanup: CleanupPolicy::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("source_extension", &self.source_extension)
            .field("formats", &self.formats)
            .field("markup", &self.markup)
            .field("display_width", &self.display_width)
            .field("resize_width", &self.resize_width)
            .field("density", &self.density)
            .field("slide_format", &self.slide_format)
            .field("ordinal_width", &self.ordinal_width)
            .field("rasterizer", &self.rasterizer)
            .field("resizer", &self.resizer)
            .field("converter", &self.converter)
            .field("tool_timeout", &self.tool_timeout)
            .field("temp_root", &self.temp_root)
            .field("cleanup", &self.cleanup)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// External programs that must be installed for this configuration.
    ///
    /// The resizer is only required when `resize_width` is set.
    pub fn required_binaries(&self) -> Vec<&str> {
        let mut tools = vec![self.rasterizer.program.as_str()];
        if self.resize_width.is_some() {
            tools.push(self.resizer.program.as_str());
        }
        tools.push(self.converter.program.as_str());
        tools
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = Some(dir.into());
        self
    }

    pub fn source_extension(mut self, ext: impl Into<String>) -> Self {
        let ext: String = ext.into();
        self.config.source_extension = ext.trim_start_matches('.').to_string();
        self
    }

    /// Set the target formats. Duplicates are dropped, first occurrence wins.
    pub fn formats(mut self, formats: Vec<OutputFormat>) -> Self {
        let mut unique = Vec::with_capacity(formats.len());
        for f in formats {
            if !unique.contains(&f) {
                unique.push(f);
            }
        }
        self.config.formats = unique;
        self
    }

    pub fn markup(mut self, markup: MarkupFormat) -> Self {
        self.config.markup = markup;
        self
    }

    pub fn display_width(mut self, width: DisplayWidth) -> Self {
        self.config.display_width = width;
        self
    }

    pub fn resize_width(mut self, px: u32) -> Self {
        self.config.resize_width = Some(px);
        self
    }

    pub fn density(mut self, dpi: u32) -> Self {
        self.config.density = Some(dpi.clamp(72, 600));
        self
    }

    pub fn slide_format(mut self, format: SlideFormat) -> Self {
        self.config.slide_format = format;
        self
    }

    pub fn ordinal_width(mut self, width: usize) -> Self {
        self.config.ordinal_width = width.clamp(3, 9);
        self
    }

    pub fn rasterizer(mut self, tool: ToolCommand) -> Self {
        self.config.rasterizer = tool;
        self
    }

    pub fn resizer(mut self, tool: ToolCommand) -> Self {
        self.config.resizer = tool;
        self
    }

    pub fn converter(mut self, tool: ToolCommand) -> Self {
        self.config.converter = tool;
        self
    }

    /// Per-subprocess timeout in seconds; `0` disables the timeout.
    pub fn tool_timeout_secs(mut self, secs: u64) -> Self {
        self.config.tool_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }

    pub fn tool_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.tool_timeout = timeout;
        self
    }

    pub fn temp_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_root = dir.into();
        self
    }

    pub fn cleanup(mut self, policy: CleanupPolicy) -> Self {
        self.config.cleanup = policy;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2NotesError> {
        let c = &self.config;
        if c.formats.is_empty() {
            return Err(Pdf2NotesError::InvalidConfig(
                "At least one output format is required".into(),
            ));
        }
        if c.source_extension.is_empty() {
            return Err(Pdf2NotesError::InvalidConfig(
                "Source extension must not be empty".into(),
            ));
        }
        if c.resize_width == Some(0) {
            return Err(Pdf2NotesError::InvalidConfig(
                "Resize width must be ≥ 1 px".into(),
            ));
        }
        if let DisplayWidth::Percent(p) = c.display_width {
            if p == 0 || p > 100 {
                return Err(Pdf2NotesError::InvalidConfig(format!(
                    "Display width must be 1–100%, got {p}%"
                )));
            }
        }
        if let DisplayWidth::Pixels(0) = c.display_width {
            return Err(Pdf2NotesError::InvalidConfig(
                "Display width must be ≥ 1 px".into(),
            ));
        }
        for tool in [&c.rasterizer, &c.resizer, &c.converter] {
            if tool.program.trim().is_empty() {
                return Err(Pdf2NotesError::InvalidConfig(
                    "Tool program names must not be empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

// ── Tool commands ────────────────────────────────────────────────────────

/// An external program plus arguments that precede the stage's own arguments.
///
/// Most of the time `base_args` is empty. It exists so a tool can be a
/// wrapper, e.g. `magick` + `["convert"]` on ImageMagick 7 or `sh` + a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: String,
    #[serde(default)]
    pub base_args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
        }
    }

    pub fn with_base_args<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            base_args: args.into_iter().map(Into::into).collect(),
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Final document formats the converter can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// OpenDocument Text (default).
    #[default]
    Odt,
    /// Office Open XML word-processing document.
    Docx,
    /// Rich Text Format.
    Rtf,
}

impl OutputFormat {
    /// Converter target identifier (`pandoc -t <id>`).
    pub fn converter_id(self) -> &'static str {
        match self {
            OutputFormat::Odt => "odt",
            OutputFormat::Docx => "docx",
            OutputFormat::Rtf => "rtf",
        }
    }

    /// Conventional file extension for the format.
    pub fn extension(self) -> &'static str {
        self.converter_id()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.converter_id())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = Pdf2NotesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "odt" => Ok(OutputFormat::Odt),
            "docx" => Ok(OutputFormat::Docx),
            "rtf" => Ok(OutputFormat::Rtf),
            other => Err(Pdf2NotesError::InvalidConfig(format!(
                "Unknown output format '{other}' (expected odt, docx or rtf)"
            ))),
        }
    }
}

/// Intermediate markup language written to the working directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupFormat {
    /// Pandoc Markdown pipe table (default).
    #[default]
    Markdown,
    /// Standalone HTML page with a `<table>`.
    Html,
}

impl MarkupFormat {
    /// Converter source identifier (`pandoc -f <id>`).
    pub fn converter_id(self) -> &'static str {
        match self {
            MarkupFormat::Markdown => "markdown",
            MarkupFormat::Html => "html",
        }
    }

    /// Extension of the `index` markup file.
    pub fn extension(self) -> &'static str {
        match self {
            MarkupFormat::Markdown => "md",
            MarkupFormat::Html => "html",
        }
    }
}

/// Width at which each slide is displayed in the generated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayWidth {
    /// Percentage of the available cell width (1–100).
    Percent(u8),
    /// Fixed width in pixels.
    Pixels(u32),
}

impl Default for DisplayWidth {
    fn default() -> Self {
        DisplayWidth::Percent(100)
    }
}

impl fmt::Display for DisplayWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayWidth::Percent(p) => write!(f, "{p}%"),
            DisplayWidth::Pixels(px) => write!(f, "{px}px"),
        }
    }
}

impl std::str::FromStr for DisplayWidth {
    type Err = Pdf2NotesError;

    /// Parse `"80%"`, `"640px"` or a bare pixel count like `"640"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || Pdf2NotesError::InvalidConfig(format!("Invalid display width '{s}'"));
        if let Some(p) = s.strip_suffix('%') {
            let p: u8 = p.trim().parse().map_err(|_| invalid())?;
            return Ok(DisplayWidth::Percent(p));
        }
        let px = s.strip_suffix("px").unwrap_or(s);
        let px: u32 = px.trim().parse().map_err(|_| invalid())?;
        Ok(DisplayWidth::Pixels(px))
    }
}

/// Raster format of the slide images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideFormat {
    /// JPEG (default): small files, fine for slide photos and gradients.
    #[default]
    Jpeg,
    /// PNG: lossless, crisper text on diagram-heavy decks.
    Png,
}

impl SlideFormat {
    pub fn extension(self) -> &'static str {
        match self {
            SlideFormat::Jpeg => "jpg",
            SlideFormat::Png => "png",
        }
    }
}

/// What to do with the per-run working directory once the run ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CleanupPolicy {
    /// Never remove it.
    RetainAlways,
    /// Remove it after a successful run, keep it after a failure (default).
    #[default]
    RetainOnFailure,
    /// Always remove it.
    RemoveAlways,
}

impl CleanupPolicy {
    /// Whether the working directory survives a run that ended with `succeeded`.
    pub fn should_retain(self, succeeded: bool) -> bool {
        match self {
            CleanupPolicy::RetainAlways => true,
            CleanupPolicy::RetainOnFailure => !succeeded,
            CleanupPolicy::RemoveAlways => false,
        }
    }
}
