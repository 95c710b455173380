//! End-to-end tests for pdf2notes.
//!
//! Most tests drive the whole pipeline with stand-in tools: small `sh`
//! scripts that behave like `convert`, `mogrify` and `pandoc` closely enough
//! for the orchestrator (numbered images, a copied "document"). They run
//! everywhere a POSIX shell exists.
//!
//! `test_real_tools_*` use the actual ImageMagick and pandoc binaries and are
//! gated behind the `E2E_ENABLED` environment variable:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture

#![cfg(unix)]

use pdf2notes::{
    convert, run_interactive, CancelToken, CleanupPolicy, Console, ConversionConfig,
    ConversionConfigBuilder, ConversionProgressCallback, OutputFormat, Pdf2NotesError,
    RunOutcome, SlideFormat, Stage, ToolCommand,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Input directory with one tiny PDF, plus an isolated temp root.
struct Fixture {
    input: TempDir,
    temp_root: TempDir,
}

impl Fixture {
    fn new() -> Self {
        init_tracing();
        let input = tempfile::tempdir().unwrap();
        std::fs::write(input.path().join("deck.pdf"), b"%PDF-1.4\n%%EOF\n").unwrap();
        Self {
            input,
            temp_root: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.input.path().join(name)
    }

    /// Builder with stand-in tools for a deck of `pages` slides.
    fn builder(&self, pages: u32) -> ConversionConfigBuilder {
        ConversionConfig::builder()
            .input_dir(self.input.path())
            .temp_root(self.temp_root.path())
            .rasterizer(fake_rasterizer(pages, None))
            .converter(fake_converter(None))
            .tool_timeout_secs(30)
    }

    fn working_dirs(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.temp_root.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect()
    }
}

/// Library logs show up with `RUST_LOG=pdf2notes=debug cargo test -- --nocapture`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Stand-in for `convert`: writes `pages` files named by the `%0Nd` pattern
/// in its last argument, copying `image` when given.
fn fake_rasterizer(pages: u32, image: Option<&Path>) -> ToolCommand {
    let write = match image {
        Some(p) => format!("cp '{}' \"$f\"", p.display()),
        None => ": > \"$f\"".to_string(),
    };
    let script = format!(
        r#"for last; do :; done
i=1
while [ "$i" -le {pages} ]; do
  f=$(printf "$last" "$i")
  {write}
  i=$((i+1))
done"#
    );
    ToolCommand::with_base_args("sh", ["-c".to_string(), script, "convert".to_string()])
}

/// Stand-in for `mogrify -resize W <dir>/*.<ext>`: overwrites every image
/// in the directory with `image`.
fn fake_resizer(image: &Path) -> ToolCommand {
    let script = format!(
        r#"dir=$(dirname "$3")
for f in "$dir"/*; do cp '{}' "$f"; done"#,
        image.display()
    );
    ToolCommand::with_base_args("sh", ["-c".to_string(), script, "mogrify".to_string()])
}

/// Stand-in for `pandoc -f M -t T -s -o OUT IN`: copies the markup to OUT,
/// failing for target format `fail_on`.
fn fake_converter(fail_on: Option<&str>) -> ToolCommand {
    let guard = match fail_on {
        Some(t) => format!("if [ \"$4\" = '{t}' ]; then echo \"unknown writer $4\" >&2; exit 64; fi\n"),
        None => String::new(),
    };
    let script = format!("{guard}cp \"$8\" \"$7\"");
    ToolCommand::with_base_args("sh", ["-c".to_string(), script, "pandoc".to_string()])
}

fn console(answers: &str) -> Console<&[u8], Vec<u8>> {
    Console::new(answers.as_bytes(), Vec::new())
}

fn slide_rows(doc: &str) -> Vec<&str> {
    doc.lines().filter(|l| l.starts_with("| ![](")).collect()
}

fn save_png(path: &Path, width: u32, height: u32) {
    image::RgbImage::new(width, height).save(path).unwrap();
}

#[derive(Default)]
struct Recorder {
    stages: Mutex<Vec<Stage>>,
    tools: Mutex<Vec<String>>,
    slides: Mutex<Option<usize>>,
}

impl ConversionProgressCallback for Recorder {
    fn on_stage(&self, stage: Stage) {
        self.stages.lock().unwrap().push(stage);
    }
    fn on_tool_start(&self, tool: &str) {
        self.tools.lock().unwrap().push(tool.to_string());
    }
    fn on_slides_ready(&self, count: usize) {
        *self.slides.lock().unwrap() = Some(count);
    }
}

// ── Interactive runs ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_two_slide_deck_to_odt() {
    let fx = Fixture::new();
    let config = fx.builder(2).build().unwrap();
    let mut console = console("0\n");

    let outcome = run_interactive(&config, &mut console, &CancelToken::new())
        .await
        .unwrap();
    let report = match outcome {
        RunOutcome::Completed(report) => report,
        other => panic!("expected Completed, got {other:?}"),
    };

    let printed = String::from_utf8(console.into_output()).unwrap();
    assert!(printed.contains("[0] deck.pdf"), "menu missing: {printed}");
    assert!(!printed.contains("already exists"));

    let doc = std::fs::read_to_string(fx.path("deck.odt")).unwrap();
    assert!(doc.starts_with("| Slide | Notes |\n| --- | --- |\n"));
    let rows = slide_rows(&doc);
    assert_eq!(rows.len(), 2);
    assert!(rows[0].contains("001.jpg"));
    assert!(rows[1].contains("002.jpg"));
    assert!(rows.iter().all(|r| r.ends_with("{ width=100% } |  |")));

    assert_eq!(report.stats.slide_count, 2);
    assert_eq!(report.outputs.len(), 1);
    assert_eq!(report.outputs[0].format, OutputFormat::Odt);
    assert!(!report.working_dir_retained);
    assert!(fx.working_dirs().is_empty(), "working dir should be removed");
}

#[tokio::test]
async fn test_declined_overwrite_touches_nothing() {
    let fx = Fixture::new();
    std::fs::write(fx.path("deck.odt"), b"my notes").unwrap();
    let config = fx.builder(2).build().unwrap();
    let mut console = console("0\nno\n");

    let outcome = run_interactive(&config, &mut console, &CancelToken::new())
        .await
        .unwrap();
    match outcome {
        RunOutcome::Declined { path } => assert_eq!(path, fx.path("deck.odt")),
        other => panic!("expected Declined, got {other:?}"),
    }

    assert_eq!(std::fs::read(fx.path("deck.odt")).unwrap(), b"my notes");
    assert!(fx.working_dirs().is_empty(), "no work may start after a decline");
    let printed = String::from_utf8(console.into_output()).unwrap();
    assert!(printed.contains("Do you want to overwrite the file? [yes/no]"));
}

#[tokio::test]
async fn test_confirmed_overwrite_replaces_output() {
    let fx = Fixture::new();
    std::fs::write(fx.path("deck.odt"), b"stale").unwrap();
    let config = fx.builder(3).build().unwrap();

    let outcome = run_interactive(&config, &mut console("0\nyes\n"), &CancelToken::new())
        .await
        .unwrap();
    assert!(matches!(outcome, RunOutcome::Completed(_)));

    let doc = std::fs::read_to_string(fx.path("deck.odt")).unwrap();
    assert_eq!(slide_rows(&doc).len(), 3);
}

#[tokio::test]
async fn test_missing_rasterizer_fails_before_menu() {
    let fx = Fixture::new();
    let config = fx
        .builder(1)
        .rasterizer(ToolCommand::new("pdf2notes-test-no-such-convert"))
        .build()
        .unwrap();
    let mut console = console("0\n");

    let err = run_interactive(&config, &mut console, &CancelToken::new())
        .await
        .unwrap_err();
    match err {
        Pdf2NotesError::MissingBinary { ref name } => {
            assert_eq!(name, "pdf2notes-test-no-such-convert")
        }
        ref other => panic!("expected MissingBinary, got {other:?}"),
    }
    assert!(err.to_string().contains("not installed"));
    assert!(console.into_output().is_empty());
    assert!(!fx.path("deck.odt").exists());
}

#[tokio::test]
async fn test_out_of_range_selection_is_rejected() {
    let fx = Fixture::new();
    let config = fx.builder(1).build().unwrap();
    let mut console = console("1\n");

    let err = run_interactive(&config, &mut console, &CancelToken::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Pdf2NotesError::SelectionOutOfRange { index: 1, count: 1 }
    ));
    let printed = String::from_utf8(console.into_output()).unwrap();
    assert!(printed.contains("Invalid input. Please try again."));
    assert!(fx.working_dirs().is_empty());
}

#[tokio::test]
async fn test_empty_directory_reports_no_files() {
    let fx = Fixture::new();
    std::fs::remove_file(fx.path("deck.pdf")).unwrap();
    let config = fx.builder(1).build().unwrap();
    let mut console = console("0\n");

    let err = run_interactive(&config, &mut console, &CancelToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Pdf2NotesError::NoInputFiles { .. }));
    let printed = String::from_utf8(console.into_output()).unwrap();
    assert!(printed.contains("No files available."));
}

#[tokio::test]
async fn test_stage_sequence_reported() {
    let fx = Fixture::new();
    let recorder = Arc::new(Recorder::default());
    let config = fx
        .builder(2)
        .formats(vec![OutputFormat::Odt, OutputFormat::Rtf])
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    run_interactive(&config, &mut console("0\n"), &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(
        *recorder.stages.lock().unwrap(),
        vec![
            Stage::BinariesChecked,
            Stage::FileSelected,
            Stage::OutputsGuarded,
            Stage::Rasterized,
            Stage::MarkupBuilt,
            Stage::DocumentBuilt,
            Stage::DocumentBuilt,
            Stage::Done,
        ]
    );
    assert_eq!(*recorder.tools.lock().unwrap(), vec!["sh", "sh", "sh"]);
    assert_eq!(*recorder.slides.lock().unwrap(), Some(2));
}

// ── Non-interactive conversion ───────────────────────────────────────────────

#[tokio::test]
async fn test_multiple_formats_into_output_dir() {
    let fx = Fixture::new();
    let out = tempfile::tempdir().unwrap();
    let out_dir = out.path().join("notes");
    let config = fx
        .builder(2)
        .formats(vec![OutputFormat::Odt, OutputFormat::Docx, OutputFormat::Odt])
        .output_dir(&out_dir)
        .build()
        .unwrap();

    let report = convert(fx.path("deck.pdf"), &config, &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(report.outputs.len(), 2, "duplicate formats collapse");
    assert!(out_dir.join("deck.odt").is_file());
    assert!(out_dir.join("deck.docx").is_file());
    assert!(!fx.path("deck.odt").exists());
}

#[tokio::test]
async fn test_non_pdf_source_rejected() {
    let fx = Fixture::new();
    std::fs::write(fx.path("fake.pdf"), b"hello").unwrap();
    let config = fx.builder(1).build().unwrap();

    let err = convert(fx.path("fake.pdf"), &config, &CancelToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Pdf2NotesError::NotAPdf { .. }));
}

#[tokio::test]
async fn test_html_markup_and_png_slides() {
    let fx = Fixture::new();
    let config = fx
        .builder(2)
        .markup(pdf2notes::MarkupFormat::Html)
        .slide_format(SlideFormat::Png)
        .display_width("300px".parse().unwrap())
        .cleanup(CleanupPolicy::RetainAlways)
        .build()
        .unwrap();

    let report = convert(fx.path("deck.pdf"), &config, &CancelToken::new())
        .await
        .unwrap();

    assert!(report.markup_path.ends_with("index.html"));
    assert!(report.working_dir_retained);
    assert!(report.slides.iter().all(|s| s.path.extension().unwrap() == "png"));

    let doc = std::fs::read_to_string(fx.path("deck.odt")).unwrap();
    assert_eq!(doc.matches("<tr>").count(), 2);
    assert!(doc.contains(r#"width="300""#));
}

// ── Resizing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_resize_width_verified() {
    let fx = Fixture::new();
    let assets = tempfile::tempdir().unwrap();
    let page = assets.path().join("page.png");
    let resized = assets.path().join("resized.png");
    save_png(&page, 160, 90);
    save_png(&resized, 64, 36);

    let config = fx
        .builder(2)
        .slide_format(SlideFormat::Png)
        .rasterizer(fake_rasterizer(2, Some(&page)))
        .resizer(fake_resizer(&resized))
        .resize_width(64)
        .cleanup(CleanupPolicy::RetainAlways)
        .build()
        .unwrap();

    let report = convert(fx.path("deck.pdf"), &config, &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(report.slides.len(), 2);
    // 160x90 scaled to width 64 keeps the 16:9 ratio.
    for slide in &report.slides {
        assert_eq!(image::image_dimensions(&slide.path).unwrap(), (64, 36));
    }
}

#[tokio::test]
async fn test_percent_in_source_and_temp_root() {
    let fx = Fixture::new();
    std::fs::write(fx.path("50%dOff.pdf"), b"%PDF-1.4\n%%EOF\n").unwrap();
    let temp_root = fx.temp_root.path().join("work%d");

    let config = fx
        .builder(2)
        .temp_root(&temp_root)
        .cleanup(CleanupPolicy::RetainAlways)
        .build()
        .unwrap();

    let report = convert(fx.path("50%dOff.pdf"), &config, &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(report.slides.len(), 2);
    assert!(report.working_dir.starts_with(&temp_root));
    assert!(report.slides.iter().all(|s| s.path.is_file()));

    let doc = std::fs::read_to_string(fx.path("50%dOff.odt")).unwrap();
    assert_eq!(slide_rows(&doc).len(), 2);
}

#[tokio::test]
async fn test_consecutive_runs_use_separate_working_dirs() {
    let fx = Fixture::new();
    let config = fx
        .builder(2)
        .cleanup(CleanupPolicy::RetainAlways)
        .build()
        .unwrap();

    let first = convert(fx.path("deck.pdf"), &config, &CancelToken::new())
        .await
        .unwrap();
    let second = convert(fx.path("deck.pdf"), &config, &CancelToken::new())
        .await
        .unwrap();

    assert_ne!(first.working_dir, second.working_dir);
    assert_eq!(fx.working_dirs().len(), 2);
    assert_eq!(second.slides.len(), 2);
}

#[tokio::test]
async fn test_resize_mismatch_is_an_error() {
    let fx = Fixture::new();
    let assets = tempfile::tempdir().unwrap();
    let page = assets.path().join("page.png");
    save_png(&page, 160, 90);

    // The resizer "succeeds" but leaves the images untouched.
    let config = fx
        .builder(1)
        .slide_format(SlideFormat::Png)
        .rasterizer(fake_rasterizer(1, Some(&page)))
        .resizer(ToolCommand::with_base_args("sh", ["-c", "exit 0", "mogrify"]))
        .resize_width(64)
        .build()
        .unwrap();

    let err = convert(fx.path("deck.pdf"), &config, &CancelToken::new())
        .await
        .unwrap_err();
    match err {
        Pdf2NotesError::ResizeMismatch {
            expected, actual, ..
        } => {
            assert_eq!(expected, 64);
            assert_eq!(actual, 160);
        }
        other => panic!("expected ResizeMismatch, got {other:?}"),
    }
    assert!(!fx.path("deck.odt").exists());
}

// ── Failures and cleanup ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_rasterizer_failure_keeps_working_dir_by_default() {
    let fx = Fixture::new();
    let config = fx
        .builder(1)
        .rasterizer(ToolCommand::with_base_args(
            "sh",
            ["-c", "echo 'no decode delegate' >&2; exit 1", "convert"],
        ))
        .build()
        .unwrap();

    let err = convert(fx.path("deck.pdf"), &config, &CancelToken::new())
        .await
        .unwrap_err();
    match err {
        Pdf2NotesError::ToolFailed { code, ref stderr, .. } => {
            assert_eq!(code, Some(1));
            assert!(stderr.contains("no decode delegate"));
        }
        ref other => panic!("expected ToolFailed, got {other:?}"),
    }
    assert_eq!(fx.working_dirs().len(), 1);
    assert!(!fx.path("deck.odt").exists());
}

#[tokio::test]
async fn test_remove_always_cleans_up_after_failure() {
    let fx = Fixture::new();
    let config = fx
        .builder(0)
        .cleanup(CleanupPolicy::RemoveAlways)
        .build()
        .unwrap();

    let err = convert(fx.path("deck.pdf"), &config, &CancelToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Pdf2NotesError::NoSlidesProduced { .. }));
    assert!(fx.working_dirs().is_empty());
}

#[tokio::test]
async fn test_converter_failure_keeps_earlier_outputs() {
    let fx = Fixture::new();
    let config = fx
        .builder(2)
        .formats(vec![OutputFormat::Odt, OutputFormat::Docx])
        .converter(fake_converter(Some("docx")))
        .build()
        .unwrap();

    let err = convert(fx.path("deck.pdf"), &config, &CancelToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Pdf2NotesError::ToolFailed { code: Some(64), .. }));
    assert!(fx.path("deck.odt").is_file(), "earlier output is not rolled back");
    assert!(!fx.path("deck.docx").exists());
}

#[tokio::test]
async fn test_cancelled_run_stops_rasterizer() {
    let fx = Fixture::new();
    let config = fx
        .builder(1)
        .rasterizer(ToolCommand::with_base_args("sh", ["-c", "sleep 30", "convert"]))
        .build()
        .unwrap();

    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let err = convert(fx.path("deck.pdf"), &config, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, Pdf2NotesError::Cancelled { .. }));
    assert!(started.elapsed() < std::time::Duration::from_secs(10));
}

#[tokio::test]
async fn test_report_is_json_serialisable() {
    let fx = Fixture::new();
    let config = fx.builder(2).build().unwrap();
    let report = convert(fx.path("deck.pdf"), &config, &CancelToken::new())
        .await
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["stats"]["slide_count"], 2);
    assert_eq!(json["outputs"][0]["format"], "odt");
    assert_eq!(json["slides"][1]["ordinal"], 2);
}

// ── Real tools (E2E_ENABLED) ─────────────────────────────────────────────────

/// Skip unless E2E_ENABLED is set and the real tools are on PATH.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run real-tool e2e tests");
            return;
        }
        for tool in ["convert", "mogrify", "pandoc"] {
            if which::which(tool).is_err() {
                println!("SKIP — {tool} not installed");
                return;
            }
        }
    }};
}

/// Let ImageMagick write a two-page PDF; `None` when its policy forbids PDF.
fn make_real_pdf(dir: &Path) -> Option<PathBuf> {
    let path = dir.join("deck.pdf");
    let status = std::process::Command::new("convert")
        .args(["-size", "320x240", "xc:white", "xc:gray"])
        .arg(&path)
        .status()
        .ok()?;
    (status.success() && path.is_file()).then_some(path)
}

#[tokio::test]
async fn test_real_tools_convert_to_odt_and_docx() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let Some(pdf) = make_real_pdf(dir.path()) else {
        println!("SKIP — ImageMagick cannot write PDF here");
        return;
    };

    let config = ConversionConfig::builder()
        .formats(vec![OutputFormat::Odt, OutputFormat::Docx])
        .resize_width(200)
        .build()
        .unwrap();
    let report = match convert(&pdf, &config, &CancelToken::new()).await {
        Ok(r) => r,
        Err(Pdf2NotesError::ToolFailed { ref stderr, .. }) if stderr.contains("policy") => {
            println!("SKIP — ImageMagick policy forbids reading PDF");
            return;
        }
        Err(e) => panic!("conversion failed: {e}"),
    };

    assert_eq!(report.slides.len(), 2);
    for output in &report.outputs {
        let bytes = std::fs::read(&output.path).unwrap();
        // ODT and DOCX are both zip containers.
        assert_eq!(&bytes[..2], b"PK", "{} is not a zip", output.path.display());
        println!("✓ {} ({} bytes)", output.path.display(), bytes.len());
    }
}
