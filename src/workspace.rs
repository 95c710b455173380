//! The per-run working set: a directory holding the slide images and the
//! intermediate markup file.
//!
//! ```text
//! <temp-root>/<source-file-name>-<unix-timestamp>/
//!     index.md          (or index.html)
//!     images/001.jpg
//!     images/002.jpg
//!     …
//! ```
//!
//! The directory is named from the source and the start time. Characters
//! the external tools would treat as pattern syntax (`%`, `*`, `[`, `|`, …)
//! are replaced with `_`, and a `-N` suffix is added when a run started in
//! the same second already owns the name. What happens to it afterwards is
//! decided by
//! [`CleanupPolicy`](crate::config::CleanupPolicy), not by `Drop`, so a
//! failed run can be inspected.

use crate::config::{CleanupPolicy, MarkupFormat};
use crate::error::Pdf2NotesError;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Give up after this many name collisions within one second.
const MAX_NAME_ATTEMPTS: u32 = 100;

/// Paths of one run's working directory.
#[derive(Debug, Clone)]
pub struct WorkingSet {
    root: PathBuf,
    images_dir: PathBuf,
    markup_path: PathBuf,
}

impl WorkingSet {
    /// Compute the working-set paths without touching the filesystem.
    pub fn plan(temp_root: &Path, source: &Path, markup: MarkupFormat, unix_secs: u64) -> Self {
        Self::at(temp_root, source, markup, unix_secs, 0)
    }

    /// Paths for the `attempt`-th candidate name; attempt 0 has no suffix.
    fn at(temp_root: &Path, source: &Path, markup: MarkupFormat, unix_secs: u64, attempt: u32) -> Self {
        let name = source
            .file_name()
            .map(|n| sanitize_name(&n.to_string_lossy()))
            .unwrap_or_else(|| "slides".to_string());
        let dir = match attempt {
            0 => format!("{name}-{unix_secs}"),
            n => format!("{name}-{unix_secs}-{n}"),
        };
        let root = temp_root.join(dir);
        Self {
            images_dir: root.join("images"),
            markup_path: root.join(format!("index.{}", markup.extension())),
            root,
        }
    }

    /// Create a fresh working directory for `source`, named after the current time.
    ///
    /// The directory is never shared with another run: an existing name gets
    /// a numeric suffix instead of being reused. Only the root is created
    /// here; the rasterizer creates `images/`. A relative `temp_root` is made
    /// absolute first.
    pub fn create(
        temp_root: &Path,
        source: &Path,
        markup: MarkupFormat,
    ) -> Result<Self, Pdf2NotesError> {
        // The converter resolves image paths from its own working directory.
        let temp_root = std::path::absolute(temp_root).map_err(|source| {
            Pdf2NotesError::CreateDirFailed {
                path: temp_root.to_path_buf(),
                source,
            }
        })?;
        let unix_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        std::fs::create_dir_all(&temp_root).map_err(|source| Pdf2NotesError::CreateDirFailed {
            path: temp_root.clone(),
            source,
        })?;

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let set = Self::at(&temp_root, source, markup, unix_secs, attempt);
            match std::fs::create_dir(&set.root) {
                Ok(()) => {
                    debug!("Working set: {}", set.root.display());
                    return Ok(set);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!("{} already taken", set.root.display());
                }
                Err(source) => {
                    return Err(Pdf2NotesError::CreateDirFailed {
                        path: set.root,
                        source,
                    })
                }
            }
        }

        Err(Pdf2NotesError::CreateDirFailed {
            path: Self::plan(&temp_root, source, markup, unix_secs).root,
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{MAX_NAME_ATTEMPTS} working directories already exist for this second"),
            ),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    pub fn markup_path(&self) -> &Path {
        &self.markup_path
    }

    /// Apply `policy` for a run that ended with `succeeded`.
    ///
    /// Returns whether the directory was kept.
    pub fn finish(&self, policy: CleanupPolicy, succeeded: bool) -> Result<bool, Pdf2NotesError> {
        if policy.should_retain(succeeded) {
            if succeeded {
                debug!("Keeping working directory {}", self.root.display());
            } else {
                warn!(
                    "Run failed; intermediate files kept in {}",
                    self.root.display()
                );
            }
            return Ok(true);
        }

        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => {
                info!("Removed working directory {}", self.root.display());
                Ok(false)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(Pdf2NotesError::RemoveFailed {
                path: self.root.clone(),
                source,
            }),
        }
    }
}

/// Keep letters, digits, `.`, `-` and `_`; everything else becomes `_`.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
