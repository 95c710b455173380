//! Pipeline stages for slide-deck-to-notes conversion.
//!
//! Each submodule implements exactly one step and returns a `Result`;
//! sequencing, progress and cleanup live in [`crate::convert`].
//!
//! ## Data Flow
//!
//! ```text
//! binaries ──▶ input ──▶ guard ──▶ rasterize ──▶ markup ──▶ build
//! (PATH)      (menu)    (yes/no)   (convert)     (table)    (pandoc)
//! ```
//!
//! 1. [`binaries`]  - fail fast when a required tool is not on `PATH`
//! 2. [`input`]     - list candidate PDFs and read the user's choice
//! 3. [`guard`]     - ask before replacing an existing output document
//! 4. [`rasterize`] - one numbered image per page, optionally resized
//! 5. [`markup`]    - a two-column slide/notes table referencing the images
//! 6. [`build`]     - hand the markup to the document converter
//!
//! [`process`] is the shared subprocess runner (timeout + cancellation)
//! used by the three tool-driving stages.

pub mod binaries;
pub mod build;
pub mod guard;
pub mod input;
pub mod markup;
pub mod process;
pub mod rasterize;
