//! Packaging selected frames into a zip archive.
//!
//! Selected frames are numbered from 1 in display order and stored under
//! fixed-width, zero-padded names (`frame_01.jpg`, `frame_02.jpg`, ...) so
//! that lexical and numeric order agree. Stills are written verbatim,
//! without re-encoding or compression.
//!
//! # Example
//!
//! ```
//! use stillpick::ExportOptions;
//! use stillpick::export::entry_name;
//!
//! let options = ExportOptions::new();
//! assert_eq!(entry_name(3, 5, &options), "frame_03.jpg");
//! assert_eq!(entry_name(7, 120, &options), "frame_007.jpg");
//! ```

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::StillpickError;
use crate::frame::Frame;

/// Naming settings for archive entries.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct ExportOptions {
    /// Text before the index, e.g. `"frame"`.
    pub prefix: String,
    /// File extension without the dot, e.g. `"jpg"`.
    pub extension: String,
    /// Minimum number of digits in the index.
    pub min_index_width: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportOptions {
    /// `frame_NN.jpg` naming with two-digit minimum padding.
    pub fn new() -> Self {
        Self {
            prefix: "frame".to_string(),
            extension: "jpg".to_string(),
            min_index_width: 2,
        }
    }

    /// Set the entry prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the entry extension. A leading dot is ignored.
    pub fn with_extension(mut self, extension: impl AsRef<str>) -> Self {
        self.extension = extension.as_ref().trim_start_matches('.').to_string();
        self
    }

    /// Set the minimum index width. Clamped to at least 1.
    pub fn with_min_index_width(mut self, width: usize) -> Self {
        self.min_index_width = width.max(1);
        self
    }
}

/// Digits used for indices in an archive of `count` entries.
pub fn index_width(count: usize, options: &ExportOptions) -> usize {
    let digits = count.max(1).to_string().len();
    digits.max(options.min_index_width)
}

/// Name of the entry at 1-based `index` in an archive of `count` entries.
pub fn entry_name(index: usize, count: usize, options: &ExportOptions) -> String {
    let width = index_width(count, options);
    format!(
        "{}_{index:0width$}.{}",
        options.prefix, options.extension
    )
}

/// Build an archive of the selected frames, in the order given.
///
/// # Errors
///
/// - [`StillpickError::NothingSelected`] if no frame is selected.
/// - [`StillpickError::ArchiveBuild`] if the archive writer fails; no
///   partial archive is returned.
pub fn export<'a, I>(frames: I, options: &ExportOptions) -> Result<Vec<u8>, StillpickError>
where
    I: IntoIterator<Item = &'a Frame>,
{
    let selected: Vec<&Frame> = frames.into_iter().filter(|frame| frame.is_selected()).collect();
    if selected.is_empty() {
        return Err(StillpickError::NothingSelected);
    }

    log::debug!("Packaging {} selected frame(s)", selected.len());

    // Fixed timestamps keep identical selections byte-identical.
    let entry_options = || {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .last_modified_time(DateTime::default())
    };

    let count = selected.len();
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (position, frame) in selected.into_iter().enumerate() {
        let name = entry_name(position + 1, count, options);
        writer.start_file(name, entry_options())?;
        writer
            .write_all(frame.raster())
            .map_err(|error| StillpickError::ArchiveBuild(error.to_string()))?;
    }

    let archive = writer.finish()?.into_inner();
    log::info!("Built archive of {count} frame(s), {} bytes", archive.len());
    Ok(archive)
}

/// Build the archive and write it to `path` in one go.
///
/// Nothing is written when building fails.
///
/// # Errors
///
/// Errors from [`export`], or [`StillpickError::IoError`] if the file
/// cannot be written.
pub fn export_to_file<'a, I, P>(
    frames: I,
    options: &ExportOptions,
    path: P,
) -> Result<usize, StillpickError>
where
    I: IntoIterator<Item = &'a Frame>,
    P: AsRef<Path>,
{
    let archive = export(frames, options)?;
    fs::write(path.as_ref(), &archive)?;
    Ok(archive.len())
}
