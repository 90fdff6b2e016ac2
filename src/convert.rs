//! The conversion pipeline: load, align, write

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::export::write_aligned_csv;
use crate::loader::{LoadOptions, load_recording};
use crate::merger::align_to_markers;
use crate::table::{MarkerTable, StreamTables};

/// Result of converting one XDF file
#[derive(Debug, Clone, Default)]
pub struct Conversion {
    pub streams: StreamTables,
    pub markers: Option<MarkerTable>,
    pub written: Vec<PathBuf>,
}

impl Conversion {
    /// True when both data streams and a marker table are available for plotting
    pub fn is_plottable(&self) -> bool {
        !self.streams.is_empty() && self.markers.is_some()
    }
}

/// Convert an XDF file into one marker-aligned CSV per data stream.
///
/// A file that cannot be loaded is logged and yields an empty result. A file
/// without marker stream yields an empty result as well and writes nothing.
/// Errors are only returned for failures while writing the CSV files.
pub fn convert_xdf_to_csv(file_path: &Path, output_folder: &Path, options: &LoadOptions) -> Result<Conversion> {
    let recording = match load_recording(file_path, options) {
        Ok(recording) => recording,
        Err(e) => {
            tracing::error!("An error occurred while loading {}: {}", file_path.display(), e);
            return Ok(Conversion::default());
        }
    };

    let Some(markers) = recording.markers else {
        if !recording.streams.is_empty() {
            tracing::warn!(
                "No marker stream in {}; {} data stream(s) not exported",
                file_path.display(),
                recording.streams.len()
            );
        }
        return Ok(Conversion::default());
    };

    let mut written = Vec::with_capacity(recording.streams.len());
    for table in &recording.streams {
        let aligned = align_to_markers(table, &markers);
        let path = write_aligned_csv(&aligned, output_folder)?;
        tracing::info!("{} data merged with markers and saved to {}", table.name, path.display());
        written.push(path);
    }

    Ok(Conversion {
        streams: recording.streams,
        markers: Some(markers),
        written,
    })
}
