//! Stream loader: XDF file -> labelled data tables and the marker table

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::sync;
use crate::table::{DataTable, MarkerTable, StreamTables};
use crate::xdf::{self, TimeSeries, XdfError, XdfStream};

/// Label given to channels without a declared label
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Type reported for streams without a declared type
pub const UNKNOWN_TYPE: &str = "Unknown type";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt XDF container: {0}")]
    Container(#[from] XdfError),

    #[error("marker stream '{stream}' has {channels} channels (expected 1)")]
    MarkerChannels { stream: String, channels: usize },

    #[error("stream '{stream}' declares {labels} channel labels for {channels} channels")]
    LabelMismatch {
        stream: String,
        labels: usize,
        channels: usize,
    },
}

/// Options for decoding timestamps
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub synchronize_clocks: bool,
    pub dejitter_timestamps: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            synchronize_clocks: true,
            dejitter_timestamps: true,
        }
    }
}

/// Everything the pipeline needs from one XDF file
#[derive(Debug, Clone, Default)]
pub struct Recording {
    pub streams: StreamTables,
    pub markers: Option<MarkerTable>,
}

impl Recording {
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty() && self.markers.is_none()
    }
}

/// Filesystem-friendly stream name, or a positional fallback
pub fn sanitize_stream_name(name: Option<&str>, index: usize) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => name.replace([' ', '-'], "_"),
        None => format!("Unnamed_stream_{}", index),
    }
}

pub fn is_marker_type(stream_type: &str) -> bool {
    stream_type.contains("Markers")
}

/// Resolve the column labels of a data stream.
///
/// Channels without a label become `Unknown`; a stream without channel
/// descriptors gets `Unknown` for every channel. ECG streams without any real
/// label are named `ECG` (or `ECG_1..n` for several channels).
pub fn channel_labels(stream: &XdfStream, stream_name: &str, stream_type: &str) -> Result<Vec<String>, LoadError> {
    let channels = stream.info.channel_count;
    let mut labels: Vec<String> = match stream.info.channel_labels() {
        Some(declared) => declared
            .into_iter()
            .map(|l| l.unwrap_or_else(|| UNKNOWN_LABEL.to_string()))
            .collect(),
        None => vec![UNKNOWN_LABEL.to_string(); channels],
    };

    if labels.len() != channels {
        return Err(LoadError::LabelMismatch {
            stream: stream_name.to_string(),
            labels: labels.len(),
            channels,
        });
    }

    if stream_type.contains("ECG") && labels.iter().all(|l| l == UNKNOWN_LABEL) {
        labels = if channels == 1 {
            vec!["ECG".to_string()]
        } else {
            (1..=channels).map(|i| format!("ECG_{}", i)).collect()
        };
    }

    Ok(labels)
}

fn marker_table(stream: XdfStream, stream_name: String) -> Result<MarkerTable, LoadError> {
    if stream.info.channel_count != 1 {
        return Err(LoadError::MarkerChannels {
            stream: stream_name,
            channels: stream.info.channel_count,
        });
    }

    let format = stream.info.channel_format;
    let values = match &stream.time_series {
        TimeSeries::Text(a) => a.column(0).to_vec(),
        TimeSeries::Numeric(a) => a.column(0).iter().map(|&v| format.format_value(v)).collect(),
        TimeSeries::Integer(a) => a.column(0).iter().map(i64::to_string).collect(),
    };

    Ok(MarkerTable {
        name: stream_name,
        values,
        timestamps: stream.time_stamps,
    })
}

/// Turn decoded XDF streams into data tables and the marker table
pub fn tables_from_streams(streams: Vec<XdfStream>) -> Result<Recording, LoadError> {
    let mut recording = Recording::default();

    for (index, stream) in streams.into_iter().enumerate() {
        let stream_type = stream
            .info
            .stream_type
            .clone()
            .unwrap_or_else(|| UNKNOWN_TYPE.to_string());
        let stream_name = sanitize_stream_name(stream.info.name.as_deref(), index);
        tracing::info!("Processing stream {}: {} ({})", index + 1, stream_name, stream_type);

        if is_marker_type(&stream_type) {
            let markers = marker_table(stream, stream_name)?;
            tracing::info!(
                "Markers table created for {} with {} entries.",
                markers.name,
                markers.len()
            );
            if let Some(previous) = recording.markers.replace(markers) {
                tracing::warn!(
                    "Multiple marker streams found; '{}' replaced by the later stream",
                    previous.name
                );
            }
        } else {
            let columns = channel_labels(&stream, &stream_name, &stream_type)?;
            tracing::info!(
                "Data table created for {} with {} entries and columns: {:?}.",
                stream_name,
                stream.sample_count(),
                columns
            );
            let table = DataTable {
                name: stream_name,
                stream_type,
                columns,
                channel_format: stream.info.channel_format,
                samples: stream.time_series,
                timestamps: stream.time_stamps,
            };
            if let Some(previous) = recording.streams.insert(table) {
                tracing::warn!("Duplicate stream name '{}': later stream kept", previous.name);
            }
        }
    }

    Ok(recording)
}

/// Load an XDF file into per-stream tables.
///
/// Any failure aborts the whole load; no partial results are returned.
pub fn load_recording<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Recording, LoadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file = xdf::read_xdf_bytes(&bytes)?;
    tracing::info!("Data successfully loaded from {}", path.display());

    if file.streams.is_empty() {
        tracing::warn!("No data streams found in the file.");
        return Ok(Recording::default());
    }

    let mut streams = file.streams;
    for stream in streams.iter_mut() {
        if options.synchronize_clocks {
            sync::synchronize_clocks(stream);
        }
        if options.dejitter_timestamps {
            sync::dejitter_timestamps(stream);
        }
    }

    tables_from_streams(streams)
}
