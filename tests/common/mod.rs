//! Fixture recordings shared by the integration tests
#![allow(dead_code)]

use anyhow::Result;
use std::path::{Path, PathBuf};

use xdf_sync_check::loader::LoadOptions;
use xdf_sync_check::xdf::ChannelFormat;
use xdf_sync_check::xdf::writer::{SampleData, StreamHeader, XdfWriter};

pub const EEG_ID: u32 = 1;
pub const ECG_ID: u32 = 2;
pub const MARKER_ID: u32 = 3;

/// Marker events of the standard recording: (timestamp, label)
pub const MARKERS: [(f64, &str); 3] = [(10.5, "A"), (11.0, "B"), (11.5, "C")];

/// Timestamps kept exactly as recorded
pub fn raw_options() -> LoadOptions {
    LoadOptions {
        synchronize_clocks: false,
        dejitter_timestamps: false,
    }
}

pub fn eeg_header() -> StreamHeader {
    StreamHeader::new("EEG-Cap 1", "EEG", 2, 100.0, ChannelFormat::Float32).with_labels(&["C3", "C4"][..])
}

pub fn ecg_header() -> StreamHeader {
    StreamHeader::new("Polar ECG", "ECG", 1, 50.0, ChannelFormat::Double64)
}

pub fn marker_header(name: &str) -> StreamHeader {
    StreamHeader::new(name, "Markers", 1, 0.0, ChannelFormat::String)
}

/// `count` timestamps starting at `start`, spaced at `1 / srate`
pub fn regular_timestamps(start: f64, srate: f64, count: usize) -> Vec<Option<f64>> {
    (0..count).map(|i| Some(start + i as f64 / srate)).collect()
}

pub fn write_markers<W: std::io::Write>(
    writer: &mut XdfWriter<W>,
    stream_id: u32,
    markers: &[(f64, &str)],
) -> Result<()> {
    let timestamps: Vec<Option<f64>> = markers.iter().map(|&(t, _)| Some(t)).collect();
    let labels: Vec<String> = markers.iter().map(|&(_, l)| l.to_string()).collect();
    writer.write_samples(stream_id, 1, &timestamps, &SampleData::String(labels))?;
    Ok(())
}

/// EEG (2 labelled channels, 100 Hz, 200 samples from t = 10 s), an
/// unlabelled ECG (50 Hz, 100 samples) and the [`MARKERS`] stream.
///
/// EEG channel values are `row` and `-row`; ECG values are `row / 10`.
pub fn write_standard_recording(path: &Path) -> Result<PathBuf> {
    let mut writer = XdfWriter::create(path)?;
    writer.write_stream_header(EEG_ID, &eeg_header())?;
    writer.write_stream_header(ECG_ID, &ecg_header())?;
    writer.write_stream_header(MARKER_ID, &marker_header("Markers"))?;

    let eeg: Vec<f32> = (0..200).flat_map(|i| [i as f32, -(i as f32)]).collect();
    writer.write_samples(EEG_ID, 2, &regular_timestamps(10.0, 100.0, 200), &SampleData::Float32(eeg))?;

    let ecg: Vec<f64> = (0..100).map(|i| i as f64 / 10.0).collect();
    writer.write_samples(ECG_ID, 1, &regular_timestamps(10.0, 50.0, 100), &SampleData::Float64(ecg))?;

    write_markers(&mut writer, MARKER_ID, &MARKERS)?;
    writer.write_boundary()?;
    writer.write_stream_footer(EEG_ID, 10.0, 11.99, 200)?;
    writer.finish()?;
    Ok(path.to_path_buf())
}

/// Same data streams as [`write_standard_recording`], without marker stream
pub fn write_recording_without_markers(path: &Path) -> Result<PathBuf> {
    let mut writer = XdfWriter::create(path)?;
    writer.write_stream_header(EEG_ID, &eeg_header())?;
    writer.write_stream_header(ECG_ID, &ecg_header())?;

    let eeg: Vec<f32> = (0..10).flat_map(|i| [i as f32, 0.0]).collect();
    writer.write_samples(EEG_ID, 2, &regular_timestamps(10.0, 100.0, 10), &SampleData::Float32(eeg))?;
    let ecg: Vec<f64> = (0..5).map(|i| i as f64).collect();
    writer.write_samples(ECG_ID, 1, &regular_timestamps(10.0, 50.0, 5), &SampleData::Float64(ecg))?;
    writer.finish()?;
    Ok(path.to_path_buf())
}

/// Read a semicolon-separated CSV file into its header and rows
pub fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv::ReaderBuilder::new().delimiter(b';').from_path(path)?;
    let header = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok((header, rows))
}

/// Files directly inside `dir`, sorted by name
pub fn list_files(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    if dir.exists() {
        for entry in std::fs::read_dir(dir)? {
            names.push(entry?.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    Ok(names)
}
