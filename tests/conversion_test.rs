mod common;

use anyhow::Result;
use tempfile::tempdir;

use common::*;
use xdf_sync_check::convert_xdf_to_csv;
use xdf_sync_check::export::csv_path;
use xdf_sync_check::loader::{self, LoadError, LoadOptions};
use xdf_sync_check::xdf::ChannelFormat;
use xdf_sync_check::xdf::writer::{SampleData, StreamHeader, XdfWriter};

#[test]
fn test_one_csv_per_data_stream() -> Result<()> {
    let dir = tempdir()?;
    let xdf = write_standard_recording(&dir.path().join("rec.xdf"))?;
    let out = dir.path().join("out");
    std::fs::create_dir(&out)?;

    let conversion = convert_xdf_to_csv(&xdf, &out, &raw_options())?;

    assert_eq!(conversion.streams.len(), 2);
    assert_eq!(conversion.written.len(), 2);
    assert!(conversion.is_plottable());
    assert_eq!(
        list_files(&out)?,
        vec!["EEG_Cap_1_with_Markers.csv", "Polar_ECG_with_Markers.csv"]
    );
    Ok(())
}

#[test]
fn test_csv_columns_are_channels_plus_timestamp_and_marker() -> Result<()> {
    let dir = tempdir()?;
    let xdf = write_standard_recording(&dir.path().join("rec.xdf"))?;

    convert_xdf_to_csv(&xdf, dir.path(), &raw_options())?;

    let (header, rows) = read_csv(&csv_path(dir.path(), "EEG_Cap_1"))?;
    assert_eq!(header, vec!["C3", "C4", "Timestamp", "Marker"]);
    assert_eq!(rows.len(), 200);
    assert!(rows.iter().all(|row| row.len() == 4));
    Ok(())
}

#[test]
fn test_unlabelled_ecg_gets_ecg_column() -> Result<()> {
    let dir = tempdir()?;
    let xdf = write_standard_recording(&dir.path().join("rec.xdf"))?;

    convert_xdf_to_csv(&xdf, dir.path(), &raw_options())?;

    let (header, rows) = read_csv(&csv_path(dir.path(), "Polar_ECG"))?;
    assert_eq!(header, vec!["ECG", "Timestamp", "Marker"]);
    assert_eq!(rows.len(), 100);
    assert_eq!(rows[3][0], "0.3");
    Ok(())
}

#[test]
fn test_rows_carry_nearest_marker() -> Result<()> {
    let dir = tempdir()?;
    let xdf = write_standard_recording(&dir.path().join("rec.xdf"))?;

    convert_xdf_to_csv(&xdf, dir.path(), &raw_options())?;
    let (_, rows) = read_csv(&csv_path(dir.path(), "EEG_Cap_1"))?;

    // Before the first marker
    assert_eq!(rows[0][3], "A");
    assert_eq!(rows[0][2], "10.0");
    // Exactly between A (10.5) and B (11.0): the earlier marker wins
    assert_eq!(rows[75][2], "10.75");
    assert_eq!(rows[75][3], "A");
    assert_eq!(rows[75][0], "75.0");
    assert_eq!(rows[75][1], "-75.0");
    assert_eq!(rows[76][3], "B");
    // After the last marker
    assert_eq!(rows[199][3], "C");
    Ok(())
}

#[test]
fn test_header_row_is_semicolon_separated() -> Result<()> {
    let dir = tempdir()?;
    let xdf = write_standard_recording(&dir.path().join("rec.xdf"))?;

    convert_xdf_to_csv(&xdf, dir.path(), &raw_options())?;

    let text = std::fs::read_to_string(csv_path(dir.path(), "EEG_Cap_1"))?;
    let first_line = text.lines().next().unwrap_or_default();
    assert_eq!(first_line, "C3;C4;Timestamp;Marker");
    Ok(())
}

#[test]
fn test_without_markers_nothing_is_written() -> Result<()> {
    let dir = tempdir()?;
    let xdf = write_recording_without_markers(&dir.path().join("rec.xdf"))?;
    let out = dir.path().join("out");
    std::fs::create_dir(&out)?;

    let conversion = convert_xdf_to_csv(&xdf, &out, &raw_options())?;

    assert!(conversion.streams.is_empty());
    assert!(conversion.markers.is_none());
    assert!(conversion.written.is_empty());
    assert!(!conversion.is_plottable());
    assert!(list_files(&out)?.is_empty());
    Ok(())
}

#[test]
fn test_corrupt_file_yields_empty_result() -> Result<()> {
    let dir = tempdir()?;
    let xdf = dir.path().join("broken.xdf");
    std::fs::write(&xdf, b"this is not an xdf file")?;
    let out = dir.path().join("out");
    std::fs::create_dir(&out)?;

    let conversion = convert_xdf_to_csv(&xdf, &out, &LoadOptions::default())?;

    assert!(conversion.streams.is_empty());
    assert!(conversion.markers.is_none());
    assert!(list_files(&out)?.is_empty());
    Ok(())
}

#[test]
fn test_missing_file_yields_empty_result() -> Result<()> {
    let dir = tempdir()?;

    let conversion = convert_xdf_to_csv(&dir.path().join("absent.xdf"), dir.path(), &LoadOptions::default())?;

    assert!(conversion.streams.is_empty());
    assert!(conversion.written.is_empty());
    assert!(!conversion.is_plottable());
    assert!(list_files(dir.path())?.is_empty());
    Ok(())
}

#[test]
fn test_huge_channel_count_yields_empty_result() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("huge.xdf");
    let mut writer = XdfWriter::create(&path)?;
    writer.write_stream_header(1, &marker_header("Markers"))?;
    writer.write_stream_header(2, &StreamHeader::new("EEG", "EEG", 1usize << 62, 100.0, ChannelFormat::Float32))?;
    write_markers(&mut writer, 1, &MARKERS)?;
    writer.finish()?;
    let out = dir.path().join("out");
    std::fs::create_dir(&out)?;

    let conversion = convert_xdf_to_csv(&path, &out, &raw_options())?;

    assert!(conversion.streams.is_empty());
    assert!(conversion.markers.is_none());
    assert!(list_files(&out)?.is_empty());
    Ok(())
}

#[test]
fn test_integer_values_are_exported_exactly() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("counter.xdf");
    let mut writer = XdfWriter::create(&path)?;
    writer.write_stream_header(1, &marker_header("Markers"))?;
    writer.write_stream_header(
        2,
        &StreamHeader::new("Counter", "Misc", 3, 1.0, ChannelFormat::Int64).with_labels(&["a", "b", "c"][..]),
    )?;
    writer.write_stream_header(
        3,
        &StreamHeader::new("Status", "Misc", 2, 1.0, ChannelFormat::Int8).with_labels(&["lo", "hi"][..]),
    )?;
    write_markers(&mut writer, 1, &[(0.0, "start")])?;
    writer.write_samples(
        2,
        3,
        &[Some(0.0)],
        &SampleData::Int64(vec![9007199254740993, i64::MIN, i64::MAX]),
    )?;
    writer.write_samples(3, 2, &[Some(0.0)], &SampleData::Int8(vec![i8::MIN, i8::MAX]))?;
    writer.finish()?;

    convert_xdf_to_csv(&path, dir.path(), &raw_options())?;

    let (_, counter) = read_csv(&csv_path(dir.path(), "Counter"))?;
    assert_eq!(
        counter[0][..3],
        ["9007199254740993", "-9223372036854775808", "9223372036854775807"]
    );
    let (_, status) = read_csv(&csv_path(dir.path(), "Status"))?;
    assert_eq!(status[0][..2], ["-128", "127"]);
    assert_eq!(status[0][3], "start");
    Ok(())
}

#[test]
fn test_last_marker_stream_wins() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("two_markers.xdf");
    let mut writer = XdfWriter::create(&path)?;
    writer.write_stream_header(1, &marker_header("First Markers"))?;
    writer.write_stream_header(2, &eeg_header())?;
    writer.write_stream_header(3, &marker_header("Second Markers"))?;
    write_markers(&mut writer, 1, &[(10.0, "first")])?;
    writer.write_samples(2, 2, &regular_timestamps(10.0, 100.0, 3), &SampleData::Float32(vec![0.0; 6]))?;
    write_markers(&mut writer, 3, &[(10.0, "second")])?;
    writer.finish()?;

    let recording = loader::load_recording(&path, &raw_options())?;
    let markers = recording.markers.expect("marker table");
    assert_eq!(markers.name, "Second_Markers");
    assert_eq!(markers.values, vec!["second"]);

    let conversion = convert_xdf_to_csv(&path, dir.path(), &raw_options())?;
    let (_, rows) = read_csv(&conversion.written[0])?;
    assert!(rows.iter().all(|row| row[3] == "second"));
    Ok(())
}

#[test]
fn test_unnamed_stream_gets_positional_name() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("unnamed.xdf");
    let mut unnamed = StreamHeader::new("", "EMG", 1, 10.0, ChannelFormat::Int16);
    unnamed.name = None;

    let mut writer = XdfWriter::create(&path)?;
    writer.write_stream_header(1, &marker_header("Markers"))?;
    writer.write_stream_header(2, &unnamed)?;
    write_markers(&mut writer, 1, &[(0.0, "go")])?;
    writer.write_samples(2, 1, &regular_timestamps(0.0, 10.0, 4), &SampleData::Int16(vec![1, 2, 3, 4]))?;
    writer.finish()?;

    let conversion = convert_xdf_to_csv(&path, dir.path(), &raw_options())?;

    assert_eq!(conversion.streams.names().collect::<Vec<_>>(), vec!["Unnamed_stream_1"]);
    let (header, rows) = read_csv(&csv_path(dir.path(), "Unnamed_stream_1"))?;
    assert_eq!(header, vec!["Unknown", "Timestamp", "Marker"]);
    assert_eq!(rows[2][0], "3");
    Ok(())
}

#[test]
fn test_marker_stream_with_two_channels_is_rejected() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("wide_markers.xdf");
    let mut writer = XdfWriter::create(&path)?;
    writer.write_stream_header(1, &StreamHeader::new("Markers", "Markers", 2, 0.0, ChannelFormat::String))?;
    writer.write_stream_header(2, &eeg_header())?;
    writer.finish()?;

    let result = loader::load_recording(&path, &raw_options());
    assert!(matches!(result, Err(LoadError::MarkerChannels { channels: 2, .. })));

    let conversion = convert_xdf_to_csv(&path, dir.path(), &raw_options())?;
    assert!(conversion.streams.is_empty());
    Ok(())
}

#[test]
fn test_stream_without_samples_exports_header_only() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("silent.xdf");
    let mut writer = XdfWriter::create(&path)?;
    writer.write_stream_header(1, &eeg_header())?;
    writer.write_stream_header(2, &marker_header("Markers"))?;
    write_markers(&mut writer, 2, &MARKERS)?;
    writer.finish()?;

    let conversion = convert_xdf_to_csv(&path, dir.path(), &raw_options())?;

    assert_eq!(conversion.written.len(), 1);
    let (header, rows) = read_csv(&conversion.written[0])?;
    assert_eq!(header.len(), 4);
    assert!(rows.is_empty());
    Ok(())
}
