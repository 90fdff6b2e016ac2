//! CSV export of aligned tables

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::table::AlignedTable;
use crate::xdf::ChannelFormat;

/// Field separator of exported tables
pub const CSV_DELIMITER: u8 = b';';

/// Output path of a stream's aligned table
pub fn csv_path(output_dir: &Path, stream_name: &str) -> PathBuf {
    output_dir.join(format!("{}_with_Markers.csv", stream_name))
}

/// Write an aligned table as `<stream>_with_Markers.csv` into `output_dir`.
///
/// The directory must already exist.
pub fn write_aligned_csv(table: &AlignedTable, output_dir: &Path) -> Result<PathBuf> {
    let path = csv_path(output_dir, &table.name);
    let mut writer = csv::WriterBuilder::new()
        .delimiter(CSV_DELIMITER)
        .from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer.write_record(table.header())?;

    let channels = table.columns.len();
    let mut record: Vec<String> = Vec::with_capacity(channels + 2);
    for row in 0..table.len() {
        record.clear();
        for col in 0..channels {
            record.push(table.samples.cell(row, col, table.channel_format));
        }
        record.push(ChannelFormat::Double64.format_value(table.timestamps[row]));
        record.push(table.markers[row].clone().unwrap_or_default());
        writer.write_record(&record)?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
