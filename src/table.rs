//! In-memory tables produced by the loader and the aligner

use crate::xdf::{ChannelFormat, TimeSeries};

/// Header of the timestamp column in exported tables
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

/// Header of the marker column in exported tables
pub const MARKER_COLUMN: &str = "Marker";

/// One non-marker stream: labelled channels plus a timestamp per sample
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    pub name: String,
    pub stream_type: String,
    pub columns: Vec<String>,
    pub channel_format: ChannelFormat,
    pub samples: TimeSeries,
    pub timestamps: Vec<f64>,
}

impl DataTable {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

/// The marker stream: one value per event plus its timestamp
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerTable {
    pub name: String,
    pub values: Vec<String>,
    pub timestamps: Vec<f64>,
}

impl MarkerTable {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// A data table merged with the nearest marker of every sample.
///
/// Rows are sorted ascending by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedTable {
    pub name: String,
    pub columns: Vec<String>,
    pub channel_format: ChannelFormat,
    pub samples: TimeSeries,
    pub timestamps: Vec<f64>,
    pub markers: Vec<Option<String>>,
}

impl AlignedTable {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Full header row: channel labels, `Timestamp`, `Marker`
    pub fn header(&self) -> Vec<String> {
        let mut header = self.columns.clone();
        header.push(TIMESTAMP_COLUMN.to_string());
        header.push(MARKER_COLUMN.to_string());
        header
    }

    /// Numeric values of one channel, `None` for text streams
    pub fn numeric_column(&self, index: usize) -> Option<Vec<f64>> {
        self.samples.float_column(index)
    }

    /// Drop the marker column, keeping the sorted samples as a data table
    pub fn into_data_table(self, stream_type: &str) -> DataTable {
        DataTable {
            name: self.name,
            stream_type: stream_type.to_string(),
            columns: self.columns,
            channel_format: self.channel_format,
            samples: self.samples,
            timestamps: self.timestamps,
        }
    }
}

/// Ordered mapping from stream name to data table.
///
/// Iteration follows insertion order. Inserting a name that is already
/// present replaces that table in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamTables {
    tables: Vec<DataTable>,
}

impl StreamTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a table, returning the table it replaced
    pub fn insert(&mut self, table: DataTable) -> Option<DataTable> {
        match self.tables.iter_mut().find(|t| t.name == table.name) {
            Some(slot) => Some(std::mem::replace(slot, table)),
            None => {
                self.tables.push(table);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&DataTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DataTable> {
        self.tables.iter()
    }
}

impl<'a> IntoIterator for &'a StreamTables {
    type Item = &'a DataTable;
    type IntoIter = std::slice::Iter<'a, DataTable>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}
