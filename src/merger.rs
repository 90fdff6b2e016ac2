//! Nearest-timestamp alignment of data tables against the marker table

use ndarray::Axis;

use crate::table::{AlignedTable, DataTable, MarkerTable};
use crate::xdf::TimeSeries;

/// Indices that sort `values` ascending; equal values keep their order
pub fn stable_order(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    order
}

/// For every query timestamp, the index of the nearest reference timestamp.
///
/// Both slices must be sorted ascending. On equal distance the earlier
/// reference wins; among identical reference timestamps the backward match is
/// the last of them and the forward match the first. Distance is unbounded,
/// so every query matches as long as `reference` is not empty.
pub fn nearest_indices(queries: &[f64], reference: &[f64]) -> Vec<Option<usize>> {
    queries
        .iter()
        .map(|&t| {
            let after_le = reference.partition_point(|&r| r <= t);
            let backward = after_le.checked_sub(1);
            let forward = reference.partition_point(|&r| r < t);
            let forward = (forward < reference.len()).then_some(forward);

            match (backward, forward) {
                (Some(b), Some(f)) => {
                    if t - reference[b] <= reference[f] - t {
                        Some(b)
                    } else {
                        Some(f)
                    }
                }
                (Some(b), None) => Some(b),
                (None, Some(f)) => Some(f),
                (None, None) => None,
            }
        })
        .collect()
}

fn reorder_rows(samples: &TimeSeries, order: &[usize]) -> TimeSeries {
    match samples {
        TimeSeries::Numeric(a) => TimeSeries::Numeric(a.select(Axis(0), order)),
        TimeSeries::Integer(a) => TimeSeries::Integer(a.select(Axis(0), order)),
        TimeSeries::Text(a) => TimeSeries::Text(a.select(Axis(0), order)),
    }
}

/// Merge a data table with the marker table by nearest timestamp.
///
/// Both inputs are sorted by timestamp first; the result keeps one row per
/// data sample in ascending timestamp order.
pub fn align_to_markers(table: &DataTable, markers: &MarkerTable) -> AlignedTable {
    let data_order = stable_order(&table.timestamps);
    let timestamps: Vec<f64> = data_order.iter().map(|&i| table.timestamps[i]).collect();

    let marker_order = stable_order(&markers.timestamps);
    let marker_times: Vec<f64> = marker_order.iter().map(|&i| markers.timestamps[i]).collect();

    let assigned = nearest_indices(&timestamps, &marker_times)
        .into_iter()
        .map(|m| m.map(|i| markers.values[marker_order[i]].clone()))
        .collect();

    AlignedTable {
        name: table.name.clone(),
        columns: table.columns.clone(),
        channel_format: table.channel_format,
        samples: reorder_rows(&table.samples, &data_order),
        timestamps,
        markers: assigned,
    }
}
