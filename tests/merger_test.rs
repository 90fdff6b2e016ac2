use ndarray::{Array2, array};

use xdf_sync_check::merger::{align_to_markers, nearest_indices, stable_order};
use xdf_sync_check::table::{DataTable, MarkerTable, StreamTables};
use xdf_sync_check::xdf::{ChannelFormat, TimeSeries};

fn data_table(name: &str, timestamps: Vec<f64>, values: Array2<f64>) -> DataTable {
    DataTable {
        name: name.to_string(),
        stream_type: "EEG".to_string(),
        columns: (0..values.ncols()).map(|i| format!("Ch{}", i + 1)).collect(),
        channel_format: ChannelFormat::Double64,
        samples: TimeSeries::Numeric(values),
        timestamps,
    }
}

fn marker_table(events: &[(f64, &str)]) -> MarkerTable {
    MarkerTable {
        name: "Markers".to_string(),
        values: events.iter().map(|&(_, v)| v.to_string()).collect(),
        timestamps: events.iter().map(|&(t, _)| t).collect(),
    }
}

#[test]
fn test_nearest_index_per_query() {
    let reference = [1.0, 2.0, 4.0];
    let queries = [0.0, 1.2, 1.8, 3.5, 10.0];

    let matched = nearest_indices(&queries, &reference);

    assert_eq!(matched, vec![Some(0), Some(0), Some(1), Some(2), Some(2)]);
}

#[test]
fn test_equal_distance_resolves_to_earlier_reference() {
    let matched = nearest_indices(&[1.5, 3.0], &[1.0, 2.0, 4.0]);
    assert_eq!(matched, vec![Some(0), Some(1)]);
}

#[test]
fn test_exact_hits_and_duplicate_references() {
    let matched = nearest_indices(&[2.0, 1.0], &[1.0, 1.0, 2.0]);
    // Backward match among identical timestamps is the last of them
    assert_eq!(matched, vec![Some(2), Some(1)]);
}

#[test]
fn test_empty_reference_matches_nothing() {
    assert_eq!(nearest_indices(&[1.0, 2.0], &[]), vec![None, None]);
    assert!(nearest_indices(&[], &[1.0]).is_empty());
}

#[test]
fn test_stable_order_keeps_equal_values_in_place() {
    assert_eq!(stable_order(&[3.0, 1.0, 3.0, 2.0]), vec![1, 3, 0, 2]);
}

#[test]
fn test_alignment_sorts_rows_by_timestamp() {
    let table = data_table("EEG", vec![3.0, 1.0, 2.0], array![[30.0], [10.0], [20.0]]);
    let markers = marker_table(&[(2.9, "late"), (0.9, "early")]);

    let aligned = align_to_markers(&table, &markers);

    assert_eq!(aligned.timestamps, vec![1.0, 2.0, 3.0]);
    assert_eq!(aligned.numeric_column(0), Some(vec![10.0, 20.0, 30.0]));
    assert_eq!(
        aligned.markers,
        vec![
            Some("early".to_string()),
            Some("late".to_string()),
            Some("late".to_string())
        ]
    );
    assert_eq!(aligned.header(), vec!["Ch1", "Timestamp", "Marker"]);
}

#[test]
fn test_alignment_keeps_every_data_row() {
    // Far more data rows than markers, and no temporal overlap at all
    let timestamps: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
    let values = Array2::from_shape_fn((50, 2), |(r, c)| (r * 10 + c) as f64);
    let table = data_table("EMG", timestamps, values);
    let markers = marker_table(&[(1.0, "a"), (2.0, "b")]);

    let aligned = align_to_markers(&table, &markers);

    assert_eq!(aligned.len(), 50);
    assert!(aligned.markers.iter().all(|m| m.as_deref() == Some("b")));
}

#[test]
fn test_alignment_without_markers_leaves_marker_column_empty() {
    let table = data_table("EEG", vec![1.0, 2.0], array![[1.0], [2.0]]);

    let aligned = align_to_markers(&table, &MarkerTable::default());

    assert_eq!(aligned.markers, vec![None, None]);
}

#[test]
fn test_alignment_is_idempotent() {
    let table = data_table(
        "EEG",
        vec![0.3, 0.1, 0.2, 0.4],
        array![[3.0, -3.0], [1.0, -1.0], [2.0, -2.0], [4.0, -4.0]],
    );
    let markers = marker_table(&[(0.25, "x"), (0.12, "y")]);

    let once = align_to_markers(&table, &markers);
    let twice = align_to_markers(&once.clone().into_data_table("EEG"), &markers);

    assert_eq!(once, twice);
}

#[test]
fn test_text_streams_are_reordered_too() {
    let table = DataTable {
        name: "Notes".to_string(),
        stream_type: "Annotations".to_string(),
        columns: vec!["Text".to_string()],
        channel_format: ChannelFormat::String,
        samples: TimeSeries::Text(array![["second".to_string()], ["first".to_string()]]),
        timestamps: vec![2.0, 1.0],
    };

    let aligned = align_to_markers(&table, &marker_table(&[(1.0, "m")]));

    assert_eq!(aligned.samples.cell(0, 0, ChannelFormat::String), "first");
    assert_eq!(aligned.numeric_column(0), None);
}

#[test]
fn test_stream_tables_replace_in_place() {
    let mut tables = StreamTables::new();
    assert!(tables.insert(data_table("A", vec![1.0], array![[1.0]])).is_none());
    assert!(tables.insert(data_table("B", vec![1.0], array![[2.0]])).is_none());

    let replaced = tables.insert(data_table("A", vec![5.0], array![[9.0]]));

    assert_eq!(replaced.map(|t| t.timestamps), Some(vec![1.0]));
    assert_eq!(tables.names().collect::<Vec<_>>(), vec!["A", "B"]);
    assert_eq!(tables.get("A").map(|t| t.timestamps.clone()), Some(vec![5.0]));
    assert!(tables.contains("B"));
    assert!(!tables.contains("C"));
}
