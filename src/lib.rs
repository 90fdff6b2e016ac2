//! XDF Sync Check - Marker-aligned CSV export and synchronization figures for XDF recordings
//!
//! This crate converts multi-stream XDF recordings (as written by LabRecorder) into one
//! CSV table per data stream, with every sample annotated by the nearest marker event,
//! and draws figures to eyeball whether markers and signals line up in time.
//!
//! # Overview
//!
//! A recording typically holds one or more continuous streams (EEG, ECG, eye tracking, ...)
//! and a marker stream with event labels. All streams share the LSL clock, so aligning them
//! is a matter of pairing every data sample with the marker closest in time.
//!
//! # Key Features
//!
//! - **Native XDF decoding** with clock offset correction and timestamp dejittering
//! - **Nearest-timestamp alignment** of every data stream against the marker stream
//! - **Semicolon-separated CSV export** (`<stream>_with_Markers.csv`)
//! - **Sync-check figures**: one combined PNG plus one PNG per stream
//! - **Test recording generation** for development and testing
//!
//! # Command-Line Tools
//!
//! - `xdf-sync-check` - Convert a recording and draw the figures (default binary)
//! - `xdf-inspect` - Print the streams and metadata of an XDF file
//! - `xdf-dummy-recording` - Write a synthetic XDF recording with data and marker streams
//!
//! # Quick Start
//!
//! ```bash
//! # Generate a test recording
//! xdf-dummy-recording --output test.xdf --duration 10 --markers 8 --ecg
//!
//! # Inspect it
//! xdf-inspect test.xdf --verbose
//!
//! # Convert and plot
//! xdf-sync-check test.xdf --output results --y-limit ECG=-2,2
//! ```
//!
//! # Output Layout
//!
//! ```text
//! results/
//! ├── EEG_with_Markers.csv         Fp1;Fp2;...;Timestamp;Marker
//! ├── ECG_with_Markers.csv
//! ├── combined_sync_check.png      all streams stacked
//! ├── EEG_sync_check.png
//! └── ECG_sync_check.png
//! ```
//!
//! # Library Usage
//!
//! - [`xdf`] - XDF container reading and writing
//! - [`sync`] - Clock offset correction and dejittering
//! - [`loader`] - XDF streams to labelled tables
//! - [`merger`] - Nearest-timestamp alignment
//! - [`export`] - CSV output
//! - [`convert`] - The full conversion pipeline
//! - [`plot`] - Synchronization-check figures
//! - [`cli`] - Command-line argument definitions
//!
//! # License
//!
//! This project is licensed under the GNU General Public License v3.0.
//! See LICENSE.md for details.

pub mod xdf;
pub mod sync;
pub mod table;
pub mod loader;
pub mod merger;
pub mod export;
pub mod convert;
pub mod plot;
pub mod cli;

pub use convert::{Conversion, convert_xdf_to_csv};
pub use loader::{LoadOptions, load_recording};
pub use merger::align_to_markers;
pub use plot::{YLimits, combined_plot, single_plot};

use chrono::Datelike;

/// Display GPL license notice for a program
pub fn display_license_notice(program_name: &str) {
	let version = env!("CARGO_PKG_VERSION");
	let current_year = chrono::Utc::now().year();
	let copyright_year = if current_year == 2025 {
		"2025".to_string()
	} else {
		format!("2025-{}", current_year)
	};

	println!("{} {} Copyright (C) {} Raul C. Sîmpetru", program_name, version, copyright_year);
	println!("This program comes with ABSOLUTELY NO WARRANTY.");
	println!("For details see https://www.gnu.org/licenses/gpl-3.0.html#license-text.");
	println!("This is free software, and you are welcome to redistribute it under certain conditions.");
	println!();
}
