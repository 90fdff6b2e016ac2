//! XDF Sync Check - Marker-aligned CSV export and sync-check figures
//!
//! Converts every data stream of an XDF recording into a semicolon-separated CSV
//! table annotated with the nearest marker, then draws the synchronization-check
//! figures.
//!
//! # Usage
//!
//! ```bash
//! # Convert into ./output
//! xdf-sync-check recording.xdf
//!
//! # Custom output folder and y-axis bounds
//! xdf-sync-check recording.xdf --output results --y-limit ECG=-2,2 --y-limit Tobii=0,1
//!
//! # CSV only
//! xdf-sync-check recording.xdf --no-combined --no-individual
//!
//! # Raw LSL timestamps
//! xdf-sync-check recording.xdf --no-clock-sync --no-dejitter
//! ```
//!
//! # Output Files
//!
//! - `<stream>_with_Markers.csv` per data stream
//! - `combined_sync_check.png` with all streams stacked
//! - `<stream>_sync_check.png` per data stream

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;

use xdf_sync_check::cli::Args;
use xdf_sync_check::plot::{self, fonts};

fn main() -> Result<()> {
    let args = Args::parse();

    if !args.quiet {
        xdf_sync_check::display_license_notice("xdf-sync-check");
    }

    let level = if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    if args.verbose {
        println!("Run configuration:");
        println!("{}", args.to_run_config_json()?);
        println!();
    }

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create output folder {}", args.output.display()))?;

    if !args.no_combined || !args.no_individual {
        fonts::text_available(args.font.as_deref());
    }

    let conversion =
        xdf_sync_check::convert_xdf_to_csv(&args.file, &args.output, &args.load_options())?;

    let Some(markers) = conversion
        .markers
        .as_ref()
        .filter(|_| conversion.is_plottable())
    else {
        println!("Failed to load data or markers.");
        return Ok(());
    };
    let y_limits = args.y_limits();

    let mut figures = Vec::new();
    if !args.no_combined {
        figures.extend(plot::combined_plot(
            &conversion.streams,
            markers,
            &args.output,
            &y_limits,
        )?);
    }
    if !args.no_individual {
        figures.extend(plot::single_plot(
            &conversion.streams,
            markers,
            &args.output,
            &y_limits,
        )?);
    }

    if !args.quiet {
        println!();
        println!(
            "Summary: {} stream{}, {} marker{}, {} CSV file{}, {} figure{}",
            conversion.streams.len(),
            if conversion.streams.len() == 1 { "" } else { "s" },
            markers.len(),
            if markers.len() == 1 { "" } else { "s" },
            conversion.written.len(),
            if conversion.written.len() == 1 { "" } else { "s" },
            figures.len(),
            if figures.len() == 1 { "" } else { "s" },
        );
        println!("Output folder: {}", args.output.display());
    }

    Ok(())
}
