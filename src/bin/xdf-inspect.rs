//! XDF Inspect - XDF file inspection and metadata viewer
//!
//! This tool decodes an XDF recording and displays its file header, the streams it
//! contains, and per-stream timing information.
//!
//! # Features
//!
//! - List all streams with type, channel count and format
//! - Show nominal and effective sample rates, duration and timestamp range
//! - Show channel labels and clock offset counts in verbose mode
//! - Filter by specific stream name(s)
//! - Machine-readable JSON output
//!
//! # Usage
//!
//! ```bash
//! # Inspect a file
//! xdf-inspect recording.xdf
//!
//! # Verbose mode with channel labels and stream metadata
//! xdf-inspect recording.xdf --verbose
//!
//! # Filter to specific stream(s)
//! xdf-inspect recording.xdf --stream EEG --stream Markers
//!
//! # JSON for scripting
//! xdf-inspect recording.xdf --json
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use xdf_sync_check::xdf::{self, ChannelFormat, XdfStream, first_text};

#[derive(Parser)]
#[command(name = "xdf-inspect")]
#[command(about = "Inspect the streams of an XDF recording")]
#[command(version)]
struct Args {
    /// Path to the XDF file to inspect
    file_path: PathBuf,

    /// Show detailed stream information
    #[arg(short, long)]
    verbose: bool,

    /// Filter to specific stream name(s)
    #[arg(short, long)]
    stream: Option<Vec<String>>,

    /// Print a JSON summary instead of the tree view
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct StreamSummary {
    stream_id: u32,
    name: Option<String>,
    #[serde(rename = "type")]
    stream_type: Option<String>,
    channel_count: usize,
    channel_format: ChannelFormat,
    nominal_srate: f64,
    effective_srate: Option<f64>,
    samples: usize,
    first_timestamp: Option<f64>,
    last_timestamp: Option<f64>,
    duration: Option<f64>,
    clock_offsets: usize,
    source_id: Option<String>,
    hostname: Option<String>,
    channel_labels: Option<Vec<Option<String>>>,
}

impl StreamSummary {
    fn from_stream(stream: &XdfStream) -> Self {
        let first = stream.time_stamps.first().copied();
        let last = stream.time_stamps.last().copied();
        let duration = first.zip(last).map(|(f, l)| l - f);
        let effective_srate = duration
            .filter(|d| *d > 0.0)
            .map(|d| (stream.sample_count() - 1) as f64 / d);

        Self {
            stream_id: stream.stream_id,
            name: stream.info.name.clone(),
            stream_type: stream.info.stream_type.clone(),
            channel_count: stream.info.channel_count,
            channel_format: stream.info.channel_format,
            nominal_srate: stream.info.nominal_srate,
            effective_srate,
            samples: stream.sample_count(),
            first_timestamp: first,
            last_timestamp: last,
            duration,
            clock_offsets: stream.clock_offsets.len(),
            source_id: stream.info.source_id.clone(),
            hostname: stream.info.hostname.clone(),
            channel_labels: stream.info.channel_labels(),
        }
    }
}

fn print_stream(summary: &StreamSummary, is_last: bool, verbose: bool) {
    let prefix = if is_last { "  └─" } else { "  ├─" };
    let indent = if is_last { "     " } else { "  │  " };

    println!(
        "{} {} (id {})",
        prefix,
        summary.name.as_deref().unwrap_or("<unnamed>"),
        summary.stream_id
    );
    println!("{}├─ Type: {}", indent, summary.stream_type.as_deref().unwrap_or("<none>"));
    println!("{}├─ Channels: {}", indent, summary.channel_count);
    println!("{}├─ Format: {}", indent, summary.channel_format.as_str());
    if summary.nominal_srate > 0.0 {
        println!("{}├─ Nominal rate: {} Hz", indent, summary.nominal_srate);
    } else {
        println!("{}├─ Nominal rate: irregular", indent);
    }
    if let Some(rate) = summary.effective_srate {
        println!("{}├─ Effective rate: {:.3} Hz", indent, rate);
    }
    println!("{}├─ Samples: {}", indent, summary.samples);

    match (summary.first_timestamp, summary.last_timestamp) {
        (Some(first), Some(last)) if summary.samples >= 2 => {
            println!("{}├─ Duration: {:.3} s", indent, last - first);
            println!("{}├─ Time Range: {:.6} → {:.6}", indent, first, last);
        }
        (Some(first), _) => println!("{}├─ Duration: single sample at {:.6}", indent, first),
        _ => println!("{}├─ Duration: no samples", indent),
    }

    if verbose {
        println!("{}├─ Clock offsets: {}", indent, summary.clock_offsets);
        if let Some(hostname) = &summary.hostname {
            println!("{}├─ Hostname: {}", indent, hostname);
        }
        match &summary.channel_labels {
            Some(labels) => {
                let labels: Vec<&str> = labels
                    .iter()
                    .map(|l| l.as_deref().unwrap_or("?"))
                    .collect();
                println!("{}├─ Labels: {}", indent, labels.join(", "));
            }
            None => println!("{}├─ Labels: <none>", indent),
        }
    }

    println!(
        "{}└─ Source ID: {}",
        indent,
        summary.source_id.as_deref().unwrap_or("<none>")
    );
    println!();
}

fn main() -> Result<()> {
    let args = Args::parse();

    let file = xdf::read_xdf(&args.file_path)
        .with_context(|| format!("Failed to read {}", args.file_path.display()))?;

    let summaries: Vec<StreamSummary> = file
        .streams
        .iter()
        .filter(|s| match &args.stream {
            Some(filter) => s.info.name.as_ref().is_some_and(|n| filter.contains(n)),
            None => true,
        })
        .map(StreamSummary::from_stream)
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    xdf_sync_check::display_license_notice("xdf-inspect");

    println!("╔════════════════════════════════════════════════════════════════╗");
    println!("║              XDF File Inspector                                ║");
    println!("╚════════════════════════════════════════════════════════════════╝");
    println!();
    println!("File: {}", args.file_path.display());
    if let Some(version) = first_text(&file.header, "version") {
        println!("XDF version: {}", version);
    }
    if args.verbose
        && let Some(datetime) = first_text(&file.header, "datetime")
    {
        println!("Recorded at: {}", datetime);
    }
    println!();

    println!("STREAMS ({} found)", file.streams.len());
    println!();

    for (i, summary) in summaries.iter().enumerate() {
        print_stream(summary, i + 1 == summaries.len(), args.verbose);
    }

    let total_samples: usize = summaries.iter().map(|s| s.samples).sum();
    println!(
        "Summary: {} stream{}, {} total samples",
        summaries.len(),
        if summaries.len() == 1 { "" } else { "s" },
        total_samples
    );
    println!();

    Ok(())
}
