//! XDF Dummy Recording - Synthetic multi-stream XDF files for testing
//!
//! Writes an XDF file shaped like a LabRecorder session: a labelled EEG-like stream
//! with sine wave data, optional ECG and Tobii eye tracker streams, and a string
//! marker stream with jittered event times.
//!
//! # Usage
//!
//! ```bash
//! # 10 s of 4-channel data with 10 markers
//! xdf-dummy-recording --output dummy.xdf
//!
//! # Include an unlabeled ECG stream and a Tobii stream
//! xdf-dummy-recording --output dummy.xdf --ecg --tobii
//!
//! # Store only the first timestamp of every chunk
//! xdf-dummy-recording --output dummy.xdf --omit-timestamps
//! ```

use anyhow::Result;
use clap::Parser;
use std::f64::consts::PI;
use std::path::PathBuf;

use xdf_sync_check::xdf::ChannelFormat;
use xdf_sync_check::xdf::writer::{SampleData, StreamHeader, XdfWriter};

/// LSL clock value of the first sample
const START_TIME: f64 = 1000.0;

/// Seconds of data per samples chunk
const CHUNK_SECONDS: f64 = 1.0;

/// Seconds between clock offset measurements
const CLOCK_OFFSET_INTERVAL: f64 = 5.0;

const TOBII_CHANNELS: [&str; 8] = [
    "left_gaze_point_on_display_area_0",
    "left_gaze_point_on_display_area_1",
    "right_gaze_point_on_display_area_0",
    "right_gaze_point_on_display_area_1",
    "left_pupil_diameter",
    "right_pupil_diameter",
    "left_gaze_origin_validity",
    "right_gaze_origin_validity",
];

#[derive(Parser)]
#[command(name = "xdf-dummy-recording")]
#[command(about = "Write a synthetic XDF recording with data and marker streams for testing")]
struct Args {
    #[arg(long, short = 'o', help = "Output XDF file", default_value = "dummy.xdf")]
    output: PathBuf,

    #[arg(long, help = "Recording duration in seconds", default_value = "10")]
    duration: f64,

    #[arg(long = "sample-rate", help = "Sampling rate of the EEG stream in Hz", default_value = "250")]
    sample_rate: f64,

    #[arg(long, help = "Number of EEG channels", default_value = "4")]
    channels: usize,

    #[arg(long, help = "Number of marker events", default_value = "10")]
    markers: usize,

    #[arg(long, help = "Add a single-channel ECG stream without channel labels")]
    ecg: bool,

    #[arg(long, help = "Add a Tobii eye tracker stream")]
    tobii: bool,

    #[arg(long, help = "Store only the first timestamp of every chunk")]
    omit_timestamps: bool,

    #[arg(short = 'v', long = "verbose", help = "Verbose output")]
    verbose: bool,
}

/// A regular stream to be written chunk by chunk
struct DataStream {
    id: u32,
    header: StreamHeader,
    generate: fn(channel: usize, t: f64) -> f64,
}

fn eeg_sample(channel: usize, t: f64) -> f64 {
    let freq = 5.0 + 2.0 * channel as f64;
    // Varying amplitude: 0.5 + 0.3 * sin(2π * 0.1 * freq * t)
    let amplitude = 0.5 + 0.3 * (2.0 * PI * 0.1 * freq * t).sin();
    amplitude * (2.0 * PI * freq * t).sin() + 0.05 * (fastrand::f64() - 0.5)
}

fn ecg_sample(_channel: usize, t: f64) -> f64 {
    // One sharp beat per second on a slow baseline
    let phase = t.fract();
    let beat = (-((phase - 0.3) / 0.01).powi(2)).exp();
    beat + 0.1 * (2.0 * PI * 0.25 * t).sin() + 0.02 * (fastrand::f64() - 0.5)
}

fn tobii_sample(channel: usize, t: f64) -> f64 {
    match channel {
        0..=3 => 0.5 + 0.3 * (2.0 * PI * 0.2 * t + channel as f64).sin() + 0.01 * fastrand::f64(),
        4 | 5 => 3.0 + 0.2 * (2.0 * PI * 0.1 * t).sin() + 0.05 * fastrand::f64(),
        _ => 1.0,
    }
}

fn hostname() -> Option<String> {
    hostname::get()
        .ok()
        .map(|h| h.to_string_lossy().into_owned())
}

fn with_identity(mut header: StreamHeader) -> StreamHeader {
    header.hostname = hostname();
    header.uid = Some(uuid::Uuid::new_v4().to_string());
    header
}

fn chunk_timestamps(start: usize, end: usize, srate: f64, omit: bool) -> Vec<Option<f64>> {
    (start..end)
        .map(|i| {
            let t = START_TIME + i as f64 / srate;
            if omit && i != start { None } else { Some(t) }
        })
        .collect()
}

fn chunk_data(stream: &DataStream, start: usize, end: usize) -> SampleData {
    let srate = stream.header.nominal_srate;
    let channels = stream.header.channel_count;
    let values = (start..end).flat_map(|i| {
        let t = i as f64 / srate;
        (0..channels).map(move |ch| (stream.generate)(ch, t))
    });

    match stream.header.channel_format {
        ChannelFormat::Double64 => SampleData::Float64(values.collect()),
        _ => SampleData::Float32(values.map(|v| v as f32).collect()),
    }
}

fn marker_times(count: usize, duration: f64) -> Vec<f64> {
    let spacing = duration / (count as f64 + 1.0);
    (1..=count)
        .map(|i| {
            let jitter = (fastrand::f64() - 0.5) * 0.2 * spacing;
            START_TIME + i as f64 * spacing + jitter
        })
        .collect()
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.duration <= 0.0 {
        anyhow::bail!("Duration must be positive");
    }
    if args.sample_rate <= 0.0 {
        anyhow::bail!("Sample rate must be positive");
    }
    if args.channels == 0 {
        anyhow::bail!("At least one channel is required");
    }

    xdf_sync_check::display_license_notice("xdf-dummy-recording");
    tracing_subscriber::fmt::init();

    let eeg_labels: Vec<String> = (1..=args.channels).map(|i| format!("Ch{}", i)).collect();
    let mut streams = vec![DataStream {
        id: 1,
        header: with_identity(
            StreamHeader::new("DummyEEG", "EEG", args.channels, args.sample_rate, ChannelFormat::Float32)
                .with_labels(eeg_labels.as_slice()),
        ),
        generate: eeg_sample,
    }];
    if args.ecg {
        streams.push(DataStream {
            id: 2,
            header: with_identity(StreamHeader::new("DummyECG", "ECG", 1, 500.0, ChannelFormat::Double64)),
            generate: ecg_sample,
        });
    }
    if args.tobii {
        streams.push(DataStream {
            id: 3,
            header: with_identity(
                StreamHeader::new("Tobii Pro Spectrum", "Gaze", TOBII_CHANNELS.len(), 60.0, ChannelFormat::Float32)
                    .with_labels(&TOBII_CHANNELS[..]),
            ),
            generate: tobii_sample,
        });
    }

    let marker_id = 4;
    let marker_header = with_identity(StreamHeader::new("DummyMarkers", "Markers", 1, 0.0, ChannelFormat::String));

    println!("XDF Dummy Recording Generator");
    println!("=============================");
    println!("Output:\t\t{}", args.output.display());
    println!("Duration:\t{} s", args.duration);
    for stream in &streams {
        println!(
            "Stream:\t\t{} ({} channels @ {} Hz)",
            stream.header.name.as_deref().unwrap_or(""),
            stream.header.channel_count,
            stream.header.nominal_srate
        );
    }
    println!("Markers:\t{}", args.markers);
    println!();

    let mut writer = XdfWriter::create(&args.output)?;
    for stream in &streams {
        writer.write_stream_header(stream.id, &stream.header)?;
    }
    writer.write_stream_header(marker_id, &marker_header)?;

    let sample_totals: Vec<usize> = streams
        .iter()
        .map(|s| (args.duration * s.header.nominal_srate).round() as usize)
        .collect();
    let markers = marker_times(args.markers, args.duration);
    let mut next_marker = 0;
    let mut next_offset = 0.0;

    let chunks = (args.duration / CHUNK_SECONDS).ceil() as usize;
    for chunk in 0..chunks {
        let chunk_start = chunk as f64 * CHUNK_SECONDS;
        let chunk_end = chunk_start + CHUNK_SECONDS;

        if chunk_start >= next_offset {
            for (i, stream) in streams.iter().enumerate() {
                // Small per-stream offset with a slow drift
                let offset = -0.001 * (i + 1) as f64 - 1e-5 * chunk_start;
                writer.write_clock_offset(stream.id, START_TIME + chunk_start, offset)?;
            }
            writer.write_clock_offset(marker_id, START_TIME + chunk_start, 0.0)?;
            next_offset += CLOCK_OFFSET_INTERVAL;
        }

        for (stream, &total) in streams.iter().zip(&sample_totals) {
            let srate = stream.header.nominal_srate;
            let start = ((chunk_start * srate).round() as usize).min(total);
            let end = ((chunk_end * srate).round() as usize).min(total);
            if start == end {
                continue;
            }
            let timestamps = chunk_timestamps(start, end, srate, args.omit_timestamps);
            let data = chunk_data(stream, start, end);
            writer.write_samples(stream.id, stream.header.channel_count, &timestamps, &data)?;
        }

        while next_marker < markers.len() && markers[next_marker] < START_TIME + chunk_end {
            let label = format!("Marker_{}", next_marker + 1);
            writer.write_samples(
                marker_id,
                1,
                &[Some(markers[next_marker])],
                &SampleData::String(vec![label]),
            )?;
            next_marker += 1;
        }

        writer.write_boundary()?;

        if args.verbose {
            println!("Chunk {}/{} written ({} bytes)", chunk + 1, chunks, writer.bytes_written());
        }
    }

    for (stream, &total) in streams.iter().zip(&sample_totals) {
        let last = START_TIME + total.saturating_sub(1) as f64 / stream.header.nominal_srate;
        writer.write_stream_footer(stream.id, START_TIME, last, total)?;
    }
    let (first_marker, last_marker) = match (markers.first(), markers.last()) {
        (Some(&f), Some(&l)) => (f, l),
        _ => (0.0, 0.0),
    };
    writer.write_stream_footer(marker_id, first_marker, last_marker, next_marker)?;

    let bytes = writer.bytes_written();
    writer.finish()?;

    println!("Wrote {} ({} bytes)", args.output.display(), bytes);
    Ok(())
}
