use clap::Parser;
use serde_json::json;
use std::path::PathBuf;

use crate::loader::LoadOptions;
use crate::plot::YLimits;

#[derive(Parser, Clone, Debug)]
#[command(name = "xdf-sync-check")]
#[command(about = "Convert an XDF recording into marker-aligned CSV files and sync-check plots")]
#[command(version)]
pub struct Args {
    #[arg(help = "XDF file to convert")]
    pub file: PathBuf,

    #[arg(
        long,
        short = 'o',
        help = "Folder for CSV files and figures",
        default_value = "output"
    )]
    pub output: PathBuf,

    #[arg(
        long = "y-limit",
        value_name = "NAME=MIN,MAX",
        value_parser = parse_y_limit,
        help = "Y-axis bounds for streams whose name is or contains NAME (repeatable)"
    )]
    pub y_limits: Vec<(String, (f64, f64))>,

    #[arg(long, help = "Skip the combined figure")]
    pub no_combined: bool,

    #[arg(long, help = "Skip the per-stream figures")]
    pub no_individual: bool,

    #[arg(long, help = "Keep raw timestamps instead of applying recorded clock offsets")]
    pub no_clock_sync: bool,

    #[arg(long, help = "Keep jittered timestamps of regular streams")]
    pub no_dejitter: bool,

    #[arg(long, help = "TrueType font for figure text (system fonts are searched otherwise)")]
    pub font: Option<PathBuf>,

    #[arg(long, short = 'v', help = "Debug logging")]
    pub verbose: bool,

    #[arg(long, short = 'q', help = "Minimal output mode")]
    pub quiet: bool,
}

/// Parse `NAME=MIN,MAX` into a y-limit entry
pub fn parse_y_limit(arg: &str) -> Result<(String, (f64, f64)), String> {
    let (name, bounds) = arg
        .split_once('=')
        .ok_or_else(|| format!("'{}' is not of the form NAME=MIN,MAX", arg))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("stream name must not be empty".to_string());
    }

    let (min, max) = bounds
        .split_once(',')
        .ok_or_else(|| format!("bounds '{}' must be 'MIN,MAX'", bounds))?;
    let min: f64 = min
        .trim()
        .parse()
        .map_err(|_| format!("invalid minimum '{}'", min.trim()))?;
    let max: f64 = max
        .trim()
        .parse()
        .map_err(|_| format!("invalid maximum '{}'", max.trim()))?;
    if min >= max {
        return Err(format!("minimum {} must be less than maximum {}", min, max));
    }

    Ok((name.to_string(), (min, max)))
}

impl Args {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            synchronize_clocks: !self.no_clock_sync,
            dejitter_timestamps: !self.no_dejitter,
        }
    }

    pub fn y_limits(&self) -> YLimits {
        self.y_limits.iter().cloned().collect()
    }

    /// Serialize the effective configuration to a JSON string
    pub fn to_run_config_json(&self) -> anyhow::Result<String> {
        let limits: serde_json::Map<String, serde_json::Value> = self
            .y_limits
            .iter()
            .map(|(name, (min, max))| (name.clone(), json!([min, max])))
            .collect();

        let config_json = json!({
            "file": self.file.display().to_string(),
            "output": self.output.display().to_string(),
            "y_limits": limits,
            "combined_plot": !self.no_combined,
            "individual_plots": !self.no_individual,
            "synchronize_clocks": !self.no_clock_sync,
            "dejitter_timestamps": !self.no_dejitter,
            "font": self.font.as_ref().map(|p| p.display().to_string()),
            "started_at": chrono::Utc::now().to_rfc3339(),
            "tool_version": env!("CARGO_PKG_VERSION")
        });

        Ok(serde_json::to_string_pretty(&config_json)?)
    }
}
