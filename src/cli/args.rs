use crate::models::ThermalIndexRow;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cattle-climate")]
#[command(about = "Station climate consolidation and cattle heat-stress indices")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Hide progress bars and info logs")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Settings file (TOML)")]
    pub config: Option<PathBuf>,
}

/// Reference tables and data directory; each falls back to the settings.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    #[arg(short, long, help = "Directory holding <tag>@<code>.data files")]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, help = "Variable glossary CSV")]
    pub glossary: Option<PathBuf>,

    #[arg(short, long, help = "Station registry CSV")]
    pub stations: Option<PathBuf>,
}

/// Inclusive date bounds, `YYYY-MM-DD`.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct RangeArgs {
    #[arg(long, help = "First date to keep (inclusive)")]
    pub start: Option<NaiveDate>,

    #[arg(long, help = "Last date to keep (inclusive)")]
    pub end: Option<NaiveDate>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the variable tags and stations available in a data directory
    Catalog {
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        #[arg(short, long, help = "Station registry CSV, for station names")]
        stations: Option<PathBuf>,
    },

    /// Parse every data file, join metadata and export one dataset
    Consolidate {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        range: RangeArgs,

        #[arg(
            short,
            long,
            help = "Output file, .csv or .parquet [default: output/cattle-climate-dataset-{YYMMDD}.csv]"
        )]
        output: Option<PathBuf>,

        #[arg(long, help = "Keep only this variable tag")]
        tag: Option<String>,

        #[arg(long, help = "Keep only this station code")]
        station: Option<u64>,

        #[arg(long, help = "Keep only this source file name")]
        file: Option<String>,

        #[arg(long, help = "Per-file outcome report, .json or .csv")]
        report: Option<PathBuf>,

        #[arg(long, help = "Monthly and annual means CSV of the exported rows")]
        means: Option<PathBuf>,

        #[arg(long)]
        compression: Option<String>,

        #[arg(long)]
        max_workers: Option<usize>,
    },

    /// Summarize one data file
    Inspect {
        #[arg(short, long)]
        file: PathBuf,

        #[command(flatten)]
        range: RangeArgs,

        #[arg(long, help = "Write the filtered series back as a .data file")]
        export: Option<PathBuf>,
    },

    /// Compute ITH, ITGH and CTR from dry bulb, wet bulb, dew point and wind files
    Indices {
        #[arg(long, requires_all = ["tbh", "tr", "vv"], conflicts_with = "station")]
        tbs: Option<PathBuf>,

        #[arg(long)]
        tbh: Option<PathBuf>,

        #[arg(long)]
        tr: Option<PathBuf>,

        #[arg(long)]
        vv: Option<PathBuf>,

        #[command(flatten)]
        source: SourceArgs,

        #[arg(long, help = "Station code when detecting the input files")]
        station: Option<u64>,

        #[command(flatten)]
        range: RangeArgs,

        #[arg(
            short,
            long,
            help = "Output file, .csv or .parquet [default: output/cattle-climate-indices-{YYMMDD}.csv]"
        )]
        output: Option<PathBuf>,

        #[arg(long, help = "Monthly and annual means CSV of one column")]
        means: Option<PathBuf>,

        #[arg(long, default_value = "ITH", value_parser = ThermalIndexRow::COLUMNS)]
        means_column: String,
    },
}
