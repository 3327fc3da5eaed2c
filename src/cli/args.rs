use crate::config::PipelineConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chirps-clipper")]
#[command(about = "Download new CHIRPS dekadal rainfall rasters and clip them to a country boundary")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(
        short,
        long,
        global = true,
        help = "TOML configuration file (CHIRPS_ETL_* environment variables override it)"
    )]
    pub config: Option<PathBuf>,
}

/// Overrides for the configured pipeline settings
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    #[arg(long, help = "Directory listing URL")]
    pub base_url: Option<String>,

    #[arg(long, help = "Skip files whose name sorts at or before this one")]
    pub bookmark: Option<String>,

    #[arg(long, conflicts_with = "bookmark", help = "Process every listed file")]
    pub no_bookmark: bool,

    #[arg(long, help = "Country boundary (.shp or GeoJSON)")]
    pub boundary: Option<PathBuf>,

    #[arg(long)]
    pub download_dir: Option<PathBuf>,

    #[arg(long)]
    pub extract_dir: Option<PathBuf>,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long, help = "Keep downloaded and decompressed files after a successful clip")]
    pub keep_intermediates: bool,

    #[arg(long, help = "Hide download progress bars")]
    pub no_progress: bool,
}

impl PipelineArgs {
    pub fn apply(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if self.no_bookmark {
            config.bookmark = None;
        } else if let Some(bookmark) = &self.bookmark {
            config.bookmark = Some(bookmark.clone());
        }
        if let Some(boundary) = &self.boundary {
            config.boundary_path = boundary.clone();
        }
        if let Some(dir) = &self.download_dir {
            config.download_dir = dir.clone();
        }
        if let Some(dir) = &self.extract_dir {
            config.extract_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if self.keep_intermediates {
            config.keep_intermediates = true;
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download, decompress and clip every file newer than the bookmark
    Run {
        #[command(flatten)]
        pipeline: PipelineArgs,

        #[arg(long, help = "Write a JSON report of per-file outcomes")]
        report: Option<PathBuf>,
    },

    /// Show files on the listing that would be processed
    List {
        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Download files newer than the bookmark without processing them
    Fetch {
        #[command(flatten)]
        pipeline: PipelineArgs,

        #[arg(long, help = "Write a JSON report of per-file outcomes")]
        report: Option<PathBuf>,
    },

    /// Clip a local GeoTIFF (or .tif.gz) to the boundary
    Clip {
        #[arg(short, long, help = "Input .tif or .tif.gz file")]
        input: PathBuf,

        #[arg(
            short,
            long,
            help = "Output GeoTIFF [default: <output_dir>/<input name without .gz>]"
        )]
        output: Option<PathBuf>,

        #[arg(long, help = "Country boundary (.shp or GeoJSON)")]
        boundary: Option<PathBuf>,
    },

    /// Display size, georeferencing and value statistics of a GeoTIFF
    Info {
        #[arg(short, long)]
        file: PathBuf,
    },
}
