use crate::analyzers::RasterAnalyzer;
use crate::archive::decompress_gz;
use crate::cli::args::{Cli, Commands, PipelineArgs};
use crate::config::PipelineConfig;
use crate::error::{EtlError, Result};
use crate::models::RunReport;
use crate::processors::{clip_file, Pipeline};
use crate::readers::BoundaryReader;
use crate::remote::HttpSource;
use crate::utils::constants::GZIP_SUFFIX;
use crate::utils::filename::decompressed_name;
use crate::utils::ProgressReporter;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info, Level};

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let config = PipelineConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { pipeline, report } => {
            let pipeline = build_pipeline(config, &pipeline)?;
            info!("Listing {}", pipeline.config().base_url);

            let run_report = pipeline
                .run()
                .await
                .inspect_err(|e| error!("{}", run_failure_message(e)))?;

            println!("\n{}", run_report.summary());
            write_report(&run_report, report.as_deref())?;
            println!("All GeoTIFF files extracted, masked, and saved.");
        }

        Commands::List { pipeline } => {
            let config = pipeline.apply(config);
            let bookmark = config.bookmark();
            let source = HttpSource::new(config.request_timeout())?;
            let pipeline = Pipeline::without_boundary(config, source);

            let pending = pipeline.pending().await?;
            match bookmark.as_str() {
                Some(last) => println!("{} file(s) after {}:", pending.len(), last),
                None => println!("{} file(s) listed:", pending.len()),
            }
            for file in &pending {
                match file.dekad().and_then(|d| d.start_date().map(|start| (d, start))) {
                    Some((dekad, start)) => {
                        println!("  {}  {} (from {})", file.name, dekad, start)
                    }
                    None => println!("  {}", file.name),
                }
            }
        }

        Commands::Fetch { pipeline, report } => {
            let config = pipeline.apply(config);
            let source = HttpSource::new(config.request_timeout())?
                .with_progress(!pipeline.no_progress);
            let pipeline = Pipeline::without_boundary(config, source);

            let run_report = pipeline.fetch().await?;
            println!("\n{}", run_report.summary());
            write_report(&run_report, report.as_deref())?;
        }

        Commands::Clip {
            input,
            output,
            boundary,
        } => {
            let boundary_path = boundary.unwrap_or_else(|| config.boundary_path.clone());
            let boundary = BoundaryReader::new().read(&boundary_path)?;
            let output = match output {
                Some(output) => output,
                None => default_clip_output(&config, &input)?,
            };

            let spinner =
                ProgressReporter::new_spinner(&format!("Clipping {}", input.display()), false);
            let clipped = if input.to_string_lossy().ends_with(GZIP_SUFFIX) {
                let scratch = tempfile::TempDir::new()?;
                let extracted = decompress_gz(&input, scratch.path())?;
                clip_file(&extracted, &output, &boundary)?
            } else {
                clip_file(&input, &output, &boundary)?
            };
            spinner.finish_and_clear();

            println!("Clipped and saved: {}", output.display());
            println!("\n{}", RasterAnalyzer::new().analyze(&clipped).summary());
        }

        Commands::Info { file } => {
            println!("Analyzing GeoTIFF: {}", file.display());
            let stats = RasterAnalyzer::new().analyze_file(&file)?;
            println!("\n{}", stats.summary());
        }
    }

    Ok(())
}

fn build_pipeline(config: PipelineConfig, args: &PipelineArgs) -> Result<Pipeline<HttpSource>> {
    let config = args.apply(config);
    let source = HttpSource::new(config.request_timeout())?.with_progress(!args.no_progress);
    Pipeline::from_config(config, source)
}

fn default_clip_output(config: &PipelineConfig, input: &Path) -> Result<PathBuf> {
    let name = input
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| EtlError::InvalidFileName(input.display().to_string()))?;
    Ok(config.output_dir.join(decompressed_name(name)))
}

fn run_failure_message(err: &EtlError) -> String {
    match err {
        EtlError::ListingStatus { .. } | EtlError::Http(_) => {
            format!("Failed to retrieve the web page: {}", err)
        }
        other => format!("Run aborted: {}", other),
    }
}

fn write_report(report: &RunReport, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        report.write_json(path)?;
        info!("Report written to {}", path.display());
    }
    Ok(())
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_failure_message_names_listing_errors_only() {
        let listing = EtlError::ListingStatus {
            url: "https://data.chc.ucsb.edu/".to_string(),
            status: 503,
        };
        assert!(run_failure_message(&listing).starts_with("Failed to retrieve the web page"));

        let io = EtlError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "CHIRPS_10_DAY",
        ));
        let message = run_failure_message(&io);
        assert!(!message.contains("web page"));
        assert!(message.contains("CHIRPS_10_DAY"));
    }

    #[test]
    fn test_default_clip_output_strips_gz() {
        let config = PipelineConfig::default();
        let output =
            default_clip_output(&config, Path::new("downloads/chirps-v2.0.2003.10.2.tif.gz"))
                .unwrap();
        assert_eq!(
            output,
            PathBuf::from("CHIRPS_10_DAY/ten_day_cropped_kenya/chirps-v2.0.2003.10.2.tif")
        );
    }
}
