use crate::archive::{decompress_gz_to, IntermediateFiles};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::{Bookmark, FileOutcome, RemoteFile, RunReport};
use crate::processors::clipper::clip_file;
use crate::readers::{BoundaryReader, ListingReader};
use crate::remote::RemoteSource;
use crate::utils::filename::decompressed_name;
use geo::MultiPolygon;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Listing -> bookmark filter -> download -> decompress -> clip -> cleanup, one file at a time
pub struct Pipeline<S: RemoteSource> {
    config: PipelineConfig,
    source: S,
    boundary: Arc<MultiPolygon<f64>>,
    bookmark: Bookmark,
}

impl<S: RemoteSource> Pipeline<S> {
    pub fn new(config: PipelineConfig, source: S, boundary: MultiPolygon<f64>) -> Self {
        let bookmark = config.bookmark();
        Self {
            config,
            source,
            boundary: Arc::new(boundary),
            bookmark,
        }
    }

    /// Load the boundary named by the configuration
    pub fn from_config(config: PipelineConfig, source: S) -> Result<Self> {
        let boundary = BoundaryReader::new().read(&config.boundary_path)?;
        Ok(Self::new(config, source, boundary))
    }

    /// For listing and download-only use; clipping against the empty boundary always fails
    pub fn without_boundary(config: PipelineConfig, source: S) -> Self {
        Self::new(config, source, MultiPolygon::new(Vec::new()))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn boundary(&self) -> &MultiPolygon<f64> {
        &self.boundary
    }

    /// Every file on the listing page with the configured suffix
    pub async fn list(&self) -> Result<Vec<RemoteFile>> {
        let listing_url = self.config.listing_url()?;
        let html = self.source.fetch_listing(&listing_url).await?;
        let files = ListingReader::new(&self.config.file_suffix).parse(&html, &listing_url)?;
        info!("Found {} file(s) on {}", files.len(), listing_url);
        Ok(files)
    }

    /// Listed files that sort after the bookmark
    pub async fn pending(&self) -> Result<Vec<RemoteFile>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|f| self.bookmark.admits(&f.name))
            .collect())
    }

    /// Full run. Only a listing failure aborts; per-file failures end up in the report.
    pub async fn run(&self) -> Result<RunReport> {
        self.config.ensure_directories()?;
        let files = self.list().await?;

        let mut report = RunReport::new();
        for file in &files {
            let outcome = self.process_file(file).await;
            report.record(file.name.clone(), outcome);
        }

        info!(
            "Run finished: {} completed, {} skipped, {} failed",
            report.completed_count(),
            report.skipped_count(),
            report.failed_count()
        );
        Ok(report)
    }

    /// Download admitted files and keep them compressed
    pub async fn fetch(&self) -> Result<RunReport> {
        self.config.ensure_directories()?;
        let files = self.list().await?;

        let mut report = RunReport::new();
        for file in &files {
            let outcome = if self.bookmark.admits(&file.name) {
                let mut intermediates = IntermediateFiles::new();
                match self.download(file, &mut intermediates).await {
                    Ok(path) => {
                        intermediates.keep();
                        FileOutcome::Downloaded { path }
                    }
                    Err(outcome) => outcome,
                }
            } else {
                info!("Skipping {} (already processed)", file.name);
                FileOutcome::Skipped
            };
            report.record(file.name.clone(), outcome);
        }

        Ok(report)
    }

    pub async fn process_file(&self, file: &RemoteFile) -> FileOutcome {
        if !self.bookmark.admits(&file.name) {
            info!("Skipping {} (already processed)", file.name);
            return FileOutcome::Skipped;
        }

        let mut intermediates = IntermediateFiles::new();

        let compressed = match self.download(file, &mut intermediates).await {
            Ok(path) => path,
            Err(outcome) => return outcome,
        };

        let extracted = intermediates.track(
            self.config
                .extract_dir
                .join(decompressed_name(&file.name)),
        );
        let (src, dst) = (compressed.clone(), extracted.clone());
        if let Err(e) = run_blocking(move || decompress_gz_to(&src, &dst)).await {
            warn!("Failed to process {}: {}", file.name, e);
            return FileOutcome::DecompressFailed {
                reason: e.to_string(),
            };
        }
        info!("Extracted and saved GeoTIFF: {}", extracted.display());

        let output = self.config.output_dir.join(decompressed_name(&file.name));
        let boundary = Arc::clone(&self.boundary);
        let (src, dst) = (extracted.clone(), output.clone());
        match run_blocking(move || clip_file(&src, &dst, &boundary)).await {
            Ok(clipped) => info!(
                "Clipped and saved: {} ({}x{})",
                output.display(),
                clipped.width,
                clipped.height
            ),
            Err(e) => {
                warn!("Failed to process {}: {}", file.name, e);
                return FileOutcome::ClipFailed {
                    reason: e.to_string(),
                };
            }
        }

        if self.config.keep_intermediates {
            intermediates.keep();
        }

        FileOutcome::Completed { output }
    }

    async fn download(
        &self,
        file: &RemoteFile,
        intermediates: &mut IntermediateFiles,
    ) -> std::result::Result<PathBuf, FileOutcome> {
        let compressed = intermediates.track(self.config.download_dir.join(&file.name));

        match self
            .source
            .download(&file.url, &compressed, self.config.chunk_size)
            .await
        {
            Ok(bytes) => {
                info!("Downloaded: {} ({} bytes)", file.name, bytes);
                Ok(compressed)
            }
            Err(e) => {
                warn!("Failed to download {}: {}", file.name, e);
                Err(FileOutcome::DownloadFailed {
                    reason: e.to_string(),
                })
            }
        }
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}
