use crate::error::Result;
use crate::models::Bookmark;
use crate::utils::constants::{
    BOUNDARY_PATH, COMPRESSED_SUFFIX, DEFAULT_BASE_URL, DEFAULT_BOOKMARK, DEFAULT_CHUNK_SIZE,
    DEFAULT_TIMEOUT_SECS, DOWNLOAD_DIR, ENV_PREFIX, EXTRACT_DIR, OUTPUT_DIR,
};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Everything a pipeline run needs; replaces the literals of a one-shot script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PipelineConfig {
    #[validate(url)]
    pub base_url: String,

    /// Last processed file name; `None` processes every listed file
    pub bookmark: Option<String>,

    #[validate(length(min = 1))]
    pub file_suffix: String,

    pub download_dir: PathBuf,
    pub extract_dir: PathBuf,
    pub output_dir: PathBuf,
    pub boundary_path: PathBuf,

    #[validate(range(min = 1, max = 16777216))]
    pub chunk_size: usize,

    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,

    pub keep_intermediates: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            bookmark: Some(DEFAULT_BOOKMARK.to_string()),
            file_suffix: COMPRESSED_SUFFIX.to_string(),
            download_dir: PathBuf::from(DOWNLOAD_DIR),
            extract_dir: PathBuf::from(EXTRACT_DIR),
            output_dir: PathBuf::from(OUTPUT_DIR),
            boundary_path: PathBuf::from(BOUNDARY_PATH),
            chunk_size: DEFAULT_CHUNK_SIZE,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            keep_intermediates: false,
        }
    }
}

impl PipelineConfig {
    /// Layer defaults, an optional TOML file and `CHIRPS_ETL_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("base_url", defaults.base_url.as_str())?
            .set_default("bookmark", DEFAULT_BOOKMARK)?
            .set_default("file_suffix", defaults.file_suffix.as_str())?
            .set_default("download_dir", DOWNLOAD_DIR)?
            .set_default("extract_dir", EXTRACT_DIR)?
            .set_default("output_dir", OUTPUT_DIR)?
            .set_default("boundary_path", BOUNDARY_PATH)?
            .set_default("chunk_size", defaults.chunk_size as i64)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs as i64)?
            .set_default("keep_intermediates", defaults.keep_intermediates)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize::<PipelineConfig>()?;

        config.validate()?;
        Ok(config)
    }

    pub fn with_bookmark(mut self, bookmark: Option<String>) -> Self {
        self.bookmark = bookmark;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_directories(
        mut self,
        download_dir: impl Into<PathBuf>,
        extract_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        self.download_dir = download_dir.into();
        self.extract_dir = extract_dir.into();
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_boundary_path(mut self, boundary_path: impl Into<PathBuf>) -> Self {
        self.boundary_path = boundary_path.into();
        self
    }

    pub fn with_keep_intermediates(mut self, keep: bool) -> Self {
        self.keep_intermediates = keep;
        self
    }

    pub fn bookmark(&self) -> Bookmark {
        Bookmark::new(self.bookmark.clone())
    }

    /// Listing URL with a trailing slash so relative hrefs resolve inside the directory
    pub fn listing_url(&self) -> Result<Url> {
        if self.base_url.ends_with('/') {
            Ok(Url::parse(&self.base_url)?)
        } else {
            Ok(Url::parse(&format!("{}/", self.base_url))?)
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.download_dir, &self.extract_dir, &self.output_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
