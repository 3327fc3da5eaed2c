use thiserror::Error;

pub type Result<T> = std::result::Result<T, EtlError>;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Failed to retrieve the listing page {url}: HTTP {status}")]
    ListingStatus { url: String, status: u16 },

    #[error("Failed to download {url}: HTTP {status}")]
    DownloadStatus { url: String, status: u16 },

    #[error("Download of {url} incomplete: received {received} of {expected} bytes")]
    IncompleteDownload {
        url: String,
        received: u64,
        expected: u64,
    },

    #[error("Invalid listing selector: {0}")]
    Selector(String),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Invalid raster: {0}")]
    InvalidRaster(String),

    #[error("Invalid boundary: {0}")]
    InvalidBoundary(String),

    #[error("Input shapes do not overlap raster")]
    NoOverlap,

    #[error("Shapefile error: {0}")]
    Shapefile(#[from] shapefile::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}
