pub mod http;

pub use http::HttpSource;

use crate::error::Result;
use std::path::Path;
use url::Url;

/// Where listings and files come from; swapped for an in-memory source in tests
pub trait RemoteSource {
    /// Body of the directory listing page; a non-success status is an error
    async fn fetch_listing(&self, url: &Url) -> Result<String>;

    /// Stream `url` into `dest`, writing at most `chunk_size` bytes per write.
    /// Returns the number of bytes written.
    async fn download(&self, url: &Url, dest: &Path, chunk_size: usize) -> Result<u64>;
}
