use crate::error::{EtlError, Result};
use crate::utils::constants::GZIP_SUFFIX;
use url::Url;

/// Name of the decompressed sibling: `chirps-v2.0.2003.10.2.tif.gz` -> `chirps-v2.0.2003.10.2.tif`
pub fn decompressed_name(file_name: &str) -> &str {
    file_name.strip_suffix(GZIP_SUFFIX).unwrap_or(file_name)
}

/// Last non-empty path segment of a URL
pub fn file_name_from_url(url: &Url) -> Result<String> {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| s.to_string())
        .ok_or_else(|| EtlError::InvalidFileName(url.to_string()))
}
