use crate::error::{EtlError, Result};
use crate::models::RemoteFile;
use crate::utils::filename::file_name_from_url;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

/// Extracts downloadable files from an HTML directory index
pub struct ListingReader {
    suffix: String,
}

impl ListingReader {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    /// Every `<a href>` ending in the suffix, resolved against `base_url`, in page order
    pub fn parse(&self, html: &str, base_url: &Url) -> Result<Vec<RemoteFile>> {
        let document = Html::parse_document(html);
        let anchors =
            Selector::parse("a[href]").map_err(|e| EtlError::Selector(format!("{e:?}")))?;

        let mut files = Vec::new();
        for element in document.select(&anchors) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if !href.ends_with(&self.suffix) {
                continue;
            }

            let url = match base_url.join(href) {
                Ok(url) => url,
                Err(e) => {
                    warn!("listing: ignoring unresolvable href {}: {}", href, e);
                    continue;
                }
            };
            match file_name_from_url(&url) {
                Ok(name) => files.push(RemoteFile::new(name, url)),
                Err(e) => warn!("listing: ignoring href {}: {}", href, e),
            }
        }

        debug!(
            "listing: {} of {} anchors end with {}",
            files.len(),
            document.select(&anchors).count(),
            self.suffix
        );

        Ok(files)
    }
}
