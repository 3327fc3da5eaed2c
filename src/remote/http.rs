use crate::error::{EtlError, Result};
use crate::remote::RemoteSource;
use crate::utils::constants::MAX_CHUNK_SIZE;
use crate::utils::ProgressReporter;
use futures_util::StreamExt;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

const USER_AGENT: &str = concat!("chirps-clipper/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct HttpSource {
    client: Client,
    show_progress: bool,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
}

impl RemoteSource for HttpSource {
    async fn fetch_listing(&self, url: &Url) -> Result<String> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EtlError::ListingStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    async fn download(&self, url: &Url, dest: &Path, chunk_size: usize) -> Result<u64> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EtlError::DownloadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let expected = response.content_length();
        let label = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| url.to_string());
        let progress = ProgressReporter::new_download(&label, expected, !self.show_progress);

        let mut file = File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = match (chunk, expected) {
                (Ok(chunk), _) => chunk,
                // Connection dropped before Content-Length bytes arrived
                (Err(_), Some(expected)) if written < expected => {
                    return Err(EtlError::IncompleteDownload {
                        url: url.to_string(),
                        received: written,
                        expected,
                    });
                }
                (Err(e), _) => return Err(e.into()),
            };
            for piece in chunk.chunks(chunk_size.clamp(1, MAX_CHUNK_SIZE)) {
                file.write_all(piece).await?;
            }
            written += chunk.len() as u64;
            progress.increment(chunk.len() as u64);
        }
        file.flush().await?;
        progress.finish_and_clear();

        if let Some(expected) = expected {
            if written < expected {
                return Err(EtlError::IncompleteDownload {
                    url: url.to_string(),
                    received: written,
                    expected,
                });
            }
        }

        debug!("downloaded {} bytes from {}", written, url);
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Answer a single request on a local port with a canned HTTP response
    async fn serve_once(response: Vec<u8>) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(&response).await.unwrap();
            socket.shutdown().await.ok();
        });

        Url::parse(&format!("http://{}/tifs/chirps-v2.0.2003.10.2.tif.gz", addr)).unwrap()
    }

    fn response(status: &str, content_length: usize, body: &[u8]) -> Vec<u8> {
        let mut bytes = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status, content_length
        )
        .into_bytes();
        bytes.extend_from_slice(body);
        bytes
    }

    fn local_source() -> HttpSource {
        let client = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap();
        HttpSource::from_client(client)
    }

    #[tokio::test]
    async fn test_download_writes_body() {
        let body: Vec<u8> = (0..=255u8).cycle().take(5000).collect();
        let url = serve_once(response("200 OK", body.len(), &body)).await;
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("chirps-v2.0.2003.10.2.tif.gz");

        let written = local_source().download(&url, &dest, 7).await.unwrap();

        assert_eq!(written, body.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), body);
    }

    #[tokio::test]
    async fn test_download_not_found_creates_no_file() {
        let url = serve_once(response("404 Not Found", 9, b"not found")).await;
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("chirps-v2.0.2003.10.2.tif.gz");

        let result = local_source().download(&url, &dest, 1024).await;

        assert!(matches!(
            result,
            Err(EtlError::DownloadStatus { status: 404, .. })
        ));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_download_short_body_is_incomplete() {
        let url = serve_once(response("200 OK", 20, b"12345")).await;
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("chirps-v2.0.2003.10.2.tif.gz");

        match local_source().download(&url, &dest, 1024).await {
            Err(EtlError::IncompleteDownload {
                received, expected, ..
            }) => {
                assert_eq!(expected, 20);
                assert!(received < 20);
            }
            other => panic!("expected incomplete download, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_listing() {
        let html = b"<html><a href=\"chirps-v2.0.2003.10.2.tif.gz\">x</a></html>";
        let url = serve_once(response("200 OK", html.len(), html)).await;
        let listing = local_source().fetch_listing(&url).await.unwrap();
        assert!(listing.contains("chirps-v2.0.2003.10.2.tif.gz"));

        let url = serve_once(response("503 Service Unavailable", 0, b"")).await;
        assert!(matches!(
            local_source().fetch_listing(&url).await,
            Err(EtlError::ListingStatus { status: 503, .. })
        ));
    }

    #[test]
    fn test_client_builds_with_timeout() {
        let source = HttpSource::new(Duration::from_secs(5)).unwrap().with_progress(true);
        assert!(source.show_progress);
    }

    #[test]
    fn test_user_agent_names_crate() {
        assert!(USER_AGENT.starts_with("chirps-clipper/"));
    }
}
