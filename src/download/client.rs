use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, FetchError, Result};
use crate::report::Reporter;

/// Published location of the NAF statistics dump
pub const DEFAULT_URL: &str = "https://member.thenaf.net/glicko/nafstat-tmp-name.zip";

/// The dump host turns away non-browser clients
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const CHUNK_SIZE: usize = 8192;

pub struct ArchiveFetcher {
    client: Client,
}

impl ArchiveFetcher {
    /// Build a fetcher whose whole request (connect through last body byte)
    /// must finish within `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        // gzip/deflate/brotli features make reqwest send Accept-Encoding and decode
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(30))
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    /// Stream `url` into `dest`, returning the number of bytes written
    pub fn download(&self, url: &str, dest: &Path, reporter: &mut impl Reporter) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            }
            .into());
        }

        let total_size = response.content_length().unwrap_or(0);

        let mut file = File::create(dest)
            .map_err(|e| Error::io(format!("Failed to create destination file: {:?}", dest), e))?;

        let mut downloaded: u64 = 0;
        let mut buffer = [0u8; CHUNK_SIZE];
        let mut reader = response;

        loop {
            let bytes_read = reader
                .read(&mut buffer)
                .map_err(|source| FetchError::Body {
                    url: url.to_string(),
                    source,
                })?;

            if bytes_read == 0 {
                break;
            }

            file.write_all(&buffer[..bytes_read])
                .map_err(|e| Error::io(format!("Failed to write to file: {:?}", dest), e))?;

            downloaded += bytes_read as u64;
            reporter.set_progress(downloaded, total_size, format_bytes(downloaded, total_size));
        }

        file.flush()
            .map_err(|e| Error::io(format!("Failed to write to file: {:?}", dest), e))?;

        tracing::info!(url, bytes = downloaded, path = ?dest, "download complete");
        Ok(downloaded)
    }
}

/// Format bytes as human-readable string
fn format_bytes(current: u64, total: u64) -> String {
    fn fmt(bytes: u64) -> String {
        if bytes >= 1_000_000_000 {
            format!("{:.1} GB", bytes as f64 / 1_000_000_000.0)
        } else if bytes >= 1_000_000 {
            format!("{:.1} MB", bytes as f64 / 1_000_000.0)
        } else if bytes >= 1_000 {
            format!("{:.1} KB", bytes as f64 / 1_000.0)
        } else {
            format!("{} B", bytes)
        }
    }
    if total == 0 {
        return fmt(current);
    }
    format!("{} / {}", fmt(current), fmt(total))
}
