//! Streaming HTTP(S) downloader.
//!
//! The response body is copied to disk through a fixed-size buffer, so memory
//! use stays bounded regardless of the remote size.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use reqwest::blocking::{Client, Response};
use reqwest::Url;
use tracing::{debug, info, warn};

use super::error::DownloadError;
use super::filename::derive_filename;
use super::{DownloadedFile, Fetcher};
use crate::config::DEFAULT_FETCH_TIMEOUT_SECS;
use crate::storage::{Storage, UserId};
use crate::telemetry::UsageCounters;

/// Buffer size for reading/writing during downloads (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// HTTP-based fetcher writing into user namespaces.
#[derive(Debug)]
pub struct HttpDownloader {
    client: Client,
    storage: Storage,
    counters: Arc<UsageCounters>,
    pub(crate) timeout: Duration,
}

impl HttpDownloader {
    /// Create a downloader with the default fetch timeout.
    pub fn new(storage: Storage, counters: Arc<UsageCounters>) -> Result<Self, DownloadError> {
        Self::with_timeout(
            storage,
            counters,
            Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        )
    }

    /// Create a downloader with a custom fetch timeout.
    pub fn with_timeout(
        storage: Storage,
        counters: Arc<UsageCounters>,
        timeout: Duration,
    ) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DownloadError::Request {
                url: String::new(),
                reason: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            storage,
            counters,
            timeout,
        })
    }

    fn parse_locator(locator: &str) -> Result<Url, DownloadError> {
        let url = Url::parse(locator).map_err(|e| DownloadError::InvalidLocator {
            locator: locator.to_string(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(DownloadError::UnsupportedScheme {
                scheme: other.to_string(),
            }),
        }
    }

    fn request_error(&self, url: &str, e: reqwest::Error) -> DownloadError {
        if e.is_timeout() {
            DownloadError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            DownloadError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }

    /// Stream the response body to `dest`, returning the bytes written.
    fn stream_to_file(
        &self,
        url: &str,
        response: &mut Response,
        dest: &Path,
    ) -> Result<u64, DownloadError> {
        let file = File::create(dest).map_err(|e| DownloadError::Write {
            path: dest.to_path_buf(),
            source: e,
        })?;

        let mut writer = BufWriter::new(file);
        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut downloaded = 0u64;

        loop {
            let bytes_read = match response.read(&mut buffer) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                    return Err(DownloadError::Timeout {
                        url: url.to_string(),
                        timeout_secs: self.timeout.as_secs(),
                    })
                }
                Err(e) => {
                    return Err(DownloadError::Request {
                        url: url.to_string(),
                        reason: format!("read error: {}", e),
                    })
                }
            };

            if bytes_read == 0 {
                break;
            }

            writer
                .write_all(&buffer[..bytes_read])
                .map_err(|e| DownloadError::Write {
                    path: dest.to_path_buf(),
                    source: e,
                })?;

            downloaded += bytes_read as u64;
        }

        writer.flush().map_err(|e| DownloadError::Write {
            path: dest.to_path_buf(),
            source: e,
        })?;

        Ok(downloaded)
    }
}

impl Fetcher for HttpDownloader {
    fn fetch(&self, locator: &str, user: UserId) -> Result<DownloadedFile, DownloadError> {
        let _in_flight = self.counters.begin_download();

        let url = Self::parse_locator(locator)?;
        info!(user = %user, url = %url, "Download started");

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| self.request_error(locator, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(user = %user, url = %url, status = status.as_u16(), "Download rejected");
            return Err(DownloadError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let filename = derive_filename(locator, SystemTime::now());
        let dest = self.storage.file_path(user, &filename)?;

        let size = match self.stream_to_file(locator, &mut response, &dest) {
            Ok(size) => size,
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&dest) {
                    debug!(path = %dest.display(), error = %cleanup, "Partial file not removed");
                }
                warn!(user = %user, url = %url, error = %e, "Download failed");
                return Err(e);
            }
        };

        self.counters.download_completed(size);
        info!(user = %user, file = %filename, bytes = size, "Download finished");

        Ok(DownloadedFile {
            path: dest,
            filename,
            size,
        })
    }
}
