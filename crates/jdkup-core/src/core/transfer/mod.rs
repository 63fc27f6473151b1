//! Fetching toolchain archives from `file:` and `http(s):` URIs.

mod archive;
mod checksum;

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::{Client, Response};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_LENGTH};
use reqwest::StatusCode;
use sha2::{Digest, Sha256};
use tempfile::Builder;
use url::Url;

use crate::jdks::STAGING_PREFIX;
use crate::ToolchainError;

pub use archive::{unpack, ArchiveKind};
pub use checksum::{is_complete_archive, sha256_file, sidecar_path, write_sidecar};

const CHUNK_SIZE: usize = 64 * 1024;

/// What the remote end says about a resource before it is downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMetadata {
    pub location: Url,
    pub file_name: String,
    pub length: Option<u64>,
}

/// A finished download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedResource {
    pub size: u64,
    pub sha256: String,
}

/// Shared flag that aborts an in-flight download at the next chunk.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub trait ResourceFetcher: Send + Sync {
    /// File name and length of the resource at `uri`.
    ///
    /// # Errors
    /// Returns an error if the resource cannot be reached.
    fn resource_metadata(&self, uri: &Url) -> Result<ResourceMetadata>;

    /// Streams `uri` into `destination`, which only appears once complete.
    ///
    /// # Errors
    /// Returns an error on transport failures, truncated bodies or
    /// [`ToolchainError::Cancelled`].
    fn download(
        &self,
        uri: &Url,
        destination: &Path,
        cancellation: &Cancellation,
    ) -> Result<DownloadedResource>;
}

/// Fetches `file:` URIs from disk and everything else through `reqwest`.
pub struct HttpResourceFetcher {
    client: Client,
}

impl HttpResourceFetcher {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn get(&self, uri: &Url) -> Result<Response> {
        self.client
            .get(uri.clone())
            .send()
            .with_context(|| format!("failed to fetch {uri}"))?
            .error_for_status()
            .with_context(|| format!("unexpected response for {uri}"))
    }
}

impl ResourceFetcher for HttpResourceFetcher {
    fn resource_metadata(&self, uri: &Url) -> Result<ResourceMetadata> {
        if uri.scheme() == "file" {
            let path = local_path(uri)?;
            let metadata = fs::metadata(&path)
                .with_context(|| format!("could not read {}", path.display()))?;
            return Ok(ResourceMetadata {
                location: uri.clone(),
                file_name: file_name_of(uri)?,
                length: Some(metadata.len()),
            });
        }
        let head = self
            .client
            .head(uri.clone())
            .send()
            .with_context(|| format!("failed to fetch {uri}"))?;
        let response = if head.status() == StatusCode::METHOD_NOT_ALLOWED {
            self.get(uri)?
        } else {
            head.error_for_status()
                .with_context(|| format!("unexpected response for {uri}"))?
        };
        let location = response.url().clone();
        let file_name = match disposition_file_name(&response) {
            Some(name) => name,
            None => file_name_of(&location)?,
        };
        let length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok());
        Ok(ResourceMetadata {
            location,
            file_name,
            length,
        })
    }

    fn download(
        &self,
        uri: &Url,
        destination: &Path,
        cancellation: &Cancellation,
    ) -> Result<DownloadedResource> {
        let (reader, expected): (Box<dyn Read>, Option<u64>) = if uri.scheme() == "file" {
            let path = local_path(uri)?;
            let file =
                File::open(&path).with_context(|| format!("could not read {}", path.display()))?;
            let length = file.metadata().ok().map(|metadata| metadata.len());
            (Box::new(file), length)
        } else {
            let response = self.get(uri)?;
            let length = response.content_length();
            (Box::new(response), length)
        };
        tracing::info!(uri = %uri, destination = %destination.display(), "downloading toolchain");
        stream_to_file(reader, expected, destination, cancellation)
            .with_context(|| format!("could not download {uri}"))
    }
}

/// Copies `reader` into a staging file next to `destination`, then renames it
/// into place and writes the checksum sidecar.
pub(crate) fn stream_to_file(
    mut reader: impl Read,
    expected: Option<u64>,
    destination: &Path,
    cancellation: &Cancellation,
) -> Result<DownloadedResource> {
    let parent = destination
        .parent()
        .with_context(|| format!("{} has no parent directory", destination.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    let mut staged = Builder::new()
        .prefix(STAGING_PREFIX)
        .tempfile_in(parent)
        .with_context(|| format!("failed to stage download under {}", parent.display()))?;
    let mut hasher = Sha256::new();
    let mut written: u64 = 0;
    let mut buffer = vec![0_u8; CHUNK_SIZE];
    loop {
        if cancellation.is_cancelled() {
            return Err(ToolchainError::Cancelled.into());
        }
        let read = reader.read(&mut buffer).context("stream error")?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
        staged.write_all(&buffer[..read])?;
        written += read as u64;
    }
    if let Some(expected) = expected {
        if written != expected {
            bail!("received {written} bytes but expected {expected}");
        }
    }
    staged.as_file_mut().flush()?;
    staged
        .persist(destination)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to persist {}", destination.display()))?;
    let sha256 = hex::encode(hasher.finalize());
    write_sidecar(destination, &sha256)?;
    Ok(DownloadedResource {
        size: written,
        sha256,
    })
}

fn local_path(uri: &Url) -> Result<std::path::PathBuf> {
    uri.to_file_path()
        .map_err(|()| anyhow!("{uri} is not a local file path"))
}

fn file_name_of(uri: &Url) -> Result<String> {
    uri.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(ToOwned::to_owned)
        .with_context(|| format!("cannot determine a file name for {uri}"))
}

fn disposition_file_name(response: &Response) -> Option<String> {
    let header = response.headers().get(CONTENT_DISPOSITION)?.to_str().ok()?;
    header.split(';').map(str::trim).find_map(|part| {
        let value = part.strip_prefix("filename=")?;
        let value = value.trim_matches('"');
        (!value.is_empty() && !value.contains(['/', '\\'])).then(|| value.to_string())
    })
}
