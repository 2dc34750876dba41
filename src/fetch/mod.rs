//! Fetching resource archives into the download cache.

pub mod verifier;

pub use verifier::{CacheVerifier, VerificationResult};

use crate::cache::Cache;
use crate::core::{StagerError, StagerResult};
use crate::di::Fetcher;
use crate::formula::Resource;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where a resource URL points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Remote(String),
    Local(PathBuf),
}

impl SourceLocation {
    pub fn parse(url: &str) -> StagerResult<Self> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return Ok(SourceLocation::Remote(url.to_string()));
        }
        if let Some(path) = url.strip_prefix("file://") {
            return Ok(SourceLocation::Local(PathBuf::from(path)));
        }
        if let Some((scheme, _)) = url.split_once("://") {
            return Err(StagerError::Manifest(format!(
                "Unsupported URL scheme '{}' in {}",
                scheme, url
            )));
        }
        Ok(SourceLocation::Local(PathBuf::from(url)))
    }
}

/// Fetches over HTTP(S) or from the local filesystem into the cache
pub struct HttpFetcher {
    client: Client,
    cache: Cache,
}

impl HttpFetcher {
    pub fn new(cache: Cache, timeout: Duration) -> StagerResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stager/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(StagerError::Http)?;
        Ok(Self { client, cache })
    }

    /// Fetch a resource, reusing a cached copy when present
    pub async fn fetch_resource(&self, resource: &Resource) -> StagerResult<PathBuf> {
        let dest = self.cache.source_path(&resource.url);

        if self.cache.exists(&dest) {
            debug!(resource = %resource.name, path = %dest.display(), "using cached archive");
            return Ok(dest);
        }

        match SourceLocation::parse(&resource.url)? {
            SourceLocation::Remote(url) => self.download(resource, &url, &dest).await?,
            SourceLocation::Local(path) => self.copy_local(resource, &path, &dest)?,
        }

        Ok(dest)
    }

    async fn download(&self, resource: &Resource, url: &str, dest: &Path) -> StagerResult<()> {
        info!(resource = %resource.name, %url, "downloading");

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StagerError::fetch(&resource.name, e))?;

        if !response.status().is_success() {
            return Err(StagerError::fetch(
                &resource.name,
                format!("HTTP {} from {}", response.status(), url),
            ));
        }

        let pb = download_progress(&resource.name, response.content_length());
        let mut writer = self.cache.writer(dest)?;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| StagerError::fetch(&resource.name, e))?
        {
            writer.write_all(&chunk)?;
            pb.inc(chunk.len() as u64);
        }

        writer.commit()?;
        pb.finish_and_clear();
        Ok(())
    }

    fn copy_local(&self, resource: &Resource, source: &Path, dest: &Path) -> StagerResult<()> {
        if !source.is_file() {
            return Err(StagerError::fetch(
                &resource.name,
                format!("no such file: {}", source.display()),
            ));
        }
        debug!(resource = %resource.name, source = %source.display(), "copying local archive");
        let data = fs::read(source).map_err(|e| StagerError::fetch(&resource.name, e))?;
        self.cache.write(dest, &data)
    }
}

/// Fetch a resource and check it against its declared checksum.
///
/// On a mismatch the fetched copy is evicted so a later run downloads it
/// again. A resource without a checksum is accepted with a warning.
pub async fn fetch_verified(fetcher: &dyn Fetcher, resource: &Resource) -> StagerResult<PathBuf> {
    let path = fetcher.fetch(resource).await?;

    let Some(expected) = resource.declared_checksum()? else {
        warn!(resource = %resource.name, "no checksum declared, skipping verification");
        return Ok(path);
    };

    match expected.verify_file(&path)? {
        Ok(()) => {
            debug!(resource = %resource.name, checksum = %expected, "checksum verified");
            Ok(path)
        }
        Err(actual) => {
            fetcher.evict(resource)?;
            Err(StagerError::Integrity {
                resource: resource.name.clone(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            })
        }
    }
}

fn download_progress(name: &str, len: Option<u64>) -> ProgressBar {
    let pb = match len {
        Some(len) => {
            let pb = ProgressBar::new(len);
            let style = ProgressStyle::default_bar()
                .template("  {msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes}")
                .map(|s| s.progress_chars("#>-"))
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            pb.set_style(style);
            pb
        }
        None => ProgressBar::new_spinner(),
    };
    pb.set_message(name.to_string());
    pb
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, resource: &Resource) -> StagerResult<PathBuf> {
        self.fetch_resource(resource).await
    }

    fn cached(&self, resource: &Resource) -> Option<PathBuf> {
        let path = self.cache.source_path(&resource.url);
        self.cache.exists(&path).then_some(path)
    }

    fn evict(&self, resource: &Resource) -> StagerResult<()> {
        self.cache.evict(&self.cache.source_path(&resource.url))
    }
}
