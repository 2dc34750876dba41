use crate::core::path::{cache_dir, ensure_dir};
use crate::core::{StagerError, StagerResult};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Archive extensions recognised when naming cached files, longest first
const KNOWN_EXTENSIONS: &[&str] = &["tar.gz", "tgz", "zip", "whl"];

/// Download cache
#[derive(Clone, Debug)]
pub struct Cache {
    root: PathBuf,
}

impl Cache {
    /// Create a new cache instance
    pub fn new(cache_root: PathBuf) -> StagerResult<Self> {
        ensure_dir(&cache_root)?;
        Ok(Self { root: cache_root })
    }

    /// Get the default cache directory
    pub fn default_cache() -> StagerResult<Self> {
        Self::new(cache_dir()?)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the downloaded sources directory
    pub fn sources_dir(&self) -> PathBuf {
        self.root.join("sources")
    }

    /// Scratch space where archives are unpacked during an install
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join("staging")
    }

    /// Initialize cache directory structure
    pub fn init(&self) -> StagerResult<()> {
        ensure_dir(&self.sources_dir())?;
        ensure_dir(&self.staging_dir())?;
        Ok(())
    }

    /// Get the cached path for a source archive
    ///
    /// The file name is a hash of the URL, keeping the archive extension so
    /// the extractor can tell formats apart.
    pub fn source_path(&self, url: &str) -> PathBuf {
        let hash = Self::url_hash(url);
        let extension = archive_extension(url).unwrap_or("tar.gz");
        self.sources_dir().join(format!("{}.{}", hash, extension))
    }

    /// Check if a file exists in cache
    pub fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    /// Write a file to cache through a `.part` file, renamed once complete
    pub fn write(&self, path: &Path, data: &[u8]) -> StagerResult<()> {
        let mut writer = self.writer(path)?;
        writer.write_all(data)?;
        writer.commit()
    }

    /// Open a `.part` writer for a cache entry
    pub fn writer(&self, path: &Path) -> StagerResult<PartialFile> {
        PartialFile::create(path)
    }

    /// Drop a cached entry (after a failed verification)
    pub fn evict(&self, path: &Path) -> StagerResult<()> {
        if path.exists() {
            fs::remove_file(path).map_err(|e| {
                StagerError::Path(format!(
                    "Failed to evict cache entry {}: {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Hash a URL for use as a filename
    fn url_hash(url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let hash = hasher.finalize();
        hex::encode(&hash[..16]) // Use first 16 bytes for shorter filename
    }
}

/// Archive extension of a URL or path, ignoring query strings and fragments
pub fn archive_extension(url: &str) -> Option<&'static str> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let file_name = without_query.rsplit(['/', '\\']).next().unwrap_or(without_query);
    let lower = file_name.to_ascii_lowercase();
    KNOWN_EXTENSIONS
        .iter()
        .find(|ext| lower.ends_with(&format!(".{}", ext)))
        .copied()
}

/// A cache file being written; only visible under its final name after `commit`
pub struct PartialFile {
    part_path: PathBuf,
    final_path: PathBuf,
    file: Option<fs::File>,
}

impl PartialFile {
    fn create(final_path: &Path) -> StagerResult<Self> {
        if let Some(parent) = final_path.parent() {
            ensure_dir(parent)?;
        }
        let mut name = final_path.as_os_str().to_owned();
        name.push(".part");
        let part_path = PathBuf::from(name);
        let file = fs::File::create(&part_path)?;
        Ok(Self {
            part_path,
            final_path: final_path.to_path_buf(),
            file: Some(file),
        })
    }

    /// Flush and move the file to its final name
    pub fn commit(mut self) -> StagerResult<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
            file.sync_all()?;
        }
        fs::rename(&self.part_path, &self.final_path)?;
        Ok(())
    }
}

impl Write for PartialFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.file.as_mut() {
            Some(file) => file.write(buf),
            None => Err(std::io::Error::other("partial file already committed")),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        // Only reached with an open file when the download was abandoned.
        if self.file.take().is_some() {
            let _ = fs::remove_file(&self.part_path);
        }
    }
}
