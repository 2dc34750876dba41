use crate::cache::archive_extension;
use crate::core::{StagerError, StagerResult};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tar::Archive;

/// Files that mark a directory as a Python source tree
const SOURCE_MARKERS: &[&str] = &["setup.py", "pyproject.toml"];

/// Extracts source archives (tar.gz, zip) to a staging directory
pub struct PackageExtractor {
    dest_dir: PathBuf,
}

impl PackageExtractor {
    /// Create a new PackageExtractor
    pub fn new(dest_dir: PathBuf) -> Self {
        Self { dest_dir }
    }

    /// Extract the archive of resource `name`.
    ///
    /// Returns the source root: the single top-level directory, or the
    /// staging directory itself when the archive keeps its sources at the
    /// root. Unreadable archives are reported as fetch failures.
    pub fn extract(&self, name: &str, archive_path: &Path) -> StagerResult<PathBuf> {
        let extension = archive_extension(&archive_path.to_string_lossy())
            .ok_or_else(|| StagerError::fetch(name, "unknown archive format"))?;

        let temp_dir = self.temp_dir_for(name);
        let result = match extension {
            "tar.gz" | "tgz" => self.extract_targz(name, archive_path, &temp_dir),
            "zip" => self.extract_zip(name, archive_path, &temp_dir),
            other => Err(StagerError::fetch(
                name,
                format!("unsupported source archive format: {}", other),
            )),
        };

        // Cleanup temp directory on error
        if result.is_err() {
            let _ = fs::remove_dir_all(&temp_dir); // Ignore cleanup errors
        }

        result
    }

    /// Remove the staging directory of resource `name`
    pub fn cleanup(&self, name: &str) {
        let _ = fs::remove_dir_all(self.temp_dir_for(name));
    }

    fn temp_dir_for(&self, name: &str) -> PathBuf {
        self.dest_dir.join(format!(".tmp-{}", name))
    }

    fn prepare(temp_dir: &Path) -> StagerResult<()> {
        // Clean up any existing temp dir
        if temp_dir.exists() {
            fs::remove_dir_all(temp_dir)?;
        }
        fs::create_dir_all(temp_dir)?;
        Ok(())
    }

    fn extract_targz(&self, name: &str, archive_path: &Path, temp_dir: &Path) -> StagerResult<PathBuf> {
        let file = File::open(archive_path)?;
        let decoder = GzDecoder::new(file);
        let mut archive = Archive::new(decoder);

        Self::prepare(temp_dir)?;
        archive
            .unpack(temp_dir)
            .map_err(|e| StagerError::fetch(name, format!("corrupt archive: {}", e)))?;

        Self::source_root(name, temp_dir)
    }

    fn extract_zip(&self, name: &str, archive_path: &Path, temp_dir: &Path) -> StagerResult<PathBuf> {
        use zip::ZipArchive;

        let file = File::open(archive_path)?;
        let mut archive = ZipArchive::new(file)
            .map_err(|e| StagerError::fetch(name, format!("corrupt archive: {}", e)))?;

        Self::prepare(temp_dir)?;
        archive
            .extract(temp_dir)
            .map_err(|e| StagerError::fetch(name, format!("corrupt archive: {}", e)))?;

        Self::source_root(name, temp_dir)
    }

    fn source_root(name: &str, temp_dir: &Path) -> StagerResult<PathBuf> {
        if SOURCE_MARKERS.iter().any(|m| temp_dir.join(m).is_file()) {
            return Ok(temp_dir.to_path_buf());
        }

        let mut dirs = Vec::new();
        for entry in fs::read_dir(temp_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                dirs.push(entry.path());
            }
        }

        match dirs.len() {
            1 => Ok(dirs.remove(0)),
            0 => Err(StagerError::fetch(
                name,
                "archive has no root directory and no setup.py",
            )),
            n => Err(StagerError::fetch(
                name,
                format!("archive has {} top-level directories, expected one", n),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::TempDir;

    fn write_targz(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut tar = tar::Builder::new(encoder);
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_path(name).unwrap();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            tar.append(&header, *data).unwrap();
        }
        tar.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_extract_targz_with_root_directory() {
        let temp = TempDir::new().unwrap();
        let extractor = PackageExtractor::new(temp.path().join("staging"));
        let archive = temp.path().join("click-6.2.tar.gz");
        write_targz(
            &archive,
            &[
                ("click-6.2/setup.py", b"from setuptools import setup"),
                ("click-6.2/click/__init__.py", b""),
            ],
        );

        let root = extractor.extract("click", &archive).unwrap();
        assert!(root.ends_with("click-6.2"));
        assert!(root.join("setup.py").is_file());

        extractor.cleanup("click");
        assert!(!root.exists());
    }

    #[test]
    fn test_extract_targz_sources_at_root() {
        let temp = TempDir::new().unwrap();
        let extractor = PackageExtractor::new(temp.path().join("staging"));
        let archive = temp.path().join("flat.tgz");
        write_targz(&archive, &[("setup.py", b""), ("flat.py", b"")]);

        let root = extractor.extract("flat", &archive).unwrap();
        assert!(root.join("setup.py").is_file());
        assert!(root.ends_with(".tmp-flat"));
    }

    #[test]
    fn test_extract_targz_no_root_directory() {
        let temp = TempDir::new().unwrap();
        let extractor = PackageExtractor::new(temp.path().join("staging"));
        let archive = temp.path().join("loose.tar.gz");
        write_targz(&archive, &[("README", b"hi")]);

        let err = extractor.extract("loose", &archive).unwrap_err();
        assert!(err.to_string().contains("no root directory"));
        // Staging dir is cleaned up on error
        assert!(!temp.path().join("staging/.tmp-loose").exists());
    }

    #[test]
    fn test_extract_corrupt_targz_is_fetch_error() {
        let temp = TempDir::new().unwrap();
        let extractor = PackageExtractor::new(temp.path().join("staging"));
        let archive = temp.path().join("bad.tar.gz");
        fs::write(&archive, "not a real tar.gz").unwrap();

        let err = extractor.extract("bad", &archive).unwrap_err();
        assert!(matches!(err, StagerError::Fetch { .. }));
    }

    #[test]
    fn test_extract_zip_with_root_directory() {
        use std::io::Write;
        use zip::write::{FileOptions, ZipWriter};

        let temp = TempDir::new().unwrap();
        let extractor = PackageExtractor::new(temp.path().join("staging"));
        let archive = temp.path().join("pkg.zip");
        let file = File::create(&archive).unwrap();
        let mut zip = ZipWriter::new(file);
        zip.add_directory("pkg-1.0/", FileOptions::default()).unwrap();
        zip.start_file("pkg-1.0/setup.py", FileOptions::default()).unwrap();
        zip.write_all(b"").unwrap();
        zip.finish().unwrap();

        let root = extractor.extract("pkg", &archive).unwrap();
        assert!(root.ends_with("pkg-1.0"));
    }

    #[test]
    fn test_extract_corrupt_zip() {
        let temp = TempDir::new().unwrap();
        let extractor = PackageExtractor::new(temp.path().join("staging"));
        let archive = temp.path().join("bad.zip");
        fs::write(&archive, "not a real zip").unwrap();

        assert!(matches!(
            extractor.extract("bad", &archive),
            Err(StagerError::Fetch { .. })
        ));
    }

    #[test]
    fn test_extract_unknown_format() {
        let temp = TempDir::new().unwrap();
        let extractor = PackageExtractor::new(temp.path().join("staging"));
        let archive = temp.path().join("pkg.tar.bz2");
        fs::write(&archive, "x").unwrap();

        let err = extractor.extract("pkg", &archive).unwrap_err();
        assert!(err.to_string().contains("unknown archive format"));
    }

    #[test]
    fn test_extract_replaces_stale_staging_dir() {
        let temp = TempDir::new().unwrap();
        let extractor = PackageExtractor::new(temp.path().join("staging"));
        let stale = temp.path().join("staging/.tmp-click");
        fs::create_dir_all(stale.join("old-1.0")).unwrap();

        let archive = temp.path().join("click.tar.gz");
        write_targz(&archive, &[("click-6.2/setup.py", b"")]);

        let root = extractor.extract("click", &archive).unwrap();
        assert!(root.ends_with("click-6.2"));
        assert!(!stale.join("old-1.0").exists());
    }
}
