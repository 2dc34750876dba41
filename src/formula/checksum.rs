use crate::core::{StagerError, StagerResult};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::str::FromStr;

/// Checksum algorithm for verifying resource integrity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumAlgorithm {
    /// SHA-256, the format formulae use for bare hex digests
    #[default]
    Sha256,
    /// BLAKE3
    Blake3,
}

impl ChecksumAlgorithm {
    pub fn prefix(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Sha256 => "sha256",
            ChecksumAlgorithm::Blake3 => "blake3",
        }
    }
}

/// A declared integrity hash: algorithm plus lowercase hex digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    pub algorithm: ChecksumAlgorithm,
    pub digest: String,
}

/// Both supported algorithms produce 32-byte digests.
const DIGEST_HEX_LEN: usize = 64;

impl FromStr for Checksum {
    type Err = StagerError;

    /// Accepts `sha256:<hex>`, `blake3:<hex>` or bare hex (sha256).
    fn from_str(s: &str) -> StagerResult<Self> {
        let s = s.trim();
        let (algorithm, digest) = match s.split_once(':') {
            Some(("sha256", d)) => (ChecksumAlgorithm::Sha256, d),
            Some(("blake3", d)) => (ChecksumAlgorithm::Blake3, d),
            Some((other, _)) => {
                return Err(StagerError::Manifest(format!(
                    "Unsupported checksum algorithm '{}'. Supported: sha256, blake3",
                    other
                )))
            }
            None => (ChecksumAlgorithm::Sha256, s),
        };

        if digest.len() != DIGEST_HEX_LEN || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(StagerError::Manifest(format!(
                "Invalid checksum '{}': expected {} hex characters",
                s, DIGEST_HEX_LEN
            )));
        }

        Ok(Self {
            algorithm,
            digest: digest.to_ascii_lowercase(),
        })
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm.prefix(), self.digest)
    }
}

impl Checksum {
    /// Compute the checksum of a file with the given algorithm
    pub fn compute(path: &Path, algorithm: ChecksumAlgorithm) -> StagerResult<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let digest = match algorithm {
            ChecksumAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                io::copy(&mut reader, &mut hasher)?;
                hex::encode(hasher.finalize())
            }
            ChecksumAlgorithm::Blake3 => {
                let mut hasher = blake3::Hasher::new();
                io::copy(&mut reader, &mut hasher)?;
                hasher.finalize().to_hex().to_string()
            }
        };
        Ok(Self { algorithm, digest })
    }

    /// Check a file against this checksum, returning the actual value on mismatch
    pub fn verify_file(&self, path: &Path) -> StagerResult<Result<(), Checksum>> {
        let actual = Self::compute(path, self.algorithm)?;
        if actual.digest == self.digest {
            Ok(Ok(()))
        } else {
            Ok(Err(actual))
        }
    }
}
