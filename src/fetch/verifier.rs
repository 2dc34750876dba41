use crate::core::StagerResult;
use crate::di::Fetcher;
use crate::formula::Resource;
use std::sync::Arc;

/// Verifies already fetched archives against their declared checksums,
/// without downloading anything
pub struct CacheVerifier {
    fetcher: Arc<dyn Fetcher>,
}

impl CacheVerifier {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Check every resource. Nothing is evicted; this is a read-only report.
    pub fn verify_all<'a, I>(&self, resources: I) -> StagerResult<VerificationResult>
    where
        I: IntoIterator<Item = &'a Resource>,
    {
        let mut result = VerificationResult::new();

        for resource in resources {
            let Some(path) = self.fetcher.cached(resource) else {
                result.missing.push(resource.name.clone());
                continue;
            };

            let Some(expected) = resource.declared_checksum()? else {
                result.unchecked.push(resource.name.clone());
                continue;
            };

            match expected.verify_file(&path)? {
                Ok(()) => result.add_success(resource.name.clone()),
                Err(actual) => result.add_failure(
                    resource.name.clone(),
                    format!("expected {}, got {}", expected, actual),
                ),
            }
        }

        Ok(result)
    }
}

/// Result of verification operation
#[derive(Debug, Clone, Default)]
pub struct VerificationResult {
    pub successful: Vec<String>,
    pub failed: Vec<(String, String)>,
    /// Not fetched yet
    pub missing: Vec<String>,
    /// Fetched, but no checksum is declared
    pub unchecked: Vec<String>,
}

impl VerificationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_success(&mut self, resource: String) {
        self.successful.push(resource);
    }

    pub fn add_failure(&mut self, resource: String, error: String) {
        self.failed.push((resource, error));
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.missing.is_empty()
    }
}
