use thiserror::Error;

pub type StagerResult<T> = Result<T, StagerError>;

#[derive(Error, Debug)]
pub enum StagerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WalkDir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Path error: {0}")]
    Path(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid formula: {0}")]
    Manifest(String),

    /// Source unreachable or archive corrupt.
    #[error("Failed to fetch '{resource}': {reason}")]
    Fetch { resource: String, reason: String },

    /// Computed digest differs from the declared one.
    #[error("Integrity check failed for '{resource}': expected {expected}, got {actual}")]
    Integrity {
        resource: String,
        expected: String,
        actual: String,
    },

    /// The underlying install procedure exited non-zero.
    /// `output` holds the tool's diagnostics.
    #[error("Install step for '{resource}' failed ({status})")]
    InstallStep {
        resource: String,
        status: String,
        output: String,
    },

    #[error("Prefix conflict: {0}")]
    PrefixConflict(String),

    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    /// A subprocess exited with a non-zero status code.
    /// The exit code should be propagated to the shell.
    #[error("Command exited with code {0}")]
    SubprocessExit(i32),
}

impl StagerError {
    pub fn fetch(resource: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        StagerError::Fetch {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }
}
