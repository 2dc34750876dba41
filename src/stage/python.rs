//! The standard Python install procedure and the runner that executes it.

use crate::core::path::prefix_bin_dir;
use crate::core::{SearchPath, StagerError, StagerResult};
use crate::di::InstallRunner;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Runs `setup.py` through setuptools even for distutils-only packages,
/// the way pip does it.
pub const SETUPTOOLS_SHIM: &str = "import setuptools, tokenize;__file__='setup.py';\
exec(compile(getattr(tokenize, 'open', open)(__file__).read()\
.replace('\\r\\n', '\\n'), __file__, 'exec'))";

const VERSION_PROBE: &str = "import sys; print('%d.%d' % sys.version_info[:2])";

/// Arguments for a setuptools install into `prefix`
pub fn setup_install_args(prefix: &Path) -> Vec<String> {
    vec![
        "-c".to_string(),
        SETUPTOOLS_SHIM.to_string(),
        "--no-user-cfg".to_string(),
        "install".to_string(),
        format!("--prefix={}", prefix.display()),
        format!("--install-scripts={}", prefix_bin_dir(prefix).display()),
        "--single-version-externally-managed".to_string(),
        "--record=installed.txt".to_string(),
    ]
}

/// Resolve an interpreter name to an absolute path when it is on PATH
pub fn resolve_interpreter(python: &str) -> PathBuf {
    which::which(python).unwrap_or_else(|_| PathBuf::from(python))
}

/// One invocation of a package's install procedure
#[derive(Debug, Clone)]
pub struct InstallCommand {
    /// Resource being installed, for diagnostics
    pub label: String,
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Prefix the package installs into
    pub prefix: PathBuf,
    pub env: Vec<(String, OsString)>,
}

impl InstallCommand {
    /// `python setup.py install` for the source tree at `source_root`
    pub fn setup_py(
        label: &str,
        python: &str,
        source_root: &Path,
        prefix: &Path,
        search_path: &SearchPath,
    ) -> StagerResult<Self> {
        if !source_root.join("setup.py").is_file() {
            return Err(StagerError::InstallStep {
                resource: label.to_string(),
                status: "not started".to_string(),
                output: format!("no setup.py in {}", source_root.display()),
            });
        }

        Ok(Self {
            label: label.to_string(),
            program: python.to_string(),
            args: setup_install_args(prefix),
            cwd: source_root.to_path_buf(),
            prefix: prefix.to_path_buf(),
            env: vec![(search_path.var().to_string(), search_path.value()?)],
        })
    }

    /// Value this command sets for `var`, if any
    pub fn env_value(&self, var: &str) -> Option<&OsString> {
        self.env.iter().find(|(k, _)| k == var).map(|(_, v)| v)
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).current_dir(&self.cwd);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }
}

/// Runs install commands as child processes
#[derive(Debug, Default, Clone)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl InstallRunner for SystemRunner {
    fn python_version(&self, python: &str) -> StagerResult<String> {
        let output = Command::new(python)
            .args(["-c", VERSION_PROBE])
            .output()
            .map_err(|e| {
                StagerError::Config(format!("Cannot run interpreter '{}': {}", python, e))
            })?;

        if !output.status.success() {
            return Err(StagerError::Config(format!(
                "Interpreter '{}' failed to report its version: {}",
                python,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if version.is_empty() {
            return Err(StagerError::Config(format!(
                "Interpreter '{}' printed no version",
                python
            )));
        }
        Ok(version)
    }

    fn run(&self, command: &InstallCommand) -> StagerResult<()> {
        debug!(
            resource = %command.label,
            program = %command.program,
            cwd = %command.cwd.display(),
            "running install step"
        );

        let output = command.to_command().output().map_err(|e| StagerError::InstallStep {
            resource: command.label.clone(),
            status: "failed to start".to_string(),
            output: format!("{}: {}", command.program, e),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let mut combined = stdout.into_owned();
            if !combined.is_empty() && !combined.ends_with('\n') {
                combined.push('\n');
            }
            combined.push_str(&stderr);
            return Err(StagerError::InstallStep {
                resource: command.label.clone(),
                status: output.status.to_string(),
                output: combined,
            });
        }

        for line in stdout.lines() {
            debug!(resource = %command.label, "{}", line);
        }
        Ok(())
    }
}
