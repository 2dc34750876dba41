//! Remediation hints attached to errors shown by the CLI.

use crate::core::error::StagerError;

/// Lines of tool output kept when rendering a failed install step.
const OUTPUT_TAIL_LINES: usize = 40;

pub trait ErrorHelp {
    /// A short suggestion for the user, if there is one.
    fn help(&self) -> Option<String>;
}

impl ErrorHelp for StagerError {
    fn help(&self) -> Option<String> {
        match self {
            StagerError::Fetch { .. } => Some(
                "Check the resource URL and your network connection, then run the command again."
                    .to_string(),
            ),
            StagerError::Integrity { resource, .. } => Some(format!(
                "The archive for '{}' does not match its declared checksum. \
                 If the upstream archive changed on purpose, update the formula's checksum.",
                resource
            )),
            StagerError::InstallStep { .. } => Some(
                "The package's own installer failed. Its output is shown above; \
                 rerun with --keep-failed to inspect the partial prefix."
                    .to_string(),
            ),
            StagerError::PrefixConflict(_) => Some(
                "Run with --force to replace the existing installation, or choose another --prefix."
                    .to_string(),
            ),
            StagerError::VerificationFailed(_) => Some(
                "Run 'stager fetch <formula>' to download missing or evicted archives.".to_string(),
            ),
            StagerError::Manifest(_) | StagerError::Yaml(_) => {
                Some("Fix the formula file and try again.".to_string())
            }
            StagerError::Config(_) => {
                Some("Inspect your settings with 'stager config show'.".to_string())
            }
            StagerError::Http(_) => Some("Check your network connection.".to_string()),
            _ => None,
        }
    }
}

/// Render an error for the terminal, including tool output and a hint.
pub fn format_error_with_help(error: &StagerError) -> String {
    let mut out = format!("Error: {}", error);

    if let StagerError::InstallStep { output, .. } = error {
        let lines: Vec<&str> = output.lines().collect();
        if !lines.is_empty() {
            let start = lines.len().saturating_sub(OUTPUT_TAIL_LINES);
            out.push_str("\n\n");
            if start > 0 {
                out.push_str(&format!("  ... ({} earlier lines omitted)\n", start));
            }
            for line in &lines[start..] {
                out.push_str("  | ");
                out.push_str(line);
                out.push('\n');
            }
        }
    }

    if let Some(help) = error.help() {
        out.push_str("\n\nhelp: ");
        out.push_str(&help);
    }

    out
}
