use crate::core::{StagerError, StagerResult};
use crate::formula::{Formula, Resource};
use std::collections::HashSet;

/// Validates formula schema and content
pub struct FormulaValidator;

impl FormulaValidator {
    /// Validate a formula with comprehensive checks
    pub fn validate(formula: &Formula) -> StagerResult<()> {
        Self::validate_name("Formula", &formula.name)?;
        Self::validate_version(&formula.version)?;
        Self::validate_url(&formula.name, &formula.url)?;
        // The main source may omit its checksum, but a declared one must parse.
        formula.main_resource().declared_checksum()?;
        Self::validate_resources(&formula.resources)?;
        Self::validate_install_order(formula)?;
        Self::validate_search_path_var(&formula.search_path_var)?;
        if let Some(version) = &formula.python_version {
            Self::validate_python_version(version)?;
        }
        Self::validate_tests(&formula.test)?;
        Ok(())
    }

    fn validate_name(kind: &str, name: &str) -> StagerResult<()> {
        if name.is_empty() {
            return Err(StagerError::Manifest(format!("{} name cannot be empty", kind)));
        }

        if !name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(StagerError::Manifest(format!(
                "{} name '{}' contains invalid characters. Use only alphanumeric, '-', '_' or '.'",
                kind, name
            )));
        }

        if name.starts_with(['-', '.']) {
            return Err(StagerError::Manifest(format!(
                "{} name '{}' cannot start with '-' or '.'",
                kind, name
            )));
        }

        Ok(())
    }

    fn validate_version(version: &str) -> StagerResult<()> {
        if version.trim().is_empty() {
            return Err(StagerError::Manifest("Version cannot be empty".to_string()));
        }
        if version.contains(['/', '\\']) || version == "." || version == ".." {
            return Err(StagerError::Manifest(format!(
                "Version '{}' cannot be used as a directory name",
                version
            )));
        }
        Ok(())
    }

    fn validate_url(owner: &str, url: &str) -> StagerResult<()> {
        if url.trim().is_empty() {
            return Err(StagerError::Manifest(format!("'{}' has no url", owner)));
        }
        Ok(())
    }

    fn validate_resources(resources: &[Resource]) -> StagerResult<()> {
        let mut seen = HashSet::new();

        for resource in resources {
            Self::validate_name("Resource", &resource.name)?;

            if !seen.insert(resource.name.as_str()) {
                return Err(StagerError::Manifest(format!(
                    "Duplicate resource '{}' found",
                    resource.name
                )));
            }

            Self::validate_url(&resource.name, &resource.url)?;

            if resource.declared_checksum()?.is_none() {
                return Err(StagerError::Manifest(format!(
                    "Resource '{}' has no checksum",
                    resource.name
                )));
            }
        }

        Ok(())
    }

    fn validate_install_order(formula: &Formula) -> StagerResult<()> {
        let Some(order) = &formula.install_order else {
            return Ok(());
        };

        let mut seen = HashSet::new();
        for name in order {
            if formula.resource(name).is_none() {
                return Err(StagerError::Manifest(format!(
                    "install_order names unknown resource '{}'",
                    name
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(StagerError::Manifest(format!(
                    "install_order lists '{}' more than once",
                    name
                )));
            }
        }

        Ok(())
    }

    fn validate_search_path_var(var: &str) -> StagerResult<()> {
        let valid = !var.is_empty()
            && !var.starts_with(|c: char| c.is_ascii_digit())
            && var.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(StagerError::Manifest(format!(
                "search_path_var '{}' is not a valid environment variable name",
                var
            )));
        }
        Ok(())
    }

    fn validate_python_version(version: &str) -> StagerResult<()> {
        let parts: Vec<&str> = version.split('.').collect();
        let valid = parts.len() == 2
            && parts
                .iter()
                .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
        if !valid {
            return Err(StagerError::Manifest(format!(
                "Invalid python_version '{}'. Expected 'MAJOR.MINOR' (e.g., '2.7')",
                version
            )));
        }
        Ok(())
    }

    fn validate_tests(commands: &[String]) -> StagerResult<()> {
        if commands.iter().any(|c| c.trim().is_empty()) {
            return Err(StagerError::Manifest("Test command cannot be empty".to_string()));
        }
        Ok(())
    }
}
