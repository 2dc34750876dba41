use stager::core::{StagerError, StagerResult};
use stager::di::ServiceContainer;
use stager::fetch::CacheVerifier;
use stager::formula::Formula;
use std::path::Path;

pub fn run(formula_path: &Path) -> StagerResult<()> {
    let formula = Formula::load(formula_path)?;
    let container = ServiceContainer::new()?;
    run_with_container(&container, &formula)
}

pub fn run_with_container(container: &ServiceContainer, formula: &Formula) -> StagerResult<()> {
    let main = formula.main_resource();
    let mut resources = formula.ordered_resources()?;
    resources.push(&main);

    println!("Verifying {} archive(s)...", resources.len());

    let verifier = CacheVerifier::new(container.fetcher.clone());
    let result = verifier.verify_all(resources)?;

    for name in &result.unchecked {
        println!("  ⚠️  {}: no checksum declared", name);
    }

    if result.is_success() {
        println!("✓ All archives verified successfully");
        println!("  {} archive(s) verified", result.successful.len());
        return Ok(());
    }

    println!("❌ Verification failed");
    println!("  {} archive(s) verified", result.successful.len());
    for name in &result.missing {
        println!("  ❌ {}: not fetched", name);
    }
    for (name, error) in &result.failed {
        println!("  ❌ {}: {}", name, error);
    }

    Err(StagerError::VerificationFailed(format!(
        "{} mismatched, {} missing",
        result.failed.len(),
        result.missing.len()
    )))
}
