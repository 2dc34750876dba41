use stager::core::StagerResult;
use stager::di::ServiceContainer;
use stager::fetch::fetch_verified;
use stager::formula::{Formula, Resource};
use std::path::Path;

pub async fn run(formula_path: &Path) -> StagerResult<()> {
    let formula = Formula::load(formula_path)?;
    let container = ServiceContainer::new()?;
    run_with_container(&container, &formula).await
}

pub async fn run_with_container(container: &ServiceContainer, formula: &Formula) -> StagerResult<()> {
    let main = formula.main_resource();
    let mut resources: Vec<&Resource> = formula.ordered_resources()?;
    resources.push(&main);

    println!("Fetching {} archive(s) for {}...", resources.len(), formula.name);

    for resource in resources {
        let path = fetch_verified(container.fetcher.as_ref(), resource).await?;
        println!("  ✓ {} ({})", resource.name, path.display());
    }

    println!("✓ All archives fetched");
    Ok(())
}
