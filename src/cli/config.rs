use stager::config::Config;
use stager::core::StagerResult;

pub fn show() -> StagerResult<()> {
    let config = Config::load()?;

    println!("cache_dir: {}", config.get_cache_dir()?.display());
    println!("cellar: {}", config.get_cellar()?.display());
    println!("python: {}", config.python);
    println!("fetch_timeout_secs: {}", config.fetch_timeout_secs);

    Ok(())
}

pub fn set(key: &str, value: &str) -> StagerResult<()> {
    let mut config = Config::load()?;
    config.set(key, value)?;
    config.save()?;

    println!("✓ Set {} = {}", key, value);
    Ok(())
}
