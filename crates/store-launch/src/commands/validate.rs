use anyhow::{Context, Result};
use launch_config::{Config, LaunchSetup};
use std::path::Path;

pub async fn run(config_path: &Path, config: &Config) -> Result<()> {
    println!("Validating {}...", config_path.display());

    // Parsing already validated the structure; resolving checks variables and paths.
    let setup = LaunchSetup::from_config(config).context("Failed to resolve configuration")?;

    println!("✓ Configuration valid");
    println!("  Version: {}", config.version);
    if let Some(name) = &config.name {
        println!("  Name: {}", name);
    }
    println!("  Versions: {}", setup.versions_dir.display());

    for strategy in &setup.strategies {
        let strategy = strategy.as_dyn();
        let layout = strategy.layout();
        println!(
            "  {}: {}/{}",
            strategy.platform(),
            layout.install_dir_name,
            layout.executable.display()
        );
        for candidate in strategy.library_candidates().await {
            let marker = if candidate.is_dir() { "✓" } else { "·" };
            println!("    {} {}", marker, candidate.display());
        }
    }

    match std::fs::read_dir(&setup.versions_dir) {
        Ok(entries) => {
            let mut versions: Vec<String> = entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.path().is_dir())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect();
            versions.sort();
            println!("  Installed versions: {}", versions.len());
            for version in versions {
                println!("    {}", version);
            }
        }
        Err(e) => println!("  ⚠ Cannot read versions directory: {}", e),
    }

    Ok(())
}
