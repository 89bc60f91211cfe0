use std::path::Path;

use anyhow::Context;
use strata_migrate::Generator;

pub fn create(name: &str, path: &Path) -> anyhow::Result<()> {
    let generator = Generator::new(path);
    let (up_path, down_path) = generator
        .create(name)
        .with_context(|| format!("Failed to create migration '{}'", name))?;

    println!("Created migration:");
    println!("  {}", up_path.display());
    println!("  {}", down_path.display());
    Ok(())
}
