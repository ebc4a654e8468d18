use anyhow::Context;
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    incsync_core::workspace::init(root).context("failed to initialize workspace")?;
    println!("Initialized increment tracking in {}", root.display());
    Ok(())
}
