use anyhow::Context;
use incsync_core::lifecycle::StatusStateMachine;
use std::path::Path;

pub fn pause(root: &Path, id: &str, reason: Option<&str>) -> anyhow::Result<()> {
    StatusStateMachine::new(root)
        .pause(id, reason)
        .with_context(|| format!("failed to pause {id}"))?;
    println!("Paused {id}");
    Ok(())
}

pub fn resume(root: &Path, id: &str) -> anyhow::Result<()> {
    StatusStateMachine::new(root)
        .resume(id)
        .with_context(|| format!("failed to resume {id}"))?;
    println!("Resumed {id}");
    Ok(())
}

pub fn abandon(root: &Path, id: &str, reason: Option<&str>) -> anyhow::Result<()> {
    StatusStateMachine::new(root)
        .abandon(id, reason)
        .with_context(|| format!("failed to abandon {id}"))?;
    println!("Abandoned {id}");
    Ok(())
}

pub fn close(root: &Path, id: &str) -> anyhow::Result<()> {
    StatusStateMachine::new(root)
        .close(id)
        .with_context(|| format!("failed to close {id}"))?;
    println!("Closed {id}");
    Ok(())
}
