use anyhow::Result;
use chrono::{Local, TimeZone};

use crate::workspace::CheckpointManager;

pub fn run_checkpoints(checkpoints: &CheckpointManager, json: bool) -> Result<()> {
    let list = checkpoints.list()?;

    if json {
        let entries: Vec<_> = list
            .iter()
            .map(|c| {
                serde_json::json!({
                    "name": c.name,
                    "path": c.path,
                    "createdAt": c.created_at,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if list.is_empty() {
        println!("No checkpoints in {}.", checkpoints.checkpoints_dir().display());
        return Ok(());
    }

    println!("Checkpoints (newest first):");
    for checkpoint in &list {
        let when = Local
            .timestamp_opt(checkpoint.created_at, 0)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown time".to_string());
        println!("  {}  {}", when, checkpoint.name);
    }
    Ok(())
}
