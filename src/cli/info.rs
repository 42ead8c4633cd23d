use anyhow::{Context, Result};
use std::path::PathBuf;

use mztrace::trace_writer::read_trace_file_info;

/// Display information about a trace file
pub fn run(file: PathBuf) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let info = read_trace_file_info(&file).context("Failed to read Parquet file")?;

    println!("mztrace File Information");
    println!("========================");
    println!("File: {}", file.display());
    println!();

    println!("File Statistics:");
    println!("  Row groups: {}", info.num_row_groups);
    println!("  Traces: {}", info.num_rows);
    println!("  Schema columns: {}", info.columns.len());
    println!();

    match info.builder_config() {
        Ok(Some(config)) => {
            println!("Builder Configuration:");
            println!("  Tolerance: {}", config.tolerance);
            println!("  Min time span: {}", config.min_time_span);
            println!("  Strategy: {}", config.strategy.name());
            println!("  Min highest point: {}", config.min_highest_point);
            println!();
        }
        Ok(None) => {}
        Err(e) => log::warn!("Unreadable builder configuration in footer: {}", e),
    }

    if !info.metadata.is_empty() {
        println!("Metadata Keys:");
        for (key, value) in &info.metadata {
            let value_preview = value
                .as_ref()
                .map(|v| {
                    if v.len() > 100 {
                        let cut = (0..=100).rev().find(|&i| v.is_char_boundary(i)).unwrap_or(0);
                        format!("{}... ({} bytes)", &v[..cut], v.len())
                    } else {
                        v.clone()
                    }
                })
                .unwrap_or_else(|| "<null>".to_string());
            println!("  {}: {}", key, value_preview);
        }
        println!();
    }

    println!("Schema:");
    for (i, (name, physical_type)) in info.columns.iter().enumerate() {
        println!("  {:3}. {} ({})", i + 1, name, physical_type);
    }

    Ok(())
}
