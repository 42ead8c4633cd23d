use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use mztrace::peak::{Peak, Scan, ScanBuilder};
use mztrace::peak_table::{delimiter_for_path, write_peak_table};

/// Scan cycle time in minutes
const CYCLE_TIME: f64 = 0.01;

/// A synthetic ion species eluting as a Gaussian peak
struct Species {
    mz: f64,
    apex_time: f64,
    width: f64,
    height: f64,
}

/// Generate a synthetic LC-MS peak table
pub fn run(output: PathBuf, scan_count: usize) -> Result<()> {
    info!("mztrace - synthetic peak table");
    info!("Creating peak table: {}", output.display());

    let scans = generate_mock_run(scan_count);
    info!(
        "Writing {} scans ({} total peaks)...",
        scans.len(),
        scans.iter().map(Scan::peak_count).sum::<usize>()
    );

    let file = File::create(&output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let rows = write_peak_table(&scans, BufWriter::new(file), delimiter_for_path(&output))
        .context("Failed to write peak table")?;

    info!("Wrote {} rows to {}", rows, output.display());
    println!("Wrote {} scans ({} rows) to {}", scans.len(), rows, output.display());
    Ok(())
}

fn species(scan_count: usize) -> Vec<Species> {
    let run_length = scan_count as f64 * CYCLE_TIME;
    (0..40)
        .map(|i| {
            let f = i as f64;
            Species {
                mz: 150.0 + f * 23.7 + (f * 0.37).sin() * 5.0,
                apex_time: run_length * (0.05 + 0.9 * ((f * 0.618).fract())),
                width: 0.03 + (f * 0.71).sin().abs() * 0.05,
                height: 1e4 * (1.0 + (f * 1.3).sin().abs() * 50.0),
            }
        })
        .collect()
}

/// Generate a mock run: Gaussian elution profiles with slow m/z drift,
/// deterministic noise peaks and occasional dropouts
fn generate_mock_run(scan_count: usize) -> Vec<Scan> {
    let species = species(scan_count);

    (0..scan_count)
        .map(|index| {
            let rt = index as f64 * CYCLE_TIME;
            let mut peaks: Vec<Peak> = Vec::new();

            for (s, sp) in species.iter().enumerate() {
                let z = (rt - sp.apex_time) / sp.width;
                let intensity = sp.height * (-0.5 * z * z).exp();
                // intermittent detector dropouts
                let dropout = (index * 7 + s * 13) % 29 == 0;
                if intensity < 500.0 || dropout {
                    continue;
                }
                let drift = sp.mz * 2e-6 * (rt * 3.0 + s as f64).sin();
                peaks.push(Peak::new(sp.mz + drift, intensity));
            }

            for k in 0..10 {
                let phase = (index * 10 + k) as f64;
                let mz = 100.0 + (phase * 0.7548).fract() * 1000.0;
                let intensity = 200.0 + (phase * 0.5698).fract() * 800.0;
                peaks.push(Peak::new(mz, intensity));
            }

            peaks.sort_by(|a, b| a.mz.total_cmp(&b.mz));

            ScanBuilder::new(index as i64 + 1)
                .retention_time(rt)
                .peaks(peaks)
                .build()
        })
        .collect()
}
