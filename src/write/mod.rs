// src/write/mod.rs

use crate::pipeline::CombinedTable;
use anyhow::{anyhow, Context, Result};
use flate2::{write::GzEncoder, Compression};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Serialize the combined table under `output_dir` and return the files
/// written.
///
/// The table is first written as a single `<base>.csv.gz`. If that file ends
/// up over `max_file_size_mb` it is deleted and one `<base>_<year>.csv.gz`
/// is written per distinct year instead, in first-seen year order. Per-year
/// files are not re-checked against the threshold.
#[instrument(level = "info", skip(table), fields(rows = table.rows.len()))]
pub fn save_combined(
    table: &CombinedTable,
    output_dir: &Path,
    base_name: &str,
    max_file_size_mb: f64,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let combined_path = output_dir.join(format!("{base_name}.csv.gz"));
    write_csv_gz(&combined_path, &table.headers, table.rows.iter())?;

    let size_mb = file_size_mb(&combined_path)?;
    info!(path = %combined_path.display(), size_mb = format!("{size_mb:.1}"), "wrote combined file");

    if size_mb <= max_file_size_mb {
        return Ok(vec![combined_path]);
    }

    info!(
        threshold_mb = max_file_size_mb,
        "combined file over threshold, splitting by year"
    );
    fs::remove_file(&combined_path)
        .with_context(|| format!("removing oversized {}", combined_path.display()))?;

    let year_col = table.year_column()?;
    let mut saved = Vec::new();
    for year in table.distinct_years()? {
        let year_path = output_dir.join(format!("{base_name}_{year}.csv.gz"));
        let rows = table.rows.iter().filter(|row| row[year_col] == year);
        let written = write_csv_gz(&year_path, &table.headers, rows)?;
        let size_mb = file_size_mb(&year_path)?;
        info!(
            path = %year_path.display(),
            size_mb = format!("{size_mb:.1}"),
            rows = written,
            "wrote per-year file"
        );
        saved.push(year_path);
    }

    Ok(saved)
}

/// Write a header row plus `rows` as gzip-compressed comma-delimited text.
/// Returns the number of data rows written.
fn write_csv_gz<'a, I>(path: &Path, headers: &[String], rows: I) -> Result<usize>
where
    I: Iterator<Item = &'a Vec<String>>,
{
    let file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut wtr = csv::Writer::from_writer(encoder);

    wtr.write_record(headers)
        .with_context(|| format!("writing header row to {}", path.display()))?;
    let mut written = 0;
    for row in rows {
        wtr.write_record(row)
            .with_context(|| format!("writing row to {}", path.display()))?;
        written += 1;
    }
    wtr.flush()
        .with_context(|| format!("flushing {}", path.display()))?;

    let encoder = wtr
        .into_inner()
        .map_err(|e| anyhow!("finishing CSV stream for {}: {e}", path.display()))?;
    encoder
        .finish()
        .with_context(|| format!("finishing gzip stream for {}", path.display()))?;
    Ok(written)
}

fn file_size_mb(path: &Path) -> Result<f64> {
    let meta =
        fs::metadata(path).with_context(|| format!("sizing {}", path.display()))?;
    Ok(meta.len() as f64 / (1024.0 * 1024.0))
}
