// src/pipeline/mod.rs

use crate::config::{FilterCriteria, PipelineConfig};
use crate::extract::extract_table;
use crate::fetch::download_archive;
use crate::filter::{filter_table, FilteredTable, RetentionStats, YEAR_COLUMN};
use anyhow::{bail, Context, Result};
use reqwest::Client;
use tracing::{error, info, instrument};

/// Ordered concatenation of every successfully processed year.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CombinedTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn year_column(&self) -> Result<usize> {
        self.column_index(YEAR_COLUMN)
            .context("combined table has no year column")
    }

    /// Distinct values of the `year` column, in first-seen row order.
    pub fn distinct_years(&self) -> Result<Vec<String>> {
        let year_col = self.year_column()?;
        let mut years: Vec<String> = Vec::new();
        for row in &self.rows {
            if !years.contains(&row[year_col]) {
                years.push(row[year_col].clone());
            }
        }
        Ok(years)
    }
}

/// Extract and filter one year's archive bytes. Split out from the network
/// side so the per-year path is testable against synthetic archives.
pub fn process_archive(
    archive_bytes: &[u8],
    criteria: &FilterCriteria,
    year: u16,
) -> Result<(FilteredTable, RetentionStats)> {
    let raw = extract_table(archive_bytes, year)?;
    filter_table(raw, criteria, year)
}

/// Run the fetch → extract → filter pipeline over every registry entry, in
/// registry order, one year at a time.
///
/// A failing year is logged and skipped; the run only fails if no year at
/// all produced data.
#[instrument(level = "info", skip_all, fields(years = config.sources.len()))]
pub async fn run(
    client: &Client,
    config: &PipelineConfig,
) -> Result<(CombinedTable, Vec<RetentionStats>)> {
    let mut tables = Vec::with_capacity(config.sources.len());
    let mut stats = Vec::with_capacity(config.sources.len());

    for source in &config.sources {
        info!(year = source.year, "downloading");
        let outcome = match download_archive(client, &source.url).await {
            Ok(bytes) => process_archive(&bytes, &config.criteria, source.year),
            Err(e) => Err(e),
        };
        match outcome {
            Ok((table, year_stats)) => {
                info!(
                    year = source.year,
                    "{} -> {} rows ({:.1}% retained)",
                    year_stats.initial_rows,
                    year_stats.final_rows,
                    year_stats.percentage()
                );
                tables.push(table);
                stats.push(year_stats);
            }
            Err(e) => {
                error!(year = source.year, error = %e, "year failed; skipping");
            }
        }
    }

    let combined = combine(tables)?;
    info!(total_rows = combined.rows.len(), "combined all years");
    Ok((combined, stats))
}

/// Concatenate the per-year tables in the order given. Fails if there is
/// nothing to combine, or if a year's header row disagrees with the first's.
pub fn combine(tables: Vec<FilteredTable>) -> Result<CombinedTable> {
    let mut iter = tables.into_iter();
    let Some(first) = iter.next() else {
        bail!("no data was successfully processed");
    };

    let headers = first.headers;
    let mut rows = first.rows;
    for table in iter {
        if table.headers != headers {
            bail!(
                "year {} columns do not match earlier years, cannot combine",
                table.year
            );
        }
        rows.extend(table.rows);
    }

    Ok(CombinedTable { headers, rows })
}
