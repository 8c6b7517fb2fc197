// src/filter/mod.rs

use crate::config::FilterCriteria;
use crate::extract::RawTable;
use anyhow::{Context, Result};
use tracing::debug;

pub const DEPARTMENT_COLUMN: &str = "code_departement";
pub const TYPE_LOCAL_COLUMN: &str = "type_local";
pub const NATURE_MUTATION_COLUMN: &str = "nature_mutation";
pub const YEAR_COLUMN: &str = "year";

/// Row counts before and after filtering one year's table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionStats {
    pub year: u16,
    pub initial_rows: usize,
    pub final_rows: usize,
}

impl RetentionStats {
    /// Share of rows retained, in percent. An empty input table reports 0.0.
    pub fn percentage(&self) -> f64 {
        if self.initial_rows == 0 {
            0.0
        } else {
            self.final_rows as f64 / self.initial_rows as f64 * 100.0
        }
    }
}

/// One year's retained rows, with a `year` column appended as the last
/// column of every row.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub year: u16,
}

/// Keep the rows matching `criteria` and tag them with `year`.
///
/// Department codes are compared after trimming, so values padded with
/// whitespace in the source file still match. Row order is preserved; a row
/// is either kept unchanged (plus the year cell) or dropped.
pub fn filter_table(
    raw: RawTable,
    criteria: &FilterCriteria,
    year: u16,
) -> Result<(FilteredTable, RetentionStats)> {
    let dept_col = require_column(&raw, DEPARTMENT_COLUMN, year)?;
    let type_col = require_column(&raw, TYPE_LOCAL_COLUMN, year)?;
    let nature_col = require_column(&raw, NATURE_MUTATION_COLUMN, year)?;

    let initial_rows = raw.rows.len();
    let year_cell = year.to_string();

    let mut headers = raw.headers;
    headers.push(YEAR_COLUMN.to_string());

    let rows: Vec<Vec<String>> = raw
        .rows
        .into_iter()
        .map(|mut row| {
            // normalize the department code before comparing, and keep the
            // trimmed form in the output
            let trimmed = row[dept_col].trim().to_string();
            row[dept_col] = trimmed;
            row
        })
        .filter(|row| {
            criteria.departments.iter().any(|d| d == &row[dept_col])
                && row[type_col] == criteria.type_local
                && row[nature_col] == criteria.nature_mutation
        })
        .map(|mut row| {
            row.push(year_cell.clone());
            row
        })
        .collect();

    let stats = RetentionStats {
        year,
        initial_rows,
        final_rows: rows.len(),
    };
    debug!(
        year,
        initial = stats.initial_rows,
        retained = stats.final_rows,
        "filtered table"
    );

    Ok((
        FilteredTable {
            headers,
            rows,
            year,
        },
        stats,
    ))
}

fn require_column(raw: &RawTable, name: &str, year: u16) -> Result<usize> {
    raw.column_index(name)
        .with_context(|| format!("column {name} missing from year {year} data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: vec![
                "nature_mutation".into(),
                "code_departement".into(),
                "code_postal".into(),
                "type_local".into(),
            ],
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn keeps_only_matching_rows_and_appends_year() -> Result<()> {
        let table = raw(&[
            &["Vente", "13", "13001", "Maison"],
            &["Vente", "13", "13001", "Appartement"],
            &["Echange", "31", "31000", "Maison"],
            &["Vente", " 34 ", "34000", "Maison"],
            &["Vente", "75", "75001", "Maison"],
        ]);

        let (filtered, stats) = filter_table(table, &FilterCriteria::default(), 2022)?;

        assert_eq!(stats.initial_rows, 5);
        assert_eq!(stats.final_rows, 2);
        assert_eq!(stats.percentage(), 40.0);

        assert_eq!(filtered.year, 2022);
        assert_eq!(filtered.headers.last().map(String::as_str), Some("year"));
        for row in &filtered.rows {
            assert_eq!(row.last().map(String::as_str), Some("2022"));
        }
        // whitespace-padded department codes match and come out trimmed
        assert_eq!(filtered.rows[1][1], "34");
        Ok(())
    }

    #[test]
    fn leading_zero_codes_do_not_match_numerically() -> Result<()> {
        // "013" is not the same department code as "13"
        let table = raw(&[&["Vente", "013", "13001", "Maison"]]);
        let (filtered, stats) = filter_table(table, &FilterCriteria::default(), 2020)?;
        assert!(filtered.rows.is_empty());
        assert_eq!(stats.final_rows, 0);
        Ok(())
    }

    #[test]
    fn empty_table_reports_zero_percent() -> Result<()> {
        let (_, stats) = filter_table(raw(&[]), &FilterCriteria::default(), 2021)?;
        assert_eq!(stats.initial_rows, 0);
        assert_eq!(stats.percentage(), 0.0);
        Ok(())
    }

    #[test]
    fn missing_filter_column_is_an_error() {
        let table = RawTable {
            headers: vec!["a".into(), "b".into()],
            rows: vec![],
        };
        let err = filter_table(table, &FilterCriteria::default(), 2020).unwrap_err();
        assert!(err.to_string().contains("code_departement"));
    }
}
