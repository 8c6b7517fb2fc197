// src/report/mod.rs

use crate::filter::{DEPARTMENT_COLUMN, YEAR_COLUMN};
use crate::pipeline::CombinedTable;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Row counts grouped by the named column, sorted by key.
pub fn group_counts(table: &CombinedTable, column: &str) -> Result<BTreeMap<String, usize>> {
    let col = table
        .column_index(column)
        .with_context(|| format!("combined table has no {column} column"))?;
    let mut counts = BTreeMap::new();
    for row in &table.rows {
        *counts.entry(row[col].clone()).or_insert(0) += 1;
    }
    Ok(counts)
}

/// Print the run summary: row counts per department and per year, then the
/// files written. Presentation only, goes straight to stdout.
pub fn print_summary(table: &CombinedTable, files: &[PathBuf]) -> Result<()> {
    println!("{}", "=".repeat(60));
    println!("Summary by department:");
    for (dept, count) in group_counts(table, DEPARTMENT_COLUMN)? {
        println!("  {dept}: {count}");
    }
    println!();
    println!("Summary by year:");
    for (year, count) in group_counts(table, YEAR_COLUMN)? {
        println!("  {year}: {count}");
    }
    println!();
    println!("Done! Files saved:");
    for file in files {
        println!("  - {}", file.display());
    }
    println!("{}", "=".repeat(60));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_group_by_department_and_year() -> Result<()> {
        let table = CombinedTable {
            headers: vec!["code_departement".into(), "year".into()],
            rows: vec![
                vec!["13".into(), "2020".into()],
                vec!["13".into(), "2021".into()],
                vec!["31".into(), "2020".into()],
            ],
        };

        let by_dept = group_counts(&table, DEPARTMENT_COLUMN)?;
        assert_eq!(by_dept.get("13"), Some(&2));
        assert_eq!(by_dept.get("31"), Some(&1));

        let by_year = group_counts(&table, YEAR_COLUMN)?;
        assert_eq!(by_year.get("2020"), Some(&2));
        assert_eq!(by_year.get("2021"), Some(&1));

        assert!(group_counts(&table, "missing").is_err());
        Ok(())
    }
}
