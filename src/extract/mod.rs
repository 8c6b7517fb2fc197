// src/extract/mod.rs

use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use std::io::{Cursor, Read};
use tracing::{debug, instrument};
use zip::ZipArchive;

/// Extensions the archive's data member may carry, checked case-insensitively.
const DATA_EXTENSIONS: &[&str] = &[".txt", ".csv"];

/// One year's transactions as parsed from the archive: a header row plus one
/// `Vec<String>` per data row. Every cell stays textual, so identifier
/// columns (`code_departement`, `code_postal`, `code_commune`) keep their
/// leading zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Open the archive in memory, locate the data member, and parse it as
/// pipe-delimited text.
///
/// The data member is the first entry, in archive listing order, whose name
/// ends in `.txt` or `.csv`; an archive with several candidates silently uses
/// the first one. An archive with none is a data-format error.
#[instrument(level = "debug", skip(archive_bytes), fields(year = year, size = archive_bytes.len()))]
pub fn extract_table(archive_bytes: &[u8], year: u16) -> Result<RawTable> {
    let mut archive = ZipArchive::new(Cursor::new(archive_bytes))
        .with_context(|| format!("opening archive for year {year}"))?;

    let mut data: Option<(String, Vec<u8>)> = None;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("reading archive entry #{i} for year {year}"))?;
        let name = entry.name().to_string();
        let lower = name.to_lowercase();
        if entry.is_file() && DATA_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            let mut buf = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut buf)
                .with_context(|| format!("reading {name} from archive for year {year}"))?;
            data = Some((name, buf));
            break;
        }
    }

    let Some((member_name, buf)) = data else {
        bail!("no data file found in archive for year {year}");
    };
    debug!(member = %member_name, "found data member");

    let mut rdr = ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(true)
        .from_reader(Cursor::new(buf));

    let headers: Vec<String> = rdr
        .headers()
        .with_context(|| format!("reading header row of {member_name}"))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record
            .with_context(|| format!("parse error in {member_name} at record {idx}"))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    debug!(rows = rows.len(), columns = headers.len(), "parsed data member");
    Ok(RawTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::CompressionMethod;

    fn zip_with_members(members: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options: FileOptions<'_, ()> =
                FileOptions::default().compression_method(CompressionMethod::Stored);
            for (name, content) in members {
                zip.start_file(*name, options.clone()).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buf
    }

    const SAMPLE: &str = "\
nature_mutation|code_departement|code_postal|type_local|valeur_fonciere
Vente|13|13001|Maison|250000
Vente|07|07000|Appartement|90000
";

    #[test]
    fn parses_pipe_delimited_member() -> Result<()> {
        let bytes = zip_with_members(&[("valeursfoncieres-2021.txt", SAMPLE)]);
        let table = extract_table(&bytes, 2021)?;

        assert_eq!(
            table.headers,
            vec![
                "nature_mutation",
                "code_departement",
                "code_postal",
                "type_local",
                "valeur_fonciere"
            ]
        );
        assert_eq!(table.rows.len(), 2);
        // leading zeros must survive
        assert_eq!(table.rows[1][1], "07");
        assert_eq!(table.rows[1][2], "07000");
        Ok(())
    }

    #[test]
    fn picks_first_matching_member_in_listing_order() -> Result<()> {
        let other = "nature_mutation|code_departement\nVente|31\n";
        let bytes = zip_with_members(&[
            ("notice.pdf", "not data"),
            ("a.csv", SAMPLE),
            ("b.txt", other),
        ]);
        let table = extract_table(&bytes, 2020)?;
        // a.csv comes first in listing order, b.txt is ignored
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.headers.len(), 5);
        Ok(())
    }

    #[test]
    fn archive_without_data_member_is_an_error() {
        let bytes = zip_with_members(&[("readme.pdf", "nothing tabular here")]);
        let err = extract_table(&bytes, 2022).unwrap_err();
        assert!(err.to_string().contains("no data file found"));
    }

    #[test]
    fn garbage_bytes_are_an_error() {
        let err = extract_table(b"definitely not a zip", 2023).unwrap_err();
        assert!(err.to_string().contains("opening archive"));
    }
}
