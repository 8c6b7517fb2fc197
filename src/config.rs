// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// One entry of the source registry: the year a DVF archive covers and the
/// data.gouv.fr resource URL it is downloaded from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    pub year: u16,
    pub url: String,
}

/// The conjunction of predicates a transaction row must satisfy to be kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Department codes to retain, compared as trimmed text so codes like
    /// "2A" or zero-padded ones survive intact.
    pub departments: Vec<String>,
    pub type_local: String,
    pub nature_mutation: String,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        // Marseille, Toulouse, Bordeaux, Montpellier; houses; standard sales.
        Self {
            departments: ["13", "31", "33", "34"].map(String::from).to_vec(),
            type_local: "Maison".to_string(),
            nature_mutation: "Vente".to_string(),
        }
    }
}

/// Full pipeline configuration. Built in code for tests, or loaded from a
/// JSON file where any omitted field falls back to its default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sources: Vec<SourceEntry>,
    pub criteria: FilterCriteria,
    pub output_dir: PathBuf,
    /// Base name for output files: `<base>.csv.gz` combined, or
    /// `<base>_<year>.csv.gz` per year in split mode.
    pub base_name: String,
    pub max_file_size_mb: f64,
    pub request_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            criteria: FilterCriteria::default(),
            output_dir: PathBuf::from("data"),
            base_name: "dvf_filtered".to_string(),
            max_file_size_mb: 100.0,
            request_timeout_secs: 300,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_sources() -> Vec<SourceEntry> {
    const URLS: &[(u16, &str)] = &[
        (
            2020,
            "https://www.data.gouv.fr/api/1/datasets/r/4d741143-8331-4b59-95c2-3b24a7bdbe3c",
        ),
        (
            2021,
            "https://www.data.gouv.fr/api/1/datasets/r/af812b0e-a898-4226-8cc8-5a570b257326",
        ),
        (
            2022,
            "https://www.data.gouv.fr/api/1/datasets/r/cc8a50e4-c8d1-4ac2-8de2-c1e4b3c44c86",
        ),
        (
            2023,
            "https://www.data.gouv.fr/api/1/datasets/r/8c8abe23-2a82-4b95-8174-1c1e0734c921",
        ),
        (
            2024,
            "https://www.data.gouv.fr/api/1/datasets/r/e117fe7d-f7fb-4c52-8089-231e755d19d3",
        ),
        (
            2025,
            "https://www.data.gouv.fr/api/1/datasets/r/8d771135-57c8-480f-a853-3d1d00ea0b69",
        ),
    ];
    URLS.iter()
        .map(|&(year, url)| SourceEntry {
            year,
            url: url.to_string(),
        })
        .collect()
}
