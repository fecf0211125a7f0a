use crate::resolver::DEFAULT_THRESHOLD;
use anyhow::bail;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const DEFAULT_BUCKET_EDGES: [u32; 15] = [0, 5, 10, 15, 20, 25, 30, 35, 40, 50, 60, 70, 80, 90, 100];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Data source configuration
    pub data_source_mode: DataSourceMode,
    pub data_file: Option<String>,
    pub data_url: Option<String>,
    pub country_reference_file: Option<String>,
    pub output_directory: Option<String>,
    // Dashboard settings
    pub top_n: usize,
    pub fuzzy_threshold: u8,
    pub bucket_edges: Vec<u32>,
    pub validate_totals: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSourceMode {
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "internet")]
    Internet,
    /// Local file when present, otherwise download and keep a local copy.
    #[serde(rename = "both")]
    Both,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_source_mode: DataSourceMode::Local,
            data_file: Some("data/olympics_2024.csv".to_string()),
            data_url: Some("https://example.com/olympics-2024/Olympics_2024.csv".to_string()),
            country_reference_file: None,
            output_directory: Some("output".to_string()),
            top_n: 10,
            fuzzy_threshold: DEFAULT_THRESHOLD,
            bucket_edges: DEFAULT_BUCKET_EDGES.to_vec(),
            validate_totals: true,
        }
    }
}

impl Config {
    pub fn load_from_file(file_path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(file_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, file_path: &str) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(file_path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        match self.data_source_mode {
            DataSourceMode::Local if self.data_file.is_none() => {
                bail!("data_file must be set when data_source_mode is \"local\"")
            }
            DataSourceMode::Internet if self.data_url.is_none() => {
                bail!("data_url must be set when data_source_mode is \"internet\"")
            }
            DataSourceMode::Both if self.data_file.is_none() || self.data_url.is_none() => {
                bail!("data_file and data_url must both be set when data_source_mode is \"both\"")
            }
            _ => {}
        }

        if self.fuzzy_threshold > 100 {
            bail!("fuzzy_threshold must be between 0 and 100, got {}", self.fuzzy_threshold);
        }

        if self.bucket_edges.len() < 2 {
            bail!("bucket_edges needs at least two edges");
        }
        if self.bucket_edges.windows(2).any(|pair| pair[0] >= pair[1]) {
            bail!("bucket_edges must be strictly increasing: {:?}", self.bucket_edges);
        }

        Ok(())
    }
}

/// One row of the medal table: a country's tally within one competition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalRecord {
    #[serde(rename = "NOC", alias = "Country")]
    pub noc: String,
    #[serde(rename = "Competitions", alias = "Competition")]
    pub competition: String,
    #[serde(rename = "Gold")]
    pub gold: u32,
    #[serde(rename = "Silver")]
    pub silver: u32,
    #[serde(rename = "Bronze")]
    pub bronze: u32,
    #[serde(rename = "Total")]
    pub total: u32,
}

impl MedalRecord {
    #[cfg(test)]
    pub fn new(noc: &str, competition: &str, gold: u32, silver: u32, bronze: u32) -> Self {
        Self {
            noc: noc.to_string(),
            competition: competition.to_string(),
            gold,
            silver,
            bronze,
            total: gold + silver + bronze,
        }
    }

    /// Grouping key for every country-level view.
    pub fn country(&self) -> String {
        normalize_noc(&self.noc)
    }

    /// Summed in `u64` so counts near `u32::MAX` cannot overflow.
    pub fn medal_sum(&self) -> u64 {
        u64::from(self.gold) + u64::from(self.silver) + u64::from(self.bronze)
    }

    pub fn has_consistent_total(&self) -> bool {
        self.medal_sum() == u64::from(self.total)
    }
}

/// Normalize a raw NOC label: trim, then drop everything that is not an
/// ASCII word character or whitespace.
pub fn normalize_noc(noc: &str) -> String {
    static PUNCTUATION: OnceLock<Regex> = OnceLock::new();
    let punctuation = PUNCTUATION.get_or_init(|| Regex::new(r"[^A-Za-z0-9_\s]").unwrap());
    punctuation.replace_all(noc.trim(), "").into_owned()
}
