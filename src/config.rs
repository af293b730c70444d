//! Alignment configuration of one virus.
//!
//! A configuration lists the virus strains to align against, in order, and
//! for each strain its genes with their validation thresholds:
//!
//! ```json
//! {
//!   "virus": "HIV1",
//!   "strains": [
//!     {
//!       "name": "HIV1",
//!       "genes": [
//!         {"name": "PR", "aa_length": 99, "min_match_pcnt": 60.0, "min_num_of_sites": 40},
//!         {"name": "RT", "aa_length": 560}
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Gene;

/// Default minimum match percentage of a gene alignment.
pub const DEFAULT_MIN_MATCH_PCNT: f64 = 60.0;

/// Default minimum number of aligned amino acid positions of a gene alignment.
pub const DEFAULT_MIN_NUM_OF_SITES: usize = 3;

fn default_min_match_pcnt() -> f64 {
    DEFAULT_MIN_MATCH_PCNT
}

fn default_min_num_of_sites() -> usize {
    DEFAULT_MIN_NUM_OF_SITES
}

/// Errors that can occur while loading a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration lists no strains")]
    NoStrains,

    #[error("Duplicate strain '{0}'")]
    DuplicateStrain(String),

    #[error("Duplicate gene '{gene}' in strain '{strain}'")]
    DuplicateGene { strain: String, gene: String },

    #[error("Gene '{0}' must have a positive amino acid length")]
    EmptyGene(String),

    #[error("Gene '{gene}': min_match_pcnt {value} is outside 0-100")]
    InvalidMatchPcnt { gene: String, value: f64 },
}

/// A gene together with the thresholds its alignments must meet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneConfig {
    #[serde(flatten)]
    pub gene: Gene,
    /// Minimum percentage (0-100) of matched nucleotides
    #[serde(default = "default_min_match_pcnt")]
    pub min_match_pcnt: f64,
    /// Minimum number of aligned amino acid positions
    #[serde(default = "default_min_num_of_sites")]
    pub min_num_of_sites: usize,
}

impl GeneConfig {
    /// A gene with the default thresholds.
    pub fn new(name: impl Into<String>, aa_length: usize) -> Self {
        Self {
            gene: Gene::new(name, aa_length),
            min_match_pcnt: DEFAULT_MIN_MATCH_PCNT,
            min_num_of_sites: DEFAULT_MIN_NUM_OF_SITES,
        }
    }

    pub fn name(&self) -> &str {
        &self.gene.name
    }
}

/// One strain and its genes, in alignment order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrainConfig {
    pub name: String,
    pub genes: Vec<GeneConfig>,
}

/// Configuration of one virus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentConfig {
    #[serde(default)]
    pub virus: String,
    pub strains: Vec<StrainConfig>,
}

impl AlignmentConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Checks strain and gene names are unique and thresholds in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strains.is_empty() {
            return Err(ConfigError::NoStrains);
        }
        let mut strains = HashSet::new();
        for strain in &self.strains {
            if !strains.insert(strain.name.as_str()) {
                return Err(ConfigError::DuplicateStrain(strain.name.clone()));
            }
            let mut genes = HashSet::new();
            for gene in &strain.genes {
                if !genes.insert(gene.name()) {
                    return Err(ConfigError::DuplicateGene {
                        strain: strain.name.clone(),
                        gene: gene.name().to_string(),
                    });
                }
                if gene.gene.aa_length == 0 {
                    return Err(ConfigError::EmptyGene(gene.name().to_string()));
                }
                if !(0.0..=100.0).contains(&gene.min_match_pcnt) {
                    return Err(ConfigError::InvalidMatchPcnt {
                        gene: gene.name().to_string(),
                        value: gene.min_match_pcnt,
                    });
                }
            }
        }
        Ok(())
    }

    /// Looks up a strain by name.
    pub fn strain(&self, name: &str) -> Option<&StrainConfig> {
        self.strains.iter().find(|s| s.name == name)
    }
}
