//! An aligner replaying reports captured from an external aligner run.
//!
//! The reports file is a JSON list with one entry per (strain, sequence,
//! orientation):
//!
//! ```json
//! [
//!   {"Strain": "HIV1", "Sequence": "seq1", "Reversed": false,
//!    "Genes": {"PR": {"FirstAA": 1, "LastAA": 99, "AlignedSites": [], "Mutations": []}}}
//! ]
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::{Aligner, AlignerError, BatchReports, StrainReport};
use crate::config::StrainConfig;
use crate::model::Sequence;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecordedEntry {
    strain: String,
    sequence: String,
    #[serde(default)]
    reversed: bool,
    #[serde(default)]
    genes: StrainReport,
}

/// Serves recorded reports, looked up by strain, sequence name and orientation.
#[derive(Debug, Default)]
pub struct RecordedAligner {
    reports: HashMap<(String, String, bool), StrainReport>,
}

impl RecordedAligner {
    pub fn from_json_str(json: &str) -> Result<Self, AlignerError> {
        let entries: Vec<RecordedEntry> = serde_json::from_str(json)?;
        let mut aligner = Self::default();
        for entry in entries {
            aligner.insert(entry.strain, entry.sequence, entry.reversed, entry.genes);
        }
        Ok(aligner)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, AlignerError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Records the reports of one sequence; a later entry for the same key
    /// replaces the earlier one.
    pub fn insert(&mut self, strain: impl Into<String>, sequence: impl Into<String>, reversed: bool, genes: StrainReport) {
        self.reports.insert((strain.into(), sequence.into(), reversed), genes);
    }

    /// Number of recorded (strain, sequence, orientation) entries.
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

impl Aligner for RecordedAligner {
    fn command_align(&self, strain: &StrainConfig, sequences: &[Sequence]) -> Result<BatchReports, AlignerError> {
        Ok(sequences
            .iter()
            .map(|seq| {
                self.reports
                    .get(&(strain.name.clone(), seq.name.clone(), seq.reversed))
                    .cloned()
                    .ok_or_else(|| AlignerError::MissingReport {
                        strain: strain.name.clone(),
                        sequence: seq.name.clone(),
                        orientation: if seq.reversed { "reverse" } else { "forward" },
                    })
            })
            .collect())
    }
}
