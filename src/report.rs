//! Raw per-gene reports produced by the external aligner.
//!
//! Field names follow the aligner's JSON output (`FirstAA`, `AlignedSites`,
//! ...). Numeric fields may arrive as floating point values and are
//! truncated to integers on deserialization.

use serde::{Deserialize, Deserializer, Serialize};

fn truncate<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(value.trunc() as i64)
}

fn truncate_opt<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.map(|v| v.trunc() as i64))
}

fn truncate_list<'de, D>(deserializer: D) -> Result<Option<Vec<Option<i64>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Option<f64>>>::deserialize(deserializer)?;
    Ok(values.map(|list| list.into_iter().map(|v| v.map(|v| v.trunc() as i64)).collect()))
}

/// The aligner's report for one (sequence, gene) pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GeneReport {
    /// First aligned amino acid position (may fall outside the gene)
    #[serde(rename = "FirstAA", deserialize_with = "truncate")]
    pub first_aa: i64,
    /// Last aligned amino acid position (may fall outside the gene)
    #[serde(rename = "LastAA", deserialize_with = "truncate")]
    pub last_aa: i64,
    #[serde(default)]
    pub aligned_sites: Vec<RawAlignedSite>,
    #[serde(default)]
    pub mutations: Vec<RawMutation>,
    #[serde(default)]
    pub frame_shifts: Vec<RawFrameShift>,
}

/// One amino acid position of the alignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAlignedSite {
    #[serde(rename = "PosAA", deserialize_with = "truncate")]
    pub pos_aa: i64,
    #[serde(rename = "PosNA", default, deserialize_with = "truncate_opt")]
    pub pos_na: Option<i64>,
    #[serde(rename = "PosNAs", default, deserialize_with = "truncate_list")]
    pub pos_nas: Option<Vec<Option<i64>>>,
    #[serde(rename = "LengthNA", default, deserialize_with = "truncate")]
    pub length_na: i64,
}

/// One mutated codon as reported by the aligner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawMutation {
    /// Amino acid position, relative to the aligner's reading frame start
    #[serde(deserialize_with = "truncate")]
    pub position: i64,
    /// Reference amino acid (one letter)
    #[serde(default)]
    pub reference_text: String,
    /// Observed codon; empty for deletions
    #[serde(default)]
    pub codon_text: String,
    /// Codons inserted after this position
    #[serde(default)]
    pub inserted_codons_text: String,
    #[serde(default)]
    pub is_insertion: bool,
    #[serde(default)]
    pub is_deletion: bool,
}

/// A frame shift as reported by the aligner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawFrameShift {
    #[serde(deserialize_with = "truncate")]
    pub position: i64,
    #[serde(default)]
    pub is_insertion: bool,
    #[serde(default)]
    pub is_deletion: bool,
    /// Number of inserted or deleted nucleotides
    #[serde(default, deserialize_with = "truncate")]
    pub gap_length: i64,
    /// Inserted nucleotides, if any
    #[serde(default)]
    pub nucleic_acids_text: String,
}
