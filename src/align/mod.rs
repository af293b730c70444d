//! Alignment of sequences against reference genes.
//!
//! The sequence-to-gene alignment itself is done by an external aligner,
//! reached through the [`Aligner`] trait. This module turns its raw reports
//! into validated gene alignments:
//!
//! - `interpret`: one raw gene report -> [`AlignedGeneSequence`] or a
//!   [`MisalignedError`]
//! - `orchestrate`: batches of sequences, strain selection, and a single
//!   reverse-complement retry for sequences that did not align
//! - `recorded`: an [`Aligner`] serving reports captured from an aligner run
//!
//! [`AlignedGeneSequence`]: crate::model::AlignedGeneSequence

pub mod interpret;
pub mod orchestrate;
pub mod recorded;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::config::StrainConfig;
use crate::model::Sequence;
use crate::report::GeneReport;

pub use interpret::{gene_seq_from_report, trim_gaps};
pub use orchestrate::{align_batch, align_batch_from, align_one, select_best_alignment};
pub use recorded::RecordedAligner;

/// Reports of one sequence against one strain, keyed by gene name.
///
/// Genes the aligner could not place are simply absent.
pub type StrainReport = BTreeMap<String, GeneReport>;

/// Errors raised by an aligner backend.
#[derive(Error, Debug)]
pub enum AlignerError {
    #[error("Aligner failed for strain {strain}: {reason}")]
    Backend { strain: String, reason: String },

    #[error("No {orientation} report for sequence '{sequence}' against strain {strain}")]
    MissingReport { strain: String, sequence: String, orientation: &'static str },

    #[error("Failed to read aligner reports: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid aligner reports: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result of one batched aligner call: one entry per submitted sequence.
pub type BatchReports = Vec<Result<StrainReport, AlignerError>>;

/// An external sequence-to-gene aligner.
///
/// One instance is built per virus configuration and passed to the
/// orchestration functions.
pub trait Aligner: Sync {
    /// Aligns every sequence against the genes of `strain`.
    ///
    /// The returned vector is parallel to `sequences`. A per-sequence error
    /// (time-out, partial failure) is treated like a misalignment; an error
    /// for the whole call fails every sequence of the batch for this strain.
    fn command_align(&self, strain: &StrainConfig, sequences: &[Sequence]) -> Result<BatchReports, AlignerError>;
}

/// Why a gene alignment was discarded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MisalignedError {
    #[error("Alignment of gene {gene} was discarded since the length of alignment ({size}) was too short (< {min_num_of_sites}).")]
    TooShort { gene: String, size: usize, min_num_of_sites: usize, suppressible: bool },

    #[error("Alignment of gene {gene} is discarded since the list of aligned sites is empty or contains only gaps.")]
    EmptySpan { gene: String },

    #[error("Alignment of gene {gene} is discarded since the discordance rate is too high ({discordance:.1}% > {max_discordance:.0}%).")]
    LowMatch { gene: String, discordance: f64, max_discordance: f64 },
}

impl MisalignedError {
    /// Whether the failure is expected (gene absent) and need not be reported.
    ///
    /// Only an empty alignment span is suppressible.
    pub fn suppressible(&self) -> bool {
        matches!(self, Self::TooShort { suppressible: true, .. })
    }

    pub fn gene(&self) -> &str {
        match self {
            Self::TooShort { gene, .. } | Self::EmptySpan { gene } | Self::LowMatch { gene, .. } => gene,
        }
    }
}
