//! Amino acid mutations and frame shifts called from aligner reports.

use std::fmt;

use crate::control::num_discordant_bases;
use crate::genetic_code::{simple_translate, translate_triplet, AminoAcids};
use crate::model::Gene;
use crate::report::{RawFrameShift, RawMutation};

/// Converts an aligner position to a gene position given the aligner's first codon.
fn gene_position(raw_position: i64, first_aa: usize) -> usize {
    let first_aa = i64::try_from(first_aa).unwrap_or(1);
    usize::try_from(raw_position - first_aa + 1).unwrap_or(0)
}

/// A called amino acid change at one gene position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    gene: String,
    position: usize,
    reference: char,
    codon: String,
    inserted_codons: String,
    is_insertion: bool,
    is_deletion: bool,
    amino_acids: AminoAcids,
}

impl Mutation {
    /// Builds a mutation from an aligner entry.
    ///
    /// `first_aa` is the gene position of the aligner's first reported
    /// codon; the aligner's positions are shifted accordingly.
    pub fn from_raw(gene: &Gene, first_aa: usize, raw: &RawMutation) -> Self {
        let codon = raw.codon_text.to_ascii_uppercase();
        let amino_acids = if raw.is_deletion { AminoAcids::empty() } else { translate_triplet(&codon) };
        Self {
            gene: gene.name.clone(),
            position: gene_position(raw.position, first_aa),
            reference: raw.reference_text.chars().next().unwrap_or('X'),
            codon,
            inserted_codons: raw.inserted_codons_text.to_ascii_uppercase(),
            is_insertion: raw.is_insertion,
            is_deletion: raw.is_deletion,
            amino_acids,
        }
    }

    pub fn gene(&self) -> &str {
        &self.gene
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn reference(&self) -> char {
        self.reference
    }

    /// The observed codon (empty for deletions).
    pub fn codon(&self) -> &str {
        &self.codon
    }

    pub fn inserted_codons(&self) -> &str {
        &self.inserted_codons
    }

    /// Amino acids the observed codon may encode.
    pub fn amino_acids(&self) -> AminoAcids {
        self.amino_acids
    }

    pub fn is_insertion(&self) -> bool {
        self.is_insertion
    }

    pub fn is_deletion(&self) -> bool {
        self.is_deletion
    }

    /// True when at least two bases of the codon are unknown (`N`) or missing.
    pub fn is_unsequenced(&self) -> bool {
        if self.is_deletion {
            return false;
        }
        let bytes = self.codon.as_bytes();
        (0..3)
            .filter(|&idx| matches!(bytes.get(idx), None | Some(b'N') | Some(b'-')))
            .count()
            >= 2
    }

    /// Nucleotides that disagree with the reference.
    ///
    /// A deletion counts its three reference bases, an insertion counts the
    /// inserted bases on top of any mismatch in its anchor codon.
    pub fn num_discordant_nas(&self) -> usize {
        if self.is_deletion {
            return 3;
        }
        let inserted = if self.is_insertion { self.inserted_codons.len() } else { 0 };
        num_discordant_bases(&self.codon, self.reference) + inserted
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.reference, self.position)?;
        if self.is_deletion {
            return write!(f, "del");
        }
        let aas = if self.is_unsequenced() || self.amino_acids.is_empty() {
            "X".to_string()
        } else {
            self.amino_acids.to_string()
        };
        if self.is_insertion {
            write!(f, "_{}{}", aas, simple_translate(&self.inserted_codons))
        } else {
            write!(f, "{aas}")
        }
    }
}

/// An insertion or deletion that is not a whole number of codons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameShift {
    gene: String,
    position: usize,
    is_insertion: bool,
    size: usize,
    nucleotides: String,
}

impl FrameShift {
    /// Builds a frame shift from an aligner entry, see [`Mutation::from_raw`].
    pub fn from_raw(gene: &Gene, first_aa: usize, raw: &RawFrameShift) -> Self {
        Self {
            gene: gene.name.clone(),
            position: gene_position(raw.position, first_aa),
            is_insertion: raw.is_insertion && !raw.is_deletion,
            size: usize::try_from(raw.gap_length).unwrap_or(0),
            nucleotides: raw.nucleic_acids_text.to_ascii_uppercase(),
        }
    }

    pub fn gene(&self) -> &str {
        &self.gene
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_insertion(&self) -> bool {
        self.is_insertion
    }

    pub fn is_deletion(&self) -> bool {
        !self.is_insertion
    }

    /// Number of inserted or deleted nucleotides.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn nucleotides(&self) -> &str {
        &self.nucleotides
    }
}

impl fmt::Display for FrameShift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_insertion { "ins" } else { "del" };
        write!(f, "{}{}{}", self.position, kind, self.size)
    }
}
