//! Data model for sequences and their gene alignments.
//!
//! This module contains all data structures for representing:
//! - Input sequences (and their reverse complements)
//! - Reference genes
//! - Aligned sites, gene-level alignments and per-sequence alignment results
//!
//! Positions are 1-based throughout: amino acid positions count codons from
//! the start of the gene, nucleotide positions count bases from the start of
//! the submitted sequence.

use serde::{Deserialize, Serialize};

use crate::ambiguity::reverse_complement;
use crate::mutation::{FrameShift, Mutation};
use crate::report::RawAlignedSite;

/// Represents a single input sequence with its identifier and nucleotides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    /// The sequence identifier (from FASTA header, without '>')
    pub name: String,
    /// The nucleotides, possibly holding IUPAC ambiguity codes
    pub nucleotides: String,
    /// Whether this is the reverse complement of the record that was read
    pub reversed: bool,
}

impl Sequence {
    /// Creates a new forward-strand sequence.
    pub fn new(name: impl Into<String>, nucleotides: impl Into<String>) -> Self {
        Self { name: name.into(), nucleotides: nucleotides.into(), reversed: false }
    }

    /// Returns the length of the sequence.
    pub fn len(&self) -> usize {
        self.nucleotides.len()
    }

    /// Returns true if the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.nucleotides.is_empty()
    }

    /// Returns the reverse complement, flipping the orientation flag.
    #[must_use]
    pub fn reverse_complement(&self) -> Self {
        Self {
            name: self.name.clone(),
            nucleotides: reverse_complement(&self.nucleotides),
            reversed: !self.reversed,
        }
    }
}

/// A named reference gene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gene {
    /// Gene name (e.g. `PR`, `RT`)
    pub name: String,
    /// Length of the gene product in amino acids
    pub aa_length: usize,
}

impl Gene {
    pub fn new(name: impl Into<String>, aa_length: usize) -> Self {
        Self { name: name.into(), aa_length }
    }
}

/// Alignment detail of one amino acid position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedSite {
    /// Amino acid position in the gene
    pub pos_aa: usize,
    /// First nucleotide position of a contiguous site
    pub pos_na: Option<usize>,
    /// Nucleotide positions of a split site; `None` where a base is not sequenced
    pub pos_nas: Vec<Option<usize>>,
    /// Number of nucleotides spanned in the sequence
    pub length_na: usize,
}

impl AlignedSite {
    /// A site whose `length_na` nucleotides are contiguous from `pos_na`.
    pub fn contiguous(pos_aa: usize, pos_na: usize, length_na: usize) -> Self {
        Self { pos_aa, pos_na: Some(pos_na), pos_nas: Vec::new(), length_na }
    }

    /// A site with explicit (possibly split or missing) nucleotide positions.
    pub fn split(pos_aa: usize, pos_nas: Vec<Option<usize>>, length_na: usize) -> Self {
        Self { pos_aa, pos_na: None, pos_nas, length_na }
    }

    /// Builds a site from an aligner entry.
    ///
    /// Entries carry either a list of positions (`PosNAs`) or a single
    /// starting position (`PosNA`) followed by `LengthNA` contiguous bases.
    pub fn from_raw(raw: &RawAlignedSite) -> Self {
        let pos_aa = usize::try_from(raw.pos_aa).unwrap_or(0);
        let length_na = usize::try_from(raw.length_na).unwrap_or(0);
        match (&raw.pos_nas, raw.pos_na) {
            (Some(pos_nas), _) => Self::split(
                pos_aa,
                pos_nas.iter().map(|pos| pos.and_then(|p| usize::try_from(p).ok())).collect(),
                length_na,
            ),
            (None, Some(pos_na)) => match usize::try_from(pos_na) {
                Ok(pos_na) => Self::contiguous(pos_aa, pos_na, length_na),
                Err(_) => Self::split(pos_aa, Vec::new(), length_na),
            },
            (None, None) => Self::split(pos_aa, Vec::new(), length_na),
        }
    }

    /// First sequenced nucleotide position of this site.
    pub fn first_pos_na(&self) -> Option<usize> {
        match self.pos_na {
            Some(start) => (self.length_na > 0).then_some(start),
            None => self.pos_nas.iter().find_map(|pos| *pos),
        }
    }

    /// Last sequenced nucleotide position of this site.
    pub fn last_pos_na(&self) -> Option<usize> {
        match self.pos_na {
            Some(start) => self.length_na.checked_sub(1).map(|extra| start.saturating_add(extra)),
            None => self.pos_nas.iter().rev().find_map(|pos| *pos),
        }
    }

    /// True when no nucleotide of this site was sequenced.
    pub fn is_unsequenced(&self) -> bool {
        self.first_pos_na().is_none()
    }
}

/// The validated alignment of one sequence against one gene.
///
/// Sites, mutations and frame shifts are restricted to `first_aa..=last_aa`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedGeneSequence {
    gene: Gene,
    first_aa: usize,
    last_aa: usize,
    first_na: usize,
    last_na: usize,
    sites: Vec<AlignedSite>,
    mutations: Vec<Mutation>,
    frame_shifts: Vec<FrameShift>,
    num_discordant_nas: usize,
}

impl AlignedGeneSequence {
    /// Creates a gene alignment, dropping entries outside the amino acid span.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gene: Gene,
        first_aa: usize,
        last_aa: usize,
        first_na: usize,
        last_na: usize,
        sites: Vec<AlignedSite>,
        mutations: Vec<Mutation>,
        frame_shifts: Vec<FrameShift>,
    ) -> Self {
        let in_span = |pos: usize| pos >= first_aa && pos <= last_aa;
        let sites: Vec<AlignedSite> = sites.into_iter().filter(|s| in_span(s.pos_aa)).collect();
        let mutations: Vec<Mutation> = mutations.into_iter().filter(|m| in_span(m.position())).collect();
        let frame_shifts: Vec<FrameShift> =
            frame_shifts.into_iter().filter(|fs| in_span(fs.position())).collect();

        let span_nas = 3 * (last_aa + 1).saturating_sub(first_aa);
        let num_discordant_nas = mutations
            .iter()
            .filter(|m| !m.is_unsequenced())
            .map(Mutation::num_discordant_nas)
            .sum::<usize>()
            .min(span_nas);

        Self {
            gene,
            first_aa,
            last_aa,
            first_na,
            last_na,
            sites,
            mutations,
            frame_shifts,
            num_discordant_nas,
        }
    }

    pub fn gene(&self) -> &Gene {
        &self.gene
    }

    pub fn first_aa(&self) -> usize {
        self.first_aa
    }

    pub fn last_aa(&self) -> usize {
        self.last_aa
    }

    pub fn first_na(&self) -> usize {
        self.first_na
    }

    pub fn last_na(&self) -> usize {
        self.last_na
    }

    pub fn sites(&self) -> &[AlignedSite] {
        &self.sites
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn frame_shifts(&self) -> &[FrameShift] {
        &self.frame_shifts
    }

    /// Number of amino acid positions in the span.
    pub fn size(&self) -> usize {
        (self.last_aa + 1).saturating_sub(self.first_aa)
    }

    /// Reference nucleotide positions covered by the span (three per codon).
    pub fn num_nas(&self) -> usize {
        3 * self.size()
    }

    /// Nucleotides that are mismatched or deleted relative to the reference.
    pub fn num_discordant_nas(&self) -> usize {
        self.num_discordant_nas
    }

    pub fn num_matched_nas(&self) -> usize {
        self.num_nas() - self.num_discordant_nas
    }

    /// Percentage (0-100) of span nucleotides that match the reference.
    pub fn match_pcnt(&self) -> f64 {
        let num_nas = self.num_nas();
        if num_nas == 0 {
            return 0.0;
        }
        100.0 * self.num_matched_nas() as f64 / num_nas as f64
    }
}

/// The alignment of one input sequence against the genes of one strain.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSequence {
    /// The sequence as submitted by the caller (never reverse complemented)
    pub input: Sequence,
    /// Strain whose genes were aligned
    pub strain: String,
    /// Whether the alignment was obtained from the reverse complement
    pub reversed: bool,
    /// Aligned genes, in configuration order
    pub genes: Vec<AlignedGeneSequence>,
    /// Genes discarded for a reportable reason, with the reason
    pub discarded: Vec<(String, String)>,
}

impl AlignedSequence {
    /// True if no gene was aligned.
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Matched nucleotides summed over all aligned genes.
    pub fn num_matched_nas(&self) -> usize {
        self.genes.iter().map(AlignedGeneSequence::num_matched_nas).sum()
    }

    /// Looks up an aligned gene by name.
    pub fn gene(&self, name: &str) -> Option<&AlignedGeneSequence> {
        self.genes.iter().find(|g| g.gene().name == name)
    }

    /// Names of the aligned genes.
    pub fn available_genes(&self) -> Vec<&str> {
        self.genes.iter().map(|g| g.gene().name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{RawFrameShift, RawMutation};

    fn substitution(position: i64, reference: &str, codon: &str) -> Mutation {
        let raw = RawMutation {
            position,
            reference_text: reference.to_string(),
            codon_text: codon.to_string(),
            ..RawMutation::default()
        };
        Mutation::from_raw(&Gene::new("RT", 560), 1, &raw)
    }

    #[test]
    fn test_sequence_creation() {
        let seq = Sequence::new("seq1", "ACGT");
        assert_eq!(seq.name, "seq1");
        assert_eq!(seq.nucleotides, "ACGT");
        assert_eq!(seq.len(), 4);
        assert!(!seq.reversed);
    }

    #[test]
    fn test_reverse_complement_toggles_orientation() {
        let seq = Sequence::new("seq1", "AACGR");
        let rev = seq.reverse_complement();
        assert_eq!(rev.nucleotides, "YCGTT");
        assert!(rev.reversed);
        assert_eq!(rev.reverse_complement(), seq);
    }

    #[test]
    fn test_site_positions() {
        let site = AlignedSite::contiguous(5, 13, 3);
        assert_eq!(site.first_pos_na(), Some(13));
        assert_eq!(site.last_pos_na(), Some(15));

        let split = AlignedSite::split(6, vec![None, Some(17), None], 3);
        assert_eq!(split.first_pos_na(), Some(17));
        assert_eq!(split.last_pos_na(), Some(17));

        let gap = AlignedSite::contiguous(7, 20, 0);
        assert!(gap.is_unsequenced());
    }

    #[test]
    fn test_site_from_raw() {
        let raw = RawAlignedSite { pos_aa: 3, pos_na: Some(7), pos_nas: None, length_na: 3 };
        assert_eq!(AlignedSite::from_raw(&raw), AlignedSite::contiguous(3, 7, 3));

        let raw = RawAlignedSite {
            pos_aa: 4,
            pos_na: None,
            pos_nas: Some(vec![Some(10), None, Some(12)]),
            length_na: 2,
        };
        assert_eq!(AlignedSite::from_raw(&raw).pos_nas, vec![Some(10), None, Some(12)]);

        let raw = RawAlignedSite { pos_aa: 5, pos_na: None, pos_nas: None, length_na: 0 };
        assert!(AlignedSite::from_raw(&raw).is_unsequenced());
    }

    #[test]
    fn test_huge_contiguous_site() {
        let raw: RawAlignedSite =
            serde_json::from_str(r#"{"PosAA": 1, "PosNA": 9.2e18, "LengthNA": 9.2e18}"#).unwrap();
        let site = AlignedSite::from_raw(&raw);
        assert!(site.pos_nas.is_empty());
        assert_eq!(site.first_pos_na(), Some(9_200_000_000_000_000_000));
        assert_eq!(site.last_pos_na(), Some(18_399_999_999_999_999_999));

        let site = AlignedSite::contiguous(1, usize::MAX - 1, 3);
        assert_eq!(site.last_pos_na(), Some(usize::MAX));
    }

    #[test]
    fn test_gene_sequence_match_statistics() {
        // 10 codons, one with a single mismatch, one deletion, one unsequenced
        let deletion = RawMutation {
            position: 5,
            reference_text: "K".to_string(),
            is_deletion: true,
            ..RawMutation::default()
        };
        let mutations = vec![
            substitution(3, "K", "AAT"),
            Mutation::from_raw(&Gene::new("RT", 560), 1, &deletion),
            substitution(7, "K", "NNN"),
        ];
        let seq = AlignedGeneSequence::new(
            Gene::new("RT", 560),
            1,
            10,
            1,
            27,
            Vec::new(),
            mutations,
            Vec::new(),
        );
        assert_eq!(seq.size(), 10);
        assert_eq!(seq.num_nas(), 30);
        assert_eq!(seq.num_discordant_nas(), 4);
        assert_eq!(seq.num_matched_nas(), 26);
        assert!((seq.match_pcnt() - 100.0 * 26.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_gene_sequence_drops_entries_outside_span() {
        let frame_shift = RawFrameShift { position: 12, is_insertion: true, gap_length: 1, ..Default::default() };
        let seq = AlignedGeneSequence::new(
            Gene::new("PR", 99),
            3,
            8,
            7,
            24,
            (1..=10).map(|aa| AlignedSite::contiguous(aa, aa * 3 - 2, 3)).collect(),
            vec![substitution(2, "K", "AAT"), substitution(4, "K", "AAT")],
            vec![FrameShift::from_raw(&Gene::new("PR", 99), 1, &frame_shift)],
        );
        assert_eq!(seq.sites().len(), 6);
        assert_eq!(seq.mutations().len(), 1);
        assert_eq!(seq.mutations()[0].position(), 4);
        assert!(seq.frame_shifts().is_empty());
    }

    #[test]
    fn test_aligned_sequence_totals() {
        let gene_seq = |name: &str, codon: &str| {
            AlignedGeneSequence::new(
                Gene::new(name, 100),
                1,
                4,
                1,
                12,
                Vec::new(),
                vec![substitution(2, "K", codon)],
                Vec::new(),
            )
        };
        let aligned = AlignedSequence {
            input: Sequence::new("s", "AAA"),
            strain: "B".to_string(),
            reversed: false,
            genes: vec![gene_seq("PR", "AAA"), gene_seq("RT", "GGG")],
            discarded: Vec::new(),
        };
        assert!(!aligned.is_empty());
        assert_eq!(aligned.num_matched_nas(), 12 + 10);
        assert_eq!(aligned.available_genes(), vec!["PR", "RT"]);
        assert!(aligned.gene("IN").is_none());
    }
}
