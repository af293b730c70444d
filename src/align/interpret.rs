//! Interpretation of one raw gene report into a validated gene alignment.

use log::debug;

use super::MisalignedError;
use crate::model::{AlignedGeneSequence, AlignedSite, Gene, Sequence};
use crate::mutation::{FrameShift, Mutation};
use crate::report::GeneReport;

/// Reading frame offset of the aligner's positions: they are already gene positions.
const REPORT_FIRST_AA: usize = 1;

/// Counts the gap-only codons at both ends of `first_aa..=last_aa`.
///
/// A codon is a gap when a deletion or an unsequenced mutation covers it.
/// Returns `(trim_left, trim_right)`; both are 0 when every codon is a gap.
pub fn trim_gaps(first_aa: usize, last_aa: usize, mutations: &[Mutation]) -> (usize, usize) {
    let size = (last_aa + 1).saturating_sub(first_aa);
    if size == 0 {
        return (0, 0);
    }
    let mut is_gap = vec![false; size];
    for mutation in mutations {
        if !(mutation.is_deletion() || mutation.is_unsequenced()) {
            continue;
        }
        let pos = mutation.position();
        if pos >= first_aa && pos <= last_aa {
            is_gap[pos - first_aa] = true;
        }
    }

    let Some(trim_left) = is_gap.iter().position(|gap| !gap) else {
        return (0, 0);
    };
    let trim_right = is_gap.iter().rev().position(|gap| !gap).unwrap_or(0);
    (trim_left, trim_right)
}

/// Builds the alignment of `sequence` against `gene` from the aligner's report.
///
/// The reported span is clamped to the gene, gap-only codons are trimmed from
/// both ends, and the result must cover at least `min_num_of_sites` codons
/// with at least `min_match_pcnt` percent of its nucleotides matching.
pub fn gene_seq_from_report(
    sequence: &Sequence,
    gene: &Gene,
    report: &GeneReport,
    min_match_pcnt: f64,
    min_num_of_sites: usize,
) -> Result<AlignedGeneSequence, MisalignedError> {
    let first_aa = report.first_aa.max(1);
    let last_aa = report.last_aa.min(i64::try_from(gene.aa_length).unwrap_or(i64::MAX));
    let aa_size = usize::try_from(last_aa.saturating_sub(first_aa).saturating_add(1)).unwrap_or(0);
    if aa_size < min_num_of_sites {
        return Err(MisalignedError::TooShort {
            gene: gene.name.clone(),
            size: aa_size,
            min_num_of_sites,
            suppressible: aa_size == 0,
        });
    }
    // aa_size > 0 here, so both bounds are positive
    let first_aa = usize::try_from(first_aa).unwrap_or(1);
    let last_aa = first_aa + aa_size - 1;

    let mut sites: Vec<AlignedSite> = report.aligned_sites.iter().map(AlignedSite::from_raw).collect();
    sites.sort_by_key(|site| site.pos_aa);
    let first_na = sites.iter().find_map(AlignedSite::first_pos_na);
    let last_na = sites.iter().rev().find_map(AlignedSite::last_pos_na);
    let (Some(first_na), Some(last_na)) = (first_na, last_na) else {
        return Err(MisalignedError::EmptySpan { gene: gene.name.clone() });
    };

    let mutations: Vec<Mutation> =
        report.mutations.iter().map(|raw| Mutation::from_raw(gene, REPORT_FIRST_AA, raw)).collect();
    let frame_shifts: Vec<FrameShift> =
        report.frame_shifts.iter().map(|raw| FrameShift::from_raw(gene, REPORT_FIRST_AA, raw)).collect();

    let (trim_left, trim_right) = trim_gaps(first_aa, last_aa, &mutations);
    if trim_left + trim_right > 0 {
        debug!(
            "{}/{}: trimmed {} leading and {} trailing gap codons",
            sequence.name, gene.name, trim_left, trim_right
        );
    }

    let gene_seq = AlignedGeneSequence::new(
        gene.clone(),
        first_aa + trim_left,
        last_aa - trim_right,
        first_na + 3 * trim_left,
        last_na.saturating_sub(3 * trim_right),
        sites,
        mutations,
        frame_shifts,
    );

    let match_pcnt = gene_seq.match_pcnt();
    if match_pcnt < min_match_pcnt {
        return Err(MisalignedError::LowMatch {
            gene: gene.name.clone(),
            discordance: 100.0 - match_pcnt,
            max_discordance: 100.0 - min_match_pcnt,
        });
    }
    if gene_seq.size() < min_num_of_sites {
        return Err(MisalignedError::TooShort {
            gene: gene.name.clone(),
            size: gene_seq.size(),
            min_num_of_sites,
            suppressible: false,
        });
    }
    Ok(gene_seq)
}
