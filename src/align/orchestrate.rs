//! Batch alignment across strains with a single reverse-complement retry.
//!
//! A batch is aligned in at most two passes. The forward pass submits every
//! sequence to the aligner once per strain; sequences that failed on every
//! strain are then submitted again as reverse complements. Results are
//! indexed by input position, so records with identical content stay
//! distinct.

use std::slice;

use log::{debug, info, warn};
use rayon::prelude::*;

use super::{gene_seq_from_report, Aligner, AlignerError, StrainReport};
use crate::config::{AlignmentConfig, StrainConfig};
use crate::model::{AlignedSequence, Sequence};

/// Outcome of the alignment passes for one sequence.
#[derive(Debug, Default)]
struct AlignmentAttempt {
    /// Best alignment over all strains, if any strain aligned
    aligned: Option<AlignedSequence>,
    /// Per-strain failures, as `strain (orientation): reason`
    failures: Vec<String>,
}

/// Keeps the alignment with more matched nucleotides.
///
/// An absent or empty `known` result is always replaced by the candidate.
/// On a tie the known result wins.
pub fn select_best_alignment(
    known: Option<AlignedSequence>,
    candidate: Option<AlignedSequence>,
) -> Option<AlignedSequence> {
    match (known, candidate) {
        (Some(known), Some(candidate)) if !known.is_empty() => {
            if candidate.num_matched_nas() > known.num_matched_nas() {
                Some(candidate)
            } else {
                Some(known)
            }
        }
        (Some(known), None) => Some(known),
        (_, candidate) => candidate,
    }
}

/// Aligns a single sequence; see [`align_batch`].
pub fn align_one<A: Aligner + ?Sized>(
    aligner: &A,
    config: &AlignmentConfig,
    sequence: &Sequence,
) -> Option<AlignedSequence> {
    align_batch(aligner, config, slice::from_ref(sequence)).into_iter().next().flatten()
}

/// Aligns a batch of sequences against every strain of `config`.
///
/// The returned vector is parallel to `sequences`; an entry is `None` when no
/// gene of any strain could be aligned in either orientation.
pub fn align_batch<A: Aligner + ?Sized>(
    aligner: &A,
    config: &AlignmentConfig,
    sequences: &[Sequence],
) -> Vec<Option<AlignedSequence>> {
    align_batch_from(aligner, config, sequences, false)
}

/// Like [`align_batch`], optionally submitting reverse complements first.
///
/// Only a forward first pass is followed by a retry; when `reverse_first` is
/// set, a single reverse pass is made.
pub fn align_batch_from<A: Aligner + ?Sized>(
    aligner: &A,
    config: &AlignmentConfig,
    sequences: &[Sequence],
    reverse_first: bool,
) -> Vec<Option<AlignedSequence>> {
    let attempts = run_passes(aligner, config, sequences, reverse_first);
    sequences
        .iter()
        .zip(attempts)
        .map(|(sequence, attempt)| {
            if attempt.aligned.is_none() {
                warn!("Sequence '{}' could not be aligned: {}", sequence.name, attempt.failures.join("; "));
            }
            attempt.aligned
        })
        .collect()
}

/// Runs the first pass and, unless `reverse_first` is set, the reverse retry.
///
/// Failures of both passes are kept for sequences that remain unaligned.
fn run_passes<A: Aligner + ?Sized>(
    aligner: &A,
    config: &AlignmentConfig,
    sequences: &[Sequence],
    reverse_first: bool,
) -> Vec<AlignmentAttempt> {
    let all: Vec<usize> = (0..sequences.len()).collect();
    let mut attempts = run_pass(aligner, config, sequences, &all, reverse_first);
    if reverse_first {
        return attempts;
    }

    let failed: Vec<usize> = all.into_iter().filter(|&idx| attempts[idx].aligned.is_none()).collect();
    if failed.is_empty() {
        return attempts;
    }

    info!("Retrying {} of {} sequence(s) as reverse complement", failed.len(), sequences.len());
    let second_pass = run_pass(aligner, config, sequences, &failed, true);
    for (&idx, retry) in failed.iter().zip(second_pass) {
        let attempt = &mut attempts[idx];
        attempt.aligned = select_best_alignment(attempt.aligned.take(), retry.aligned);
        attempt.failures.extend(retry.failures);
    }
    attempts
}

/// Aligns `sequences[indices]` in one orientation against every strain.
///
/// Returns one attempt per entry of `indices`, in the same order.
fn run_pass<A: Aligner + ?Sized>(
    aligner: &A,
    config: &AlignmentConfig,
    sequences: &[Sequence],
    indices: &[usize],
    reversed: bool,
) -> Vec<AlignmentAttempt> {
    let submitted: Vec<Sequence> = indices
        .iter()
        .map(|&idx| if reversed { sequences[idx].reverse_complement() } else { sequences[idx].clone() })
        .collect();

    let orientation = if reversed { "reverse" } else { "forward" };
    let mut attempts: Vec<AlignmentAttempt> = indices.iter().map(|_| AlignmentAttempt::default()).collect();
    for strain in &config.strains {
        debug!("Aligning {} sequence(s) against {} (reversed: {})", submitted.len(), strain.name, reversed);
        let reports = match aligner.command_align(strain, &submitted) {
            Ok(reports) => reports,
            Err(err) => {
                warn!("Strain {} failed for the whole batch: {}", strain.name, err);
                let failure = format!("{} ({orientation}): {err}", strain.name);
                for attempt in &mut attempts {
                    attempt.failures.push(failure.clone());
                }
                continue;
            }
        };

        let outcomes: Vec<Result<AlignedSequence, String>> = (0..submitted.len())
            .into_par_iter()
            .map(|pos| {
                let report = match reports.get(pos) {
                    Some(Ok(report)) => report,
                    Some(Err(err)) => return Err(err.to_string()),
                    None => {
                        let missing = AlignerError::MissingReport {
                            strain: strain.name.clone(),
                            sequence: submitted[pos].name.clone(),
                            orientation,
                        };
                        return Err(missing.to_string());
                    }
                };
                interpret_strain(&sequences[indices[pos]], &submitted[pos], strain, report)
            })
            .collect();

        for (attempt, outcome) in attempts.iter_mut().zip(outcomes) {
            match outcome {
                Ok(aligned) => {
                    let known = attempt.aligned.take();
                    attempt.aligned = select_best_alignment(known, Some(aligned));
                }
                Err(reason) => attempt.failures.push(format!("{} ({orientation}): {reason}", strain.name)),
            }
        }
    }
    attempts
}

/// Interprets every configured gene of `strain` for one submitted sequence.
fn interpret_strain(
    input: &Sequence,
    submitted: &Sequence,
    strain: &StrainConfig,
    report: &StrainReport,
) -> Result<AlignedSequence, String> {
    let mut genes = Vec::new();
    let mut discarded = Vec::new();
    for gene_config in &strain.genes {
        let Some(gene_report) = report.get(gene_config.name()) else {
            debug!("{}: no {} report for gene {}", submitted.name, strain.name, gene_config.name());
            continue;
        };
        match gene_seq_from_report(
            submitted,
            &gene_config.gene,
            gene_report,
            gene_config.min_match_pcnt,
            gene_config.min_num_of_sites,
        ) {
            Ok(gene_seq) => genes.push(gene_seq),
            Err(err) if err.suppressible() => debug!("{}: {}", submitted.name, err),
            Err(err) => discarded.push((gene_config.name().to_string(), err.to_string())),
        }
    }

    if genes.is_empty() {
        if discarded.is_empty() {
            return Err("no gene could be aligned".to_string());
        }
        let reasons: Vec<String> = discarded.into_iter().map(|(_, reason)| reason).collect();
        return Err(reasons.join(" "));
    }
    Ok(AlignedSequence {
        input: input.clone(),
        strain: strain.name.clone(),
        reversed: submitted.reversed,
        genes,
        discarded,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::align::BatchReports;
    use crate::config::GeneConfig;
    use crate::model::{AlignedGeneSequence, Gene};
    use crate::mutation::Mutation;
    use crate::report::{GeneReport, RawAlignedSite, RawMutation};

    /// Serves canned reports keyed by (strain, nucleotides) and records every call.
    #[derive(Default)]
    struct MockAligner {
        reports: HashMap<(String, String), StrainReport>,
        broken_strains: Vec<String>,
        calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl MockAligner {
        fn with_report(mut self, strain: &str, nucleotides: &str, gene: &str, report: GeneReport) -> Self {
            self.reports
                .entry((strain.to_string(), nucleotides.to_string()))
                .or_default()
                .insert(gene.to_string(), report);
            self
        }

        fn calls(&self) -> Vec<(String, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Aligner for MockAligner {
        fn command_align(&self, strain: &StrainConfig, sequences: &[Sequence]) -> Result<BatchReports, AlignerError> {
            self.calls
                .lock()
                .unwrap()
                .push((strain.name.clone(), sequences.iter().map(|s| s.nucleotides.clone()).collect()));
            if self.broken_strains.contains(&strain.name) {
                return Err(AlignerError::Backend { strain: strain.name.clone(), reason: "timed out".to_string() });
            }
            Ok(sequences
                .iter()
                .map(|seq| {
                    Ok(self.reports.get(&(strain.name.clone(), seq.nucleotides.clone())).cloned().unwrap_or_default())
                })
                .collect())
        }
    }

    fn config() -> AlignmentConfig {
        let strain = |name: &str| StrainConfig { name: name.to_string(), genes: vec![GeneConfig::new("PR", 99)] };
        AlignmentConfig { virus: "HIV1".to_string(), strains: vec![strain("HIV1"), strain("HIV2")] }
    }

    /// A report for codons `1..=last_aa` with `mismatches` codons of CCC against Lys.
    fn gene_report(last_aa: i64, mismatches: i64) -> GeneReport {
        GeneReport {
            first_aa: 1,
            last_aa,
            aligned_sites: (1..=last_aa)
                .map(|aa| RawAlignedSite { pos_aa: aa, pos_na: Some(3 * aa - 2), pos_nas: None, length_na: 3 })
                .collect(),
            mutations: (2..2 + mismatches)
                .map(|pos| RawMutation {
                    position: pos,
                    reference_text: "K".to_string(),
                    codon_text: "CCC".to_string(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    const FORWARD: &str = "ATGAAACCCGGG"; // reverse complement: CCCGGGTTTCAT
    const REVERSED: &str = "AAACCCGGGTTA"; // reverse complement: TAACCCGGGTTT

    #[test]
    fn test_forward_alignment() {
        let aligner = MockAligner::default().with_report("HIV1", FORWARD, "PR", gene_report(10, 0));
        let results = align_batch(&aligner, &config(), &[Sequence::new("s1", FORWARD)]);

        let aligned = results[0].as_ref().unwrap();
        assert_eq!(aligned.strain, "HIV1");
        assert!(!aligned.reversed);
        assert_eq!(aligned.num_matched_nas(), 30);
        assert_eq!(aligned.available_genes(), vec!["PR"]);
        // no retry when everything aligned
        assert_eq!(aligner.calls().len(), 2);
    }

    #[test]
    fn test_strain_with_more_matches_wins() {
        let aligner = MockAligner::default()
            .with_report("HIV1", FORWARD, "PR", gene_report(10, 2))
            .with_report("HIV2", FORWARD, "PR", gene_report(10, 0));
        let aligned = align_one(&aligner, &config(), &Sequence::new("s1", FORWARD)).unwrap();
        assert_eq!(aligned.strain, "HIV2");

        // equal counts keep the earlier strain
        let aligner = MockAligner::default()
            .with_report("HIV1", FORWARD, "PR", gene_report(10, 0))
            .with_report("HIV2", FORWARD, "PR", gene_report(10, 0));
        let aligned = align_one(&aligner, &config(), &Sequence::new("s1", FORWARD)).unwrap();
        assert_eq!(aligned.strain, "HIV1");
    }

    #[test]
    fn test_reverse_complement_retry() {
        let reverse = Sequence::new("s2", REVERSED).reverse_complement().nucleotides;
        let aligner = MockAligner::default()
            .with_report("HIV1", FORWARD, "PR", gene_report(10, 0))
            .with_report("HIV2", &reverse, "PR", gene_report(8, 0));
        let input = vec![Sequence::new("s1", FORWARD), Sequence::new("s2", REVERSED)];
        let results = align_batch(&aligner, &config(), &input);

        let aligned = results[1].as_ref().unwrap();
        assert!(aligned.reversed);
        assert_eq!(aligned.strain, "HIV2");
        assert_eq!(aligned.input, input[1]);
        assert!(!aligned.input.reversed);

        // only the failed sequence is resubmitted, once per strain
        let calls = aligner.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[2].1, vec![reverse.clone()]);
        assert_eq!(calls[3].1, vec![reverse]);
    }

    #[test]
    fn test_unaligned_in_both_orientations() {
        let aligner = MockAligner::default().with_report("HIV1", FORWARD, "PR", gene_report(10, 0));
        let input = vec![Sequence::new("junk", "NNNNNN"), Sequence::new("s1", FORWARD)];
        let results = align_batch(&aligner, &config(), &input);
        assert!(results[0].is_none());
        assert!(results[1].is_some());
    }

    #[test]
    fn test_reverse_first_makes_single_pass() {
        let aligner = MockAligner::default().with_report("HIV1", FORWARD, "PR", gene_report(10, 0));
        let results = align_batch_from(&aligner, &config(), &[Sequence::new("s1", FORWARD)], true);
        assert!(results[0].is_none());
        assert_eq!(aligner.calls().len(), 2);
    }

    #[test]
    fn test_failures_of_both_passes_are_kept() {
        let mut aligner = MockAligner::default();
        aligner.broken_strains.push("HIV2".to_string());
        let input = vec![Sequence::new("junk", "NNNNNN")];

        let attempts = run_passes(&aligner, &config(), &input, false);
        assert!(attempts[0].aligned.is_none());
        let failures = &attempts[0].failures;
        assert_eq!(failures.len(), 4);
        assert!(failures[0].starts_with("HIV1 (forward): "));
        assert!(failures[1].starts_with("HIV2 (forward): "));
        assert!(failures[1].contains("timed out"));
        assert!(failures[2].starts_with("HIV1 (reverse): "));
        assert!(failures[3].starts_with("HIV2 (reverse): "));

        let attempts = run_passes(&aligner, &config(), &input, true);
        assert_eq!(attempts[0].failures.len(), 2);
        assert!(attempts[0].failures.iter().all(|failure| failure.contains("(reverse)")));
    }

    #[test]
    fn test_low_match_genes_are_discarded() {
        let aligner = MockAligner::default().with_report("HIV1", FORWARD, "PR", gene_report(10, 5));
        let results = align_batch(&aligner, &config(), &[Sequence::new("s1", FORWARD)]);
        assert!(results[0].is_none());
    }

    #[test]
    fn test_duplicate_content_stays_distinct() {
        let aligner = MockAligner::default().with_report("HIV1", FORWARD, "PR", gene_report(10, 0));
        let input = vec![Sequence::new("a", FORWARD), Sequence::new("b", FORWARD), Sequence::new("a", FORWARD)];
        let results = align_batch(&aligner, &config(), &input);
        assert_eq!(results.len(), 3);
        let names: Vec<&str> = results.iter().map(|r| r.as_ref().unwrap().input.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_idempotent() {
        let aligner = MockAligner::default()
            .with_report("HIV1", FORWARD, "PR", gene_report(10, 1))
            .with_report("HIV2", FORWARD, "PR", gene_report(12, 0));
        let input = vec![Sequence::new("s1", FORWARD), Sequence::new("s2", REVERSED)];
        let first = align_batch(&aligner, &config(), &input);
        let second = align_batch(&aligner, &config(), &input);
        assert_eq!(first, second);
    }

    #[test]
    fn test_broken_strain_does_not_abort_batch() {
        let mut aligner = MockAligner::default().with_report("HIV2", FORWARD, "PR", gene_report(10, 0));
        aligner.broken_strains.push("HIV1".to_string());
        let aligned = align_one(&aligner, &config(), &Sequence::new("s1", FORWARD)).unwrap();
        assert_eq!(aligned.strain, "HIV2");
    }

    /// An alignment of codons `1..=size` where CCC and GGG against Lys cost 3 + 2 bases.
    fn aligned_with_matches(size: usize) -> AlignedSequence {
        let gene = Gene::new("PR", 99);
        let mutations = [(2, "CCC"), (3, "GGG")]
            .into_iter()
            .map(|(position, codon)| {
                let raw = RawMutation {
                    position,
                    reference_text: "K".to_string(),
                    codon_text: codon.to_string(),
                    ..Default::default()
                };
                Mutation::from_raw(&gene, 1, &raw)
            })
            .collect();
        AlignedSequence {
            input: Sequence::new("s1", FORWARD),
            strain: "HIV1".to_string(),
            reversed: false,
            genes: vec![AlignedGeneSequence::new(gene, 1, size, 1, 3 * size, Vec::new(), mutations, Vec::new())],
            discarded: Vec::new(),
        }
    }

    #[test]
    fn test_select_best_alignment() {
        let forty = aligned_with_matches(15);
        let fifty_five = AlignedSequence { reversed: true, ..aligned_with_matches(20) };
        assert_eq!(forty.num_matched_nas(), 40);
        assert_eq!(fifty_five.num_matched_nas(), 55);

        assert_eq!(select_best_alignment(Some(forty.clone()), Some(fifty_five.clone())), Some(fifty_five.clone()));
        assert_eq!(select_best_alignment(Some(fifty_five.clone()), Some(forty.clone())), Some(fifty_five.clone()));
        assert_eq!(select_best_alignment(None, Some(forty.clone())), Some(forty.clone()));
        assert_eq!(select_best_alignment(Some(forty.clone()), None), Some(forty.clone()));
        assert_eq!(select_best_alignment(None, None), None);

        // ties keep the known result
        let tie = AlignedSequence { strain: "HIV2".to_string(), ..forty.clone() };
        assert_eq!(select_best_alignment(Some(forty.clone()), Some(tie.clone())), Some(forty.clone()));

        // an empty known result is always replaced
        let empty = AlignedSequence { genes: Vec::new(), ..fifty_five };
        assert_eq!(select_best_alignment(Some(empty), Some(forty.clone())), Some(forty));
    }
}
