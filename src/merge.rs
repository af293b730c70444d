//! Consensus ("merged") codons.
//!
//! Collapses several observed codons at one position into a single codon that
//! may carry IUPAC ambiguity codes.

use std::collections::BTreeSet;

use crate::ambiguity::{ambiguity_code_for, code_mask, mask_bases, GAP};

/// Emitted where no legal base was observed at a position.
const NO_CALL: char = 'N';

/// Merges codons into one codon, position by position.
///
/// `codons` must be ordered by prevalence, highest first. At each position
/// every codon long enough contributes its base, with ambiguity codes
/// expanded to their bases. A gap is only taken from a codon when no
/// higher-prevalence codon has contributed at that position. Symbols other
/// than A, C, G, T and `-` are discarded. Then:
///
/// - nothing left: `N`
/// - a gap present: `-`
/// - otherwise: the ambiguity code of exactly the observed bases
///
/// Input is case-insensitive. The result is as long as the longest codon.
///
/// # Examples
///
/// ```
/// use genecall::merge::merge_codons;
///
/// assert_eq!(merge_codons(&["AAA", "AAG"]), "AAR");
/// assert_eq!(merge_codons(&["AAA", "---"]), "AAA");
/// assert_eq!(merge_codons(&["---", "AAA"]), "---");
/// ```
#[must_use]
pub fn merge_codons<S: AsRef<str>>(codons: &[S]) -> String {
    let longest = codons.iter().map(|cd| cd.as_ref().len()).max().unwrap_or(0);

    (0..longest)
        .map(|idx| {
            let mut bases = BTreeSet::new();
            for codon in codons {
                let Some(&base) = codon.as_ref().as_bytes().get(idx) else {
                    continue;
                };
                let base = base.to_ascii_uppercase();
                if base == GAP && !bases.is_empty() {
                    continue;
                }
                let mask = code_mask(base);
                if mask == 0 {
                    bases.insert(base);
                } else {
                    bases.extend(mask_bases(mask));
                }
            }
            bases.retain(|&b| matches!(b, b'A' | b'C' | b'G' | b'T' | GAP));
            merged_base(&bases)
        })
        .collect()
}

fn merged_base(bases: &BTreeSet<u8>) -> char {
    if bases.is_empty() {
        return NO_CALL;
    }
    if bases.contains(&GAP) {
        return GAP as char;
    }
    let observed: Vec<u8> = bases.iter().copied().collect();
    ambiguity_code_for(&observed).map_or(NO_CALL, char::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_codons() {
        assert_eq!(merge_codons(&["AAA", "AAA"]), "AAA");
        assert_eq!(merge_codons(&["ATG"]), "ATG");
    }

    #[test]
    fn test_wobble_position() {
        assert_eq!(merge_codons(&["AAA", "AAG"]), "AAR");
        assert_eq!(merge_codons(&["AAA", "AAG", "AAC", "AAT"]), "AAN");
        assert_eq!(merge_codons(&["CAT", "TAC"]), "YAY");
    }

    #[test]
    fn test_ambiguous_inputs_are_expanded() {
        assert_eq!(merge_codons(&["AAR", "AAC"]), "AAV");
        assert_eq!(merge_codons(&["AAY", "AAR"]), "AAN");
    }

    #[test]
    fn test_gap_only_when_most_prevalent() {
        assert_eq!(merge_codons(&["AAA", "---"]), "AAA");
        assert_eq!(merge_codons(&["---", "AAA"]), "---");
        assert_eq!(merge_codons(&["A--", "AAA"]), "A--");
        assert_eq!(merge_codons(&["AAA", "A--", "A-G"]), "AAR");
    }

    #[test]
    fn test_illegal_symbols_dropped() {
        assert_eq!(merge_codons(&["XAA"]), "NAA");
        // X fills the position first, so the gap is skipped and nothing legal remains
        assert_eq!(merge_codons(&["XAA", "-AA"]), "NAA");
        assert_eq!(merge_codons(&["XAA", "GAA"]), "GAA");
        assert_eq!(merge_codons(&["A*A", "A.G", "AUA"]), "ANR");
    }

    #[test]
    fn test_uneven_lengths() {
        assert_eq!(merge_codons(&["AA", "AAG"]), "AAG");
        assert_eq!(merge_codons(&["A", "CAT"]), "MAT");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(merge_codons::<&str>(&[]), "");
        assert_eq!(merge_codons(&[""]), "");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(merge_codons(&["aaa", "AAG"]), "AAR");
    }
}
