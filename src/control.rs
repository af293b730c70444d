//! Mutation control strings.
//!
//! A control string marks, codon by codon, how an observed triplet lines up
//! with the closest canonical codon of a reference amino acid:
//!
//! ```text
//! :::   the observed codon is itself a canonical codon of the reference
//! .     this base matches the best canonical codon
//!       (space) this base differs from it
//! ```
//!
//! The best codon is the first one with the highest match count, scanning
//! canonical codons in the order returned by
//! [`translate_aa_to_codons_canonical`]. Ambiguity codes are compared as
//! plain letters, so this is a readable minimum-edit sketch rather than a
//! guaranteed optimum.

use crate::genetic_code::{three_to_one, translate_aa_to_codons_canonical};

/// Marker for an observed codon that exactly matches a canonical codon.
pub const EXACT_MATCH: &str = ":::";

/// Control string returned when the reference has no canonical codons.
const NO_MATCH: &str = "   ";

/// Generates the control string of one observed codon against a reference amino acid.
///
/// Both inputs are case-insensitive.
///
/// # Examples
///
/// ```
/// use genecall::control::control_string;
///
/// // TTT is closest to the Asn codon AAT
/// assert_eq!(control_string("TTT", 'N'), "  .");
/// assert_eq!(control_string("AAC", 'N'), ":::");
/// ```
#[must_use]
pub fn control_string(observed: &str, reference_aa: char) -> String {
    let Ok(candidates) = translate_aa_to_codons_canonical(reference_aa.to_ascii_uppercase()) else {
        return NO_MATCH.to_string();
    };
    let observed = observed.to_ascii_uppercase();
    let observed = observed.as_bytes();

    let mut max_matched: Option<usize> = None;
    let mut best = NO_MATCH.to_string();
    for candidate in candidates {
        let mut matched = 0;
        let mut control = String::with_capacity(3);
        for (idx, &base) in candidate.as_bytes().iter().enumerate() {
            if observed.get(idx) == Some(&base) {
                control.push('.');
                matched += 1;
            } else {
                control.push(' ');
            }
        }
        if matched == 3 {
            return EXACT_MATCH.to_string();
        }
        if max_matched.map_or(true, |max| matched > max) {
            max_matched = Some(matched);
            best = control;
        }
    }
    best
}

/// Number of bases of `observed` that differ from the closest canonical codon.
///
/// Returns 3 when the reference has no canonical codons.
#[must_use]
pub fn num_discordant_bases(observed: &str, reference_aa: char) -> usize {
    let control = control_string(observed, reference_aa);
    if control == EXACT_MATCH {
        0
    } else {
        control.bytes().filter(|&b| b == b' ').count()
    }
}

/// Generates the control string of a nucleotide sequence against
/// concatenated three-letter amino acid names (e.g. `"LysAsn"`).
///
/// Both inputs are read in chunks of 3 and zipped; output stops at the
/// shorter input.
///
/// # Examples
///
/// ```
/// use genecall::control::control_string_for_sequence;
///
/// assert_eq!(control_string_for_sequence("AAATTT", "LysAsn"), ":::  .");
/// ```
#[must_use]
pub fn control_string_for_sequence(all_nas: &str, all_aas: &str) -> String {
    all_nas
        .as_bytes()
        .chunks(3)
        .zip(all_aas.as_bytes().chunks(3))
        .map(|(nas, aas)| {
            let nas = String::from_utf8_lossy(nas);
            let aa = std::str::from_utf8(aas).ok().and_then(three_to_one).unwrap_or('X');
            control_string(&nas, aa)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert_eq!(control_string("AAA", 'K'), EXACT_MATCH);
        assert_eq!(control_string("AAG", 'K'), EXACT_MATCH);
        assert_eq!(control_string("ATG", 'M'), EXACT_MATCH);
    }

    #[test]
    fn test_partial_match() {
        // Lys codons: AAA, AAG
        assert_eq!(control_string("AAT", 'K'), ".. ");
        assert_eq!(control_string("GAT", 'K'), " . ");
        // Met has a single codon
        assert_eq!(control_string("CTT", 'M'), " . ");
    }

    #[test]
    fn test_first_best_match_wins() {
        // Asn codons: AAC, AAT. GGG matches neither, so AAC (first) is kept.
        assert_eq!(control_string("GGG", 'N'), "   ");
        // ACC matches AAC at 2 positions and AAT at 1
        assert_eq!(control_string("ACC", 'N'), ". .");
    }

    #[test]
    fn test_ambiguous_bases_are_mismatches() {
        assert_eq!(control_string("AAR", 'K'), ".. ");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(control_string("aaa", 'K'), EXACT_MATCH);
        assert_eq!(control_string("AAA", 'k'), EXACT_MATCH);
        assert_eq!(control_string("aat", 'k'), ".. ");
        assert_eq!(num_discordant_bases("aag", 'K'), 0);
    }

    #[test]
    fn test_unknown_reference() {
        assert_eq!(control_string("TAA", '*'), "   ");
        assert_eq!(control_string("AAA", 'X'), "   ");
    }

    #[test]
    fn test_short_observed_codon() {
        assert_eq!(control_string("A", 'K'), ".  ");
    }

    #[test]
    fn test_discordant_bases() {
        assert_eq!(num_discordant_bases("AAA", 'K'), 0);
        assert_eq!(num_discordant_bases("AAT", 'K'), 1);
        assert_eq!(num_discordant_bases("GGG", 'N'), 3);
    }

    #[test]
    fn test_sequence_control_string() {
        assert_eq!(control_string_for_sequence("AAATTTATG", "LysAsnMet"), ":::  .:::");
        // the shorter input bounds the output
        assert_eq!(control_string_for_sequence("AAATTT", "Lys"), ":::");
        assert_eq!(control_string_for_sequence("", "Lys"), "");
        assert_eq!(control_string_for_sequence("AAA", ""), "");
    }
}
