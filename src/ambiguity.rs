//! IUPAC nucleotide ambiguity codes.
//!
//! Each of the 15 codes stands for a non-empty subset of {A, C, G, T}.
//! Subsets are represented as 4-bit masks (A=1, C=2, G=4, T=8), which makes
//! the code <-> subset mapping a straight array lookup in both directions.

/// Unambiguous bases, in mask bit order.
pub const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// The gap character used in aligned nucleotide strings.
pub const GAP: u8 = b'-';

/// The 15 IUPAC codes, in triplet-table order.
///
/// The position of a code in this array is its index in the 15x15x15
/// triplet table built by [`crate::genetic_code`].
pub const AMBIGUITY_CODES: [u8; 15] = [
    b'A', b'C', b'G', b'T', b'R', b'Y', b'M', b'W', b'S', b'K', b'B', b'D', b'H', b'V', b'N',
];

/// Code for each base mask; index 0 (the empty subset) has no code.
const MASK_TO_CODE: [Option<u8>; 16] = [
    None,
    Some(b'A'),
    Some(b'C'),
    Some(b'M'),
    Some(b'G'),
    Some(b'R'),
    Some(b'S'),
    Some(b'V'),
    Some(b'T'),
    Some(b'W'),
    Some(b'Y'),
    Some(b'H'),
    Some(b'K'),
    Some(b'D'),
    Some(b'B'),
    Some(b'N'),
];

/// Returns the base mask of an ambiguity code, or 0 for anything else.
#[inline]
#[must_use]
pub const fn code_mask(code: u8) -> u8 {
    match code.to_ascii_uppercase() {
        b'A' => 0b0001,
        b'C' => 0b0010,
        b'G' => 0b0100,
        b'T' => 0b1000,
        b'R' => 0b0101,
        b'Y' => 0b1010,
        b'M' => 0b0011,
        b'W' => 0b1001,
        b'S' => 0b0110,
        b'K' => 0b1100,
        b'B' => 0b1110,
        b'D' => 0b1101,
        b'H' => 0b1011,
        b'V' => 0b0111,
        b'N' => 0b1111,
        _ => 0,
    }
}

/// Returns the ambiguity code whose subset is exactly `mask`.
#[inline]
#[must_use]
pub const fn mask_code(mask: u8) -> Option<u8> {
    if mask > 0b1111 {
        return None;
    }
    MASK_TO_CODE[mask as usize]
}

/// Expands an ambiguity code into the unambiguous bases it stands for.
///
/// Total over all bytes: unknown codes (including gaps) yield an empty vector.
///
/// # Examples
///
/// ```
/// use genecall::ambiguity::expand_ambiguity;
///
/// assert_eq!(expand_ambiguity(b'R'), b"AG".to_vec());
/// assert_eq!(expand_ambiguity(b'N'), b"ACGT".to_vec());
/// assert!(expand_ambiguity(b'-').is_empty());
/// ```
#[must_use]
pub fn expand_ambiguity(code: u8) -> Vec<u8> {
    mask_bases(code_mask(code))
}

/// Lists the bases present in a mask, in A, C, G, T order.
#[must_use]
pub fn mask_bases(mask: u8) -> Vec<u8> {
    BASES
        .iter()
        .enumerate()
        .filter(|(bit, _)| mask & (1 << bit) != 0)
        .map(|(_, &base)| base)
        .collect()
}

/// Returns the ambiguity code for a set of unambiguous bases.
///
/// Returns `None` if `bases` is empty or contains anything besides A, C, G, T.
#[must_use]
pub fn ambiguity_code_for(bases: &[u8]) -> Option<u8> {
    let mut mask = 0u8;
    for &base in bases {
        let bit = code_mask(base);
        if bit.count_ones() != 1 {
            return None;
        }
        mask |= bit;
    }
    mask_code(mask)
}

/// Index of a code within [`AMBIGUITY_CODES`], case-insensitive.
#[inline]
#[must_use]
pub fn code_index(code: u8) -> Option<usize> {
    let upper = code.to_ascii_uppercase();
    AMBIGUITY_CODES.iter().position(|&c| c == upper)
}

/// Complements a nucleotide, including ambiguity codes.
///
/// A<->T, C<->G, R<->Y, K<->M, B<->V, D<->H; S, W, N and gaps map to
/// themselves. Output is uppercase; anything unrecognised is returned as-is.
#[inline]
#[must_use]
pub const fn complement(base: u8) -> u8 {
    match base.to_ascii_uppercase() {
        b'A' => b'T',
        b'T' | b'U' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'R' => b'Y',
        b'Y' => b'R',
        b'K' => b'M',
        b'M' => b'K',
        b'B' => b'V',
        b'V' => b'B',
        b'D' => b'H',
        b'H' => b'D',
        b'S' => b'S',
        b'W' => b'W',
        b'N' => b'N',
        _ => base,
    }
}

/// Reverse complements a nucleotide string.
#[must_use]
pub fn reverse_complement(nas: &str) -> String {
    nas.bytes().rev().map(|b| complement(b) as char).collect()
}
