//! Genetic code definitions and ambiguity-aware translation.
//!
//! This module provides:
//! - The standard genetic code (NCBI table 1)
//! - A precomputed table translating every triplet of IUPAC codes
//!   (15 x 15 x 15 entries) to the set of amino acids it may encode
//! - Sequence translation with consensus-based disambiguation
//! - Reverse lookup from an amino acid to its canonical codons
//! - One-letter / three-letter amino acid names

use std::fmt;
use std::sync::OnceLock;

use log::warn;
use thiserror::Error;

use crate::ambiguity::{code_index, expand_ambiguity, AMBIGUITY_CODES, BASES};

/// Amino acid emitted for triplets that are malformed or encode several residues.
pub const UNKNOWN_AA: u8 = b'X';

/// Stop codon symbol.
pub const STOP: u8 = b'*';

/// The 20 standard amino acids in one-letter order.
pub const STANDARD_AMINO_ACIDS: &[u8; 20] = b"ACDEFGHIKLMNPQRSTVWY";

/// Bit order of [`AminoAcids`]: the standard letters, then stop, then unknown.
const AA_ALPHABET: &[u8; 22] = b"ACDEFGHIKLMNPQRSTVWY*X";

const AA_NAMES: [(u8, &str); 20] = [
    (b'A', "Ala"),
    (b'C', "Cys"),
    (b'D', "Asp"),
    (b'E', "Glu"),
    (b'F', "Phe"),
    (b'G', "Gly"),
    (b'H', "His"),
    (b'I', "Ile"),
    (b'K', "Lys"),
    (b'L', "Leu"),
    (b'M', "Met"),
    (b'N', "Asn"),
    (b'P', "Pro"),
    (b'Q', "Gln"),
    (b'R', "Arg"),
    (b'S', "Ser"),
    (b'T', "Thr"),
    (b'V', "Val"),
    (b'W', "Trp"),
    (b'Y', "Tyr"),
];

/// Errors raised by codon lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodonError {
    #[error("Attempt to translate invalid amino acid notation to codon: '{0}'")]
    InvalidAminoAcid(char),
}

/// A set of amino acids (plus the stop and unknown symbols).
///
/// Iteration and display follow a fixed alphabetical order with `*` and `X`
/// last, so two equal sets always render the same way.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AminoAcids(u32);

impl AminoAcids {
    /// The set holding only the unknown sentinel `X`.
    pub const UNKNOWN: Self = Self(1 << 21);

    /// Creates an empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    fn bit(aa: u8) -> Option<u32> {
        let upper = aa.to_ascii_uppercase();
        AA_ALPHABET.iter().position(|&c| c == upper).map(|idx| 1 << idx)
    }

    /// Creates a set holding a single symbol, if it is a known one.
    #[must_use]
    pub fn single(aa: u8) -> Option<Self> {
        Self::bit(aa).map(Self)
    }

    /// Adds a symbol. Returns false if the symbol is not in the alphabet.
    pub fn insert(&mut self, aa: u8) -> bool {
        match Self::bit(aa) {
            Some(bit) => {
                self.0 |= bit;
                true
            }
            None => false,
        }
    }

    /// Removes a symbol if present.
    pub fn remove(&mut self, aa: u8) {
        if let Some(bit) = Self::bit(aa) {
            self.0 &= !bit;
        }
    }

    #[must_use]
    pub fn contains(&self, aa: u8) -> bool {
        Self::bit(aa).is_some_and(|bit| self.0 & bit != 0)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// True when the set resolves to exactly one symbol.
    #[must_use]
    pub const fn is_unambiguous(&self) -> bool {
        self.len() == 1
    }

    /// The only member of a single-symbol set.
    #[must_use]
    pub fn only(&self) -> Option<u8> {
        if self.is_unambiguous() {
            self.iter().next()
        } else {
            None
        }
    }

    /// Iterates members in alphabet order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        AA_ALPHABET
            .iter()
            .enumerate()
            .filter(move |(idx, _)| self.0 & (1 << idx) != 0)
            .map(|(_, &aa)| aa)
    }
}

impl fmt::Display for AminoAcids {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for aa in self.iter() {
            write!(f, "{}", aa as char)?;
        }
        Ok(())
    }
}

impl fmt::Debug for AminoAcids {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AminoAcids({self})")
    }
}

/// A genetic code table for translating unambiguous codons to amino acids.
#[derive(Debug, Clone)]
pub struct GeneticCode {
    /// NCBI genetic code ID
    pub id: u8,
    /// Name of the genetic code
    pub name: String,
    /// Amino acid per codon, indexed by `16 * b1 + 4 * b2 + b3` with A=0, C=1, G=2, T=3
    codon_table: [u8; 64],
}

impl GeneticCode {
    /// Creates a genetic code from an NCBI `ncbieaa` string.
    ///
    /// NCBI lists codons in TCAG order: TTT, TTC, TTA, TTG, TCT, ...
    fn new(id: u8, name: &str, ncbieaa: &str) -> Self {
        let ncbi_order = [b'T', b'C', b'A', b'G'];
        let residues = ncbieaa.as_bytes();
        let mut codon_table = [UNKNOWN_AA; 64];

        let mut idx = 0;
        for &b1 in &ncbi_order {
            for &b2 in &ncbi_order {
                for &b3 in &ncbi_order {
                    if let Some(slot) = Self::codon_slot([b1, b2, b3]) {
                        codon_table[slot] = residues.get(idx).copied().unwrap_or(UNKNOWN_AA);
                    }
                    idx += 1;
                }
            }
        }

        Self { id, name: name.to_string(), codon_table }
    }

    /// The standard genetic code.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(1, "Standard", "FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG")
    }

    fn codon_slot(codon: [u8; 3]) -> Option<usize> {
        let mut slot = 0;
        for base in codon {
            let idx = BASES.iter().position(|&b| b == base.to_ascii_uppercase())?;
            slot = slot * 4 + idx;
        }
        Some(slot)
    }

    /// Translates an unambiguous codon; anything else gives `X`.
    #[must_use]
    pub fn translate_codon(&self, codon: [u8; 3]) -> u8 {
        Self::codon_slot(codon).map_or(UNKNOWN_AA, |slot| self.codon_table[slot])
    }

    /// All unambiguous codons in A, C, G, T lexicographic order.
    fn codons() -> Vec<[u8; 3]> {
        let mut codons = Vec::with_capacity(64);
        for &b1 in &BASES {
            for &b2 in &BASES {
                for &b3 in &BASES {
                    codons.push([b1, b2, b3]);
                }
            }
        }
        codons
    }
}

/// Precomputed lookups derived from the standard genetic code.
struct CodonTables {
    /// Amino acid set per ambiguity triplet, indexed by `225 * i + 15 * j + k`.
    triplets: Vec<AminoAcids>,
    /// Canonical codons per standard amino acid, in [`STANDARD_AMINO_ACIDS`] order.
    canonical: Vec<Vec<String>>,
}

impl CodonTables {
    fn build() -> Self {
        let code = GeneticCode::standard();

        let mut triplets = Vec::with_capacity(AMBIGUITY_CODES.len().pow(3));
        for &c1 in &AMBIGUITY_CODES {
            for &c2 in &AMBIGUITY_CODES {
                for &c3 in &AMBIGUITY_CODES {
                    let mut aas = AminoAcids::empty();
                    for &b1 in &expand_ambiguity(c1) {
                        for &b2 in &expand_ambiguity(c2) {
                            for &b3 in &expand_ambiguity(c3) {
                                aas.insert(code.translate_codon([b1, b2, b3]));
                            }
                        }
                    }
                    triplets.push(aas);
                }
            }
        }

        let mut canonical = vec![Vec::new(); STANDARD_AMINO_ACIDS.len()];
        for codon in GeneticCode::codons() {
            let aa = code.translate_codon(codon);
            if let Some(idx) = STANDARD_AMINO_ACIDS.iter().position(|&c| c == aa) {
                canonical[idx].push(String::from_utf8_lossy(&codon).into_owned());
            }
        }

        Self { triplets, canonical }
    }
}

fn tables() -> &'static CodonTables {
    static TABLES: OnceLock<CodonTables> = OnceLock::new();
    TABLES.get_or_init(CodonTables::build)
}

/// Translates a nucleotide triplet to the set of amino acids it may encode.
///
/// # Rules:
/// - Input is case-insensitive and `U` is read as `T`
/// - Each position may be any of the 15 IUPAC codes; the result is the union
///   over every concrete codon the triplet expands to
/// - Triplets that are not exactly 3 long, or hold a gap or any other
///   symbol, give the unknown set `{X}`
///
/// # Examples
///
/// ```
/// use genecall::genetic_code::translate_triplet;
///
/// assert_eq!(translate_triplet("AAA").to_string(), "K");
/// assert_eq!(translate_triplet("AAR").to_string(), "K");
/// assert_eq!(translate_triplet("AAN").to_string(), "KN");
/// assert_eq!(translate_triplet("AC-").to_string(), "X");
/// ```
#[must_use]
pub fn translate_triplet(codon: &str) -> AminoAcids {
    let bytes = codon.as_bytes();
    if bytes.len() != 3 {
        return AminoAcids::UNKNOWN;
    }

    let mut slot = 0;
    for &byte in bytes {
        let byte = if byte.eq_ignore_ascii_case(&b'U') { b'T' } else { byte };
        match code_index(byte) {
            Some(idx) => slot = slot * AMBIGUITY_CODES.len() + idx,
            None => return AminoAcids::UNKNOWN,
        }
    }

    let aas = tables().triplets[slot];
    if aas.is_empty() {
        AminoAcids::UNKNOWN
    } else {
        aas
    }
}

/// Translates a nucleotide string; triplets encoding several residues become `X`.
#[must_use]
pub fn simple_translate(nas: &str) -> String {
    simple_translate_sequence(nas, None, None)
}

/// Translates a nucleotide string triplet by triplet.
///
/// A trailing partial triplet is dropped with a warning. When `consensus`
/// is given, an ambiguous triplet first loses the consensus residue at its
/// position (`first_aa` is the 1-based consensus position of the first
/// triplet, default 1); if more than one residue remains it becomes `X`.
#[must_use]
pub fn simple_translate_sequence(nas: &str, first_aa: Option<usize>, consensus: Option<&str>) -> String {
    let bytes = nas.as_bytes();
    let extra = bytes.len() % 3;
    if extra != 0 {
        warn!(
            "Nucleotide sequence length {} is not a multiple of 3; dropping {} trailing base(s)",
            bytes.len(),
            extra
        );
    }

    let first_aa = first_aa.unwrap_or(1).max(1);
    let consensus = consensus.map(str::as_bytes);

    let mut result = String::with_capacity(bytes.len() / 3);
    for (pos, triplet) in bytes.chunks_exact(3).enumerate() {
        let mut aas = translate_triplet(&String::from_utf8_lossy(triplet));
        if aas.len() > 1 {
            if let Some(&ref_aa) = consensus.and_then(|cons| cons.get(first_aa + pos - 1)) {
                aas.remove(ref_aa);
            }
        }
        match aas.only() {
            Some(aa) => result.push(aa as char),
            None => result.push(UNKNOWN_AA as char),
        }
    }
    result
}

/// Returns the canonical (unambiguous) codons of a standard amino acid.
///
/// Codons are listed in A, C, G, T lexicographic order; callers that pick a
/// best match among them rely on this order to break ties.
///
/// # Errors
///
/// Returns [`CodonError::InvalidAminoAcid`] for anything but the 20 standard letters.
pub fn translate_aa_to_codons_canonical(aa: char) -> Result<&'static [String], CodonError> {
    let idx = u8::try_from(aa)
        .ok()
        .and_then(|byte| STANDARD_AMINO_ACIDS.iter().position(|&c| c == byte))
        .ok_or(CodonError::InvalidAminoAcid(aa))?;
    Ok(&tables().canonical[idx])
}

/// Three-letter name of a standard amino acid.
#[must_use]
pub fn one_to_three(aa: char) -> Option<&'static str> {
    AA_NAMES.iter().find(|(letter, _)| *letter as char == aa).map(|(_, name)| *name)
}

/// One-letter code of a three-letter amino acid name (e.g. `Asn`).
#[must_use]
pub fn three_to_one(name: &str) -> Option<char> {
    AA_NAMES.iter().find(|(_, n)| *n == name).map(|(letter, _)| *letter as char)
}

/// Converts one-letter amino acids to concatenated three-letter names.
///
/// Letters without a name (stop, `X`, ...) become `Xxx`.
#[must_use]
pub fn translate_to_triplet_aa(aas: &str) -> String {
    aas.chars().map(|aa| one_to_three(aa).unwrap_or("Xxx")).collect()
}
