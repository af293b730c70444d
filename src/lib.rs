//! # genecall - Codon translation and gene alignment interpretation
//!
//! Building blocks for calling amino acid mutations from nucleotide
//! sequences that may carry IUPAC ambiguity codes.
//!
//! ## Architecture
//!
//! - `ambiguity`: IUPAC nucleotide codes and their base sets
//! - `genetic_code`: ambiguity-aware codon translation and reverse lookup
//! - `control`: per-base comparison of a codon against a reference residue
//! - `merge`: consensus codon from several prevalence-ordered codons
//! - `report`: raw gene reports produced by an external aligner
//! - `mutation`: mutations and frame shifts called from those reports
//! - `model`: sequences, genes and validated gene alignments
//! - `config`: strains, genes and alignment thresholds
//! - `align`: report interpretation and batch orchestration
//! - `formats`: FASTA input and output
//!
//! Translation tables are built once on first use and shared read-only.

pub mod align;
pub mod ambiguity;
pub mod config;
pub mod control;
pub mod formats;
pub mod genetic_code;
pub mod merge;
pub mod model;
pub mod mutation;
pub mod report;
