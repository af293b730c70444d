//! Sequence file input.
//!
//! Input sequences are read from FASTA (.fasta, .fa, .fna, .fas, ...).
//! A file is accepted when its extension is a FASTA extension or, failing
//! that, when its first non-empty line is a FASTA header.

pub mod fasta;

use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use thiserror::Error;

use crate::model::Sequence;

/// Errors that can occur during file parsing.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to open file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Empty file")]
    EmptyFile,

    #[error("Could not recognize a FASTA file (expected a '>' header line)")]
    UnknownFormat,

    #[error("FASTA error: {0}")]
    FastaError(#[from] fasta::FastaError),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// True if the file extension is a FASTA extension.
pub fn has_fasta_extension<P: AsRef<Path>>(path: P) -> bool {
    let Some(ext) = path.as_ref().extension().and_then(OsStr::to_str) else {
        return false;
    };
    matches!(ext.to_lowercase().as_str(), "fa" | "fas" | "fasta" | "fna" | "ffn" | "frn" | "seq")
}

/// True if the first non-empty line is a FASTA header.
pub fn looks_like_fasta(content: &str) -> bool {
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .is_some_and(|line| line.starts_with('>'))
}

/// Reads the sequences of a FASTA file.
pub fn read_sequences<P: AsRef<Path>>(path: P) -> ParseResult<Vec<Sequence>> {
    let file = File::open(&path)?;
    let file_size = file.metadata()?.len() as usize;
    if file_size == 0 {
        return Err(ParseError::EmptyFile);
    }

    let mut reader = BufReader::new(file);
    let mut content = String::with_capacity(file_size);
    reader.read_to_string(&mut content)?;

    if !has_fasta_extension(&path) && !looks_like_fasta(&content) {
        return Err(ParseError::UnknownFormat);
    }
    Ok(fasta::parse_fasta_str(&content)?)
}
