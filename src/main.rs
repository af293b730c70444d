//! genecall - codon translation and gene alignment interpretation
//!
//! ## Usage
//!
//! ```bash
//! genecall translate <fasta> [-o out.faa] [--consensus <aas>]
//! genecall merge AAA AAG
//! genecall align <fasta> --config <config.json> --reports <reports.json> [-o out.json]
//! ```
//!
//! Use `-v` (or `RUST_LOG=debug`) for per-gene details.

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;
use serde_json::{json, Value};

use genecall::align::{align_batch_from, RecordedAligner};
use genecall::config::AlignmentConfig;
use genecall::formats::fasta::{write_fasta, DEFAULT_LINE_WIDTH};
use genecall::formats::read_sequences;
use genecall::genetic_code::{simple_translate_sequence, translate_triplet};
use genecall::merge::merge_codons;
use genecall::model::{AlignedGeneSequence, AlignedSequence, Sequence};

/// genecall - ambiguity-aware codon translation and gene alignment interpretation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log per-gene and per-pass details
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate nucleotide sequences to amino acids
    ///
    /// Ambiguous codons encoding several amino acids become X.
    Translate {
        /// FASTA file of nucleotide sequences
        file: PathBuf,

        /// Output file. Use "-" for stdout.
        #[arg(short = 'o', long = "output", default_value = "-")]
        output: String,

        /// Consensus amino acids used to resolve ambiguous codons
        #[arg(short = 'c', long = "consensus")]
        consensus: Option<String>,

        /// Consensus position of the first codon (1-based)
        #[arg(long = "first-aa", default_value = "1", requires = "consensus")]
        first_aa: usize,

        /// Line width of the output FASTA
        #[arg(short = 'w', long = "width", default_value_t = DEFAULT_LINE_WIDTH)]
        width: usize,
    },

    /// Merge codons, most prevalent first, into one consensus codon
    Merge {
        /// Codons, in decreasing order of prevalence
        #[arg(required = true)]
        codons: Vec<String>,
    },

    /// Interpret recorded aligner reports for a FASTA file
    Align {
        /// FASTA file of nucleotide sequences
        file: PathBuf,

        /// Alignment configuration (JSON)
        #[arg(short = 'c', long = "config")]
        config: PathBuf,

        /// Recorded aligner reports (JSON)
        #[arg(short = 'r', long = "reports")]
        reports: PathBuf,

        /// Submit reverse complements only
        #[arg(long = "reverse-first")]
        reverse_first: bool,

        /// Output file. Use "-" for stdout.
        #[arg(short = 'o', long = "output", default_value = "-")]
        output: String,
    },
}

/// Opens the output file, or stdout for "-".
fn open_output(output: &str) -> Result<Box<dyn Write>> {
    if output == "-" {
        Ok(Box::new(BufWriter::new(io::stdout().lock())))
    } else {
        let file = File::create(output).with_context(|| format!("Failed to create {output}"))?;
        Ok(Box::new(BufWriter::new(file)))
    }
}

fn run_translate(file: &Path, output: &str, consensus: Option<&str>, first_aa: usize, width: usize) -> Result<()> {
    if width == 0 {
        anyhow::bail!("Line width must be positive");
    }
    let sequences = read_sequences(file)?;
    info!("Translating {} sequence(s)", sequences.len());

    let translated: Vec<(String, String)> = sequences
        .iter()
        .map(|seq| (seq.name.clone(), simple_translate_sequence(&seq.nucleotides, Some(first_aa), consensus)))
        .collect();

    let mut writer = open_output(output)?;
    write_fasta(&mut writer, translated.iter().map(|(name, aas)| (name, aas)), width)?;
    writer.flush()?;
    if output != "-" {
        info!("Wrote {} translated sequence(s) to {}", translated.len(), output);
    }
    Ok(())
}

fn run_merge(codons: &[String]) -> Result<()> {
    let merged = merge_codons(codons);
    println!("{}\t{}", merged, translate_triplet(&merged));
    Ok(())
}

fn gene_json(gene_seq: &AlignedGeneSequence) -> Value {
    json!({
        "gene": gene_seq.gene().name,
        "firstAA": gene_seq.first_aa(),
        "lastAA": gene_seq.last_aa(),
        "firstNA": gene_seq.first_na(),
        "lastNA": gene_seq.last_na(),
        "matchPcnt": gene_seq.match_pcnt(),
        "mutations": gene_seq.mutations().iter().map(ToString::to_string).collect::<Vec<_>>(),
        "frameShifts": gene_seq.frame_shifts().iter().map(ToString::to_string).collect::<Vec<_>>(),
    })
}

fn result_json(input: &Sequence, result: Option<&AlignedSequence>) -> Value {
    match result {
        Some(aligned) => json!({
            "name": input.name,
            "strain": aligned.strain,
            "reversed": aligned.reversed,
            "genes": aligned.genes.iter().map(gene_json).collect::<Vec<_>>(),
            "discarded": aligned
                .discarded
                .iter()
                .map(|(gene, reason)| json!({"gene": gene, "reason": reason}))
                .collect::<Vec<_>>(),
        }),
        None => json!({ "name": input.name, "strain": null, "genes": [] }),
    }
}

fn run_align(file: &Path, config: &Path, reports: &Path, reverse_first: bool, output: &str) -> Result<()> {
    let config = AlignmentConfig::from_path(config)
        .with_context(|| format!("Failed to load configuration {}", config.display()))?;
    let aligner = RecordedAligner::from_path(reports)
        .with_context(|| format!("Failed to load aligner reports {}", reports.display()))?;
    let sequences = read_sequences(file)?;
    info!("Aligning {} sequence(s) against {} strain(s)", sequences.len(), config.strains.len());

    let results = align_batch_from(&aligner, &config, &sequences, reverse_first);
    let aligned = results.iter().filter(|r| r.is_some()).count();
    info!("{} of {} sequence(s) aligned", aligned, sequences.len());

    let json: Vec<Value> =
        sequences.iter().zip(&results).map(|(seq, result)| result_json(seq, result.as_ref())).collect();
    let mut writer = open_output(output)?;
    serde_json::to_writer_pretty(&mut writer, &json)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    match args.command {
        Command::Translate { file, output, consensus, first_aa, width } => {
            run_translate(&file, &output, consensus.as_deref(), first_aa, width)
        }
        Command::Merge { codons } => run_merge(&codons),
        Command::Align { file, config, reports, reverse_first, output } => {
            run_align(&file, &config, &reports, reverse_first, &output)
        }
    }
}
