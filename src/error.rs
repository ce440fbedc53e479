use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum KiraError {
    #[error("cannot find the database: pass --database-dir or set GENOMIC_DATABASE")]
    MissingEnvConfig,

    #[error("destination is not empty: {}", .0.display())]
    DestinationNotEmpty(PathBuf),

    #[error("expected input file does not exist: {}", .0.display())]
    MissingInputFile(PathBuf),

    #[error("output file already exists (use --force to overwrite): {}", .0.display())]
    OutputExists(PathBuf),

    #[error("invalid genome accession: {0}")]
    InvalidGenomeAccession(String),

    #[error("invalid locus tag prefix: {0}")]
    InvalidLocusTagPrefix(String),

    #[error("ambiguous locus tag prefixes: {old} -> {new}")]
    AmbiguousPrefix { old: String, new: String },

    #[error("unable to detect locus tag prefix: {0}")]
    PrefixDetection(String),

    #[error("invalid genome metadata at {}: {message}", .path.display())]
    GenomeMetadata { path: PathBuf, message: String },

    #[error("sanity check failed: {0}")]
    SanityCheck(String),

    #[error("failed to parse GenBank file {}: {message}", .path.display())]
    GenBankParse { path: PathBuf, message: String },

    #[error("validation failed for {}: {message}", .file.display())]
    Validation { file: PathBuf, message: String },

    #[error("assembly {accession} is missing {file} in the NCBI package")]
    MissingAssemblyFile { accession: String, file: String },

    #[error("NCBI request failed: {0}")]
    NcbiHttp(String),

    #[error("NCBI returned status {status}: {message}")]
    NcbiStatus { status: u16, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
