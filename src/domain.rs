use std::fmt;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::KiraError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenomeAccession(String);

impl GenomeAccession {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GenomeAccession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GenomeAccession {
    type Err = KiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_string();
        let Some(rest) = normalized
            .strip_prefix("GCF_")
            .or_else(|| normalized.strip_prefix("GCA_"))
        else {
            return Err(KiraError::InvalidGenomeAccession(value.to_string()));
        };
        let (number, version) = match rest.split_once('.') {
            Some((number, version)) => (number, Some(version)),
            None => (rest, None),
        };
        let is_digits = |part: &str| !part.is_empty() && part.chars().all(|ch| ch.is_ascii_digit());
        if !is_digits(number) || !version.map(is_digits).unwrap_or(true) {
            return Err(KiraError::InvalidGenomeAccession(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

/// Locus tag prefix such as `FEZ40_RS` or `FAM3257_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocusTagPrefix(String);

impl LocusTagPrefix {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File stem used for converted outputs: `FAM3257_` -> `FAM3257`.
    pub fn file_stem(&self) -> &str {
        let stem = self.0.trim_end_matches('_');
        if stem.is_empty() { &self.0 } else { stem }
    }
}

impl fmt::Display for LocusTagPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LocusTagPrefix {
    type Err = KiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let is_valid = !trimmed.is_empty()
            && trimmed.starts_with(|ch: char| ch.is_ascii_alphabetic())
            && trimmed
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
        if !is_valid {
            return Err(KiraError::InvalidLocusTagPrefix(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixMapping {
    old: LocusTagPrefix,
    new: LocusTagPrefix,
}

impl PrefixMapping {
    /// The old prefix must not survive in the rewritten text, so a new prefix
    /// that contains the old one is rejected.
    pub fn new(old: LocusTagPrefix, new: LocusTagPrefix) -> Result<Self, KiraError> {
        if old == new || new.as_str().contains(old.as_str()) {
            return Err(KiraError::AmbiguousPrefix {
                old: old.to_string(),
                new: new.to_string(),
            });
        }
        Ok(Self { old, new })
    }

    pub fn old(&self) -> &LocusTagPrefix {
        &self.old
    }

    pub fn new_prefix(&self) -> &LocusTagPrefix {
        &self.new
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenomeFileKind {
    Fna,
    Gbk,
    Gff,
    Ffn,
    Faa,
}

impl GenomeFileKind {
    pub fn extension(self) -> &'static str {
        match self {
            GenomeFileKind::Fna => "fna",
            GenomeFileKind::Gbk => "gbk",
            GenomeFileKind::Gff => "gff",
            GenomeFileKind::Ffn => "ffn",
            GenomeFileKind::Faa => "faa",
        }
    }
}

impl fmt::Display for GenomeFileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Raw nucleotide FASTA, GenBank and GFF triplet of one assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyPaths {
    pub fna: Utf8PathBuf,
    pub gbk: Utf8PathBuf,
    pub gff: Utf8PathBuf,
}

impl AssemblyPaths {
    pub fn in_dir(dir: &Utf8Path, stem: &str) -> Self {
        Self {
            fna: dir.join(format!("{stem}.{}", GenomeFileKind::Fna)),
            gbk: dir.join(format!("{stem}.{}", GenomeFileKind::Gbk)),
            gff: dir.join(format!("{stem}.{}", GenomeFileKind::Gff)),
        }
    }

    pub fn all(&self) -> [&Utf8Path; 3] {
        [&self.fna, &self.gbk, &self.gff]
    }
}

/// The five files of a converted genome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomePaths {
    pub fna: Utf8PathBuf,
    pub gbk: Utf8PathBuf,
    pub gff: Utf8PathBuf,
    pub ffn: Utf8PathBuf,
    pub faa: Utf8PathBuf,
}

impl GenomePaths {
    pub fn in_dir(dir: &Utf8Path, stem: &str) -> Self {
        let path = |kind: GenomeFileKind| dir.join(format!("{stem}.{kind}"));
        Self {
            fna: path(GenomeFileKind::Fna),
            gbk: path(GenomeFileKind::Gbk),
            gff: path(GenomeFileKind::Gff),
            ffn: path(GenomeFileKind::Ffn),
            faa: path(GenomeFileKind::Faa),
        }
    }

    pub fn all(&self) -> [(GenomeFileKind, &Utf8Path); 5] {
        [
            (GenomeFileKind::Fna, &self.fna),
            (GenomeFileKind::Gbk, &self.gbk),
            (GenomeFileKind::Gff, &self.gff),
            (GenomeFileKind::Ffn, &self.ffn),
            (GenomeFileKind::Faa, &self.faa),
        ]
    }
}
