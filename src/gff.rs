use std::collections::BTreeSet;
use std::io::BufRead;

use camino::Utf8Path;

use crate::error::KiraError;
use crate::fs_util;

#[derive(Debug, Clone, Default)]
pub struct GffSummary {
    pub seqids: BTreeSet<String>,
    pub locus_tags: BTreeSet<String>,
    pub feature_rows: usize,
}

/// Collects seqids and `locus_tag` attributes from feature rows. Comment
/// lines and any trailing `##FASTA` section are skipped.
pub fn summarize(path: &Utf8Path) -> Result<GffSummary, KiraError> {
    let reader = fs_util::open_text(path)?;
    let mut summary = GffSummary::default();
    for line in reader.lines() {
        let line = line.map_err(|err| KiraError::Filesystem(format!("read {path}: {err}")))?;
        if line.starts_with("##FASTA") {
            break;
        }
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let columns = line.split('\t').collect::<Vec<_>>();
        if columns.len() != 9 {
            return Err(KiraError::Validation {
                file: path.as_std_path().to_path_buf(),
                message: format!("expected 9 columns, found {}: {line}", columns.len()),
            });
        }
        summary.feature_rows += 1;
        summary.seqids.insert(columns[0].to_string());
        if let Some(tag) = attribute(columns[8], "locus_tag") {
            summary.locus_tags.insert(tag.to_string());
        }
    }
    Ok(summary)
}

pub fn attribute<'a>(attributes: &'a str, key: &str) -> Option<&'a str> {
    attributes
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == key)
        .map(|(_, value)| value)
}
