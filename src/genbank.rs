use std::collections::HashMap;

use camino::Utf8Path;
use gb_io::reader::SeqReader;
use gb_io::seq::{Feature, Seq};

use crate::domain::LocusTagPrefix;
use crate::error::KiraError;
use crate::fs_util;

/// A coding sequence pulled from a GenBank record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdsRecord {
    pub locus_tag: String,
    pub product: Option<String>,
    pub nucleotides: Vec<u8>,
    pub translation: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GenBankSummary {
    pub record_ids: Vec<String>,
    pub cds: Vec<CdsRecord>,
    /// Locus tags of every CDS feature, including pseudo CDS without translation.
    pub cds_locus_tags: Vec<String>,
}

pub fn read_records(path: &Utf8Path) -> Result<Vec<Seq>, KiraError> {
    let reader = fs_util::open_text(path)?;
    SeqReader::new(reader)
        .map(|record| {
            record.map_err(|err| KiraError::GenBankParse {
                path: path.as_std_path().to_path_buf(),
                message: format!("{err:?}"),
            })
        })
        .collect()
}

pub fn summarize(path: &Utf8Path) -> Result<GenBankSummary, KiraError> {
    let records = read_records(path)?;
    let mut summary = GenBankSummary::default();
    for record in &records {
        summary.record_ids.push(record_id(record));
        for feature in record.features.iter().filter(|f| is_cds(f)) {
            let Some(locus_tag) = qualifier(feature, "locus_tag") else {
                continue;
            };
            summary.cds_locus_tags.push(locus_tag.clone());
            let translation = qualifier(feature, "translation").map(|value| {
                value
                    .chars()
                    .filter(|ch| !ch.is_whitespace())
                    .collect::<String>()
            });
            if translation.is_none() {
                continue;
            }
            let nucleotides = record
                .extract_location(&feature.location)
                .map_err(|err| KiraError::GenBankParse {
                    path: path.as_std_path().to_path_buf(),
                    message: format!("cannot extract {locus_tag}: {err:?}"),
                })?;
            summary.cds.push(CdsRecord {
                product: qualifier(feature, "product")
                    .map(|value| value.split_whitespace().collect::<Vec<_>>().join(" ")),
                locus_tag,
                nucleotides: nucleotides.to_ascii_uppercase(),
                translation,
            });
        }
    }
    Ok(summary)
}

/// VERSION (`NZ_CP040384.1`) if present, else the LOCUS name.
pub fn record_id(record: &Seq) -> String {
    record
        .version
        .clone()
        .or_else(|| record.name.clone())
        .unwrap_or_default()
}

/// Picks the most common locus tag prefix, defined as the tag minus its
/// trailing digits. Ties resolve to the lexicographically smallest prefix.
pub fn detect_locus_tag_prefix(path: &Utf8Path) -> Result<LocusTagPrefix, KiraError> {
    let summary = summarize(path)?;
    let mut counts = HashMap::<String, usize>::new();
    for tag in &summary.cds_locus_tags {
        let prefix = tag.trim_end_matches(|ch: char| ch.is_ascii_digit());
        if prefix.is_empty() || prefix.len() == tag.len() {
            continue;
        }
        *counts.entry(prefix.to_string()).or_default() += 1;
    }
    let best = counts
        .into_iter()
        .max_by(|(a_prefix, a_count), (b_prefix, b_count)| {
            a_count.cmp(b_count).then_with(|| b_prefix.cmp(a_prefix))
        })
        .map(|(prefix, _)| prefix)
        .ok_or_else(|| KiraError::PrefixDetection(format!("no numbered CDS locus tags in {path}")))?;
    best.parse()
        .map_err(|_| KiraError::PrefixDetection(format!("unusable prefix {best} in {path}")))
}

fn is_cds(feature: &Feature) -> bool {
    &*feature.kind == "CDS"
}

fn qualifier(feature: &Feature, key: &str) -> Option<String> {
    feature
        .qualifiers
        .iter()
        .find(|(name, value)| &**name == key && value.is_some())
        .and_then(|(_, value)| value.clone())
}
