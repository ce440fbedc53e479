use std::collections::{BTreeSet, HashSet};
use std::io::BufRead;

use camino::Utf8Path;
use serde::Serialize;

use crate::domain::{GenomePaths, PrefixMapping};
use crate::error::KiraError;
use crate::{fasta, fs_util, genbank, gff};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ValidationReport {
    pub contigs: usize,
    pub cds: usize,
    pub gff_features: usize,
}

/// Cross-checks the five converted files. The first mismatch is reported with
/// the offending file.
pub fn validate_outputs(
    paths: &GenomePaths,
    mapping: &PrefixMapping,
) -> Result<ValidationReport, KiraError> {
    for (_, path) in paths.all() {
        ensure_prefix_absent(path, mapping.old().as_str())?;
    }

    let ffn_ids = fasta::read_ids(&paths.ffn)?;
    let faa_ids = fasta::read_ids(&paths.faa)?;
    if ffn_ids != faa_ids {
        let position = ffn_ids
            .iter()
            .zip(faa_ids.iter())
            .position(|(a, b)| a != b)
            .unwrap_or(ffn_ids.len().min(faa_ids.len()));
        return Err(fail(
            &paths.faa,
            format!(
                "protein ids diverge from {} at record {} ({} vs {} records)",
                paths.ffn,
                position + 1,
                ffn_ids.len(),
                faa_ids.len()
            ),
        ));
    }

    let new_prefix = mapping.new_prefix().as_str();
    let mut seen = HashSet::new();
    for id in &faa_ids {
        if !id.starts_with(new_prefix) {
            return Err(fail(
                &paths.faa,
                format!("{id} does not start with {new_prefix}"),
            ));
        }
        if !seen.insert(id.as_str()) {
            return Err(fail(&paths.faa, format!("duplicate identifier {id}")));
        }
    }

    let gbk = genbank::summarize(&paths.gbk)?;
    let gbk_tags = gbk.cds_locus_tags.iter().collect::<HashSet<_>>();
    if let Some(missing) = faa_ids.iter().find(|id| !gbk_tags.contains(id)) {
        return Err(fail(
            &paths.gbk,
            format!("no CDS with locus_tag {missing}"),
        ));
    }

    let gff_summary = gff::summarize(&paths.gff)?;
    if let Some(missing) = faa_ids
        .iter()
        .find(|id| !gff_summary.locus_tags.contains(id.as_str()))
    {
        return Err(fail(
            &paths.gff,
            format!("no feature with locus_tag={missing}"),
        ));
    }

    let fna_ids = fasta::read_ids(&paths.fna)?.into_iter().collect::<BTreeSet<_>>();
    let gbk_ids = gbk.record_ids.iter().cloned().collect::<BTreeSet<_>>();
    if fna_ids != gbk_ids {
        let difference = fna_ids
            .symmetric_difference(&gbk_ids)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        return Err(fail(
            &paths.gbk,
            format!("records differ from {}: {difference}", paths.fna),
        ));
    }

    if let Some(unknown) = gff_summary.seqids.difference(&fna_ids).next() {
        return Err(fail(
            &paths.gff,
            format!("seqid {unknown} is not a sequence in {}", paths.fna),
        ));
    }

    Ok(ValidationReport {
        contigs: fna_ids.len(),
        cds: faa_ids.len(),
        gff_features: gff_summary.feature_rows,
    })
}

fn ensure_prefix_absent(path: &Utf8Path, old: &str) -> Result<(), KiraError> {
    let reader = fs_util::open_text(path)?;
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|err| KiraError::Filesystem(format!("read {path}: {err}")))?;
        if line.contains(old) {
            return Err(fail(
                path,
                format!("line {} still contains {old}", index + 1),
            ));
        }
    }
    Ok(())
}

fn fail(path: &Utf8Path, message: String) -> KiraError {
    KiraError::Validation {
        file: path.as_std_path().to_path_buf(),
        message,
    }
}
