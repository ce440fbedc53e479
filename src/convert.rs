use camino::Utf8Path;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::ConvertOptions;
use crate::domain::{AssemblyPaths, GenomePaths, PrefixMapping};
use crate::error::KiraError;
use crate::fasta::{self, Entry};
use crate::fs_util;
use crate::genbank;
use crate::rewrite::LocusTagRewriter;
use crate::validate::{self, ValidationReport};

#[derive(Debug, Clone, Serialize)]
pub struct ConvertResult {
    pub old_prefix: String,
    pub new_prefix: String,
    pub fna: String,
    pub gbk: String,
    pub gff: String,
    pub ffn: String,
    pub faa: String,
    pub replacements: usize,
    pub cds: usize,
    pub validation: Option<ValidationReport>,
}

/// Rewrites the raw triplet into `outputs` and derives FFN/FAA from the
/// rewritten GenBank file. Files written before a failure stay on disk.
pub fn convert_assembly(
    raw: &AssemblyPaths,
    outputs: &GenomePaths,
    mapping: &PrefixMapping,
    options: ConvertOptions,
) -> Result<ConvertResult, KiraError> {
    for input in raw.all() {
        if !input.as_std_path().is_file() {
            return Err(KiraError::MissingInputFile(input.as_std_path().to_path_buf()));
        }
    }
    if !options.force {
        if let Some((_, existing)) = outputs
            .all()
            .into_iter()
            .find(|(_, path)| path.as_std_path().exists())
        {
            return Err(KiraError::OutputExists(existing.as_std_path().to_path_buf()));
        }
    }

    info!(
        old = mapping.old().as_str(),
        new = mapping.new_prefix().as_str(),
        "converting assembly"
    );
    let rewriter = LocusTagRewriter::new(mapping)?;
    let mut replacements = 0usize;
    for (input, output) in [
        (&raw.fna, &outputs.fna),
        (&raw.gbk, &outputs.gbk),
        (&raw.gff, &outputs.gff),
    ] {
        let count = rewrite_file(&rewriter, input, output)?;
        debug!(%input, %output, count, "rewrote locus tags");
        replacements += count;
    }

    let summary = genbank::summarize(&outputs.gbk)?;
    fs_util::write_atomic(&outputs.ffn, |out| {
        let entries = summary.cds.iter().map(|cds| Entry {
            id: &cds.locus_tag,
            description: cds.product.as_deref(),
            sequence: &cds.nucleotides,
        });
        fasta::write_entries(out, entries).map(drop)
    })?;
    fs_util::write_atomic(&outputs.faa, |out| {
        let entries = summary.cds.iter().map(|cds| Entry {
            id: &cds.locus_tag,
            description: cds.product.as_deref(),
            sequence: cds.translation.as_deref().unwrap_or_default().as_bytes(),
        });
        fasta::write_entries(out, entries).map(drop)
    })?;
    debug!(cds = summary.cds.len(), "wrote ffn and faa");

    let validation = if options.validate {
        Some(validate::validate_outputs(outputs, mapping)?)
    } else {
        None
    };

    Ok(ConvertResult {
        old_prefix: mapping.old().to_string(),
        new_prefix: mapping.new_prefix().to_string(),
        fna: outputs.fna.to_string(),
        gbk: outputs.gbk.to_string(),
        gff: outputs.gff.to_string(),
        ffn: outputs.ffn.to_string(),
        faa: outputs.faa.to_string(),
        replacements,
        cds: summary.cds.len(),
        validation,
    })
}

fn rewrite_file(
    rewriter: &LocusTagRewriter,
    input: &Utf8Path,
    output: &Utf8Path,
) -> Result<usize, KiraError> {
    let reader = fs_util::open_text(input)?;
    let mut count = 0usize;
    fs_util::write_atomic(output, |out| {
        count = rewriter.rewrite_stream(reader, out)?;
        Ok(())
    })?;
    Ok(count)
}
