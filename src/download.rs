use std::fs;
use std::path::Path;

use camino::Utf8Path;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::DownloadOptions;
use crate::domain::{AssemblyPaths, GenomeAccession, GenomeFileKind};
use crate::error::KiraError;
use crate::fs_util;
use crate::ncbi::{ASSEMBLY_INCLUDE, NcbiClient};

#[derive(Debug, Clone, Serialize)]
pub struct DownloadResult {
    pub accession: String,
    pub fna: String,
    pub gbk: String,
    pub gff: String,
    /// `download` or `existing`.
    pub action: String,
}

impl DownloadResult {
    fn new(accession: &GenomeAccession, paths: &AssemblyPaths, action: &str) -> Self {
        Self {
            accession: accession.to_string(),
            fna: paths.fna.to_string(),
            gbk: paths.gbk.to_string(),
            gff: paths.gff.to_string(),
            action: action.to_string(),
        }
    }
}

/// Places `{accession}.fna`, `.gbk` and `.gff` in `out_dir`.
///
/// A complete existing triplet is reused; a partial one is an error unless
/// `force` is set, which always downloads again.
pub fn download_assembly<N: NcbiClient + ?Sized>(
    ncbi: &N,
    accession: &GenomeAccession,
    out_dir: &Utf8Path,
    options: DownloadOptions,
) -> Result<(AssemblyPaths, DownloadResult), KiraError> {
    let paths = AssemblyPaths::in_dir(out_dir, accession.as_str());

    if !options.force {
        if paths.all().iter().all(|path| fs_util::is_non_empty_file(path)) {
            info!(%accession, "assembly already downloaded");
            let result = DownloadResult::new(accession, &paths, "existing");
            return Ok((paths, result));
        }
        if let Some(existing) = paths.all().iter().find(|path| path.as_std_path().exists()) {
            return Err(KiraError::OutputExists(existing.as_std_path().to_path_buf()));
        }
    }

    fs::create_dir_all(out_dir.as_std_path())
        .map_err(|err| KiraError::Filesystem(err.to_string()))?;
    let temp_dir = tempfile::Builder::new()
        .prefix(".kira-gt-download")
        .tempdir_in(out_dir.as_std_path())
        .map_err(|err| KiraError::Filesystem(err.to_string()))?;
    let zip_path = temp_dir.path().join("ncbi_dataset.zip");

    info!(%accession, "requesting assembly package from NCBI");
    let download = ncbi.download_assembly_package(accession, &ASSEMBLY_INCLUDE, &zip_path)?;
    debug!(bytes = download.bytes, "package stored");
    if !zip_path.exists() {
        return Err(KiraError::MissingAssemblyFile {
            accession: accession.to_string(),
            file: "ncbi_dataset.zip".to_string(),
        });
    }
    if !download.is_zip {
        return Err(KiraError::NcbiHttp(format!(
            "expected a zip archive for {accession}"
        )));
    }
    fs_util::validate_zip(&zip_path)?;

    for (kind, dest) in [
        (GenomeFileKind::Fna, &paths.fna),
        (GenomeFileKind::Gbk, &paths.gbk),
        (GenomeFileKind::Gff, &paths.gff),
    ] {
        let select = |entry: &Path| is_package_member(entry, accession.as_str(), kind);
        let member = fs_util::extract_zip_member(&zip_path, select, dest)?.ok_or_else(|| {
            KiraError::MissingAssemblyFile {
                accession: accession.to_string(),
                file: package_member_label(kind).to_string(),
            }
        })?;
        debug!(%member, %dest, "extracted");
    }

    Ok((paths.clone(), DownloadResult::new(accession, &paths, "download")))
}

/// Package members live under `ncbi_dataset/data/{accession}/`. The genome
/// FASTA carries the assembly name (`GCF_005864195.1_ASM586419v1_genomic.fna`);
/// the CDS and RNA FASTA files do not start with the accession.
fn is_package_member(entry: &Path, accession: &str, kind: GenomeFileKind) -> bool {
    let in_accession_dir = entry
        .parent()
        .and_then(|parent| parent.file_name())
        .and_then(|name| name.to_str())
        .map(|name| name == accession)
        .unwrap_or(false);
    let Some(name) = entry.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    in_accession_dir
        && match kind {
            GenomeFileKind::Fna => name.starts_with(accession) && name.ends_with("_genomic.fna"),
            GenomeFileKind::Gbk => name == "genomic.gbff",
            GenomeFileKind::Gff => name == "genomic.gff",
            GenomeFileKind::Ffn | GenomeFileKind::Faa => false,
        }
}

fn package_member_label(kind: GenomeFileKind) -> &'static str {
    match kind {
        GenomeFileKind::Fna => "{accession}_*_genomic.fna",
        GenomeFileKind::Gbk => "genomic.gbff",
        _ => "genomic.gff",
    }
}
