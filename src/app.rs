use std::io::Write;
use std::time::{Duration, Instant};

use camino::Utf8Path;
use serde::Serialize;

use crate::config::{ConvertOptions, DatabaseConfig, DownloadOptions, InitOptions};
use crate::convert::{self, ConvertResult};
use crate::domain::{AssemblyPaths, GenomeAccession, GenomePaths, LocusTagPrefix, PrefixMapping};
use crate::download::{self, DownloadResult};
use crate::error::KiraError;
use crate::genbank;
use crate::ncbi::NcbiClient;
use crate::orthofinder::{self, InitResult};

#[derive(Debug, Clone, Serialize)]
pub struct DownloadAndConvertResult {
    pub download: DownloadResult,
    pub convert: ConvertResult,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Clone)]
pub struct App<N: NcbiClient> {
    ncbi: N,
}

impl<N: NcbiClient> App<N> {
    pub fn new(ncbi: N) -> Self {
        Self { ncbi }
    }

    pub fn init_orthofinder(
        &self,
        config: &DatabaseConfig,
        options: &InitOptions,
        out: &mut dyn Write,
        sink: &dyn ProgressSink,
    ) -> Result<InitResult, KiraError> {
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; database {}", config.root()),
            elapsed: None,
        });
        let start = Instant::now();
        let result = orthofinder::init_orthofinder(config, options, out)?;
        sink.event(ProgressEvent {
            message: format!("phase=Store; linked {} protein fastas", result.linked.len()),
            elapsed: Some(start.elapsed()),
        });
        Ok(result)
    }

    pub fn download(
        &self,
        accession: &GenomeAccession,
        out_dir: &Utf8Path,
        options: DownloadOptions,
        sink: &dyn ProgressSink,
    ) -> Result<DownloadResult, KiraError> {
        self.download_paths(accession, out_dir, options, sink)
            .map(|(_, result)| result)
    }

    pub fn convert(
        &self,
        raw: &AssemblyPaths,
        outputs: &GenomePaths,
        mapping: &PrefixMapping,
        options: ConvertOptions,
        sink: &dyn ProgressSink,
    ) -> Result<ConvertResult, KiraError> {
        sink.event(ProgressEvent {
            message: format!(
                "phase=Convert; {} -> {}",
                mapping.old(),
                mapping.new_prefix()
            ),
            elapsed: None,
        });
        let start = Instant::now();
        let result = convert::convert_assembly(raw, outputs, mapping, options)?;
        let message = match &result.validation {
            Some(report) => format!(
                "phase=Verify; {} contigs, {} cds consistent",
                report.contigs, report.cds
            ),
            None => format!("phase=Store; wrote {} cds", result.cds),
        };
        sink.event(ProgressEvent {
            message,
            elapsed: Some(start.elapsed()),
        });
        Ok(result)
    }

    /// Downloads `accession` into `out_dir` and converts it to
    /// `{out_dir}/{stem}.*`, where the stem is `new_prefix` without trailing
    /// underscores. The old prefix is detected from the GenBank locus tags
    /// unless given.
    pub fn download_and_convert(
        &self,
        accession: &GenomeAccession,
        new_prefix: LocusTagPrefix,
        old_prefix: Option<LocusTagPrefix>,
        out_dir: &Utf8Path,
        download_options: DownloadOptions,
        convert_options: ConvertOptions,
        sink: &dyn ProgressSink,
    ) -> Result<DownloadAndConvertResult, KiraError> {
        let (raw, download) = self.download_paths(accession, out_dir, download_options, sink)?;
        let old_prefix = match old_prefix {
            Some(prefix) => prefix,
            None => {
                let detected = genbank::detect_locus_tag_prefix(&raw.gbk)?;
                sink.event(ProgressEvent {
                    message: format!("phase=Resolve; detected locus tag prefix {detected}"),
                    elapsed: None,
                });
                detected
            }
        };
        let outputs = GenomePaths::in_dir(out_dir, new_prefix.file_stem());
        let mapping = PrefixMapping::new(old_prefix, new_prefix)?;
        let convert = self.convert(&raw, &outputs, &mapping, convert_options, sink)?;
        Ok(DownloadAndConvertResult { download, convert })
    }

    fn download_paths(
        &self,
        accession: &GenomeAccession,
        out_dir: &Utf8Path,
        options: DownloadOptions,
        sink: &dyn ProgressSink,
    ) -> Result<(AssemblyPaths, DownloadResult), KiraError> {
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; assembly {accession}"),
            elapsed: None,
        });
        sink.event(ProgressEvent {
            message: "ncbi.request".to_string(),
            elapsed: None,
        });
        let start = Instant::now();
        let (paths, result) = download::download_assembly(&self.ncbi, accession, out_dir, options)?;
        let latency = start.elapsed();
        sink.event(ProgressEvent {
            message: format!(
                "ncbi.response action={} latency_ms={}",
                result.action,
                latency.as_millis()
            ),
            elapsed: Some(latency),
        });
        Ok((paths, result))
    }
}
