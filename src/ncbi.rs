use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::domain::GenomeAccession;
use crate::error::KiraError;

const DATASETS_URL: &str = "https://api.ncbi.nlm.nih.gov/datasets/v2";

/// Members of an NCBI Datasets genome package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationType {
    GenomeFasta,
    GenBank,
    Gff3,
}

impl AnnotationType {
    pub fn api_value(self) -> &'static str {
        match self {
            AnnotationType::GenomeFasta => "GENOME_FASTA",
            AnnotationType::GenBank => "GENOME_GBFF",
            AnnotationType::Gff3 => "GENOME_GFF",
        }
    }
}

/// Annotation members requested for every assembly package.
pub const ASSEMBLY_INCLUDE: [AnnotationType; 3] = [
    AnnotationType::GenomeFasta,
    AnnotationType::GenBank,
    AnnotationType::Gff3,
];

#[derive(Debug, Clone, Copy)]
pub struct DownloadInfo {
    pub is_zip: bool,
    pub bytes: u64,
}

pub trait NcbiClient {
    /// Stores the Datasets package for `accession` at `destination`.
    fn download_assembly_package(
        &self,
        accession: &GenomeAccession,
        include: &[AnnotationType],
        destination: &Path,
    ) -> Result<DownloadInfo, KiraError>;
}

#[derive(Clone)]
pub struct NcbiHttpClient {
    client: Client,
    base_url: String,
}

impl NcbiHttpClient {
    /// Builds a client for the public Datasets API. `NCBI_API_KEY`, when set,
    /// raises the request rate limit.
    pub fn new() -> Result<Self, KiraError> {
        let header = |value: &str| {
            HeaderValue::from_str(value).map_err(|err| KiraError::NcbiHttp(err.to_string()))
        };
        let version = env!("CARGO_PKG_VERSION");
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header(&format!("kira-gt/{version}"))?);
        headers.insert("X-Datasets-Client", HeaderValue::from_static("kira-gt"));
        headers.insert("X-Datasets-Client-Version", header(version)?);
        if let Some(api_key) = std::env::var("NCBI_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
        {
            headers.insert("api-key", header(&api_key)?);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|err| KiraError::NcbiHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url: DATASETS_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn package_url(&self, accession: &GenomeAccession) -> String {
        format!(
            "{}/genome/accession/{accession}/download",
            self.base_url.trim_end_matches('/')
        )
    }
}

impl NcbiClient for NcbiHttpClient {
    fn download_assembly_package(
        &self,
        accession: &GenomeAccession,
        include: &[AnnotationType],
        destination: &Path,
    ) -> Result<DownloadInfo, KiraError> {
        let url = self.package_url(accession);
        let query = include
            .iter()
            .map(|kind| ("include_annotation_type", kind.api_value()))
            .collect::<Vec<_>>();
        debug!(%url, ?include, "GET");
        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .map_err(|err| KiraError::NcbiHttp(format!("{url}: {err}")))?;
        save_package(response, accession, destination)
    }
}

fn save_package(
    mut response: Response,
    accession: &GenomeAccession,
    destination: &Path,
) -> Result<DownloadInfo, KiraError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        let message = match status {
            StatusCode::NOT_FOUND => format!("assembly {accession} not found"),
            _ if body.trim().is_empty() => format!("request for {accession} failed"),
            _ => body.trim().to_string(),
        };
        return Err(KiraError::NcbiStatus {
            status: status.as_u16(),
            message,
        });
    }
    let is_zip = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("zip"));

    let mut file =
        File::create(destination).map_err(|err| KiraError::Filesystem(err.to_string()))?;
    let bytes = response
        .copy_to(&mut file)
        .map_err(|err| KiraError::NcbiHttp(err.to_string()))?;
    Ok(DownloadInfo { is_zip, bytes })
}
