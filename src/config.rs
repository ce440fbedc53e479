use camino::{Utf8Path, Utf8PathBuf};

use crate::error::KiraError;

pub const GENOMIC_DATABASE_ENV: &str = "GENOMIC_DATABASE";

/// Location of the genome database, resolved once by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    root: Utf8PathBuf,
}

impl DatabaseConfig {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// An explicit directory wins over the environment value. Blank values
    /// count as unset.
    pub fn resolve(explicit: Option<&str>, env_value: Option<String>) -> Result<Self, KiraError> {
        let explicit = explicit
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        let env_value = env_value
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        explicit
            .or(env_value)
            .map(Self::new)
            .ok_or(KiraError::MissingEnvConfig)
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn organisms_dir(&self) -> Utf8PathBuf {
        self.root.join("organisms")
    }

    pub fn orthofinder_dir(&self) -> Utf8PathBuf {
        self.root.join("OrthoFinder")
    }

    pub fn fasta_dir(&self) -> Utf8PathBuf {
        self.orthofinder_dir().join("fastas")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitOptions {
    pub skip_ignored: bool,
    pub sanity_check: bool,
    pub representatives_only: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            skip_ignored: true,
            sanity_check: true,
            representatives_only: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadOptions {
    pub force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    pub validate: bool,
    pub force: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            validate: true,
            force: false,
        }
    }
}
