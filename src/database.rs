use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

use crate::config::{DatabaseConfig, InitOptions};
use crate::error::KiraError;

/// Contents of `genome.json`. Unknown keys are kept in `extra`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenomeMetadata {
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub cds_tool_faa_file: Option<String>,
    #[serde(default)]
    pub ignore: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Contents of `organism.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrganismMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub representative: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Genome {
    pub identifier: String,
    pub organism: String,
    pub path: Utf8PathBuf,
    pub metadata: GenomeMetadata,
}

impl Genome {
    /// Looks up a string attribute of `genome.json`.
    pub fn json_attr(&self, key: &str) -> Option<&str> {
        match key {
            "identifier" => self.metadata.identifier.as_deref(),
            "cds_tool_faa_file" => self.metadata.cds_tool_faa_file.as_deref(),
            other => self.metadata.extra.get(other).and_then(|value| value.as_str()),
        }
    }

    pub fn faa_path(&self) -> Result<Utf8PathBuf, KiraError> {
        let file = self
            .json_attr("cds_tool_faa_file")
            .ok_or_else(|| KiraError::GenomeMetadata {
                path: self.path.join("genome.json").into_std_path_buf(),
                message: "missing cds_tool_faa_file".to_string(),
            })?;
        Ok(self.path.join(file))
    }
}

#[derive(Debug, Clone)]
pub struct Organism {
    pub name: String,
    pub path: Utf8PathBuf,
    pub metadata: OrganismMetadata,
}

/// Walks `{root}/organisms/{organism}/genomes/{genome}`.
pub struct FolderLooper {
    organisms_dir: Utf8PathBuf,
}

impl FolderLooper {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            organisms_dir: config.organisms_dir(),
        }
    }

    pub fn organisms(&self) -> Result<Vec<Organism>, KiraError> {
        if !self.organisms_dir.as_std_path().is_dir() {
            return Err(KiraError::MissingInputFile(
                self.organisms_dir.clone().into_std_path_buf(),
            ));
        }
        let mut organisms = Vec::new();
        for path in sorted_subdirs(&self.organisms_dir)? {
            let Some(name) = path.file_name().map(str::to_string) else {
                continue;
            };
            let metadata_path = path.join("organism.json");
            let metadata = if metadata_path.as_std_path().is_file() {
                read_json(&metadata_path)?
            } else {
                OrganismMetadata::default()
            };
            organisms.push(Organism {
                name,
                path,
                metadata,
            });
        }
        Ok(organisms)
    }

    /// Every genome with a `genome.json`, in organism then identifier order.
    pub fn all_genomes(&self, organism: &Organism) -> Result<Vec<Genome>, KiraError> {
        let genomes_dir = organism.path.join("genomes");
        if !genomes_dir.as_std_path().is_dir() {
            return Ok(Vec::new());
        }
        let mut genomes = Vec::new();
        for path in sorted_subdirs(&genomes_dir)? {
            let metadata_path = path.join("genome.json");
            if !metadata_path.as_std_path().is_file() {
                continue;
            }
            let metadata: GenomeMetadata = read_json(&metadata_path)?;
            let identifier = path.file_name().unwrap_or_default().to_string();
            genomes.push(Genome {
                identifier,
                organism: organism.name.clone(),
                path,
                metadata,
            });
        }
        Ok(genomes)
    }

    pub fn genomes(&self, options: &InitOptions) -> Result<Vec<Genome>, KiraError> {
        let mut selected = Vec::new();
        for organism in self.organisms()? {
            let genomes = self.all_genomes(&organism)?;
            if options.sanity_check {
                sanity_check(&organism, &genomes)?;
            }
            for genome in genomes {
                if options.skip_ignored && genome.metadata.ignore {
                    continue;
                }
                if options.representatives_only
                    && organism.metadata.representative.as_deref()
                        != Some(genome.identifier.as_str())
                {
                    continue;
                }
                selected.push(genome);
            }
        }
        Ok(selected)
    }
}

fn sanity_check(organism: &Organism, genomes: &[Genome]) -> Result<(), KiraError> {
    if let Some(name) = organism.metadata.name.as_deref() {
        if name != organism.name {
            return Err(KiraError::SanityCheck(format!(
                "organism.json name {name} does not match folder {}",
                organism.path
            )));
        }
    }
    for genome in genomes {
        if let Some(identifier) = genome.metadata.identifier.as_deref() {
            if identifier != genome.identifier {
                return Err(KiraError::SanityCheck(format!(
                    "genome.json identifier {identifier} does not match folder {}",
                    genome.path
                )));
            }
        }
    }
    if let Some(representative) = organism.metadata.representative.as_deref() {
        if !genomes.iter().any(|genome| genome.identifier == representative) {
            return Err(KiraError::SanityCheck(format!(
                "representative {representative} of {} does not exist",
                organism.name
            )));
        }
    }
    Ok(())
}

fn sorted_subdirs(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, KiraError> {
    let entries = fs::read_dir(dir.as_std_path())
        .map_err(|err| KiraError::Filesystem(format!("read {dir}: {err}")))?;
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| KiraError::Filesystem(err.to_string()))?;
        let path = Utf8PathBuf::from_path_buf(entry.path())
            .map_err(|path| KiraError::Filesystem(format!("non-utf8 path {}", path.display())))?;
        if path.as_std_path().is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Utf8Path) -> Result<T, KiraError> {
    let content = fs::read_to_string(path.as_std_path())
        .map_err(|err| KiraError::Filesystem(format!("read {path}: {err}")))?;
    serde_json::from_str(&content).map_err(|err| KiraError::GenomeMetadata {
        path: path.as_std_path().to_path_buf(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genome_json_attributes() {
        let metadata: GenomeMetadata = serde_json::from_str(
            r#"{"identifier": "FAM1", "cds_tool_faa_file": "FAM1.faa", "cds_tool": "prokka"}"#,
        )
        .unwrap();
        let genome = Genome {
            identifier: "FAM1".to_string(),
            organism: "FAM".to_string(),
            path: Utf8PathBuf::from("/db/organisms/FAM/genomes/FAM1"),
            metadata,
        };
        assert_eq!(genome.json_attr("cds_tool"), Some("prokka"));
        assert!(!genome.metadata.ignore);
        assert_eq!(
            genome.faa_path().unwrap(),
            Utf8PathBuf::from("/db/organisms/FAM/genomes/FAM1/FAM1.faa")
        );
    }

    #[test]
    fn missing_faa_attribute() {
        let genome = Genome {
            identifier: "FAM1".to_string(),
            organism: "FAM".to_string(),
            path: Utf8PathBuf::from("/db/organisms/FAM/genomes/FAM1"),
            metadata: serde_json::from_str("{}").unwrap(),
        };
        assert!(matches!(
            genome.faa_path(),
            Err(KiraError::GenomeMetadata { .. })
        ));
    }
}
