use std::fs;

use assert_matches::assert_matches;
use camino::{Utf8Path, Utf8PathBuf};

use kira_genome_tools::config::{DatabaseConfig, InitOptions};
use kira_genome_tools::database::FolderLooper;
use kira_genome_tools::error::KiraError;
use kira_genome_tools::orthofinder::init_orthofinder;

struct Database {
    _temp: tempfile::TempDir,
    root: Utf8PathBuf,
}

impl Database {
    fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().join("db")).unwrap();
        fs::create_dir_all(root.join("organisms")).unwrap();
        Self { _temp: temp, root }
    }

    fn organism(&self, name: &str, representative: Option<&str>) -> Utf8PathBuf {
        let dir = self.root.join("organisms").join(name);
        fs::create_dir_all(dir.join("genomes")).unwrap();
        let json = match representative {
            Some(rep) => format!(r#"{{"name": "{name}", "representative": "{rep}"}}"#),
            None => format!(r#"{{"name": "{name}"}}"#),
        };
        fs::write(dir.join("organism.json"), json).unwrap();
        dir
    }

    fn genome(&self, organism: &str, identifier: &str, ignore: bool) -> Utf8PathBuf {
        let dir = self
            .root
            .join("organisms")
            .join(organism)
            .join("genomes")
            .join(identifier);
        fs::create_dir_all(dir.join("1_cds")).unwrap();
        let json = format!(
            r#"{{"identifier": "{identifier}", "cds_tool": "prokka", "cds_tool_faa_file": "1_cds/{identifier}.faa", "ignore": {ignore}}}"#
        );
        fs::write(dir.join("genome.json"), json).unwrap();
        fs::write(
            dir.join("1_cds").join(format!("{identifier}.faa")),
            format!(">{identifier}_00001\nMK\n"),
        )
        .unwrap();
        dir
    }

    fn config(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.root.clone())
    }

    fn fasta_dir(&self) -> Utf8PathBuf {
        self.root.join("OrthoFinder/fastas")
    }
}

fn link_names(dir: &Utf8Path) -> Vec<String> {
    let mut names = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect::<Vec<_>>();
    names.sort();
    names
}

fn standard_database() -> Database {
    let db = Database::new();
    db.organism("Lactobacillus_helveticus", Some("FAM1"));
    db.genome("Lactobacillus_helveticus", "FAM1", false);
    db.genome("Lactobacillus_helveticus", "FAM2", false);
    db.genome("Lactobacillus_helveticus", "FAM3", true);
    db.organism("Streptococcus_thermophilus", None);
    db.genome("Streptococcus_thermophilus", "FAM9", false);
    db
}

#[test]
fn links_every_selected_genome() {
    let db = standard_database();
    let mut out = Vec::new();

    let result = init_orthofinder(&db.config(), &InitOptions::default(), &mut out).unwrap();

    assert_eq!(link_names(&db.fasta_dir()), vec!["FAM1.faa", "FAM2.faa", "FAM9.faa"]);
    assert_eq!(result.linked.len(), 3);
    for linked in &result.linked {
        let link = db.fasta_dir().join(format!("{}.faa", linked.identifier));
        let target = fs::read_link(&link).unwrap();
        assert!(target.is_relative(), "{} is absolute", target.display());
        let content = fs::read_to_string(&link).unwrap();
        assert_eq!(content, format!(">{}_00001\nMK\n", linked.identifier));
    }

    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with(&format!(
        "Linking protein fastas to {}/{{identifier}}.faa\n",
        db.fasta_dir()
    )));
    assert!(text.contains("Done: Found 3 faas.\n"));
    assert!(text.contains(&format!("    orthofinder -f {}\n", db.fasta_dir())));
    assert!(text.ends_with("More info on https://github.com/davidemms/OrthoFinder\n"));
}

#[test]
fn relative_links_survive_moving_the_database() {
    let db = standard_database();
    init_orthofinder(&db.config(), &InitOptions::default(), &mut Vec::new()).unwrap();

    let moved = db.root.with_file_name("moved");
    fs::rename(&db.root, &moved).unwrap();
    let content = fs::read_to_string(moved.join("OrthoFinder/fastas/FAM9.faa")).unwrap();
    assert_eq!(content, ">FAM9_00001\nMK\n");
}

#[test]
fn include_ignored_and_representative_filters() {
    let db = standard_database();
    let options = InitOptions {
        skip_ignored: false,
        ..InitOptions::default()
    };
    init_orthofinder(&db.config(), &options, &mut Vec::new()).unwrap();
    assert_eq!(
        link_names(&db.fasta_dir()),
        vec!["FAM1.faa", "FAM2.faa", "FAM3.faa", "FAM9.faa"]
    );

    let looper = FolderLooper::new(&db.config());
    let representatives = looper
        .genomes(&InitOptions {
            representatives_only: true,
            ..InitOptions::default()
        })
        .unwrap()
        .into_iter()
        .map(|genome| genome.identifier)
        .collect::<Vec<_>>();
    assert_eq!(representatives, vec!["FAM1"]);
}

#[test]
fn refuses_non_empty_orthofinder_dir() {
    let db = standard_database();
    fs::create_dir_all(db.root.join("OrthoFinder/Results_Jan01")).unwrap();

    let err = init_orthofinder(&db.config(), &InitOptions::default(), &mut Vec::new()).unwrap_err();
    assert_matches!(err, KiraError::DestinationNotEmpty(path) if path.ends_with("OrthoFinder"));
    assert!(!db.fasta_dir().exists());
}

#[test]
fn second_run_is_refused() {
    let db = standard_database();
    init_orthofinder(&db.config(), &InitOptions::default(), &mut Vec::new()).unwrap();
    let err = init_orthofinder(&db.config(), &InitOptions::default(), &mut Vec::new()).unwrap_err();
    assert_matches!(err, KiraError::DestinationNotEmpty(_));
}

#[test]
fn missing_protein_fasta_is_reported() {
    let db = standard_database();
    let genome = db.genome("Streptococcus_thermophilus", "FAM10", false);
    fs::remove_file(genome.join("1_cds/FAM10.faa")).unwrap();

    let err = init_orthofinder(&db.config(), &InitOptions::default(), &mut Vec::new()).unwrap_err();
    assert_matches!(err, KiraError::MissingInputFile(path) if path.ends_with("FAM10.faa"));
}

#[test]
fn sanity_check_catches_mismatched_identifier() {
    let db = standard_database();
    let genome = db.genome("Streptococcus_thermophilus", "FAM11", false);
    fs::write(
        genome.join("genome.json"),
        r#"{"identifier": "FAM12", "cds_tool_faa_file": "1_cds/FAM11.faa"}"#,
    )
    .unwrap();

    let err = init_orthofinder(&db.config(), &InitOptions::default(), &mut Vec::new()).unwrap_err();
    assert_matches!(err, KiraError::SanityCheck(message) if message.contains("FAM12"));

    fs::remove_dir_all(db.root.join("OrthoFinder")).unwrap();
    let options = InitOptions {
        sanity_check: false,
        ..InitOptions::default()
    };
    let result = init_orthofinder(&db.config(), &options, &mut Vec::new()).unwrap();
    assert_eq!(result.linked.len(), 4);
}

#[test]
fn sanity_check_catches_unknown_representative() {
    let db = Database::new();
    db.organism("Lactobacillus_helveticus", Some("FAM404"));
    db.genome("Lactobacillus_helveticus", "FAM1", false);

    let err = init_orthofinder(&db.config(), &InitOptions::default(), &mut Vec::new()).unwrap_err();
    assert_matches!(err, KiraError::SanityCheck(message) if message.contains("FAM404"));
}

#[test]
fn missing_organisms_dir_is_reported() {
    let db = Database::new();
    fs::remove_dir(db.root.join("organisms")).unwrap();

    let err = init_orthofinder(&db.config(), &InitOptions::default(), &mut Vec::new()).unwrap_err();
    assert_matches!(err, KiraError::MissingInputFile(path) if path.ends_with("organisms"));
}
