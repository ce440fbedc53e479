use std::fs;

use assert_matches::assert_matches;
use camino::{Utf8Path, Utf8PathBuf};

use kira_genome_tools::config::ConvertOptions;
use kira_genome_tools::convert::convert_assembly;
use kira_genome_tools::domain::{AssemblyPaths, GenomePaths, LocusTagPrefix, PrefixMapping};
use kira_genome_tools::error::KiraError;
use kira_genome_tools::fasta;

const ACCESSION: &str = "GCF_005864195.1";

fn fixture_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data")
}

fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    (temp, root)
}

fn raw_assembly(dir: &Utf8Path) -> AssemblyPaths {
    let raw = AssemblyPaths::in_dir(dir, ACCESSION);
    for path in raw.all() {
        let name = path.file_name().unwrap();
        fs::copy(fixture_dir().join(name), path).unwrap();
    }
    raw
}

fn mapping() -> PrefixMapping {
    let old: LocusTagPrefix = "FEZ40_RS".parse().unwrap();
    let new: LocusTagPrefix = "FAM3257_".parse().unwrap();
    PrefixMapping::new(old, new).unwrap()
}

#[test]
fn convert_renames_locus_tags_and_derives_fastas() {
    let (_temp, root) = temp_root();
    let raw = raw_assembly(&root);
    let outputs = GenomePaths::in_dir(&root.join("out"), "FAM3257");
    fs::create_dir_all(root.join("out")).unwrap();

    let result = convert_assembly(&raw, &outputs, &mapping(), ConvertOptions::default()).unwrap();

    assert_eq!(result.cds, 4);
    let report = result.validation.unwrap();
    assert_eq!(report.contigs, 2);
    assert_eq!(report.cds, 4);
    assert_eq!(report.gff_features, 13);

    for (_, path) in outputs.all() {
        let text = fs::read_to_string(path).unwrap();
        assert!(!text.contains("FEZ40_RS"), "{path} still has the old prefix");
    }

    assert_eq!(
        fasta::read_ids(&outputs.faa).unwrap(),
        vec![
            "FAM3257_00005",
            "FAM3257_00010",
            "FAM3257_00020",
            "FAM3257_00025"
        ]
    );
    let faa = fs::read_to_string(&outputs.faa).unwrap();
    assert!(faa.starts_with(">FAM3257_00005 DNA replication protein DnaA\nMK\n"));
    let ffn = fs::read_to_string(&outputs.ffn).unwrap();
    assert!(ffn.contains(">FAM3257_00010 hypothetical protein\nATGGCATAA\n"));
    assert!(ffn.contains(">FAM3257_00020 ribosomal protein L7/L12\nATGAAATAA\n"));
    assert!(!ffn.contains("00015"));
}

#[test]
fn convert_keeps_non_matching_identifiers() {
    let (_temp, root) = temp_root();
    let raw = raw_assembly(&root);
    let outputs = GenomePaths::in_dir(&root, "FAM3257");

    convert_assembly(&raw, &outputs, &mapping(), ConvertOptions::default()).unwrap();

    let gbk = fs::read_to_string(&outputs.gbk).unwrap();
    assert!(gbk.contains("/locus_tag=\"FAM3257_00005\""));
    assert!(gbk.contains("/old_locus_tag=\"FEZ40_00005\""));
    assert!(gbk.contains("/protein_id=\"WP_000000001.1\""));
    let gff = fs::read_to_string(&outputs.gff).unwrap();
    assert!(gff.contains("ID=gene-FAM3257_00005;Name=FAM3257_00005;"));
    assert_eq!(
        fs::read_to_string(&outputs.fna).unwrap(),
        fs::read_to_string(&raw.fna).unwrap()
    );
}

#[test]
fn convert_refuses_existing_outputs_without_force() {
    let (_temp, root) = temp_root();
    let raw = raw_assembly(&root);
    let outputs = GenomePaths::in_dir(&root, "FAM3257");
    fs::write(&outputs.faa, ">stale\nM\n").unwrap();

    let err = convert_assembly(&raw, &outputs, &mapping(), ConvertOptions::default()).unwrap_err();
    assert_matches!(err, KiraError::OutputExists(path) if path.ends_with("FAM3257.faa"));
    assert!(!outputs.fna.exists());
}

#[test]
fn forced_conversion_is_repeatable() {
    let (_temp, root) = temp_root();
    let raw = raw_assembly(&root);
    let outputs = GenomePaths::in_dir(&root, "FAM3257");
    let options = ConvertOptions {
        validate: true,
        force: true,
    };

    convert_assembly(&raw, &outputs, &mapping(), options).unwrap();
    let first = outputs
        .all()
        .map(|(_, path)| fs::read(path).unwrap());
    convert_assembly(&raw, &outputs, &mapping(), options).unwrap();
    let second = outputs
        .all()
        .map(|(_, path)| fs::read(path).unwrap());
    assert_eq!(first, second);
}

#[test]
fn missing_raw_file_is_reported() {
    let (_temp, root) = temp_root();
    let raw = raw_assembly(&root);
    fs::remove_file(&raw.gff).unwrap();
    let outputs = GenomePaths::in_dir(&root.join("out"), "FAM3257");

    let err = convert_assembly(&raw, &outputs, &mapping(), ConvertOptions::default()).unwrap_err();
    assert_matches!(err, KiraError::MissingInputFile(path) if path.ends_with("GCF_005864195.1.gff"));
}

#[test]
fn validation_rejects_gff_without_cds_locus_tag() {
    let (_temp, root) = temp_root();
    let raw = raw_assembly(&root);
    let gff = fs::read_to_string(&raw.gff)
        .unwrap()
        .lines()
        .filter(|line| !line.contains("FEZ40_RS00025"))
        .collect::<Vec<_>>()
        .join("\n");
    fs::write(&raw.gff, gff).unwrap();
    let outputs = GenomePaths::in_dir(&root, "FAM3257");

    let err = convert_assembly(&raw, &outputs, &mapping(), ConvertOptions::default()).unwrap_err();
    assert_matches!(
        err,
        KiraError::Validation { file, message }
            if file.ends_with("FAM3257.gff") && message.contains("FAM3257_00025")
    );
}

#[test]
fn validation_rejects_prefix_left_behind() {
    let (_temp, root) = temp_root();
    let raw = raw_assembly(&root);
    let fna = fs::read_to_string(&raw.fna)
        .unwrap()
        .replace("complete genome", "complete genome FEZ40_RS ref");
    fs::write(&raw.fna, fna).unwrap();
    let outputs = GenomePaths::in_dir(&root, "FAM3257");

    let err = convert_assembly(&raw, &outputs, &mapping(), ConvertOptions::default()).unwrap_err();
    assert_matches!(err, KiraError::Validation { file, .. } if file.ends_with("FAM3257.fna"));
}

#[test]
fn validation_can_be_skipped() {
    let (_temp, root) = temp_root();
    let raw = raw_assembly(&root);
    let fna = fs::read_to_string(&raw.fna)
        .unwrap()
        .replace(">NZ_TEST02.1", ">NZ_OTHER.1");
    fs::write(&raw.fna, fna).unwrap();
    let outputs = GenomePaths::in_dir(&root, "FAM3257");

    let options = ConvertOptions {
        validate: false,
        force: false,
    };
    let result = convert_assembly(&raw, &outputs, &mapping(), options).unwrap();
    assert!(result.validation.is_none());

    let err = convert_assembly(
        &raw,
        &outputs,
        &mapping(),
        ConvertOptions {
            validate: true,
            force: true,
        },
    )
    .unwrap_err();
    assert_matches!(err, KiraError::Validation { message, .. } if message.contains("NZ_OTHER.1"));
}

#[cfg(unix)]
#[test]
fn converted_files_follow_umask() {
    use std::os::unix::fs::PermissionsExt;

    let (_temp, root) = temp_root();
    let raw = raw_assembly(&root);
    let outputs = GenomePaths::in_dir(&root.join("out"), "FAM3257");
    let reference = root.join("reference.txt");
    fs::File::create(&reference).unwrap();

    convert_assembly(&raw, &outputs, &mapping(), ConvertOptions::default()).unwrap();

    let mode = |path: &Utf8Path| fs::metadata(path).unwrap().permissions().mode() & 0o777;
    for (kind, path) in outputs.all() {
        assert_eq!(mode(path), mode(&reference), "{kind} mode");
    }
}
