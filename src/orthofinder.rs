use std::fs;
use std::io::Write;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{DatabaseConfig, InitOptions};
use crate::database::FolderLooper;
use crate::error::KiraError;
use crate::fs_util;

#[derive(Debug, Clone, Serialize)]
pub struct InitResult {
    pub orthofinder_dir: String,
    pub fasta_dir: String,
    pub linked: Vec<LinkedGenome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkedGenome {
    pub identifier: String,
    pub link: String,
    pub target: String,
}

/// Links `{identifier}.faa` for every selected genome into
/// `{database}/OrthoFinder/fastas` and writes the run instructions to `out`.
pub fn init_orthofinder(
    config: &DatabaseConfig,
    options: &InitOptions,
    out: &mut dyn Write,
) -> Result<InitResult, KiraError> {
    let orthofinder_dir = config.orthofinder_dir();
    let fasta_dir = config.fasta_dir();

    fs::create_dir_all(orthofinder_dir.as_std_path())
        .map_err(|err| KiraError::Filesystem(format!("create {orthofinder_dir}: {err}")))?;
    let mut entries = fs::read_dir(orthofinder_dir.as_std_path())
        .map_err(|err| KiraError::Filesystem(format!("read {orthofinder_dir}: {err}")))?;
    if entries.next().is_some() {
        return Err(KiraError::DestinationNotEmpty(
            orthofinder_dir.into_std_path_buf(),
        ));
    }
    fs::create_dir_all(fasta_dir.as_std_path())
        .map_err(|err| KiraError::Filesystem(format!("create {fasta_dir}: {err}")))?;

    let io_err = |err: std::io::Error| KiraError::Filesystem(err.to_string());
    writeln!(out, "Linking protein fastas to {fasta_dir}/{{identifier}}.faa").map_err(io_err)?;

    let fasta_dir_abs = fs_util::absolute(&fasta_dir)?;
    let looper = FolderLooper::new(config);
    let mut linked = Vec::new();
    for genome in looper.genomes(options)? {
        let faa_path = genome.faa_path()?;
        if !faa_path.as_std_path().is_file() {
            return Err(KiraError::MissingInputFile(faa_path.into_std_path_buf()));
        }
        let target = fs_util::relative_path(&fs_util::absolute(&faa_path)?, &fasta_dir_abs);
        let link = fasta_dir.join(format!("{}.faa", genome.identifier));
        fs_util::symlink(&target, link.as_std_path())?;
        debug!(identifier = %genome.identifier, target = %target.display(), "linked");
        linked.push(LinkedGenome {
            identifier: genome.identifier,
            link: link.to_string(),
            target: target.display().to_string(),
        });
    }
    info!(count = linked.len(), %fasta_dir, "linked protein fastas");

    let usage = usage_text(config.root().as_str(), fasta_dir.as_str(), linked.len());
    out.write_all(usage.as_bytes()).map_err(io_err)?;

    Ok(InitResult {
        orthofinder_dir: orthofinder_dir.to_string(),
        fasta_dir: fasta_dir.to_string(),
        linked,
    })
}

/// Operator guidance printed after staging. Existing automation scrapes this
/// text, so it must not change.
pub fn usage_text(database_dir: &str, fasta_dir: &str, n_faas: usize) -> String {
    let cmd = format!("orthofinder -f {fasta_dir}");
    let container_cmd = format!(
        "-it --rm -v {database_dir}:/input:Z davidemms/orthofinder orthofinder -f /input/OrthoFinder/fastas"
    );
    let podman_cmd = format!("podman run --ulimit=host {container_cmd}");
    let docker_cmd = format!("docker run --ulimit nofile=1000000:1000000 {container_cmd}");

    let mut text = [
        format!("Done: Found {n_faas} faas."),
        String::new(),
        "Ways to run OrthoFinder:".to_string(),
        "1) local install:".to_string(),
        format!("    {cmd}"),
        String::new(),
        "2) using podman:".to_string(),
        format!("    {podman_cmd}"),
        String::new(),
        "2) using docker:".to_string(),
        format!("    {docker_cmd}"),
        String::new(),
        "If you have many genomes, consider run OrthoFinder with the -og option.".to_string(),
        "Be sure to to use the -a and -t options!".to_string(),
        "More info on https://github.com/davidemms/OrthoFinder".to_string(),
    ]
    .join("\n");
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_text_is_stable() {
        let text = usage_text("/db", "/db/OrthoFinder/fastas", 2);
        let expected = "\
Done: Found 2 faas.

Ways to run OrthoFinder:
1) local install:
    orthofinder -f /db/OrthoFinder/fastas

2) using podman:
    podman run --ulimit=host -it --rm -v /db:/input:Z davidemms/orthofinder orthofinder -f /input/OrthoFinder/fastas

2) using docker:
    docker run --ulimit nofile=1000000:1000000 -it --rm -v /db:/input:Z davidemms/orthofinder orthofinder -f /input/OrthoFinder/fastas

If you have many genomes, consider run OrthoFinder with the -og option.
Be sure to to use the -a and -t options!
More info on https://github.com/davidemms/OrthoFinder
";
        assert_eq!(text, expected);
    }
}
