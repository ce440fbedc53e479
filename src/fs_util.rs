use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Component, Path, PathBuf};

use camino::Utf8Path;
use flate2::read::MultiGzDecoder;
use zip::ZipArchive;

use crate::error::KiraError;

/// Opens a text file for buffered reading; `.gz` files are decompressed.
pub fn open_text(path: &Utf8Path) -> Result<Box<dyn BufRead>, KiraError> {
    if !path.as_std_path().is_file() {
        return Err(KiraError::MissingInputFile(path.as_std_path().to_path_buf()));
    }
    let file = fs::File::open(path.as_std_path())
        .map_err(|err| KiraError::Filesystem(format!("open {path}: {err}")))?;
    if path.extension() == Some("gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

pub fn is_non_empty_file(path: &Utf8Path) -> bool {
    fs::metadata(path.as_std_path())
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false)
}

/// Writes through a temporary file in the target directory, then renames it
/// into place. The file mode follows the process umask, as with `File::create`.
pub fn write_atomic<F>(dest: &Utf8Path, write: F) -> Result<(), KiraError>
where
    F: FnOnce(&mut dyn io::Write) -> Result<(), KiraError>,
{
    let parent = dest
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or(Utf8Path::new("."));
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| KiraError::Filesystem(err.to_string()))?;
    let mut builder = tempfile::Builder::new();
    builder.prefix(".kira-gt");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let temp = builder
        .tempfile_in(parent.as_std_path())
        .map_err(|err| KiraError::Filesystem(err.to_string()))?;
    {
        let mut writer = io::BufWriter::new(temp.as_file());
        write(&mut writer)?;
        io::Write::flush(&mut writer).map_err(|err| KiraError::Filesystem(err.to_string()))?;
    }
    temp.persist(dest.as_std_path())
        .map_err(|err| KiraError::Filesystem(format!("persist {dest}: {err}")))?;
    Ok(())
}

pub fn validate_zip(zip_path: &Path) -> Result<(), KiraError> {
    let file = fs::File::open(zip_path)
        .map_err(|err| KiraError::Filesystem(format!("open zip {}: {err}", zip_path.display())))?;
    let mut archive =
        ZipArchive::new(file).map_err(|err| KiraError::Filesystem(err.to_string()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|err| KiraError::Filesystem(err.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        io::copy(&mut entry, &mut io::sink())
            .map_err(|err| KiraError::Filesystem(err.to_string()))?;
    }
    Ok(())
}

/// Copies the first archive member accepted by `select` to `dest`.
/// Returns the member name, or `None` when nothing matched.
pub fn extract_zip_member<F>(
    zip_path: &Path,
    select: F,
    dest: &Utf8Path,
) -> Result<Option<String>, KiraError>
where
    F: Fn(&Path) -> bool,
{
    let file = fs::File::open(zip_path)
        .map_err(|err| KiraError::Filesystem(format!("open zip {}: {err}", zip_path.display())))?;
    let mut archive =
        ZipArchive::new(file).map_err(|err| KiraError::Filesystem(err.to_string()))?;

    let mut names = archive.file_names().map(str::to_string).collect::<Vec<_>>();
    names.sort();
    for name in names {
        let mut entry = archive
            .by_name(&name)
            .map_err(|err| KiraError::Filesystem(err.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        let Some(entry_path) = entry.enclosed_name() else {
            return Err(KiraError::Filesystem(
                "zip entry path traversal detected".to_string(),
            ));
        };
        if !select(&entry_path) {
            continue;
        }
        write_atomic(dest, |out| {
            io::copy(&mut entry, out).map_err(|err| KiraError::Filesystem(err.to_string()))?;
            Ok(())
        })?;
        return Ok(Some(name));
    }
    Ok(None)
}

/// Lexical relative path from directory `base` to `target`; both must be
/// absolute.
pub fn relative_path(target: &Path, base: &Path) -> PathBuf {
    let target = normalize(target);
    let base = normalize(base);
    let target_parts = target.components().collect::<Vec<_>>();
    let base_parts = base.components().collect::<Vec<_>>();
    let common = target_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &target_parts[common..] {
        relative.push(part.as_os_str());
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    relative
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

pub fn absolute(path: &Utf8Path) -> Result<PathBuf, KiraError> {
    std::path::absolute(path.as_std_path())
        .map(|path| normalize(&path))
        .map_err(|err| KiraError::Filesystem(format!("resolve {path}: {err}")))
}

#[cfg(unix)]
pub fn symlink(target: &Path, link: &Path) -> Result<(), KiraError> {
    std::os::unix::fs::symlink(target, link)
        .map_err(|err| KiraError::Filesystem(format!("symlink {}: {err}", link.display())))
}

#[cfg(not(unix))]
pub fn symlink(_target: &Path, link: &Path) -> Result<(), KiraError> {
    Err(KiraError::Filesystem(format!(
        "symlinks are not supported on this platform: {}",
        link.display()
    )))
}
