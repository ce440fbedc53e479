use std::io::Write;

use bio::io::fasta;
use camino::Utf8Path;

use crate::error::KiraError;
use crate::fs_util;

/// One FASTA entry: `>{id} {description}` followed by the sequence.
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a> {
    pub id: &'a str,
    pub description: Option<&'a str>,
    pub sequence: &'a [u8],
}

pub fn write_entries<'a, W, I>(out: W, entries: I) -> Result<usize, KiraError>
where
    W: Write,
    I: IntoIterator<Item = Entry<'a>>,
{
    let io_err = |err: std::io::Error| KiraError::Filesystem(err.to_string());
    let mut writer = fasta::Writer::new(out);
    let mut count = 0usize;
    for entry in entries {
        writer
            .write(entry.id, entry.description, entry.sequence)
            .map_err(io_err)?;
        count += 1;
    }
    writer.flush().map_err(io_err)?;
    Ok(count)
}

/// Record identifiers (header text up to the first whitespace) in file order.
pub fn read_ids(path: &Utf8Path) -> Result<Vec<String>, KiraError> {
    let reader = fasta::Reader::from_bufread(fs_util::open_text(path)?);
    reader
        .records()
        .map(|record| {
            record
                .map(|record| record.id().to_string())
                .map_err(|err| KiraError::Filesystem(format!("read {path}: {err}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_id_and_description() {
        let mut out = Vec::new();
        let entries = [
            Entry {
                id: "X_1",
                description: Some("DNA polymerase III subunit beta"),
                sequence: b"MKV",
            },
            Entry {
                id: "X_2",
                description: None,
                sequence: b"MA",
            },
        ];
        let count = write_entries(&mut out, entries).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            ">X_1 DNA polymerase III subunit beta\nMKV\n>X_2\nMA\n"
        );
    }

    #[test]
    fn reads_header_ids_across_wrapped_records() {
        let temp = tempfile::tempdir().unwrap();
        let path = camino::Utf8PathBuf::from_path_buf(temp.path().join("x.faa")).unwrap();
        std::fs::write(path.as_std_path(), ">A_1 one\nMK\nVL\n>A_2\nMA\n").unwrap();
        assert_eq!(read_ids(&path).unwrap(), vec!["A_1", "A_2"]);
    }

    #[test]
    fn empty_file_has_no_ids() {
        let temp = tempfile::tempdir().unwrap();
        let path = camino::Utf8PathBuf::from_path_buf(temp.path().join("x.ffn")).unwrap();
        std::fs::write(path.as_std_path(), "").unwrap();
        assert!(read_ids(&path).unwrap().is_empty());
    }
}
