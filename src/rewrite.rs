use std::io::{BufRead, Write};

use regex::{Captures, Regex};

use crate::domain::PrefixMapping;
use crate::error::KiraError;

/// Replaces a locus tag prefix only where it starts an identifier.
///
/// An occurrence counts when it sits at the start of the line or after a
/// character that is neither ASCII alphanumeric nor `_`, and is followed by an
/// ASCII alphanumeric character. `XFEZ40_RS0001` and a bare `FEZ40_RS` are left
/// alone.
#[derive(Debug, Clone)]
pub struct LocusTagRewriter {
    pattern: Regex,
    old: String,
    new: String,
}

impl LocusTagRewriter {
    pub fn new(mapping: &PrefixMapping) -> Result<Self, KiraError> {
        let pattern = Regex::new(&format!(
            r"(^|[^A-Za-z0-9_])({})([A-Za-z0-9])",
            regex::escape(mapping.old().as_str())
        ))
        .map_err(|err| KiraError::InvalidLocusTagPrefix(err.to_string()))?;
        Ok(Self {
            pattern,
            old: mapping.old().as_str().to_string(),
            new: mapping.new_prefix().as_str().to_string(),
        })
    }

    /// Returns the rewritten line and the number of replacements.
    pub fn rewrite_line(&self, line: &str) -> (String, usize) {
        if !line.contains(&self.old) {
            return (line.to_string(), 0);
        }
        let mut count = 0usize;
        let rewritten = self.pattern.replace_all(line, |caps: &Captures| {
            count += 1;
            format!("{}{}{}", &caps[1], self.new, &caps[3])
        });
        (rewritten.into_owned(), count)
    }

    /// Streams `input` to `output`, preserving line endings.
    pub fn rewrite_stream<R: BufRead, W: Write + ?Sized>(
        &self,
        mut input: R,
        output: &mut W,
    ) -> Result<usize, KiraError> {
        let mut total = 0usize;
        let mut line = String::new();
        loop {
            line.clear();
            let read = input
                .read_line(&mut line)
                .map_err(|err| KiraError::Filesystem(err.to_string()))?;
            if read == 0 {
                break;
            }
            let (rewritten, count) = self.rewrite_line(&line);
            total += count;
            output
                .write_all(rewritten.as_bytes())
                .map_err(|err| KiraError::Filesystem(err.to_string()))?;
        }
        Ok(total)
    }
}
