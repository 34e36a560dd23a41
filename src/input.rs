//! Tab-separated `(row, column)` input that can be read twice.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{CoocError, Phase, Result};

/// One input line split into its row and column tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 1-based line number.
    pub line: u64,
    pub row: String,
    pub column: String,
}

/// A source that replays the same records on every call to [`InputSource::records`].
///
/// Files are simply reopened. Anything else (stdin, sockets, decompressors) is
/// copied into a temporary file first; the copy lives as long as the source.
#[derive(Debug)]
pub enum InputSource {
    File(PathBuf),
    Staged(NamedTempFile),
}

impl InputSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        InputSource::File(path.into())
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut staged = NamedTempFile::new().map_err(CoocError::io(Phase::Read, "<temp>"))?;
        let path = staged.path().to_path_buf();
        io::copy(&mut reader, staged.as_file_mut()).map_err(CoocError::io(Phase::Read, &path))?;
        log::info!("Buffered input into {}", path.display());
        Ok(InputSource::Staged(staged))
    }

    pub fn path(&self) -> &Path {
        match self {
            InputSource::File(p) => p,
            InputSource::Staged(t) => t.path(),
        }
    }

    /// Starts a fresh pass over the input.
    pub fn records(&self) -> Result<Records> {
        let path = self.path().to_path_buf();
        let file = File::open(&path).map_err(CoocError::io(Phase::Read, &path))?;
        Ok(Records {
            lines: BufReader::new(file),
            buf: String::new(),
            line: 0,
            path,
        })
    }
}

/// Iterator over the records of one pass.
pub struct Records {
    lines: BufReader<File>,
    buf: String,
    line: u64,
    path: PathBuf,
}

impl Iterator for Records {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.lines.read_line(&mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                self.line += 1;
                Some(parse_record(self.line, &self.buf))
            }
            Err(e) => Some(Err(CoocError::io(Phase::Read, &self.path)(e))),
        }
    }
}

/// Splits `row<TAB>column`. Extra fields are ignored.
pub fn parse_record(line: u64, raw: &str) -> Result<Record> {
    let text = raw.strip_suffix('\n').unwrap_or(raw);
    let text = text.strip_suffix('\r').unwrap_or(text);
    let mut fields = text.split('\t');
    match (fields.next(), fields.next()) {
        (Some(row), Some(column)) => Ok(Record {
            line,
            row: row.to_string(),
            column: column.to_string(),
        }),
        _ => Err(CoocError::MalformedRecord {
            line,
            content: text.to_string(),
        }),
    }
}
