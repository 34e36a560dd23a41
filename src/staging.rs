//! Scratch file holding the sampled occurrence relation in row-major order.
//!
//! Layout, all big-endian `i32`:
//!
//! ```text
//! row_count column_count
//! (nnz column_id * nnz) * row_count
//! ```
//!
//! Reading it back one row at a time means the occurrence relation and the
//! cooccurrence matrix never have to be in memory together.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::info;
use tempfile::NamedTempFile;

use crate::dictionary::{ColumnId, RowId, SymbolId};
use crate::error::{CoocError, Phase, Result};
use crate::progress::Progress;
use crate::sampling::OccurrenceMatrix;

/// Temporary file that is deleted when dropped.
pub struct StagedFile {
    file: NamedTempFile,
}

impl StagedFile {
    pub fn create() -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix("cooc-raw")
            .suffix(".dat")
            .tempfile()
            .map_err(CoocError::io(Phase::Staging, std::env::temp_dir()))?;
        Ok(StagedFile { file })
    }

    pub fn create_in(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let file = tempfile::Builder::new()
            .prefix("cooc-raw")
            .suffix(".dat")
            .tempfile_in(dir)
            .map_err(CoocError::io(Phase::Staging, dir))?;
        Ok(StagedFile { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub(crate) fn len(&self) -> Result<u64> {
        self.file
            .as_file()
            .metadata()
            .map(|m| m.len())
            .map_err(CoocError::io(Phase::Staging, self.path()))
    }

    /// Opens an independent reader positioned at the header.
    pub fn reader(&self) -> Result<StagedReader> {
        let path = self.path().to_path_buf();
        let file = self
            .file
            .reopen()
            .map_err(CoocError::io(Phase::Accumulation, &path))?;
        StagedReader::new(BufReader::new(file), path)
    }
}

fn to_i32(value: usize, what: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| CoocError::CorruptStaging {
        reason: format!("{what} {value} does not fit a 32-bit integer"),
    })
}

/// Writes `occurrences` into `staged`, replacing any previous content.
pub fn write_occurrences(occurrences: &OccurrenceMatrix, staged: &mut StagedFile) -> Result<()> {
    let path = staged.path().to_path_buf();
    let io_err = |e| CoocError::io(Phase::Staging, &path)(e);

    let file = staged.file.as_file_mut();
    file.set_len(0).map_err(io_err)?;
    file.seek(SeekFrom::Start(0)).map_err(io_err)?;

    let mut progress = Progress::new("Writing sorted data");
    let mut out = BufWriter::new(file);
    out.write_all(&to_i32(occurrences.row_count(), "row count")?.to_be_bytes())
        .map_err(io_err)?;
    out.write_all(&to_i32(occurrences.column_count(), "column count")?.to_be_bytes())
        .map_err(io_err)?;
    for (_, columns) in occurrences.iter_rows() {
        progress.step();
        out.write_all(&to_i32(columns.len(), "row length")?.to_be_bytes())
            .map_err(io_err)?;
        for c in columns {
            out.write_all(&(c.index() as i32).to_be_bytes())
                .map_err(io_err)?;
        }
    }
    out.flush().map_err(io_err)?;
    drop(out);

    info!("Sorted data is {:.1} MB", staged.len()? as f64 / 1e6);
    Ok(())
}

/// One staged row: its id and its distinct column ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedRow {
    pub row: RowId,
    pub columns: Vec<ColumnId>,
}

/// Streams [`StagedRow`]s back in row id order.
pub struct StagedReader {
    input: BufReader<File>,
    path: PathBuf,
    row_count: u32,
    column_count: u32,
    next_row: u32,
}

impl StagedReader {
    fn new(mut input: BufReader<File>, path: PathBuf) -> Result<Self> {
        let row_count = read_count(&mut input, &path, "row count")?;
        let column_count = read_count(&mut input, &path, "column count")?;
        Ok(StagedReader {
            input,
            path,
            row_count,
            column_count,
            next_row: 0,
        })
    }

    pub fn row_count(&self) -> usize {
        self.row_count as usize
    }

    pub fn column_count(&self) -> usize {
        self.column_count as usize
    }

    fn read_row(&mut self) -> Result<StagedRow> {
        let row = RowId(self.next_row);
        let nnz = read_count(&mut self.input, &self.path, "row length")?;
        let mut columns = Vec::with_capacity(nnz as usize);
        for _ in 0..nnz {
            let c = read_count(&mut self.input, &self.path, "column id")?;
            if c >= self.column_count {
                return Err(CoocError::CorruptStaging {
                    reason: format!(
                        "column id {c} in row {} exceeds column count {}",
                        row.0, self.column_count
                    ),
                });
            }
            columns.push(ColumnId(c));
        }
        self.next_row += 1;
        Ok(StagedRow { row, columns })
    }
}

impl Iterator for StagedReader {
    type Item = Result<StagedRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_row >= self.row_count {
            return None;
        }
        match self.read_row() {
            Ok(row) => Some(Ok(row)),
            Err(e) => {
                // a broken stream cannot be resynchronized
                self.next_row = self.row_count;
                Some(Err(e))
            }
        }
    }
}

fn read_count(input: &mut impl Read, path: &Path, what: &str) -> Result<u32> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            CoocError::CorruptStaging {
                reason: format!("truncated while reading {what}"),
            }
        } else {
            CoocError::io(Phase::Accumulation, path)(e)
        }
    })?;
    let value = i32::from_be_bytes(buf);
    u32::try_from(value).map_err(|_| CoocError::CorruptStaging {
        reason: format!("negative {what}: {value}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OccurrenceMatrix {
        let mut m = OccurrenceMatrix::new(3, 4);
        m.insert(RowId(0), ColumnId(3));
        m.insert(RowId(0), ColumnId(1));
        m.insert(RowId(2), ColumnId(0));
        m.seal();
        m
    }

    #[test]
    fn test_layout_is_big_endian_i32() {
        let mut staged = StagedFile::create().unwrap();
        write_occurrences(&sample(), &mut staged).unwrap();
        let bytes = std::fs::read(staged.path()).unwrap();
        let words: Vec<i32> = bytes
            .chunks_exact(4)
            .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(words, vec![3, 4, 2, 1, 3, 0, 1, 0]);
        assert_eq!(staged.len().unwrap(), 32);
    }

    #[test]
    fn test_reader_streams_rows_in_order() {
        let mut staged = StagedFile::create().unwrap();
        write_occurrences(&sample(), &mut staged).unwrap();
        let reader = staged.reader().unwrap();
        assert_eq!(reader.row_count(), 3);
        assert_eq!(reader.column_count(), 4);
        let rows: Vec<StagedRow> = reader.map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].columns, vec![ColumnId(1), ColumnId(3)]);
        assert!(rows[1].columns.is_empty());
        assert_eq!(rows[2].row, RowId(2));
        assert_eq!(rows[2].columns, vec![ColumnId(0)]);
    }

    #[test]
    fn test_truncated_file_is_corrupt() {
        let mut staged = StagedFile::create().unwrap();
        write_occurrences(&sample(), &mut staged).unwrap();
        let bytes = std::fs::read(staged.path()).unwrap();
        std::fs::write(staged.path(), &bytes[..bytes.len() - 2]).unwrap();

        let results: Vec<Result<StagedRow>> = staged.reader().unwrap().collect();
        assert!(results[0].is_ok());
        assert!(matches!(
            results.last(),
            Some(Err(CoocError::CorruptStaging { .. }))
        ));
    }

    #[test]
    fn test_scratch_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let staged = StagedFile::create_in(dir.path()).unwrap();
            assert!(staged.path().exists());
            staged.path().to_path_buf()
        };
        assert!(!path.exists());
    }
}
