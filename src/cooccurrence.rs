//! Squaring the occurrence relation into symmetric column-column counts.

use std::collections::HashMap;

use log::info;

use crate::dictionary::{ColumnId, RowId, SymbolId};
use crate::error::Result;
use crate::progress::Progress;
use crate::sampling::OccurrenceMatrix;
use crate::sparse::SparseMatrix;
use crate::staging::StagedRow;

/// Raw pair counts between column symbols. Symmetric, zero diagonal.
#[derive(Debug, Clone)]
pub struct CooccurrenceCounts {
    pub(crate) cells: SparseMatrix<u64>,
}

impl CooccurrenceCounts {
    pub fn new(dimension: usize) -> Self {
        CooccurrenceCounts {
            cells: SparseMatrix::new(dimension, dimension),
        }
    }

    pub fn dimension(&self) -> usize {
        self.cells.row_count()
    }

    /// Count for a pair; zero when the pair never appeared together.
    pub fn get(&self, a: ColumnId, b: ColumnId) -> u64 {
        self.cells.get(a.index(), b.index()).unwrap_or(0)
    }

    pub fn nnz(&self) -> usize {
        self.cells.nnz()
    }

    /// Non-zero cells of one row, in no particular order.
    pub fn row(&self, a: ColumnId) -> impl Iterator<Item = (ColumnId, u64)> + '_ {
        self.cells
            .row(a.index())
            .iter()
            .map(|(&j, &v)| (ColumnId(j), v))
    }

    fn add_pair(&mut self, a: ColumnId, b: ColumnId) {
        *self.cells.entry(a.index(), b.index(), 0) += 1;
        *self.cells.entry(b.index(), a.index(), 0) += 1;
    }
}

/// Origin rows behind one cooccurring pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evidence {
    /// Number of rows that produced the pair. Always exact.
    pub count: u64,
    /// Contributing rows in ascending id order, possibly truncated to a cap.
    pub origins: Vec<RowId>,
}

/// Which rows produced each cooccurring pair.
#[derive(Debug, Clone)]
pub struct Provenance {
    dimension: u64,
    max_origins: Option<usize>,
    pairs: HashMap<u64, Evidence>,
}

impl Provenance {
    pub fn new(dimension: usize, max_origins: Option<usize>) -> Self {
        Provenance {
            dimension: dimension as u64,
            max_origins,
            pairs: HashMap::new(),
        }
    }

    /// Orientation-independent key `min * dimension + max`.
    pub fn key(&self, a: ColumnId, b: ColumnId) -> u64 {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        lo.index() as u64 * self.dimension + hi.index() as u64
    }

    fn record(&mut self, a: ColumnId, b: ColumnId, origin: RowId) {
        let key = self.key(a, b);
        let evidence = self.pairs.entry(key).or_default();
        evidence.count += 1;
        if self.max_origins.is_none_or(|cap| evidence.origins.len() < cap) {
            evidence.origins.push(origin);
        }
    }

    pub fn get(&self, a: ColumnId, b: ColumnId) -> Option<&Evidence> {
        self.pairs.get(&self.key(a, b))
    }

    /// Number of distinct unordered pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Options for [`accumulate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AccumulateOptions {
    /// Keep at most this many origin rows per pair. `None` keeps all of them.
    pub max_origins: Option<usize>,
}

/// Counts every unordered pair of distinct columns within each staged row.
///
/// `dimension` is the column vocabulary size. Rows must carry distinct column
/// ids, as produced by [`OccurrenceMatrix::seal`].
pub fn accumulate<I>(
    rows: I,
    dimension: usize,
    options: &AccumulateOptions,
) -> Result<(CooccurrenceCounts, Provenance)>
where
    I: IntoIterator<Item = Result<StagedRow>>,
{
    info!("Starting cooccurrence counting");
    let mut counts = CooccurrenceCounts::new(dimension);
    let mut provenance = Provenance::new(dimension, options.max_origins);
    let mut progress = Progress::new("Cooc");

    for staged in rows {
        let StagedRow { row, columns } = staged?;
        progress.step();
        for (i, &a) in columns.iter().enumerate() {
            for &b in &columns[i + 1..] {
                if a == b {
                    continue;
                }
                counts.add_pair(a, b);
                provenance.record(a, b, row);
            }
        }
    }
    info!(
        "Counted {} cooccurring cells over {} pairs",
        counts.nnz(),
        provenance.len()
    );
    Ok((counts, provenance))
}

/// In-memory `AᵀA` with the diagonal removed. Reference for [`accumulate`].
pub fn square(occurrences: &OccurrenceMatrix) -> CooccurrenceCounts {
    let mut counts = CooccurrenceCounts::new(occurrences.column_count());
    for (_, columns) in occurrences.iter_rows() {
        for &a in columns {
            for &b in columns {
                if a != b {
                    *counts.cells.entry(a.index(), b.index(), 0) += 1;
                }
            }
        }
    }
    counts
}
