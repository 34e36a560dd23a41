//! Two-pass reading of the input: symbol frequencies first, then a
//! frequency-capped random sample of the occurrence relation.
//!
//! Pairwise expansion costs `O(k²)` per row, so the sample caps how often any
//! single row or column symbol can appear instead of capping the total number
//! of records.

use log::info;
use rand::Rng;

use crate::dictionary::{ColumnId, Dictionary, RowId, SymbolId};
use crate::error::{CoocError, Result};
use crate::input::InputSource;
use crate::progress::{Progress, unitize};

/// How the per-row and per-column sample rates combine into one acceptance
/// probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcceptPolicy {
    /// One draw against `min(row_rate, column_rate)`.
    #[default]
    Minimum,
    /// Two independent draws, so the record survives with
    /// `row_rate * column_rate`.
    Product,
}

impl AcceptPolicy {
    pub fn accept<R: Rng + ?Sized>(self, row_rate: f64, column_rate: f64, rng: &mut R) -> bool {
        match self {
            AcceptPolicy::Minimum => rng.random::<f64>() < row_rate.min(column_rate),
            AcceptPolicy::Product => {
                let row_ok = rng.random::<f64>() < row_rate;
                let column_ok = rng.random::<f64>() < column_rate;
                row_ok && column_ok
            }
        }
    }
}

/// Downsampling caps. `f64::INFINITY` turns a cap off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingCaps {
    pub max_row_count: f64,
    pub max_column_count: f64,
}

impl SamplingCaps {
    /// Checked constructor; see [`check_cap`].
    pub fn new(max_row_count: f64, max_column_count: f64) -> Result<Self> {
        let caps = SamplingCaps {
            max_row_count,
            max_column_count,
        };
        caps.validate()?;
        Ok(caps)
    }

    pub fn unlimited() -> Self {
        SamplingCaps {
            max_row_count: f64::INFINITY,
            max_column_count: f64::INFINITY,
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_cap("max_row_count", self.max_row_count)?;
        check_cap("max_column_count", self.max_column_count)?;
        Ok(())
    }
}

/// A cap must be greater than zero. NaN is rejected, `f64::INFINITY` is not.
pub fn check_cap(name: &'static str, value: f64) -> Result<f64> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(CoocError::InvalidCap { name, value })
    }
}

/// Fraction of a symbol's records to keep so it lands near `cap`.
pub fn sample_rate(cap: f64, tally: u64) -> f64 {
    if tally == 0 {
        return 1.0;
    }
    let tally = tally as f64;
    cap.min(tally) / tally
}

/// Result of the first pass: both dictionaries and per-id tallies.
#[derive(Debug, Clone, Default)]
pub struct FrequencyCounts {
    pub rows: Dictionary<RowId>,
    pub columns: Dictionary<ColumnId>,
    row_tally: Vec<u64>,
    column_tally: Vec<u64>,
    records: u64,
}

impl FrequencyCounts {
    /// First pass: intern every token and count how often each id occurs.
    pub fn count(input: &InputSource) -> Result<Self> {
        info!("Starting first pass");
        let mut counts = FrequencyCounts::default();
        let mut progress = Progress::new("Line");
        for record in input.records()? {
            let record = record?;
            progress.step();
            let row = counts.rows.intern(&record.row)?;
            let column = counts.columns.intern(&record.column)?;
            bump(&mut counts.row_tally, row.index());
            bump(&mut counts.column_tally, column.index());
            counts.records += 1;
        }
        info!("Read {} lines", unitize(progress.count()));
        if !counts.rows.is_empty() {
            info!(
                "Average non-zeros per row {:.2}",
                counts.records as f64 / counts.rows.len() as f64
            );
        }
        Ok(counts)
    }

    pub fn row_tally(&self, row: RowId) -> u64 {
        self.row_tally.get(row.index() as usize).copied().unwrap_or(0)
    }

    pub fn column_tally(&self, column: ColumnId) -> u64 {
        self.column_tally
            .get(column.index() as usize)
            .copied()
            .unwrap_or(0)
    }

    pub fn records(&self) -> u64 {
        self.records
    }
}

fn bump(tally: &mut Vec<u64>, index: u32) {
    let index = index as usize;
    if index >= tally.len() {
        tally.resize(index + 1, 0);
    }
    tally[index] += 1;
}

/// Observability counters from the second pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStats {
    pub seen: u64,
    pub retained: u64,
    /// Smallest acceptance rate computed for any record; 1.0 for empty input.
    pub min_sample_rate: f64,
}

/// Sparse binary occurrence relation: for each row, the column ids kept by
/// the sample.
#[derive(Debug, Clone)]
pub struct OccurrenceMatrix {
    rows: Vec<Vec<ColumnId>>,
    columns: usize,
}

impl OccurrenceMatrix {
    pub fn new(rows: usize, columns: usize) -> Self {
        OccurrenceMatrix {
            rows: vec![Vec::new(); rows],
            columns,
        }
    }

    pub fn insert(&mut self, row: RowId, column: ColumnId) {
        self.rows[row.index() as usize].push(column);
    }

    /// Sorts every row and collapses repeated columns into one membership.
    pub fn seal(&mut self) {
        for row in &mut self.rows {
            row.sort_unstable();
            row.dedup();
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns
    }

    pub fn row(&self, row: RowId) -> &[ColumnId] {
        &self.rows[row.index() as usize]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = (RowId, &[ColumnId])> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, cols)| (RowId(i as u32), cols.as_slice()))
    }

    pub fn nnz(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn row_sums(&self) -> Vec<usize> {
        self.rows.iter().map(Vec::len).collect()
    }

    pub fn column_sums(&self) -> Vec<usize> {
        let mut sums = vec![0; self.columns];
        for row in &self.rows {
            for c in row {
                sums[c.index() as usize] += 1;
            }
        }
        sums
    }
}

/// Second pass: re-reads `input` and keeps each record with a probability that
/// caps every symbol's expected count.
///
/// The input must replay the same records as during [`FrequencyCounts::count`].
pub fn downsample<R: Rng + ?Sized>(
    input: &InputSource,
    counts: &FrequencyCounts,
    caps: SamplingCaps,
    policy: AcceptPolicy,
    rng: &mut R,
) -> Result<(OccurrenceMatrix, SampleStats)> {
    caps.validate()?;
    info!("Starting second pass");
    let mut occurrences = OccurrenceMatrix::new(counts.rows.len(), counts.columns.len());
    let mut progress = Progress::new("Line");
    let mut stats = SampleStats {
        seen: 0,
        retained: 0,
        min_sample_rate: 1.0,
    };

    for record in input.records()? {
        let record = record?;
        progress.step();
        let (Some(row), Some(column)) = (
            counts.rows.get(&record.row),
            counts.columns.get(&record.column),
        ) else {
            return Err(CoocError::InputChanged { line: record.line });
        };

        let row_rate = sample_rate(caps.max_row_count, counts.row_tally(row));
        let column_rate = sample_rate(caps.max_column_count, counts.column_tally(column));
        stats.min_sample_rate = stats.min_sample_rate.min(row_rate.min(column_rate));

        if policy.accept(row_rate, column_rate, rng) {
            occurrences.insert(row, column);
            stats.retained += 1;
        }
        stats.seen += 1;
    }
    occurrences.seal();

    info!("Done with second pass");
    info!("Retained {} / {} elements", stats.retained, stats.seen);
    info!("Minimum sample factor {}", stats.min_sample_rate);
    Ok((occurrences, stats))
}
