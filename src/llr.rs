//! Log-likelihood ratio scoring of cooccurrence counts.
//!
//! Each non-zero cell `(i, j)` is turned into a 2×2 contingency table using the
//! row and column marginals of the cooccurrence matrix:
//!
//! |            | j present | j absent |
//! |------------|-----------|----------|
//! | i present  | `k11`     | `k12`    |
//! | i absent   | `k21`     | `k22`    |
//!
//! and scored with the signed root of Dunning's G² statistic, so large positive
//! values mean "together more often than chance", negative values mean "less".

use log::info;

use crate::cooccurrence::CooccurrenceCounts;
use crate::dictionary::{ColumnId, SymbolId};
use crate::error::{CoocError, Result};
use crate::sparse::SparseMatrix;

fn x_log_x(x: u64) -> f64 {
    if x == 0 {
        0.0
    } else {
        let x = x as f64;
        x * x.ln()
    }
}

/// Unnormalized Shannon entropy of a set of counts.
fn entropy(counts: &[u64]) -> f64 {
    let sum: u64 = counts.iter().sum();
    x_log_x(sum) - counts.iter().map(|&k| x_log_x(k)).sum::<f64>()
}

/// G² statistic for a 2×2 table. Never negative.
pub fn log_likelihood_ratio(k11: u64, k12: u64, k21: u64, k22: u64) -> f64 {
    let row_entropy = entropy(&[k11 + k12, k21 + k22]);
    let column_entropy = entropy(&[k11 + k21, k12 + k22]);
    let matrix_entropy = entropy(&[k11, k12, k21, k22]);
    if row_entropy + column_entropy < matrix_entropy {
        // round-off error
        0.0
    } else {
        2.0 * (row_entropy + column_entropy - matrix_entropy)
    }
}

fn rate(a: u64, b: u64) -> f64 {
    if a + b == 0 {
        0.0
    } else {
        a as f64 / (a + b) as f64
    }
}

/// Square root of [`log_likelihood_ratio`], negative when `k11` is rarer than
/// its marginals predict.
pub fn root_log_likelihood_ratio(k11: u64, k12: u64, k21: u64, k22: u64) -> f64 {
    let root = log_likelihood_ratio(k11, k12, k21, k22).sqrt();
    if rate(k11, k12) < rate(k21, k22) {
        -root
    } else {
        root
    }
}

/// The four cells of a contingency table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContingencyTable {
    pub k11: u64,
    pub k12: u64,
    pub k21: u64,
    pub k22: u64,
}

impl ContingencyTable {
    /// Derives the table of one cell from its count, marginals and the grand
    /// total. A negative cell means the marginals are inconsistent with the
    /// matrix and is reported as [`CoocError::NumericDomain`].
    pub fn new(k11: u64, row_sum: u64, column_sum: u64, total: u64) -> Result<Self> {
        let k11 = k11 as i128;
        let k12 = row_sum as i128 - k11;
        let k21 = column_sum as i128 - k11;
        let k22 = total as i128 - k11 - k12 - k21;
        if k11 < 0 || k12 < 0 || k21 < 0 || k22 < 0 {
            return Err(CoocError::NumericDomain { k11, k12, k21, k22 });
        }
        Ok(ContingencyTable {
            k11: k11 as u64,
            k12: k12 as u64,
            k21: k21 as u64,
            k22: k22 as u64,
        })
    }

    pub fn total(&self) -> u64 {
        self.k11 + self.k12 + self.k21 + self.k22
    }

    pub fn root_llr(&self) -> f64 {
        root_log_likelihood_ratio(self.k11, self.k12, self.k21, self.k22)
    }
}

/// Row sums, column sums and grand total of a cooccurrence matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marginals {
    pub row_sums: Vec<u64>,
    pub column_sums: Vec<u64>,
    pub total: u64,
}

impl Marginals {
    pub fn from_counts(counts: &CooccurrenceCounts) -> Self {
        let n = counts.dimension();
        let mut row_sums = vec![0u64; n];
        let mut column_sums = vec![0u64; n];
        for (i, row) in counts.cells.iter_rows() {
            for (&j, &v) in row {
                row_sums[i as usize] += v;
                column_sums[j as usize] += v;
            }
        }
        let total = row_sums.iter().sum();
        Marginals {
            row_sums,
            column_sums,
            total,
        }
    }

    pub fn table(&self, i: ColumnId, j: ColumnId, k11: u64) -> Result<ContingencyTable> {
        ContingencyTable::new(
            k11,
            self.row_sums[i.index() as usize],
            self.column_sums[j.index() as usize],
            self.total,
        )
    }
}

/// LLR scores for every non-zero cooccurrence cell.
#[derive(Debug, Clone)]
pub struct ScoredMatrix {
    cells: SparseMatrix<f64>,
}

impl ScoredMatrix {
    pub fn dimension(&self) -> usize {
        self.cells.row_count()
    }

    pub fn get(&self, a: ColumnId, b: ColumnId) -> Option<f64> {
        self.cells.get(a.index(), b.index())
    }

    pub fn row(&self, a: ColumnId) -> impl Iterator<Item = (ColumnId, f64)> + '_ {
        self.cells
            .row(a.index())
            .iter()
            .map(|(&j, &s)| (ColumnId(j), s))
    }

    pub fn nnz(&self) -> usize {
        self.cells.nnz()
    }
}

/// Replaces the counts with scores. The counts are consumed so a partially
/// scored matrix is never observable.
pub fn score(counts: CooccurrenceCounts) -> Result<ScoredMatrix> {
    info!("Starting sums");
    let marginals = Marginals::from_counts(&counts);
    info!(
        "Largest row sum = {}",
        marginals.row_sums.iter().max().copied().unwrap_or(0)
    );
    info!(
        "Largest column sum = {}",
        marginals.column_sums.iter().max().copied().unwrap_or(0)
    );

    info!("Scoring");
    let cells = counts.cells.try_map(|i, j, k11| {
        marginals
            .table(ColumnId(i), ColumnId(j), k11)
            .map(|t| t.root_llr())
    })?;
    Ok(ScoredMatrix { cells })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_llr_reference_values() {
        assert!(close(log_likelihood_ratio(1, 0, 0, 1), 2.772589, 1e-6));
        assert!(close(log_likelihood_ratio(10, 0, 0, 10), 27.72589, 1e-5));
        assert!(close(log_likelihood_ratio(5, 1995, 0, 100000), 39.33052, 1e-5));
        assert!(close(log_likelihood_ratio(1000, 1995, 1000, 100000), 4730.737, 1e-3));
        assert!(close(log_likelihood_ratio(1000, 1000, 1000, 100000), 5734.343, 1e-3));
        assert!(close(log_likelihood_ratio(1000, 1000, 1000, 99000), 5714.932, 1e-3));
    }

    #[test]
    fn test_independent_table_scores_zero() {
        assert_eq!(log_likelihood_ratio(1, 1, 1, 1), 0.0);
        assert_eq!(root_log_likelihood_ratio(5, 5, 5, 5), 0.0);
    }

    #[test]
    fn test_root_llr_sign_follows_direction() {
        let strong = root_log_likelihood_ratio(10, 10, 10, 1000);
        let weak = root_log_likelihood_ratio(10, 1000, 1000, 100);
        assert!(close(strong, 7.572544, 1e-5));
        assert!(close(weak, -46.24758, 1e-4));
        assert!(strong > weak);
    }

    #[test]
    fn test_contingency_table() {
        let t = ContingencyTable::new(3, 10, 7, 100).unwrap();
        assert_eq!(
            t,
            ContingencyTable {
                k11: 3,
                k12: 7,
                k21: 4,
                k22: 86
            }
        );
        assert_eq!(t.total(), 100);

        match ContingencyTable::new(5, 3, 7, 100) {
            Err(CoocError::NumericDomain { k12, .. }) => assert_eq!(k12, -2),
            other => panic!("expected NumericDomain, got {:?}", other),
        }
        assert!(matches!(
            ContingencyTable::new(5, 10, 10, 12),
            Err(CoocError::NumericDomain { .. })
        ));
    }

    #[test]
    fn test_marginals_and_scoring() {
        let mut counts = CooccurrenceCounts::new(3);
        for (a, b, v) in [(0, 1, 2u64), (1, 0, 2), (0, 2, 1), (2, 0, 1)] {
            counts.cells.set(a, b, v);
        }
        let m = Marginals::from_counts(&counts);
        assert_eq!(m.row_sums, vec![3, 2, 1]);
        assert_eq!(m.column_sums, vec![3, 2, 1]);
        assert_eq!(m.total, 6);

        let scored = score(counts).unwrap();
        assert_eq!(scored.nnz(), 4);
        assert_eq!(scored.dimension(), 3);
        let s01 = scored.get(ColumnId(0), ColumnId(1)).unwrap();
        let s10 = scored.get(ColumnId(1), ColumnId(0)).unwrap();
        assert!(close(s01, s10, 1e-12));
        assert!(scored.get(ColumnId(1), ColumnId(2)).is_none());
    }
}
