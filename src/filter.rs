use std::cmp::Ordering;

use log::info;

use crate::dictionary::{ColumnId, SymbolId};
use crate::llr::ScoredMatrix;

/// Which scored entries may appear in the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorePolicy {
    /// Drop entries scoring zero or below before ranking.
    PositiveOnly,
    /// Rank every entry regardless of sign.
    All,
}

impl ScorePolicy {
    fn admits(self, score: f64) -> bool {
        match self {
            ScorePolicy::PositiveOnly => score > 0.0,
            ScorePolicy::All => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelatedEntry {
    pub column: ColumnId,
    pub score: f64,
}

/// Highest score first; equal scores by ascending column id.
fn by_rank(a: &RelatedEntry, b: &RelatedEntry) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.column.cmp(&b.column))
}

/// The filtered result: for every column symbol, the related symbols that
/// survived, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedMatrix {
    rows: Vec<Vec<RelatedEntry>>,
}

impl RelatedMatrix {
    pub fn dimension(&self) -> usize {
        self.rows.len()
    }

    pub fn related(&self, column: ColumnId) -> &[RelatedEntry] {
        self.rows
            .get(column.index() as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, a: ColumnId, b: ColumnId) -> bool {
        self.related(a).iter().any(|e| e.column == b)
    }

    /// Total number of kept pairs.
    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows in id order, including empty ones.
    pub fn rows(&self) -> impl Iterator<Item = (ColumnId, &[RelatedEntry])> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, r)| (ColumnId(i as u32), r.as_slice()))
    }
}

/// Keeps the `max_related` best entries of every row.
pub fn filter_top_k(scored: &ScoredMatrix, max_related: usize, policy: ScorePolicy) -> RelatedMatrix {
    info!("Filtering");
    let mut rows = Vec::with_capacity(scored.dimension());
    for i in 0..scored.dimension() {
        let mut candidates: Vec<RelatedEntry> = scored
            .row(ColumnId(i as u32))
            .filter(|&(_, s)| policy.admits(s))
            .map(|(column, score)| RelatedEntry { column, score })
            .collect();
        candidates.sort_by(by_rank);
        candidates.truncate(max_related);
        rows.push(candidates);
    }
    let related = RelatedMatrix { rows };
    info!("Kept {} related pairs", related.len());
    related
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cooccurrence::CooccurrenceCounts;
    use crate::llr::score;

    #[test]
    fn test_rank_order_and_ties() {
        let mut v = vec![
            RelatedEntry { column: ColumnId(4), score: 1.0 },
            RelatedEntry { column: ColumnId(2), score: 3.0 },
            RelatedEntry { column: ColumnId(1), score: 1.0 },
            RelatedEntry { column: ColumnId(3), score: -2.0 },
        ];
        v.sort_by(by_rank);
        let order: Vec<u32> = v.iter().map(|e| e.column.0).collect();
        assert_eq!(order, vec![2, 1, 4, 3]);
    }

    fn star_counts() -> ScoredMatrix {
        // column 0 cooccurs with 1, 2, 3 with different strengths; 1 and 2 also pair.
        let mut counts = CooccurrenceCounts::new(5);
        for (a, b, v) in [(0, 1, 9u64), (0, 2, 3), (0, 3, 1), (1, 2, 1), (3, 4, 20)] {
            counts.cells.set(a, b, v);
            counts.cells.set(b, a, v);
        }
        score(counts).unwrap()
    }

    #[test]
    fn test_truncates_to_best() {
        let scored = star_counts();
        let related = filter_top_k(&scored, 1, ScorePolicy::All);
        for (row, entries) in related.rows() {
            assert!(entries.len() <= 1);
            let best = scored
                .row(row)
                .map(|(_, s)| s)
                .fold(f64::NEG_INFINITY, f64::max);
            if let Some(e) = entries.first() {
                assert_eq!(e.score, best);
            }
        }
    }

    #[test]
    fn test_positive_only_drops_non_positive() {
        let scored = star_counts();
        let all = filter_top_k(&scored, 10, ScorePolicy::All);
        let positive = filter_top_k(&scored, 10, ScorePolicy::PositiveOnly);
        assert_eq!(all.len(), scored.nnz());
        assert!(positive.len() <= all.len());
        for (_, entries) in positive.rows() {
            assert!(entries.iter().all(|e| e.score > 0.0));
        }
        // kept entries are a prefix of the unfiltered ranking
        for (row, entries) in positive.rows() {
            let full = all.related(row);
            assert_eq!(entries, &full[..entries.len()]);
        }
    }

    #[test]
    fn test_zero_max_related() {
        let related = filter_top_k(&star_counts(), 0, ScorePolicy::All);
        assert!(related.is_empty());
        assert_eq!(related.dimension(), 5);
    }
}
