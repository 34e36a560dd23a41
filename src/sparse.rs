use std::collections::HashMap;

/// Row-major sparse matrix: one hash map per row, absent cells are zero.
///
/// Only the cells that have been set are stored, so a row with no entries
/// costs an empty map.
#[derive(Debug, Clone)]
pub struct SparseMatrix<V> {
    rows: Vec<HashMap<u32, V>>,
    columns: usize,
}

impl<V: Copy> SparseMatrix<V> {
    pub fn new(rows: usize, columns: usize) -> Self {
        SparseMatrix {
            rows: (0..rows).map(|_| HashMap::new()).collect(),
            columns,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns
    }

    pub fn get(&self, row: u32, column: u32) -> Option<V> {
        self.rows
            .get(row as usize)
            .and_then(|r| r.get(&column))
            .copied()
    }

    pub fn set(&mut self, row: u32, column: u32, value: V) {
        debug_assert!((column as usize) < self.columns);
        self.rows[row as usize].insert(column, value);
    }

    /// Mutable access to a cell, inserting `default` first if it is absent.
    pub fn entry(&mut self, row: u32, column: u32, default: V) -> &mut V {
        debug_assert!((column as usize) < self.columns);
        self.rows[row as usize].entry(column).or_insert(default)
    }

    pub fn row(&self, row: u32) -> &HashMap<u32, V> {
        &self.rows[row as usize]
    }

    /// Rows with their index, in index order.
    pub fn iter_rows(&self) -> impl Iterator<Item = (u32, &HashMap<u32, V>)> + '_ {
        self.rows.iter().enumerate().map(|(i, r)| (i as u32, r))
    }

    /// Number of stored cells.
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(HashMap::len).sum()
    }

    /// Builds a matrix of the same shape by mapping every stored cell.
    pub fn try_map<W: Copy, E>(
        &self,
        mut f: impl FnMut(u32, u32, V) -> Result<W, E>,
    ) -> Result<SparseMatrix<W>, E> {
        let mut rows = Vec::with_capacity(self.rows.len());
        for (i, row) in self.iter_rows() {
            let mut mapped = HashMap::with_capacity(row.len());
            for (&j, &v) in row {
                mapped.insert(j, f(i, j, v)?);
            }
            rows.push(mapped);
        }
        Ok(SparseMatrix {
            rows,
            columns: self.columns,
        })
    }
}
