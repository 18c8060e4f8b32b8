//! Row-major dense feature matrix.

#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    n_rows: usize,
    n_cols: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    /// `data.len()` must equal `n_rows * n_cols`.
    pub fn from_row_major(n_rows: usize, n_cols: usize, data: Vec<f64>) -> Self {
        assert_eq!(
            data.len(),
            n_rows * n_cols,
            "matrix data length does not match {n_rows}x{n_cols}"
        );
        Self {
            n_rows,
            n_cols,
            data,
        }
    }

    /// Single-row matrix.
    pub fn from_row(row: Vec<f64>) -> Self {
        let n_cols = row.len();
        Self::from_row_major(1, n_cols, row)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn row(&self, index: usize) -> &[f64] {
        let start = index * self.n_cols;
        &self.data[start..start + self.n_cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.n_rows).map(move |i| self.row(i))
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n_cols + col]
    }

    /// Position of the first non-finite value, as `(row, col)`.
    pub fn first_non_finite(&self) -> Option<(usize, usize)> {
        self.data
            .iter()
            .position(|v| !v.is_finite())
            .map(|i| (i / self.n_cols, i % self.n_cols))
    }
}
