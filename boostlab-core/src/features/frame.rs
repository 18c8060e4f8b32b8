//! FeatureFrame — ordered, equal-length named columns — and its schema.

use crate::features::FeatureError;
use crate::model::DenseMatrix;
use serde::{Deserialize, Serialize};

/// Ordered column names shared by the training and inference paths.
///
/// The classifier consumes features positionally, so two schemas only match
/// when they list the same names in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// BLAKE3 fingerprint over the ordered column names.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for name in &self.columns {
            hasher.update(&(name.len() as u64).to_le_bytes());
            hasher.update(name.as_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }

    /// First position where the two schemas disagree, if any.
    pub fn first_difference(&self, other: &FeatureSchema) -> Option<usize> {
        let common = self.columns.len().min(other.columns.len());
        (0..common)
            .find(|&i| self.columns[i] != other.columns[i])
            .or_else(|| (self.columns.len() != other.columns.len()).then_some(common))
    }
}

/// Named numeric columns, all of the same length, in insertion order.
///
/// Row `i` of every column refers to the same trading day. Frames are never
/// reshaped in place: filtering and lag expansion build new frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureFrame {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    n_rows: usize,
}

impl FeatureFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from already-validated parts.
    pub(crate) fn from_parts(names: Vec<String>, columns: Vec<Vec<f64>>, n_rows: usize) -> Self {
        debug_assert_eq!(names.len(), columns.len());
        debug_assert!(columns.iter().all(|c| c.len() == n_rows));
        Self {
            names,
            columns,
            n_rows,
        }
    }

    /// Append a column. The first column fixes the row count.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), FeatureError> {
        let name = name.into();
        if self.names.iter().any(|n| *n == name) {
            return Err(FeatureError::DuplicateColumn(name));
        }
        if self.columns.is_empty() {
            self.n_rows = values.len();
        } else if values.len() != self.n_rows {
            return Err(FeatureError::ColumnLength {
                column: name,
                expected: self.n_rows,
                found: values.len(),
            });
        }
        self.names.push(name);
        self.columns.push(values);
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    pub fn column_at(&self, index: usize) -> &[f64] {
        &self.columns[index]
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    pub fn row(&self, index: usize) -> Vec<f64> {
        self.columns.iter().map(|c| c[index]).collect()
    }

    pub fn last_row(&self) -> Option<Vec<f64>> {
        self.n_rows.checked_sub(1).map(|i| self.row(i))
    }

    /// Per-row flag: true when no column holds NaN at that row.
    pub fn complete_rows(&self) -> Vec<bool> {
        (0..self.n_rows)
            .map(|i| self.columns.iter().all(|c| !c[i].is_nan()))
            .collect()
    }

    /// New frame keeping only rows whose mask entry is true.
    pub fn retain_rows(&self, mask: &[bool]) -> Result<FeatureFrame, FeatureError> {
        if mask.len() != self.n_rows {
            return Err(FeatureError::Alignment {
                features: self.n_rows,
                labels: mask.len(),
            });
        }
        let columns: Vec<Vec<f64>> = self
            .columns
            .iter()
            .map(|c| {
                c.iter()
                    .zip(mask)
                    .filter(|(_, keep)| **keep)
                    .map(|(&v, _)| v)
                    .collect()
            })
            .collect();
        let n_rows = mask.iter().filter(|&&keep| keep).count();
        Ok(Self::from_parts(self.names.clone(), columns, n_rows))
    }

    pub fn schema(&self) -> FeatureSchema {
        FeatureSchema::new(self.names.clone())
    }

    /// Row-major dense matrix in column order.
    pub fn to_matrix(&self) -> DenseMatrix {
        let n_cols = self.n_cols();
        let mut data = Vec::with_capacity(self.n_rows * n_cols);
        for i in 0..self.n_rows {
            data.extend(self.columns.iter().map(|c| c[i]));
        }
        DenseMatrix::from_row_major(self.n_rows, n_cols, data)
    }
}
