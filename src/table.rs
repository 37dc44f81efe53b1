// Tabular result handed to document renderers
// Every row has exactly one cell per column; enforced on push

use serde::Serialize;

use crate::error::RenderError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub title: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: AsRef<str>>(title: &str, columns: &[S]) -> Self {
        Table {
            title: title.to_string(),
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Rejected if its width differs from the column count.
    pub fn push_row(&mut self, cells: Vec<String>) -> Result<(), RenderError> {
        if cells.len() != self.columns.len() {
            return Err(RenderError::RowWidth {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: cells.len(),
            });
        }
        self.rows.push(cells);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
