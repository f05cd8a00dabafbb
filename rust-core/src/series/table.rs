//! Column lookup over tabular time series
//!
//! Loaders for the various simulation output formats live outside this
//! crate; they hand tables over through [`SampleTable`].

use crate::error::{Result, SpectralError};

/// One column of a table
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(values) => values.len(),
            Column::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric view of the column, `None` for text columns
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Column::Numeric(values) => Some(values.as_slice()),
            Column::Text(_) => None,
        }
    }
}

/// Named-column access to one data source
pub trait SampleTable {
    /// Number of rows
    fn row_count(&self) -> usize;

    /// Column by name, `None` if the table has no such column
    fn column(&self, name: &str) -> Option<&Column>;

    fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Look up the time and signal columns together.
    ///
    /// Fails with [`SpectralError::EmptyInput`] on an empty table,
    /// [`SpectralError::MissingColumns`] listing every absent name, and
    /// [`SpectralError::NonNumeric`] if either column holds text.
    fn numeric_pair(&self, time_column: &str, signal: &str) -> Result<(&[f64], &[f64])> {
        if self.is_empty() {
            return Err(SpectralError::EmptyInput);
        }

        let time = self.column(time_column);
        let values = self.column(signal);

        let (time, values) = match (time, values) {
            (Some(time), Some(values)) => (time, values),
            _ => {
                let missing = [(time_column, time.is_none()), (signal, values.is_none())]
                    .iter()
                    .filter(|(_, absent)| *absent)
                    .map(|(name, _)| name.to_string())
                    .collect();
                return Err(SpectralError::MissingColumns(missing));
            }
        };

        let time = time
            .as_numeric()
            .ok_or_else(|| SpectralError::NonNumeric(time_column.to_string()))?;
        let values = values
            .as_numeric()
            .ok_or_else(|| SpectralError::NonNumeric(signal.to_string()))?;

        Ok((time, values))
    }
}

/// In-memory table with columns kept in insertion order
#[derive(Debug, Clone, Default)]
pub struct DataTable {
    columns: Vec<(String, Column)>,
}

impl DataTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a column, builder style
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Self {
        self.insert(name, column);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, column: Column) {
        let name = name.into();
        match self.columns.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = column,
            None => self.columns.push((name, column)),
        }
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }
}

impl SampleTable for DataTable {
    fn row_count(&self) -> usize {
        self.columns.iter().map(|(_, c)| c.len()).max().unwrap_or(0)
    }

    fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, column)| column)
    }
}
