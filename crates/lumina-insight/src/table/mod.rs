//! In-memory typed table shared by every analyzer.
//!
//! A [`Table`] is an immutable snapshot: columns are tagged with their kind
//! once, at construction, and analyzers pattern-match on [`ColumnData`]
//! instead of re-inferring types. All columns have the same length.

mod convert;

use chrono::{DateTime, Utc};

use crate::error::{InsightError, Result};
use crate::types::ColumnKind;

pub use convert::{clean_numeric_string, is_missing_marker, parse_numeric_string, parse_timestamp};

/// Values of one column. Nulls are `None`; non-finite floats are stored as nulls.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
    Temporal(Vec<Option<DateTime<Utc>>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Numeric(_) => ColumnKind::Numeric,
            Self::Categorical(_) => ColumnKind::Categorical,
            Self::Temporal(_) => ColumnKind::Temporal,
            Self::Text(_) => ColumnKind::Text,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(v) => v.len(),
            Self::Categorical(v) | Self::Text(v) => v.len(),
            Self::Temporal(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        match self {
            Self::Numeric(v) => v.iter().filter(|x| x.is_none()).count(),
            Self::Categorical(v) | Self::Text(v) => v.iter().filter(|x| x.is_none()).count(),
            Self::Temporal(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        let data = match data {
            ColumnData::Numeric(values) => ColumnData::Numeric(
                values
                    .into_iter()
                    .map(|v| v.filter(|x| x.is_finite()))
                    .collect(),
            ),
            other => other,
        };
        Self {
            name: name.into(),
            data,
        }
    }

    /// Numeric column without nulls.
    pub fn numeric(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(
            name,
            ColumnData::Numeric(values.into_iter().map(Some).collect()),
        )
    }

    pub fn numeric_opt(
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<f64>>,
    ) -> Self {
        Self::new(name, ColumnData::Numeric(values.into_iter().collect()))
    }

    /// Categorical column without nulls.
    pub fn categorical<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(
            name,
            ColumnData::Categorical(values.into_iter().map(|s| Some(s.into())).collect()),
        )
    }

    pub fn categorical_opt<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<S>>,
    ) -> Self {
        Self::new(
            name,
            ColumnData::Categorical(values.into_iter().map(|s| s.map(Into::into)).collect()),
        )
    }

    pub fn temporal(
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<DateTime<Utc>>>,
    ) -> Self {
        Self::new(name, ColumnData::Temporal(values.into_iter().collect()))
    }

    pub fn text<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<S>>,
    ) -> Self {
        Self::new(
            name,
            ColumnData::Text(values.into_iter().map(|s| s.map(Into::into)).collect()),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn kind(&self) -> ColumnKind {
        self.data.kind()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.data.null_count()
    }

    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match &self.data {
            ColumnData::Numeric(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&[Option<String>]> {
        match &self.data {
            ColumnData::Categorical(v) | ColumnData::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_temporal(&self) -> Option<&[Option<DateTime<Utc>>]> {
        match &self.data {
            ColumnData::Temporal(v) => Some(v),
            _ => None,
        }
    }

    /// Non-null numeric values paired with their row index.
    pub fn indexed_values(&self) -> Vec<(usize, f64)> {
        self.as_numeric()
            .map(|values| {
                values
                    .iter()
                    .enumerate()
                    .filter_map(|(i, v)| v.map(|x| (i, x)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Display label for one cell, used for chart labels and value counts.
    pub fn label_at(&self, row: usize) -> Option<String> {
        match &self.data {
            ColumnData::Numeric(v) => v.get(row).copied().flatten().map(format_number),
            ColumnData::Categorical(v) | ColumnData::Text(v) => v.get(row).cloned().flatten(),
            ColumnData::Temporal(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

/// Format a number without a trailing `.0` for integral values.
pub fn format_number(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{x}")
    }
}

/// Immutable, typed snapshot of one dataset version.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Build a table, rejecting unequal column lengths and duplicate names.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);

        for (i, column) in columns.iter().enumerate() {
            if column.len() != row_count {
                return Err(InsightError::InvalidTable(format!(
                    "column '{}' has {} rows, expected {}",
                    column.name,
                    column.len(),
                    row_count
                )));
            }
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(InsightError::InvalidTable(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }

        Ok(Self { columns, row_count })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn try_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| InsightError::ColumnNotFound(name.to_string()))
    }

    pub fn columns_of_kind(&self, kind: ColumnKind) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(move |c| c.kind() == kind)
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns_of_kind(ColumnKind::Numeric)
    }

    pub fn total_nulls(&self) -> usize {
        self.columns.iter().map(Column::null_count).sum()
    }

    /// Number of rows identical to an earlier row.
    pub fn duplicate_row_count(&self) -> usize {
        let mut seen = std::collections::HashSet::with_capacity(self.row_count);
        (0..self.row_count)
            .filter(|&row| !seen.insert(self.row_key(row)))
            .count()
    }

    fn row_key(&self, row: usize) -> Vec<Option<String>> {
        self.columns.iter().map(|c| c.label_at(row)).collect()
    }
}

static_assertions::assert_impl_all!(Table: Send, Sync);
