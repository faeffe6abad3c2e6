//! Chart type and column selection.
//!
//! Without an explicit chart type the first matching rule wins:
//!
//! 1. one categorical + one numeric, cardinality within the pie limit → pie
//!    (bar when a categorical comparison is requested)
//! 2. a temporal column + numeric columns → line
//! 3. exactly two numeric columns, no categorical → scatter
//! 4. exactly three numeric columns → bubble; four up to the radar limit → radar
//! 5. one categorical with cardinality above the pie limit + numeric → bar,
//!    keeping the top categories and folding the rest into "Other"
//! 6. otherwise bar over the first label column (or row index) and the
//!    first numeric column

use std::collections::HashSet;

use crate::config::ChartRequest;
use crate::error::{InsightError, Result};
use crate::table::{Column, Table};
use crate::types::{ChartType, ColumnKind};

/// Resolved chart type plus the columns feeding it.
#[derive(Debug, Clone)]
pub(super) struct Selection<'a> {
    pub chart_type: ChartType,
    /// Label column; `None` labels by row index.
    pub x: Option<&'a Column>,
    /// Numeric value columns. Empty means "count rows per label".
    pub ys: Vec<&'a Column>,
    /// Fold labels past the category limit into "Other".
    pub truncate: bool,
}

impl<'a> Selection<'a> {
    fn new(chart_type: ChartType, x: Option<&'a Column>, ys: Vec<&'a Column>) -> Self {
        Self {
            chart_type,
            x,
            ys,
            truncate: false,
        }
    }

    fn truncated(mut self) -> Self {
        self.truncate = true;
        self
    }
}

pub(super) fn select<'a>(table: &'a Table, request: &ChartRequest) -> Result<Selection<'a>> {
    if table.column_count() == 0 {
        return Err(InsightError::ChartGeneration("table has no columns".to_string()));
    }

    let x = request
        .x_column
        .as_deref()
        .map(|name| table.try_column(name))
        .transpose()?;
    let ys = request
        .y_columns
        .iter()
        .map(|name| table.try_column(name))
        .collect::<Result<Vec<_>>>()?;
    if let Some(bad) = ys.iter().find(|c| c.kind() != ColumnKind::Numeric) {
        return Err(InsightError::UnsupportedColumnType {
            analyzer: "chart".to_string(),
            column: bad.name().to_string(),
            kind: bad.kind().to_string(),
        });
    }

    let all: Vec<&Column> = table.columns().iter().collect();
    let selection = match request.chart_type {
        Some(chart_type) => {
            let defaults = defaults_for(chart_type, &all, request);
            let x = x.or(defaults.x);
            let categorical_bar = chart_type == ChartType::Bar
                && x.is_some_and(|c| c.kind() == ColumnKind::Categorical);
            let selection =
                Selection::new(chart_type, x, if ys.is_empty() { defaults.ys } else { ys });
            if chart_type.is_circular() || categorical_bar {
                selection.truncated()
            } else {
                selection
            }
        }
        None if x.is_some() || !ys.is_empty() => {
            let subset: Vec<&Column> = x.into_iter().chain(ys).collect();
            auto_select(&subset, request)
        }
        None => auto_select(&all, request),
    };

    validate(&selection)?;
    Ok(selection)
}

/// Column-signature rules for automatic chart choice.
fn auto_select<'a>(columns: &[&'a Column], request: &ChartRequest) -> Selection<'a> {
    let nums = of_kind(columns, ColumnKind::Numeric);
    let cats = of_kind(columns, ColumnKind::Categorical);
    let temporal = of_kind(columns, ColumnKind::Temporal);

    let single_category = (cats.len() == 1).then(|| (cats[0], cardinality(cats[0])));

    if let Some((cat, card)) = single_category
        && nums.len() == 1
        && card <= request.pie_max_categories
    {
        let chart_type = if request.categorical_comparison {
            ChartType::Bar
        } else {
            ChartType::Pie
        };
        return Selection::new(chart_type, Some(cat), nums).truncated();
    }

    if let Some(time) = temporal.first()
        && !nums.is_empty()
    {
        return Selection::new(ChartType::Line, Some(time), nums);
    }

    if nums.len() == 2 && cats.is_empty() {
        return Selection::new(ChartType::Scatter, Some(nums[0]), vec![nums[1]]);
    }

    if nums.len() == 3 {
        return Selection::new(ChartType::Bubble, Some(nums[0]), nums[1..].to_vec());
    }
    if nums.len() > 3 && nums.len() <= request.radar_max_columns {
        return Selection::new(ChartType::Radar, cats.first().copied(), nums);
    }

    if let Some((cat, card)) = single_category
        && !nums.is_empty()
        && card > request.pie_max_categories
    {
        return Selection::new(ChartType::Bar, Some(cat), nums).truncated();
    }

    Selection::new(
        ChartType::Bar,
        label_column(columns, false),
        nums.into_iter().take(1).collect(),
    )
}

/// Columns for an explicitly requested chart type.
fn defaults_for<'a>(
    chart_type: ChartType,
    columns: &[&'a Column],
    request: &ChartRequest,
) -> Selection<'a> {
    let nums = of_kind(columns, ColumnKind::Numeric);

    let (x, ys): (Option<&Column>, Vec<&Column>) = match chart_type {
        ChartType::Scatter => (nums.first().copied(), nums.iter().skip(1).copied().collect()),
        ChartType::Bubble => (nums.first().copied(), nums.iter().skip(1).take(2).copied().collect()),
        ChartType::Radar => (
            label_column(columns, false),
            nums.iter().take(request.radar_max_columns).copied().collect(),
        ),
        ChartType::Pie | ChartType::Doughnut => {
            (label_column(columns, false), nums.into_iter().take(1).collect())
        }
        ChartType::Bar | ChartType::Line | ChartType::Area => {
            let prefer_time = chart_type != ChartType::Bar;
            match label_column(columns, prefer_time) {
                Some(label) => (Some(label), nums.into_iter().take(1).collect()),
                None if nums.len() >= 2 => (Some(nums[0]), nums[1..].to_vec()),
                None => (None, nums.into_iter().take(1).collect()),
            }
        }
    };
    Selection::new(chart_type, x, ys)
}

fn validate(selection: &Selection<'_>) -> Result<()> {
    let fail = |msg: String| -> Result<()> { Err(InsightError::ChartGeneration(msg)) };
    let numeric_x = selection.x.is_some_and(|c| c.kind() == ColumnKind::Numeric);

    match selection.chart_type {
        ChartType::Scatter if !numeric_x || selection.ys.is_empty() => {
            fail("scatter chart needs two numeric columns".to_string())
        }
        ChartType::Bubble if !numeric_x || selection.ys.len() < 2 => {
            fail("bubble chart needs three numeric columns".to_string())
        }
        chart_type if selection.x.is_none() && selection.ys.is_empty() => fail(format!(
            "{} needs a numeric or label column",
            chart_type.display_name()
        )),
        _ => Ok(()),
    }
}

fn of_kind<'a>(columns: &[&'a Column], kind: ColumnKind) -> Vec<&'a Column> {
    columns.iter().copied().filter(|c| c.kind() == kind).collect()
}

/// First non-numeric column usable for labels: categorical, then text,
/// then temporal (temporal first when `prefer_time`).
fn label_column<'a>(columns: &[&'a Column], prefer_time: bool) -> Option<&'a Column> {
    let order: &[ColumnKind] = if prefer_time {
        &[ColumnKind::Temporal, ColumnKind::Categorical, ColumnKind::Text]
    } else {
        &[ColumnKind::Categorical, ColumnKind::Text, ColumnKind::Temporal]
    };
    order
        .iter()
        .find_map(|kind| columns.iter().copied().find(|c| c.kind() == *kind))
}

fn cardinality(column: &Column) -> usize {
    column
        .as_strings()
        .map(|values| values.iter().flatten().collect::<HashSet<_>>().len())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn names(selection: &Selection<'_>) -> (Option<String>, Vec<String>) {
        (
            selection.x.map(|c| c.name().to_string()),
            selection.ys.iter().map(|c| c.name().to_string()).collect(),
        )
    }

    fn categories(n: usize) -> Column {
        Column::categorical("cat", (0..n).map(|i| format!("c{i}")))
    }

    fn nums(prefix: &str, count: usize, rows: usize) -> Vec<Column> {
        (0..count)
            .map(|j| Column::numeric(format!("{prefix}{j}"), (0..rows).map(|i| (i * (j + 1)) as f64)))
            .collect()
    }

    fn auto(table: &Table) -> Selection<'_> {
        select(table, &ChartRequest::default()).unwrap()
    }

    // ==================== Rule tests ====================

    #[test]
    fn test_rule_pie_for_small_category() {
        let table = Table::new(vec![categories(5), Column::numeric("v", [1.0; 5])]).unwrap();
        let selection = auto(&table);
        assert_eq!(selection.chart_type, ChartType::Pie);
        assert_eq!(names(&selection), (Some("cat".into()), vec!["v".into()]));

        let bar = select(&table, &ChartRequest::default().categorical_comparison(true)).unwrap();
        assert_eq!(bar.chart_type, ChartType::Bar);
    }

    #[test]
    fn test_rule_line_for_temporal() {
        let times = (0..4).map(|d| Some(Utc.with_ymd_and_hms(2024, 1, d + 1, 0, 0, 0).unwrap()));
        let mut columns = vec![Column::temporal("day", times)];
        columns.extend(nums("n", 2, 4));
        let table = Table::new(columns).unwrap();

        let selection = auto(&table);
        assert_eq!(selection.chart_type, ChartType::Line);
        assert_eq!(names(&selection).1.len(), 2);
    }

    #[test]
    fn test_rule_scatter_bubble_radar() {
        let scatter = Table::new(nums("n", 2, 5)).unwrap();
        assert_eq!(auto(&scatter).chart_type, ChartType::Scatter);

        let bubble = Table::new(nums("n", 3, 5)).unwrap();
        let selection = auto(&bubble);
        assert_eq!(selection.chart_type, ChartType::Bubble);
        assert_eq!(names(&selection), (Some("n0".into()), vec!["n1".into(), "n2".into()]));

        let radar = Table::new(nums("n", 5, 5)).unwrap();
        assert_eq!(auto(&radar).chart_type, ChartType::Radar);
    }

    #[test]
    fn test_rule_bar_for_large_category() {
        let table = Table::new(vec![categories(25), Column::numeric("v", [1.0; 25])]).unwrap();
        let selection = auto(&table);
        assert_eq!(selection.chart_type, ChartType::Bar);
        assert_eq!(names(&selection).0, Some("cat".into()));
        assert!(selection.truncate);
    }

    #[test]
    fn test_fallback_bar() {
        let mut columns = nums("n", 8, 4);
        columns.push(Column::text("notes", (0..4).map(|i| Some(format!("note {i}")))));
        let table = Table::new(columns).unwrap();

        let selection = auto(&table);
        assert_eq!(selection.chart_type, ChartType::Bar);
        assert_eq!(names(&selection), (Some("notes".into()), vec!["n0".into()]));
        assert!(!selection.truncate);
    }

    #[test]
    fn test_categorical_only_counts() {
        let table = Table::new(vec![categories(3)]).unwrap();
        let selection = auto(&table);
        assert_eq!(selection.chart_type, ChartType::Bar);
        assert!(selection.ys.is_empty());
    }

    // ==================== Explicit request tests ====================

    #[test]
    fn test_explicit_type_and_columns() {
        let table = Table::new(nums("n", 3, 5)).unwrap();
        let request = ChartRequest::default()
            .with_chart_type(ChartType::Line)
            .with_columns("n2", &["n0"]);
        let selection = select(&table, &request).unwrap();

        assert_eq!(selection.chart_type, ChartType::Line);
        assert_eq!(names(&selection), (Some("n2".into()), vec!["n0".into()]));
    }

    #[test]
    fn test_unknown_column_fails() {
        let table = Table::new(nums("n", 2, 3)).unwrap();
        let request = ChartRequest::default().with_columns("missing", &["n0"]);
        let err = select(&table, &request).unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }

    #[test]
    fn test_non_numeric_series_rejected() {
        let table = Table::new(vec![categories(3), Column::numeric("v", [1.0, 2.0, 3.0])]).unwrap();
        let request = ChartRequest::default().with_columns("v", &["cat"]);
        let err = select(&table, &request).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_COLUMN_TYPE");
    }

    #[test]
    fn test_bubble_needs_three_numeric() {
        let table = Table::new(nums("n", 2, 3)).unwrap();
        let request = ChartRequest::default().with_chart_type(ChartType::Bubble);
        let err = select(&table, &request).unwrap_err();
        assert_eq!(err.error_code(), "CHART_GENERATION_FAILED");
    }

    #[test]
    fn test_zero_columns_fails() {
        let err = select(&Table::default(), &ChartRequest::default()).unwrap_err();
        assert_eq!(err.error_code(), "CHART_GENERATION_FAILED");
    }
}
