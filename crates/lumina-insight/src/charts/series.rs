//! Turns a column [`Selection`] into labels and series.

use std::collections::HashMap;

use chrono::Timelike;

use super::PALETTE;
use super::signature::Selection;
use crate::config::ChartRequest;
use crate::table::Column;
use crate::types::{ChartPoint, ChartType, DataSeries};

const OTHER_LABEL: &str = "Other";
const COUNT_LABEL: &str = "count";

const BUBBLE_MIN_RADIUS: f64 = 3.0;
const BUBBLE_MAX_RADIUS: f64 = 20.0;

pub(super) fn color(index: usize) -> String {
    PALETTE[index % PALETTE.len()].to_string()
}

/// Labels and datasets for a selection over `row_count` rows.
pub(super) fn populate(
    selection: &Selection<'_>,
    row_count: usize,
    request: &ChartRequest,
) -> (Vec<String>, Vec<DataSeries>) {
    match selection.chart_type {
        ChartType::Scatter => (Vec::new(), scatter_series(selection)),
        ChartType::Bubble => (Vec::new(), bubble_series(selection)),
        chart_type => {
            let (labels, columns) = match selection.x {
                Some(x) => grouped(x, &selection.ys, row_count),
                None => by_row(&selection.ys, row_count),
            };
            let (labels, columns) = match category_limit(selection, request) {
                Some(limit) => top_categories(labels, columns, limit),
                None => (labels, columns),
            };
            let datasets = label_series(chart_type, selection, &labels, columns);
            (labels, datasets)
        }
    }
}

fn category_limit(selection: &Selection<'_>, request: &ChartRequest) -> Option<usize> {
    if !selection.truncate {
        return None;
    }
    match selection.chart_type {
        ChartType::Bar => Some(request.bar_top_categories),
        ChartType::Pie | ChartType::Doughnut => Some(request.pie_max_categories),
        _ => None,
    }
}

fn series_names(selection: &Selection<'_>) -> Vec<String> {
    if selection.ys.is_empty() {
        vec![COUNT_LABEL.to_string()]
    } else {
        selection.ys.iter().map(|c| c.name().to_string()).collect()
    }
}

fn label_series(
    chart_type: ChartType,
    selection: &Selection<'_>,
    labels: &[String],
    columns: Vec<Vec<Option<f64>>>,
) -> Vec<DataSeries> {
    series_names(selection)
        .into_iter()
        .zip(columns)
        .enumerate()
        .map(|(i, (label, data))| DataSeries {
            label,
            data,
            points: Vec::new(),
            color: color(i),
            slice_colors: if chart_type.is_circular() {
                (0..labels.len()).map(color).collect()
            } else {
                Vec::new()
            },
            fill: chart_type == ChartType::Area,
        })
        .collect()
}

/// Sums each value column per distinct label, labels in first-seen order.
///
/// Rows with a null label are dropped. With no value columns the single
/// series counts rows per label.
fn grouped(
    x: &Column,
    ys: &[&Column],
    row_count: usize,
) -> (Vec<String>, Vec<Vec<Option<f64>>>) {
    let width = ys.len().max(1);
    let date_only = is_date_only(x);

    let mut labels: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut sums: Vec<Vec<Option<f64>>> = vec![Vec::new(); width];

    for row in 0..row_count {
        let Some(label) = label_for(x, row, date_only) else {
            continue;
        };
        let slot = *positions.entry(label.clone()).or_insert_with(|| {
            labels.push(label);
            sums.iter_mut().for_each(|s| s.push(None));
            labels.len() - 1
        });

        if ys.is_empty() {
            add(&mut sums[0][slot], 1.0);
            continue;
        }
        for (series, y) in ys.iter().enumerate() {
            if let Some(value) = y.as_numeric().and_then(|v| v.get(row).copied().flatten()) {
                add(&mut sums[series][slot], value);
            }
        }
    }
    (labels, sums)
}

/// One label per row, named by row index.
fn by_row(ys: &[&Column], row_count: usize) -> (Vec<String>, Vec<Vec<Option<f64>>>) {
    let labels = (0..row_count).map(|i| i.to_string()).collect();
    let columns = ys
        .iter()
        .map(|y| y.as_numeric().map(<[_]>::to_vec).unwrap_or_default())
        .collect();
    (labels, columns)
}

fn add(slot: &mut Option<f64>, value: f64) {
    *slot = Some(slot.unwrap_or(0.0) + value);
}

fn is_date_only(column: &Column) -> bool {
    column.as_temporal().is_some_and(|values| {
        values
            .iter()
            .flatten()
            .all(|ts| ts.num_seconds_from_midnight() == 0 && ts.nanosecond() == 0)
    })
}

fn label_for(column: &Column, row: usize, date_only: bool) -> Option<String> {
    if date_only {
        let ts = column.as_temporal()?.get(row).copied().flatten()?;
        return Some(ts.format("%Y-%m-%d").to_string());
    }
    column.label_at(row)
}

/// Keeps the `limit` labels with the largest first-series value in
/// first-seen order, folding the rest into one trailing "Other" label.
fn top_categories(
    labels: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
    limit: usize,
) -> (Vec<String>, Vec<Vec<Option<f64>>>) {
    if labels.len() <= limit || limit == 0 {
        return (labels, columns);
    }

    let rank_key = |i: usize| {
        columns
            .first()
            .and_then(|c| c[i])
            .unwrap_or(f64::NEG_INFINITY)
    };
    let mut ranked: Vec<usize> = (0..labels.len()).collect();
    ranked.sort_by(|&a, &b| rank_key(b).total_cmp(&rank_key(a)));
    let mut keep = vec![false; labels.len()];
    for &i in ranked.iter().take(limit) {
        keep[i] = true;
    }

    let mut kept_labels: Vec<String> = labels
        .into_iter()
        .zip(&keep)
        .filter_map(|(label, &k)| k.then_some(label))
        .collect();
    kept_labels.push(OTHER_LABEL.to_string());

    let kept_columns = columns
        .into_iter()
        .map(|column| {
            let mut other: Option<f64> = None;
            let mut kept = Vec::with_capacity(limit + 1);
            for (value, &k) in column.into_iter().zip(&keep) {
                if k {
                    kept.push(value);
                } else if let Some(v) = value {
                    add(&mut other, v);
                }
            }
            kept.push(other);
            kept
        })
        .collect();

    (kept_labels, kept_columns)
}

fn numeric_at(column: &Column, row: usize) -> Option<f64> {
    column.as_numeric()?.get(row).copied().flatten()
}

fn scatter_series(selection: &Selection<'_>) -> Vec<DataSeries> {
    let Some(x) = selection.x else {
        return Vec::new();
    };
    selection
        .ys
        .iter()
        .enumerate()
        .map(|(i, y)| DataSeries {
            label: format!("{} vs {}", y.name(), x.name()),
            data: Vec::new(),
            points: (0..x.len())
                .filter_map(|row| {
                    Some(ChartPoint {
                        x: numeric_at(x, row)?,
                        y: numeric_at(y, row)?,
                        r: None,
                    })
                })
                .collect(),
            color: color(i),
            slice_colors: Vec::new(),
            fill: false,
        })
        .collect()
}

/// Bubble radius is the absolute third column rescaled into a fixed pixel range.
fn bubble_series(selection: &Selection<'_>) -> Vec<DataSeries> {
    let (Some(x), [y, size, ..]) = (selection.x, selection.ys.as_slice()) else {
        return Vec::new();
    };

    let rows: Vec<(f64, f64, f64)> = (0..x.len())
        .filter_map(|row| {
            let r = numeric_at(size, row)?.abs();
            Some((numeric_at(x, row)?, numeric_at(y, row)?, r))
        })
        .collect();

    let (lo, hi) = rows
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, _, r)| {
            (lo.min(r), hi.max(r))
        });
    let radius = |r: f64| {
        if hi > lo {
            BUBBLE_MIN_RADIUS + (r - lo) / (hi - lo) * (BUBBLE_MAX_RADIUS - BUBBLE_MIN_RADIUS)
        } else {
            (BUBBLE_MIN_RADIUS + BUBBLE_MAX_RADIUS) / 2.0
        }
    };

    vec![DataSeries {
        label: format!("{} vs {} (size: {})", y.name(), x.name(), size.name()),
        data: Vec::new(),
        points: rows
            .into_iter()
            .map(|(px, py, r)| ChartPoint {
                x: px,
                y: py,
                r: Some(radius(r)),
            })
            .collect(),
        color: color(0),
        slice_colors: Vec::new(),
        fill: false,
    }]
}
