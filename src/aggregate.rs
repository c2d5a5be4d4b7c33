//! Grouping and per-group statistics.
//!
//! Metric errors do not abort a run. A metric whose column is missing is
//! dropped from the table, and a group whose samples cannot be summarized
//! gets empty cells for that metric.

use crate::model::Agg;
use crate::stats::{self, StatKind, Summary};
use crate::table::{
    format_number, natural_cmp, numeric_cell, NaturalKey, SampleTable, TableError,
};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Display values of the key columns for one group.
pub type GroupKey = Vec<String>;

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub key: GroupKey,
    /// One entry per metric of the table; `None` where the metric failed.
    pub cells: Vec<Option<Summary>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTable {
    pub key_columns: Vec<String>,
    pub metrics: Vec<String>,
    pub rows: Vec<SummaryRow>,
    /// Metrics dropped because their column was absent.
    pub skipped: Vec<String>,
}

impl SummaryTable {
    pub fn header(&self) -> Vec<String> {
        let mut header = self.key_columns.clone();
        for metric in &self.metrics {
            header.extend(StatKind::ALL.iter().map(|k| k.column_name(metric)));
        }
        header
    }

    pub fn records(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.rows.iter().map(|row| {
            let mut record = row.key.clone();
            for cell in &row.cells {
                match cell {
                    Some(summary) => record
                        .extend(StatKind::ALL.iter().map(|k| format_number(summary.get(*k)))),
                    None => record
                        .extend(std::iter::repeat(String::new()).take(StatKind::ALL.len())),
                }
            }
            record
        })
    }
}

/// Output row order: the second key column as plain text, then the first key
/// column in natural order (integers numerically), then any remaining columns.
pub fn group_order(a: &[String], b: &[String]) -> Ordering {
    let second = |k: &[String]| k.get(1).cloned();
    second(a)
        .cmp(&second(b))
        .then_with(|| match (a.first(), b.first()) {
            (Some(x), Some(y)) => natural_cmp(x, y),
            _ => Ordering::Equal,
        })
        .then_with(|| a.get(2..).cmp(&b.get(2..)))
}

/// Partition `table` by `key_columns` and summarize every metric per group.
pub fn summarize_groups(
    table: &SampleTable,
    key_columns: &[String],
    metrics: &[String],
    confidence: f64,
) -> Result<SummaryTable, TableError> {
    let key_idx = key_columns
        .iter()
        .map(|c| table.column_index(c))
        .collect::<Result<Vec<_>, _>>()?;

    let mut groups: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();
    for (i, row) in table.rows().iter().enumerate() {
        let key = key_idx.iter().map(|&k| row[k].display()).collect();
        groups.entry(key).or_default().push(i);
    }
    let mut groups: Vec<(GroupKey, Vec<usize>)> = groups.into_iter().collect();
    groups.sort_by(|(a, _), (b, _)| group_order(a, b));

    let mut kept = Vec::new();
    let mut skipped = Vec::new();
    let mut columns: Vec<Vec<Option<Summary>>> = Vec::new();
    for metric in metrics {
        let idx = match table.column_index(metric) {
            Ok(idx) => idx,
            Err(e) => {
                tracing::warn!(metric = %metric, "Error processing metric: {e}");
                skipped.push(metric.clone());
                continue;
            }
        };
        let cells = groups
            .iter()
            .map(|(key, rows)| {
                let samples = rows
                    .iter()
                    .map(|&r| numeric_cell(metric, r, &table.rows()[r][idx]))
                    .collect::<Result<Vec<f64>, _>>()
                    .map_err(|e| e.to_string())
                    .and_then(|s| stats::summarize(&s, confidence).map_err(|e| e.to_string()));
                match samples {
                    Ok(summary) => Some(summary),
                    Err(e) => {
                        tracing::warn!(
                            metric = %metric,
                            group = ?key,
                            "Error processing metric: {e}"
                        );
                        None
                    }
                }
            })
            .collect();
        kept.push(metric.clone());
        columns.push(cells);
    }

    let rows = groups
        .into_iter()
        .enumerate()
        .map(|(g, (key, _))| SummaryRow {
            key,
            cells: columns.iter().map(|c| c[g]).collect(),
        })
        .collect();

    Ok(SummaryTable {
        key_columns: key_columns.to_vec(),
        metrics: kept,
        rows,
        skipped,
    })
}

/// Summary statistics for one metric, reshaped for charting: each line key
/// maps to its x values and, per statistic, the parallel y values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedSummary {
    pub header: BTreeMap<String, Vec<String>>,
    pub stats: BTreeMap<StatKind, BTreeMap<String, Vec<f64>>>,
}

impl GroupedSummary {
    /// Build from a summary CSV read back from disk.
    pub fn from_summary_csv(
        header: &[String],
        rows: &[Vec<String>],
        x_label: &str,
        key_label: &str,
        metric: &str,
    ) -> Result<Self, TableError> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| TableError::MissingColumn(name.to_string()))
        };
        let x_idx = find(x_label)?;
        let k_idx = find(key_label)?;
        let stat_idx = StatKind::ALL
            .iter()
            .map(|k| find(&k.column_name(metric)).map(|i| (*k, i)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut sorted: Vec<&Vec<String>> = rows.iter().collect();
        sorted.sort_by(|a, b| natural_cmp(&a[x_idx], &b[x_idx]));
        sorted.sort_by(|a, b| a[k_idx].cmp(&b[k_idx]));

        let mut out = GroupedSummary::default();
        for row in sorted {
            let key = row[k_idx].clone();
            out.header
                .entry(key.clone())
                .or_default()
                .push(row[x_idx].clone());
            for (kind, idx) in &stat_idx {
                let value = row[*idx].trim().parse::<f64>().unwrap_or(f64::NAN);
                out.stats
                    .entry(*kind)
                    .or_default()
                    .entry(key.clone())
                    .or_default()
                    .push(value);
            }
        }
        Ok(out)
    }

    /// Every distinct x value across lines, in natural order.
    pub fn x_categories(&self) -> Vec<String> {
        sorted_unique(self.header.values().flatten().cloned())
    }

    pub fn values(&self, kind: StatKind, key: &str) -> &[f64] {
        self.stats
            .get(&kind)
            .and_then(|m| m.get(key))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }
}

/// `groupby([group, x])[y].agg(..)` over a flat table.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedAggregate {
    /// X values in natural order.
    pub categories: Vec<String>,
    /// Group label and its aggregate at each category, `None` where absent.
    pub groups: Vec<(String, Vec<Option<f64>>)>,
}

pub fn aggregate_by(
    table: &SampleTable,
    group_col: &str,
    x_col: &str,
    y_col: &str,
    agg: Agg,
) -> Result<GroupedAggregate, TableError> {
    let g_idx = table.column_index(group_col)?;
    let x_idx = table.column_index(x_col)?;
    let y_idx = table.column_index(y_col)?;

    let mut cells: BTreeMap<(String, String), Vec<f64>> = BTreeMap::new();
    for (i, row) in table.rows().iter().enumerate() {
        let y = numeric_cell(y_col, i, &row[y_idx])?;
        cells
            .entry((row[g_idx].display(), row[x_idx].display()))
            .or_default()
            .push(y);
    }

    let categories = sorted_unique(cells.keys().map(|(_, x)| x.clone()));
    let labels = sorted_unique(cells.keys().map(|(g, _)| g.clone()));
    let groups = labels
        .into_iter()
        .map(|g| {
            let values = categories
                .iter()
                .map(|x| cells.get(&(g.clone(), x.clone())).map(|v| agg.apply(v)))
                .collect();
            (g, values)
        })
        .collect();
    Ok(GroupedAggregate { categories, groups })
}

impl GroupedAggregate {
    /// Re-index every group onto a wider category list.
    pub fn align_to(&self, categories: &[String]) -> Vec<(String, Vec<Option<f64>>)> {
        self.groups
            .iter()
            .map(|(label, values)| {
                let aligned = categories
                    .iter()
                    .map(|c| {
                        self.categories
                            .iter()
                            .position(|own| own == c)
                            .and_then(|i| values[i])
                    })
                    .collect();
                (label.clone(), aligned)
            })
            .collect()
    }
}

pub fn sorted_unique(labels: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = labels.collect();
    out.sort_by(|a, b| NaturalKey::of(a).cmp(&NaturalKey::of(b)).then_with(|| a.cmp(b)));
    out.dedup();
    out
}
