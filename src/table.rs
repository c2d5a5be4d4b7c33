//! In-memory sample table loaded from a headered CSV file.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("column `{0}` not found")]
    MissingColumn(String),
    #[error("column `{column}` row {row}: `{value}` is not numeric")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },
    #[error("formula `{0}` needs a sequential baseline time")]
    MissingBaseline(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// A single cell. Numbers keep their parsed value, anything else stays text.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Empty,
}

impl Value {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(n) => Value::Number(n),
            Err(_) => Value::Text(trimmed.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text form used for group keys, file names and output cells.
    pub fn display(&self) -> String {
        match self {
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
            Value::Empty => String::new(),
        }
    }
}

/// Shortest round-trip form; integral values print without a fraction.
pub fn format_number(n: f64) -> String {
    format!("{n}")
}

/// Ordering key that sorts integer-like labels numerically and everything else
/// as text, integers first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum NaturalKey {
    Int(i64),
    Text(String),
}

impl NaturalKey {
    pub fn of(label: &str) -> Self {
        match label.trim().parse::<i64>() {
            Ok(i) => NaturalKey::Int(i),
            Err(_) => NaturalKey::Text(label.to_string()),
        }
    }
}

pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    NaturalKey::of(a).cmp(&NaturalKey::of(b))
}

#[derive(Debug, Clone, Default)]
pub struct SampleTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl SampleTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, TableError> {
        let reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
        Self::from_reader(reader)
    }

    pub fn from_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Self, TableError> {
        let columns = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let mut table = Self::new(columns);
        // Non-flexible readers reject short or long records, so every row matches the header.
        for record in reader.records() {
            let record = record?;
            table.rows.push(record.iter().map(Value::parse).collect());
        }
        Ok(table)
    }

    #[cfg(test)]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Result<usize, TableError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    /// Every value of a column, which must be numeric in every row.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>, TableError> {
        let idx = self.column_index(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(row, values)| numeric_cell(name, row, &values[idx]))
            .collect()
    }

    /// Distinct values of a column in order of first appearance.
    pub fn unique(&self, name: &str) -> Result<Vec<Value>, TableError> {
        let idx = self.column_index(name)?;
        let mut out: Vec<Value> = Vec::new();
        for row in &self.rows {
            if !out.contains(&row[idx]) {
                out.push(row[idx].clone());
            }
        }
        Ok(out)
    }

    /// Rows whose `column` equals `value`, as a new table.
    pub fn filter_eq(&self, column: &str, value: &Value) -> Result<SampleTable, TableError> {
        let idx = self.column_index(column)?;
        Ok(SampleTable {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| &r[idx] == value)
                .cloned()
                .collect(),
        })
    }

    /// Append a column, replacing any existing column of the same name.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.columns.iter().position(|c| c == name) {
            Some(idx) => {
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row[idx] = v;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row.push(v);
                }
            }
        }
    }

    /// Constant-valued column, e.g. tagging rows with their source.
    pub fn set_constant(&mut self, name: &str, value: Value) {
        let values = vec![value; self.rows.len()];
        self.set_column(name, values);
    }
}

pub(crate) fn numeric_cell(column: &str, row: usize, value: &Value) -> Result<f64, TableError> {
    value.as_f64().ok_or_else(|| TableError::NonNumeric {
        column: column.to_string(),
        row,
        value: value.display(),
    })
}

/// A computed column. Division follows IEEE semantics: a zero denominator
/// yields an infinity or NaN rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedColumn {
    pub name: String,
    #[serde(flatten)]
    pub formula: Formula,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Formula {
    Ratio { numerator: String, denominator: String },
    Sum { left: String, right: String },
    Difference { left: String, right: String },
    /// Sequential baseline elapsed time divided by the column.
    BaselineRatio { column: String },
}

impl DerivedColumn {
    pub fn ratio(name: &str, numerator: &str, denominator: &str) -> Self {
        Self {
            name: name.to_string(),
            formula: Formula::Ratio {
                numerator: numerator.to_string(),
                denominator: denominator.to_string(),
            },
        }
    }

    pub fn sum(name: &str, left: &str, right: &str) -> Self {
        Self {
            name: name.to_string(),
            formula: Formula::Sum {
                left: left.to_string(),
                right: right.to_string(),
            },
        }
    }

    pub fn baseline_ratio(name: &str, column: &str) -> Self {
        Self {
            name: name.to_string(),
            formula: Formula::BaselineRatio {
                column: column.to_string(),
            },
        }
    }

    pub fn evaluate(
        &self,
        table: &SampleTable,
        baseline_time: Option<f64>,
    ) -> Result<Vec<Value>, TableError> {
        let values = match &self.formula {
            Formula::Ratio {
                numerator,
                denominator,
            } => elementwise(table, numerator, denominator, |a, b| a / b)?,
            Formula::Sum { left, right } => elementwise(table, left, right, |a, b| a + b)?,
            Formula::Difference { left, right } => {
                elementwise(table, left, right, |a, b| a - b)?
            }
            Formula::BaselineRatio { column } => {
                let base =
                    baseline_time.ok_or_else(|| TableError::MissingBaseline(self.name.clone()))?;
                table
                    .numeric_column(column)?
                    .into_iter()
                    .map(|v| base / v)
                    .collect()
            }
        };
        Ok(values.into_iter().map(Value::Number).collect())
    }
}

fn elementwise(
    table: &SampleTable,
    left: &str,
    right: &str,
    op: impl Fn(f64, f64) -> f64,
) -> Result<Vec<f64>, TableError> {
    let l = table.numeric_column(left)?;
    let r = table.numeric_column(right)?;
    Ok(l.into_iter().zip(r).map(|(a, b)| op(a, b)).collect())
}

/// Evaluate every formula in order; later formulas may reference earlier ones.
pub fn apply_derived(
    table: &mut SampleTable,
    derived: &[DerivedColumn],
    baseline_time: Option<f64>,
) -> Result<(), TableError> {
    for column in derived {
        let values = column.evaluate(table, baseline_time)?;
        table.set_column(&column.name, values);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(csv: &str) -> SampleTable {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(csv.as_bytes());
        SampleTable::from_reader(reader).unwrap()
    }

    #[test]
    fn parses_numbers_text_and_blanks() {
        let t = table("branch,Worker_Thread_Count,note\nmain,4,\nexp,8,x\n");
        assert_eq!(t.len(), 2);
        assert_eq!(t.rows()[0][0], Value::Text("main".into()));
        assert_eq!(t.rows()[0][1], Value::Number(4.0));
        assert_eq!(t.rows()[0][2], Value::Empty);
        assert_eq!(t.rows()[1][1].display(), "8");
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader("a,b\n1,2\n3\n".as_bytes());
        assert!(matches!(
            SampleTable::from_reader(reader),
            Err(TableError::Csv(_))
        ));
    }

    #[test]
    fn derives_commitment_ratio_and_total_rollbacks() {
        let mut t = table(
            "Events_Processed,Events_Committed,Primary_Rollbacks,Secondary_Rollbacks\n\
             150,100,3,4\n90,90,0,1\n",
        );
        apply_derived(
            &mut t,
            &[
                DerivedColumn::ratio(
                    "Event_Commitment_Ratio",
                    "Events_Processed",
                    "Events_Committed",
                ),
                DerivedColumn::sum("Total_Rollbacks", "Primary_Rollbacks", "Secondary_Rollbacks"),
            ],
            None,
        )
        .unwrap();
        assert_eq!(
            t.numeric_column("Event_Commitment_Ratio").unwrap(),
            vec![1.5, 1.0]
        );
        assert_eq!(t.numeric_column("Total_Rollbacks").unwrap(), vec![7.0, 1.0]);
    }

    #[test]
    fn zero_denominator_gives_ieee_results() {
        let mut t = table("a,b\n1,0\n0,0\n");
        apply_derived(&mut t, &[DerivedColumn::ratio("r", "a", "b")], None).unwrap();
        let r = t.numeric_column("r").unwrap();
        assert!(r[0].is_infinite());
        assert!(r[1].is_nan());
    }

    #[test]
    fn baseline_ratio_uses_sequential_time() {
        let mut t = table("Simulation_Runtime_(secs.)\n10\n20\n");
        let speedup =
            DerivedColumn::baseline_ratio("Speedup", "Simulation_Runtime_(secs.)");
        apply_derived(&mut t, std::slice::from_ref(&speedup), Some(40.0)).unwrap();
        assert_eq!(t.numeric_column("Speedup").unwrap(), vec![4.0, 2.0]);

        assert!(matches!(
            speedup.evaluate(&t, None),
            Err(TableError::MissingBaseline(_))
        ));
    }

    #[test]
    fn missing_source_column_fails() {
        let mut t = table("a\n1\n");
        let err = apply_derived(&mut t, &[DerivedColumn::ratio("r", "a", "nope")], None)
            .unwrap_err();
        assert!(matches!(err, TableError::MissingColumn(ref c) if c == "nope"));
    }

    #[test]
    fn unique_keeps_first_appearance_order() {
        let t = table("q\nsplay\nladder\nsplay\nstl\n");
        let names: Vec<String> = t.unique("q").unwrap().iter().map(Value::display).collect();
        assert_eq!(names, ["splay", "ladder", "stl"]);
    }

    #[test]
    fn natural_order_puts_integers_first_and_numeric() {
        let mut labels = vec!["16", "main", "2", "8", "alpha"];
        labels.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(labels, ["2", "8", "16", "alpha", "main"]);
    }

    #[test]
    fn formula_config_round_trips_through_json() {
        let json = r#"{"name":"Rate","op":"ratio","numerator":"E","denominator":"T"}"#;
        let parsed: DerivedColumn = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, DerivedColumn::ratio("Rate", "E", "T"));
    }
}
