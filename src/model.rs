use crate::baseline::Baseline;
use crate::stats::DEFAULT_CONFIDENCE;
use crate::table::DerivedColumn;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Base name of the raw CSV inside a source directory (`<name>.csv`).
    pub raw_data_name: String,
    pub baseline_file: String,
    pub confidence: f64,
    pub derived: Vec<DerivedColumn>,
    pub search_attrs: Vec<SearchAttrs>,
    pub metrics: Vec<MetricSpec>,
    pub plots: Vec<PlotConfig>,
    pub unified_plots: Vec<PlotConfig>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            raw_data_name: "scheduleq".into(),
            baseline_file: "sequential.dat".into(),
            confidence: DEFAULT_CONFIDENCE,
            derived: vec![
                DerivedColumn::ratio(
                    "Event_Commitment_Ratio",
                    "Events_Processed",
                    "Events_Committed",
                ),
                DerivedColumn::sum("Total_Rollbacks", "Primary_Rollbacks", "Secondary_Rollbacks"),
                DerivedColumn::ratio(
                    "Event_Processing_Rate_(per_sec)",
                    "Events_Processed",
                    "Simulation_Runtime_(secs.)",
                ),
                DerivedColumn::baseline_ratio(
                    "Speedup_w.r.t._Sequential_Simulation",
                    "Simulation_Runtime_(secs.)",
                ),
            ],
            search_attrs: vec![
                SearchAttrs::new("Schedule_Queue_Count", "threads_vs_type_key_count_"),
                SearchAttrs::new("Schedule_Queue_Type", "threads_vs_count_key_type_"),
            ],
            metrics: vec![
                MetricSpec::new("Event_Processing_Rate_(per_sec)", 0.0, 1_000_000.0, 100_000.0),
                MetricSpec::new("Simulation_Runtime_(secs.)", 0.0, 150.0, 10.0),
                MetricSpec::new("Event_Commitment_Ratio", 1.0, 2.0, 0.1),
                MetricSpec::new("Speedup_w.r.t._Sequential_Simulation", 0.0, 10.0, 1.0),
            ],
            plots: vec![
                PlotConfig::new(
                    "Worker_Thread_Count",
                    "Simulation_Runtime_(secs.)",
                    "Thread count branch vs Simulation time",
                    ChartKind::Bar,
                    Agg::Mean,
                ),
                PlotConfig::new(
                    "Worker_Thread_Count",
                    "Events_Processed",
                    "Events Processed vs Worker Thread Count",
                    ChartKind::Line,
                    Agg::Sum,
                ),
                PlotConfig::new(
                    "Model",
                    "Average_Memory_Usage_(MB)",
                    "Average Memory Usage by Model and Queue Type",
                    ChartKind::Bar,
                    Agg::Mean,
                ),
            ],
            unified_plots: vec![
                PlotConfig::new(
                    "Worker_Thread_Count",
                    "Simulation_Runtime_(secs.)",
                    "Thread Count vs Simulation Time by Branch and Model",
                    ChartKind::Line,
                    Agg::Mean,
                ),
                PlotConfig::new(
                    "Worker_Thread_Count",
                    "Events_Processed",
                    "Events Processed vs Worker Thread Count by Branch and Model",
                    ChartKind::Line,
                    Agg::Sum,
                ),
                PlotConfig::new(
                    "Model",
                    "Average_Memory_Usage_(MB)",
                    "Average Memory Usage by Model and Branch",
                    ChartKind::Bar,
                    Agg::Mean,
                ),
            ],
        }
    }
}

/// One split of the statistics run. The grouping key is `groupby` followed by
/// `filter`; its first column is the chart x-axis and its second the line key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchAttrs {
    pub groupby: Vec<String>,
    pub filter: String,
    pub model: String,
    pub lpcount: String,
    /// File name prefix; the filter value is appended.
    pub output: String,
}

impl SearchAttrs {
    fn new(filter: &str, output: &str) -> Self {
        Self {
            groupby: vec!["Worker_Thread_Count".into(), "branch".into()],
            filter: filter.into(),
            model: "Model".into(),
            lpcount: "Number_of_Objects".into(),
            output: output.into(),
        }
    }

    pub fn key_columns(&self) -> Vec<String> {
        let mut cols = self.groupby.clone();
        cols.push(self.filter.clone());
        cols
    }
}

/// A metric to summarize, with the vertical frame its chart starts from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub name: String,
    pub ystart: f64,
    pub yend: f64,
    pub ytics: f64,
}

impl MetricSpec {
    fn new(name: &str, ystart: f64, yend: f64, ytics: f64) -> Self {
        Self {
            name: name.into(),
            ystart,
            yend,
            ytics,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Agg {
    Mean,
    Sum,
}

impl Agg {
    pub fn apply(self, values: &[f64]) -> f64 {
        let total: f64 = values.iter().sum();
        match self {
            Agg::Sum => total,
            Agg::Mean => total / values.len() as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotConfig {
    pub groupby: String,
    pub x: String,
    pub y: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub agg: Agg,
}

impl PlotConfig {
    fn new(x: &str, y: &str, title: &str, kind: ChartKind, agg: Agg) -> Self {
        Self {
            groupby: "branch".into(),
            x: x.into(),
            y: y.into(),
            title: title.into(),
            kind,
            agg,
        }
    }

    /// Title with spaces replaced, used as the chart file stem.
    pub fn file_stem(&self) -> String {
        self.title.replace(' ', "_")
    }
}

/// What a run produced, printed as text or JSON when it finishes.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub command: String,
    pub input: PathBuf,
    pub generated_utc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<Baseline>,
    pub summaries: Vec<PathBuf>,
    pub charts: Vec<PathBuf>,
    pub skipped: Vec<String>,
}

impl RunReport {
    pub fn new(command: &str, input: PathBuf) -> Self {
        Self {
            command: command.to_string(),
            input,
            generated_utc: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "now".into()),
            baseline: None,
            summaries: Vec::new(),
            charts: Vec::new(),
            skipped: Vec::new(),
        }
    }
}
