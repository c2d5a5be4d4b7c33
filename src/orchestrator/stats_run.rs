//! Statistics pipeline for one source directory.
//!
//! `<dir>/sequential.dat` and `<dir>/<raw>.csv` go in; `<dir>/stats/<raw>/*.csv`
//! and `<dir>/plots/<raw>/*` come out. Both output trees are recreated per run.

use crate::aggregate::{summarize_groups, GroupedSummary};
use crate::baseline::Baseline;
use crate::model::{AnalysisConfig, RunReport, SearchAttrs};
use crate::render::{self, ErrorBarChart, ImageFormat};
use crate::storage;
use crate::table::{apply_derived, SampleTable, Value};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

struct OutputDirs {
    stats: PathBuf,
    plots: PathBuf,
}

pub(crate) fn run_stats(
    dir: &Path,
    cfg: &AnalysisConfig,
    format: ImageFormat,
) -> Result<RunReport> {
    if !dir.is_dir() {
        anyhow::bail!("Invalid path to source: {}", dir.display());
    }
    let mut report = RunReport::new("stats", dir.to_path_buf());

    // Both inputs are checked before anything is written.
    let baseline = Baseline::load(&dir.join(&cfg.baseline_file))?;
    let raw_path = dir.join(format!("{}.csv", cfg.raw_data_name));
    if !raw_path.is_file() {
        anyhow::bail!("{} raw data not available", cfg.raw_data_name.to_uppercase());
    }

    let mut table = SampleTable::from_path(&raw_path)
        .with_context(|| format!("failed to load {}", raw_path.display()))?;
    tracing::info!(path = %raw_path.display(), rows = table.len(), "raw data loaded");
    apply_derived(&mut table, &cfg.derived, Some(baseline.elapsed_secs))
        .context("failed to compute derived columns")?;

    let out = OutputDirs {
        stats: dir.join("stats").join(&cfg.raw_data_name),
        plots: dir.join("plots").join(&cfg.raw_data_name),
    };
    storage::reset_dir(&out.plots)?;
    storage::reset_dir(&out.stats)?;

    let metrics: Vec<String> = cfg.metrics.iter().map(|m| m.name.clone()).collect();
    for attrs in &cfg.search_attrs {
        let key_columns = attrs.key_columns();
        let model_name = first_value(&table, &attrs.model)?;
        let lp_count = first_value(&table, &attrs.lpcount)?;

        for filter_value in table.unique(&attrs.filter)? {
            let subset = table.filter_eq(&attrs.filter, &filter_value)?;
            let summary = summarize_groups(&subset, &key_columns, &metrics, cfg.confidence)?;
            for metric in &summary.skipped {
                let note = format!("{}{}: {metric}", attrs.output, filter_value.display());
                if !report.skipped.contains(&note) {
                    report.skipped.push(note);
                }
            }

            let file_name = format!("{}{}", attrs.output, filter_value.display());
            let csv_path = out.stats.join(format!("{file_name}.csv"));
            storage::write_csv_atomic(&csv_path, &summary.header(), summary.records())?;
            tracing::info!(
                path = %csv_path.display(),
                groups = summary.rows.len(),
                "summary written"
            );
            report.summaries.push(csv_path.clone());

            let charts = ChartContext {
                attrs,
                file_name: &file_name,
                filter_value: &filter_value,
                model_name: &model_name,
                lp_count: &lp_count,
            };
            charts.plot_stats(&csv_path, &out.plots, cfg, format, &mut report)?;
        }
    }

    report.baseline = Some(baseline);
    Ok(report)
}

fn first_value(table: &SampleTable, column: &str) -> Result<String> {
    Ok(table
        .unique(column)
        .with_context(|| format!("column `{column}` is required"))?
        .first()
        .map(Value::display)
        .unwrap_or_default())
}

struct ChartContext<'a> {
    attrs: &'a SearchAttrs,
    file_name: &'a str,
    filter_value: &'a Value,
    model_name: &'a str,
    lp_count: &'a str,
}

impl ChartContext<'_> {
    /// Read a summary CSV back and draw one error-bar chart per metric.
    fn plot_stats(
        &self,
        csv_path: &Path,
        plots_dir: &Path,
        cfg: &AnalysisConfig,
        format: ImageFormat,
        report: &mut RunReport,
    ) -> Result<()> {
        let (header, rows) = storage::read_csv(csv_path)?;
        let key_columns = self.attrs.key_columns();
        let (x_label, key_label) = (&key_columns[0], &key_columns[1]);

        for metric in &cfg.metrics {
            let data = match GroupedSummary::from_summary_csv(
                &header,
                &rows,
                x_label,
                key_label,
                &metric.name,
            ) {
                Ok(data) if !data.is_empty() => data,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(metric = %metric.name, "chart skipped: {e}");
                    continue;
                }
            };

            let chart = ErrorBarChart {
                title: format!(
                    "{} model with {} LPs",
                    self.model_name.to_uppercase(),
                    render::group_thousands(self.lp_count)
                ),
                subtitle: format!(
                    "{} = {} , key = {}",
                    self.attrs.filter,
                    self.filter_value.display().to_uppercase(),
                    key_label
                ),
                x_label: x_label.clone(),
                y_label: format!(
                    "{}_(C.I._=_{}%)",
                    metric.name,
                    crate::table::format_number((cfg.confidence * 1e4).round() / 1e2)
                ),
                data: &data,
                y_frame: Some((metric.ystart, metric.yend, metric.ytics)),
            };
            let path = plots_dir.join(format!(
                "{}_{}.{}",
                self.file_name,
                metric.name,
                format.extension()
            ));
            render::render_to_file(&chart, &path, format)?;
            report.charts.push(path);
        }
        Ok(())
    }
}
