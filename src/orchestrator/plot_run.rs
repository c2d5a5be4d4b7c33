//! Bar and line charts straight from one flat CSV, no confidence intervals.

use super::discovery;
use crate::aggregate::aggregate_by;
use crate::model::{AnalysisConfig, PlotConfig, RunReport};
use crate::render::{self, GroupedChart, ImageFormat, Series};
use crate::table::SampleTable;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub(crate) fn run_plot(
    file: &Path,
    cfg: &AnalysisConfig,
    format: ImageFormat,
) -> Result<RunReport> {
    let file = discovery::literal_file(file)?;
    let mut report = RunReport::new("plot", file.clone());

    let table = SampleTable::from_path(&file)
        .with_context(|| format!("failed to load {}", file.display()))?;
    tracing::info!(path = %file.display(), rows = table.len(), "data loaded");

    let out_dir = output_dir(&file);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    for plot in &cfg.plots {
        let chart = single_source_chart(&table, plot)?;
        let path = out_dir.join(format!("{}.{}", plot.file_stem(), format.extension()));
        render::render_to_file(&chart, &path, format)?;
        report.charts.push(path);
    }
    Ok(report)
}

/// `<dir of file>/output_plots`.
fn output_dir(file: &Path) -> PathBuf {
    file.parent()
        .unwrap_or_else(|| Path::new("."))
        .join("output_plots")
}

fn single_source_chart(table: &SampleTable, plot: &PlotConfig) -> Result<GroupedChart> {
    let grouped = aggregate_by(table, &plot.groupby, &plot.x, &plot.y, plot.agg)
        .with_context(|| format!("plot `{}`", plot.title))?;
    let series = grouped
        .groups
        .into_iter()
        .enumerate()
        .map(|(i, (label, values))| Series {
            label,
            color: render::deep_color(i),
            values,
        })
        .collect();
    Ok(GroupedChart {
        title: plot.title.clone(),
        x_label: plot.x.clone(),
        y_label: plot.y.clone(),
        kind: plot.kind,
        categories: grouped.categories,
        series,
        compact_y: false,
        size: (1200, 600),
    })
}
