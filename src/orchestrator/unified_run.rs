//! Overlay charts across every source directory matched by a glob.

use super::discovery;
use crate::aggregate::{aggregate_by, sorted_unique, GroupedAggregate};
use crate::model::{AnalysisConfig, PlotConfig, RunReport};
use crate::render::{self, GroupedChart, ImageFormat, Series};
use crate::table::{SampleTable, Value};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// One matched directory: its name and the first CSV inside it.
struct Source {
    name: String,
    table: SampleTable,
}

pub(crate) fn run_unified(
    pattern: &str,
    cfg: &AnalysisConfig,
    format: ImageFormat,
) -> Result<RunReport> {
    let mut report = RunReport::new("unified", PathBuf::from(pattern));
    let sources = load_sources(pattern)?;
    if sources.is_empty() {
        anyhow::bail!("no source directories with CSV data match `{pattern}`");
    }

    let out_dir = discovery::pattern_parent(pattern);
    for plot in &cfg.unified_plots {
        let chart = overlay_chart(&sources, plot)?;
        let path = out_dir.join(format!("Unified_{}.{}", plot.file_stem(), format.extension()));
        render::render_to_file(&chart, &path, format)?;
        report.charts.push(path);
    }
    Ok(report)
}

fn load_sources(pattern: &str) -> Result<Vec<Source>> {
    let mut sources = Vec::new();
    for dir in discovery::glob_dirs(pattern)? {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());
        let Some(file) = discovery::csv_files_in(&dir)?.into_iter().next() else {
            tracing::warn!(dir = %dir.display(), "no CSV file, source skipped");
            continue;
        };
        let mut table = SampleTable::from_path(&file)
            .with_context(|| format!("failed to load {}", file.display()))?;
        table.set_constant("Model", Value::Text(name.clone()));
        tracing::info!(source = %name, path = %file.display(), rows = table.len(), "source loaded");
        sources.push(Source { name, table });
    }
    Ok(sources)
}

fn overlay_chart(sources: &[Source], plot: &PlotConfig) -> Result<GroupedChart> {
    let grouped = sources
        .iter()
        .map(|s| {
            aggregate_by(&s.table, &plot.groupby, &plot.x, &plot.y, plot.agg)
                .with_context(|| format!("plot `{}` for source `{}`", plot.title, s.name))
        })
        .collect::<Result<Vec<GroupedAggregate>>>()?;

    let categories = sorted_unique(grouped.iter().flat_map(|g| g.categories.iter().cloned()));
    let mut series = Vec::new();
    for (s_idx, (source, agg)) in sources.iter().zip(&grouped).enumerate() {
        for (g_idx, (group, values)) in agg.align_to(&categories).into_iter().enumerate() {
            series.push(Series {
                label: format!("{} - {}", source.name, group),
                color: render::band_color(s_idx, g_idx),
                values,
            });
        }
    }

    Ok(GroupedChart {
        title: plot.title.clone(),
        x_label: plot.x.clone(),
        y_label: plot.y.clone(),
        kind: plot.kind,
        categories,
        series,
        compact_y: true,
        size: (1600, 1000),
    })
}
