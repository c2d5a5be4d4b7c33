//! Text summary builder for CLI output.

use crate::model::RunReport;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

pub(crate) fn build_text_summary(report: &RunReport) -> TextSummary {
    let mut lines = vec![format!(
        "{}: {} ({})",
        report.command,
        report.input.display(),
        report.generated_utc
    )];

    if let Some(baseline) = report.baseline.as_ref() {
        lines.push(format!(
            "Sequential baseline: {} objects, run {}, {} s",
            baseline.object_count,
            baseline.run_id,
            crate::table::format_number(baseline.elapsed_secs)
        ));
    }
    for path in &report.summaries {
        lines.push(format!("Summary: {}", path.display()));
    }
    for path in &report.charts {
        lines.push(format!("Chart: {}", path.display()));
    }
    for note in &report.skipped {
        lines.push(format!("Skipped metric: {note}"));
    }
    lines.push(format!(
        "{} summaries, {} charts",
        report.summaries.len(),
        report.charts.len()
    ));

    TextSummary { lines }
}
