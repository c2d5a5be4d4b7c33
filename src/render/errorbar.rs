use super::{category_label, deep_color, format_tick, humanize, value_range, Chart};
use crate::aggregate::GroupedSummary;
use crate::stats::StatKind;
use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;

/// Mean per x value with its confidence interval as error bars, one line per key.
pub(crate) struct ErrorBarChart<'a> {
    pub title: String,
    pub subtitle: String,
    pub x_label: String,
    pub y_label: String,
    pub data: &'a GroupedSummary,
    /// Configured `(start, end, tick step)`; widened to fit the data.
    pub y_frame: Option<(f64, f64, f64)>,
}

impl ErrorBarChart<'_> {
    fn y_bounds(&self) -> (f64, f64, usize) {
        let values = [StatKind::CiLower, StatKind::CiUpper, StatKind::Mean]
            .into_iter()
            .filter_map(|k| self.data.stats.get(&k))
            .flat_map(|m| m.values().flatten().copied());
        let (lo, hi) = value_range(values, None);
        match self.y_frame {
            Some((start, end, step)) if end > start => {
                let lo = lo.min(start);
                let hi = hi.max(end);
                let ticks = if step > 0.0 {
                    ((hi - lo) / step).round() as usize + 1
                } else {
                    10
                };
                (lo, hi, ticks.clamp(2, 25))
            }
            _ => (lo, hi, 10),
        }
    }
}

impl Chart for ErrorBarChart<'_> {
    fn size(&self) -> (u32, u32) {
        (1200, 900)
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;
        let area = root.titled(&humanize(&self.title), ("sans-serif", 24).into_font())?;
        let area = area.titled(&humanize(&self.subtitle), ("sans-serif", 18).into_font())?;

        let categories = self.data.x_categories();
        let n = categories.len().max(1);
        let (y_lo, y_hi, y_ticks) = self.y_bounds();

        let mut chart = ChartBuilder::on(&area)
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), y_lo..y_hi)?;

        chart
            .configure_mesh()
            .x_desc(humanize(&self.x_label))
            .y_desc(humanize(&self.y_label))
            .x_labels(n + 1)
            .x_label_formatter(&|x| category_label(&categories, *x))
            .y_labels(y_ticks)
            .y_label_formatter(&|y| format_tick(*y))
            .draw()?;

        for (idx, (key, xs)) in self.data.header.iter().enumerate() {
            let color = deep_color(idx);
            let means = self.data.values(StatKind::Mean, key);
            let lows = self.data.values(StatKind::CiLower, key);
            let highs = self.data.values(StatKind::CiUpper, key);

            let points: Vec<(f64, f64, f64, f64)> = xs
                .iter()
                .zip(means)
                .zip(lows.iter().zip(highs))
                .filter_map(|((x, &mean), (&lo, &hi))| {
                    let pos = categories.iter().position(|c| c == x)? as f64;
                    mean.is_finite().then_some((pos, mean, lo, hi))
                })
                .collect();
            if points.is_empty() {
                continue;
            }

            chart
                .draw_series(LineSeries::new(
                    points.iter().map(|&(x, y, _, _)| (x, y)),
                    color.stroke_width(2),
                ))?
                .label(key.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
            chart.draw_series(
                points
                    .iter()
                    .map(|&(x, y, _, _)| Circle::new((x, y), 4, color.filled())),
            )?;
            chart.draw_series(
                points
                    .iter()
                    .filter(|(_, _, lo, hi)| lo.is_finite() && hi.is_finite())
                    .map(|&(x, mean, lo, hi)| {
                        ErrorBar::new_vertical(x, lo, mean, hi, color.stroke_width(1), 10)
                    }),
            )?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .draw()?;
        Ok(())
    }
}
