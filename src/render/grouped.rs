use super::{category_label, format_compact, format_tick, value_range, Chart};
use crate::model::ChartKind;
use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;

/// One legend entry: a value per category, `None` where the group has no rows.
#[derive(Debug, Clone)]
pub(crate) struct Series {
    pub label: String,
    pub color: RGBColor,
    pub values: Vec<Option<f64>>,
}

/// Bars side by side per category, or one marked line per series.
pub(crate) struct GroupedChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub kind: ChartKind,
    pub categories: Vec<String>,
    pub series: Vec<Series>,
    /// `1.5M` / `2.0K` tick labels.
    pub compact_y: bool,
    pub size: (u32, u32),
}

const SLOT_WIDTH: f64 = 0.8;

impl GroupedChart {
    fn y_bounds(&self) -> (f64, f64) {
        let values = self.series.iter().flat_map(|s| s.values.iter().flatten().copied());
        let floor = match self.kind {
            ChartKind::Bar => Some(0.0),
            ChartKind::Line => None,
        };
        value_range(values, floor)
    }

    /// Horizontal extent of bar `series` at category `category`.
    fn bar_span(&self, category: usize, series: usize) -> (f64, f64) {
        let width = SLOT_WIDTH / self.series.len().max(1) as f64;
        let left = category as f64 - SLOT_WIDTH / 2.0 + series as f64 * width;
        (left, left + width)
    }
}

impl Chart for GroupedChart {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;
        let n = self.categories.len().max(1);
        let (y_lo, y_hi) = self.y_bounds();

        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, ("sans-serif", 24).into_font())
            .margin(15)
            .x_label_area_size(if self.categories.len() > 10 { 90 } else { 45 })
            .y_label_area_size(80)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), y_lo..y_hi)?;

        let x_style = if self.categories.len() > 10 {
            ("sans-serif", 12).into_font().transform(FontTransform::Rotate90)
        } else {
            ("sans-serif", 12).into_font()
        };
        let compact = |y: &f64| format_compact(*y);
        let plain = |y: &f64| format_tick(*y);
        let y_formatter: &dyn Fn(&f64) -> String = if self.compact_y { &compact } else { &plain };

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(self.x_label.as_str())
            .y_desc(self.y_label.as_str())
            .x_labels(n + 1)
            .x_label_style(x_style)
            .x_label_formatter(&|x| category_label(&self.categories, *x))
            .y_label_formatter(y_formatter)
            .draw()?;

        for (s_idx, series) in self.series.iter().enumerate() {
            let color = series.color;
            match self.kind {
                ChartKind::Bar => {
                    let bars = series.values.iter().enumerate().filter_map(|(c, v)| {
                        let v = (*v)?;
                        let (x0, x1) = self.bar_span(c, s_idx);
                        Some(Rectangle::new([(x0, 0.0), (x1, v)], color.mix(0.85).filled()))
                    });
                    chart
                        .draw_series(bars)?
                        .label(series.label.as_str())
                        .legend(move |(x, y)| {
                            Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled())
                        });
                }
                ChartKind::Line => {
                    let points: Vec<(f64, f64)> = series
                        .values
                        .iter()
                        .enumerate()
                        .filter_map(|(c, v)| v.map(|v| (c as f64, v)))
                        .collect();
                    chart
                        .draw_series(LineSeries::new(
                            points.iter().copied(),
                            color.stroke_width(2),
                        ))?
                        .label(series.label.as_str())
                        .legend(move |(x, y)| {
                            PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                        });
                    chart.draw_series(
                        points
                            .iter()
                            .map(|&(x, y)| Circle::new((x, y), 4, color.filled())),
                    )?;
                }
            }
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
