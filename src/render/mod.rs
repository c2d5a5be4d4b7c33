//! Chart rendering to image files.
//!
//! Charts are drawn through plotters onto an SVG backend, or a bitmap backend
//! when built with the `png` feature.

mod errorbar;
mod grouped;

pub(crate) use errorbar::ErrorBarChart;
pub(crate) use grouped::{GroupedChart, Series};

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ImageFormat {
    Svg,
    Png,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Svg => "svg",
            ImageFormat::Png => "png",
        }
    }
}

/// Something that can paint itself onto any plotters backend.
pub(crate) trait Chart {
    fn size(&self) -> (u32, u32);

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB::ErrorType: 'static;
}

pub(crate) fn render_to_file<C: Chart>(chart: &C, path: &Path, format: ImageFormat) -> Result<()> {
    match format {
        ImageFormat::Svg => {
            let root = SVGBackend::new(path, chart.size()).into_drawing_area();
            chart.draw(&root)?;
            root.present()?;
        }
        #[cfg(feature = "png")]
        ImageFormat::Png => {
            let root = BitMapBackend::new(path, chart.size()).into_drawing_area();
            chart.draw(&root)?;
            root.present()?;
        }
        #[cfg(not(feature = "png"))]
        ImageFormat::Png => {
            anyhow::bail!("PNG output requires building with the `png` feature");
        }
    }
    tracing::info!(path = %path.display(), "chart written");
    Ok(())
}

/// seaborn "deep", used for one line per group.
pub(crate) const DEEP: [RGBColor; 10] = [
    RGBColor(0x4C, 0x72, 0xB0),
    RGBColor(0xDD, 0x84, 0x52),
    RGBColor(0x55, 0xA8, 0x68),
    RGBColor(0xC4, 0x4E, 0x52),
    RGBColor(0x81, 0x72, 0xB3),
    RGBColor(0x93, 0x78, 0x60),
    RGBColor(0xDA, 0x8B, 0xC3),
    RGBColor(0x8C, 0x8C, 0x8C),
    RGBColor(0xCC, 0xB9, 0x74),
    RGBColor(0x64, 0xB5, 0xCD),
];

/// Light palette split into two-colour bands, one band per overlaid source.
pub(crate) const BANDS: [RGBColor; 8] = [
    RGBColor(0xFF, 0x99, 0x99),
    RGBColor(0x66, 0xB3, 0xFF),
    RGBColor(0x99, 0xFF, 0x99),
    RGBColor(0xFF, 0xCC, 0x99),
    RGBColor(0xFF, 0x99, 0xCC),
    RGBColor(0x99, 0xFF, 0xFF),
    RGBColor(0xFF, 0x99, 0xFF),
    RGBColor(0xFF, 0xFF, 0x99),
];

pub(crate) fn deep_color(index: usize) -> RGBColor {
    DEEP[index % DEEP.len()]
}

/// Colour of group `group` within source `source`'s band.
pub(crate) fn band_color(source: usize, group: usize) -> RGBColor {
    BANDS[(source * 2 + group % 2) % BANDS.len()]
}

/// `1.5M`, `2.0K`, `950`.
pub fn format_compact(y: f64) -> String {
    if y >= 1e6 {
        format!("{:.1}M", y / 1e6)
    } else if y >= 1e3 {
        format!("{:.1}K", y / 1e3)
    } else {
        format!("{y:.0}")
    }
}

/// Axis tick label with trailing zeros trimmed.
pub(crate) fn format_tick(y: f64) -> String {
    let s = format!("{y:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".into()
    } else {
        s.to_string()
    }
}

/// Underscores read as spaces in titles and axis labels.
pub fn humanize(label: &str) -> String {
    label.replace('_', " ")
}

/// `1234567` → `1,234,567`; non-integers pass through unchanged.
pub fn group_thousands(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(n) = trimmed.parse::<i64>() else {
        return trimmed.to_string();
    };
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}

/// Label of the category nearest to a tick, blank between categories.
pub(crate) fn category_label(categories: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    categories.get(idx as usize).cloned().unwrap_or_default()
}

/// Padded `(min, max)` for the finite values, always including `floor`.
pub(crate) fn value_range(values: impl Iterator<Item = f64>, floor: Option<f64>) -> (f64, f64) {
    let (mut lo, mut hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if let Some(f) = floor {
        lo = lo.min(f);
        hi = hi.max(f);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if hi - lo < f64::EPSILON {
        let pad = if hi.abs() > 0.0 { hi.abs() * 0.1 } else { 1.0 };
        return (lo - pad, hi + pad);
    }
    let pad = (hi - lo) * 0.05;
    (
        if floor == Some(lo) { lo } else { lo - pad },
        hi + pad,
    )
}
