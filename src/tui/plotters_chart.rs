//! Plotters-powered market chart widget for Ratatui.
//!
//! Why Plotters instead of Ratatui's built-in `Chart` widget?
//! - nicer axis + mesh rendering
//! - less manual work for ticks/labels
//! - easy to extend later (legend, annotations, exportable PNG/SVG backends, etc.)
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.
//!
//! Levels (index, FX) and rates (%) share the x axis but not a y scale, so the
//! chart uses a secondary coordinate system: levels on the left axis, rates on
//! the right.

use chrono::NaiveDate;
use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// One drawable line: points are `(days since origin, value)`.
#[derive(Debug, Clone)]
pub struct ChartSeries {
    pub name: String,
    pub color: (u8, u8, u8),
    pub points: Vec<(f64, f64)>,
}

/// A lightweight, render-only chart description.
///
/// The widget is intentionally data-driven: all series and bounds are computed
/// outside the render call. This keeps `render()` focused on drawing and makes
/// it easy to test/benchmark the data prep separately.
pub struct MarketPlottersChart<'a> {
    /// Line series drawn against the left (level) axis.
    pub levels: &'a [ChartSeries],
    /// Line series drawn against the right (percent) axis.
    pub rates: &'a [ChartSeries],
    /// X bounds in days since `x_origin`.
    pub x_bounds: [f64; 2],
    /// Left axis bounds (raw levels, or index points when rebased).
    pub left_bounds: [f64; 2],
    /// Right axis bounds (percent).
    pub right_bounds: [f64; 2],
    /// The calendar day that x = 0 maps to.
    pub x_origin: NaiveDate,
    /// Left axis description.
    pub y_label: String,
}

impl Widget for MarketPlottersChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let x0 = self.x_bounds[0];
        let x1 = self.x_bounds[1];
        let l0 = self.left_bounds[0];
        let l1 = self.left_bounds[1];
        let r0 = self.right_bounds[0];
        let r1 = self.right_bounds[1];

        if !(x0.is_finite() && x1.is_finite() && l0.is_finite() && l1.is_finite())
            || !(r0.is_finite() && r1.is_finite())
            || x1 <= x0
            || l1 <= l0
            || r1 <= r0
        {
            return;
        }

        let origin = self.x_origin;
        // One right-axis label per whole percent.
        let rate_labels = (((r1 - r0).round() as usize) + 1).clamp(2, 10);

        // `plotters-ratatui-backend` draws Plotters primitives via Ratatui's
        // `Canvas` widget, which ultimately writes to the terminal buffer.
        //
        // We delegate rendering to the crate-provided widget helper to avoid
        // coupling our code to its internal backend types.
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                // Small margins keep the chart readable without wasting space.
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .set_label_area_size(LabelAreaPosition::Right, 6)
                .build_cartesian_2d(x0..x1, l0..l1)?
                .set_secondary_coord(x0..x1, r0..r1);

            // Axes + tick labels.
            //
            // We disable the mesh lines to reduce visual clutter in low-resolution
            // terminal rendering; the axes + labels are usually enough here.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .y_desc(&self.y_label)
                .x_labels(6)
                .y_labels(5)
                .x_label_formatter(&|v| fmt_x_date(origin, *v))
                .y_label_formatter(&|v| format!("{v:.0}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            chart
                .configure_secondary_axes()
                .y_desc("rate (%)")
                .y_labels(rate_labels)
                .y_label_formatter(&|v| format!("{v:.0}%"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .draw()?;

            // Series styling: keep the palette high-contrast for terminal readability.
            for series in self.levels {
                let color = RGBColor(series.color.0, series.color.1, series.color.2);
                chart.draw_series(LineSeries::new(series.points.iter().copied(), &color))?;
            }
            for series in self.rates {
                let color = RGBColor(series.color.0, series.color.1, series.color.2);
                chart.draw_secondary_series(LineSeries::new(
                    series.points.iter().copied(),
                    &color,
                ))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// Map an x value (days since `origin`) back to a `YYYY-MM` tick label.
fn fmt_x_date(origin: NaiveDate, v: f64) -> String {
    let date = origin
        .checked_add_signed(chrono::Duration::days(v.round() as i64))
        .unwrap_or(origin);
    date.format("%Y-%m").to_string()
}
