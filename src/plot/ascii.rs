//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Levels (index, FX) and rates (%) live on very different scales, so each
//! group gets its own stacked panel with its own y-range. Within a panel each
//! column draws as a polyline with its own marker.

use crate::domain::{AlignedTable, Column};

const MARKERS: [char; 4] = ['*', '+', 'o', 'x'];

/// Render the aligned table as stacked level/rate panels.
///
/// `level_columns` names the columns drawn in the first panel; every other
/// column lands in the rates panel.
pub fn render_ascii_chart(
    table: &AlignedTable,
    level_columns: &[&str],
    width: usize,
    height: usize,
) -> String {
    if table.is_empty() {
        return "(no data to plot)\n".to_string();
    }

    let (levels, rates): (Vec<&Column>, Vec<&Column>) = table
        .columns()
        .iter()
        .partition(|column| level_columns.contains(&column.name.as_str()));

    let mut out = String::new();
    if !levels.is_empty() {
        out.push_str(&render_panel("Levels", table, &levels, width, height));
    }
    if !rates.is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&render_panel("Rates", table, &rates, width, height));
    }
    if out.is_empty() {
        return "(no data to plot)\n".to_string();
    }
    out
}

fn render_panel(
    title: &str,
    table: &AlignedTable,
    columns: &[&Column],
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (y_min, y_max) = value_range(columns).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let last = table.len() - 1;

    for (ci, column) in columns.iter().enumerate() {
        let marker = MARKERS[ci % MARKERS.len()];
        let mut prev: Option<(usize, usize)> = None;
        for (i, value) in column.values.iter().enumerate() {
            let Some(v) = *value else {
                continue;
            };
            let x = map_x(i as f64, 0.0, last.max(1) as f64, width);
            let y = map_y(v, y_min, y_max, height);
            if let Some((x0, y0)) = prev {
                draw_line(&mut grid, x0, y0, x, y, marker);
            } else if grid[y][x] == ' ' {
                grid[y][x] = marker;
            }
            prev = Some((x, y));
        }
    }

    let legend: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(ci, column)| format!("{} {}", column.name, MARKERS[ci % MARKERS.len()]))
        .collect();

    let mut out = String::new();
    out.push_str(&format!(
        "{title} ({}) | {} -> {} | y=[{y_min:.2}, {y_max:.2}]\n",
        legend.join(", "),
        table.index()[0],
        table.index()[last],
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn value_range(columns: &[&Column]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for column in columns {
        for v in column.values.iter().flatten() {
            min_y = min_y.min(*v);
            max_y = max_y.max(*v);
        }
    }
    // A flat series is fine; pad_range widens a zero span.
    if min_y.is_finite() && max_y.is_finite() && max_y >= min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish). Only blank cells are overwritten,
/// so the first series drawn wins any overlap.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
