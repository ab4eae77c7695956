//! Ratatui-based terminal UI.
//!
//! The TUI shows the aligned market table as a dual-axis chart (levels on the
//! left, policy rates in percent on the right), with a settings panel for the
//! window start, normalization, and the table view.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use chrono::NaiveDate;

use crate::app::pipeline::{LEVEL_COLUMNS, MarketData, load_dashboard};
use crate::cli::DashArgs;
use crate::data::FetchCache;
use crate::domain::{AlignedTable, DashConfig};
use crate::error::AppError;

mod plotters_chart;

use plotters_chart::{ChartSeries, MarketPlottersChart};

const LEVEL_PALETTE: [(u8, u8, u8); 2] = [(255, 255, 255), (255, 255, 0)];
const RATE_PALETTE: [(u8, u8, u8); 2] = [(255, 80, 80), (80, 200, 255)];

/// Start the TUI.
pub fn run(args: DashArgs) -> Result<(), AppError> {
    let config = crate::app::dash_config_from_args(&args.common);
    let cache = FetchCache::new(Duration::from_secs(args.common.cache_ttl));

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(config, cache)?;
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    config: DashConfig,
    cache: FetchCache,
    date_input: String,
    selected_field: usize,
    editing_date: bool,
    status: String,
    data: Option<MarketData>,
}

impl App {
    fn new(config: DashConfig, cache: FetchCache) -> Result<Self, AppError> {
        let mut app = Self {
            config,
            cache,
            date_input: String::new(),
            selected_field: 0,
            editing_date: false,
            status: "Fetching market data...".to_string(),
            data: None,
        };
        app.refresh()?;
        Ok(app)
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code)? {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        if self.editing_date {
            return self.handle_date_edit(code);
        }

        match code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field < 2 {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left | KeyCode::Right => self.adjust_field()?,
            KeyCode::Enter => {
                if self.selected_field == 0 {
                    self.editing_date = true;
                    self.date_input = self.config.start.to_string();
                    self.status =
                        "Editing start (YYYY-MM-DD). Enter to apply, Esc to cancel.".to_string();
                }
            }
            KeyCode::Char('n') => self.toggle_normalize()?,
            KeyCode::Char('t') => self.toggle_table(),
            KeyCode::Char('r') => self.refresh()?,
            KeyCode::Char('e') => self.export(),
            _ => {}
        }

        Ok(false)
    }

    fn handle_date_edit(&mut self, code: KeyCode) -> Result<bool, AppError> {
        match code {
            KeyCode::Esc => {
                self.editing_date = false;
                self.status = "Start edit canceled.".to_string();
            }
            KeyCode::Enter => {
                self.editing_date = false;
                self.apply_date_input()?;
            }
            KeyCode::Backspace => {
                self.date_input.pop();
            }
            KeyCode::Char(c) => {
                if c.is_ascii_digit() || c == '-' {
                    self.date_input.push(c);
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn adjust_field(&mut self) -> Result<(), AppError> {
        match self.selected_field {
            0 => {}
            1 => self.toggle_normalize()?,
            2 => self.toggle_table(),
            _ => {}
        }
        Ok(())
    }

    fn toggle_normalize(&mut self) -> Result<(), AppError> {
        self.config.normalize = !self.config.normalize;
        self.refresh()?;
        self.status = format!("normalize: {}", onoff(self.config.normalize));
        Ok(())
    }

    fn toggle_table(&mut self) {
        self.config.show_table = !self.config.show_table;
        self.status = format!(
            "table: {}",
            if self.config.show_table { "shown" } else { "hidden" }
        );
    }

    fn export(&mut self) {
        let Some(data) = &self.data else {
            self.status = "No data to export.".to_string();
            return;
        };
        let path = crate::io::export::default_export_path();
        match crate::io::export::write_table_csv(&path, &data.table) {
            Ok(()) => {
                self.status = format!("Wrote {} rows to {}", data.table.len(), path.display());
            }
            Err(err) => {
                self.status = format!("Export failed: {err}");
            }
        }
    }

    fn apply_date_input(&mut self) -> Result<(), AppError> {
        let trimmed = self.date_input.trim();
        if trimmed.is_empty() {
            self.status = "Start unchanged.".to_string();
            return Ok(());
        }
        let date = match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            Ok(date) => date,
            Err(e) => {
                self.status = format!("Invalid date '{trimmed}': {e}");
                return Ok(());
            }
        };
        if date == self.config.start {
            self.status = "Start unchanged.".to_string();
            return Ok(());
        }
        self.config.start = date;
        self.refresh()
    }

    fn refresh(&mut self) -> Result<(), AppError> {
        self.status = "Fetching market data...".to_string();
        let data = load_dashboard(&self.config, &self.cache)?;
        self.status = if data.table.is_empty() {
            "No data for the selected period.".to_string()
        } else {
            format!("Loaded {} rows.", data.table.len())
        };
        self.data = Some(data);
        Ok(())
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(6),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("krdash", Style::default().fg(Color::Cyan)),
            Span::raw(" - Korea market dashboard"),
        ]));

        lines.push(Line::from(Span::styled(
            format!(
                "window: {} → {} | normalize: {} | cache ttl: {}s",
                self.config.start,
                self.config.end_date(),
                onoff(self.config.normalize),
                self.cache_ttl_secs(),
            ),
            Style::default().fg(Color::Gray),
        )));

        let latest = self
            .data
            .as_ref()
            .filter(|d| !d.table.is_empty())
            .map(|d| crate::report::format_last_values(&d.table))
            .unwrap_or_else(|| "-".to_string());
        lines.push(Line::from(Span::styled(
            format!("latest: {latest}"),
            Style::default().fg(Color::Gray),
        )));

        let sources = self
            .data
            .as_ref()
            .map(|d| {
                format!(
                    "US: {} | BOK: {}",
                    crate::report::format_source_caption(&d.fed),
                    crate::report::format_source_caption(&d.bok),
                )
            })
            .unwrap_or_else(|| "-".to_string());
        lines.push(Line::from(Span::styled(
            sources,
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn cache_ttl_secs(&self) -> u64 {
        // Display-only; the cache itself owns the live value.
        self.cache.ttl().as_secs()
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let show_table = self.config.show_table
            && self.data.as_ref().is_some_and(|d| !d.table.is_empty());

        if show_table {
            let table_height =
                ((self.config.table_rows as u16).saturating_add(4)).min(area.height / 2);
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Min(0),
                    Constraint::Length(table_height),
                    Constraint::Length(7),
                ])
                .split(area);
            self.draw_chart(frame, chunks[0]);
            self.draw_table(frame, chunks[1]);
            self.draw_settings(frame, chunks[2]);
        } else {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(7)])
                .split(area);
            self.draw_chart(frame, chunks[0]);
            self.draw_settings(frame, chunks[1]);
        }
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Market").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(data) = &self.data else {
            let msg = Paragraph::new("Waiting for data...")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let Some(prep) = chart_series(&data.table, &LEVEL_COLUMNS) else {
            let mut text = String::from(
                "No data for the selected period. Adjust the window or retry later.",
            );
            if self.config.ecos_api_key.trim().is_empty() {
                text.push_str("\nSet ECOS_API_KEY to enable the BOK base rate.");
            }
            let msg = Paragraph::new(text)
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let y_label = if self.config.normalize {
            "index (start=100)".to_string()
        } else {
            "level".to_string()
        };

        let (chart_rect, insets) = chart_layout(inner);
        let widget = MarketPlottersChart {
            levels: &prep.levels,
            rates: &prep.rates,
            x_bounds: prep.x_bounds,
            left_bounds: prep.left_bounds,
            right_bounds: prep.right_bounds,
            x_origin: prep.origin,
            y_label: y_label.clone(),
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, &prep, &y_label);
        }
    }

    fn draw_table(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(data) = &self.data else {
            return;
        };
        let fit = area.height.saturating_sub(4) as usize;
        let rows = self.config.table_rows.min(fit.max(1));
        let text = crate::report::format_table(&data.table, rows);
        let p = Paragraph::new(text)
            .block(Block::default().title("Recent rows").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let start_label = if self.editing_date {
            format!("{}_", self.date_input)
        } else {
            self.config.start.to_string()
        };

        let (fed, bok) = self
            .data
            .as_ref()
            .map(|d| {
                (
                    d.fed.source.label().to_string(),
                    d.bok.source.label().to_string(),
                )
            })
            .unwrap_or_else(|| ("-".to_string(), "-".to_string()));

        let mut items = Vec::new();
        items.push(ListItem::new(format!("Start: {start_label}")));
        items.push(ListItem::new(format!(
            "Normalize: {}",
            onoff(self.config.normalize)
        )));
        items.push(ListItem::new(format!(
            "Table: {}",
            if self.config.show_table { "shown" } else { "hidden" }
        )));
        items.push(ListItem::new(format!("US rate: {fed}")));
        items.push(ListItem::new(format!("BOK rate: {bok}")));

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);

        if self.editing_date {
            let hint = Paragraph::new("Editing start date...")
                .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
            let rect = Rect {
                x: area.x + 2,
                y: area.y + area.height.saturating_sub(2),
                width: area.width.saturating_sub(4),
                height: 1,
            };
            frame.render_widget(hint, rect);
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help =
            "↑/↓ select  ←/→ adjust  Enter edit start  n normalize  t table  r refresh  e export  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn onoff(v: bool) -> &'static str {
    if v { "on" } else { "off" }
}

/// Everything the chart widget needs, computed once per draw.
struct ChartPrep {
    levels: Vec<ChartSeries>,
    rates: Vec<ChartSeries>,
    x_bounds: [f64; 2],
    left_bounds: [f64; 2],
    right_bounds: [f64; 2],
    origin: NaiveDate,
}

/// Build chart series for Plotters. Returns `None` when the table has
/// nothing to draw.
fn chart_series(table: &AlignedTable, level_columns: &[&str]) -> Option<ChartPrep> {
    if table.is_empty() {
        return None;
    }

    let index = table.index();
    let origin = index[0];
    let last_x = (index[index.len() - 1] - origin).num_days() as f64;
    let x_bounds = [0.0, last_x.max(1.0)];

    let mut levels = Vec::new();
    let mut rates = Vec::new();
    let (mut l_min, mut l_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut r_min, mut r_max) = (f64::INFINITY, f64::NEG_INFINITY);

    for column in table.columns() {
        let is_level = level_columns.contains(&column.name.as_str());
        let mut points = Vec::with_capacity(column.values.len());
        for (i, value) in column.values.iter().enumerate() {
            let Some(v) = *value else {
                continue;
            };
            let x = (index[i] - origin).num_days() as f64;
            points.push((x, v));
            if is_level {
                l_min = l_min.min(v);
                l_max = l_max.max(v);
            } else {
                r_min = r_min.min(v);
                r_max = r_max.max(v);
            }
        }
        if points.is_empty() {
            continue;
        }
        if is_level {
            let color = LEVEL_PALETTE[levels.len() % LEVEL_PALETTE.len()];
            levels.push(ChartSeries {
                name: column.name.clone(),
                color,
                points,
            });
        } else {
            let color = RATE_PALETTE[rates.len() % RATE_PALETTE.len()];
            rates.push(ChartSeries {
                name: column.name.clone(),
                color,
                points,
            });
        }
    }

    if levels.is_empty() && rates.is_empty() {
        return None;
    }

    Some(ChartPrep {
        levels,
        rates,
        x_bounds,
        left_bounds: pad_bounds(l_min, l_max),
        right_bounds: right_axis_bounds(r_min, r_max),
        origin,
    })
}

fn pad_bounds(min: f64, max: f64) -> [f64; 2] {
    if !min.is_finite() || !max.is_finite() || max < min {
        return [0.0, 1.0];
    }
    let pad = ((max - min).abs() * 0.05).max(1e-12);
    [min - pad, max + pad]
}

/// Rate axis bounds: whole percents just outside the data, nudged by 0.1 so
/// the extreme labels do not sit on the frame.
fn right_axis_bounds(min: f64, max: f64) -> [f64; 2] {
    if !min.is_finite() || !max.is_finite() || max < min {
        return [0.0, 1.0];
    }
    [min.floor() - 0.1, max.ceil() + 0.1]
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 8,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    prep: &ChartPrep,
    y_label: &str,
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    // Bottom: dates as YYYY-MM.
    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = prep.x_bounds[0] + u * (prep.x_bounds[1] - prep.x_bounds[0]);
        let date = prep
            .origin
            .checked_add_signed(chrono::Duration::days(x_val.round() as i64))
            .unwrap_or(prep.origin);
        let label = date.format("%Y-%m").to_string();
        let label_len = label.len() as u16;
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16).max(inner.x);
        if start + label_len > inner.x + inner.width {
            continue;
        }
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    // Left: level ticks.
    if !prep.levels.is_empty() {
        for i in 0..ticks {
            let u = i as f64 / (ticks as f64 - 1.0);
            let y_val = prep.left_bounds[0] + u * (prep.left_bounds[1] - prep.left_bounds[0]);
            let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
            let label = format!("{y_val:.0}");
            let label_len = label.len() as u16;
            let x = inner.x + insets.left.saturating_sub(1);
            let start = x.saturating_sub(label_len);
            if start < inner.x {
                continue;
            }
            frame.render_widget(
                Paragraph::new(label).style(style),
                Rect {
                    x: start,
                    y,
                    width: label_len,
                    height: 1,
                },
            );
        }
    }

    // Right: one tick per whole percent.
    if !prep.rates.is_empty() {
        let lo = prep.right_bounds[0].ceil() as i64;
        let hi = prep.right_bounds[1].floor() as i64;
        let span = prep.right_bounds[1] - prep.right_bounds[0];
        let step = (((hi - lo) / 12) + 1).max(1);
        let mut p = lo;
        while p <= hi {
            let u = ((p as f64 - prep.right_bounds[0]) / span).clamp(0.0, 1.0);
            let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
            let label = format!("{p}%");
            let label_len = label.len() as u16;
            let x = chart.x + chart.width + 1;
            if x + label_len <= inner.x + inner.width {
                frame.render_widget(
                    Paragraph::new(label).style(style),
                    Rect {
                        x,
                        y,
                        width: label_len,
                        height: 1,
                    },
                );
            }
            p += step;
        }
    }

    let y_desc = Paragraph::new(y_label.to_string())
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_desc, y_rect);
}
