//! Ratatui-based terminal UI.
//!
//! Two tabs: a single-customer form (pick values, score, see the probability
//! gauge and drivers) and a batch tab (pick a CSV, score it, export the
//! predictions).

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{BarChart, Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Tabs},
    Terminal,
};

use crate::app::pipeline::{self, BatchOutput};
use crate::cli::picker::discover_csv_files;
use crate::cli::TuiArgs;
use crate::data::bundle::{resolve_bundle_path, Bundle, ColumnKind};
use crate::domain::{CustomerTable, FeatureRow, FeatureValue, Prediction, CHURN_THRESHOLD};
use crate::error::AppError;
use crate::io::export::write_predictions;
use crate::io::ingest::{read_table, SourceEncoding};
use crate::model::contributions;
use crate::report::{format_preview, rank_drivers, Drivers, PREVIEW_ROWS};

/// Driver rows shown per side in the result panel.
const DRIVER_ROWS: usize = 4;

/// Where the batch tab writes its export.
const EXPORT_PATH: &str = "predictions.csv";

const DECILE_LABELS: [&str; 10] = ["0", "10", "20", "30", "40", "50", "60", "70", "80", "90"];

/// Start the TUI.
pub fn run(args: TuiArgs) -> Result<(), AppError> {
    // Load the bundle before touching the terminal so failures print cleanly.
    let path = resolve_bundle_path(args.bundle.as_deref());
    let bundle = Bundle::load(&path)?;

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(bundle);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode()
            .map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!(
                "Failed to enter alternate screen: {e}"
            )));
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Single,
    Batch,
}

impl Tab {
    fn toggle(self) -> Self {
        match self {
            Tab::Single => Tab::Batch,
            Tab::Batch => Tab::Single,
        }
    }

    fn index(self) -> usize {
        match self {
            Tab::Single => 0,
            Tab::Batch => 1,
        }
    }
}

struct SingleScore {
    prediction: Prediction,
    drivers: Drivers,
}

struct LoadedBatch {
    path: PathBuf,
    table: CustomerTable,
    encoding: SourceEncoding,
    missing: Vec<String>,
}

struct App {
    bundle: Bundle,
    tab: Tab,
    status: String,

    // Single tab.
    row: FeatureRow,
    selected_field: usize,
    editing_value: bool,
    value_input: String,
    single: Option<SingleScore>,

    // Batch tab.
    files: Vec<PathBuf>,
    selected_file: usize,
    loaded: Option<LoadedBatch>,
    batch: Option<BatchOutput>,
}

impl App {
    fn new(bundle: Bundle) -> Self {
        let row = pipeline::default_row(&bundle);
        let files = discover_csv_files();
        Self {
            bundle,
            tab: Tab::Single,
            status: "Ready. Tab switches between Single and Batch.".to_string(),
            row,
            selected_field: 0,
            editing_value: false,
            value_input: String::new(),
            single: None,
            files,
            selected_file: 0,
            loaded: None,
            batch: None,
        }
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
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
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

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing_value {
            self.handle_value_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Tab | KeyCode::BackTab => {
                self.tab = self.tab.toggle();
            }
            _ => match self.tab {
                Tab::Single => self.handle_single_key(code),
                Tab::Batch => self.handle_batch_key(code),
            },
        }
        false
    }

    fn handle_single_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field + 1 < self.bundle.n_features() {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Enter => self.begin_value_edit(),
            KeyCode::Char('p') => self.predict(),
            _ => {}
        }
    }

    fn handle_batch_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => {
                if self.selected_file > 0 {
                    self.selected_file -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_file + 1 < self.files.len() {
                    self.selected_file += 1;
                }
            }
            KeyCode::Enter => self.load_selected(),
            KeyCode::Char('r') => self.score_loaded(),
            KeyCode::Char('e') => self.export_scored(),
            _ => {}
        }
    }

    fn handle_value_edit(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.editing_value = false;
                self.status = "Edit canceled.".to_string();
            }
            KeyCode::Enter => {
                self.editing_value = false;
                self.apply_value_input();
            }
            KeyCode::Backspace => {
                self.value_input.pop();
            }
            KeyCode::Char(c) => {
                if c.is_ascii_digit() || c == '.' || c == '-' {
                    self.value_input.push(c);
                }
            }
            _ => {}
        }
    }

    fn selected_name(&self) -> Option<String> {
        self.bundle.feature_cols.get(self.selected_field).cloned()
    }

    fn adjust_field(&mut self, delta: i32) {
        let Some(name) = self.selected_name() else {
            return;
        };
        match self.bundle.column(&name) {
            Some(ColumnKind::Categorical(col)) => {
                let current = self
                    .row
                    .get(&name)
                    .and_then(|v| v.as_text())
                    .unwrap_or_default()
                    .to_string();
                let next = cycle_category(&col.categories, &current, delta);
                let message = format!("{name}: {next}");
                self.row.insert(name, FeatureValue::Text(next));
                self.status = message;
            }
            Some(ColumnKind::Numerical(col)) => {
                let current = self
                    .row
                    .get(&name)
                    .and_then(|v| v.as_number())
                    .unwrap_or(col.default);
                let next = adjust_numeric(current, delta, col.min, col.max, col.decimals);
                let message = format!(
                    "{name}: {next:.prec$}",
                    prec = col.decimals as usize
                );
                self.row.insert(name, FeatureValue::Number(next));
                self.status = message;
            }
            None => {}
        }
    }

    fn begin_value_edit(&mut self) {
        let Some(name) = self.selected_name() else {
            return;
        };
        let decimals = match self.bundle.column(&name) {
            Some(ColumnKind::Numerical(col)) => Some(col.decimals),
            // Enter on a categorical field just cycles it.
            Some(ColumnKind::Categorical(_)) => None,
            None => return,
        };
        match decimals {
            Some(decimals) => {
                self.value_input = self
                    .row
                    .get(&name)
                    .map(|v| v.display_with(decimals))
                    .unwrap_or_default();
                self.editing_value = true;
                self.status = format!("Editing {name}. Enter to apply, Esc to cancel.");
            }
            None => self.adjust_field(1),
        }
    }

    fn apply_value_input(&mut self) {
        let Some(name) = self.selected_name() else {
            return;
        };
        let Some(ColumnKind::Numerical(col)) = self.bundle.column(&name) else {
            return;
        };
        let (min, max, decimals) = (col.min, col.max, col.decimals);

        let trimmed = self.value_input.trim().to_string();
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => {
                let clamped = v.clamp(min, max);
                let message = if clamped == v {
                    format!("{name}: {clamped:.prec$}", prec = decimals as usize)
                } else {
                    format!(
                        "{name}: {clamped:.prec$} (clamped to {min}..{max})",
                        prec = decimals as usize
                    )
                };
                self.row.insert(name, FeatureValue::Number(clamped));
                self.status = message;
            }
            _ => {
                self.status = format!("Invalid number `{trimmed}`; value unchanged.");
            }
        }
    }

    fn predict(&mut self) {
        let result = pipeline::score_single(&self.bundle, &self.row).and_then(|prediction| {
            contributions(&self.bundle, &self.row).map(|terms| (prediction, terms))
        });
        match result {
            Ok((prediction, terms)) => {
                let drivers = rank_drivers(&terms, DRIVER_ROWS);
                self.status = format!(
                    "Scored: {} ({:.1}% churn probability)",
                    prediction.label(),
                    prediction.probability * 100.0
                );
                self.single = Some(SingleScore {
                    prediction,
                    drivers,
                });
            }
            Err(e) => self.status = format!("Error: {e}"),
        }
    }

    fn load_selected(&mut self) {
        let Some(path) = self.files.get(self.selected_file).cloned() else {
            self.status = "No CSV files found under the current directory.".to_string();
            return;
        };
        match read_table(&path) {
            Ok(ingested) => {
                let missing = ingested.table.missing_columns(&self.bundle.feature_cols);
                self.status = if missing.is_empty() {
                    format!(
                        "Loaded {} rows from {} ({}). Press r to score.",
                        ingested.table.n_rows(),
                        path.display(),
                        ingested.encoding.label()
                    )
                } else {
                    format!("Missing required columns: {}", missing.join(", "))
                };
                self.loaded = Some(LoadedBatch {
                    path,
                    table: ingested.table,
                    encoding: ingested.encoding,
                    missing,
                });
                self.batch = None;
            }
            Err(e) => self.status = format!("Error: {e}"),
        }
    }

    fn score_loaded(&mut self) {
        let Some(loaded) = self.loaded.as_ref() else {
            self.status = "Load a CSV first (Enter).".to_string();
            return;
        };
        if !loaded.missing.is_empty() {
            self.status = format!(
                "Cannot score: missing required columns: {}",
                loaded.missing.join(", ")
            );
            return;
        }
        match pipeline::run_batch_with_table(&self.bundle, loaded.table.clone(), loaded.encoding) {
            Ok(run) => {
                self.status = format!(
                    "Scored {} rows: {} predicted churners ({:.1}%). Press e to export.",
                    run.stats.n_rows,
                    run.stats.churners,
                    run.stats.churn_rate * 100.0
                );
                self.batch = Some(run);
            }
            Err(e) => self.status = format!("Error: {e}"),
        }
    }

    fn export_scored(&mut self) {
        let Some(run) = self.batch.as_ref() else {
            self.status = "Nothing scored yet (press r).".to_string();
            return;
        };
        match write_predictions(&run.table, &run.predictions, Path::new(EXPORT_PATH)) {
            Ok(()) => {
                self.status = format!(
                    "Saved {} predictions to {EXPORT_PATH}.",
                    run.predictions.len()
                );
            }
            Err(e) => self.status = format!("Error: {e}"),
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        self.draw_tabs(frame, chunks[1]);
        match self.tab {
            Tab::Single => self.draw_single(frame, chunks[2]),
            Tab::Batch => self.draw_batch(frame, chunks[2]),
        }
        self.draw_footer(frame, chunks[3]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let trained = self
            .bundle
            .trained_at
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let lines = vec![
            Line::from(vec![
                Span::styled("churn", Style::default().fg(Color::Cyan)),
                Span::raw(" | interactive churn scoring"),
            ]),
            Line::from(Span::styled(
                format!(
                    "features: {} | trained: {trained} | threshold: {CHURN_THRESHOLD:.2}",
                    self.bundle.n_features()
                ),
                Style::default().fg(Color::Gray),
            )),
        ];
        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_tabs(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let tabs = Tabs::new(vec!["Single customer", "Batch CSV"])
            .block(Block::default().borders(Borders::ALL))
            .select(self.tab.index())
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn draw_single(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);

        self.draw_form(frame, chunks[0]);
        self.draw_result(frame, chunks[1]);
    }

    fn draw_form(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut items = Vec::with_capacity(self.bundle.n_features());
        for name in &self.bundle.feature_cols {
            let value = match self.bundle.column(name) {
                Some(ColumnKind::Numerical(col)) => self
                    .row
                    .get(name)
                    .map(|v| v.display_with(col.decimals))
                    .unwrap_or_default(),
                _ => self
                    .row
                    .get(name)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            };
            items.push(ListItem::new(format!("{name:<18} {value}")));
        }

        let list = List::new(items)
            .block(Block::default().title("Customer").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("> ");

        let mut state = ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);

        if self.editing_value {
            let hint = Paragraph::new(format!("{}_  (Enter apply, Esc cancel)", self.value_input))
                .style(
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                );
            let rect = Rect {
                x: area.x + 2,
                y: area.y + area.height.saturating_sub(2),
                width: area.width.saturating_sub(4),
                height: 1,
            };
            frame.render_widget(hint, rect);
        }
    }

    fn draw_result(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(score) = &self.single else {
            let hint = Paragraph::new("Adjust the form, then press p to score this customer.")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().title("Result").borders(Borders::ALL));
            frame.render_widget(hint, area);
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let pred = &score.prediction;
        let color = if pred.churn { Color::Red } else { Color::Green };
        let gauge = Gauge::default()
            .block(
                Block::default()
                    .title("Churn probability")
                    .borders(Borders::ALL),
            )
            .gauge_style(Style::default().fg(color))
            .ratio(pred.probability.clamp(0.0, 1.0))
            .label(format!("{:.2}%", pred.probability * 100.0));
        frame.render_widget(gauge, chunks[0]);

        let mut lines = Vec::new();
        lines.push(Line::from(vec![
            Span::raw("Prediction: "),
            Span::styled(
                if pred.churn { "Churn" } else { "No churn" },
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
        ]));
        lines.push(Line::from(""));
        lines.extend(driver_lines(&score.drivers));

        let p = Paragraph::new(Text::from(lines))
            .block(Block::default().title("Drivers").borders(Borders::ALL));
        frame.render_widget(p, chunks[1]);
    }

    fn draw_batch(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);

        self.draw_file_list(frame, chunks[0]);
        self.draw_batch_result(frame, chunks[1]);
    }

    fn draw_file_list(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = if self.files.is_empty() {
            vec![ListItem::new("(no .csv files found)")]
        } else {
            self.files
                .iter()
                .map(|p| ListItem::new(p.display().to_string()))
                .collect()
        };

        let list = List::new(items)
            .block(Block::default().title("CSV files").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("> ");

        let mut state = ListState::default();
        if !self.files.is_empty() {
            state.select(Some(self.selected_file));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_batch_result(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(run) = &self.batch else {
            let text = match &self.loaded {
                Some(loaded) if !loaded.missing.is_empty() => format!(
                    "{}\n\nMissing required columns:\n  {}",
                    loaded.path.display(),
                    loaded.missing.join("\n  ")
                ),
                Some(loaded) => format!(
                    "{} ({})\n{} rows, {} columns.\n\n{}\nPress r to score.",
                    loaded.path.display(),
                    loaded.encoding.label(),
                    loaded.table.n_rows(),
                    loaded.table.n_cols(),
                    raw_preview(&loaded.table)
                ),
                None => "Select a CSV on the left and press Enter to load it.".to_string(),
            };
            let p = Paragraph::new(text)
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().title("Batch").borders(Borders::ALL));
            frame.render_widget(p, area);
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(6),
                Constraint::Length(PREVIEW_ROWS as u16 + 5),
                Constraint::Min(0),
            ])
            .split(area);

        let mut lines = vec![Line::from(format!(
            "Rows: {} | churners: {} ({:.1}%)",
            run.stats.n_rows,
            run.stats.churners,
            run.stats.churn_rate * 100.0
        ))];
        lines.push(Line::from(format!(
            "Mean churn probability: {:.1}%",
            run.stats.mean_probability * 100.0
        )));
        if run.blanks_replaced > 0 {
            lines.push(Line::from(format!(
                "Cleaned {} blank TotalCharges cell(s).",
                run.blanks_replaced
            )));
        }
        lines.push(Line::from(Span::styled(
            format!("Press e to export to {EXPORT_PATH}."),
            Style::default().fg(Color::Gray),
        )));
        let summary = Paragraph::new(Text::from(lines))
            .block(Block::default().title("Batch result").borders(Borders::ALL));
        frame.render_widget(summary, chunks[0]);

        let preview = Paragraph::new(format_preview(&run.table, &run.predictions, PREVIEW_ROWS))
            .block(Block::default().title("Preview").borders(Borders::ALL));
        frame.render_widget(preview, chunks[1]);

        let hist = histogram(&run.predictions);
        let data: Vec<(&str, u64)> = DECILE_LABELS.iter().copied().zip(hist).collect();
        let chart = BarChart::default()
            .block(
                Block::default()
                    .title("Probability histogram (%)")
                    .borders(Borders::ALL),
            )
            .bar_width(4)
            .bar_gap(1)
            .bar_style(Style::default().fg(Color::Cyan))
            .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
            .data(&data);
        frame.render_widget(chart, chunks[2]);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = match self.tab {
            Tab::Single => "Tab batch  ↑/↓ field  ←/→ adjust  Enter edit  p predict  q quit",
            Tab::Batch => "Tab single  ↑/↓ file  Enter load  r score  e export  q quit",
        };
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn driver_lines(drivers: &Drivers) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    lines.push(Line::from(Span::styled(
        "Pushing toward churn",
        Style::default().fg(Color::Red),
    )));
    if drivers.churn.is_empty() {
        lines.push(Line::from("  (none)"));
    }
    for t in &drivers.churn {
        lines.push(Line::from(format!(
            "  {:<16} {:<20} {:>+7.3}",
            t.column, t.label, t.delta
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Holding retention",
        Style::default().fg(Color::Green),
    )));
    if drivers.retention.is_empty() {
        lines.push(Line::from("  (none)"));
    }
    for t in &drivers.retention {
        lines.push(Line::from(format!(
            "  {:<16} {:<20} {:>+7.3}",
            t.column, t.label, t.delta
        )));
    }

    lines
}

/// First rows of an unscored table, a few columns wide.
fn raw_preview(table: &CustomerTable) -> String {
    let cols = table.n_cols().min(4);
    let mut out = String::new();
    for header in table.headers.iter().take(cols) {
        out.push_str(&format!("{:<16} ", clip(header, 15)));
    }
    out.push('\n');
    for row in table.rows.iter().take(PREVIEW_ROWS) {
        for cell in row.iter().take(cols) {
            out.push_str(&format!("{:<16} ", clip(cell, 15)));
        }
        out.push('\n');
    }
    out
}

fn clip(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Step to the next/previous category, wrapping at both ends.
fn cycle_category(categories: &[String], current: &str, delta: i32) -> String {
    if categories.is_empty() {
        return current.to_string();
    }
    let len = categories.len() as i32;
    let cur = categories
        .iter()
        .position(|c| c == current)
        .unwrap_or(0) as i32;
    let next = (cur + delta).rem_euclid(len) as usize;
    categories[next].clone()
}

/// Nudge a numeric field by one slider step, clamped to its range.
///
/// Integer-valued columns (decimals 0) move in whole steps.
fn adjust_numeric(value: f64, delta: i32, min: f64, max: f64, decimals: u8) -> f64 {
    let span = max - min;
    let step = if decimals == 0 {
        (span / 100.0).max(1.0).round()
    } else {
        span / 100.0
    };
    let mut next = (value + delta as f64 * step).clamp(min, max);
    if decimals == 0 {
        next = next.round();
    }
    next
}

/// Decile counts over predicted probabilities.
fn histogram(predictions: &[Prediction]) -> [u64; 10] {
    let mut bins = [0u64; 10];
    for p in predictions {
        let idx = ((p.probability * 10.0).floor() as usize).min(9);
        bins[idx] += 1;
    }
    bins
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_cycling_wraps_both_ways() {
        let cats: Vec<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        assert_eq!(cycle_category(&cats, "A", 1), "B");
        assert_eq!(cycle_category(&cats, "C", 1), "A");
        assert_eq!(cycle_category(&cats, "A", -1), "C");
    }

    #[test]
    fn numeric_adjustment_steps_and_clamps() {
        // tenure-like: 0..72, integer steps.
        assert_eq!(adjust_numeric(30.0, 1, 0.0, 72.0, 0), 31.0);
        assert_eq!(adjust_numeric(0.0, -1, 0.0, 72.0, 0), 0.0);
        assert_eq!(adjust_numeric(72.0, 1, 0.0, 72.0, 0), 72.0);
        // charges-like: 0..120 with decimals, step = span / 100.
        let next = adjust_numeric(60.0, 1, 0.0, 120.0, 2);
        assert!((next - 61.2).abs() < 1e-9);
    }

    #[test]
    fn histogram_bins_cover_the_unit_interval() {
        let preds: Vec<Prediction> = [0.0, 0.05, 0.55, 0.99, 1.0]
            .iter()
            .map(|&p| Prediction::from_probability(p))
            .collect();
        let bins = histogram(&preds);
        assert_eq!(bins[0], 2);
        assert_eq!(bins[5], 1);
        assert_eq!(bins[9], 2);
        assert_eq!(bins.iter().sum::<u64>(), 5);
    }
}
