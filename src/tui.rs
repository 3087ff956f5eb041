//! Interactive terminal session for the scoring workflow.
//!
//! Single-page layout mirroring the workflow: source selection, parameter
//! controls, the Run Analysis trigger, and the results pane. The view is
//! redrawn after every operator event; the scoring call is the one blocking
//! point, and keys pressed while it is outstanding are discarded.

use crate::client::ScoringClient;
use crate::config::Config;
use crate::dataset::{DatasetCache, LeadSource};
use crate::params::format_usd;
use crate::plot::{optim_thresh_plot, OptimPlot};
use crate::render::{self, PREVIEW_ROWS};
use crate::session::{Phase, RunFailure, Session, SourceMode};
use crate::strategy::{
    download_file_name, outcome_from_response, write_strategy_csv, StrategyBundle,
};
use crate::table::Table;
use crate::util::truncate_string;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const LEGEND: &str =
    "[tab focus] [left/right adjust] [space toggle] [enter activate] [d download] [q quit]";
const SLIDER_CELLS: usize = 20;
const MAX_ERROR_BODY: usize = 1024;

type Term = Terminal<CrosstermBackend<io::Stdout>>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Focus {
    Source,
    Upload,
    RawData,
    Sales,
    SafeGuard,
    Run,
}

struct App {
    config: Config,
    client: ScoringClient,
    cache: DatasetCache,
    session: Session,
    dataset: Option<Arc<Table>>,
    focus: Focus,
    upload_input: String,
    notice: Option<String>,
}

/// Launch the interactive session. The bundled dataset must load before the
/// terminal is taken over; failure there is a startup error, not a session
/// message.
pub fn run(config: Config) -> Result<()> {
    let mut app = App::new(config)?;
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut app);
    cleanup_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn cleanup_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    Ok(())
}

fn event_loop(terminal: &mut Term, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| app.draw(frame))?;
        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
            continue;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            break;
        }
        if app.focus == Focus::Upload && app.handle_upload_key(key.code) {
            continue;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Tab => app.next_focus(),
            KeyCode::BackTab => app.prev_focus(),
            KeyCode::Left => app.adjust(-1),
            KeyCode::Right => app.adjust(1),
            KeyCode::Down => app.adjust(-10),
            KeyCode::Up => app.adjust(10),
            KeyCode::Char(' ') => app.toggle(),
            KeyCode::Enter => app.activate(terminal)?,
            KeyCode::Char('d') => app.download(),
            _ => {}
        }
    }
    Ok(())
}

impl App {
    fn new(config: Config) -> Result<App> {
        let mut cache = DatasetCache::new();
        let dataset = cache.load(&LeadSource::Bundled(config.bundled_leads.clone()))?;
        let client = ScoringClient::new(config.endpoint.clone());
        Ok(App {
            config,
            client,
            cache,
            session: Session::new(),
            dataset: Some(dataset),
            focus: Focus::Source,
            upload_input: String::new(),
            notice: None,
        })
    }

    // ---- events ----

    fn handle_upload_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char(ch) => {
                self.upload_input.push(ch);
                true
            }
            KeyCode::Backspace => {
                self.upload_input.pop();
                true
            }
            _ => false,
        }
    }

    fn focus_ring(&self) -> Vec<Focus> {
        let mut ring = vec![Focus::Source];
        if self.session.mode == SourceMode::Upload {
            ring.push(Focus::Upload);
        }
        if self.dataset.is_some() {
            ring.extend([Focus::RawData, Focus::Sales, Focus::SafeGuard, Focus::Run]);
        }
        ring
    }

    fn next_focus(&mut self) {
        self.shift_focus(1);
    }

    fn prev_focus(&mut self) {
        self.shift_focus(-1);
    }

    fn shift_focus(&mut self, delta: isize) {
        let ring = self.focus_ring();
        let len = ring.len() as isize;
        let position = ring
            .iter()
            .position(|focus| *focus == self.focus)
            .map(|position| position as isize)
            .unwrap_or(0);
        let next = (position + delta).rem_euclid(len);
        self.focus = ring[next as usize];
    }

    fn adjust(&mut self, steps: i64) {
        match self.focus {
            Focus::Source => self.toggle_mode(),
            Focus::Sales => self.session.adjust_sales(steps),
            Focus::SafeGuard => self.session.adjust_safe_guard(steps),
            Focus::RawData => self.session.toggle_raw(),
            Focus::Upload | Focus::Run => {}
        }
    }

    fn toggle(&mut self) {
        match self.focus {
            Focus::Source => self.toggle_mode(),
            Focus::RawData => self.session.toggle_raw(),
            _ => {}
        }
    }

    fn activate(&mut self, terminal: &mut Term) -> Result<()> {
        match self.focus {
            Focus::Run => self.run_analysis(terminal),
            Focus::Upload => {
                self.submit_upload();
                Ok(())
            }
            Focus::Source => {
                self.toggle_mode();
                Ok(())
            }
            Focus::RawData => {
                self.session.toggle_raw();
                Ok(())
            }
            Focus::Sales | Focus::SafeGuard => Ok(()),
        }
    }

    fn toggle_mode(&mut self) {
        let mode = match self.session.mode {
            SourceMode::Bundled => SourceMode::Upload,
            SourceMode::Upload => SourceMode::Bundled,
        };
        self.session.set_mode(mode);
        self.notice = None;
        self.refresh_dataset();
        if !self.focus_ring().contains(&self.focus) {
            self.focus = Focus::Source;
        }
    }

    fn refresh_dataset(&mut self) {
        self.dataset = None;
        let Some(source) = self.session.source(&self.config.bundled_leads) else {
            return;
        };
        match self.cache.load(&source) {
            Ok(table) => self.dataset = Some(table),
            Err(err) => {
                tracing::warn!("dataset load failed: {err:#}");
                if matches!(source, LeadSource::Upload(_)) {
                    self.session.clear_upload();
                }
                self.notice = Some(format!(
                    "Could not load {}: {err:#}",
                    source.path().display()
                ));
            }
        }
    }

    fn submit_upload(&mut self) {
        let raw = self.upload_input.trim().to_string();
        if raw.is_empty() {
            self.notice = Some("Enter a CSV file path first.".to_string());
            return;
        }
        self.notice = None;
        self.session.set_upload(PathBuf::from(raw));
        self.refresh_dataset();
        if self.dataset.is_some() {
            self.focus = Focus::Run;
        }
    }

    /// The blocking transition: draw the busy notice once, dispatch, then
    /// discard whatever was typed while the call was outstanding.
    fn run_analysis(&mut self, terminal: &mut Term) -> Result<()> {
        let Some(dataset) = self.dataset.clone() else {
            return Ok(());
        };
        if !self.session.begin_run() {
            return Ok(());
        }
        self.notice = None;
        terminal.draw(|frame| self.draw(frame))?;
        let params = self.session.params();
        match dataset.to_records_json() {
            Ok(body) => match self.client.calculate_lead_strategy(&body, &params) {
                Ok(response) => self.session.finish_run(outcome_from_response(&response)),
                Err(err) => self.session.fail_transport(format!("{err:#}")),
            },
            Err(err) => self
                .session
                .fail_transport(format!("serialize leads dataset: {err}")),
        }
        while event::poll(Duration::from_millis(0))? {
            let _ = event::read()?;
        }
        Ok(())
    }

    fn download(&mut self) {
        let Phase::Succeeded(bundle) = &self.session.phase else {
            return;
        };
        let written = write_strategy_csv(
            &bundle.lead_strategy,
            self.session.source_tag(),
            &self.config.download_dir,
        );
        self.notice = Some(match written {
            Ok(path) => format!("Wrote {}", path.display()),
            Err(err) => format!("Download failed: {err:#}"),
        });
    }

    // ---- drawing ----

    fn draw(&self, frame: &mut Frame) {
        let dataset_ready = self.dataset.is_some();
        let show_raw = dataset_ready && self.session.show_raw;

        let mut constraints = vec![Constraint::Length(4), Constraint::Length(4)];
        if show_raw {
            let rows = self
                .dataset
                .as_ref()
                .map(|table| PREVIEW_ROWS.min(table.len()))
                .unwrap_or(0);
            constraints.push(Constraint::Length(rows as u16 + 4));
        }
        if dataset_ready {
            constraints.push(Constraint::Length(6));
        }
        constraints.push(Constraint::Min(0));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(frame.area());

        let mut index = 0;
        self.draw_title(frame, chunks[index]);
        index += 1;
        self.draw_source(frame, chunks[index]);
        index += 1;
        if show_raw {
            self.draw_raw(frame, chunks[index]);
            index += 1;
        }
        if dataset_ready {
            self.draw_params(frame, chunks[index]);
            index += 1;
        }
        self.draw_results(frame, chunks[index]);
    }

    fn control_style(&self, focus: Focus) -> Style {
        if self.focus == focus {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    }

    fn draw_title(&self, frame: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from(Span::styled(
                "Email Lead Scoring",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(LEGEND, Style::default().fg(Color::DarkGray))),
        ];
        frame.render_widget(
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL)),
            area,
        );
    }

    fn draw_source(&self, frame: &mut Frame, area: Rect) {
        let bundled = self.session.mode == SourceMode::Bundled;
        let radio = Line::from(Span::styled(
            format!(
                "({}) Use default leads.csv    ({}) Upload a file",
                if bundled { "x" } else { " " },
                if bundled { " " } else { "x" },
            ),
            self.control_style(Focus::Source),
        ));
        let status = match self.session.mode {
            SourceMode::Bundled => Line::from(Span::styled(
                format!(
                    "Using the default leads file: {}",
                    self.config.bundled_leads.display()
                ),
                Style::default().fg(Color::DarkGray),
            )),
            SourceMode::Upload => {
                if self.focus == Focus::Upload {
                    Line::from(Span::styled(
                        format!("Path: {}_", self.upload_input),
                        self.control_style(Focus::Upload),
                    ))
                } else if let Some(path) = &self.session.upload_path {
                    Line::from(Span::styled(
                        format!("Using the uploaded file: {}", path.display()),
                        Style::default().fg(Color::DarkGray),
                    ))
                } else {
                    Line::from(Span::styled(
                        "Please upload a file (tab to the path field).",
                        Style::default().fg(Color::Yellow),
                    ))
                }
            }
        };
        frame.render_widget(
            Paragraph::new(vec![radio, status])
                .block(Block::default().title("File Source").borders(Borders::ALL)),
            area,
        );
    }

    fn draw_raw(&self, frame: &mut Frame, area: Rect) {
        let Some(dataset) = &self.dataset else {
            return;
        };
        frame.render_widget(
            Paragraph::new(render::render_preview(dataset, PREVIEW_ROWS)).block(
                Block::default()
                    .title("Sample of Raw Data (First 10 Rows)")
                    .borders(Borders::ALL),
            ),
            area,
        );
    }

    fn draw_params(&self, frame: &mut Frame, area: Rect) {
        let params = self.session.params();
        let filled = (self.session.safe_guard * SLIDER_CELLS as f64).round() as usize;
        let slider: String = "#".repeat(filled) + &"-".repeat(SLIDER_CELLS - filled);
        let raw_mark = if self.session.show_raw { "x" } else { " " };
        let lines = vec![
            Line::from(Span::styled(
                format!("[{raw_mark}] Show raw data"),
                self.control_style(Focus::RawData),
            )),
            Line::from(Span::styled(
                format!(
                    "Email sales per month ($ on average): {}",
                    format_usd(self.session.avg_sales_per_month as f64)
                ),
                self.control_style(Focus::Sales),
            )),
            Line::from(Span::styled(
                format!(
                    "Monthly sales to maintain: [{slider}] {:.2}",
                    self.session.safe_guard
                ),
                self.control_style(Focus::SafeGuard),
            )),
            Line::from(vec![
                Span::styled(
                    format!(
                        "Monthly sales will not go below: {}   ",
                        params.sales_floor_label()
                    ),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    if matches!(self.session.phase, Phase::Requesting) {
                        "[ Running... ]".to_string()
                    } else {
                        "[ Run Analysis ]".to_string()
                    },
                    if self.focus == Focus::Run {
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::Green)
                    },
                ),
            ]),
        ];
        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .title("Lead Scoring Analysis")
                    .borders(Borders::ALL),
            ),
            area,
        );
    }

    fn draw_results(&self, frame: &mut Frame, area: Rect) {
        match &self.session.phase {
            Phase::Idle => self.draw_message(
                frame,
                area,
                vec![
                    Line::from(Span::styled(
                        "Please upload a file.",
                        Style::default().fg(Color::Yellow),
                    )),
                    self.notice_line(),
                ],
            ),
            Phase::DataReady => self.draw_message(
                frame,
                area,
                vec![
                    Line::from(Span::styled(
                        "Press Enter on [ Run Analysis ] to score the leads.",
                        Style::default().fg(Color::DarkGray),
                    )),
                    self.notice_line(),
                ],
            ),
            Phase::Requesting => self.draw_message(
                frame,
                area,
                vec![Line::from("Lead scoring in progress. Almost done...")],
            ),
            Phase::Failed(failure) => {
                let mut lines = match failure {
                    RunFailure::Http { status, body } => vec![
                        Line::from(Span::styled(
                            "Request failed. Check server logs for details.",
                            Style::default().fg(Color::Red),
                        )),
                        Line::from(format!("Response Status Code: {status}")),
                        Line::from(format!(
                            "Response Text: {}",
                            truncate_string(body, MAX_ERROR_BODY)
                        )),
                    ],
                    RunFailure::Decode { message } => vec![Line::from(Span::styled(
                        format!("An error occurred while processing the data: {message}"),
                        Style::default().fg(Color::Red),
                    ))],
                    RunFailure::Transport { message } => vec![Line::from(Span::styled(
                        format!("Analysis failed: {message}"),
                        Style::default().fg(Color::Red),
                    ))],
                };
                lines.push(Line::from(Span::styled(
                    "Press Enter on [ Run Analysis ] to retry.",
                    Style::default().fg(Color::DarkGray),
                )));
                lines.push(self.notice_line());
                self.draw_message(frame, area, lines);
            }
            Phase::Succeeded(bundle) => self.draw_success(frame, area, bundle),
        }
    }

    fn notice_line(&self) -> Line<'_> {
        match &self.notice {
            Some(notice) => Line::from(Span::styled(
                notice.clone(),
                Style::default().fg(Color::Yellow),
            )),
            None => Line::from(""),
        }
    }

    fn draw_message(&self, frame: &mut Frame, area: Rect, lines: Vec<Line>) {
        frame.render_widget(
            Paragraph::new(lines)
                .block(Block::default().title("Results").borders(Borders::ALL))
                .wrap(Wrap { trim: false }),
            area,
        );
    }

    fn draw_success(&self, frame: &mut Frame, area: Rect, bundle: &StrategyBundle) {
        let summary_height = (bundle.expected_value.len() as u16 + 4).min(8);
        let preview_height = (PREVIEW_ROWS.min(bundle.lead_strategy.len()) as u16) + 4;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(summary_height),
                Constraint::Min(8),
                Constraint::Length(preview_height),
            ])
            .split(area);

        let file_name = download_file_name(self.session.source_tag());
        let banner = vec![
            Line::from(Span::styled(
                "Success! Lead Scoring is complete. Download the results below.",
                Style::default().fg(Color::Green),
            )),
            match &self.notice {
                Some(notice) => Line::from(Span::styled(
                    notice.clone(),
                    Style::default().fg(Color::Yellow),
                )),
                None => Line::from(Span::styled(
                    format!("Response Status Code: 200   [d] save {file_name}"),
                    Style::default().fg(Color::DarkGray),
                )),
            },
        ];
        frame.render_widget(Paragraph::new(banner), chunks[0]);

        frame.render_widget(
            Paragraph::new(render::render_table(&bundle.expected_value)).block(
                Block::default()
                    .title("Lead Strategy Summary")
                    .borders(Borders::ALL),
            ),
            chunks[1],
        );

        match optim_thresh_plot(&bundle.thresh_optim, self.session.safe_guard) {
            Ok(plot) => draw_optim_chart(frame, chunks[2], &plot),
            Err(err) => frame.render_widget(
                Paragraph::new(format!("Plot unavailable: {err}")).block(
                    Block::default()
                        .title("Expected Value Plot")
                        .borders(Borders::ALL),
                ),
                chunks[2],
            ),
        }

        frame.render_widget(
            Paragraph::new(render::render_preview(&bundle.lead_strategy, PREVIEW_ROWS)).block(
                Block::default()
                    .title("Sample of Lead Strategy (First 10 Rows)")
                    .borders(Borders::ALL),
            ),
            chunks[3],
        );
    }
}

fn draw_optim_chart(frame: &mut Frame, area: Rect, plot: &OptimPlot) {
    let [mut x_min, mut x_max] = plot.x_bounds;
    if x_min == x_max {
        x_min -= 0.5;
        x_max += 0.5;
    }
    let [mut y_min, mut y_max] = plot.y_bounds;
    if y_min == y_max {
        y_min -= 0.5;
        y_max += 0.5;
    }
    let rule = [(plot.safeguard, y_min), (plot.safeguard, y_max)];
    let datasets = vec![
        Dataset::default()
            .name(plot.y_label.clone())
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&plot.points),
        Dataset::default()
            .name("safeguard")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Yellow))
            .data(&rule),
    ];
    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title("Expected Value Plot")
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title(plot.x_label.clone())
                .bounds([x_min, x_max])
                .labels([format_axis(x_min), format_axis(x_max)]),
        )
        .y_axis(
            Axis::default()
                .title(plot.y_label.clone())
                .bounds([y_min, y_max])
                .labels([format_axis(y_min), format_axis(y_max)]),
        );
    frame.render_widget(chart, area);
}

fn format_axis(value: f64) -> String {
    if value.abs() >= 1000.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}
