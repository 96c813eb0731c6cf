// TUI module - Interactive analysis tabs and project explorer
use crate::api::HttpBackend;
use crate::cli_output::category_style;
use crate::models::{Category, FileNode, FormattedResult};
use crate::requester::{analyze_all, analyze_one};
use crate::state::{AppState, Effect, Job, Message, Tab, TABS};
use crate::upload::FolderUpload;
use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    prelude::CrosstermBackend,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, Tabs, Wrap},
    Frame, Terminal,
};
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{error, info};

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Runs effects on the tokio runtime and feeds their outcome back as messages
struct JobRunner {
    backend: Arc<HttpBackend>,
    runtime: Handle,
    tx: UnboundedSender<Message>,
    rx: UnboundedReceiver<Message>,
    jobs: HashMap<u64, JoinHandle<()>>,
}

impl JobRunner {
    fn new(backend: HttpBackend, runtime: Handle) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            backend: Arc::new(backend),
            runtime,
            tx,
            rx,
            jobs: HashMap::new(),
        }
    }

    fn run(&mut self, effect: Effect) {
        match effect {
            Effect::Analyze { pending, request } => {
                let backend = Arc::clone(&self.backend);
                let tx = self.tx.clone();
                let id = pending.id;
                let handle = self.runtime.spawn(async move {
                    let message = match pending.job {
                        Job::One(category) => {
                            match analyze_one(backend.as_ref(), category, &request).await {
                                Ok(raw) => Message::AnalysisSucceeded { id, category, raw },
                                Err(failure) => Message::AnalysisFailed {
                                    id,
                                    error: failure.to_string(),
                                },
                            }
                        }
                        Job::All => {
                            match analyze_all(backend.as_ref(), &Category::ALL, &request).await {
                                Ok(batch) => Message::BatchSucceeded { id, batch },
                                Err(failure) => Message::AnalysisFailed {
                                    id,
                                    error: failure.to_string(),
                                },
                            }
                        }
                    };
                    // The UI may already be gone
                    let _ = tx.send(message);
                });
                self.jobs.insert(id, handle);
            }
            Effect::Abort(id) => {
                if let Some(handle) = self.jobs.remove(&id) {
                    info!("Aborting analysis job {}", id);
                    handle.abort();
                }
            }
        }
    }

    fn load_folder(&self, upload: FolderUpload) {
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let message = match upload.read_all().await {
                Ok(files) => Message::TreeLoaded(crate::file_tree::build_file_tree(files)),
                Err(e) => {
                    error!("Folder upload failed: {}", e);
                    Message::TreeFailed(e.to_string())
                }
            };
            let _ = tx.send(message);
        });
    }

    fn drain(&mut self, app: &mut AppState) {
        while let Ok(message) = self.rx.try_recv() {
            if let Message::AnalysisSucceeded { id, .. }
            | Message::BatchSucceeded { id, .. }
            | Message::AnalysisFailed { id, .. } = &message
            {
                self.jobs.remove(id);
            }
            if let Some(effect) = app.update(message) {
                self.run(effect);
            }
        }
    }

    fn abort_all(&mut self) {
        for (_, handle) in self.jobs.drain() {
            handle.abort();
        }
    }
}

/// Run the TUI application. Must be called from inside a tokio runtime.
pub fn run_tui(mut app: AppState, backend: HttpBackend, folder: Option<FolderUpload>) -> Result<()> {
    let mut runner = JobRunner::new(backend, Handle::current());
    if let Some(upload) = folder {
        runner.load_folder(upload);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app, &mut runner);
    runner.abort_all();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut AppState,
    runner: &mut JobRunner,
) -> Result<()> {
    let start = Instant::now();
    loop {
        runner.drain(app);
        let tick = (start.elapsed().as_millis() / 100) as usize;
        terminal.draw(|f| ui(f, app, tick))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let message = match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Esc if !app.is_loading() => return Ok(()),
                    KeyCode::Esc | KeyCode::Char('c') => Message::Cancel,
                    KeyCode::Tab | KeyCode::Right => Message::NextTab,
                    KeyCode::BackTab | KeyCode::Left => Message::PrevTab,
                    KeyCode::Down | KeyCode::Char('j') => Message::RowDown,
                    KeyCode::Up | KeyCode::Char('k') => Message::RowUp,
                    KeyCode::Enter => Message::Activate,
                    KeyCode::Char('a') => Message::AnalyzeAll,
                    KeyCode::Char(c @ '1'..='6') => Message::SelectTab(c as usize - '1' as usize),
                    _ => continue,
                };
                if let Some(effect) = app.update(message) {
                    runner.run(effect);
                }
            }
        }
    }
}

fn ui(f: &mut Frame, app: &AppState, tick: usize) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Title + tabs
            Constraint::Length(3), // Input / status
            Constraint::Min(10),   // Main content
            Constraint::Length(3), // Footer
        ])
        .split(f.area());

    // Header with tabs
    let titles: Vec<String> = TABS
        .iter()
        .enumerate()
        .map(|(i, tab)| format!("[{}] {}", i + 1, tab.title()))
        .collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Cognitia - Code Analysis "),
        )
        .select(app.selected_tab)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, chunks[0]);

    render_status(f, app, chunks[1], tick);

    // Main content area
    match app.tab() {
        Tab::Analysis(category) => {
            render_analysis(f, category, app.formatted(category).as_ref(), chunks[2])
        }
        Tab::Suggestions => render_suggestions(f, app, chunks[2]),
        Tab::Explorer => render_explorer(f, app, chunks[2]),
    }

    // Footer
    let footer_text = if app.is_loading() {
        " q:Quit | Esc/c:Cancel | Tab:Switch | j/k:Navigate | 1-6:Jump "
    } else if app.can_analyze() {
        " q:Quit | Tab:Switch | Enter:Analyze/Open | a:Analyze all | j/k:Navigate | 1-6:Jump "
    } else {
        " q:Quit | Tab:Switch | Enter:Open | j/k:Navigate | 1-6:Jump "
    };
    let footer = Paragraph::new(footer_text)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[3]);
}

fn render_status(f: &mut Frame, app: &AppState, area: Rect, tick: usize) {
    let input = format!(
        "{} | {} | {} lines",
        app.selected_file.as_deref().unwrap_or("(input)"),
        if app.input.language.is_empty() {
            "no language"
        } else {
            app.input.language.as_str()
        },
        app.input.code.lines().count()
    );

    let (text, style) = if app.is_loading() {
        (
            format!("{} {}", SPINNER[tick % SPINNER.len()], app.status.text()),
            Style::default().fg(Color::Cyan),
        )
    } else if app.status.is_error() {
        (
            format!("✗ {}", app.status.text()),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else {
        (app.status.text().to_string(), Style::default())
    };

    let status = Paragraph::new(text)
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(format!(" {} ", input)));
    f.render_widget(status, area);
}

fn to_tui_color(color: colored::Color) -> Color {
    match color {
        colored::Color::Red => Color::Red,
        colored::Color::Blue => Color::Blue,
        colored::Color::Yellow => Color::Yellow,
        colored::Color::Green => Color::Green,
        _ => Color::White,
    }
}

fn result_lines(category: Category, result: &FormattedResult) -> Vec<Line<'static>> {
    let (_, accent) = category_style(category);
    let accent = to_tui_color(accent);
    let chip = to_tui_color(crate::cli_output::issue_color(category));
    let mut lines = Vec::new();

    if !result.summary.is_empty() {
        lines.push(Line::from(Span::styled(
            "Analysis Summary",
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(result.summary.clone()));
        lines.push(Line::from(""));
    }
    if !result.issues.is_empty() {
        lines.push(Line::from(Span::styled(
            "Issues Found",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
        for (i, issue) in result.issues.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(
                    format!(" {} ", i + 1),
                    Style::default().fg(Color::Black).bg(chip),
                ),
                Span::raw(format!(" {}", issue)),
            ]));
        }
        lines.push(Line::from(""));
    }
    if !result.recommendations.is_empty() {
        lines.push(Line::from(Span::styled(
            "Recommendations",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
        for (i, rec) in result.recommendations.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(
                    format!(" {} ", i + 1),
                    Style::default().fg(Color::Black).bg(Color::Green),
                ),
                Span::raw(format!(" {}", rec)),
            ]));
        }
    }
    lines
}

fn render_analysis(f: &mut Frame, category: Category, result: Option<&FormattedResult>, area: Rect) {
    let (glyph, _) = category_style(category);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} {} ", glyph, category.title()));

    let Some(result) = result else {
        let placeholder = Paragraph::new("No results yet. Press Enter to analyze.").block(block);
        f.render_widget(placeholder, area);
        return;
    };

    let content = Paragraph::new(result_lines(category, result))
        .wrap(Wrap { trim: true })
        .block(block);
    f.render_widget(content, area);
}

fn render_suggestions(f: &mut Frame, app: &AppState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let suggestions = app.suggestions();
    let mut left = Vec::new();
    if suggestions.is_empty() {
        left.push(Line::from("Add more code to get suggestions."));
    }
    for (i, s) in suggestions.iter().enumerate() {
        let applied = app.applied_suggestions.contains(&s.id);
        let style = if i == app.selected_row {
            Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        left.push(Line::from(vec![
            Span::styled(
                if applied { "✓ " } else { "  " },
                Style::default().fg(Color::Green),
            ),
            Span::styled(s.title.clone(), style.fg(Color::Yellow)),
            Span::styled(format!(" [{}]", s.kind.name()), Style::default().fg(Color::DarkGray)),
        ]));
        left.push(Line::from(format!("    {}", s.description)));
    }
    let left = Paragraph::new(left).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Intelligent Suggestions (Enter: apply) "),
    );
    f.render_widget(left, chunks[0]);

    let mut right = Vec::new();
    for review in app.reviews() {
        let (glyph, color) = category_style(review.category);
        right.push(Line::from(Span::styled(
            format!("{} {}", glyph, review.title),
            Style::default().fg(to_tui_color(color)).add_modifier(Modifier::BOLD),
        )));
        right.push(Line::from(format!("   {}", review.description)));
    }
    right.push(Line::from(""));
    right.push(Line::from(Span::styled(
        "Previous Suggestions",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for previous in crate::assistant::previous_suggestions() {
        right.push(Line::from(format!(" • {}", previous)));
    }
    let right = Paragraph::new(right)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(" Context Review "));
    f.render_widget(right, chunks[1]);
}

fn render_explorer(f: &mut Frame, app: &AppState, area: Rect) {
    let rows_data = app.explorer_rows();
    if rows_data.is_empty() {
        let placeholder = Paragraph::new("No folder loaded. Start with --dir <DIR>.")
            .block(Block::default().borders(Borders::ALL).title(" Explorer "));
        f.render_widget(placeholder, area);
        return;
    }

    let rows: Vec<Row> = rows_data
        .iter()
        .enumerate()
        .map(|(i, (depth, node))| {
            let mut style = if i == app.selected_row {
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            if app.selected_file.as_deref() == Some(node.path()) {
                style = style.fg(Color::Yellow);
            }
            let indent = "  ".repeat(*depth);
            let (label, language) = match node {
                FileNode::Directory { name, .. } => (format!("{}▸ {}/", indent, name), String::new()),
                FileNode::File { name, language, .. } => (format!("{}  {}", indent, name), language.clone()),
            };
            Row::new(vec![label, language]).style(style)
        })
        .collect();

    let header = Row::new(vec!["Name", "Language"])
        .style(Style::default().add_modifier(Modifier::BOLD))
        .bottom_margin(1);

    let files: usize = app.tree.iter().map(|n| n.file_count()).sum();
    let table = Table::new(rows, [Constraint::Min(30), Constraint::Length(12)])
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Explorer ({} files) ", files)),
        );
    f.render_widget(table, area);
}
