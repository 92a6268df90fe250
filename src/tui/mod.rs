use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap},
};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::dashboard::{Dashboard, portal_status_text};
use crate::metadata::{Catalog, storage_key};
use crate::pairs::{Comparison, PairError};
use crate::render::{self, Preview};
use crate::state::ReviewSession;
use crate::storage::{DataSource, Origin, Storage};
use crate::{Decision, ReviewStatus, VersionPair, audit};

/// Keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    EditingNotes,
}

/// Application state for the TUI.
pub struct App {
    catalog: Catalog,
    storage: Storage,
    session: ReviewSession,
    dashboard: Dashboard,
    comparison: Option<std::result::Result<Comparison, PairError>>,
    previews: Option<(Preview, Preview)>,
    decision: Decision,
    notes: String,
    input_mode: InputMode,
    audit_download: PathBuf,
    should_quit: bool,
    show_help: bool,
    scroll_offset: u16,
    status_message: Option<(String, Instant)>,
}

impl App {
    /// Create the review app over a loaded catalog.
    ///
    /// `audit_download` is where exported audit trails are written locally.
    pub fn new(catalog: Catalog, storage: Storage, audit_download: PathBuf) -> Self {
        let dashboard = Dashboard::load(&catalog);
        let mut app = Self {
            catalog,
            storage,
            session: ReviewSession::new(),
            dashboard,
            comparison: None,
            previews: None,
            decision: Decision::default(),
            notes: String::new(),
            input_mode: InputMode::Normal,
            audit_download,
            should_quit: false,
            show_help: false,
            scroll_offset: 0,
            status_message: None,
        };
        app.refresh_comparison();

        if let Some(reason) = app.storage.probe_error() {
            app.set_status(format!("Using local sample data ({})", reason));
        }
        app
    }

    pub fn session(&self) -> &ReviewSession {
        &self.session
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn comparison(&self) -> Option<&std::result::Result<Comparison, PairError>> {
        self.comparison.as_ref()
    }

    pub fn previews(&self) -> Option<&(Preview, Preview)> {
        self.previews.as_ref()
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_ref().map(|(msg, _)| msg.as_str())
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    /// Recompute pairs for the selected batch/type and reset the review form.
    fn refresh_comparison(&mut self) {
        self.comparison = self
            .dashboard
            .selected_batch()
            .map(|batch| Comparison::build(self.catalog.records(), batch, self.dashboard.doc_type));
        if let Some(Err(e)) = &self.comparison {
            tracing::warn!(error = %e, "comparison unavailable");
        }
        self.previews = None;
        self.decision = Decision::default();
        self.notes.clear();
        self.scroll_offset = 0;
    }

    fn selected_pair(&self) -> Option<(&Comparison, VersionPair)> {
        match &self.comparison {
            Some(Ok(comparison)) => Some((comparison, comparison.selected_pair())),
            _ => None,
        }
    }

    /// Pane heading for one version of the selected comparison, with its
    /// portal status.
    pub fn version_heading(&self, version: u32) -> Option<String> {
        let (comparison, _) = self.selected_pair()?;
        let status = match self
            .catalog
            .find(&comparison.batch, comparison.doc_type, version)
        {
            Some(record) => portal_status_text(&record.portal_status, &record.reason),
            None => "Unknown".to_string(),
        };
        Some(format!("Version {} {}", version, status))
    }

    /// Fetch and render both documents of the selected pair.
    pub fn load_previews(&mut self) {
        let Some((comparison, pair)) = self.selected_pair() else {
            self.set_status("Nothing to compare");
            return;
        };

        let key_for = |version: u32| {
            self.catalog
                .find(&comparison.batch, comparison.doc_type, version)
                .map(|r| r.storage_key.clone())
                .unwrap_or_else(|| storage_key(comparison.doc_type, &comparison.batch, version))
        };
        let (left_key, right_key) = (key_for(pair.first()), key_for(pair.second()));

        let left = render::render_fetched(&left_key, self.storage.fetch_document(&left_key));
        let right = render::render_fetched(&right_key, self.storage.fetch_document(&right_key));

        let identical = matches!(
            (left.fingerprint(), right.fingerprint()),
            (Some(a), Some(b)) if a == b
        );
        self.previews = Some((left, right));
        self.scroll_offset = 0;
        if identical {
            self.set_status(format!("{}: documents are byte-identical", pair));
        }
    }

    /// Record a review for the selected pair.
    ///
    /// Returns false when there is nothing to review.
    pub fn save_review(&mut self) -> bool {
        let Some((comparison, pair)) = self.selected_pair() else {
            self.set_status("Cannot save: at least 2 versions are required");
            return false;
        };
        let batch = comparison.batch.clone();
        let doc_type = comparison.doc_type;

        self.session
            .record_review(&batch, doc_type, pair, self.decision, &self.notes);
        self.set_status(format!(
            "Review saved for {} {} ({}): {}",
            batch, doc_type, pair, self.decision
        ));
        true
    }

    /// Export the audit log locally and publish it to the storage sink.
    ///
    /// Returns the published key. Failures are shown and logged, never fatal.
    pub fn export_audit(&mut self, date: NaiveDate) -> Option<String> {
        let bytes = match audit::export(self.session.audit_log()) {
            Ok(bytes) if bytes.is_empty() => {
                self.set_status("No reviews to export");
                return None;
            }
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "audit export failed");
                self.set_status(format!("Export failed: {}", e));
                return None;
            }
        };

        if let Err(e) = audit::save_local(&bytes, &self.audit_download) {
            tracing::error!(error = %e, "failed to write local audit trail");
            self.set_status(format!("Export failed: {}", e));
            return None;
        }

        match audit::publish(self.storage.sink(), &bytes, date) {
            Ok(key) => {
                self.set_status(format!(
                    "Audit trail saved to {} and uploaded as {}",
                    self.audit_download.display(),
                    key
                ));
                Some(key)
            }
            Err(e) => {
                tracing::error!(error = %e, "audit upload failed");
                self.set_status(format!(
                    "Audit trail saved to {}; upload failed: {}",
                    self.audit_download.display(),
                    e
                ));
                None
            }
        }
    }

    /// Handle keyboard input, dispatching to the appropriate mode handler.
    pub fn handle_input(&mut self, key: event::KeyEvent) -> Result<()> {
        if self.show_help {
            // Any key closes help
            self.show_help = false;
            return Ok(());
        }

        match self.input_mode {
            InputMode::Normal => self.handle_normal_input(key),
            InputMode::EditingNotes => self.handle_notes_input(key),
        }
        Ok(())
    }

    fn handle_normal_input(&mut self, key: event::KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.dashboard.select_next();
                self.refresh_comparison();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.dashboard.select_prev();
                self.refresh_comparison();
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.dashboard.toggle_doc_type();
                self.refresh_comparison();
            }
            KeyCode::Char('l') | KeyCode::Right => {
                if let Some(Ok(comparison)) = &mut self.comparison {
                    comparison.select_next();
                    self.previews = None;
                }
            }
            KeyCode::Char('h') | KeyCode::Left => {
                if let Some(Ok(comparison)) = &mut self.comparison {
                    comparison.select_prev();
                    self.previews = None;
                }
            }
            KeyCode::Enter => {
                self.load_previews();
            }
            KeyCode::Char('d') => {
                self.decision = self.decision.next();
            }
            KeyCode::Char('n') => {
                self.input_mode = InputMode::EditingNotes;
            }
            KeyCode::Char('s') => {
                self.save_review();
            }
            KeyCode::Char('e') => {
                self.export_audit(Local::now().date_naive());
            }
            KeyCode::PageDown => {
                self.scroll_offset = self.scroll_offset.saturating_add(10);
            }
            KeyCode::PageUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(10);
            }
            _ => {}
        }
    }

    fn handle_notes_input(&mut self, key: event::KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Backspace => {
                self.notes.pop();
            }
            KeyCode::Char(c) => {
                self.notes.push(c);
            }
            _ => {}
        }
    }

    /// Render the UI.
    fn render(&mut self, frame: &mut Frame) {
        // Expire old status messages
        let expired = self
            .status_message
            .as_ref()
            .map(|(_, time)| time.elapsed() >= Duration::from_secs(5))
            .unwrap_or(false);
        if expired {
            self.status_message = None;
        }

        if self.show_help {
            self.render_help(frame);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(1),
                Constraint::Length(3),
            ])
            .split(frame.area());

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
            .split(chunks[1]);

        self.render_header(frame, chunks[0]);
        self.render_batch_table(frame, main_chunks[0]);
        self.render_comparison(frame, main_chunks[1]);
        self.render_status_bar(frame, chunks[2]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let progress = self.session.progress(self.catalog.records());
        let source = match self.storage.source() {
            DataSource::Remote => Span::styled(
                format!("Remote storage: {}", self.storage.sink().describe()),
                Style::default().fg(Color::Green),
            ),
            DataSource::LocalSample => Span::styled(
                "Using local sample data",
                Style::default().fg(Color::Yellow),
            ),
        };
        let line = Line::from(vec![
            source,
            Span::raw(format!(
                " | {}/{} reviewed ({:.0}%)",
                progress.reviewed,
                progress.total,
                progress.percent()
            )),
        ]);

        let paragraph = Paragraph::new(line).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Document Review"),
        );
        frame.render_widget(paragraph, area);
    }

    /// Render the batch table with per-type review tags.
    fn render_batch_table(&self, frame: &mut Frame, area: Rect) {
        let rows: Vec<Row> = self
            .dashboard
            .items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let is_selected = idx == self.dashboard.selected;
                let prefix = if is_selected { ">" } else { " " };

                let mut cells = vec![
                    Cell::from(format!("{} {}", prefix, item.batch)),
                    Cell::from(item.versions.len().to_string()),
                ];
                for (_, status) in self.dashboard.statuses(&self.session, idx) {
                    cells.push(Cell::from(Line::from(status_tag(status))));
                }

                let style = if is_selected {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Row::new(cells).style(style)
            })
            .collect();

        let widths = [
            Constraint::Percentage(30),
            Constraint::Percentage(10),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ];

        let header = Row::new(vec!["Batch", "Ver", "CI", "PL"]).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

        let table = Table::new(rows, widths)
            .block(Block::default().borders(Borders::ALL).title("Batches (j/k)"))
            .header(header);

        frame.render_widget(table, area);
    }

    /// Render the batch details, pair selector, previews and review form.
    fn render_comparison(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(1),
                Constraint::Length(4),
            ])
            .split(area);

        let doc_type = self.dashboard.doc_type;
        let Some(item) = self.dashboard.selected_item() else {
            let paragraph = Paragraph::new("No batches in metadata")
                .block(Block::default().borders(Borders::ALL).title("Comparison"));
            frame.render_widget(paragraph, area);
            return;
        };

        let status = self.session.get_status(&item.batch, doc_type);
        let details = Text::from(vec![
            Line::from(vec![
                Span::raw("Review status: "),
                status_tag(status),
            ]),
            Line::from(format!(
                "Latest portal status: {}",
                portal_status_text(&item.portal_status, &item.reason)
            )),
        ]);
        let paragraph = Paragraph::new(details).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Batch {} / {} (Tab)", item.batch, doc_type)),
        );
        frame.render_widget(paragraph, chunks[0]);

        match &self.comparison {
            Some(Ok(comparison)) => {
                let titles: Vec<String> = comparison.pairs.iter().map(|p| p.to_string()).collect();
                let tabs = Tabs::new(titles)
                    .select(comparison.selected)
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .title("Compare (h/l, Enter to load)"),
                    )
                    .highlight_style(
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    );
                frame.render_widget(tabs, chunks[1]);
                self.render_previews(frame, chunks[2]);
            }
            Some(Err(e)) => {
                let warning = Paragraph::new(e.to_string())
                    .style(Style::default().fg(Color::Yellow))
                    .block(Block::default().borders(Borders::ALL).title("Compare"))
                    .wrap(Wrap { trim: false });
                frame.render_widget(warning, chunks[1].union(chunks[2]));
            }
            None => {}
        }

        self.render_review_form(frame, chunks[3]);
    }

    fn render_previews(&self, frame: &mut Frame, area: Rect) {
        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let Some((left, right)) = &self.previews else {
            let paragraph = Paragraph::new("Press Enter to load the selected versions")
                .block(Block::default().borders(Borders::ALL).title("Preview"));
            frame.render_widget(paragraph, area);
            return;
        };

        let versions = self
            .selected_pair()
            .map(|(_, pair)| (pair.first(), pair.second()));
        let headings = match versions {
            Some((first, second)) => [self.version_heading(first), self.version_heading(second)],
            None => [None, None],
        };

        let panes = [(left, panes[0]), (right, panes[1])];
        for ((preview, pane), heading) in panes.into_iter().zip(headings) {
            let key = match preview {
                Preview::Document(doc) => doc.key.clone(),
                Preview::Placeholder { key, .. } => key.clone(),
            };
            let title = heading.unwrap_or_else(|| key.clone());
            let mut lines = vec![Line::from(Span::styled(
                key,
                Style::default().fg(Color::DarkGray),
            ))];
            lines.extend(preview_lines(preview));
            let paragraph = Paragraph::new(Text::from(lines))
                .block(Block::default().borders(Borders::ALL).title(title))
                .wrap(Wrap { trim: false })
                .scroll((self.scroll_offset, 0));
            frame.render_widget(paragraph, pane);
        }
    }

    fn render_review_form(&self, frame: &mut Frame, area: Rect) {
        let notes_style = if self.input_mode == InputMode::EditingNotes {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let cursor = if self.input_mode == InputMode::EditingNotes {
            "_"
        } else {
            ""
        };

        let text = Text::from(vec![
            Line::from(vec![
                Span::raw("Decision (d): "),
                Span::styled(
                    self.decision.label(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::raw("Notes (n): "),
                Span::styled(format!("{}{}", self.notes, cursor), notes_style),
            ]),
        ]);

        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Review (s to save)"))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let status_text = match &self.status_message {
            Some((msg, _)) => msg.clone(),
            None => format!(
                "{} audit entries | j/k: batch  Tab: type  h/l: pair  Enter: load  d: decision  n: notes  s: save  e: export  ?: help  q: quit",
                self.session.audit_log().len()
            ),
        };

        let paragraph = Paragraph::new(status_text)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: false });

        frame.render_widget(paragraph, area);
    }

    /// Render the help overlay.
    fn render_help(&self, frame: &mut Frame) {
        let help_text = [
            "Document Review - Keyboard Shortcuts",
            "",
            "Navigation:",
            "  j / Down      - Next batch",
            "  k / Up        - Previous batch",
            "  Tab           - Switch document type (CI/PL)",
            "  h / l         - Previous / next version pair",
            "  PgUp / PgDn   - Scroll previews",
            "",
            "Review:",
            "  Enter         - Load previews for the selected pair",
            "  d             - Cycle decision",
            "  n             - Edit notes (Enter/Esc to finish)",
            "  s             - Save review",
            "  e             - Export audit trail",
            "",
            "Other:",
            "  ?             - Show this help",
            "  q / Esc       - Quit",
            "",
            "Press any key to close this help",
        ];

        let text = Text::from(help_text.iter().map(|&s| Line::from(s)).collect::<Vec<_>>());

        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Help"))
            .wrap(Wrap { trim: false });

        let area = centered_rect(60, 80, frame.area());
        frame.render_widget(Clear, area);
        frame.render_widget(paragraph, area);
    }
}

/// Colored tag for a review status.
pub fn status_tag(status: ReviewStatus) -> Span<'static> {
    let color = match status {
        ReviewStatus::Reviewed => Color::Green,
        ReviewStatus::NotReviewed => Color::Red,
    };
    Span::styled(
        status.label(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )
}

/// Text lines describing one preview pane.
pub fn preview_lines(preview: &Preview) -> Vec<Line<'static>> {
    match preview {
        Preview::Placeholder { title, message, .. } => vec![
            Line::from(Span::styled(
                title.clone(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(message.clone()),
        ],
        Preview::Document(doc) => {
            let origin = match doc.origin {
                Some(Origin::Remote) => "remote",
                Some(Origin::Local) => "local",
                None => "-",
            };
            let mut lines = vec![
                Line::from(Span::styled(
                    doc.title.clone().unwrap_or_else(|| "(untitled)".to_string()),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(format!(
                    "{} page(s), {} bytes, from {}",
                    doc.page_count, doc.size_bytes, origin
                )),
                Line::from(Span::styled(
                    format!("sha256 {}", &doc.sha256[..16.min(doc.sha256.len())]),
                    Style::default().fg(Color::DarkGray),
                )),
                Line::from(""),
            ];
            lines.extend(doc.excerpt.iter().map(|l| Line::from(l.clone())));
            lines
        }
    }
}

/// Create a centered rectangle.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Setup the terminal for TUI rendering.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("Failed to create terminal")
}

/// Restore the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Launch the interactive review interface.
pub fn run_tui(mut app: App) -> Result<()> {
    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;

    let result = (|| -> Result<()> {
        loop {
            terminal
                .draw(|f| app.render(f))
                .context("Failed to draw frame")?;

            if app.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(200)).context("Failed to poll events")?
                && let Event::Key(key) = event::read().context("Failed to read event")?
            {
                // Ignore key release events
                if key.kind == event::KeyEventKind::Press {
                    app.handle_input(key)?;
                }
            }
        }
        Ok(())
    })();

    // Restore terminal in all cases
    restore_terminal(&mut terminal)?;

    tracing::info!(
        reviews = app.session.audit_log().len(),
        "review session ended"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{MetadataRow, sample_rows};
    use crate::storage::{BlobStore, LocalStore};
    use crate::{DocType, demo};
    use crossterm::event::KeyEvent;

    fn press(app: &mut App, code: KeyCode) {
        app.handle_input(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap();
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn sample_app(dir: &std::path::Path) -> App {
        let catalog = Catalog::from_rows(&sample_rows(), DataSource::LocalSample).unwrap();
        let storage = Storage::local_only(LocalStore::new(dir.join("documents")));
        App::new(catalog, storage, dir.join("audit_trail.csv"))
    }

    #[test]
    fn starts_on_first_batch_with_one_pair() {
        let dir = tempfile::tempdir().unwrap();
        let app = sample_app(dir.path());

        assert_eq!(app.dashboard().selected_batch(), Some("B001"));
        let comparison = app.comparison().unwrap().as_ref().unwrap();
        assert_eq!(comparison.doc_type, DocType::CI);
        assert_eq!(comparison.pairs, vec![VersionPair::new(1, 2).unwrap()]);
    }

    #[test]
    fn save_marks_batch_reviewed_and_logs_decision() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = sample_app(dir.path());

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.input_mode(), InputMode::EditingNotes);
        type_text(&mut app, "seal missx");
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('s'));

        let session = app.session();
        assert_eq!(session.get_status("B001", DocType::CI), ReviewStatus::Reviewed);
        assert_eq!(session.get_status("B001", DocType::PL), ReviewStatus::NotReviewed);
        let entry = &session.audit_log()[0];
        assert_eq!(entry.decision, Decision::Reject);
        assert_eq!(entry.notes, "seal miss");
        assert!(app.status_message().unwrap().contains("Review saved"));
    }

    #[test]
    fn notes_mode_captures_command_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = sample_app(dir.path());

        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "qs");
        assert_eq!(app.notes(), "qs");
        assert!(!app.should_quit);
        assert!(app.session().audit_log().is_empty());
    }

    #[test]
    fn switching_batch_resets_form() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = sample_app(dir.path());

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.dashboard().selected_batch(), Some("B002"));
        assert_eq!(app.decision(), Decision::Accept);

        press(&mut app, KeyCode::Tab);
        let comparison = app.comparison().unwrap().as_ref().unwrap();
        assert_eq!(comparison.batch, "B002");
        assert_eq!(comparison.doc_type, DocType::PL);
    }

    #[test]
    fn single_version_batch_refuses_save() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![MetadataRow {
            batch: "B100".to_string(),
            batch_count: 1,
            portal_status: None,
            reason: None,
        }];
        let catalog = Catalog::from_rows(&rows, DataSource::LocalSample).unwrap();
        let storage = Storage::local_only(LocalStore::new(dir.path()));
        let mut app = App::new(catalog, storage, dir.path().join("audit.csv"));

        assert!(matches!(
            app.comparison(),
            Some(Err(PairError::NotEnoughVersions { found: 1, .. }))
        ));
        assert!(!app.save_review());
        assert!(app.session().audit_log().is_empty());
    }

    #[test]
    fn load_previews_uses_local_documents() {
        let dir = tempfile::tempdir().unwrap();
        demo::generate(&dir.path().join("documents")).unwrap();
        let mut app = sample_app(dir.path());

        press(&mut app, KeyCode::Enter);
        let (left, right) = app.previews().unwrap();
        let Preview::Document(left) = left else {
            panic!("expected document preview");
        };
        assert_eq!(left.key, "CI/B001/B001_1.pdf");
        assert_eq!(left.origin, Some(Origin::Local));
        assert!(!right.is_placeholder());
    }

    #[test]
    fn panes_show_portal_status_per_version() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = sample_app(dir.path());

        assert_eq!(app.version_heading(1).as_deref(), Some("Version 1 Pending"));
        assert_eq!(
            app.version_heading(2).as_deref(),
            Some("Version 2 Accepted (Approved by agent)")
        );
        assert_eq!(app.version_heading(7).as_deref(), Some("Version 7 Unknown"));

        app.load_previews();
        let mut terminal = Terminal::new(ratatui::backend::TestBackend::new(200, 60)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        let screen: Vec<String> = buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect())
            .collect();
        assert!(screen.iter().any(|row| row.contains("Version 1 Pending")));
        assert!(
            screen
                .iter()
                .any(|row| row.contains("Version 2 Accepted (Approved by agent)"))
        );
    }

    #[test]
    fn missing_documents_render_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = sample_app(dir.path());

        app.load_previews();
        let (left, right) = app.previews().unwrap();
        assert!(left.is_placeholder());
        assert!(right.is_placeholder());
    }

    #[test]
    fn export_writes_local_copy_and_publishes() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = sample_app(dir.path());
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        assert_eq!(app.export_audit(date), None);
        assert_eq!(app.status_message(), Some("No reviews to export"));

        press(&mut app, KeyCode::Char('s'));
        let key = app.export_audit(date).unwrap();
        assert_eq!(key, "audit/audit_trails/2024-03-01/audit_trail.csv");

        let local = std::fs::read_to_string(dir.path().join("audit_trail.csv")).unwrap();
        assert!(local.starts_with("timestamp,batch,doc_type,v1_v2,status,notes,decision"));
        let published = LocalStore::new(dir.path().join("documents"))
            .get_object_bytes(&key)
            .unwrap();
        assert_eq!(published, local.as_bytes());
    }

    #[test]
    fn status_tag_colors() {
        assert_eq!(status_tag(ReviewStatus::Reviewed).content, "Reviewed");
        assert_eq!(status_tag(ReviewStatus::Reviewed).style.fg, Some(Color::Green));
        assert_eq!(status_tag(ReviewStatus::NotReviewed).content, "Not Reviewed");
        assert_eq!(status_tag(ReviewStatus::NotReviewed).style.fg, Some(Color::Red));
    }

    #[test]
    fn help_swallows_next_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = sample_app(dir.path());

        press(&mut app, KeyCode::Char('?'));
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
