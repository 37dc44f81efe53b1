use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use milk_dairy::{CustomerDetail, Report, StoredEntry, ENTRY_COLUMNS};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

const PAGE_STEP: usize = 20;

/// Terminal viewer state for one report.
pub struct App {
    pub report: Report,
    pub state: TableState,
    pub show_detail: bool,
}

impl App {
    pub fn new(report: Report) -> Self {
        let mut state = TableState::default();
        if !report.is_empty() {
            state.select(Some(0));
        }

        Self {
            report,
            state,
            show_detail: false,
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_entry(&self) -> Option<&StoredEntry> {
        self.state.selected().and_then(|i| self.report.entries.get(i))
    }

    pub fn next(&mut self) {
        let len = self.report.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.report.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.report.len();
        if len == 0 {
            return;
        }
        let i = self
            .state
            .selected()
            .map(|i| (i + PAGE_STEP).min(len - 1))
            .unwrap_or(0);
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.report.is_empty() {
            return;
        }
        let i = self
            .state
            .selected()
            .map(|i| i.saturating_sub(PAGE_STEP))
            .unwrap_or(0);
        self.state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home if !app.report.is_empty() => app.state.select(Some(0)),
                KeyCode::End if !app.report.is_empty() => {
                    app.state.select(Some(app.report.len() - 1));
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Report title
            Constraint::Min(0),    // Entries
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_table(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let spans = vec![
        Span::styled(
            app.report.kind.title(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Entries: {}", app.report.len()),
            Style::default().fg(Color::White),
        ),
    ];

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ENTRY_COLUMNS.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.report.entries.iter().map(|stored| {
        let mut cells = stored.cells();
        cells[1] = truncate(&cells[1], 14);
        Row::new(cells.into_iter().map(Cell::from)).height(1)
    });

    let widths = [
        Constraint::Length(5),
        Constraint::Length(15),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Length(8),
        Constraint::Length(7),
        Constraint::Length(7),
        Constraint::Length(8),
        Constraint::Length(7),
        Constraint::Length(7),
        Constraint::Length(7),
        Constraint::Length(7),
        Constraint::Length(7),
        Constraint::Length(9),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Entries "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let status_spans = vec![
        Span::styled(
            format!(" Row: {}/{} ", selected, app.report.len()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" | "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" Details | "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Nav | "),
        Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)),
        Span::raw(" Fast | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Entry Details ");

    let Some(stored) = app.selected_entry() else {
        f.render_widget(Paragraph::new("  No entry selected").block(block), area);
        return;
    };
    let detail = CustomerDetail::from(stored);

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let value = Style::default().fg(Color::Green);
    let field = |name: &'static str, text: String| {
        Line::from(vec![
            Span::styled(format!("  {}: ", name), label),
            Span::styled(text, value),
        ])
    };

    let content = vec![
        Line::from(""),
        field("Customer", detail.customer_name.clone()),
        field("Dates", format!("{} → {}", detail.start_date, detail.end_date)),
        Line::from(""),
        field("Morning Mound", detail.morning_mound.to_string()),
        field("Evening Mound", detail.evening_mound.to_string()),
        field(
            "Morning",
            format!("{} (mounds) → {} (liters)", detail.morning_mound_equivalent, detail.morning_sair),
        ),
        field(
            "Evening",
            format!("{} (mounds) → {} (liters)", detail.evening_mound_equivalent, detail.evening_sair),
        ),
        field("Morning Rate", detail.morning_rate.to_string()),
        field("Evening Rate", detail.evening_rate.to_string()),
        Line::from(""),
        field("Rent", detail.rent.to_string()),
        field("Commission", detail.commission.to_string()),
        field("Bandi", detail.bandi.to_string()),
        field("Paid", detail.paid_amount.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "  Press Enter to close",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )),
    ];

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use milk_dairy::{EntryId, MilkEntry, ReportKind};

    fn app_with(rows: usize) -> App {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let entries = (0..rows)
            .map(|i| StoredEntry {
                id: EntryId(i as i64 + 1),
                entry: MilkEntry::new("Ali", day),
            })
            .collect();
        App::new(Report {
            kind: ReportKind::Daily(day),
            entries,
        })
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = app_with(3);
        assert_eq!(app.state.selected(), Some(0));

        app.previous();
        assert_eq!(app.state.selected(), Some(2));
        app.next();
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_paging_clamps() {
        let mut app = app_with(30);
        app.page_down();
        assert_eq!(app.state.selected(), Some(20));
        app.page_down();
        assert_eq!(app.state.selected(), Some(29));
        app.page_up();
        assert_eq!(app.state.selected(), Some(9));
        app.page_up();
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_empty_report_has_no_selection() {
        let mut app = app_with(0);
        app.next();
        app.page_down();
        assert!(app.selected_entry().is_none());
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("Muhammad Abdullah", 10), "Muhamma...");
        assert_eq!(truncate("Ali", 10), "Ali");
        assert_eq!(truncate("ملک ڈیری والا", 6), "ملک...");
    }
}
