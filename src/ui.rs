use crate::analytics::Analytics;
use crate::entities::{Loan, Person, DATE_FORMAT};
use crate::main_window::{HelpWindow, MainWindow};
use crate::view_state::{Panel, PanelSize, ViewState};
use anyhow::Result;
use chrono::{Local, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetSize},
};
use log::{error, warn};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;

/// Layout units per terminal row when turning a height cap into rows
pub const LAYOUT_UNITS_PER_ROW: u16 = 24;

pub struct App {
    pub window: MainWindow,
    pub person_state: TableState,
    pub loan_state: TableState,
}

impl App {
    pub fn new(window: MainWindow) -> Self {
        let mut person_state = TableState::default();
        if !window.logic().model().filtered_person_list().is_empty() {
            person_state.select(Some(0));
        }

        Self {
            window,
            person_state,
            loan_state: TableState::default(),
        }
    }

    pub fn submit(&mut self) {
        self.window.submit_command();
        self.clamp_selection();
    }

    /// Keep selections inside the (possibly shrunk) lists
    fn clamp_selection(&mut self) {
        let model = self.window.logic().model();
        clamp(&mut self.person_state, model.filtered_person_list().len());
        clamp(&mut self.loan_state, model.sorted_loan_list().len());
    }

    pub fn next(&mut self) {
        let len = self.window.logic().model().filtered_person_list().len();
        if len == 0 {
            return;
        }
        let i = match self.person_state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.person_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.window.logic().model().filtered_person_list().len();
        if len == 0 {
            return;
        }
        let i = match self.person_state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.person_state.select(Some(i));
    }
}

fn clamp(state: &mut TableState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        None => state.select(Some(0)),
        _ => {}
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    // Restore the size from the last session; terminals that cannot resize ignore this
    let settings = app.window.logic().gui_settings();
    if let Err(err) = execute!(stdout, SetSize(settings.window_width, settings.window_height)) {
        warn!("Could not restore terminal size: {}", err);
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    if let Ok(size) = terminal.size() {
        app.window.resize(size.width, size.height);
    }

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("UI loop failed: {:?}", err);
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    while app.window.is_open() {
        terminal.draw(|f| ui(f, app))?;

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key.code, key.modifiers),
            Event::Resize(width, height) => app.window.resize(width, height),
            _ => {}
        }
    }

    Ok(())
}

pub fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => app.window.handle_exit(),
        KeyCode::F(1) => app.window.handle_help(),
        KeyCode::Esc if app.window.help_window().is_showing() => app.window.hide_help(),
        KeyCode::Enter => app.submit(),
        KeyCode::Backspace => app.window.command_box_mut().pop(),
        KeyCode::Down => app.next(),
        KeyCode::Up => app.previous(),
        KeyCode::Char(c) => app.window.command_box_mut().push(c),
        _ => {}
    }
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with tabs
            Constraint::Length(3), // Command box
            Constraint::Length(5), // Result display
            Constraint::Min(0),    // Panels
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_command_box(f, chunks[1], app);
    render_result_display(f, chunks[2], app);
    render_panels(f, chunks[3], app);
    render_status_bar(f, chunks[4], app);

    if app.window.help_window().is_showing() {
        let area = f.size();
        render_help(f, area);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let model = app.window.logic().model();
    let active = app.window.view_state();

    let tabs = [
        ViewState::Person,
        ViewState::Loans,
        ViewState::PersonAndLoans,
        ViewState::Analytics,
    ];

    let mut tab_spans = vec![];
    for (i, state) in tabs.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *state == active {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(state.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Persons: {}", model.address_book().persons().len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("Loans: {}", model.address_book().loans().len()),
        Style::default().fg(Color::Cyan),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_command_box(f: &mut Frame, area: Rect, app: &App) {
    let command_box = app.window.command_box();
    let color = if command_box.has_error() { Color::Red } else { Color::White };

    let input = Paragraph::new(command_box.text())
        .style(Style::default().fg(color))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .title(" Enter command here... "),
        );
    f.render_widget(input, area);

    if !app.window.help_window().is_showing() {
        let x = area.x + 1 + command_box.text().chars().count() as u16;
        f.set_cursor(x.min(area.right().saturating_sub(2)), area.y + 1);
    }
}

fn render_result_display(f: &mut Frame, area: Rect, app: &App) {
    let result = Paragraph::new(app.window.result_display().feedback())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White)),
        );
    f.render_widget(result, area);
}

fn constraint_for(size: PanelSize) -> Constraint {
    match size {
        PanelSize::Fill => Constraint::Min(0),
        PanelSize::Capped(units) => Constraint::Max((units / LAYOUT_UNITS_PER_ROW).max(3)),
    }
}

fn render_panels(f: &mut Frame, area: Rect, app: &mut App) {
    let panels = app.window.layout().visible_panels();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(panels.iter().map(|(_, size)| constraint_for(*size)).collect::<Vec<_>>())
        .split(area);

    let today = Local::now().date_naive();
    for ((panel, _), chunk) in panels.iter().zip(chunks.iter()) {
        match panel {
            Panel::Person => render_person_list(f, *chunk, app),
            Panel::Loans => render_loan_list(f, *chunk, app, today),
            Panel::Analytics => render_analytics(f, *chunk, app, today),
        }
    }
}

fn render_person_list(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["#", "Name", "Phone", "Email", "Address", "Tags"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let model = app.window.logic().model();
    let rows = model.filtered_person_list().into_iter().enumerate().map(|(i, p)| {
        let cells = vec![
            Cell::from(format!("{}", i + 1)),
            Cell::from(p.name.as_str().to_string()),
            Cell::from(p.phone.as_str().to_string()),
            Cell::from(truncate(p.email.as_str(), 28)),
            Cell::from(truncate(p.address.as_str(), 32)),
            Cell::from(tags_text(p)).style(Style::default().fg(Color::Cyan)),
        ];
        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(22),
            Constraint::Length(12),
            Constraint::Length(30),
            Constraint::Length(34),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Persons "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.person_state);
}

fn render_loan_list(f: &mut Frame, area: Rect, app: &mut App, today: NaiveDate) {
    let model = app.window.logic().model();
    let show_loanee = model.loanee_info();

    let mut titles = vec!["#", "Amount", "Start", "Return", "Status"];
    if show_loanee {
        titles.push("Loanee");
        titles.push("Phone");
    }

    let header_cells = titles.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = model.sorted_loan_list().into_iter().enumerate().map(|(i, loan)| {
        let color = status_color(loan, today);
        let mut cells = vec![
            Cell::from(format!("{}", i + 1)),
            Cell::from(loan.amount.to_string()).style(Style::default().fg(color)),
            Cell::from(loan.start_date.format(DATE_FORMAT).to_string()),
            Cell::from(loan.return_date.format(DATE_FORMAT).to_string()),
            Cell::from(loan.status_label(today)).style(Style::default().fg(color)),
        ];
        if show_loanee {
            let loanee = model.address_book().person(loan.assignee);
            cells.push(Cell::from(loanee.map(|p| p.name.as_str().to_string()).unwrap_or_default()));
            cells.push(Cell::from(loanee.map(|p| p.phone.as_str().to_string()).unwrap_or_default()));
        }
        Row::new(cells).height(1)
    });

    let mut widths = vec![
        Constraint::Length(4),
        Constraint::Length(14),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(10),
    ];
    if show_loanee {
        widths.push(Constraint::Length(22));
        widths.push(Constraint::Length(12));
    }

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Loans "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.loan_state);
}

fn render_analytics(f: &mut Frame, area: Rect, app: &App, today: NaiveDate) {
    let model = app.window.logic().model();
    let stats = model.analytics(today);
    let subject = model
        .analytics_target()
        .map(|p| p.name.as_str().to_string())
        .unwrap_or_else(|| "All persons".to_string());

    let content = analytics_lines(&subject, &stats);

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Analytics "),
    );

    f.render_widget(paragraph, area);
}

fn analytics_lines(subject: &str, stats: &Analytics) -> Vec<Line<'static>> {
    let label = |text: &str| {
        Span::styled(
            format!("  {:<24}", text),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )
    };
    let date = |d: Option<NaiveDate>| {
        d.map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    let dollars = |cents: u64| format!("${:.2}", cents as f64 / 100.0);

    vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            format!("  {}", subject),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )]),
        Line::from(""),
        Line::from(vec![label("Loans:"), Span::raw(stats.num_loans.to_string())]),
        Line::from(vec![
            label("Active loans:"),
            Span::raw(format!(
                "{} ({:.0}%)",
                stats.num_active_loans,
                stats.proportion_active() * 100.0
            )),
        ]),
        Line::from(vec![
            label("Overdue loans:"),
            Span::styled(
                format!(
                    "{} ({:.0}%)",
                    stats.num_overdue_loans,
                    stats.proportion_overdue() * 100.0
                ),
                Style::default().fg(Color::Red),
            ),
        ]),
        Line::from(""),
        Line::from(vec![label("Total loaned:"), Span::raw(dollars(stats.total_loaned))]),
        Line::from(vec![label("Total active:"), Span::raw(dollars(stats.total_active))]),
        Line::from(vec![
            label("Total overdue:"),
            Span::styled(dollars(stats.total_overdue), Style::default().fg(Color::Red)),
        ]),
        Line::from(vec![
            label("Average loan:"),
            Span::raw(format!("${:.2}", stats.average_loan_value())),
        ]),
        Line::from(vec![
            label("Average active loan:"),
            Span::raw(format!("${:.2}", stats.average_active_value())),
        ]),
        Line::from(vec![
            label("Average overdue loan:"),
            Span::raw(format!("${:.2}", stats.average_overdue_value())),
        ]),
        Line::from(""),
        Line::from(vec![label("Earliest loan:"), Span::raw(date(stats.earliest_loan_date))]),
        Line::from(vec![label("Latest loan:"), Span::raw(date(stats.latest_loan_date))]),
        Line::from(vec![label("Earliest return due:"), Span::raw(date(stats.earliest_return_date))]),
        Line::from(vec![label("Latest return due:"), Span::raw(date(stats.latest_return_date))]),
    ]
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let status_spans = vec![
        Span::styled(
            format!(" {} ", app.window.status_bar().text()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" | "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" Run | "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Nav | "),
        Span::styled("F1", Style::default().fg(Color::Yellow)),
        Span::raw(" Help | "),
        Span::styled("Ctrl-C", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_help(f: &mut Frame, area: Rect) {
    let popup = centered_rect(80, 70, area);

    let mut content = vec![Line::from("")];
    for line in HelpWindow::lines() {
        content.push(Line::from(format!("  {}", line)));
    }
    content.push(Line::from(""));
    content.push(Line::from(vec![Span::styled(
        "  Press Esc to close",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )]));

    let help = Paragraph::new(content).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Help "),
    );

    f.render_widget(Clear, popup);
    f.render_widget(help, popup);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn status_color(loan: &Loan, today: NaiveDate) -> Color {
    if loan.is_returned {
        Color::Green
    } else if loan.is_overdue(today) {
        Color::Red
    } else {
        Color::Yellow
    }
}

fn tags_text(person: &Person) -> String {
    person
        .tags
        .iter()
        .map(|t| format!("[{}]", t.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
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
    use crate::logic::test_support::typical_logic;
    use ratatui::backend::TestBackend;

    fn app() -> App {
        App::new(MainWindow::new(typical_logic()))
    }

    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 45)).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn type_and_submit(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_key(app, KeyCode::Char(c), KeyModifiers::NONE);
        }
        handle_key(app, KeyCode::Enter, KeyModifiers::NONE);
    }

    #[test]
    fn test_person_panel_rendered_by_default() {
        let mut app = app();
        let screen = draw(&mut app);
        assert!(screen.contains("Alice Pauline"));
        assert!(!screen.contains("Return"));
        assert!(screen.contains("./:memory:"));
    }

    #[test]
    fn test_view_loan_renders_both_panels() {
        let mut app = app();
        type_and_submit(&mut app, "viewloan 1");
        let screen = draw(&mut app);

        assert!(screen.contains("Address"));
        assert!(screen.contains("Return"));
        assert!(screen.contains("$500.00"));
        assert!(!screen.contains("Benson Meier"));
    }

    #[test]
    fn test_toggle_info_adds_loanee_columns() {
        let mut app = app();
        type_and_submit(&mut app, "viewloans");
        assert!(!draw(&mut app).contains("Loanee"));

        type_and_submit(&mut app, "toggleinfo");
        let screen = draw(&mut app);
        assert!(screen.contains("Loanee"));
        assert!(screen.contains("Benson Meier"));
    }

    #[test]
    fn test_analytics_panel() {
        let mut app = app();
        type_and_submit(&mut app, "analytics 1");
        let screen = draw(&mut app);
        assert!(screen.contains("Total loaned:"));
        assert!(screen.contains("$620.50"));
    }

    #[test]
    fn test_error_feedback_rendered() {
        let mut app = app();
        type_and_submit(&mut app, "markloan 1 1");
        let screen = draw(&mut app);
        assert!(screen.contains("not implemented yet"));
        assert_eq!(app.window.command_box().text(), "markloan 1 1");
    }

    #[test]
    fn test_f1_opens_help_overlay_once() {
        let mut app = app();
        handle_key(&mut app, KeyCode::F(1), KeyModifiers::NONE);
        handle_key(&mut app, KeyCode::F(1), KeyModifiers::NONE);
        assert_eq!(app.window.help_window().times_opened(), 1);
        assert!(draw(&mut app).contains("Press Esc to close"));

        handle_key(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert!(!app.window.help_window().is_showing());
    }

    #[test]
    fn test_selection_clamped_after_delete() {
        let mut app = app();
        handle_key(&mut app, KeyCode::Up, KeyModifiers::NONE); // wraps to last
        assert_eq!(app.person_state.selected(), Some(2));

        type_and_submit(&mut app, "delete 3");
        assert_eq!(app.person_state.selected(), Some(1));
    }

    #[test]
    fn test_ctrl_c_closes_window() {
        let mut app = app();
        handle_key(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(!app.window.is_open());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long address", 10), "a very ...");
    }
}
