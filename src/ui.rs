use anyhow::Result;
use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use pocketwatch::{
    clamp_page, compare, filter_and_sort, page_window, query, summarize, today, validate_input,
    Category, Expense, ExpenseInput, ExpenseStore, QueryParams, QueryResult, ReportPeriod, Trend,
    ValidationError, PAGE_SIZE_CHOICES,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Expenses,
    Summary,
    Comparison,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Expenses => Page::Summary,
            Page::Summary => Page::Comparison,
            Page::Comparison => Page::Expenses,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Expenses => Page::Comparison,
            Page::Summary => Page::Expenses,
            Page::Comparison => Page::Summary,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Expenses => "Expenses",
            Page::Summary => "Summary",
            Page::Comparison => "Monthly Comparison",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Keystrokes edit the search term
    Search,
    /// Keystrokes edit the open add/edit form
    Form,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Amount,
    Category,
    Description,
    Date,
}

impl FormField {
    const ALL: [FormField; 4] = [
        FormField::Amount,
        FormField::Category,
        FormField::Description,
        FormField::Date,
    ];

    fn label(&self) -> &'static str {
        match self {
            FormField::Amount => "Amount",
            FormField::Category => "Category",
            FormField::Description => "Description",
            FormField::Date => "Date",
        }
    }

    fn key(&self) -> &'static str {
        match self {
            FormField::Amount => "amount",
            FormField::Category => "category",
            FormField::Description => "description",
            FormField::Date => "date",
        }
    }

    fn next(&self) -> Self {
        match self {
            FormField::Amount => FormField::Category,
            FormField::Category => FormField::Description,
            FormField::Description => FormField::Date,
            FormField::Date => FormField::Amount,
        }
    }

    fn previous(&self) -> Self {
        match self {
            FormField::Amount => FormField::Date,
            FormField::Category => FormField::Amount,
            FormField::Description => FormField::Category,
            FormField::Date => FormField::Description,
        }
    }
}

/// Add/edit form over raw text, checked on submit
#[derive(Debug, Clone)]
pub struct ExpenseForm {
    /// Id of the record being edited; `None` adds a new one
    pub editing: Option<String>,
    pub input: ExpenseInput,
    pub field: FormField,
    pub errors: Vec<ValidationError>,
}

impl ExpenseForm {
    fn new_expense() -> Self {
        ExpenseForm {
            editing: None,
            input: ExpenseInput {
                category: Category::ALL[0].label().to_string(),
                ..ExpenseInput::default()
            },
            field: FormField::Amount,
            errors: Vec::new(),
        }
    }

    fn edit(expense: &Expense) -> Self {
        ExpenseForm {
            editing: Some(expense.id.clone()),
            input: ExpenseInput::from_expense(expense),
            field: FormField::Amount,
            errors: Vec::new(),
        }
    }

    fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Amount => &self.input.amount,
            FormField::Category => &self.input.category,
            FormField::Description => &self.input.description,
            FormField::Date => &self.input.date,
        }
    }

    fn value_mut(&mut self) -> &mut String {
        match self.field {
            FormField::Amount => &mut self.input.amount,
            FormField::Category => &mut self.input.category,
            FormField::Description => &mut self.input.description,
            FormField::Date => &mut self.input.date,
        }
    }

    /// Step the category through the fixed list
    fn cycle_category(&mut self, forward: bool) {
        let current = self.input.category.parse::<Category>().ok();
        let next = match current {
            Some(c) if forward => c.next(),
            Some(c) => Category::ALL[(c.index() + Category::COUNT - 1) % Category::COUNT],
            None => Category::ALL[0],
        };
        self.input.category = next.label().to_string();
    }

    fn error_for(&self, field: FormField) -> Option<&ValidationError> {
        self.errors.iter().find(|e| e.field == field.key())
    }
}

pub struct App {
    pub store: ExpenseStore,
    pub params: QueryParams,
    pub result: QueryResult,
    pub state: TableState,
    pub current_page: Page,
    pub report_period: ReportPeriod,
    pub input_mode: InputMode,
    pub form: Option<ExpenseForm>,
    pub show_detail: bool,
    /// Id awaiting delete confirmation
    pub pending_delete: Option<String>,
    pub today: NaiveDate,
}

impl App {
    pub fn new(store: ExpenseStore, page_size: usize) -> Self {
        Self::with_today(store, page_size, today())
    }

    pub fn with_today(store: ExpenseStore, page_size: usize, today: NaiveDate) -> Self {
        let params = QueryParams::default().with_page_size(page_size);
        let result = query(store.expenses(), &params, today);

        let mut app = Self {
            store,
            params,
            result,
            state: TableState::default(),
            current_page: Page::Expenses,
            report_period: ReportPeriod::Month,
            input_mode: InputMode::Normal,
            form: None,
            show_detail: false,
            pending_delete: None,
            today,
        };
        app.refresh();
        app
    }

    /// Re-run the query after any change to params or the collection
    pub fn refresh(&mut self) {
        let total = filter_and_sort(self.store.expenses(), &self.params, self.today).len();
        self.params.page = clamp_page(self.params.page, total, self.params.page_size);
        self.result = query(self.store.expenses(), &self.params, self.today);

        if self.result.items.is_empty() {
            self.state.select(None);
        } else {
            let selected = self.state.selected().unwrap_or(0);
            self.state.select(Some(selected.min(self.result.items.len() - 1)));
        }
    }

    fn set_params(&mut self, params: QueryParams) {
        self.params = params;
        self.state.select(Some(0));
        self.refresh();
    }

    pub fn selected_expense(&self) -> Option<&Expense> {
        self.state.selected().and_then(|i| self.result.items.get(i))
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn next(&mut self) {
        let len = self.result.items.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.result.items.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn next_list_page(&mut self) {
        if self.params.page < self.result.page_count() {
            let params = self.params.clone().with_page(self.params.page + 1);
            self.set_params(params);
        }
    }

    pub fn previous_list_page(&mut self) {
        if self.params.page > 1 {
            let params = self.params.clone().with_page(self.params.page - 1);
            self.set_params(params);
        }
    }

    pub fn cycle_page_size(&mut self) {
        let next = PAGE_SIZE_CHOICES
            .iter()
            .copied()
            .find(|&size| size > self.params.page_size)
            .unwrap_or(PAGE_SIZE_CHOICES[0]);
        let params = self.params.clone().with_page_size(next);
        self.set_params(params);
    }

    pub fn delete_confirmed(&mut self) {
        if let Some(id) = self.pending_delete.take() {
            // A vanished id just means nothing to delete
            if self.store.remove(&id).is_ok() {
                self.refresh();
            }
        }
    }

    pub fn open_add_form(&mut self) {
        self.form = Some(ExpenseForm::new_expense());
        self.input_mode = InputMode::Form;
    }

    pub fn open_edit_form(&mut self) {
        if let Some(expense) = self.selected_expense() {
            self.form = Some(ExpenseForm::edit(expense));
            self.input_mode = InputMode::Form;
        }
    }

    fn close_form(&mut self) {
        self.form = None;
        self.input_mode = InputMode::Normal;
    }

    /// Validate the form and add or update; errors keep the form open
    pub fn submit_form(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };

        let draft = match validate_input(&form.input, self.today) {
            Ok(draft) => draft,
            Err(e) => {
                form.errors = e.validation_errors().to_vec();
                return;
            }
        };

        let saved = match form.editing.clone() {
            Some(id) => self.store.update(&id, draft).map(|_| ()),
            None => {
                self.store.add(draft);
                self.state.select(Some(0));
                Ok(())
            }
        };

        match saved {
            Ok(()) => {
                self.close_form();
                self.refresh();
            }
            Err(e) => {
                if let Some(form) = self.form.as_mut() {
                    form.errors = vec![ValidationError::new("record", e.to_string())];
                }
            }
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => return self.submit_form(),
            KeyCode::Esc => return self.close_form(),
            _ => {}
        }
        let Some(form) = self.form.as_mut() else {
            self.input_mode = InputMode::Normal;
            return;
        };

        match key.code {
            KeyCode::Tab | KeyCode::Down => form.field = form.field.next(),
            KeyCode::BackTab | KeyCode::Up => form.field = form.field.previous(),
            KeyCode::Left if form.field == FormField::Category => form.cycle_category(false),
            KeyCode::Right if form.field == FormField::Category => form.cycle_category(true),
            KeyCode::Backspace => {
                form.value_mut().pop();
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                form.value_mut().clear()
            }
            KeyCode::Char(c) => form.value_mut().push(c),
            _ => {}
        }
    }

    /// Apply one key press; returns true when the app should quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.input_mode {
            InputMode::Search => {
                self.handle_search_key(key);
                return false;
            }
            InputMode::Form => {
                self.handle_form_key(key);
                return false;
            }
            InputMode::Normal => {}
        }

        if self.pending_delete.is_some() {
            match key.code {
                KeyCode::Char('y') => self.delete_confirmed(),
                _ => self.pending_delete = None,
            }
            return false;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => self.current_page = self.current_page.next(),
            KeyCode::BackTab => self.current_page = self.current_page.previous(),
            KeyCode::Char('m') => {
                self.report_period = match self.report_period {
                    ReportPeriod::Month => ReportPeriod::Year,
                    ReportPeriod::Year => ReportPeriod::Month,
                }
            }
            _ if self.current_page == Page::Expenses => self.handle_list_key(key),
            _ => {}
        }

        false
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        let params = self.params.clone();
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Right | KeyCode::PageDown | KeyCode::Char('n') => self.next_list_page(),
            KeyCode::Left | KeyCode::PageUp | KeyCode::Char('p') => self.previous_list_page(),
            KeyCode::Enter => self.toggle_detail(),
            KeyCode::Char('/') => self.input_mode = InputMode::Search,
            KeyCode::Char('c') => {
                let next = params.category.next();
                self.set_params(params.with_category(next));
            }
            KeyCode::Char('t') => {
                let next = params.time_period.next();
                self.set_params(params.with_time_period(next));
            }
            KeyCode::Char('s') => {
                let (sort_by, order) = (params.sort_by.next(), params.sort_order);
                self.set_params(params.with_sort(sort_by, order));
            }
            KeyCode::Char('o') => {
                let (sort_by, order) = (params.sort_by, params.sort_order.toggle());
                self.set_params(params.with_sort(sort_by, order));
            }
            KeyCode::Char('z') => self.cycle_page_size(),
            KeyCode::Char('x') => self.set_params(params.clear_filters()),
            KeyCode::Char('d') => {
                self.pending_delete = self.selected_expense().map(|e| e.id.clone());
            }
            KeyCode::Char('a') => self.open_add_form(),
            KeyCode::Char('e') => self.open_edit_form(),
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let mut term = self.params.search_term.clone();
        match key.code {
            KeyCode::Enter | KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                return;
            }
            KeyCode::Backspace => {
                term.pop();
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => term.clear(),
            KeyCode::Char(c) => term.push(c),
            _ => return,
        }
        let params = self.params.clone().with_search(term);
        self.set_params(params);
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

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Length(3), // Filters
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_filters(f, chunks[1], app);

    match app.current_page {
        Page::Expenses if app.show_detail || app.form.is_some() => {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[2]);

            render_table(f, content_chunks[0], app);
            match &app.form {
                Some(form) => render_form_panel(f, content_chunks[1], form),
                None => render_detail_panel(f, content_chunks[1], app),
            }
        }
        Page::Expenses => render_table(f, chunks[2], app),
        Page::Summary => render_summary(f, chunks[2], app),
        Page::Comparison => render_comparison(f, chunks[2], app),
    }

    render_status_bar(f, chunks[3], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in [Page::Expenses, Page::Summary, Page::Comparison].iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Recorded: {}", app.store.len()),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" PocketWatch "),
    );

    f.render_widget(header, area);
}

fn render_filters(f: &mut Frame, area: Rect, app: &App) {
    let params = &app.params;
    let search_style = if app.input_mode == InputMode::Search {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let cursor = if app.input_mode == InputMode::Search { "_" } else { "" };

    let spans = match app.current_page {
        Page::Expenses => vec![
            Span::styled("Search: ", Style::default().fg(Color::Cyan)),
            Span::styled(format!("{}{}", params.search_term, cursor), search_style),
            Span::raw("  "),
            Span::styled("Category: ", Style::default().fg(Color::Cyan)),
            Span::raw(params.category.to_string()),
            Span::raw("  "),
            Span::styled("Period: ", Style::default().fg(Color::Cyan)),
            Span::raw(params.time_period.title()),
            Span::raw("  "),
            Span::styled("Sort: ", Style::default().fg(Color::Cyan)),
            Span::raw(format!(
                "{} ({})",
                params.sort_by.as_str(),
                params.sort_by.order_label(params.sort_order)
            )),
            Span::raw("  "),
            Span::styled("Per page: ", Style::default().fg(Color::Cyan)),
            Span::raw(params.page_size.to_string()),
        ],
        Page::Summary => vec![
            Span::styled("Period: ", Style::default().fg(Color::Cyan)),
            Span::raw(app.report_period.title()),
            Span::raw("  ("),
            Span::styled("m", Style::default().fg(Color::Yellow)),
            Span::raw(" month/year)"),
        ],
        Page::Comparison => vec![Span::raw("This month against last month")],
    };

    let filters = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(filters, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    if let Some(reason) = app.result.empty_reason() {
        let message = Paragraph::new(reason.message())
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Expenses "));
        f.render_widget(message, area);
        return;
    }

    let header_cells = ["Date", "Category", "Amount", "Description"]
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

    let rows = app.result.items.iter().map(|expense| {
        let cells = vec![
            Cell::from(expense.date.format("%b %d, %Y").to_string()),
            Cell::from(format!("{} {}", expense.category.icon(), expense.category.label())),
            Cell::from(format!("${:.2}", expense.amount)).style(Style::default().fg(Color::Red)),
            Cell::from(truncate(&expense.description, 40)),
        ];

        Row::new(cells).height(1)
    });

    let title = format!(
        " Expenses: page {} of {} ({} matching) ",
        app.result.page,
        app.result.page_count(),
        app.result.total_matches
    );

    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(22),
            Constraint::Length(12),
            Constraint::Min(20),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let Some(expense) = app.selected_expense() else {
        let empty = Paragraph::new("No expense selected")
            .block(Block::default().borders(Borders::ALL).title(" Expense Details "));
        f.render_widget(empty, area);
        return;
    };

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Amount: ", label),
            Span::styled(
                format!("${:.2}", expense.amount),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Category: ", label),
            Span::raw(format!("{} {}", expense.category.icon(), expense.category.label())),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Date: ", label),
            Span::raw(expense.date.format("%A, %B %d, %Y").to_string()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  ID: ", label),
            Span::styled(expense.id.clone(), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(
                wrap_text(&expense.description, 35),
                Style::default().add_modifier(Modifier::ITALIC),
            ),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Press Enter to close",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )]),
    ];

    let panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Expense Details "),
    );

    f.render_widget(panel, area);
}

fn render_form_panel(f: &mut Frame, area: Rect, form: &ExpenseForm) {
    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let mut content = vec![Line::from("")];

    for field in FormField::ALL {
        let active = field == form.field;
        let value = match (field, form.value(field)) {
            (FormField::Date, "") if !active => "(today)".to_string(),
            (_, value) if active => format!("{}_", value),
            (_, value) => value.to_string(),
        };
        let value_style = if active {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        content.push(Line::from(vec![
            Span::styled(format!("  {:<13}", format!("{}:", field.label())), label),
            Span::styled(value, value_style),
        ]));
        if let Some(err) = form.error_for(field) {
            content.push(Line::from(Span::styled(
                format!("  {:<13}{}", "", err.message),
                Style::default().fg(Color::Red),
            )));
        }
        content.push(Line::from(""));
    }

    for err in form
        .errors
        .iter()
        .filter(|e| FormField::ALL.iter().all(|f| f.key() != e.field))
    {
        content.push(Line::from(Span::styled(
            format!("  {}", err.message),
            Style::default().fg(Color::Red),
        )));
    }

    let title = if form.editing.is_some() {
        " Edit Expense "
    } else {
        " Add Expense "
    };
    let panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(title),
    );

    f.render_widget(panel, area);
}

fn render_summary(f: &mut Frame, area: Rect, app: &App) {
    let summary = summarize(app.store.expenses(), app.report_period, app.today);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("  ${:.2}", summary.total_amount),
                Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  Total {}", summary.period.title().to_lowercase()),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(""),
    ];

    if summary.is_empty() {
        lines.push(Line::from(format!("  {}", summary.empty_message())));
    }

    for item in &summary.by_category {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {:<18}", item.category.label()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(" ${:>10.2} ", item.total)),
            Span::styled(bar(item.percentage, 30), Style::default().fg(Color::Green)),
            Span::raw(format!(" {:.0}%", item.percentage)),
        ]));
    }

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Expense Summary "),
    );
    f.render_widget(panel, area);
}

fn render_comparison(f: &mut Frame, area: Rect, app: &App) {
    let comparison = compare(app.store.expenses(), app.today);

    let trend_color = |trend: Trend| match trend {
        Trend::Up => Color::Red,
        Trend::Down => Color::Green,
        Trend::Flat => Color::Gray,
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("  This Month: ${:.2}", comparison.current_total),
                Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("   Last Month: ${:.2}", comparison.prior_total)),
        ]),
        Line::from(Span::styled(
            format!(
                "  {} ({}%) vs last month",
                signed(comparison.total_delta),
                signed(comparison.total_percent_change.round())
            ),
            Style::default().fg(trend_color(comparison.trend())),
        )),
        Line::from(""),
    ];

    if comparison.is_empty() {
        lines.push(Line::from("  No expenses to compare."));
    }

    for item in &comparison.by_category {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {:<18}", item.category.label()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(
                " this ${:>9.2}  last ${:>9.2}  ",
                item.current_amount, item.prior_amount
            )),
            Span::styled(
                format!("{} ({}%)", signed(item.delta), signed(item.percent_change.round())),
                Style::default().fg(trend_color(Trend::of(item.delta))),
            ),
        ]));
    }

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} vs {} ", comparison.current_month, comparison.prior_month)),
    );
    f.render_widget(panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let key = Style::default().fg(Color::Yellow);
    let mut status_spans = vec![];

    if let Some(id) = &app.pending_delete {
        status_spans.push(Span::styled(
            format!(" Delete {}? ", truncate(id, 13)),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
        status_spans.push(Span::styled("y", key));
        status_spans.push(Span::raw(" confirm, any other key cancels"));
    } else if app.input_mode == InputMode::Form {
        status_spans.push(Span::styled(" Tab/↑↓", key));
        status_spans.push(Span::raw(" Field | "));
        status_spans.push(Span::styled("←→", key));
        status_spans.push(Span::raw(" Category | "));
        status_spans.push(Span::styled("Enter", key));
        status_spans.push(Span::raw(" Save | "));
        status_spans.push(Span::styled("Esc", key));
        status_spans.push(Span::raw(" Cancel"));
    } else if app.input_mode == InputMode::Search {
        status_spans.push(Span::raw(" Type to search | "));
        status_spans.push(Span::styled("Enter/Esc", key));
        status_spans.push(Span::raw(" Done | "));
        status_spans.push(Span::styled("Ctrl-U", key));
        status_spans.push(Span::raw(" Clear"));
    } else {
        if app.current_page == Page::Expenses {
            let pages: Vec<String> = page_window(app.result.page, app.result.page_count())
                .into_iter()
                .map(|p| match p {
                    Some(p) if p == app.result.page => format!("[{}]", p),
                    Some(p) => p.to_string(),
                    None => "…".to_string(),
                })
                .collect();
            if app.result.has_multiple_pages() {
                status_spans.push(Span::styled(
                    format!(" {} ", pages.join(" ")),
                    Style::default().fg(Color::Cyan),
                ));
                status_spans.push(Span::raw("| "));
            }

            for (k, what) in [
                ("/", "Search"),
                ("c", "Category"),
                ("t", "Period"),
                ("s", "Sort"),
                ("o", "Order"),
                ("z", "Size"),
                ("n/p", "Page"),
                ("a", "Add"),
                ("e", "Edit"),
                ("d", "Delete"),
            ] {
                status_spans.push(Span::styled(k, key));
                status_spans.push(Span::raw(format!(" {} | ", what)));
            }

            if app.params.has_active_filters() {
                status_spans.push(Span::styled("x", key));
                status_spans.push(Span::raw(" Clear filters | "));
            }
        }

        status_spans.push(Span::styled("Tab", key));
        status_spans.push(Span::raw(" View | "));
        status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
        status_spans.push(Span::raw(" Quit"));
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn bar(percentage: f64, width: usize) -> String {
    let filled = ((percentage / 100.0) * width as f64).round().clamp(0.0, width as f64) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn signed(value: f64) -> String {
    if value > 0.0 {
        format!("+{:.2}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

fn wrap_text(text: &str, width: usize) -> String {
    let mut result = String::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.is_empty() || current_line.len() + word.len() < width {
            if !current_line.is_empty() {
                current_line.push(' ');
            }
            current_line.push_str(word);
        } else {
            if !result.is_empty() {
                result.push_str("\n  ");
            }
            result.push_str(&current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        if !result.is_empty() {
            result.push_str("\n  ");
        }
        result.push_str(&current_line);
    }

    result
}
