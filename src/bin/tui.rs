use std::time::Duration;

use anyhow::Result;
use crossterm::{event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind}, execute, terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::{backend::CrosstermBackend, Frame, Terminal, widgets::{Block, Borders, List, ListItem, ListState, Paragraph}, layout::{Constraint, Direction, Layout}, style::{Color, Modifier, Style}};

use tarefas::{application::task_service::TaskService, config::Config, domain::task::{Task, TaskId, TaskPayload, TaskStatus}};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env()?;
    let service = tarefas::open_service(&config.database).await?;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, App::new(service, config.database.url)).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode { View, Create, Edit(TaskId) }

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field { Title, Description, DueDate }

impl Field {
    fn next(self) -> Self {
        match self { Field::Title => Field::Description, Field::Description => Field::DueDate, Field::DueDate => Field::Title }
    }

    fn label(self) -> &'static str {
        match self { Field::Title => "Título", Field::Description => "Descrição", Field::DueDate => "Vencimento" }
    }
}

#[derive(Default)]
struct Draft { title: String, description: String, due_date: String }

impl Draft {
    fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            due_date: task.due_date.map(|d| d.to_string()).unwrap_or_default(),
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut String {
        match field { Field::Title => &mut self.title, Field::Description => &mut self.description, Field::DueDate => &mut self.due_date }
    }

    fn field(&self, field: Field) -> &str {
        match field { Field::Title => &self.title, Field::Description => &self.description, Field::DueDate => &self.due_date }
    }

    fn payload(&self, status: TaskStatus) -> TaskPayload {
        let description = self.description.trim();
        TaskPayload {
            title: Some(self.title.trim().to_string()),
            description: (!description.is_empty()).then(|| description.to_string()),
            status: Some(status.as_str().to_string()),
            due_date: Some(self.due_date.trim().to_string()),
        }
    }
}

fn payload_for(task: &Task, status: TaskStatus) -> TaskPayload {
    TaskPayload {
        title: Some(task.title.clone()),
        description: task.description.clone(),
        status: Some(status.as_str().to_string()),
        due_date: task.due_date.map(|d| d.to_string()),
    }
}

struct App<S: TaskService> {
    service: S,
    database_url: String,
    items: Vec<Task>,
    list_state: ListState,
    filter: Option<TaskStatus>,
    mode: Mode,
    field: Field,
    draft: Draft,
    message: Option<String>,
}

impl<S: TaskService> App<S> {
    fn new(service: S, database_url: String) -> Self {
        Self {
            service,
            database_url,
            items: Vec::new(),
            list_state: ListState::default(),
            filter: None,
            mode: Mode::View,
            field: Field::Title,
            draft: Draft::default(),
            message: None,
        }
    }

    /// Reloads through the service so the filter behaves like `GET /tarefas?status=`.
    async fn load(&mut self) -> Result<()> {
        self.items = self.service.list(self.filter.map(|s| s.as_str().to_string())).await?;
        let selected = match self.items.len() {
            0 => None,
            len => Some(self.list_state.selected().unwrap_or(0).min(len - 1)),
        };
        self.list_state.select(selected);
        Ok(())
    }

    fn selected(&self) -> Option<&Task> { self.list_state.selected().and_then(|i| self.items.get(i)) }

    fn cycle_filter(&mut self) {
        self.filter = match self.filter {
            None => Some(TaskStatus::Pendente),
            Some(TaskStatus::Concluida) => None,
            Some(status) => Some(status.next()),
        };
    }

    fn move_selection(&mut self, down: bool) {
        let Some(i) = self.list_state.selected() else { return };
        let next = if down { (i + 1).min(self.items.len().saturating_sub(1)) } else { i.saturating_sub(1) };
        self.list_state.select(Some(next));
    }

    /// Returns `false` when the user asked to quit.
    async fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        match self.mode {
            Mode::View => match code {
                KeyCode::Char('q') => return Ok(false),
                KeyCode::Up => self.move_selection(false),
                KeyCode::Down => self.move_selection(true),
                KeyCode::Enter => {
                    if let Some(task) = self.selected().cloned() {
                        let result = self.service.update(task.id, payload_for(&task, task.status.next())).await;
                        self.report(result.map(|_| ()));
                        self.refresh().await;
                    }
                }
                KeyCode::Char('n') => self.open_form(Mode::Create, Draft::default()),
                KeyCode::Char('e') => {
                    if let Some((id, draft)) = self.selected().map(|t| (t.id, Draft::from_task(t))) {
                        self.open_form(Mode::Edit(id), draft);
                    }
                }
                KeyCode::Char('d') => {
                    if let Some(id) = self.selected().map(|t| t.id) {
                        let result = self.service.delete(id).await;
                        self.report(result);
                        self.refresh().await;
                    }
                }
                KeyCode::Char('f') => {
                    self.cycle_filter();
                    self.refresh().await;
                }
                _ => {}
            },
            Mode::Create | Mode::Edit(_) => match code {
                KeyCode::Esc => self.close_form(),
                KeyCode::Enter => self.submit_form().await,
                KeyCode::Tab => self.field = self.field.next(),
                KeyCode::Backspace => { self.draft.field_mut(self.field).pop(); }
                KeyCode::Char(c) => self.draft.field_mut(self.field).push(c),
                _ => {}
            },
        }
        Ok(true)
    }

    fn open_form(&mut self, mode: Mode, draft: Draft) {
        self.mode = mode;
        self.field = Field::Title;
        self.draft = draft;
        self.message = None;
    }

    fn close_form(&mut self) {
        self.mode = Mode::View;
        self.draft = Draft::default();
    }

    /// A rejected form stays open with the service's message in the footer.
    async fn submit_form(&mut self) {
        let result = match self.mode {
            Mode::Create => self.service.create(self.draft.payload(TaskStatus::Pendente)).await,
            Mode::Edit(id) => {
                let status = self.items.iter().find(|t| t.id == id).map_or(TaskStatus::Pendente, |t| t.status);
                self.service.update(id, self.draft.payload(status)).await
            }
            Mode::View => return,
        };
        match result {
            Ok(_) => {
                self.message = None;
                self.close_form();
                self.refresh().await;
            }
            Err(err) => self.message = Some(err.to_string()),
        }
    }

    /// Reload after a key press; a failing store shows up in the footer instead of ending the session.
    async fn refresh(&mut self) {
        if let Err(err) = self.load().await {
            self.message = Some(err.to_string());
        }
    }

    fn report<E: std::fmt::Display>(&mut self, result: std::result::Result<(), E>) {
        self.message = result.err().map(|e| e.to_string());
    }

    fn filter_label(&self) -> &'static str { self.filter.map_or("todas", |s| s.as_str()) }

    fn draw(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(3)])
            .split(f.size());

        let header = Paragraph::new("Enter: avançar status, n: nova, e: editar, d: excluir, f: filtro, q: sair  |  Formulário: Tab troca campo, Enter salva, Esc cancela")
            .block(Block::default().borders(Borders::ALL).title("tarefas-tui"));
        f.render_widget(header, chunks[0]);

        let middle = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        let list_items: Vec<ListItem> = self.items.iter().map(|t| {
            let mark = match t.status { TaskStatus::Pendente => "[ ]", TaskStatus::Realizando => "[~]", TaskStatus::Concluida => "[x]" };
            ListItem::new(format!("{mark} #{} {}", t.id, t.title))
        }).collect();
        let list = List::new(list_items)
            .block(Block::default().borders(Borders::ALL).title(format!("tarefas [{}]", self.filter_label())))
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD | Modifier::REVERSED))
            .highlight_symbol(">> ");
        f.render_stateful_widget(list, middle[0], &mut self.list_state);

        let detail = self.selected().map(|t| {
            format!(
                "Título:\n{}\n\nStatus: {}\nVencimento: {}\n\nDescrição:\n{}",
                t.title,
                t.status,
                t.due_date.map(|d| d.to_string()).unwrap_or_else(|| "(sem data)".into()),
                t.description.as_deref().unwrap_or("(sem descrição)"),
            )
        });
        let details = Paragraph::new(detail.unwrap_or_default()).block(Block::default().borders(Borders::ALL).title("detalhes"));
        f.render_widget(details, middle[1]);

        let (title, text) = match self.mode {
            Mode::View => ("info", format!("DATABASE_URL={}  |  filtro=[{}]", self.database_url, self.filter_label())),
            Mode::Create | Mode::Edit(_) => {
                let title = if self.mode == Mode::Create { "nova" } else { "editar" };
                (title, format!("{}: {}_", self.field.label(), self.draft.field(self.field)))
            }
        };
        let text = match &self.message { Some(msg) => format!("{text}  |  {msg}"), None => text };
        f.render_widget(Paragraph::new(text).block(Block::default().borders(Borders::ALL).title(title)), chunks[2]);
    }
}

async fn run_app<S: TaskService>(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, mut app: App<S>) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    app.load().await?;

    loop {
        terminal.draw(|f| app.draw(f))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                // Releases and repeats would duplicate input.
                if key.kind != KeyEventKind::Press { continue; }
                if !app.handle_key(key.code).await? { break; }
            }
        }
    }
    Ok(())
}
