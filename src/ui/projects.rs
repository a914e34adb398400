use anyhow::Result;
use chrono::NaiveDate;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::db::Database;
use crate::format::{format_currency, format_days_remaining};
use crate::models::{PaymentStatus, Project};
use crate::ui::components::centered_rect;

// Represents the state of the project selection screen
pub struct ProjectsState {
    client_id: i32,
    client_name: String,
    projects: Vec<Project>,
    list_state: ListState,
    show_delete_confirmation: bool,
    share_url: Option<String>,
    currency: String,
    today: NaiveDate,
}

impl ProjectsState {
    pub fn new(
        client_id: i32,
        client_name: String,
        projects: Vec<Project>,
        currency: &str,
        today: NaiveDate,
    ) -> Self {
        let mut list_state = ListState::default();
        if !projects.is_empty() {
            list_state.select(Some(0));
        }

        Self {
            client_id,
            client_name,
            projects,
            list_state,
            show_delete_confirmation: false,
            share_url: None,
            currency: currency.to_string(),
            today,
        }
    }

    pub fn next(&mut self) {
        if self.projects.is_empty() {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) => {
                if i >= self.projects.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.projects.is_empty() {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) => {
                if i == 0 {
                    self.projects.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    /// Keep the cursor on `project_id` after a reload
    pub fn select_project(&mut self, project_id: i32) {
        if let Some(i) = self.projects.iter().position(|p| p.id == project_id) {
            self.list_state.select(Some(i));
        }
    }

    pub fn toggle_delete_confirmation(&mut self) {
        self.show_delete_confirmation = !self.show_delete_confirmation;
    }

    pub fn open_share_popup(&mut self, url: String) {
        self.share_url = Some(url);
    }

    pub fn close_share_popup(&mut self) {
        self.share_url = None;
    }

    pub fn selected_project(&self) -> Option<&Project> {
        self.list_state.selected().and_then(|i| self.projects.get(i))
    }

    pub fn selected_project_id(&self) -> Option<i32> {
        self.selected_project().map(|p| p.id)
    }

    pub fn client_id(&self) -> i32 {
        self.client_id
    }

    fn project_line(&self, project: &Project) -> Spans<'static> {
        let payment_color = match project.payment_status {
            PaymentStatus::Unpaid => Color::Red,
            PaymentStatus::Partial => Color::Yellow,
            PaymentStatus::Paid => Color::Green,
        };
        let days = project.days_remaining(self.today);
        let days_color = match days {
            Some(d) if d < 0 => Color::Red,
            Some(d) if d <= 7 => Color::Yellow,
            _ => Color::Gray,
        };

        Spans::from(vec![
            Span::styled(
                project.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(
                "  {} | {} | {:.0}% | ",
                project.project_type.label(),
                project.status.label(),
                project.progress()
            )),
            Span::raw(format!(
                "{} / {} ",
                format_currency(project.paid_amount, &self.currency),
                format_currency(project.total_amount, &self.currency)
            )),
            Span::styled(
                format!("[{}]", project.payment_status.label()),
                Style::default().fg(payment_color),
            ),
            Span::raw(" | "),
            Span::styled(format_days_remaining(days), Style::default().fg(days_color)),
        ])
    }
}

pub enum ProjectAction {
    Back,
    NewProject(i32),            // Contains client_id
    EditProject(i32),           // Contains project_id
    DeleteProject(i32),         // Contains project_id
    ShareProject(i32),          // Contains project_id
    RegenerateShareToken(i32),  // Contains project_id
}

// DB operations for projects
pub async fn load_projects_by_client(db: &Database, client_id: i32) -> Result<Vec<Project>> {
    db.get_projects_by_client(client_id).await
}

pub fn render_projects<B: Backend>(frame: &mut Frame<B>, state: &mut ProjectsState) {
    let size = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)].as_ref())
        .split(size);

    let items: Vec<ListItem> = state
        .projects
        .iter()
        .map(|project| ListItem::new(state.project_line(project)))
        .collect();

    let title = format!("Projects - {}", state.client_name);
    let projects_list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_stateful_widget(projects_list, chunks[0], &mut state.list_state);

    let buttons_text = if state.selected_project().is_some() {
        "<N> New | <E> Edit | <D> Delete | <L> Share Link | <Esc> Back"
    } else {
        "<N> New Project | <Esc> Back"
    };

    let buttons = Paragraph::new(buttons_text)
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));

    frame.render_widget(buttons, chunks[1]);

    if state.show_delete_confirmation {
        render_delete_confirmation(frame, size);
    } else if let Some(url) = &state.share_url {
        render_share_popup(frame, size, url);
    }
}

fn render_delete_confirmation<B: Backend>(frame: &mut Frame<B>, size: Rect) {
    let popup_area = centered_rect(50, 20, size);

    let popup = Paragraph::new(vec![
        Spans::from(""),
        Spans::from("Are you sure you want to delete this project?"),
        Spans::from(""),
        Spans::from("Its share link will stop working."),
        Spans::from(""),
        Spans::from("<Y> Yes  <N> No"),
    ])
    .block(Block::default().title("Confirm Delete").borders(Borders::ALL))
    .style(Style::default().fg(Color::White).bg(Color::Black));

    frame.render_widget(popup, popup_area);
}

fn render_share_popup<B: Backend>(frame: &mut Frame<B>, size: Rect, url: &str) {
    let popup_area = centered_rect(70, 25, size);

    let popup = Paragraph::new(vec![
        Spans::from(""),
        Spans::from("Read-only link for the client:"),
        Spans::from(""),
        Spans::from(Span::styled(
            url.to_string(),
            Style::default().fg(Color::Cyan),
        )),
        Spans::from(""),
        Spans::from("<R> Regenerate link  <Esc> Close"),
    ])
    .wrap(Wrap { trim: false })
    .block(Block::default().title("Share Project").borders(Borders::ALL))
    .style(Style::default().fg(Color::White).bg(Color::Black));

    frame.render_widget(popup, popup_area);
}

/// Apply one key press to the project list
pub fn handle_key(state: &mut ProjectsState, key: KeyCode) -> Option<ProjectAction> {
    if state.share_url.is_some() {
        match key {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => state.close_share_popup(),
            KeyCode::Char('r') => {
                return state.selected_project_id().map(ProjectAction::RegenerateShareToken);
            }
            _ => {}
        }
        return None;
    }

    match key {
        KeyCode::Char('q') | KeyCode::Esc => {
            if state.show_delete_confirmation {
                state.toggle_delete_confirmation();
            } else {
                return Some(ProjectAction::Back);
            }
        }
        KeyCode::Char('n') => {
            if state.show_delete_confirmation {
                state.toggle_delete_confirmation();
            } else {
                return Some(ProjectAction::NewProject(state.client_id()));
            }
        }
        KeyCode::Char('e') | KeyCode::Enter => {
            if !state.show_delete_confirmation {
                return state.selected_project_id().map(ProjectAction::EditProject);
            }
        }
        KeyCode::Char('d') => {
            if !state.show_delete_confirmation && state.selected_project().is_some() {
                state.toggle_delete_confirmation();
            }
        }
        KeyCode::Char('y') => {
            if state.show_delete_confirmation {
                if let Some(id) = state.selected_project_id() {
                    state.toggle_delete_confirmation();
                    return Some(ProjectAction::DeleteProject(id));
                }
            }
        }
        KeyCode::Char('l') => {
            if !state.show_delete_confirmation {
                return state.selected_project_id().map(ProjectAction::ShareProject);
            }
        }
        KeyCode::Down => {
            if !state.show_delete_confirmation {
                state.next();
            }
        }
        KeyCode::Up => {
            if !state.show_delete_confirmation {
                state.previous();
            }
        }
        _ => {}
    }

    None
}

pub fn handle_input(state: &mut ProjectsState) -> Result<Option<ProjectAction>> {
    if let Event::Key(key) = event::read()? {
        return Ok(handle_key(state, key.code));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Settings;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 1).expect("valid date")
    }

    fn state_with(ids: &[i32]) -> ProjectsState {
        let projects = ids
            .iter()
            .map(|id| {
                let mut project = Project::draft(2, &Settings::default());
                project.id = *id;
                project.name = format!("Project {}", id);
                project
            })
            .collect();
        ProjectsState::new(2, "Acme".to_string(), projects, "TRY", today())
    }

    #[test]
    fn selection_wraps() {
        let mut state = state_with(&[1, 2, 3]);
        handle_key(&mut state, KeyCode::Up);
        assert_eq!(state.selected_project_id(), Some(3));

        handle_key(&mut state, KeyCode::Down);
        assert_eq!(state.selected_project_id(), Some(1));
    }

    #[test]
    fn delete_needs_confirmation() {
        let mut state = state_with(&[7]);
        assert!(handle_key(&mut state, KeyCode::Char('d')).is_none());

        match handle_key(&mut state, KeyCode::Char('y')) {
            Some(ProjectAction::DeleteProject(7)) => {}
            _ => panic!("expected delete of project 7"),
        }
    }

    #[test]
    fn declining_delete_keeps_screen() {
        let mut state = state_with(&[7]);
        handle_key(&mut state, KeyCode::Char('d'));
        assert!(handle_key(&mut state, KeyCode::Char('n')).is_none());
        assert!(matches!(
            handle_key(&mut state, KeyCode::Esc),
            Some(ProjectAction::Back)
        ));
    }

    #[test]
    fn share_popup_offers_regeneration() {
        let mut state = state_with(&[4]);
        assert!(matches!(
            handle_key(&mut state, KeyCode::Char('l')),
            Some(ProjectAction::ShareProject(4))
        ));

        state.open_share_popup("http://localhost:3000/share/abc".to_string());
        assert!(handle_key(&mut state, KeyCode::Down).is_none());
        assert!(matches!(
            handle_key(&mut state, KeyCode::Char('r')),
            Some(ProjectAction::RegenerateShareToken(4))
        ));

        handle_key(&mut state, KeyCode::Esc);
        assert!(state.share_url.is_none());
    }

    #[test]
    fn empty_list_only_offers_new_project() {
        let mut state = state_with(&[]);
        assert!(handle_key(&mut state, KeyCode::Char('e')).is_none());
        assert!(matches!(
            handle_key(&mut state, KeyCode::Char('n')),
            Some(ProjectAction::NewProject(2))
        ));
    }
}
