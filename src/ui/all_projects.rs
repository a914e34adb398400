use std::collections::HashMap;

use anyhow::Result;
use chrono::NaiveDate;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::db::Database;
use crate::format::{format_currency, format_days_remaining};
use crate::models::{Client, Project, ProjectStatus};

/// A project together with the name of the client that owns it
pub struct ListedProject {
    pub project: Project,
    pub client_name: String,
}

/// Filters applied to the all-projects list; `None` means "all"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectFilter {
    pub search: String,
    pub status: Option<ProjectStatus>,
    pub client_id: Option<i32>,
}

impl ProjectFilter {
    /// Search covers project and client name, case-insensitive
    pub fn matches(&self, listed: &ListedProject) -> bool {
        let term = self.search.trim().to_lowercase();
        let matches_search = term.is_empty()
            || listed.project.name.to_lowercase().contains(&term)
            || listed.client_name.to_lowercase().contains(&term);
        let matches_status = self.status.is_none_or(|status| listed.project.status == status);
        let matches_client = self
            .client_id
            .is_none_or(|client_id| listed.project.client_id == client_id);

        matches_search && matches_status && matches_client
    }

    pub fn is_empty(&self) -> bool {
        *self == ProjectFilter::default()
    }
}

/// Step through `options` and back to `None`
fn cycle<T: Copy + PartialEq>(current: Option<T>, options: &[T]) -> Option<T> {
    match current {
        None => options.first().copied(),
        Some(value) => options
            .iter()
            .position(|option| *option == value)
            .and_then(|i| options.get(i + 1))
            .copied(),
    }
}

pub struct AllProjectsState {
    projects: Vec<ListedProject>,
    clients: Vec<(i32, String)>,
    visible: Vec<usize>,
    list_state: ListState,
    filter: ProjectFilter,
    searching: bool,
    currency: String,
    today: NaiveDate,
}

impl AllProjectsState {
    pub fn new(projects: Vec<Project>, clients: &[Client], currency: &str, today: NaiveDate) -> Self {
        let names: HashMap<i32, &str> = clients
            .iter()
            .map(|client| (client.id, client.name.as_str()))
            .collect();
        let projects: Vec<ListedProject> = projects
            .into_iter()
            .map(|project| ListedProject {
                client_name: names
                    .get(&project.client_id)
                    .map(|name| name.to_string())
                    .unwrap_or_else(|| "Unknown client".to_string()),
                project,
            })
            .collect();

        let mut state = Self {
            visible: Vec::new(),
            projects,
            clients: clients
                .iter()
                .map(|client| (client.id, client.name.clone()))
                .collect(),
            list_state: ListState::default(),
            filter: ProjectFilter::default(),
            searching: false,
            currency: currency.to_string(),
            today,
        };
        state.apply_filter();
        state
    }

    fn apply_filter(&mut self) {
        self.visible = self
            .projects
            .iter()
            .enumerate()
            .filter(|(_, listed)| self.filter.matches(listed))
            .map(|(i, _)| i)
            .collect();
        self.list_state
            .select(if self.visible.is_empty() { None } else { Some(0) });
    }

    fn visible_projects(&self) -> impl Iterator<Item = &ListedProject> {
        self.visible.iter().filter_map(|&i| self.projects.get(i))
    }

    /// Sum of the derived totals of the listed projects
    pub fn total_earnings(&self) -> f64 {
        self.visible_projects().map(|listed| listed.project.total_amount).sum()
    }

    pub fn next(&mut self) {
        if self.visible.is_empty() {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) if i + 1 < self.visible.len() => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.visible.is_empty() {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) if i > 0 => i - 1,
            _ => self.visible.len() - 1,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_project(&mut self, project_id: i32) {
        let position = self.visible.iter().position(|&i| {
            self.projects
                .get(i)
                .is_some_and(|listed| listed.project.id == project_id)
        });
        if let Some(position) = position {
            self.list_state.select(Some(position));
        }
    }

    pub fn selected_project_id(&self) -> Option<i32> {
        self.list_state
            .selected()
            .and_then(|i| self.visible.get(i))
            .and_then(|&i| self.projects.get(i))
            .map(|listed| listed.project.id)
    }

    pub fn cycle_status_filter(&mut self) {
        self.filter.status = cycle(self.filter.status, &ProjectStatus::ALL);
        self.apply_filter();
    }

    pub fn cycle_client_filter(&mut self) {
        let ids: Vec<i32> = self.clients.iter().map(|(id, _)| *id).collect();
        self.filter.client_id = cycle(self.filter.client_id, &ids);
        self.apply_filter();
    }

    /// Reapply filters kept from an earlier visit to this screen
    pub fn restore_filter(&mut self, filter: ProjectFilter) {
        self.filter = filter;
        self.apply_filter();
    }

    pub fn into_filter(self) -> ProjectFilter {
        self.filter
    }

    pub fn clear_filters(&mut self) {
        self.filter = ProjectFilter::default();
        self.apply_filter();
    }

    fn filter_summary(&self) -> String {
        if self.filter.is_empty() {
            return "No filters".to_string();
        }
        let status = self.filter.status.map(|s| s.label()).unwrap_or("All statuses");
        let client = self
            .filter
            .client_id
            .and_then(|id| self.clients.iter().find(|(client_id, _)| *client_id == id))
            .map(|(_, name)| name.as_str())
            .unwrap_or("All clients");
        format!("Search: {} | {} | {}", self.filter.search, status, client)
    }
}

pub enum AllProjectsAction {
    Back,
    EditProject(i32), // Contains project_id
}

pub async fn load_all_projects(db: &Database) -> Result<(Vec<Project>, Vec<Client>)> {
    let projects = db.get_projects().await?;
    let clients = db.get_clients().await?;
    Ok((projects, clients))
}

pub fn render_all_projects<B: Backend>(frame: &mut Frame<B>, state: &mut AllProjectsState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(1),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(frame.size());

    let header = Paragraph::new(Spans::from(vec![
        Span::raw(format!("{} projects | Total earnings: ", state.visible.len())),
        Span::styled(
            format_currency(state.total_earnings(), &state.currency),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
    ]))
    .block(Block::default().title(state.filter_summary()).borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    let items: Vec<ListItem> = state
        .visible_projects()
        .map(|listed| {
            let project = &listed.project;
            ListItem::new(Spans::from(vec![
                Span::styled(
                    project.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  {}", listed.client_name),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw(format!(
                    "  {} | {} | {:.0}% | {} [{}] | ",
                    project.project_type.label(),
                    project.status.label(),
                    project.progress(),
                    format_currency(project.total_amount, &state.currency),
                    project.payment_status.label(),
                )),
                Span::styled(
                    format_days_remaining(project.days_remaining(state.today)),
                    Style::default().fg(Color::Gray),
                ),
            ]))
        })
        .collect();

    let projects_list = List::new(items)
        .block(Block::default().title("All Projects").borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_stateful_widget(projects_list, chunks[1], &mut state.list_state);

    let footer = if state.searching {
        Paragraph::new(format!("Search: {}|", state.filter.search))
            .style(Style::default().fg(Color::Yellow))
    } else {
        Paragraph::new(
            "</> Search | <F> Status | <C> Client | <X> Clear filters | <Enter> Edit | <Esc> Back",
        )
        .style(Style::default().fg(Color::White))
    };
    frame.render_widget(footer.block(Block::default().borders(Borders::TOP)), chunks[2]);
}

/// Apply one key press to the all-projects list
pub fn handle_key(state: &mut AllProjectsState, key: KeyCode) -> Option<AllProjectsAction> {
    if state.searching {
        match key {
            KeyCode::Enter => state.searching = false,
            KeyCode::Esc => {
                state.searching = false;
                state.filter.search.clear();
                state.apply_filter();
            }
            KeyCode::Backspace => {
                state.filter.search.pop();
                state.apply_filter();
            }
            KeyCode::Char(c) => {
                state.filter.search.push(c);
                state.apply_filter();
            }
            _ => {}
        }
        return None;
    }

    match key {
        KeyCode::Char('q') | KeyCode::Esc => return Some(AllProjectsAction::Back),
        KeyCode::Char('/') => state.searching = true,
        KeyCode::Char('f') => state.cycle_status_filter(),
        KeyCode::Char('c') => state.cycle_client_filter(),
        KeyCode::Char('x') => state.clear_filters(),
        KeyCode::Down => state.next(),
        KeyCode::Up => state.previous(),
        KeyCode::Enter | KeyCode::Char('e') => {
            return state.selected_project_id().map(AllProjectsAction::EditProject);
        }
        _ => {}
    }

    None
}

pub fn handle_input(state: &mut AllProjectsState) -> Result<Option<AllProjectsAction>> {
    if let Event::Key(key) = event::read()? {
        return Ok(handle_key(state, key.code));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Settings;

    fn client(id: i32, name: &str) -> Client {
        let mut client = Client::draft();
        client.id = id;
        client.name = name.to_string();
        client
    }

    fn project(id: i32, client_id: i32, name: &str, status: ProjectStatus, total: f64) -> Project {
        let mut project = Project::draft(client_id, &Settings::default());
        project.id = id;
        project.name = name.to_string();
        project.status = status;
        project.total_amount = total;
        project
    }

    fn state() -> AllProjectsState {
        let clients = vec![client(1, "Acme"), client(2, "Kuzey Design")];
        let projects = vec![
            project(10, 1, "Landing page", ProjectStatus::InProgress, 1000.0),
            project(11, 2, "Shop backend", ProjectStatus::Completed, 4000.0),
            project(12, 2, "Admin panel", ProjectStatus::InProgress, 2500.0),
            project(13, 99, "Orphan", ProjectStatus::Pending, 0.0),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 9, 1).expect("valid date");
        AllProjectsState::new(projects, &clients, "TRY", today)
    }

    #[test]
    fn lists_every_project_with_its_client() {
        let state = state();

        assert_eq!(state.visible.len(), 4);
        assert_eq!(state.projects[1].client_name, "Kuzey Design");
        assert_eq!(state.projects[3].client_name, "Unknown client");
        assert_eq!(state.total_earnings(), 7500.0);
    }

    #[test]
    fn search_matches_project_or_client_name() {
        let mut state = state();
        handle_key(&mut state, KeyCode::Char('/'));
        for c in "kuzey".chars() {
            handle_key(&mut state, KeyCode::Char(c));
        }
        assert_eq!(state.visible.len(), 2);
        assert_eq!(state.total_earnings(), 6500.0);

        handle_key(&mut state, KeyCode::Esc);
        handle_key(&mut state, KeyCode::Char('/'));
        for c in "LANDING".chars() {
            handle_key(&mut state, KeyCode::Char(c));
        }
        handle_key(&mut state, KeyCode::Enter);
        assert_eq!(state.selected_project_id(), Some(10));
    }

    #[test]
    fn status_and_client_filters_combine() {
        let mut state = state();
        state.filter.status = Some(ProjectStatus::InProgress);
        state.apply_filter();
        assert_eq!(state.visible.len(), 2);

        handle_key(&mut state, KeyCode::Char('c'));
        handle_key(&mut state, KeyCode::Char('c'));
        assert_eq!(state.filter.client_id, Some(2));
        assert_eq!(state.selected_project_id(), Some(12));
        assert_eq!(state.total_earnings(), 2500.0);

        handle_key(&mut state, KeyCode::Char('x'));
        assert!(state.filter.is_empty());
        assert_eq!(state.visible.len(), 4);
    }

    #[test]
    fn status_filter_cycles_back_to_all() {
        let mut state = state();
        for _ in 0..ProjectStatus::ALL.len() {
            handle_key(&mut state, KeyCode::Char('f'));
            assert!(state.filter.status.is_some());
        }
        handle_key(&mut state, KeyCode::Char('f'));
        assert_eq!(state.filter.status, None);
    }

    #[test]
    fn no_match_leaves_nothing_to_edit() {
        let mut state = state();
        state.filter.search = "nothing like this".to_string();
        state.apply_filter();

        assert!(handle_key(&mut state, KeyCode::Enter).is_none());
        assert_eq!(state.total_earnings(), 0.0);
    }

    #[test]
    fn restored_filter_survives_reload() {
        let mut first = state();
        handle_key(&mut first, KeyCode::Char('f'));
        let filter = first.into_filter();

        let mut reloaded = state();
        reloaded.restore_filter(filter);
        assert_eq!(reloaded.filter.status, Some(ProjectStatus::ALL[0]));
        assert!(reloaded
            .visible_projects()
            .all(|listed| listed.project.status == ProjectStatus::ALL[0]));
    }

    #[test]
    fn enter_edits_selected_project() {
        let mut state = state();
        state.select_project(12);

        assert!(matches!(
            handle_key(&mut state, KeyCode::Enter),
            Some(AllProjectsAction::EditProject(12))
        ));
    }
}
