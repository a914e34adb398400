use anyhow::Result;
use chrono::{NaiveDate, Utc};
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::db::Database;
use crate::format::{format_currency, format_days_remaining, progress_bar};
use crate::models::{ProjectStatus, ProjectType};
use crate::stats::DashboardStats;

pub struct DashboardState {
    stats: DashboardStats,
    currency: String,
    today: NaiveDate,
}

impl DashboardState {
    pub fn new(stats: DashboardStats, currency: &str, today: NaiveDate) -> Self {
        Self {
            stats,
            currency: currency.to_string(),
            today,
        }
    }
}

pub enum DashboardAction {
    Exit,
    OpenClients,
    OpenProjects,
    OpenSettings,
}

pub async fn load_stats(db: &Database) -> Result<DashboardStats> {
    let projects = db.get_projects().await?;
    Ok(DashboardStats::compute(&projects, Utc::now()))
}

pub fn render_dashboard<B: Backend>(frame: &mut Frame<B>, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(8),
                Constraint::Length(9),
                Constraint::Min(5),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(frame.size());

    render_totals(frame, state, chunks[0]);
    render_breakdown(frame, state, chunks[1]);
    render_recent_projects(frame, state, chunks[2]);

    let buttons = Paragraph::new("<C> Clients | <P> Projects | <S> Settings | <Esc> Exit")
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));
    frame.render_widget(buttons, chunks[3]);
}

fn render_totals<B: Backend>(frame: &mut Frame<B>, state: &DashboardState, area: Rect) {
    let stats = &state.stats;
    let label = |text: &str| Span::styled(format!("{:<20}", text), Style::default().fg(Color::Gray));
    let money = |amount: f64| format_currency(amount, &state.currency);

    let lines = vec![
        Spans::from(vec![label("Total projects"), Span::raw(stats.total_projects.to_string())]),
        Spans::from(vec![label("Active"), Span::raw(stats.active_projects.to_string())]),
        Spans::from(vec![label("Completed"), Span::raw(stats.completed_projects.to_string())]),
        Spans::from(vec![
            label("Revenue"),
            Span::styled(money(stats.total_revenue), Style::default().fg(Color::Green)),
        ]),
        Spans::from(vec![
            label("Pending payments"),
            Span::styled(money(stats.pending_payments), Style::default().fg(Color::Yellow)),
        ]),
        Spans::from(vec![label("This month"), Span::raw(money(stats.this_month_revenue))]),
    ];

    let totals = Paragraph::new(lines).block(Block::default().title("Overview").borders(Borders::ALL));
    frame.render_widget(totals, area);
}

fn render_breakdown<B: Backend>(frame: &mut Frame<B>, state: &DashboardState, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(area);

    let by_status: Vec<ListItem> = ProjectStatus::ALL
        .iter()
        .map(|status| {
            let count = state.stats.projects_by_status.get(status).copied().unwrap_or(0);
            ListItem::new(format!("{:<14}{}", status.label(), count))
        })
        .collect();
    frame.render_widget(
        List::new(by_status).block(Block::default().title("By Status").borders(Borders::ALL)),
        columns[0],
    );

    let by_type: Vec<ListItem> = ProjectType::ALL
        .iter()
        .map(|project_type| {
            let count = state.stats.projects_by_type.get(project_type).copied().unwrap_or(0);
            ListItem::new(format!("{:<14}{}", project_type.label(), count))
        })
        .collect();
    frame.render_widget(
        List::new(by_type).block(Block::default().title("By Type").borders(Borders::ALL)),
        columns[1],
    );
}

fn render_recent_projects<B: Backend>(frame: &mut Frame<B>, state: &DashboardState, area: Rect) {
    let items: Vec<ListItem> = state
        .stats
        .recent_projects
        .iter()
        .map(|project| {
            ListItem::new(Spans::from(vec![
                Span::styled(
                    format!("{:<24}", project.name),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(
                    " {:<12} {} {} ",
                    project.status.label(),
                    progress_bar(project.progress(), 10),
                    format_currency(project.total_amount, &state.currency),
                )),
                Span::styled(
                    format_days_remaining(project.days_remaining(state.today)),
                    Style::default().fg(Color::Gray),
                ),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title("Recent Projects")
            .borders(Borders::ALL),
    );
    frame.render_widget(list, area);
}

pub fn handle_key(key: KeyCode) -> Option<DashboardAction> {
    match key {
        KeyCode::Char('q') | KeyCode::Esc => Some(DashboardAction::Exit),
        KeyCode::Char('c') | KeyCode::Enter => Some(DashboardAction::OpenClients),
        KeyCode::Char('p') => Some(DashboardAction::OpenProjects),
        KeyCode::Char('s') => Some(DashboardAction::OpenSettings),
        _ => None,
    }
}

pub fn handle_input() -> Result<Option<DashboardAction>> {
    if let Event::Key(key) = event::read()? {
        return Ok(handle_key(key.code));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_screens() {
        assert!(matches!(handle_key(KeyCode::Char('c')), Some(DashboardAction::OpenClients)));
        assert!(matches!(handle_key(KeyCode::Char('p')), Some(DashboardAction::OpenProjects)));
        assert!(matches!(handle_key(KeyCode::Char('s')), Some(DashboardAction::OpenSettings)));
        assert!(matches!(handle_key(KeyCode::Esc), Some(DashboardAction::Exit)));
        assert!(handle_key(KeyCode::Char('x')).is_none());
    }

    #[test]
    fn state_keeps_stats() {
        let stats = DashboardStats::compute(&[], Utc::now());
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
        let state = DashboardState::new(stats, "TRY", today);

        assert_eq!(state.stats.total_projects, 0);
        assert_eq!(state.currency, "TRY");
    }
}
