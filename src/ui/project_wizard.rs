use std::collections::HashMap;

use anyhow::Result;
use chrono::NaiveDate;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::format::{format_currency, format_days_remaining, progress_bar};
use crate::models::{PaymentStatus, Project, Settings};
use crate::ui::components::date_input::DateInputState;
use crate::ui::components::number_input::NumberInput;

pub enum ProjectWizardAction {
    Cancel,
    Save(Project),
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ProjectField {
    Name,
    ProjectType,
    Status,
    Priority,
    TotalPages,
    CompletedPages,
    PricePerPage,
    FixedPrice,
    CompletionPercentage,
    ExtraHours,
    ExtraHourRate,
    PaidAmount,
    StartDate,
    Deadline,
    Category,
    EstimatedHours,
    ActualHours,
    Notes,
}

impl ProjectField {
    fn label(&self) -> &'static str {
        match self {
            ProjectField::Name => "Name",
            ProjectField::ProjectType => "Project Type",
            ProjectField::Status => "Status",
            ProjectField::Priority => "Priority",
            ProjectField::TotalPages => "Total Pages",
            ProjectField::CompletedPages => "Completed Pages",
            ProjectField::PricePerPage => "Price per Page",
            ProjectField::FixedPrice => "Fixed Price",
            ProjectField::CompletionPercentage => "Completion %",
            ProjectField::ExtraHours => "Extra Hours",
            ProjectField::ExtraHourRate => "Extra Hour Rate",
            ProjectField::PaidAmount => "Paid Amount",
            ProjectField::StartDate => "Start Date",
            ProjectField::Deadline => "Deadline",
            ProjectField::Category => "Category",
            ProjectField::EstimatedHours => "Estimated Hours",
            ProjectField::ActualHours => "Actual Hours",
            ProjectField::Notes => "Notes",
        }
    }

    /// Cycled with Enter instead of typed into
    fn is_choice(&self) -> bool {
        matches!(
            self,
            ProjectField::ProjectType | ProjectField::Status | ProjectField::Priority
        )
    }
}

const NUMBER_FIELDS: [ProjectField; 10] = [
    ProjectField::TotalPages,
    ProjectField::CompletedPages,
    ProjectField::PricePerPage,
    ProjectField::FixedPrice,
    ProjectField::CompletionPercentage,
    ProjectField::ExtraHours,
    ProjectField::ExtraHourRate,
    ProjectField::PaidAmount,
    ProjectField::EstimatedHours,
    ProjectField::ActualHours,
];

pub struct ProjectWizardState {
    pub project: Project,
    pub current_field: ProjectField,
    pub editing: bool,
    currency: String,
    numbers: HashMap<ProjectField, NumberInput>,
    start_date_state: DateInputState,
    deadline_state: DateInputState,
    today: NaiveDate,
}

impl ProjectWizardState {
    /// New project pre-filled with the default rates from `settings`
    pub fn new(client_id: i32, settings: &Settings, today: NaiveDate) -> Self {
        Self::from_project(Project::draft(client_id, settings), &settings.currency, today)
    }

    pub fn from_existing(project: Project, currency: &str, today: NaiveDate) -> Self {
        Self::from_project(project, currency, today)
    }

    fn from_project(mut project: Project, currency: &str, today: NaiveDate) -> Self {
        project.recompute();

        let numbers = NUMBER_FIELDS
            .iter()
            .map(|field| {
                let input = match field {
                    ProjectField::TotalPages => NumberInput::integer(project.total_pages),
                    ProjectField::CompletedPages => NumberInput::integer(project.completed_pages),
                    ProjectField::CompletionPercentage => {
                        NumberInput::integer(project.completion_percentage)
                    }
                    ProjectField::PricePerPage => NumberInput::decimal(project.price_per_page),
                    ProjectField::FixedPrice => NumberInput::decimal(project.fixed_price),
                    ProjectField::ExtraHours => NumberInput::decimal(Some(project.extra_hours)),
                    ProjectField::ExtraHourRate => {
                        NumberInput::decimal(Some(project.extra_hour_rate))
                    }
                    ProjectField::PaidAmount => NumberInput::decimal(Some(project.paid_amount)),
                    ProjectField::EstimatedHours => NumberInput::decimal(project.estimated_hours),
                    _ => NumberInput::decimal(project.actual_hours),
                };
                (*field, input)
            })
            .collect();

        Self {
            start_date_state: DateInputState::new(project.start_date, today),
            deadline_state: DateInputState::new(project.deadline, today),
            project,
            current_field: ProjectField::Name,
            editing: false,
            currency: currency.to_string(),
            numbers,
            today,
        }
    }

    /// Fields shown for the current pricing mode, in display order
    pub fn visible_fields(&self) -> Vec<ProjectField> {
        let mut fields = vec![
            ProjectField::Name,
            ProjectField::ProjectType,
            ProjectField::Status,
            ProjectField::Priority,
        ];
        if self.project.project_type.is_page_priced() {
            fields.extend([
                ProjectField::TotalPages,
                ProjectField::CompletedPages,
                ProjectField::PricePerPage,
            ]);
        } else {
            fields.extend([ProjectField::FixedPrice, ProjectField::CompletionPercentage]);
        }
        fields.extend([
            ProjectField::ExtraHours,
            ProjectField::ExtraHourRate,
            ProjectField::PaidAmount,
            ProjectField::StartDate,
            ProjectField::Deadline,
            ProjectField::Category,
            ProjectField::EstimatedHours,
            ProjectField::ActualHours,
            ProjectField::Notes,
        ]);
        fields
    }

    fn current_index(&self) -> usize {
        self.visible_fields()
            .iter()
            .position(|field| *field == self.current_field)
            .unwrap_or(0)
    }

    pub fn next_field(&mut self) {
        let fields = self.visible_fields();
        let index = (self.current_index() + 1) % fields.len();
        self.current_field = fields[index];
    }

    pub fn previous_field(&mut self) {
        let fields = self.visible_fields();
        let index = (self.current_index() + fields.len() - 1) % fields.len();
        self.current_field = fields[index];
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
        if self.editing {
            match self.current_field {
                ProjectField::StartDate => self.start_date_state.toggle_editing(),
                ProjectField::Deadline => self.deadline_state.toggle_editing(),
                _ => {}
            }
        } else {
            self.start_date_state.editing = false;
            self.deadline_state.editing = false;
        }
        self.sync_dates();
    }

    /// Esc while editing; a date goes back to its value before editing
    pub fn cancel_editing(&mut self) {
        match self.current_field {
            ProjectField::StartDate => self.start_date_state.cancel_editing(),
            ProjectField::Deadline => self.deadline_state.cancel_editing(),
            _ => {}
        }
        self.toggle_editing();
    }

    /// Enter on a choice field cycles its value
    pub fn cycle_choice(&mut self) {
        match self.current_field {
            ProjectField::ProjectType => {
                self.project.project_type = self.project.project_type.next();
            }
            ProjectField::Status => self.project.status = self.project.status.next(),
            ProjectField::Priority => self.project.priority = self.project.priority.next(),
            _ => return,
        }
        self.project.recompute();
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        match self.current_field {
            ProjectField::Name => edit_text(&mut self.project.name, key),
            ProjectField::Notes => edit_text(&mut self.project.notes, key),
            ProjectField::Category => {
                let category = self.project.category.get_or_insert_with(String::new);
                edit_text(category, key);
                if category.is_empty() {
                    self.project.category = None;
                }
            }
            ProjectField::StartDate => {
                self.start_date_state.handle_input(key);
                self.sync_dates();
            }
            ProjectField::Deadline => {
                self.deadline_state.handle_input(key);
                self.sync_dates();
            }
            field => {
                let changed = self
                    .numbers
                    .get_mut(&field)
                    .map(|input| input.handle_input(key))
                    .unwrap_or(false);
                if changed {
                    self.apply_number(field);
                }
            }
        }
    }

    fn sync_dates(&mut self) {
        self.project.start_date = self.start_date_state.date;
        self.project.deadline = self.deadline_state.date;
    }

    /// Copy a parsed number buffer into the project and re-derive amounts
    fn apply_number(&mut self, field: ProjectField) {
        let Some(input) = self.numbers.get(&field) else {
            return;
        };

        let project = &mut self.project;
        match field {
            ProjectField::TotalPages => project.total_pages = input.as_i32(),
            ProjectField::CompletedPages => project.completed_pages = input.as_i32(),
            ProjectField::CompletionPercentage => project.completion_percentage = input.as_i32(),
            ProjectField::PricePerPage => project.price_per_page = input.as_f64(),
            ProjectField::FixedPrice => project.fixed_price = input.as_f64(),
            ProjectField::ExtraHours => project.extra_hours = input.as_f64().unwrap_or(0.0),
            ProjectField::ExtraHourRate => project.extra_hour_rate = input.as_f64().unwrap_or(0.0),
            ProjectField::PaidAmount => project.paid_amount = input.as_f64().unwrap_or(0.0),
            ProjectField::EstimatedHours => project.estimated_hours = input.as_f64(),
            ProjectField::ActualHours => project.actual_hours = input.as_f64(),
            _ => return,
        }
        project.recompute();
    }

    /// First reason the form cannot be saved yet
    pub fn validation_error(&self) -> Option<&'static str> {
        let project = &self.project;
        if project.name.trim().is_empty() {
            return Some("Project name is required");
        }
        if project.project_type.is_page_priced() {
            let total = project.total_pages.unwrap_or(0);
            let completed = project.completed_pages.unwrap_or(0);
            if completed > total {
                return Some("Completed pages cannot exceed total pages");
            }
        } else if !(0..=100).contains(&project.completion_percentage.unwrap_or(0)) {
            return Some("Completion must be between 0 and 100");
        }
        None
    }

    pub fn is_valid(&self) -> bool {
        self.validation_error().is_none()
    }

    fn field_value(&self, field: ProjectField) -> String {
        match field {
            ProjectField::Name => self.project.name.clone(),
            ProjectField::ProjectType => self.project.project_type.label().to_string(),
            ProjectField::Status => self.project.status.label().to_string(),
            ProjectField::Priority => self.project.priority.label().to_string(),
            ProjectField::StartDate => self.start_date_state.get_display_string(),
            ProjectField::Deadline => self.deadline_state.get_display_string(),
            ProjectField::Category => self.project.category.clone().unwrap_or_default(),
            ProjectField::Notes => self.project.notes.clone(),
            field => self
                .numbers
                .get(&field)
                .map(|input| input.as_str().to_string())
                .unwrap_or_default(),
        }
    }

    fn money(&self, amount: f64) -> String {
        format_currency(amount, &self.currency)
    }
}

fn edit_text(value: &mut String, key: KeyCode) {
    match key {
        KeyCode::Char(c) => value.push(c),
        KeyCode::Backspace => {
            value.pop();
        }
        _ => {}
    }
}

pub fn render_project_wizard<B: Backend>(f: &mut Frame<B>, state: &mut ProjectWizardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(8),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.size());

    let title_text = if state.project.id == 0 {
        "Project Creation Wizard"
    } else {
        "Project Editing Wizard"
    };

    let title = Paragraph::new(title_text)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    render_form(f, state, chunks[1]);
    render_summary(f, state, chunks[2]);

    let help_text = if state.editing {
        match state.current_field {
            ProjectField::StartDate | ProjectField::Deadline => {
                "Enter - Save field | Left/Right - Switch date part | Del - Clear | Esc - Cancel editing"
            }
            _ => "Enter - Save field | Esc - Cancel editing",
        }
    } else if state.current_field.is_choice() {
        "Enter - Change value | Up/Down - Navigate fields | S - Save project | Esc - Cancel"
    } else {
        "Enter - Edit field | Up/Down - Navigate fields | S - Save project | Esc - Cancel"
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[3]);
}

fn render_form<B: Backend>(f: &mut Frame<B>, state: &mut ProjectWizardState, area: Rect) {
    let items: Vec<ListItem> = state
        .visible_fields()
        .into_iter()
        .map(|field| {
            let name = field.label();
            let value = state.field_value(field);
            let selected = field == state.current_field;

            let content = if selected && state.editing {
                let displayed_value = match field {
                    ProjectField::StartDate | ProjectField::Deadline => value,
                    _ => format!("{}|", value),
                };
                Spans::from(vec![
                    Span::styled(format!("{}: ", name), Style::default().fg(Color::Yellow)),
                    Span::styled(displayed_value, Style::default().add_modifier(Modifier::BOLD)),
                ])
            } else {
                let style = if selected {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                Spans::from(vec![
                    Span::styled(format!("{}: ", name), style),
                    Span::raw(value),
                ])
            };

            ListItem::new(content)
        })
        .collect();

    let form_list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Project Details"))
        .highlight_style(Style::default().fg(Color::Yellow));

    f.render_widget(form_list, area);
}

fn render_summary<B: Backend>(f: &mut Frame<B>, state: &ProjectWizardState, area: Rect) {
    let project = &state.project;
    let status_color = match project.payment_status {
        PaymentStatus::Unpaid => Color::Red,
        PaymentStatus::Partial => Color::Yellow,
        PaymentStatus::Paid => Color::Green,
    };

    let mut lines = vec![
        Spans::from(vec![
            Span::raw("Total Amount: "),
            Span::styled(
                state.money(project.total_amount),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Spans::from(vec![
            Span::raw("Payment Status: "),
            Span::styled(project.payment_status.label(), Style::default().fg(status_color)),
        ]),
        Spans::from(format!("Remaining: {}", state.money(project.remaining_amount()))),
        Spans::from(format!("Progress: {}", progress_bar(project.progress(), 20))),
    ];

    if let Some(error) = state.validation_error() {
        lines.push(Spans::from(Span::styled(error, Style::default().fg(Color::Red))));
    } else if let Some(days) = project.days_remaining(state.today) {
        lines.push(Spans::from(format_days_remaining(Some(days))));
    }

    let summary = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Calculated"));
    f.render_widget(summary, area);
}

/// Apply one key press to the wizard
pub fn handle_key(state: &mut ProjectWizardState, key: KeyCode) -> Option<ProjectWizardAction> {
    match key {
        KeyCode::Esc => {
            if state.editing {
                state.cancel_editing();
            } else {
                return Some(ProjectWizardAction::Cancel);
            }
        }
        KeyCode::Enter => {
            if !state.editing && state.current_field.is_choice() {
                state.cycle_choice();
            } else {
                state.toggle_editing();
            }
        }
        KeyCode::Up if !state.editing => {
            state.previous_field();
        }
        KeyCode::Down if !state.editing => {
            state.next_field();
        }
        KeyCode::Char('s') if !state.editing => {
            if state.is_valid() {
                state.project.recompute();
                return Some(ProjectWizardAction::Save(state.project.clone()));
            }
        }
        _ if state.editing => {
            state.edit_current_field(key);
        }
        _ => {}
    }

    None
}

pub fn handle_input(state: &mut ProjectWizardState) -> Result<Option<ProjectWizardAction>> {
    if let Event::Key(key) = event::read()? {
        return Ok(handle_key(state, key.code));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProjectStatus, ProjectType};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 1).expect("valid date")
    }

    fn settings() -> Settings {
        Settings {
            default_price_per_page: 100.0,
            default_extra_hour_rate: 50.0,
            default_fixed_price: 2000.0,
            ..Settings::default()
        }
    }

    fn wizard() -> ProjectWizardState {
        ProjectWizardState::new(5, &settings(), today())
    }

    fn go_to(state: &mut ProjectWizardState, field: ProjectField) {
        for _ in 0..state.visible_fields().len() {
            if state.current_field == field {
                return;
            }
            handle_key(state, KeyCode::Down);
        }
        panic!("field {:?} is not visible", field);
    }

    fn type_into(state: &mut ProjectWizardState, field: ProjectField, text: &str) {
        go_to(state, field);
        handle_key(state, KeyCode::Enter);
        for c in text.chars() {
            handle_key(state, KeyCode::Char(c));
        }
        handle_key(state, KeyCode::Enter);
    }

    fn clear(state: &mut ProjectWizardState, field: ProjectField) {
        go_to(state, field);
        handle_key(state, KeyCode::Enter);
        handle_key(state, KeyCode::Delete);
        handle_key(state, KeyCode::Enter);
    }

    #[test]
    fn new_wizard_prefills_default_rates() {
        let state = wizard();

        assert_eq!(state.project.client_id, 5);
        assert_eq!(state.field_value(ProjectField::PricePerPage), "100");
        assert_eq!(state.field_value(ProjectField::ExtraHourRate), "50");
        assert_eq!(state.project.total_amount, 0.0);
    }

    #[test]
    fn total_and_status_follow_every_keystroke() {
        let mut state = wizard();
        type_into(&mut state, ProjectField::TotalPages, "10");
        type_into(&mut state, ProjectField::CompletedPages, "4");

        assert_eq!(state.project.total_amount, 400.0);
        assert_eq!(state.project.payment_status, PaymentStatus::Unpaid);

        clear(&mut state, ProjectField::PaidAmount);
        type_into(&mut state, ProjectField::PaidAmount, "150");
        assert_eq!(state.project.payment_status, PaymentStatus::Partial);

        type_into(&mut state, ProjectField::ExtraHours, "2");
        assert_eq!(state.project.total_amount, 500.0);

        clear(&mut state, ProjectField::PaidAmount);
        type_into(&mut state, ProjectField::PaidAmount, "500");
        assert_eq!(state.project.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn switching_type_changes_fields_and_total() {
        let mut state = wizard();
        type_into(&mut state, ProjectField::CompletedPages, "3");
        assert_eq!(state.project.total_amount, 300.0);

        go_to(&mut state, ProjectField::ProjectType);
        handle_key(&mut state, KeyCode::Enter);

        assert_eq!(state.project.project_type, ProjectType::Backend);
        assert!(!state.visible_fields().contains(&ProjectField::CompletedPages));
        assert!(state.visible_fields().contains(&ProjectField::FixedPrice));
        assert_eq!(state.project.total_amount, 0.0);

        type_into(&mut state, ProjectField::CompletionPercentage, "50");
        assert_eq!(state.project.total_amount, 1000.0);
    }

    #[test]
    fn enter_cycles_status() {
        let mut state = wizard();
        go_to(&mut state, ProjectField::Status);
        handle_key(&mut state, KeyCode::Enter);

        assert_eq!(state.project.status, ProjectStatus::InProgress);
        assert!(!state.editing);
    }

    #[test]
    fn save_requires_valid_form() {
        let mut state = wizard();
        assert_eq!(state.validation_error(), Some("Project name is required"));
        assert!(handle_key(&mut state, KeyCode::Char('s')).is_none());

        type_into(&mut state, ProjectField::Name, "Landing page");
        type_into(&mut state, ProjectField::TotalPages, "2");
        type_into(&mut state, ProjectField::CompletedPages, "5");
        assert_eq!(
            state.validation_error(),
            Some("Completed pages cannot exceed total pages")
        );

        clear(&mut state, ProjectField::CompletedPages);
        type_into(&mut state, ProjectField::CompletedPages, "2");
        match handle_key(&mut state, KeyCode::Char('s')) {
            Some(ProjectWizardAction::Save(project)) => {
                assert_eq!(project.name, "Landing page");
                assert_eq!(project.total_amount, 200.0);
            }
            _ => panic!("expected save action"),
        }
    }

    #[test]
    fn deadline_can_be_set_and_cleared() {
        let mut state = wizard();
        go_to(&mut state, ProjectField::Deadline);
        handle_key(&mut state, KeyCode::Enter);
        assert_eq!(state.project.deadline, None);

        for c in "2024".chars() {
            handle_key(&mut state, KeyCode::Char(c));
        }
        assert_eq!(state.project.deadline, Some(today()));
        assert_eq!(state.project.days_remaining(today()), Some(0));

        handle_key(&mut state, KeyCode::Delete);
        handle_key(&mut state, KeyCode::Enter);
        assert_eq!(state.project.deadline, None);
    }

    #[test]
    fn opening_and_escaping_deadline_keeps_it_unset() {
        let mut state = wizard();
        type_into(&mut state, ProjectField::Name, "Docs site");
        go_to(&mut state, ProjectField::Deadline);
        handle_key(&mut state, KeyCode::Enter);
        handle_key(&mut state, KeyCode::Esc);
        assert!(!state.editing);

        match handle_key(&mut state, KeyCode::Char('s')) {
            Some(ProjectWizardAction::Save(project)) => {
                assert_eq!(project.deadline, None);
                assert_eq!(project.days_remaining(today()), None);
            }
            _ => panic!("expected save action"),
        }
    }

    #[test]
    fn escape_restores_existing_start_date() {
        let start = NaiveDate::from_ymd_opt(2024, 8, 15).expect("valid date");
        let mut project = Project::draft(5, &settings());
        project.start_date = Some(start);
        let mut state = ProjectWizardState::from_existing(project, "TRY", today());

        go_to(&mut state, ProjectField::StartDate);
        handle_key(&mut state, KeyCode::Enter);
        handle_key(&mut state, KeyCode::Delete);
        assert_eq!(state.project.start_date, None);

        handle_key(&mut state, KeyCode::Esc);
        assert_eq!(state.project.start_date, Some(start));
    }

    #[test]
    fn escape_outside_editing_cancels() {
        let mut state = wizard();
        assert!(matches!(
            handle_key(&mut state, KeyCode::Esc),
            Some(ProjectWizardAction::Cancel)
        ));
    }

    #[test]
    fn navigation_wraps_around_visible_fields() {
        let mut state = wizard();
        handle_key(&mut state, KeyCode::Up);
        assert_eq!(state.current_field, ProjectField::Notes);

        handle_key(&mut state, KeyCode::Down);
        assert_eq!(state.current_field, ProjectField::Name);
    }
}
