use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::models::Client;

pub enum ClientWizardAction {
    Cancel,
    Save(Client),
}

#[derive(Clone, PartialEq, Copy, Debug)]
pub enum ClientField {
    Name,
    ClientType,
    Email,
    Phone,
    Company,
    Notes,
    Tags,
}

const FIELDS: [ClientField; 7] = [
    ClientField::Name,
    ClientField::ClientType,
    ClientField::Email,
    ClientField::Phone,
    ClientField::Company,
    ClientField::Notes,
    ClientField::Tags,
];

pub struct ClientWizardState {
    pub client: Client,
    pub current_field: ClientField,
    pub editing: bool,
    tags_input: String,
}

impl ClientWizardState {
    pub fn new() -> Self {
        Self::from_existing(Client::draft())
    }

    pub fn from_existing(client: Client) -> Self {
        Self {
            tags_input: client.tags_display(),
            client,
            current_field: ClientField::Name,
            editing: false,
        }
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
    }

    pub fn next_field(&mut self) {
        self.current_field = match self.current_field {
            ClientField::Name => ClientField::ClientType,
            ClientField::ClientType => ClientField::Email,
            ClientField::Email => ClientField::Phone,
            ClientField::Phone => ClientField::Company,
            ClientField::Company => ClientField::Notes,
            ClientField::Notes => ClientField::Tags,
            ClientField::Tags => ClientField::Name,
        };
    }

    pub fn previous_field(&mut self) {
        self.current_field = match self.current_field {
            ClientField::Name => ClientField::Tags,
            ClientField::ClientType => ClientField::Name,
            ClientField::Email => ClientField::ClientType,
            ClientField::Phone => ClientField::Email,
            ClientField::Company => ClientField::Phone,
            ClientField::Notes => ClientField::Company,
            ClientField::Tags => ClientField::Notes,
        };
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        let field_value = match self.current_field {
            ClientField::Name => &mut self.client.name,
            ClientField::Email => self.client.email.get_or_insert_with(String::new),
            ClientField::Phone => self.client.phone.get_or_insert_with(String::new),
            ClientField::Company => self.client.company.get_or_insert_with(String::new),
            ClientField::Notes => self.client.notes.get_or_insert_with(String::new),
            ClientField::Tags => &mut self.tags_input,
            ClientField::ClientType => return,
        };

        match key {
            KeyCode::Char(c) => {
                field_value.push(c);
            }
            KeyCode::Backspace => {
                field_value.pop();
            }
            _ => {}
        }

        if self.current_field == ClientField::Tags {
            self.client.set_tags_from_str(&self.tags_input);
        }
    }

    /// Client ready for the store, blank optional fields dropped
    pub fn finished_client(&self) -> Client {
        let mut client = self.client.clone();
        for value in [
            &mut client.email,
            &mut client.phone,
            &mut client.company,
            &mut client.notes,
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *value = None;
            }
        }
        client.name = client.name.trim().to_string();
        client
    }

    pub fn is_valid(&self) -> bool {
        !self.client.name.trim().is_empty()
    }

    fn field_value(&self, field: ClientField) -> String {
        let optional = |value: &Option<String>| value.clone().unwrap_or_default();
        match field {
            ClientField::Name => self.client.name.clone(),
            ClientField::ClientType => self.client.client_type.label().to_string(),
            ClientField::Email => optional(&self.client.email),
            ClientField::Phone => optional(&self.client.phone),
            ClientField::Company => optional(&self.client.company),
            ClientField::Notes => optional(&self.client.notes),
            ClientField::Tags => self.tags_input.clone(),
        }
    }
}

pub fn render_client_wizard<B: Backend>(f: &mut Frame<B>, state: &mut ClientWizardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.size());

    let title_text = if state.client.id == 0 {
        "Client Creation Wizard"
    } else {
        "Client Editing Wizard"
    };

    let title = Paragraph::new(title_text)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    render_form(f, state, chunks[1]);

    let help_text = if state.editing {
        "Enter - Save field | Esc - Cancel editing"
    } else if state.current_field == ClientField::ClientType {
        "Enter - Switch type | Up/Down - Navigate fields | S - Save client | Esc - Cancel"
    } else {
        "Enter - Edit field | Up/Down - Navigate fields | S - Save client | Esc - Cancel"
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[2]);
}

fn render_form<B: Backend>(f: &mut Frame<B>, state: &mut ClientWizardState, area: Rect) {
    let field_names = [
        "Name",
        "Type",
        "Email",
        "Phone",
        "Company",
        "Notes",
        "Tags (comma separated)",
    ];

    let items: Vec<ListItem> = FIELDS
        .iter()
        .zip(field_names.iter())
        .map(|(field, name)| {
            let value = state.field_value(*field);
            let content = if *field == state.current_field && state.editing {
                Spans::from(vec![
                    Span::styled(format!("{}: ", name), Style::default().fg(Color::Yellow)),
                    Span::styled(
                        format!("{}|", value),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ])
            } else {
                let style = if *field == state.current_field {
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
        .block(Block::default().borders(Borders::ALL).title("Client Details"))
        .highlight_style(Style::default().fg(Color::Yellow));

    f.render_widget(form_list, area);
}

/// Apply one key press to the wizard
pub fn handle_key(state: &mut ClientWizardState, key: KeyCode) -> Option<ClientWizardAction> {
    match key {
        KeyCode::Esc => {
            if state.editing {
                state.toggle_editing();
            } else {
                return Some(ClientWizardAction::Cancel);
            }
        }
        KeyCode::Enter => {
            if !state.editing && state.current_field == ClientField::ClientType {
                state.client.client_type = state.client.client_type.toggled();
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
                return Some(ClientWizardAction::Save(state.finished_client()));
            }
        }
        _ if state.editing => {
            state.edit_current_field(key);
        }
        _ => {}
    }

    None
}

pub fn handle_input(state: &mut ClientWizardState) -> Result<Option<ClientWizardAction>> {
    if let Event::Key(key) = event::read()? {
        return Ok(handle_key(state, key.code));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_text(state: &mut ClientWizardState, text: &str) {
        handle_key(state, KeyCode::Enter);
        for c in text.chars() {
            handle_key(state, KeyCode::Char(c));
        }
        handle_key(state, KeyCode::Enter);
    }

    #[test]
    fn fills_fields_and_saves() {
        let mut state = ClientWizardState::new();
        type_text(&mut state, "Acme");
        handle_key(&mut state, KeyCode::Down);
        handle_key(&mut state, KeyCode::Enter);
        handle_key(&mut state, KeyCode::Down);
        type_text(&mut state, "ops@acme.test");
        for _ in 0..4 {
            handle_key(&mut state, KeyCode::Down);
        }
        type_text(&mut state, "retainer, web");

        match handle_key(&mut state, KeyCode::Char('s')) {
            Some(ClientWizardAction::Save(client)) => {
                assert_eq!(client.name, "Acme");
                assert_eq!(client.client_type.to_string(), "corporate");
                assert_eq!(client.email.as_deref(), Some("ops@acme.test"));
                assert_eq!(client.phone, None);
                assert_eq!(client.tags, vec!["retainer", "web"]);
            }
            _ => panic!("expected save"),
        }
    }

    #[test]
    fn blank_optional_fields_become_none() {
        let mut state = ClientWizardState::new();
        state.client.name = "Solo".to_string();
        state.client.company = Some("  ".to_string());

        let client = state.finished_client();
        assert_eq!(client.company, None);
    }

    #[test]
    fn name_is_required() {
        let mut state = ClientWizardState::new();
        assert!(handle_key(&mut state, KeyCode::Char('s')).is_none());
    }

    #[test]
    fn existing_tags_are_editable() {
        let mut client = Client::draft();
        client.tags = vec!["a".to_string(), "b".to_string()];
        let mut state = ClientWizardState::from_existing(client);
        state.current_field = ClientField::Tags;
        state.toggle_editing();
        state.edit_current_field(KeyCode::Backspace);

        assert_eq!(state.client.tags, vec!["a"]);
    }
}
