use anyhow::Result;
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
use crate::models::Client;
use crate::ui::components::centered_rect;

// Represents the state of the client selection screen
pub struct ClientsState {
    clients: Vec<Client>,
    visible: Vec<usize>,
    list_state: ListState,
    show_delete_confirmation: bool,
    share_url: Option<String>,
    error: Option<String>,
    search: String,
    searching: bool,
}

/// Case-insensitive match on name, email or company
pub fn client_matches(client: &Client, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }

    [Some(&client.name), client.email.as_ref(), client.company.as_ref()]
        .into_iter()
        .flatten()
        .any(|value| value.to_lowercase().contains(&term))
}

impl ClientsState {
    pub fn new(clients: Vec<Client>) -> Self {
        let mut state = Self {
            visible: (0..clients.len()).collect(),
            clients,
            list_state: ListState::default(),
            show_delete_confirmation: false,
            share_url: None,
            error: None,
            search: String::new(),
            searching: false,
        };
        state.reset_selection();
        state
    }

    fn reset_selection(&mut self) {
        self.list_state
            .select(if self.visible.is_empty() { None } else { Some(0) });
    }

    fn apply_search(&mut self) {
        self.visible = self
            .clients
            .iter()
            .enumerate()
            .filter(|(_, client)| client_matches(client, &self.search))
            .map(|(i, _)| i)
            .collect();
        self.reset_selection();
    }

    pub fn next(&mut self) {
        if self.visible.is_empty() {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) => {
                if i >= self.visible.len() - 1 {
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
        if self.visible.is_empty() {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) => {
                if i == 0 {
                    self.visible.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_client(&mut self, client_id: i32) {
        if let Some(i) = self
            .visible
            .iter()
            .position(|&index| self.clients[index].id == client_id)
        {
            self.list_state.select(Some(i));
        }
    }

    pub fn toggle_delete_confirmation(&mut self) {
        self.show_delete_confirmation = !self.show_delete_confirmation;
    }

    pub fn open_share_popup(&mut self, url: String) {
        self.share_url = Some(url);
    }

    /// Shown under the list until the next key press
    pub fn set_error(&mut self, message: String) {
        self.error = Some(message);
    }

    pub fn selected_client(&self) -> Option<&Client> {
        self.list_state
            .selected()
            .and_then(|i| self.visible.get(i))
            .and_then(|&index| self.clients.get(index))
    }

    pub fn selected_client_id(&self) -> Option<i32> {
        self.selected_client().map(|c| c.id)
    }
}

pub enum ClientAction {
    Back,
    NewClient,
    EditClient(i32),            // Contains client_id
    DeleteClient(i32),          // Contains client_id
    SelectClient(i32),          // Contains client_id
    ShareClient(i32),           // Contains client_id
    RegenerateShareToken(i32),  // Contains client_id
}

// DB operations for clients
pub async fn load_clients(db: &Database) -> Result<Vec<Client>> {
    db.get_clients().await
}

pub fn render_clients<B: Backend>(frame: &mut Frame<B>, state: &mut ClientsState) {
    let size = frame.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)].as_ref())
        .split(size);

    let items: Vec<ListItem> = state
        .visible
        .iter()
        .filter_map(|&index| state.clients.get(index))
        .map(|client| {
            let mut spans = vec![
                Span::styled(client.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(format!("  ({})", client.client_type.label())),
            ];
            if let Some(company) = client.company.as_ref().filter(|c| !c.is_empty()) {
                spans.push(Span::raw(format!(" - {}", company)));
            }
            if !client.tags.is_empty() {
                spans.push(Span::styled(
                    format!("  #{}", client.tags.join(" #")),
                    Style::default().fg(Color::Gray),
                ));
            }
            ListItem::new(Spans::from(spans))
        })
        .collect();

    let title = if state.search.is_empty() {
        format!("Clients ({})", state.visible.len())
    } else {
        format!("Clients ({}) - search: {}", state.visible.len(), state.search)
    };
    let clients_list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_stateful_widget(clients_list, chunks[0], &mut state.list_state);

    let footer = match &state.error {
        Some(error) => Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red)),
        None if state.searching => Paragraph::new(format!("Search: {}|", state.search))
            .style(Style::default().fg(Color::Yellow)),
        None => {
            let buttons_text = if state.selected_client().is_some() {
                "<N> New | <E> Edit | <D> Delete | <L> Portal Link | </> Search | <Enter> View Projects | <Esc> Back"
            } else {
                "<N> New Client | </> Search | <Esc> Back"
            };
            Paragraph::new(buttons_text).style(Style::default().fg(Color::White))
        }
    };

    frame.render_widget(footer.block(Block::default().borders(Borders::TOP)), chunks[1]);

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
        Spans::from("Are you sure you want to delete this client?"),
        Spans::from(""),
        Spans::from("Clients that still have projects cannot be deleted."),
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
        Spans::from("Client portal link (all projects, read-only):"),
        Spans::from(""),
        Spans::from(Span::styled(url.to_string(), Style::default().fg(Color::Cyan))),
        Spans::from(""),
        Spans::from("<R> Regenerate link  <Esc> Close"),
    ])
    .wrap(Wrap { trim: false })
    .block(Block::default().title("Client Portal").borders(Borders::ALL))
    .style(Style::default().fg(Color::White).bg(Color::Black));

    frame.render_widget(popup, popup_area);
}

/// Apply one key press to the client list
pub fn handle_key(state: &mut ClientsState, key: KeyCode) -> Option<ClientAction> {
    state.error = None;

    if state.share_url.is_some() {
        match key {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => state.share_url = None,
            KeyCode::Char('r') => {
                return state.selected_client_id().map(ClientAction::RegenerateShareToken);
            }
            _ => {}
        }
        return None;
    }

    if state.searching {
        match key {
            KeyCode::Enter => state.searching = false,
            KeyCode::Esc => {
                state.searching = false;
                state.search.clear();
                state.apply_search();
            }
            KeyCode::Backspace => {
                state.search.pop();
                state.apply_search();
            }
            KeyCode::Char(c) => {
                state.search.push(c);
                state.apply_search();
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
                return Some(ClientAction::Back);
            }
        }
        KeyCode::Char('n') => {
            if state.show_delete_confirmation {
                state.toggle_delete_confirmation();
            } else {
                return Some(ClientAction::NewClient);
            }
        }
        KeyCode::Char('e') => {
            if !state.show_delete_confirmation {
                return state.selected_client_id().map(ClientAction::EditClient);
            }
        }
        KeyCode::Char('d') => {
            if !state.show_delete_confirmation && state.selected_client().is_some() {
                state.toggle_delete_confirmation();
            }
        }
        KeyCode::Char('y') => {
            if state.show_delete_confirmation {
                if let Some(id) = state.selected_client_id() {
                    state.toggle_delete_confirmation();
                    return Some(ClientAction::DeleteClient(id));
                }
            }
        }
        KeyCode::Char('l') => {
            if !state.show_delete_confirmation {
                return state.selected_client_id().map(ClientAction::ShareClient);
            }
        }
        KeyCode::Char('/') => {
            if !state.show_delete_confirmation {
                state.searching = true;
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
        KeyCode::Enter => {
            if !state.show_delete_confirmation {
                return state.selected_client_id().map(ClientAction::SelectClient);
            }
        }
        _ => {}
    }

    None
}

pub fn handle_input(state: &mut ClientsState) -> Result<Option<ClientAction>> {
    if let Event::Key(key) = event::read()? {
        return Ok(handle_key(state, key.code));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(ids: &[i32]) -> ClientsState {
        let clients = ids
            .iter()
            .map(|id| {
                let mut client = Client::draft();
                client.id = *id;
                client.name = format!("Client {}", id);
                client
            })
            .collect();
        ClientsState::new(clients)
    }

    #[test]
    fn enter_opens_selected_client() {
        let mut state = state_with(&[10, 11]);
        handle_key(&mut state, KeyCode::Down);

        assert!(matches!(
            handle_key(&mut state, KeyCode::Enter),
            Some(ClientAction::SelectClient(11))
        ));
    }

    #[test]
    fn error_is_cleared_by_next_key() {
        let mut state = state_with(&[1]);
        state.set_error("client 1 still has 2 project(s) and cannot be deleted".to_string());

        handle_key(&mut state, KeyCode::Down);
        assert!(state.error.is_none());
    }

    #[test]
    fn confirmed_delete_emits_action() {
        let mut state = state_with(&[3]);
        handle_key(&mut state, KeyCode::Char('d'));

        assert!(matches!(
            handle_key(&mut state, KeyCode::Char('y')),
            Some(ClientAction::DeleteClient(3))
        ));
        assert!(!state.show_delete_confirmation);
    }

    #[test]
    fn select_client_moves_cursor() {
        let mut state = state_with(&[1, 2, 3]);
        state.select_client(3);

        assert_eq!(state.selected_client_id(), Some(3));
    }

    #[test]
    fn search_covers_name_email_and_company() {
        let mut client = Client::draft();
        client.name = "Ayse Yilmaz".to_string();
        client.email = Some("ayse@studio.test".to_string());
        client.company = Some("Kuzey Design".to_string());

        assert!(client_matches(&client, "yilmaz"));
        assert!(client_matches(&client, "STUDIO"));
        assert!(client_matches(&client, "kuzey"));
        assert!(client_matches(&client, ""));
        assert!(!client_matches(&client, "acme"));
    }

    #[test]
    fn typing_a_search_narrows_the_list() {
        let mut state = state_with(&[1, 2, 12]);
        handle_key(&mut state, KeyCode::Char('/'));
        for c in "client 1".chars() {
            handle_key(&mut state, KeyCode::Char(c));
        }
        handle_key(&mut state, KeyCode::Enter);

        assert_eq!(state.visible.len(), 2);
        handle_key(&mut state, KeyCode::Down);
        assert_eq!(state.selected_client_id(), Some(12));
        assert!(matches!(
            handle_key(&mut state, KeyCode::Enter),
            Some(ClientAction::SelectClient(12))
        ));
    }

    #[test]
    fn escape_in_search_clears_it() {
        let mut state = state_with(&[1, 2]);
        handle_key(&mut state, KeyCode::Char('/'));
        handle_key(&mut state, KeyCode::Char('x'));
        assert!(state.selected_client().is_none());

        handle_key(&mut state, KeyCode::Esc);
        assert!(!state.searching);
        assert_eq!(state.visible.len(), 2);
        assert_eq!(state.selected_client_id(), Some(1));
    }

    #[test]
    fn share_popup_regenerates_for_selected_client() {
        let mut state = state_with(&[5]);
        state.open_share_popup("http://localhost:3000/client/abc".to_string());

        assert!(matches!(
            handle_key(&mut state, KeyCode::Char('r')),
            Some(ClientAction::RegenerateShareToken(5))
        ));
    }
}
