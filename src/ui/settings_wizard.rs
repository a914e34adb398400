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

use crate::models::Settings;
use crate::ui::components::number_input::NumberInput;

pub enum SettingsWizardAction {
    Cancel,
    Save(Settings),
}

#[derive(Clone, PartialEq, Copy, Debug)]
pub enum SettingsField {
    CompanyName,
    CompanyEmail,
    CompanyPhone,
    CompanyAddress,
    CompanyWebsite,
    Currency,
    Language,
    DefaultPricePerPage,
    DefaultExtraHourRate,
    DefaultFixedPrice,
    TaxRate,
}

const FIELDS: [SettingsField; 11] = [
    SettingsField::CompanyName,
    SettingsField::CompanyEmail,
    SettingsField::CompanyPhone,
    SettingsField::CompanyAddress,
    SettingsField::CompanyWebsite,
    SettingsField::Currency,
    SettingsField::Language,
    SettingsField::DefaultPricePerPage,
    SettingsField::DefaultExtraHourRate,
    SettingsField::DefaultFixedPrice,
    SettingsField::TaxRate,
];

impl SettingsField {
    fn label(self) -> &'static str {
        match self {
            SettingsField::CompanyName => "Company Name",
            SettingsField::CompanyEmail => "Company Email",
            SettingsField::CompanyPhone => "Company Phone",
            SettingsField::CompanyAddress => "Company Address",
            SettingsField::CompanyWebsite => "Company Website",
            SettingsField::Currency => "Currency",
            SettingsField::Language => "Language",
            SettingsField::DefaultPricePerPage => "Default Price per Page",
            SettingsField::DefaultExtraHourRate => "Default Extra Hour Rate",
            SettingsField::DefaultFixedPrice => "Default Fixed Price",
            SettingsField::TaxRate => "Tax Rate (%)",
        }
    }
}

pub struct SettingsWizardState {
    pub settings: Settings,
    pub current_field: SettingsField,
    pub editing: bool,
    price_per_page: NumberInput,
    extra_hour_rate: NumberInput,
    fixed_price: NumberInput,
    tax_rate: NumberInput,
}

impl SettingsWizardState {
    pub fn from_existing(settings: Settings) -> Self {
        Self {
            price_per_page: NumberInput::decimal(Some(settings.default_price_per_page)),
            extra_hour_rate: NumberInput::decimal(Some(settings.default_extra_hour_rate)),
            fixed_price: NumberInput::decimal(Some(settings.default_fixed_price)),
            tax_rate: NumberInput::decimal(Some(settings.tax_rate)),
            settings,
            current_field: SettingsField::CompanyName,
            editing: false,
        }
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
    }

    fn field_index(&self) -> usize {
        FIELDS
            .iter()
            .position(|field| *field == self.current_field)
            .unwrap_or(0)
    }

    pub fn next_field(&mut self) {
        self.current_field = FIELDS[(self.field_index() + 1) % FIELDS.len()];
    }

    pub fn previous_field(&mut self) {
        self.current_field = FIELDS[(self.field_index() + FIELDS.len() - 1) % FIELDS.len()];
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        let text_value = match self.current_field {
            SettingsField::CompanyName => &mut self.settings.company_name,
            SettingsField::CompanyEmail => &mut self.settings.company_email,
            SettingsField::CompanyPhone => &mut self.settings.company_phone,
            SettingsField::CompanyAddress => &mut self.settings.company_address,
            SettingsField::CompanyWebsite => &mut self.settings.company_website,
            SettingsField::Currency => &mut self.settings.currency,
            SettingsField::Language => &mut self.settings.language,
            SettingsField::DefaultPricePerPage => {
                if self.price_per_page.handle_input(key) {
                    self.settings.default_price_per_page = self.price_per_page.as_f64().unwrap_or(0.0);
                }
                return;
            }
            SettingsField::DefaultExtraHourRate => {
                if self.extra_hour_rate.handle_input(key) {
                    self.settings.default_extra_hour_rate = self.extra_hour_rate.as_f64().unwrap_or(0.0);
                }
                return;
            }
            SettingsField::DefaultFixedPrice => {
                if self.fixed_price.handle_input(key) {
                    self.settings.default_fixed_price = self.fixed_price.as_f64().unwrap_or(0.0);
                }
                return;
            }
            SettingsField::TaxRate => {
                if self.tax_rate.handle_input(key) {
                    self.settings.tax_rate = self.tax_rate.as_f64().unwrap_or(0.0);
                }
                return;
            }
        };

        match key {
            KeyCode::Char(c) => text_value.push(c),
            KeyCode::Backspace => {
                text_value.pop();
            }
            _ => {}
        }
    }

    /// Currency and language may not be left blank
    pub fn validation_error(&self) -> Option<&'static str> {
        if self.settings.currency.trim().is_empty() {
            Some("Currency is required")
        } else if self.settings.language.trim().is_empty() {
            Some("Language is required")
        } else {
            None
        }
    }

    fn field_value(&self, field: SettingsField) -> String {
        match field {
            SettingsField::CompanyName => self.settings.company_name.clone(),
            SettingsField::CompanyEmail => self.settings.company_email.clone(),
            SettingsField::CompanyPhone => self.settings.company_phone.clone(),
            SettingsField::CompanyAddress => self.settings.company_address.clone(),
            SettingsField::CompanyWebsite => self.settings.company_website.clone(),
            SettingsField::Currency => self.settings.currency.clone(),
            SettingsField::Language => self.settings.language.clone(),
            SettingsField::DefaultPricePerPage => self.price_per_page.as_str().to_string(),
            SettingsField::DefaultExtraHourRate => self.extra_hour_rate.as_str().to_string(),
            SettingsField::DefaultFixedPrice => self.fixed_price.as_str().to_string(),
            SettingsField::TaxRate => self.tax_rate.as_str().to_string(),
        }
    }
}

pub fn render_settings_wizard<B: Backend>(f: &mut Frame<B>, state: &mut SettingsWizardState) {
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

    let title = Paragraph::new("Settings")
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    render_form(f, state, chunks[1]);

    let help = match state.validation_error() {
        Some(message) => Paragraph::new(message).style(Style::default().fg(Color::Red)),
        None if state.editing => Paragraph::new("Enter - Save field | Esc - Cancel editing")
            .style(Style::default().fg(Color::Gray)),
        None => Paragraph::new(
            "Enter - Edit field | Up/Down - Navigate fields | S - Save settings | Esc - Cancel",
        )
        .style(Style::default().fg(Color::Gray)),
    };
    f.render_widget(help.block(Block::default().borders(Borders::ALL)), chunks[2]);
}

fn render_form<B: Backend>(f: &mut Frame<B>, state: &mut SettingsWizardState, area: Rect) {
    let items: Vec<ListItem> = FIELDS
        .iter()
        .map(|field| {
            let value = state.field_value(*field);
            let name = field.label();
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
        .block(Block::default().borders(Borders::ALL).title("Company & Defaults"));

    f.render_widget(form_list, area);
}

/// Apply one key press to the settings form
pub fn handle_key(state: &mut SettingsWizardState, key: KeyCode) -> Option<SettingsWizardAction> {
    match key {
        KeyCode::Esc => {
            if state.editing {
                state.toggle_editing();
            } else {
                return Some(SettingsWizardAction::Cancel);
            }
        }
        KeyCode::Enter => state.toggle_editing(),
        KeyCode::Up if !state.editing => state.previous_field(),
        KeyCode::Down if !state.editing => state.next_field(),
        KeyCode::Char('s') if !state.editing => {
            if state.validation_error().is_none() {
                let mut settings = state.settings.clone();
                settings.currency = settings.currency.trim().to_uppercase();
                settings.language = settings.language.trim().to_string();
                return Some(SettingsWizardAction::Save(settings));
            }
        }
        _ if state.editing => state.edit_current_field(key),
        _ => {}
    }

    None
}

pub fn handle_input(state: &mut SettingsWizardState) -> Result<Option<SettingsWizardAction>> {
    if let Event::Key(key) = event::read()? {
        return Ok(handle_key(state, key.code));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn move_to(state: &mut SettingsWizardState, field: SettingsField) {
        while state.current_field != field {
            handle_key(state, KeyCode::Down);
        }
    }

    #[test]
    fn number_fields_update_settings() {
        let mut state = SettingsWizardState::from_existing(Settings::default());
        move_to(&mut state, SettingsField::DefaultPricePerPage);
        handle_key(&mut state, KeyCode::Enter);
        handle_key(&mut state, KeyCode::Backspace);
        for c in "150.5".chars() {
            handle_key(&mut state, KeyCode::Char(c));
        }
        handle_key(&mut state, KeyCode::Enter);

        match handle_key(&mut state, KeyCode::Char('s')) {
            Some(SettingsWizardAction::Save(settings)) => {
                assert_eq!(settings.default_price_per_page, 150.5);
                assert_eq!(settings.currency, "TRY");
            }
            _ => panic!("expected save"),
        }
    }

    #[test]
    fn letters_are_ignored_in_number_fields() {
        let mut state = SettingsWizardState::from_existing(Settings::default());
        move_to(&mut state, SettingsField::TaxRate);
        handle_key(&mut state, KeyCode::Enter);
        handle_key(&mut state, KeyCode::Char('x'));

        assert_eq!(state.field_value(SettingsField::TaxRate), "0");
        assert_eq!(state.settings.tax_rate, 0.0);
    }

    #[test]
    fn blank_currency_blocks_save() {
        let mut state = SettingsWizardState::from_existing(Settings::default());
        state.settings.currency.clear();

        assert!(handle_key(&mut state, KeyCode::Char('s')).is_none());
        assert_eq!(state.validation_error(), Some("Currency is required"));
    }

    #[test]
    fn field_navigation_wraps() {
        let mut state = SettingsWizardState::from_existing(Settings::default());
        handle_key(&mut state, KeyCode::Up);

        assert_eq!(state.current_field, SettingsField::TaxRate);
    }
}
