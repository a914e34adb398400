use chrono::{Datelike, NaiveDate};
use crossterm::event::KeyCode;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum DatePart {
    Year,
    Month,
    Day,
}

/// Editor for an optional date, typed part by part as YYYY, MM, DD
pub struct DateInputState {
    pub date: Option<NaiveDate>,
    pub editing: bool,
    pub date_part: DatePart,
    pub current_date_input: String,
    fallback: NaiveDate,
    before_edit: Option<NaiveDate>,
}

impl DateInputState {
    /// `fallback` fills the parts not typed yet while the date is unset
    pub fn new(date: Option<NaiveDate>, fallback: NaiveDate) -> Self {
        Self {
            date,
            editing: false,
            date_part: DatePart::Year,
            current_date_input: String::new(),
            fallback,
            before_edit: date,
        }
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
        self.current_date_input.clear();
        if self.editing {
            self.date_part = DatePart::Year;
            self.before_edit = self.date;
        }
    }

    /// Leave edit mode and restore the date from before editing started
    pub fn cancel_editing(&mut self) {
        self.date = self.before_edit;
        self.editing = false;
        self.current_date_input.clear();
    }

    pub fn next_date_part(&mut self) {
        self.date_part = match self.date_part {
            DatePart::Year => DatePart::Month,
            DatePart::Month => DatePart::Day,
            DatePart::Day => DatePart::Year,
        };
        self.current_date_input.clear();
    }

    pub fn previous_date_part(&mut self) {
        self.date_part = match self.date_part {
            DatePart::Year => DatePart::Day,
            DatePart::Month => DatePart::Year,
            DatePart::Day => DatePart::Month,
        };
        self.current_date_input.clear();
    }

    pub fn handle_input(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        match key {
            KeyCode::Char(c) if c.is_ascii_digit() => self.push_digit(c),
            KeyCode::Backspace => {
                self.current_date_input.pop();
            }
            KeyCode::Delete => {
                self.date = None;
                self.current_date_input.clear();
            }
            KeyCode::Right => self.next_date_part(),
            KeyCode::Left => self.previous_date_part(),
            _ => {}
        }
    }

    fn push_digit(&mut self, c: char) {
        let current = self.date.unwrap_or(self.fallback);
        let (year, month, day) = (current.year(), current.month(), current.day());

        self.current_date_input.push(c);
        let needed = match self.date_part {
            DatePart::Year => 4,
            DatePart::Month | DatePart::Day => 2,
        };
        if self.current_date_input.len() < needed {
            return;
        }

        let candidate = match self.date_part {
            DatePart::Year => self
                .current_date_input
                .parse::<i32>()
                .ok()
                .filter(|y| (1900..=2100).contains(y))
                .and_then(|y| NaiveDate::from_ymd_opt(y, month, day)),
            DatePart::Month => self
                .current_date_input
                .parse::<u32>()
                .ok()
                .and_then(|m| NaiveDate::from_ymd_opt(year, m, day)),
            DatePart::Day => self
                .current_date_input
                .parse::<u32>()
                .ok()
                .and_then(|d| NaiveDate::from_ymd_opt(year, month, d)),
        };

        if let Some(new_date) = candidate {
            self.date = Some(new_date);
        }
        self.current_date_input.clear();
    }

    pub fn get_display_string(&self) -> String {
        let date = match self.date {
            Some(date) => date,
            None if self.editing => self.fallback,
            None => return "Not set".to_string(),
        };

        let (year, month, day) = (
            format!("{:04}", date.year()),
            format!("{:02}", date.month()),
            format!("{:02}", date.day()),
        );
        if !self.editing {
            return format!("{}-{}-{}", year, month, day);
        }

        let current_input = if !self.current_date_input.is_empty() {
            format!("[{}]", self.current_date_input)
        } else {
            match self.date_part {
                DatePart::Year => "[YYYY]".to_string(),
                DatePart::Month => "[MM]".to_string(),
                DatePart::Day => "[DD]".to_string(),
            }
        };

        match self.date_part {
            DatePart::Year => format!("{}{}-{}-{}", year, current_input, month, day),
            DatePart::Month => format!("{}-{}{}-{}", year, month, current_input, day),
            DatePart::Day => format!("{}-{}-{}{}", year, month, day, current_input),
        }
    }
}
