use crossterm::event::KeyCode;

/// Text buffer for a numeric form field.
///
/// Accepts digits and, when `allow_decimal` is set, a single `.`. An empty
/// buffer reads as "no value".
#[derive(Debug, Clone, PartialEq)]
pub struct NumberInput {
    buffer: String,
    allow_decimal: bool,
}

impl NumberInput {
    pub fn integer(value: Option<i32>) -> Self {
        Self {
            buffer: value.map(|v| v.to_string()).unwrap_or_default(),
            allow_decimal: false,
        }
    }

    pub fn decimal(value: Option<f64>) -> Self {
        Self {
            buffer: value.map(format_number).unwrap_or_default(),
            allow_decimal: true,
        }
    }

    /// Returns true when the key changed the buffer
    pub fn handle_input(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                self.buffer.push(c);
                true
            }
            KeyCode::Char('.') | KeyCode::Char(',')
                if self.allow_decimal && !self.buffer.contains('.') =>
            {
                if self.buffer.is_empty() {
                    self.buffer.push('0');
                }
                self.buffer.push('.');
                true
            }
            KeyCode::Backspace => self.buffer.pop().is_some(),
            KeyCode::Delete => {
                let changed = !self.buffer.is_empty();
                self.buffer.clear();
                changed
            }
            _ => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.buffer.trim_end_matches('.').parse::<f64>().ok()
    }

    /// Values too large for `i32` read as no value
    pub fn as_i32(&self) -> Option<i32> {
        self.buffer.parse::<i32>().ok()
    }
}

/// Whole numbers without a fraction, everything else as-is
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_keys(input: &mut NumberInput, keys: &str) {
        for c in keys.chars() {
            input.handle_input(KeyCode::Char(c));
        }
    }

    #[test]
    fn integer_input_rejects_decimal_point() {
        let mut input = NumberInput::integer(None);
        type_keys(&mut input, "1.5a2");

        assert_eq!(input.as_str(), "152");
        assert_eq!(input.as_i32(), Some(152));
    }

    #[test]
    fn decimal_input_accepts_one_point() {
        let mut input = NumberInput::decimal(None);
        type_keys(&mut input, ".5.2");

        assert_eq!(input.as_str(), "0.52");
        assert_eq!(input.as_f64(), Some(0.52));
    }

    #[test]
    fn trailing_point_still_parses() {
        let mut input = NumberInput::decimal(Some(12.0));
        input.handle_input(KeyCode::Char('.'));

        assert_eq!(input.as_str(), "12.");
        assert_eq!(input.as_f64(), Some(12.0));
    }

    #[test]
    fn backspace_and_delete_edit_buffer() {
        let mut input = NumberInput::decimal(Some(42.5));
        assert_eq!(input.as_str(), "42.5");

        assert!(input.handle_input(KeyCode::Backspace));
        assert_eq!(input.as_str(), "42.");

        assert!(input.handle_input(KeyCode::Delete));
        assert_eq!(input.as_f64(), None);
        assert!(!input.handle_input(KeyCode::Backspace));
    }

    #[test]
    fn whole_numbers_format_without_fraction() {
        assert_eq!(format_number(250.0), "250");
        assert_eq!(format_number(12.75), "12.75");
    }
}
