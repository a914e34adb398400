use std::collections::HashMap;

/// Application settings, stored as key/value rows in the `settings` table
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub default_price_per_page: f64,
    pub default_extra_hour_rate: f64,
    pub default_fixed_price: f64,
    pub company_name: String,
    pub company_email: String,
    pub company_phone: String,
    pub company_address: String,
    pub company_website: String,
    pub tax_rate: f64,
    pub currency: String,
    pub language: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_price_per_page: 0.0,
            default_extra_hour_rate: 0.0,
            default_fixed_price: 0.0,
            company_name: String::new(),
            company_email: String::new(),
            company_phone: String::new(),
            company_address: String::new(),
            company_website: String::new(),
            tax_rate: 0.0,
            currency: "TRY".to_string(),
            language: "tr".to_string(),
        }
    }
}

fn number(values: &HashMap<String, String>, key: &str) -> f64 {
    values
        .get(key)
        .and_then(|value| value.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn text(values: &HashMap<String, String>, key: &str, fallback: &str) -> String {
    match values.get(key) {
        Some(value) if !value.is_empty() => value.clone(),
        _ => fallback.to_string(),
    }
}

impl Settings {
    /// Build settings from stored pairs; unparseable numbers read as 0
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let values: HashMap<String, String> = pairs.into_iter().collect();
        let defaults = Settings::default();

        Self {
            default_price_per_page: number(&values, "default_price_per_page"),
            default_extra_hour_rate: number(&values, "default_extra_hour_rate"),
            default_fixed_price: number(&values, "default_fixed_price"),
            company_name: text(&values, "company_name", ""),
            company_email: text(&values, "company_email", ""),
            company_phone: text(&values, "company_phone", ""),
            company_address: text(&values, "company_address", ""),
            company_website: text(&values, "company_website", ""),
            tax_rate: number(&values, "tax_rate"),
            currency: text(&values, "currency", &defaults.currency),
            language: text(&values, "language", &defaults.language),
        }
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("default_price_per_page", self.default_price_per_page.to_string()),
            ("default_extra_hour_rate", self.default_extra_hour_rate.to_string()),
            ("default_fixed_price", self.default_fixed_price.to_string()),
            ("company_name", self.company_name.clone()),
            ("company_email", self.company_email.clone()),
            ("company_phone", self.company_phone.clone()),
            ("company_address", self.company_address.clone()),
            ("company_website", self.company_website.clone()),
            ("tax_rate", self.tax_rate.to_string()),
            ("currency", self.currency.clone()),
            ("language", self.language.clone()),
        ]
    }
}
