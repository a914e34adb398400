use chrono::NaiveDate;

/// Amount with two decimals, thousands grouped, followed by the currency code
pub fn format_currency(amount: f64, currency: &str) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{}{}.{} {}", sign, grouped, fraction, currency)
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => "-".to_string(),
    }
}

pub fn format_days_remaining(days: Option<i64>) -> String {
    match days {
        None => "No deadline".to_string(),
        Some(0) => "Due today".to_string(),
        Some(1) => "1 day left".to_string(),
        Some(-1) => "Overdue by 1 day".to_string(),
        Some(days) if days < 0 => format!("Overdue by {} days", -days),
        Some(days) => format!("{} days left", days),
    }
}

/// Text progress bar, e.g. `[#####-----] 50%`
pub fn progress_bar(percent: f64, width: usize) -> String {
    let percent = percent.clamp(0.0, 100.0);
    let filled = ((percent / 100.0) * width as f64).round() as usize;

    format!(
        "[{}{}] {:.0}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        percent
    )
}
