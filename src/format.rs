//! Display helpers shared by the API payloads and the dashboard.

use chrono::{DateTime, NaiveDate, Utc};

/// Two-letter initials. A missing or blank part shows as `?`.
pub fn get_initials(first_name: Option<&str>, last_name: Option<&str>) -> String {
    let initial = |part: Option<&str>| {
        part.and_then(|p| p.trim().chars().next())
            .map(|c| c.to_uppercase().to_string())
            .unwrap_or_else(|| "?".to_string())
    };
    format!("{}{}", initial(first_name), initial(last_name))
}

pub fn format_full_name(first_name: Option<&str>, last_name: Option<&str>) -> String {
    let parts: Vec<&str> = [first_name, last_name]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        "Unknown".to_string()
    } else {
        parts.join(" ")
    }
}

/// e.g. "Mar 2, 2026"
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// e.g. "Mar 2, 2026 14:05"
pub fn format_date_time(at: DateTime<Utc>) -> String {
    at.format("%b %-d, %Y %H:%M").to_string()
}

/// Dollar amount with thousands separators, rounded to cents.
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

/// Minutes as "45 min", "2h" or "1h 30m".
pub fn format_duration(minutes: i64) -> String {
    let minutes = minutes.max(0);
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m} min"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// Share of `part` in `whole` as a whole percentage, clamped to 0..=100.
/// An empty whole is 0%.
pub fn percentage(part: f64, whole: f64) -> u8 {
    if whole <= 0.0 {
        return 0;
    }
    (part / whole * 100.0).round().clamp(0.0, 100.0) as u8
}
