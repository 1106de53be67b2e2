//! Duration strings as authored in the sheets
//!
//! Accepted forms: `HH:MM:SS`, `MM:SS`, or a bare number of seconds.

/// Parse a duration string into seconds
pub fn parse_duration(value: &str) -> Result<i64, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("empty duration".to_string());
    }

    let parts: Vec<&str> = value.split(':').collect();
    if parts.len() > 3 {
        return Err(format!("invalid duration '{}': expected HH:MM:SS", value));
    }

    let mut numbers = Vec::with_capacity(parts.len());
    for part in &parts {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("invalid duration '{}': expected HH:MM:SS", value));
        }
        let n: i64 = part
            .parse()
            .map_err(|_| format!("invalid duration '{}': component out of range", value))?;
        numbers.push(n);
    }

    // Every component after the leading one is base 60
    if numbers.iter().skip(1).any(|n| *n >= 60) {
        return Err(format!(
            "invalid duration '{}': minutes and seconds must be below 60",
            value
        ));
    }

    numbers
        .iter()
        .try_fold(0i64, |acc, n| acc.checked_mul(60)?.checked_add(*n))
        .ok_or_else(|| format!("invalid duration '{}': out of range", value))
}

/// Format seconds as `HH:MM:SS`
pub fn format_duration(total: i64) -> String {
    let total = total.max(0);
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}
