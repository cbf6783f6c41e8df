use chrono::NaiveDate;

/// Format a phone number for display.
/// Groups UK numbers as `01632 960123` / `07700 900123`; anything else is
/// returned unchanged.
pub fn format_phone(phone: &str) -> String {
    // Extract just the digits
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    let national = if digits.len() == 12 && digits.starts_with("44") {
        format!("0{}", &digits[2..])
    } else {
        digits
    };

    if national.len() == 11 && national.starts_with('0') {
        format!("{} {}", &national[0..5], &national[5..])
    } else {
        phone.to_string()
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// `Mon 02 Mar 2026`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%a %d %b %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("07700900123"), "07700 900123");
        assert_eq!(format_phone("+44 7700 900123"), "07700 900123");
        assert_eq!(format_phone("0113-496-0000"), "01134 960000");
        assert_eq!(format_phone("123"), "123"); // Too short, return as-is
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date");
        assert_eq!(format_date(date), "Mon 02 Mar 2026");
    }
}
