//! Russian phone numbers, shown as `+7 (XXX) XXX XX XX` and stored as `+7XXXXXXXXXX`.

pub const MASK: &str = "+7 (___) ___ __ __";

fn digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Subscriber digits: a leading 8 is read as the 7 country code, which is
/// then dropped, and at most ten digits are kept.
fn subscriber_digits(raw: &str) -> String {
    let mut digits = digits(raw);
    if digits.starts_with('8') {
        digits.replace_range(..1, "7");
    }
    if digits.starts_with('7') {
        digits.remove(0);
    }
    digits.truncate(10);
    digits
}

/// Formats whatever has been typed so far against the mask.
pub fn apply_mask(raw: &str) -> String {
    let d = subscriber_digits(raw);
    let mut result = String::from("+7");
    if !d.is_empty() {
        result.push_str(" (");
        result.push_str(&d[..d.len().min(3)]);
    }
    if d.len() >= 3 {
        result.push(')');
    }
    if d.len() > 3 {
        result.push(' ');
        result.push_str(&d[3..d.len().min(6)]);
    }
    if d.len() > 6 {
        result.push(' ');
        result.push_str(&d[6..d.len().min(8)]);
    }
    if d.len() > 8 {
        result.push(' ');
        result.push_str(&d[8..]);
    }
    result
}

/// The stored form of a complete number, `None` while it is incomplete.
pub fn normalize(raw: &str) -> Option<String> {
    let d = subscriber_digits(raw);
    (d.len() == 10).then(|| format!("+7{d}"))
}

/// Display form of a stored value.
pub fn display_from_storage(stored: &str) -> String {
    if stored.is_empty() {
        return String::new();
    }
    if digits(stored).is_empty() {
        return stored.to_owned();
    }
    apply_mask(stored)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_fills_progressively() {
        assert_eq!(apply_mask(""), "+7");
        assert_eq!(apply_mask("9"), "+7 (9");
        assert_eq!(apply_mask("912"), "+7 (912)");
        assert_eq!(apply_mask("9123"), "+7 (912) 3");
        assert_eq!(apply_mask("9123456"), "+7 (912) 345 6");
        assert_eq!(apply_mask("912345678"), "+7 (912) 345 67 8");
        assert_eq!(apply_mask("9123456789"), "+7 (912) 345 67 89");
    }

    #[test]
    fn leading_eight_and_country_code_are_dropped() {
        assert_eq!(apply_mask("89123456789"), "+7 (912) 345 67 89");
        assert_eq!(apply_mask("+7 912 345-67-89"), "+7 (912) 345 67 89");
        assert_eq!(apply_mask("7912345678999"), "+7 (912) 345 67 89");
    }

    #[test]
    fn only_complete_numbers_normalize() {
        assert_eq!(normalize("8 (912) 345-67-89").as_deref(), Some("+79123456789"));
        assert_eq!(normalize("+7 (912) 345"), None);
        assert_eq!(normalize(""), None);
    }

    #[test]
    fn stored_value_displays_masked() {
        assert_eq!(display_from_storage("+79123456789"), "+7 (912) 345 67 89");
        assert_eq!(display_from_storage(""), "");
        assert_eq!(display_from_storage("n/a"), "n/a");
    }
}
