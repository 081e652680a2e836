//! Dates typed as `ДД.ММ.ГГГГ` and stored as ISO 8601 (`YYYY-MM-DD`).

use chrono::NaiveDate;

pub const MASK: &str = "ДД.ММ.ГГГГ";

const DISPLAY_FORMAT: &str = "%d.%m.%Y";
const ISO_FORMAT: &str = "%Y-%m-%d";

/// Keeps up to eight digits and puts dots after the day and the month.
pub fn apply_mask(raw: &str) -> String {
    let mut result = String::new();
    for (i, digit) in raw.chars().filter(char::is_ascii_digit).take(8).enumerate() {
        if i == 2 || i == 4 {
            result.push('.');
        }
        result.push(digit);
    }
    result
}

/// Parses a masked `DD.MM.YYYY` date; `None` for incomplete or impossible dates.
pub fn parse_display(display: &str) -> Option<NaiveDate> {
    let masked = apply_mask(display);
    if masked.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(&masked, DISPLAY_FORMAT).ok()
}

pub fn parse_iso(iso: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(iso.trim(), ISO_FORMAT).ok()
}

pub fn to_iso(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

pub fn to_display(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}

/// ISO text from whatever the user typed, empty while the date is not complete.
pub fn display_to_iso(display: &str) -> String {
    parse_display(display).map(to_iso).unwrap_or_default()
}

/// Display text for a stored value; values that are not ISO dates are shown as is.
pub fn iso_to_display(iso: &str) -> String {
    match parse_iso(iso) {
        Some(date) => to_display(date),
        None => iso.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_inserts_dots() {
        assert_eq!(apply_mask("0"), "0");
        assert_eq!(apply_mask("010"), "01.0");
        assert_eq!(apply_mask("01022025"), "01.02.2025");
        assert_eq!(apply_mask("01/02/2025 and more"), "01.02.2025");
    }

    #[test]
    fn complete_dates_convert_to_iso() {
        assert_eq!(display_to_iso("31.12.2024"), "2024-12-31");
        assert_eq!(display_to_iso("31.12.20"), "");
        assert_eq!(display_to_iso("31.02.2024"), "");
    }

    #[test]
    fn iso_displays_with_dots() {
        assert_eq!(iso_to_display("2024-03-09"), "09.03.2024");
        assert_eq!(iso_to_display(""), "");
        assert_eq!(iso_to_display("someday"), "someday");
    }
}
