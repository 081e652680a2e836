//! Typed values for custom fields and the input control each field type gets.
//!
//! In memory a value is a [`FieldValue`]; on the wire every value is a string.
//! [`FieldValue::parse`] and [`FieldValue::encode`] convert between the two.

pub mod company;
pub mod date;
pub mod phone;

use chrono::NaiveDate;

use crate::error::FieldValueError;
use crate::models::{CustomField, FieldType};

pub use company::{CompanyStructureSelector, CompanyStructureValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Multiline(String),
    Choice(String),
    Flag(bool),
    Date(NaiveDate),
    /// Always the complete `+7XXXXXXXXXX` form.
    Phone(String),
    CompanyStructure(CompanyStructureValue),
}

impl FieldValue {
    /// The string sent to the backend.
    pub fn encode(&self) -> String {
        match self {
            FieldValue::Text(s) | FieldValue::Multiline(s) | FieldValue::Choice(s) => s.clone(),
            FieldValue::Flag(b) => b.to_string(),
            FieldValue::Date(d) => date::to_iso(*d),
            FieldValue::Phone(p) => p.clone(),
            FieldValue::CompanyStructure(v) => v.encode(),
        }
    }

    /// What to show the user for this value.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Flag(true) => "да".to_owned(),
            FieldValue::Flag(false) => "нет".to_owned(),
            FieldValue::Date(d) => date::to_display(*d),
            FieldValue::Phone(p) => phone::display_from_storage(p),
            other => other.encode(),
        }
    }

    /// Reads a value for `field` from user input or a stored wire string.
    ///
    /// Dates are accepted as ISO or as `ДД.ММ.ГГГГ`, phones in any format
    /// that carries ten subscriber digits.
    pub fn parse(field: &CustomField, raw: &str) -> Result<Self, FieldValueError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(FieldValueError::Empty);
        }

        match &field.field_type {
            FieldType::Text | FieldType::Email | FieldType::Other(_) => {
                Ok(FieldValue::Text(raw.to_owned()))
            }
            FieldType::Number => {
                let finite = trimmed
                    .replace(',', ".")
                    .parse::<f64>()
                    .is_ok_and(f64::is_finite);
                if !finite {
                    return Err(FieldValueError::NotANumber(trimmed.to_owned()));
                }
                Ok(FieldValue::Text(trimmed.to_owned()))
            }
            FieldType::Textarea => Ok(FieldValue::Multiline(raw.to_owned())),
            FieldType::Select => field
                .options
                .iter()
                .find(|option| option.as_str() == trimmed)
                .map(|option| FieldValue::Choice(option.clone()))
                .ok_or_else(|| FieldValueError::UnknownOption {
                    value: trimmed.to_owned(),
                }),
            FieldType::Checkbox => match trimmed {
                "true" => Ok(FieldValue::Flag(true)),
                "false" => Ok(FieldValue::Flag(false)),
                other => Err(FieldValueError::NotABoolean(other.to_owned())),
            },
            FieldType::Date => date::parse_iso(trimmed)
                .or_else(|| date::parse_display(trimmed))
                .map(FieldValue::Date)
                .ok_or_else(|| FieldValueError::InvalidDate(trimmed.to_owned())),
            FieldType::Phone => phone::normalize(trimmed)
                .map(FieldValue::Phone)
                .ok_or_else(|| FieldValueError::InvalidPhone(trimmed.to_owned())),
            FieldType::CompanyStructure => {
                let value = CompanyStructureValue::decode(trimmed)?;
                if value.is_empty() {
                    return Err(FieldValueError::Empty);
                }
                Ok(FieldValue::CompanyStructure(value))
            }
            FieldType::File => Err(FieldValueError::Unsupported(FieldType::File)),
        }
    }
}

/// The input control a field is rendered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldControl {
    SingleLine,
    MultiLine,
    Choice(Vec<String>),
    Toggle,
    MaskedDate,
    MaskedPhone,
    CompanyStructure,
    FilePicker,
}

impl FieldControl {
    /// File pickers are shown but never feed a value into the ticket.
    pub fn is_wired(&self) -> bool {
        !matches!(self, FieldControl::FilePicker)
    }

    pub fn mask(&self) -> Option<&'static str> {
        match self {
            FieldControl::MaskedDate => Some(date::MASK),
            FieldControl::MaskedPhone => Some(phone::MASK),
            _ => None,
        }
    }
}

pub fn control_for(field: &CustomField) -> FieldControl {
    match &field.field_type {
        FieldType::Text | FieldType::Email | FieldType::Number | FieldType::Other(_) => {
            FieldControl::SingleLine
        }
        FieldType::Textarea => FieldControl::MultiLine,
        FieldType::Select => FieldControl::Choice(field.options.clone()),
        FieldType::Checkbox => FieldControl::Toggle,
        FieldType::Date => FieldControl::MaskedDate,
        FieldType::Phone => FieldControl::MaskedPhone,
        FieldType::CompanyStructure => FieldControl::CompanyStructure,
        FieldType::File => FieldControl::FilePicker,
    }
}
