use std::fmt;

use anyhow::Result;
use chrono::NaiveDate;
use helpdesk_common::fields::date;
use helpdesk_common::models::Priority;
use inquire::{validator::Validation, CustomUserError, Select, Text};

/// An option in a select prompt: what the user sees, and what it stands for.
#[derive(Clone)]
pub struct Choice<T> {
    pub label: String,
    pub value: T,
}

impl<T> Choice<T> {
    pub fn new(label: impl Into<String>, value: T) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

impl<T> fmt::Display for Choice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Index of the choice holding `current`, for the starting cursor.
pub fn cursor_for<T: PartialEq>(choices: &[Choice<T>], current: &T) -> usize {
    choices
        .iter()
        .position(|c| c.value == *current)
        .unwrap_or(0)
}

pub fn non_empty(answer: String) -> Option<String> {
    (!answer.trim().is_empty()).then_some(answer)
}

// Multi-line answers are typed on one line, with `\n` standing for a line break
pub fn unescape_newlines(text: &str) -> String {
    text.replace("\\n", "\n")
}

pub fn escape_newlines(text: &str) -> String {
    text.replace('\n', "\\n")
}

pub fn title(current: Option<&str>, fallback: &str) -> Result<Option<String>> {
    let answer = Text::new("Title:")
        .with_placeholder(fallback)
        .with_initial_value(current.unwrap_or_default())
        .with_help_message("Leave empty to use the default title")
        .prompt()?;
    Ok(non_empty(answer.trim().to_string()))
}

pub fn description(current: &str) -> Result<String> {
    let answer = Text::new("Description:")
        .with_initial_value(&escape_newlines(current))
        .with_help_message("Type \\n for a line break")
        .prompt()?;
    Ok(unescape_newlines(answer.trim()))
}

pub fn priority(priorities: &[Priority], current: Option<i64>) -> Result<Option<i64>> {
    if priorities.is_empty() {
        return Ok(None);
    }

    let mut choices = vec![Choice::new("(no priority)", None)];
    choices.extend(
        priorities
            .iter()
            .map(|p| Choice::new(p.name.clone(), Some(p.id))),
    );
    let cursor = cursor_for(&choices, &current);

    let selected = Select::new("Priority:", choices)
        .with_starting_cursor(cursor)
        .prompt()?;
    Ok(selected.value)
}

fn optional_date_validator(input: &str) -> Result<Validation, CustomUserError> {
    if input.trim().is_empty() || date::parse_display(input).is_some() {
        return Ok(Validation::Valid);
    }
    Ok(Validation::Invalid(
        format!("Enter a real date as {}", date::MASK).into(),
    ))
}

pub fn due_date(current: Option<&str>) -> Result<Option<NaiveDate>> {
    let initial = current.map(date::iso_to_display).unwrap_or_default();
    let answer = Text::new("Due date:")
        .with_placeholder(date::MASK)
        .with_initial_value(&initial)
        .with_validator(optional_date_validator)
        .with_formatter(&date::apply_mask)
        .with_help_message("Optional")
        .prompt()?;
    Ok(date::parse_display(&answer))
}
