//! One prompt per custom field, picked by the field's control.
//!
//! Prompts return the wire string for the field, or `None` when the user left
//! an optional field empty. Validators run the same parser the wizard uses, so
//! an accepted answer always stores cleanly.

use anyhow::Result;
use colored::Colorize;
use helpdesk_common::fields::{
    control_for, date, phone, CompanyStructureSelector, CompanyStructureValue, FieldControl,
    FieldValue,
};
use helpdesk_common::models::CustomField;
use helpdesk_common::reference::StructureData;
use inquire::{validator::Validation, Confirm, CustomUserError, Select, Text};

use super::prompts::{cursor_for, escape_newlines, non_empty, unescape_newlines, Choice};

const LEAVE_EMPTY: &str = "(leave empty)";

pub fn prompt_field(
    field: &CustomField,
    current: Option<&FieldValue>,
    structure: Option<&StructureData>,
) -> Result<Option<String>> {
    let label = label_for(field);
    match control_for(field) {
        FieldControl::SingleLine => {
            let initial = current.map(FieldValue::encode).unwrap_or_default();
            text_prompt(field, &label, &initial, None)
        }
        FieldControl::MultiLine => {
            let initial = current
                .map(|v| escape_newlines(&v.encode()))
                .unwrap_or_default();
            let answer = text_prompt(field, &label, &initial, None)?;
            Ok(answer.map(|a| unescape_newlines(&a)))
        }
        FieldControl::MaskedDate => {
            let initial = current.map(FieldValue::display).unwrap_or_default();
            text_prompt(field, &label, &initial, Some(date::apply_mask))
        }
        FieldControl::MaskedPhone => {
            let initial = current.map(FieldValue::display).unwrap_or_default();
            text_prompt(field, &label, &initial, Some(phone::apply_mask))
        }
        FieldControl::Choice(options) => choice_prompt(field, &label, options, current),
        FieldControl::Toggle => {
            let checked = matches!(current, Some(FieldValue::Flag(true)));
            let answer = Confirm::new(&label).with_default(checked).prompt()?;
            Ok(Some(answer.to_string()))
        }
        FieldControl::CompanyStructure => {
            let current = match current {
                Some(FieldValue::CompanyStructure(value)) => *value,
                _ => CompanyStructureValue::default(),
            };
            company_structure_prompt(field, &label, structure, current)
        }
        FieldControl::FilePicker => {
            println!(
                "{}",
                format!("Skipping '{}': attach files from the web interface", field.display_name())
                    .dimmed()
            );
            Ok(None)
        }
    }
}

fn label_for(field: &CustomField) -> String {
    if field.is_required {
        format!("{} *:", field.display_name())
    } else {
        format!("{}:", field.display_name())
    }
}

/// Accepts what `FieldValue::parse` accepts, and blank input for optional fields.
fn value_validator(
    field: CustomField,
) -> impl Fn(&str) -> Result<Validation, CustomUserError> + Clone + Send + Sync {
    move |input: &str| {
        if input.trim().is_empty() {
            return Ok(if field.is_required {
                Validation::Invalid("This field is required".into())
            } else {
                Validation::Valid
            });
        }
        Ok(match FieldValue::parse(&field, &unescape_newlines(input)) {
            Ok(_) => Validation::Valid,
            Err(e) => Validation::Invalid(e.to_string().into()),
        })
    }
}

/// What a masked prompt echoes back: the stored value's display form once the
/// input parses, the partially masked input until then.
fn echo_value(field: &CustomField, input: &str, mask: fn(&str) -> String) -> String {
    match FieldValue::parse(field, input) {
        Ok(value) => value.display(),
        Err(_) => mask(input),
    }
}

fn text_prompt(
    field: &CustomField,
    label: &str,
    initial: &str,
    mask_input: Option<fn(&str) -> String>,
) -> Result<Option<String>> {
    let echo = |input: &str| match mask_input {
        Some(mask) => echo_value(field, input, mask),
        None => input.to_owned(),
    };
    let mut prompt = Text::new(label)
        .with_initial_value(initial)
        .with_validator(value_validator(field.clone()));

    let mask = control_for(field).mask();
    if let Some(placeholder) = field.placeholder.as_deref().or(mask) {
        prompt = prompt.with_placeholder(placeholder);
    }
    if mask_input.is_some() {
        prompt = prompt.with_formatter(&echo);
    }

    Ok(non_empty(prompt.prompt()?))
}

fn choice_prompt(
    field: &CustomField,
    label: &str,
    options: Vec<String>,
    current: Option<&FieldValue>,
) -> Result<Option<String>> {
    if options.is_empty() {
        println!(
            "{}",
            format!("'{}' has no options to choose from", field.display_name()).yellow()
        );
        return Ok(None);
    }

    let mut choices = Vec::new();
    if !field.is_required {
        choices.push(Choice::new(LEAVE_EMPTY, None));
    }
    choices.extend(options.into_iter().map(|o| Choice::new(o.clone(), Some(o))));

    let current = match current {
        Some(FieldValue::Choice(option)) => Some(option.clone()),
        _ => None,
    };
    let cursor = cursor_for(&choices, &current);

    let selected = Select::new(label, choices)
        .with_starting_cursor(cursor)
        .prompt()?;
    Ok(selected.value)
}

fn department_label(name: &str, level: usize) -> String {
    format!("{}{}", "  ".repeat(level), name)
}

fn company_structure_prompt(
    field: &CustomField,
    label: &str,
    structure: Option<&StructureData>,
    current: CompanyStructureValue,
) -> Result<Option<String>> {
    let Some(structure) = structure.filter(|s| !s.companies.is_empty()) else {
        println!(
            "{}",
            format!("No company structure available for '{}'", field.display_name()).yellow()
        );
        return Ok(None);
    };
    let mut selector = CompanyStructureSelector::new(structure);

    let mut companies = Vec::new();
    if !field.is_required {
        companies.push(Choice::new(LEAVE_EMPTY, None));
    }
    companies.extend(
        selector
            .companies()
            .iter()
            .map(|c| Choice::new(c.name.clone(), Some(c.id))),
    );
    let cursor = cursor_for(&companies, &current.company_id);
    let company = Select::new(&format!("{label} company"), companies)
        .with_starting_cursor(cursor)
        .prompt()?;
    let Some(company_id) = company.value else {
        return Ok(None);
    };
    selector.select_company(company_id)?;

    let mut departments = vec![Choice::new("(no department)", None)];
    departments.extend(selector.departments().iter().map(|option| {
        Choice::new(
            department_label(&option.department.name, option.level),
            Some(option.department.id),
        )
    }));
    if departments.len() > 1 {
        let cursor = cursor_for(&departments, &current.department_id);
        let department = Select::new(&format!("{label} department"), departments)
            .with_starting_cursor(cursor)
            .prompt()?;
        if let Some(department_id) = department.value {
            selector.select_department(department_id)?;
        }
    }

    let mut positions = vec![Choice::new("(no position)", None)];
    positions.extend(
        selector
            .positions()
            .iter()
            .map(|p| Choice::new(p.name.clone(), Some(p.id))),
    );
    if positions.len() > 1 {
        let cursor = cursor_for(&positions, &current.position_id);
        let position = Select::new(&format!("{label} position"), positions)
            .with_starting_cursor(cursor)
            .prompt()?;
        if let Some(position_id) = position.value {
            selector.select_position(position_id)?;
        }
    }

    Ok(Some(selector.value().encode()))
}
