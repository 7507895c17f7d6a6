//! Table-driven request validation.
//!
//! A rule set is a static slice of [`FieldRules`]. [`evaluate`] walks every
//! field of the table and collects all violations before reporting, so a
//! caller always receives the complete list of problems in one response.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use validator::ValidateEmail;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Key must exist, be non-null and not blank.
    Required,
    /// An explicit `null` skips the remaining rules.
    Nullable,
    String,
    /// When present the value must be a non-blank string.
    Filled,
    Email,
    Max(usize),
    Min(usize),
    OneOf(&'static [&'static str]),
    /// `<field>_confirmation` must hold the same value.
    Confirmed,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRules {
    pub field: &'static str,
    pub rules: &'static [Rule],
}

/// Field name to messages, in rule-table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: Vec<(String, Vec<String>)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, messages)) => messages.push(message),
            None => self.fields.push((field.to_string(), vec![message])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn message_count(&self) -> usize {
        self.fields.iter().map(|(_, messages)| messages.len()).sum()
    }

    /// First message, plus a count of the rest.
    pub fn summary(&self) -> String {
        let Some(first) = self.fields.first().and_then(|(_, m)| m.first()) else {
            return "The given data was invalid.".to_string();
        };
        match self.message_count() - 1 {
            0 => first.clone(),
            1 => format!("{first} (and 1 more error)"),
            n => format!("{first} (and {n} more errors)"),
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, messages) in &self.fields {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}

/// Runs every rule of `table` against `payload`.
pub fn evaluate(table: &[FieldRules], payload: &Map<String, Value>) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    for field_rules in table {
        check_field(field_rules, payload, &mut errors);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_field(field_rules: &FieldRules, payload: &Map<String, Value>, errors: &mut ValidationErrors) {
    let FieldRules { field, rules } = *field_rules;
    let label = field.replace('_', " ");
    let value = payload.get(field);

    match value {
        None if !rules.contains(&Rule::Required) => return,
        Some(Value::Null) if rules.contains(&Rule::Nullable) && !rules.contains(&Rule::Required) => {
            return;
        }
        _ => {}
    }
    let value = value.unwrap_or(&Value::Null);

    for rule in rules {
        match rule {
            Rule::Required => {
                if is_blank(value) {
                    errors.add(field, format!("The {label} field is required."));
                    return;
                }
            }
            Rule::Nullable => {}
            Rule::String => {
                if !value.is_string() {
                    errors.add(field, format!("The {label} field must be a string."));
                    return;
                }
            }
            Rule::Filled => {
                if is_blank(value) {
                    errors.add(field, format!("The {label} field must have a value."));
                    return;
                }
            }
            Rule::Email => {
                if let Some(text) = value.as_str() {
                    if !text.validate_email() {
                        errors.add(field, format!("The {label} field must be a valid email address."));
                    }
                }
            }
            Rule::Max(limit) => {
                if let Some(text) = value.as_str() {
                    if text.chars().count() > *limit {
                        errors.add(
                            field,
                            format!("The {label} field must not be greater than {limit} characters."),
                        );
                    }
                }
            }
            Rule::Min(limit) => {
                if let Some(text) = value.as_str() {
                    if text.chars().count() < *limit {
                        errors.add(field, format!("The {label} field must be at least {limit} characters."));
                    }
                }
            }
            Rule::OneOf(allowed) => {
                let ok = value.as_str().map(|v| allowed.contains(&v)).unwrap_or(false);
                if !ok {
                    errors.add(field, format!("The selected {label} is invalid."));
                }
            }
            Rule::Confirmed => {
                let confirmation = payload.get(&format!("{field}_confirmation"));
                if confirmation != Some(value) {
                    errors.add(field, format!("The {label} field confirmation does not match."));
                }
            }
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Reads a string field, if present.
pub fn string_field(payload: &Map<String, Value>, field: &str) -> Option<String> {
    payload.get(field).and_then(Value::as_str).map(str::to_owned)
}
