use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Field-level validation errors, keyed by form field name.
///
/// Serializes as `{ "field": ["message", ...] }` so templates can render the
/// messages next to each input.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn extend(&mut self, other: FormErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

pub const REQUIRED: &str = "This field is required.";

/// Validate a trimmed, required text field with a maximum length in characters.
pub fn check_required_text(
    errors: &mut FormErrors,
    field: &'static str,
    value: &str,
    max_chars: usize,
) {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, REQUIRED);
    } else if value.chars().count() > max_chars {
        errors.add(
            field,
            format!(
                "Ensure this value has at most {max_chars} characters (it has {}).",
                value.chars().count()
            ),
        );
    }
}
