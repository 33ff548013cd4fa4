use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use validator::{ValidationError, ValidationErrors};

/// Field name to first error message, in field order.
pub type FieldErrors = BTreeMap<String, String>;

pub fn error_with_message(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

pub fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error_with_message("required", "This field is required"));
    }
    Ok(())
}

/// Loose e-mail shape: `something@something.something` with no whitespace.
pub static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("Invalid e-mail regex"));

/// Flattens `ValidationErrors` into one message per field. A missing value wins over other failures.
pub fn field_messages(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            errs.iter()
                .find(|e| e.code == "required")
                .or_else(|| errs.first())
                .map(|e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field));
                    (field.to_string(), message)
                })
        })
        .collect()
}
