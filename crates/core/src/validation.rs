//! Input validation for car and ordered-car entry.
//!
//! Validators return `Result<(), String>` so callers can wrap the message in
//! whichever error type their layer uses.

use std::sync::LazyLock;

use regex::Regex;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum VIN length (ISO 3779 VINs are exactly 17 characters; stock
/// numbers for older or imported cars are shorter).
pub const MAX_VIN_LENGTH: usize = 17;

/// Maximum length of short descriptive fields (model, color, category, status).
pub const MAX_ATTRIBUTE_LENGTH: usize = 100;

/// Maximum length of a client name.
pub const MAX_CLIENT_NAME_LENGTH: usize = 200;

/// Maximum length of free-form notes.
pub const MAX_NOTES_LENGTH: usize = 5_000;

static VIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]+$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Validators
// ---------------------------------------------------------------------------

/// Canonical form of a VIN: trimmed and upper-cased.
pub fn normalize_vin(vin: &str) -> String {
    vin.trim().to_ascii_uppercase()
}

/// Validate a VIN after normalization.
pub fn validate_vin(vin: &str) -> Result<(), String> {
    let vin = normalize_vin(vin);
    if vin.is_empty() {
        return Err("VIN must not be empty".to_string());
    }
    if vin.len() > MAX_VIN_LENGTH {
        return Err(format!(
            "VIN must be at most {MAX_VIN_LENGTH} characters, got {}",
            vin.len()
        ));
    }
    if !VIN_RE.is_match(&vin) {
        return Err("VIN may only contain letters and digits".to_string());
    }
    Ok(())
}

/// Validate a required short text attribute such as `model` or `status`.
pub fn validate_attribute(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    if value.chars().count() > MAX_ATTRIBUTE_LENGTH {
        return Err(format!(
            "{field} must be at most {MAX_ATTRIBUTE_LENGTH} characters"
        ));
    }
    Ok(())
}

/// Validate an optional client name.
pub fn validate_client_name(name: Option<&str>) -> Result<(), String> {
    match name {
        Some(n) if n.chars().count() > MAX_CLIENT_NAME_LENGTH => Err(format!(
            "client_name must be at most {MAX_CLIENT_NAME_LENGTH} characters"
        )),
        _ => Ok(()),
    }
}

/// Validate optional notes.
pub fn validate_notes(notes: Option<&str>) -> Result<(), String> {
    match notes {
        Some(n) if n.chars().count() > MAX_NOTES_LENGTH => Err(format!(
            "notes must be at most {MAX_NOTES_LENGTH} characters"
        )),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
