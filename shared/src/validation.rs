//! Input validation functions
//!
//! Field-level checks shared by the backend handlers and any Rust client.
//! Each returns a human-readable message on failure. Checks reused across
//! fields return a lowercase fragment ("is required") that
//! [`ValidationError::user_message`] prefixes with the field's label.

use std::sync::OnceLock;
use validator::{ValidateEmail, ValidateUrl};

/// Minimum password length for new passwords
pub const MIN_PASSWORD_LEN: usize = 6;

/// Maximum password length accepted before hashing
pub const MAX_PASSWORD_LEN: usize = 128;

fn phone_regex() -> &'static regex_lite::Regex {
    static PHONE: OnceLock<regex_lite::Regex> = OnceLock::new();
    PHONE.get_or_init(|| {
        regex_lite::Regex::new(r"^\+?[0-9(][0-9 ().\-]*[0-9]$").expect("phone regex is valid")
    })
}

/// Validate email format
///
/// Requires a dotted domain, so `user@localhost` is rejected.
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > 255 {
        return Err("Email too long".to_string());
    }
    let has_dotted_domain = email
        .rsplit_once('@')
        .map(|(_, domain)| domain.contains('.') && !domain.ends_with('.'))
        .unwrap_or(false);
    if !email.validate_email() || !has_dotted_domain {
        return Err("Please provide a valid email".to_string());
    }
    Ok(())
}

/// Validate a new password
pub fn validate_password(password: &str) -> Result<(), String> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(format!(
            "must be at least {} characters long",
            MIN_PASSWORD_LEN
        ));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(format!("must be at most {} characters long", MAX_PASSWORD_LEN));
    }
    Ok(())
}

/// Validate a required free-text field
pub fn validate_required(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("is required".to_string());
    }
    Ok(())
}

/// Validate an optional field that was supplied in a partial update
pub fn validate_not_empty_if_provided(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("cannot be empty if provided".to_string());
    }
    Ok(())
}

/// Validate a phone number
///
/// Accepts an optional leading `+` and 7-15 digits, separated by spaces,
/// dots, dashes or parentheses.
pub fn validate_phone_number(phone: &str) -> Result<(), String> {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if !phone_regex().is_match(phone) || !(7..=15).contains(&digits) {
        return Err("Please provide a valid phone number".to_string());
    }
    Ok(())
}

/// Validate a profile image URL
///
/// The scheme is optional (`cdn.example.com/me.png` is accepted as http).
/// Only http, https and ftp are allowed, and the host needs a dotted domain.
pub fn validate_profile_image_url(url: &str) -> Result<(), String> {
    const INVALID: &str = "Profile image URL must be a valid URL";

    let candidate = if url.contains("://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    };

    let (scheme, rest) = candidate.split_once("://").ok_or(INVALID)?;
    if !matches!(scheme.to_ascii_lowercase().as_str(), "http" | "https" | "ftp") {
        return Err(INVALID.to_string());
    }

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    let host = host_port.split(':').next().unwrap_or_default();
    let has_dotted_host = host.contains('.')
        && !host.starts_with('.')
        && !host.ends_with('.');

    if !has_dotted_host || !candidate.validate_url() {
        return Err(INVALID.to_string());
    }
    Ok(())
}

/// Validate a timezone name
pub fn validate_timezone(timezone: &str) -> Result<(), String> {
    if timezone.trim().is_empty() {
        return Err("Timezone cannot be empty".to_string());
    }
    if timezone.len() > 64 || timezone.chars().any(char::is_whitespace) {
        return Err("Timezone must be a zone name such as Europe/Berlin".to_string());
    }
    Ok(())
}

/// Get user-friendly display label for a request field
pub fn get_field_display_label(field_name: &str) -> &str {
    match field_name {
        "email" => "Email",
        "password" => "Password",
        "firstName" => "First name",
        "lastName" => "Last name",
        "phoneNumber" => "Phone number",
        "timezone" => "Timezone",
        "profileImageUrl" => "Profile image URL",
        "currentPassword" => "Current password",
        "newPassword" => "New password",
        "token" => "Token",
        _ => field_name,
    }
}

/// Validation error with field context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub display_label: String,
}

impl ValidationError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
            display_label: get_field_display_label(field).to_string(),
        }
    }

    /// Format as user-friendly error message
    ///
    /// Messages that already read as a sentence are returned unchanged;
    /// fragments such as "is required" get the field label prepended.
    pub fn user_message(&self) -> String {
        if self.message.starts_with(char::is_lowercase) {
            format!("{} {}", self.display_label, self.message)
        } else {
            self.message.clone()
        }
    }

    /// Run a field check, attaching the field name to any failure
    pub fn check(field: &str, result: Result<(), String>) -> Result<(), Self> {
        result.map_err(|msg| Self::new(field, &msg))
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.user_message())
    }
}

impl std::error::Error for ValidationError {}
