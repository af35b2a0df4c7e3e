//! Input rules for student records.

use super::entities::NewStudent;
use super::error::DomainError;

pub const MAX_NAME_LEN: usize = 255;
pub const MAX_EMAIL_LEN: usize = 255;

/// Normalize and check a create request before it reaches storage.
///
/// Surrounding whitespace is trimmed from both fields. The email check is a shape check
/// (`local@domain.tld`), not a deliverability check.
pub fn validate_new_student(input: NewStudent) -> Result<NewStudent, DomainError> {
    let name = input.name.trim().to_string();
    ensure_non_empty(&name, "name")?;
    ensure_max_len(&name, MAX_NAME_LEN, "name")?;

    let email = input.email.trim().to_string();
    ensure_non_empty(&email, "email")?;
    ensure_max_len(&email, MAX_EMAIL_LEN, "email")?;
    if !looks_like_email(&email) {
        return Err(DomainError::MalformedEmail { value: email });
    }

    Ok(NewStudent { name, email })
}

fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), DomainError> {
    if value.is_empty() {
        return Err(DomainError::Empty { field });
    }
    Ok(())
}

fn ensure_max_len(value: &str, max: usize, field: &'static str) -> Result<(), DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::TooLong { field, max });
    }
    Ok(())
}

fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty() && !host.starts_with('.')
}
