pub const MIN_PASSWORD_LEN: usize = 8;

/// Validate an email: one '@' with a non-empty local part and a dotted
/// domain, no whitespace, max 254 chars.
pub fn validate_email(email: &str) -> Option<String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Some("Email is required".to_string());
    }
    if trimmed.len() > 254 {
        return Some("Email must be at most 254 characters".to_string());
    }
    let well_formed = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|label| !label.is_empty())
                && !trimmed.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !well_formed {
        return Some("Invalid email format".to_string());
    }
    None
}

/// Validate a password: min 8 chars.
pub fn validate_password(password: &str) -> Option<String> {
    if password.is_empty() {
        return Some("Password is required".to_string());
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Some(format!("Password must be at least {MIN_PASSWORD_LEN} characters long"));
    }
    None
}

/// Validate a required text field with a max length.
pub fn validate_required(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(format!("{field_name} is required"));
    }
    if trimmed.len() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}
