use crate::errors::{AppError, FieldErrors};
use crate::models::template::{FieldSpec, FormValues};

/// Error-map key for the legal disclaimer checkbox.
pub const DISCLAIMER_KEY: &str = "disclaimer";
pub const DISCLAIMER_MESSAGE: &str = "You must accept the legal disclaimer to proceed";

/// Check required fields and the disclaimer. An empty map means the form is valid.
pub fn validate(fields: &[FieldSpec], values: &FormValues, disclaimer_accepted: bool) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for field in fields.iter().filter(|f| f.required) {
        let filled = values.get(&field.id).is_some_and(|v| !v.trim().is_empty());
        if !filled {
            errors.insert(field.id.clone(), format!("{} is required", field.label));
        }
    }
    if !disclaimer_accepted {
        errors.insert(DISCLAIMER_KEY.to_string(), DISCLAIMER_MESSAGE.to_string());
    }
    errors
}

/// [`validate`], turned into an `AppError::Validation` when anything failed.
pub fn ensure_valid(fields: &[FieldSpec], values: &FormValues, disclaimer_accepted: bool) -> Result<(), AppError> {
    let errors = validate(fields, values, disclaimer_accepted);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::template::FieldKind;

    fn field(id: &str, label: &str, required: bool) -> FieldSpec {
        FieldSpec {
            id: id.into(),
            label: label.into(),
            required,
            placeholder: None,
            default: None,
            kind: FieldKind::Text,
        }
    }

    #[test]
    fn blank_required_field_is_reported_by_label() {
        let fields = [field("purpose", "Purpose", true), field("notes", "Notes", false)];
        let mut values = FormValues::new();
        values.insert("purpose".into(), "  ".into());
        let errors = validate(&fields, &values, true);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors["purpose"], "Purpose is required");
    }

    #[test]
    fn disclaimer_flag_always_checked() {
        let errors = validate(&[], &FormValues::new(), false);
        assert_eq!(errors[DISCLAIMER_KEY], DISCLAIMER_MESSAGE);
        assert!(validate(&[], &FormValues::new(), true).is_empty());
    }

    #[test]
    fn ensure_valid_maps_to_validation_error() {
        let fields = [field("a", "A", true)];
        match ensure_valid(&fields, &FormValues::new(), true) {
            Err(AppError::Validation(errors)) => assert_eq!(errors["a"], "A is required"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
