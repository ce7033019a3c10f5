//! Rendering and form validation against the built-in template catalog.

mod common;

use common::{nda_values, values};
use fastcontracts::forms::{self, DISCLAIMER_KEY, DISCLAIMER_MESSAGE};
use fastcontracts::models::template::{ContractTemplate, FieldSpec, FormValues, builtin_template, builtin_templates};
use fastcontracts::templating::{render, render_detailed};
use regex::Regex;

/// Every spelling a field can appear under in a body.
fn spellings(field: &FieldSpec) -> [String; 5] {
    let id = &field.id;
    let upper = field.upper_key();
    [
        format!("{{{{{id}}}}}"),
        format!("{{{id}}}"),
        format!("{{{{{upper}}}}}"),
        format!("{{{upper}}}"),
        format!("[{upper}]"),
    ]
}

fn filled(template: &ContractTemplate) -> FormValues {
    template
        .fields
        .iter()
        .map(|f| (f.id.clone(), format!("value for {}", f.id)))
        .collect()
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_every_template_renders_without_leftover_placeholders() {
    let any_brace = Regex::new(r"\{\{?[A-Za-z_]+\}\}?").unwrap();
    for template in builtin_templates().unwrap() {
        let out = render(&template.body, &filled(&template), &template.fields);

        assert!(!any_brace.is_match(&out), "{}: braces left in {out}", template.contract_type);
        for field in &template.fields {
            for spelling in spellings(field) {
                assert!(!out.contains(&spelling), "{}: {spelling} survived", template.contract_type);
            }
            assert!(
                out.contains(&format!("value for {}", field.id)),
                "{}: {} never substituted",
                template.contract_type,
                field.id
            );
        }
    }
}

#[test]
fn test_empty_values_fall_back_to_bracket_keys() {
    for template in builtin_templates().unwrap() {
        let rendered = render_detailed(&template.body, &FormValues::new(), &template.fields);

        for field in template.fields.iter().filter(|f| f.default.is_none()) {
            let bracket = format!("[{}]", field.upper_key());
            assert!(rendered.content.contains(&bracket), "{}: missing {bracket}", template.contract_type);
            assert!(rendered.unresolved.contains(&field.id));
            for spelling in &spellings(field)[..4] {
                assert!(!rendered.content.contains(spelling.as_str()));
            }
        }
    }
}

#[test]
fn test_defaults_fill_optional_fields() {
    let employment = builtin_template("employment-contract").unwrap();
    let out = render(&employment.body, &FormValues::new(), &employment.fields);
    assert!(out.contains("giving two weeks of written notice"));
    assert!(out.contains("entitled to the standard benefits"));
    assert!(out.contains("[EMPLOYER_NAME]"));
}

#[test]
fn test_nda_end_to_end() {
    let nda = builtin_template("nda").unwrap();
    let out = render(&nda.body, &nda_values(), &nda.fields);

    for expected in ["Acme", "Beta", "2024-01-01", "evaluation", "2 years"] {
        assert!(out.contains(expected), "missing {expected}");
    }
    let bracket_token = Regex::new(r"\[[A-Z_]+\]").unwrap();
    assert_eq!(bracket_token.find_iter(&out).count(), 0);
    // signature block repeats both parties
    assert_eq!(out.matches("Acme").count(), 2);
}

#[test]
fn test_contractor_mixes_syntaxes() {
    let contractor = builtin_template("contractor-agreement").unwrap();
    let vals = values(&[
        ("client_name", "Initech"),
        ("services", "database tuning"),
        ("start_date", "2024-03-01"),
        ("governing_law", "Delaware"),
    ]);
    let rendered = render_detailed(&contractor.body, &vals, &contractor.fields);

    assert!(rendered.content.contains("services: database tuning"));
    assert!(rendered.content.contains("from 2024-03-01 until [END_DATE]"));
    assert!(rendered.content.contains("laws of Delaware."));
    assert!(rendered.content.contains("pay the Contractor [COMPENSATION]"));
    assert!(rendered.unresolved.contains(&"end_date".to_string()));
    assert!(!rendered.unresolved.contains(&"client_name".to_string()));
}

#[test]
fn test_values_are_not_rescanned() {
    let nda = builtin_template("nda").unwrap();
    let mut vals = nda_values();
    vals.insert("purpose".into(), "{{receiving_party}} [DURATION]".into());
    let out = render(&nda.body, &vals, &nda.fields);
    assert!(out.contains("Agreement is {{receiving_party}} [DURATION]."));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_required_fields_reported_by_id() {
    for template in builtin_templates().unwrap() {
        let errors = forms::validate(&template.fields, &FormValues::new(), true);
        let required: Vec<&FieldSpec> = template.fields.iter().filter(|f| f.required).collect();
        assert_eq!(errors.len(), required.len(), "{}", template.contract_type);
        for field in required {
            assert_eq!(errors[&field.id], format!("{} is required", field.label));
        }
    }
}

#[test]
fn test_complete_form_passes_only_with_disclaimer() {
    let nda = builtin_template("nda").unwrap();
    assert!(forms::validate(&nda.fields, &nda_values(), true).is_empty());

    let errors = forms::validate(&nda.fields, &nda_values(), false);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[DISCLAIMER_KEY], DISCLAIMER_MESSAGE);
}

#[test]
fn test_whitespace_counts_as_missing() {
    let nda = builtin_template("nda").unwrap();
    let mut vals = nda_values();
    vals.insert("purpose".into(), "   ".into());
    let errors = forms::validate(&nda.fields, &vals, true);
    assert_eq!(errors.keys().collect::<Vec<_>>(), ["purpose"]);
    assert!(forms::ensure_valid(&nda.fields, &vals, true).is_err());
}
