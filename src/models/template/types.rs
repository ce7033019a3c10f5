use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Submitted form values keyed by field id.
pub type FormValues = BTreeMap<String, String>;

/// Input widget for a field. Serialized with a `type` discriminator so the
/// JSON shape matches the stored `form_fields` column:
/// `{"id": "duration", "type": "select", "options": ["1", "2"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Textarea,
    Date,
    Number,
    Select { options: Vec<String> },
}

/// One input of a template's form. `id` doubles as the placeholder key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldSpec {
    /// Uppercased id, used by the `[KEY]` syntax and the unresolved fallback.
    pub fn upper_key(&self) -> String {
        self.id.to_uppercase()
    }

    pub fn options(&self) -> &[String] {
        match &self.kind {
            FieldKind::Select { options } => options,
            _ => &[],
        }
    }
}

/// A contract-type definition: form schema plus body with placeholder tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractTemplate {
    #[serde(default)]
    pub id: i64,
    pub contract_type: String,
    pub name: String,
    pub description: String,
    pub estimated_time: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub fields: Vec<FieldSpec>,
    pub body: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_category() -> String {
    "Legal".to_string()
}

fn default_active() -> bool {
    true
}

impl ContractTemplate {
    pub fn field(&self, id: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Submitted values unioned with field defaults for every unset field.
    pub fn effective_values(&self, values: &FormValues) -> FormValues {
        let mut merged = values.clone();
        for field in &self.fields {
            let unset = merged.get(&field.id).is_none_or(|v| v.trim().is_empty());
            if let (true, Some(default)) = (unset, &field.default) {
                merged.insert(field.id.clone(), default.clone());
            }
        }
        merged
    }

    /// Structural checks for a template definition. Returns one message per problem.
    pub fn validate_schema(&self) -> Vec<String> {
        let mut problems = vec![];
        if self.contract_type.trim().is_empty() {
            problems.push("contract_type is required".to_string());
        }
        let mut seen = std::collections::HashSet::new();
        for field in &self.fields {
            if field.id.trim().is_empty() {
                problems.push(format!("{}: field with empty id", self.contract_type));
            } else if !seen.insert(field.id.as_str()) {
                problems.push(format!("{}: duplicate field id '{}'", self.contract_type, field.id));
            }
            if let FieldKind::Select { options } = &field.kind {
                if options.is_empty() {
                    problems.push(format!("{}: select field '{}' has no options", self.contract_type, field.id));
                }
            }
        }
        problems
    }
}

/// Catalog listing entry (no body, no fields).
#[derive(Debug, Clone, Serialize)]
pub struct TemplateSummary {
    pub contract_type: String,
    pub name: String,
    pub description: String,
    pub estimated_time: String,
    pub category: String,
    pub field_count: usize,
}

impl From<&ContractTemplate> for TemplateSummary {
    fn from(t: &ContractTemplate) -> Self {
        Self {
            contract_type: t.contract_type.clone(),
            name: t.name.clone(),
            description: t.description.clone(),
            estimated_time: t.estimated_time.clone(),
            category: t.category.clone(),
            field_count: t.fields.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_field_parses_options_from_type_tag() {
        let json = r#"{"id":"duration","label":"Duration","type":"select","options":["1","2"],"required":true}"#;
        let field: FieldSpec = serde_json::from_str(json).unwrap();
        assert!(field.required);
        assert_eq!(field.options(), ["1".to_string(), "2".to_string()]);
        assert_eq!(field.upper_key(), "DURATION");
    }

    #[test]
    fn plain_kinds_carry_no_options() {
        let json = r#"{"id":"purpose","label":"Purpose","type":"textarea"}"#;
        let field: FieldSpec = serde_json::from_str(json).unwrap();
        assert_eq!(field.kind, FieldKind::Textarea);
        assert!(!field.required);
        assert!(field.options().is_empty());
    }

    #[test]
    fn schema_rejects_duplicate_ids_and_empty_selects() {
        let template = ContractTemplate {
            id: 1,
            contract_type: "broken".into(),
            name: "Broken".into(),
            description: String::new(),
            estimated_time: String::new(),
            category: default_category(),
            fields: vec![
                FieldSpec {
                    id: "a".into(),
                    label: "A".into(),
                    required: true,
                    placeholder: None,
                    default: None,
                    kind: FieldKind::Text,
                },
                FieldSpec {
                    id: "a".into(),
                    label: "A again".into(),
                    required: false,
                    placeholder: None,
                    default: None,
                    kind: FieldKind::Select { options: vec![] },
                },
            ],
            body: "{{a}}".into(),
            is_active: true,
        };
        let problems = template.validate_schema();
        assert_eq!(problems.len(), 2);
    }

    #[test]
    fn defaults_fill_only_unset_fields() {
        let template = ContractTemplate {
            id: 1,
            contract_type: "t".into(),
            name: "T".into(),
            description: String::new(),
            estimated_time: String::new(),
            category: default_category(),
            fields: vec![FieldSpec {
                id: "law".into(),
                label: "Governing law".into(),
                required: false,
                placeholder: None,
                default: Some("Delaware".into()),
                kind: FieldKind::Text,
            }],
            body: "{{law}}".into(),
            is_active: true,
        };
        let empty = FormValues::new();
        assert_eq!(template.effective_values(&empty)["law"], "Delaware");

        let mut given = FormValues::new();
        given.insert("law".into(), "Ontario".into());
        assert_eq!(template.effective_values(&given)["law"], "Ontario");
    }
}
