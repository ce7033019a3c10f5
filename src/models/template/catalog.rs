use crate::errors::AppError;
use super::types::ContractTemplate;

const TEMPLATE_SEED: &str = include_str!("../../../data/seed/templates.json");

/// Parse the bundled template seed. Ids are assigned in seed order starting at 1.
pub fn builtin_templates() -> Result<Vec<ContractTemplate>, AppError> {
    let mut templates: Vec<ContractTemplate> = serde_json::from_str(TEMPLATE_SEED)?;
    for (idx, template) in templates.iter_mut().enumerate() {
        template.id = idx as i64 + 1;
    }
    let problems: Vec<String> = templates.iter().flat_map(|t| t.validate_schema()).collect();
    if !problems.is_empty() {
        return Err(AppError::Internal(format!("Bad template seed: {}", problems.join("; "))));
    }
    Ok(templates)
}

/// Built-in definition for a contract type, if one ships with the binary.
pub fn builtin_template(contract_type: &str) -> Option<ContractTemplate> {
    builtin_templates()
        .ok()?
        .into_iter()
        .find(|t| t.contract_type == contract_type)
}
