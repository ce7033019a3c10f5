//! Placeholder substitution for contract bodies.
//!
//! For a field with id `key`, the accepted spellings are `{{key}}`, `{key}`,
//! `{{KEY}}`, `{KEY}` and `[KEY]`. Every occurrence is replaced by the
//! field's value; empty or missing values become `[KEY]` so unresolved
//! fields stay visible in the output.

pub mod scanner;

use std::collections::HashMap;

use serde::Serialize;

use crate::models::template::{FieldSpec, FormValues};
use scanner::{Segment, Syntax, tokenize};

/// Result of a render with bookkeeping for previews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    pub content: String,
    /// Field ids (in first-seen order) whose tokens fell back to `[KEY]`.
    pub unresolved: Vec<String>,
}

struct Key<'v> {
    id: String,
    upper: String,
    value: Option<&'v str>,
}

/// Lookup from token text to key index, one map per syntax family.
struct KeyTable<'v> {
    keys: Vec<Key<'v>>,
    braced: HashMap<String, usize>,
    bracketed: HashMap<String, usize>,
}

impl<'v> KeyTable<'v> {
    fn build(fields: &'v [FieldSpec], values: &'v FormValues) -> Self {
        let mut table = KeyTable { keys: vec![], braced: HashMap::new(), bracketed: HashMap::new() };
        for field in fields {
            let value = values
                .get(&field.id)
                .map(String::as_str)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| field.default.as_deref().filter(|v| !v.trim().is_empty()));
            table.add(&field.id, value);
        }
        for (id, value) in values {
            if !table.braced.contains_key(id.as_str()) {
                table.add(id, Some(value.as_str()).filter(|v| !v.trim().is_empty()));
            }
        }
        table
    }

    fn add(&mut self, id: &str, value: Option<&'v str>) {
        if id.is_empty() {
            return;
        }
        let idx = self.keys.len();
        let upper = id.to_uppercase();
        // first definition wins when two ids only differ by case
        self.braced.entry(id.to_string()).or_insert(idx);
        self.braced.entry(upper.clone()).or_insert(idx);
        self.bracketed.entry(upper.clone()).or_insert(idx);
        self.keys.push(Key { id: id.to_string(), upper, value });
    }

    fn resolve(&self, syntax: Syntax, inner: &str) -> Option<usize> {
        match syntax {
            Syntax::DoubleBrace | Syntax::SingleBrace => self.braced.get(inner).copied(),
            Syntax::Bracket => self.bracketed.get(inner).copied(),
        }
    }
}

/// Substitute every recognized placeholder in `body`.
pub fn render(body: &str, values: &FormValues, fields: &[FieldSpec]) -> String {
    render_detailed(body, values, fields).content
}

/// Like [`render`], also reporting which keys fell back to `[KEY]`.
pub fn render_detailed(body: &str, values: &FormValues, fields: &[FieldSpec]) -> Rendered {
    let table = KeyTable::build(fields, values);
    let segments = tokenize(body, |syntax, inner| table.resolve(syntax, inner));

    let mut content = String::with_capacity(body.len());
    let mut unresolved: Vec<String> = vec![];
    for segment in segments {
        match segment {
            Segment::Text(text) => content.push_str(text),
            Segment::Token { value: idx, .. } => {
                let key = &table.keys[idx];
                match key.value {
                    Some(v) => content.push_str(v),
                    None => {
                        content.push('[');
                        content.push_str(&key.upper);
                        content.push(']');
                        if !unresolved.contains(&key.id) {
                            unresolved.push(key.id.clone());
                        }
                    }
                }
            }
        }
    }
    Rendered { content, unresolved }
}
