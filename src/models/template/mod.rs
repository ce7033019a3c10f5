pub mod catalog;
pub mod queries;
pub mod types;

pub use catalog::{builtin_template, builtin_templates};
pub use types::*;
