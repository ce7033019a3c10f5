pub mod contract;
pub mod template;
pub mod user;
