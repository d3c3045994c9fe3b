//! CLI library for testing purposes

pub mod render;
pub mod validation;

pub use validation::{parse_locale_list, validate_language_code, validate_source_path};
