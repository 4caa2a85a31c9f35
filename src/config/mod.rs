//! Configuration parsing and validation.

pub mod parser;
pub mod types;
pub mod validate;

pub use parser::{load_config, load_config_str};
pub use types::*;
pub use validate::{load_and_validate, validate_config};
