// gantry/src/pipes/mod.rs

//! Built-in pipes: coercion (`parse`) and schema validation (`validation`).

pub mod parse;
pub mod validation;

pub use parse::{DefaultValuePipe, ParseBoolPipe, ParseIntPipe};
pub use validation::{FieldRule, FieldRules, FieldViolation, ValidationPipe, Validator};
