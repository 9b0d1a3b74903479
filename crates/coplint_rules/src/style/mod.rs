//! Literal style.

pub mod numeric_literals;
pub mod string_literals;
