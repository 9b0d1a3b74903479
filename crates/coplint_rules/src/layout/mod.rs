//! Whitespace and line shape.

pub mod line_length;
pub mod space_around_operators;
pub mod trailing_whitespace;
