//! From source files to canonical tables.

pub mod combine;
pub mod grid;
pub mod inspect;
pub mod locate;
pub mod normalize;
pub mod parse;
pub mod sources;
