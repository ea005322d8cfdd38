pub mod records;
pub mod region;
pub mod registry;
pub mod stats;
pub mod validate;
