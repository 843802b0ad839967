pub mod build;
pub mod find;
pub mod readme;
