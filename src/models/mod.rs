pub mod catalog;
pub mod vacancy;
