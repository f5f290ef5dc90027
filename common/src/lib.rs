pub mod config;
pub mod deals;
pub mod result;
