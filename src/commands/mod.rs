pub mod compile;
pub mod config;
