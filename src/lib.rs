pub mod ai;
pub mod analysis;
pub mod cli;
pub mod config;
pub mod infrastructure;
pub mod ingress;
pub mod languages;
pub mod linter;
pub mod report;
