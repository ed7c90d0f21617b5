pub mod config;
pub mod dataset;
pub mod judge;
pub mod logger;
pub mod model;
pub mod orchestrator;
pub mod report;
pub mod strategy;
pub mod types;
