pub mod cloudwatch;
pub mod config;
pub mod ecr;
pub mod error;
pub mod limit;
pub mod service;
pub mod types;
