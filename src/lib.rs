pub mod aggregate;
pub mod config;
pub mod dashboard;
pub mod fetch;
pub mod join;
pub mod output;
pub mod parser;
pub mod report;
pub mod series;
