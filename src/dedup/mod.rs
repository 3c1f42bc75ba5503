pub mod catalog;
pub mod condition;
pub mod config;
pub mod lookup;
pub mod matcher;
pub mod report;
