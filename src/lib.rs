pub mod config;
pub mod extract;
pub mod fetch;
pub mod filter;
pub mod pipeline;
pub mod report;
pub mod write;
