pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod gemini;
pub mod report;
pub mod storage;
