//! Schema module - Strategy parameters and search configuration.

mod algorithm;
mod config;

pub use algorithm::*;
pub use config::*;
