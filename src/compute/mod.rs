//! Compute module - Search coordination, local optimization and strategies.

mod best_k;
mod channel;
mod context;
mod evaluator;
mod fibonacci;
mod hooke_jeeves;
mod mesh;
mod orientation;
mod runner;

pub mod strategy;

#[cfg(test)]
mod testing;

pub use best_k::*;
pub use channel::*;
pub use context::*;
pub use evaluator::*;
pub use fibonacci::*;
pub use hooke_jeeves::*;
pub use mesh::*;
pub use orientation::*;
pub use runner::*;
pub use strategy::{run_search, run_search_by_id, run_strategy};
