//! Orient Search - Build-orientation search over a blocking evaluator channel.
//!
//! A search thread proposes mesh orientations and blocks until an evaluator
//! (typically a renderer measuring support volume) answers with a volume.
//! Strategies combine Fibonacci-sphere sampling, random sampling and
//! Hooke–Jeeves pattern search to find the orientation with the least
//! support volume.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Strategy parameters and search configuration
//! - `compute`: Channel, search context, optimizers, strategies and run control
//!
//! # Example
//!
//! ```rust,no_run
//! use orient_search::{
//!     compute::{SupportVolumeEvaluator, TriangleMesh, run_blocking},
//!     schema::{MeshSpec, SearchConfig},
//! };
//!
//! let config = SearchConfig::default();
//! let mesh = TriangleMesh::from_spec(&MeshSpec::default()).unwrap();
//!
//! let outcome = run_blocking(&config.algorithm, SupportVolumeEvaluator::new(mesh));
//! if let Some(best) = outcome.best {
//!     println!("Best volume {} at {:?}", best.volume, best.orientation.position());
//! }
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{
    Candidate, EvaluatorChannel, Orientation, SearchOutcome, SearchRunner, run_blocking,
};
pub use schema::{SearchAlgorithm, SearchConfig, StrategyKind};
