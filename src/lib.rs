#![no_std]
#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    rust_2018_idioms
)]
#![warn(unused_qualifications)]
#![forbid(unsafe_code)]

//! Maximum flow and minimum cut over directed capacitated networks.
//!
//! Any directed petgraph graph can be solved: edge weights (or a custom accessor) give the
//! capacities, and either shortest augmenting paths (Edmonds-Karp) or blocking flows over
//! level graphs (Dinic) drive the search.
//!
//! ```
//! use maxflow::{max_flow, Strategy};
//! use petgraph::graphmap::DiGraphMap;
//!
//! let g = DiGraphMap::<_, f64>::from_edges([
//!     ("s", "a", 3.0),
//!     ("s", "b", 2.0),
//!     ("a", "b", 1.0),
//!     ("a", "t", 2.0),
//!     ("b", "t", 3.0),
//! ]);
//! let flow = max_flow(&g, "s", "t", Strategy::BlockingFlow).unwrap();
//! assert_eq!(flow.value, 5.0);
//! ```

extern crate alloc;

pub mod accumulator;
pub mod algo;
pub mod capacity;
pub mod cut;
pub mod error;
pub mod residual;
mod solver;

pub use algo::{AugmentingPath, AugmentingPathSearch, Strategy};
pub use capacity::Capacity;
pub use cut::{extract_min_cut, MinCut};
pub use error::{Error, InvariantError, ValidationError};
pub use residual::{build_residual, NodePair, ResidualNetwork};
pub use solver::{
    compare_strategies, max_flow, max_flow_with, min_cut, FlowStats, MaxFlow, Solution, Solver,
    SolverConfig, StrategyComparison,
};
