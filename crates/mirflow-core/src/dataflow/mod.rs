//! Generic dataflow framework with a worklist-based fixpoint solver.
//!
//! Analyses implement [`DataflowAnalysis`]; [`FixpointSolver`] drives meet
//! and transfer over the CFG until no fact changes.

mod solver;

pub use solver::{DataflowAnalysis, DataflowResult, Direction, FixpointSolver};
