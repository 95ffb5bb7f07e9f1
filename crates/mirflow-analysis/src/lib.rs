//! # mirflow-analysis
//!
//! Intraprocedural analyses over the mirflow three-address IR.
//!
//! ## Modules
//!
//! - **[`constprop`]** - Forward constant propagation over a
//!   `Undef ⊑ Const(n) ⊑ Nac` value lattice
//! - **[`liveness`]** - Backward live-variable analysis
//! - **[`deadcode`]** - Unreachable-code and dead-assignment detection
//!   driven by the two results above
//!
//! ## Quick Start
//!
//! ```rust
//! use mirflow_core::cfg::Cfg;
//! use mirflow_core::ir::{Exp, MethodIr, StmtKind, VarType};
//!
//! // t = 7; return   -- the store to t is dead
//! let mut ir = MethodIr::new("example");
//! let t = ir.new_var("t", VarType::Int);
//! let store = ir.push(StmtKind::Assign {
//!     lhs: Some(t),
//!     rhs: Exp::IntLiteral(7),
//! });
//! ir.push(StmtKind::Return { value: None });
//!
//! let cfg = Cfg::build(ir).expect("well-formed method");
//! let dead = mirflow_analysis::deadcode::analyze(&cfg);
//! assert!(dead.contains(&store));
//! ```

pub mod constprop;
pub mod deadcode;
pub mod liveness;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::constprop::{evaluate, ConstantPropagation, CpFact, Value};
    pub use crate::deadcode::{find_dead_code, has_no_side_effect};
    pub use crate::liveness::{LiveSet, LiveVariables};
}

pub use constprop::{evaluate, ConstantPropagation, CpFact, Value};
pub use deadcode::{find_dead_code, has_no_side_effect};
pub use liveness::{LiveSet, LiveVariables};
