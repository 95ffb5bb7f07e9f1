//! # mirflow-core
//!
//! The substrate of the mirflow analyses: a three-address intermediate
//! representation, a statement-level control-flow graph with typed edges,
//! and a generic worklist-based dataflow framework.
//!
//! ## Modules
//!
//! - **[`ir`]** - Variables, expressions, statements, and method bodies
//! - **[`cfg`]** - CFG derivation and traversal orders
//! - **[`dataflow`]** - The analysis contract and fixpoint solver
//!
//! ## Quick Start
//!
//! ```rust
//! use mirflow_core::cfg::Cfg;
//! use mirflow_core::ir::{Exp, MethodIr, StmtKind, VarType};
//!
//! let mut ir = MethodIr::new("answer");
//! let x = ir.new_var("x", VarType::Int);
//! ir.push(StmtKind::Assign {
//!     lhs: Some(x),
//!     rhs: Exp::IntLiteral(42),
//! });
//! ir.push(StmtKind::Return { value: Some(x) });
//!
//! let cfg = Cfg::build(ir).expect("well-formed method");
//! assert_eq!(cfg.nodes().count(), 4);
//! ```

pub mod cfg;
pub mod dataflow;
pub mod ir;

pub use cfg::{Cfg, CfgError, Edge, EdgeKind, Node};
pub use dataflow::{DataflowAnalysis, DataflowResult, Direction, FixpointSolver};
pub use ir::{BinaryOp, Exp, MethodIr, OpCategory, Operand, Stmt, StmtId, StmtKind, Var, VarId, VarType};
