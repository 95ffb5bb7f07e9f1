//! Live-variable analysis.
//!
//! A variable is live at a program point if its current value may still be
//! read before being overwritten. Facts flow backward from uses to
//! definitions:
//!
//! - `OUT[s]` = union of `IN[succ]` over the successors of `s`
//! - `IN[s]`  = `uses(s) ∪ (OUT[s] − def(s))`
//!
//! The dead-code detector consumes the live-after set of each statement,
//! which is the program-order OUT fact of this analysis.

use indexmap::IndexSet;
use mirflow_core::cfg::{Cfg, Node};
use mirflow_core::dataflow::{DataflowAnalysis, Direction};
use mirflow_core::ir::VarId;

/// Set of variables live at a program point.
pub type LiveSet = IndexSet<VarId>;

/// The backward-dataflow contract for live variables.
#[derive(Debug, Default)]
pub struct LiveVariables;

impl LiveVariables {
    pub fn new() -> Self {
        Self
    }
}

impl DataflowAnalysis for LiveVariables {
    type Fact = LiveSet;

    fn direction(&self) -> Direction {
        Direction::Backward
    }

    /// Nothing is live after the method returns.
    fn boundary_fact(&self, _cfg: &Cfg) -> LiveSet {
        LiveSet::new()
    }

    fn initial_fact(&self) -> LiveSet {
        LiveSet::new()
    }

    fn meet_into(&self, fact: &LiveSet, target: &mut LiveSet) {
        for &var in fact {
            target.insert(var);
        }
    }

    fn transfer_node(
        &self,
        cfg: &Cfg,
        node: Node,
        input: &LiveSet,
        output: &mut LiveSet,
    ) -> bool {
        // `input` is the live-after set; kill the definition before adding
        // uses so `x = x + 1` keeps x live on entry.
        let mut live = input.clone();
        if let Some(stmt) = cfg.stmt(node) {
            if let Some(def) = stmt.def() {
                live.shift_remove(&def);
            }
            for var in stmt.uses() {
                live.insert(var);
            }
        }
        if *output == live {
            false
        } else {
            *output = live;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirflow_core::dataflow::FixpointSolver;
    use mirflow_core::ir::{BinaryOp, Exp, MethodIr, Operand, StmtId, StmtKind, VarType};

    #[test]
    fn test_straight_line_liveness() {
        // x = 1; y = x + 1; return y
        let mut ir = MethodIr::new("m");
        let x = ir.new_var("x", VarType::Int);
        let y = ir.new_var("y", VarType::Int);
        let s0 = ir.push(StmtKind::Assign {
            lhs: Some(x),
            rhs: Exp::IntLiteral(1),
        });
        let s1 = ir.push(StmtKind::Assign {
            lhs: Some(y),
            rhs: Exp::Binary {
                op: BinaryOp::Add,
                lhs: Operand::Var(x),
                rhs: Operand::Const(1),
            },
        });
        let s2 = ir.push(StmtKind::Return { value: Some(y) });
        let cfg = Cfg::build(ir).unwrap();

        let result = FixpointSolver::solve(&LiveVariables::new(), &cfg);

        // x is live across s0 -> s1, y across s1 -> s2
        assert!(result.out_fact(Node::Stmt(s0)).contains(&x));
        assert!(!result.out_fact(Node::Stmt(s0)).contains(&y));
        assert!(result.out_fact(Node::Stmt(s1)).contains(&y));
        assert!(!result.out_fact(Node::Stmt(s1)).contains(&x));
        assert!(result.out_fact(Node::Stmt(s2)).is_empty());
    }

    #[test]
    fn test_dead_store_not_live_after() {
        // t = 5; return  (t never read)
        let mut ir = MethodIr::new("m");
        let t = ir.new_var("t", VarType::Int);
        let s0 = ir.push(StmtKind::Assign {
            lhs: Some(t),
            rhs: Exp::IntLiteral(5),
        });
        ir.push(StmtKind::Return { value: None });
        let cfg = Cfg::build(ir).unwrap();

        let result = FixpointSolver::solve(&LiveVariables::new(), &cfg);
        assert!(!result.out_fact(Node::Stmt(s0)).contains(&t));
    }

    #[test]
    fn test_self_referencing_definition_keeps_var_live_on_entry() {
        // x = x + 1; return x
        let mut ir = MethodIr::new("m");
        let x = ir.new_var("x", VarType::Int);
        let s0 = ir.push(StmtKind::Assign {
            lhs: Some(x),
            rhs: Exp::Binary {
                op: BinaryOp::Add,
                lhs: Operand::Var(x),
                rhs: Operand::Const(1),
            },
        });
        ir.push(StmtKind::Return { value: Some(x) });
        let cfg = Cfg::build(ir).unwrap();

        let result = FixpointSolver::solve(&LiveVariables::new(), &cfg);
        assert!(result.in_fact(Node::Stmt(s0)).contains(&x));
    }

    #[test]
    fn test_branch_merges_liveness() {
        // if (c > 0) goto 2; a = 1; return a   -- a live only on one path,
        // c live at entry of the branch
        let mut ir = MethodIr::new("m");
        let c = ir.new_param("c", VarType::Int);
        let a = ir.new_var("a", VarType::Int);
        let s0 = ir.push(StmtKind::If {
            cond: Exp::Binary {
                op: BinaryOp::Gt,
                lhs: Operand::Var(c),
                rhs: Operand::Const(0),
            },
            target: StmtId(2),
        });
        ir.push(StmtKind::Assign {
            lhs: Some(a),
            rhs: Exp::IntLiteral(1),
        });
        ir.push(StmtKind::Return { value: Some(a) });
        let cfg = Cfg::build(ir).unwrap();

        let result = FixpointSolver::solve(&LiveVariables::new(), &cfg);
        assert!(result.in_fact(Node::Stmt(s0)).contains(&c));
        // a is live after the branch on both paths (the return reads it)
        assert!(result.out_fact(Node::Stmt(s0)).contains(&a));
    }
}
