//! Dead-code detection.
//!
//! Combines the constant-propagation fixpoint with live-variable facts to
//! classify two kinds of removable statements in one traversal:
//!
//! - **unreachable code**: statements control can provably never reach,
//!   because a branch condition folds to a constant and rules out the only
//!   path to them;
//! - **dead assignments**: definitions whose value is never read and whose
//!   right-hand side is provably free of side effects.
//!
//! The traversal is a single breadth-first walk from `Entry`. Both analysis
//! results are taken as explicit inputs; this module never recomputes them.

use crate::constprop::{evaluate, CpFact, ConstantPropagation, Value};
use crate::liveness::{LiveSet, LiveVariables};
use mirflow_core::cfg::{Cfg, EdgeKind, Node};
use mirflow_core::dataflow::{DataflowResult, FixpointSolver};
use mirflow_core::ir::{BinaryOp, Exp, StmtId, StmtKind};
use std::collections::{BTreeSet, HashSet, VecDeque};

/// Whether evaluating `exp` is observably effect-free.
///
/// The match is exhaustive: a new expression kind must state its
/// classification here before the crate compiles.
pub fn has_no_side_effect(exp: &Exp) -> bool {
    match exp {
        // allocation mutates the heap
        Exp::New { .. } => false,
        // may fault at runtime
        Exp::Cast { .. } => false,
        // may fault or trigger class initialization
        Exp::FieldAccess { .. } => false,
        // may fault on a bad index
        Exp::ArrayAccess { .. } => false,
        // division family may fault on a zero divisor
        Exp::Binary { op, .. } => !matches!(op, BinaryOp::Div | BinaryOp::Rem),
        Exp::Var(_) | Exp::IntLiteral(_) => true,
    }
}

/// Classify the dead statements of a method.
///
/// `constants` must be the fixpoint of [`ConstantPropagation`] over `cfg`
/// and `liveness` the fixpoint of [`LiveVariables`]; the detector only
/// reads them. The result is ordered by statement index.
pub fn find_dead_code(
    cfg: &Cfg,
    constants: &DataflowResult<CpFact>,
    liveness: &DataflowResult<LiveSet>,
) -> BTreeSet<StmtId> {
    let mut queue = VecDeque::new();
    let mut visited: HashSet<Node> = HashSet::new();
    let mut kept: HashSet<StmtId> = HashSet::new();

    let enqueue = |queue: &mut VecDeque<Node>, visited: &mut HashSet<Node>, target: Node| {
        if visited.insert(target) {
            queue.push_back(target);
        }
    };

    enqueue(&mut queue, &mut visited, cfg.entry());

    while let Some(node) = queue.pop_front() {
        let Some(stmt) = cfg.stmt(node) else {
            // Entry and Exit carry no statement and are never dead.
            for edge in cfg.out_edges_of(node) {
                enqueue(&mut queue, &mut visited, edge.target);
            }
            continue;
        };

        match &stmt.kind {
            StmtKind::Assign { lhs, rhs } => {
                let dead_store = match lhs {
                    Some(lhs) => {
                        !liveness.out_fact(node).contains(lhs) && has_no_side_effect(rhs)
                    }
                    None => false,
                };
                if !dead_store {
                    kept.insert(stmt.id);
                }
                // Control reaches the successor whether or not the stored
                // value is ever read.
                for edge in cfg.out_edges_of(node) {
                    enqueue(&mut queue, &mut visited, edge.target);
                }
            }
            StmtKind::If { cond, .. } => {
                kept.insert(stmt.id);
                let wanted = match evaluate(cond, constants.in_fact(node)) {
                    Value::Const(1) => Some(EdgeKind::IfTrue),
                    Value::Const(0) => Some(EdgeKind::IfFalse),
                    _ => None,
                };
                for edge in cfg.out_edges_of(node) {
                    if wanted.is_none() || wanted == Some(edge.kind) {
                        enqueue(&mut queue, &mut visited, edge.target);
                    }
                }
            }
            StmtKind::Switch { discriminant, .. } => {
                kept.insert(stmt.id);
                let edges = cfg.out_edges_of(node);
                match constants.in_fact(node).get(*discriminant) {
                    Value::Const(k) => {
                        // the matching case edge, or the default when no
                        // case covers k; exactly one successor
                        let case = edges.iter().find(|e| e.kind == EdgeKind::SwitchCase(k));
                        let taken = match case {
                            Some(edge) => Some(edge),
                            None => edges.iter().find(|e| e.kind == EdgeKind::SwitchDefault),
                        };
                        if let Some(edge) = taken {
                            enqueue(&mut queue, &mut visited, edge.target);
                        }
                    }
                    Value::Undef | Value::Nac => {
                        for edge in edges {
                            enqueue(&mut queue, &mut visited, edge.target);
                        }
                    }
                }
            }
            StmtKind::Goto { .. } | StmtKind::Return { .. } | StmtKind::Nop => {
                kept.insert(stmt.id);
                for edge in cfg.out_edges_of(node) {
                    enqueue(&mut queue, &mut visited, edge.target);
                }
            }
        }
    }

    let dead: BTreeSet<StmtId> = cfg
        .ir()
        .stmts()
        .iter()
        .map(|s| s.id)
        .filter(|id| !kept.contains(id))
        .collect();
    tracing::debug!(
        method = cfg.ir().name(),
        dead = dead.len(),
        total = cfg.ir().stmts().len(),
        "dead-code classification complete"
    );
    dead
}

/// Run both prerequisite analyses and classify dead code in one call.
pub fn analyze(cfg: &Cfg) -> BTreeSet<StmtId> {
    let constants = FixpointSolver::solve(&ConstantPropagation::new(), cfg);
    let liveness = FixpointSolver::solve(&LiveVariables::new(), cfg);
    find_dead_code(cfg, &constants, &liveness)
}
