//! Statement-level control-flow graph.
//!
//! Every statement of a [`MethodIr`] is one node; distinguished `Entry` and
//! `Exit` sentinels bracket the graph. Edges carry the kind of control
//! transfer they represent, which branch-sensitive analyses use to follow
//! only the feasible successors of a folded condition.

use crate::ir::{MethodIr, Stmt, StmtId, StmtKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashSet;

/// A node of the control-flow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Node {
    Entry,
    Stmt(StmtId),
    Exit,
}

/// Kind of control transfer an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    Fallthrough,
    IfTrue,
    IfFalse,
    SwitchCase(i32),
    SwitchDefault,
}

/// A directed, kinded edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: Node,
    pub target: Node,
    pub kind: EdgeKind,
}

/// Structural errors detected while deriving a CFG from an IR.
#[derive(Debug, thiserror::Error)]
pub enum CfgError {
    /// A branch names a statement index past the end of the method.
    #[error("statement {stmt:?} targets {target:?}, past the end of `{method}`")]
    TargetOutOfRange {
        method: String,
        stmt: StmtId,
        target: StmtId,
    },
}

/// Control-flow graph over the statements of one method.
#[derive(Debug, Clone)]
pub struct Cfg {
    ir: MethodIr,
    out_edges: IndexMap<Node, SmallVec<[Edge; 2]>>,
    in_edges: IndexMap<Node, SmallVec<[Edge; 2]>>,
}

impl Cfg {
    /// Derive the CFG of `ir` from its statement kinds.
    ///
    /// Edges follow directly from the IR: definitions and no-ops fall
    /// through, an `If` gets an `IfTrue` edge to its target and an `IfFalse`
    /// edge to the next statement, a `Switch` gets one edge per case plus a
    /// default, and a `Return` transfers to `Exit`. Branch targets are
    /// validated here so the analyses never have to.
    pub fn build(ir: MethodIr) -> Result<Self, CfgError> {
        let mut cfg = Self {
            out_edges: IndexMap::new(),
            in_edges: IndexMap::new(),
            ir,
        };
        for node in cfg.collect_nodes() {
            cfg.out_edges.entry(node).or_default();
            cfg.in_edges.entry(node).or_default();
        }

        let first = match cfg.ir.stmts().first() {
            Some(s) => Node::Stmt(s.id),
            None => Node::Exit,
        };
        cfg.add_edge(Node::Entry, first, EdgeKind::Fallthrough);

        let stmt_count = cfg.ir.stmts().len();
        let next_of = |id: StmtId| {
            if id.0 + 1 < stmt_count {
                Node::Stmt(StmtId(id.0 + 1))
            } else {
                Node::Exit
            }
        };
        let check = |cfg: &Cfg, stmt: StmtId, target: StmtId| {
            if target.0 < stmt_count {
                Ok(Node::Stmt(target))
            } else {
                Err(CfgError::TargetOutOfRange {
                    method: cfg.ir.name().to_string(),
                    stmt,
                    target,
                })
            }
        };

        for id in (0..stmt_count).map(StmtId) {
            match cfg.ir.stmt(id).kind.clone() {
                StmtKind::Assign { .. } | StmtKind::Nop => {
                    cfg.add_edge(Node::Stmt(id), next_of(id), EdgeKind::Fallthrough);
                }
                StmtKind::Goto { target } => {
                    let target = check(&cfg, id, target)?;
                    cfg.add_edge(Node::Stmt(id), target, EdgeKind::Fallthrough);
                }
                StmtKind::If { target, .. } => {
                    let target = check(&cfg, id, target)?;
                    cfg.add_edge(Node::Stmt(id), target, EdgeKind::IfTrue);
                    cfg.add_edge(Node::Stmt(id), next_of(id), EdgeKind::IfFalse);
                }
                StmtKind::Switch { cases, default, .. } => {
                    for (value, target) in cases {
                        let target = check(&cfg, id, target)?;
                        cfg.add_edge(Node::Stmt(id), target, EdgeKind::SwitchCase(value));
                    }
                    let default = check(&cfg, id, default)?;
                    cfg.add_edge(Node::Stmt(id), default, EdgeKind::SwitchDefault);
                }
                StmtKind::Return { .. } => {
                    cfg.add_edge(Node::Stmt(id), Node::Exit, EdgeKind::Fallthrough);
                }
            }
        }
        Ok(cfg)
    }

    fn collect_nodes(&self) -> Vec<Node> {
        std::iter::once(Node::Entry)
            .chain(self.ir.stmts().iter().map(|s| Node::Stmt(s.id)))
            .chain(std::iter::once(Node::Exit))
            .collect()
    }

    fn add_edge(&mut self, source: Node, target: Node, kind: EdgeKind) {
        let edge = Edge {
            source,
            target,
            kind,
        };
        self.out_edges.entry(source).or_default().push(edge);
        self.in_edges.entry(target).or_default().push(edge);
    }

    pub fn ir(&self) -> &MethodIr {
        &self.ir
    }

    pub fn entry(&self) -> Node {
        Node::Entry
    }

    pub fn exit(&self) -> Node {
        Node::Exit
    }

    /// All nodes: `Entry`, the statements in index order, `Exit`.
    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.out_edges.keys().copied()
    }

    /// The statement at `node`, or `None` for the sentinels.
    pub fn stmt(&self, node: Node) -> Option<&Stmt> {
        match node {
            Node::Stmt(id) => Some(self.ir.stmt(id)),
            Node::Entry | Node::Exit => None,
        }
    }

    pub fn out_edges_of(&self, node: Node) -> &[Edge] {
        match self.out_edges.get(&node) {
            Some(edges) => edges,
            None => &[],
        }
    }

    pub fn in_edges_of(&self, node: Node) -> &[Edge] {
        match self.in_edges.get(&node) {
            Some(edges) => edges,
            None => &[],
        }
    }

    pub fn succs_of(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        self.out_edges_of(node).iter().map(|e| e.target)
    }

    pub fn preds_of(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        self.in_edges_of(node).iter().map(|e| e.source)
    }

    /// Nodes in reverse postorder from `Entry`, the seed order for forward
    /// dataflow.
    pub fn reverse_postorder(&self) -> Vec<Node> {
        let mut order = self.postorder();
        order.reverse();
        order
    }

    /// Nodes in postorder from `Entry`, the seed order for backward
    /// dataflow.
    pub fn postorder(&self) -> Vec<Node> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        self.dfs_postorder(Node::Entry, &mut visited, &mut order);
        order
    }

    fn dfs_postorder(&self, node: Node, visited: &mut HashSet<Node>, order: &mut Vec<Node>) {
        if !visited.insert(node) {
            return;
        }
        for succ in self.succs_of(node) {
            self.dfs_postorder(succ, visited, order);
        }
        order.push(node);
    }
}
