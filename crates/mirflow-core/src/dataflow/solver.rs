//! Worklist-based fixpoint solver.

use crate::cfg::{Cfg, Node};
use indexmap::IndexMap;
use std::collections::{HashSet, VecDeque};

/// Direction of a dataflow analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Contract between an analysis and the fixpoint solver.
///
/// `input`/`output` in [`transfer_node`](Self::transfer_node) are oriented
/// along the analysis direction: for a forward analysis the input is the
/// fact before the node in program order, for a backward analysis it is the
/// fact after it. Termination requires the usual lattice conditions: the
/// meet must be commutative, associative, and idempotent, and transfer must
/// be monotone with facts of finite height.
pub trait DataflowAnalysis {
    /// The facts being propagated.
    type Fact: Clone;

    fn direction(&self) -> Direction;

    /// Fact installed at `Entry` (forward) or `Exit` (backward) before the
    /// first iteration.
    fn boundary_fact(&self, cfg: &Cfg) -> Self::Fact;

    /// Fact installed at every other node before the first iteration.
    fn initial_fact(&self) -> Self::Fact;

    /// Meet `fact` into `target`.
    fn meet_into(&self, fact: &Self::Fact, target: &mut Self::Fact);

    /// Apply the node's transfer function, returning whether `output`
    /// changed. Nodes without a statement (the sentinels) pass the fact
    /// through unchanged.
    fn transfer_node(
        &self,
        cfg: &Cfg,
        node: Node,
        input: &Self::Fact,
        output: &mut Self::Fact,
    ) -> bool;
}

/// Per-node facts after the solver has reached a fixpoint.
///
/// IN and OUT are always stored in *program order* regardless of analysis
/// direction: `in_fact` is the fact before the node executes, `out_fact`
/// the fact after it.
#[derive(Debug, Clone)]
pub struct DataflowResult<F> {
    in_facts: IndexMap<Node, F>,
    out_facts: IndexMap<Node, F>,
    iterations: usize,
}

impl<F> DataflowResult<F> {
    pub fn in_fact(&self, node: Node) -> &F {
        &self.in_facts[&node]
    }

    pub fn out_fact(&self, node: Node) -> &F {
        &self.out_facts[&node]
    }

    /// Number of worklist steps taken to converge.
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

/// Worklist-based fixpoint solver.
pub struct FixpointSolver;

// Backstop against a non-monotone transfer function; a well-formed analysis
// converges long before this.
const MAX_ITERATIONS: usize = 100_000;

impl FixpointSolver {
    /// Compute the fixpoint of `analysis` over `cfg`.
    pub fn solve<A: DataflowAnalysis>(analysis: &A, cfg: &Cfg) -> DataflowResult<A::Fact> {
        match analysis.direction() {
            Direction::Forward => Self::solve_forward(analysis, cfg),
            Direction::Backward => Self::solve_backward(analysis, cfg),
        }
    }

    fn solve_forward<A: DataflowAnalysis>(analysis: &A, cfg: &Cfg) -> DataflowResult<A::Fact> {
        let mut in_facts: IndexMap<Node, A::Fact> = IndexMap::new();
        let mut out_facts: IndexMap<Node, A::Fact> = IndexMap::new();
        for node in cfg.nodes() {
            in_facts.insert(node, analysis.initial_fact());
            out_facts.insert(node, analysis.initial_fact());
        }
        let boundary = analysis.boundary_fact(cfg);
        in_facts.insert(cfg.entry(), boundary.clone());
        out_facts.insert(cfg.entry(), boundary);

        // Entry's facts are pinned to the boundary; everything else iterates.
        let mut worklist: VecDeque<Node> = cfg
            .reverse_postorder()
            .into_iter()
            .filter(|&n| n != cfg.entry())
            .collect();
        let mut queued: HashSet<Node> = worklist.iter().copied().collect();

        let mut iterations = 0;
        while let Some(node) = worklist.pop_front() {
            queued.remove(&node);
            iterations += 1;
            if iterations > MAX_ITERATIONS {
                tracing::warn!(iterations, "fixpoint iteration guard hit, aborting solve");
                break;
            }

            let mut input = analysis.initial_fact();
            for pred in cfg.preds_of(node) {
                if let Some(fact) = out_facts.get(&pred) {
                    analysis.meet_into(fact, &mut input);
                }
            }

            let changed = match out_facts.get_mut(&node) {
                Some(output) => analysis.transfer_node(cfg, node, &input, output),
                None => false,
            };
            in_facts.insert(node, input);

            if changed {
                for succ in cfg.succs_of(node) {
                    if queued.insert(succ) {
                        worklist.push_back(succ);
                    }
                }
            }
        }

        tracing::debug!(iterations, "forward dataflow reached fixpoint");
        DataflowResult {
            in_facts,
            out_facts,
            iterations,
        }
    }

    fn solve_backward<A: DataflowAnalysis>(analysis: &A, cfg: &Cfg) -> DataflowResult<A::Fact> {
        let mut in_facts: IndexMap<Node, A::Fact> = IndexMap::new();
        let mut out_facts: IndexMap<Node, A::Fact> = IndexMap::new();
        for node in cfg.nodes() {
            in_facts.insert(node, analysis.initial_fact());
            out_facts.insert(node, analysis.initial_fact());
        }
        let boundary = analysis.boundary_fact(cfg);
        in_facts.insert(cfg.exit(), boundary.clone());
        out_facts.insert(cfg.exit(), boundary);

        let mut worklist: VecDeque<Node> = cfg
            .postorder()
            .into_iter()
            .filter(|&n| n != cfg.exit())
            .collect();
        let mut queued: HashSet<Node> = worklist.iter().copied().collect();

        let mut iterations = 0;
        while let Some(node) = worklist.pop_front() {
            queued.remove(&node);
            iterations += 1;
            if iterations > MAX_ITERATIONS {
                tracing::warn!(iterations, "fixpoint iteration guard hit, aborting solve");
                break;
            }

            // The fact after the node is the meet over its successors.
            let mut input = analysis.initial_fact();
            for succ in cfg.succs_of(node) {
                if let Some(fact) = in_facts.get(&succ) {
                    analysis.meet_into(fact, &mut input);
                }
            }

            let changed = match in_facts.get_mut(&node) {
                Some(output) => analysis.transfer_node(cfg, node, &input, output),
                None => false,
            };
            out_facts.insert(node, input);

            if changed {
                for pred in cfg.preds_of(node) {
                    if queued.insert(pred) {
                        worklist.push_back(pred);
                    }
                }
            }
        }

        tracing::debug!(iterations, "backward dataflow reached fixpoint");
        DataflowResult {
            in_facts,
            out_facts,
            iterations,
        }
    }
}
