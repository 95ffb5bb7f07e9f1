//! Constant propagation.
//!
//! A forward dataflow analysis computing, for every program point, the most
//! precise statically-known value of every int-holding variable. The
//! evaluator replicates 32-bit two's-complement runtime semantics exactly:
//! arithmetic wraps on overflow, shifts mask their amount to 5 bits, and a
//! division or remainder by a known zero yields `Undef` because every
//! execution reaching it faults before a value is produced.

mod value;

pub use value::Value;

use indexmap::IndexMap;
use mirflow_core::cfg::{Cfg, Node};
use mirflow_core::dataflow::{DataflowAnalysis, Direction};
use mirflow_core::ir::{BinaryOp, Exp, OpCategory, Operand, StmtKind, VarId};

/// Map from int-holding variables to their abstract values.
///
/// Absent keys implicitly hold [`Value::Undef`]. Facts have value
/// semantics: the transfer function and meet operator copy them at every
/// call boundary rather than aliasing a shared map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpFact {
    values: IndexMap<VarId, Value>,
}

impl CpFact {
    pub fn new() -> Self {
        Self::default()
    }

    /// The value bound to `var`, `Undef` if absent.
    pub fn get(&self, var: VarId) -> Value {
        self.values.get(&var).copied().unwrap_or(Value::Undef)
    }

    /// Bind `var` to `value`, returning whether the binding changed.
    pub fn update(&mut self, var: VarId, value: Value) -> bool {
        self.values.insert(var, value) != Some(value)
    }

    pub fn remove(&mut self, var: VarId) -> Option<Value> {
        self.values.shift_remove(&var)
    }

    /// Overwrite `self` with `other`, returning whether `self` changed.
    pub fn copy_from(&mut self, other: &CpFact) -> bool {
        if self == other {
            false
        } else {
            *self = other.clone();
            true
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, Value)> + '_ {
        self.values.iter().map(|(&var, &value)| (var, value))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Fold `exp` to a [`Value`] under `fact`.
///
/// Pure and total: never mutates the fact, never fails. Operands of a
/// binary expression are simple, so their values are read straight from the
/// fact with no recursion. Expression kinds outside the integer domain
/// resolve to `Nac`.
pub fn evaluate(exp: &Exp, fact: &CpFact) -> Value {
    match exp {
        Exp::Var(v) => fact.get(*v),
        Exp::IntLiteral(n) => Value::Const(*n),
        Exp::Binary { op, lhs, rhs } => {
            evaluate_binary(*op, operand_value(*lhs, fact), operand_value(*rhs, fact))
        }
        Exp::New { .. } | Exp::Cast { .. } | Exp::FieldAccess { .. } | Exp::ArrayAccess { .. } => {
            Value::Nac
        }
    }
}

fn operand_value(operand: Operand, fact: &CpFact) -> Value {
    match operand {
        Operand::Var(v) => fact.get(v),
        Operand::Const(n) => Value::Const(n),
    }
}

fn evaluate_binary(op: BinaryOp, v1: Value, v2: Value) -> Value {
    // A division-family operator with a known zero divisor faults on every
    // execution that reaches it, independent of the dividend, so the
    // defined value is never observed.
    let faulting_division = op.category() == OpCategory::Arithmetic
        && matches!(op, BinaryOp::Div | BinaryOp::Rem)
        && v2 == Value::Const(0);
    if faulting_division {
        return Value::Undef;
    }
    if v1.is_nac() || v2.is_nac() {
        return Value::Nac;
    }
    let (Value::Const(a), Value::Const(b)) = (v1, v2) else {
        // An operand still awaits its first defining path.
        return Value::Undef;
    };
    let folded = match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        // b != 0 here; wrapping keeps i32::MIN / -1 at i32::MIN.
        BinaryOp::Div => a.wrapping_div(b),
        BinaryOp::Rem => a.wrapping_rem(b),
        BinaryOp::Eq => (a == b) as i32,
        BinaryOp::Ne => (a != b) as i32,
        BinaryOp::Lt => (a < b) as i32,
        BinaryOp::Gt => (a > b) as i32,
        BinaryOp::Le => (a <= b) as i32,
        BinaryOp::Ge => (a >= b) as i32,
        // wrapping shifts mask the amount to the low 5 bits
        BinaryOp::Shl => a.wrapping_shl(b as u32),
        BinaryOp::Shr => a.wrapping_shr(b as u32),
        BinaryOp::Ushr => ((a as u32).wrapping_shr(b as u32)) as i32,
        BinaryOp::Or => a | b,
        BinaryOp::And => a & b,
        BinaryOp::Xor => a ^ b,
    };
    Value::Const(folded)
}

/// The forward-dataflow contract for constant propagation.
#[derive(Debug, Default)]
pub struct ConstantPropagation;

impl ConstantPropagation {
    pub fn new() -> Self {
        Self
    }
}

impl DataflowAnalysis for ConstantPropagation {
    type Fact = CpFact;

    fn direction(&self) -> Direction {
        Direction::Forward
    }

    /// Incoming arguments are unknown at analysis start: every int-holding
    /// parameter maps to `Nac`.
    fn boundary_fact(&self, cfg: &Cfg) -> CpFact {
        let mut fact = CpFact::new();
        for &param in cfg.ir().params() {
            if cfg.ir().var(param).ty.holds_int() {
                fact.update(param, Value::Nac);
            }
        }
        fact
    }

    fn initial_fact(&self) -> CpFact {
        CpFact::new()
    }

    fn meet_into(&self, fact: &CpFact, target: &mut CpFact) {
        // Keys absent from `fact` stay untouched: implicit Undef is the
        // meet identity.
        for (var, value) in fact.iter() {
            let met = value.meet(target.get(var));
            target.update(var, met);
        }
    }

    fn transfer_node(
        &self,
        cfg: &Cfg,
        node: Node,
        input: &CpFact,
        output: &mut CpFact,
    ) -> bool {
        let mut tmp = input.clone();
        if let Some(stmt) = cfg.stmt(node) {
            if let StmtKind::Assign { lhs: Some(lhs), rhs } = &stmt.kind {
                if cfg.ir().var(*lhs).ty.holds_int() {
                    // The right-hand side reads the state strictly before
                    // this definition takes effect.
                    tmp.update(*lhs, evaluate(rhs, input));
                }
            }
        }
        output.copy_from(&tmp)
    }
}
