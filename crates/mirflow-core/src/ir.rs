//! Three-address intermediate representation.
//!
//! A [`MethodIr`] holds one method body: a variable table, the parameter
//! list, and a flat list of statements in source order. Operands of
//! composite expressions are always simple (a variable or an integer
//! literal), so analyses never need to recurse into nested expressions.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Index of a local variable in its enclosing [`MethodIr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub u32);

/// Index of a statement in its enclosing [`MethodIr`].
///
/// Statement indices are strictly increasing in source order, which defines
/// the ordering of analysis output such as dead-code sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StmtId(pub usize);

/// Declared type of a local variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarType {
    Byte,
    Short,
    Int,
    Char,
    Boolean,
    Long,
    Float,
    Double,
    /// Any reference type (objects, arrays).
    Ref,
}

impl VarType {
    /// Whether a variable of this type carries a value representable in the
    /// 32-bit integer domain. Only such variables appear in constant facts.
    pub fn holds_int(self) -> bool {
        matches!(
            self,
            VarType::Byte | VarType::Short | VarType::Int | VarType::Char | VarType::Boolean
        )
    }
}

/// A local variable slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Var {
    pub name: String,
    pub ty: VarType,
}

/// Category of a binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpCategory {
    Arithmetic,
    Relational,
    Shift,
    Bitwise,
}

/// Binary operators, flattened into a single enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Shl,
    Shr,
    Ushr,
    Or,
    And,
    Xor,
}

impl BinaryOp {
    pub fn category(self) -> OpCategory {
        match self {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                OpCategory::Arithmetic
            }
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::Le
            | BinaryOp::Ge => OpCategory::Relational,
            BinaryOp::Shl | BinaryOp::Shr | BinaryOp::Ushr => OpCategory::Shift,
            BinaryOp::Or | BinaryOp::And | BinaryOp::Xor => OpCategory::Bitwise,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sym = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Ushr => ">>>",
            BinaryOp::Or => "|",
            BinaryOp::And => "&",
            BinaryOp::Xor => "^",
        };
        f.write_str(sym)
    }
}

/// A simple operand of a composite expression: a variable or a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    Var(VarId),
    Const(i32),
}

impl Operand {
    pub fn as_var(self) -> Option<VarId> {
        match self {
            Operand::Var(v) => Some(v),
            Operand::Const(_) => None,
        }
    }
}

/// Right-hand-side expressions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Exp {
    /// A variable copy.
    Var(VarId),
    /// A 32-bit integer literal.
    IntLiteral(i32),
    /// A binary expression over two simple operands.
    Binary {
        op: BinaryOp,
        lhs: Operand,
        rhs: Operand,
    },
    /// Object or array allocation.
    New { class: String },
    /// A checked cast.
    Cast { ty: String, value: VarId },
    /// Static (`base == None`) or instance field access.
    FieldAccess { base: Option<VarId>, field: String },
    /// Array element access.
    ArrayAccess { array: VarId, index: Operand },
}

impl Exp {
    /// Variables read when this expression is evaluated.
    pub fn uses(&self) -> SmallVec<[VarId; 2]> {
        let mut vars = SmallVec::new();
        match self {
            Exp::Var(v) => vars.push(*v),
            Exp::IntLiteral(_) => {}
            Exp::Binary { lhs, rhs, .. } => {
                vars.extend(lhs.as_var());
                vars.extend(rhs.as_var());
            }
            Exp::New { .. } => {}
            Exp::Cast { value, .. } => vars.push(*value),
            Exp::FieldAccess { base, .. } => vars.extend(*base),
            Exp::ArrayAccess { array, index } => {
                vars.push(*array);
                vars.extend(index.as_var());
            }
        }
        vars
    }
}

/// Statement variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StmtKind {
    /// A definition. `lhs` is `None` when the expression is evaluated only
    /// for its effect.
    Assign { lhs: Option<VarId>, rhs: Exp },
    /// Conditional branch: jumps to `target` when `cond` holds, falls
    /// through otherwise. `cond` is a relational [`Exp::Binary`].
    If { cond: Exp, target: StmtId },
    /// Unconditional jump.
    Goto { target: StmtId },
    /// Multi-way branch on an integer discriminant.
    Switch {
        discriminant: VarId,
        cases: Vec<(i32, StmtId)>,
        default: StmtId,
    },
    /// Return from the method.
    Return { value: Option<VarId> },
    /// No operation.
    Nop,
}

/// A statement together with its index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stmt {
    pub id: StmtId,
    pub kind: StmtKind,
}

impl Stmt {
    /// The variable this statement defines, if any.
    pub fn def(&self) -> Option<VarId> {
        match &self.kind {
            StmtKind::Assign { lhs, .. } => *lhs,
            StmtKind::If { .. }
            | StmtKind::Goto { .. }
            | StmtKind::Switch { .. }
            | StmtKind::Return { .. }
            | StmtKind::Nop => None,
        }
    }

    /// Variables this statement reads.
    pub fn uses(&self) -> SmallVec<[VarId; 2]> {
        match &self.kind {
            StmtKind::Assign { rhs, .. } => rhs.uses(),
            StmtKind::If { cond, .. } => cond.uses(),
            StmtKind::Switch { discriminant, .. } => SmallVec::from_slice(&[*discriminant]),
            StmtKind::Return { value } => value.iter().copied().collect(),
            StmtKind::Goto { .. } | StmtKind::Nop => SmallVec::new(),
        }
    }
}

/// One method body in three-address form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodIr {
    name: String,
    vars: Vec<Var>,
    params: SmallVec<[VarId; 4]>,
    stmts: Vec<Stmt>,
}

impl MethodIr {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: Vec::new(),
            params: SmallVec::new(),
            stmts: Vec::new(),
        }
    }

    /// Register a fresh local variable.
    pub fn new_var(&mut self, name: impl Into<String>, ty: VarType) -> VarId {
        let id = VarId(self.vars.len() as u32);
        self.vars.push(Var {
            name: name.into(),
            ty,
        });
        id
    }

    /// Register a fresh variable that is also a method parameter.
    pub fn new_param(&mut self, name: impl Into<String>, ty: VarType) -> VarId {
        let id = self.new_var(name, ty);
        self.params.push(id);
        id
    }

    /// Append a statement, returning its index.
    pub fn push(&mut self, kind: StmtKind) -> StmtId {
        let id = StmtId(self.stmts.len());
        self.stmts.push(Stmt { id, kind });
        id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn var(&self, id: VarId) -> &Var {
        &self.vars[id.0 as usize]
    }

    pub fn params(&self) -> &[VarId] {
        &self.params
    }

    pub fn stmts(&self) -> &[Stmt] {
        &self.stmts
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_holding_types() {
        assert!(VarType::Byte.holds_int());
        assert!(VarType::Short.holds_int());
        assert!(VarType::Int.holds_int());
        assert!(VarType::Char.holds_int());
        assert!(VarType::Boolean.holds_int());
        assert!(!VarType::Long.holds_int());
        assert!(!VarType::Float.holds_int());
        assert!(!VarType::Double.holds_int());
        assert!(!VarType::Ref.holds_int());
    }

    #[test]
    fn test_operator_categories() {
        assert_eq!(BinaryOp::Add.category(), OpCategory::Arithmetic);
        assert_eq!(BinaryOp::Rem.category(), OpCategory::Arithmetic);
        assert_eq!(BinaryOp::Le.category(), OpCategory::Relational);
        assert_eq!(BinaryOp::Ushr.category(), OpCategory::Shift);
        assert_eq!(BinaryOp::Xor.category(), OpCategory::Bitwise);
    }

    #[test]
    fn test_def_and_uses() {
        let mut ir = MethodIr::new("m");
        let x = ir.new_var("x", VarType::Int);
        let y = ir.new_var("y", VarType::Int);
        let z = ir.new_var("z", VarType::Int);

        let assign = ir.push(StmtKind::Assign {
            lhs: Some(z),
            rhs: Exp::Binary {
                op: BinaryOp::Add,
                lhs: Operand::Var(x),
                rhs: Operand::Var(y),
            },
        });
        let ret = ir.push(StmtKind::Return { value: Some(z) });

        let assign = ir.stmt(assign);
        assert_eq!(assign.def(), Some(z));
        assert_eq!(assign.uses().as_slice(), &[x, y]);

        let ret = ir.stmt(ret);
        assert_eq!(ret.def(), None);
        assert_eq!(ret.uses().as_slice(), &[z]);
    }

    #[test]
    fn test_literal_operands_have_no_uses() {
        let mut ir = MethodIr::new("m");
        let x = ir.new_var("x", VarType::Int);
        let s = ir.push(StmtKind::Assign {
            lhs: Some(x),
            rhs: Exp::Binary {
                op: BinaryOp::Mul,
                lhs: Operand::Const(2),
                rhs: Operand::Const(21),
            },
        });
        assert!(ir.stmt(s).uses().is_empty());
    }

    #[test]
    fn test_param_registration() {
        let mut ir = MethodIr::new("m");
        let a = ir.new_param("a", VarType::Int);
        let b = ir.new_param("b", VarType::Ref);
        let _local = ir.new_var("t", VarType::Int);
        assert_eq!(ir.params(), &[a, b]);
        assert_eq!(ir.var(b).ty, VarType::Ref);
    }
}
