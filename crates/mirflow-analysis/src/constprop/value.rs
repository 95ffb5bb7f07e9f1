//! The constant-value lattice.
//!
//! Three families of elements ordered `Undef ⊑ Const(n) ⊑ Nac`, with
//! distinct constants pairwise incomparable. Each variable can move up the
//! lattice at most twice, which bounds the fixpoint iteration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Abstract value of an int-holding variable at a program point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    /// Bottom: no defining path has reached this point yet, or the value is
    /// provably never observed.
    Undef,
    /// A known compile-time constant.
    Const(i32),
    /// Top: "not a constant", the value may differ across executions.
    Nac,
}

impl Value {
    /// Greatest lower bound of two values.
    ///
    /// `Nac` absorbs, `Undef` is the identity, equal constants meet to
    /// themselves, and distinct constants fall to `Nac`.
    pub fn meet(self, other: Value) -> Value {
        match (self, other) {
            (Value::Nac, _) | (_, Value::Nac) => Value::Nac,
            (Value::Undef, v) | (v, Value::Undef) => v,
            (Value::Const(a), Value::Const(b)) => {
                if a == b {
                    Value::Const(a)
                } else {
                    Value::Nac
                }
            }
        }
    }

    pub fn is_constant(self) -> bool {
        matches!(self, Value::Const(_))
    }

    pub fn is_nac(self) -> bool {
        matches!(self, Value::Nac)
    }

    pub fn is_undef(self) -> bool {
        matches!(self, Value::Undef)
    }

    pub fn as_const(self) -> Option<i32> {
        match self {
            Value::Const(n) => Some(n),
            Value::Undef | Value::Nac => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undef => write!(f, "Undef"),
            Value::Const(n) => write!(f, "{n}"),
            Value::Nac => write!(f, "NAC"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_meet_table() {
        let c5 = Value::Const(5);
        let c7 = Value::Const(7);

        assert_eq!(Value::Nac.meet(c5), Value::Nac);
        assert_eq!(c5.meet(Value::Nac), Value::Nac);
        assert_eq!(Value::Nac.meet(Value::Undef), Value::Nac);

        assert_eq!(Value::Undef.meet(c5), c5);
        assert_eq!(c5.meet(Value::Undef), c5);
        assert_eq!(Value::Undef.meet(Value::Undef), Value::Undef);

        assert_eq!(c5.meet(c5), c5);
        assert_eq!(c5.meet(c7), Value::Nac);
    }

    fn value_strategy() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Undef),
            Just(Value::Nac),
            any::<i32>().prop_map(Value::Const),
        ]
    }

    proptest! {
        #[test]
        fn meet_is_commutative(a in value_strategy(), b in value_strategy()) {
            prop_assert_eq!(a.meet(b), b.meet(a));
        }

        #[test]
        fn meet_is_associative(
            a in value_strategy(),
            b in value_strategy(),
            c in value_strategy(),
        ) {
            prop_assert_eq!(a.meet(b).meet(c), a.meet(b.meet(c)));
        }

        #[test]
        fn meet_is_idempotent(a in value_strategy()) {
            prop_assert_eq!(a.meet(a), a);
        }

        #[test]
        fn undef_is_identity(a in value_strategy()) {
            prop_assert_eq!(Value::Undef.meet(a), a);
        }

        #[test]
        fn nac_is_absorbing(a in value_strategy()) {
            prop_assert_eq!(Value::Nac.meet(a), Value::Nac);
        }
    }
}
