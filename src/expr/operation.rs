use crate::{
    error::{Error, Result},
    operator::{Op, Operator},
    value::ValueType,
};

use super::Expr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Operation {
    ty: ValueType,
    operator: Operator,
    args: Vec<Expr>,
}

impl Operation {
    /// Build an operation, rejecting argument counts the operator does not accept.
    ///
    /// Custom operators carry no arity of their own; the registry checks them
    /// against their registration when they are rendered.
    pub fn new<O: Into<Operator>>(ty: ValueType, operator: O, args: Vec<Expr>) -> Result<Self> {
        let operator = operator.into();
        if let Some(expected) = operator.arity() {
            if !expected.accepts(args.len()) {
                return Err(Error::Arity {
                    operator,
                    expected,
                    found: args.len(),
                });
            }
        }
        Ok(Self { ty, operator, args })
    }

    pub(crate) fn of(ty: ValueType, op: Op, args: Vec<Expr>) -> Self {
        debug_assert!(op.arity().accepts(args.len()), "arity mismatch for {op:?}");
        Self {
            ty,
            operator: Operator::Op(op),
            args,
        }
    }

    pub fn ty(&self) -> &ValueType {
        &self.ty
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    pub fn op(&self) -> Option<Op> {
        self.operator.as_op()
    }

    pub fn args(&self) -> &[Expr] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&Expr> {
        self.args.get(index)
    }
}
