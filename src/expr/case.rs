use crate::operator::Op;

use super::{Expr, IntoExpr, Operation};

/// `case when .. then .. else .. end`, started with [`Expr::case`].
#[derive(Debug, Clone, Default)]
pub struct CaseBuilder {
    branches: Vec<(Expr, Expr)>,
}

#[derive(Debug, Clone)]
pub struct CaseWhen {
    builder: CaseBuilder,
    condition: Expr,
}

impl CaseBuilder {
    pub fn when(self, condition: Expr) -> CaseWhen {
        CaseWhen {
            builder: self,
            condition,
        }
    }

    /// Close the expression; branches chain right to left into the else arm.
    pub fn otherwise<T: IntoExpr>(self, value: T) -> Expr {
        let value = value.into_expr();
        let ty = self
            .branches
            .first()
            .map(|(_, then)| then.ty().clone())
            .unwrap_or_else(|| value.ty().clone());
        let mut chain: Expr = Operation::of(ty.clone(), Op::CaseElse, vec![value]).into();
        for (condition, then) in self.branches.into_iter().rev() {
            chain = Operation::of(ty.clone(), Op::CaseWhen, vec![condition, then, chain]).into();
        }
        Operation::of(ty, Op::Case, vec![chain]).into()
    }
}

impl CaseWhen {
    pub fn then<T: IntoExpr>(mut self, value: T) -> CaseBuilder {
        self.builder.branches.push((self.condition, value.into_expr()));
        self.builder
    }
}

/// `case <expr> when <value> then .. end`, started with [`Expr::when`].
#[derive(Debug, Clone)]
pub struct SimpleCaseBuilder {
    base: Expr,
    branches: Vec<(Expr, Expr)>,
}

#[derive(Debug, Clone)]
pub struct SimpleCaseWhen {
    builder: SimpleCaseBuilder,
    value: Expr,
}

impl SimpleCaseBuilder {
    pub(crate) fn new(base: Expr) -> Self {
        Self {
            base,
            branches: Vec::new(),
        }
    }

    pub fn when<T: IntoExpr>(self, value: T) -> SimpleCaseWhen {
        SimpleCaseWhen {
            builder: self,
            value: value.into_expr(),
        }
    }

    pub fn otherwise<T: IntoExpr>(self, value: T) -> Expr {
        let value = value.into_expr();
        let ty = self
            .branches
            .first()
            .map(|(_, then)| then.ty().clone())
            .unwrap_or_else(|| value.ty().clone());
        let mut chain: Expr = Operation::of(ty.clone(), Op::CaseEqElse, vec![value]).into();
        for (when, then) in self.branches.into_iter().rev() {
            chain = Operation::of(
                ty.clone(),
                Op::CaseEqWhen,
                vec![self.base.clone(), when, then, chain],
            )
            .into();
        }
        Operation::of(ty, Op::CaseEq, vec![self.base, chain]).into()
    }
}

impl SimpleCaseWhen {
    pub fn then<T: IntoExpr>(mut self, value: T) -> SimpleCaseBuilder {
        self.builder.branches.push((self.value, value.into_expr()));
        self.builder
    }
}
