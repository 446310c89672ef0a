use std::sync::Arc;

use crate::value::{IntoValue, Value, ValueType};

mod case;
mod constant;
mod dsl;
mod factory;
mod operation;
mod order;
mod path;
mod sub;
mod template;

pub use case::{CaseBuilder, CaseWhen, SimpleCaseBuilder, SimpleCaseWhen};
pub use constant::{Constant, Param};
pub use dsl::{all_of, any_of};
pub use factory::{Factory, FactoryExpr, FnFactory, NumberConversions, Tuple};
pub use operation::Operation;
pub use order::{NullHandling, Order, OrderSpecifier};
pub use path::{Path, PathElement, PathKind};
pub use sub::SubQuery;
pub use template::TemplateExpr;

/// Trees are immutable: every composite variant holds its children behind an
/// `Arc`, so cloning a tree is cheap and rewrites build new nodes instead of
/// touching the ones they were given.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Constant(Constant),
    Path(Path),
    Operation(Arc<Operation>),
    Param(Param),
    SubQuery(SubQuery),
    Factory(Arc<FactoryExpr>),
    Template(Arc<TemplateExpr>),
}

impl Expr {
    pub fn ty(&self) -> &ValueType {
        match self {
            Expr::Constant(constant) => constant.ty(),
            Expr::Path(path) => path.ty(),
            Expr::Operation(operation) => operation.ty(),
            Expr::Param(param) => param.ty(),
            Expr::SubQuery(sub) => sub.ty(),
            Expr::Factory(factory) => factory.ty(),
            Expr::Template(template) => template.ty(),
        }
    }

    pub fn constant<T: IntoValue>(value: T) -> Self {
        Self::Constant(Constant::new(value.into_value()))
    }

    pub fn as_constant(&self) -> Option<&Value> {
        match self {
            Expr::Constant(constant) => Some(constant.value()),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Expr::Path(path) => Some(path),
            _ => None,
        }
    }

    pub fn as_operation(&self) -> Option<&Operation> {
        match self {
            Expr::Operation(operation) => Some(operation),
            _ => None,
        }
    }

    pub fn as_subquery(&self) -> Option<&SubQuery> {
        match self {
            Expr::SubQuery(sub) => Some(sub),
            _ => None,
        }
    }
}

impl From<Path> for Expr {
    fn from(value: Path) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for Expr {
    fn from(value: &Path) -> Self {
        Self::Path(value.clone())
    }
}

impl From<Operation> for Expr {
    fn from(value: Operation) -> Self {
        Self::Operation(Arc::new(value))
    }
}

impl From<Constant> for Expr {
    fn from(value: Constant) -> Self {
        Self::Constant(value)
    }
}

impl From<Param> for Expr {
    fn from(value: Param) -> Self {
        Self::Param(value)
    }
}

impl From<SubQuery> for Expr {
    fn from(value: SubQuery) -> Self {
        Self::SubQuery(value)
    }
}

impl From<FactoryExpr> for Expr {
    fn from(value: FactoryExpr) -> Self {
        Self::Factory(Arc::new(value))
    }
}

impl From<TemplateExpr> for Expr {
    fn from(value: TemplateExpr) -> Self {
        Self::Template(Arc::new(value))
    }
}

/// Anything usable as an operand: expression nodes, or plain values that
/// become constants.
pub trait IntoExpr {
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl IntoExpr for &Expr {
    fn into_expr(self) -> Expr {
        self.clone()
    }
}

impl IntoExpr for Path {
    fn into_expr(self) -> Expr {
        Expr::Path(self)
    }
}

impl IntoExpr for &Path {
    fn into_expr(self) -> Expr {
        Expr::Path(self.clone())
    }
}

impl IntoExpr for Param {
    fn into_expr(self) -> Expr {
        Expr::Param(self)
    }
}

impl IntoExpr for SubQuery {
    fn into_expr(self) -> Expr {
        Expr::SubQuery(self)
    }
}

impl IntoExpr for Operation {
    fn into_expr(self) -> Expr {
        self.into()
    }
}

impl<T> IntoExpr for T
where
    T: IntoValue,
{
    fn into_expr(self) -> Expr {
        Expr::constant(self)
    }
}
