use smol_str::SmolStr;

use crate::{operator::Op, value::ValueType};

use super::{
    CaseBuilder, Expr, IntoExpr, Operation, OrderSpecifier, Path, SimpleCaseBuilder,
    order::Order,
};

fn unary(ty: ValueType, op: Op, arg: &Expr) -> Expr {
    Operation::of(ty, op, vec![arg.clone()]).into()
}

fn binary<T: IntoExpr>(ty: ValueType, op: Op, lhs: &Expr, rhs: T) -> Expr {
    Operation::of(ty, op, vec![lhs.clone(), rhs.into_expr()]).into()
}

impl Expr {
    // comparison

    pub fn eq<T: IntoExpr>(&self, other: T) -> Expr {
        binary(ValueType::Bool, Op::Eq, self, other)
    }

    pub fn ne<T: IntoExpr>(&self, other: T) -> Expr {
        binary(ValueType::Bool, Op::Ne, self, other)
    }

    pub fn lt<T: IntoExpr>(&self, other: T) -> Expr {
        binary(ValueType::Bool, Op::Lt, self, other)
    }

    pub fn gt<T: IntoExpr>(&self, other: T) -> Expr {
        binary(ValueType::Bool, Op::Gt, self, other)
    }

    pub fn loe<T: IntoExpr>(&self, other: T) -> Expr {
        binary(ValueType::Bool, Op::Loe, self, other)
    }

    pub fn goe<T: IntoExpr>(&self, other: T) -> Expr {
        binary(ValueType::Bool, Op::Goe, self, other)
    }

    pub fn between<L: IntoExpr, H: IntoExpr>(&self, low: L, high: H) -> Expr {
        Operation::of(
            ValueType::Bool,
            Op::Between,
            vec![self.clone(), low.into_expr(), high.into_expr()],
        )
        .into()
    }

    /// Membership in a constant collection, a sub-query or a collection path.
    pub fn is_in<T: IntoExpr>(&self, values: T) -> Expr {
        binary(ValueType::Bool, Op::In, self, values)
    }

    pub fn not_in<T: IntoExpr>(&self, values: T) -> Expr {
        binary(ValueType::Bool, Op::NotIn, self, values)
    }

    pub fn is_null(&self) -> Expr {
        unary(ValueType::Bool, Op::IsNull, self)
    }

    pub fn is_not_null(&self) -> Expr {
        unary(ValueType::Bool, Op::IsNotNull, self)
    }

    pub fn eq_ignore_case<T: IntoExpr>(&self, other: T) -> Expr {
        binary(ValueType::Bool, Op::EqIgnoreCase, self, other)
    }

    pub fn instance_of(&self, ty: ValueType) -> Expr {
        binary(ValueType::Bool, Op::InstanceOf, self, ty)
    }

    pub fn type_of(&self) -> Expr {
        unary(ValueType::Type, Op::TypeOf, self)
    }

    // boolean

    pub fn and<T: IntoExpr>(&self, other: T) -> Expr {
        binary(ValueType::Bool, Op::And, self, other)
    }

    pub fn or<T: IntoExpr>(&self, other: T) -> Expr {
        binary(ValueType::Bool, Op::Or, self, other)
    }

    pub fn not(&self) -> Expr {
        unary(ValueType::Bool, Op::Not, self)
    }

    // arithmetic

    pub fn add<T: IntoExpr>(&self, other: T) -> Expr {
        binary(self.ty().clone(), Op::Add, self, other)
    }

    pub fn sub<T: IntoExpr>(&self, other: T) -> Expr {
        binary(self.ty().clone(), Op::Sub, self, other)
    }

    pub fn mul<T: IntoExpr>(&self, other: T) -> Expr {
        binary(self.ty().clone(), Op::Mult, self, other)
    }

    pub fn div<T: IntoExpr>(&self, other: T) -> Expr {
        binary(self.ty().clone(), Op::Div, self, other)
    }

    pub fn modulo<T: IntoExpr>(&self, other: T) -> Expr {
        binary(self.ty().clone(), Op::Mod, self, other)
    }

    pub fn negate(&self) -> Expr {
        unary(self.ty().clone(), Op::Negate, self)
    }

    pub fn abs(&self) -> Expr {
        unary(self.ty().clone(), Op::Abs, self)
    }

    pub fn sqrt(&self) -> Expr {
        unary(ValueType::F64, Op::Sqrt, self)
    }

    // strings

    pub fn concat<T: IntoExpr>(&self, other: T) -> Expr {
        binary(ValueType::String, Op::Concat, self, other)
    }

    pub fn lower(&self) -> Expr {
        unary(ValueType::String, Op::Lower, self)
    }

    pub fn upper(&self) -> Expr {
        unary(ValueType::String, Op::Upper, self)
    }

    pub fn trim(&self) -> Expr {
        unary(ValueType::String, Op::Trim, self)
    }

    pub fn length(&self) -> Expr {
        unary(ValueType::I32, Op::Length, self)
    }

    /// Zero based substring from `start` to the end.
    pub fn substring<T: IntoExpr>(&self, start: T) -> Expr {
        binary(ValueType::String, Op::Substr1Arg, self, start)
    }

    /// Zero based substring over `start..end`.
    pub fn substring_range<S: IntoExpr, E: IntoExpr>(&self, start: S, end: E) -> Expr {
        Operation::of(
            ValueType::String,
            Op::Substr2Args,
            vec![self.clone(), start.into_expr(), end.into_expr()],
        )
        .into()
    }

    pub fn locate<T: IntoExpr>(&self, needle: T) -> Expr {
        Operation::of(ValueType::I32, Op::Locate, vec![needle.into_expr(), self.clone()]).into()
    }

    pub fn is_empty_string(&self) -> Expr {
        unary(ValueType::Bool, Op::StringIsEmpty, self)
    }

    pub fn like<T: IntoExpr>(&self, pattern: T) -> Expr {
        binary(ValueType::Bool, Op::Like, self, pattern)
    }

    pub fn matches<T: IntoExpr>(&self, regex: T) -> Expr {
        binary(ValueType::Bool, Op::Matches, self, regex)
    }

    pub fn starts_with<T: IntoExpr>(&self, prefix: T) -> Expr {
        binary(ValueType::Bool, Op::StartsWith, self, prefix)
    }

    pub fn starts_with_ignore_case<T: IntoExpr>(&self, prefix: T) -> Expr {
        binary(ValueType::Bool, Op::StartsWithIc, self, prefix)
    }

    pub fn ends_with<T: IntoExpr>(&self, suffix: T) -> Expr {
        binary(ValueType::Bool, Op::EndsWith, self, suffix)
    }

    pub fn ends_with_ignore_case<T: IntoExpr>(&self, suffix: T) -> Expr {
        binary(ValueType::Bool, Op::EndsWithIc, self, suffix)
    }

    pub fn contains<T: IntoExpr>(&self, needle: T) -> Expr {
        binary(ValueType::Bool, Op::StringContains, self, needle)
    }

    pub fn contains_ignore_case<T: IntoExpr>(&self, needle: T) -> Expr {
        binary(ValueType::Bool, Op::StringContainsIc, self, needle)
    }

    pub fn string_value(&self) -> Expr {
        unary(ValueType::String, Op::StringCast, self)
    }

    // collections and maps

    pub fn is_empty(&self) -> Expr {
        let op = match self.ty() {
            ValueType::Map(_, _) => Op::MapIsEmpty,
            _ => Op::ColIsEmpty,
        };
        unary(ValueType::Bool, op, self)
    }

    pub fn is_not_empty(&self) -> Expr {
        self.is_empty().not()
    }

    pub fn size(&self) -> Expr {
        let op = match self.ty() {
            ValueType::Map(_, _) => Op::MapSize,
            _ => Op::ColSize,
        };
        unary(ValueType::I32, op, self)
    }

    pub fn contains_key<T: IntoExpr>(&self, key: T) -> Expr {
        binary(ValueType::Bool, Op::ContainsKey, self, key)
    }

    pub fn contains_value<T: IntoExpr>(&self, value: T) -> Expr {
        binary(ValueType::Bool, Op::ContainsValue, self, value)
    }

    // quantified comparisons against a sub-query or collection

    pub fn eq_any<T: IntoExpr>(&self, values: T) -> Expr {
        let values = values.into_expr();
        self.eq(unary(values.ty().clone(), Op::Any, &values))
    }

    pub fn ne_any<T: IntoExpr>(&self, values: T) -> Expr {
        let values = values.into_expr();
        self.ne(unary(values.ty().clone(), Op::Any, &values))
    }

    pub fn gt_all<T: IntoExpr>(&self, values: T) -> Expr {
        let values = values.into_expr();
        self.gt(unary(values.ty().clone(), Op::All, &values))
    }

    pub fn lt_all<T: IntoExpr>(&self, values: T) -> Expr {
        let values = values.into_expr();
        self.lt(unary(values.ty().clone(), Op::All, &values))
    }

    pub fn gt_avg<T: IntoExpr>(&self, values: T) -> Expr {
        let values = values.into_expr();
        self.gt(unary(ValueType::F64, Op::AvgInCol, &values))
    }

    // aggregates

    pub fn count(&self) -> Expr {
        unary(ValueType::I64, Op::Count, self)
    }

    pub fn count_distinct(&self) -> Expr {
        unary(ValueType::I64, Op::CountDistinct, self)
    }

    pub fn count_all() -> Expr {
        Operation::of(ValueType::I64, Op::CountAll, Vec::new()).into()
    }

    pub fn sum(&self) -> Expr {
        unary(self.ty().clone(), Op::Sum, self)
    }

    pub fn avg(&self) -> Expr {
        unary(ValueType::F64, Op::Avg, self)
    }

    pub fn min(&self) -> Expr {
        unary(self.ty().clone(), Op::Min, self)
    }

    pub fn max(&self) -> Expr {
        unary(self.ty().clone(), Op::Max, self)
    }

    // date and time

    pub fn current_date() -> Expr {
        Operation::of(ValueType::Date, Op::CurrentDate, Vec::new()).into()
    }

    pub fn current_timestamp() -> Expr {
        Operation::of(ValueType::DateTime, Op::CurrentTimestamp, Vec::new()).into()
    }

    pub fn year(&self) -> Expr {
        unary(ValueType::I32, Op::Year, self)
    }

    pub fn month(&self) -> Expr {
        unary(ValueType::I32, Op::Month, self)
    }

    pub fn day_of_month(&self) -> Expr {
        unary(ValueType::I32, Op::DayOfMonth, self)
    }

    pub fn add_days<T: IntoExpr>(&self, days: T) -> Expr {
        binary(self.ty().clone(), Op::AddDays, self, days)
    }

    pub fn random() -> Expr {
        Operation::of(ValueType::F64, Op::Random, Vec::new()).into()
    }

    // casts, case and misc

    /// Numeric conversion rendered as a cast to the dialect's type name.
    pub fn num_cast(&self, ty: ValueType) -> Expr {
        binary(ty.clone(), Op::NumCast, self, ty)
    }

    pub fn coalesce<I, T>(&self, others: I) -> Expr
    where
        I: IntoIterator<Item = T>,
        T: IntoExpr,
    {
        let mut args = vec![self.clone()];
        args.extend(others.into_iter().map(IntoExpr::into_expr));
        if args.len() < 2 {
            return self.clone();
        }
        Operation::of(self.ty().clone(), Op::Coalesce, args).into()
    }

    pub fn alias<T: Into<SmolStr>>(&self, name: T) -> Expr {
        let alias = Path::variable(self.ty().clone(), name);
        binary(self.ty().clone(), Op::Alias, self, alias)
    }

    pub fn case() -> CaseBuilder {
        CaseBuilder::default()
    }

    pub fn when<T: IntoExpr>(&self, value: T) -> super::SimpleCaseWhen {
        SimpleCaseBuilder::new(self.clone()).when(value)
    }

    pub fn asc(&self) -> OrderSpecifier {
        OrderSpecifier::new(self.clone(), Order::Asc)
    }

    pub fn desc(&self) -> OrderSpecifier {
        OrderSpecifier::new(self.clone(), Order::Desc)
    }
}

/// AND of all predicates, `None` when there are none.
pub fn all_of<I: IntoIterator<Item = Expr>>(predicates: I) -> Option<Expr> {
    predicates.into_iter().reduce(|acc, next| acc.and(next))
}

/// OR of all predicates, `None` when there are none.
pub fn any_of<I: IntoIterator<Item = Expr>>(predicates: I) -> Option<Expr> {
    predicates.into_iter().reduce(|acc, next| acc.or(next))
}

#[cfg(test)]
mod tests {
    use crate::operator::Operator;

    use super::*;

    #[test]
    fn test_builds_operations() {
        let cat = Path::entity("Cat", "cat");
        let weight: Expr = cat.get("weight", ValueType::I32).into();
        let expr = weight.gt(3).and(weight.lt(10));
        let op = expr.as_operation().unwrap();
        assert_eq!(&Operator::Op(Op::And), op.operator());
        assert_eq!(2, op.args().len());
        assert_eq!(&ValueType::Bool, expr.ty());
        assert_eq!(&ValueType::I32, weight.add(1).ty());
    }

    #[test]
    fn test_case_chain() {
        let weight: Expr = Path::entity("Cat", "cat").get("weight", ValueType::I32).into();
        let expr = Expr::case()
            .when(weight.lt(2))
            .then("small")
            .when(weight.lt(5))
            .then("medium")
            .otherwise("large");
        let case = expr.as_operation().unwrap();
        assert_eq!(Some(Op::Case), case.op());
        assert_eq!(&ValueType::String, expr.ty());
        let first = case.arg(0).and_then(Expr::as_operation).unwrap();
        assert_eq!(Some(Op::CaseWhen), first.op());
        let second = first.arg(2).and_then(Expr::as_operation).unwrap();
        assert_eq!(Some(Op::CaseWhen), second.op());
        let otherwise = second.arg(2).and_then(Expr::as_operation).unwrap();
        assert_eq!(Some(Op::CaseElse), otherwise.op());
    }

    #[test]
    fn test_fold_predicates() {
        let a: Expr = Path::variable(ValueType::Bool, "a").into();
        let b: Expr = Path::variable(ValueType::Bool, "b").into();
        assert_eq!(Some(a.and(b.clone())), all_of([a.clone(), b.clone()]));
        assert_eq!(Some(a.clone()), any_of([a]));
        assert_eq!(None, all_of(Vec::new()));
    }
}
