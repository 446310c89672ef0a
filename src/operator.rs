use std::fmt;

use qforge_derive::Operator;
use smol_str::SmolStr;

use crate::expr::PathKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// Built-in operators shared by every dialect.
///
/// Precedence is the default used when a dialect registers a template without
/// an explicit one: an argument whose operator binds looser (higher number)
/// than the enclosing template's is parenthesized. `-1` never wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Operator)]
pub enum Op {
    // comparison
    #[op(arity = 2, precedence = 18)]
    Eq,
    #[op(arity = 2, precedence = 18)]
    Ne,
    #[op(arity = 2, precedence = 20)]
    Lt,
    #[op(arity = 2, precedence = 20)]
    Gt,
    #[op(arity = 2, precedence = 20)]
    Loe,
    #[op(arity = 2, precedence = 20)]
    Goe,
    #[op(arity = 3, precedence = 20)]
    Between,
    #[op(arity = 2, precedence = 20)]
    In,
    #[op(arity = 2, precedence = 20)]
    NotIn,
    #[op(arity = 1, precedence = 20)]
    IsNull,
    #[op(arity = 1, precedence = 20)]
    IsNotNull,
    #[op(arity = 2, precedence = 18)]
    EqIgnoreCase,

    // boolean
    #[op(arity = 2, precedence = 36)]
    And,
    #[op(arity = 2, precedence = 38)]
    Or,
    #[op(arity = 1, precedence = 35)]
    Not,

    // arithmetic
    #[op(arity = 2, precedence = 13)]
    Add,
    #[op(arity = 2, precedence = 13)]
    Sub,
    #[op(arity = 2, precedence = 12)]
    Mult,
    #[op(arity = 2, precedence = 12)]
    Div,
    #[op(arity = 2)]
    Mod,
    #[op(arity = 1, precedence = 10)]
    Negate,

    // string
    #[op(arity = 2, precedence = 14)]
    Concat,
    #[op(arity = 1)]
    Lower,
    #[op(arity = 1)]
    Upper,
    #[op(arity = 1)]
    Trim,
    #[op(arity = 1)]
    Length,
    #[op(arity = 2, precedence = 12)]
    Substr1Arg,
    #[op(arity = 3, precedence = 12)]
    Substr2Args,
    #[op(arity = 2)]
    Locate,
    #[op(arity = 1, precedence = 18)]
    StringIsEmpty,
    #[op(arity = 2, precedence = 20)]
    Like,
    #[op(arity = 2, precedence = 20)]
    Matches,
    #[op(arity = 2, precedence = 20)]
    MatchesIc,
    #[op(arity = 2, precedence = 20)]
    StartsWith,
    #[op(arity = 2, precedence = 20)]
    StartsWithIc,
    #[op(arity = 2, precedence = 20)]
    EndsWith,
    #[op(arity = 2, precedence = 20)]
    EndsWithIc,
    #[op(arity = 2, precedence = 20)]
    StringContains,
    #[op(arity = 2, precedence = 20)]
    StringContainsIc,

    // collections and maps
    #[op(arity = 1, precedence = 20)]
    ColIsEmpty,
    #[op(arity = 1)]
    ColSize,
    #[op(arity = 1, precedence = 20)]
    MapIsEmpty,
    #[op(arity = 1)]
    MapSize,
    #[op(arity = 2, precedence = 20)]
    ContainsKey,
    #[op(arity = 2, precedence = 20)]
    ContainsValue,
    #[op(arity = 2, precedence = 20)]
    MemberOf,
    #[op(arity = 2, precedence = 20)]
    NotMemberOf,

    // quantified and sub-query
    #[op(arity = 1)]
    Any,
    #[op(arity = 1)]
    All,
    #[op(arity = 1)]
    AvgInCol,
    #[op(arity = 1)]
    MaxInCol,
    #[op(arity = 1)]
    MinInCol,
    #[op(arity = 1)]
    Exists,

    // aggregates
    #[op(arity = 1)]
    Count,
    #[op(arity = 1)]
    CountDistinct,
    #[op(arity = 0)]
    CountAll,
    #[op(arity = 1)]
    Sum,
    #[op(arity = 1)]
    Avg,
    #[op(arity = 1)]
    Min,
    #[op(arity = 1)]
    Max,

    // date and time
    #[op(arity = 0)]
    CurrentDate,
    #[op(arity = 0)]
    CurrentTime,
    #[op(arity = 0)]
    CurrentTimestamp,
    #[op(arity = 1)]
    Year,
    #[op(arity = 1)]
    Month,
    #[op(arity = 1)]
    DayOfMonth,
    #[op(arity = 1)]
    Hour,
    #[op(arity = 1)]
    Minute,
    #[op(arity = 1)]
    Second,
    #[op(arity = 2)]
    AddDays,
    #[op(arity = 2)]
    AddMonths,
    #[op(arity = 2)]
    AddYears,
    #[op(arity = 2)]
    DiffDays,

    // math
    #[op(arity = 1)]
    Abs,
    #[op(arity = 1)]
    Sqrt,
    #[op(arity = 1)]
    Round,
    #[op(arity = 1)]
    Ceil,
    #[op(arity = 1)]
    Floor,
    #[op(arity = 2)]
    Power,
    #[op(arity = 1)]
    Ln,
    #[op(arity = 2)]
    Log,
    #[op(arity = 0)]
    Random,

    // casts and types
    #[op(arity = 2)]
    Cast,
    #[op(arity = 2)]
    NumCast,
    #[op(arity = 1)]
    StringCast,
    #[op(arity = 2, precedence = 18)]
    InstanceOf,
    #[op(arity = 1)]
    TypeOf,

    // case
    #[op(arity = 1)]
    Case,
    #[op(arity = 3, precedence = 0)]
    CaseWhen,
    #[op(arity = 1)]
    CaseElse,
    #[op(arity = 2)]
    CaseEq,
    #[op(arity = 4, precedence = 0)]
    CaseEqWhen,
    #[op(arity = 1)]
    CaseEqElse,
    #[op(min_arity = 2)]
    Coalesce,

    // misc
    #[op(arity = 2)]
    List,
    #[op(arity = 2)]
    Alias,
    #[op(arity = 1)]
    Wrapped,
    #[op(arity = 1)]
    Nextval,
}

impl Op {
    /// Operators whose constant arguments are coerced to the typed argument's width.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Op::Add | Op::Sub | Op::Mult | Op::Div | Op::Lt | Op::Loe | Op::Gt | Op::Goe | Op::Between
        )
    }
}

/// Key of the template registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Op(Op),
    Path(PathKind),
    Custom(SmolStr),
}

impl Operator {
    pub fn custom<T: Into<SmolStr>>(name: T) -> Self {
        Self::Custom(name.into())
    }

    /// Arity of built-in operators; custom operators declare theirs on registration.
    pub fn arity(&self) -> Option<Arity> {
        match self {
            Operator::Op(op) => Some(op.arity()),
            Operator::Path(kind) => Some(kind.arity()),
            Operator::Custom(_) => None,
        }
    }

    pub fn default_precedence(&self) -> i32 {
        match self {
            Operator::Op(op) => op.precedence(),
            Operator::Path(_) | Operator::Custom(_) => -1,
        }
    }

    pub fn as_op(&self) -> Option<Op> {
        match self {
            Operator::Op(op) => Some(*op),
            _ => None,
        }
    }
}

impl From<Op> for Operator {
    fn from(value: Op) -> Self {
        Self::Op(value)
    }
}

impl From<PathKind> for Operator {
    fn from(value: PathKind) -> Self {
        Self::Path(value)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Op(op) => f.write_str(op.name()),
            Operator::Path(kind) => write!(f, "PATH_{}", kind.name()),
            Operator::Custom(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_metadata() {
        assert_eq!(Arity::Exact(3), Op::Between.arity());
        assert_eq!(Arity::AtLeast(2), Op::Coalesce.arity());
        assert_eq!(-1, Op::Lower.precedence());
        assert!(Op::And.precedence() < Op::Or.precedence());
        assert_eq!("STRING_CONTAINS_IC", Op::StringContainsIc.name());
        assert!(Op::ALL.contains(&Op::NumCast));
    }

    #[test]
    fn test_display() {
        assert_eq!("EQ", Operator::Op(Op::Eq).to_string());
        assert_eq!("PATH_PROPERTY", Operator::Path(PathKind::Property).to_string());
        assert_eq!("at least 2", Arity::AtLeast(2).to_string());
    }
}
