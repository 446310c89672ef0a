use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::{
    error::{Error, Result},
    expr::{Expr, IntoExpr, OrderSpecifier, Param},
    value::{IntoValue, Value},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    /// Comma separated entry of the `from` list.
    Default,
    Inner,
    Left,
    Right,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinFlag {
    Fetch,
    FetchAllProperties,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    kind: JoinKind,
    target: Expr,
    condition: Option<Expr>,
    flags: Vec<JoinFlag>,
}

impl Join {
    pub fn new(kind: JoinKind, target: Expr) -> Self {
        Self {
            kind,
            target,
            condition: None,
            flags: Vec::new(),
        }
    }

    pub fn kind(&self) -> JoinKind {
        self.kind
    }

    pub fn target(&self) -> &Expr {
        &self.target
    }

    pub fn condition(&self) -> Option<&Expr> {
        self.condition.as_ref()
    }

    pub fn has_flag(&self, flag: JoinFlag) -> bool {
        self.flags.contains(&flag)
    }
}

/// Where a [`QueryFlag`] is rendered inside the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    Start,
    /// Replaces the `select ` keyword.
    StartOverride,
    AfterSelect,
    AfterProjection,
    BeforeFilters,
    AfterFilters,
    BeforeGroupBy,
    AfterGroupBy,
    BeforeHaving,
    AfterHaving,
    BeforeOrder,
    AfterOrder,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagContent {
    Text(SmolStr),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFlag {
    pub position: Position,
    pub content: FlagContent,
}

impl QueryFlag {
    pub fn text<T: Into<SmolStr>>(position: Position, text: T) -> Self {
        Self {
            position,
            content: FlagContent::Text(text.into()),
        }
    }

    pub fn expr(position: Position, expr: Expr) -> Self {
        Self {
            position,
            content: FlagContent::Expr(expr),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct QueryModifiers {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl QueryModifiers {
    pub fn new(limit: Option<u64>, offset: Option<u64>) -> Self {
        Self { limit, offset }
    }

    pub fn is_restricting(&self) -> bool {
        self.limit.is_some() || self.offset.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryMetadata {
    projection: Vec<Expr>,
    joins: Vec<Join>,
    filter: Option<Expr>,
    group_by: Vec<Expr>,
    having: Option<Expr>,
    order_by: Vec<OrderSpecifier>,
    modifiers: QueryModifiers,
    distinct: bool,
    unique: bool,
    flags: Vec<QueryFlag>,
    params: IndexMap<Param, Value>,
}

impl QueryMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default joins are placed right after the last default join already
    /// present (at the front when there is none), so the comma separated
    /// `from` entries always precede the explicit joins that may depend on
    /// them. Other joins keep insertion order.
    pub fn add_join(&mut self, kind: JoinKind, target: Expr) -> &mut Self {
        let join = Join::new(kind, target);
        if kind == JoinKind::Default {
            let index = self
                .joins
                .iter()
                .rposition(|join| join.kind == JoinKind::Default)
                .map_or(0, |last| last + 1);
            self.joins.insert(index, join);
        } else {
            self.joins.push(join);
        }
        self
    }

    /// AND a condition onto the most recently added join.
    pub fn add_join_condition(&mut self, condition: Expr) -> Result<&mut Self> {
        let join = self.joins.last_mut().ok_or(Error::MissingRoot)?;
        join.condition = Some(match join.condition.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        Ok(self)
    }

    pub fn add_join_flag(&mut self, flag: JoinFlag) -> Result<&mut Self> {
        let join = self.joins.last_mut().ok_or(Error::MissingRoot)?;
        if !join.flags.contains(&flag) {
            join.flags.push(flag);
        }
        Ok(self)
    }

    pub fn add_projection<T: IntoExpr>(&mut self, expr: T) -> &mut Self {
        self.projection.push(expr.into_expr());
        self
    }

    pub fn set_projection(&mut self, projection: Vec<Expr>) -> &mut Self {
        self.projection = projection;
        self
    }

    pub fn add_where(&mut self, predicate: Expr) -> &mut Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn add_group_by<T: IntoExpr>(&mut self, expr: T) -> &mut Self {
        self.group_by.push(expr.into_expr());
        self
    }

    pub fn add_having(&mut self, predicate: Expr) -> &mut Self {
        self.having = Some(match self.having.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn add_order_by(&mut self, order: OrderSpecifier) -> &mut Self {
        self.order_by.push(order);
        self
    }

    pub fn clear_order_by(&mut self) -> &mut Self {
        self.order_by.clear();
        self
    }

    pub fn set_modifiers(&mut self, modifiers: QueryModifiers) -> &mut Self {
        self.modifiers = modifiers;
        self
    }

    pub fn set_limit(&mut self, limit: u64) -> &mut Self {
        self.modifiers.limit = Some(limit);
        self
    }

    pub fn set_offset(&mut self, offset: u64) -> &mut Self {
        self.modifiers.offset = Some(offset);
        self
    }

    pub fn set_distinct(&mut self, distinct: bool) -> &mut Self {
        self.distinct = distinct;
        self
    }

    pub fn set_unique(&mut self, unique: bool) -> &mut Self {
        self.unique = unique;
        self
    }

    pub fn add_flag(&mut self, flag: QueryFlag) -> &mut Self {
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
        self
    }

    pub fn remove_flags_at(&mut self, position: Position) -> Vec<QueryFlag> {
        let (removed, kept) = std::mem::take(&mut self.flags)
            .into_iter()
            .partition(|flag| flag.position == position);
        self.flags = kept;
        removed
    }

    pub fn set_param<V: IntoValue>(&mut self, param: Param, value: V) -> &mut Self {
        self.params.insert(param, value.into_value());
        self
    }

    // shorthand used when building queries by hand

    pub fn from<T: IntoExpr>(&mut self, target: T) -> &mut Self {
        self.add_join(JoinKind::Default, target.into_expr())
    }

    pub fn inner_join<T: IntoExpr>(&mut self, target: T) -> &mut Self {
        self.add_join(JoinKind::Inner, target.into_expr())
    }

    pub fn left_join<T: IntoExpr>(&mut self, target: T) -> &mut Self {
        self.add_join(JoinKind::Left, target.into_expr())
    }

    pub fn right_join<T: IntoExpr>(&mut self, target: T) -> &mut Self {
        self.add_join(JoinKind::Right, target.into_expr())
    }

    pub fn full_join<T: IntoExpr>(&mut self, target: T) -> &mut Self {
        self.add_join(JoinKind::Full, target.into_expr())
    }

    pub fn projection(&self) -> &[Expr] {
        &self.projection
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn filter(&self) -> Option<&Expr> {
        self.filter.as_ref()
    }

    pub fn group_by(&self) -> &[Expr] {
        &self.group_by
    }

    pub fn having(&self) -> Option<&Expr> {
        self.having.as_ref()
    }

    pub fn order_by(&self) -> &[OrderSpecifier] {
        &self.order_by
    }

    pub fn modifiers(&self) -> QueryModifiers {
        self.modifiers
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn flags(&self) -> &[QueryFlag] {
        &self.flags
    }

    pub fn flags_at(&self, position: Position) -> impl Iterator<Item = &QueryFlag> {
        self.flags.iter().filter(move |flag| flag.position == position)
    }

    pub fn params(&self) -> &IndexMap<Param, Value> {
        &self.params
    }
}
