use super::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NullHandling {
    #[default]
    Default,
    NullsFirst,
    NullsLast,
}

/// One `order by` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderSpecifier {
    target: Expr,
    order: Order,
    nulls: NullHandling,
}

impl OrderSpecifier {
    pub fn new(target: Expr, order: Order) -> Self {
        Self {
            target,
            order,
            nulls: NullHandling::Default,
        }
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = NullHandling::NullsFirst;
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = NullHandling::NullsLast;
        self
    }

    pub fn target(&self) -> &Expr {
        &self.target
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn nulls(&self) -> NullHandling {
        self.nulls
    }
}
