use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::{
    error::{Error, Result},
    expr::PathKind,
    operator::{Arity, Op, Operator},
    template::Template,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateEntry {
    pub template: Template,
    pub precedence: i32,
    /// Declared arity, only recorded for custom operators.
    pub arity: Option<Arity>,
}

#[derive(Debug, Clone, Default)]
struct Layer {
    name: SmolStr,
    entries: IndexMap<Operator, TemplateEntry>,
}

/// Operator templates as a stack of layers, most specific on top.
///
/// Layers are shared between registries that derive from each other, so a
/// dialect built on the base set only pays for its own overrides.
#[derive(Debug, Clone, Default)]
pub struct Templates {
    layers: Vec<Arc<Layer>>,
}

impl Templates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new override layer; later registrations land in it.
    pub fn layer<T: Into<SmolStr>>(&mut self, name: T) -> &mut Self {
        self.layers.push(Arc::new(Layer {
            name: name.into(),
            entries: IndexMap::new(),
        }));
        self
    }

    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|layer| layer.name.as_str())
    }

    fn top(&mut self) -> &mut Layer {
        if self.layers.is_empty() {
            self.layer("base");
        }
        let last = self.layers.len() - 1;
        Arc::make_mut(&mut self.layers[last])
    }

    pub fn register<O: Into<Operator>>(&mut self, operator: O, pattern: &str) -> Result<&mut Self> {
        let operator = operator.into();
        let precedence = operator.default_precedence();
        self.register_with_precedence(operator, pattern, precedence)
    }

    pub fn register_with_precedence<O: Into<Operator>>(
        &mut self,
        operator: O,
        pattern: &str,
        precedence: i32,
    ) -> Result<&mut Self> {
        let operator = operator.into();
        let template = Template::parse(pattern)?;
        if let Some(arity) = operator.arity() {
            check_arity(&template, arity)?;
        }
        self.top().entries.insert(
            operator,
            TemplateEntry {
                template,
                precedence,
                arity: None,
            },
        );
        Ok(self)
    }

    pub fn register_custom<T: Into<SmolStr>>(
        &mut self,
        name: T,
        arity: Arity,
        pattern: &str,
        precedence: i32,
    ) -> Result<&mut Self> {
        let template = Template::parse(pattern)?;
        check_arity(&template, arity)?;
        self.top().entries.insert(
            Operator::Custom(name.into()),
            TemplateEntry {
                template,
                precedence,
                arity: Some(arity),
            },
        );
        Ok(self)
    }

    pub fn get(&self, operator: &Operator) -> Option<&TemplateEntry> {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.entries.get(operator))
    }

    pub fn get_op(&self, op: Op) -> Option<&TemplateEntry> {
        self.get(&Operator::Op(op))
    }

    pub fn contains(&self, operator: &Operator) -> bool {
        self.get(operator).is_some()
    }

    /// Fail on the first operator without a template in any layer.
    pub fn require<I>(&self, operators: I, dialect: &str) -> Result<()>
    where
        I: IntoIterator<Item = Operator>,
    {
        for operator in operators {
            if !self.contains(&operator) {
                return Err(Error::MissingTemplate {
                    operator,
                    dialect: SmolStr::new(dialect),
                });
            }
        }
        Ok(())
    }
}

fn check_arity(template: &Template, arity: Arity) -> Result<()> {
    let out_of_range = match (template.max_index(), arity) {
        (Some(max), Arity::Exact(n)) => max >= n,
        _ => false,
    };
    let all_on_fixed = template.has_all() && matches!(arity, Arity::Exact(_));
    if out_of_range || all_on_fixed {
        return Err(Error::InvalidTemplate {
            pattern: SmolStr::new(template.pattern()),
            reason: "argument slot outside the operator's arity",
        });
    }
    Ok(())
}

/// Every operator a query dialect must render, whatever its family.
pub(crate) fn core_operators() -> impl Iterator<Item = Operator> {
    [
        Op::Eq,
        Op::Ne,
        Op::Lt,
        Op::Gt,
        Op::Loe,
        Op::Goe,
        Op::In,
        Op::NotIn,
        Op::IsNull,
        Op::IsNotNull,
        Op::And,
        Op::Or,
        Op::Not,
        Op::Like,
        Op::Count,
        Op::CountDistinct,
        Op::Alias,
        Op::List,
    ]
    .into_iter()
    .map(Operator::Op)
    .chain([PathKind::Variable, PathKind::Property].map(Operator::Path))
}
