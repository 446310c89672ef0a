use std::fmt::Write;

use smol_str::SmolStr;

use crate::{
    dialect::{Family, ListStyle},
    error::{Error, Result},
    expr::{Constant, Expr, Path, PathElement, PathKind},
    operator::Operator,
    value::Value,
    writer::{Binding, FormatContext, FormatWriter},
};

use super::{operation::visit_operation, query::write_query};

impl FormatWriter for Expr {
    fn format_writer<W: Write>(&self, ctx: &mut FormatContext<'_, W>) -> Result<()> {
        match self {
            Expr::Constant(constant) => visit_constant(ctx, constant),
            Expr::Path(path) => path.format_writer(ctx),
            Expr::Operation(operation) => {
                visit_operation(ctx, operation.ty(), operation.operator(), operation.args())
            }
            Expr::Param(param) => ctx.write_placeholder(Binding::Param(param.clone())),
            Expr::SubQuery(sub) => {
                ctx.write_str("(")?;
                write_query(ctx, sub.metadata(), false, None)?;
                ctx.write_str(")")
            }
            Expr::Factory(factory) => {
                let wrap = !ctx.in_projection;
                if wrap {
                    ctx.write_str("(")?;
                }
                ctx.write_list(", ", factory.args())?;
                if wrap {
                    ctx.write_str(")")?;
                }
                Ok(())
            }
            Expr::Template(template) => ctx.apply_template(template.template(), -1, template.args()),
        }
    }
}

fn bind_constant<W: Write>(ctx: &mut FormatContext<'_, W>, constant: &Constant) -> Result<()> {
    ctx.write_typed_placeholder(Binding::Value(constant.value().clone()), constant.ty().clone())
}

fn visit_constant<W: Write>(ctx: &mut FormatContext<'_, W>, constant: &Constant) -> Result<()> {
    let Value::List(items) = constant.value() else {
        return bind_constant(ctx, constant);
    };
    match ctx.dialect.list_style() {
        ListStyle::Bare => bind_constant(ctx, constant),
        ListStyle::Wrapped => {
            ctx.write_str("(")?;
            bind_constant(ctx, constant)?;
            ctx.write_str(")")
        }
        ListStyle::Expanded => {
            ctx.write_str("(")?;
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    ctx.write_str(", ")?;
                }
                ctx.write_placeholder(Binding::Value(item.clone()))?;
            }
            ctx.write_str(")")
        }
    }
}

/// Name a property renders under: the mapped column in SQL, the property itself otherwise.
fn property_name<W: Write>(ctx: &FormatContext<'_, W>, parent: &Path, name: &str) -> SmolStr {
    if ctx.dialect.family() == Family::Sql {
        if let Some(column) = ctx
            .metamodel
            .property(parent.ty(), name)
            .and_then(|info| info.column)
        {
            return column;
        }
    }
    SmolStr::new(name)
}

impl FormatWriter for Path {
    fn format_writer<W: Write>(&self, ctx: &mut FormatContext<'_, W>) -> Result<()> {
        let wrap = ctx.wrap_elements
            && self.ty().is_collection_like()
            && self.kind() == PathKind::Property;

        let parent = || -> Result<Expr> {
            self.parent()
                .cloned()
                .map(Expr::Path)
                .ok_or_else(|| Error::invalid("element access without a parent path"))
        };
        let args = match self.element() {
            PathElement::Variable(name) => vec![Expr::constant(ctx.quote_ident(name))],
            PathElement::Property(name) => {
                let column = match self.parent() {
                    Some(owner) => property_name(ctx, owner, name),
                    None => name.clone(),
                };
                vec![parent()?, Expr::constant(ctx.quote_ident(&column))]
            }
            PathElement::ListValue(index) | PathElement::MapValue(index) => {
                vec![parent()?, index.clone()]
            }
            PathElement::ListValueConstant(index) => {
                vec![parent()?, Expr::constant(i64::try_from(*index).unwrap_or(i64::MAX))]
            }
            PathElement::MapValueConstant(key) => {
                vec![parent()?, Expr::Constant(Constant::new(key.clone()))]
            }
            PathElement::CollectionAny => vec![parent()?],
        };

        let operator = Operator::Path(self.kind());
        let dialect = ctx.dialect;
        let entry = dialect
            .templates()
            .get(&operator)
            .ok_or_else(|| Error::MissingTemplate {
                operator: operator.clone(),
                dialect: SmolStr::new(dialect.name()),
            })?;

        let old = ctx.wrap_elements;
        ctx.wrap_elements = false;
        if wrap {
            ctx.write_str("elements(")?;
        }
        let result = ctx.apply_template(&entry.template, entry.precedence, &args);
        ctx.wrap_elements = old;
        result?;
        if wrap {
            ctx.write_str(")")?;
        }
        Ok(())
    }
}

/// `<EntityName> ` in front of a root source, then the source itself.
pub(crate) fn write_join_target<W: Write>(ctx: &mut FormatContext<'_, W>, target: &Expr) -> Result<()> {
    if let Expr::Path(path) = target {
        if path.is_root() && path.ty().is_entity() {
            let info = ctx.metamodel.entity(path.ty()).unwrap_or_default();
            let type_name = path.ty().simple_name();
            match ctx.dialect.family() {
                Family::Jpql => {
                    let name = info.name.unwrap_or(type_name);
                    ctx.write_str(&name)?;
                }
                Family::Sql => {
                    let name = info.table.or(info.name).unwrap_or(type_name);
                    ctx.write_table(&name)?;
                }
            }
            ctx.write_str(" ")?;
        }
    }
    target.format_writer(ctx)
}
