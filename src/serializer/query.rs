use std::fmt::Write;

use tracing::trace;

use crate::{
    dialect::{Family, Pagination, PaginationTemplates},
    error::{Error, Result},
    expr::{Expr, NullHandling, Order, OrderSpecifier, Path, TemplateExpr},
    metadata::{FlagContent, Join, JoinFlag, JoinKind, Position, QueryFlag, QueryMetadata, QueryModifiers},
    template::Template,
    value::ValueType,
    writer::{FormatContext, FormatWriter},
};

use super::visit::write_join_target;

/// Row source of an insert or merge.
#[derive(Debug, Clone, Copy)]
pub enum InsertSource<'q> {
    /// One parenthesized tuple per row.
    Values(&'q [Vec<Expr>]),
    Query(&'q QueryMetadata),
}

fn count_constant(n: u64) -> Expr {
    Expr::constant(i64::try_from(n).unwrap_or(i64::MAX))
}

pub(crate) fn write_query<W: Write>(
    ctx: &mut FormatContext<'_, W>,
    md: &QueryMetadata,
    for_count: bool,
    projection: Option<&str>,
) -> Result<()> {
    let dialect = ctx.dialect;
    match dialect.pagination() {
        Pagination::TopRowNumber { top, filter }
            if !for_count && !md.joins().is_empty() && md.modifiers().is_restricting() =>
        {
            write_row_numbered(ctx, md, projection, top, filter)
        }
        _ => write_select(ctx, md, for_count, projection),
    }
}

fn write_flags<'f, W: Write, I>(ctx: &mut FormatContext<'_, W>, flags: I) -> Result<()>
where
    I: IntoIterator<Item = &'f QueryFlag>,
{
    for flag in flags {
        match &flag.content {
            FlagContent::Text(text) => ctx.write_str(text)?,
            FlagContent::Expr(expr) => expr.format_writer(ctx)?,
        }
    }
    Ok(())
}

fn write_select<W: Write>(
    ctx: &mut FormatContext<'_, W>,
    md: &QueryMetadata,
    for_count: bool,
    projection: Option<&str>,
) -> Result<()> {
    let family = ctx.dialect.family();
    let joins = md.joins();
    if family == Family::Jpql && joins.is_empty() {
        return Err(Error::MissingRoot);
    }

    // a sub-query starts outside of any enclosing collection operator
    let old_projection = ctx.in_projection;
    let old_wrap = std::mem::replace(&mut ctx.wrap_elements, false);
    write_flags(ctx, md.flags_at(Position::Start))?;
    ctx.in_projection = true;
    if let Some(projection) = projection {
        ctx.write_str("select ")?;
        ctx.write_str(projection)?;
    } else if for_count {
        ctx.write_str(if md.is_distinct() {
            "select count(distinct "
        } else {
            "select count("
        })?;
        write_count_target(ctx, md)?;
        ctx.write_str(")")?;
    } else {
        let mut overrides = md.flags_at(Position::StartOverride).peekable();
        if overrides.peek().is_some() {
            write_flags(ctx, overrides)?;
        } else {
            ctx.write_str(if md.is_distinct() { "select distinct " } else { "select " })?;
        }
        write_flags(ctx, md.flags_at(Position::AfterSelect))?;
        if !md.projection().is_empty() {
            ctx.write_list(", ", md.projection())?;
        } else if family == Family::Sql {
            ctx.write_str("*")?;
        } else {
            joins[0].target().format_writer(ctx)?;
        }
    }
    write_flags(ctx, md.flags_at(Position::AfterProjection))?;
    ctx.in_projection = false;

    if !joins.is_empty() {
        ctx.write_str("\nfrom ")?;
        write_sources(ctx, joins, for_count)?;
    }

    write_flags(ctx, md.flags_at(Position::BeforeFilters))?;
    if let Some(filter) = md.filter() {
        ctx.write_str("\nwhere ")?;
        filter.format_writer(ctx)?;
    }
    write_flags(ctx, md.flags_at(Position::AfterFilters))?;

    write_flags(ctx, md.flags_at(Position::BeforeGroupBy))?;
    if !md.group_by().is_empty() {
        ctx.write_str("\ngroup by ")?;
        ctx.write_list(", ", md.group_by())?;
    }
    write_flags(ctx, md.flags_at(Position::AfterGroupBy))?;

    write_flags(ctx, md.flags_at(Position::BeforeHaving))?;
    if let Some(having) = md.having() {
        ctx.write_str("\nhaving ")?;
        having.format_writer(ctx)?;
    }
    write_flags(ctx, md.flags_at(Position::AfterHaving))?;

    if !for_count {
        write_flags(ctx, md.flags_at(Position::BeforeOrder))?;
        if !md.order_by().is_empty() {
            ctx.write_str("\norder by ")?;
            write_order(ctx, md.order_by())?;
        }
        write_flags(ctx, md.flags_at(Position::AfterOrder))?;
        write_limits(ctx, md.modifiers())?;
    }

    write_flags(ctx, md.flags_at(Position::End))?;
    ctx.in_projection = old_projection;
    ctx.wrap_elements = old_wrap;
    Ok(())
}

fn write_count_target<W: Write>(ctx: &mut FormatContext<'_, W>, md: &QueryMetadata) -> Result<()> {
    let projection = md.projection();
    let count_source = projection.first().is_none_or(|first| matches!(first, Expr::Factory(_)));
    match ctx.dialect.family() {
        Family::Jpql if count_source => {
            let root = md.joins().first().ok_or(Error::MissingRoot)?;
            root.target().format_writer(ctx)
        }
        Family::Sql if projection.is_empty() => ctx.write_str("*"),
        _ => ctx.write_list(", ", projection),
    }
}

fn write_sources<W: Write>(ctx: &mut FormatContext<'_, W>, joins: &[Join], for_count: bool) -> Result<()> {
    let dialect = ctx.dialect;
    let jpql = dialect.family() == Family::Jpql;
    let keywords = dialect.join_keywords();
    for (index, join) in joins.iter().enumerate() {
        if index > 0 {
            let keyword = match join.kind() {
                JoinKind::Default => &keywords.default,
                JoinKind::Inner => &keywords.inner,
                JoinKind::Left => &keywords.left,
                JoinKind::Right => &keywords.right,
                JoinKind::Full => &keywords.full,
            };
            ctx.write_str(keyword)?;
        }
        if jpql && !for_count && join.has_flag(JoinFlag::Fetch) {
            ctx.write_str("fetch ")?;
        }
        write_join_target(ctx, join.target())?;
        if jpql && !for_count && join.has_flag(JoinFlag::FetchAllProperties) {
            ctx.write_str(" fetch all properties")?;
        }
        if let Some(condition) = join.condition() {
            ctx.write_str(if ctx.dialect.capabilities().with_for_on {
                " with "
            } else {
                " on "
            })?;
            condition.format_writer(ctx)?;
        }
    }
    Ok(())
}

fn write_order<W: Write>(ctx: &mut FormatContext<'_, W>, order_by: &[OrderSpecifier]) -> Result<()> {
    let nulls_ordering = ctx.dialect.capabilities().nulls_ordering;
    for (index, order) in order_by.iter().enumerate() {
        if index > 0 {
            ctx.write_str(", ")?;
        }
        order.target().format_writer(ctx)?;
        ctx.write_str(match order.order() {
            Order::Asc => " asc",
            Order::Desc => " desc",
        })?;
        if nulls_ordering {
            match order.nulls() {
                NullHandling::Default => {}
                NullHandling::NullsFirst => ctx.write_str(" nulls first")?,
                NullHandling::NullsLast => ctx.write_str(" nulls last")?,
            }
        }
    }
    Ok(())
}

fn write_limits<W: Write>(ctx: &mut FormatContext<'_, W>, modifiers: QueryModifiers) -> Result<()> {
    let dialect = ctx.dialect;
    let templates = match dialect.pagination() {
        Pagination::LimitOffset(templates) | Pagination::FetchFirst(templates) => templates,
        Pagination::External | Pagination::TopRowNumber { .. } => return Ok(()),
    };
    match (modifiers.limit, modifiers.offset) {
        (Some(limit), None) => ctx.apply_template(&templates.limit, -1, &[count_constant(limit)]),
        (None, Some(offset)) => ctx.apply_template(&templates.offset, -1, &[count_constant(offset)]),
        (Some(limit), Some(offset)) => ctx.apply_template(
            &templates.limit_offset,
            -1,
            &[count_constant(limit), count_constant(offset)],
        ),
        (None, None) => Ok(()),
    }
}

/// `row_number() over (order by ..)` matching the query's own ordering.
fn row_number(order_by: &[OrderSpecifier], nulls_ordering: bool) -> Result<Expr> {
    if order_by.is_empty() {
        return Ok(TemplateExpr::new(ValueType::I64, "row_number() over ()", Vec::new())?.into());
    }
    let mut pattern = String::from("row_number() over (order by ");
    for (index, order) in order_by.iter().enumerate() {
        if index > 0 {
            pattern.push_str(", ");
        }
        pattern.push_str(&format!("{{{index}}}"));
        pattern.push_str(match order.order() {
            Order::Asc => " asc",
            Order::Desc => " desc",
        });
        if nulls_ordering {
            match order.nulls() {
                NullHandling::Default => {}
                NullHandling::NullsFirst => pattern.push_str(" nulls first"),
                NullHandling::NullsLast => pattern.push_str(" nulls last"),
            }
        }
    }
    pattern.push(')');
    let args = order_by.iter().map(|order| order.target().clone()).collect();
    Ok(TemplateExpr::new(ValueType::I64, &pattern, args)?.into())
}

fn write_row_numbered<W: Write>(
    ctx: &mut FormatContext<'_, W>,
    md: &QueryMetadata,
    projection: Option<&str>,
    top: &Template,
    filter: &PaginationTemplates,
) -> Result<()> {
    let modifiers = md.modifiers();
    let mut inner = md.clone();
    inner.set_modifiers(QueryModifiers::default());
    let end = inner.remove_flags_at(Position::End);

    match (modifiers.limit, modifiers.offset) {
        (Some(limit), None) => {
            let top = TemplateExpr::from_parts(ValueType::I64, top.clone(), vec![count_constant(limit)]);
            inner.add_flag(QueryFlag::expr(Position::AfterSelect, top.into()));
            write_select(ctx, &inner, false, projection)?;
        }
        (limit, Some(offset)) => {
            let nulls_ordering = ctx.dialect.capabilities().nulls_ordering;
            let row_number = row_number(md.order_by(), nulls_ordering)?;
            // appended after whatever projection renders, `*` included
            let column = TemplateExpr::new(ValueType::I64, ", {0}", vec![row_number.alias("row_number")])?;
            inner
                .add_flag(QueryFlag::expr(Position::AfterProjection, column.into()))
                .clear_order_by();

            trace!(offset, limit = ?limit, "pagination wrapped in row_number query");
            ctx.write_str("with inner_query as \n(\n  ")?;
            write_select(ctx, &inner, false, projection)?;
            ctx.write_str("\n)\nselect * \nfrom inner_query\nwhere ")?;
            match limit {
                Some(limit) => ctx.apply_template(
                    &filter.limit_offset,
                    -1,
                    &[count_constant(offset), count_constant(offset.saturating_add(limit))],
                )?,
                None => ctx.apply_template(&filter.offset, -1, &[count_constant(offset)])?,
            }
        }
        (None, None) => write_select(ctx, &inner, false, projection)?,
    }
    write_flags(ctx, &end)
}

pub(crate) fn write_delete<W: Write>(ctx: &mut FormatContext<'_, W>, md: &QueryMetadata) -> Result<()> {
    let target = md.joins().first().ok_or(Error::MissingRoot)?;
    ctx.write_str("delete from ")?;
    write_join_target(ctx, target.target())?;
    if let Some(filter) = md.filter() {
        ctx.write_str("\nwhere ")?;
        filter.format_writer(ctx)?;
    }
    Ok(())
}

pub(crate) fn write_update<W: Write>(
    ctx: &mut FormatContext<'_, W>,
    md: &QueryMetadata,
    assignments: &[(Path, Expr)],
) -> Result<()> {
    let target = md.joins().first().ok_or(Error::MissingRoot)?;
    if assignments.is_empty() {
        return Err(Error::invalid("update without assignments"));
    }
    ctx.write_str("update ")?;
    write_join_target(ctx, target.target())?;
    ctx.write_str("\nset ")?;
    for (index, (path, value)) in assignments.iter().enumerate() {
        if index > 0 {
            ctx.write_str(", ")?;
        }
        path.format_writer(ctx)?;
        ctx.write_str(" = ")?;
        match value.as_constant() {
            Some(constant) if constant.is_null() => ctx.write_str("null")?,
            _ => value.format_writer(ctx)?,
        }
    }
    if let Some(filter) = md.filter() {
        ctx.write_str("\nwhere ")?;
        filter.format_writer(ctx)?;
    }
    Ok(())
}

/// Table name of an entity root for the SQL family.
fn write_root_table<W: Write>(ctx: &mut FormatContext<'_, W>, root: &Path) -> Result<()> {
    let info = ctx.metamodel.entity(root.ty()).unwrap_or_default();
    let table = info
        .table
        .or(info.name)
        .unwrap_or_else(|| root.ty().simple_name());
    ctx.write_table(&table)
}

/// Bare column names, without the root alias.
fn write_columns<W: Write>(ctx: &mut FormatContext<'_, W>, root: &Path, columns: &[Path]) -> Result<()> {
    for (index, column) in columns.iter().enumerate() {
        if index > 0 {
            ctx.write_str(", ")?;
        }
        let name = column
            .name()
            .ok_or_else(|| Error::invalid("insert column must be a named property"))?;
        let name = ctx
            .metamodel
            .property(root.ty(), name)
            .and_then(|info| info.column)
            .unwrap_or_else(|| name.into());
        ctx.write_ident(&name)?;
    }
    Ok(())
}

fn write_source<W: Write>(ctx: &mut FormatContext<'_, W>, source: InsertSource<'_>) -> Result<()> {
    match source {
        InsertSource::Values(rows) => {
            if rows.is_empty() {
                return Err(Error::invalid("insert without rows"));
            }
            ctx.write_str("\nvalues ")?;
            for (index, row) in rows.iter().enumerate() {
                if index > 0 {
                    ctx.write_str(", ")?;
                }
                ctx.write_str("(")?;
                ctx.write_list(", ", row)?;
                ctx.write_str(")")?;
            }
            Ok(())
        }
        InsertSource::Query(md) => {
            ctx.write_str("\n")?;
            write_query(ctx, md, false, None)
        }
    }
}

pub(crate) fn write_insert<W: Write>(
    ctx: &mut FormatContext<'_, W>,
    root: &Path,
    columns: &[Path],
    source: InsertSource<'_>,
) -> Result<()> {
    if ctx.dialect.family() != Family::Sql {
        return Err(Error::unsupported("insert", ctx.dialect.name()));
    }
    ctx.write_str("insert into ")?;
    write_root_table(ctx, root)?;
    if !columns.is_empty() {
        ctx.write_str(" (")?;
        write_columns(ctx, root, columns)?;
        ctx.write_str(")")?;
    }
    write_source(ctx, source)
}

pub(crate) fn write_merge<W: Write>(
    ctx: &mut FormatContext<'_, W>,
    root: &Path,
    keys: &[Path],
    columns: &[Path],
    source: InsertSource<'_>,
) -> Result<()> {
    if !ctx.dialect.capabilities().native_merge {
        return Err(Error::unsupported("merge", ctx.dialect.name()));
    }
    ctx.write_str("merge into ")?;
    write_root_table(ctx, root)?;
    if !columns.is_empty() {
        ctx.write_str(" (")?;
        write_columns(ctx, root, columns)?;
        ctx.write_str(")")?;
    }
    if !keys.is_empty() {
        ctx.write_str("\nkey (")?;
        write_columns(ctx, root, keys)?;
        ctx.write_str(")")?;
    }
    write_source(ctx, source)
}
