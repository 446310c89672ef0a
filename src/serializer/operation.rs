//! Operation rendering and the per-family rewrites applied before a template
//! is looked up.

use std::{borrow::Cow, fmt::Write};

use indexmap::IndexSet;
use smol_str::SmolStr;
use tracing::trace;

use crate::{
    dialect::Family,
    error::{Error, Result},
    expr::{Constant, Expr},
    metamodel::EnumEncoding,
    operator::{Op, Operator},
    value::{Value, ValueType},
    writer::FormatContext,
};

use super::query::write_query;

pub(crate) fn visit_operation<W: Write>(
    ctx: &mut FormatContext<'_, W>,
    ty: &ValueType,
    operator: &Operator,
    args: &[Expr],
) -> Result<()> {
    let Operator::Op(op) = operator else {
        return render(ctx, operator, args);
    };
    let op = *op;
    let old = ctx.wrap_elements;
    ctx.wrap_elements = ctx.dialect.wraps_elements(op);
    let result = match ctx.dialect.family() {
        Family::Jpql => visit_jpql(ctx, ty, op, args),
        Family::Sql => visit_sql(ctx, ty, op, args),
    };
    ctx.wrap_elements = old;
    result
}

fn render<W: Write>(ctx: &mut FormatContext<'_, W>, operator: &Operator, args: &[Expr]) -> Result<()> {
    let dialect = ctx.dialect;
    let entry = dialect
        .templates()
        .get(operator)
        .ok_or_else(|| Error::MissingTemplate {
            operator: operator.clone(),
            dialect: SmolStr::new(dialect.name()),
        })?;
    if let Some(arity) = entry.arity {
        if !arity.accepts(args.len()) {
            return Err(Error::Arity {
                operator: operator.clone(),
                expected: arity,
                found: args.len(),
            });
        }
    }
    ctx.apply_template(&entry.template, entry.precedence, args)
}

fn visit_jpql<W: Write>(
    ctx: &mut FormatContext<'_, W>,
    ty: &ValueType,
    op: Op,
    args: &[Expr],
) -> Result<()> {
    match (op, args) {
        (Op::Eq | Op::Ne, [lhs, Expr::Operation(any)]) if any.op() == Some(Op::Any) => {
            let target = if op == Op::Eq { Op::In } else { Op::NotIn };
            trace!(from = op.name(), to = target.name(), "quantified comparison rewritten to membership");
            let values = any.arg(0).cloned().ok_or_else(|| Error::invalid("any without operand"))?;
            visit_operation(ctx, ty, &target.into(), &[lhs.clone(), values])
        }
        (Op::In | Op::NotIn, [_, Expr::Path(_)]) => any_in_path(ctx, op, args),
        (Op::In | Op::NotIn, [Expr::Path(_), Expr::Constant(_)]) => path_in_collection(ctx, op, args),
        (Op::InstanceOf, [lhs, rhs]) => instance_of(ctx, lhs, rhs),
        (Op::NumCast, [value, target]) => num_cast(ctx, value, target),
        (Op::Exists, [Expr::SubQuery(sub)]) => {
            let dialect = ctx.dialect;
            let projection = dialect.exists_projection();
            ctx.write_str("exists (")?;
            write_query(ctx, sub.metadata(), false, projection)?;
            ctx.write_str(")")
        }
        (Op::Matches | Op::MatchesIc, [value, pattern])
            if ctx.dialect.templates().get_op(op).is_none() =>
        {
            let like = regex_to_like(pattern, ctx.dialect.escape())?;
            trace!(op = op.name(), "regular expression rewritten to like");
            if op == Op::MatchesIc {
                let lowered = lower_constant(like);
                render(ctx, &Op::Like.into(), &[value.lower(), lowered])
            } else {
                render(ctx, &Op::Like.into(), &[value.clone(), like])
            }
        }
        (Op::Like, [value, pattern]) => like(ctx, value, pattern),
        _ if op.is_numeric() => render(ctx, &op.into(), &normalize_numbers(args)),
        _ => render(ctx, &op.into(), args),
    }
}

fn visit_sql<W: Write>(
    ctx: &mut FormatContext<'_, W>,
    _ty: &ValueType,
    op: Op,
    args: &[Expr],
) -> Result<()> {
    match (op, args) {
        (Op::In | Op::NotIn, [_, Expr::Constant(values)])
            if values.value().as_list().is_some_and(<[Value]>::is_empty) =>
        {
            // nothing is in an empty collection
            ctx.write_str(if op == Op::In { "1 = 2" } else { "1 = 1" })
        }
        (Op::NumCast, [value, target]) => num_cast(ctx, value, target),
        (Op::Like, [value, pattern]) => like(ctx, value, pattern),
        _ if op.is_numeric() => render(ctx, &op.into(), &normalize_numbers(args)),
        _ => render(ctx, &op.into(), args),
    }
}

/// `x in collectionPath`: membership test, with enum constants re-encoded
/// when the dialect cannot compare them as is.
fn any_in_path<W: Write>(ctx: &mut FormatContext<'_, W>, op: Op, args: &[Expr]) -> Result<()> {
    let mut args = args.to_vec();
    if !ctx.dialect.capabilities().enum_in_path {
        if let (Some(Value::Enum { name, ordinal, .. }), Expr::Path(path)) =
            (args[0].as_constant(), &args[1])
        {
            let encoding = match (path.parent(), path.name()) {
                (Some(owner), Some(property)) => ctx
                    .metamodel
                    .property(owner.ty(), property)
                    .and_then(|info| info.enum_encoding),
                _ => None,
            }
            .unwrap_or_default();
            let encoded = match encoding {
                EnumEncoding::Ordinal => Expr::constant(i32::try_from(*ordinal).unwrap_or(i32::MAX)),
                EnumEncoding::Name => Expr::constant(name.clone()),
            };
            trace!(?encoding, "enum constant re-encoded for collection membership");
            args[0] = encoded;
        }
    }
    let target = if op == Op::In { Op::MemberOf } else { Op::NotMemberOf };
    render(ctx, &target.into(), &args)
}

/// `entityPath in (entities)`: compares identifiers when the dialect cannot
/// test entities directly.
fn path_in_collection<W: Write>(ctx: &mut FormatContext<'_, W>, op: Op, args: &[Expr]) -> Result<()> {
    let (Expr::Path(path), Expr::Constant(values)) = (&args[0], &args[1]) else {
        return render(ctx, &op.into(), args);
    };
    if ctx.dialect.capabilities().path_in_entities || !path.ty().is_entity() {
        return render(ctx, &op.into(), args);
    }
    let Some(extractor) = ctx.identifiers else {
        return render(ctx, &op.into(), args);
    };
    let Some((id_name, id_type)) = ctx.metamodel.entity(path.ty()).and_then(|info| info.id) else {
        return render(ctx, &op.into(), args);
    };

    let entities = match values.value() {
        Value::List(items) => items.as_slice(),
        single => std::slice::from_ref(single),
    };
    let mut ids = IndexSet::with_capacity(entities.len());
    for entity in entities {
        let id = extractor
            .identifier(entity)
            .ok_or_else(|| Error::invalid(format!("no identifier for {entity}")))?;
        ids.insert(id);
    }
    trace!(property = %id_name, count = ids.len(), "entity collection compared by identifier");

    let id_path: Expr = path.get(id_name, id_type).into();
    let ids = Expr::Constant(Constant::new(Value::List(ids.into_iter().collect())));
    render(ctx, &op.into(), &[id_path, ids])
}

fn instance_of<W: Write>(ctx: &mut FormatContext<'_, W>, lhs: &Expr, rhs: &Expr) -> Result<()> {
    let operator = Operator::from(Op::InstanceOf);
    match rhs.as_constant() {
        Some(Value::Type(ty)) if ctx.dialect.capabilities().type_as_string => {
            let name = ctx
                .metamodel
                .entity(ty)
                .and_then(|info| info.discriminator)
                .unwrap_or_else(|| ty.simple_name());
            render(ctx, &operator, &[lhs.clone(), Expr::constant(name)])
        }
        _ => render(ctx, &operator, &[lhs.clone(), rhs.clone()]),
    }
}

fn num_cast<W: Write>(ctx: &mut FormatContext<'_, W>, value: &Expr, target: &Expr) -> Result<()> {
    let Some(Value::Type(ty)) = target.as_constant() else {
        return Err(Error::invalid("numeric cast target must be a type constant"));
    };
    let name = match ctx.dialect.family() {
        Family::Jpql => ty.simple_name(),
        Family::Sql => ctx.dialect.type_name(ty),
    };
    trace!(to = %name, "numeric cast");
    render(ctx, &Op::Cast.into(), &[value.clone(), Expr::constant(name)])
}

/// A literal LIKE pattern keeps its wildcards, the escape character is doubled.
fn like<W: Write>(ctx: &mut FormatContext<'_, W>, value: &Expr, pattern: &Expr) -> Result<()> {
    let pattern = match pattern.as_constant() {
        Some(Value::String(text)) => {
            let escape = ctx.dialect.escape();
            let doubled: String = text
                .chars()
                .flat_map(|ch| {
                    let repeat = if ch == escape { 2 } else { 1 };
                    std::iter::repeat_n(ch, repeat)
                })
                .collect();
            trace!(escape = %escape, "like pattern escaped");
            Expr::constant(doubled)
        }
        _ => pattern.clone(),
    };
    render(ctx, &Op::Like.into(), &[value.clone(), pattern])
}

fn lower_constant(expr: Expr) -> Expr {
    match expr.as_constant() {
        Some(Value::String(text)) => Expr::constant(text.to_lowercase()),
        _ => expr.lower(),
    }
}

/// Convert numeric constants to the type of the first non-constant numeric operand.
fn normalize_numbers(args: &[Expr]) -> Cow<'_, [Expr]> {
    let target = args
        .iter()
        .find(|arg| !matches!(arg, Expr::Constant(_)) && arg.ty().is_numeric())
        .map(Expr::ty);
    let Some(target) = target else {
        return Cow::Borrowed(args);
    };
    let needs_cast = |arg: &Expr| match arg {
        Expr::Constant(constant) => {
            constant.ty().is_numeric() && constant.ty() != target
        }
        _ => false,
    };
    if !args.iter().any(needs_cast) {
        return Cow::Borrowed(args);
    }
    trace!(to = %target.simple_name(), "numeric constants normalized");
    let normalized = args
        .iter()
        .map(|arg| match arg {
            Expr::Constant(constant) if needs_cast(arg) => constant
                .value()
                .cast_numeric(target)
                .map(|value| Expr::Constant(Constant::typed(target.clone(), value)))
                .unwrap_or_else(|| arg.clone()),
            _ => arg.clone(),
        })
        .collect();
    Cow::Owned(normalized)
}

/// Translate a regular expression into a LIKE pattern.
///
/// `.*` becomes `%` and `.` becomes `_`; a backslash makes the next character
/// literal. Leading `^` and trailing `$` anchors are dropped since LIKE always
/// matches the whole value. Anything else with regex meaning is rejected.
/// Non-constant operands are returned unchanged.
pub(crate) fn regex_to_like(expr: &Expr, escape: char) -> Result<Expr> {
    let Some(Value::String(regex)) = expr.as_constant() else {
        return Ok(expr.clone());
    };
    let unsupported = || Error::invalid(format!("'{regex}' can't be converted to like form"));

    let mut body = regex.as_str();
    body = body.strip_prefix('^').unwrap_or(body);
    if body.ends_with('$') && !body.ends_with("\\$") {
        body = &body[..body.len() - 1];
    }

    let mut like = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                let next = chars.next().ok_or_else(unsupported)?;
                if matches!(next, 'd' | 'D' | 's' | 'S' | 'w' | 'W' | 'b' | 'B') {
                    return Err(unsupported());
                }
                push_literal(&mut like, next, escape);
            }
            '.' if chars.peek() == Some(&'*') => {
                chars.next();
                like.push('%');
            }
            '.' => like.push('_'),
            '[' | ']' | '^' | '$' | '*' | '+' | '?' | '{' | '}' | '(' | ')' | '|' => {
                return Err(unsupported());
            }
            _ => push_literal(&mut like, ch, escape),
        }
    }
    Ok(Expr::constant(like))
}

fn push_literal(like: &mut String, ch: char, escape: char) {
    if ch == '%' || ch == '_' || ch == escape {
        like.push(escape);
    }
    like.push(ch);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn like_of(regex: &str) -> Result<String> {
        let expr = regex_to_like(&Expr::constant(regex), '!')?;
        Ok(expr.as_constant().and_then(Value::as_str).unwrap_or_default().to_owned())
    }

    #[test]
    fn test_regex_to_like() {
        assert_eq!("%abc%", like_of(".*abc.*").unwrap());
        assert_eq!("a_c", like_of("a.c").unwrap());
        assert_eq!("abc%", like_of("^abc.*$").unwrap());
        assert_eq!("a.b", like_of("a\\.b").unwrap());
        assert_eq!("10!%!_x", like_of("10%_x").unwrap());
        assert_eq!("a!!b", like_of("a!b").unwrap());
    }

    #[test]
    fn test_regex_to_like_rejects_classes() {
        for regex in ["[abc]", "a*", "\\d+", "a|b", "x\\s"] {
            assert!(
                matches!(like_of(regex), Err(Error::InvalidArgument(_))),
                "{regex} should be rejected"
            );
        }
    }

    #[test]
    fn test_regex_to_like_passes_expressions() {
        let path: Expr = crate::expr::Path::variable(ValueType::String, "pattern").into();
        assert_eq!(path, regex_to_like(&path, '!').unwrap());
    }

    #[test]
    fn test_normalize_numbers_uses_first_operand_type() {
        let weight: Expr = crate::expr::Path::variable(ValueType::I32, "weight").into();
        let args = vec![weight.clone(), Expr::constant(1.5f64), Expr::constant(3i64)];
        let normalized = normalize_numbers(&args);
        assert_eq!(Some(&Value::I32(1)), normalized[1].as_constant());
        assert_eq!(Some(&Value::I32(3)), normalized[2].as_constant());
        assert_eq!(&ValueType::I32, normalized[2].ty());

        let untouched = vec![weight, Expr::constant(2i32)];
        assert!(matches!(normalize_numbers(&untouched), Cow::Borrowed(_)));
    }
}
