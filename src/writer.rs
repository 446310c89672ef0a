use std::{fmt::Write, ops::Deref};

use indexmap::IndexMap;

use crate::{
    dialect::{Dialect, Placeholder},
    error::{Error, Result},
    expr::{Expr, Operation, Param},
    metamodel::{IdentifierExtractor, Metamodel},
    operator::{Op, Operator},
    template::{Case, Element, Template},
    value::{Value, ValueType},
};

pub(crate) trait FormatWriter {
    fn format_writer<W: Write>(&self, context: &mut FormatContext<'_, W>) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Binding {
    Value(Value),
    Param(Param),
}

impl Binding {
    fn value_type(&self) -> ValueType {
        match self {
            Binding::Value(value) => value.value_type(),
            Binding::Param(param) => param.ty().clone(),
        }
    }
}

/// Placeholder labels handed out during one statement, sub-queries included.
#[derive(Debug, Default)]
pub(crate) struct Bindings {
    labels: IndexMap<(ValueType, Binding), usize>,
    ordered: Vec<Binding>,
}

impl Bindings {
    /// Label for `binding` of static type `ty`; with `reuse` a repeated
    /// binding of the same type keeps its first label.
    pub(crate) fn label(&mut self, binding: Binding, ty: ValueType, reuse: bool) -> usize {
        let key = (ty, binding);
        if reuse {
            if let Some(label) = self.labels.get(&key) {
                return *label;
            }
        }
        self.ordered.push(key.1.clone());
        let label = self.ordered.len();
        self.labels.entry(key).or_insert(label);
        label
    }

    pub(crate) fn len(&self) -> usize {
        self.ordered.len()
    }

    pub(crate) fn into_vec(self) -> Vec<Binding> {
        self.ordered
    }
}

pub(crate) struct FormatContext<'a, W: Write> {
    pub(crate) writer: &'a mut W,
    pub(crate) dialect: &'a Dialect,
    pub(crate) metamodel: &'a dyn Metamodel,
    pub(crate) identifiers: Option<&'a dyn IdentifierExtractor>,
    pub(crate) bindings: Bindings,
    pub(crate) in_projection: bool,
    pub(crate) wrap_elements: bool,
}

impl<'a, W: Write> FormatContext<'a, W> {
    pub fn new(
        writer: &'a mut W,
        dialect: &'a Dialect,
        metamodel: &'a dyn Metamodel,
        identifiers: Option<&'a dyn IdentifierExtractor>,
    ) -> Self {
        Self {
            writer,
            dialect,
            metamodel,
            identifiers,
            bindings: Bindings::default(),
            in_projection: false,
            wrap_elements: false,
        }
    }

    pub(crate) fn write_str(&mut self, text: &str) -> Result<()> {
        self.writer.write_str(text)?;
        Ok(())
    }

    /// Identifier in the dialect's quotes, embedded quotes doubled.
    pub(crate) fn quote_ident(&self, part: &str) -> String {
        let Some(quote) = self.dialect.quote() else {
            return part.to_owned();
        };
        if part == "*" {
            return part.to_owned();
        }
        let mut quoted = String::with_capacity(part.len() + 2);
        quoted.push(quote);
        for ch in part.chars() {
            // duplicate the quote if present
            if ch == quote {
                quoted.push(quote);
            }
            quoted.push(ch);
        }
        quoted.push(quote);
        quoted
    }

    pub(crate) fn write_ident(&mut self, part: &str) -> Result<()> {
        let quoted = self.quote_ident(part);
        self.write_str(&quoted)
    }

    pub(crate) fn write_table(&mut self, ident: &str) -> Result<()> {
        for (i, part) in ident.split('.').enumerate() {
            if i > 0 {
                self.writer.write_char('.')?;
            }
            self.write_ident(part)?;
        }
        Ok(())
    }

    pub(crate) fn write_placeholder(&mut self, binding: Binding) -> Result<()> {
        let ty = binding.value_type();
        self.write_typed_placeholder(binding, ty)
    }

    pub(crate) fn write_typed_placeholder(&mut self, binding: Binding, ty: ValueType) -> Result<()> {
        match self.dialect.placeholder() {
            Placeholder::Numbered(prefix) => {
                let label = self.bindings.label(binding, ty, true);
                write!(self.writer, "{prefix}{label}")?;
            }
            Placeholder::Anonymous => {
                self.bindings.label(binding, ty, false);
                self.writer.write_char('?')?;
            }
        }
        Ok(())
    }

    pub(crate) fn write_list<T: FormatWriter>(&mut self, separator: &str, items: &[T]) -> Result<()> {
        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                self.write_str(separator)?;
            }
            item.format_writer(self)?;
        }
        Ok(())
    }

    /// Precedence an operation renders at in this dialect.
    pub(crate) fn precedence_of(&self, operator: &Operator) -> i32 {
        self.dialect
            .templates()
            .get(operator)
            .map_or_else(|| operator.default_precedence(), |entry| entry.precedence)
    }

    fn write_arg(&mut self, arg: &Expr, precedence: i32) -> Result<()> {
        let wrap = precedence >= 0
            && matches!(arg, Expr::Operation(op) if self.precedence_of(op.operator()) > precedence);
        if wrap {
            self.writer.write_char('(')?;
        }
        arg.format_writer(self)?;
        if wrap {
            self.writer.write_char(')')?;
        }
        Ok(())
    }

    pub(crate) fn apply_template(
        &mut self,
        template: &Template,
        precedence: i32,
        args: &[Expr],
    ) -> Result<()> {
        let arg = |index: usize| {
            args.get(index).ok_or_else(|| Error::InvalidTemplate {
                pattern: template.pattern().into(),
                reason: "argument index out of range",
            })
        };

        for element in template.elements() {
            match element {
                Element::Text(text) => self.write_str(text)?,
                Element::Arg(index) => self.write_arg(arg(*index)?, precedence)?,
                Element::Inline(index) => match arg(*index)? {
                    Expr::Constant(constant) => write!(self.writer, "{}", constant.value())?,
                    other => self.write_arg(other, precedence)?,
                },
                Element::Cased(index, case) => {
                    let target = arg(*index)?;
                    match target.as_constant() {
                        Some(Value::String(text)) => {
                            let text = match case {
                                Case::Lower => text.to_lowercase(),
                                Case::Upper => text.to_uppercase(),
                            };
                            self.write_placeholder(Binding::Value(Value::string(text)))?;
                        }
                        _ => {
                            let op = match case {
                                Case::Lower => Op::Lower,
                                Case::Upper => Op::Upper,
                            };
                            let cased: Expr =
                                Operation::of(ValueType::String, op, vec![target.clone()]).into();
                            self.write_arg(&cased, precedence)?;
                        }
                    }
                }
                Element::Like {
                    index,
                    leading,
                    trailing,
                    lower,
                } => {
                    let target = arg(*index)?;
                    match target.as_constant() {
                        Some(Value::String(text)) => {
                            let mut pattern = String::with_capacity(text.len() + 2);
                            if *leading {
                                pattern.push('%');
                            }
                            let escaped = escape_for_like(text, self.dialect.escape());
                            if *lower {
                                pattern.push_str(&escaped.to_lowercase());
                            } else {
                                pattern.push_str(&escaped);
                            }
                            if *trailing {
                                pattern.push('%');
                            }
                            self.write_placeholder(Binding::Value(Value::string(pattern)))?;
                        }
                        _ => {
                            let wrapped = like_concat(target.clone(), *leading, *trailing, *lower);
                            self.write_arg(&wrapped, precedence)?;
                        }
                    }
                }
                Element::All => {
                    for (index, item) in args.iter().enumerate() {
                        if index > 0 {
                            self.write_str(", ")?;
                        }
                        self.write_arg(item, precedence)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Escape LIKE wildcards and the escape character itself.
pub(crate) fn escape_for_like(text: &str, escape: char) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == escape || ch == '%' || ch == '_' {
            escaped.push(escape);
        }
        escaped.push(ch);
    }
    escaped
}

fn like_concat(target: Expr, leading: bool, trailing: bool, lower: bool) -> Expr {
    let mut expr = if lower {
        Operation::of(ValueType::String, Op::Lower, vec![target]).into()
    } else {
        target
    };
    if leading {
        expr = Operation::of(ValueType::String, Op::Concat, vec![Expr::constant("%"), expr]).into();
    }
    if trailing {
        expr = Operation::of(ValueType::String, Op::Concat, vec![expr, Expr::constant("%")]).into();
    }
    expr
}

impl<D> FormatWriter for D
where
    D: Deref,
    D::Target: FormatWriter,
{
    fn format_writer<W: std::fmt::Write>(&self, ctx: &mut FormatContext<'_, W>) -> Result<()> {
        self.deref().format_writer(ctx)
    }
}
