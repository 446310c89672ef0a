use crate::{
    error::{Error, Result},
    template::Template,
    value::ValueType,
};

use super::Expr;

/// Free-form text with positional arguments, rendered verbatim around them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateExpr {
    ty: ValueType,
    template: Template,
    args: Vec<Expr>,
}

impl TemplateExpr {
    pub fn new(ty: ValueType, pattern: &str, args: Vec<Expr>) -> Result<Self> {
        let template = Template::parse(pattern)?;
        if let Some(max) = template.max_index() {
            if max >= args.len() {
                return Err(Error::InvalidTemplate {
                    pattern: pattern.into(),
                    reason: "argument index out of range",
                });
            }
        }
        Ok(Self { ty, template, args })
    }

    pub(crate) fn from_parts(ty: ValueType, template: Template, args: Vec<Expr>) -> Self {
        Self { ty, template, args }
    }

    pub fn ty(&self) -> &ValueType {
        &self.ty
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn args(&self) -> &[Expr] {
        &self.args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_checked() {
        let args = vec![Expr::constant(1)];
        assert!(TemplateExpr::new(ValueType::I32, "abs({0})", args.clone()).is_ok());
        assert!(TemplateExpr::new(ValueType::I32, "power({0}, {1})", args).is_err());
    }
}
