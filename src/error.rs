use smol_str::SmolStr;
use thiserror::Error;

use crate::operator::{Arity, Operator};

#[derive(Debug, Error)]
pub enum Error {
    /// No template is registered for the operator anywhere in the dialect's layers.
    #[error("no template registered for operator {operator} in dialect {dialect}")]
    MissingTemplate { operator: Operator, dialect: SmolStr },

    /// The dialect profile lacks a capability the statement needs.
    #[error("{feature} is not supported by dialect {dialect}")]
    Unsupported { feature: &'static str, dialect: SmolStr },

    #[error("invalid template {pattern:?}: {reason}")]
    InvalidTemplate { pattern: SmolStr, reason: &'static str },

    #[error("operator {operator} expects {expected} argument(s), got {found}")]
    Arity {
        operator: Operator,
        expected: Arity,
        found: usize,
    },

    #[error("query metadata has no root source")]
    MissingRoot,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("parameter {0} has not been bound")]
    UnboundParam(SmolStr),

    #[error("expression cannot be used as a document predicate: {0}")]
    NotAPredicate(String),

    #[error(transparent)]
    Fmt(#[from] std::fmt::Error),
}

impl Error {
    pub(crate) fn unsupported(feature: &'static str, dialect: &str) -> Self {
        Self::Unsupported {
            feature,
            dialect: SmolStr::new(dialect),
        }
    }

    pub(crate) fn invalid<T: Into<String>>(message: T) -> Self {
        Self::InvalidArgument(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
