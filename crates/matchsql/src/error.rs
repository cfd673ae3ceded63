use miette::Diagnostic;
use smol_str::SmolStr;
use thiserror::Error;

use crate::types::ExprType;

/// Result type for filter compilation
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while compiling a filter call.
///
/// Every variant is terminal for the enclosing call: text already written to the
/// host's output is not retracted, so the host must discard the whole statement.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum Error {
    #[error("unsupported filter: {0}")]
    #[diagnostic(code(matchsql::unsupported_filter))]
    UnsupportedFilter(SmolStr),

    #[error("unsupported types: {target}.({arg})")]
    #[diagnostic(
        code(matchsql::unsupported_types),
        help("filter operands must be a string or a list of strings")
    )]
    UnsupportedTypes { target: ExprType, arg: ExprType },

    #[error("failed to get const value of {0}: not a constant")]
    #[diagnostic(code(matchsql::const_value_required))]
    ConstValueRequired(String),

    #[error("wrong const value: {0}, want a string or a list of strings")]
    #[diagnostic(code(matchsql::invalid_const_value))]
    InvalidConstValue(String),

    #[error("value {0:?} contains the element-boundary sentinel")]
    #[diagnostic(
        code(matchsql::sentinel_in_value),
        help("NUL characters are reserved for separating list elements")
    )]
    SentinelInValue(String),

    #[error("wrong number of arguments for {function}: expected 1, found {found}")]
    #[diagnostic(code(matchsql::wrong_arity))]
    WrongArity { function: SmolStr, found: usize },

    #[error("unknown identifier: {0}")]
    #[diagnostic(code(matchsql::unknown_identifier))]
    UnknownIdentifier(SmolStr),

    #[error("conversion error: {0}")]
    #[diagnostic(code(matchsql::conversion))]
    Conversion(String),
}
