//! Shape-directed dispatch of filter calls to SQL.
//!
//! The same filter name compiles differently depending on whether its target and
//! argument are single strings or lists of strings. [`plan`] decides the
//! strategy from the operand shapes alone; [`FuzzyMatch`] then writes the SQL
//! through the host [`Converter`].

use smol_str::SmolStr;

use crate::config::FilterConfig;
use crate::converter::{Converter, Extension};
use crate::error::{Error, Result};
use crate::function::{FunctionName, MatchKind};
use crate::pattern::{self, MatchOptions, SENTINEL_LITERAL};
use crate::sql::quote_string;
use crate::types::{ConstValue, Shape};

/// Two-argument SQL functions used for single string operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlCall {
    StartsWith,
    EndsWith,
    /// `0 != INSTR(target, arg)`
    Instr,
}

impl SqlCall {
    fn open(self) -> &'static str {
        match self {
            SqlCall::StartsWith => "STARTS_WITH(",
            SqlCall::EndsWith => "ENDS_WITH(",
            SqlCall::Instr => "0 != INSTR(",
        }
    }
}

/// How a call is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `target = arg`
    Compare,
    /// `target IN UNNEST(arg)`
    InUnnest,
    /// `FUNC(target, arg)`
    Call(SqlCall),
    /// `REGEXP_CONTAINS(target, "^(pattern)$")`
    AnchoredRegex { case_insensitive: bool },
    /// `REGEXP_CONTAINS("\x00" || target || "\x00", regex)` over sentinel-encoded operands,
    /// guarded by `ARRAY_LENGTH(target) > 0` when a candidate matches an empty element
    Regex(MatchOptions),
}

impl Strategy {
    /// Whether this strategy can compile operands of the given shapes.
    pub fn accepts(self, target: Shape, arg: Shape) -> bool {
        match self {
            Strategy::Compare | Strategy::Call(_) | Strategy::AnchoredRegex { .. } => {
                target == Shape::Scalar && arg == Shape::Scalar
            }
            Strategy::InUnnest => target == Shape::Scalar && arg == Shape::Collection,
            Strategy::Regex(_) => target == Shape::Collection || arg == Shape::Collection,
        }
    }
}

/// A resolved strategy plus whether target and argument trade places.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub strategy: Strategy,
    pub swapped: bool,
}

impl Plan {
    fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            swapped: false,
        }
    }

    fn swapped(strategy: Strategy) -> Self {
        Self {
            strategy,
            swapped: true,
        }
    }
}

/// Chooses the compilation strategy for a call.
///
/// Equality is symmetric, so a list target compared with a single string is
/// normalized to the string-first form before dispatch.
pub fn plan(function: FunctionName, target: Shape, arg: Shape) -> Plan {
    use Shape::{Collection, Scalar};

    match (function.kind(), target, arg) {
        (MatchKind::Equals, Scalar, Scalar) => Plan::new(Strategy::Compare),
        (MatchKind::Equals, Scalar, Collection) => Plan::new(Strategy::InUnnest),
        (MatchKind::Equals, Collection, Scalar) => Plan::swapped(Strategy::InUnnest),
        (MatchKind::Starts, Scalar, Scalar) => Plan::new(Strategy::Call(SqlCall::StartsWith)),
        (MatchKind::Ends, Scalar, Scalar) => Plan::new(Strategy::Call(SqlCall::EndsWith)),
        (MatchKind::Contains, Scalar, Scalar) => Plan::new(Strategy::Call(SqlCall::Instr)),
        (MatchKind::Regexp, Scalar, Scalar) => Plan::new(Strategy::AnchoredRegex {
            case_insensitive: function.is_case_insensitive(),
        }),
        _ => Plan::new(Strategy::Regex(MatchOptions::for_function(function))),
    }
}

/// The fuzzy match filter extension.
#[derive(Clone, Debug, Default)]
pub struct FuzzyMatch {
    config: FilterConfig,
}

impl FuzzyMatch {
    pub fn new(config: Option<FilterConfig>) -> Self {
        Self {
            config: config.unwrap_or_default(),
        }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Returns true if `function` is one of the filter functions.
    pub fn implements(&self, function: &str) -> bool {
        FunctionName::lookup(function).is_some()
    }

    /// Compiles a filter call, writing its SQL through `con`.
    ///
    /// Only the first argument is used. On error, text already written is left
    /// in the host's output.
    pub fn compile<C: Converter>(
        &self,
        con: &mut C,
        function: &str,
        target: &C::Node,
        args: &[C::Node],
    ) -> Result<()> {
        let name = FunctionName::lookup(function)
            .ok_or_else(|| Error::UnsupportedFilter(SmolStr::new(function)))?;
        let Some(arg) = args.first() else {
            return Err(Error::WrongArity {
                function: SmolStr::new(function),
                found: 0,
            });
        };

        let target_ty = con.get_type(target);
        let arg_ty = con.get_type(arg);
        let (Some(target_shape), Some(arg_shape)) = (target_ty.shape(), arg_ty.shape()) else {
            return Err(Error::UnsupportedTypes {
                target: target_ty,
                arg: arg_ty,
            });
        };

        let plan = plan(name, target_shape, arg_shape);
        tracing::debug!(
            "Compiling {}({}, {}) with {:?}{}",
            name,
            target_ty,
            arg_ty,
            plan.strategy,
            if plan.swapped { " (swapped)" } else { "" }
        );

        let (target, arg, target_shape) = if plan.swapped {
            (arg, target, arg_shape)
        } else {
            (target, arg, target_shape)
        };

        match plan.strategy {
            Strategy::Compare => {
                self.write_target(con, name, target)?;
                con.write_str(" = ");
                con.visit(arg)
            }
            Strategy::InUnnest => {
                self.write_target(con, name, target)?;
                con.write_str(" IN UNNEST(");
                con.visit(arg)?;
                con.write_str(")");
                Ok(())
            }
            Strategy::Call(call) => {
                con.write_str(call.open());
                self.write_target(con, name, target)?;
                con.write_str(", ");
                con.visit(arg)?;
                con.write_str(")");
                Ok(())
            }
            Strategy::AnchoredRegex { case_insensitive } => {
                let regex = match con.const_value(arg)? {
                    ConstValue::String(source) => pattern::anchored_pattern(&source, case_insensitive),
                    other => return Err(Error::InvalidConstValue(other.to_string())),
                };

                con.write_str("REGEXP_CONTAINS(");
                con.visit(target)?;
                con.write_str(", ");
                con.write_value(ConstValue::String(regex));
                con.write_str(")");
                Ok(())
            }
            Strategy::Regex(opts) => {
                let candidates = pattern::candidates(con.const_value(arg)?)?;
                let regex = pattern::build_regex(&candidates, opts)?;
                let guarded = target_shape == Shape::Collection && pattern::matches_empty_element(&candidates, opts);
                if guarded {
                    tracing::debug!("Guarding {} against empty targets", name);
                    con.write_str("(ARRAY_LENGTH(");
                    con.visit(target)?;
                    con.write_str(") > 0 AND ");
                }

                con.write_str("REGEXP_CONTAINS(");
                con.write_str(SENTINEL_LITERAL);
                con.write_str(" || ");
                match target_shape {
                    Shape::Scalar => con.visit(target)?,
                    Shape::Collection => {
                        con.write_str("ARRAY_TO_STRING(");
                        con.visit(target)?;
                        con.write_str(", ");
                        con.write_str(SENTINEL_LITERAL);
                        con.write_str(")");
                    }
                }
                con.write_str(" || ");
                con.write_str(SENTINEL_LITERAL);
                con.write_str(", ");
                con.write_value(ConstValue::String(regex));
                con.write_str(")");
                if guarded {
                    con.write_str(")");
                }
                Ok(())
            }
        }
    }

    /// Writes the target, collated when the function ignores case.
    fn write_target<C: Converter>(&self, con: &mut C, function: FunctionName, target: &C::Node) -> Result<()> {
        if !function.is_case_insensitive() {
            return con.visit(target);
        }

        con.write_str("COLLATE(");
        con.visit(target)?;
        con.write_str(", ");
        con.write_str(&quote_string(&self.config.collation));
        con.write_str(")");
        Ok(())
    }
}

impl<C: Converter> Extension<C> for FuzzyMatch {
    fn implements_function(&self, function: &str) -> bool {
        self.implements(function)
    }

    fn call_function(&self, con: &mut C, function: &str, target: &C::Node, args: &[C::Node]) -> Result<()> {
        self.compile(con, function, target, args)
    }
}
