//! Fuzzy match filter functions for a SQL-generating expression compiler.
//!
//! This crate compiles the `exists*` family of filter calls into BigQuery SQL:
//!
//! | Function                               | Matches when the target...                  |
//! |----------------------------------------|---------------------------------------------|
//! | `existsEquals` / `existsEqualsCI`      | equals a candidate                          |
//! | `existsStarts` / `existsStartsCI`      | starts with a candidate                     |
//! | `existsEnds` / `existsEndsCI`          | ends with a candidate                       |
//! | `existsContains` / `existsContainsCI`  | contains a candidate                        |
//! | `existsRegexp` / `existsRegexpCI`      | fully matches a candidate pattern           |
//!
//! Both the target and the argument may be a string or a list of strings, and the
//! call is true when any target element matches any candidate. The `CI`
//! variants ignore case.
//!
//! Single-string calls compile to plain SQL (`=`, `IN UNNEST`, `STARTS_WITH`,
//! ...). Everything else compiles to one `REGEXP_CONTAINS` over a NUL-joined
//! encoding of the target; see [`pattern`] for how that keeps matches inside
//! element boundaries.
//!
//! The crate plugs into a host compiler through the [`Converter`] and
//! [`Extension`] traits. [`sql::SqlConverter`] is a small host used for tests and
//! the command line tool.
//!
//! ## Example
//!
//! ```rust
//! use matchsql::{ExprType, FuzzyMatch};
//! use matchsql::sql::{Expr, Schema, SqlConverter};
//!
//! let schema = Schema::new().column("tags", ExprType::list(ExprType::String));
//! let mut converter = SqlConverter::new(schema, None).with_extension(FuzzyMatch::new(None));
//!
//! let filter = Expr::call("existsStarts", Expr::ident("tags"), vec![Expr::string("ab")]);
//! let query = converter.convert(&filter).unwrap();
//! assert_eq!(
//!     query.sql,
//!     r#"REGEXP_CONTAINS("\x00" || ARRAY_TO_STRING(`tags`, "\x00") || "\x00", "\x00(ab)")"#
//! );
//! ```

pub mod config;
pub mod converter;
pub mod dispatch;
pub mod error;
pub mod function;
pub mod pattern;
pub mod registry;
pub mod sql;
pub mod types;

pub use config::FilterConfig;
pub use converter::{Converter, Extension};
pub use dispatch::{FuzzyMatch, Plan, Strategy, plan};
pub use error::{Error, Result};
pub use function::{FunctionName, MatchKind};
pub use pattern::{MatchOptions, SENTINEL};
pub use registry::{FunctionDecl, Overload, Registry};
pub use types::{ConstValue, ExprType, Shape};
