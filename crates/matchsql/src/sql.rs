//! A minimal expression-to-SQL host for filter extensions.
//!
//! `SqlConverter` covers just enough of a tree-to-text compiler to embed filter
//! calls in a boolean `WHERE` expression: identifiers, literals, lists, calls
//! and the logical connectives. Calls are handed to registered extensions.

use std::fmt::Write as _;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::converter::{Converter, Extension};
use crate::error::{Error, Result};
use crate::types::{ConstValue, ExprType, common_type};

/// Expression tree accepted by [`SqlConverter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Ident(SmolStr),
    Literal(ConstValue),
    List(Vec<Expr>),
    Call {
        function: SmolStr,
        target: Box<Expr>,
        #[serde(default)]
        args: Vec<Expr>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    pub fn ident(name: &str) -> Self {
        Expr::Ident(SmolStr::new(name))
    }

    pub fn string(value: &str) -> Self {
        Expr::Literal(ConstValue::from(value))
    }

    pub fn int(value: i64) -> Self {
        Expr::Literal(ConstValue::Int(value))
    }

    /// A constant list of strings.
    pub fn strings<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        Expr::Literal(ConstValue::List(values.into_iter().map(ConstValue::from).collect()))
    }

    pub fn call(function: &str, target: Expr, args: Vec<Expr>) -> Self {
        Expr::Call {
            function: SmolStr::new(function),
            target: Box::new(target),
            args,
        }
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Or(Box::new(left), Box::new(right))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(expr: Expr) -> Self {
        Expr::Not(Box::new(expr))
    }

    fn describe(&self) -> String {
        match self {
            Expr::Ident(name) => format!("identifier `{}`", name),
            Expr::Literal(value) => format!("literal {}", value),
            Expr::List(_) => "list".to_string(),
            Expr::Call { function, .. } => format!("call to {}", function),
            Expr::And(..) | Expr::Or(..) | Expr::Not(_) => "logical expression".to_string(),
        }
    }
}

/// Column types visible to the converter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    columns: FxHashMap<SmolStr, ExprType>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column
    pub fn column(mut self, name: &str, ty: ExprType) -> Self {
        self.columns.insert(SmolStr::new(name), ty);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ExprType> {
        self.columns.get(name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConverterConfig {
    /// Emit literals as positional query parameters instead of inline text
    pub parameterize: bool,
}

/// Generated SQL and the parameter values it refers to.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    pub sql: String,
    pub params: Vec<ConstValue>,
}

type SqlExtension = Arc<dyn Extension<SqlConverter> + Send + Sync>;

pub struct SqlConverter {
    schema: Schema,
    config: ConverterConfig,
    extensions: Vec<SqlExtension>,
    output: String,
    params: Vec<ConstValue>,
}

impl SqlConverter {
    pub fn new(schema: Schema, config: Option<ConverterConfig>) -> Self {
        Self {
            schema,
            config: config.unwrap_or_default(),
            extensions: Vec::new(),
            output: String::new(),
            params: Vec::new(),
        }
    }

    /// Registers an extension. Earlier extensions take precedence.
    pub fn with_extension(mut self, extension: impl Extension<SqlConverter> + Send + Sync + 'static) -> Self {
        self.extensions.push(Arc::new(extension));
        self
    }

    /// Converts an expression into a standalone query fragment.
    pub fn convert(&mut self, expr: &Expr) -> Result<Query> {
        self.output.clear();
        self.params.clear();

        let result = self.visit(expr);
        let query = Query {
            sql: std::mem::take(&mut self.output),
            params: std::mem::take(&mut self.params),
        };

        result.map(|_| query)
    }

    /// Takes the text written so far.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    pub fn params(&self) -> &[ConstValue] {
        &self.params
    }

    fn visit_call(&mut self, function: &str, target: &Expr, args: &[Expr]) -> Result<()> {
        let extension = self
            .extensions
            .iter()
            .find(|ext| ext.implements_function(function))
            .cloned()
            .ok_or_else(|| Error::UnsupportedFilter(SmolStr::new(function)))?;

        extension.call_function(self, function, target, args)
    }

    fn visit_binary(&mut self, op: &str, left: &Expr, right: &Expr) -> Result<()> {
        self.write_str("(");
        self.visit(left)?;
        self.write_str(op);
        self.visit(right)?;
        self.write_str(")");
        Ok(())
    }

    fn write_literal(&mut self, value: &ConstValue) {
        match value {
            ConstValue::Null => self.output.push_str("NULL"),
            ConstValue::Bool(true) => self.output.push_str("TRUE"),
            ConstValue::Bool(false) => self.output.push_str("FALSE"),
            ConstValue::Int(n) => {
                let _ = write!(self.output, "{}", n);
            }
            ConstValue::Double(n) => {
                let _ = write!(self.output, "{:?}", n);
            }
            ConstValue::String(s) => {
                let quoted = quote_string(s);
                self.output.push_str(&quoted);
            }
            ConstValue::List(items) => {
                self.output.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.output.push_str(", ");
                    }
                    self.write_literal(item);
                }
                self.output.push(']');
            }
        }
    }
}

impl Converter for SqlConverter {
    type Node = Expr;

    fn get_type(&self, node: &Expr) -> ExprType {
        match node {
            Expr::Ident(name) => self.schema.get(name).cloned().unwrap_or(ExprType::Dyn),
            Expr::Literal(value) => value.type_of(),
            Expr::List(items) => ExprType::list(common_type(items.iter().map(|item| self.get_type(item)))),
            Expr::Call { .. } | Expr::And(..) | Expr::Or(..) | Expr::Not(_) => ExprType::Bool,
        }
    }

    fn visit(&mut self, node: &Expr) -> Result<()> {
        match node {
            Expr::Ident(name) => {
                if self.schema.get(name).is_none() {
                    return Err(Error::UnknownIdentifier(name.clone()));
                }
                self.write_str(&quote_ident(name));
                Ok(())
            }
            Expr::Literal(ConstValue::Double(n)) if !n.is_finite() => {
                Err(Error::Conversion(format!("{} has no SQL literal", n)))
            }
            Expr::Literal(value) => {
                self.write_value(value.clone());
                Ok(())
            }
            Expr::List(items) => {
                self.write_str("[");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.write_str(", ");
                    }
                    self.visit(item)?;
                }
                self.write_str("]");
                Ok(())
            }
            Expr::Call {
                function,
                target,
                args,
            } => self.visit_call(function, target, args),
            Expr::And(left, right) => self.visit_binary(" AND ", left, right),
            Expr::Or(left, right) => self.visit_binary(" OR ", left, right),
            Expr::Not(expr) => {
                self.write_str("NOT ");
                self.write_str("(");
                self.visit(expr)?;
                self.write_str(")");
                Ok(())
            }
        }
    }

    fn write_str(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn write_value(&mut self, value: ConstValue) {
        if self.config.parameterize {
            let _ = write!(self.output, "@p{}", self.params.len());
            self.params.push(value);
        } else {
            self.write_literal(&value);
        }
    }

    fn const_value(&self, node: &Expr) -> Result<ConstValue> {
        match node {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::List(items) => items
                .iter()
                .map(|item| self.const_value(item))
                .collect::<Result<Vec<_>>>()
                .map(ConstValue::List),
            _ => Err(Error::ConstValueRequired(node.describe())),
        }
    }
}

/// Quotes a string as a SQL string literal.
pub fn quote_string(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_ascii_control() => {
                let _ = write!(quoted, "\\x{:02x}", c as u32);
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "\\`"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::FuzzyMatch;
    use rstest::rstest;

    fn schema() -> Schema {
        Schema::new()
            .column("name", ExprType::String)
            .column("tags", ExprType::list(ExprType::String))
    }

    #[rstest]
    #[case::plain("abc", r#""abc""#)]
    #[case::quote(r#"a"b"#, r#""a\"b""#)]
    #[case::backslash(r"a\.b", r#""a\\.b""#)]
    #[case::newline("a\nb", r#""a\nb""#)]
    #[case::sentinel("\0(ab)\0", r#""\x00(ab)\x00""#)]
    #[case::unicode("größe", r#""größe""#)]
    fn test_quote_string(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(quote_string(input), expected);
    }

    #[rstest]
    #[case::string(Expr::string("x"), ExprType::String)]
    #[case::column(Expr::ident("tags"), ExprType::list(ExprType::String))]
    #[case::unknown_column(Expr::ident("missing"), ExprType::Dyn)]
    #[case::list_of_columns(
        Expr::List(vec![Expr::ident("name"), Expr::string("x")]),
        ExprType::list(ExprType::String)
    )]
    #[case::mixed_list(Expr::List(vec![Expr::ident("name"), Expr::int(1)]), ExprType::list(ExprType::Dyn))]
    #[case::call(Expr::call("existsEquals", Expr::ident("name"), vec![Expr::string("x")]), ExprType::Bool)]
    fn test_get_type(#[case] expr: Expr, #[case] expected: ExprType) {
        let con = SqlConverter::new(schema(), None);
        assert_eq!(con.get_type(&expr), expected);
    }

    #[test]
    fn test_const_value_of_list_expression() {
        let con = SqlConverter::new(schema(), None);
        let expr = Expr::List(vec![Expr::string("a"), Expr::string("b")]);
        assert_eq!(
            con.const_value(&expr).unwrap(),
            ConstValue::List(vec!["a".into(), "b".into()])
        );

        let expr = Expr::List(vec![Expr::string("a"), Expr::ident("name")]);
        assert_eq!(
            con.const_value(&expr).unwrap_err(),
            Error::ConstValueRequired("identifier `name`".to_string())
        );
    }

    #[test]
    fn test_convert_logical_expression() {
        let mut con = SqlConverter::new(schema(), None).with_extension(FuzzyMatch::new(None));
        let expr = Expr::and(
            Expr::call("existsEquals", Expr::ident("name"), vec![Expr::string("bob")]),
            Expr::not(Expr::call("existsStarts", Expr::ident("name"), vec![Expr::string("b")])),
        );
        let query = con.convert(&expr).unwrap();
        assert_eq!(query.sql, r#"(`name` = "bob" AND NOT (STARTS_WITH(`name`, "b")))"#);
        assert!(query.params.is_empty());
    }

    #[test]
    fn test_convert_parameterized() {
        let mut con = SqlConverter::new(
            schema(),
            Some(ConverterConfig { parameterize: true }),
        )
        .with_extension(FuzzyMatch::new(None));
        let expr = Expr::or(
            Expr::call("existsEquals", Expr::ident("name"), vec![Expr::string("bob")]),
            Expr::call("existsContains", Expr::ident("tags"), vec![Expr::string("x")]),
        );
        let query = con.convert(&expr).unwrap();
        assert_eq!(
            query.sql,
            r#"(`name` = @p0 OR REGEXP_CONTAINS("\x00" || ARRAY_TO_STRING(`tags`, "\x00") || "\x00", @p1))"#
        );
        assert_eq!(query.params, vec![ConstValue::from("bob"), ConstValue::from("(x)")]);
    }

    #[test]
    fn test_convert_without_extension() {
        let mut con = SqlConverter::new(schema(), None);
        let expr = Expr::call("existsEquals", Expr::ident("name"), vec![Expr::string("bob")]);
        assert_eq!(
            con.convert(&expr).unwrap_err(),
            Error::UnsupportedFilter("existsEquals".into())
        );
    }

    #[test]
    fn test_convert_unknown_identifier() {
        let mut con = SqlConverter::new(schema(), None);
        assert_eq!(
            con.convert(&Expr::ident("missing")).unwrap_err(),
            Error::UnknownIdentifier("missing".into())
        );
    }

    #[test]
    fn test_convert_non_finite_literal() {
        let mut con = SqlConverter::new(schema(), None);
        let expr = Expr::Literal(ConstValue::Double(f64::NAN));
        assert_eq!(
            con.convert(&expr).unwrap_err(),
            Error::Conversion("NaN has no SQL literal".to_string())
        );
    }

    #[test]
    fn test_expr_from_json() {
        let json = r#"{"call": {"function": "existsEqualsCI", "target": {"ident": "tags"}, "args": [{"literal": ["a", "b"]}]}}"#;
        let expr: Expr = serde_json::from_str(json).unwrap();
        assert_eq!(
            expr,
            Expr::call("existsEqualsCI", Expr::ident("tags"), vec![Expr::strings(["a", "b"])])
        );
    }
}
