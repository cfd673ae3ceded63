//! Expression types and constant values exchanged with the host compiler.

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Type of an expression as resolved by the host's type checker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprType {
    String,
    Int,
    Double,
    Bool,
    Null,
    /// List type with element type
    List(Box<ExprType>),
    /// Type could not be resolved
    Dyn,
}

impl ExprType {
    /// Creates a new list type
    pub fn list(elem: ExprType) -> Self {
        ExprType::List(Box::new(elem))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, ExprType::List(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, ExprType::String)
    }

    /// Returns the operand shape of this type, or `None` when the type is
    /// neither a string nor a list of strings.
    pub fn shape(&self) -> Option<Shape> {
        match self {
            ExprType::String => Some(Shape::Scalar),
            ExprType::List(elem) if elem.is_string() => Some(Shape::Collection),
            _ => None,
        }
    }
}

impl fmt::Display for ExprType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprType::String => write!(f, "string"),
            ExprType::Int => write!(f, "int"),
            ExprType::Double => write!(f, "double"),
            ExprType::Bool => write!(f, "bool"),
            ExprType::Null => write!(f, "null_type"),
            ExprType::List(elem) => write!(f, "list({})", elem),
            ExprType::Dyn => write!(f, "dyn"),
        }
    }
}

/// Operand shape of a filter argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Shape {
    /// A single string
    Scalar,
    /// An ordered list of strings
    Collection,
}

impl Shape {
    /// The type a declaration uses for this shape.
    pub fn expr_type(self) -> ExprType {
        match self {
            Shape::Scalar => ExprType::String,
            Shape::Collection => ExprType::list(ExprType::String),
        }
    }
}

/// A compile-time constant extracted from an expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstValue {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    List(Vec<ConstValue>),
}

impl ConstValue {
    pub fn type_of(&self) -> ExprType {
        match self {
            ConstValue::Null => ExprType::Null,
            ConstValue::Bool(_) => ExprType::Bool,
            ConstValue::Int(_) => ExprType::Int,
            ConstValue::Double(_) => ExprType::Double,
            ConstValue::String(_) => ExprType::String,
            ConstValue::List(items) => ExprType::list(common_type(items.iter().map(ConstValue::type_of))),
        }
    }
}

impl From<&str> for ConstValue {
    fn from(value: &str) -> Self {
        ConstValue::String(value.to_string())
    }
}

impl From<String> for ConstValue {
    fn from(value: String) -> Self {
        ConstValue::String(value)
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Null => write!(f, "null"),
            ConstValue::Bool(b) => write!(f, "{}", b),
            ConstValue::Int(n) => write!(f, "{}", n),
            ConstValue::Double(n) => write!(f, "{:?}", n),
            ConstValue::String(s) => write!(f, "{:?}", s),
            ConstValue::List(items) => write!(f, "[{}]", items.iter().join(", ")),
        }
    }
}

/// Element type shared by every item, `Dyn` when empty or mixed.
pub(crate) fn common_type(mut types: impl Iterator<Item = ExprType>) -> ExprType {
    let Some(first) = types.next() else {
        return ExprType::Dyn;
    };

    if types.all(|ty| ty == first) {
        first
    } else {
        ExprType::Dyn
    }
}
