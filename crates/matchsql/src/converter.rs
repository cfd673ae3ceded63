//! Interface between filter extensions and the host tree-to-text compiler.

use crate::error::Result;
use crate::types::{ConstValue, ExprType};

/// The host compiler, as seen by an extension.
///
/// Extensions never inspect nodes directly: they ask the host for a node's type
/// or constant value and let it write the node's SQL text.
pub trait Converter {
    /// Expression node type of the host tree
    type Node;

    /// Resolves the type of a sub-expression.
    fn get_type(&self, node: &Self::Node) -> ExprType;

    /// Compiles a sub-expression and writes its text.
    fn visit(&mut self, node: &Self::Node) -> Result<()>;

    /// Writes raw SQL text.
    fn write_str(&mut self, text: &str);

    /// Writes a literal value, inline or as a query parameter.
    fn write_value(&mut self, value: ConstValue);

    /// Extracts the compile-time constant of a sub-expression.
    ///
    /// Fails with [`crate::Error::ConstValueRequired`] when the node is not a constant.
    fn const_value(&self, node: &Self::Node) -> Result<ConstValue>;
}

/// A set of functions compiled outside the host's own function table.
pub trait Extension<C: Converter> {
    fn implements_function(&self, function: &str) -> bool;

    fn call_function(
        &self,
        con: &mut C,
        function: &str,
        target: &C::Node,
        args: &[C::Node],
    ) -> Result<()>;
}
