// Copyright 2025 SQuID Lab, Niels Bohr Institute
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::tree::{Attribute, ComponentTree, NodePath, Value};

pub const DEFAULT_MAX_REFERENCE_DEPTH: usize = 16;

/// Either a literal or a QuAM reference resolved relative to a scope node.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueOrParameter<T> {
    Value(T),
    Parameter(String),
}

impl<T> ValueOrParameter<T> {
    pub fn parameter(reference: &str) -> Self {
        ValueOrParameter::Parameter(reference.to_string())
    }
}

impl From<f64> for ValueOrParameter<f64> {
    fn from(value: f64) -> Self {
        ValueOrParameter::Value(value)
    }
}

impl From<i64> for ValueOrParameter<i64> {
    fn from(value: i64) -> Self {
        ValueOrParameter::Value(value)
    }
}

impl From<Vec<f64>> for ValueOrParameter<Vec<f64>> {
    fn from(value: Vec<f64>) -> Self {
        ValueOrParameter::Value(value)
    }
}

impl From<bool> for ValueOrParameter<bool> {
    fn from(value: bool) -> Self {
        ValueOrParameter::Value(value)
    }
}

impl From<Vec<(i64, i64)>> for ValueOrParameter<Vec<(i64, i64)>> {
    fn from(value: Vec<(i64, i64)>) -> Self {
        ValueOrParameter::Value(value)
    }
}

/// Conversion from a literal tree value.
pub trait FromValue: Sized {
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "a number";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "an integer";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            _ => None,
        }
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "a boolean";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for Vec<f64> {
    const EXPECTED: &'static str = "a list of samples";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Samples(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromValue for Vec<(i64, i64)> {
    const EXPECTED: &'static str = "a digital marker";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Marker(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// Resolves attributes of the component tree into literal values.
///
/// References are followed for at most `max_depth` hops. Each call keeps its
/// own visited set of (node, attribute) pairs; meeting a pair twice is a
/// [`Error::CyclicReference`].
pub struct ParameterResolver<'a, T: ComponentTree + ?Sized> {
    tree: &'a T,
    max_depth: usize,
}

impl<'a, T: ComponentTree + ?Sized> ParameterResolver<'a, T> {
    pub fn new(tree: &'a T, max_depth: usize) -> Self {
        Self { tree, max_depth }
    }

    pub fn resolve(&self, node: &NodePath, attribute: &str) -> Result<&'a Value> {
        let mut visited: HashSet<(NodePath, String)> = HashSet::new();
        let mut current = (node.clone(), attribute.to_string());
        for _ in 0..=self.max_depth {
            if visited.contains(&current) {
                return Err(Error::CyclicReference {
                    node: current.0.to_string(),
                    attribute: current.1,
                });
            }
            let next = match self.tree.attribute(&current.0, &current.1) {
                Some(Attribute::Literal(value)) => return Ok(value),
                Some(Attribute::Reference(reference)) => current.0.resolve_reference(reference)?,
                None => {
                    return Err(Error::UnresolvedParameter {
                        node: node.to_string(),
                        attribute: attribute.to_string(),
                        reason: format!("'{}' not found on node '{}'", current.1, current.0),
                    });
                }
            };
            visited.insert(std::mem::replace(&mut current, next));
        }
        Err(Error::UnresolvedParameter {
            node: node.to_string(),
            attribute: attribute.to_string(),
            reason: format!("no literal within {} reference hops", self.max_depth),
        })
    }

    pub fn resolve_as<V: FromValue>(&self, node: &NodePath, attribute: &str) -> Result<V> {
        let value = self.resolve(node, attribute)?;
        V::from_value(value).ok_or_else(|| Error::TypeMismatch {
            node: node.to_string(),
            attribute: attribute.to_string(),
            expected: V::EXPECTED,
        })
    }

    pub fn resolve_f64(&self, node: &NodePath, attribute: &str) -> Result<f64> {
        self.resolve_as(node, attribute)
    }

    pub fn resolve_i64(&self, node: &NodePath, attribute: &str) -> Result<i64> {
        self.resolve_as(node, attribute)
    }

    pub fn resolve_samples(&self, node: &NodePath, attribute: &str) -> Result<Vec<f64>> {
        self.resolve_as(node, attribute)
    }

    /// Resolve a literal-or-reference held by a component living at `scope`.
    pub fn resolve_value<V: FromValue + Clone>(
        &self,
        scope: &NodePath,
        value: &ValueOrParameter<V>,
    ) -> Result<V> {
        match value {
            ValueOrParameter::Value(v) => Ok(v.clone()),
            ValueOrParameter::Parameter(reference) => {
                let (node, attribute) = scope.resolve_reference(reference)?;
                self.resolve_as(&node, &attribute)
            }
        }
    }
}
