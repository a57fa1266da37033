// Copyright 2025 SQuID Lab, Niels Bohr Institute
// SPDX-License-Identifier: Apache-2.0

//! In-memory view of the QuAM component tree.
//!
//! Nodes are addressed by slash separated paths (`/qubits/q0/xy`). An
//! attribute is either a literal or a QuAM reference string:
//!
//! * `#/shared/amplitude` - absolute, attribute `amplitude` on node `/shared`
//! * `#./length` - attribute `length` on the same node
//! * `#../../xy/frequency` - relative to an ancestor

use std::fmt;

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// Normalized path of a node in the component tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(String);

impl NodePath {
    pub fn root() -> Self {
        NodePath("/".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    pub fn join(&self, child: &str) -> Self {
        NodePath::from_segments(self.segments().chain(child.split('/')))
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let segments: Vec<_> = self.segments().collect();
        Some(NodePath::from_segments(
            segments[..segments.len() - 1].iter().copied(),
        ))
    }

    /// Last path segment, empty for the root.
    pub fn name(&self) -> &str {
        self.segments().last().unwrap_or("")
    }

    fn from_segments<'a>(segments: impl Iterator<Item = &'a str>) -> Self {
        let joined = segments
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        NodePath(format!("/{joined}"))
    }

    /// Resolve a QuAM reference relative to this node.
    ///
    /// Returns the node holding the referenced attribute and the attribute name.
    pub fn resolve_reference(&self, reference: &str) -> Result<(NodePath, String)> {
        let unresolved = |reason: String| Error::UnresolvedParameter {
            node: self.to_string(),
            attribute: reference.to_string(),
            reason,
        };
        let Some(body) = reference.strip_prefix('#') else {
            return Err(unresolved("not a reference".to_string()));
        };
        let (mut segments, relative): (Vec<&str>, _) = match body.strip_prefix('/') {
            Some(absolute) => (vec![], absolute),
            None => (self.segments().collect(), body),
        };
        let mut parts: Vec<&str> = relative.split('/').collect();
        let attribute = parts.pop().unwrap_or("");
        if attribute.is_empty() || attribute == "." || attribute == ".." {
            return Err(unresolved("reference does not name an attribute".to_string()));
        }
        for part in parts {
            match part {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(unresolved("reference escapes the root node".to_string()));
                    }
                }
                name => segments.push(name),
            }
        }
        Ok((
            NodePath::from_segments(segments.into_iter()),
            attribute.to_string(),
        ))
    }
}

impl From<&str> for NodePath {
    fn from(value: &str) -> Self {
        NodePath::from_segments(value.split('/'))
    }
}

impl From<String> for NodePath {
    fn from(value: String) -> Self {
        NodePath::from(value.as_str())
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Literal attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Samples(Vec<f64>),
    /// Digital marker as (level, length in ns) pairs.
    Marker(Vec<(i64, i64)>),
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<Vec<f64>> for Value {
    fn from(value: Vec<f64>) -> Self {
        Value::Samples(value)
    }
}

impl From<Vec<(i64, i64)>> for Value {
    fn from(value: Vec<(i64, i64)>) -> Self {
        Value::Marker(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Literal(Value),
    Reference(String),
}

/// Read contract of the component tree consumed by the resolver.
pub trait ComponentTree {
    fn attribute(&self, node: &NodePath, name: &str) -> Option<&Attribute>;
}

/// Component tree backed by an ordered map of nodes.
#[derive(Debug, Clone, Default)]
pub struct ParameterTree {
    nodes: IndexMap<NodePath, IndexMap<String, Attribute>>,
}

impl ParameterTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, node: impl Into<NodePath>, name: &str, value: impl Into<Value>) {
        self.insert(node.into(), name, Attribute::Literal(value.into()));
    }

    pub fn set_reference(&mut self, node: impl Into<NodePath>, name: &str, reference: &str) {
        self.insert(node.into(), name, Attribute::Reference(reference.to_string()));
    }

    fn insert(&mut self, node: NodePath, name: &str, attribute: Attribute) {
        self.nodes
            .entry(node)
            .or_default()
            .insert(name.to_string(), attribute);
    }

    pub fn remove(&mut self, node: &NodePath, name: &str) -> Option<Attribute> {
        self.nodes.get_mut(node)?.shift_remove(name)
    }

    pub fn contains_node(&self, node: &NodePath) -> bool {
        self.nodes.contains_key(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodePath> {
        self.nodes.keys()
    }

    pub fn attributes(&self, node: &NodePath) -> impl Iterator<Item = (&String, &Attribute)> {
        self.nodes.get(node).into_iter().flat_map(|attrs| attrs.iter())
    }
}

impl ComponentTree for ParameterTree {
    fn attribute(&self, node: &NodePath, name: &str) -> Option<&Attribute> {
        self.nodes.get(node)?.get(name)
    }
}
