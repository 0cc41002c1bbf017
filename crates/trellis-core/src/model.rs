//! Core data structures for the symbol graph

use std::borrow::{Borrow, Cow};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a node, stable across rebuilds as long as the owning file
/// path and declaration name are unchanged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Id of a top-level declaration: `{file}#{name}`.
    pub fn declaration(file: &str, name: &str) -> Self {
        NodeId(format!("{file}#{name}"))
    }

    /// Id of the synthetic per-file caller node: `{file}@caller`.
    pub fn caller(file: &str) -> Self {
        NodeId(format!("{file}@caller"))
    }

    /// Id of the node standing for one import specifier of a file.
    pub fn import(file: &str, specifier: &str) -> Self {
        NodeId(format!("{file}#import:{specifier}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        NodeId(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        NodeId(value)
    }
}

/// Edge identifier, derived from `from`, `to` and `kind`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Deterministic id for a relationship: `{kind}:{from}->{to}`.
    ///
    /// `\` and `>` inside an endpoint are backslash-escaped, so the only bare
    /// `>` is the separator and distinct relationships never share an id.
    pub fn derive(from: &NodeId, to: &NodeId, kind: EdgeKind) -> Self {
        EdgeId(format!("{}:{}->{}", kind.as_str(), escape_endpoint(from.as_str()), escape_endpoint(to.as_str())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn escape_endpoint(id: &str) -> Cow<'_, str> {
    if !id.contains(['\\', '>']) {
        return Cow::Borrowed(id);
    }
    let mut escaped = String::with_capacity(id.len() + 2);
    for c in id.chars() {
        if matches!(c, '\\' | '>') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    Cow::Owned(escaped)
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EdgeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EdgeId {
    fn from(value: &str) -> Self {
        EdgeId(value.to_string())
    }
}

impl From<String> for EdgeId {
    fn from(value: String) -> Self {
        EdgeId(value)
    }
}

/// Declaration category of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Function,
    Class,
    Interface,
    TypeAlias,
    Variable,
    Import,
    /// Synthetic per-file anchor for call edges.
    Caller,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Function => "function",
            NodeKind::Class => "class",
            NodeKind::Interface => "interface",
            NodeKind::TypeAlias => "typeAlias",
            NodeKind::Variable => "variable",
            NodeKind::Import => "import",
            NodeKind::Caller => "caller",
        }
    }
}

/// What kind of relationship an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// File imports a module specifier (unresolved).
    Imports,
    /// Caller node calls a resolved function declaration.
    Calls,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Imports => "imports",
            EdgeKind::Calls => "calls",
        }
    }
}

/// Byte span of a declaration inside its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        TextRange { start, end }
    }
}

/// A single node in the symbol graph. Nodes never own edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<TextRange>,
}

impl GraphNode {
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, label: impl Into<String>) -> Self {
        GraphNode {
            id: id.into(),
            kind,
            label: label.into(),
            file: None,
            range: None,
        }
    }

    /// A top-level declaration of `file`.
    pub fn declaration(file: &str, name: &str, kind: NodeKind, range: TextRange) -> Self {
        GraphNode {
            id: NodeId::declaration(file, name),
            kind,
            label: name.to_string(),
            file: Some(file.to_string()),
            range: Some(range),
        }
    }

    /// The caller node of `file`.
    pub fn caller(file: &str) -> Self {
        let name = file.rsplit('/').next().unwrap_or(file);
        GraphNode {
            id: NodeId::caller(file),
            kind: NodeKind::Caller,
            label: format!("{name} (caller)"),
            file: Some(file.to_string()),
            range: None,
        }
    }

    /// The node standing for `import ... from specifier` in `file`.
    pub fn import(file: &str, specifier: &str, range: Option<TextRange>) -> Self {
        GraphNode {
            id: NodeId::import(file, specifier),
            kind: NodeKind::Import,
            label: specifier.to_string(),
            file: Some(file.to_string()),
            range,
        }
    }
}

/// A directed edge. `from`/`to` may name ids that are not nodes of the
/// graph, e.g. a file path or a raw module specifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
}

impl GraphEdge {
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>, kind: EdgeKind) -> Self {
        let from = from.into();
        let to = to.into();
        GraphEdge {
            id: EdgeId::derive(&from, &to, kind),
            from,
            to,
            kind,
        }
    }
}
