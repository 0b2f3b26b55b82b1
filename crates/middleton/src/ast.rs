//! The parse tree produced by [`parse`](crate::parser::parse).
//!
//! Nodes live in a flat arena and refer to each other through [`NodeId`]
//! handles. A node's parent is a plain back-reference; the arena owns every
//! node, and each node lists its children in parse order. Node 0 is always
//! the root.

use std::fmt;

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Identifier(pub String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A string literal exactly as written, surrounding quotes included.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StringLiteral(pub String);

impl StringLiteral {
    pub fn raw(&self) -> &str {
        &self.0
    }

    /// The text between the quotes.
    pub fn contents(&self) -> &str {
        let raw = self.0.as_str();
        raw.strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .unwrap_or(raw)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Param {
    pub ty: Identifier,
    pub name: Identifier,
}

/// The contents of an `if` condition, an `if` block or a function body.
///
/// There is no expression grammar: a body is either empty or holds exactly
/// one nested statement, which is a child of the enclosing node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Body {
    Empty,
    Nested(NodeId),
}

impl Body {
    pub fn nested(&self) -> Option<NodeId> {
        match self {
            Body::Empty => None,
            Body::Nested(id) => Some(*id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Statement {
    /// `swyk name`
    ModuleDecl { name: Identifier },
    /// `notes ( "..." ... )`
    NotesDecl { entries: Vec<StringLiteral> },
    /// `MFunc name ( Type param ... ) { body }`
    FuncDecl {
        name: Identifier,
        params: Vec<Param>,
        body: Body,
    },
    /// `if ( condition ) { body }`
    IfStmt { condition: Body, body: Body },
}

impl Statement {
    /// Nested statement nodes, in source order.
    pub fn nested(&self) -> Vec<NodeId> {
        match self {
            Statement::ModuleDecl { .. } | Statement::NotesDecl { .. } => vec![],
            Statement::FuncDecl { body, .. } => body.nested().into_iter().collect(),
            Statement::IfStmt { condition, body } => {
                condition.nested().into_iter().chain(body.nested()).collect()
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum NodePayload {
    Root,
    Statement(Statement),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub payload: NodePayload,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

impl Ast {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: vec![],
                payload: NodePayload::Root,
            }],
        }
    }

    /// Adds a statement node and adopts the nodes its bodies refer to.
    ///
    /// Nested statements are parsed before the statement that contains them,
    /// so their parent is filled in here.
    pub(crate) fn push_statement(&mut self, statement: Statement) -> NodeId {
        let id = NodeId(self.nodes.len());
        let children = statement.nested();
        for child in &children {
            self.nodes[child.0].parent = Some(id);
        }
        self.nodes.push(Node {
            parent: None,
            children,
            payload: NodePayload::Statement(statement),
        });
        id
    }

    pub(crate) fn attach_to_root(&mut self, id: NodeId) {
        self.nodes[id.0].parent = Some(NodeId::ROOT);
        self.nodes[NodeId::ROOT.0].children.push(id);
    }

    pub fn root(&self) -> &Node {
        &self.nodes[NodeId::ROOT.0]
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn statement(&self, id: NodeId) -> Option<&Statement> {
        match &self.node(id)?.payload {
            NodePayload::Statement(statement) => Some(statement),
            NodePayload::Root => None,
        }
    }

    /// Top-level statements in source order.
    pub fn top_level(&self) -> impl Iterator<Item = (NodeId, &Statement)> + '_ {
        self.root()
            .children
            .iter()
            .filter_map(|id| self.statement(*id).map(|statement| (*id, statement)))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root().children.is_empty()
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match self.statement(id) {
            None => writeln!(f, "{indent}Root")?,
            Some(Statement::ModuleDecl { name }) => {
                writeln!(f, "{indent}ModuleDecl {}", name.as_str())?
            }
            Some(Statement::NotesDecl { entries }) => {
                let entries = entries
                    .iter()
                    .map(StringLiteral::raw)
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(f, "{indent}NotesDecl ({entries})")?
            }
            Some(Statement::FuncDecl { name, params, .. }) => {
                let params = params
                    .iter()
                    .map(|param| format!("{} {}", param.ty.as_str(), param.name.as_str()))
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(f, "{indent}FuncDecl {}({params})", name.as_str())?
            }
            Some(Statement::IfStmt { .. }) => writeln!(f, "{indent}IfStmt")?,
        }

        for child in self.children(id) {
            self.write_node(f, *child, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, NodeId::ROOT, 0)
    }
}
