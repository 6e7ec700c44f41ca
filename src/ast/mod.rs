//! Flat syntax tree for Tiny BASIC.
//!
//! Nodes live in a single vector and refer to each other by [`NodeId`], in
//! left-child/right-sibling form. Grammar nodes carry a [`GrammarKind`] and a
//! child chain; token nodes are leaves referring into the [`TokenStream`] by
//! index. Node ids are stable for the lifetime of the tree and nodes are
//! never removed.
use crate::lexer::{Token, TokenStream};

/// Handle into the tree's node vector. Absence is expressed as
/// `Option<NodeId>`.
pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarKind {
    Program,
    Statement,
    Comparison,
    Expression,
    Term,
    Unary,
    Primary,
}

impl GrammarKind {
    pub fn name(&self) -> &'static str {
        match self {
            GrammarKind::Program => "PROGRAM",
            GrammarKind::Statement => "STATEMENT",
            GrammarKind::Comparison => "COMPARISON",
            GrammarKind::Expression => "EXPRESSION",
            GrammarKind::Term => "TERM",
            GrammarKind::Unary => "UNARY",
            GrammarKind::Primary => "PRIMARY",
        }
    }
}

#[derive(Debug, Clone)]
enum NodeData {
    Grammar {
        kind: GrammarKind,
        first_child: Option<NodeId>,
        last_child: Option<NodeId>,
    },
    Token {
        index: usize,
    },
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

/// Events produced by a pre-order walk of the tree. Grammar nodes produce an
/// `Enter`/`Leave` pair around their children; token nodes produce a single
/// `Token` event carrying the token-stream index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkEvent {
    Enter(NodeId, GrammarKind),
    Leave(NodeId, GrammarKind),
    Token(NodeId, usize),
}

#[derive(Debug)]
pub struct Ast<'t> {
    nodes: Vec<Node>,
    head: Option<NodeId>,
    tokens: &'t TokenStream,
    filename: String,
}

impl<'t> Ast<'t> {
    pub fn new(tokens: &'t TokenStream, filename: impl Into<String>) -> Self {
        Self {
            nodes: vec![],
            head: None,
            tokens,
            filename: filename.into(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn tokens(&self) -> &'t TokenStream {
        self.tokens
    }

    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Create the root grammar node. There can be only one.
    pub fn create_root(&mut self, kind: GrammarKind) -> NodeId {
        debug_assert!(self.head.is_none(), "tree already has a root");
        let id = self.push(NodeData::Grammar {
            kind,
            first_child: None,
            last_child: None,
        });
        self.head = Some(id);
        id
    }

    /// Append a new grammar node to `parent`'s child chain.
    pub fn add_grammar_child(&mut self, parent: NodeId, kind: GrammarKind) -> NodeId {
        let id = self.push(NodeData::Grammar {
            kind,
            first_child: None,
            last_child: None,
        });
        self.link_child(parent, id);
        id
    }

    /// Append a new token leaf to `parent`'s child chain. `token_index`
    /// refers into the token stream this tree borrows.
    pub fn add_token_child(&mut self, parent: NodeId, token_index: usize) -> NodeId {
        let id = self.push(NodeData::Token { index: token_index });
        self.link_child(parent, id);
        id
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            data,
            parent: None,
            next_sibling: None,
        });
        id
    }

    fn link_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child].parent = Some(parent);
        let previous_last = match &self.nodes[parent].data {
            NodeData::Grammar { last_child, .. } => *last_child,
            NodeData::Token { .. } => {
                debug_assert!(false, "token nodes cannot have children");
                return;
            }
        };
        match previous_last {
            None => {
                if let NodeData::Grammar { first_child, .. } = &mut self.nodes[parent].data {
                    *first_child = Some(child);
                }
            }
            Some(prev) => self.nodes[prev].next_sibling = Some(child),
        }
        if let NodeData::Grammar { last_child, .. } = &mut self.nodes[parent].data {
            *last_child = Some(child);
        }
    }

    pub fn is_grammar(&self, id: NodeId) -> bool {
        matches!(self.nodes[id].data, NodeData::Grammar { .. })
    }

    pub fn is_token(&self, id: NodeId) -> bool {
        matches!(self.nodes[id].data, NodeData::Token { .. })
    }

    pub fn grammar_kind(&self, id: NodeId) -> Option<GrammarKind> {
        match self.nodes[id].data {
            NodeData::Grammar { kind, .. } => Some(kind),
            NodeData::Token { .. } => None,
        }
    }

    pub fn token_index(&self, id: NodeId) -> Option<usize> {
        match self.nodes[id].data {
            NodeData::Token { index } => Some(index),
            NodeData::Grammar { .. } => None,
        }
    }

    /// Resolve a token node to its token in the stream.
    pub fn token(&self, id: NodeId) -> Option<&'t Token> {
        self.token_index(id).and_then(|index| self.tokens.get(index))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        match self.nodes[id].data {
            NodeData::Grammar { first_child, .. } => first_child,
            NodeData::Token { .. } => None,
        }
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].next_sibling
    }

    /// Iterate `id`'s direct children in order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut current = self.first_child(id);
        std::iter::from_fn(move || {
            let child = current?;
            current = self.next_sibling(child);
            Some(child)
        })
    }

    /// Pre-order walk over the whole tree.
    pub fn walk(&self) -> Walk<'_, 't> {
        Walk {
            ast: self,
            pending: self.head.map(Step::Visit).into_iter().collect(),
        }
    }

    /// Pre-order walk over the subtree rooted at `id`.
    pub fn walk_from(&self, id: NodeId) -> Walk<'_, 't> {
        Walk {
            ast: self,
            pending: vec![Step::Visit(id)],
        }
    }

    /// Render the tree in bracketed form, e.g.
    /// `PROGRAM(STATEMENT(PRINT,STRING(hello)))`. The output is
    /// deterministic for a given tree.
    pub fn bracket_print(&self) -> String {
        if self.is_empty() {
            return "<EMPTY>".to_owned();
        }
        let mut out = String::new();
        for event in self.walk() {
            match event {
                WalkEvent::Enter(_, kind) => {
                    out.push_str(kind.name());
                    out.push('(');
                }
                WalkEvent::Leave(id, _) => {
                    out.push(')');
                    if self.next_sibling(id).is_some() {
                        out.push(',');
                    }
                }
                WalkEvent::Token(id, index) => {
                    let Some(token) = self.tokens.get(index) else {
                        continue;
                    };
                    out.push_str(token.kind.name());
                    if let Some(text) = &token.text {
                        out.push('(');
                        out.push_str(text);
                        out.push(')');
                    }
                    if self.next_sibling(id).is_some() {
                        out.push(',');
                    }
                }
            }
        }
        out
    }

    /// Structural matcher over the bracketed form; an empty tree matches the
    /// empty pattern.
    pub fn matches_structure(&self, expected: &str) -> bool {
        if self.is_empty() {
            return expected.is_empty();
        }
        self.bracket_print() == expected
    }

    /// Multi-line indented dump for debugging.
    pub fn tree_print(&self) -> String {
        if self.is_empty() {
            return "<EMPTY>\n".to_owned();
        }
        let mut out = String::new();
        let mut indent = 0usize;
        for event in self.walk() {
            match event {
                WalkEvent::Enter(_, kind) => {
                    out.push_str(&"  ".repeat(indent));
                    out.push('<');
                    out.push_str(kind.name());
                    out.push_str(">\n");
                    indent += 1;
                }
                WalkEvent::Leave(..) => indent -= 1,
                WalkEvent::Token(_, index) => {
                    let Some(token) = self.tokens.get(index) else {
                        continue;
                    };
                    out.push_str(&"  ".repeat(indent));
                    match &token.text {
                        Some(text) => out.push_str(&format!("TOKEN({}): {text}\n", token.kind.name())),
                        None => out.push_str(&format!("TOKEN({})\n", token.kind.name())),
                    }
                }
            }
        }
        out
    }
}

#[derive(Debug)]
enum Step {
    Visit(NodeId),
    Exit(NodeId),
}

/// Lazy pre-order traversal, driven by an explicit stack.
#[derive(Debug)]
pub struct Walk<'a, 't> {
    ast: &'a Ast<'t>,
    pending: Vec<Step>,
}

impl Iterator for Walk<'_, '_> {
    type Item = WalkEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.pending.pop()? {
            Step::Visit(id) => match self.ast.nodes[id].data {
                NodeData::Grammar { kind, .. } => {
                    self.pending.push(Step::Exit(id));
                    let children = self.ast.children(id).collect::<Vec<_>>();
                    for child in children.into_iter().rev() {
                        self.pending.push(Step::Visit(child));
                    }
                    Some(WalkEvent::Enter(id, kind))
                }
                NodeData::Token { index } => Some(WalkEvent::Token(id, index)),
            },
            Step::Exit(id) => {
                let kind = self.ast.grammar_kind(id)?;
                Some(WalkEvent::Leave(id, kind))
            }
        }
    }
}
