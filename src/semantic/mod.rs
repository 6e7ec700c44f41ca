//! Semantic analysis for Tiny BASIC.
//!
//! A second pre-order walk over the syntax tree, consuming the name table.
//! The analyzer only reports; it never modifies the tree. Identifiers
//! directly after `LABEL` or `GOTO` are label references and exempt from the
//! variable checks.
use crate::ast::{Ast, GrammarKind, NodeId, WalkEvent};
use crate::errors::{ErrorCategory, ErrorReporter};
use crate::lexer::{Token, TokenKind};
use crate::names::NameTable;

pub struct SemanticAnalyzer<'a, 't> {
    ast: &'a Ast<'t>,
    table: &'a NameTable,
}

impl<'a, 't> SemanticAnalyzer<'a, 't> {
    pub fn new(ast: &'a Ast<'t>, table: &'a NameTable) -> Self {
        Self { ast, table }
    }

    pub fn check(&self, reporter: &mut ErrorReporter) {
        for event in self.ast.walk() {
            let WalkEvent::Token(node, index) = event else {
                continue;
            };
            let Some(token) = self.ast.tokens().get(index) else {
                continue;
            };
            match token.kind {
                TokenKind::Goto => self.check_goto(node, reporter),
                TokenKind::Label => self.check_label(node, token, reporter),
                TokenKind::Ident => self.check_ident(node, token, reporter),
                _ => {}
            }
        }
    }

    /// The target of a `GOTO` must name an existing label.
    fn check_goto(&self, node: NodeId, reporter: &mut ErrorReporter) {
        let Some(ident) = self.sibling_ident(node) else {
            return;
        };
        let Some(name) = ident.text.as_deref() else {
            return;
        };
        if !self.table.labels.contains_key(name) {
            reporter.add(
                ErrorCategory::Semantic,
                self.ast.filename(),
                ident.pos,
                format!("label {name} does not exist"),
            );
        }
    }

    /// A label name may be declared once. The name table keeps the first
    /// declaration, so any `LABEL` whose keyword position differs from the
    /// recorded one is a duplicate.
    fn check_label(&self, node: NodeId, keyword: &Token, reporter: &mut ErrorReporter) {
        let Some(ident) = self.sibling_ident(node) else {
            return;
        };
        let Some(name) = ident.text.as_deref() else {
            return;
        };
        let Some(info) = self.table.labels.get(name) else {
            return;
        };
        if info.decl_pos != keyword.pos {
            let (line, col) = info.decl_pos;
            reporter.add(
                ErrorCategory::Semantic,
                self.ast.filename(),
                ident.pos,
                format!("duplicate label {name}, already defined at {line}:{col}"),
            );
        }
    }

    fn check_ident(&self, node: NodeId, token: &Token, reporter: &mut ErrorReporter) {
        let Some(name) = token.text.as_deref() else {
            return;
        };
        // Label names are resolved through the label table only
        if self.table.labels.contains_key(name) {
            return;
        }
        // Identifiers directly after LABEL or GOTO are label references
        if self.is_jump_target(node) {
            return;
        }
        let Some(info) = self.table.variables.get(name) else {
            reporter.add(
                ErrorCategory::Semantic,
                self.ast.filename(),
                token.pos,
                format!("variable {name} has not been defined"),
            );
            return;
        };
        if token.pos < info.decl_pos {
            let (line, col) = info.decl_pos;
            reporter.add(
                ErrorCategory::Semantic,
                self.ast.filename(),
                token.pos,
                format!("variable {name} used before its declaration at {line}:{col}"),
            );
            return;
        }
        self.check_self_reference(node, token, name, reporter);
    }

    /// In `LET x = EXPR`, an occurrence of `x` anywhere inside `EXPR` refers
    /// to the binding being established and is an error. The walk goes up to
    /// the nearest STATEMENT ancestor, so uses nested deep inside the
    /// expression are found too.
    fn check_self_reference(
        &self,
        node: NodeId,
        token: &Token,
        name: &str,
        reporter: &mut ErrorReporter,
    ) {
        let Some(statement) = self.nearest_statement(node) else {
            return;
        };
        let Some(keyword) = self.ast.first_child(statement) else {
            return;
        };
        if self.ast.token(keyword).map(|t| t.kind) != Some(TokenKind::Let) {
            return;
        }
        let Some(decl_node) = self.ast.next_sibling(keyword) else {
            return;
        };
        // The declared identifier itself is not a use
        if decl_node == node {
            return;
        }
        let Some(decl_token) = self.ast.token(decl_node) else {
            return;
        };
        if decl_token.kind != TokenKind::Ident || decl_token.text.as_deref() != Some(name) {
            return;
        }
        reporter.add(
            ErrorCategory::Semantic,
            self.ast.filename(),
            token.pos,
            format!("variable {name} is referenced in its own declaration"),
        );
    }

    /// Whether `node` is the identifier directly following a LABEL or GOTO
    /// keyword in a statement.
    fn is_jump_target(&self, node: NodeId) -> bool {
        let Some(parent) = self.ast.parent(node) else {
            return false;
        };
        if self.ast.grammar_kind(parent) != Some(GrammarKind::Statement) {
            return false;
        }
        let Some(first) = self.ast.first_child(parent) else {
            return false;
        };
        matches!(
            self.ast.token(first).map(|t| t.kind),
            Some(TokenKind::Label | TokenKind::Goto)
        )
    }

    fn nearest_statement(&self, node: NodeId) -> Option<NodeId> {
        let mut current = self.ast.parent(node);
        while let Some(id) = current {
            if self.ast.grammar_kind(id) == Some(GrammarKind::Statement) {
                return Some(id);
            }
            current = self.ast.parent(id);
        }
        None
    }

    fn sibling_ident(&self, node: NodeId) -> Option<&'t Token> {
        let sibling = self.ast.next_sibling(node)?;
        let token = self.ast.token(sibling)?;
        (token.kind == TokenKind::Ident).then_some(token)
    }
}
