//! Name table for variables, labels and interned string literals.
//!
//! Built from a single pre-order walk of the syntax tree and immutable
//! afterwards. Variables and labels live in disjoint namespaces.
use indexmap::IndexMap;

use crate::ast::{Ast, WalkEvent};
use crate::lexer::{Position, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolInfo {
    pub decl_pos: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelInfo {
    pub decl_pos: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralInfo {
    /// Monotone id assigned in first-seen order; rendered as `_static_<id>`
    /// by the emitter.
    pub label: u32,
    pub first_seen_pos: Position,
}

#[derive(Debug, Default)]
pub struct NameTable {
    /// Variable name → declaration. Re-declaration overwrites.
    pub variables: IndexMap<String, SymbolInfo>,
    /// Label name → declaration. The first declaration wins, so duplicates
    /// can be reported against it.
    pub labels: IndexMap<String, LabelInfo>,
    /// Literal text → interned label. Fixed upon first insertion.
    pub literals: IndexMap<String, LiteralInfo>,
}

impl NameTable {
    pub fn collect(ast: &Ast) -> NameTable {
        let mut table = NameTable::default();
        for event in ast.walk() {
            let WalkEvent::Token(node, index) = event else {
                continue;
            };
            let Some(token) = ast.tokens().get(index) else {
                continue;
            };
            match token.kind {
                TokenKind::Str => {
                    let Some(text) = &token.text else {
                        continue;
                    };
                    let next_label = table.literals.len() as u32;
                    table
                        .literals
                        .entry(text.clone())
                        .or_insert(LiteralInfo {
                            label: next_label,
                            first_seen_pos: token.pos,
                        });
                }
                TokenKind::Label => {
                    let Some(name) = sibling_ident(ast, node) else {
                        continue;
                    };
                    table
                        .labels
                        .entry(name.to_owned())
                        .or_insert(LabelInfo {
                            decl_pos: token.pos,
                        });
                }
                TokenKind::Let => {
                    let Some(name) = sibling_ident(ast, node) else {
                        continue;
                    };
                    table.variables.insert(
                        name.to_owned(),
                        SymbolInfo {
                            decl_pos: token.pos,
                        },
                    );
                }
                _ => {}
            }
        }
        table
    }
}

/// Text of the identifier token directly following `node` in its sibling
/// chain, if there is one.
fn sibling_ident<'t>(ast: &Ast<'t>, node: crate::ast::NodeId) -> Option<&'t str> {
    let sibling = ast.next_sibling(node)?;
    let token = ast.token(sibling)?;
    if token.kind != TokenKind::Ident {
        return None;
    }
    token.text.as_deref()
}
