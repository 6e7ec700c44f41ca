//! Recursive-descent parser for Tiny BASIC.
//!
//! The parser consumes the token stream with one token of lookahead and
//! builds the flat syntax tree. It never aborts: grammar problems are
//! reported and recovered from with panic mode, discarding tokens until a
//! statement-start keyword, a control-flow terminator or the end of the
//! stream.
use crate::ast::{Ast, GrammarKind, NodeId};
use crate::errors::{ErrorCategory, ErrorReporter};
use crate::lexer::{Position, Token, TokenKind, TokenStream};

/// Keywords that may begin a statement.
const STATEMENT_START_KEYWORDS: [TokenKind; 7] = [
    TokenKind::Print,
    TokenKind::If,
    TokenKind::While,
    TokenKind::Label,
    TokenKind::Goto,
    TokenKind::Let,
    TokenKind::Input,
];

/// Tokens that terminate (or unwind) a statement block.
const CONTROL_FLOW_TOKENS: [TokenKind; 3] =
    [TokenKind::EndIf, TokenKind::EndWhile, TokenKind::Else];

fn is_sync_token(kind: TokenKind) -> bool {
    STATEMENT_START_KEYWORDS.contains(&kind) || CONTROL_FLOW_TOKENS.contains(&kind)
}

pub struct Parser<'t, 'r> {
    tokens: &'t TokenStream,
    filename: &'r str,
    index: usize,
    reporter: &'r mut ErrorReporter,
}

impl<'t, 'r> Parser<'t, 'r> {
    pub fn new(tokens: &'t TokenStream, filename: &'r str, reporter: &'r mut ErrorReporter) -> Self {
        Self {
            tokens,
            filename,
            index: 0,
            reporter,
        }
    }

    /// Parse the whole stream into a tree. An empty stream yields an empty
    /// tree (no root node).
    pub fn parse(mut self) -> Ast<'t> {
        let mut ast = Ast::new(self.tokens, self.filename);
        if self.tokens.is_empty() {
            return ast;
        }
        let program = ast.create_root(GrammarKind::Program);
        while self.peek().is_some() {
            self.parse_statement(&mut ast, program);
        }
        ast
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.index)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|token| token.kind)
    }

    /// Consume the current token and attach it to `parent` as a leaf.
    fn bump_into(&mut self, ast: &mut Ast<'t>, parent: NodeId) -> NodeId {
        let node = ast.add_token_child(parent, self.index);
        self.index += 1;
        node
    }

    /// Position to blame when the stream ends mid-production.
    fn last_pos(&self) -> Position {
        self.tokens
            .get(self.index.saturating_sub(1))
            .map(|token| token.pos)
            .unwrap_or((1, 1))
    }

    fn error(&mut self, pos: Position, message: impl Into<String>) {
        self.reporter
            .add(ErrorCategory::Grammar, self.filename, pos, message);
    }

    /// Consume the current token if it has the expected kind, attaching it to
    /// `parent`. Reports a grammar error otherwise.
    fn expect(&mut self, ast: &mut Ast<'t>, parent: NodeId, kind: TokenKind, what: &str) -> bool {
        match self.peek() {
            Some(token) if token.kind == kind => {
                self.bump_into(ast, parent);
                true
            }
            Some(token) => {
                let (pos, found) = (token.pos, token.kind.name());
                self.error(pos, format!("expected {what}, found {found}"));
                false
            }
            None => {
                let pos = self.last_pos();
                self.error(pos, format!("expected {what}, but hit end of input"));
                false
            }
        }
    }

    /// Panic-mode recovery after an unexpected statement-start token: drop
    /// the offending token, then everything up to the next synchronizing
    /// token.
    fn recover_statement(&mut self) {
        self.index += 1;
        self.synchronize();
    }

    /// Discard tokens until a statement-start keyword, a control-flow
    /// terminator or the end of the stream.
    fn synchronize(&mut self) {
        while let Some(kind) = self.peek_kind() {
            if is_sync_token(kind) {
                return;
            }
            self.index += 1;
        }
    }

    fn parse_statement(&mut self, ast: &mut Ast<'t>, parent: NodeId) {
        let Some(token) = self.peek() else {
            return;
        };
        if !STATEMENT_START_KEYWORDS.contains(&token.kind) {
            let (pos, name) = (token.pos, token.kind.name());
            self.error(pos, format!("unexpected token {name} at start of statement"));
            self.recover_statement();
            return;
        }
        let statement = ast.add_grammar_child(parent, GrammarKind::Statement);
        match token.kind {
            TokenKind::Print => self.parse_print(ast, statement),
            TokenKind::If => self.parse_if(ast, statement),
            TokenKind::While => self.parse_while(ast, statement),
            TokenKind::Label | TokenKind::Goto => self.parse_jump_target(ast, statement),
            TokenKind::Let => self.parse_let(ast, statement),
            TokenKind::Input => self.parse_input(ast, statement),
            _ => unreachable!(),
        }
    }

    /// `"PRINT" (expression | string)`
    fn parse_print(&mut self, ast: &mut Ast<'t>, statement: NodeId) {
        self.bump_into(ast, statement);
        match self.peek_kind() {
            Some(TokenKind::Str) => {
                self.bump_into(ast, statement);
            }
            Some(_) => self.parse_expression(ast, statement),
            None => {
                let pos = self.last_pos();
                self.error(pos, "expected an expression or string after PRINT");
            }
        }
    }

    /// `"IF" comparison "THEN" {statement}* "ENDIF"`
    fn parse_if(&mut self, ast: &mut Ast<'t>, statement: NodeId) {
        self.bump_into(ast, statement);
        self.parse_comparison(ast, statement);
        // On a missing THEN we still parse the block so its statements get
        // checked
        self.expect(ast, statement, TokenKind::Then, "THEN after the comparison");
        self.parse_block(ast, statement, TokenKind::EndIf, "IF");
    }

    /// `"WHILE" comparison "REPEAT" {statement}* "ENDWHILE"`
    fn parse_while(&mut self, ast: &mut Ast<'t>, statement: NodeId) {
        self.bump_into(ast, statement);
        self.parse_comparison(ast, statement);
        self.expect(
            ast,
            statement,
            TokenKind::Repeat,
            "REPEAT after the comparison",
        );
        self.parse_block(ast, statement, TokenKind::EndWhile, "WHILE");
    }

    /// Statements up to the matching `terminator`. A foreign control-flow
    /// token closes the block at that point without being consumed, so the
    /// enclosing context can deal with it.
    fn parse_block(
        &mut self,
        ast: &mut Ast<'t>,
        statement: NodeId,
        terminator: TokenKind,
        construct: &str,
    ) {
        loop {
            match self.peek() {
                None => {
                    let pos = self.last_pos();
                    self.error(
                        pos,
                        format!(
                            "missing {} to close the {construct} statement",
                            terminator.name()
                        ),
                    );
                    return;
                }
                Some(token) if token.kind == terminator => {
                    self.bump_into(ast, statement);
                    return;
                }
                Some(token) if CONTROL_FLOW_TOKENS.contains(&token.kind) => {
                    let (pos, name) = (token.pos, token.kind.name());
                    self.error(
                        pos,
                        format!(
                            "mismatched {name} inside the {construct} statement, expected {}",
                            terminator.name()
                        ),
                    );
                    return;
                }
                Some(_) => self.parse_statement(ast, statement),
            }
        }
    }

    /// `"LABEL" ident` and `"GOTO" ident`
    fn parse_jump_target(&mut self, ast: &mut Ast<'t>, statement: NodeId) {
        let keyword = self.peek_kind().map(|kind| kind.name()).unwrap_or("");
        self.bump_into(ast, statement);
        if !self.expect(
            ast,
            statement,
            TokenKind::Ident,
            &format!("an identifier after {keyword}"),
        ) {
            self.synchronize();
        }
    }

    /// `"LET" ident "=" expression`
    fn parse_let(&mut self, ast: &mut Ast<'t>, statement: NodeId) {
        self.bump_into(ast, statement);
        if !self.expect(ast, statement, TokenKind::Ident, "an identifier after LET") {
            self.synchronize();
            return;
        }
        if !self.expect(ast, statement, TokenKind::Eq, "= after the identifier") {
            self.synchronize();
            return;
        }
        self.parse_expression(ast, statement);
    }

    /// `"INPUT" ident`
    fn parse_input(&mut self, ast: &mut Ast<'t>, statement: NodeId) {
        self.bump_into(ast, statement);
        if !self.expect(ast, statement, TokenKind::Ident, "an identifier after INPUT") {
            self.synchronize();
        }
    }

    /// `comparison ::= expression relop expression`
    fn parse_comparison(&mut self, ast: &mut Ast<'t>, parent: NodeId) {
        let comparison = ast.add_grammar_child(parent, GrammarKind::Comparison);
        self.parse_expression(ast, comparison);
        match self.peek() {
            Some(token) if token.kind.is_relop() => {
                self.bump_into(ast, comparison);
            }
            Some(token) => {
                let (pos, name) = (token.pos, token.kind.name());
                self.error(pos, format!("expected a comparison operator, found {name}"));
                return;
            }
            None => {
                let pos = self.last_pos();
                self.error(pos, "expected a comparison operator, but hit end of input");
                return;
            }
        }
        self.parse_expression(ast, comparison);
    }

    /// `expression ::= term {("+" | "-") term}`
    fn parse_expression(&mut self, ast: &mut Ast<'t>, parent: NodeId) {
        let expression = ast.add_grammar_child(parent, GrammarKind::Expression);
        self.parse_term(ast, expression);
        while matches!(self.peek_kind(), Some(TokenKind::Plus | TokenKind::Minus)) {
            self.bump_into(ast, expression);
            self.parse_term(ast, expression);
        }
    }

    /// `term ::= unary {("*" | "/") unary}`
    fn parse_term(&mut self, ast: &mut Ast<'t>, parent: NodeId) {
        let term = ast.add_grammar_child(parent, GrammarKind::Term);
        self.parse_unary(ast, term);
        while matches!(self.peek_kind(), Some(TokenKind::Mult | TokenKind::Div)) {
            self.bump_into(ast, term);
            self.parse_unary(ast, term);
        }
    }

    /// `unary ::= ["+" | "-"] primary`
    fn parse_unary(&mut self, ast: &mut Ast<'t>, parent: NodeId) {
        let unary = ast.add_grammar_child(parent, GrammarKind::Unary);
        if matches!(self.peek_kind(), Some(TokenKind::Plus | TokenKind::Minus)) {
            self.bump_into(ast, unary);
        }
        self.parse_primary(ast, unary);
    }

    /// `primary ::= number | ident`
    fn parse_primary(&mut self, ast: &mut Ast<'t>, parent: NodeId) {
        let primary = ast.add_grammar_child(parent, GrammarKind::Primary);
        match self.peek() {
            Some(token) if matches!(token.kind, TokenKind::Number | TokenKind::Ident) => {
                self.bump_into(ast, primary);
            }
            Some(token) => {
                let (pos, name) = (token.pos, token.kind.name());
                self.error(pos, format!("expected a number or identifier, found {name}"));
            }
            None => {
                let pos = self.last_pos();
                self.error(pos, "expected a number or identifier, but hit end of input");
            }
        }
    }
}
