/// Source position as `(line, col)`, both 1-indexed.
pub type Position = (usize, usize);

/// The closed set of token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Unknown,
    // Arithmetic operators
    Plus,
    Minus,
    Mult,
    Div,
    // Relational operators
    Gt,
    Lt,
    Gte,
    Lte,
    Eq,
    NotEq,
    EqEq,
    // Logic operators
    Not,
    And,
    Or,
    // Literals
    Str,
    Number,
    Ident,
    // Keywords
    Label,
    Print,
    Input,
    Let,
    If,
    Goto,
    Then,
    Else,
    EndIf,
    While,
    Repeat,
    EndWhile,
    Rem,
}

impl TokenKind {
    /// Debug name of the kind, as used by the bracketed tree renderer.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Unknown => "UNKNOWN",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Mult => "MULT",
            TokenKind::Div => "DIV",
            TokenKind::Gt => "GT",
            TokenKind::Lt => "LT",
            TokenKind::Gte => "GTE",
            TokenKind::Lte => "LTE",
            TokenKind::Eq => "EQ",
            TokenKind::NotEq => "NOTEQ",
            TokenKind::EqEq => "EQEQ",
            TokenKind::Not => "NOT",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::Str => "STRING",
            TokenKind::Number => "NUMBER",
            TokenKind::Ident => "IDENT",
            TokenKind::Label => "LABEL",
            TokenKind::Print => "PRINT",
            TokenKind::Input => "INPUT",
            TokenKind::Let => "LET",
            TokenKind::If => "IF",
            TokenKind::Goto => "GOTO",
            TokenKind::Then => "THEN",
            TokenKind::Else => "ELSE",
            TokenKind::EndIf => "ENDIF",
            TokenKind::While => "WHILE",
            TokenKind::Repeat => "REPEAT",
            TokenKind::EndWhile => "ENDWHILE",
            TokenKind::Rem => "REM",
        }
    }

    /// Canonical source spelling for kinds with a fixed textual form, i.e.
    /// operators and keywords. Literals and `Unknown` have none.
    pub fn spelling(&self) -> Option<&'static str> {
        match self {
            TokenKind::Plus => Some("+"),
            TokenKind::Minus => Some("-"),
            TokenKind::Mult => Some("*"),
            TokenKind::Div => Some("/"),
            TokenKind::Gt => Some(">"),
            TokenKind::Lt => Some("<"),
            TokenKind::Gte => Some(">="),
            TokenKind::Lte => Some("<="),
            TokenKind::Eq => Some("="),
            TokenKind::NotEq => Some("!="),
            TokenKind::EqEq => Some("=="),
            TokenKind::Not => Some("!"),
            TokenKind::And => Some("&&"),
            TokenKind::Or => Some("||"),
            TokenKind::Label => Some("LABEL"),
            TokenKind::Print => Some("PRINT"),
            TokenKind::Input => Some("INPUT"),
            TokenKind::Let => Some("LET"),
            TokenKind::If => Some("IF"),
            TokenKind::Goto => Some("GOTO"),
            TokenKind::Then => Some("THEN"),
            TokenKind::Else => Some("ELSE"),
            TokenKind::EndIf => Some("ENDIF"),
            TokenKind::While => Some("WHILE"),
            TokenKind::Repeat => Some("REPEAT"),
            TokenKind::EndWhile => Some("ENDWHILE"),
            TokenKind::Rem => Some("REM"),
            TokenKind::Str | TokenKind::Number | TokenKind::Ident | TokenKind::Unknown => None,
        }
    }

    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Mult
                | TokenKind::Div
                | TokenKind::Gt
                | TokenKind::Lt
                | TokenKind::Gte
                | TokenKind::Lte
                | TokenKind::Eq
                | TokenKind::NotEq
                | TokenKind::EqEq
                | TokenKind::Not
                | TokenKind::And
                | TokenKind::Or
        )
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, TokenKind::Str | TokenKind::Number | TokenKind::Ident)
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Label
                | TokenKind::Print
                | TokenKind::Input
                | TokenKind::Let
                | TokenKind::If
                | TokenKind::Goto
                | TokenKind::Then
                | TokenKind::Else
                | TokenKind::EndIf
                | TokenKind::While
                | TokenKind::Repeat
                | TokenKind::EndWhile
                | TokenKind::Rem
        )
    }

    pub fn is_relop(&self) -> bool {
        matches!(
            self,
            TokenKind::EqEq
                | TokenKind::NotEq
                | TokenKind::Gt
                | TokenKind::Gte
                | TokenKind::Lt
                | TokenKind::Lte
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Textual payload, present for `Str`, `Number` and `Ident` tokens.
    pub text: Option<String>,
    pub pos: Position,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, pos: Position) -> Self {
        Self {
            kind,
            text: Some(text.into()),
            pos,
        }
    }

    /// A token without a textual payload (operators, keywords, `Unknown`).
    pub fn simple(kind: TokenKind, pos: Position) -> Self {
        Self {
            kind,
            text: None,
            pos,
        }
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    /// The text this token stands for in the source: the payload for
    /// literals, the canonical spelling for everything else.
    pub fn render(&self) -> &str {
        match &self.text {
            Some(text) => text.as_str(),
            None => self.kind.spelling().unwrap_or(""),
        }
    }
}
