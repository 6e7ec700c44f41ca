//! x86-64 code generator.
//!
//! A pre-order walk over the syntax tree that writes Intel-syntax, GAS
//! compatible assembly. Expressions are evaluated on a two-register scheme:
//! results land in `rax`, the right-hand side of a binary operation is staged
//! through `rbx`, and intermediates are pushed to the machine stack. There is
//! no register allocator; for a given tree the output is byte-identical
//! across runs.
use std::io::{self, Write};

use crate::asm::{Instruction, JumpCond, Operand, Reg};
use crate::ast::{Ast, GrammarKind, NodeId};
use crate::lexer::TokenKind;
use crate::names::NameTable;
use crate::target::Os;

pub const LITERAL_PREFIX: &str = "_static_";
pub const VARIABLE_PREFIX: &str = "_var_";
pub const USER_LABEL_PREFIX: &str = ".L";
pub const INTERNAL_LABEL_PREFIX: &str = ".IL";

const PRINT_INTEGER: &str = "print_integer";
const PRINT_STRING: &str = "print_string";
const INPUT_INTEGER: &str = "input_integer";

const PREAMBLE: &str = ".intel_syntax noprefix\n\
                        .data\n\
                        \tprint_integer_fmt: .string \"%d\\n\"\n\
                        \tprint_string_fmt: .string \"%s\\n\"\n";

const MAIN_PREAMBLE: &str = ".text\n\
                             \t.global main\n\
                             main:\n";

const FUNC_PREAMBLE: &str = "\tpush rbp\n\
                             \tmov rbp, rsp\n";

const FUNC_POSTAMBLE: &str = "\tleave\n\
                              \tret\n";

const GNU_STACK_POSTAMBLE: &str = ".section .note.GNU-stack,\"\",@progbits\n";

const PRINT_INTEGER_HELPER: &str = "# Given an integer in rdi, prints it\n\
                                    print_integer:\n\
                                    \tpush rbp\n\
                                    \tmov rbp, rsp\n\
                                    \tmov rsi, rdi\n\
                                    \tlea rdi, print_integer_fmt[rip]\n\
                                    \txor rax, rax\n\
                                    \tcall printf\n\
                                    \tleave\n\
                                    \tret\n";

const PRINT_STRING_HELPER: &str = "# Given a string addr in rdi, prints it\n\
                                   print_string:\n\
                                   \tpush rbp\n\
                                   \tmov rbp, rsp\n\
                                   \tmov rsi, rdi\n\
                                   \tlea rdi, print_string_fmt[rip]\n\
                                   \txor rax, rax\n\
                                   \tcall printf\n\
                                   \tleave\n\
                                   \tret\n";

// Reads a line and interprets it as a decimal integer; a non-numeric first
// character is returned as its ASCII value, EOF as 0
const INPUT_INTEGER_HELPER: &str = "input_integer:\n\
                                    \tsub rsp, 56\n\
                                    \tmov rdi, QWORD PTR stdout[rip]\n\
                                    \tcall fflush\n\
                                    \tmov esi, 32\n\
                                    \tlea rdi, [rsp+16]\n\
                                    \tmov rdx, QWORD PTR stdin[rip]\n\
                                    \tcall fgets\n\
                                    \ttest rax, rax\n\
                                    \tje .input_integer_5\n\
                                    \tlea rsi, [rsp+8]\n\
                                    \tmov edx, 10\n\
                                    \tlea rdi, [rsp+16]\n\
                                    \tcall strtol\n\
                                    \tlea rcx, [rsp+16]\n\
                                    \tcmp QWORD PTR [rsp+8], rcx\n\
                                    \tje .input_integer_8\n\
                                    \tmov edx, 2147483648\n\
                                    \tadd rdx, rax\n\
                                    \tshr rdx, 32\n\
                                    \tjne .input_integer_5\n\
                                    \tadd rsp, 56\n\
                                    \tret\n\
                                    .input_integer_5:\n\
                                    \txor eax, eax\n\
                                    \tadd rsp, 56\n\
                                    \tret\n\
                                    .input_integer_8:\n\
                                    \tmovsx eax, BYTE PTR [rsp+16]\n\
                                    \tadd rsp, 56\n\
                                    \tret\n";

/// Jump mnemonic taken when the comparison is FALSE, per relational
/// operator.
pub fn negated_jump(kind: TokenKind) -> Option<JumpCond> {
    match kind {
        TokenKind::EqEq => Some(JumpCond::Ne),
        TokenKind::NotEq => Some(JumpCond::E),
        TokenKind::Gt => Some(JumpCond::Le),
        TokenKind::Gte => Some(JumpCond::L),
        TokenKind::Lt => Some(JumpCond::Ge),
        TokenKind::Lte => Some(JumpCond::G),
        _ => None,
    }
}

/// Escape literal text for a GAS `.string` directive. Cleaned escape bytes
/// (newlines, tabs, ...) must survive the trip through the assembler.
fn gas_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            '\u{0008}' => escaped.push_str("\\b"),
            '\u{000c}' => escaped.push_str("\\f"),
            c if (c as u32) < 0x20 || c == '\u{007f}' => {
                escaped.push_str(&format!("\\{:03o}", c as u32));
            }
            c => escaped.push(c),
        }
    }
    escaped
}

fn variable_symbol(name: &str) -> String {
    format!("{VARIABLE_PREFIX}{name}")
}

fn user_label(name: &str) -> String {
    format!("{USER_LABEL_PREFIX}{name}")
}

fn internal_label(number: u32) -> String {
    format!("{INTERNAL_LABEL_PREFIX}{number}")
}

pub struct Emitter<'a, 't> {
    ast: &'a Ast<'t>,
    table: &'a NameTable,
    os: Os,
    /// Counter for unique `.IL<n>` labels backing IF and WHILE.
    control_flow_label: u32,
}

impl<'a, 't> Emitter<'a, 't> {
    pub fn new(ast: &'a Ast<'t>, table: &'a NameTable, os: Os) -> Self {
        Self {
            ast,
            table,
            os,
            control_flow_label: 0,
        }
    }

    /// Write the complete assembly module for the program.
    pub fn emit(&mut self, out: &mut impl Write) -> io::Result<()> {
        out.write_all(PREAMBLE.as_bytes())?;
        self.emit_literals(out)?;
        self.emit_variables(out)?;
        out.write_all(MAIN_PREAMBLE.as_bytes())?;
        out.write_all(FUNC_PREAMBLE.as_bytes())?;
        if let Some(head) = self.ast.head() {
            self.emit_program(out, head)?;
        }
        out.write_all(FUNC_POSTAMBLE.as_bytes())?;
        out.write_all(PRINT_INTEGER_HELPER.as_bytes())?;
        out.write_all(PRINT_STRING_HELPER.as_bytes())?;
        out.write_all(INPUT_INTEGER_HELPER.as_bytes())?;
        // Windows images have no GNU-stack section
        if self.os == Os::Linux {
            out.write_all(GNU_STACK_POSTAMBLE.as_bytes())?;
        }
        Ok(())
    }

    fn next_label(&mut self) -> u32 {
        let label = self.control_flow_label;
        self.control_flow_label += 1;
        label
    }

    fn emit_literals(&self, out: &mut impl Write) -> io::Result<()> {
        for (text, info) in &self.table.literals {
            writeln!(
                out,
                "\t{LITERAL_PREFIX}{}: .string \"{}\"",
                info.label,
                gas_escape(text)
            )?;
        }
        Ok(())
    }

    /// One uninitialized 8-byte slot per distinct variable.
    fn emit_variables(&self, out: &mut impl Write) -> io::Result<()> {
        for name in self.table.variables.keys() {
            writeln!(out, "\t{}: .skip 8", variable_symbol(name))?;
        }
        Ok(())
    }

    fn emit_program(&mut self, out: &mut impl Write, program: NodeId) -> io::Result<()> {
        let children = self.ast.children(program).collect::<Vec<_>>();
        for child in children {
            self.emit_statement(out, child)?;
        }
        Ok(())
    }

    /// Emit consecutive STATEMENT siblings starting at `node`. Returns the
    /// first non-statement sibling (the block terminator token), if any.
    fn emit_statement_block(
        &mut self,
        out: &mut impl Write,
        node: Option<NodeId>,
    ) -> io::Result<Option<NodeId>> {
        let mut current = node;
        while let Some(id) = current {
            if self.ast.grammar_kind(id) != Some(GrammarKind::Statement) {
                break;
            }
            self.emit_statement(out, id)?;
            current = self.ast.next_sibling(id);
        }
        Ok(current)
    }

    fn emit_statement(&mut self, out: &mut impl Write, statement: NodeId) -> io::Result<()> {
        let ast = self.ast;
        let Some(first) = ast.first_child(statement) else {
            return Ok(());
        };
        let Some(keyword) = ast.token(first) else {
            return Ok(());
        };
        match keyword.kind {
            TokenKind::Print => self.emit_print(out, first),
            TokenKind::Let => self.emit_let(out, first),
            TokenKind::Input => self.emit_input(out, first),
            TokenKind::Label => self.emit_label(out, first),
            TokenKind::Goto => self.emit_goto(out, first),
            TokenKind::If => self.emit_if(out, first),
            TokenKind::While => self.emit_while(out, first),
            _ => Ok(()),
        }
    }

    /// `PRINT (expression | string)`
    fn emit_print(&mut self, out: &mut impl Write, keyword: NodeId) -> io::Result<()> {
        let ast = self.ast;
        let Some(argument) = ast.next_sibling(keyword) else {
            return Ok(());
        };
        if let Some(token) = ast.token(argument) {
            if token.kind != TokenKind::Str {
                return Ok(());
            }
            let Some(info) = token.text.as_deref().and_then(|text| self.table.literals.get(text))
            else {
                return Ok(());
            };
            let address = format!("{LITERAL_PREFIX}{}", info.label);
            writeln!(
                out,
                "{}",
                Instruction::Lea(Operand::Register(Reg::Rdi), Operand::Address(address))
            )?;
            writeln!(out, "{}", Instruction::Call(PRINT_STRING.to_owned()))?;
            return Ok(());
        }
        if ast.grammar_kind(argument) == Some(GrammarKind::Expression) {
            self.emit_expression(out, argument)?;
            writeln!(
                out,
                "{}",
                Instruction::Mov(Operand::Register(Reg::Rdi), Operand::Register(Reg::Rax))
            )?;
            writeln!(out, "{}", Instruction::Call(PRINT_INTEGER.to_owned()))?;
        }
        Ok(())
    }

    /// `LET ident "=" expression`
    fn emit_let(&mut self, out: &mut impl Write, keyword: NodeId) -> io::Result<()> {
        let ast = self.ast;
        let Some(ident_node) = ast.next_sibling(keyword) else {
            return Ok(());
        };
        let Some(eq_node) = ast.next_sibling(ident_node) else {
            return Ok(());
        };
        let Some(expr_node) = ast.next_sibling(eq_node) else {
            return Ok(());
        };
        let Some(name) = ast.token(ident_node).and_then(|t| t.text.as_deref()) else {
            return Ok(());
        };
        self.emit_expression(out, expr_node)?;
        writeln!(
            out,
            "{}",
            Instruction::Mov(
                Operand::Memory(variable_symbol(name)),
                Operand::Register(Reg::Rax)
            )
        )
    }

    /// `INPUT ident`
    fn emit_input(&mut self, out: &mut impl Write, keyword: NodeId) -> io::Result<()> {
        let ast = self.ast;
        let Some(name) = ast
            .next_sibling(keyword)
            .and_then(|id| ast.token(id))
            .and_then(|t| t.text.as_deref())
        else {
            return Ok(());
        };
        writeln!(out, "{}", Instruction::Call(INPUT_INTEGER.to_owned()))?;
        writeln!(
            out,
            "{}",
            Instruction::Mov(
                Operand::Memory(variable_symbol(name)),
                Operand::Register(Reg::Rax)
            )
        )
    }

    /// `LABEL ident`
    fn emit_label(&mut self, out: &mut impl Write, keyword: NodeId) -> io::Result<()> {
        let ast = self.ast;
        let Some(name) = ast
            .next_sibling(keyword)
            .and_then(|id| ast.token(id))
            .and_then(|t| t.text.as_deref())
        else {
            return Ok(());
        };
        writeln!(out, "{}", Instruction::Label(user_label(name)))
    }

    /// `GOTO ident`
    fn emit_goto(&mut self, out: &mut impl Write, keyword: NodeId) -> io::Result<()> {
        let ast = self.ast;
        let Some(name) = ast
            .next_sibling(keyword)
            .and_then(|id| ast.token(id))
            .and_then(|t| t.text.as_deref())
        else {
            return Ok(());
        };
        writeln!(out, "{}", Instruction::Jmp(user_label(name)))
    }

    /// `IF comparison THEN {statement}* ENDIF`
    fn emit_if(&mut self, out: &mut impl Write, keyword: NodeId) -> io::Result<()> {
        let ast = self.ast;
        let Some(comparison) = ast.next_sibling(keyword) else {
            return Ok(());
        };
        let Some(op_kind) = self.emit_comparison(out, comparison)? else {
            return Ok(());
        };
        let Some(condition) = negated_jump(op_kind) else {
            return Ok(());
        };
        let end = self.next_label();
        writeln!(
            out,
            "{}",
            Instruction::CondJump(condition, internal_label(end))
        )?;
        // Skip over the THEN token into the body
        let body = ast.next_sibling(comparison).and_then(|id| ast.next_sibling(id));
        self.emit_statement_block(out, body)?;
        writeln!(out, "{}", Instruction::Label(internal_label(end)))
    }

    /// `WHILE comparison REPEAT {statement}* ENDWHILE`
    fn emit_while(&mut self, out: &mut impl Write, keyword: NodeId) -> io::Result<()> {
        let ast = self.ast;
        let Some(comparison) = ast.next_sibling(keyword) else {
            return Ok(());
        };
        let start = self.next_label();
        let end = self.next_label();
        writeln!(out, "{}", Instruction::Label(internal_label(start)))?;
        let Some(op_kind) = self.emit_comparison(out, comparison)? else {
            return Ok(());
        };
        let Some(condition) = negated_jump(op_kind) else {
            return Ok(());
        };
        writeln!(
            out,
            "{}",
            Instruction::CondJump(condition, internal_label(end))
        )?;
        let body = ast.next_sibling(comparison).and_then(|id| ast.next_sibling(id));
        self.emit_statement_block(out, body)?;
        writeln!(out, "{}", Instruction::Jmp(internal_label(start)))?;
        writeln!(out, "{}", Instruction::Label(internal_label(end)))
    }

    /// Evaluate both sides of a comparison and leave the result in the flags
    /// (`cmp rax, rbx`). Returns the relational operator's kind.
    fn emit_comparison(
        &mut self,
        out: &mut impl Write,
        comparison: NodeId,
    ) -> io::Result<Option<TokenKind>> {
        let ast = self.ast;
        let Some(left) = ast.first_child(comparison) else {
            return Ok(None);
        };
        let Some(op_node) = ast.next_sibling(left) else {
            return Ok(None);
        };
        let Some(right) = ast.next_sibling(op_node) else {
            return Ok(None);
        };
        let Some(op_token) = ast.token(op_node) else {
            return Ok(None);
        };
        self.emit_expression(out, left)?;
        writeln!(out, "{}", Instruction::Push(Reg::Rax))?;
        self.emit_expression(out, right)?;
        writeln!(
            out,
            "{}",
            Instruction::Mov(Operand::Register(Reg::Rbx), Operand::Register(Reg::Rax))
        )?;
        writeln!(out, "{}", Instruction::Pop(Reg::Rax))?;
        writeln!(
            out,
            "{}",
            Instruction::Cmp(Operand::Register(Reg::Rax), Operand::Register(Reg::Rbx))
        )?;
        Ok(Some(op_token.kind))
    }

    /// `expression ::= term {("+" | "-") term}`, result in `rax`.
    fn emit_expression(&mut self, out: &mut impl Write, expression: NodeId) -> io::Result<()> {
        let ast = self.ast;
        let Some(mut child) = ast.first_child(expression) else {
            return Ok(());
        };
        self.emit_term(out, child)?;
        while let Some(op_node) = ast.next_sibling(child) {
            let Some(term) = ast.next_sibling(op_node) else {
                return Ok(());
            };
            let Some(op_token) = ast.token(op_node) else {
                return Ok(());
            };
            writeln!(out, "{}", Instruction::Push(Reg::Rax))?;
            self.emit_term(out, term)?;
            writeln!(
                out,
                "{}",
                Instruction::Mov(Operand::Register(Reg::Rbx), Operand::Register(Reg::Rax))
            )?;
            writeln!(out, "{}", Instruction::Pop(Reg::Rax))?;
            match op_token.kind {
                TokenKind::Plus => writeln!(
                    out,
                    "{}",
                    Instruction::Add(Operand::Register(Reg::Rax), Operand::Register(Reg::Rbx))
                )?,
                TokenKind::Minus => writeln!(
                    out,
                    "{}",
                    Instruction::Sub(Operand::Register(Reg::Rax), Operand::Register(Reg::Rbx))
                )?,
                _ => return Ok(()),
            }
            child = term;
        }
        Ok(())
    }

    /// `term ::= unary {("*" | "/") unary}`, result in `rax`.
    fn emit_term(&mut self, out: &mut impl Write, term: NodeId) -> io::Result<()> {
        let ast = self.ast;
        let Some(mut child) = ast.first_child(term) else {
            return Ok(());
        };
        self.emit_unary(out, child)?;
        while let Some(op_node) = ast.next_sibling(child) {
            let Some(unary) = ast.next_sibling(op_node) else {
                return Ok(());
            };
            let Some(op_token) = ast.token(op_node) else {
                return Ok(());
            };
            writeln!(out, "{}", Instruction::Push(Reg::Rax))?;
            self.emit_unary(out, unary)?;
            writeln!(
                out,
                "{}",
                Instruction::Mov(Operand::Register(Reg::Rbx), Operand::Register(Reg::Rax))
            )?;
            writeln!(out, "{}", Instruction::Pop(Reg::Rax))?;
            match op_token.kind {
                TokenKind::Mult => writeln!(
                    out,
                    "{}",
                    Instruction::Imul(Operand::Register(Reg::Rax), Operand::Register(Reg::Rbx))
                )?,
                TokenKind::Div => {
                    // Sign-extend rax into rdx:rax, quotient lands in rax
                    writeln!(out, "{}", Instruction::Cqo)?;
                    writeln!(out, "{}", Instruction::Idiv(Operand::Register(Reg::Rbx)))?;
                }
                _ => return Ok(()),
            }
            child = unary;
        }
        Ok(())
    }

    /// `unary ::= ["+" | "-"] primary`; unary plus is a no-op.
    fn emit_unary(&mut self, out: &mut impl Write, unary: NodeId) -> io::Result<()> {
        let ast = self.ast;
        let Some(first) = ast.first_child(unary) else {
            return Ok(());
        };
        let Some(sign) = ast.token(first) else {
            return self.emit_primary(out, first);
        };
        let Some(primary) = ast.next_sibling(first) else {
            return Ok(());
        };
        match sign.kind {
            TokenKind::Minus => {
                self.emit_primary(out, primary)?;
                writeln!(out, "{}", Instruction::Neg(Reg::Rax))
            }
            TokenKind::Plus => self.emit_primary(out, primary),
            _ => Ok(()),
        }
    }

    /// `primary ::= number | ident`, loaded into `rax`.
    fn emit_primary(&mut self, out: &mut impl Write, primary: NodeId) -> io::Result<()> {
        let ast = self.ast;
        let Some(token) = ast.first_child(primary).and_then(|id| ast.token(id)) else {
            return Ok(());
        };
        match token.kind {
            TokenKind::Number => {
                let Some(value) = token.text.as_deref().and_then(|text| text.parse::<i64>().ok())
                else {
                    return Ok(());
                };
                writeln!(
                    out,
                    "{}",
                    Instruction::Mov(Operand::Register(Reg::Rax), Operand::Immediate(value))
                )
            }
            TokenKind::Ident => {
                let Some(name) = token.text.as_deref() else {
                    return Ok(());
                };
                writeln!(
                    out,
                    "{}",
                    Instruction::Mov(
                        Operand::Register(Reg::Rax),
                        Operand::Memory(variable_symbol(name))
                    )
                )
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorReporter;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn emit(source: &str, os: Os) -> String {
        let mut reporter = ErrorReporter::new();
        let tokens = Lexer::new("test.teeny").lex(source, &mut reporter);
        let ast = Parser::new(&tokens, "test.teeny", &mut reporter).parse();
        assert!(reporter.is_empty(), "errors while preparing emitter input");
        let table = NameTable::collect(&ast);
        let mut output = Vec::new();
        Emitter::new(&ast, &table, os)
            .emit(&mut output)
            .expect("emission failed");
        String::from_utf8(output).expect("emitted assembly is not UTF-8")
    }

    fn emit_linux(source: &str) -> String {
        emit(source, Os::Linux)
    }

    #[test]
    fn test_print_string_literal() {
        let asm = emit_linux("PRINT \"hello\"");
        assert!(asm.contains("\t_static_0: .string \"hello\"\n"));
        assert!(asm.contains("\tlea rdi, _static_0[rip]\n"));
        assert!(asm.contains("\tcall print_string\n"));
    }

    #[test]
    fn test_arithmetic_respects_precedence() {
        let asm = emit_linux("LET x = 10 + 20 * 3");
        assert!(asm.contains("\t_var_x: .skip 8\n"));
        // The product is computed before the sum
        let imul = asm.find("\timul rax, rbx\n").expect("no imul");
        let add = asm.find("\tadd rax, rbx\n").expect("no add");
        assert!(imul < add);
        assert!(asm.contains("\tmov QWORD PTR _var_x[rip], rax\n"));
    }

    #[test]
    fn test_division_uses_cqo_idiv() {
        let asm = emit_linux("LET x = 10 / 3");
        assert!(asm.contains("\tcqo\n\tidiv rbx\n"));
    }

    #[test]
    fn test_unary_minus_negates() {
        let asm = emit_linux("LET x = -5");
        assert!(asm.contains("\tmov rax, 5\n\tneg rax\n"));
    }

    #[test]
    fn test_if_jumps_on_negated_condition() {
        let asm = emit_linux("LET x = 1\nIF x == 1 THEN\nPRINT \"eq\"\nENDIF");
        assert!(asm.contains("\tcmp rax, rbx\n\tjne .IL0\n"));
        let jump = asm.find("\tjne .IL0\n").expect("no jump");
        let target = asm.find("\n.IL0:\n").expect("no label");
        assert!(jump < target);
    }

    #[test]
    fn test_while_loops_back_to_start() {
        let asm = emit_linux("LET i = 0\nWHILE i < 3 REPEAT\nLET i = i + 1\nENDWHILE");
        assert!(asm.contains(".IL0:\n"));
        assert!(asm.contains("\tjge .IL1\n"));
        assert!(asm.contains("\tjmp .IL0\n"));
        assert!(asm.contains(".IL1:\n"));
    }

    #[test]
    fn test_goto_and_label_mangling() {
        let asm = emit_linux("LABEL top\nGOTO top");
        assert!(asm.contains(".Ltop:\n"));
        assert!(asm.contains("\tjmp .Ltop\n"));
    }

    #[test]
    fn test_input_stores_into_variable() {
        let asm = emit_linux("LET x = 0\nINPUT x");
        assert!(asm.contains("\tcall input_integer\n\tmov QWORD PTR _var_x[rip], rax\n"));
    }

    #[test]
    fn test_one_slot_per_distinct_name() {
        let asm = emit_linux(
            "LET x = 1\nLET y = 2\nLET x = 3\nPRINT \"a\"\nPRINT \"b\"\nPRINT \"a\"",
        );
        assert_eq!(1, asm.matches("\t_var_x: .skip 8\n").count());
        assert_eq!(1, asm.matches("\t_var_y: .skip 8\n").count());
        assert_eq!(1, asm.matches("\t_static_0: .string").count());
        assert_eq!(1, asm.matches("\t_static_1: .string").count());
        assert!(!asm.contains("_static_2"));
    }

    #[test]
    fn test_internal_labels_are_unique() {
        let asm = emit_linux(
            "LET x = 1\nIF x == 1 THEN\nENDIF\nIF x == 2 THEN\nENDIF\nWHILE x < 9 REPEAT\nENDWHILE",
        );
        let mut labels = Vec::new();
        for line in asm.lines() {
            if let Some(label) = line.strip_suffix(':') {
                if label.starts_with(INTERNAL_LABEL_PREFIX) {
                    labels.push(label.to_owned());
                }
            }
        }
        let mut deduped = labels.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), labels.len());
        assert_eq!(vec![".IL0", ".IL1", ".IL2", ".IL3"], {
            let mut sorted = labels;
            sorted.sort();
            sorted
        });
    }

    #[test]
    fn test_empty_program_is_valid_assembly() {
        let mut reporter = ErrorReporter::new();
        let tokens = Lexer::new("test.teeny").lex("", &mut reporter);
        let ast = Parser::new(&tokens, "test.teeny", &mut reporter).parse();
        let table = NameTable::collect(&ast);
        let mut output = Vec::new();
        Emitter::new(&ast, &table, Os::Linux)
            .emit(&mut output)
            .expect("emission failed");
        let asm = String::from_utf8(output).unwrap();

        assert!(asm.starts_with(".intel_syntax noprefix\n"));
        assert!(asm.contains("main:\n\tpush rbp\n\tmov rbp, rsp\n\tleave\n\tret\n"));
        assert!(!asm.contains("_var_"));
        assert!(!asm.contains("_static_"));
    }

    #[test]
    fn test_gnu_stack_marker_only_on_linux() {
        let linux = emit("PRINT 1", Os::Linux);
        let windows = emit("PRINT 1", Os::Windows);
        assert!(linux.ends_with(".section .note.GNU-stack,\"\",@progbits\n"));
        assert!(!windows.contains(".note.GNU-stack"));
    }

    #[test]
    fn test_emission_is_deterministic() {
        let source = "LET x = 1\nWHILE x < 5 REPEAT\nPRINT x\nLET x = x + 1\nENDWHILE";
        assert_eq!(emit_linux(source), emit_linux(source));
    }

    #[test]
    fn test_cleaned_escapes_are_reescaped_for_gas() {
        let asm = emit_linux("PRINT \"a\\nb\"");
        assert!(asm.contains("\t_static_0: .string \"a\\nb\"\n"));
    }

    #[test]
    fn test_negated_jump_mapping() {
        assert_eq!(Some(JumpCond::Ne), negated_jump(TokenKind::EqEq));
        assert_eq!(Some(JumpCond::E), negated_jump(TokenKind::NotEq));
        assert_eq!(Some(JumpCond::Le), negated_jump(TokenKind::Gt));
        assert_eq!(Some(JumpCond::L), negated_jump(TokenKind::Gte));
        assert_eq!(Some(JumpCond::Ge), negated_jump(TokenKind::Lt));
        assert_eq!(Some(JumpCond::G), negated_jump(TokenKind::Lte));
        assert_eq!(None, negated_jump(TokenKind::Plus));
    }
}
