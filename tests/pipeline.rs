//! End-to-end scenarios driven through the library API, front to back.
use teeny::ast::WalkEvent;
use teeny::emitter::Emitter;
use teeny::errors::{ErrorCategory, ErrorReporter};
use teeny::lexer::{Lexer, TokenKind};
use teeny::names::NameTable;
use teeny::parser::Parser;
use teeny::semantic::SemanticAnalyzer;
use teeny::target::Os;

const FILENAME: &str = "prog.teeny";

/// Run the whole pipeline; returns the assembly (when no diagnostics were
/// reported) and the diagnostic count.
fn compile(source: &str) -> (Option<String>, usize) {
    let mut reporter = ErrorReporter::new();
    let tokens = Lexer::new(FILENAME).lex(source, &mut reporter);
    if !reporter.is_empty() {
        return (None, reporter.count());
    }
    let ast = Parser::new(&tokens, FILENAME, &mut reporter).parse();
    if !reporter.is_empty() {
        return (None, reporter.count());
    }
    let table = NameTable::collect(&ast);
    SemanticAnalyzer::new(&ast, &table).check(&mut reporter);
    if !reporter.is_empty() {
        return (None, reporter.count());
    }
    let mut assembly = Vec::new();
    Emitter::new(&ast, &table, Os::Linux)
        .emit(&mut assembly)
        .expect("emission failed");
    (Some(String::from_utf8(assembly).unwrap()), 0)
}

#[test]
fn scenario_print_literal() {
    let mut reporter = ErrorReporter::new();
    let tokens = Lexer::new(FILENAME).lex("PRINT \"hello\"", &mut reporter);

    let kinds = tokens.iter().map(|t| t.kind).collect::<Vec<_>>();
    assert_eq!(vec![TokenKind::Print, TokenKind::Str], kinds);

    let ast = Parser::new(&tokens, FILENAME, &mut reporter).parse();
    assert!(ast.matches_structure("PROGRAM(STATEMENT(PRINT,STRING(hello)))"));
    assert_eq!(0, reporter.count());

    let (asm, errors) = compile("PRINT \"hello\"");
    assert_eq!(0, errors);
    let asm = asm.unwrap();
    assert!(asm.contains("_static_0: .string \"hello\""));
    assert!(asm.contains("\tlea rdi, _static_0[rip]"));
    assert!(asm.contains("\tcall print_string"));
}

#[test]
fn scenario_arithmetic_and_store() {
    let mut reporter = ErrorReporter::new();
    let tokens = Lexer::new(FILENAME).lex("LET x = 10 + 20 * 3", &mut reporter);
    let ast = Parser::new(&tokens, FILENAME, &mut reporter).parse();
    assert!(ast.matches_structure(
        "PROGRAM(STATEMENT(LET,IDENT(x),EQ,EXPRESSION(TERM(UNARY(PRIMARY(NUMBER(10)))),PLUS,TERM(UNARY(PRIMARY(NUMBER(20))),MULT,UNARY(PRIMARY(NUMBER(3)))))))"
    ));
    assert_eq!(0, reporter.count());

    let (asm, _) = compile("LET x = 10 + 20 * 3");
    let asm = asm.unwrap();
    // Multiplication binds tighter, so imul precedes add
    assert!(asm.find("\timul rax, rbx").unwrap() < asm.find("\tadd rax, rbx").unwrap());
    assert!(asm.contains("\tmov QWORD PTR _var_x[rip], rax"));
}

#[test]
fn scenario_conditional() {
    let (asm, errors) = compile("LET x = 1\nIF x == 1 THEN\nPRINT \"eq\"\nENDIF");
    assert_eq!(0, errors);
    let asm = asm.unwrap();
    assert!(asm.contains("\tcmp rax, rbx\n\tjne .IL0\n"));
    assert!(asm.find("\tjne .IL0").unwrap() < asm.find("\n.IL0:").unwrap());
}

#[test]
fn scenario_undefined_label() {
    let mut reporter = ErrorReporter::new();
    let tokens = Lexer::new(FILENAME).lex("GOTO nowhere", &mut reporter);
    let ast = Parser::new(&tokens, FILENAME, &mut reporter).parse();
    let table = NameTable::collect(&ast);
    SemanticAnalyzer::new(&ast, &table).check(&mut reporter);

    assert_eq!(1, reporter.count());
    let diagnostic = reporter.iter().next().unwrap();
    assert_eq!(ErrorCategory::Semantic, diagnostic.category);
    assert!(diagnostic.message.contains("nowhere"));

    let (asm, errors) = compile("GOTO nowhere");
    assert!(asm.is_none());
    assert_eq!(1, errors);
}

#[test]
fn scenario_use_before_declaration() {
    let mut reporter = ErrorReporter::new();
    let tokens = Lexer::new(FILENAME).lex("PRINT x\nLET x = 5", &mut reporter);
    let ast = Parser::new(&tokens, FILENAME, &mut reporter).parse();
    let table = NameTable::collect(&ast);
    SemanticAnalyzer::new(&ast, &table).check(&mut reporter);

    assert_eq!(1, reporter.count());
    let diagnostic = reporter.iter().next().unwrap();
    assert_eq!((1, 7), diagnostic.pos);
    assert!(diagnostic.message.contains("2:1"));
}

#[test]
fn scenario_duplicate_label() {
    let mut reporter = ErrorReporter::new();
    let tokens = Lexer::new(FILENAME).lex("LABEL a\nLABEL a", &mut reporter);
    let ast = Parser::new(&tokens, FILENAME, &mut reporter).parse();
    let table = NameTable::collect(&ast);
    SemanticAnalyzer::new(&ast, &table).check(&mut reporter);

    assert_eq!(1, reporter.count());
    let diagnostic = reporter.iter().next().unwrap();
    assert_eq!(2, diagnostic.pos.0);
    assert!(diagnostic.message.contains("1:1"));
}

#[test]
fn whitespace_only_source_compiles_to_an_empty_body() {
    let (asm, errors) = compile(" \t\n\n   \t");
    assert_eq!(0, errors);
    let asm = asm.unwrap();
    assert!(asm.contains("main:\n\tpush rbp\n\tmov rbp, rsp\n\tleave\n\tret\n"));
}

#[test]
fn empty_loop_bodies_emit_only_labels_and_jumps() {
    let (asm, errors) = compile("LET x = 0\nWHILE x < 1 REPEAT\nENDWHILE");
    assert_eq!(0, errors);
    let asm = asm.unwrap();
    assert!(asm.contains(".IL0:\n"));
    assert!(asm.contains("\tjge .IL1\n\tjmp .IL0\n.IL1:\n"));
}

#[test]
fn walk_events_are_balanced() {
    let mut reporter = ErrorReporter::new();
    let tokens = Lexer::new(FILENAME).lex(
        "LET x = 1\nWHILE x < 3 REPEAT\nIF x == 2 THEN\nPRINT x\nENDIF\nLET x = x + 1\nENDWHILE",
        &mut reporter,
    );
    let ast = Parser::new(&tokens, FILENAME, &mut reporter).parse();
    assert_eq!(0, reporter.count());

    let mut depth = 0usize;
    let mut enters = 0usize;
    let mut leaves = 0usize;
    for event in ast.walk() {
        match event {
            WalkEvent::Enter(..) => {
                depth += 1;
                enters += 1;
            }
            WalkEvent::Leave(..) => {
                depth -= 1;
                leaves += 1;
            }
            WalkEvent::Token(..) => assert!(depth > 0, "token outside any grammar node"),
        }
    }
    assert_eq!(0, depth);
    assert_eq!(enters, leaves);
}

#[test]
fn bracket_print_round_trips_through_the_matcher() {
    let mut reporter = ErrorReporter::new();
    let tokens = Lexer::new(FILENAME).lex("LET x = 1\nPRINT x", &mut reporter);
    let ast = Parser::new(&tokens, FILENAME, &mut reporter).parse();
    let printed = ast.bracket_print();
    assert!(ast.matches_structure(&printed));
}
