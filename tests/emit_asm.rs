mod common;

use common::compile_literal_to_asm;

#[test]
fn print_literal_emits_interned_string() {
    let dir = tempfile::tempdir().unwrap();
    let asm = compile_literal_to_asm(dir.path(), "PRINT \"hello\"");

    assert!(asm.starts_with(".intel_syntax noprefix\n"));
    assert!(asm.contains("_static_0: .string \"hello\""));
    assert!(asm.contains("\tlea rdi, _static_0[rip]"));
    assert!(asm.contains("\tcall print_string"));
}

#[test]
fn conditional_compiles_to_negated_jump() {
    let dir = tempfile::tempdir().unwrap();
    let asm = compile_literal_to_asm(dir.path(), "LET x = 1\nIF x == 1 THEN\nPRINT \"eq\"\nENDIF");

    assert!(asm.contains("\tcmp rax, rbx\n\tjne .IL0\n"));
    assert!(asm.contains(".IL0:\n"));
}

#[test]
fn empty_program_still_produces_a_valid_module() {
    let dir = tempfile::tempdir().unwrap();
    let asm = compile_literal_to_asm(dir.path(), "");

    assert!(asm.contains("main:\n\tpush rbp\n\tmov rbp, rsp\n\tleave\n\tret\n"));
    assert!(asm.contains("input_integer:"));
}

#[test]
fn windows_target_omits_gnu_stack_section() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("prog.s");
    common::teeny()
        .args(["--code", "--emit-asm", "--target", "x86_64-windows", "-o"])
        .arg(&out)
        .arg("PRINT 1")
        .assert()
        .success();

    let asm = std::fs::read_to_string(out).unwrap();
    assert!(!asm.contains(".note.GNU-stack"));
}
