use assert_cmd::Command;

/// The compiler binary under test.
pub fn teeny() -> Command {
    Command::cargo_bin("teeny").expect("teeny binary not built")
}

/// Compile a code literal to assembly text in `dir`, returning the emitted
/// file's contents. Panics if compilation fails.
pub fn compile_literal_to_asm(dir: &std::path::Path, code: &str) -> String {
    let out = dir.join("out.s");
    teeny()
        .arg("--code")
        .arg("--emit-asm")
        .arg("-o")
        .arg(&out)
        .arg(code)
        .assert()
        .success();
    std::fs::read_to_string(out).expect("no assembly was written")
}
