//! Driver for the compilation pipeline.
//!
//! Glues the phases together: lex, parse, name-table collection, semantic
//! analysis, code generation and the external assembler invocation. After
//! each phase the accumulated diagnostics are checked; any error prints the
//! batch and stops compilation before the next phase runs.
use std::error::Error;
use std::fmt::Display;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use log::{error, info};

use crate::emitter::Emitter;
use crate::errors::ErrorReporter;
use crate::lexer::Lexer;
use crate::names::NameTable;
use crate::parser::Parser;
use crate::semantic::SemanticAnalyzer;
use crate::target::{AssemblerInfo, Triple};

/// Pseudo-filename used in diagnostics when compiling a code literal.
pub const CODE_LITERAL_NAME: &str = "<code>";

#[derive(Debug, Clone)]
pub enum Input {
    File(PathBuf),
    Literal(String),
}

#[derive(Debug, Clone)]
pub struct CompilerConfig {
    pub input: Input,
    pub out_file: PathBuf,
    pub target: Triple,
    pub target_is_host: bool,
    pub emit_asm: bool,
}

#[derive(Debug)]
pub enum CompileError {
    /// Fatal I/O problem: unreadable source, unwritable output or staging
    /// file.
    Io { context: String, source: io::Error },
    /// Compilation diagnostics were emitted (and already printed).
    Diagnostics(usize),
    /// The assembler toolchain is missing or its invocation failed.
    Assembler(String),
}

impl CompileError {
    /// Process exit code for this failure: 1 for user/I/O errors, 2 for
    /// diagnostics, 3 for assembler failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            CompileError::Io { .. } => 1,
            CompileError::Diagnostics(_) => 2,
            CompileError::Assembler(_) => 3,
        }
    }
}

impl Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::Io { context, source } => {
                f.write_fmt(format_args!("{context}: {source}"))
            }
            CompileError::Diagnostics(count) => {
                f.write_fmt(format_args!("compilation failed with {count} error(s)"))
            }
            CompileError::Assembler(message) => f.write_str(message),
        }
    }
}

impl Error for CompileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CompileError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub struct Compiler {
    config: CompilerConfig,
    reporter: ErrorReporter,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            reporter: ErrorReporter::new(),
        }
    }

    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    /// Run the whole pipeline. On success the output file holds either an
    /// executable or, with `emit_asm`, the assembly text.
    pub fn run(&mut self) -> Result<(), CompileError> {
        self.reporter.reset();
        let (filename, source) = self.load_source()?;

        info!("Lexing '{filename}'...");
        let tokens = Lexer::new(&filename).lex(&source, &mut self.reporter);
        self.check_phase()?;

        info!("Parsing...");
        let ast = Parser::new(&tokens, &filename, &mut self.reporter).parse();
        self.check_phase()?;
        log::debug!("syntax tree:\n{}", ast.tree_print());

        info!("Analyzing...");
        let table = NameTable::collect(&ast);
        SemanticAnalyzer::new(&ast, &table).check(&mut self.reporter);
        self.check_phase()?;

        info!("Generating code for {}...", self.config.target);
        let mut assembly = Vec::new();
        Emitter::new(&ast, &table, self.config.target.os)
            .emit(&mut assembly)
            .map_err(|source| CompileError::Io {
                context: "could not render assembly".to_owned(),
                source,
            })?;

        if self.config.emit_asm {
            fs::write(&self.config.out_file, &assembly).map_err(|source| CompileError::Io {
                context: format!(
                    "could not write assembly to '{}'",
                    self.config.out_file.display()
                ),
                source,
            })?;
            info!("Wrote assembly to '{}'", self.config.out_file.display());
            return Ok(());
        }

        self.assemble(&assembly)
    }

    /// Read the program text. Files are decoded lossily; bytes that are not
    /// UTF-8 reach the lexer as replacement characters and come back as
    /// lexical diagnostics instead of killing the run.
    fn load_source(&self) -> Result<(String, String), CompileError> {
        match &self.config.input {
            Input::Literal(code) => Ok((CODE_LITERAL_NAME.to_owned(), code.clone())),
            Input::File(path) => {
                let bytes = fs::read(path).map_err(|source| CompileError::Io {
                    context: format!("could not read file '{}'", path.display()),
                    source,
                })?;
                let source = String::from_utf8_lossy(&bytes).into_owned();
                Ok((path.to_string_lossy().into_owned(), source))
            }
        }
    }

    /// Gate between phases: print and bail if the previous phase reported
    /// anything.
    fn check_phase(&mut self) -> Result<(), CompileError> {
        if self.reporter.is_empty() {
            return Ok(());
        }
        let _ = self.reporter.print_all(&mut io::stderr());
        Err(CompileError::Diagnostics(self.reporter.count()))
    }

    /// Stage the assembly in a temporary `.s` file and hand it to the
    /// gcc-compatible toolchain for the configured target. The staging file
    /// is removed whether or not the invocation succeeds.
    fn assemble(&self, assembly: &[u8]) -> Result<(), CompileError> {
        let assembler = AssemblerInfo::for_target(self.config.target, self.config.target_is_host);
        if !assembler.is_available() {
            return Err(CompileError::Assembler(format!(
                "the assembler {} is not available on your system, please install it",
                assembler.command
            )));
        }

        let mut staged = tempfile::Builder::new()
            .prefix("teeny")
            .suffix(".s")
            .tempfile()
            .map_err(|source| CompileError::Io {
                context: "could not create temporary assembly file".to_owned(),
                source,
            })?;
        staged
            .write_all(assembly)
            .and_then(|_| staged.flush())
            .map_err(|source| CompileError::Io {
                context: "could not write temporary assembly file".to_owned(),
                source,
            })?;

        let out_file = self.output_path(assembler.output_ext);
        info!("Assembling with {}...", assembler.command);
        let output = assembler
            .invoke(staged.path(), &out_file)
            .map_err(|source| CompileError::Io {
                context: format!("could not invoke {}", assembler.command),
                source,
            })?;

        let stderr_text = String::from_utf8_lossy(&output.stderr);
        if !stderr_text.is_empty() {
            error!("{stderr_text}");
        }
        if !output.status.success() {
            return Err(CompileError::Assembler(format!(
                "{} exited with {}",
                assembler.command, output.status
            )));
        }
        info!("Wrote executable to '{}'", out_file.display());
        Ok(())
    }

    /// Output path with the target's extension appended when the user gave
    /// none (`.exe` for Windows executables).
    fn output_path(&self, ext: &str) -> PathBuf {
        let path = self.config.out_file.clone();
        if ext.is_empty() || path.extension().is_some() {
            return path;
        }
        let mut name = path.into_os_string();
        name.push(ext);
        PathBuf::from(name)
    }
}
