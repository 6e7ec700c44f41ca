use std::path::PathBuf;
use std::process::exit;

use clap::error::ErrorKind;
use clap::Parser;
use log::error;

use teeny::compiler::{CompileError, Compiler, CompilerConfig, Input};
use teeny::target::Triple;

#[derive(Parser, Debug)]
#[command(name = "teeny", version, about = "A Tiny BASIC compiler")]
struct Cli {
    /// Interpret the input as a code string literal instead of a file path
    #[arg(short = 'c', long = "code")]
    code: bool,

    /// The name of the file to output to
    #[arg(short = 'o', long = "output-file", default_value = "a.out")]
    output_file: PathBuf,

    /// Target to assemble for, in the form <arch>-<os> (e.g. x86_64-linux).
    /// The matching gcc toolchain must be installed
    #[arg(short = 't', long = "target")]
    target: Option<String>,

    /// List all supported targets
    #[arg(short = 'l', long = "list-targets")]
    list_targets: bool,

    /// Write the assembly ".s" text instead of an executable
    #[arg(short = 'a', long = "emit-asm")]
    emit_asm: bool,

    /// Enable progress logging on stderr
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Print the detected host triple
    #[arg(short = 'i', long = "host-info")]
    host_info: bool,

    /// The Tiny BASIC file to compile (or a code literal with --code)
    input_file_or_literal: Option<String>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not user errors
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            exit(code);
        }
    };

    let level = if cli.verbose {
        log::Level::Info
    } else {
        log::Level::Warn
    };
    simple_logger::init_with_level(level).unwrap();

    if cli.list_targets {
        for triple in Triple::SUPPORTED {
            println!("{triple}");
        }
        return;
    }

    if cli.host_info {
        match Triple::host() {
            Some(triple) => {
                println!("{triple}");
                return;
            }
            None => {
                eprintln!("the host platform is not a supported target");
                exit(1);
            }
        }
    }

    let Some(input) = cli.input_file_or_literal else {
        eprintln!("no input was supplied; pass a file path, or a code literal with --code");
        exit(1);
    };

    let target = match &cli.target {
        Some(text) => match text.parse::<Triple>() {
            Ok(triple) => triple,
            Err(e) => {
                eprintln!("{e}");
                eprintln!("supported targets:");
                for triple in Triple::SUPPORTED {
                    eprintln!("  {triple}");
                }
                exit(1);
            }
        },
        None => match Triple::host() {
            Some(triple) => triple,
            None => {
                eprintln!("the host platform is not a supported target; pass one with --target");
                exit(1);
            }
        },
    };

    let config = CompilerConfig {
        input: if cli.code {
            Input::Literal(input)
        } else {
            Input::File(PathBuf::from(input))
        },
        out_file: cli.output_file,
        target,
        target_is_host: Triple::host() == Some(target),
        emit_asm: cli.emit_asm,
    };

    let mut compiler = Compiler::new(config);
    if let Err(e) = compiler.run() {
        // Diagnostics have already been printed by the driver
        if !matches!(e, CompileError::Diagnostics(_)) {
            error!("{e}");
        }
        exit(e.exit_code());
    }
}
