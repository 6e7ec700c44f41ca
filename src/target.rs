//! Compilation targets and the assembler commands that serve them.
//!
//! The compiler produces textual assembly and delegates assembling/linking
//! to a gcc-compatible toolchain, picked per target triple.
use std::error::Error;
use std::fmt::Display;
use std::io;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X86_64,
}

impl Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Arch::X86_64 => "x86_64",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    Windows,
}

impl Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Os::Linux => "linux",
            Os::Windows => "windows",
        })
    }
}

/// A target as `<arch>-<os>`, e.g. `x86_64-linux`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triple {
    pub arch: Arch,
    pub os: Os,
}

impl Triple {
    pub const SUPPORTED: [Triple; 2] = [
        Triple {
            arch: Arch::X86_64,
            os: Os::Linux,
        },
        Triple {
            arch: Arch::X86_64,
            os: Os::Windows,
        },
    ];

    /// The build host as a target triple, if it is one we can compile for.
    pub fn host() -> Option<Triple> {
        if !cfg!(target_arch = "x86_64") {
            return None;
        }
        if cfg!(target_os = "linux") {
            Some(Triple {
                arch: Arch::X86_64,
                os: Os::Linux,
            })
        } else if cfg!(target_os = "windows") {
            Some(Triple {
                arch: Arch::X86_64,
                os: Os::Windows,
            })
        } else {
            None
        }
    }
}

impl Display for Triple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}-{}", self.arch, self.os))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripleParseError(String);

impl Display for TripleParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl Error for TripleParseError {}

impl FromStr for Triple {
    type Err = TripleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((arch, os)) = s.split_once('-') else {
            return Err(TripleParseError(format!(
                "malformed target triple \"{s}\", expected <arch>-<os>"
            )));
        };
        let arch = match arch {
            "x86_64" => Arch::X86_64,
            other => {
                return Err(TripleParseError(format!(
                    "unsupported architecture \"{other}\", expected x86_64"
                )))
            }
        };
        let os = match os {
            "linux" => Os::Linux,
            "windows" => Os::Windows,
            other => {
                return Err(TripleParseError(format!(
                    "unsupported operating system \"{other}\", expected linux or windows"
                )))
            }
        };
        Ok(Triple { arch, os })
    }
}

/// The gcc-compatible command line used to turn an assembly file into an
/// executable for one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblerInfo {
    pub command: &'static str,
    pub flags: &'static [&'static str],
    pub output_ext: &'static str,
}

impl AssemblerInfo {
    pub fn for_target(target: Triple, target_is_host: bool) -> AssemblerInfo {
        if target_is_host {
            return AssemblerInfo {
                command: "gcc",
                flags: &[],
                output_ext: "",
            };
        }
        match target.os {
            Os::Linux => AssemblerInfo {
                command: "x86_64-linux-gnu-gcc",
                flags: &["-m64"],
                output_ext: "",
            },
            Os::Windows => AssemblerInfo {
                command: "x86_64-w64-mingw32-gcc",
                flags: &[],
                output_ext: ".exe",
            },
        }
    }

    /// Probe whether the toolchain is installed.
    pub fn is_available(&self) -> bool {
        Command::new(self.command)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Assemble and link `asm_file` into `output_file`.
    pub fn invoke(&self, asm_file: &Path, output_file: &Path) -> io::Result<Output> {
        Command::new(self.command)
            .args(self.flags)
            .arg("-x")
            .arg("assembler")
            .arg(asm_file)
            .arg("-o")
            .arg(output_file)
            .output()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_supported_triples() {
        assert_eq!(
            Ok(Triple {
                arch: Arch::X86_64,
                os: Os::Linux
            }),
            "x86_64-linux".parse()
        );
        assert_eq!(
            Ok(Triple {
                arch: Arch::X86_64,
                os: Os::Windows
            }),
            "x86_64-windows".parse()
        );
    }

    #[test]
    fn test_parse_rejects_unknown_triples() {
        assert!("arm64-linux".parse::<Triple>().is_err());
        assert!("x86_64-macos".parse::<Triple>().is_err());
        assert!("x86_64".parse::<Triple>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for triple in Triple::SUPPORTED {
            assert_eq!(Ok(triple), triple.to_string().parse());
        }
    }

    #[test]
    fn test_assembler_for_windows_target_uses_mingw() {
        let target = Triple {
            arch: Arch::X86_64,
            os: Os::Windows,
        };
        let info = AssemblerInfo::for_target(target, false);
        assert_eq!("x86_64-w64-mingw32-gcc", info.command);
        assert_eq!(".exe", info.output_ext);
    }

    #[test]
    fn test_assembler_for_explicit_linux_target_uses_cross_gcc() {
        let target = Triple {
            arch: Arch::X86_64,
            os: Os::Linux,
        };
        let info = AssemblerInfo::for_target(target, false);
        assert_eq!("x86_64-linux-gnu-gcc", info.command);
        assert_eq!(&["-m64"], info.flags);
    }

    #[test]
    fn test_assembler_for_host_is_plain_gcc() {
        let target = Triple {
            arch: Arch::X86_64,
            os: Os::Linux,
        };
        let info = AssemblerInfo::for_target(target, true);
        assert_eq!("gcc", info.command);
        assert!(info.flags.is_empty());
    }
}
