//! Text-level model of the emitted x86-64 assembly (Intel syntax, GAS
//! compatible). The emitter builds [`Instruction`] values and writes them out
//! through their `Display` impls, which keeps every spelling in one place.
mod reg;

use std::fmt::Display;

pub use self::reg::*;

#[derive(Debug, Clone)]
pub enum Operand {
    Register(Reg),
    Immediate(i64),
    /// 64-bit rip-relative memory access, `QWORD PTR <symbol>[rip]`.
    Memory(String),
    /// Bare rip-relative address, `<symbol>[rip]`, as used by `lea`.
    Address(String),
}

impl Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Register(reg) => reg.fmt(f),
            Operand::Immediate(value) => value.fmt(f),
            Operand::Memory(symbol) => f.write_fmt(format_args!("QWORD PTR {symbol}[rip]")),
            Operand::Address(symbol) => f.write_fmt(format_args!("{symbol}[rip]")),
        }
    }
}

/// Conditional jump mnemonics used for control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpCond {
    Ne,
    E,
    Le,
    L,
    Ge,
    G,
}

impl Display for JumpCond {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            JumpCond::Ne => "jne",
            JumpCond::E => "je",
            JumpCond::Le => "jle",
            JumpCond::L => "jl",
            JumpCond::Ge => "jge",
            JumpCond::G => "jg",
        })
    }
}

#[derive(Debug, Clone)]
pub enum Instruction {
    Label(String),
    Mov(Operand, Operand),
    Lea(Operand, Operand),
    Add(Operand, Operand),
    Sub(Operand, Operand),
    Imul(Operand, Operand),
    Cqo,
    Idiv(Operand),
    Neg(Reg),
    Cmp(Operand, Operand),
    Push(Reg),
    Pop(Reg),
    Jmp(String),
    CondJump(JumpCond, String),
    Call(String),
    Leave,
    Ret,
    /// Verbatim assembly text; used for the long helper routines and
    /// directives.
    Literal(String),
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Label(label) => f.write_fmt(format_args!("{label}:")),
            Instruction::Mov(target, source) => {
                f.write_fmt(format_args!("\tmov {target}, {source}"))
            }
            Instruction::Lea(target, source) => {
                f.write_fmt(format_args!("\tlea {target}, {source}"))
            }
            Instruction::Add(target, source) => {
                f.write_fmt(format_args!("\tadd {target}, {source}"))
            }
            Instruction::Sub(target, source) => {
                f.write_fmt(format_args!("\tsub {target}, {source}"))
            }
            Instruction::Imul(target, source) => {
                f.write_fmt(format_args!("\timul {target}, {source}"))
            }
            Instruction::Cqo => f.write_str("\tcqo"),
            Instruction::Idiv(source) => f.write_fmt(format_args!("\tidiv {source}")),
            Instruction::Neg(reg) => f.write_fmt(format_args!("\tneg {reg}")),
            Instruction::Cmp(left, right) => f.write_fmt(format_args!("\tcmp {left}, {right}")),
            Instruction::Push(reg) => f.write_fmt(format_args!("\tpush {reg}")),
            Instruction::Pop(reg) => f.write_fmt(format_args!("\tpop {reg}")),
            Instruction::Jmp(label) => f.write_fmt(format_args!("\tjmp {label}")),
            Instruction::CondJump(cond, label) => f.write_fmt(format_args!("\t{cond} {label}")),
            Instruction::Call(name) => f.write_fmt(format_args!("\tcall {name}")),
            Instruction::Leave => f.write_str("\tleave"),
            Instruction::Ret => f.write_str("\tret"),
            Instruction::Literal(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operand_spellings() {
        assert_eq!("rax", format!("{}", Operand::Register(Reg::Rax)));
        assert_eq!("42", format!("{}", Operand::Immediate(42)));
        assert_eq!(
            "QWORD PTR _var_x[rip]",
            format!("{}", Operand::Memory("_var_x".to_owned()))
        );
        assert_eq!(
            "_static_0[rip]",
            format!("{}", Operand::Address("_static_0".to_owned()))
        );
    }

    #[test]
    fn test_instruction_spellings() {
        assert_eq!(
            "\tmov rax, QWORD PTR _var_x[rip]",
            format!(
                "{}",
                Instruction::Mov(
                    Operand::Register(Reg::Rax),
                    Operand::Memory("_var_x".to_owned())
                )
            )
        );
        assert_eq!(
            "\tlea rdi, _static_0[rip]",
            format!(
                "{}",
                Instruction::Lea(
                    Operand::Register(Reg::Rdi),
                    Operand::Address("_static_0".to_owned())
                )
            )
        );
        assert_eq!(
            "\tjne .IL0",
            format!("{}", Instruction::CondJump(JumpCond::Ne, ".IL0".to_owned()))
        );
        assert_eq!(".L_top:", format!("{}", Instruction::Label(".L_top".to_owned())));
        assert_eq!("\tcqo", format!("{}", Instruction::Cqo));
    }
}
