//! 反汇编：把已解码指令渲染成汇编助记符，仅用于显示
//!
//! 助记符的选择与执行单元一致（同一套 `AluOp` / `BranchCond` / ...），
//! 所以显示的就是实际会执行的操作。

use super::instr::{BranchCond, DecodedInstr, LoadOp, StoreOp};
use super::opcode::Opcode;

/// 渲染一条已解码指令
///
/// 无法识别的组合输出 `UNKNOWN (0x........)`，从不失败。
///
/// ```
/// use rv32i_sim::isa::{decode, disassemble};
///
/// assert_eq!(disassemble(&decode(0x001101B3)), "ADD x3, x2, x1");
/// assert_eq!(disassemble(&decode(0x00100093)), "ADDI x1, x0, 1");
/// ```
pub fn disassemble(d: &DecodedInstr) -> String {
    match d.opcode {
        Opcode::Op => match d.alu_op() {
            Some(op) => format!("{} x{}, x{}, x{}", op.mnemonic(), d.rd, d.rs1, d.rs2),
            None => unknown(d),
        },
        Opcode::OpImm => match d.alu_op() {
            Some(op) if op.is_shift() => {
                format!("{} x{}, x{}, {}", op.imm_mnemonic(), d.rd, d.rs1, d.imm & 0x1F)
            }
            Some(op) => format!("{} x{}, x{}, {}", op.imm_mnemonic(), d.rd, d.rs1, d.imm),
            None => unknown(d),
        },
        Opcode::Load => match LoadOp::from_funct3(d.funct3) {
            Some(op) => format!("{} x{}, {}(x{})", op.mnemonic(), d.rd, d.imm, d.rs1),
            None => unknown(d),
        },
        Opcode::Store => match StoreOp::from_funct3(d.funct3) {
            Some(op) => format!("{} x{}, {}(x{})", op.mnemonic(), d.rs2, d.imm, d.rs1),
            None => unknown(d),
        },
        Opcode::Branch => match BranchCond::from_funct3(d.funct3) {
            Some(cond) => format!("{} x{}, x{}, {}", cond.mnemonic(), d.rs1, d.rs2, d.imm),
            None => unknown(d),
        },
        Opcode::Jal => format!("JAL x{}, {}", d.rd, d.imm),
        Opcode::Jalr => format!("JALR x{}, x{}, {}", d.rd, d.rs1, d.imm),
        Opcode::Lui => format!("LUI x{}, 0x{:X}", d.rd, d.imm as u32),
        Opcode::Auipc => format!("AUIPC x{}, {}", d.rd, d.imm),
        Opcode::System => match d.imm {
            0 => "ECALL".to_string(),
            1 => "EBREAK".to_string(),
            _ => unknown(d),
        },
        Opcode::Unsupported(_) => unknown(d),
    }
}

fn unknown(d: &DecodedInstr) -> String {
    format!("UNKNOWN (0x{:08x})", d.raw)
}
