//! 译码器
//!
//! 纯函数、全函数：任何 32 位字都能解码成 `DecodedInstr`。
//! 未知 opcode 也照常解码（立即数为 0），是否执行由执行单元决定。

use super::fields::*;
use super::instr::DecodedInstr;
use super::opcode::{ImmFormat, Opcode};

/// 解码一条 32 位指令
///
/// # 示例
///
/// ```
/// use rv32i_sim::isa::{decode, Opcode};
///
/// let d = decode(0xFFF00113); // addi x2, x0, -1
/// assert_eq!(d.opcode, Opcode::OpImm);
/// assert_eq!((d.rd, d.rs1, d.imm), (2, 0, -1));
/// ```
pub fn decode(raw: u32) -> DecodedInstr {
    let opcode = Opcode::from_bits(opcode(raw));
    DecodedInstr {
        raw,
        opcode,
        rd: rd(raw),
        rs1: rs1(raw),
        rs2: rs2(raw),
        funct3: funct3(raw),
        funct7: funct7(raw),
        imm: immediate(raw, opcode.format()),
    }
}

/// 按格式重建立即数
#[inline]
pub fn immediate(raw: u32, format: ImmFormat) -> i32 {
    match format {
        ImmFormat::I => imm_i(raw),
        ImmFormat::S => imm_s(raw),
        ImmFormat::B => imm_b(raw),
        ImmFormat::U => imm_u(raw),
        ImmFormat::J => imm_j(raw),
        ImmFormat::R => 0,
    }
}
