//! 指令字段提取辅助函数
//!
//! 提供从 32-bit 指令字中提取各字段的工具函数。
//! 寄存器号在各格式中位置固定，立即数则按格式拆散存放，
//! 这里负责把它们按位重新拼回去并做符号扩展。

/// 提取 opcode 字段 [6:0]
#[inline]
pub fn opcode(raw: u32) -> u32 {
    raw & 0x7F
}

/// 提取 rd 字段 [11:7]
#[inline]
pub fn rd(raw: u32) -> u8 {
    ((raw >> 7) & 0x1F) as u8
}

/// 提取 funct3 字段 [14:12]
#[inline]
pub fn funct3(raw: u32) -> u8 {
    ((raw >> 12) & 0x7) as u8
}

/// 提取 rs1 字段 [19:15]
#[inline]
pub fn rs1(raw: u32) -> u8 {
    ((raw >> 15) & 0x1F) as u8
}

/// 提取 rs2 字段 [24:20]
#[inline]
pub fn rs2(raw: u32) -> u8 {
    ((raw >> 20) & 0x1F) as u8
}

/// 提取 funct7 字段 [31:25]
#[inline]
pub fn funct7(raw: u32) -> u8 {
    ((raw >> 25) & 0x7F) as u8
}

/// 提取 I-type 立即数并符号扩展
/// imm[11:0] = raw[31:20]
#[inline]
pub fn imm_i(raw: u32) -> i32 {
    (raw as i32) >> 20
}

/// 提取 S-type 立即数并符号扩展
/// imm[11:5] = raw[31:25], imm[4:0] = raw[11:7]
#[inline]
pub fn imm_s(raw: u32) -> i32 {
    let imm_11_5 = (raw >> 25) & 0x7F;
    let imm_4_0 = (raw >> 7) & 0x1F;
    let mut imm = (imm_11_5 << 5) | imm_4_0;
    if imm & 0x800 != 0 {
        imm |= 0xFFFF_F800;
    }
    imm as i32
}

/// 提取 B-type 立即数并符号扩展
/// imm[12] = raw[31], imm[11] = raw[7], imm[10:5] = raw[30:25], imm[4:1] = raw[11:8]
#[inline]
pub fn imm_b(raw: u32) -> i32 {
    let imm_12 = (raw >> 31) & 0x1;
    let imm_11 = (raw >> 7) & 0x1;
    let imm_10_5 = (raw >> 25) & 0x3F;
    let imm_4_1 = (raw >> 8) & 0xF;
    let mut imm = (imm_12 << 12) | (imm_11 << 11) | (imm_10_5 << 5) | (imm_4_1 << 1);
    if imm & 0x1000 != 0 {
        imm |= 0xFFFF_E000;
    }
    imm as i32
}

/// 提取 U-type 立即数
/// imm[31:12] = raw[31:12], imm[11:0] = 0
#[inline]
pub fn imm_u(raw: u32) -> i32 {
    (raw & 0xFFFF_F000) as i32
}

/// 提取 J-type 立即数并符号扩展
/// imm[20] = raw[31], imm[19:12] = raw[19:12], imm[11] = raw[20], imm[10:1] = raw[30:21]
#[inline]
pub fn imm_j(raw: u32) -> i32 {
    let imm_20 = (raw >> 31) & 0x1;
    let imm_19_12 = (raw >> 12) & 0xFF;
    let imm_11 = (raw >> 20) & 0x1;
    let imm_10_1 = (raw >> 21) & 0x3FF;
    let mut imm = (imm_20 << 20) | (imm_19_12 << 12) | (imm_11 << 11) | (imm_10_1 << 1);
    if imm & 0x0010_0000 != 0 {
        imm |= 0xFFE0_0000;
    }
    imm as i32
}

// ========== Opcode 常量 ==========
pub const OP_LUI: u32 = 0b0110111;
pub const OP_AUIPC: u32 = 0b0010111;
pub const OP_JAL: u32 = 0b1101111;
pub const OP_JALR: u32 = 0b1100111;
pub const OP_BRANCH: u32 = 0b1100011;
pub const OP_LOAD: u32 = 0b0000011;
pub const OP_STORE: u32 = 0b0100011;
pub const OP_IMM: u32 = 0b0010011;
pub const OP_REG: u32 = 0b0110011;
pub const OP_SYSTEM: u32 = 0b1110011;

/// funct7 中区分 SUB/SRA 的位（即指令字 bit 30）
pub const FUNCT7_ALT: u8 = 0x20;
