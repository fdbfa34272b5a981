//! 已解码指令记录，以及从 funct 字段导出的操作语义

use std::fmt;

use super::fields::FUNCT7_ALT;
use super::opcode::Opcode;
use crate::memory::AccessSize;

/// 已解码的指令
///
/// 一次性完成字段提取与立即数重建，之后不再修改。
/// 寄存器号取自 5 位字段，天然落在 0..=31。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecodedInstr {
    /// 原始 32-bit 指令编码
    pub raw: u32,
    pub opcode: Opcode,
    pub rd: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub funct3: u8,
    pub funct7: u8,
    /// 按格式重建并符号扩展后的立即数；R-type 与未知 opcode 为 0
    pub imm: i32,
}

impl DecodedInstr {
    /// funct7 bit 5 是否置位（SUB / SRA / SRAI）
    #[inline]
    pub fn alt(&self) -> bool {
        self.funct7 & FUNCT7_ALT != 0
    }

    /// OP / OP_IMM 的 ALU 操作
    ///
    /// funct7 不是合法 RV32I 编码（如 M 扩展的 0x01）时返回 `None`。
    /// 执行单元不做这项检查，直接用 `AluOp::select`。
    pub fn alu_op(&self) -> Option<AluOp> {
        let valid = match (self.opcode, self.funct3) {
            (Opcode::Op, 0x0 | 0x5) => self.funct7 == 0 || self.funct7 == FUNCT7_ALT,
            (Opcode::Op, _) => self.funct7 == 0,
            (Opcode::OpImm, 0x1) => self.funct7 == 0,
            (Opcode::OpImm, 0x5) => self.funct7 == 0 || self.funct7 == FUNCT7_ALT,
            (Opcode::OpImm, _) => true,
            _ => false,
        };
        valid.then(|| AluOp::select(self.opcode, self.funct3, self.funct7))
    }
}

impl fmt::Display for DecodedInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&super::disasm::disassemble(self))
    }
}

/// OP / OP_IMM 共用的 ALU 操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Sra,
    Or,
    And,
}

impl AluOp {
    /// 按 funct3 选择操作
    ///
    /// funct7 bit 5 只在两处起作用：OP 的 ADD→SUB，
    /// 以及 OP / OP_IMM 的 SRL→SRA。ADDI 的立即数高位不会被当成 SUB。
    pub fn select(opcode: Opcode, funct3: u8, funct7: u8) -> Self {
        let alt = funct7 & FUNCT7_ALT != 0;
        match funct3 & 0x7 {
            0x0 if alt && opcode == Opcode::Op => AluOp::Sub,
            0x0 => AluOp::Add,
            0x1 => AluOp::Sll,
            0x2 => AluOp::Slt,
            0x3 => AluOp::Sltu,
            0x4 => AluOp::Xor,
            0x5 if alt => AluOp::Sra,
            0x5 => AluOp::Srl,
            0x6 => AluOp::Or,
            _ => AluOp::And,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            AluOp::Add => "ADD",
            AluOp::Sub => "SUB",
            AluOp::Sll => "SLL",
            AluOp::Slt => "SLT",
            AluOp::Sltu => "SLTU",
            AluOp::Xor => "XOR",
            AluOp::Srl => "SRL",
            AluOp::Sra => "SRA",
            AluOp::Or => "OR",
            AluOp::And => "AND",
        }
    }

    /// OP_IMM 形式的助记符（SLTU 的立即数形式是 SLTIU）
    pub fn imm_mnemonic(self) -> &'static str {
        match self {
            AluOp::Add | AluOp::Sub => "ADDI",
            AluOp::Sll => "SLLI",
            AluOp::Slt => "SLTI",
            AluOp::Sltu => "SLTIU",
            AluOp::Xor => "XORI",
            AluOp::Srl => "SRLI",
            AluOp::Sra => "SRAI",
            AluOp::Or => "ORI",
            AluOp::And => "ANDI",
        }
    }

    pub fn is_shift(self) -> bool {
        matches!(self, AluOp::Sll | AluOp::Srl | AluOp::Sra)
    }
}

/// 条件分支比较
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchCond {
    Eq,
    Ne,
    Lt,
    Ge,
    Ltu,
    Geu,
}

impl BranchCond {
    /// funct3 为 0b010 / 0b011 时没有对应分支，返回 `None`
    pub fn from_funct3(funct3: u8) -> Option<Self> {
        match funct3 {
            0x0 => Some(BranchCond::Eq),
            0x1 => Some(BranchCond::Ne),
            0x4 => Some(BranchCond::Lt),
            0x5 => Some(BranchCond::Ge),
            0x6 => Some(BranchCond::Ltu),
            0x7 => Some(BranchCond::Geu),
            _ => None,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            BranchCond::Eq => "BEQ",
            BranchCond::Ne => "BNE",
            BranchCond::Lt => "BLT",
            BranchCond::Ge => "BGE",
            BranchCond::Ltu => "BLTU",
            BranchCond::Geu => "BGEU",
        }
    }
}

/// Load 宽度与符号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOp {
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,
}

impl LoadOp {
    pub fn from_funct3(funct3: u8) -> Option<Self> {
        match funct3 {
            0x0 => Some(LoadOp::Lb),
            0x1 => Some(LoadOp::Lh),
            0x2 => Some(LoadOp::Lw),
            0x4 => Some(LoadOp::Lbu),
            0x5 => Some(LoadOp::Lhu),
            _ => None,
        }
    }

    pub fn size(self) -> AccessSize {
        match self {
            LoadOp::Lb | LoadOp::Lbu => AccessSize::Byte,
            LoadOp::Lh | LoadOp::Lhu => AccessSize::Half,
            LoadOp::Lw => AccessSize::Word,
        }
    }

    /// 是否符号扩展（LW 本身就是满宽度，扩不扩都一样）
    pub fn signed(self) -> bool {
        matches!(self, LoadOp::Lb | LoadOp::Lh | LoadOp::Lw)
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            LoadOp::Lb => "LB",
            LoadOp::Lh => "LH",
            LoadOp::Lw => "LW",
            LoadOp::Lbu => "LBU",
            LoadOp::Lhu => "LHU",
        }
    }
}

/// Store 宽度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Sb,
    Sh,
    Sw,
}

impl StoreOp {
    pub fn from_funct3(funct3: u8) -> Option<Self> {
        match funct3 {
            0x0 => Some(StoreOp::Sb),
            0x1 => Some(StoreOp::Sh),
            0x2 => Some(StoreOp::Sw),
            _ => None,
        }
    }

    pub fn size(self) -> AccessSize {
        match self {
            StoreOp::Sb => AccessSize::Byte,
            StoreOp::Sh => AccessSize::Half,
            StoreOp::Sw => AccessSize::Word,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            StoreOp::Sb => "SB",
            StoreOp::Sh => "SH",
            StoreOp::Sw => "SW",
        }
    }
}
