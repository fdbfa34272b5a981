//! 主 opcode 与立即数格式
//!
//! RV32I 只用到十个主 opcode；其余 7-bit 取值统一归入 `Unsupported`，
//! 译码器照常产出记录，由执行单元按空操作处理。

use super::fields::*;

/// 立即数编码格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImmFormat {
    /// 寄存器-寄存器，无立即数
    R,
    I,
    S,
    B,
    U,
    J,
}

/// 主 opcode（指令字 [6:0]）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Lui,
    Auipc,
    Jal,
    Jalr,
    Branch,
    Load,
    Store,
    OpImm,
    Op,
    System,
    /// 未实现的 opcode，保留原始 7 位
    Unsupported(u8),
}

impl Opcode {
    /// 由指令字低 7 位得到 opcode，高位被忽略
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0x7F {
            OP_LUI => Opcode::Lui,
            OP_AUIPC => Opcode::Auipc,
            OP_JAL => Opcode::Jal,
            OP_JALR => Opcode::Jalr,
            OP_BRANCH => Opcode::Branch,
            OP_LOAD => Opcode::Load,
            OP_STORE => Opcode::Store,
            OP_IMM => Opcode::OpImm,
            OP_REG => Opcode::Op,
            OP_SYSTEM => Opcode::System,
            other => Opcode::Unsupported(other as u8),
        }
    }

    /// 还原 7 位编码
    pub fn bits(self) -> u8 {
        let bits = match self {
            Opcode::Lui => OP_LUI,
            Opcode::Auipc => OP_AUIPC,
            Opcode::Jal => OP_JAL,
            Opcode::Jalr => OP_JALR,
            Opcode::Branch => OP_BRANCH,
            Opcode::Load => OP_LOAD,
            Opcode::Store => OP_STORE,
            Opcode::OpImm => OP_IMM,
            Opcode::Op => OP_REG,
            Opcode::System => OP_SYSTEM,
            Opcode::Unsupported(bits) => return bits,
        };
        bits as u8
    }

    /// 该 opcode 的立即数格式
    pub fn format(self) -> ImmFormat {
        match self {
            Opcode::Jalr | Opcode::Load | Opcode::OpImm | Opcode::System => ImmFormat::I,
            Opcode::Store => ImmFormat::S,
            Opcode::Branch => ImmFormat::B,
            Opcode::Lui | Opcode::Auipc => ImmFormat::U,
            Opcode::Jal => ImmFormat::J,
            Opcode::Op | Opcode::Unsupported(_) => ImmFormat::R,
        }
    }

    pub fn is_supported(self) -> bool {
        !matches!(self, Opcode::Unsupported(_))
    }

    /// 第二操作数取 rs2 而不是立即数（R-type 运算、分支比较、store 数据）
    pub fn uses_rs2(self) -> bool {
        matches!(self, Opcode::Op | Opcode::Branch | Opcode::Store)
    }
}
