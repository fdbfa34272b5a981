//! RISC-V RV32I 指令抽象、解码与反汇编
//!
//! - `fields`: 定位字段与立即数拼装
//! - `Opcode` / `ImmFormat`: 封闭的主 opcode 枚举及其立即数格式
//! - `DecodedInstr`: 解码结果（值类型）
//! - `AluOp` / `BranchCond` / `LoadOp` / `StoreOp`: funct 字段对应的操作
//! - `decode` / `disassemble`: 译码与助记符渲染

mod decoder;
mod disasm;
mod fields;
mod instr;
mod opcode;

pub use decoder::{decode, immediate};
pub use disasm::disassemble;
pub use fields::*;
pub use instr::{AluOp, BranchCond, DecodedInstr, LoadOp, StoreOp};
pub use opcode::{ImmFormat, Opcode};
