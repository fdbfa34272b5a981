use tracing::warn;

use crate::isa::{LoadOp, StoreOp};
use crate::memory::Memory;

/// 按 funct3 执行 load；未定义的宽度读出 0
pub fn load<M: Memory + ?Sized>(mem: &M, funct3: u8, addr: u32) -> u32 {
    match LoadOp::from_funct3(funct3) {
        Some(op) => mem.read(addr, op.size(), op.signed()),
        None => {
            warn!(funct3, "undefined load width, result is 0");
            0
        }
    }
}

/// 按 funct3 执行 store；未定义的宽度不写内存
pub fn store<M: Memory + ?Sized>(mem: &mut M, funct3: u8, addr: u32, value: u32) {
    match StoreOp::from_funct3(funct3) {
        Some(op) => mem.write(addr, value, op.size()),
        None => warn!(funct3, "undefined store width ignored"),
    }
}
