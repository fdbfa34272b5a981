//! Execution unit.
//!
//! 每条指令先算出 `Outcome`（结果、是否写回、下一条 PC），
//! 再统一写回寄存器并更新 PC。执行过程中不修改 PC，
//! 因此 JAL/JALR 的返回地址和 AUIPC 都基于指令自身地址。

mod alu;
mod lsu;

use tracing::debug;

use super::CpuCore;
use crate::isa::{AluOp, BranchCond, DecodedInstr, Opcode};

/// 单条指令的执行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Outcome {
    result: u32,
    write_back: bool,
    next_pc: u32,
}

impl Outcome {
    fn write(result: u32, next_pc: u32) -> Self {
        Self { result, write_back: true, next_pc }
    }

    fn skip(next_pc: u32) -> Self {
        Self { result: 0, write_back: false, next_pc }
    }
}

/// 执行一条已解码指令
pub(super) fn execute(cpu: &mut CpuCore, instr: &DecodedInstr) {
    let pc = cpu.pc;
    let fallthrough = pc.wrapping_add(4);
    let imm = instr.imm as u32;

    // 操作数选择：OP/BRANCH/STORE 取 rs2，其余取立即数
    let val1 = cpu.regs.read(instr.rs1);
    let val2 = if instr.opcode.uses_rs2() {
        cpu.regs.read(instr.rs2)
    } else {
        imm
    };

    let outcome = match instr.opcode {
        Opcode::Op | Opcode::OpImm => {
            let op = AluOp::select(instr.opcode, instr.funct3, instr.funct7);
            Outcome::write(alu::apply(op, val1, val2), fallthrough)
        }
        Opcode::Branch => {
            let taken = BranchCond::from_funct3(instr.funct3)
                .is_some_and(|cond| alu::branch_taken(cond, val1, val2));
            Outcome::skip(if taken { pc.wrapping_add(imm) } else { fallthrough })
        }
        Opcode::Jal => Outcome::write(fallthrough, pc.wrapping_add(imm)),
        Opcode::Jalr => Outcome::write(fallthrough, val1.wrapping_add(imm) & !1),
        Opcode::Lui => Outcome::write(imm, fallthrough),
        Opcode::Auipc => Outcome::write(pc.wrapping_add(imm), fallthrough),
        Opcode::Load => {
            let addr = val1.wrapping_add(imm);
            Outcome::write(lsu::load(&cpu.mem, instr.funct3, addr), fallthrough)
        }
        Opcode::Store => {
            let addr = val1.wrapping_add(imm);
            lsu::store(&mut cpu.mem, instr.funct3, addr, val2);
            Outcome::skip(fallthrough)
        }
        Opcode::System => {
            // 没有特权态与陷入，ECALL/EBREAK 只前进 PC
            debug!(pc = pc, imm = instr.imm, "system instruction treated as no-op");
            Outcome::skip(fallthrough)
        }
        Opcode::Unsupported(bits) => {
            // 跑出程序末尾后每步都会走到这里，只在 debug 级别记录
            debug!(
                "unsupported opcode 0x{bits:02x} at pc 0x{pc:08x} (raw 0x{:08x})",
                instr.raw
            );
            Outcome::skip(fallthrough)
        }
    };

    if outcome.write_back {
        cpu.regs.write(instr.rd, outcome.result);
    }
    cpu.pc = outcome.next_pc;
}
