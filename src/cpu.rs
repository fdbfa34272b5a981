//! CPU 核心与执行引擎
//!
//! 本模块定义了单线程 RV32I CPU 核心 `CpuCore`，
//! 包含寄存器文件、程序计数器、独占的线性内存以及执行引擎。

use std::fmt::Write as _;

use tracing::trace;

use crate::isa::{self, DecodedInstr};
use crate::memory::{AccessSize, FlatMemory, Memory};

mod exu;
mod regfile;

pub use regfile::RegFile;

/// 单线程 CPU 核心
///
/// 包含 RV32I 的最小状态：
/// - 32 个 32-bit 通用寄存器 x0..x31（x0 恒为 0）
/// - 32-bit 程序计数器
/// - 一块 CPU 独占的 `FlatMemory`
///
/// 设计约定：
/// - x0 永远为 0，写入时丢弃
/// - PC 只在一条指令执行结束时更新
/// - 核心不会自行停机，`run` 总是由调用方给出步数上限
pub struct CpuCore {
    regs: RegFile,
    pc: u32,
    /// `reset` 时恢复的入口地址
    entry_pc: u32,
    mem: FlatMemory,
    /// 最近一次 `step` 解码出的指令
    last: Option<DecodedInstr>,
    /// 已执行（含未支持 opcode）的指令数
    retired: u64,
}

impl CpuCore {
    /// 创建一个新的 CPU 核心，附带默认大小（1 MiB，基址 0）的内存
    ///
    /// # 示例
    ///
    /// ```
    /// use rv32i_sim::cpu::CpuCore;
    ///
    /// let cpu = CpuCore::new(0x1000);
    /// assert_eq!(cpu.pc(), 0x1000);
    /// assert_eq!(cpu.register_value(0), 0);
    /// ```
    pub fn new(entry_pc: u32) -> Self {
        Self::with_memory(FlatMemory::default(), entry_pc)
    }

    /// 使用给定内存创建 CPU 核心
    pub fn with_memory(mem: FlatMemory, entry_pc: u32) -> Self {
        CpuCore {
            regs: RegFile::new(),
            pc: entry_pc,
            entry_pc,
            mem,
            last: None,
            retired: 0,
        }
    }

    /// 把程序字节拷贝到 `base` 开始的内存
    ///
    /// 超出内存的部分被丢弃，返回实际写入的字节数。
    /// 不修改 PC 与寄存器。
    pub fn load(&mut self, program: &[u8], base: u32) -> usize {
        self.mem.load_bytes(base, program)
    }

    /// 获取当前程序计数器值
    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// 设置程序计数器
    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
    }

    /// `reset` 恢复到的入口地址
    pub fn entry_pc(&self) -> u32 {
        self.entry_pc
    }

    /// 读取 x0 总是返回 0
    pub fn read_reg(&self, reg: u8) -> u32 {
        self.regs.read(reg)
    }

    pub fn write_reg(&mut self, reg: u8, value: u32) {
        self.regs.write(reg, value)
    }

    /// 按下标查询寄存器，越界（>= 32）返回 0
    pub fn register_value(&self, index: usize) -> u32 {
        self.regs.get(index).unwrap_or(0)
    }

    /// 获取所有寄存器的快照
    pub fn regs(&self) -> &[u32; 32] {
        self.regs.snapshot()
    }

    pub fn memory(&self) -> &FlatMemory {
        &self.mem
    }

    pub fn memory_mut(&mut self) -> &mut FlatMemory {
        &mut self.mem
    }

    /// 最近一次执行的指令，尚未 `step` 过时为 `None`
    pub fn last_decoded(&self) -> Option<&DecodedInstr> {
        self.last.as_ref()
    }

    /// 最近一次执行的指令的助记符
    pub fn disassemble_last(&self) -> Option<String> {
        self.last.as_ref().map(isa::disassemble)
    }

    pub fn retired(&self) -> u64 {
        self.retired
    }

    /// 执行单步指令
    ///
    /// # 流程
    ///
    /// 1. 从 PC 处取指（越界取指得到 0，按未支持 opcode 处理）
    /// 2. 解码并记录为 `last_decoded`
    /// 3. 执行，写回寄存器，最后更新 PC
    ///
    /// 返回本步执行的已解码指令。
    pub fn step(&mut self) -> DecodedInstr {
        let raw = self.mem.read(self.pc, AccessSize::Word, false);
        let decoded = isa::decode(raw);
        trace!("0x{:08x}: {:08x}  {}", self.pc, raw, decoded);

        self.last = Some(decoded);
        exu::execute(self, &decoded);
        self.retired += 1;
        decoded
    }

    /// 连续执行 `max_instructions` 条指令
    ///
    /// 核心没有停机条件，返回值总是等于 `max_instructions`。
    pub fn run(&mut self, max_instructions: u64) -> u64 {
        for _ in 0..max_instructions {
            self.step();
        }
        max_instructions
    }

    /// 清零寄存器并把 PC 恢复到入口地址；内存内容保留
    pub fn reset(&mut self) {
        self.regs.clear();
        self.pc = self.entry_pc;
        self.last = None;
        self.retired = 0;
    }

    /// 格式化寄存器，每行 4 个
    pub fn format_regs(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "pc  = 0x{:08x}", self.pc);
        for (row, chunk) in self.regs().chunks(4).enumerate() {
            let line: Vec<String> = chunk
                .iter()
                .enumerate()
                .map(|(col, value)| format!("{:<4}= 0x{value:08x}", format!("x{}", row * 4 + col)))
                .collect();
            let _ = writeln!(out, "{}", line.join("  "));
        }
        out
    }
}

impl Default for CpuCore {
    fn default() -> Self {
        Self::new(0)
    }
}

impl std::fmt::Debug for CpuCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuCore")
            .field("pc", &format_args!("0x{:08x}", self.pc))
            .field("regs", &self.regs)
            .field("mem", &self.mem)
            .field("retired", &self.retired)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::programs::BuiltinProgram;

    fn cpu_with(size: usize) -> CpuCore {
        CpuCore::with_memory(FlatMemory::new(size, 0), 0)
    }

    /// 将指令写入内存
    fn write_instr(cpu: &mut CpuCore, addr: u32, instr: u32) {
        cpu.memory_mut().store32(addr, instr).unwrap();
    }

    #[test]
    fn test_addi() {
        let mut cpu = cpu_with(1024);

        // addi x1, x0, 42
        write_instr(&mut cpu, 0, 0x02A00093);
        let decoded = cpu.step();

        assert_eq!(decoded.raw, 0x02A00093);
        assert_eq!(cpu.read_reg(1), 42);
        assert_eq!(cpu.pc(), 4);
        assert_eq!(cpu.retired(), 1);
    }

    #[test]
    fn test_add_sub() {
        let mut cpu = cpu_with(1024);

        // addi x1, x0, 100
        write_instr(&mut cpu, 0, 0x06400093);
        // addi x2, x0, 30
        write_instr(&mut cpu, 4, 0x01E00113);
        // add x3, x1, x2
        write_instr(&mut cpu, 8, 0x002081B3);
        // sub x4, x1, x2
        write_instr(&mut cpu, 12, 0x40208233);

        cpu.run(4);

        assert_eq!(cpu.read_reg(3), 130);
        assert_eq!(cpu.read_reg(4), 70);
    }

    #[test]
    fn test_x0_stays_zero() {
        let mut cpu = cpu_with(1024);

        // addi x0, x0, 5
        write_instr(&mut cpu, 0, 0x00500013);
        // lui x0, 0x12345
        write_instr(&mut cpu, 4, 0x12345037);
        cpu.run(2);

        assert_eq!(cpu.register_value(0), 0);
        assert_eq!(cpu.regs()[0], 0);
    }

    #[test]
    fn test_lui_auipc() {
        let mut cpu = cpu_with(1024);

        // lui x1, 0x12345
        write_instr(&mut cpu, 0, 0x123450B7);
        // auipc x2, 1
        write_instr(&mut cpu, 4, 0x00001117);
        cpu.run(2);

        assert_eq!(cpu.read_reg(1), 0x1234_5000);
        assert_eq!(cpu.read_reg(2), 4 + 0x1000);
    }

    #[test]
    fn test_lw_sw() {
        let mut cpu = cpu_with(1024);

        // addi x1, x0, 0x42
        write_instr(&mut cpu, 0, 0x04200093);
        // addi x2, x0, 100 (基地址)
        write_instr(&mut cpu, 4, 0x06400113);
        // sw x1, 0(x2)
        write_instr(&mut cpu, 8, 0x00112023);
        // lw x3, 0(x2)
        write_instr(&mut cpu, 12, 0x00012183);

        cpu.run(4);

        assert_eq!(cpu.read_reg(3), 0x42);
        assert_eq!(cpu.memory().load32(100), Ok(0x42));
    }

    #[test]
    fn test_signed_and_unsigned_byte_loads() {
        let mut cpu = cpu_with(1024);

        // addi x1, x0, -128
        write_instr(&mut cpu, 0, 0xF8000093);
        // sb x1, 64(x0)
        write_instr(&mut cpu, 4, 0x04100023);
        // lb x2, 64(x0)
        write_instr(&mut cpu, 8, 0x04000103);
        // lbu x3, 64(x0)
        write_instr(&mut cpu, 12, 0x04004183);

        cpu.run(4);

        assert_eq!(cpu.read_reg(2), 0xFFFF_FF80);
        assert_eq!(cpu.read_reg(3), 0x80);
    }

    #[test]
    fn test_beq_taken() {
        let mut cpu = cpu_with(1024);

        // addi x1, x0, 5
        write_instr(&mut cpu, 0, 0x00500093);
        // addi x2, x0, 5
        write_instr(&mut cpu, 4, 0x00500113);
        // beq x1, x2, 8 (跳转到 8 + 8 = 16)
        write_instr(&mut cpu, 8, 0x00208463);
        // addi x3, x0, 1 (被跳过)
        write_instr(&mut cpu, 12, 0x00100193);

        cpu.run(3);

        assert_eq!(cpu.pc(), 16);
        assert_eq!(cpu.read_reg(3), 0);
    }

    #[test]
    fn test_beq_not_taken() {
        let mut cpu = cpu_with(1024);

        // addi x1, x0, 5
        write_instr(&mut cpu, 0, 0x00500093);
        // addi x2, x0, 10
        write_instr(&mut cpu, 4, 0x00A00113);
        // beq x1, x2, 8 (x1 != x2，不跳转)
        write_instr(&mut cpu, 8, 0x00208463);
        // addi x3, x0, 1
        write_instr(&mut cpu, 12, 0x00100193);

        cpu.run(3);
        assert_eq!(cpu.pc(), 12);
        cpu.step();
        assert_eq!(cpu.read_reg(3), 1);
    }

    #[test]
    fn test_jal_links_and_jumps() {
        let mut cpu = cpu_with(1024);
        cpu.set_pc(16);

        // jal x0, -12
        write_instr(&mut cpu, 16, 0xFF5FF06F);
        cpu.step();
        assert_eq!(cpu.pc(), 4);

        // jal x1, 8
        write_instr(&mut cpu, 4, 0x008000EF);
        cpu.step();
        assert_eq!(cpu.pc(), 12);
        assert_eq!(cpu.read_reg(1), 8);
    }

    #[test]
    fn test_jalr_clears_low_bit() {
        let mut cpu = cpu_with(1024);

        // addi x2, x0, 17
        write_instr(&mut cpu, 0, 0x01100113);
        // jalr x1, 0(x2)
        write_instr(&mut cpu, 4, 0x000100E7);
        cpu.run(2);

        assert_eq!(cpu.pc(), 16);
        assert_eq!(cpu.read_reg(1), 8);
    }

    #[test]
    fn test_jalr_reads_rs1_before_link() {
        let mut cpu = cpu_with(1024);
        cpu.write_reg(1, 0x40);

        // jalr x1, 4(x1)
        write_instr(&mut cpu, 0, 0x004080E7);
        cpu.step();

        assert_eq!(cpu.pc(), 0x44);
        assert_eq!(cpu.read_reg(1), 4);
    }

    #[test]
    fn test_out_of_bounds_load_yields_zero() {
        let mut cpu = cpu_with(64);
        cpu.write_reg(1, 5);

        // lw x1, 62(x0): 62..66 越过 64 字节的末尾
        write_instr(&mut cpu, 0, 0x03E02083);
        cpu.step();

        assert_eq!(cpu.read_reg(1), 0);
        assert_eq!(cpu.pc(), 4);
    }

    #[test]
    fn test_out_of_bounds_store_is_dropped() {
        let mut cpu = cpu_with(64);
        cpu.write_reg(1, 0xFFFF_FFFF);

        // sw x1, 62(x0)
        write_instr(&mut cpu, 0, 0x02102F23);
        cpu.step();

        assert_eq!(cpu.memory().read_bytes(60, 4), Ok(vec![0, 0, 0, 0]));
        assert_eq!(cpu.pc(), 4);
    }

    #[test]
    fn test_unsupported_opcode_only_advances_pc() {
        let mut cpu = cpu_with(64);
        cpu.write_reg(5, 7);

        // 全零字：opcode 0 不受支持
        let decoded = cpu.step();

        assert!(!decoded.opcode.is_supported());
        assert_eq!(cpu.pc(), 4);
        assert_eq!(cpu.read_reg(5), 7);
        assert_eq!(cpu.disassemble_last().as_deref(), Some("UNKNOWN (0x00000000)"));
    }

    #[test]
    fn test_ecall_is_a_no_op() {
        let mut cpu = cpu_with(64);

        write_instr(&mut cpu, 0, 0x00000073);
        cpu.step();

        assert_eq!(cpu.pc(), 4);
        assert!(cpu.regs().iter().all(|&r| r == 0));
        assert_eq!(cpu.disassemble_last().as_deref(), Some("ECALL"));
    }

    #[test]
    fn test_fetch_past_memory_end() {
        let mut cpu = CpuCore::with_memory(FlatMemory::new(16, 0), 0x100);
        cpu.step();
        assert_eq!(cpu.pc(), 0x104);
    }

    #[test]
    fn test_fibonacci_program() {
        let mut cpu = CpuCore::new(0);
        let program = BuiltinProgram::Fibonacci.bytes();
        assert_eq!(cpu.load(&program, 0), program.len());

        // Fib(1) = Fib(2) = 1
        fn fib(n: u32) -> u32 {
            let (mut a, mut b) = (1u32, 1u32);
            for _ in 2..n {
                (a, b) = (b, a + b);
            }
            b
        }

        // 两条初始化指令，每轮循环 4 条；k 轮后 x1 = Fib(k + 1)
        cpu.run(2);
        for k in 1..=20 {
            cpu.run(4);
            assert_eq!(cpu.read_reg(1), fib(k + 1), "x1 after {k} iterations");
            assert_eq!(cpu.pc(), 8);
        }
        assert_eq!(cpu.read_reg(1), 10946);
    }

    #[test]
    fn test_sum_to_ten_program() {
        let mut cpu = CpuCore::new(0);
        cpu.load(&BuiltinProgram::SumToTen.bytes(), 0);

        // 3 条初始化 + 10 轮 * 3 条，然后是 ecall
        cpu.run(33);
        assert_eq!(cpu.read_reg(1), 55);
        assert_eq!(cpu.pc(), 24);
        assert_eq!(cpu.step().opcode, isa::Opcode::System);
    }

    #[test]
    fn test_load_truncates_at_memory_end() {
        let mut cpu = cpu_with(8);
        assert_eq!(cpu.load(&[1, 2, 3, 4, 5, 6], 4), 4);
        assert_eq!(cpu.load(&[1], 8), 0);
        assert_eq!(cpu.memory().read_bytes(4, 4), Ok(vec![1, 2, 3, 4]));
    }

    #[test]
    fn test_last_decoded_and_reset() {
        let mut cpu = cpu_with(1024);
        assert!(cpu.last_decoded().is_none());
        assert!(cpu.disassemble_last().is_none());

        // addi x1, x0, 1
        write_instr(&mut cpu, 0, 0x00100093);
        cpu.step();
        assert_eq!(cpu.disassemble_last().as_deref(), Some("ADDI x1, x0, 1"));
        assert_eq!(cpu.last_decoded().map(|d| d.rd), Some(1));

        cpu.reset();
        assert_eq!(cpu.pc(), 0);
        assert_eq!(cpu.read_reg(1), 0);
        assert_eq!(cpu.retired(), 0);
        assert!(cpu.last_decoded().is_none());
        // 内存保留，可以重新执行
        cpu.step();
        assert_eq!(cpu.read_reg(1), 1);
    }

    #[test]
    fn test_register_value_bounds() {
        let mut cpu = cpu_with(64);
        cpu.write_reg(31, 9);
        assert_eq!(cpu.register_value(31), 9);
        assert_eq!(cpu.register_value(32), 0);
        assert_eq!(cpu.register_value(usize::MAX), 0);
    }

    #[test]
    fn test_reg_access_out_of_range() {
        let mut cpu = cpu_with(64);
        cpu.write_reg(31, 9);
        cpu.write_reg(40, 0xDEAD);
        cpu.write_reg(u8::MAX, 0xBEEF);

        assert_eq!(cpu.read_reg(32), 0);
        assert_eq!(cpu.read_reg(40), 0);
        assert_eq!(cpu.read_reg(u8::MAX), 0);
        assert_eq!(cpu.read_reg(31), 9);
        assert_eq!(cpu.regs().iter().filter(|&&r| r != 0).count(), 1);
    }

    #[test]
    fn test_format_regs() {
        let mut cpu = cpu_with(64);
        cpu.write_reg(31, 0xABCD);
        let dump = cpu.format_regs();
        assert!(dump.starts_with("pc  = 0x00000000"));
        assert!(dump.contains("x31 = 0x0000abcd"));
        assert_eq!(dump.lines().count(), 9);
    }
}
