//! 仿真环境初始化模块
//!
//! 本模块负责：
//! - 描述仿真配置（内存、入口、程序来源、步数上限）
//! - 解析 ELF 文件
//! - 创建内存，把程序加载进去，再交给 CPU
//!
//! # 示例
//!
//! ```
//! use rv32i_sim::programs::BuiltinProgram;
//! use rv32i_sim::sim_env::{SimConfig, SimEnv};
//!
//! let config = SimConfig::new()
//!     .with_builtin(BuiltinProgram::SumToTen)
//!     .with_memory_size(4096)
//!     .with_max_instructions(33);
//!
//! let mut env = SimEnv::from_config(config).unwrap();
//! env.run_configured();
//! assert_eq!(env.cpu().read_reg(1), 55);
//! ```

use std::io;
use std::path::{Path, PathBuf};

use elf::ElfBytes;
use elf::abi::{EM_RISCV, PF_W, PF_X, PT_LOAD};
use elf::endian::AnyEndian;
use tracing::{debug, info};

use crate::cpu::CpuCore;
use crate::isa::DecodedInstr;
use crate::memory::{DEFAULT_MEMORY_SIZE, FlatMemory, MemError};
use crate::programs::BuiltinProgram;

/// 仿真环境错误
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("ELF parse error: {0}")]
    ElfParse(#[from] elf::ParseError),

    /// ELF 合法但不是 RV32 小端可执行文件
    #[error("unsupported ELF: {0}")]
    UnsupportedElf(String),

    /// 程序或段无法完整放入内存
    #[error(
        "program range 0x{addr:08x}+0x{len:x} does not fit memory 0x{base:08x}+0x{size:x}"
    )]
    ProgramTooLarge {
        addr: u32,
        len: usize,
        base: u32,
        size: usize,
    },

    #[error("memory error: {0}")]
    Memory(#[from] MemError),
}

/// 程序来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramSource {
    /// 内置演示程序，加载到 `load_addr`
    Builtin(BuiltinProgram),
    /// 原始二进制文件，加载到 `load_addr`
    Binary(PathBuf),
    /// ELF 可执行文件，按段地址加载
    Elf(PathBuf),
}

impl Default for ProgramSource {
    fn default() -> Self {
        ProgramSource::Builtin(BuiltinProgram::default())
    }
}

/// 仿真配置
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// 内存大小（字节）
    pub memory_size: usize,
    /// 内存映射起始地址
    pub memory_base: u32,
    /// 内置程序与原始二进制的加载地址
    pub load_addr: u32,
    /// 入口 PC；为 `None` 时取 ELF 入口或 `load_addr`
    pub entry_pc: Option<u32>,
    /// `run_configured` 的步数上限
    pub max_instructions: u64,
    pub program: ProgramSource,
    /// 逐条打印已执行指令
    pub trace: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            memory_base: 0,
            load_addr: 0,
            entry_pc: None,
            max_instructions: 64,
            program: ProgramSource::default(),
            trace: false,
        }
    }
}

impl SimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: ProgramSource) -> Self {
        self.program = program;
        self
    }

    pub fn with_builtin(self, program: BuiltinProgram) -> Self {
        self.with_program(ProgramSource::Builtin(program))
    }

    /// 设置原始二进制文件路径与加载地址
    pub fn with_bin_path(mut self, path: impl Into<PathBuf>, load_addr: u32) -> Self {
        self.program = ProgramSource::Binary(path.into());
        self.load_addr = load_addr;
        self
    }

    pub fn with_elf_path(self, path: impl Into<PathBuf>) -> Self {
        self.with_program(ProgramSource::Elf(path.into()))
    }

    pub fn with_load_addr(mut self, addr: u32) -> Self {
        self.load_addr = addr;
        self
    }

    pub fn with_entry_pc(mut self, pc: u32) -> Self {
        self.entry_pc = Some(pc);
        self
    }

    pub fn with_memory_size(mut self, size: usize) -> Self {
        self.memory_size = size;
        self
    }

    pub fn with_memory_base(mut self, base: u32) -> Self {
        self.memory_base = base;
        self
    }

    pub fn with_max_instructions(mut self, max: u64) -> Self {
        self.max_instructions = max;
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}

/// ELF 程序段信息
#[derive(Debug, Clone)]
pub struct ElfSegment {
    pub vaddr: u32,
    pub file_size: usize,
    pub mem_size: usize,
    pub data: Vec<u8>,
    pub executable: bool,
    pub writable: bool,
}

/// ELF 文件解析结果
#[derive(Debug, Clone)]
pub struct ElfInfo {
    pub entry: u32,
    /// 所有 PT_LOAD 段
    pub segments: Vec<ElfSegment>,
}

impl ElfInfo {
    pub fn parse<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let data = std::fs::read(path.as_ref())?;
        Self::parse_bytes(&data)
    }

    /// 从字节数组解析 ELF（使用 elf crate）
    pub fn parse_bytes(data: &[u8]) -> Result<Self, SimError> {
        let elf_file = ElfBytes::<AnyEndian>::minimal_parse(data)?;
        let header = &elf_file.ehdr;

        if header.e_machine != EM_RISCV {
            return Err(SimError::UnsupportedElf(format!(
                "machine type 0x{:x}, expected RISC-V (0x{:x})",
                header.e_machine, EM_RISCV
            )));
        }
        if header.class != elf::file::Class::ELF32 {
            return Err(SimError::UnsupportedElf("only 32-bit ELF is supported".into()));
        }
        if header.endianness != AnyEndian::Little {
            return Err(SimError::UnsupportedElf("only little-endian ELF is supported".into()));
        }

        let mut segments = Vec::new();
        if let Some(phdrs) = elf_file.segments() {
            for phdr in phdrs.iter().filter(|p| p.p_type == PT_LOAD) {
                let data = elf_file.segment_data(&phdr)?.to_vec();
                segments.push(ElfSegment {
                    vaddr: phdr.p_vaddr as u32,
                    file_size: phdr.p_filesz as usize,
                    mem_size: phdr.p_memsz as usize,
                    data,
                    executable: phdr.p_flags & PF_X != 0,
                    writable: phdr.p_flags & PF_W != 0,
                });
            }
        }

        Ok(ElfInfo {
            entry: header.e_entry as u32,
            segments,
        })
    }
}

/// 检查 [addr, addr+len) 是否完整落在内存内
fn ensure_range(memory: &FlatMemory, addr: u32, len: usize) -> Result<(), SimError> {
    let too_large = || SimError::ProgramTooLarge {
        addr,
        len,
        base: memory.base_addr(),
        size: memory.size(),
    };
    let offset = addr.checked_sub(memory.base_addr()).ok_or_else(too_large)? as usize;
    match offset.checked_add(len) {
        Some(end) if end <= memory.size() => Ok(()),
        _ => Err(too_large()),
    }
}

fn load_segments_into_memory(
    memory: &mut FlatMemory,
    segments: &[ElfSegment],
) -> Result<(), SimError> {
    for seg in segments.iter().filter(|s| s.mem_size > 0) {
        ensure_range(memory, seg.vaddr, seg.mem_size)?;
        memory.write_bytes(seg.vaddr, &seg.data)?;

        if seg.mem_size > seg.file_size {
            // file_size <= mem_size 且整段已在内存内，不会溢出
            let bss_start = seg.vaddr + seg.file_size as u32;
            memory.fill(bss_start, seg.mem_size - seg.file_size, 0)?;
        }
        debug!(
            "segment 0x{:08x} filesz=0x{:x} memsz=0x{:x} {}{}",
            seg.vaddr,
            seg.file_size,
            seg.mem_size,
            if seg.executable { "X" } else { "-" },
            if seg.writable { "W" } else { "R" },
        );
    }
    Ok(())
}

/// 按配置创建内存、加载程序并返回入口 PC
fn load_program(config: &SimConfig) -> Result<(FlatMemory, u32), SimError> {
    let mut memory = FlatMemory::new(config.memory_size, config.memory_base);

    let default_entry = match &config.program {
        ProgramSource::Builtin(program) => {
            let bytes = program.bytes();
            ensure_range(&memory, config.load_addr, bytes.len())?;
            memory.write_bytes(config.load_addr, &bytes)?;
            info!(program = %program, addr = config.load_addr, "loaded builtin program");
            config.load_addr
        }
        ProgramSource::Binary(path) => {
            let bytes = std::fs::read(path)?;
            ensure_range(&memory, config.load_addr, bytes.len())?;
            memory.write_bytes(config.load_addr, &bytes)?;
            info!(path = %path.display(), size = bytes.len(), "loaded binary");
            config.load_addr
        }
        ProgramSource::Elf(path) => {
            let elf = ElfInfo::parse(path)?;
            load_segments_into_memory(&mut memory, &elf.segments)?;
            info!(
                path = %path.display(),
                segments = elf.segments.len(),
                "loaded ELF, entry 0x{:08x}",
                elf.entry
            );
            elf.entry
        }
    };

    Ok((memory, config.entry_pc.unwrap_or(default_entry)))
}

/// 仿真环境
///
/// 封装了 CPU（及其内存）和仿真配置，提供统一的仿真接口
pub struct SimEnv {
    pub cpu: CpuCore,
    pub config: SimConfig,
    /// 已执行的指令数
    pub instructions_executed: u64,
}

impl SimEnv {
    /// 从配置创建仿真环境
    pub fn from_config(config: SimConfig) -> Result<Self, SimError> {
        let cpu = Self::build_cpu(&config)?;
        Ok(SimEnv {
            cpu,
            config,
            instructions_executed: 0,
        })
    }

    fn build_cpu(config: &SimConfig) -> Result<CpuCore, SimError> {
        let (memory, entry_pc) = load_program(config)?;
        debug!("CPU initialized at PC=0x{entry_pc:08x}");
        Ok(CpuCore::with_memory(memory, entry_pc))
    }

    /// 执行单步，返回本步的指令
    pub fn step(&mut self) -> DecodedInstr {
        let decoded = self.cpu.step();
        self.instructions_executed += 1;
        decoded
    }

    /// 运行指定数量的指令
    pub fn run(&mut self, max_instructions: u64) -> u64 {
        let executed = self.cpu.run(max_instructions);
        self.instructions_executed += executed;
        executed
    }

    /// 按 `config.max_instructions` 运行
    pub fn run_configured(&mut self) -> u64 {
        self.run(self.config.max_instructions)
    }

    pub fn cpu(&self) -> &CpuCore {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut CpuCore {
        &mut self.cpu
    }

    /// 重建 CPU 与内存并重新加载程序
    pub fn reset(&mut self) -> Result<(), SimError> {
        self.cpu = Self::build_cpu(&self.config)?;
        self.instructions_executed = 0;
        Ok(())
    }
}
