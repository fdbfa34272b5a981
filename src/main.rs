//! rv32i_sim 命令行入口
//!
//! 加载内置程序、原始二进制或 ELF，执行固定步数，
//! 打印每一步的反汇编与最终寄存器状态。

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rv32i_sim::programs::BuiltinProgram;
use rv32i_sim::sim_env::{SimConfig, SimEnv};

#[derive(Parser)]
#[command(author, version, about = "Single-core RV32I instruction set simulator", long_about = None)]
struct Args {
    /// ELF 可执行文件
    #[clap(long, conflicts_with_all = ["bin", "demo"])]
    elf: Option<PathBuf>,

    /// 原始二进制文件，加载到 --load-addr
    #[clap(long, conflicts_with = "demo")]
    bin: Option<PathBuf>,

    /// 内置程序：fibonacci | sum
    #[clap(long, default_value_t = BuiltinProgram::Fibonacci)]
    demo: BuiltinProgram,

    #[clap(long, value_parser = parse_u32, default_value = "0")]
    load_addr: u32,

    /// 入口 PC，默认取 ELF 入口或加载地址
    #[clap(long, value_parser = parse_u32)]
    entry: Option<u32>,

    /// 内存基地址
    #[clap(long, value_parser = parse_u32, default_value = "0")]
    memory_base: u32,

    /// 内存大小（字节）
    #[clap(long, value_parser = parse_usize, default_value = "0x100000")]
    memory_size: usize,

    /// 执行的指令数
    #[clap(short = 'n', long, default_value_t = 64)]
    steps: u64,

    /// 打印每一步的反汇编
    #[clap(long)]
    trace: bool,
}

/// 接受十进制或 0x 前缀的十六进制
fn parse_u64(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => s.replace('_', "").parse(),
    };
    parsed.map_err(|e| format!("invalid number `{s}`: {e}"))
}

fn parse_u32(s: &str) -> Result<u32, String> {
    u32::try_from(parse_u64(s)?).map_err(|_| format!("`{s}` does not fit in 32 bits"))
}

fn parse_usize(s: &str) -> Result<usize, String> {
    usize::try_from(parse_u64(s)?).map_err(|_| format!("`{s}` is too large"))
}

impl Args {
    fn into_config(self) -> SimConfig {
        let mut config = SimConfig::new()
            .with_builtin(self.demo)
            .with_load_addr(self.load_addr)
            .with_memory_base(self.memory_base)
            .with_memory_size(self.memory_size)
            .with_max_instructions(self.steps)
            .with_trace(self.trace);
        if let Some(path) = self.elf {
            config = config.with_elf_path(path);
        } else if let Some(path) = self.bin {
            config = config.with_bin_path(path, self.load_addr);
        }
        if let Some(entry) = self.entry {
            config = config.with_entry_pc(entry);
        }
        config
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Args::parse().into_config();
    let source = format!("{:?}", config.program);
    let mut env = SimEnv::from_config(config).with_context(|| format!("failed to load {source}"))?;

    println!("=== rv32i_sim: entry 0x{:08x} ===", env.cpu().pc());

    let steps = env.config.max_instructions;
    if env.config.trace {
        for _ in 0..steps {
            let pc = env.cpu().pc();
            let instr = env.step();
            println!("0x{pc:08x}: {:08x}  {instr}", instr.raw);
        }
    } else {
        env.run(steps);
    }

    println!();
    println!("executed {} instructions", env.instructions_executed);
    print!("{}", env.cpu().format_regs());
    Ok(())
}
