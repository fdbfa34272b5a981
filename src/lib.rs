//! rv32i_sim: RV32I 单线程功能级解释器
//!
//! 取指、译码、执行，一次一条指令，没有流水线与周期模型。
//! 外部驱动（可视化前端、批量运行脚本等）只通过 `CpuCore` 的
//! `load` / `step` / `register_value` / `pc` / `disassemble_last` 使用核心。
//!
//! # 模块结构
//!
//! - `isa`: 字段提取、立即数重建、译码与反汇编
//! - `cpu`: 寄存器文件、执行单元与单步循环
//! - `memory`: 小端字节寻址内存
//! - `programs`: 内置演示程序
//! - `sim_env`: 仿真环境（配置、程序加载、运行）

pub mod cpu;
pub mod isa;
pub mod memory;
pub mod programs;
pub mod sim_env;
