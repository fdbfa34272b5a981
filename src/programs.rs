//! 内置演示程序
//!
//! 两段手工汇编的 RV32I 机器码，供 CLI `--demo` 与测试使用。

use std::fmt;
use std::str::FromStr;

/// 斐波那契：x1 = 1, x2 = 0，之后每轮
/// `x3 = x2 + x1; x2 = x1; x1 = x3`，无限循环。
/// 执行 k 轮后 x1 = Fib(k + 1)。
const FIBONACCI: [u32; 6] = [
    0x00100093, // addi x1, x0, 1
    0x00000113, // addi x2, x0, 0
    // loop (地址 8):
    0x001101B3, // add  x3, x2, x1
    0x00100133, // add  x2, x0, x1
    0x003000B3, // add  x1, x0, x3
    0xFF5FF06F, // jal  x0, -12
];

/// 1 + 2 + ... + 10 = 55，结果在 x1，以 ecall 结束
const SUM_TO_TEN: [u32; 7] = [
    0x00000093, // addi x1, x0, 0      # sum
    0x00100113, // addi x2, x0, 1      # i
    0x00B00193, // addi x3, x0, 11     # limit
    // loop (地址 12):
    0x002080B3, // add  x1, x1, x2
    0x00110113, // addi x2, x2, 1
    0xFE314CE3, // blt  x2, x3, -8
    0x00000073, // ecall
];

/// 可通过名称选择的内置程序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuiltinProgram {
    #[default]
    Fibonacci,
    SumToTen,
}

impl BuiltinProgram {
    pub const ALL: [BuiltinProgram; 2] = [BuiltinProgram::Fibonacci, BuiltinProgram::SumToTen];

    pub fn name(self) -> &'static str {
        match self {
            BuiltinProgram::Fibonacci => "fibonacci",
            BuiltinProgram::SumToTen => "sum",
        }
    }

    pub fn words(self) -> &'static [u32] {
        match self {
            BuiltinProgram::Fibonacci => &FIBONACCI,
            BuiltinProgram::SumToTen => &SUM_TO_TEN,
        }
    }

    /// 小端字节序的程序镜像
    pub fn bytes(self) -> Vec<u8> {
        self.words().iter().flat_map(|w| w.to_le_bytes()).collect()
    }
}

impl fmt::Display for BuiltinProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown demo program `{0}` (expected one of: fibonacci, sum)")]
pub struct UnknownProgram(pub String);

impl FromStr for BuiltinProgram {
    type Err = UnknownProgram;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fibonacci" | "fib" => Ok(BuiltinProgram::Fibonacci),
            "sum" | "sum-to-ten" => Ok(BuiltinProgram::SumToTen),
            _ => Err(UnknownProgram(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::{decode, disassemble};

    #[test]
    fn test_bytes_are_little_endian() {
        let bytes = BuiltinProgram::Fibonacci.bytes();
        assert_eq!(bytes.len(), FIBONACCI.len() * 4);
        assert_eq!(&bytes[..4], &[0x93, 0x00, 0x10, 0x00]);
    }

    #[test]
    fn test_fibonacci_listing() {
        let listing: Vec<String> = BuiltinProgram::Fibonacci
            .words()
            .iter()
            .map(|&w| disassemble(&decode(w)))
            .collect();
        assert_eq!(
            listing,
            [
                "ADDI x1, x0, 1",
                "ADDI x2, x0, 0",
                "ADD x3, x2, x1",
                "ADD x2, x0, x1",
                "ADD x1, x0, x3",
                "JAL x0, -12",
            ]
        );
    }

    #[test]
    fn test_sum_listing_ends_with_ecall() {
        let last = *BuiltinProgram::SumToTen.words().last().unwrap();
        assert_eq!(disassemble(&decode(last)), "ECALL");
        assert_eq!(disassemble(&decode(0xFE314CE3)), "BLT x2, x3, -8");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("fibonacci".parse(), Ok(BuiltinProgram::Fibonacci));
        assert_eq!("SUM".parse(), Ok(BuiltinProgram::SumToTen));
        assert!("quicksort".parse::<BuiltinProgram>().is_err());
        for p in BuiltinProgram::ALL {
            assert_eq!(p.name().parse(), Ok(p));
        }
    }
}
