use crate::isa::{AluOp, BranchCond};

/// ALU: 所有算术均为 32 位回绕；移位量取 `b` 的低 5 位
#[inline]
pub fn apply(op: AluOp, a: u32, b: u32) -> u32 {
    let shamt = b & 0x1F;
    match op {
        AluOp::Add => a.wrapping_add(b),
        AluOp::Sub => a.wrapping_sub(b),
        AluOp::Sll => a << shamt,
        AluOp::Slt => ((a as i32) < (b as i32)) as u32,
        AluOp::Sltu => (a < b) as u32,
        AluOp::Xor => a ^ b,
        AluOp::Srl => a >> shamt,
        AluOp::Sra => ((a as i32) >> shamt) as u32,
        AluOp::Or => a | b,
        AluOp::And => a & b,
    }
}

/// 分支比较
#[inline]
pub fn branch_taken(cond: BranchCond, a: u32, b: u32) -> bool {
    match cond {
        BranchCond::Eq => a == b,
        BranchCond::Ne => a != b,
        BranchCond::Lt => (a as i32) < (b as i32),
        BranchCond::Ge => (a as i32) >= (b as i32),
        BranchCond::Ltu => a < b,
        BranchCond::Geu => a >= b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_sub_wrap() {
        assert_eq!(apply(AluOp::Add, u32::MAX, 1), 0);
        assert_eq!(apply(AluOp::Sub, 0, 1), u32::MAX);
    }

    #[test]
    fn test_compare() {
        let minus_five = -5i32 as u32;
        assert_eq!(apply(AluOp::Slt, minus_five, 10), 1);
        assert_eq!(apply(AluOp::Sltu, minus_five, 10), 0);
        assert_eq!(apply(AluOp::Slt, 10, 10), 0);
    }

    #[test]
    fn test_shifts_use_low_five_bits() {
        assert_eq!(apply(AluOp::Sll, 1, 33), 2);
        assert_eq!(apply(AluOp::Srl, 0x8000_0000, 31), 1);
        assert_eq!(apply(AluOp::Sra, 0x8000_0000, 31), u32::MAX);
        assert_eq!(apply(AluOp::Sra, 0x4000_0000, 30), 1);
    }

    #[test]
    fn test_logic() {
        assert_eq!(apply(AluOp::Xor, 0b1100, 0b1010), 0b0110);
        assert_eq!(apply(AluOp::Or, 0b1100, 0b1010), 0b1110);
        assert_eq!(apply(AluOp::And, 0b1100, 0b1010), 0b1000);
    }

    #[test]
    fn test_branch_signedness() {
        let minus_one = u32::MAX;
        assert!(branch_taken(BranchCond::Lt, minus_one, 0));
        assert!(!branch_taken(BranchCond::Ltu, minus_one, 0));
        assert!(branch_taken(BranchCond::Geu, minus_one, 0));
        assert!(!branch_taken(BranchCond::Ge, minus_one, 0));
        assert!(branch_taken(BranchCond::Ge, 3, 3));
        assert!(branch_taken(BranchCond::Eq, 3, 3));
        assert!(branch_taken(BranchCond::Ne, 3, 4));
    }
}
