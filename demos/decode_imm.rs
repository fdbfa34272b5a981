// 调试脚本：逐格式检查立即数拼装与反汇编输出

use rv32i_sim::isa::{decode, disassemble, ImmFormat};

fn main() {
    println!("=== 立即数解码检查 ===\n");

    // (机器码, 预期立即数, 预期反汇编)
    let cases: &[(u32, i32, &str)] = &[
        (0xFFF00113, -1, "ADDI x2, x0, -1"),
        (0x00412083, 4, "LW x1, 4(x2)"),
        (0x00112423, 8, "SW x1, 8(x2)"),
        (0xFE0008E3, -16, "BEQ x0, x0, -16"),
        (0xFE000CE3, -8, "BEQ x0, x0, -8"),
        (0x0041D663, 12, "BGE x3, x4, 12"),
        (0x123450B7, 0x1234_5000, "LUI x1, 0x12345000"),
        (0xFF5FF06F, -12, "JAL x0, -12"),
    ];

    let mut failures = 0;
    for &(raw, expected_imm, expected_text) in cases {
        let decoded = decode(raw);
        let text = disassemble(&decoded);
        let ok = decoded.imm == expected_imm && text == expected_text;
        if !ok {
            failures += 1;
        }
        println!("0x{raw:08X} [{:?}] imm={} -> {text}", decoded.opcode.format(), decoded.imm);
        if !ok {
            println!("  ✗ 预期 imm={expected_imm}, `{expected_text}`");
        }
    }

    // 手工按 B 型格式拼出 beq x0, x0, -16，再确认解码一致
    println!("\n=== 手动编码计算 ===\n");
    let offset = -16i32;
    let encoded = (((offset >> 12) & 1) as u32) << 31
        | (((offset >> 5) & 0x3F) as u32) << 25
        | (((offset >> 1) & 0xF) as u32) << 8
        | (((offset >> 11) & 1) as u32) << 7
        | 0b1100011;
    let decoded = decode(encoded);
    println!("beq x0, x0, -16 = 0x{encoded:08X} -> {decoded}");
    if decoded.opcode.format() != ImmFormat::B || decoded.imm != offset {
        failures += 1;
    }

    println!("\n{} cases, {failures} failures", cases.len() + 1);
}
