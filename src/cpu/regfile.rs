//! Integer register file x0..x31.

/// 32 个 32-bit 通用寄存器，x0 硬连线为 0
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RegFile {
    regs: [u32; 32],
}

impl RegFile {
    pub fn new() -> Self {
        Self { regs: [0; 32] }
    }

    /// 读取寄存器；越界（>= 32）返回 0
    #[inline]
    pub fn read(&self, reg: u8) -> u32 {
        if reg == 0 {
            return 0;
        }
        self.get(reg as usize).unwrap_or(0)
    }

    /// 写入寄存器；写 x0 或越界下标被丢弃
    #[inline]
    pub fn write(&mut self, reg: u8, value: u32) {
        if reg == 0 {
            return;
        }
        if let Some(slot) = self.regs.get_mut(reg as usize) {
            *slot = value;
        }
    }

    /// 外部查询用：越界下标返回 `None`
    #[inline]
    pub fn get(&self, index: usize) -> Option<u32> {
        self.regs.get(index).copied()
    }

    pub fn snapshot(&self) -> &[u32; 32] {
        &self.regs
    }

    pub fn clear(&mut self) {
        self.regs = [0; 32];
    }
}

impl std::fmt::Debug for RegFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.regs.iter().map(|v| format!("0x{v:08x}")))
            .finish()
    }
}
